pub mod errors;
pub mod json;
pub mod xlsx;

pub use errors::{error_to_response, ResultResp};
pub use json::{json_response, json_response_with_status};
pub use xlsx::xlsx_response;
