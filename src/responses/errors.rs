use crate::errors::ServerError;
use astra::{Body, Response, ResponseBuilder};

pub use crate::errors::ResultResp;

pub fn status_for(err: &ServerError) -> u16 {
    match err {
        ServerError::NotFound => 404,
        ServerError::BadRequest(_) => 400,
        ServerError::Validation(_) => 422,
        ServerError::Transport(_) => 502,
        ServerError::XlsxError(_) | ServerError::InternalError => 500,
    }
}

/// Convert a ServerError into a JSON error response
pub fn error_to_response(err: ServerError) -> Response {
    let status = status_for(&err);
    if status >= 500 {
        tracing::error!(status, error = %err, "request failed");
    } else {
        tracing::debug!(status, error = %err, "request rejected");
    }
    json_error_response(status, &err.to_string())
}

/// `{"error": "..."}` with the given status
pub fn json_error_response(status: u16, message: &str) -> Response {
    let body = serde_json::json!({ "error": message }).to_string();

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}
