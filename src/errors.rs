// errors.rs
use astra::Response;

/// Errors originating from either the request handling
/// (routing, bad input, validation) or downstream layers (stores, files).
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// Required fields missing at save time. Raised before any store call.
    #[error("{0}")]
    Validation(String),
    /// The record or blob store could not be reached or refused the call.
    #[error("Store Error: {0}")]
    Transport(String),
    #[error("Spreadsheet Error: {0}")]
    XlsxError(String),
    #[error("Internal Server Error")]
    InternalError,
}

impl ServerError {
    /// Prefix the message with the user action that failed, keeping the kind.
    pub fn during(self, action: &str) -> ServerError {
        match self {
            ServerError::Transport(msg) => ServerError::Transport(format!("{action}: {msg}")),
            ServerError::Validation(msg) => ServerError::Validation(format!("{action}: {msg}")),
            ServerError::XlsxError(msg) => ServerError::XlsxError(format!("{action}: {msg}")),
            other => other,
        }
    }
}

// Type alias commonly used by route handlers.
pub type ResultResp = Result<Response, ServerError>;

impl From<rusqlite::Error> for ServerError {
    fn from(e: rusqlite::Error) -> Self {
        ServerError::Transport(e.to_string())
    }
}

impl From<reqwest::Error> for ServerError {
    fn from(e: reqwest::Error) -> Self {
        ServerError::Transport(e.to_string())
    }
}

impl From<std::io::Error> for ServerError {
    fn from(e: std::io::Error) -> Self {
        ServerError::Transport(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ServerError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        ServerError::XlsxError(e.to_string())
    }
}

impl From<calamine::Error> for ServerError {
    fn from(e: calamine::Error) -> Self {
        ServerError::BadRequest(format!("Unreadable workbook: {e}"))
    }
}

impl From<csv::Error> for ServerError {
    fn from(e: csv::Error) -> Self {
        ServerError::BadRequest(format!("Unreadable CSV: {e}"))
    }
}
