use crate::session::RequestKind;

/// Failure of one user action against the paper service. None of these are
/// retried; the message is shown to the user and the action ends.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    #[error("Please fill in all fields ({0}).")]
    MissingInput(&'static str),
    #[error("{0}")]
    Remote(String),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("pattern has no section #{0}")]
    NoSuchSection(usize),
    #[error("`{0}` is not a whole number of marks or questions")]
    InvalidNumber(String),
    #[error("a {0} request is already running")]
    Busy(RequestKind),
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
