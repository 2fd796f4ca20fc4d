use thiserror::Error;

/// Every way a REST call can fail. The display text is what users see.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Transport(String),
    /// Non-2xx response; `message` is the server's own message when it sent one.
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("response too large (max {max_bytes} bytes)")]
    TooLarge { max_bytes: u64 },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout;
    }
    if err.is_decode() {
        return ApiError::Decode(err.to_string());
    }
    ApiError::Transport(err.to_string())
}

/// Failure while fetching an export and storing it locally.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Persist(#[from] crate::PersistError),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("could not start client runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
