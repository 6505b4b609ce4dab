use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Could not reach the upstream or read its body.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered non-2xx; message already normalized.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// 2xx body that is not JSON.
    #[error("Upstream returned an unreadable response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid upstream URL: {0}")]
    Url(String),
}

impl UpstreamError {
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
