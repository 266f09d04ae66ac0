use thiserror::Error;

/// Failure of a single remote fetch / store / remove.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("{path} not found")]
    NotFound { path: String },

    #[error("invalid store path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store unavailable for {path}: {message}")]
    Unavailable { path: String, message: String },
}

impl TransferError {
    pub fn path(&self) -> &str {
        match self {
            TransferError::NotFound { path }
            | TransferError::InvalidPath { path, .. }
            | TransferError::Io { path, .. }
            | TransferError::Unavailable { path, .. } => path,
        }
    }
}
