use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StreamError>;

/// Boxed transport failure carried by [`StreamError::Transport`].
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by an [`ObjectStream`](crate::ObjectStream).
///
/// Every variant is reported synchronously to the caller of the operation
/// that detected it. Nothing here is retried by the stream itself.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Caller input rejected before any I/O took place.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{uri}: stream is closed")]
    Closed { uri: String },

    /// The store answered a range request with no object at all.
    #[error("{uri}: object unavailable at offset {offset}")]
    ObjectUnavailable { uri: String, offset: u64 },

    #[error("{uri}: transport failure at offset {offset}")]
    Transport {
        uri: String,
        offset: u64,
        #[source]
        source: TransportError,
    },

    #[error("{uri}: end of object reached at offset {offset} ({missing} bytes short)")]
    UnexpectedEof {
        uri: String,
        offset: u64,
        missing: u64,
    },
}

impl StreamError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        StreamError::InvalidArgument(msg.into())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, StreamError::InvalidArgument(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, StreamError::Closed { .. })
    }

    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self, StreamError::UnexpectedEof { .. })
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> io::Error {
        let kind = match &err {
            StreamError::InvalidArgument(_) => io::ErrorKind::InvalidInput,
            StreamError::ObjectUnavailable { .. } => io::ErrorKind::NotFound,
            StreamError::UnexpectedEof { .. } => io::ErrorKind::UnexpectedEof,
            StreamError::Closed { .. } | StreamError::Transport { .. } => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
