//! Common error type shared across the transcoding service.
//!
//! Covers the four policies in the error handling design: not-found/conflict
//! for the admission layer, database errors for the Store, and tool errors
//! for the external ffmpeg/ffprobe processes.

/// Common error type for spacesaver.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested item was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested mutation conflicts with current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// A required external tool is not available.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// An external tool exited with a failure status.
    #[error("tool failed: {0}")]
    ToolFailed(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Conflict error.
    pub fn conflict<S: Into<String>>(msg: S) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Convert a `spacesaver-av` error into the shared application error, folding
/// its tool-specific variants into ours and everything else into `Internal`.
impl From<spacesaver_av::Error> for Error {
    fn from(err: spacesaver_av::Error) -> Self {
        match err {
            spacesaver_av::Error::ToolNotFound { tool } => Self::ToolNotFound(tool),
            spacesaver_av::Error::ToolFailed { tool, message } => {
                Self::ToolFailed(format!("{tool}: {message}"))
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("test item");
        assert_eq!(err.to_string(), "not found: test item");

        let err = Error::conflict("already queued");
        assert_eq!(err.to_string(), "conflict: already queued");

        let err = Error::database("connection failed");
        assert_eq!(err.to_string(), "database error: connection failed");

        let err = Error::invalid_input("bad format");
        assert_eq!(err.to_string(), "invalid input: bad format");

        let err = Error::internal("unexpected state");
        assert_eq!(err.to_string(), "internal error: unexpected state");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_av_tool_not_found() {
        let av_err = spacesaver_av::Error::tool_not_found("ffmpeg");
        let err = Error::from(av_err);
        assert!(matches!(err, Error::ToolNotFound(t) if t == "ffmpeg"));
    }

    #[test]
    fn test_result_type() {
        fn test_fn() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(test_fn().unwrap(), 42);

        fn error_fn() -> Result<i32> {
            Err(Error::not_found("x"))
        }
        assert!(error_fn().is_err());
    }
}
