use std::path::PathBuf;

/// error type for cellvault operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("nothing staged")]
    Empty,

    #[error("corrupt object: {0}")]
    CorruptObject(String),

    #[error("corrupt commit: {0}")]
    CorruptCommit(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// only produced if a non-blocking lock mode is added; the default
    /// blocking index lock never surfaces this
    #[error("lock contention on staging index")]
    LockContention,
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_result_ext_wraps_path() {
        let err: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let wrapped = err.with_path("/some/file");
        match wrapped {
            Err(Error::Io { path, .. }) => assert_eq!(path, PathBuf::from("/some/file")),
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_display() {
        let e = Error::InvalidInput("empty message".to_string());
        assert_eq!(e.to_string(), "invalid input: empty message");

        let e = Error::Empty;
        assert_eq!(e.to_string(), "nothing staged");
    }
}
