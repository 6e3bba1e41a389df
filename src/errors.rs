use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, GurlzError>;

#[derive(Debug, thiserror::Error)]
pub enum GurlzError {
    /// Malformed user input, rejected before anything touches storage.
    #[error("{0}")]
    Validation(String),

    #[error("request with name '{0}' already exists")]
    DuplicateName(String),

    #[error("request '{0}' not found")]
    NotFound(String),

    #[error("{context} {}: {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{0}")]
    Environment(String),
}

impl GurlzError {
    pub fn validation(msg: impl Into<String>) -> GurlzError {
        GurlzError::Validation(msg.into())
    }

    pub fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> GurlzError {
        GurlzError::Io { context, path: path.into(), source }
    }
}
