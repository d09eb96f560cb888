use std::io;
use std::sync::Arc;

#[derive(Debug, Clone, thiserror::Error)]
pub enum FindError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Cannot read start path {path}: {source}")]
    StartPath {
        path: String,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("Cannot read {path}: {source}")]
    NodeIo {
        path: String,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("Internal error at {path}: {message}")]
    Internal { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, FindError>;

impl FindError {
    /// Creates a configuration error from any displayable message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub(crate) fn node_io(path: impl Into<String>, source: impl Into<Arc<io::Error>>) -> Self {
        Self::NodeIo {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn internal(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Internal {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Promotes a node failure to a fatal start-path failure.
    ///
    /// Used when the failing node is a traversal root: there is nothing left
    /// to traverse, so the scan must end.
    pub(crate) fn into_start_path(self) -> Self {
        match self {
            Self::NodeIo { path, source } => Self::StartPath { path, source },
            Self::Internal { path, message } => Self::StartPath {
                path,
                source: Arc::new(io::Error::other(message)),
            },
            other => other,
        }
    }

    /// Returns the path the error refers to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::StartPath { path, .. }
            | Self::NodeIo { path, .. }
            | Self::Internal { path, .. } => Some(path.as_str()),
            Self::Config(_) => None,
        }
    }

    /// Returns true if the error ends the scan.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::StartPath { .. })
    }
}
