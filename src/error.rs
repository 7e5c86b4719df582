use std::path::PathBuf;

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Missing email or password")]
    MissingCredentials,

    #[error("Failed to fetch remote {resource}: {message}")]
    RemoteStateFetch {
        resource: &'static str,
        message: String,
    },

    #[error("Local library unavailable: {message}")]
    LibraryUnavailable { message: String },

    #[error("Sync cancelled by user")]
    Cancelled,
}

impl SyncError {
    pub fn remote_state(resource: &'static str, err: impl std::fmt::Display) -> Self {
        Self::RemoteStateFetch {
            resource,
            message: format!("{:#}", err),
        }
    }

    pub fn library(err: impl std::fmt::Display) -> Self {
        Self::LibraryUnavailable {
            message: format!("{:#}", err),
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::Cancelled => 130,
            _ => 1,
        }
    }
}

/// Failures confined to a single track, playlist or playlist entry.
///
/// These are logged and recorded in the run results; they never stop the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemError {
    #[error("Unreadable file {path}: {message}")]
    UnreadableFile { path: PathBuf, message: String },

    #[error("Remote call failed during {operation}: {message}")]
    RemoteLookup {
        operation: &'static str,
        message: String,
    },

    #[error("No remote token found for playlist '{name}'")]
    UnresolvedPlaylistToken { name: String },
}

impl ItemError {
    pub fn unreadable(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::UnreadableFile {
            path: path.into(),
            message: format!("{:#}", err),
        }
    }

    pub fn remote(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::RemoteLookup {
            operation,
            message: format!("{:#}", err),
        }
    }
}
