use thiserror::Error;

/// Errors produced while synchronizing the catalog to a device.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Catalog error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Unknown sync mode: {0}")]
    UnknownMode(String),

    #[error("Remote path not found: {0}")]
    RemoteNotFound(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Transfer failed: {0}")]
    Transport(String),

    #[error("Invalid sync configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl SyncError {
    /// Whether a failure should abort the whole pass instead of being
    /// logged and skipped for the current file.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::Connection(_) | SyncError::Config(_) | SyncError::UnknownMode(_)
        )
    }
}
