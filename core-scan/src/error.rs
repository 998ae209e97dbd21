use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Catalog error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Background task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
