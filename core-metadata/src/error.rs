use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse audio container: {0}")]
    Parse(#[from] lofty::error::LoftyError),
}

pub type Result<T> = std::result::Result<T, MetadataError>;
