use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid grid configuration: {0}")]
    InvalidGrid(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Degenerate image: {0}")]
    DegenerateImage(String),
    #[error("Recognition engine error: {0}")]
    Engine(String),
    #[error("Document load error: {0}")]
    DocumentLoad(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl ExtractionError {
    /// Errors that must stop a run before any page is processed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExtractionError::InvalidGrid(_)
                | ExtractionError::InvalidConfig(_)
                | ExtractionError::ThreadPool(_)
        )
    }
}
