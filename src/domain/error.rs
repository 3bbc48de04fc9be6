use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Please enter video URL")]
    EmptyUrl,

    #[error("{0}")]
    Extractor(String),

    #[error("{0}")]
    Io(String),
}
