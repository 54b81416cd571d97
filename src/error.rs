use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Validation failed for topic '{topic}': {details}")]
    ValidationError { topic: String, details: String },

    #[error("Filing HTML could not be parsed: {0}")]
    UnparsableDocument(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
