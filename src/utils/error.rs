// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("File not found, please pass a valid path: {0}")]
    DocumentNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read PDF: {0}")]
    Pdf(String),

    #[error("Document has no readable pages: {0}")]
    Empty(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Rounding section not found after checking {0} pages")]
    SectionNotFound(usize),

    #[error("Rounding clause not parseable: {0}")]
    GrammarNoMatch(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Ingest(#[from] IngestError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
