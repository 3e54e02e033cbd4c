//! Error types for OrderScan core

use thiserror::Error;

/// Main error type for OrderScan operations
#[derive(Debug, Error)]
pub enum OrderScanError {
    /// PDF loading or text extraction error
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Model/LLM error
    #[error("Model error: {0}")]
    Model(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Template rendering error
    #[error("Template error: {0}")]
    Template(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Convenient Result type using OrderScanError
pub type Result<T> = std::result::Result<T, OrderScanError>;

impl OrderScanError {
    /// Create a PDF error
    pub fn pdf(msg: impl Into<String>) -> Self {
        OrderScanError::Pdf(msg.into())
    }

    /// Create a model error
    pub fn model(msg: impl Into<String>) -> Self {
        OrderScanError::Model(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        OrderScanError::Config(msg.into())
    }

    /// Create a template error
    pub fn template(msg: impl Into<String>) -> Self {
        OrderScanError::Template(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        OrderScanError::Other(msg.into())
    }
}
