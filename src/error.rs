use thiserror::Error;

#[derive(Error, Debug)]
pub enum TwinError {
    #[error("Resolution error: {0}")]
    Resolution(String),
    #[error("Type mismatch: {path} resolves to {found}, which is not a twin")]
    TypeMismatch { path: String, found: String },
    #[error("Validation error: expected {expected}, got {found}")]
    Validation { expected: String, found: String },
    #[error("Inspection error: {kind} has no field '{field}'")]
    MissingField { kind: String, field: String },
    #[error("Config error: {0}")]
    Config(String),
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, TwinError>;

// Helper conversions
impl From<config::ConfigError> for TwinError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}

impl<T> From<std::sync::PoisonError<T>> for TwinError {
    fn from(e: std::sync::PoisonError<T>) -> Self { Self::Lock(e.to_string()) }
}
