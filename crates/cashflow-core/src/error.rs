use thiserror::Error;

#[derive(Debug, Error)]
pub enum CashflowError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CashflowError {
    fn from(e: serde_json::Error) -> Self {
        CashflowError::SerializationError(e.to_string())
    }
}

impl CashflowError {
    /// A computation from `field` left the range of `Decimal`.
    pub fn overflow(field: &str) -> Self {
        CashflowError::InvalidInput {
            field: field.into(),
            reason: "Values exceed the supported decimal range.".into(),
        }
    }
}
