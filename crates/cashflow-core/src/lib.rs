pub mod dates;
pub mod error;
pub mod types;

#[cfg(feature = "aggregation")]
pub mod aggregation;

#[cfg(feature = "forecast")]
pub mod forecast;

#[cfg(feature = "scoring")]
pub mod scoring;

#[cfg(feature = "assistant")]
pub mod assistant;

pub use error::CashflowError;
pub use types::*;

/// Standard result type for all cashflow operations
pub type CashflowResult<T> = Result<T, CashflowError>;
