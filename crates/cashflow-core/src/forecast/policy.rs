//! Forecasting policy: every threshold and adjustment factor used by the
//! projector, as named constants plus an overridable policy struct.
//!
//! Callers override any subset of fields in JSON; missing fields fall back
//! to the constants below.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Rate;
use crate::{CashflowError, CashflowResult};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Months of history below which confidence is scaled down.
pub const MIN_DATA_MONTHS: u32 = 3;
/// Historical periods fed to the trend fit and echoed for charting.
pub const HISTORY_WINDOW: u32 = 12;
/// Pessimistic path is evaluated at least this far out for the runway.
pub const RUNWAY_CAP_MONTHS: u32 = 12;
pub const MAX_HORIZON: u32 = 60;

/// Runway strictly below this is critical.
pub const CRITICAL_RUNWAY_MONTHS: u32 = 3;
/// Runway up to and including this is a warning; above is safe.
pub const WARNING_RUNWAY_MONTHS: u32 = 6;

/// Applied to the magnitude of the fitted per-period delta.
pub const OPTIMISTIC_ADJUSTMENT: Rate = dec!(0.15);
pub const PESSIMISTIC_ADJUSTMENT: Rate = dec!(-0.20);

/// Half-width of the "stable" band, relative to mean absolute net.
pub const TREND_TOLERANCE: Rate = dec!(0.02);
pub const MAX_CONFIDENCE: Decimal = dec!(0.95);
/// Fit quality assumed for methods that do not produce an R².
pub const UNSCORED_FIT_QUALITY: Decimal = dec!(0.75);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the per-period delta is fitted over the historical net series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMethod {
    /// Ordinary least squares slope of net against period index.
    #[default]
    LeastSquares,
    /// `(last - first) / (n - 1)`.
    AverageDelta,
    /// Linearly weighted mean of period-over-period deltas, latest heaviest.
    WeightedRecent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Safe,
    Warning,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Warning => "warning",
            RiskLevel::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TrendDirection::Improving => "improving",
            TrendDirection::Declining => "declining",
            TrendDirection::Stable => "stable",
        };
        write!(f, "{s}")
    }
}

/// Tunable forecasting policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastPolicy {
    pub trend_method: TrendMethod,
    /// Must be >= 0.
    pub optimistic_adjustment: Rate,
    /// Must be <= 0.
    pub pessimistic_adjustment: Rate,
    pub min_data_months: u32,
    pub history_window: u32,
    pub runway_cap_months: u32,
    pub max_horizon: u32,
    pub critical_runway_months: u32,
    pub warning_runway_months: u32,
    pub trend_tolerance: Rate,
    pub max_confidence: Decimal,
}

impl Default for ForecastPolicy {
    fn default() -> Self {
        Self {
            trend_method: TrendMethod::default(),
            optimistic_adjustment: OPTIMISTIC_ADJUSTMENT,
            pessimistic_adjustment: PESSIMISTIC_ADJUSTMENT,
            min_data_months: MIN_DATA_MONTHS,
            history_window: HISTORY_WINDOW,
            runway_cap_months: RUNWAY_CAP_MONTHS,
            max_horizon: MAX_HORIZON,
            critical_runway_months: CRITICAL_RUNWAY_MONTHS,
            warning_runway_months: WARNING_RUNWAY_MONTHS,
            trend_tolerance: TREND_TOLERANCE,
            max_confidence: MAX_CONFIDENCE,
        }
    }
}

impl ForecastPolicy {
    pub fn validate(&self) -> CashflowResult<()> {
        if self.optimistic_adjustment < Decimal::ZERO {
            return Err(invalid(
                "optimistic_adjustment",
                "Optimistic adjustment cannot be negative.",
            ));
        }
        if self.pessimistic_adjustment > Decimal::ZERO {
            return Err(invalid(
                "pessimistic_adjustment",
                "Pessimistic adjustment cannot be positive.",
            ));
        }
        if self.min_data_months == 0 {
            return Err(invalid("min_data_months", "Must be at least 1."));
        }
        if self.history_window == 0 {
            return Err(invalid("history_window", "Must be at least 1."));
        }
        if self.max_horizon == 0 {
            return Err(invalid("max_horizon", "Must be at least 1."));
        }
        if self.critical_runway_months > self.warning_runway_months {
            return Err(invalid(
                "critical_runway_months",
                "Critical runway threshold cannot exceed the warning threshold.",
            ));
        }
        if self.trend_tolerance < Decimal::ZERO {
            return Err(invalid("trend_tolerance", "Tolerance cannot be negative."));
        }
        if self.max_confidence < Decimal::ZERO || self.max_confidence > Decimal::ONE {
            return Err(invalid("max_confidence", "Must be between 0 and 1."));
        }
        Ok(())
    }

    /// Map a runway in months to a risk level.
    pub fn classify_risk(&self, runway_months: u32) -> RiskLevel {
        if runway_months < self.critical_runway_months {
            RiskLevel::Critical
        } else if runway_months <= self.warning_runway_months {
            RiskLevel::Warning
        } else {
            RiskLevel::Safe
        }
    }
}

fn invalid(field: &str, reason: &str) -> CashflowError {
    CashflowError::InvalidInput {
        field: field.into(),
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
