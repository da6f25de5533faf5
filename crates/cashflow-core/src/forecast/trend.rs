//! Trend fitting over a historical net series.
//!
//! The series is indexed by position (0, 1, 2, ...), so a sparse history is
//! treated as consecutive periods. Every method returns the fitted change
//! per period; fewer than two points give a zero delta. Sums and products
//! are checked, so a series too large for `Decimal` is an error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::policy::TrendMethod;
use crate::types::Money;
use crate::{CashflowError, CashflowResult};

/// Result of fitting a trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendFit {
    pub method: TrendMethod,
    /// Fitted change per period.
    pub delta: Money,
    /// Coefficient of determination; only least squares with n >= 2 has one.
    pub r_squared: Option<Decimal>,
    pub points: usize,
}

pub fn fit_trend(values: &[Money], method: TrendMethod) -> CashflowResult<TrendFit> {
    let points = values.len();
    if points < 2 {
        return Ok(TrendFit {
            method,
            delta: Decimal::ZERO,
            r_squared: None,
            points,
        });
    }

    let fitted = match method {
        TrendMethod::LeastSquares => least_squares(values).map(|(slope, r2)| (slope, Some(r2))),
        TrendMethod::AverageDelta => average_delta(values).map(|d| (d, None)),
        TrendMethod::WeightedRecent => weighted_recent(values).map(|d| (d, None)),
    };
    let (delta, r_squared) = fitted.ok_or_else(|| CashflowError::overflow("historical"))?;

    Ok(TrendFit {
        method,
        delta,
        r_squared,
        points,
    })
}

/// Mean of absolute values; zero for an empty series, `None` on overflow.
pub fn mean_abs(values: &[Money]) -> Option<Money> {
    if values.is_empty() {
        return Some(Decimal::ZERO);
    }
    let total = values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v.abs()))?;
    total.checked_div(Decimal::from(values.len()))
}

// ---------------------------------------------------------------------------
// Methods (n >= 2)
// ---------------------------------------------------------------------------

/// OLS slope and R² of value against index. `None` on overflow.
fn least_squares(values: &[Money]) -> Option<(Decimal, Decimal)> {
    let n = Decimal::from(values.len());
    let x_mean = Decimal::from(values.len() - 1) / Decimal::TWO;
    let y_mean = values
        .iter()
        .try_fold(Decimal::ZERO, |acc, y| acc.checked_add(*y))?
        .checked_div(n)?;

    let mut sxx = Decimal::ZERO;
    let mut sxy = Decimal::ZERO;
    let mut syy = Decimal::ZERO;
    for (i, y) in values.iter().enumerate() {
        let dx = Decimal::from(i) - x_mean;
        let dy = y.checked_sub(y_mean)?;
        sxx = sxx.checked_add(dx.checked_mul(dx)?)?;
        sxy = sxy.checked_add(dx.checked_mul(dy)?)?;
        syy = syy.checked_add(dy.checked_mul(dy)?)?;
    }

    // sxx > 0 whenever n >= 2
    let slope = sxy.checked_div(sxx)?;
    // A flat series is perfectly explained by a zero slope.
    let r_squared = if syy.is_zero() {
        Decimal::ONE
    } else {
        slope
            .checked_mul(sxy.checked_div(syy)?)?
            .clamp(Decimal::ZERO, Decimal::ONE)
    };

    Some((slope, r_squared))
}

fn average_delta(values: &[Money]) -> Option<Decimal> {
    let first = values[0];
    let last = values[values.len() - 1];
    last.checked_sub(first)?
        .checked_div(Decimal::from(values.len() - 1))
}

fn weighted_recent(values: &[Money]) -> Option<Decimal> {
    let mut weighted = Decimal::ZERO;
    let mut weights = Decimal::ZERO;
    for (i, pair) in values.windows(2).enumerate() {
        let w = Decimal::from(i + 1);
        let change = pair[1].checked_sub(pair[0])?;
        weighted = weighted.checked_add(change.checked_mul(w)?)?;
        weights += w;
    }
    weighted.checked_div(weights)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
