//! Composite financial-health score.
//!
//! Scores a company's calculator history on a 0-100 scale from four
//! sub-scores:
//! 1. **Completion** (0-40) -- share of the nine calculator types ever used.
//! 2. **Cash** (0-20) -- latest DSO and latest BFR, 10 points each.
//! 3. **Margin** (0-20) -- latest margin and latest break-even, 10 points each.
//! 4. **Recency** (0-20) -- days since the most recent calculation.
//!
//! Classification:
//! - >= 75: excellent
//! - >= 55: good
//! - >= 35: caution
//! - < 35: action needed
//!
//! The score is a pure function of the history and the evaluation date.

use std::time::Instant;

use chrono::{NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::calculations::{distinct_calculators, latest_valid, Calculation, CalculatorType};
use super::thresholds::*;
use crate::dates::deserialize_optional_date;
use crate::types::{with_metadata, ComputationOutput};

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreInput {
    pub history: Vec<Calculation>,
    /// Evaluation date; today (UTC) when omitted.
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreLevel {
    Excellent,
    Good,
    Caution,
    ActionNeeded,
}

impl std::fmt::Display for ScoreLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ScoreLevel::Excellent => "excellent",
            ScoreLevel::Good => "good",
            ScoreLevel::Caution => "caution",
            ScoreLevel::ActionNeeded => "action_needed",
        })
    }
}

/// Points earned by each graded calculator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubMetricPoints {
    pub dso: u32,
    pub bfr: u32,
    pub margin: u32,
    pub break_even: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// 0-100.
    pub total: u32,
    pub completion_score: u32,
    pub cash_score: u32,
    pub margin_score: u32,
    pub recency_score: u32,
    pub level: ScoreLevel,
    /// Distinct calculator types present in the history.
    pub calculators_used: u32,
    /// `None` for an empty history.
    pub days_since_last: Option<i64>,
    pub breakdown: SubMetricPoints,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Score a history at `input.as_of`, defaulting to today.
pub fn score_history(input: &ScoreInput) -> ComputationOutput<ScoreResult> {
    let as_of = input.as_of.unwrap_or_else(|| Utc::now().date_naive());
    compute_score(&input.history, as_of)
}

/// Compute the composite score. Never fails: an empty history scores 0.
pub fn compute_score(history: &[Calculation], as_of: NaiveDate) -> ComputationOutput<ScoreResult> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let calculators_used = distinct_calculators(history).len() as u32;
    let completion_score = completion_points(calculators_used);

    let negative_dso = history
        .iter()
        .filter(|c| c.calculator == CalculatorType::Dso && c.value < Decimal::ZERO)
        .count();
    if negative_dso > 0 {
        warnings.push(format!(
            "{negative_dso} negative DSO value(s) ignored; DSO cannot be below zero."
        ));
    }

    let breakdown = SubMetricPoints {
        dso: latest_valid(history, CalculatorType::Dso, |c| c.value >= Decimal::ZERO)
            .map(|c| below_tier(c.value, DSO_TIERS, DSO_FLOOR_POINTS))
            .unwrap_or(0),
        bfr: latest_valid(history, CalculatorType::Bfr, |_| true)
            .map(score_bfr)
            .unwrap_or(0),
        margin: latest_valid(history, CalculatorType::Margin, |_| true)
            .map(|c| at_least_tier(c.value, MARGIN_TIERS, MARGIN_FLOOR_POINTS))
            .unwrap_or(0),
        break_even: latest_valid(history, CalculatorType::BreakEven, |_| true)
            .map(score_break_even)
            .unwrap_or(0),
    };
    let cash_score = (breakdown.dso + breakdown.bfr).min(CASH_MAX);
    let margin_score = (breakdown.margin + breakdown.break_even).min(MARGIN_MAX);

    // Future-dated entries count as done today.
    let days_since_last = history
        .iter()
        .map(|c| c.date)
        .max()
        .map(|latest| (as_of - latest).num_days().max(0));
    let recency_score = days_since_last.map(recency_points).unwrap_or(0);

    let total = (completion_score + cash_score + margin_score + recency_score).min(TOTAL_MAX);
    let level = classify(total);

    tracing::debug!(
        entries = history.len(),
        calculators_used,
        total,
        %level,
        "composite score computed"
    );

    let result = ScoreResult {
        total,
        completion_score,
        cash_score,
        margin_score,
        recency_score,
        level,
        calculators_used,
        days_since_last,
        breakdown,
    };

    let assumptions = serde_json::json!({
        "as_of": as_of,
        "calculator_types": TOTAL_CALCULATOR_TYPES,
        "weights": {
            "completion": COMPLETION_MAX,
            "cash": CASH_MAX,
            "margin": MARGIN_MAX,
            "recency": RECENCY_MAX,
        },
    });

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Composite score: completion, cash, margin and recency sub-scores",
        &assumptions,
        warnings,
        elapsed,
        result,
    )
}

/// Map a total to its level.
pub fn classify(total: u32) -> ScoreLevel {
    if total >= EXCELLENT_CUTOFF {
        ScoreLevel::Excellent
    } else if total >= GOOD_CUTOFF {
        ScoreLevel::Good
    } else if total >= CAUTION_CUTOFF {
        ScoreLevel::Caution
    } else {
        ScoreLevel::ActionNeeded
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// round_half_up(distinct / 9 * 40)
fn completion_points(distinct: u32) -> u32 {
    let raw = Decimal::from(distinct) * Decimal::from(COMPLETION_MAX)
        / Decimal::from(TOTAL_CALCULATOR_TYPES);
    raw.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
        .min(COMPLETION_MAX)
}

/// Graded on BFR in days of revenue when revenue is known. Days beyond the
/// `Decimal` range are off the tier table: the floor when positive, full
/// points otherwise.
fn score_bfr(calc: &Calculation) -> u32 {
    if calc.value <= Decimal::ZERO {
        return SUB_METRIC_MAX;
    }
    match calc.input(REVENUE_KEYS) {
        Some(revenue) if revenue > Decimal::ZERO => {
            match calc
                .value
                .checked_div(revenue)
                .and_then(|ratio| ratio.checked_mul(DAYS_PER_YEAR))
            {
                Some(days) => below_tier(days, BFR_DAYS_TIERS, BFR_FLOOR_POINTS),
                None => BFR_FLOOR_POINTS,
            }
        }
        _ => NEUTRAL_POINTS,
    }
}

/// `value` is the break-even revenue; graded on actual revenue coverage.
/// Coverage too large for `Decimal` earns full points for positive revenue.
fn score_break_even(calc: &Calculation) -> u32 {
    if calc.value <= Decimal::ZERO {
        return SUB_METRIC_MAX;
    }
    match calc.input(REVENUE_KEYS) {
        Some(revenue) => match revenue.checked_div(calc.value) {
            Some(coverage) => {
                at_least_tier(coverage, BREAK_EVEN_COVERAGE_TIERS, BREAK_EVEN_FLOOR_POINTS)
            }
            None if revenue > Decimal::ZERO => SUB_METRIC_MAX,
            None => BREAK_EVEN_FLOOR_POINTS,
        },
        None => NEUTRAL_POINTS,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        ymd(2025, 6, 30)
    }

    fn calc(calculator: CalculatorType, value: Decimal) -> Calculation {
        Calculation::new(calculator, value, today())
    }

    #[test]
    fn test_single_dso_today() {
        let out = compute_score(&[calc(CalculatorType::Dso, dec!(25))], today());
        let r = out.result;
        assert_eq!(r.completion_score, 4);
        assert_eq!(r.cash_score, 10);
        assert_eq!(r.margin_score, 0);
        assert_eq!(r.recency_score, 20);
        assert_eq!(r.total, 34);
        assert_eq!(r.level, ScoreLevel::ActionNeeded);
        assert_eq!(r.calculators_used, 1);
        assert_eq!(r.days_since_last, Some(0));
    }

    #[test]
    fn test_empty_history_scores_zero() {
        let r = compute_score(&[], today()).result;
        assert_eq!(r.total, 0);
        assert_eq!(r.days_since_last, None);
        assert_eq!(r.level, ScoreLevel::ActionNeeded);
    }

    #[test]
    fn test_full_history_is_excellent() {
        let mut history: Vec<Calculation> = CalculatorType::ALL
            .iter()
            .map(|t| calc(*t, dec!(1)))
            .collect();
        history.push(calc(CalculatorType::Dso, dec!(20)));
        history.push(calc(CalculatorType::Bfr, dec!(-5000)));
        history.push(calc(CalculatorType::Margin, dec!(45)));
        history.push(calc(CalculatorType::BreakEven, dec!(50_000)).with_input("ca", dec!(90_000)));
        let r = compute_score(&history, today()).result;
        assert_eq!(r.completion_score, 40);
        assert_eq!(r.cash_score, 20);
        assert_eq!(r.margin_score, 20);
        assert_eq!(r.total, 100);
        assert_eq!(r.level, ScoreLevel::Excellent);
    }

    #[test]
    fn test_completion_rounding() {
        assert_eq!(completion_points(0), 0);
        assert_eq!(completion_points(1), 4);
        assert_eq!(completion_points(2), 9);
        assert_eq!(completion_points(5), 22);
        assert_eq!(completion_points(8), 36);
        assert_eq!(completion_points(9), 40);
    }

    #[test]
    fn test_negative_dso_ignored_with_warning() {
        let out = compute_score(&[calc(CalculatorType::Dso, dec!(-12))], today());
        assert_eq!(out.result.cash_score, 0);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("negative DSO"));
    }

    #[test]
    fn test_dso_uses_latest_entry() {
        let history = vec![
            Calculation::new(CalculatorType::Dso, dec!(20), ymd(2025, 1, 1)),
            Calculation::new(CalculatorType::Dso, dec!(70), ymd(2025, 6, 1)),
        ];
        let r = compute_score(&history, today()).result;
        assert_eq!(r.breakdown.dso, 2);
    }

    #[test]
    fn test_bfr_in_days_of_revenue() {
        let with_ca = |value: Decimal| {
            score_bfr(&calc(CalculatorType::Bfr, value).with_input("ca", dec!(365_000)))
        };
        assert_eq!(with_ca(dec!(20_000)), 10); // 20 days
        assert_eq!(with_ca(dec!(45_000)), 7);
        assert_eq!(with_ca(dec!(75_000)), 4);
        assert_eq!(with_ca(dec!(120_000)), 2);
        assert_eq!(with_ca(dec!(-1)), 10);
    }

    #[test]
    fn test_bfr_without_revenue() {
        assert_eq!(score_bfr(&calc(CalculatorType::Bfr, dec!(0))), 10);
        assert_eq!(score_bfr(&calc(CalculatorType::Bfr, dec!(80_000))), 5);
    }

    #[test]
    fn test_break_even_coverage() {
        let be = |value: Decimal, ca: Option<Decimal>| {
            let c = calc(CalculatorType::BreakEven, value);
            score_break_even(&match ca {
                Some(ca) => c.with_input("ca", ca),
                None => c,
            })
        };
        assert_eq!(be(dec!(0), None), 10);
        assert_eq!(be(dec!(100), Some(dec!(150))), 10);
        assert_eq!(be(dec!(100), Some(dec!(125))), 7);
        assert_eq!(be(dec!(100), Some(dec!(100))), 4);
        assert_eq!(be(dec!(100), Some(dec!(80))), 2);
        assert_eq!(be(dec!(100), None), 5);
    }

    #[test]
    fn test_sub_metrics_beyond_decimal_range() {
        let bfr = calc(CalculatorType::Bfr, Decimal::MAX).with_input("ca", dec!(1));
        assert_eq!(score_bfr(&bfr), BFR_FLOOR_POINTS);

        let tiny = dec!(0.0000000000000000000001);
        let rich = calc(CalculatorType::BreakEven, tiny).with_input("ca", dec!(100_000_000_000));
        assert_eq!(score_break_even(&rich), SUB_METRIC_MAX);
        let losing =
            calc(CalculatorType::BreakEven, tiny).with_input("ca", dec!(-100_000_000_000));
        assert_eq!(score_break_even(&losing), BREAK_EVEN_FLOOR_POINTS);

        let r = compute_score(&[bfr, rich], today()).result;
        assert_eq!(r.cash_score, 2);
        assert_eq!(r.margin_score, 10);
    }

    #[test]
    fn test_recency_decays_and_ignores_future_dates() {
        let at = |date: NaiveDate| {
            compute_score(&[Calculation::new(CalculatorType::Roi, dec!(1), date)], today())
                .result
                .recency_score
        };
        assert_eq!(at(ymd(2025, 6, 25)), 20);
        assert_eq!(at(ymd(2025, 6, 10)), 15);
        assert_eq!(at(ymd(2025, 4, 15)), 10);
        assert_eq!(at(ymd(2024, 12, 1)), 5);
        assert_eq!(at(ymd(2025, 8, 1)), 20);
    }

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(classify(100), ScoreLevel::Excellent);
        assert_eq!(classify(75), ScoreLevel::Excellent);
        assert_eq!(classify(74), ScoreLevel::Good);
        assert_eq!(classify(55), ScoreLevel::Good);
        assert_eq!(classify(54), ScoreLevel::Caution);
        assert_eq!(classify(35), ScoreLevel::Caution);
        assert_eq!(classify(34), ScoreLevel::ActionNeeded);
        assert_eq!(classify(0), ScoreLevel::ActionNeeded);
    }

    #[test]
    fn test_score_history_uses_supplied_date() {
        let input = ScoreInput {
            history: vec![calc(CalculatorType::Margin, dec!(25))],
            as_of: Some(today()),
        };
        let r = score_history(&input).result;
        assert_eq!(r.margin_score, 7);
        assert_eq!(r.recency_score, 20);
    }

    #[test]
    fn test_level_serializes_snake_case() {
        let json = serde_json::to_value(ScoreLevel::ActionNeeded).unwrap();
        assert_eq!(json, "action_needed");
    }
}
