//! Scenario cash-flow projection.
//!
//! Fits a per-period trend on the historical net series and projects three
//! scenarios from the starting balance:
//! - **Baseline**:    `start + delta * k`
//! - **Optimistic**:  `start + (delta + |delta| * optimistic_adjustment) * k`
//! - **Pessimistic**: `start + (delta + |delta| * pessimistic_adjustment) * k`
//!
//! The adjustments scale the rate of change rather than the balance, so the
//! scenarios fan out over the horizon. Runway, and through it the risk
//! level, is read from the pessimistic path only.
//!
//! Sparse history never fails: the forecast is still produced, with
//! confidence scaled down and a warning attached. Balances and steps use
//! checked arithmetic; values beyond the `Decimal` range are `InvalidInput`.
//!
//! All calculations use `rust_decimal::Decimal`. No `f64`.

use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::insights::{generate_insights, Insight, InsightContext};
use super::policy::{ForecastPolicy, RiskLevel, TrendDirection, UNSCORED_FIT_QUALITY};
use super::summary::KpiSnapshot;
use super::trend::{fit_trend, mean_abs, TrendFit};
use crate::aggregation::buckets::{aggregate, AggregatedPeriod, AggregationInput, Bucketing};
use crate::aggregation::records::RecordInput;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::{CashflowError, CashflowResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Input for projecting pre-aggregated history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub historical: Vec<AggregatedPeriod>,
    /// Number of future periods to project. Must be at least 1.
    pub horizon: u32,
    /// Current cash balance. Falls back to the KPI snapshot, then to the
    /// cumulative net of the whole history.
    #[serde(default)]
    pub current_balance: Option<Money>,
    #[serde(default)]
    pub kpi_snapshot: Option<KpiSnapshot>,
    #[serde(default)]
    pub bucketing: Bucketing,
    #[serde(default)]
    pub policy: ForecastPolicy,
    /// Reference timestamp; defaults to now.
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
}

impl ProjectionInput {
    pub fn new(historical: Vec<AggregatedPeriod>, horizon: u32) -> Self {
        Self {
            historical,
            horizon,
            current_balance: None,
            kpi_snapshot: None,
            bucketing: Bucketing::default(),
            policy: ForecastPolicy::default(),
            as_of: None,
        }
    }
}

/// Input for forecasting straight from imported records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordForecastInput {
    pub records: Vec<RecordInput>,
    pub horizon: u32,
    #[serde(default)]
    pub current_balance: Option<Money>,
    #[serde(default)]
    pub kpi_snapshot: Option<KpiSnapshot>,
    #[serde(default)]
    pub bucketing: Bucketing,
    #[serde(default)]
    pub fill_gaps: bool,
    #[serde(default)]
    pub policy: ForecastPolicy,
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
}

/// One point on a scenario curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDataPoint {
    pub period_key: String,
    pub label: String,
    /// First day of the projected period.
    pub date: NaiveDate,
    /// Projected balance at the end of the period.
    pub value: Money,
}

/// Where the starting balance came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceSource {
    Supplied,
    KpiSnapshot,
    HistoricalCumulativeNet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetrics {
    /// Months before the pessimistic balance goes below zero.
    pub runway: u32,
    /// True when the balance never went negative within the evaluation
    /// limit; `runway` is then a lower bound.
    pub runway_capped: bool,
    pub risk_level: RiskLevel,
    pub trend: TrendDirection,
    /// 0 to 1.
    pub confidence: Decimal,
    /// Fitted change in net cash flow per period.
    pub monthly_delta: Money,
    pub r_squared: Option<Decimal>,
}

/// Full projector output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowForecast {
    /// Historical periods used as context (the fit window).
    pub historical: Vec<AggregatedPeriod>,
    pub baseline: Vec<ForecastDataPoint>,
    pub optimistic: Vec<ForecastDataPoint>,
    pub pessimistic: Vec<ForecastDataPoint>,
    pub metrics: ForecastMetrics,
    pub insights: Vec<Insight>,
    pub min_data_months: u32,
    pub periods_used: u32,
    pub starting_balance: Money,
    pub balance_source: BalanceSource,
    pub bucketing: Bucketing,
    pub generated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project `horizon` periods from monthly history with the default policy.
pub fn project(
    historical: &[AggregatedPeriod],
    horizon: u32,
    current_balance: Option<Money>,
) -> CashflowResult<ComputationOutput<CashFlowForecast>> {
    let mut input = ProjectionInput::new(historical.to_vec(), horizon);
    input.current_balance = current_balance;
    project_cash_flow(&input)
}

/// Project baseline, optimistic and pessimistic scenarios.
pub fn project_cash_flow(
    input: &ProjectionInput,
) -> CashflowResult<ComputationOutput<CashFlowForecast>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let policy = &input.policy;
    policy.validate()?;
    validate_horizon(input.horizon, policy)?;

    let generated_at = input.as_of.unwrap_or_else(Utc::now);
    let bucketing = input.bucketing;
    let months_per_period = bucketing.months_per_period();

    validate_periods(&input.historical, bucketing)?;

    let mut history = input.historical.clone();
    history.sort_by_key(|p| p.start);
    let window_len = (policy.history_window as usize).min(history.len());
    let window: Vec<AggregatedPeriod> = history[history.len() - window_len..].to_vec();
    let nets: Vec<Money> = window.iter().map(|p| p.net).collect();

    let (starting_balance, balance_source) = resolve_starting_balance(input, &history)?;
    let fit = fit_trend(&nets, policy.trend_method)?;

    // Scenario steps: adjust the rate of change, never the level
    let baseline_step = fit.delta;
    let optimistic_step = scenario_step(fit.delta, policy.optimistic_adjustment)?;
    let pessimistic_step = scenario_step(fit.delta, policy.pessimistic_adjustment)?;

    let anchor = match window.last() {
        Some(last) => bucketing.bucket_start(last.start),
        None => bucketing.bucket_start(generated_at.date_naive()),
    };
    let baseline = build_series(anchor, bucketing, starting_balance, baseline_step, input.horizon)?;
    let optimistic =
        build_series(anchor, bucketing, starting_balance, optimistic_step, input.horizon)?;
    let pessimistic =
        build_series(anchor, bucketing, starting_balance, pessimistic_step, input.horizon)?;

    let (runway, runway_capped) = compute_runway(
        starting_balance,
        pessimistic_step,
        input.horizon,
        policy.runway_cap_months,
        months_per_period,
    )?;
    let risk_level = policy.classify_risk(runway);
    let trend = classify_trend(fit.delta, &nets, policy.trend_tolerance)?;

    let min_periods = min_periods(policy.min_data_months, months_per_period);
    let periods_used = nets.len() as u32;
    let confidence = compute_confidence(periods_used, min_periods, &fit, policy.max_confidence);

    if periods_used < min_periods {
        warnings.push(format!(
            "Only {periods_used} historical periods available (minimum {min_periods}); \
             confidence reduced to {confidence}."
        ));
        tracing::debug!(periods_used, min_periods, %confidence, "forecasting on limited history");
    }
    if history.len() > window_len {
        warnings.push(format!(
            "Trend fitted on the most recent {window_len} of {} periods.",
            history.len()
        ));
    }

    tracing::debug!(
        ?balance_source,
        %starting_balance,
        delta = %fit.delta,
        runway,
        %risk_level,
        "projected cash flow scenarios"
    );

    let insights = generate_insights(&InsightContext {
        starting_balance,
        runway,
        runway_capped,
        risk_level,
        trend,
        monthly_delta: fit.delta,
        periods_used,
        min_periods,
    });

    let forecast = CashFlowForecast {
        historical: window,
        baseline,
        optimistic,
        pessimistic,
        metrics: ForecastMetrics {
            runway,
            runway_capped,
            risk_level,
            trend,
            confidence,
            monthly_delta: fit.delta,
            r_squared: fit.r_squared,
        },
        insights,
        min_data_months: policy.min_data_months,
        periods_used,
        starting_balance,
        balance_source,
        bucketing,
        generated_at,
    };

    let assumptions = serde_json::json!({
        "horizon": input.horizon,
        "bucketing": bucketing,
        "balance_source": balance_source,
        "policy": policy,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Linear trend scenario projection (baseline / optimistic / pessimistic)",
        &assumptions,
        warnings,
        elapsed,
        forecast,
    ))
}

/// Aggregate imported records, then project them.
pub fn forecast_from_records(
    input: &RecordForecastInput,
) -> CashflowResult<ComputationOutput<CashFlowForecast>> {
    let aggregated = aggregate(&AggregationInput {
        records: input.records.clone(),
        bucketing: input.bucketing,
        fill_gaps: input.fill_gaps,
    });

    let projection = ProjectionInput {
        historical: aggregated.result.periods,
        horizon: input.horizon,
        current_balance: input.current_balance,
        kpi_snapshot: input.kpi_snapshot.clone(),
        bucketing: input.bucketing,
        policy: input.policy.clone(),
        as_of: input.as_of,
    };

    let mut output = project_cash_flow(&projection)?;
    let mut warnings = aggregated.warnings;
    warnings.append(&mut output.warnings);
    output.warnings = warnings;
    output.metadata.computation_time_us += aggregated.metadata.computation_time_us;
    Ok(output)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_horizon(horizon: u32, policy: &ForecastPolicy) -> CashflowResult<()> {
    if horizon == 0 {
        return Err(CashflowError::InvalidInput {
            field: "horizon".into(),
            reason: "Horizon must be at least 1 period.".into(),
        });
    }
    if horizon > policy.max_horizon {
        return Err(CashflowError::InvalidInput {
            field: "horizon".into(),
            reason: format!("Horizon cannot exceed {} periods.", policy.max_horizon),
        });
    }
    Ok(())
}

/// Every period must carry the key its start date has under `bucketing`,
/// which also catches quarterly history sent as monthly.
fn validate_periods(periods: &[AggregatedPeriod], bucketing: Bucketing) -> CashflowResult<()> {
    for period in periods {
        let expected = bucketing.period_key(period.start);
        if period.period_key != expected {
            return Err(CashflowError::InvalidInput {
                field: "historical".into(),
                reason: format!(
                    "Period '{}' starting {} does not match {:?} bucketing (expected '{}').",
                    period.period_key, period.start, bucketing, expected
                ),
            });
        }
    }
    Ok(())
}

fn resolve_starting_balance(
    input: &ProjectionInput,
    history: &[AggregatedPeriod],
) -> CashflowResult<(Money, BalanceSource)> {
    if let Some(balance) = input.current_balance {
        return Ok((balance, BalanceSource::Supplied));
    }
    if let Some(balance) = input.kpi_snapshot.as_ref().and_then(|k| k.cash_balance) {
        return Ok((balance, BalanceSource::KpiSnapshot));
    }
    let cumulative = history
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.net))
        .ok_or_else(|| CashflowError::overflow("historical"))?;
    Ok((cumulative, BalanceSource::HistoricalCumulativeNet))
}

/// `delta + |delta| * adjustment`
fn scenario_step(delta: Money, adjustment: Decimal) -> CashflowResult<Money> {
    delta
        .abs()
        .checked_mul(adjustment)
        .and_then(|shift| delta.checked_add(shift))
        .ok_or_else(|| CashflowError::overflow("historical"))
}

/// `start + step * k`, `None` on overflow.
fn balance_at(start_balance: Money, step: Money, k: u32) -> Option<Money> {
    step.checked_mul(Decimal::from(k))
        .and_then(|moved| start_balance.checked_add(moved))
}

/// Points `1..=horizon` periods after `anchor`.
fn build_series(
    anchor: NaiveDate,
    bucketing: Bucketing,
    start_balance: Money,
    step: Money,
    horizon: u32,
) -> CashflowResult<Vec<ForecastDataPoint>> {
    (1..=horizon)
        .map(|k| {
            let date = bucketing.advance(anchor, k).ok_or_else(|| {
                CashflowError::DateError(format!(
                    "Forecast period {k} after {anchor} is outside the supported calendar"
                ))
            })?;
            let value = balance_at(start_balance, step, k)
                .ok_or_else(|| CashflowError::overflow("current_balance"))?;
            Ok(ForecastDataPoint {
                period_key: bucketing.period_key(date),
                label: bucketing.label(date),
                date,
                value,
            })
        })
        .collect()
}

/// Leading periods with a non-negative pessimistic balance, in months.
///
/// The path is linear, so it is evaluated past the horizon up to the runway
/// cap. Returns `(runway, capped)`.
fn compute_runway(
    start_balance: Money,
    pessimistic_step: Money,
    horizon: u32,
    runway_cap_months: u32,
    months_per_period: u32,
) -> CashflowResult<(u32, bool)> {
    if start_balance < Decimal::ZERO {
        return Ok((0, false));
    }
    let limit = horizon.max(runway_cap_months.div_ceil(months_per_period));
    for k in 1..=limit {
        let balance = balance_at(start_balance, pessimistic_step, k)
            .ok_or_else(|| CashflowError::overflow("current_balance"))?;
        if balance < Decimal::ZERO {
            return Ok(((k - 1) * months_per_period, false));
        }
    }
    Ok((limit * months_per_period, true))
}

fn classify_trend(
    delta: Money,
    nets: &[Money],
    tolerance: Decimal,
) -> CashflowResult<TrendDirection> {
    let band = mean_abs(nets)
        .and_then(|mean| mean.checked_mul(tolerance))
        .ok_or_else(|| CashflowError::overflow("historical"))?;
    Ok(if delta > band {
        TrendDirection::Improving
    } else if delta < -band {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    })
}

fn min_periods(min_data_months: u32, months_per_period: u32) -> u32 {
    min_data_months.div_ceil(months_per_period).max(1)
}

fn compute_confidence(
    periods_used: u32,
    min_periods: u32,
    fit: &TrendFit,
    max_confidence: Decimal,
) -> Decimal {
    if periods_used == 0 {
        return Decimal::ZERO;
    }
    let coverage = Decimal::from(periods_used.min(min_periods)) / Decimal::from(min_periods);
    let fit_quality = match fit.r_squared {
        Some(r2) => dec!(0.5) + dec!(0.5) * r2,
        None => UNSCORED_FIT_QUALITY,
    };
    (max_confidence * coverage * fit_quality)
        .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
        .clamp(Decimal::ZERO, Decimal::ONE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::insights::InsightType;
    use crate::forecast::policy::TrendMethod;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly(nets: &[Decimal]) -> Vec<AggregatedPeriod> {
        nets.iter()
            .enumerate()
            .map(|(i, net)| {
                let start = Bucketing::Month.advance(ymd(2025, 1, 1), i as u32).unwrap();
                AggregatedPeriod::from_net(Bucketing::Month, start, *net)
            })
            .collect()
    }

    fn values(points: &[ForecastDataPoint]) -> Vec<Decimal> {
        points.iter().map(|p| p.value).collect()
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_reference_scenario() {
        let history = monthly(&[dec!(1000), dec!(1200), dec!(1100)]);
        let out = project(&history, 3, Some(dec!(1100))).unwrap();
        let f = &out.result;

        assert_eq!(f.metrics.monthly_delta, dec!(50));
        assert_eq!(values(&f.baseline), vec![dec!(1150), dec!(1200), dec!(1250)]);
        assert_eq!(
            values(&f.optimistic),
            vec![dec!(1157.5), dec!(1215), dec!(1272.5)]
        );
        assert_eq!(values(&f.pessimistic), vec![dec!(1140), dec!(1180), dec!(1220)]);
        assert_eq!(f.balance_source, BalanceSource::Supplied);
    }

    #[test]
    fn test_forecast_dates_continue_history() {
        let history = monthly(&[dec!(1000), dec!(1200), dec!(1100)]);
        let f = project(&history, 3, Some(dec!(1100))).unwrap().result;
        let keys: Vec<&str> = f.baseline.iter().map(|p| p.period_key.as_str()).collect();
        assert_eq!(keys, vec!["2025-04", "2025-05", "2025-06"]);
        assert_eq!(f.baseline[0].label, "Apr 2025");
        assert_eq!(f.baseline[0].date, ymd(2025, 4, 1));
    }

    #[test]
    fn test_series_lengths_equal_horizon() {
        let history = monthly(&[dec!(10), dec!(20)]);
        for horizon in [1, 6, 24] {
            let f = project(&history, horizon, Some(dec!(0))).unwrap().result;
            assert_eq!(f.baseline.len(), horizon as usize);
            assert_eq!(f.optimistic.len(), horizon as usize);
            assert_eq!(f.pessimistic.len(), horizon as usize);
        }
    }

    #[test]
    fn test_zero_horizon_fails_fast() {
        let err = project(&monthly(&[dec!(1)]), 0, None).unwrap_err();
        match err {
            CashflowError::InvalidInput { field, .. } => assert_eq!(field, "horizon"),
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_horizon_above_policy_max_rejected() {
        let mut input = ProjectionInput::new(monthly(&[dec!(1)]), 61);
        input.current_balance = Some(dec!(0));
        assert!(project_cash_flow(&input).is_err());
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let mut input = ProjectionInput::new(monthly(&[dec!(1)]), 3);
        input.policy.pessimistic_adjustment = dec!(0.3);
        assert!(matches!(
            project_cash_flow(&input),
            Err(CashflowError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_empty_history_is_safe() {
        let mut input = ProjectionInput::new(vec![], 3);
        input.current_balance = Some(Decimal::ZERO);
        input.as_of = Some(fixed_now());
        let out = project_cash_flow(&input).unwrap();
        let f = &out.result;

        assert_eq!(values(&f.baseline), vec![Decimal::ZERO; 3]);
        assert_eq!(f.metrics.confidence, Decimal::ZERO);
        assert_eq!(f.metrics.trend, TrendDirection::Stable);
        assert_eq!(f.periods_used, 0);
        // Starts the month after as_of
        assert_eq!(f.baseline[0].period_key, "2025-05");
        assert_eq!(f.generated_at, fixed_now());
        assert!(!out.warnings.is_empty());
        assert!(f.insights.iter().any(|i| i.title == "Limited history"));
    }

    #[test]
    fn test_balance_defaults_to_cumulative_net() {
        let history = monthly(&[dec!(300), dec!(-100), dec!(250)]);
        let f = project(&history, 2, None).unwrap().result;
        assert_eq!(f.starting_balance, dec!(450));
        assert_eq!(f.balance_source, BalanceSource::HistoricalCumulativeNet);
    }

    #[test]
    fn test_balance_from_kpi_snapshot() {
        let mut input = ProjectionInput::new(monthly(&[dec!(300), dec!(200)]), 2);
        input.kpi_snapshot = Some(KpiSnapshot {
            cash_balance: Some(dec!(9_000)),
            ..Default::default()
        });
        let f = project_cash_flow(&input).unwrap().result;
        assert_eq!(f.starting_balance, dec!(9_000));
        assert_eq!(f.balance_source, BalanceSource::KpiSnapshot);

        // Explicit balance wins over the snapshot
        input.current_balance = Some(dec!(1));
        let f = project_cash_flow(&input).unwrap().result;
        assert_eq!(f.balance_source, BalanceSource::Supplied);
    }

    #[test]
    fn test_runway_from_pessimistic_path() {
        // delta -500, pessimistic step -600
        let history = monthly(&[dec!(0), dec!(-500), dec!(-1000)]);
        let f = project(&history, 6, Some(dec!(2_000))).unwrap().result;
        // 2000 - 600k >= 0 for k = 1..3, negative at k = 4
        assert_eq!(f.metrics.runway, 3);
        assert!(!f.metrics.runway_capped);
        assert_eq!(f.metrics.risk_level, RiskLevel::Warning);
        assert_eq!(f.metrics.trend, TrendDirection::Declining);
        // Baseline alone would last 4 months
        assert!(f.baseline[3].value >= Decimal::ZERO);
    }

    #[test]
    fn test_runway_extends_past_horizon() {
        let history = monthly(&[dec!(0), dec!(-100), dec!(-200)]);
        // pessimistic step -120: crosses at k = 9
        let f = project(&history, 3, Some(dec!(1_000))).unwrap().result;
        assert_eq!(f.metrics.runway, 8);
        assert!(!f.metrics.runway_capped);
        assert_eq!(f.metrics.risk_level, RiskLevel::Safe);
    }

    #[test]
    fn test_runway_capped_never_infinite() {
        let history = monthly(&[dec!(100), dec!(200), dec!(300)]);
        let f = project(&history, 3, Some(dec!(0))).unwrap().result;
        assert_eq!(f.metrics.runway, 12);
        assert!(f.metrics.runway_capped);

        // Long horizon raises the cap to the horizon
        let f = project(&history, 24, Some(dec!(0))).unwrap().result;
        assert_eq!(f.metrics.runway, 24);
        assert!(f.metrics.runway >= 24);
    }

    #[test]
    fn test_negative_starting_balance_has_zero_runway() {
        let history = monthly(&[dec!(100), dec!(200), dec!(300)]);
        let f = project(&history, 3, Some(dec!(-10))).unwrap().result;
        assert_eq!(f.metrics.runway, 0);
        assert_eq!(f.metrics.risk_level, RiskLevel::Critical);
        assert_eq!(f.insights[0].insight_type, InsightType::Critical);
        assert_eq!(f.insights[0].title, "Cash balance is already negative");
    }

    #[test]
    fn test_trend_stable_band() {
        // delta 10 against mean |net| 1000: band 20
        let history = monthly(&[dec!(990), dec!(1000), dec!(1010)]);
        let f = project(&history, 3, Some(dec!(5_000))).unwrap().result;
        assert_eq!(f.metrics.trend, TrendDirection::Stable);
    }

    #[test]
    fn test_confidence_scaled_by_history() {
        let full = project(&monthly(&[dec!(10), dec!(20), dec!(30)]), 3, Some(dec!(0)))
            .unwrap()
            .result;
        // perfect line: 0.95 * 1 * 1
        assert_eq!(full.metrics.confidence, dec!(0.95));

        let partial = project(&monthly(&[dec!(10), dec!(20)]), 3, Some(dec!(0)))
            .unwrap()
            .result;
        // 0.95 * 2/3 * 1
        assert_eq!(partial.metrics.confidence, dec!(0.6333));
        assert!(partial.metrics.confidence < full.metrics.confidence);

        let single = project(&monthly(&[dec!(10)]), 3, Some(dec!(0))).unwrap().result;
        // 0.95 * 1/3 * 0.75
        assert_eq!(single.metrics.confidence, dec!(0.2375));
    }

    #[test]
    fn test_reference_confidence_uses_r_squared() {
        let f = project(&monthly(&[dec!(1000), dec!(1200), dec!(1100)]), 3, Some(dec!(1100)))
            .unwrap()
            .result;
        // 0.95 * (0.5 + 0.5 * 0.25) = 0.59375
        assert_eq!(f.metrics.confidence, dec!(0.5938));
        assert_eq!(f.metrics.r_squared, Some(dec!(0.25)));
    }

    #[test]
    fn test_history_window_limits_fit() {
        let mut nets = vec![dec!(5_000); 6];
        nets.extend([dec!(100), dec!(200), dec!(300)]);
        let mut input = ProjectionInput::new(monthly(&nets), 3);
        input.current_balance = Some(dec!(0));
        input.policy.history_window = 3;
        let out = project_cash_flow(&input).unwrap();
        assert_eq!(out.result.historical.len(), 3);
        assert_eq!(out.result.metrics.monthly_delta, dec!(100));
        assert!(out.warnings.iter().any(|w| w.contains("most recent 3 of 9")));
    }

    #[test]
    fn test_unsorted_history_is_ordered() {
        let mut history = monthly(&[dec!(1000), dec!(1200), dec!(1100)]);
        history.reverse();
        let f = project(&history, 1, Some(dec!(1100))).unwrap().result;
        assert_eq!(f.metrics.monthly_delta, dec!(50));
        assert_eq!(f.historical[0].period_key, "2025-01");
    }

    #[test]
    fn test_quarterly_projection() {
        let history: Vec<AggregatedPeriod> = [dec!(3000), dec!(3300)]
            .iter()
            .enumerate()
            .map(|(i, net)| {
                let start = Bucketing::Quarter.advance(ymd(2025, 1, 1), i as u32).unwrap();
                AggregatedPeriod::from_net(Bucketing::Quarter, start, *net)
            })
            .collect();
        let mut input = ProjectionInput::new(history, 2);
        input.bucketing = Bucketing::Quarter;
        input.current_balance = Some(dec!(10_000));
        let f = project_cash_flow(&input).unwrap().result;
        let keys: Vec<&str> = f.baseline.iter().map(|p| p.period_key.as_str()).collect();
        assert_eq!(keys, vec!["2025-Q3", "2025-Q4"]);
        // Cap of 12 months is 4 quarters; runway reported in months
        assert_eq!(f.metrics.runway, 12);
        // One quarter covers the 3-month minimum
        assert!(out_has_no_history_warning(&f));
    }

    fn out_has_no_history_warning(f: &CashFlowForecast) -> bool {
        f.insights.iter().all(|i| i.title != "Limited history")
    }

    #[test]
    fn test_trend_method_changes_delta() {
        let mut input = ProjectionInput::new(monthly(&[dec!(0), dec!(100), dec!(200), dec!(0)]), 3);
        input.current_balance = Some(dec!(1_000));
        input.policy.trend_method = TrendMethod::WeightedRecent;
        let f = project_cash_flow(&input).unwrap().result;
        assert_eq!(f.metrics.monthly_delta, dec!(-50));
        assert_eq!(f.metrics.r_squared, None);
    }

    #[test]
    fn test_oversized_history_is_invalid_input() {
        let huge = dec!(1_000_000_000_000_000);
        let err = project(&monthly(&[huge, -huge, huge]), 3, Some(dec!(0))).unwrap_err();
        assert!(matches!(
            err,
            CashflowError::InvalidInput { ref field, .. } if field == "historical"
        ));
    }

    #[test]
    fn test_balance_overflow_is_invalid_input() {
        let history = monthly(&[dec!(0), dec!(1_000_000_000_000_000_000_000_000)]);
        let mut input = ProjectionInput::new(history, 60);
        input.current_balance = Some(Decimal::MAX - dec!(1));
        input.policy.trend_method = TrendMethod::AverageDelta;
        let err = project_cash_flow(&input).unwrap_err();
        assert!(matches!(
            err,
            CashflowError::InvalidInput { ref field, .. } if field == "current_balance"
        ));
    }

    #[test]
    fn test_cumulative_balance_overflow_is_invalid_input() {
        let history = monthly(&[Decimal::MAX, Decimal::MAX]);
        assert!(matches!(
            project(&history, 3, None),
            Err(CashflowError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_period_key_must_match_bucketing() {
        let history: Vec<AggregatedPeriod> = [dec!(3000), dec!(3300)]
            .iter()
            .enumerate()
            .map(|(i, net)| {
                let start = Bucketing::Quarter.advance(ymd(2025, 1, 1), i as u32).unwrap();
                AggregatedPeriod::from_net(Bucketing::Quarter, start, *net)
            })
            .collect();
        // Quarterly periods sent without a bucketing
        let input = ProjectionInput::new(history.clone(), 2);
        let err = project_cash_flow(&input).unwrap_err();
        match err {
            CashflowError::InvalidInput { field, reason } => {
                assert_eq!(field, "historical");
                assert!(reason.contains("2025-Q1"), "{reason}");
            }
            e => panic!("Expected InvalidInput, got {e:?}"),
        }

        let mut mislabelled = monthly(&[dec!(1), dec!(2)]);
        mislabelled[1].period_key = "2025-07".into();
        assert!(project(&mislabelled, 2, None).is_err());
    }

    #[test]
    fn test_forecast_from_records_chains_aggregation() {
        let rec = |date: &str, amount: Decimal| RecordInput {
            date: date.into(),
            amount,
            kind: None,
            category: None,
            counterparty: None,
        };
        let input = RecordForecastInput {
            records: vec![
                rec("2025-01-10", dec!(1500)),
                rec("2025-01-20", dec!(-500)),
                rec("2025-02-10", dec!(1200)),
                rec("2025-03-05", dec!(1100)),
                rec("bad-date", dec!(1_000_000)),
            ],
            horizon: 3,
            current_balance: Some(dec!(1100)),
            kpi_snapshot: None,
            bucketing: Bucketing::Month,
            fill_gaps: false,
            policy: ForecastPolicy::default(),
            as_of: Some(fixed_now()),
        };
        let out = forecast_from_records(&input).unwrap();
        assert_eq!(values(&out.result.baseline), vec![dec!(1150), dec!(1200), dec!(1250)]);
        assert!(out.warnings.iter().any(|w| w.contains("unparseable")));
    }
}
