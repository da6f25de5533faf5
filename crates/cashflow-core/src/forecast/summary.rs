//! Dashboard summary of a forecast.
//!
//! Pre-computed KPIs are passed in explicitly as a [`KpiSnapshot`] rather
//! than read from shared state, so the summary is a pure function of its
//! arguments.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::insights::format_runway;
use super::policy::{RiskLevel, TrendDirection};
use super::projector::CashFlowForecast;
use crate::types::Money;

/// Pre-computed dashboard figures supplied by the host application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiSnapshot {
    pub cash_balance: Option<Money>,
    pub monthly_revenue: Option<Money>,
    pub monthly_burn: Option<Money>,
    pub dso_days: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiLine {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub headline: String,
    pub runway_display: String,
    pub risk_level: RiskLevel,
    pub trend: TrendDirection,
    pub baseline_end: Option<Money>,
    pub optimistic_end: Option<Money>,
    pub pessimistic_end: Option<Money>,
    /// Optimistic minus pessimistic end value.
    pub scenario_spread: Money,
    pub kpi_lines: Vec<KpiLine>,
}

/// Summarise a forecast, optionally enriched with a KPI snapshot.
pub fn summarize_forecast(forecast: &CashFlowForecast, kpis: Option<&KpiSnapshot>) -> ForecastSummary {
    let metrics = &forecast.metrics;
    let runway_display = format_runway(metrics.runway, metrics.runway_capped);

    let headline = match metrics.risk_level {
        RiskLevel::Critical => {
            format!("Cash runway is critical: {runway_display} months under stress")
        }
        RiskLevel::Warning => {
            format!("Cash runway needs attention: {runway_display} months under stress")
        }
        RiskLevel::Safe => {
            format!("Cash position is comfortable: {runway_display} months of runway under stress")
        }
    };

    let baseline_end = forecast.baseline.last().map(|p| p.value);
    let optimistic_end = forecast.optimistic.last().map(|p| p.value);
    let pessimistic_end = forecast.pessimistic.last().map(|p| p.value);
    let scenario_spread = match (optimistic_end, pessimistic_end) {
        (Some(o), Some(p)) => o - p,
        _ => Decimal::ZERO,
    };

    ForecastSummary {
        headline,
        runway_display,
        risk_level: metrics.risk_level,
        trend: metrics.trend,
        baseline_end,
        optimistic_end,
        pessimistic_end,
        scenario_spread,
        kpi_lines: kpis.map(kpi_lines).unwrap_or_default(),
    }
}

fn kpi_lines(kpis: &KpiSnapshot) -> Vec<KpiLine> {
    let mut lines = Vec::new();
    let mut push = |label: &str, value: String| {
        lines.push(KpiLine {
            label: label.to_string(),
            value,
        })
    };

    if let Some(cash) = kpis.cash_balance {
        push("Cash balance", cash.round_dp(2).to_string());
    }
    if let Some(revenue) = kpis.monthly_revenue {
        push("Monthly revenue", revenue.round_dp(2).to_string());
    }
    if let Some(burn) = kpis.monthly_burn {
        push("Monthly burn", burn.round_dp(2).to_string());
    }
    // Ratios are omitted, not defaulted, when the denominator is not positive.
    if let (Some(burn), Some(revenue)) = (kpis.monthly_burn, kpis.monthly_revenue) {
        if revenue > Decimal::ZERO {
            push("Burn multiple", (burn / revenue).round_dp(2).normalize().to_string());
        }
    }
    if let (Some(cash), Some(burn)) = (kpis.cash_balance, kpis.monthly_burn) {
        if burn > Decimal::ZERO {
            push("Months of cash at current burn", (cash / burn).round_dp(1).normalize().to_string());
        }
    }
    if let Some(dso) = kpis.dso_days {
        push("DSO (days)", dso.round_dp(0).to_string());
    }

    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
