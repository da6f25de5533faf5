//! Deterministic insight generation.
//!
//! Insights come from a fixed rule table: each rule names the metric state
//! that triggers it and the text it renders. Emission order is table order
//! (critical rules first, then warnings, then positives), so the same
//! metrics always produce the same list.
//!
//! Templates accept `{runway}`, `{delta}`, `{periods}` and `{min_periods}`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::policy::{RiskLevel, TrendDirection};
use crate::types::Money;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    Positive,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

/// Metric state a rule reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightTrigger {
    NegativeBalance,
    RiskCritical,
    RiskWarning,
    TrendDeclining,
    LimitedHistory,
    RiskSafe,
    TrendImproving,
}

pub struct InsightRule {
    pub trigger: InsightTrigger,
    pub insight_type: InsightType,
    pub title: &'static str,
    pub description: &'static str,
    pub recommendation: Option<&'static str>,
}

/// Everything the rules can look at.
#[derive(Debug, Clone)]
pub struct InsightContext {
    pub starting_balance: Money,
    pub runway: u32,
    pub runway_capped: bool,
    pub risk_level: RiskLevel,
    pub trend: TrendDirection,
    pub monthly_delta: Money,
    pub periods_used: u32,
    pub min_periods: u32,
}

pub const INSIGHT_RULES: &[InsightRule] = &[
    InsightRule {
        trigger: InsightTrigger::NegativeBalance,
        insight_type: InsightType::Critical,
        title: "Cash balance is already negative",
        description: "The starting cash position is below zero, so there is no runway under stress.",
        recommendation: Some(
            "Secure short-term financing or accelerate collections before committing new spend.",
        ),
    },
    InsightRule {
        trigger: InsightTrigger::RiskCritical,
        insight_type: InsightType::Critical,
        title: "Critical cash runway",
        description: "Under the pessimistic scenario cash runs out in {runway} months.",
        recommendation: Some(
            "Cut discretionary costs now and open a credit line or bridge round to extend runway.",
        ),
    },
    InsightRule {
        trigger: InsightTrigger::RiskWarning,
        insight_type: InsightType::Warning,
        title: "Limited cash runway",
        description: "Under the pessimistic scenario cash lasts {runway} months.",
        recommendation: Some(
            "Review payment terms with customers and suppliers to rebuild a cash buffer.",
        ),
    },
    InsightRule {
        trigger: InsightTrigger::TrendDeclining,
        insight_type: InsightType::Warning,
        title: "Net cash flow is declining",
        description: "Monthly net cash flow is falling by about {delta} per period.",
        recommendation: Some("Identify the cost lines or revenue drops driving the decline."),
    },
    InsightRule {
        trigger: InsightTrigger::LimitedHistory,
        insight_type: InsightType::Warning,
        title: "Limited history",
        description: "Only {periods} periods of history are available; at least {min_periods} are needed for a reliable forecast.",
        recommendation: Some("Import more historical transactions to improve forecast confidence."),
    },
    InsightRule {
        trigger: InsightTrigger::RiskSafe,
        insight_type: InsightType::Positive,
        title: "Comfortable cash runway",
        description: "Even under the pessimistic scenario cash lasts {runway} months.",
        recommendation: None,
    },
    InsightRule {
        trigger: InsightTrigger::TrendImproving,
        insight_type: InsightType::Positive,
        title: "Net cash flow is improving",
        description: "Monthly net cash flow is growing by about {delta} per period.",
        recommendation: Some("Consider placing surplus cash in a short-term deposit."),
    },
];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl InsightTrigger {
    pub fn fires(self, ctx: &InsightContext) -> bool {
        let negative = ctx.starting_balance < Decimal::ZERO;
        match self {
            InsightTrigger::NegativeBalance => negative,
            InsightTrigger::RiskCritical => !negative && ctx.risk_level == RiskLevel::Critical,
            InsightTrigger::RiskWarning => ctx.risk_level == RiskLevel::Warning,
            InsightTrigger::RiskSafe => ctx.risk_level == RiskLevel::Safe,
            InsightTrigger::TrendDeclining => ctx.trend == TrendDirection::Declining,
            InsightTrigger::TrendImproving => ctx.trend == TrendDirection::Improving,
            InsightTrigger::LimitedHistory => ctx.periods_used < ctx.min_periods,
        }
    }
}

/// Render every rule that fires, in table order.
pub fn generate_insights(ctx: &InsightContext) -> Vec<Insight> {
    INSIGHT_RULES
        .iter()
        .filter(|rule| rule.trigger.fires(ctx))
        .map(|rule| Insight {
            insight_type: rule.insight_type,
            title: rule.title.to_string(),
            description: render(rule.description, ctx),
            recommendation: rule.recommendation.map(|r| render(r, ctx)),
        })
        .collect()
}

/// `"7"`, or `"12+"` when the runway hit the evaluation cap.
pub fn format_runway(runway: u32, capped: bool) -> String {
    if capped {
        format!("{runway}+")
    } else {
        runway.to_string()
    }
}

fn render(template: &str, ctx: &InsightContext) -> String {
    template
        .replace("{runway}", &format_runway(ctx.runway, ctx.runway_capped))
        .replace("{delta}", &ctx.monthly_delta.abs().round_dp(2).to_string())
        .replace("{periods}", &ctx.periods_used.to_string())
        .replace("{min_periods}", &ctx.min_periods.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ctx() -> InsightContext {
        InsightContext {
            starting_balance: dec!(10_000),
            runway: 12,
            runway_capped: true,
            risk_level: RiskLevel::Safe,
            trend: TrendDirection::Stable,
            monthly_delta: Decimal::ZERO,
            periods_used: 6,
            min_periods: 3,
        }
    }

    fn types(insights: &[Insight]) -> Vec<InsightType> {
        insights.iter().map(|i| i.insight_type).collect()
    }

    #[test]
    fn test_safe_stable_emits_single_positive() {
        let insights = generate_insights(&ctx());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].title, "Comfortable cash runway");
        assert_eq!(
            insights[0].description,
            "Even under the pessimistic scenario cash lasts 12+ months."
        );
        assert!(insights[0].recommendation.is_none());
    }

    #[test]
    fn test_critical_names_runway_and_recommends() {
        let c = InsightContext {
            runway: 2,
            runway_capped: false,
            risk_level: RiskLevel::Critical,
            trend: TrendDirection::Declining,
            monthly_delta: dec!(-1234.567),
            ..ctx()
        };
        let insights = generate_insights(&c);
        assert_eq!(types(&insights), vec![InsightType::Critical, InsightType::Warning]);
        assert_eq!(
            insights[0].description,
            "Under the pessimistic scenario cash runs out in 2 months."
        );
        assert!(insights[0].recommendation.is_some());
        assert_eq!(
            insights[1].description,
            "Monthly net cash flow is falling by about 1234.57 per period."
        );
    }

    #[test]
    fn test_negative_balance_replaces_runway_critical() {
        let c = InsightContext {
            starting_balance: dec!(-50),
            runway: 0,
            runway_capped: false,
            risk_level: RiskLevel::Critical,
            ..ctx()
        };
        let insights = generate_insights(&c);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].title, "Cash balance is already negative");
    }

    #[test]
    fn test_ordering_follows_table() {
        let c = InsightContext {
            runway: 5,
            runway_capped: false,
            risk_level: RiskLevel::Warning,
            trend: TrendDirection::Improving,
            monthly_delta: dec!(80),
            periods_used: 1,
            ..ctx()
        };
        let titles: Vec<String> = generate_insights(&c).into_iter().map(|i| i.title).collect();
        assert_eq!(
            titles,
            vec![
                "Limited cash runway",
                "Limited history",
                "Net cash flow is improving",
            ]
        );
    }

    #[test]
    fn test_limited_history_text() {
        let c = InsightContext {
            periods_used: 2,
            ..ctx()
        };
        let insights = generate_insights(&c);
        let limited = insights.iter().find(|i| i.title == "Limited history").unwrap();
        assert_eq!(
            limited.description,
            "Only 2 periods of history are available; at least 3 are needed for a reliable forecast."
        );
    }

    #[test]
    fn test_generation_is_deterministic() {
        let c = InsightContext {
            risk_level: RiskLevel::Warning,
            runway: 4,
            runway_capped: false,
            ..ctx()
        };
        assert_eq!(generate_insights(&c), generate_insights(&c));
    }

    #[test]
    fn test_format_runway() {
        assert_eq!(format_runway(7, false), "7");
        assert_eq!(format_runway(12, true), "12+");
    }

    #[test]
    fn test_insight_type_serializes_as_type() {
        let insight = Insight {
            insight_type: InsightType::Positive,
            title: "t".into(),
            description: "d".into(),
            recommendation: None,
        };
        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["type"], "positive");
        assert!(json.get("recommendation").is_none());
    }
}
