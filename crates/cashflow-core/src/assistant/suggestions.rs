//! Keyword-matched guidance for free-text finance questions.
//!
//! Questions may be English or French. Matching is exact per token after
//! lower-casing and accent folding, so "trésorerie" matches `tresorerie`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub const MAX_SUGGESTIONS: usize = 3;

pub struct SuggestionRule {
    pub tag: &'static str,
    pub keywords: &'static [&'static str],
    pub response: &'static str,
    /// Calculator the user should open next, by slug.
    pub calculator: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub tag: String,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculator: Option<String>,
    pub matched_keywords: Vec<String>,
}

pub const SUGGESTION_RULES: &[SuggestionRule] = &[
    SuggestionRule {
        tag: "cash_runway",
        keywords: &["runway", "tresorerie", "cash", "burn", "liquidity", "liquidite"],
        response: "Run the cash-flow forecast: the pessimistic scenario shows how many months your cash lasts if net flow deteriorates.",
        calculator: Some("cash_burn"),
    },
    SuggestionRule {
        tag: "late_payments",
        keywords: &["dso", "receivables", "creances", "retard", "late", "paiement", "payment", "clients"],
        response: "Compute your DSO. Under 30 days is healthy; above 60 days, tighten payment terms or chase overdue invoices.",
        calculator: Some("dso"),
    },
    SuggestionRule {
        tag: "working_capital",
        keywords: &["bfr", "working", "inventory", "stock", "stocks"],
        response: "Compute your BFR (working capital requirement) in days of revenue to see how much cash the operating cycle ties up.",
        calculator: Some("bfr"),
    },
    SuggestionRule {
        tag: "profitability",
        keywords: &["margin", "marge", "profit", "rentabilite", "profitability", "pricing", "prix"],
        response: "Check your margin. Above 20% leaves room to absorb shocks; under 10%, review pricing and direct costs.",
        calculator: Some("margin"),
    },
    SuggestionRule {
        tag: "break_even",
        keywords: &["seuil", "breakeven", "break", "fixed", "fixes", "charges"],
        response: "Compute your break-even revenue and compare it to actual revenue; aim for at least 1.2x coverage.",
        calculator: Some("break_even"),
    },
    SuggestionRule {
        tag: "suppliers",
        keywords: &["dpo", "suppliers", "fournisseurs", "payables"],
        response: "Compute your DPO to see how long you take to pay suppliers, and negotiate terms that match your DSO.",
        calculator: Some("dpo"),
    },
    SuggestionRule {
        tag: "unit_economics",
        keywords: &["ltv", "cac", "acquisition", "churn", "retention"],
        response: "Compare customer lifetime value to acquisition cost; an LTV/CAC above 3 is a common target.",
        calculator: Some("unit_economics"),
    },
    SuggestionRule {
        tag: "fundraising",
        keywords: &["valuation", "valorisation", "investors", "investisseurs", "fundraising", "levee"],
        response: "Estimate your valuation before meeting investors and forecast how long the round extends your runway.",
        calculator: Some("valuation"),
    },
    SuggestionRule {
        tag: "investment_return",
        keywords: &["roi", "investment", "investissement", "return", "rendement"],
        response: "Compute the ROI of the investment and compare it against its payback period.",
        calculator: Some("roi"),
    },
];

/// Rules matching `question`, most keyword hits first, ties in table order.
pub fn suggest(question: &str) -> Vec<Suggestion> {
    let tokens = tokenize(question);
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<(usize, Suggestion)> = SUGGESTION_RULES
        .iter()
        .filter_map(|rule| {
            let matched: Vec<String> = rule
                .keywords
                .iter()
                .filter(|k| tokens.contains(**k))
                .map(|k| k.to_string())
                .collect();
            if matched.is_empty() {
                return None;
            }
            Some((
                matched.len(),
                Suggestion {
                    tag: rule.tag.to_string(),
                    response: rule.response.to_string(),
                    calculator: rule.calculator.map(str::to_string),
                    matched_keywords: matched,
                },
            ))
        })
        .collect();

    // sort_by is stable, so equal counts keep table order
    matches.sort_by(|a, b| b.0.cmp(&a.0));

    tracing::debug!(tokens = tokens.len(), matched = matches.len(), "question matched");

    matches
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, s)| s)
        .collect()
}

fn tokenize(question: &str) -> BTreeSet<String> {
    question
        .to_lowercase()
        .chars()
        .map(fold_accent)
        .collect::<String>()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'â' | 'ä' | 'á' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'î' | 'ï' | 'í' => 'i',
        'ô' | 'ö' | 'ó' => 'o',
        'ù' | 'û' | 'ü' | 'ú' => 'u',
        'ç' => 'c',
        'ÿ' => 'y',
        _ => c,
    }
}
