//! Which financial domains a company has explored, and what to try next.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::calculations::{distinct_calculators, Calculation, CalculatorType};

/// Upper bound on `next_calculators`.
pub const MAX_NEXT_CALCULATORS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityDomain {
    Cash,
    Profitability,
    Growth,
}

impl CapabilityDomain {
    pub const ALL: [CapabilityDomain; 3] = [
        CapabilityDomain::Cash,
        CapabilityDomain::Profitability,
        CapabilityDomain::Growth,
    ];

    /// Members in recommendation order.
    pub fn calculators(self) -> &'static [CalculatorType] {
        match self {
            CapabilityDomain::Cash => &[
                CalculatorType::Dso,
                CalculatorType::Bfr,
                CalculatorType::CashBurn,
                CalculatorType::Dpo,
            ],
            CapabilityDomain::Profitability => &[
                CalculatorType::Margin,
                CalculatorType::BreakEven,
                CalculatorType::Roi,
            ],
            CapabilityDomain::Growth => &[CalculatorType::UnitEconomics, CalculatorType::Valuation],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Maturity {
    None,
    Exploring,
    Proficient,
    Complete,
}

impl Maturity {
    fn from_usage(used: usize, total: usize) -> Self {
        if used == 0 {
            Maturity::None
        } else if used * 2 < total {
            Maturity::Exploring
        } else if used < total {
            Maturity::Proficient
        } else {
            Maturity::Complete
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainCapability {
    pub domain: CapabilityDomain,
    pub used: u32,
    pub total: u32,
    /// Fraction of the domain's calculators used, 4 dp.
    pub coverage: Decimal,
    pub maturity: Maturity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityProfile {
    pub domains: Vec<DomainCapability>,
    pub next_calculators: Vec<CalculatorType>,
}

pub fn infer_capabilities(history: &[Calculation]) -> CapabilityProfile {
    let used: BTreeSet<CalculatorType> = distinct_calculators(history);

    let domains: Vec<DomainCapability> = CapabilityDomain::ALL
        .iter()
        .map(|&domain| {
            let members = domain.calculators();
            let count = members.iter().filter(|c| used.contains(*c)).count();
            DomainCapability {
                domain,
                used: count as u32,
                total: members.len() as u32,
                coverage: (Decimal::from(count) / Decimal::from(members.len())).round_dp(4),
                maturity: Maturity::from_usage(count, members.len()),
            }
        })
        .collect();

    // Stable sort keeps declaration order among equally covered domains.
    let mut weakest_first: Vec<&DomainCapability> = domains.iter().collect();
    weakest_first.sort_by(|a, b| a.coverage.cmp(&b.coverage));

    let next_calculators = weakest_first
        .iter()
        .flat_map(|d| d.domain.calculators().iter().copied())
        .filter(|c| !used.contains(c))
        .take(MAX_NEXT_CALCULATORS)
        .collect();

    CapabilityProfile {
        domains,
        next_calculators,
    }
}
