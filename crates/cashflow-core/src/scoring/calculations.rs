//! Log entries of past calculator invocations.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dates::deserialize_date;

/// The financial calculators whose results feed the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculatorType {
    /// Days sales outstanding.
    Dso,
    /// Days payable outstanding.
    Dpo,
    /// Working capital requirement (besoin en fonds de roulement).
    Bfr,
    #[serde(alias = "marge")]
    Margin,
    #[serde(alias = "seuil_rentabilite", alias = "seuil_de_rentabilite")]
    BreakEven,
    #[serde(alias = "tresorerie", alias = "burn_rate")]
    CashBurn,
    Roi,
    #[serde(alias = "ltv_cac")]
    UnitEconomics,
    #[serde(alias = "valorisation")]
    Valuation,
}

impl CalculatorType {
    pub const ALL: [CalculatorType; 9] = [
        CalculatorType::Dso,
        CalculatorType::Dpo,
        CalculatorType::Bfr,
        CalculatorType::Margin,
        CalculatorType::BreakEven,
        CalculatorType::CashBurn,
        CalculatorType::Roi,
        CalculatorType::UnitEconomics,
        CalculatorType::Valuation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CalculatorType::Dso => "dso",
            CalculatorType::Dpo => "dpo",
            CalculatorType::Bfr => "bfr",
            CalculatorType::Margin => "margin",
            CalculatorType::BreakEven => "break_even",
            CalculatorType::CashBurn => "cash_burn",
            CalculatorType::Roi => "roi",
            CalculatorType::UnitEconomics => "unit_economics",
            CalculatorType::Valuation => "valuation",
        }
    }
}

impl std::fmt::Display for CalculatorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One past calculator invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    #[serde(alias = "type")]
    pub calculator: CalculatorType,
    pub value: Decimal,
    /// Bare dates and timestamps are both accepted; the time is dropped.
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    /// Named sub-values used to compute `value`, e.g. `{ "ca": .., "creances": .. }`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, Decimal>,
}

impl Calculation {
    pub fn new(calculator: CalculatorType, value: Decimal, date: NaiveDate) -> Self {
        Self {
            calculator,
            value,
            date,
            inputs: BTreeMap::new(),
        }
    }

    pub fn with_input(mut self, key: &str, value: Decimal) -> Self {
        self.inputs.insert(key.to_string(), value);
        self
    }

    /// First present input among `keys`.
    pub fn input(&self, keys: &[&str]) -> Option<Decimal> {
        keys.iter().find_map(|k| self.inputs.get(*k).copied())
    }
}

/// Most recent calculation of `calculator` accepted by `valid`. Ties on
/// date resolve to the later entry in the log.
pub fn latest_valid<'a>(
    history: &'a [Calculation],
    calculator: CalculatorType,
    valid: impl Fn(&Calculation) -> bool,
) -> Option<&'a Calculation> {
    history
        .iter()
        .filter(|c| c.calculator == calculator && valid(*c))
        .max_by_key(|c| c.date)
}

pub fn distinct_calculators(history: &[Calculation]) -> BTreeSet<CalculatorType> {
    history.iter().map(|c| c.calculator).collect()
}
