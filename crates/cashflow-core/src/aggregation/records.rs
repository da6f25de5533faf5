//! Transaction records at the import boundary.
//!
//! Two sign conventions reach this crate: ledgers that carry a signed
//! amount (`> 0` inflow, `< 0` outflow) and exports that carry an unsigned
//! amount plus an `income` / `expense` tag. The signed amount is canonical;
//! [`RecordInput::parse`] folds the tagged form into it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use crate::dates::parse_date;
use crate::types::Money;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One observed transaction or ledger line, in canonical signed form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub date: NaiveDate,
    /// Positive = inflow, negative = outflow.
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
}

impl FinancialRecord {
    pub fn new(date: NaiveDate, amount: Money) -> Self {
        Self {
            date,
            amount,
            category: None,
            counterparty: None,
        }
    }

    pub fn is_inflow(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_outflow(&self) -> bool {
        self.amount < Decimal::ZERO
    }
}

/// Explicit direction tag used by exports that do not sign their amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    #[serde(alias = "revenue", alias = "credit")]
    Income,
    #[serde(alias = "cost", alias = "debit")]
    Expense,
}

impl RecordKind {
    /// Apply this direction to an amount, ignoring the amount's own sign.
    pub fn signed(self, amount: Money) -> Money {
        match self {
            RecordKind::Income => amount.abs(),
            RecordKind::Expense => -amount.abs(),
        }
    }
}

/// A record as it arrives from CSV import or an external ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordInput {
    /// Raw date text; see [`parse_date`] for the accepted formats.
    pub date: String,
    pub amount: Money,
    /// When present, overrides the sign of `amount`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RecordKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
}

impl RecordInput {
    /// Convert to a canonical record. Returns `None` when the date cannot be
    /// parsed; callers skip such rows.
    pub fn parse(&self) -> Option<FinancialRecord> {
        let date = parse_date(&self.date)?;
        let amount = match self.kind {
            Some(kind) => kind.signed(self.amount),
            None => self.amount,
        };
        Some(FinancialRecord {
            date,
            amount,
            category: self.category.clone(),
            counterparty: self.counterparty.clone(),
        })
    }
}

impl From<&FinancialRecord> for RecordInput {
    fn from(record: &FinancialRecord) -> Self {
        Self {
            date: record.date.format("%Y-%m-%d").to_string(),
            amount: record.amount,
            kind: None,
            category: record.category.clone(),
            counterparty: record.counterparty.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
