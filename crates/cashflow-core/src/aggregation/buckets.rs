//! Time-bucket aggregation of signed records.
//!
//! Records are grouped by calendar month (or quarter). For each bucket:
//! - `inflow`  = sum of positive amounts
//! - `outflow` = sum of absolute negative amounts
//! - `net`     = inflow - outflow
//!
//! Buckets come out in ascending chronological order. Buckets with no
//! records are absent unless `fill_gaps` is set, in which case zero buckets
//! are inserted between the first and last observed bucket.
//!
//! A row whose amount would push the running inflow or outflow past the
//! `Decimal` range is skipped and counted like a row with a bad date.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::records::{FinancialRecord, RecordInput};
use crate::types::{with_metadata, ComputationOutput, Money};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Width of an aggregation bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucketing {
    #[default]
    Month,
    Quarter,
}

impl Bucketing {
    pub fn months_per_period(self) -> u32 {
        match self {
            Bucketing::Month => 1,
            Bucketing::Quarter => 3,
        }
    }

    /// First day of the bucket containing `date`.
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        let month0 = match self {
            Bucketing::Month => date.month0(),
            Bucketing::Quarter => date.month0() - date.month0() % 3,
        };
        // Day 1 of an existing month in an existing year always exists.
        NaiveDate::from_ymd_opt(date.year(), month0 + 1, 1).unwrap_or(date)
    }

    /// Sortable canonical key: `2025-01` or `2025-Q1`.
    pub fn period_key(self, start: NaiveDate) -> String {
        match self {
            Bucketing::Month => start.format("%Y-%m").to_string(),
            Bucketing::Quarter => format!("{}-Q{}", start.year(), start.month0() / 3 + 1),
        }
    }

    /// Display label: `Jan 2025` or `Q1 2025`.
    pub fn label(self, start: NaiveDate) -> String {
        match self {
            Bucketing::Month => start.format("%b %Y").to_string(),
            Bucketing::Quarter => format!("Q{} {}", start.month0() / 3 + 1, start.year()),
        }
    }

    /// Start of the bucket `steps` periods after the one starting at `start`.
    /// `None` on calendar overflow.
    pub fn advance(self, start: NaiveDate, steps: u32) -> Option<NaiveDate> {
        let months = self.months_per_period().checked_mul(steps)?;
        start.checked_add_months(Months::new(months))
    }
}

/// One time bucket of historical activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedPeriod {
    pub period_key: String,
    #[serde(default)]
    pub label: String,
    /// First calendar day of the bucket.
    pub start: NaiveDate,
    pub inflow: Money,
    pub outflow: Money,
    /// Always `inflow - outflow`.
    pub net: Money,
    #[serde(default)]
    pub record_count: u32,
}

impl AggregatedPeriod {
    /// An empty bucket starting at `start`.
    pub fn empty(bucketing: Bucketing, start: NaiveDate) -> Self {
        Self {
            period_key: bucketing.period_key(start),
            label: bucketing.label(start),
            start,
            inflow: Decimal::ZERO,
            outflow: Decimal::ZERO,
            net: Decimal::ZERO,
            record_count: 0,
        }
    }

    /// A bucket carrying only a net figure, split into inflow or outflow by
    /// its sign. Used when history arrives pre-aggregated.
    pub fn from_net(bucketing: Bucketing, start: NaiveDate, net: Money) -> Self {
        let mut period = Self::empty(bucketing, bucketing.bucket_start(start));
        if net > Decimal::ZERO {
            period.inflow = net;
        } else {
            period.outflow = net.abs();
        }
        period.net = net;
        period
    }

    /// Adds one record. Returns `false`, leaving the bucket untouched, when
    /// either side would overflow.
    fn absorb(&mut self, amount: Money) -> bool {
        let flows = Flows {
            inflow: self.inflow,
            outflow: self.outflow,
        };
        let Some(next) = flows.with(amount) else {
            return false;
        };
        self.inflow = next.inflow;
        self.outflow = next.outflow;
        // Both sides are non-negative, so the difference cannot overflow.
        self.net = next.inflow - next.outflow;
        self.record_count += 1;
        true
    }
}

/// Running inflow and outflow totals, both non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Flows {
    inflow: Money,
    outflow: Money,
}

impl Flows {
    /// Totals after adding `amount`; `None` on overflow.
    fn with(self, amount: Money) -> Option<Self> {
        if amount > Decimal::ZERO {
            Some(Self {
                inflow: self.inflow.checked_add(amount)?,
                ..self
            })
        } else if amount < Decimal::ZERO {
            Some(Self {
                outflow: self.outflow.checked_add(amount.abs())?,
                ..self
            })
        } else {
            Some(self)
        }
    }
}

/// Input for aggregation of raw imported records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationInput {
    pub records: Vec<RecordInput>,
    #[serde(default)]
    pub bucketing: Bucketing,
    /// Zero-fill missing buckets between the first and last observed one.
    #[serde(default)]
    pub fill_gaps: bool,
}

/// Output of aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationOutput {
    pub periods: Vec<AggregatedPeriod>,
    pub bucketing: Bucketing,
    pub records_used: usize,
    /// Rows dropped because their date could not be parsed or their amount
    /// overflowed the running totals.
    pub records_skipped: usize,
    pub total_inflow: Money,
    pub total_outflow: Money,
    pub total_net: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Aggregate imported records into ordered time buckets.
///
/// Never fails: rows with unparseable dates or overflowing amounts are
/// skipped, counted and reported as a warning. Empty input yields an empty
/// period list.
pub fn aggregate(input: &AggregationInput) -> ComputationOutput<AggregationOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (records, unparseable) = parse_records(&input.records);
    if unparseable > 0 {
        warnings.push(format!(
            "{unparseable} of {} records skipped: unparseable date",
            input.records.len()
        ));
    }

    let bucketed = bucket_records(&records, input.bucketing);
    if bucketed.overflowed > 0 {
        warnings.push(format!(
            "{} of {} records skipped: amount exceeds the supported decimal range",
            bucketed.overflowed,
            input.records.len()
        ));
    }

    let mut periods = bucketed.periods;
    if input.fill_gaps {
        periods = fill_gaps(periods, input.bucketing);
    }

    let records_skipped = unparseable + bucketed.overflowed;
    let records_used = records.len() - bucketed.overflowed;
    let totals = bucketed.totals;

    tracing::debug!(
        records_used,
        records_skipped,
        periods = periods.len(),
        "aggregated records"
    );

    let output = AggregationOutput {
        records_used,
        records_skipped,
        bucketing: input.bucketing,
        total_inflow: totals.inflow,
        total_outflow: totals.outflow,
        total_net: totals.inflow - totals.outflow,
        periods,
    };

    let assumptions = serde_json::json!({
        "bucketing": input.bucketing,
        "fill_gaps": input.fill_gaps,
        "sign_convention": "amount > 0 is inflow, amount < 0 is outflow; kind overrides sign",
    });

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Calendar bucket aggregation of signed cash flows",
        &assumptions,
        warnings,
        elapsed,
        output,
    )
}

/// Group canonical records into buckets, ascending by bucket start.
/// Records that would overflow the totals are left out.
pub fn aggregate_records(records: &[FinancialRecord], bucketing: Bucketing) -> Vec<AggregatedPeriod> {
    bucket_records(records, bucketing).periods
}

/// Insert zero buckets for every missing period between the first and the
/// last bucket. Input must be sorted ascending, as produced by
/// [`aggregate_records`].
pub fn fill_gaps(periods: Vec<AggregatedPeriod>, bucketing: Bucketing) -> Vec<AggregatedPeriod> {
    let mut filled: Vec<AggregatedPeriod> = Vec::with_capacity(periods.len());
    for period in periods {
        if let Some(prev) = filled.last() {
            let mut cursor = bucketing.advance(prev.start, 1);
            while let Some(next) = cursor {
                if next >= period.start {
                    break;
                }
                filled.push(AggregatedPeriod::empty(bucketing, next));
                cursor = bucketing.advance(next, 1);
            }
        }
        filled.push(period);
    }
    filled
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct Bucketed {
    periods: Vec<AggregatedPeriod>,
    totals: Flows,
    overflowed: usize,
}

/// Buckets stay within the grand totals, so a record accepted by the totals
/// always fits its bucket.
fn bucket_records(records: &[FinancialRecord], bucketing: Bucketing) -> Bucketed {
    let mut buckets: BTreeMap<NaiveDate, AggregatedPeriod> = BTreeMap::new();
    let mut totals = Flows::default();
    let mut overflowed = 0usize;
    for record in records {
        let absorbed = match totals.with(record.amount) {
            Some(next) => {
                let start = bucketing.bucket_start(record.date);
                let fits = buckets
                    .entry(start)
                    .or_insert_with(|| AggregatedPeriod::empty(bucketing, start))
                    .absorb(record.amount);
                if fits {
                    totals = next;
                }
                fits
            }
            None => false,
        };
        if !absorbed {
            overflowed += 1;
            tracing::debug!(
                date = %record.date,
                amount = %record.amount,
                "skipping record that overflows totals"
            );
        }
    }
    Bucketed {
        periods: buckets.into_values().collect(),
        totals,
        overflowed,
    }
}

fn parse_records(inputs: &[RecordInput]) -> (Vec<FinancialRecord>, usize) {
    let mut records = Vec::with_capacity(inputs.len());
    let mut skipped = 0usize;
    for (row, input) in inputs.iter().enumerate() {
        match input.parse() {
            Some(record) => records.push(record),
            None => {
                skipped += 1;
                tracing::debug!(row, date = %input.date, "skipping record with unparseable date");
            }
        }
    }
    (records, skipped)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
