//! Score tier tables and cut-offs.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::calculations::CalculatorType;

pub const TOTAL_CALCULATOR_TYPES: u32 = CalculatorType::ALL.len() as u32;

pub const COMPLETION_MAX: u32 = 40;
pub const CASH_MAX: u32 = 20;
pub const MARGIN_MAX: u32 = 20;
pub const RECENCY_MAX: u32 = 20;
pub const TOTAL_MAX: u32 = 100;

/// Points a favourable or unmeasurable-but-benign sub-metric can earn.
pub const SUB_METRIC_MAX: u32 = 10;
/// Present, but the inputs needed to grade it are missing.
pub const NEUTRAL_POINTS: u32 = 5;

pub const DAYS_PER_YEAR: Decimal = dec!(365);
/// Input keys read as revenue (chiffre d'affaires), in priority order.
pub const REVENUE_KEYS: &[&str] = &["ca", "revenue", "chiffre_affaires"];

// Tiers are `(bound, points)`, scanned in order.

/// DSO in days; first tier with `value < bound` wins.
pub const DSO_TIERS: &[(Decimal, u32)] = &[(dec!(30), 10), (dec!(45), 7), (dec!(60), 4)];
pub const DSO_FLOOR_POINTS: u32 = 2;

/// BFR expressed in days of revenue; first tier with `days < bound` wins.
pub const BFR_DAYS_TIERS: &[(Decimal, u32)] = &[(dec!(30), 10), (dec!(60), 7), (dec!(90), 4)];
pub const BFR_FLOOR_POINTS: u32 = 2;

/// Margin in percent; first tier with `value >= bound` wins.
pub const MARGIN_TIERS: &[(Decimal, u32)] = &[
    (dec!(40), 10),
    (dec!(20), 7),
    (dec!(10), 4),
    (dec!(0), 2),
];
pub const MARGIN_FLOOR_POINTS: u32 = 0;

/// Revenue / break-even revenue; first tier with `coverage >= bound` wins.
pub const BREAK_EVEN_COVERAGE_TIERS: &[(Decimal, u32)] =
    &[(dec!(1.5), 10), (dec!(1.2), 7), (dec!(1.0), 4)];
pub const BREAK_EVEN_FLOOR_POINTS: u32 = 2;

/// Days since the latest calculation; first band with `days < bound` wins.
pub const RECENCY_BANDS: &[(i64, u32)] = &[(7, 20), (30, 15), (90, 10)];
pub const RECENCY_FLOOR_POINTS: u32 = 5;

pub const EXCELLENT_CUTOFF: u32 = 75;
pub const GOOD_CUTOFF: u32 = 55;
pub const CAUTION_CUTOFF: u32 = 35;

/// Points of the first tier whose bound is above `value`.
pub fn below_tier(value: Decimal, tiers: &[(Decimal, u32)], floor: u32) -> u32 {
    tiers
        .iter()
        .find(|(bound, _)| value < *bound)
        .map(|(_, points)| *points)
        .unwrap_or(floor)
}

/// Points of the first tier whose bound is at or below `value`.
pub fn at_least_tier(value: Decimal, tiers: &[(Decimal, u32)], floor: u32) -> u32 {
    tiers
        .iter()
        .find(|(bound, _)| value >= *bound)
        .map(|(_, points)| *points)
        .unwrap_or(floor)
}

pub fn recency_points(days: i64) -> u32 {
    RECENCY_BANDS
        .iter()
        .find(|(bound, _)| days < *bound)
        .map(|(_, points)| *points)
        .unwrap_or(RECENCY_FLOOR_POINTS)
}
