pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Shape of a command's `result`, so formatters need not guess it from keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Aggregation,
    Forecast,
    ForecastSummary,
    Score,
    Capabilities,
    Suggestions,
}

impl ResultKind {
    /// Array field written one element per CSV row.
    pub fn row_field(self) -> Option<&'static str> {
        match self {
            ResultKind::Aggregation => Some("periods"),
            ResultKind::Capabilities => Some("domains"),
            ResultKind::Suggestions => Some("suggestions"),
            ResultKind::Forecast | ResultKind::ForecastSummary | ResultKind::Score => None,
        }
    }

    /// Dotted path to the one-line answer printed by `--output minimal`.
    pub fn key_path(self) -> &'static str {
        match self {
            ResultKind::Aggregation => "total_net",
            ResultKind::Forecast => "metrics.runway",
            ResultKind::ForecastSummary => "runway_display",
            ResultKind::Score => "total",
            ResultKind::Capabilities => "next_calculators",
            ResultKind::Suggestions => "suggestions",
        }
    }
}

/// Dispatch output to the formatter chosen on the command line.
pub fn format_output(format: &OutputFormat, kind: ResultKind, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value, kind),
        OutputFormat::Minimal => minimal::print_minimal(value, kind),
    }
}

/// The `result` of an envelope, or the value itself when it has none.
pub(crate) fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}
