use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use cashflow_core::forecast::projector::CashFlowForecast;
use cashflow_core::forecast::summary::KpiSnapshot;
use cashflow_core::scoring::calculations::Calculation;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[napi]
pub fn aggregate(input_json: String) -> NapiResult<String> {
    let input: cashflow_core::aggregation::buckets::AggregationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = cashflow_core::aggregation::buckets::aggregate(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

#[napi]
pub fn project(input_json: String) -> NapiResult<String> {
    let input: cashflow_core::forecast::projector::ProjectionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        cashflow_core::forecast::projector::project_cash_flow(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn forecast_from_records(input_json: String) -> NapiResult<String> {
    let input: cashflow_core::forecast::projector::RecordForecastInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = cashflow_core::forecast::projector::forecast_from_records(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct SummaryRequest {
    forecast: CashFlowForecast,
    #[serde(default)]
    kpi_snapshot: Option<KpiSnapshot>,
}

/// Accepts `{ forecast, kpi_snapshot? }` where `forecast` is the `result`
/// of `project` or `forecastFromRecords`.
#[napi]
pub fn summarize_forecast(input_json: String) -> NapiResult<String> {
    let req: SummaryRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let summary = cashflow_core::forecast::summary::summarize_forecast(
        &req.forecast,
        req.kpi_snapshot.as_ref(),
    );
    serde_json::to_string(&summary).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_score(input_json: String) -> NapiResult<String> {
    let input: cashflow_core::scoring::composite::ScoreInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = cashflow_core::scoring::composite::score_history(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Accepts a bare array of calculations.
#[napi]
pub fn infer_capabilities(history_json: String) -> NapiResult<String> {
    let history: Vec<Calculation> = serde_json::from_str(&history_json).map_err(to_napi_error)?;
    let profile = cashflow_core::scoring::capabilities::infer_capabilities(&history);
    serde_json::to_string(&profile).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Assistant
// ---------------------------------------------------------------------------

#[napi]
pub fn suggest(question: String) -> NapiResult<String> {
    let matches = cashflow_core::assistant::suggestions::suggest(&question);
    serde_json::to_string(&matches).map_err(to_napi_error)
}
