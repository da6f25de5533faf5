use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use cashflow_core::forecast::policy::ForecastPolicy;
use cashflow_core::forecast::projector::{self, ProjectionInput, RecordForecastInput};
use cashflow_core::forecast::summary::{summarize_forecast, KpiSnapshot};

use crate::commands::aggregate::BucketArg;
use crate::input;

/// Arguments for cash-flow scenario projection
#[derive(Args)]
pub struct ForecastArgs {
    /// Path to a JSON / YAML forecast input (records or pre-aggregated
    /// history), or a CSV file of records
    #[arg(long)]
    pub input: Option<String>,

    /// Number of periods to project (overrides the input file)
    #[arg(long)]
    pub horizon: Option<u32>,

    /// Current cash balance (overrides the input file)
    #[arg(long)]
    pub balance: Option<Decimal>,

    /// Bucket width for CSV records
    #[arg(long, value_enum)]
    pub bucketing: Option<BucketArg>,

    /// Print the dashboard summary instead of the full forecast
    #[arg(long)]
    pub summary: bool,
}

/// Default horizon for CSV input, which carries no parameters.
const CSV_DEFAULT_HORIZON: u32 = 6;

enum Request {
    Records(RecordForecastInput),
    History(ProjectionInput),
}

pub fn run_forecast(args: ForecastArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = match args.input {
        Some(ref path) if input::file::is_csv(path) => Request::Records(RecordForecastInput {
            records: input::file::read_records_csv(path)?,
            horizon: CSV_DEFAULT_HORIZON,
            current_balance: None,
            kpi_snapshot: None,
            bucketing: Default::default(),
            fill_gaps: true,
            policy: ForecastPolicy::default(),
            as_of: None,
        }),
        Some(ref path) => parse_request(input::file::read_json(path)?)?,
        None => match input::stdin::read_stdin()? {
            Some(data) => parse_request(data)?,
            None => {
                return Err("--input <file.json|file.csv> or stdin required for forecasting".into())
            }
        },
    };

    let (output, kpis): (_, Option<KpiSnapshot>) = match request {
        Request::Records(ref mut r) => {
            apply_overrides(&mut r.horizon, &mut r.current_balance, &args);
            if let Some(bucketing) = args.bucketing {
                r.bucketing = bucketing.into();
            }
            (projector::forecast_from_records(r)?, r.kpi_snapshot.clone())
        }
        Request::History(ref mut h) => {
            apply_overrides(&mut h.horizon, &mut h.current_balance, &args);
            if let Some(bucketing) = args.bucketing {
                h.bucketing = bucketing.into();
            }
            (projector::project_cash_flow(h)?, h.kpi_snapshot.clone())
        }
    };

    if args.summary {
        let summary = summarize_forecast(&output.result, kpis.as_ref());
        return Ok(serde_json::json!({
            "result": summary,
            "warnings": output.warnings,
            "methodology": output.methodology,
        }));
    }
    Ok(serde_json::to_value(output)?)
}

/// Raw records take the aggregate-then-project path.
fn parse_request(data: Value) -> Result<Request, Box<dyn std::error::Error>> {
    if data.get("records").is_some() {
        Ok(Request::Records(serde_json::from_value(data)?))
    } else {
        Ok(Request::History(serde_json::from_value(data)?))
    }
}

fn apply_overrides(horizon: &mut u32, balance: &mut Option<Decimal>, args: &ForecastArgs) {
    if let Some(h) = args.horizon {
        *horizon = h;
    }
    if args.balance.is_some() {
        *balance = args.balance;
    }
}
