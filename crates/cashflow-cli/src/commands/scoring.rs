use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use cashflow_core::scoring::calculations::Calculation;
use cashflow_core::scoring::capabilities;
use cashflow_core::scoring::composite::{self, ScoreInput};

use crate::input;

/// Arguments for the composite financial-health score
#[derive(Args)]
pub struct ScoreArgs {
    /// Path to a JSON / YAML calculation history
    #[arg(long)]
    pub input: Option<String>,

    /// Evaluation date, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

/// Arguments for capability inference
#[derive(Args)]
pub struct CapabilitiesArgs {
    /// Path to a JSON / YAML calculation history
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_score(args: ScoreArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut score_input = read_history(args.input.as_deref(), "scoring")?;
    if args.as_of.is_some() {
        score_input.as_of = args.as_of;
    }
    let result = composite::score_history(&score_input);
    Ok(serde_json::to_value(result)?)
}

pub fn run_capabilities(args: CapabilitiesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let score_input = read_history(args.input.as_deref(), "capability inference")?;
    let profile = capabilities::infer_capabilities(&score_input.history);
    Ok(serde_json::json!({ "result": profile }))
}

/// Accepts `{ "history": [...], "as_of": ... }` or a bare array of calculations.
fn read_history(path: Option<&str>, purpose: &str) -> Result<ScoreInput, Box<dyn std::error::Error>> {
    let data: Value = if let Some(path) = path {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err(format!("--input <file.json> or stdin required for {purpose}").into());
    };

    if data.is_array() {
        let history: Vec<Calculation> = serde_json::from_value(data)?;
        Ok(ScoreInput {
            history,
            as_of: None,
        })
    } else {
        Ok(serde_json::from_value(data)?)
    }
}
