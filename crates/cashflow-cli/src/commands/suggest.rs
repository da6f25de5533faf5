use clap::Args;
use serde_json::Value;

use cashflow_core::assistant::suggestions;

/// Arguments for question-to-calculator suggestions
#[derive(Args)]
pub struct SuggestArgs {
    /// Free-text question, English or French
    #[arg(long, short)]
    pub question: String,
}

pub fn run_suggest(args: SuggestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let matches = suggestions::suggest(&args.question);
    let warnings: Vec<String> = if matches.is_empty() {
        vec!["No calculator matches this question.".to_string()]
    } else {
        Vec::new()
    };
    Ok(serde_json::json!({
        "result": { "suggestions": matches },
        "warnings": warnings,
    }))
}
