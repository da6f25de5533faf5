use clap::{Args, ValueEnum};
use serde_json::Value;

use cashflow_core::aggregation::buckets::{self, AggregationInput, Bucketing};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BucketArg {
    Month,
    Quarter,
}

impl From<BucketArg> for Bucketing {
    fn from(arg: BucketArg) -> Self {
        match arg {
            BucketArg::Month => Bucketing::Month,
            BucketArg::Quarter => Bucketing::Quarter,
        }
    }
}

/// Arguments for record aggregation
#[derive(Args)]
pub struct AggregateArgs {
    /// Path to a JSON / YAML aggregation input, or a CSV file of records
    #[arg(long)]
    pub input: Option<String>,

    /// Bucket width (overrides the input file)
    #[arg(long, value_enum)]
    pub bucketing: Option<BucketArg>,

    /// Insert zero buckets between the first and last observed bucket
    #[arg(long)]
    pub fill_gaps: bool,
}

pub fn run_aggregate(args: AggregateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut agg_input: AggregationInput = match args.input {
        Some(ref path) if input::file::is_csv(path) => AggregationInput {
            records: input::file::read_records_csv(path)?,
            bucketing: Bucketing::default(),
            fill_gaps: false,
        },
        Some(ref path) => input::file::read_json(path)?,
        None => match input::stdin::read_stdin()? {
            Some(data) => serde_json::from_value(data)?,
            None => {
                return Err("--input <file.json|file.csv> or stdin required for aggregation".into())
            }
        },
    };

    if let Some(bucketing) = args.bucketing {
        agg_input.bucketing = bucketing.into();
    }
    if args.fill_gaps {
        agg_input.fill_gaps = true;
    }

    let result = buckets::aggregate(&agg_input);
    Ok(serde_json::to_value(result)?)
}
