use serde_json::{Map, Value};
use std::io;

use super::{result_of, ResultKind};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// Forecasts become one row per projected period with the three scenario
/// values side by side. Kinds with a row field (periods, domains,
/// suggestions) become one row per element; anything else is written as
/// field / value pairs.
pub fn print_csv(value: &Value, kind: ResultKind) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = result_of(value);
    let rows = kind
        .row_field()
        .and_then(|field| result.get(field))
        .and_then(Value::as_array);

    match (result, rows) {
        (Value::Object(map), _) if kind == ResultKind::Forecast => {
            write_scenarios_csv(&mut wtr, map)
        }
        (_, Some(rows)) => write_array_csv(&mut wtr, rows),
        (Value::Object(map), None) => {
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in map {
                let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
            }
        }
        (Value::Array(arr), None) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(result)]);
        }
    }

    let _ = wtr.flush();
}

fn write_scenarios_csv(wtr: &mut StdoutWriter<'_>, forecast: &Map<String, Value>) {
    let series = |name: &str| -> Vec<Value> {
        forecast
            .get(name)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };
    let baseline = series("baseline");
    let optimistic = series("optimistic");
    let pessimistic = series("pessimistic");

    let _ = wtr.write_record(["period_key", "date", "baseline", "optimistic", "pessimistic"]);
    for (i, point) in baseline.iter().enumerate() {
        let field = |v: Option<&Value>, key: &str| {
            v.and_then(|p| p.get(key)).map(format_csv_value).unwrap_or_default()
        };
        let _ = wtr.write_record([
            field(Some(point), "period_key"),
            field(Some(point), "date"),
            field(Some(point), "value"),
            field(optimistic.get(i), "value"),
            field(pessimistic.get(i), "value"),
        ]);
    }
}

fn write_array_csv(wtr: &mut StdoutWriter<'_>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
