use serde_json::Value;

use super::{result_of, ResultKind};

/// Print just the key answer of a command.
///
/// Falls back to the first field of the result object when the kind's key
/// is missing or null.
pub fn print_minimal(value: &Value, kind: ResultKind) {
    let result_obj = result_of(value);

    if let Some(val) = lookup(result_obj, kind.key_path()).filter(|v| !v.is_null()) {
        println!("{}", format_minimal(val));
        return;
    }

    if let Some((key, val)) = result_obj.as_object().and_then(|m| m.iter().next()) {
        println!("{}: {}", key, format_minimal(val));
        return;
    }

    println!("{}", format_minimal(result_obj));
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, key| v.get(key))
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(items) if items.iter().all(|v| v.is_string()) => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Array(items) => items
            .iter()
            .map(|v| match v.get("tag") {
                Some(tag) => format_minimal(tag),
                None => format_minimal(v),
            })
            .collect::<Vec<_>>()
            .join(", "),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
