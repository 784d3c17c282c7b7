//! Field helpers shared by the request DTOs.

/// Trims a text field; blank counts as missing.
pub fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Drops JSON `null` and the empty string, which forms send for blank inputs.
pub fn present(v: Option<serde_json::Value>) -> Option<serde_json::Value> {
    v.filter(|v| !v.is_null() && v.as_str().map_or(true, |s| !s.trim().is_empty()))
}

/// Accepts a JSON integer or a numeric string; must be positive and fit `i32`.
pub fn positive_int(v: &serde_json::Value) -> Option<i32> {
    let n = match v {
        serde_json::Value::Number(n) => n.as_i64()?,
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    i32::try_from(n).ok().filter(|n| *n > 0)
}
