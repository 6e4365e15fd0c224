use serde_json::Value;

/// ACS annotation values published in place of an estimate
/// (e.g. -666666666: "too few sample observations").
const ANNOTATION_SENTINELS: [f64; 6] = [
    -999_999_999.0,
    -888_888_888.0,
    -666_666_666.0,
    -555_555_555.0,
    -333_333_333.0,
    -222_222_222.0,
];

fn usable(v: f64) -> Option<f64> {
    if v.is_finite() && !ANNOTATION_SENTINELS.contains(&v) {
        Some(v)
    } else {
        None
    }
}

/// Text → income. Anything that is not a finite number is missing.
pub fn parse_income(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().and_then(usable)
}

/// JSON cell → income. The API sends strings, but numbers are accepted too.
pub fn income_from_cell(cell: &Value) -> Option<f64> {
    match cell {
        Value::String(s) => parse_income(s),
        Value::Number(n) => n.as_f64().and_then(usable),
        _ => None,
    }
}
