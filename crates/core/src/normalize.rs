//! Typed cell to string normalization.

use chrono::SecondsFormat;

use crate::types::ColumnValue;

/// Renders a typed cell as the single string form used in result rows.
///
/// Never fails: nulls and unset cells become the empty string.
pub fn normalize(value: &ColumnValue) -> String {
    match value {
        ColumnValue::String(s) => s.clone(),
        ColumnValue::Null => String::new(),
        ColumnValue::Double(d) => format_double(*d),
        ColumnValue::Int(i) => i.to_string(),
        ColumnValue::Bool(b) => b.to_string(),
        ColumnValue::Json(raw) => raw.clone(),
        ColumnValue::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        ColumnValue::IpAddr(addr) => addr.clone(),
        ColumnValue::Cidr(range) => range.clone(),
        ColumnValue::Unset => String::new(),
    }
}

/// Fixed-point with six fractional digits; non-finite values use the
/// `+Inf`, `-Inf` and `NaN` spellings.
fn format_double(d: f64) -> String {
    if d.is_nan() {
        "NaN".to_string()
    } else if d.is_infinite() {
        if d.is_sign_positive() { "+Inf" } else { "-Inf" }.to_string()
    } else {
        format!("{:.6}", d)
    }
}
