//! Lenient readers over untrusted JSON payloads.

use serde_json::Value;

pub(crate) use crate::events::raw::text_at;

/// Monetary amount at `pointer`, accepting JSON numbers and decimal strings.
/// Anything unparseable reads as `None`.
pub fn amount_at(value: &Value, pointer: &str) -> Option<f64> {
    value.pointer(pointer).and_then(parse_amount)
}

pub fn parse_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    amount.is_finite().then_some(amount)
}

/// Quantity at `pointer`, defaulting to 1 when absent or unparseable.
pub fn quantity_at(value: &Value, pointer: &str) -> u32 {
    let quantity = match value.pointer(pointer) {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    quantity
        .map(|q| q.min(u64::from(u32::MAX)) as u32)
        .unwrap_or(1)
}

/// The object at `pointer`, if it is one.
pub fn object_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a Value> {
    value.pointer(pointer).filter(|v| v.is_object())
}

/// Elements of the array at `pointer`; empty when it is missing or not an array.
pub fn array_at<'a>(value: &'a Value, pointer: &str) -> &'a [Value] {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}
