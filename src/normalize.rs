use serde_json::Value;

use crate::models::{NormalizedRecord, ProbeResult};

/// Turns a probe outcome into a record. A latency is only kept when paired
/// with a readable height.
pub fn normalize(url: &str, result: &ProbeResult) -> NormalizedRecord {
    let height = if result.failed {
        None
    } else {
        result.raw_payload.as_ref().and_then(block_height)
    };
    let latency = height.and(result.latency);

    NormalizedRecord {
        url: url.to_string(),
        height,
        latency,
    }
}

/// `result.number` of an `eth_getBlockByNumber` response.
fn block_height(payload: &Value) -> Option<u64> {
    match payload.get("result")?.get("number")? {
        Value::String(hex) => parse_hex(hex),
        Value::Number(number) => number.as_u64(),
        _ => None,
    }
}

fn parse_hex(value: &str) -> Option<u64> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}
