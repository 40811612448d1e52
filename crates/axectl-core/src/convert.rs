// ── Raw-to-display value transforms ──
//
// Pure, total helpers that turn raw device values into display strings.
// Bad input never fails: non-numeric values pass through as their string
// form and JSON null becomes `None`, which callers render as "unknown".

use serde_json::Value;

/// Scale thresholds for difficulty values, largest first.
const DIFFICULTY_UNITS: [(f64, &str); 6] = [
    (1e18, "E"),
    (1e15, "P"),
    (1e12, "T"),
    (1e9, "G"),
    (1e6, "M"),
    (1e3, "k"),
];

/// Format a share difficulty into a human-scaled string.
///
/// `999` -> `"999"`, `1500` -> `"1.50 k"`, `2_500_000_000` -> `"2.50 G"`.
/// Numeric strings are parsed first; anything else is returned verbatim.
/// Returns `None` for JSON null.
pub fn format_difficulty(value: &Value) -> Option<String> {
    let number = match value {
        Value::Null => return None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    };

    let Some(number) = number else {
        return Some(raw_to_string(value));
    };

    for (factor, suffix) in DIFFICULTY_UNITS {
        if number >= factor {
            return Some(format!("{:.2} {suffix}", number / factor));
        }
    }

    Some(truncate(number).to_string())
}

/// Decompose seconds into `"{d}d {h}h {m}m {s}s"`.
pub fn format_uptime(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    format!("{days}d {hours}h {minutes}m {seconds}s")
}

/// Uptime formatting over a raw device value.
///
/// Non-negative integers (or integral floats / numeric strings) are
/// decomposed; anything else passes through. `None` for null.
pub fn format_uptime_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(
            as_integer(other)
                .and_then(|secs| u64::try_from(secs).ok())
                .map_or_else(|| raw_to_string(other), format_uptime),
        ),
    }
}

/// Render a raw value the way the device would print it.
///
/// Strings lose their JSON quotes and integral floats drop the `.0`,
/// so `525.0` and `525` both become `"525"`.
pub fn raw_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 9.0e15 => truncate(f).to_string(),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Interpret a raw value as an integer.
///
/// Accepts integers, integral floats, booleans (as 0/1) and numeric strings.
pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(truncate)
        }),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                    .map(truncate)
            })
        }
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn truncate(value: f64) -> i64 {
    value.trunc() as i64
}
