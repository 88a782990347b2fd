//! YAML 1.1 resolution of untagged plain scalars.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::node::ScalarValue;

static BOOL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:yes|Yes|YES|no|No|NO|true|True|TRUE|false|False|FALSE|on|On|ON|off|Off|OFF)$")
        .expect("valid bool pattern")
});

static NULL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:~|null|Null|NULL|)$").expect("valid null pattern"));

static INT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?(?:0b[01_]+|0x[0-9a-fA-F_]+|0o?[0-7_]+|0|[1-9][0-9_]*)$")
        .expect("valid int pattern")
});

static FLOAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[-+]?(?:[0-9][0-9_]*)?\.[0-9_]*(?:[eE][-+]?[0-9]+)?|[-+]?[0-9][0-9_]*[eE][-+]?[0-9]+|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN))$",
    )
    .expect("valid float pattern")
});

pub fn resolve_plain(text: &str) -> ScalarValue {
    if NULL_RE.is_match(text) {
        return ScalarValue::Null;
    }
    if BOOL_RE.is_match(text) {
        return ScalarValue::Bool(parse_bool(text).unwrap_or_default());
    }
    if INT_RE.is_match(text) {
        if let Some(i) = parse_int(text) {
            return ScalarValue::Int(i);
        }
        // out of i64 range: keep the magnitude as a float when it is decimal
        if let Some(x) = parse_float(text) {
            return ScalarValue::Float(x);
        }
    }
    if FLOAT_RE.is_match(text) && text != "." {
        if let Some(x) = parse_float(text) {
            return ScalarValue::Float(x);
        }
    }
    ScalarValue::Str(text.to_string())
}

/// Resolution forced by an explicit core tag (`!!int`, ...). `None` for
/// tags this adapter does not interpret.
pub fn resolve_tagged(text: &str, suffix: &str) -> Option<ScalarValue> {
    Some(match suffix {
        "str" => ScalarValue::Str(text.to_string()),
        "null" => ScalarValue::Null,
        "bool" => parse_bool(text).map_or_else(|| ScalarValue::Str(text.to_string()), ScalarValue::Bool),
        "int" => parse_int(text).map_or_else(|| ScalarValue::Str(text.to_string()), ScalarValue::Int),
        "float" => parse_float(text).map_or_else(|| ScalarValue::Str(text.to_string()), ScalarValue::Float),
        _ => return None,
    })
}

pub fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "yes" | "Yes" | "YES" | "true" | "True" | "TRUE" | "on" | "On" | "ON" => Some(true),
        "no" | "No" | "NO" | "false" | "False" | "FALSE" | "off" | "Off" | "OFF" => Some(false),
        _ => None,
    }
}

pub fn parse_int(text: &str) -> Option<i64> {
    let cleaned: String = text.trim().chars().filter(|&c| c != '_').collect();
    let (negative, digits) = match cleaned.as_bytes().first() {
        Some(b'-') => (true, &cleaned[1..]),
        Some(b'+') => (false, &cleaned[1..]),
        _ => (false, cleaned.as_str()),
    };
    let (radix, body) = if let Some(rest) = digits.strip_prefix("0b") {
        (2, rest)
    } else if let Some(rest) = digits.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = digits.strip_prefix("0o") {
        (8, rest)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };
    if body.is_empty() {
        return None;
    }
    // parse with the sign attached so i64::MIN stays representable
    let signed = if negative { format!("-{body}") } else { body.to_string() };
    i64::from_str_radix(&signed, radix).ok()
}

pub fn parse_float(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|&c| c != '_').collect();
    match cleaned.as_str() {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        other => other.parse::<f64>().ok(),
    }
}

/// Canonical text of a float, readable by `resolve_plain`.
pub fn float_text(x: f64) -> String {
    match x {
        _ if x.is_nan() => ".nan".to_string(),
        _ if x == f64::INFINITY => ".inf".to_string(),
        _ if x == f64::NEG_INFINITY => "-.inf".to_string(),
        _ => format!("{x:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml11_booleans_and_nulls() {
        assert_eq!(resolve_plain("yes"), ScalarValue::Bool(true));
        assert_eq!(resolve_plain("Off"), ScalarValue::Bool(false));
        assert_eq!(resolve_plain("~"), ScalarValue::Null);
        assert_eq!(resolve_plain(""), ScalarValue::Null);
        assert_eq!(resolve_plain("nope"), ScalarValue::Str("nope".into()));
    }

    #[test]
    fn integers_in_every_base() {
        assert_eq!(resolve_plain("42"), ScalarValue::Int(42));
        assert_eq!(resolve_plain("-1_000"), ScalarValue::Int(-1000));
        assert_eq!(resolve_plain("0x1F"), ScalarValue::Int(31));
        assert_eq!(resolve_plain("0b101"), ScalarValue::Int(5));
        assert_eq!(resolve_plain("017"), ScalarValue::Int(15));
        assert_eq!(resolve_plain("0"), ScalarValue::Int(0));
    }

    #[test]
    fn floats_and_specials() {
        assert_eq!(resolve_plain("1.0"), ScalarValue::Float(1.0));
        assert_eq!(resolve_plain("-2.5e3"), ScalarValue::Float(-2500.0));
        assert_eq!(resolve_plain(".inf"), ScalarValue::Float(f64::INFINITY));
        assert!(matches!(resolve_plain(".nan"), ScalarValue::Float(x) if x.is_nan()));
        assert_eq!(resolve_plain("."), ScalarValue::Str(".".into()));
    }

    #[test]
    fn core_tags_force_kind() {
        assert_eq!(resolve_tagged("12", "str"), Some(ScalarValue::Str("12".into())));
        assert_eq!(resolve_tagged("12", "float"), Some(ScalarValue::Float(12.0)));
        assert_eq!(resolve_tagged("x", "custom"), None);
    }
}
