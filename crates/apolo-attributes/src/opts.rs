//! Typed call options
//!
//! Options are read from `APIOpts` first; the configured default applies
//! when the key is absent. A present value of the wrong type is an error
//! and is returned to the caller as is.

use apolo_core::consts::INFIELD_SEP;
use apolo_core::models::value_as_string;
use apolo_core::{AppError, AppResult};
use serde_json::{Map, Value};

fn conversion_error(value: &Value, target: &str) -> AppError {
    AppError::OptConversion(format!(
        "cannot convert field: {} to {}",
        value_as_string(value),
        target
    ))
}

pub fn as_int(value: &Value) -> AppResult<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| conversion_error(value, "int")),
        Value::String(s) => s.trim().parse().map_err(|_| conversion_error(value, "int")),
        _ => Err(conversion_error(value, "int")),
    }
}

pub fn as_bool(value: &Value) -> AppResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => n
            .as_f64()
            .map(|f| f != 0.0)
            .ok_or_else(|| conversion_error(value, "bool")),
        Value::String(s) => match s.as_str() {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            _ => Err(conversion_error(value, "bool")),
        },
        _ => Err(conversion_error(value, "bool")),
    }
}

/// JSON arrays convert item by item, strings split on `;`
pub fn as_string_slice(value: &Value) -> AppResult<Vec<String>> {
    match value {
        Value::Array(items) => Ok(items.iter().map(value_as_string).collect()),
        Value::String(s) if s.is_empty() => Ok(Vec::new()),
        Value::String(s) => Ok(s.split(INFIELD_SEP).map(str::to_string).collect()),
        _ => Err(conversion_error(value, "[]string")),
    }
}

pub fn int_opt(opts: &Map<String, Value>, key: &str, default: i64) -> AppResult<i64> {
    opts.get(key).map(as_int).unwrap_or(Ok(default))
}

pub fn bool_opt(opts: &Map<String, Value>, key: &str, default: bool) -> AppResult<bool> {
    opts.get(key).map(as_bool).unwrap_or(Ok(default))
}

pub fn string_slice_opt(
    opts: &Map<String, Value>,
    key: &str,
    default: &[String],
) -> AppResult<Vec<String>> {
    match opts.get(key) {
        Some(v) => as_string_slice(v),
        None => Ok(default.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn opts(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_int_opt() {
        let o = opts(json!({"a": 3, "b": "4", "c": 2.0, "d": "x", "e": 2.5}));
        assert_eq!(int_opt(&o, "a", 1).unwrap(), 3);
        assert_eq!(int_opt(&o, "b", 1).unwrap(), 4);
        assert_eq!(int_opt(&o, "c", 1).unwrap(), 2);
        assert_eq!(int_opt(&o, "missing", 1).unwrap(), 1);
        assert_eq!(
            int_opt(&o, "d", 1).unwrap_err(),
            AppError::OptConversion("cannot convert field: x to int".into())
        );
        assert!(int_opt(&o, "e", 1).is_err());
    }

    #[test]
    fn test_bool_opt() {
        let o = opts(json!({"a": true, "b": "false", "c": 1, "d": "yes"}));
        assert!(bool_opt(&o, "a", false).unwrap());
        assert!(!bool_opt(&o, "b", true).unwrap());
        assert!(bool_opt(&o, "c", false).unwrap());
        assert!(bool_opt(&o, "missing", true).unwrap());
        assert_eq!(
            bool_opt(&o, "d", false).unwrap_err().to_string(),
            "cannot convert field: yes to bool"
        );
    }

    #[test]
    fn test_string_slice_opt() {
        let o = opts(json!({
            "a": ["ATTR_1", "ATTR_2"],
            "b": "ATTR_1;ATTR_2",
            "c": "",
            "d": 5,
        }));
        let dft = vec!["DFT".to_string()];
        assert_eq!(string_slice_opt(&o, "a", &dft).unwrap(), vec!["ATTR_1", "ATTR_2"]);
        assert_eq!(string_slice_opt(&o, "b", &dft).unwrap(), vec!["ATTR_1", "ATTR_2"]);
        assert!(string_slice_opt(&o, "c", &dft).unwrap().is_empty());
        assert_eq!(string_slice_opt(&o, "missing", &dft).unwrap(), dft);
        assert_eq!(
            string_slice_opt(&o, "d", &dft).unwrap_err().to_string(),
            "cannot convert field: 5 to []string"
        );
    }
}
