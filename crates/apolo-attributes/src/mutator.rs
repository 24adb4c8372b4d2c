//! Applying computed values to the event

use apolo_core::consts::{META_COMPOSED, META_REMOVE, META_TENANT};
use apolo_core::models::DataPoint;
use apolo_core::{AppError, AppResult};
use serde_json::Value;

/// Apply `value` at `path`
///
/// Returns the path that was altered, or `None` when the event is
/// unchanged. `*tenant` rewrites are applied but never reported.
///
/// - `None` (from `*none`) deletes `path`
/// - path `*remove` deletes the path named by the value
/// - value `*remove` deletes `path`
/// - `*composed` appends to the current value
pub fn apply(
    dp: &mut DataPoint,
    attr_type: &str,
    path: &str,
    value: Option<String>,
) -> AppResult<Option<String>> {
    let Some(value) = value else {
        if path == META_TENANT {
            return Ok(None);
        }
        return removed(dp, path);
    };

    if path == META_TENANT {
        let tenant = if attr_type == META_COMPOSED {
            format!("{}{}", dp.field_as_string(META_TENANT).unwrap_or_default(), value)
        } else {
            value
        };
        dp.set_namespace(META_TENANT, Value::String(tenant));
        return Ok(None);
    }
    if path == META_REMOVE {
        return removed(dp, &value);
    }
    if value == META_REMOVE {
        return removed(dp, path);
    }

    let value = if attr_type == META_COMPOSED {
        match dp.field_as_string(path) {
            Ok(current) => current + &value,
            Err(AppError::NotFound) => value,
            Err(e) => return Err(e),
        }
    } else {
        value
    };
    let changed = dp.set(path, Value::String(value))?;
    Ok(changed.then(|| path.to_string()))
}

fn removed(dp: &mut DataPoint, path: &str) -> AppResult<Option<String>> {
    Ok(dp.remove(path)?.then(|| path.to_string()))
}
