//! Path-addressable event view
//!
//! A [`DataPoint`] holds the event state an attribute pass works on: one
//! JSON object per namespace (`*req`, `*opts`, `*vars`) plus the `*tenant`
//! string. Paths are dotted (`*req.Account`) and may carry bracketed
//! segments whose content is taken verbatim
//! (`*vars.*processedProfileIDs[cgrates.org:ATTR_1]`).

use crate::consts::NESTING_SEP;
use crate::{AppError, AppResult};
use serde_json::{Map, Value};

/// Split a path into its segments
///
/// ```
/// use apolo_core::models::split_path;
///
/// let segs = split_path("*vars.*processedProfileIDs[cgrates.org:ATTR_1]").unwrap();
/// assert_eq!(segs, vec!["*vars", "*processedProfileIDs", "cgrates.org:ATTR_1"]);
/// ```
pub fn split_path(path: &str) -> AppResult<Vec<String>> {
    if path.is_empty() {
        return Err(AppError::WrongPath);
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            NESTING_SEP => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                } else if segments.is_empty() {
                    return Err(AppError::WrongPath);
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                let mut inner = String::new();
                let mut closed = false;
                for ic in chars.by_ref() {
                    if ic == ']' {
                        closed = true;
                        break;
                    }
                    inner.push(ic);
                }
                if !closed || inner.is_empty() {
                    return Err(AppError::WrongPath);
                }
                segments.push(inner);
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    if segments.is_empty() {
        return Err(AppError::WrongPath);
    }
    Ok(segments)
}

/// Render a JSON value the way event fields are compared and concatenated
pub fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Nested, mutable event state for one attribute call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataPoint {
    root: Map<String, Value>,
}

impl DataPoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an already assembled root object
    pub fn from_map(root: Map<String, Value>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn into_root(self) -> Map<String, Value> {
        self.root
    }

    /// Top-level object for a namespace, if present and a container
    pub fn namespace(&self, name: &str) -> Option<&Map<String, Value>> {
        self.root.get(name).and_then(Value::as_object)
    }

    /// Replace a whole namespace
    pub fn set_namespace(&mut self, name: &str, value: Value) {
        self.root.insert(name.to_string(), value);
    }

    /// Look up the value at `path`
    ///
    /// Returns `NotFound` for a missing key and `WrongPath` when the walk
    /// reaches a scalar before the last segment.
    pub fn get(&self, path: &str) -> AppResult<&Value> {
        let segments = split_path(path)?;
        let (first, rest) = segments.split_first().ok_or(AppError::WrongPath)?;

        let mut current = self.root.get(first).ok_or(AppError::NotFound)?;
        for seg in rest {
            current = match current {
                Value::Object(map) => map.get(seg).ok_or(AppError::NotFound)?,
                Value::Array(items) => {
                    let idx: usize = seg.parse().map_err(|_| AppError::WrongPath)?;
                    items.get(idx).ok_or(AppError::NotFound)?
                }
                Value::Null => return Err(AppError::NotFound),
                _ => return Err(AppError::WrongPath),
            };
        }
        Ok(current)
    }

    pub fn field_as_string(&self, path: &str) -> AppResult<String> {
        self.get(path).map(value_as_string)
    }

    /// Store `value` at `path`, creating intermediate objects
    ///
    /// Returns whether the stored value differs from the previous one.
    /// Values are compared rendered, so `"20"` over `20` is no change and
    /// the current value is kept. A bare namespace is `WrongPath`; whole
    /// namespaces go through [`DataPoint::set_namespace`].
    pub fn set(&mut self, path: &str, value: Value) -> AppResult<bool> {
        let segments = split_path(path)?;
        let (last, parents) = segments.split_last().ok_or(AppError::WrongPath)?;
        if parents.is_empty() {
            return Err(AppError::WrongPath);
        }

        let mut container = &mut self.root;
        for seg in parents {
            let slot = container
                .entry(seg.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if slot.is_null() {
                *slot = Value::Object(Map::new());
            }
            container = match slot {
                Value::Object(map) => map,
                _ => return Err(AppError::WrongPath),
            };
        }

        if let Some(current) = container.get(last) {
            if value_as_string(current) == value_as_string(&value) {
                return Ok(false);
            }
        }
        container.insert(last.clone(), value);
        Ok(true)
    }

    /// Delete the value at `path`
    ///
    /// Returns whether something was removed.
    pub fn remove(&mut self, path: &str) -> AppResult<bool> {
        let segments = split_path(path)?;
        let (last, parents) = segments.split_last().ok_or(AppError::WrongPath)?;
        if parents.is_empty() {
            return Err(AppError::WrongPath);
        }

        let mut container = &mut self.root;
        for seg in parents {
            container = match container.get_mut(seg) {
                Some(Value::Object(map)) => map,
                Some(Value::Null) | None => return Ok(false),
                Some(_) => return Err(AppError::WrongPath),
            };
        }
        Ok(container.remove(last).is_some())
    }
}
