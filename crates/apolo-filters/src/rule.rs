//! Inline filter rules
//!
//! A rule is written `*kind:~element:value1;value2`. The element is a path
//! into the event; values are literals or `~` references. Brackets in the
//! element may contain `:` (`~*vars.*processedProfileIDs[cgrates.org:A]`).

use apolo_core::consts::{CONCATENATED_KEY_SEP, DYNAMIC_DATA_PREFIX, INFIELD_SEP};
use apolo_core::models::{value_as_string, DataPoint};
use apolo_core::{AppError, AppResult};
use rust_decimal::Decimal;
use serde_json::Value;
use std::cmp::Ordering;
use std::str::FromStr;

const NOT_PREFIX: &str = "*not";

/// Comparison performed by a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    String,
    Prefix,
    Suffix,
    Exists,
    Empty,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterKind {
    fn from_meta(meta: &str) -> Option<Self> {
        Some(match meta {
            "*string" => FilterKind::String,
            "*prefix" => FilterKind::Prefix,
            "*suffix" => FilterKind::Suffix,
            "*exists" => FilterKind::Exists,
            "*empty" => FilterKind::Empty,
            "*gt" => FilterKind::Gt,
            "*gte" => FilterKind::Gte,
            "*lt" => FilterKind::Lt,
            "*lte" => FilterKind::Lte,
            _ => return None,
        })
    }

    fn negatable(self) -> bool {
        !matches!(
            self,
            FilterKind::Gt | FilterKind::Gte | FilterKind::Lt | FilterKind::Lte
        )
    }

    fn needs_values(self) -> bool {
        !matches!(self, FilterKind::Exists | FilterKind::Empty)
    }
}

/// Parsed filter rule
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRule {
    pub kind: FilterKind,
    pub negated: bool,
    pub element: String,
    pub values: Vec<String>,
}

impl FilterRule {
    /// Parse an inline rule
    ///
    /// Unknown kinds fail with `NOT_IMPLEMENTED:<kind>`.
    pub fn parse(rule: &str) -> AppResult<Self> {
        let (meta, rest) = rule
            .split_once(CONCATENATED_KEY_SEP)
            .ok_or_else(|| AppError::Syntax(format!("inline parse error for string: <{}>", rule)))?;

        let (kind, negated) = match FilterKind::from_meta(meta) {
            Some(kind) => (kind, false),
            None => {
                let positive = meta
                    .strip_prefix(NOT_PREFIX)
                    .map(|k| format!("*{}", k))
                    .and_then(|k| FilterKind::from_meta(&k))
                    .filter(|k| k.negatable())
                    .ok_or_else(|| AppError::NotImplemented(meta.to_string()))?;
                (positive, true)
            }
        };

        let (element, raw_values) = split_element(rest);
        if element.is_empty() {
            return Err(AppError::Syntax(format!(
                "inline parse error for string: <{}>",
                rule
            )));
        }
        let values: Vec<String> = raw_values
            .split(INFIELD_SEP)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        if kind.needs_values() && values.is_empty() {
            return Err(AppError::Syntax(format!("values missing for rule: <{}>", rule)));
        }

        Ok(Self {
            kind,
            negated,
            element: element
                .strip_prefix(DYNAMIC_DATA_PREFIX)
                .unwrap_or(element)
                .to_string(),
            values,
        })
    }

    /// Evaluate against the event
    pub fn pass(&self, dp: &DataPoint) -> AppResult<bool> {
        let field = match dp.get(&self.element) {
            Ok(v) => Some(v),
            Err(AppError::NotFound) | Err(AppError::WrongPath) => None,
            Err(e) => return Err(e),
        };

        // a negated comparison still fails on a missing field
        if field.is_none() && field_required(self.kind) {
            return Ok(false);
        }

        let matched = match (self.kind, field) {
            (FilterKind::Exists, f) => f.is_some(),
            (FilterKind::Empty, f) => f.map(is_empty_value).unwrap_or(false),
            (_, None) => false,
            (kind, Some(field)) => {
                let field = value_as_string(field);
                self.resolved_values(dp)?
                    .iter()
                    .any(|v| compare(kind, &field, v))
            }
        };
        Ok(matched != self.negated)
    }

    fn resolved_values(&self, dp: &DataPoint) -> AppResult<Vec<String>> {
        let mut out = Vec::with_capacity(self.values.len());
        for v in &self.values {
            match v.strip_prefix(DYNAMIC_DATA_PREFIX) {
                Some(path) => match dp.field_as_string(path) {
                    Ok(val) => out.push(val),
                    Err(AppError::NotFound) | Err(AppError::WrongPath) => {}
                    Err(e) => return Err(e),
                },
                None => out.push(v.clone()),
            }
        }
        Ok(out)
    }
}

fn field_required(kind: FilterKind) -> bool {
    !matches!(kind, FilterKind::Exists | FilterKind::Empty)
}

/// Split `~element:values`, ignoring `:` inside brackets
fn split_element(rest: &str) -> (&str, &str) {
    let mut depth = 0usize;
    for (idx, c) in rest.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            CONCATENATED_KEY_SEP if depth == 0 => return (&rest[..idx], &rest[idx + 1..]),
            _ => {}
        }
    }
    (rest, "")
}

fn is_empty_value(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn compare(kind: FilterKind, field: &str, value: &str) -> bool {
    match kind {
        FilterKind::String => field == value,
        FilterKind::Prefix => field.starts_with(value),
        FilterKind::Suffix => field.ends_with(value),
        FilterKind::Gt | FilterKind::Gte | FilterKind::Lt | FilterKind::Lte => {
            let (Ok(f), Ok(v)) = (Decimal::from_str(field), Decimal::from_str(value)) else {
                return false;
            };
            let ord = f.cmp(&v);
            match kind {
                FilterKind::Gt => ord == Ordering::Greater,
                FilterKind::Gte => ord != Ordering::Less,
                FilterKind::Lt => ord == Ordering::Less,
                _ => ord != Ordering::Greater,
            }
        }
        FilterKind::Exists | FilterKind::Empty => false,
    }
}
