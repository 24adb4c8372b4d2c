//! Value computation
//!
//! [`ValueComputer::compute`] evaluates one directive's value expression
//! against the current event state. It never mutates the event; applying
//! the result is the mutator's job.

use crate::timeutil::{format_duration, parse_duration, parse_time};
use apolo_auth::PasswordService;
use apolo_core::consts::*;
use apolo_core::models::{DataPoint, ValueExpr};
use apolo_core::{AppError, AppResult};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use chrono_tz::Tz;
use rust_decimal::prelude::*;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Strategy behind `*ccUsage`
///
/// Receives the request number, the used credit-control time and the
/// debit interval, already parsed.
pub trait CcUsageStrategy: Send + Sync + fmt::Debug {
    fn usage(&self, request_number: i64, used: Duration, debit_interval: Duration) -> Duration;
}

/// `used + debit_interval * max(request_number - 1, 0)`
///
/// The initial request carries number 1 and is never debited for an
/// interval; negative numbers clamp to zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCcUsage;

impl CcUsageStrategy for DefaultCcUsage {
    fn usage(&self, request_number: i64, used: Duration, debit_interval: Duration) -> Duration {
        let intervals = (request_number - 1).max(0);
        let debited = debit_interval
            .num_nanoseconds()
            .and_then(|n| n.checked_mul(intervals))
            .map(Duration::nanoseconds)
            .unwrap_or(Duration::MAX);
        used.checked_add(&debited).unwrap_or(Duration::MAX)
    }
}

/// Inputs for one computation
#[derive(Debug, Clone, Copy)]
pub struct ComputeRequest<'a> {
    pub dp: &'a DataPoint,
    /// Empty means `*variable`
    pub attr_type: &'a str,
    pub path: &'a str,
    pub value: &'a ValueExpr,
    /// 1-based pass of the current call, 0 outside a run
    pub pass_index: usize,
}

/// Result of the `*sipcid` join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipCid {
    pub value: String,
    /// False when one of the trailing tokens could not be resolved
    pub complete: bool,
}

/// Evaluates attribute value expressions
#[derive(Debug, Clone)]
pub struct ValueComputer {
    rounding_decimals: u32,
    timezone: Tz,
    passwords: PasswordService,
    cc_usage: Arc<dyn CcUsageStrategy>,
}

impl ValueComputer {
    pub fn new(rounding_decimals: u32, timezone: Tz) -> Self {
        Self {
            rounding_decimals,
            timezone,
            passwords: PasswordService::new(),
            cc_usage: Arc::new(DefaultCcUsage),
        }
    }

    pub fn with_cc_usage_strategy(mut self, strategy: Arc<dyn CcUsageStrategy>) -> Self {
        self.cc_usage = strategy;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Compute the value of one directive
    ///
    /// `Ok(None)` is the removal marker produced by `*none`.
    pub fn compute(&self, req: &ComputeRequest<'_>) -> AppResult<Option<String>> {
        let attr_type = if req.attr_type.is_empty() {
            META_VARIABLE
        } else {
            req.attr_type
        };
        debug!(attr_type, path = req.path, pass = req.pass_index, "Computing value");

        let dp = req.dp;
        let value = req.value;
        let out = match attr_type {
            META_NONE => return Ok(None),
            META_CONSTANT => value.parse_constant(),
            META_VARIABLE | META_COMPOSED | META_GENERIC => value.parse_data_point(dp)?,
            META_SUM => self.sum(&value.values(dp)?)?,
            META_DIFFERENCE => self.difference(&value.values(dp)?)?,
            META_MULTIPLY => fold_decimals(&value.values(dp)?, Decimal::checked_mul)?,
            META_DIVIDE => fold_decimals(&value.values(dp)?, checked_div)?,
            META_VALUE_EXPONENT => self.value_exponent(value, dp)?,
            META_USAGE_DIFFERENCE => self.usage_difference(value, dp)?,
            META_UNIX_TIMESTAMP => {
                let t = parse_time(&value.parse_data_point(dp)?, self.timezone)?;
                t.timestamp().to_string()
            }
            META_DATE_TIME => {
                let t = parse_time(&value.parse_data_point(dp)?, self.timezone)?;
                self.render_time(t)
            }
            META_PREFIX => {
                let field = path_value(req.path, dp)?;
                format!("{}{}", value.parse_data_point(dp)?, field)
            }
            META_SUFFIX => {
                let field = path_value(req.path, dp)?;
                format!("{}{}", field, value.parse_data_point(dp)?)
            }
            META_CC_USAGE => self.cc_usage(value, dp)?,
            META_SIP_CID => {
                let cid = sip_cid(value, dp)?;
                if !cid.complete {
                    debug!(partial = %cid.value, "Incomplete *sipcid");
                    return Err(AppError::NotFound);
                }
                cid.value
            }
            META_PASSWORD => self
                .passwords
                .hash_password(&value.parse_data_point(dp)?)?,
            other => return Err(AppError::UnsupportedType(other.to_string())),
        };
        Ok(Some(out))
    }

    fn render_time(&self, t: DateTime<Utc>) -> String {
        t.with_timezone(&self.timezone)
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn sum(&self, values: &[String]) -> AppResult<String> {
        if let Some(durations) = all_durations(values) {
            let total = durations
                .iter()
                .try_fold(Duration::zero(), |acc, d| acc.checked_add(d))
                .ok_or_else(overflow)?;
            return Ok(format_duration(total));
        }
        fold_decimals(values, Decimal::checked_add)
    }

    fn difference(&self, values: &[String]) -> AppResult<String> {
        if let Some(durations) = all_durations(values) {
            let (first, rest) = durations.split_first().ok_or_else(no_operands)?;
            let total = rest
                .iter()
                .try_fold(*first, |acc, d| acc.checked_sub(d))
                .ok_or_else(overflow)?;
            return Ok(format_duration(total));
        }
        if let Some((first, rest)) = values.split_first() {
            if parse_decimal(first).is_err() {
                if let Ok(start) = parse_time(first, self.timezone) {
                    let mut t = start;
                    for v in rest {
                        let d = parse_duration(v)?;
                        t = t.checked_sub_signed(d).ok_or_else(overflow)?;
                    }
                    return Ok(self.render_time(t));
                }
            }
        }
        fold_decimals(values, Decimal::checked_sub)
    }

    fn value_exponent(&self, value: &ValueExpr, dp: &DataPoint) -> AppResult<String> {
        let [multiplier, exponent] = value.tokens() else {
            return Err(invalid_arguments(value, META_VALUE_EXPONENT));
        };
        let raw = multiplier.value(dp)?;
        let multiplier = parse_decimal(&raw).map_err(|_| {
            AppError::InvalidArguments(format!("invalid value <{}> to {}", raw, META_VALUE_EXPONENT))
        })?;
        let raw = exponent.value(dp)?;
        let exponent: i64 = raw.trim().parse().map_err(|_| {
            AppError::Parse(format!("invalid exponent <{}> to {}", raw, META_VALUE_EXPONENT))
        })?;

        let result = Decimal::TEN
            .checked_powi(exponent)
            .and_then(|p| multiplier.checked_mul(p))
            .ok_or_else(overflow)?;
        Ok(result
            .round_dp_with_strategy(
                self.rounding_decimals,
                RoundingStrategy::MidpointAwayFromZero,
            )
            .normalize()
            .to_string())
    }

    fn usage_difference(&self, value: &ValueExpr, dp: &DataPoint) -> AppResult<String> {
        let [end, start] = value.tokens() else {
            return Err(invalid_arguments(value, META_USAGE_DIFFERENCE));
        };
        let end = end.value(dp)?;
        let start = start.value(dp)?;
        let end = parse_time(&end, self.timezone)?;
        let start = parse_time(&start, self.timezone)?;
        Ok(format_duration((end - start).abs()))
    }

    fn cc_usage(&self, value: &ValueExpr, dp: &DataPoint) -> AppResult<String> {
        let [req_nr, used, interval] = value.tokens() else {
            return Err(AppError::InvalidArguments(format!(
                "invalid number of arguments <{}> to {}",
                value, META_CC_USAGE
            )));
        };

        let raw = req_nr.value(dp)?;
        let req_nr: i64 = raw.parse().map_err(|_| {
            AppError::InvalidArguments(format!("invalid requestNumber <{}> to {}", raw, META_CC_USAGE))
        })?;
        let raw = used.value(dp)?;
        let used = parse_duration(&raw).map_err(|_| {
            AppError::InvalidArguments(format!("invalid usedCCTime <{}> to {}", raw, META_CC_USAGE))
        })?;
        let raw = interval.value(dp)?;
        let interval = parse_duration(&raw).map_err(|_| {
            AppError::InvalidArguments(format!("invalid debitInterval <{}> to {}", raw, META_CC_USAGE))
        })?;

        Ok(format_duration(self.cc_usage.usage(req_nr, used, interval)))
    }
}

/// Join a SIP call-id with the remaining tokens sorted
///
/// The call-id token must resolve. Missing or empty trailing tokens are
/// skipped; a missing one marks the result incomplete.
pub fn sip_cid(value: &ValueExpr, dp: &DataPoint) -> AppResult<SipCid> {
    let (first, rest) = value.tokens().split_first().ok_or_else(|| {
        AppError::InvalidArguments(format!("invalid number of arguments <[]> to {}", META_SIP_CID))
    })?;

    let call_id = first.value(dp)?;
    let mut complete = true;
    let mut parts = Vec::with_capacity(rest.len());
    for token in rest {
        match token.value(dp) {
            Ok(v) if v.is_empty() => {}
            Ok(v) => parts.push(v),
            Err(AppError::NotFound) => complete = false,
            Err(e) => return Err(e),
        }
    }
    parts.sort();

    let mut out = call_id;
    for p in parts {
        out.push(INFIELD_SEP);
        out.push_str(&p);
    }
    Ok(SipCid {
        value: out,
        complete,
    })
}

/// Resolve the directive path itself, as `*prefix`/`*suffix` need it
fn path_value(path: &str, dp: &DataPoint) -> AppResult<String> {
    ValueExpr::parse(&format!("{}{}", DYNAMIC_DATA_PREFIX, path))?.parse_data_point(dp)
}

fn parse_decimal(s: &str) -> AppResult<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map_err(|_| AppError::Parse(format!("cannot convert <{}> to decimal", s)))
}

/// Durations only when no operand is a plain number
fn all_durations(values: &[String]) -> Option<Vec<Duration>> {
    if values.is_empty() || values.iter().all(|v| parse_decimal(v).is_ok()) {
        return None;
    }
    values.iter().map(|v| parse_duration(v).ok()).collect()
}

fn fold_decimals(
    values: &[String],
    op: fn(Decimal, Decimal) -> Option<Decimal>,
) -> AppResult<String> {
    let (first, rest) = values.split_first().ok_or_else(no_operands)?;
    let mut acc = parse_decimal(first)?;
    for v in rest {
        acc = op(acc, parse_decimal(v)?).ok_or_else(|| {
            AppError::InvalidArguments(format!("invalid arithmetic on <{}> and <{}>", acc, v))
        })?;
    }
    Ok(acc.normalize().to_string())
}

fn checked_div(a: Decimal, b: Decimal) -> Option<Decimal> {
    if b.is_zero() {
        return None;
    }
    a.checked_div(b)
}

fn invalid_arguments(value: &ValueExpr, attr_type: &str) -> AppError {
    AppError::InvalidArguments(format!("invalid arguments <{}> to {}", value, attr_type))
}

fn no_operands() -> AppError {
    AppError::InvalidArguments("no operands".to_string())
}

fn overflow() -> AppError {
    AppError::InvalidArguments("arithmetic overflow".to_string())
}
