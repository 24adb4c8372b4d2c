//! Duration and time parsing
//!
//! Durations follow the `1h2m3.5s` unit syntax or a bare integer of
//! nanoseconds. Times are detected from a small set of layouts; naive
//! layouts are read in the configured timezone.

use apolo_core::consts::META_NOW;
use apolo_core::{AppError, AppResult};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

const NANOS_PER_MICRO: u64 = 1_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: u64 = 1_000_000_000;
const NANOS_PER_MIN: u64 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u64 = 60 * NANOS_PER_MIN;

const NAIVE_LAYOUTS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y%m%d%H%M%S"];

fn invalid_duration(s: &str) -> AppError {
    AppError::Parse(format!("time: invalid duration \"{}\"", s))
}

fn unit_nanos(unit: &str) -> Option<u64> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => NANOS_PER_MICRO,
        "ms" => NANOS_PER_MILLI,
        "s" => NANOS_PER_SEC,
        "m" => NANOS_PER_MIN,
        "h" => NANOS_PER_HOUR,
        _ => return None,
    })
}

/// Parse a duration, bare integers being nanoseconds
///
/// ```
/// use apolo_attributes::timeutil::parse_duration;
///
/// assert_eq!(parse_duration("1m30s").unwrap().num_seconds(), 90);
/// assert_eq!(parse_duration("400").unwrap().num_nanoseconds(), Some(400));
/// ```
pub fn parse_duration(s: &str) -> AppResult<Duration> {
    if let Ok(nanos) = s.parse::<i64>() {
        return Ok(Duration::nanoseconds(nanos));
    }

    let (neg, body) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    if body.is_empty() {
        return Err(invalid_duration(s));
    }
    if body == "0" {
        return Ok(Duration::zero());
    }

    let mut total: u64 = 0;
    let mut rest = body;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| invalid_duration(s))?;
        let (number, tail) = rest.split_at(num_end);
        if number.is_empty() || number == "." {
            return Err(invalid_duration(s));
        }
        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);
        let scale = unit_nanos(unit).ok_or_else(|| invalid_duration(s))?;

        let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid_duration(s))?
        };
        let mut nanos = whole
            .checked_mul(scale)
            .ok_or_else(|| invalid_duration(s))?;
        if !frac.is_empty() {
            let digits: u32 = frac.len().min(18) as u32;
            let frac_val: u64 = frac[..digits as usize]
                .parse()
                .map_err(|_| invalid_duration(s))?;
            let frac_nanos = u64::try_from(frac_val as u128 * scale as u128 / 10u128.pow(digits))
                .map_err(|_| invalid_duration(s))?;
            nanos = nanos
                .checked_add(frac_nanos)
                .ok_or_else(|| invalid_duration(s))?;
        }
        total = total.checked_add(nanos).ok_or_else(|| invalid_duration(s))?;
        rest = tail;
    }

    let total = i64::try_from(total).map_err(|_| invalid_duration(s))?;
    Ok(Duration::nanoseconds(if neg { -total } else { total }))
}

/// `whole[.frac]` of `value / div`, trailing zeros dropped
fn fmt_frac(value: u64, div: u64) -> String {
    let whole = value / div;
    let frac = value % div;
    if frac == 0 {
        return whole.to_string();
    }
    let width = div.to_string().len() - 1;
    let frac = format!("{:0width$}", frac, width = width);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Render a duration in unit syntax (`400ns`, `1.5ms`, `1h0m5s`)
pub fn format_duration(d: Duration) -> String {
    let Some(nanos) = d.num_nanoseconds() else {
        return format!("{}s", d.num_seconds());
    };
    if nanos == 0 {
        return "0s".to_string();
    }
    let sign = if nanos < 0 { "-" } else { "" };
    let u = nanos.unsigned_abs();

    let body = if u < NANOS_PER_MICRO {
        format!("{}ns", u)
    } else if u < NANOS_PER_MILLI {
        format!("{}µs", fmt_frac(u, NANOS_PER_MICRO))
    } else if u < NANOS_PER_SEC {
        format!("{}ms", fmt_frac(u, NANOS_PER_MILLI))
    } else {
        let secs = fmt_frac(u % NANOS_PER_MIN, NANOS_PER_SEC);
        let hours = u / NANOS_PER_HOUR;
        let mins = (u % NANOS_PER_HOUR) / NANOS_PER_MIN;
        if hours > 0 {
            format!("{}h{}m{}s", hours, mins, secs)
        } else if mins > 0 {
            format!("{}m{}s", mins, secs)
        } else {
            format!("{}s", secs)
        }
    };
    format!("{}{}", sign, body)
}

/// Resolve an IANA timezone name
pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    if name.is_empty() {
        return Ok(Tz::UTC);
    }
    name.parse::<Tz>()
        .map_err(|e| AppError::Config(format!("invalid timezone <{}>: {}", name, e)))
}

/// Detect the layout of `s` and parse it
pub fn parse_time(s: &str, tz: Tz) -> AppResult<DateTime<Utc>> {
    let s = s.trim();
    if s == META_NOW {
        return Ok(Utc::now());
    }
    if let Some(offset) = s.strip_prefix('+') {
        let d = parse_duration(offset).map_err(|_| AppError::UnsupportedTimeFormat)?;
        return Ok(Utc::now() + d);
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    if s.len() == 10 && s.bytes().all(|b| b.is_ascii_digit()) {
        let secs: i64 = s.parse().map_err(|_| AppError::UnsupportedTimeFormat)?;
        return Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or(AppError::UnsupportedTimeFormat);
    }
    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|t| t.with_timezone(&Utc))
                .ok_or(AppError::UnsupportedTimeFormat);
        }
    }
    Err(AppError::UnsupportedTimeFormat)
}
