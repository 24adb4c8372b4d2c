//! Value expressions
//!
//! An attribute value is written as a `;`-separated rule such as
//! `~*req.Account:s/(.*)@(.*)/${1}.${2}/;constant`. Plain tokens are
//! literals, `~` tokens read a path from the [`DataPoint`], and backtick
//! quoted sections are literals that may contain the separator.

use crate::consts::{DYNAMIC_DATA_PREFIX, INFIELD_SEP, UNSPLIT_QUOTE};
use crate::models::datapoint::DataPoint;
use crate::{AppError, AppResult};
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const UNCLOSED_UNSPLIT: &str = "Unclosed unspilit syntax";
const CLOSED_UNSPLIT: &str = "Closed unspilit syntax";

/// One `:s/<regex>/<template>/` rule attached to a reference
#[derive(Debug, Clone)]
pub struct SearchReplace {
    search: Regex,
    template: String,
}

impl SearchReplace {
    /// Expand the template against the first match, or keep the source
    pub fn process(&self, source: &str) -> String {
        match self.search.captures(source) {
            Some(caps) => {
                let mut out = String::new();
                caps.expand(&self.template, &mut out);
                out
            }
            None => source.to_string(),
        }
    }
}

impl PartialEq for SearchReplace {
    fn eq(&self, other: &Self) -> bool {
        self.search.as_str() == other.search.as_str() && self.template == other.template
    }
}

/// Single token of a value expression
#[derive(Debug, Clone, PartialEq)]
pub enum ValueToken {
    Constant(String),
    Reference {
        path: String,
        rules: Vec<SearchReplace>,
    },
}

impl ValueToken {
    fn parse(raw: &str) -> AppResult<Self> {
        let Some(body) = raw.strip_prefix(DYNAMIC_DATA_PREFIX) else {
            return Ok(ValueToken::Constant(raw.to_string()));
        };
        match find_rules_start(body) {
            Some(idx) => Ok(ValueToken::Reference {
                path: body[..idx].to_string(),
                rules: parse_rules(&body[idx + 1..])?,
            }),
            None => Ok(ValueToken::Reference {
                path: body.to_string(),
                rules: Vec::new(),
            }),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, ValueToken::Constant(_))
    }

    /// Resolve the token against the event
    pub fn value(&self, dp: &DataPoint) -> AppResult<String> {
        match self {
            ValueToken::Constant(c) => Ok(c.clone()),
            ValueToken::Reference { path, rules } => {
                let mut out = dp.field_as_string(path)?;
                for rule in rules {
                    out = rule.process(&out);
                }
                Ok(out)
            }
        }
    }
}

/// Position of the `:` opening the first `s/` rule, outside brackets
fn find_rules_start(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in body.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ':' if depth == 0 && body[idx + 1..].starts_with("s/") => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Parse `s/a/b/:s/c/d/` into its rules
fn parse_rules(rules_src: &str) -> AppResult<Vec<SearchReplace>> {
    let invalid = || AppError::Syntax(format!("invalid search&replace rule: <{}>", rules_src));
    let mut src = rules_src;
    let mut rules = Vec::new();

    while !src.is_empty() {
        let rest = src.strip_prefix("s/").ok_or_else(invalid)?;
        let (search, rest) = split_unescaped(rest).ok_or_else(invalid)?;
        let (template, rest) = split_unescaped(rest).ok_or_else(invalid)?;
        let search = Regex::new(&search)
            .map_err(|e| AppError::Syntax(format!("invalid search regex <{}>: {}", search, e)))?;
        rules.push(SearchReplace { search, template });
        src = match rest.strip_prefix(':') {
            Some(next) => next,
            None if rest.is_empty() => rest,
            None => return Err(invalid()),
        };
    }
    Ok(rules)
}

/// Read up to the next unescaped `/`
fn split_unescaped(src: &str) -> Option<(String, &str)> {
    let mut out = String::new();
    let mut escaped = false;
    for (idx, c) in src.char_indices() {
        match c {
            '/' if !escaped => return Some((out, &src[idx + 1..])),
            '\\' if !escaped => escaped = true,
            _ => {
                if escaped && c != '/' {
                    out.push('\\');
                }
                out.push(c);
                escaped = false;
            }
        }
    }
    None
}

/// Compiled value expression
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueExpr {
    rule: String,
    tokens: Vec<ValueToken>,
}

impl ValueExpr {
    /// Compile a rule string
    pub fn parse(rule: &str) -> AppResult<Self> {
        let mut tokens = Vec::new();
        let mut buf = String::new();
        let mut quoted: Option<String> = None;

        for c in rule.chars() {
            match (c, quoted.as_mut()) {
                (UNSPLIT_QUOTE, None) => {
                    if !buf.is_empty() {
                        tokens.push(ValueToken::parse(&std::mem::take(&mut buf))?);
                    }
                    quoted = Some(String::new());
                }
                (UNSPLIT_QUOTE, Some(lit)) => {
                    if lit.is_empty() {
                        return Err(AppError::Syntax(CLOSED_UNSPLIT.to_string()));
                    }
                    tokens.push(ValueToken::Constant(std::mem::take(lit)));
                    quoted = None;
                }
                (_, Some(lit)) => lit.push(c),
                (INFIELD_SEP, None) => {
                    if !buf.is_empty() {
                        tokens.push(ValueToken::parse(&std::mem::take(&mut buf))?);
                    }
                }
                (_, None) => buf.push(c),
            }
        }
        if quoted.is_some() {
            return Err(AppError::Syntax(UNCLOSED_UNSPLIT.to_string()));
        }
        if !buf.is_empty() {
            tokens.push(ValueToken::parse(&buf)?);
        }

        Ok(Self {
            rule: rule.to_string(),
            tokens,
        })
    }

    /// Expression that always yields `value` verbatim
    pub fn constant(value: &str) -> Self {
        let needs_quote = value.contains(INFIELD_SEP) || value.starts_with(DYNAMIC_DATA_PREFIX);
        let rule = if needs_quote && !value.contains(UNSPLIT_QUOTE) {
            format!("{q}{value}{q}", q = UNSPLIT_QUOTE)
        } else {
            value.to_string()
        };
        Self {
            rule,
            tokens: vec![ValueToken::Constant(value.to_string())],
        }
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn tokens(&self) -> &[ValueToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Concatenate every token, resolving references
    pub fn parse_data_point(&self, dp: &DataPoint) -> AppResult<String> {
        let mut out = String::new();
        for token in &self.tokens {
            out.push_str(&token.value(dp)?);
        }
        Ok(out)
    }

    /// Concatenate the literal tokens only
    pub fn parse_constant(&self) -> String {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                ValueToken::Constant(c) => Some(c.as_str()),
                ValueToken::Reference { .. } => None,
            })
            .collect()
    }

    /// Resolve each token on its own
    pub fn values(&self, dp: &DataPoint) -> AppResult<Vec<String>> {
        self.tokens.iter().map(|t| t.value(dp)).collect()
    }
}

impl fmt::Display for ValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rule)
    }
}

impl FromStr for ValueExpr {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ValueExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.rule)
    }
}

impl<'de> Deserialize<'de> for ValueExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rule = String::deserialize(deserializer)?;
        ValueExpr::parse(&rule).map_err(de::Error::custom)
    }
}
