//! Composable attribute-filter algebra.
//!
//! A [`Filter`] is an expression over a point's string attributes, built
//! from a small closed set of variants: `true`, existence, equality, regex,
//! and the boolean connectives. Filters evaluate with [`Filter::matches`],
//! print in a canonical human form, and serialize to the wire shape
//! `{op, attr?, val?, exprs?}`.
//!
//! Regex patterns compile at construction time; an invalid pattern is a
//! parse error there, never at match time. Decoded filters recompile.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An attribute predicate.
///
/// Empty `And` and `Or` lists evaluate to false.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "FilterRepr", into = "FilterRepr")]
pub enum Filter {
    /// Always true; the no-op filter.
    True,
    /// True iff the attribute is present (its value may be empty).
    Exists {
        /// Attribute key to test.
        attr: String,
    },
    /// True iff the attribute is present and byte-for-byte equal.
    Equal {
        /// Attribute key to test.
        attr: String,
        /// Required value, compared case-sensitively.
        val: String,
    },
    /// True iff the attribute is present and the pattern matches its value.
    Regex {
        /// Attribute key to test.
        attr: String,
        /// Pattern compiled at construction; unanchored.
        re: Regex,
    },
    /// Negation of the inner filter.
    Not(Box<Filter>),
    /// Conjunction; an empty list is false.
    And(Vec<Filter>),
    /// Disjunction; an empty list is false.
    Or(Vec<Filter>),
}

impl Filter {
    /// An existence test for `attr`.
    #[must_use]
    pub fn exists(attr: &str) -> Self {
        Self::Exists { attr: attr.to_string() }
    }

    /// An equality test for `attr`.
    #[must_use]
    pub fn equal(attr: &str, val: &str) -> Self {
        Self::Equal { attr: attr.to_string(), val: val.to_string() }
    }

    /// A regex test for `attr`. Fails on an invalid pattern.
    pub fn regex(attr: &str, pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern)
            .map_err(|e| Error::Parse(format!("invalid regex /{pattern}/: {e}")))?;
        Ok(Self::Regex { attr: attr.to_string(), re })
    }

    /// The negation of `inner`.
    #[must_use]
    pub fn negate(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Parses a filter from its JSON text form.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Parse(e.to_string()))
    }

    /// Renders the filter's JSON text form.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Parse(e.to_string()))
    }

    /// Evaluates this filter against an attribute map.
    #[must_use]
    pub fn matches(&self, attrs: &BTreeMap<String, String>) -> bool {
        match self {
            Self::True => true,
            Self::Exists { attr } => attrs.contains_key(attr),
            Self::Equal { attr, val } => attrs.get(attr) == Some(val),
            Self::Regex { attr, re } => attrs.get(attr).is_some_and(|v| re.is_match(v)),
            Self::Not(inner) => !inner.matches(attrs),
            Self::And(parts) => !parts.is_empty() && parts.iter().all(|f| f.matches(attrs)),
            Self::Or(parts) => parts.iter().any(|f| f.matches(attrs)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("true"),
            Self::Exists { attr } => write!(f, "{attr} exists"),
            Self::Equal { attr, val } => write!(f, "{attr} == '{val}'"),
            Self::Regex { attr, re } => write!(f, "{attr} =~ /{re}/"),
            Self::Not(inner) => write!(f, "!({inner})"),
            Self::And(parts) => {
                let joined: Vec<String> = parts.iter().map(|p| format!("({p})")).collect();
                f.write_str(&joined.join(" && "))
            }
            Self::Or(parts) => {
                let joined: Vec<String> = parts.iter().map(|p| format!("({p})")).collect();
                f.write_str(&joined.join(" || "))
            }
        }
    }
}

/// Wire shape of a filter: a single record with an `op` tag and the
/// fields that op uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FilterRepr {
    op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    val: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exprs: Option<Vec<FilterRepr>>,
}

impl From<Filter> for FilterRepr {
    fn from(filter: Filter) -> Self {
        let empty = || Self { op: String::new(), attr: None, val: None, exprs: None };
        match filter {
            Filter::True => Self { op: "true".to_string(), ..empty() },
            Filter::Exists { attr } => {
                Self { op: "exists".to_string(), attr: Some(attr), ..empty() }
            }
            Filter::Equal { attr, val } => Self {
                op: "equal".to_string(),
                attr: Some(attr),
                val: Some(val),
                exprs: None,
            },
            Filter::Regex { attr, re } => Self {
                op: "regex".to_string(),
                attr: Some(attr),
                val: Some(re.as_str().to_string()),
                exprs: None,
            },
            Filter::Not(inner) => Self {
                op: "not".to_string(),
                exprs: Some(vec![Self::from(*inner)]),
                ..empty()
            },
            Filter::And(parts) => Self {
                op: "and".to_string(),
                exprs: Some(parts.into_iter().map(Self::from).collect()),
                ..empty()
            },
            Filter::Or(parts) => Self {
                op: "or".to_string(),
                exprs: Some(parts.into_iter().map(Self::from).collect()),
                ..empty()
            },
        }
    }
}

impl FilterRepr {
    /// The `attr` field, which this op requires to be present and non-empty.
    fn require_attr(&self) -> Result<String> {
        match self.attr.as_deref() {
            Some(a) if !a.is_empty() => Ok(a.to_string()),
            _ => Err(Error::Parse(format!(
                "filter op '{}' requires a non-empty 'attr'",
                self.op
            ))),
        }
    }

    /// The `val` field, which this op requires to be present and non-empty.
    fn require_val(&self) -> Result<String> {
        match self.val.as_deref() {
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            _ => Err(Error::Parse(format!(
                "filter op '{}' requires a non-empty 'val'",
                self.op
            ))),
        }
    }

    /// Rejects fields the op does not accept.
    fn forbid(&self, attr: bool, val: bool, exprs: bool) -> Result<()> {
        if attr && self.attr.is_some() {
            return Err(Error::Parse(format!("filter op '{}' takes no 'attr'", self.op)));
        }
        if val && self.val.is_some() {
            return Err(Error::Parse(format!("filter op '{}' takes no 'val'", self.op)));
        }
        if exprs && self.exprs.is_some() {
            return Err(Error::Parse(format!("filter op '{}' takes no 'exprs'", self.op)));
        }
        Ok(())
    }

    /// The `exprs` list, decoded recursively, with a cardinality check.
    fn require_exprs(self, min: usize, max: usize) -> Result<Vec<Filter>> {
        let op = self.op;
        let exprs = self.exprs.ok_or_else(|| {
            Error::Parse(format!("filter op '{op}' requires 'exprs'"))
        })?;
        if exprs.len() < min || exprs.len() > max {
            let expected = if max == usize::MAX {
                format!("at least {min}")
            } else {
                format!("{min}..={max}")
            };
            return Err(Error::Parse(format!(
                "filter op '{op}' has {} exprs, expected {expected}",
                exprs.len()
            )));
        }
        exprs.into_iter().map(Filter::try_from).collect()
    }
}

impl TryFrom<FilterRepr> for Filter {
    type Error = Error;

    fn try_from(repr: FilterRepr) -> Result<Self> {
        match repr.op.as_str() {
            "true" => {
                repr.forbid(true, true, true)?;
                Ok(Self::True)
            }
            "exists" => {
                repr.forbid(false, true, true)?;
                Ok(Self::Exists { attr: repr.require_attr()? })
            }
            "equal" => {
                repr.forbid(false, false, true)?;
                Ok(Self::Equal { attr: repr.require_attr()?, val: repr.require_val()? })
            }
            "regex" => {
                repr.forbid(false, false, true)?;
                let attr = repr.require_attr()?;
                let pattern = repr.require_val()?;
                Self::regex(&attr, &pattern)
            }
            "not" => {
                repr.forbid(true, true, false)?;
                let mut inner = repr.require_exprs(1, 1)?;
                Ok(Self::Not(Box::new(inner.remove(0))))
            }
            "and" => {
                repr.forbid(true, true, false)?;
                Ok(Self::And(repr.require_exprs(1, usize::MAX)?))
            }
            "or" => {
                repr.forbid(true, true, false)?;
                Ok(Self::Or(repr.require_exprs(1, usize::MAX)?))
            }
            other => Err(Error::Parse(format!("unknown filter op '{other}'"))),
        }
    }
}
