use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Answers collected in one session, keyed by question id.
///
/// A `BTreeMap` keeps iteration order stable so anything derived from the
/// map is reproducible.
pub type AnswerMap = BTreeMap<String, AnswerValue>;

/// A raw answer as sent back by the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum AnswerValue {
    Number(f64),
    Text(String),
    List(Vec<AnswerValue>),
}

impl AnswerValue {
    /// Numeric reading of the answer. Text is accepted when it parses as a
    /// finite number, since form controls frequently send numbers as strings.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Text(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Blank text and empty selections count as "not answered". A number,
    /// including zero, is always an answer.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Text(text) => text.trim().is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }

    /// Equality as used by branching conditions: numeric when both sides
    /// read as numbers, textual otherwise. Two lists are equal when they hold
    /// the same selections in any order. A list and a single value are equal
    /// when the list contains that value.
    pub fn loosely_equals(&self, other: &AnswerValue) -> bool {
        match (self, other) {
            (Self::List(left), Self::List(right)) => {
                left.iter().all(|l| right.iter().any(|r| l.loosely_equals(r)))
                    && right.iter().all(|r| left.iter().any(|l| l.loosely_equals(r)))
            }
            (Self::List(items), scalar) | (scalar, Self::List(items)) => {
                items.iter().any(|item| item.loosely_equals(scalar))
            }
            _ => self.scalar_equals(other),
        }
    }

    fn scalar_equals(&self, other: &AnswerValue) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(text) => f.write_str(text),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for AnswerValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<AnswerValue>> for AnswerValue {
    fn from(values: Vec<AnswerValue>) -> Self {
        Self::List(values)
    }
}
