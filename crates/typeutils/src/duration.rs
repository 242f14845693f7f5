//! Kibana duration values.
//!
//! Terraform configuration uses compact strings (`"5m"`), the Kibana API an
//! object (`{"value": 5, "unit": "m"}`).

use std::fmt;
use std::str::FromStr;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unit of a [`KibanaDuration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationUnit {
    /// Seconds
    #[serde(rename = "s")]
    Seconds,
    /// Minutes
    #[serde(rename = "m")]
    Minutes,
    /// Hours
    #[serde(rename = "h")]
    Hours,
}

impl DurationUnit {
    fn as_str(self) -> &'static str {
        match self {
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
        }
    }
}

/// A whole-number duration with a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KibanaDuration {
    /// Magnitude
    pub value: i64,
    /// Unit
    pub unit: DurationUnit,
}

/// A duration string that does not match `<digits><s|m|h>`.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[error("invalid duration {input:?}: expected a whole number followed by s, m or h")]
#[diagnostic(code(elasticstack_typeutils::invalid_duration))]
pub struct DurationParseError {
    /// The rejected input
    pub input: String,
}

impl FromStr for KibanaDuration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || DurationParseError {
            input: s.to_string(),
        };
        let trimmed = s.trim();
        let (split, _) = trimmed.char_indices().last().ok_or_else(err)?;
        let (digits, unit) = trimmed.split_at(split);

        let unit = match unit {
            "s" => DurationUnit::Seconds,
            "m" => DurationUnit::Minutes,
            "h" => DurationUnit::Hours,
            _ => return Err(err()),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let value = digits.parse::<i64>().map_err(|_| err())?;

        Ok(Self { value, unit })
    }
}

impl fmt::Display for KibanaDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.as_str())
    }
}
