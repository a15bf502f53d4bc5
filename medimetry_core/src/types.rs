//! Shared domain types for the formula catalog.
//!
//! - Clinical domains used to group formulas
//! - Patient attributes shared by several formulas (sex)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Domains
// ============================================================================

/// Clinical domain a formula belongs to
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Renal,
    Lytes,
    Cardiovasc,
    Cardiac,
    Neuro,
    Pulmonary,
    Anthropometric,
    Hepatic,
}

impl Domain {
    pub const ALL: [Domain; 8] = [
        Domain::Renal,
        Domain::Lytes,
        Domain::Cardiovasc,
        Domain::Cardiac,
        Domain::Neuro,
        Domain::Pulmonary,
        Domain::Anthropometric,
        Domain::Hepatic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Renal => "renal",
            Domain::Lytes => "lytes",
            Domain::Cardiovasc => "cardiovasc",
            Domain::Cardiac => "cardiac",
            Domain::Neuro => "neuro",
            Domain::Pulmonary => "pulmonary",
            Domain::Anthropometric => "anthropometric",
            Domain::Hepatic => "hepatic",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase();
        Domain::ALL
            .iter()
            .find(|d| d.as_str() == needle)
            .copied()
            .ok_or_else(|| Error::Parse(format!("Unknown domain '{}'", s.trim())))
    }
}

// ============================================================================
// Patient attributes
// ============================================================================

/// Biological sex as used by sex-dependent equations
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Options accepted for a `sex` choice parameter
    pub const OPTIONS: &'static [&'static str] = &["male", "female"];
}

impl FromStr for Sex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            other => Err(Error::Parse(format!("Unknown sex '{}'", other))),
        }
    }
}
