//! Error types for the medimetry_core library.

use crate::units::{QuantityKind, Unit};
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for medimetry_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required formula input was not supplied
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// An input was supplied with the wrong quantity kind (or shape)
    #[error("Unit mismatch for '{parameter}': expected {expected}, got {found}")]
    UnitMismatch {
        parameter: String,
        expected: String,
        found: String,
    },

    /// An input lies outside its physiologically plausible range
    #[error("Value {value} {unit} for '{parameter}' is outside [{min}, {max}]")]
    Range {
        parameter: String,
        value: f64,
        unit: Unit,
        min: f64,
        max: f64,
    },

    /// The formula is mathematically undefined for the given inputs
    #[error("Domain error in {formula}: {reason}")]
    Domain { formula: String, reason: String },

    /// Conversion requested between unrelated quantity kinds
    #[error("Cannot convert {from} ({from_kind:?}) to {to} ({to_kind:?})")]
    IncompatibleUnit {
        from: Unit,
        from_kind: QuantityKind,
        to: Unit,
        to_kind: QuantityKind,
    },

    /// A categorical input is not one of the declared options
    #[error("Invalid choice '{value}' for '{parameter}' (expected one of: {options})")]
    InvalidChoice {
        parameter: String,
        value: String,
        options: String,
    },

    /// A formula with the same name is already registered in the domain
    #[error("Formula '{domain}/{name}' is already registered")]
    DuplicateName { domain: String, name: String },

    /// No formula with that name exists in the domain
    #[error("Formula '{domain}/{name}' not found")]
    NotFound { domain: String, name: String },

    /// Unparseable unit, domain or input assignment
    #[error("Parse error: {0}")]
    Parse(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a [`Error::Domain`] raised by a formula
    pub fn domain(formula: &str, reason: impl Into<String>) -> Self {
        Error::Domain {
            formula: formula.to_string(),
            reason: reason.into(),
        }
    }
}
