#![forbid(unsafe_code)]

//! Core library for the Medimetry clinical formula calculator.
//!
//! This crate provides:
//! - Unit-tagged measurements and conversions
//! - Input validation against declared plausible ranges
//! - The `Formula` capability and interpretation bands
//! - A registry holding the built-in formula catalog
//! - Standalone converters, catalog export, config and logging

pub mod types;
pub mod error;
pub mod units;
pub mod bands;
pub mod validator;
pub mod formula;
pub mod registry;
pub mod formulas;
pub mod converters;
pub mod docs;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::{Domain, Sex};
pub use units::{Measurement, QuantityKind, Substance, Unit};
pub use formula::{Formula, FormulaResult, FormulaSpec, Inputs, Value};
pub use registry::{build_default_registry, default_registry, Registry};
pub use config::Config;
