//! Input validation.
//!
//! Each formula declares its parameters as [`ParamSpec`]s. Validation checks
//! presence, shape (quantity/flag/choice), quantity kind and plausible range,
//! and normalises quantities to the parameter's canonical unit so formulas
//! only ever see one unit per parameter.

use crate::formula::{FormulaSpec, Inputs, Value};
use crate::units::{Measurement, Substance, Unit};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;

/// Shape and constraints of a formula parameter
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamKind {
    /// Numeric measurement, checked against the inclusive range `[min, max]`
    /// expressed in `unit`
    Quantity {
        unit: Unit,
        min: f64,
        max: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        substance: Option<Substance>,
    },
    /// Yes/no clinical finding
    Flag,
    /// One of a fixed set of lowercase options
    Choice { options: Vec<String> },
}

impl ParamKind {
    fn describe(&self) -> String {
        match self {
            ParamKind::Quantity { unit, .. } => format!("{} ({})", unit.kind(), unit),
            ParamKind::Flag => "flag".to_string(),
            ParamKind::Choice { .. } => "choice".to_string(),
        }
    }
}

/// Declaration of one formula parameter
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub optional: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl ParamSpec {
    pub fn quantity(name: &str, unit: Unit, min: f64, max: f64) -> Self {
        Self::new(
            name,
            ParamKind::Quantity {
                unit,
                min,
                max,
                substance: None,
            },
        )
    }

    pub fn flag(name: &str) -> Self {
        // Absent flags read as false
        Self::new(name, ParamKind::Flag).optional()
    }

    pub fn choice(name: &str, options: &[&str]) -> Self {
        Self::new(
            name,
            ParamKind::Choice {
                options: options.iter().map(|o| o.to_lowercase()).collect(),
            },
        )
    }

    fn new(name: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            optional: false,
            description: String::new(),
        }
    }

    /// Allow mass ↔ molar concentration input via the substance's molar mass
    pub fn substance(mut self, substance: Substance) -> Self {
        if let ParamKind::Quantity { substance: s, .. } = &mut self.kind {
            *s = Some(substance);
        }
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Canonical unit of a quantity parameter
    pub fn unit(&self) -> Option<Unit> {
        match &self.kind {
            ParamKind::Quantity { unit, .. } => Some(*unit),
            _ => None,
        }
    }
}

/// Validate a single value against its parameter declaration.
///
/// Returns the value normalised to the parameter's canonical unit (for
/// quantities) or lowercase option (for choices).
pub fn validate(value: &Value, param: &ParamSpec) -> Result<Value> {
    match (&param.kind, value) {
        (
            ParamKind::Quantity {
                unit,
                min,
                max,
                substance,
            },
            Value::Quantity(measurement),
        ) => {
            let converted = match substance {
                Some(substance) => measurement.convert_as(*substance, *unit),
                None => measurement.convert_to(*unit),
            }
            .map_err(|_| Error::UnitMismatch {
                parameter: param.name.clone(),
                expected: param.kind.describe(),
                found: format!("{} ({})", measurement.kind(), measurement.unit),
            })?;

            if !converted.value.is_finite() || converted.value < *min || converted.value > *max {
                return Err(Error::Range {
                    parameter: param.name.clone(),
                    value: converted.value,
                    unit: *unit,
                    min: *min,
                    max: *max,
                });
            }
            Ok(Value::Quantity(converted))
        }
        (ParamKind::Flag, Value::Flag(flag)) => Ok(Value::Flag(*flag)),
        (ParamKind::Choice { options }, Value::Choice(choice)) => {
            let normalised = choice.trim().to_lowercase();
            if options.contains(&normalised) {
                Ok(Value::Choice(normalised))
            } else {
                Err(Error::InvalidChoice {
                    parameter: param.name.clone(),
                    value: choice.clone(),
                    options: options.join(", "),
                })
            }
        }
        (kind, value) => Err(Error::UnitMismatch {
            parameter: param.name.clone(),
            expected: kind.describe(),
            found: value.describe(),
        }),
    }
}

/// Validate all declared parameters of a formula.
///
/// Extra keys in `inputs` are ignored.
pub fn validate_inputs(spec: &FormulaSpec, inputs: &Inputs) -> Result<Validated> {
    let mut values = HashMap::with_capacity(spec.params.len());

    for param in &spec.params {
        match inputs.get(&param.name) {
            Some(value) => {
                values.insert(param.name.clone(), validate(value, param)?);
            }
            None if param.optional => {}
            None => return Err(Error::MissingParameter(param.name.clone())),
        }
    }

    tracing::debug!(
        "Validated {} of {} inputs for {}/{}",
        values.len(),
        spec.params.len(),
        spec.domain,
        spec.name
    );

    Ok(Validated { values })
}

/// Inputs that passed validation, normalised to canonical units
#[derive(Clone, Debug, Default)]
pub struct Validated {
    values: HashMap<String, Value>,
}

impl Validated {
    /// Numeric value of a quantity parameter in its canonical unit
    pub fn quantity(&self, name: &str) -> Result<f64> {
        self.optional_quantity(name)?
            .ok_or_else(|| Error::MissingParameter(name.to_string()))
    }

    pub fn optional_quantity(&self, name: &str) -> Result<Option<f64>> {
        match self.values.get(name) {
            Some(Value::Quantity(Measurement { value, .. })) => Ok(Some(*value)),
            Some(other) => Err(self.shape_error(name, "quantity", other)),
            None => Ok(None),
        }
    }

    /// Flag value; absent optional flags are false
    pub fn flag(&self, name: &str) -> Result<bool> {
        match self.values.get(name) {
            Some(Value::Flag(flag)) => Ok(*flag),
            Some(other) => Err(self.shape_error(name, "flag", other)),
            None => Ok(false),
        }
    }

    /// Parse a choice parameter into its typed form
    pub fn choice<T>(&self, name: &str) -> Result<T>
    where
        T: std::str::FromStr<Err = Error>,
    {
        match self.values.get(name) {
            Some(Value::Choice(choice)) => choice.parse(),
            Some(other) => Err(self.shape_error(name, "choice", other)),
            None => Err(Error::MissingParameter(name.to_string())),
        }
    }

    fn shape_error(&self, name: &str, expected: &str, found: &Value) -> Error {
        Error::UnitMismatch {
            parameter: name.to_string(),
            expected: expected.to_string(),
            found: found.describe(),
        }
    }
}
