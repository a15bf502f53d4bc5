//! Formula declarations, inputs and results.
//!
//! A formula is a [`FormulaSpec`] (what it needs and what it produces) plus
//! an evaluation step. [`Formula::compute`] runs validation, evaluation and
//! band classification in that order.

use crate::bands::{self, Band, OUT_OF_RANGE};
use crate::types::Domain;
use crate::units::{parse_quantity, Measurement, Unit};
use crate::validator::{validate_inputs, ParamKind, ParamSpec, Validated};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;

// ============================================================================
// Inputs
// ============================================================================

/// A single formula input
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Quantity(Measurement),
    Flag(bool),
    Choice(String),
}

impl Value {
    pub fn quantity(value: f64, unit: Unit) -> Self {
        Value::Quantity(Measurement::new(value, unit))
    }

    pub fn choice(choice: impl Into<String>) -> Self {
        Value::Choice(choice.into())
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Value::Quantity(m) => format!("{} ({})", m.kind(), m.unit),
            Value::Flag(_) => "flag".to_string(),
            Value::Choice(_) => "choice".to_string(),
        }
    }
}

/// Named formula inputs
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inputs {
    values: HashMap<String, Value>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quantity(self, name: &str, value: f64, unit: Unit) -> Self {
        self.with(name, Value::quantity(value, unit))
    }

    pub fn measurement(self, name: &str, measurement: Measurement) -> Self {
        self.with(name, Value::Quantity(measurement))
    }

    pub fn flag(self, name: &str, flag: bool) -> Self {
        self.with(name, Value::Flag(flag))
    }

    pub fn choice(self, name: &str, choice: &str) -> Self {
        self.with(name, Value::choice(choice))
    }

    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build inputs from `name=value` assignments, reading each value
    /// according to the parameter's declared shape:
    ///
    /// - quantities: a number with optional unit (`70kg`, `1.1 mg/dL`); a bare
    ///   number is taken in the canonical unit
    /// - flags: `true/false`, `yes/no`, `1/0`
    /// - choices: the option text
    ///
    /// Unknown and repeated names are rejected.
    pub fn parse_assignments<S: AsRef<str>>(spec: &FormulaSpec, assignments: &[S]) -> Result<Self> {
        let mut inputs = Inputs::new();

        for assignment in assignments {
            let assignment = assignment.as_ref();
            let (name, raw) = assignment.split_once('=').ok_or_else(|| {
                Error::Parse(format!("Expected name=value, got '{}'", assignment))
            })?;
            let name = name.trim();
            if inputs.get(name).is_some() {
                return Err(Error::Parse(format!("Parameter '{}' given more than once", name)));
            }
            let param = spec.param_named(name).ok_or_else(|| {
                Error::Parse(format!(
                    "Unknown parameter '{}' for {}/{} (expected one of: {})",
                    name,
                    spec.domain,
                    spec.name,
                    spec.param_names().join(", ")
                ))
            })?;

            let value = match &param.kind {
                ParamKind::Quantity { unit, .. } => {
                    let (value, parsed_unit) = parse_quantity(raw)?;
                    Value::quantity(value, parsed_unit.unwrap_or(*unit))
                }
                ParamKind::Flag => Value::Flag(parse_flag(raw)?),
                ParamKind::Choice { .. } => Value::choice(raw.trim()),
            };
            inputs.insert(name, value);
        }

        Ok(inputs)
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        other => Err(Error::Parse(format!("Expected true/false, got '{}'", other))),
    }
}

// ============================================================================
// Formula declaration
// ============================================================================

/// Static declaration of a formula
#[derive(Clone, Debug, Serialize)]
pub struct FormulaSpec {
    pub domain: Domain,
    pub name: String,
    pub title: String,
    pub params: Vec<ParamSpec>,
    pub output_unit: Option<Unit>,
    pub bands: Vec<Band>,
    pub reference: Option<String>,
}

impl FormulaSpec {
    pub fn new(domain: Domain, name: &str, title: &str) -> Self {
        Self {
            domain,
            name: name.to_string(),
            title: title.to_string(),
            params: Vec::new(),
            output_unit: None,
            bands: Vec::new(),
            reference: None,
        }
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn output(mut self, unit: Unit) -> Self {
        self.output_unit = Some(unit);
        self
    }

    pub fn band(mut self, band: Band) -> Self {
        self.bands.push(band);
        self
    }

    pub fn with_bands(mut self, bands: impl IntoIterator<Item = Band>) -> Self {
        self.bands.extend(bands);
        self
    }

    pub fn reference(mut self, reference: &str) -> Self {
        self.reference = Some(reference.to_string());
        self
    }

    pub fn param_named(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }
}

// ============================================================================
// Results
// ============================================================================

/// Output of a formula evaluation
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormulaResult {
    pub value: Option<f64>,
    pub unit: Option<Unit>,
    pub category: Option<String>,
    pub interpretation: Option<String>,
}

impl FormulaResult {
    pub fn numeric(value: f64) -> Self {
        Self {
            value: Some(value),
            unit: None,
            category: None,
            interpretation: None,
        }
    }

    pub fn categorical(category: impl Into<String>) -> Self {
        Self {
            value: None,
            unit: None,
            category: Some(category.into()),
            interpretation: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_interpretation(mut self, interpretation: impl Into<String>) -> Self {
        self.interpretation = Some(interpretation.into());
        self
    }
}

// ============================================================================
// Formula capability
// ============================================================================

/// A named pure function from validated inputs to a result
pub trait Formula: Send + Sync {
    fn spec(&self) -> &FormulaSpec;

    /// Apply the equation to inputs already checked against [`Formula::spec`]
    fn evaluate(&self, inputs: &Validated) -> Result<FormulaResult>;

    /// Validate, evaluate and classify
    fn compute(&self, inputs: &Inputs) -> Result<FormulaResult> {
        let spec = self.spec();
        let validated = validate_inputs(spec, inputs)?;
        let mut result = self.evaluate(&validated)?;

        if result.value.is_some() && result.unit.is_none() {
            result.unit = spec.output_unit;
        }

        if let (Some(value), None) = (result.value, &result.category) {
            if !spec.bands.is_empty() {
                match bands::classify(&spec.bands, value) {
                    Some(band) => {
                        result.category = Some(band.label.clone());
                        if result.interpretation.is_none() {
                            result.interpretation = band.note.clone();
                        }
                    }
                    None => result.category = Some(OUT_OF_RANGE.to_string()),
                }
            }
        }

        if result.value.is_none() && result.category.is_none() {
            return Err(Error::domain(
                &spec.name,
                "formula produced neither a value nor a category",
            ));
        }

        tracing::debug!(
            "Computed {}/{}: value={:?} category={:?}",
            spec.domain,
            spec.name,
            result.value,
            result.category
        );

        Ok(result)
    }
}

/// Evaluation step of a catalog formula
pub type EvalFn = fn(&Validated) -> Result<FormulaResult>;

/// Formula backed by a plain evaluation function
pub struct Calculator {
    spec: FormulaSpec,
    eval: EvalFn,
}

impl Calculator {
    pub fn new(spec: FormulaSpec, eval: EvalFn) -> Self {
        Self { spec, eval }
    }
}

impl Formula for Calculator {
    fn spec(&self) -> &FormulaSpec {
        &self.spec
    }

    fn evaluate(&self, inputs: &Validated) -> Result<FormulaResult> {
        (self.eval)(inputs)
    }
}

/// Round half away from zero to `decimals` places
pub fn round_dp(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doubling_spec() -> FormulaSpec {
        FormulaSpec::new(Domain::Lytes, "double", "Doubling")
            .param(ParamSpec::quantity("x", Unit::MillimolesPerLiter, 0.0, 100.0))
            .output(Unit::MillimolesPerLiter)
            .band(Band::new(0.0, 10.0, "low"))
            .band(Band::new(10.0, 50.0, "high").with_note("check again"))
    }

    fn double(inputs: &Validated) -> Result<FormulaResult> {
        Ok(FormulaResult::numeric(inputs.quantity("x")? * 2.0))
    }

    #[test]
    fn test_compute_fills_unit_and_band() {
        let formula = Calculator::new(doubling_spec(), double);
        let result = formula
            .compute(&Inputs::new().quantity("x", 3.0, Unit::MillimolesPerLiter))
            .unwrap();
        assert_eq!(result.value, Some(6.0));
        assert_eq!(result.unit, Some(Unit::MillimolesPerLiter));
        assert_eq!(result.category.as_deref(), Some("low"));
        assert!(result.interpretation.is_none());

        let result = formula
            .compute(&Inputs::new().quantity("x", 10.0, Unit::MillimolesPerLiter))
            .unwrap();
        assert_eq!(result.category.as_deref(), Some("high"));
        assert_eq!(result.interpretation.as_deref(), Some("check again"));
    }

    #[test]
    fn test_value_outside_bands_is_out_of_range() {
        let formula = Calculator::new(doubling_spec(), double);
        let result = formula
            .compute(&Inputs::new().quantity("x", 40.0, Unit::MillimolesPerLiter))
            .unwrap();
        assert_eq!(result.value, Some(80.0));
        assert_eq!(result.category.as_deref(), Some(OUT_OF_RANGE));
    }

    #[test]
    fn test_empty_result_rejected() {
        fn nothing(_: &Validated) -> Result<FormulaResult> {
            Ok(FormulaResult {
                value: None,
                unit: None,
                category: None,
                interpretation: None,
            })
        }

        let formula = Calculator::new(doubling_spec(), nothing);
        let result = formula.compute(&Inputs::new().quantity("x", 1.0, Unit::MillimolesPerLiter));
        assert!(matches!(result, Err(Error::Domain { .. })));
    }

    #[test]
    fn test_categorical_result_accepted() {
        fn label(_: &Validated) -> Result<FormulaResult> {
            Ok(FormulaResult::categorical("C"))
        }

        let formula = Calculator::new(doubling_spec(), label);
        let result = formula
            .compute(&Inputs::new().quantity("x", 1.0, Unit::MillimolesPerLiter))
            .unwrap();
        assert_eq!(result.value, None);
        assert_eq!(result.category.as_deref(), Some("C"));
    }

    #[test]
    fn test_compute_is_deterministic() {
        let formula = Calculator::new(doubling_spec(), double);
        let inputs = Inputs::new().quantity("x", 1.2345, Unit::MillimolesPerLiter);
        let a = formula.compute(&inputs).unwrap();
        let b = formula.compute(&inputs).unwrap();
        assert_eq!(a.value.map(f64::to_bits), b.value.map(f64::to_bits));
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_assignments() {
        let spec = FormulaSpec::new(Domain::Renal, "t", "T")
            .param(ParamSpec::quantity("age", Unit::Years, 0.0, 130.0))
            .param(ParamSpec::quantity("height", Unit::Meters, 0.3, 3.0))
            .param(ParamSpec::flag("smoker"))
            .param(ParamSpec::choice("sex", &["male", "female"]));

        let inputs =
            Inputs::parse_assignments(&spec, &["age=60", "height=175cm", "smoker=yes", "sex=Female"])
                .unwrap();
        assert_eq!(inputs.get("age"), Some(&Value::quantity(60.0, Unit::Years)));
        assert_eq!(
            inputs.get("height"),
            Some(&Value::quantity(175.0, Unit::Centimeters))
        );
        assert_eq!(inputs.get("smoker"), Some(&Value::Flag(true)));
        assert_eq!(inputs.get("sex"), Some(&Value::choice("Female")));
    }

    #[test]
    fn test_parse_assignments_rejects_unknown_and_malformed() {
        let spec = FormulaSpec::new(Domain::Renal, "t", "T")
            .param(ParamSpec::quantity("age", Unit::Years, 0.0, 130.0));
        assert!(Inputs::parse_assignments(&spec, &["weight=70"]).is_err());
        assert!(Inputs::parse_assignments(&spec, &["age"]).is_err());
        assert!(Inputs::parse_assignments(&spec, &["age=old"]).is_err());
    }

    #[test]
    fn test_parse_assignments_rejects_repeated_name() {
        let spec = FormulaSpec::new(Domain::Renal, "t", "T")
            .param(ParamSpec::quantity("age", Unit::Years, 0.0, 130.0));
        assert!(matches!(
            Inputs::parse_assignments(&spec, &["age=60", "age=-5"]),
            Err(Error::Parse(msg)) if msg.contains("age")
        ));
    }

    #[test]
    fn test_round_dp() {
        assert_eq!(round_dp(77.7777, 2), 77.78);
        assert_eq!(round_dp(447.2136, 1), 447.2);
        assert_eq!(round_dp(9.8666, 2), 9.87);
    }
}
