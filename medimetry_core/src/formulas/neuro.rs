//! Neurology: Glasgow Coma Scale.

use super::run;
use crate::bands::Band;
use crate::formula::{Calculator, FormulaResult, FormulaSpec, Inputs};
use crate::types::Domain;
use crate::units::Unit;
use crate::validator::{ParamSpec, Validated};
use crate::{Error, Result};

pub fn formulas() -> Vec<Calculator> {
    vec![Calculator::new(
        FormulaSpec::new(Domain::Neuro, "glasgow_coma_scale", "Glasgow Coma Scale")
            .param(
                ParamSpec::quantity("eye", Unit::Points, 1.0, 4.0)
                    .with_description("Eye opening (1-4)"),
            )
            .param(
                ParamSpec::quantity("verbal", Unit::Points, 1.0, 5.0)
                    .with_description("Verbal response (1-5)"),
            )
            .param(
                ParamSpec::quantity("motor", Unit::Points, 1.0, 6.0)
                    .with_description("Motor response (1-6)"),
            )
            .output(Unit::Points)
            .with_bands(vec![
                Band::new(3.0, 9.0, "severe").with_note("Consider airway protection"),
                Band::new(9.0, 13.0, "moderate"),
                Band::new(13.0, 15.0, "mild"),
                Band::new(15.0, 16.0, "normal/no impairment"),
            ])
            .reference("Teasdale G, Jennett B. Lancet 1974;2:81-84"),
        eval_glasgow_coma_scale,
    )]
}

fn component(inputs: &Validated, name: &str) -> Result<f64> {
    let score = inputs.quantity(name)?;
    if score.fract() != 0.0 {
        return Err(Error::domain(
            "glasgow_coma_scale",
            format!("{} score must be a whole number, got {}", name, score),
        ));
    }
    Ok(score)
}

fn eval_glasgow_coma_scale(inputs: &Validated) -> Result<FormulaResult> {
    let total = component(inputs, "eye")? + component(inputs, "verbal")? + component(inputs, "motor")?;
    Ok(FormulaResult::numeric(total))
}

// ============================================================================
// Typed API
// ============================================================================

/// Best eye response
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EyeResponse {
    None = 1,
    ToPain = 2,
    ToSound = 3,
    Spontaneous = 4,
}

/// Best verbal response
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerbalResponse {
    None = 1,
    Incomprehensible = 2,
    InappropriateWords = 3,
    Confused = 4,
    Oriented = 5,
}

/// Best motor response
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotorResponse {
    None = 1,
    Extension = 2,
    AbnormalFlexion = 3,
    Withdrawal = 4,
    Localizes = 5,
    ObeysCommands = 6,
}

pub fn glasgow_coma_scale(
    eye: EyeResponse,
    verbal: VerbalResponse,
    motor: MotorResponse,
) -> Result<FormulaResult> {
    gcs_from_scores(eye as u8, verbal as u8, motor as u8)
}

/// GCS from raw component scores
pub fn gcs_from_scores(eye: u8, verbal: u8, motor: u8) -> Result<FormulaResult> {
    let inputs = Inputs::new()
        .quantity("eye", f64::from(eye), Unit::Points)
        .quantity("verbal", f64::from(verbal), Unit::Points)
        .quantity("motor", f64::from(motor), Unit::Points);
    run(Domain::Neuro, "glasgow_coma_scale", &inputs)
}
