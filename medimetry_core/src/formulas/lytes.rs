//! Electrolyte corrections and derived values.

use super::run;
use crate::bands::Band;
use crate::formula::{round_dp, Calculator, FormulaResult, FormulaSpec, Inputs};
use crate::types::Domain;
use crate::units::{Substance, Unit};
use crate::validator::{ParamSpec, Validated};
use crate::Result;

/// Albumin reference level for the Payne correction (g/dL)
const REFERENCE_ALBUMIN: f64 = 4.0;

fn sodium() -> ParamSpec {
    ParamSpec::quantity("sodium", Unit::MillimolesPerLiter, 90.0, 200.0).with_description("Serum sodium")
}

fn sodium_bands() -> Vec<Band> {
    vec![
        Band::new(0.0, 135.0, "hyponatremia"),
        Band::new(135.0, 145.0, "normal"),
        Band::new(145.0, f64::INFINITY, "hypernatremia"),
    ]
}

pub fn formulas() -> Vec<Calculator> {
    vec![
        Calculator::new(
            FormulaSpec::new(Domain::Lytes, "calcium_correction", "Albumin-corrected calcium (Payne)")
                .param(
                    ParamSpec::quantity("total_calcium", Unit::MilligramsPerDeciliter, 0.0, 20.0)
                        .substance(Substance::Calcium)
                        .with_description("Total serum calcium"),
                )
                .param(
                    ParamSpec::quantity("albumin", Unit::GramsPerDeciliter, 0.0, 10.0)
                        .with_description("Serum albumin"),
                )
                .output(Unit::MilligramsPerDeciliter)
                .with_bands(vec![
                    Band::new(0.0, 8.5, "hypocalcemia"),
                    Band::new(8.5, 10.5, "normal"),
                    Band::new(10.5, f64::INFINITY, "hypercalcemia"),
                ])
                .reference("Payne RB et al. Br Med J 1973;4:643-646"),
            eval_calcium_correction,
        ),
        Calculator::new(
            FormulaSpec::new(Domain::Lytes, "anion_gap", "Serum anion gap")
                .param(sodium())
                .param(
                    ParamSpec::quantity("chloride", Unit::MillimolesPerLiter, 50.0, 160.0)
                        .with_description("Serum chloride"),
                )
                .param(
                    ParamSpec::quantity("bicarbonate", Unit::MillimolesPerLiter, 0.0, 60.0)
                        .with_description("Serum bicarbonate"),
                )
                .output(Unit::MillimolesPerLiter)
                .with_bands(vec![
                    Band::new(f64::NEG_INFINITY, 8.0, "low"),
                    Band::new(8.0, 13.0, "normal"),
                    Band::new(13.0, f64::INFINITY, "elevated")
                        .with_note("Consider high anion gap metabolic acidosis"),
                ]),
            eval_anion_gap,
        ),
        Calculator::new(
            FormulaSpec::new(Domain::Lytes, "sodium_correction", "Glucose-corrected sodium (Katz)")
                .param(sodium())
                .param(
                    ParamSpec::quantity("glucose", Unit::MilligramsPerDeciliter, 0.0, 3000.0)
                        .substance(Substance::Glucose)
                        .with_description("Serum glucose"),
                )
                .output(Unit::MillimolesPerLiter)
                .with_bands(sodium_bands())
                .reference("Katz MA. N Engl J Med 1973;289:843-844"),
            eval_sodium_correction,
        ),
    ]
}

fn eval_calcium_correction(inputs: &Validated) -> Result<FormulaResult> {
    let calcium = inputs.quantity("total_calcium")?;
    let albumin = inputs.quantity("albumin")?;

    let corrected = calcium + 0.8 * (REFERENCE_ALBUMIN - albumin);
    Ok(FormulaResult::numeric(round_dp(corrected, 2)))
}

fn eval_anion_gap(inputs: &Validated) -> Result<FormulaResult> {
    let sodium = inputs.quantity("sodium")?;
    let chloride = inputs.quantity("chloride")?;
    let bicarbonate = inputs.quantity("bicarbonate")?;

    Ok(FormulaResult::numeric(round_dp(
        sodium - (chloride + bicarbonate),
        1,
    )))
}

fn eval_sodium_correction(inputs: &Validated) -> Result<FormulaResult> {
    let sodium = inputs.quantity("sodium")?;
    let glucose = inputs.quantity("glucose")?;

    // 1.6 mmol/L per 100 mg/dL of glucose above 100 mg/dL
    let corrected = sodium + 0.016 * (glucose - 100.0);
    Ok(FormulaResult::numeric(round_dp(corrected, 1)))
}

// ============================================================================
// Typed API
// ============================================================================

/// Total calcium corrected for albumin (mg/dL)
pub fn calcium_correction(total_calcium_mg_dl: f64, albumin_g_dl: f64) -> Result<FormulaResult> {
    let inputs = Inputs::new()
        .quantity("total_calcium", total_calcium_mg_dl, Unit::MilligramsPerDeciliter)
        .quantity("albumin", albumin_g_dl, Unit::GramsPerDeciliter);
    run(Domain::Lytes, "calcium_correction", &inputs)
}

/// Na − (Cl + HCO₃) in mmol/L
pub fn anion_gap(sodium: f64, chloride: f64, bicarbonate: f64) -> Result<FormulaResult> {
    let inputs = Inputs::new()
        .quantity("sodium", sodium, Unit::MillimolesPerLiter)
        .quantity("chloride", chloride, Unit::MillimolesPerLiter)
        .quantity("bicarbonate", bicarbonate, Unit::MillimolesPerLiter);
    run(Domain::Lytes, "anion_gap", &inputs)
}

/// Sodium corrected for hyperglycemia (mmol/L)
pub fn sodium_correction(sodium: f64, glucose_mg_dl: f64) -> Result<FormulaResult> {
    let inputs = Inputs::new()
        .quantity("sodium", sodium, Unit::MillimolesPerLiter)
        .quantity("glucose", glucose_mg_dl, Unit::MilligramsPerDeciliter);
    run(Domain::Lytes, "sodium_correction", &inputs)
}
