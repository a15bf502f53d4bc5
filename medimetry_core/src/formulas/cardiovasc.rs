//! Cardiovascular: blood pressure derivatives and stroke risk in atrial
//! fibrillation.

use super::{adult_age, count_points, run, sex, sex_choice};
use crate::bands::Band;
use crate::formula::{round_dp, Calculator, FormulaResult, FormulaSpec, Inputs};
use crate::types::{Domain, Sex};
use crate::units::Unit;
use crate::validator::{ParamSpec, Validated};
use crate::{Error, Result};

pub fn formulas() -> Vec<Calculator> {
    vec![
        Calculator::new(
            FormulaSpec::new(Domain::Cardiovasc, "mean_arterial_pressure", "Mean arterial pressure")
                .param(
                    ParamSpec::quantity("systolic", Unit::MillimetersOfMercury, 30.0, 300.0)
                        .with_description("Systolic blood pressure"),
                )
                .param(
                    ParamSpec::quantity("diastolic", Unit::MillimetersOfMercury, 10.0, 250.0)
                        .with_description("Diastolic blood pressure"),
                )
                .output(Unit::MillimetersOfMercury)
                .with_bands(vec![
                    Band::new(0.0, 65.0, "low").with_note("Risk of organ hypoperfusion"),
                    Band::new(65.0, 100.0, "normal"),
                    Band::new(100.0, f64::INFINITY, "elevated"),
                ]),
            eval_mean_arterial_pressure,
        ),
        Calculator::new(
            FormulaSpec::new(Domain::Cardiovasc, "cha2ds2_vasc", "CHA2DS2-VASc stroke risk score")
                .param(adult_age())
                .param(sex())
                .param(ParamSpec::flag("chf").with_description("Congestive heart failure / LV dysfunction"))
                .param(ParamSpec::flag("hypertension"))
                .param(ParamSpec::flag("stroke_history").with_description("Prior stroke, TIA or thromboembolism"))
                .param(ParamSpec::flag("diabetes"))
                .param(ParamSpec::flag("vascular_disease").with_description("Prior MI, PAD or aortic plaque"))
                .output(Unit::Points)
                .with_bands(vec![
                    Band::new(0.0, 1.0, "low").with_note("No antithrombotic therapy"),
                    Band::new(1.0, 2.0, "low-moderate").with_note("Consider oral anticoagulation"),
                    Band::new(2.0, 10.0, "moderate-high").with_note("Oral anticoagulation recommended"),
                ])
                .reference("Lip GY et al. Chest 2010;137:263-272"),
            eval_cha2ds2_vasc,
        ),
    ]
}

fn eval_mean_arterial_pressure(inputs: &Validated) -> Result<FormulaResult> {
    let systolic = inputs.quantity("systolic")?;
    let diastolic = inputs.quantity("diastolic")?;

    if diastolic >= systolic {
        return Err(Error::domain(
            "mean_arterial_pressure",
            "diastolic pressure must be lower than systolic pressure",
        ));
    }

    Ok(FormulaResult::numeric(round_dp(
        (2.0 * diastolic + systolic) / 3.0,
        2,
    )))
}

fn eval_cha2ds2_vasc(inputs: &Validated) -> Result<FormulaResult> {
    let age = inputs.quantity("age")?;
    let sex: Sex = inputs.choice("sex")?;

    let age_points = if age >= 75.0 {
        2
    } else if age >= 65.0 {
        1
    } else {
        0
    };

    let score = age_points
        + count_points(&[
            (sex == Sex::Female, 1),
            (inputs.flag("chf")?, 1),
            (inputs.flag("hypertension")?, 1),
            (inputs.flag("stroke_history")?, 2),
            (inputs.flag("diabetes")?, 1),
            (inputs.flag("vascular_disease")?, 1),
        ]);

    Ok(FormulaResult::numeric(f64::from(score)))
}

// ============================================================================
// Typed API
// ============================================================================

/// Mean arterial pressure (mmHg) from systolic and diastolic pressure
pub fn mean_arterial_pressure(systolic_mm_hg: f64, diastolic_mm_hg: f64) -> Result<FormulaResult> {
    let inputs = Inputs::new()
        .quantity("systolic", systolic_mm_hg, Unit::MillimetersOfMercury)
        .quantity("diastolic", diastolic_mm_hg, Unit::MillimetersOfMercury);
    run(Domain::Cardiovasc, "mean_arterial_pressure", &inputs)
}

/// Risk factors for [`cha2ds2_vasc`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StrokeRiskFactors {
    pub chf: bool,
    pub hypertension: bool,
    pub stroke_history: bool,
    pub diabetes: bool,
    pub vascular_disease: bool,
}

/// CHA2DS2-VASc score (0-9)
pub fn cha2ds2_vasc(age_years: f64, sex: Sex, factors: StrokeRiskFactors) -> Result<FormulaResult> {
    let inputs = Inputs::new()
        .quantity("age", age_years, Unit::Years)
        .choice("sex", sex_choice(sex))
        .flag("chf", factors.chf)
        .flag("hypertension", factors.hypertension)
        .flag("stroke_history", factors.stroke_history)
        .flag("diabetes", factors.diabetes)
        .flag("vascular_disease", factors.vascular_disease);
    run(Domain::Cardiovasc, "cha2ds2_vasc", &inputs)
}
