//! Pulmonary embolism: pretest probability and rule-out criteria.

use super::{adult_age, count_points, run};
use crate::bands::Band;
use crate::formula::{Calculator, FormulaResult, FormulaSpec, Inputs};
use crate::types::Domain;
use crate::units::Unit;
use crate::validator::{ParamSpec, Validated};
use crate::Result;

pub const PERC_NEGATIVE: &str = "PERC negative";
pub const PERC_POSITIVE: &str = "PERC positive";

fn heart_rate() -> ParamSpec {
    ParamSpec::quantity("heart_rate", Unit::BeatsPerMinute, 1.0, 300.0).with_description("Heart rate")
}

pub fn formulas() -> Vec<Calculator> {
    vec![
        Calculator::new(
            FormulaSpec::new(Domain::Pulmonary, "geneva_revised", "Revised Geneva score")
                .param(adult_age())
                .param(heart_rate().optional())
                .param(ParamSpec::flag("previous_pe_dvt").with_description("Previous DVT or PE"))
                .param(ParamSpec::flag("recent_surgery").with_description("Surgery or fracture within 1 month"))
                .param(ParamSpec::flag("hemoptysis"))
                .param(ParamSpec::flag("active_cancer").with_description("Active malignancy or cured < 1 year"))
                .param(ParamSpec::flag("unilateral_leg_pain"))
                .param(
                    ParamSpec::flag("leg_palpation_pain_and_edema")
                        .with_description("Pain on deep venous palpation and unilateral edema"),
                )
                .output(Unit::Points)
                .with_bands(vec![
                    Band::new(0.0, 4.0, "low").with_note("PE prevalence about 8%"),
                    Band::new(4.0, 11.0, "intermediate").with_note("PE prevalence about 28%"),
                    Band::new(11.0, f64::INFINITY, "high").with_note("PE prevalence about 74%"),
                ])
                .reference("Le Gal G et al. Ann Intern Med 2006;144:165-171"),
            eval_geneva_revised,
        ),
        Calculator::new(
            FormulaSpec::new(Domain::Pulmonary, "geneva_simplified", "Simplified revised Geneva score")
                .param(adult_age())
                .param(ParamSpec::flag("previous_pe_dvt").with_description("Previous DVT or PE"))
                .param(ParamSpec::flag("heart_rate_over_100").with_description("Heart rate > 100 bpm"))
                .param(ParamSpec::flag("recent_surgery").with_description("Surgery or fracture within 1 month"))
                .param(ParamSpec::flag("hemoptysis"))
                .param(ParamSpec::flag("active_cancer"))
                .param(ParamSpec::flag("unilateral_leg_pain"))
                .param(
                    ParamSpec::flag("unilateral_leg_edema")
                        .with_description("Unilateral edema and superficial venous dilatation"),
                )
                .param(ParamSpec::flag("pain_on_palpation").with_description("Pain on deep venous palpation"))
                .output(Unit::Points)
                .with_bands(vec![
                    Band::new(0.0, 4.0, "low").with_note("PE prevalence about 8%"),
                    Band::new(4.0, 9.0, "intermediate").with_note("PE prevalence about 28%"),
                    Band::new(9.0, f64::INFINITY, "high").with_note("PE prevalence about 74%"),
                ])
                .reference("Klok FA et al. Arch Intern Med 2008;168:2131-2136"),
            eval_geneva_simplified,
        ),
        Calculator::new(
            FormulaSpec::new(Domain::Pulmonary, "perc", "PERC rule for pulmonary embolism")
                .param(adult_age())
                .param(heart_rate())
                .param(
                    ParamSpec::quantity("oxygen_saturation", Unit::Percent, 1.0, 100.0)
                        .with_description("SpO2 on room air"),
                )
                .param(ParamSpec::flag("unilateral_leg_swelling"))
                .param(ParamSpec::flag("hemoptysis"))
                .param(ParamSpec::flag("recent_surgery_trauma").with_description("Surgery or trauma within 4 weeks"))
                .param(ParamSpec::flag("prior_pe_dvt"))
                .param(ParamSpec::flag("hormone_use").with_description("Oral contraceptives or hormone therapy"))
                .output(Unit::Points)
                .reference("Kline JA et al. J Thromb Haemost 2004;2:1247-1255"),
            eval_perc,
        ),
    ]
}

fn eval_geneva_revised(inputs: &Validated) -> Result<FormulaResult> {
    let age = inputs.quantity("age")?;
    let heart_rate_points = match inputs.optional_quantity("heart_rate")? {
        Some(hr) if hr >= 95.0 => 5,
        Some(hr) if hr >= 75.0 => 3,
        _ => 0,
    };

    let score = heart_rate_points
        + count_points(&[
            (age > 65.0, 1),
            (inputs.flag("previous_pe_dvt")?, 3),
            (inputs.flag("recent_surgery")?, 2),
            (inputs.flag("hemoptysis")?, 2),
            (inputs.flag("active_cancer")?, 2),
            (inputs.flag("unilateral_leg_pain")?, 3),
            (inputs.flag("leg_palpation_pain_and_edema")?, 4),
        ]);

    Ok(FormulaResult::numeric(f64::from(score)))
}

fn eval_geneva_simplified(inputs: &Validated) -> Result<FormulaResult> {
    let age = inputs.quantity("age")?;
    let age_points = if age >= 80.0 {
        2
    } else if age >= 60.0 {
        1
    } else {
        0
    };

    let score = age_points
        + count_points(&[
            (inputs.flag("previous_pe_dvt")?, 1),
            (inputs.flag("heart_rate_over_100")?, 1),
            (inputs.flag("recent_surgery")?, 1),
            (inputs.flag("hemoptysis")?, 1),
            (inputs.flag("active_cancer")?, 1),
            (inputs.flag("unilateral_leg_pain")?, 1),
            (inputs.flag("unilateral_leg_edema")?, 1),
            (inputs.flag("pain_on_palpation")?, 1),
        ]);

    Ok(FormulaResult::numeric(f64::from(score)))
}

fn eval_perc(inputs: &Validated) -> Result<FormulaResult> {
    let criteria = count_points(&[
        (inputs.quantity("age")? >= 50.0, 1),
        (inputs.quantity("heart_rate")? >= 100.0, 1),
        (inputs.quantity("oxygen_saturation")? < 95.0, 1),
        (inputs.flag("unilateral_leg_swelling")?, 1),
        (inputs.flag("hemoptysis")?, 1),
        (inputs.flag("recent_surgery_trauma")?, 1),
        (inputs.flag("prior_pe_dvt")?, 1),
        (inputs.flag("hormone_use")?, 1),
    ]);

    let result = FormulaResult::numeric(f64::from(criteria));
    Ok(if criteria == 0 {
        result
            .with_category(PERC_NEGATIVE)
            .with_interpretation("PE ruled out in low pretest probability; no D-dimer needed")
    } else {
        result
            .with_category(PERC_POSITIVE)
            .with_interpretation("Cannot rule out PE by PERC; consider D-dimer or imaging")
    })
}

// ============================================================================
// Typed API
// ============================================================================

/// Clinical findings for [`geneva_revised`]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GenevaFindings {
    pub heart_rate_bpm: Option<f64>,
    pub previous_pe_dvt: bool,
    pub recent_surgery: bool,
    pub hemoptysis: bool,
    pub active_cancer: bool,
    pub unilateral_leg_pain: bool,
    pub leg_palpation_pain_and_edema: bool,
}

pub fn geneva_revised(age_years: f64, findings: GenevaFindings) -> Result<FormulaResult> {
    let mut inputs = Inputs::new()
        .quantity("age", age_years, Unit::Years)
        .flag("previous_pe_dvt", findings.previous_pe_dvt)
        .flag("recent_surgery", findings.recent_surgery)
        .flag("hemoptysis", findings.hemoptysis)
        .flag("active_cancer", findings.active_cancer)
        .flag("unilateral_leg_pain", findings.unilateral_leg_pain)
        .flag("leg_palpation_pain_and_edema", findings.leg_palpation_pain_and_edema);
    if let Some(hr) = findings.heart_rate_bpm {
        inputs = inputs.quantity("heart_rate", hr, Unit::BeatsPerMinute);
    }
    run(Domain::Pulmonary, "geneva_revised", &inputs)
}

/// One-point findings for [`geneva_simplified`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimplifiedGenevaFindings {
    pub previous_pe_dvt: bool,
    pub heart_rate_over_100: bool,
    pub recent_surgery: bool,
    pub hemoptysis: bool,
    pub active_cancer: bool,
    pub unilateral_leg_pain: bool,
    pub unilateral_leg_edema: bool,
    pub pain_on_palpation: bool,
}

pub fn geneva_simplified(age_years: f64, findings: SimplifiedGenevaFindings) -> Result<FormulaResult> {
    let inputs = Inputs::new()
        .quantity("age", age_years, Unit::Years)
        .flag("previous_pe_dvt", findings.previous_pe_dvt)
        .flag("heart_rate_over_100", findings.heart_rate_over_100)
        .flag("recent_surgery", findings.recent_surgery)
        .flag("hemoptysis", findings.hemoptysis)
        .flag("active_cancer", findings.active_cancer)
        .flag("unilateral_leg_pain", findings.unilateral_leg_pain)
        .flag("unilateral_leg_edema", findings.unilateral_leg_edema)
        .flag("pain_on_palpation", findings.pain_on_palpation);
    run(Domain::Pulmonary, "geneva_simplified", &inputs)
}

/// History items for [`perc`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PercHistory {
    pub unilateral_leg_swelling: bool,
    pub hemoptysis: bool,
    pub recent_surgery_trauma: bool,
    pub prior_pe_dvt: bool,
    pub hormone_use: bool,
}

pub fn perc(
    age_years: f64,
    heart_rate_bpm: f64,
    oxygen_saturation_pct: f64,
    history: PercHistory,
) -> Result<FormulaResult> {
    let inputs = Inputs::new()
        .quantity("age", age_years, Unit::Years)
        .quantity("heart_rate", heart_rate_bpm, Unit::BeatsPerMinute)
        .quantity("oxygen_saturation", oxygen_saturation_pct, Unit::Percent)
        .flag("unilateral_leg_swelling", history.unilateral_leg_swelling)
        .flag("hemoptysis", history.hemoptysis)
        .flag("recent_surgery_trauma", history.recent_surgery_trauma)
        .flag("prior_pe_dvt", history.prior_pe_dvt)
        .flag("hormone_use", history.hormone_use);
    run(Domain::Pulmonary, "perc", &inputs)
}
