//! Renal function: creatinine clearance and estimated GFR.

use super::{adult_age, run, sex, sex_choice};
use crate::bands::Band;
use crate::formula::{round_dp, Calculator, FormulaResult, FormulaSpec, Inputs};
use crate::types::{Domain, Sex};
use crate::units::{Substance, Unit};
use crate::validator::{ParamSpec, Validated};
use crate::{Error, Result};

fn creatinine() -> ParamSpec {
    ParamSpec::quantity("creatinine", Unit::MilligramsPerDeciliter, 0.0, 30.0)
        .substance(Substance::Creatinine)
        .with_description("Serum creatinine")
}

fn african_american() -> ParamSpec {
    ParamSpec::flag("african_american").with_description("Race coefficient applies")
}

/// KDIGO GFR categories
fn gfr_bands() -> Vec<Band> {
    vec![
        Band::new(0.0, 15.0, "G5").with_note("Stage 5 CKD: kidney failure"),
        Band::new(15.0, 30.0, "G4").with_note("Stage 4 CKD: severely decreased GFR"),
        Band::new(30.0, 45.0, "G3b").with_note("Stage 3 CKD: moderately to severely decreased GFR"),
        Band::new(45.0, 60.0, "G3a").with_note("Stage 3 CKD: mildly to moderately decreased GFR"),
        Band::new(60.0, 90.0, "G2").with_note("Mildly decreased GFR"),
        Band::new(90.0, f64::INFINITY, "G1").with_note("Normal or high GFR"),
    ]
}

pub fn formulas() -> Vec<Calculator> {
    vec![
        Calculator::new(
            FormulaSpec::new(Domain::Renal, "cockcroft_gault", "Cockcroft-Gault creatinine clearance")
                .param(adult_age())
                .param(super::weight())
                .param(creatinine())
                .param(sex())
                .output(Unit::MillilitersPerMinute)
                .with_bands(vec![
                    Band::new(0.0, 15.0, "kidney failure"),
                    Band::new(15.0, 30.0, "severely reduced"),
                    Band::new(30.0, 60.0, "moderately reduced"),
                    Band::new(60.0, 90.0, "mildly reduced"),
                    Band::new(90.0, f64::INFINITY, "normal"),
                ])
                .reference("Cockcroft DW, Gault MH. Nephron 1976;16:31-41"),
            eval_cockcroft_gault,
        ),
        Calculator::new(
            FormulaSpec::new(Domain::Renal, "mdrd", "MDRD study equation (IDMS-traceable)")
                .param(adult_age())
                .param(creatinine())
                .param(sex())
                .param(african_american())
                .output(Unit::MillilitersPerMinutePer173SquareMeters)
                .with_bands(gfr_bands())
                .reference("Levey AS et al. Ann Intern Med 2006;145:247-254"),
            eval_mdrd,
        ),
        Calculator::new(
            FormulaSpec::new(Domain::Renal, "ckd_epi", "CKD-EPI creatinine equation (2009)")
                .param(adult_age())
                .param(creatinine())
                .param(sex())
                .param(african_american())
                .output(Unit::MillilitersPerMinutePer173SquareMeters)
                .with_bands(gfr_bands())
                .reference("Levey AS et al. Ann Intern Med 2009;150:604-612"),
            eval_ckd_epi_2009,
        ),
        Calculator::new(
            FormulaSpec::new(Domain::Renal, "ckd_epi_2021", "CKD-EPI creatinine equation (2021, race-free)")
                .param(adult_age())
                .param(creatinine())
                .param(sex())
                .output(Unit::MillilitersPerMinutePer173SquareMeters)
                .with_bands(gfr_bands())
                .reference("Inker LA et al. N Engl J Med 2021;385:1737-1749"),
            eval_ckd_epi_2021,
        ),
    ]
}

fn positive_creatinine(formula: &str, inputs: &Validated) -> Result<f64> {
    let creatinine = inputs.quantity("creatinine")?;
    if creatinine <= 0.0 {
        return Err(Error::domain(formula, "serum creatinine must be greater than zero"));
    }
    Ok(creatinine)
}

fn eval_cockcroft_gault(inputs: &Validated) -> Result<FormulaResult> {
    let age = inputs.quantity("age")?;
    let weight = inputs.quantity("weight")?;
    let creatinine = positive_creatinine("cockcroft_gault", inputs)?;
    let sex: Sex = inputs.choice("sex")?;

    let mut clearance = ((140.0 - age) * weight) / (72.0 * creatinine);
    if sex == Sex::Female {
        clearance *= 0.85;
    }

    Ok(FormulaResult::numeric(round_dp(clearance, 2)))
}

fn eval_mdrd(inputs: &Validated) -> Result<FormulaResult> {
    let age = inputs.quantity("age")?;
    let creatinine = positive_creatinine("mdrd", inputs)?;
    let sex: Sex = inputs.choice("sex")?;

    let mut egfr = 175.0 * creatinine.powf(-1.154) * age.powf(-0.203);
    if sex == Sex::Female {
        egfr *= 0.742;
    }
    if inputs.flag("african_american")? {
        egfr *= 1.212;
    }

    Ok(FormulaResult::numeric(round_dp(egfr, 1)))
}

/// Shared CKD-EPI shape: `k * min(Scr/κ, 1)^α * max(Scr/κ, 1)^β * base^age`
struct CkdEpiCoefficients {
    scale: f64,
    kappa: f64,
    alpha: f64,
    beta: f64,
    age_base: f64,
    female_factor: f64,
}

fn ckd_epi_core(creatinine: f64, age: f64, sex: Sex, c: &CkdEpiCoefficients) -> f64 {
    let ratio = creatinine / c.kappa;
    let mut egfr =
        c.scale * ratio.min(1.0).powf(c.alpha) * ratio.max(1.0).powf(c.beta) * c.age_base.powf(age);
    if sex == Sex::Female {
        egfr *= c.female_factor;
    }
    egfr
}

fn eval_ckd_epi_2009(inputs: &Validated) -> Result<FormulaResult> {
    let age = inputs.quantity("age")?;
    let creatinine = positive_creatinine("ckd_epi", inputs)?;
    let sex: Sex = inputs.choice("sex")?;

    let (kappa, alpha) = match sex {
        Sex::Female => (0.7, -0.329),
        Sex::Male => (0.9, -0.411),
    };
    let coefficients = CkdEpiCoefficients {
        scale: 141.0,
        kappa,
        alpha,
        beta: -1.209,
        age_base: 0.993,
        female_factor: 1.018,
    };

    let mut egfr = ckd_epi_core(creatinine, age, sex, &coefficients);
    if inputs.flag("african_american")? {
        egfr *= 1.159;
    }

    Ok(FormulaResult::numeric(round_dp(egfr, 1)))
}

fn eval_ckd_epi_2021(inputs: &Validated) -> Result<FormulaResult> {
    let age = inputs.quantity("age")?;
    let creatinine = positive_creatinine("ckd_epi_2021", inputs)?;
    let sex: Sex = inputs.choice("sex")?;

    let (kappa, alpha) = match sex {
        Sex::Female => (0.7, -0.241),
        Sex::Male => (0.9, -0.302),
    };
    let coefficients = CkdEpiCoefficients {
        scale: 142.0,
        kappa,
        alpha,
        beta: -1.200,
        age_base: 0.9938,
        female_factor: 1.012,
    };

    let egfr = ckd_epi_core(creatinine, age, sex, &coefficients);
    Ok(FormulaResult::numeric(round_dp(egfr, 1)))
}

// ============================================================================
// Typed API
// ============================================================================

/// Cockcroft-Gault creatinine clearance (mL/min)
pub fn cockcroft_gault(
    age_years: f64,
    weight_kg: f64,
    creatinine_mg_dl: f64,
    sex: Sex,
) -> Result<FormulaResult> {
    let inputs = Inputs::new()
        .quantity("age", age_years, Unit::Years)
        .quantity("weight", weight_kg, Unit::Kilograms)
        .quantity("creatinine", creatinine_mg_dl, Unit::MilligramsPerDeciliter)
        .choice("sex", sex_choice(sex));
    run(Domain::Renal, "cockcroft_gault", &inputs)
}

/// MDRD eGFR (mL/min/1.73m²)
pub fn mdrd(
    creatinine_mg_dl: f64,
    age_years: f64,
    sex: Sex,
    african_american: bool,
) -> Result<FormulaResult> {
    run(
        Domain::Renal,
        "mdrd",
        &egfr_inputs(creatinine_mg_dl, age_years, sex).flag("african_american", african_american),
    )
}

/// CKD-EPI 2009 eGFR (mL/min/1.73m²)
pub fn ckd_epi(
    creatinine_mg_dl: f64,
    age_years: f64,
    sex: Sex,
    african_american: bool,
) -> Result<FormulaResult> {
    run(
        Domain::Renal,
        "ckd_epi",
        &egfr_inputs(creatinine_mg_dl, age_years, sex).flag("african_american", african_american),
    )
}

/// CKD-EPI 2021 eGFR without race coefficient (mL/min/1.73m²)
pub fn ckd_epi_2021(creatinine_mg_dl: f64, age_years: f64, sex: Sex) -> Result<FormulaResult> {
    run(
        Domain::Renal,
        "ckd_epi_2021",
        &egfr_inputs(creatinine_mg_dl, age_years, sex),
    )
}

fn egfr_inputs(creatinine_mg_dl: f64, age_years: f64, sex: Sex) -> Inputs {
    Inputs::new()
        .quantity("age", age_years, Unit::Years)
        .quantity("creatinine", creatinine_mg_dl, Unit::MilligramsPerDeciliter)
        .choice("sex", sex_choice(sex))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::default_registry;

    fn value(result: Result<FormulaResult>) -> f64 {
        result.unwrap().value.unwrap()
    }

    #[test]
    fn test_cockcroft_gault_male() {
        let result = cockcroft_gault(60.0, 70.0, 1.0, Sex::Male).unwrap();
        assert!((result.value.unwrap() - 77.78).abs() < 0.01);
        assert_eq!(result.unit, Some(Unit::MillilitersPerMinute));
        assert_eq!(result.category.as_deref(), Some("mildly reduced"));
    }

    #[test]
    fn test_cockcroft_gault_female_factor() {
        let crcl = value(cockcroft_gault(60.0, 70.0, 1.0, Sex::Female));
        assert!((crcl - 66.11).abs() < 0.01);
    }

    #[test]
    fn test_cockcroft_gault_accepts_micromolar_creatinine() {
        let formula = default_registry()
            .lookup(Domain::Renal, "cockcroft_gault")
            .unwrap();
        let inputs = Inputs::new()
            .quantity("age", 60.0, Unit::Years)
            .quantity("weight", 70.0, Unit::Kilograms)
            .quantity("creatinine", 88.4, Unit::MicromolesPerLiter)
            .choice("sex", "male");
        let crcl = formula.compute(&inputs).unwrap().value.unwrap();
        assert!((crcl - 77.78).abs() < 0.01);
    }

    #[test]
    fn test_zero_creatinine_is_domain_error() {
        for result in [
            cockcroft_gault(60.0, 70.0, 0.0, Sex::Male),
            mdrd(0.0, 60.0, Sex::Male, false),
            ckd_epi(0.0, 60.0, Sex::Male, false),
            ckd_epi_2021(0.0, 60.0, Sex::Female),
        ] {
            assert!(matches!(result, Err(Error::Domain { .. })), "{:?}", result);
        }
    }

    #[test]
    fn test_negative_age_is_range_error() {
        assert!(matches!(
            cockcroft_gault(-5.0, 70.0, 1.0, Sex::Male),
            Err(Error::Range { .. })
        ));
        assert!(matches!(
            ckd_epi_2021(1.0, -5.0, Sex::Male),
            Err(Error::Range { .. })
        ));
    }

    #[test]
    fn test_missing_sex_is_missing_parameter() {
        let formula = default_registry().lookup(Domain::Renal, "mdrd").unwrap();
        let inputs = Inputs::new()
            .quantity("age", 60.0, Unit::Years)
            .quantity("creatinine", 1.0, Unit::MilligramsPerDeciliter);
        assert!(matches!(
            formula.compute(&inputs),
            Err(Error::MissingParameter(name)) if name == "sex"
        ));
    }

    #[test]
    fn test_mdrd() {
        assert!((value(mdrd(1.0, 60.0, Sex::Male, false)) - 76.2).abs() < 0.05);
        assert!((value(mdrd(1.0, 60.0, Sex::Male, true)) - 92.4).abs() < 0.05);

        let result = mdrd(2.0, 60.0, Sex::Female, false).unwrap();
        assert!((result.value.unwrap() - 25.4).abs() < 0.05);
        assert_eq!(result.category.as_deref(), Some("G4"));
    }

    #[test]
    fn test_ckd_epi_2009() {
        let result = ckd_epi(1.0, 60.0, Sex::Male, false).unwrap();
        assert!((result.value.unwrap() - 81.4).abs() < 0.05);
        assert_eq!(result.category.as_deref(), Some("G2"));

        assert!((value(ckd_epi(0.8, 60.0, Sex::Female, false)) - 80.1).abs() < 0.05);
        assert!((value(ckd_epi(1.0, 60.0, Sex::Male, true)) - 94.4).abs() < 0.05);
    }

    #[test]
    fn test_ckd_epi_2021() {
        assert!((value(ckd_epi_2021(1.0, 60.0, Sex::Male)) - 86.2).abs() < 0.05);

        let result = ckd_epi_2021(0.6, 50.0, Sex::Female).unwrap();
        assert!((result.value.unwrap() - 109.3).abs() < 0.05);
        assert_eq!(result.category.as_deref(), Some("G1"));
    }

    #[test]
    fn test_egfr_reported_to_one_decimal() {
        let results = [
            mdrd(1.37, 63.0, Sex::Female, false),
            ckd_epi(1.37, 63.0, Sex::Female, false),
            ckd_epi_2021(1.37, 63.0, Sex::Female),
        ];
        for result in results {
            let egfr = value(result);
            assert_eq!(egfr, round_dp(egfr, 1), "eGFR {} not at 1 dp", egfr);
        }
    }

    #[test]
    fn test_stage_three_note() {
        let result = ckd_epi_2021(1.6, 70.0, Sex::Male).unwrap();
        let egfr = result.value.unwrap();
        assert!((30.0..60.0).contains(&egfr), "eGFR {}", egfr);
        assert!(result
            .interpretation
            .as_deref()
            .unwrap()
            .starts_with("Stage 3 CKD"));
    }
}
