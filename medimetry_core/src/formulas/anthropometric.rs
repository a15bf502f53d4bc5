//! Body mass index and body surface area.

use super::{height, run, weight};
use crate::bands::Band;
use crate::formula::{round_dp, Calculator, FormulaResult, FormulaSpec, Inputs};
use crate::types::Domain;
use crate::units::Unit;
use crate::validator::Validated;
use crate::{Error, Result};
use std::fmt;

fn bsa_spec(name: &str, title: &str) -> FormulaSpec {
    FormulaSpec::new(Domain::Anthropometric, name, title)
        .param(weight())
        .param(height())
        .output(Unit::SquareMeters)
}

pub fn formulas() -> Vec<Calculator> {
    vec![
        Calculator::new(
            FormulaSpec::new(Domain::Anthropometric, "bmi", "Body mass index")
                .param(weight())
                .param(height())
                .output(Unit::KilogramsPerSquareMeter)
                .with_bands(vec![
                    Band::new(0.0, 18.5, "Underweight"),
                    Band::new(18.5, 25.0, "Normal weight"),
                    Band::new(25.0, 30.0, "Overweight"),
                    Band::new(30.0, 35.0, "Obese Class I"),
                    Band::new(35.0, 40.0, "Obese Class II"),
                    Band::new(40.0, f64::INFINITY, "Obese Class III"),
                ])
                .reference("WHO Technical Report Series 894, 2000"),
            eval_bmi,
        ),
        Calculator::new(
            bsa_spec("bsa_dubois", "Body surface area (DuBois)")
                .reference("Du Bois D, Du Bois EF. Arch Intern Med 1916;17:863-871"),
            eval_bsa_dubois,
        ),
        Calculator::new(
            bsa_spec("bsa_mosteller", "Body surface area (Mosteller)")
                .reference("Mosteller RD. N Engl J Med 1987;317:1098"),
            eval_bsa_mosteller,
        ),
        Calculator::new(
            bsa_spec("bsa_haycock", "Body surface area (Haycock)")
                .reference("Haycock GB et al. J Pediatr 1978;93:62-66"),
            eval_bsa_haycock,
        ),
        Calculator::new(
            bsa_spec("bsa_gehan_george", "Body surface area (Gehan-George)")
                .reference("Gehan EA, George SL. Cancer Chemother Rep 1970;54:225-235"),
            eval_bsa_gehan_george,
        ),
        Calculator::new(
            bsa_spec("bsa_boyd", "Body surface area (Boyd)"),
            eval_bsa_boyd,
        ),
    ]
}

fn eval_bmi(inputs: &Validated) -> Result<FormulaResult> {
    let weight = inputs.quantity("weight")?;
    let height = inputs.quantity("height")?;
    Ok(FormulaResult::numeric(round_dp(weight / (height * height), 1)))
}

/// Weight in kg and height in cm, as the BSA equations expect
fn weight_and_height_cm(inputs: &Validated) -> Result<(f64, f64)> {
    Ok((inputs.quantity("weight")?, inputs.quantity("height")? * 100.0))
}

fn eval_bsa_dubois(inputs: &Validated) -> Result<FormulaResult> {
    let (w, h) = weight_and_height_cm(inputs)?;
    let bsa = 0.007184 * w.powf(0.425) * h.powf(0.725);
    Ok(FormulaResult::numeric(round_dp(bsa, 2)))
}

fn eval_bsa_mosteller(inputs: &Validated) -> Result<FormulaResult> {
    let (w, h) = weight_and_height_cm(inputs)?;
    Ok(FormulaResult::numeric(round_dp((w * h / 3600.0).sqrt(), 2)))
}

fn eval_bsa_haycock(inputs: &Validated) -> Result<FormulaResult> {
    let (w, h) = weight_and_height_cm(inputs)?;
    let bsa = 0.024265 * w.powf(0.5378) * h.powf(0.3964);
    Ok(FormulaResult::numeric(round_dp(bsa, 2)))
}

fn eval_bsa_gehan_george(inputs: &Validated) -> Result<FormulaResult> {
    let (w, h) = weight_and_height_cm(inputs)?;
    let bsa = 0.0235 * w.powf(0.51456) * h.powf(0.42246);
    Ok(FormulaResult::numeric(round_dp(bsa, 2)))
}

fn eval_bsa_boyd(inputs: &Validated) -> Result<FormulaResult> {
    let (w, h) = weight_and_height_cm(inputs)?;
    // Weight exponent shrinks with log10 of weight
    let exponent = 0.6157 - 0.0188 * w.log10();
    let bsa = 0.03330 * w.powf(exponent) * h.powf(0.3);
    Ok(FormulaResult::numeric(round_dp(bsa, 2)))
}

// ============================================================================
// Typed API
// ============================================================================

fn body(weight_kg: f64, height_m: f64) -> Inputs {
    Inputs::new()
        .quantity("weight", weight_kg, Unit::Kilograms)
        .quantity("height", height_m, Unit::Meters)
}

/// BMI (kg/m²) with its WHO category
pub fn bmi(weight_kg: f64, height_m: f64) -> Result<FormulaResult> {
    run(Domain::Anthropometric, "bmi", &body(weight_kg, height_m))
}

/// Body surface area method
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum BsaFormula {
    DuBois,
    #[default]
    Mosteller,
    Haycock,
    GehanGeorge,
    Boyd,
}

impl BsaFormula {
    pub const ALL: [BsaFormula; 5] = [
        BsaFormula::DuBois,
        BsaFormula::Mosteller,
        BsaFormula::Haycock,
        BsaFormula::GehanGeorge,
        BsaFormula::Boyd,
    ];

    /// Registry name of the formula
    pub fn name(self) -> &'static str {
        match self {
            BsaFormula::DuBois => "bsa_dubois",
            BsaFormula::Mosteller => "bsa_mosteller",
            BsaFormula::Haycock => "bsa_haycock",
            BsaFormula::GehanGeorge => "bsa_gehan_george",
            BsaFormula::Boyd => "bsa_boyd",
        }
    }
}

impl fmt::Display for BsaFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BsaFormula::DuBois => "DuBois",
            BsaFormula::Mosteller => "Mosteller",
            BsaFormula::Haycock => "Haycock",
            BsaFormula::GehanGeorge => "Gehan-George",
            BsaFormula::Boyd => "Boyd",
        };
        f.write_str(label)
    }
}

/// Body surface area in m²
pub fn bsa(weight_kg: f64, height_m: f64, formula: BsaFormula) -> Result<FormulaResult> {
    run(Domain::Anthropometric, formula.name(), &body(weight_kg, height_m))
}

/// Body surface area by every method, in [`BsaFormula::ALL`] order
pub fn bsa_all(weight_kg: f64, height_m: f64) -> Result<Vec<(BsaFormula, f64)>> {
    BsaFormula::ALL
        .iter()
        .map(|&formula| {
            let value = bsa(weight_kg, height_m, formula)?
                .value
                .ok_or_else(|| Error::domain(formula.name(), "no value"))?;
            Ok((formula, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(weight: f64, height: f64, formula: BsaFormula) -> f64 {
        bsa(weight, height, formula).unwrap().value.unwrap()
    }

    #[test]
    fn test_bmi_normal_weight() {
        let result = bmi(70.0, 1.75).unwrap();
        assert_eq!(result.value, Some(22.9));
        assert_eq!(result.unit, Some(Unit::KilogramsPerSquareMeter));
        assert_eq!(result.category.as_deref(), Some("Normal weight"));
    }

    #[test]
    fn test_bmi_categories() {
        let category = |w, h| bmi(w, h).unwrap().category.unwrap();
        assert_eq!(category(50.0, 1.75), "Underweight");
        assert_eq!(category(85.0, 1.75), "Overweight");
        assert_eq!(category(100.0, 1.75), "Obese Class I");
        assert_eq!(category(115.0, 1.75), "Obese Class II");
        assert_eq!(category(130.0, 1.75), "Obese Class III");
    }

    #[test]
    fn test_bmi_height_in_centimeters() {
        let inputs = Inputs::new()
            .quantity("weight", 70.0, Unit::Kilograms)
            .quantity("height", 175.0, Unit::Centimeters);
        let result = run(Domain::Anthropometric, "bmi", &inputs).unwrap();
        assert_eq!(result.value, Some(22.9));
    }

    #[test]
    fn test_bmi_rejects_implausible_height() {
        // 175 given as meters
        assert!(matches!(
            bmi(70.0, 175.0),
            Err(Error::Range { parameter, .. }) if parameter == "height"
        ));
        assert!(matches!(
            bmi(0.0, 1.75),
            Err(Error::Range { parameter, .. }) if parameter == "weight"
        ));
    }

    #[test]
    fn test_bsa_reference_adults() {
        assert_eq!(area(70.0, 1.75, BsaFormula::DuBois), 1.85);
        assert_eq!(area(70.0, 1.75, BsaFormula::Mosteller), 1.84);
        assert_eq!(area(70.0, 1.75, BsaFormula::Haycock), 1.85);
        assert_eq!(area(70.0, 1.75, BsaFormula::GehanGeorge), 1.85);
        assert_eq!(area(70.0, 1.75, BsaFormula::Boyd), 1.85);

        assert_eq!(area(60.0, 1.65, BsaFormula::Mosteller), 1.66);
        assert_eq!(area(60.0, 1.65, BsaFormula::GehanGeorge), 1.67);
    }

    #[test]
    fn test_bsa_extremes() {
        assert_eq!(area(20.0, 1.20, BsaFormula::Mosteller), 0.82);
        assert_eq!(area(120.0, 2.00, BsaFormula::Mosteller), 2.58);
    }

    #[test]
    fn test_bsa_all() {
        let results = bsa_all(70.0, 1.75).unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].0, BsaFormula::DuBois);
        for (formula, value) in results {
            assert!((1.5..=2.5).contains(&value), "{}: {}", formula, value);
        }
    }

    #[test]
    fn test_bsa_all_propagates_invalid_input() {
        assert!(matches!(
            bsa_all(0.0, 1.75),
            Err(Error::Range { parameter, .. }) if parameter == "weight"
        ));
    }

    #[test]
    fn test_bsa_default_is_mosteller() {
        assert_eq!(BsaFormula::default(), BsaFormula::Mosteller);
        assert_eq!(BsaFormula::GehanGeorge.to_string(), "Gehan-George");
    }
}
