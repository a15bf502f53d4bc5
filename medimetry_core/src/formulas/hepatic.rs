//! Hepatology: Child-Pugh classification of cirrhosis severity.

use super::run;
use crate::bands::Band;
use crate::formula::{Calculator, FormulaResult, FormulaSpec, Inputs};
use crate::types::Domain;
use crate::units::{Substance, Unit};
use crate::validator::{ParamSpec, Validated};
use crate::{Error, Result};
use std::str::FromStr;

/// Ascites as assessed clinically or on imaging
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AscitesSeverity {
    None,
    Slight,
    Moderate,
}

impl AscitesSeverity {
    pub const OPTIONS: &'static [&'static str] = &["none", "slight", "moderate"];

    pub fn as_str(self) -> &'static str {
        Self::OPTIONS[self as usize]
    }

    fn points(self) -> u32 {
        self as u32 + 1
    }
}

impl FromStr for AscitesSeverity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(AscitesSeverity::None),
            "slight" | "mild" => Ok(AscitesSeverity::Slight),
            "moderate" | "severe" => Ok(AscitesSeverity::Moderate),
            other => Err(Error::Parse(format!("Unknown ascites severity '{}'", other))),
        }
    }
}

/// West Haven grade of hepatic encephalopathy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncephalopathyGrade {
    None,
    Grade1To2,
    Grade3To4,
}

impl EncephalopathyGrade {
    pub const OPTIONS: &'static [&'static str] = &["none", "grade1-2", "grade3-4"];

    pub fn as_str(self) -> &'static str {
        Self::OPTIONS[self as usize]
    }

    fn points(self) -> u32 {
        self as u32 + 1
    }
}

impl FromStr for EncephalopathyGrade {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(EncephalopathyGrade::None),
            "grade1-2" | "1-2" => Ok(EncephalopathyGrade::Grade1To2),
            "grade3-4" | "3-4" => Ok(EncephalopathyGrade::Grade3To4),
            other => Err(Error::Parse(format!("Unknown encephalopathy grade '{}'", other))),
        }
    }
}

pub fn formulas() -> Vec<Calculator> {
    vec![Calculator::new(
        FormulaSpec::new(Domain::Hepatic, "child_pugh", "Child-Pugh score")
            .param(
                ParamSpec::quantity("bilirubin", Unit::MilligramsPerDeciliter, 0.0, 50.0)
                    .substance(Substance::Bilirubin)
                    .with_description("Total bilirubin"),
            )
            .param(
                ParamSpec::quantity("albumin", Unit::GramsPerDeciliter, 0.0, 10.0)
                    .with_description("Serum albumin"),
            )
            .param(
                ParamSpec::quantity("inr", Unit::Ratio, 0.0, 20.0)
                    .with_description("International normalized ratio"),
            )
            .param(ParamSpec::choice("ascites", AscitesSeverity::OPTIONS))
            .param(ParamSpec::choice("encephalopathy", EncephalopathyGrade::OPTIONS))
            .output(Unit::Points)
            .with_bands(vec![
                Band::new(5.0, 7.0, "A").with_note("Well-compensated disease"),
                Band::new(7.0, 10.0, "B").with_note("Significant functional compromise"),
                Band::new(10.0, 16.0, "C").with_note("Decompensated disease"),
            ])
            .reference("Pugh RN et al. Br J Surg 1973;60:646-649"),
        eval_child_pugh,
    )]
}

fn eval_child_pugh(inputs: &Validated) -> Result<FormulaResult> {
    let bilirubin = inputs.quantity("bilirubin")?;
    let albumin = inputs.quantity("albumin")?;
    let inr = inputs.quantity("inr")?;
    let ascites: AscitesSeverity = inputs.choice("ascites")?;
    let encephalopathy: EncephalopathyGrade = inputs.choice("encephalopathy")?;

    let bilirubin_points = if bilirubin < 2.0 {
        1
    } else if bilirubin <= 3.0 {
        2
    } else {
        3
    };
    let albumin_points = if albumin > 3.5 {
        1
    } else if albumin >= 2.8 {
        2
    } else {
        3
    };
    let inr_points = if inr < 1.7 {
        1
    } else if inr <= 2.3 {
        2
    } else {
        3
    };

    let score = bilirubin_points + albumin_points + inr_points + ascites.points() + encephalopathy.points();
    Ok(FormulaResult::numeric(f64::from(score)))
}

/// Child-Pugh score (5-15) and class A/B/C
pub fn child_pugh(
    bilirubin_mg_dl: f64,
    albumin_g_dl: f64,
    inr: f64,
    ascites: AscitesSeverity,
    encephalopathy: EncephalopathyGrade,
) -> Result<FormulaResult> {
    let inputs = Inputs::new()
        .quantity("bilirubin", bilirubin_mg_dl, Unit::MilligramsPerDeciliter)
        .quantity("albumin", albumin_g_dl, Unit::GramsPerDeciliter)
        .quantity("inr", inr, Unit::Ratio)
        .choice("ascites", ascites.as_str())
        .choice("encephalopathy", encephalopathy.as_str());
    run(Domain::Hepatic, "child_pugh", &inputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_pugh_best_case() {
        let result = child_pugh(
            1.0,
            4.0,
            1.0,
            AscitesSeverity::None,
            EncephalopathyGrade::None,
        )
        .unwrap();
        assert_eq!(result.value, Some(5.0));
        assert_eq!(result.category.as_deref(), Some("A"));
    }

    #[test]
    fn test_child_pugh_worst_case() {
        let result = child_pugh(
            5.0,
            2.0,
            3.0,
            AscitesSeverity::Moderate,
            EncephalopathyGrade::Grade3To4,
        )
        .unwrap();
        assert_eq!(result.value, Some(15.0));
        assert_eq!(result.category.as_deref(), Some("C"));
    }

    #[test]
    fn test_child_pugh_thresholds() {
        // bilirubin 3.0 and albumin 2.8 and INR 2.3 all score 2
        let result = child_pugh(
            3.0,
            2.8,
            2.3,
            AscitesSeverity::None,
            EncephalopathyGrade::None,
        )
        .unwrap();
        assert_eq!(result.value, Some(8.0));
        assert_eq!(result.category.as_deref(), Some("B"));

        let result = child_pugh(
            2.0,
            3.5,
            1.7,
            AscitesSeverity::Slight,
            EncephalopathyGrade::None,
        )
        .unwrap();
        assert_eq!(result.value, Some(9.0));
    }

    #[test]
    fn test_child_pugh_bilirubin_in_si_units() {
        let inputs = Inputs::new()
            .quantity("bilirubin", 17.0, Unit::MicromolesPerLiter)
            .quantity("albumin", 40.0, Unit::GramsPerLiter)
            .quantity("inr", 1.1, Unit::Ratio)
            .choice("ascites", "none")
            .choice("encephalopathy", "none");
        let result = run(Domain::Hepatic, "child_pugh", &inputs).unwrap();
        assert_eq!(result.value, Some(5.0));
    }

    #[test]
    fn test_child_pugh_invalid_choice() {
        let inputs = Inputs::new()
            .quantity("bilirubin", 1.0, Unit::MilligramsPerDeciliter)
            .quantity("albumin", 4.0, Unit::GramsPerDeciliter)
            .quantity("inr", 1.0, Unit::Ratio)
            .choice("ascites", "massive")
            .choice("encephalopathy", "none");
        assert!(matches!(
            run(Domain::Hepatic, "child_pugh", &inputs),
            Err(Error::InvalidChoice { parameter, .. }) if parameter == "ascites"
        ));
    }

    #[test]
    fn test_parse_grades() {
        assert_eq!("Grade1-2".parse::<EncephalopathyGrade>().unwrap(), EncephalopathyGrade::Grade1To2);
        assert_eq!("slight".parse::<AscitesSeverity>().unwrap(), AscitesSeverity::Slight);
        assert!("grade5".parse::<EncephalopathyGrade>().is_err());
    }
}
