//! Cardiac electrophysiology: heart-rate corrected QT interval.

use super::run;
use crate::bands::Band;
use crate::formula::{round_dp, Calculator, FormulaResult, FormulaSpec, Inputs};
use crate::types::Domain;
use crate::units::Unit;
use crate::validator::{ParamSpec, Validated};
use crate::{Error, Result};
use std::fmt;

fn qtc_spec(name: &str, title: &str, reference: &str) -> FormulaSpec {
    FormulaSpec::new(Domain::Cardiac, name, title)
        .param(
            ParamSpec::quantity("qt", Unit::Milliseconds, 100.0, 1000.0)
                .with_description("Measured QT interval"),
        )
        .param(
            ParamSpec::quantity("rr", Unit::Seconds, 0.2, 3.0)
                .with_description("RR interval (60 / heart rate)"),
        )
        .output(Unit::Milliseconds)
        .with_bands(vec![
            Band::new(0.0, 350.0, "short"),
            Band::new(350.0, 450.0, "normal"),
            Band::new(450.0, 470.0, "borderline"),
            Band::new(470.0, f64::INFINITY, "prolonged")
                .with_note("Increased risk of torsades de pointes"),
        ])
        .reference(reference)
}

pub fn formulas() -> Vec<Calculator> {
    vec![
        Calculator::new(
            qtc_spec("qtc_bazett", "QTc (Bazett)", "Bazett HC. Heart 1920;7:353-370"),
            eval_bazett,
        ),
        Calculator::new(
            qtc_spec("qtc_fridericia", "QTc (Fridericia)", "Fridericia LS. Acta Med Scand 1920;53:469-486"),
            eval_fridericia,
        ),
        Calculator::new(
            qtc_spec("qtc_framingham", "QTc (Framingham)", "Sagie A et al. Am J Cardiol 1992;70:797-801"),
            eval_framingham,
        ),
        Calculator::new(
            qtc_spec("qtc_hodges", "QTc (Hodges)", "Hodges M et al. J Am Coll Cardiol 1983;1:694"),
            eval_hodges,
        ),
    ]
}

/// QT in ms and RR in seconds
fn intervals(inputs: &Validated) -> Result<(f64, f64)> {
    Ok((inputs.quantity("qt")?, inputs.quantity("rr")?))
}

fn eval_bazett(inputs: &Validated) -> Result<FormulaResult> {
    let (qt, rr) = intervals(inputs)?;
    Ok(FormulaResult::numeric(round_dp(qt / rr.sqrt(), 1)))
}

fn eval_fridericia(inputs: &Validated) -> Result<FormulaResult> {
    let (qt, rr) = intervals(inputs)?;
    Ok(FormulaResult::numeric(round_dp(qt / rr.cbrt(), 1)))
}

fn eval_framingham(inputs: &Validated) -> Result<FormulaResult> {
    let (qt, rr) = intervals(inputs)?;
    Ok(FormulaResult::numeric(round_dp(qt + 154.0 * (1.0 - rr), 1)))
}

fn eval_hodges(inputs: &Validated) -> Result<FormulaResult> {
    let (qt, rr) = intervals(inputs)?;
    let heart_rate = 60.0 / rr;
    Ok(FormulaResult::numeric(round_dp(qt + 1.75 * (heart_rate - 60.0), 1)))
}

// ============================================================================
// Typed API
// ============================================================================

/// QT correction method
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QtcFormula {
    Bazett,
    Fridericia,
    Framingham,
    Hodges,
}

impl QtcFormula {
    pub const ALL: [QtcFormula; 4] = [
        QtcFormula::Bazett,
        QtcFormula::Fridericia,
        QtcFormula::Framingham,
        QtcFormula::Hodges,
    ];

    /// Registry name of the formula
    pub fn name(self) -> &'static str {
        match self {
            QtcFormula::Bazett => "qtc_bazett",
            QtcFormula::Fridericia => "qtc_fridericia",
            QtcFormula::Framingham => "qtc_framingham",
            QtcFormula::Hodges => "qtc_hodges",
        }
    }
}

impl fmt::Display for QtcFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Corrected QT interval in ms
pub fn qtc(qt_ms: f64, rr_s: f64, formula: QtcFormula) -> Result<FormulaResult> {
    let inputs = Inputs::new()
        .quantity("qt", qt_ms, Unit::Milliseconds)
        .quantity("rr", rr_s, Unit::Seconds);
    run(Domain::Cardiac, formula.name(), &inputs)
}

/// RR interval in seconds for a heart rate in bpm
pub fn rr_interval(heart_rate_bpm: f64) -> Result<f64> {
    if !heart_rate_bpm.is_finite() || heart_rate_bpm <= 0.0 {
        return Err(Error::domain("rr_interval", "heart rate must be positive"));
    }
    Ok(60.0 / heart_rate_bpm)
}
