//! Units of measurement and unit-tagged values.
//!
//! Every [`Unit`] belongs to exactly one [`QuantityKind`] and carries a
//! linear factor to that kind's base unit. Conversions within a kind go
//! through the base unit. Conversions between mass and molar concentration
//! are only possible for a named [`Substance`], because they depend on its
//! molar mass.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default relative tolerance for [`Measurement::approx_eq`]
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

// ============================================================================
// Quantity kinds
// ============================================================================

/// Physical dimension of a measurement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityKind {
    Time,
    Mass,
    Length,
    Pressure,
    Frequency,
    MassConcentration,
    MolarConcentration,
    Fraction,
    Ratio,
    Score,
    Flow,
    IndexedFlow,
    Area,
    MassIndex,
}

impl fmt::Display for QuantityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuantityKind::Time => "time",
            QuantityKind::Mass => "mass",
            QuantityKind::Length => "length",
            QuantityKind::Pressure => "pressure",
            QuantityKind::Frequency => "frequency",
            QuantityKind::MassConcentration => "mass concentration",
            QuantityKind::MolarConcentration => "molar concentration",
            QuantityKind::Fraction => "fraction",
            QuantityKind::Ratio => "ratio",
            QuantityKind::Score => "score",
            QuantityKind::Flow => "flow",
            QuantityKind::IndexedFlow => "indexed flow",
            QuantityKind::Area => "area",
            QuantityKind::MassIndex => "mass index",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Units
// ============================================================================

/// A unit of measurement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Unit {
    // Time (base: seconds)
    Seconds,
    Milliseconds,
    Minutes,
    Hours,
    Days,
    Months,
    Years,
    // Mass (base: kilograms)
    Kilograms,
    Grams,
    Pounds,
    // Length (base: meters)
    Meters,
    Centimeters,
    Millimeters,
    Inches,
    // Pressure (base: mmHg)
    MillimetersOfMercury,
    Kilopascals,
    CentimetersOfWater,
    // Frequency (base: beats per minute)
    BeatsPerMinute,
    Hertz,
    // Mass concentration (base: g/L)
    GramsPerLiter,
    GramsPerDeciliter,
    MilligramsPerDeciliter,
    MilligramsPerLiter,
    // Molar concentration (base: mol/L)
    MolesPerLiter,
    MillimolesPerLiter,
    MicromolesPerLiter,
    // Fraction (base: 1)
    Fraction,
    Percent,
    Ratio,
    Points,
    // Flow (base: mL/min)
    MillilitersPerMinute,
    LitersPerHour,
    MillilitersPerMinutePer173SquareMeters,
    // Area (base: m²)
    SquareMeters,
    SquareCentimeters,
    KilogramsPerSquareMeter,
}

const SECONDS_PER_YEAR: f64 = 365.25 * 86_400.0;

/// Unit table: (unit, display symbol, kind, factor to base unit)
const UNIT_TABLE: &[(Unit, &str, QuantityKind, f64)] = &[
    (Unit::Seconds, "s", QuantityKind::Time, 1.0),
    (Unit::Milliseconds, "ms", QuantityKind::Time, 1e-3),
    (Unit::Minutes, "min", QuantityKind::Time, 60.0),
    (Unit::Hours, "h", QuantityKind::Time, 3_600.0),
    (Unit::Days, "days", QuantityKind::Time, 86_400.0),
    (Unit::Months, "months", QuantityKind::Time, SECONDS_PER_YEAR / 12.0),
    (Unit::Years, "years", QuantityKind::Time, SECONDS_PER_YEAR),
    (Unit::Kilograms, "kg", QuantityKind::Mass, 1.0),
    (Unit::Grams, "g", QuantityKind::Mass, 1e-3),
    (Unit::Pounds, "lb", QuantityKind::Mass, 0.453_592_37),
    (Unit::Meters, "m", QuantityKind::Length, 1.0),
    (Unit::Centimeters, "cm", QuantityKind::Length, 1e-2),
    (Unit::Millimeters, "mm", QuantityKind::Length, 1e-3),
    (Unit::Inches, "in", QuantityKind::Length, 0.0254),
    (Unit::MillimetersOfMercury, "mmHg", QuantityKind::Pressure, 1.0),
    (Unit::Kilopascals, "kPa", QuantityKind::Pressure, 7.500_615_758),
    (Unit::CentimetersOfWater, "cmH2O", QuantityKind::Pressure, 0.735_559_24),
    (Unit::BeatsPerMinute, "bpm", QuantityKind::Frequency, 1.0),
    (Unit::Hertz, "Hz", QuantityKind::Frequency, 60.0),
    (Unit::GramsPerLiter, "g/L", QuantityKind::MassConcentration, 1.0),
    (Unit::GramsPerDeciliter, "g/dL", QuantityKind::MassConcentration, 10.0),
    (Unit::MilligramsPerDeciliter, "mg/dL", QuantityKind::MassConcentration, 1e-2),
    (Unit::MilligramsPerLiter, "mg/L", QuantityKind::MassConcentration, 1e-3),
    (Unit::MolesPerLiter, "mol/L", QuantityKind::MolarConcentration, 1.0),
    (Unit::MillimolesPerLiter, "mmol/L", QuantityKind::MolarConcentration, 1e-3),
    (Unit::MicromolesPerLiter, "µmol/L", QuantityKind::MolarConcentration, 1e-6),
    (Unit::Fraction, "fraction", QuantityKind::Fraction, 1.0),
    (Unit::Percent, "%", QuantityKind::Fraction, 1e-2),
    (Unit::Ratio, "ratio", QuantityKind::Ratio, 1.0),
    (Unit::Points, "points", QuantityKind::Score, 1.0),
    (Unit::MillilitersPerMinute, "mL/min", QuantityKind::Flow, 1.0),
    (Unit::LitersPerHour, "L/h", QuantityKind::Flow, 1_000.0 / 60.0),
    (
        Unit::MillilitersPerMinutePer173SquareMeters,
        "mL/min/1.73m²",
        QuantityKind::IndexedFlow,
        1.0,
    ),
    (Unit::SquareMeters, "m²", QuantityKind::Area, 1.0),
    (Unit::SquareCentimeters, "cm²", QuantityKind::Area, 1e-4),
    (Unit::KilogramsPerSquareMeter, "kg/m²", QuantityKind::MassIndex, 1.0),
];

/// Extra spellings accepted when parsing (matched case-insensitively)
const UNIT_ALIASES: &[(&str, Unit)] = &[
    ("sec", Unit::Seconds),
    ("msec", Unit::Milliseconds),
    ("hr", Unit::Hours),
    ("d", Unit::Days),
    ("day", Unit::Days),
    ("mo", Unit::Months),
    ("month", Unit::Months),
    ("y", Unit::Years),
    ("yr", Unit::Years),
    ("yrs", Unit::Years),
    ("year", Unit::Years),
    ("lbs", Unit::Pounds),
    ("/min", Unit::BeatsPerMinute),
    ("umol/l", Unit::MicromolesPerLiter),
    ("μmol/l", Unit::MicromolesPerLiter),
    ("percent", Unit::Percent),
    ("pts", Unit::Points),
    ("point", Unit::Points),
    ("ml/min/1.73m2", Unit::MillilitersPerMinutePer173SquareMeters),
    ("m2", Unit::SquareMeters),
    ("cm2", Unit::SquareCentimeters),
    ("kg/m2", Unit::KilogramsPerSquareMeter),
];

impl Unit {
    fn entry(self) -> &'static (Unit, &'static str, QuantityKind, f64) {
        UNIT_TABLE
            .iter()
            .find(|(unit, ..)| *unit == self)
            .unwrap_or_else(|| unreachable!("unit {:?} missing from table", self))
    }

    /// All known units, in table order
    pub fn all() -> impl Iterator<Item = Unit> {
        UNIT_TABLE.iter().map(|(unit, ..)| *unit)
    }

    /// Display symbol (e.g. "mg/dL")
    pub fn symbol(self) -> &'static str {
        self.entry().1
    }

    /// The quantity kind this unit measures
    pub fn kind(self) -> QuantityKind {
        self.entry().2
    }

    /// Multiplier converting a value in this unit to the kind's base unit
    fn factor(self) -> f64 {
        self.entry().3
    }

    /// Units sharing this unit's quantity kind
    pub fn compatible(self) -> impl Iterator<Item = Unit> {
        let kind = self.kind();
        Unit::all().filter(move |u| u.kind() == kind)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase();
        UNIT_TABLE
            .iter()
            .find(|(_, symbol, ..)| symbol.to_lowercase() == needle)
            .map(|(unit, ..)| *unit)
            .or_else(|| {
                UNIT_ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == needle)
                    .map(|(_, unit)| *unit)
            })
            .ok_or_else(|| Error::Parse(format!("Unknown unit '{}'", s.trim())))
    }
}

impl TryFrom<String> for Unit {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.symbol().to_string()
    }
}

// ============================================================================
// Substances
// ============================================================================

/// Analyte whose molar mass links mass and molar concentration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Substance {
    Creatinine,
    Glucose,
    Calcium,
    Bilirubin,
    Urea,
}

impl Substance {
    /// Molar mass in g/mol
    pub fn molar_mass(self) -> f64 {
        match self {
            Substance::Creatinine => 113.12,
            Substance::Glucose => 180.1528,
            Substance::Calcium => 40.078,
            Substance::Bilirubin => 584.66,
            Substance::Urea => 60.06,
        }
    }
}

// ============================================================================
// Measurement
// ============================================================================

/// A numeric value tagged with its unit
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: f64,
    pub unit: Unit,
}

impl Measurement {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn kind(&self) -> QuantityKind {
        self.unit.kind()
    }

    /// Rescale to another unit of the same quantity kind
    pub fn convert_to(&self, target: Unit) -> Result<Measurement> {
        if self.unit == target {
            return Ok(*self);
        }
        if self.kind() != target.kind() {
            return Err(self.incompatible(target));
        }
        let base = self.value * self.unit.factor();
        Ok(Measurement::new(base / target.factor(), target))
    }

    /// Convert using a substance's molar mass when crossing between mass and
    /// molar concentration; otherwise behaves like [`Measurement::convert_to`].
    pub fn convert_as(&self, substance: Substance, target: Unit) -> Result<Measurement> {
        use QuantityKind::{MassConcentration, MolarConcentration};

        let molar_mass = substance.molar_mass();
        match (self.kind(), target.kind()) {
            (from, to) if from == to => self.convert_to(target),
            (MassConcentration, MolarConcentration) => {
                let grams_per_liter = self.value * self.unit.factor();
                let moles_per_liter = grams_per_liter / molar_mass;
                Ok(Measurement::new(moles_per_liter / target.factor(), target))
            }
            (MolarConcentration, MassConcentration) => {
                let moles_per_liter = self.value * self.unit.factor();
                let grams_per_liter = moles_per_liter * molar_mass;
                Ok(Measurement::new(grams_per_liter / target.factor(), target))
            }
            _ => Err(self.incompatible(target)),
        }
    }

    /// Near-equality after conversion, using a relative tolerance.
    /// Measurements of different kinds are never equal.
    pub fn approx_eq(&self, other: &Measurement, rel_tol: f64) -> bool {
        match other.convert_to(self.unit) {
            Ok(other) => approx_eq(self.value, other.value, rel_tol),
            Err(_) => false,
        }
    }

    fn incompatible(&self, target: Unit) -> Error {
        Error::IncompatibleUnit {
            from: self.unit,
            from_kind: self.kind(),
            to: target,
            to_kind: target.kind(),
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Relative near-equality of two floats
pub fn approx_eq(a: f64, b: f64, rel_tol: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(f64::MIN_POSITIVE);
    (a - b).abs() <= rel_tol * scale
}

/// Split text such as `"1.2mg/dL"` or `"60 years"` into its number and
/// optional unit.
pub fn parse_quantity(text: &str) -> Result<(f64, Option<Unit>)> {
    let text = text.trim();
    let split = text
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .filter(|&end| text[..end].parse::<f64>().is_ok())
        .last()
        .ok_or_else(|| Error::Parse(format!("Expected a number in '{}'", text)))?;

    let value: f64 = text[..split]
        .parse()
        .map_err(|_| Error::Parse(format!("Expected a number in '{}'", text)))?;
    let rest = text[split..].trim();
    if rest.is_empty() {
        Ok((value, None))
    } else {
        Ok((value, Some(rest.parse()?)))
    }
}

impl FromStr for Measurement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match parse_quantity(s)? {
            (value, Some(unit)) => Ok(Measurement::new(value, unit)),
            (_, None) => Err(Error::Parse(format!("Missing unit in '{}'", s.trim()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_unit_has_table_entry() {
        for unit in Unit::all() {
            assert!(!unit.symbol().is_empty());
            assert!(unit.factor() > 0.0);
        }
    }

    #[test]
    fn test_round_trip_all_compatible_pairs() {
        for from in Unit::all() {
            for to in from.compatible() {
                let original = Measurement::new(42.5, from);
                let back = original
                    .convert_to(to)
                    .and_then(|m| m.convert_to(from))
                    .unwrap();
                assert!(
                    approx_eq(original.value, back.value, DEFAULT_TOLERANCE),
                    "{} -> {} -> {} drifted to {}",
                    from,
                    to,
                    from,
                    back.value
                );
            }
        }
    }

    #[test]
    fn test_simple_conversions() {
        let height = Measurement::new(175.0, Unit::Centimeters);
        assert!(height
            .convert_to(Unit::Meters)
            .unwrap()
            .approx_eq(&Measurement::new(1.75, Unit::Meters), DEFAULT_TOLERANCE));

        let rr = Measurement::new(800.0, Unit::Milliseconds);
        assert!((rr.convert_to(Unit::Seconds).unwrap().value - 0.8).abs() < 1e-12);

        let albumin = Measurement::new(35.0, Unit::GramsPerLiter);
        assert!((albumin.convert_to(Unit::GramsPerDeciliter).unwrap().value - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_incompatible_conversion_fails() {
        let weight = Measurement::new(70.0, Unit::Kilograms);
        let err = weight.convert_to(Unit::Meters).unwrap_err();
        assert!(matches!(err, Error::IncompatibleUnit { .. }));

        // Mass to molar concentration needs a substance
        let creatinine = Measurement::new(1.0, Unit::MilligramsPerDeciliter);
        assert!(matches!(
            creatinine.convert_to(Unit::MicromolesPerLiter),
            Err(Error::IncompatibleUnit { .. })
        ));
    }

    #[test]
    fn test_creatinine_substance_conversion() {
        let creatinine = Measurement::new(1.0, Unit::MilligramsPerDeciliter);
        let molar = creatinine
            .convert_as(Substance::Creatinine, Unit::MicromolesPerLiter)
            .unwrap();
        // 1 mg/dL = 10 mg/L / 113.12 g/mol ≈ 88.4 µmol/L
        assert!((molar.value - 88.40).abs() < 0.01);

        let back = molar
            .convert_as(Substance::Creatinine, Unit::MilligramsPerDeciliter)
            .unwrap();
        assert!(back.approx_eq(&creatinine, DEFAULT_TOLERANCE));
    }

    #[test]
    fn test_glucose_substance_conversion() {
        let glucose = Measurement::new(5.5, Unit::MillimolesPerLiter);
        let mass = glucose
            .convert_as(Substance::Glucose, Unit::MilligramsPerDeciliter)
            .unwrap();
        assert!((mass.value - 5.5 * 18.01528).abs() < 1e-9);
    }

    #[test]
    fn test_substance_conversion_rejects_other_kinds() {
        let weight = Measurement::new(70.0, Unit::Kilograms);
        assert!(weight
            .convert_as(Substance::Creatinine, Unit::MicromolesPerLiter)
            .is_err());
    }

    #[test]
    fn test_approx_eq_tolerance() {
        let a = Measurement::new(1.0, Unit::Meters);
        let b = Measurement::new(100.0 + 1e-8, Unit::Centimeters);
        assert!(a.approx_eq(&b, DEFAULT_TOLERANCE));
        assert!(!a.approx_eq(&Measurement::new(101.0, Unit::Centimeters), DEFAULT_TOLERANCE));
        assert!(!a.approx_eq(&Measurement::new(1.0, Unit::Kilograms), DEFAULT_TOLERANCE));
    }

    #[test]
    fn test_parse_units() {
        assert_eq!("mg/dL".parse::<Unit>().unwrap(), Unit::MilligramsPerDeciliter);
        assert_eq!("MG/DL".parse::<Unit>().unwrap(), Unit::MilligramsPerDeciliter);
        assert_eq!("umol/L".parse::<Unit>().unwrap(), Unit::MicromolesPerLiter);
        assert_eq!("µmol/L".parse::<Unit>().unwrap(), Unit::MicromolesPerLiter);
        assert_eq!("y".parse::<Unit>().unwrap(), Unit::Years);
        assert_eq!("kg/m2".parse::<Unit>().unwrap(), Unit::KilogramsPerSquareMeter);
        assert!("furlongs".parse::<Unit>().is_err());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("60years").unwrap(), (60.0, Some(Unit::Years)));
        assert_eq!(
            parse_quantity("1.2 mg/dL").unwrap(),
            (1.2, Some(Unit::MilligramsPerDeciliter))
        );
        assert_eq!(parse_quantity("-5").unwrap(), (-5.0, None));
        assert_eq!(parse_quantity("1e3ms").unwrap(), (1000.0, Some(Unit::Milliseconds)));
        assert_eq!(parse_quantity("70in").unwrap(), (70.0, Some(Unit::Inches)));
        assert!(parse_quantity("kg").is_err());
    }

    #[test]
    fn test_unit_serde_uses_symbol() {
        let json = serde_json::to_string(&Unit::MilligramsPerDeciliter).unwrap();
        assert_eq!(json, "\"mg/dL\"");
        let parsed: Unit = serde_json::from_str("\"mmHg\"").unwrap();
        assert_eq!(parsed, Unit::MillimetersOfMercury);
    }
}
