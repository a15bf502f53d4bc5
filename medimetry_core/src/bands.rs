//! Interpretation bands.
//!
//! A band is a half-open interval `[lower, upper)` with a clinical label.
//! A formula's bands are ascending, contiguous and non-overlapping.

use serde::Serialize;

/// Category reported when a value falls in none of the declared bands
pub const OUT_OF_RANGE: &str = "out of range";

/// A labeled numeric interval
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Band {
    pub lower: f64,
    pub upper: f64,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Band {
    pub fn new(lower: f64, upper: f64, label: impl Into<String>) -> Self {
        Self {
            lower,
            upper,
            label: label.into(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value < self.upper
    }
}

/// Find the first band containing `value`
pub fn classify(bands: &[Band], value: f64) -> Option<&Band> {
    bands.iter().find(|band| band.contains(value))
}

/// Check that bands are ascending, contiguous and non-empty intervals.
///
/// Returns a list of problems, or an empty Vec if valid.
pub fn check_bands(bands: &[Band]) -> Vec<String> {
    let mut errors = Vec::new();

    for band in bands {
        if band.label.is_empty() {
            errors.push(format!("Band [{}, {}) has empty label", band.lower, band.upper));
        }
        if band.lower.is_nan() || band.upper.is_nan() || band.lower >= band.upper {
            errors.push(format!(
                "Band '{}' has invalid interval [{}, {})",
                band.label, band.lower, band.upper
            ));
        }
    }

    for pair in bands.windows(2) {
        if pair[0].upper != pair[1].lower {
            errors.push(format!(
                "Bands '{}' and '{}' are not contiguous ({} != {})",
                pair[0].label, pair[1].label, pair[0].upper, pair[1].lower
            ));
        }
    }

    errors
}
