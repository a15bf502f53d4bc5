//! Catalog documentation export.
//!
//! Writes one CSV row per registered formula, suitable for publishing the
//! catalog as a reference table.

use crate::bands::Band;
use crate::formula::FormulaSpec;
use crate::registry::Registry;
use crate::validator::{ParamKind, ParamSpec};
use crate::Result;
use std::io::Write;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    domain: &'a str,
    name: &'a str,
    title: &'a str,
    parameters: String,
    output_unit: Option<&'static str>,
    bands: String,
    reference: Option<&'a str>,
}

impl<'a> From<&'a FormulaSpec> for CsvRow<'a> {
    fn from(spec: &'a FormulaSpec) -> Self {
        CsvRow {
            domain: spec.domain.as_str(),
            name: &spec.name,
            title: &spec.title,
            parameters: spec.params.iter().map(param_summary).collect::<Vec<_>>().join("; "),
            output_unit: spec.output_unit.map(|u| u.symbol()),
            bands: spec.bands.iter().map(band_summary).collect::<Vec<_>>().join("; "),
            reference: spec.reference.as_deref(),
        }
    }
}

fn bound(value: f64) -> String {
    if value == f64::INFINITY {
        "∞".to_string()
    } else if value == f64::NEG_INFINITY {
        "-∞".to_string()
    } else {
        value.to_string()
    }
}

/// One-line description of a parameter, e.g. `age: years [18, 130]`
pub fn param_summary(param: &ParamSpec) -> String {
    let mut text = match &param.kind {
        ParamKind::Quantity {
            unit,
            min,
            max,
            substance,
        } => {
            let mut text = format!("{}: {} [{}, {}]", param.name, unit, bound(*min), bound(*max));
            if let Some(substance) = substance {
                text.push_str(&format!(" ({:?})", substance).to_lowercase());
            }
            text
        }
        ParamKind::Flag => format!("{}: flag", param.name),
        ParamKind::Choice { options } => format!("{}: {}", param.name, options.join("|")),
    };
    if param.optional && param.kind != ParamKind::Flag {
        text.push_str(", optional");
    }
    text
}

/// Band as `label [lower, upper)`
pub fn band_summary(band: &Band) -> String {
    format!("{} [{}, {})", band.label, bound(band.lower), bound(band.upper))
}

/// Write the catalog table to any writer; returns the number of rows
pub fn write_catalog_csv<W: Write>(registry: &Registry, writer: W) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(writer);

    let specs = registry.list(None);
    for spec in &specs {
        writer.serialize(CsvRow::from(*spec))?;
    }
    writer.flush()?;

    Ok(specs.len())
}

/// Write the catalog table to `path`, creating parent directories
pub fn export_catalog(registry: &Registry, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = std::fs::File::create(path)?;
    let count = write_catalog_csv(registry, file)?;
    tracing::info!("Exported {} formulas to {:?}", count, path);
    Ok(count)
}
