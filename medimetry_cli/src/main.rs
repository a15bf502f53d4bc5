use clap::{Parser, Subcommand};
use medimetry_core::config::OutputFormat;
use medimetry_core::docs::{band_summary, param_summary};
use medimetry_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "medimetry")]
#[command(about = "Clinical formula calculator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available formulas
    List {
        /// Only formulas in this domain
        #[arg(long)]
        domain: Option<Domain>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show parameters, units and bands of a formula
    Describe {
        domain: Domain,
        name: String,

        #[arg(long)]
        json: bool,
    },

    /// Compute a formula from name=value[unit] inputs
    Compute {
        domain: Domain,
        name: String,

        /// Inputs such as `age=60years weight=70kg sex=male`
        inputs: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// Write the formula catalog as CSV
    Export {
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    medimetry_core::logging::init_with_level(level);

    let registry = default_registry();
    let errors = registry.validate();
    if !errors.is_empty() {
        eprintln!("Formula catalog validation errors:");
        for error in &errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::Config("Invalid formula catalog".into()));
    }

    match cli.command {
        Commands::List { domain, json } => cmd_list(registry, domain, use_json(json, &config)),
        Commands::Describe { domain, name, json } => {
            cmd_describe(registry, &config, domain, &name, use_json(json, &config))
        }
        Commands::Compute {
            domain,
            name,
            inputs,
            json,
        } => cmd_compute(registry, &config, domain, &name, &inputs, use_json(json, &config)),
        Commands::Export { out } => cmd_export(registry, out),
    }
}

fn use_json(flag: bool, config: &Config) -> bool {
    flag || config.output.format == OutputFormat::Json
}

/// Look up by name, falling back to the configured aliases
fn find<'r>(
    registry: &'r Registry,
    config: &Config,
    domain: Domain,
    name: &str,
) -> Result<&'r dyn Formula> {
    match registry.lookup(domain, name) {
        Err(Error::NotFound { .. }) if config.resolve_alias(name) != name => {
            let resolved = config.resolve_alias(name);
            tracing::debug!("Resolved alias '{}' to '{}'", name, resolved);
            registry.lookup(domain, resolved)
        }
        other => other,
    }
}

fn cmd_list(registry: &Registry, domain: Option<Domain>, json: bool) -> Result<()> {
    let specs = registry.list(domain);

    if json {
        println!("{}", serde_json::to_string_pretty(&specs)?);
        return Ok(());
    }

    let mut current = None;
    for spec in specs {
        if current != Some(spec.domain) {
            println!("{}", spec.domain);
            current = Some(spec.domain);
        }
        println!("  {:<24} {}", spec.name, spec.title);
    }

    Ok(())
}

fn cmd_describe(
    registry: &Registry,
    config: &Config,
    domain: Domain,
    name: &str,
    json: bool,
) -> Result<()> {
    let spec = find(registry, config, domain, name)?.spec();

    if json {
        println!("{}", serde_json::to_string_pretty(spec)?);
        return Ok(());
    }

    println!("{} ({}/{})", spec.title, spec.domain, spec.name);
    println!();
    println!("  Parameters:");
    for param in &spec.params {
        if param.description.is_empty() {
            println!("    {}", param_summary(param));
        } else {
            println!("    {}  - {}", param_summary(param), param.description);
        }
    }

    if let Some(unit) = spec.output_unit {
        println!("  Output: {}", unit);
    }

    if !spec.bands.is_empty() {
        println!("  Bands:");
        for band in &spec.bands {
            println!("    {}", band_summary(band));
        }
    }

    if let Some(ref reference) = spec.reference {
        println!();
        println!("  ℹ Reference: {}", reference);
    }

    Ok(())
}

fn cmd_compute(
    registry: &Registry,
    config: &Config,
    domain: Domain,
    name: &str,
    assignments: &[String],
    json: bool,
) -> Result<()> {
    let formula = find(registry, config, domain, name)?;
    let inputs = Inputs::parse_assignments(formula.spec(), assignments)?;
    let result = formula.compute(&inputs)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", formula.spec().title);
    if let Some(value) = result.value {
        let unit = result.unit.map(|u| format!(" {}", u)).unwrap_or_default();
        println!("  Value: {}{}", format_value(value, config.output.precision), unit);
    }
    if let Some(ref category) = result.category {
        println!("  Category: {}", category);
    }
    if let Some(ref interpretation) = result.interpretation {
        println!("  Interpretation: {}", interpretation);
    }

    Ok(())
}

/// Whole numbers print without decimals
fn format_value(value: f64, precision: usize) -> String {
    if value.fract() == 0.0 {
        format!("{}", value)
    } else {
        format!("{:.*}", precision, value)
    }
}

fn cmd_export(registry: &Registry, out: PathBuf) -> Result<()> {
    let count = medimetry_core::docs::export_catalog(registry, &out)?;

    println!("✓ Exported {} formulas", count);
    println!("  CSV: {}", out.display());

    Ok(())
}
