//! Formula registry and the built-in catalog.
//!
//! The default registry is built once on first use and is read-only
//! afterwards, so it can be shared freely across threads.

use crate::formula::{Calculator, EvalFn, Formula, FormulaSpec};
use crate::types::Domain;
use crate::validator::ParamKind;
use crate::{bands, formulas, Error, Result};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Cached default registry - built once and reused across all operations
static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(build_default_registry);

/// Get a reference to the cached default registry
pub fn default_registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

/// Builds a registry holding every built-in formula
///
/// **Note**: For production use, prefer `default_registry()` which returns a
/// cached reference. This function is retained for testing and for callers
/// that want to extend the catalog with their own formulas.
pub fn build_default_registry() -> Registry {
    let registry = build_registry(formulas::builtin());
    tracing::info!("Built formula registry with {} formulas", registry.len());
    registry
}

/// Register a fixed catalog, keeping rejections for [`Registry::validate`]
fn build_registry(catalog: Vec<Calculator>) -> Registry {
    let mut registry = Registry::new();

    for formula in catalog {
        if let Err(e) = registry.register(formula) {
            tracing::error!("Built-in formula rejected: {}", e);
            registry.rejected.push(e.to_string());
        }
    }

    registry
}

/// Mapping from (domain, name) to formula implementation
#[derive(Default)]
pub struct Registry {
    formulas: Vec<Box<dyn Formula>>,
    index: HashMap<(Domain, String), usize>,
    /// Catalog entries that failed to register
    rejected: Vec<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a formula; names are unique within a domain
    pub fn register(&mut self, formula: impl Formula + 'static) -> Result<()> {
        let spec = formula.spec();
        let key = (spec.domain, spec.name.clone());
        if self.index.contains_key(&key) {
            return Err(Error::DuplicateName {
                domain: spec.domain.to_string(),
                name: spec.name.clone(),
            });
        }

        tracing::debug!("Registered formula {}/{}", spec.domain, spec.name);
        self.index.insert(key, self.formulas.len());
        self.formulas.push(Box::new(formula));
        Ok(())
    }

    /// Register a declaration together with its evaluation function
    pub fn register_fn(&mut self, spec: FormulaSpec, eval: EvalFn) -> Result<()> {
        self.register(Calculator::new(spec, eval))
    }

    pub fn lookup(&self, domain: Domain, name: &str) -> Result<&dyn Formula> {
        self.index
            .get(&(domain, name.to_string()))
            .map(|&i| self.formulas[i].as_ref())
            .ok_or_else(|| Error::NotFound {
                domain: domain.to_string(),
                name: name.to_string(),
            })
    }

    /// Formula declarations in registration order, optionally for one domain
    pub fn list(&self, domain: Option<Domain>) -> Vec<&FormulaSpec> {
        self.formulas
            .iter()
            .map(|f| f.spec())
            .filter(|spec| domain.map_or(true, |d| spec.domain == d))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// Validate every registered declaration for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors: Vec<String> = self
            .rejected
            .iter()
            .map(|e| format!("Catalog entry not registered: {}", e))
            .collect();

        for spec in self.list(None) {
            let id = format!("{}/{}", spec.domain, spec.name);

            if spec.name.is_empty() {
                errors.push(format!("Formula in domain '{}' has empty name", spec.domain));
            }
            if spec.title.is_empty() {
                errors.push(format!("Formula '{}' has empty title", id));
            }
            if spec.params.is_empty() {
                errors.push(format!("Formula '{}' declares no parameters", id));
            }

            let mut seen = HashSet::new();
            for param in &spec.params {
                if !seen.insert(param.name.as_str()) {
                    errors.push(format!("Formula '{}': duplicate parameter '{}'", id, param.name));
                }
                match &param.kind {
                    ParamKind::Quantity { min, max, .. } => {
                        if !(min <= max) {
                            errors.push(format!(
                                "Formula '{}': parameter '{}' has min {} > max {}",
                                id, param.name, min, max
                            ));
                        }
                    }
                    ParamKind::Choice { options } => {
                        if options.is_empty() {
                            errors.push(format!(
                                "Formula '{}': choice '{}' has no options",
                                id, param.name
                            ));
                        }
                    }
                    ParamKind::Flag => {}
                }
            }

            if !spec.bands.is_empty() && spec.output_unit.is_none() {
                errors.push(format!("Formula '{}' has bands but no output unit", id));
            }
            for problem in bands::check_bands(&spec.bands) {
                errors.push(format!("Formula '{}': {}", id, problem));
            }
        }

        for domain in Domain::ALL {
            if self.list(Some(domain)).is_empty() {
                tracing::warn!("Registry has no formulas in domain '{}'", domain);
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::FormulaResult;
    use crate::units::Unit;
    use crate::validator::{ParamSpec, Validated};

    fn constant(_: &Validated) -> Result<FormulaResult> {
        Ok(FormulaResult::numeric(1.0))
    }

    fn spec(domain: Domain, name: &str) -> FormulaSpec {
        FormulaSpec::new(domain, name, "Constant")
            .param(ParamSpec::quantity("x", Unit::Points, 0.0, 1.0))
    }

    #[test]
    fn test_default_registry_loads() {
        let registry = build_default_registry();
        assert_eq!(registry.len(), 24);
        assert_eq!(registry.len(), formulas::builtin().len());
        for domain in Domain::ALL {
            assert!(
                !registry.list(Some(domain)).is_empty(),
                "No formulas in {}",
                domain
            );
        }
    }

    #[test]
    fn test_default_registry_validates() {
        let errors = default_registry().validate();
        assert!(
            errors.is_empty(),
            "Default registry has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_duplicate_name_rejected_within_domain() {
        let mut registry = Registry::new();
        registry.register_fn(spec(Domain::Renal, "x"), constant).unwrap();

        let err = registry
            .register_fn(spec(Domain::Renal, "x"), constant)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName { .. }));

        // Same name in another domain is fine
        registry.register_fn(spec(Domain::Lytes, "x"), constant).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_catalog_entry_fails_validation() {
        let catalog = vec![
            Calculator::new(spec(Domain::Renal, "x"), constant),
            Calculator::new(spec(Domain::Renal, "x"), constant),
        ];
        let registry = build_registry(catalog);

        assert_eq!(registry.len(), 1);
        let errors = registry.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("renal"), "{}", errors[0]);
    }

    #[test]
    fn test_lookup_not_found() {
        let registry = Registry::new();
        assert!(matches!(
            registry.lookup(Domain::Renal, "nope"),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            default_registry().lookup(Domain::Lytes, "cockcroft_gault"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_list_preserves_declaration_order() {
        let mut registry = Registry::new();
        for name in ["c", "a", "b"] {
            registry.register_fn(spec(Domain::Neuro, name), constant).unwrap();
        }
        registry.register_fn(spec(Domain::Renal, "z"), constant).unwrap();

        let names: Vec<_> = registry
            .list(Some(Domain::Neuro))
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert_eq!(registry.list(None).len(), 4);
    }

    #[test]
    fn test_registry_is_shareable_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    default_registry()
                        .lookup(Domain::Cardiovasc, "mean_arterial_pressure")
                        .is_ok()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
