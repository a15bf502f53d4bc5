//! The built-in formula catalog, one module per clinical domain.
//!
//! Each module declares its formulas (specs + evaluation functions) and
//! exposes typed wrappers that route through the default registry, so typed
//! callers get exactly the same validation as registry callers.

pub mod anthropometric;
pub mod cardiac;
pub mod cardiovasc;
pub mod hepatic;
pub mod lytes;
pub mod neuro;
pub mod pulmonary;
pub mod renal;

use crate::formula::{Calculator, FormulaResult, Inputs};
use crate::registry::default_registry;
use crate::types::{Domain, Sex};
use crate::units::Unit;
use crate::validator::ParamSpec;
use crate::Result;

/// Every built-in formula in declaration order
pub fn builtin() -> Vec<Calculator> {
    let mut all = Vec::new();
    all.extend(renal::formulas());
    all.extend(lytes::formulas());
    all.extend(cardiovasc::formulas());
    all.extend(cardiac::formulas());
    all.extend(neuro::formulas());
    all.extend(pulmonary::formulas());
    all.extend(anthropometric::formulas());
    all.extend(hepatic::formulas());
    all
}

/// Compute a registered formula from the default registry
pub(crate) fn run(domain: Domain, name: &str, inputs: &Inputs) -> Result<FormulaResult> {
    default_registry().lookup(domain, name)?.compute(inputs)
}

// Shared parameter declarations

pub(crate) fn adult_age() -> ParamSpec {
    ParamSpec::quantity("age", Unit::Years, 18.0, 130.0).with_description("Age")
}

pub(crate) fn sex() -> ParamSpec {
    ParamSpec::choice("sex", Sex::OPTIONS)
}

pub(crate) fn weight() -> ParamSpec {
    ParamSpec::quantity("weight", Unit::Kilograms, 1.0, 300.0).with_description("Body weight")
}

pub(crate) fn height() -> ParamSpec {
    ParamSpec::quantity("height", Unit::Meters, 0.3, 3.0).with_description("Body height")
}

pub(crate) fn sex_choice(sex: Sex) -> &'static str {
    match sex {
        Sex::Male => "male",
        Sex::Female => "female",
    }
}

/// Add one point per set flag
pub(crate) fn count_points(criteria: &[(bool, u32)]) -> u32 {
    criteria
        .iter()
        .filter(|(present, _)| *present)
        .map(|(_, points)| points)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_count_points() {
        assert_eq!(count_points(&[(true, 1), (false, 2), (true, 3)]), 4);
        assert_eq!(count_points(&[]), 0);
    }

    #[test]
    fn test_negative_age_rejected_by_every_age_formula() {
        let registry = default_registry();
        let mut checked = 0;

        for spec in registry.list(None) {
            if spec.param_named("age").is_none() {
                continue;
            }
            let formula = registry.lookup(spec.domain, &spec.name).unwrap();
            let inputs = Inputs::new().quantity("age", -5.0, Unit::Years);
            match formula.compute(&inputs) {
                Err(Error::Range { parameter, .. }) => assert_eq!(parameter, "age"),
                Err(Error::MissingParameter(name)) => {
                    // Parameters are validated in declaration order; age must
                    // come before any other required input for this check.
                    panic!("{}/{} checked '{}' before age", spec.domain, spec.name, name)
                }
                other => panic!("{}/{}: expected range error, got {:?}", spec.domain, spec.name, other),
            }
            checked += 1;
        }

        assert!(checked >= 7, "Only {} formulas take age", checked);
    }
}
