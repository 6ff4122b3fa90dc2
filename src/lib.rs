//! Semantic validation for Entity Data Model (EDM) schemas.
//!
//! A model is an arena of elements and annotation expressions. Validation walks
//! it once per enumeration, running every rule whose capability matches the
//! element being visited, and yields `EdmError` diagnostics lazily.
//!
//! ```ignore
//! let validation = edm_validation_core::validate(&model);
//! if !validation.is_valid() {
//!     for error in validation.errors() {
//!         eprintln!("{}", error);
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod type_system;
pub mod validation;

pub use config::{validate_batch, ValidationReport, ValidationSettings};
pub use error::ConfigError;
pub use model::{EdmModel, EdmVersion};
pub use type_system::{assert_type, assert_type_in, promotes_to, ExpressionTypeChecker};
pub use validation::{EdmError, ErrorKind, RuleSet, Validation};

use tracing::debug;

/// Validates against the model's declared version, or the latest when absent.
pub fn validate(model: &EdmModel) -> Validation<'_> {
    validate_version(model, model.version().unwrap_or(EdmVersion::LATEST))
}

pub fn validate_version(model: &EdmModel, version: EdmVersion) -> Validation<'_> {
    debug!(%version, elements = model.element_count(), "resolved built-in rule set");
    Validation::new(model, RuleSet::for_version(version))
}

/// Validates against a caller-supplied rule set.
pub fn validate_with<'m>(model: &'m EdmModel, rules: &'m RuleSet) -> Validation<'m> {
    debug!(rules = rules.len(), elements = model.element_count(), "validating with custom rule set");
    Validation::new(model, rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConstantValue, Expression, PrimitiveKind, TypeDef, TypeRef};
    use crate::validation::rules::types;

    fn with_open_type(version: Option<EdmVersion>) -> EdmModel {
        let mut model = version.map_or_else(EdmModel::new, EdmModel::with_version);
        let bag = model.add_complex_type("Docs", "PropertyBag");
        model.add_structural_property(bag, "Kind", TypeRef::primitive(PrimitiveKind::String, true));
        if let Some(structure) = model.structure_mut(bag) {
            structure.is_open = true;
        }
        model
    }

    #[test]
    fn test_validate_reads_model_version() {
        let codes: Vec<ErrorKind> = validate(&with_open_type(Some(EdmVersion::V1))).errors().map(|e| e.code).collect();
        assert_eq!(codes, vec![ErrorKind::OpenTypesSupportedOnlyInV12AndAfter]);
        assert!(validate(&with_open_type(None)).is_valid());
    }

    #[test]
    fn test_explicit_version_overrides_model() {
        let model = with_open_type(Some(EdmVersion::V1));
        assert!(validate_version(&model, EdmVersion::V1_2).is_valid());
    }

    #[test]
    fn test_custom_rule_set() {
        let model = with_open_type(None);
        let rules = RuleSet::new([types::OPEN_TYPES_NOT_SUPPORTED]);
        assert!(!validate_with(&model, &rules).is_valid());
    }

    #[test]
    fn test_assert_type_is_usable_standalone() {
        let mut model = EdmModel::new();
        let value = model.add_expression(Expression::constant(ConstantValue::Integer(7)));
        assert!(assert_type(&model, value, &TypeRef::primitive(PrimitiveKind::Int64, false)).is_ok());
        let errors = assert_type(&model, value, &TypeRef::new(TypeDef::Primitive(PrimitiveKind::String), false)).unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}
