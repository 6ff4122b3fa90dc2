//! Value terms and vocabulary annotations.
use crate::model::{AnnotationBody, AnnotationTarget, Element, ElementId, TermRef, ValueTerm, VocabularyAnnotation};
use crate::type_system::ExpressionTypeChecker;
use crate::validation::context::ValidationContext;
use crate::validation::error::ErrorKind;
use crate::validation::rule::{Check, ValidationRule};
use std::collections::HashSet;

/// Value terms arrived in 3.0.
pub static VALUE_TERMS_NOT_SUPPORTED_BEFORE_V3: ValidationRule =
    ValidationRule::semantic("ValueTermsNotSupportedBeforeV3", Check::ValueTerm(value_terms_not_supported_before_v3));

/// Vocabulary annotations arrived in 3.0.
pub static ANNOTATIONS_NOT_SUPPORTED_BEFORE_V3: ValidationRule = ValidationRule::semantic(
    "VocabularyAnnotationsNotSupportedBeforeV3",
    Check::Annotation(annotations_not_supported_before_v3),
);

pub static TARGET_MUST_BE_RESOLVED: ValidationRule =
    ValidationRule::semantic("VocabularyAnnotationInaccessibleTarget", Check::Annotation(target_must_be_resolved));

pub static TERM_MUST_BE_RESOLVED: ValidationRule =
    ValidationRule::semantic("VocabularyAnnotationTermMustBeAccessible", Check::Annotation(term_must_be_resolved));

pub static VALUE_MUST_MATCH_TERM_TYPE: ValidationRule =
    ValidationRule::semantic("ValueAnnotationAssertCorrectExpressionType", Check::Annotation(value_must_match_term_type));

pub static TYPE_ANNOTATION_PROPERTIES_MUST_MATCH: ValidationRule =
    ValidationRule::semantic("TypeAnnotationAssertMatchesTermType", Check::Annotation(type_annotation_properties_must_match));

fn value_terms_not_supported_before_v3(ctx: &mut ValidationContext<'_>, id: ElementId, term: &ValueTerm) {
    ctx.error_at(
        id,
        ErrorKind::ValueTermsNotSupportedBeforeV3,
        format!("The value term '{}' is not supported before version 3.0.", term.name),
    );
}

fn annotations_not_supported_before_v3(ctx: &mut ValidationContext<'_>, id: ElementId, _annotation: &VocabularyAnnotation) {
    ctx.error_at(
        id,
        ErrorKind::VocabularyAnnotationsNotSupportedBeforeV3,
        "Vocabulary annotations are not supported before version 3.0.",
    );
}

fn target_must_be_resolved(ctx: &mut ValidationContext<'_>, id: ElementId, annotation: &VocabularyAnnotation) {
    let unresolved = match &annotation.target {
        AnnotationTarget::Unresolved(name) => Some(name.clone()),
        AnnotationTarget::Element(target) if ctx.model().element(*target).is_none() => Some(format!("#{}", target.0)),
        AnnotationTarget::Element(_) => None,
    };
    if let Some(name) = unresolved {
        ctx.error_at(id, ErrorKind::BadUnresolvedTarget, format!("The annotation target '{}' could not be found.", name));
    }
}

/// A term is either a value term or, for type annotations, a structured type.
fn term_must_be_resolved(ctx: &mut ValidationContext<'_>, id: ElementId, annotation: &VocabularyAnnotation) {
    let model = ctx.model();
    let message = match (&annotation.term, &annotation.body) {
        (TermRef::Unresolved(name), _) => Some(format!("The term '{}' could not be found.", name)),
        (TermRef::Term(term), AnnotationBody::Value(_)) if !matches!(model.element(*term), Some(Element::ValueTerm(_))) => {
            Some(format!("The term '{}' of a value annotation is not a value term.", model.qualified_name(*term)))
        }
        (TermRef::Term(term), AnnotationBody::Type(_)) if model.structure(*term).is_none() => {
            Some(format!("The term '{}' of a type annotation is not a structured type.", model.qualified_name(*term)))
        }
        _ => None,
    };
    if let Some(message) = message {
        ctx.error_at(id, ErrorKind::BadUnresolvedTerm, message);
    }
}

fn annotation_context(ctx: &ValidationContext<'_>, annotation: &VocabularyAnnotation) -> Option<ElementId> {
    match annotation.target {
        AnnotationTarget::Element(target) => ctx.model().structure(target).map(|_| target),
        AnnotationTarget::Unresolved(_) => None,
    }
}

fn value_must_match_term_type(ctx: &mut ValidationContext<'_>, _id: ElementId, annotation: &VocabularyAnnotation) {
    let (TermRef::Term(term), AnnotationBody::Value(value)) = (&annotation.term, &annotation.body) else {
        return;
    };
    let model = ctx.model();
    let Some(Element::ValueTerm(term)) = model.element(*term) else {
        return;
    };
    if ctx.is_bad_type(&term.type_ref.definition) {
        return;
    }
    let context = annotation_context(ctx, annotation);
    if let Err(errors) = ExpressionTypeChecker::new(model).assert_type_in(*value, &term.type_ref, context, false) {
        for error in errors {
            ctx.push(error);
        }
    }
}

fn type_annotation_properties_must_match(ctx: &mut ValidationContext<'_>, id: ElementId, annotation: &VocabularyAnnotation) {
    let (TermRef::Term(term), AnnotationBody::Type(bindings)) = (&annotation.term, &annotation.body) else {
        return;
    };
    let model = ctx.model();
    if model.structure(*term).is_none() || ctx.is_bad(*term) {
        return;
    }
    let checker = ExpressionTypeChecker::new(model);
    let context = annotation_context(ctx, annotation);
    let mut found = HashSet::new();

    for property in model.properties(*term) {
        let Some((name, type_ref, _)) = model.property(property) else {
            continue;
        };
        match bindings.iter().find(|b| b.property == name) {
            Some(binding) => {
                found.insert(name);
                if let Err(errors) = checker.assert_type_in(binding.value, type_ref, context, false) {
                    for error in errors {
                        ctx.push(error);
                    }
                }
            }
            None if !type_ref.nullable => ctx.error_at(
                id,
                ErrorKind::TypeAnnotationMissingRequiredProperty,
                format!("The type annotation is missing a value for the required property '{}'.", name),
            ),
            None => {}
        }
    }

    if !model.is_open(*term) {
        for binding in bindings.iter().filter(|b| !found.contains(b.property.as_str())) {
            ctx.error_at(
                id,
                ErrorKind::TypeAnnotationHasExtraProperties,
                format!("The term '{}' has no property named '{}'.", model.qualified_name(*term), binding.property),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConstantValue, EdmModel, Expression, PrimitiveKind, PropertyValueBinding, TypeRef};
    use crate::validation::{RuleSet, Validation};
    use rstest::rstest;

    fn run(model: &EdmModel, rules: &[&ValidationRule]) -> Vec<ErrorKind> {
        let set = RuleSet::new(rules.iter().map(|r| **r));
        Validation::new(model, &set).errors().map(|e| e.code).collect()
    }

    fn employee() -> (EdmModel, ElementId) {
        let mut model = EdmModel::new();
        let employee = model.add_entity_type("Hr", "Employee");
        let id = model.add_structural_property(employee, "Id", TypeRef::primitive(PrimitiveKind::Int32, false));
        model.add_structural_property(employee, "Name", TypeRef::primitive(PrimitiveKind::String, true));
        model.set_key(employee, vec![id]);
        (model, employee)
    }

    #[rstest]
    #[case(ConstantValue::Integer(40), vec![])]
    #[case(ConstantValue::String("forty".into()), vec![ErrorKind::ExpressionPrimitiveKindNotValidForAssertedType])]
    fn test_value_annotation_matches_term(#[case] value: ConstantValue, #[case] expected: Vec<ErrorKind>) {
        let (mut model, employee) = employee();
        let hours = model.add_value_term("Hr", "WeeklyHours", TypeRef::primitive(PrimitiveKind::Int16, false));
        let value = model.add_expression(Expression::constant(value));
        model.add_annotation(AnnotationTarget::Element(employee), TermRef::Term(hours), None, AnnotationBody::Value(value));
        assert_eq!(run(&model, &[&VALUE_MUST_MATCH_TERM_TYPE]), expected);
    }

    #[test]
    fn test_paths_resolve_against_the_target() {
        let (mut model, employee) = employee();
        let caption = model.add_value_term("Ui", "Caption", TypeRef::primitive(PrimitiveKind::String, true));
        let good = model.add_expression(Expression::path(&["Name"]));
        let bad = model.add_expression(Expression::path(&["Name", "First"]));
        for value in [good, bad] {
            model.add_annotation(AnnotationTarget::Element(employee), TermRef::Term(caption), None, AnnotationBody::Value(value));
        }
        assert_eq!(run(&model, &[&VALUE_MUST_MATCH_TERM_TYPE]), vec![ErrorKind::PathIsNotValidForTheGivenContext]);
    }

    #[test]
    fn test_unresolved_target_and_term() {
        let (mut model, employee) = employee();
        let value = model.add_expression(Expression::Null);
        model.add_annotation(
            AnnotationTarget::Unresolved("Hr.Contractor".into()),
            TermRef::Unresolved("Ui.Hidden".into()),
            None,
            AnnotationBody::Value(value),
        );
        // A type annotation whose term is not a structured type.
        let hours = model.add_value_term("Hr", "WeeklyHours", TypeRef::primitive(PrimitiveKind::Int16, false));
        model.add_annotation(AnnotationTarget::Element(employee), TermRef::Term(hours), None, AnnotationBody::Type(Vec::new()));

        let codes = run(&model, &[&TARGET_MUST_BE_RESOLVED, &TERM_MUST_BE_RESOLVED]);
        assert_eq!(codes, vec![ErrorKind::BadUnresolvedTarget, ErrorKind::BadUnresolvedTerm, ErrorKind::BadUnresolvedTerm]);
    }

    #[test]
    fn test_type_annotation_bindings() {
        let (mut model, employee) = employee();
        let badge = model.add_complex_type("Security", "Badge");
        model.add_structural_property(badge, "Level", TypeRef::primitive(PrimitiveKind::Byte, false));
        model.add_structural_property(badge, "Note", TypeRef::primitive(PrimitiveKind::String, true));
        let level = model.add_expression(Expression::constant(ConstantValue::Integer(300)));
        let color = model.add_expression(Expression::constant(ConstantValue::String("red".into())));
        let bindings = vec![
            PropertyValueBinding { property: "Level".into(), value: level },
            PropertyValueBinding { property: "Color".into(), value: color },
        ];
        model.add_annotation(AnnotationTarget::Element(employee), TermRef::Term(badge), None, AnnotationBody::Type(bindings));

        let codes = run(&model, &[&TYPE_ANNOTATION_PROPERTIES_MUST_MATCH]);
        assert_eq!(codes, vec![ErrorKind::IntegerConstantValueOutOfRange, ErrorKind::TypeAnnotationHasExtraProperties]);
    }

    #[test]
    fn test_type_annotation_missing_required_property() {
        let (mut model, employee) = employee();
        let badge = model.add_complex_type("Security", "Badge");
        model.add_structural_property(badge, "Level", TypeRef::primitive(PrimitiveKind::Byte, false));
        model.add_annotation(AnnotationTarget::Element(employee), TermRef::Term(badge), None, AnnotationBody::Type(Vec::new()));
        assert_eq!(
            run(&model, &[&TYPE_ANNOTATION_PROPERTIES_MUST_MATCH]),
            vec![ErrorKind::TypeAnnotationMissingRequiredProperty]
        );
    }

    #[test]
    fn test_version_gates() {
        let (mut model, employee) = employee();
        let hours = model.add_value_term("Hr", "WeeklyHours", TypeRef::primitive(PrimitiveKind::Int16, false));
        let value = model.add_expression(Expression::constant(ConstantValue::Integer(40)));
        model.add_annotation(AnnotationTarget::Element(employee), TermRef::Term(hours), None, AnnotationBody::Value(value));
        let codes = run(&model, &[&VALUE_TERMS_NOT_SUPPORTED_BEFORE_V3, &ANNOTATIONS_NOT_SUPPORTED_BEFORE_V3]);
        assert_eq!(
            codes,
            vec![ErrorKind::ValueTermsNotSupportedBeforeV3, ErrorKind::VocabularyAnnotationsNotSupportedBeforeV3]
        );
    }
}
