//! Model-wide uniqueness of schema elements, containers, function overloads and annotations.
use crate::model::{AnnotationTarget, Element, ElementId, TermRef};
use crate::validation::context::ValidationContext;
use crate::validation::error::ErrorKind;
use crate::validation::rule::{Check, ValidationRule};
use std::collections::{HashMap, HashSet};

pub static DUPLICATE_SCHEMA_ELEMENT_NAME: ValidationRule =
    ValidationRule::semantic("ModelDuplicateSchemaElementName", Check::Model(duplicate_schema_element_name));

pub static DUPLICATE_ENTITY_CONTAINER_NAME: ValidationRule =
    ValidationRule::semantic("ModelDuplicateEntityContainerName", Check::Model(duplicate_entity_container_name));

pub static DUPLICATE_FUNCTIONS: ValidationRule =
    ValidationRule::semantic("ModelDuplicateFunctions", Check::Model(duplicate_functions));

pub static DUPLICATE_VOCABULARY_ANNOTATIONS: ValidationRule =
    ValidationRule::semantic("ModelDuplicateVocabularyAnnotations", Check::Model(duplicate_vocabulary_annotations));

/// Types and terms may not share a qualified name with anything. Functions may
/// share a name with each other (overloads) but not with a type or term.
fn duplicate_schema_element_name(ctx: &mut ValidationContext<'_>) {
    let model = ctx.model();
    let mut seen: HashMap<String, bool> = HashMap::new();
    for &id in model.schema_elements() {
        let is_function = matches!(model.element(id), Some(Element::Function(_)));
        let name = model.qualified_name(id);
        match seen.get(&name) {
            Some(&previous_is_function) if !(is_function && previous_is_function) => {
                ctx.error_at(id, ErrorKind::AlreadyDefined, format!("An element with the name '{}' is already defined.", name));
            }
            Some(_) => {}
            None => {
                seen.insert(name, is_function);
            }
        }
    }
}

fn duplicate_entity_container_name(ctx: &mut ValidationContext<'_>) {
    let model = ctx.model();
    let mut seen = HashSet::new();
    for &id in model.containers() {
        let name = model.qualified_name(id);
        if !seen.insert(name.clone()) {
            ctx.error_at(
                id,
                ErrorKind::DuplicateEntityContainerName,
                format!("An entity container with the name '{}' is already defined.", name),
            );
        }
    }
}

fn duplicate_functions(ctx: &mut ValidationContext<'_>) {
    let model = ctx.model();
    let functions: Vec<ElementId> = model
        .schema_elements()
        .iter()
        .copied()
        .filter(|id| matches!(model.element(*id), Some(Element::Function(_))))
        .collect();

    for (i, &id) in functions.iter().enumerate() {
        let name = model.qualified_name(id);
        let duplicated = functions[..i]
            .iter()
            .any(|&earlier| model.qualified_name(earlier) == name && model.signatures_equivalent(earlier, id));
        if duplicated {
            ctx.error_at(
                id,
                ErrorKind::DuplicateFunctions,
                format!("A function with the name '{}' and an equivalent signature is already defined.", name),
            );
        }
    }
}

fn duplicate_vocabulary_annotations(ctx: &mut ValidationContext<'_>) {
    let model = ctx.model();
    let mut seen = HashSet::new();
    for &id in model.annotations() {
        let Some(Element::Annotation(annotation)) = model.element(id) else {
            continue;
        };
        let (AnnotationTarget::Element(target), TermRef::Term(term)) = (&annotation.target, &annotation.term) else {
            continue;
        };
        if !seen.insert((*target, *term, annotation.qualifier.clone())) {
            ctx.error_at(
                id,
                ErrorKind::DuplicateAnnotation,
                format!(
                    "The annotated element '{}' has multiple annotations with the term '{}' and qualifier '{}'.",
                    model.qualified_name(*target),
                    model.qualified_name(*term),
                    annotation.qualifier.as_deref().unwrap_or("")
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnnotationBody, ConstantValue, EdmModel, Expression, PrimitiveKind, TypeRef};
    use crate::validation::{RuleSet, Validation};

    fn run(model: &EdmModel, rule: &ValidationRule) -> Vec<ErrorKind> {
        let set = RuleSet::new([*rule]);
        Validation::new(model, &set).errors().map(|e| e.code).collect()
    }

    #[test]
    fn test_function_overloads_may_share_a_name() {
        let mut model = EdmModel::new();
        let a = model.add_function("Geo", "Distance", Some(TypeRef::primitive(PrimitiveKind::Double, false)));
        model.add_parameter(a, "Miles", TypeRef::primitive(PrimitiveKind::Boolean, false));
        model.add_function("Geo", "Distance", Some(TypeRef::primitive(PrimitiveKind::Double, false)));
        assert!(run(&model, &DUPLICATE_SCHEMA_ELEMENT_NAME).is_empty());
        assert!(run(&model, &DUPLICATE_FUNCTIONS).is_empty());

        model.add_function("Geo", "Distance", Some(TypeRef::primitive(PrimitiveKind::Double, false)));
        assert_eq!(run(&model, &DUPLICATE_FUNCTIONS), vec![ErrorKind::DuplicateFunctions]);
    }

    #[test]
    fn test_type_and_function_names_clash() {
        let mut model = EdmModel::new();
        model.add_entity_type("Geo", "Region");
        model.add_function("Geo", "Region", None);
        model.add_entity_container("Geo", "Maps");
        model.add_entity_container("Geo", "Maps");
        assert_eq!(run(&model, &DUPLICATE_SCHEMA_ELEMENT_NAME), vec![ErrorKind::AlreadyDefined]);
        assert_eq!(run(&model, &DUPLICATE_ENTITY_CONTAINER_NAME), vec![ErrorKind::DuplicateEntityContainerName]);
    }

    #[test]
    fn test_duplicate_annotations_respect_qualifiers() {
        let mut model = EdmModel::new();
        let region = model.add_entity_type("Geo", "Region");
        let term = model.add_value_term("Display", "Label", TypeRef::primitive(PrimitiveKind::String, true));
        for qualifier in [None, Some("Short"), None] {
            let value = model.add_expression(Expression::constant(ConstantValue::String("Region".into())));
            model.add_annotation(AnnotationTarget::Element(region), TermRef::Term(term), qualifier, AnnotationBody::Value(value));
        }
        assert_eq!(run(&model, &DUPLICATE_VOCABULARY_ANNOTATIONS), vec![ErrorKind::DuplicateAnnotation]);
    }
}
