//! Structural and navigation properties.
use crate::model::topology::contains_transitively;
use crate::model::{
    ConcurrencyMode, EdmModel, ElementId, Multiplicity, NavigationProperty, OnDeleteAction, StructuralProperty,
    TypeDef, TypeKind,
};
use crate::validation::context::ValidationContext;
use crate::validation::error::ErrorKind;
use crate::validation::rule::{Check, ValidationRule};
use std::collections::HashSet;

pub static INVALID_PROPERTY_TYPE: ValidationRule =
    ValidationRule::semantic("StructuralPropertyInvalidPropertyType", Check::StructuralProperty(invalid_property_type));

pub static NULLABLE_COMPLEX_TYPE: ValidationRule =
    ValidationRule::semantic("StructuralPropertyNullableComplexType", Check::StructuralProperty(nullable_complex_type));

pub static CONCURRENCY_REQUIRES_PRIMITIVE: ValidationRule = ValidationRule::semantic(
    "StructuralPropertyInvalidPropertyTypeConcurrencyMode",
    Check::StructuralProperty(concurrency_requires_primitive),
);

pub static PARTNER_MUST_POINT_BACK: ValidationRule =
    ValidationRule::semantic("NavigationPropertyPartnerMustPointBack", Check::NavigationProperty(partner_must_point_back));

pub static CORRECT_TYPE: ValidationRule =
    ValidationRule::semantic("NavigationPropertyCorrectType", Check::NavigationProperty(correct_type));

/// The principal end is `One` when every dependent property is non-nullable,
/// `ZeroOrOne` when all are nullable, either when mixed, and never `Many`.
pub static PRINCIPAL_END_MULTIPLICITY: ValidationRule = ValidationRule::semantic(
    "NavigationPropertyInvalidMultiplicityOfPrincipalEnd",
    Check::NavigationProperty(principal_end_multiplicity),
);

/// Dependent properties equal to the key allow a single-valued end; otherwise the end must be `Many`.
pub static DEPENDENT_END_MULTIPLICITY: ValidationRule = ValidationRule::semantic(
    "NavigationPropertyInvalidMultiplicityOfDependentEnd",
    Check::NavigationProperty(dependent_end_multiplicity),
);

pub static DEPENDENT_PROPERTIES_MUST_BELONG_TO_DEPENDENT_ENTITY: ValidationRule = ValidationRule::semantic(
    "NavigationPropertyDependentPropertiesMustBelongToDependentEntity",
    Check::NavigationProperty(dependent_properties_must_belong_to_dependent_entity),
);

pub static DUPLICATE_DEPENDENT_PROPERTY: ValidationRule = ValidationRule::semantic(
    "NavigationPropertyDuplicateDependentProperty",
    Check::NavigationProperty(duplicate_dependent_property),
);

pub static RELATIONSHIP_CONSTRAINT_MATCHES_PRINCIPAL_KEY: ValidationRule = ValidationRule::semantic(
    "NavigationPropertyTypeMismatchRelationshipConstraint",
    Check::NavigationProperty(relationship_constraint_matches_principal_key),
);

/// Before 2.0 dependent properties must be drawn from the dependent entity's key.
pub static DEPENDENT_PROPERTIES_MUST_BE_KEY_SUBSET: ValidationRule = ValidationRule::semantic(
    "NavigationPropertyInvalidToPropertyInRelationshipConstraintBeforeV2",
    Check::NavigationProperty(dependent_properties_must_be_key_subset),
);

/// Only one end of a relationship may carry an on-delete action.
pub static ON_DELETE_ON_BOTH_ENDS: ValidationRule =
    ValidationRule::semantic("NavigationPropertyInvalidOperationMultipleEndsInAssociation", Check::NavigationProperty(on_delete_on_both_ends));

/// A `Many` end cannot carry an on-delete action.
pub static ON_DELETE_ON_MANY_END: ValidationRule = ValidationRule::semantic(
    "NavigationPropertyEndWithManyMultiplicityCannotHaveOperationsSpecified",
    Check::NavigationProperty(on_delete_on_many_end),
);

/// Containment navigation arrived in 3.0.
pub static CONTAINS_TARGET_NOT_SUPPORTED_BEFORE_V3: ValidationRule = ValidationRule::semantic(
    "NavigationPropertyContainsTargetNotSupportedBeforeV3",
    Check::NavigationProperty(contains_target_not_supported_before_v3),
);

/// Containment between types related by inheritance must not require a target.
pub static RECURSIVE_CONTAINMENT_TARGET_MUST_BE_OPTIONAL: ValidationRule = ValidationRule::semantic(
    "NavigationPropertyWithRecursiveContainmentTargetMustBeOptional",
    Check::NavigationProperty(recursive_containment_target_must_be_optional),
);

/// The containing end of a recursive containment is `ZeroOrOne`.
pub static RECURSIVE_CONTAINMENT_SOURCE_MUST_BE_ZERO_OR_ONE: ValidationRule = ValidationRule::semantic(
    "NavigationPropertyWithRecursiveContainmentSourceMustBeFromZeroOrOne",
    Check::NavigationProperty(recursive_containment_source_must_be_zero_or_one),
);

/// The containing end of a non-recursive containment is exactly `One`.
pub static NON_RECURSIVE_CONTAINMENT_SOURCE_MUST_BE_ONE: ValidationRule = ValidationRule::semantic(
    "NavigationPropertyWithNonRecursiveContainmentSourceMustBeFromOne",
    Check::NavigationProperty(non_recursive_containment_source_must_be_one),
);

/// Non-recursive containment must not reach back to the declaring type through other containments.
pub static ENTITY_MUST_NOT_INDIRECTLY_CONTAIN_ITSELF: ValidationRule = ValidationRule::semantic(
    "NavigationPropertyEntityMustNotIndirectlyContainItself",
    Check::NavigationProperty(entity_must_not_indirectly_contain_itself),
);

fn invalid_property_type(ctx: &mut ValidationContext<'_>, id: ElementId, property: &StructuralProperty) {
    let definition = &property.type_ref.definition;
    if ctx.is_bad(id) || ctx.is_bad_type(definition) {
        return;
    }
    let model = ctx.model();
    let allowed = |def: &TypeDef| {
        matches!(model.type_kind(def), TypeKind::Primitive | TypeKind::Complex | TypeKind::Enum)
    };
    let valid = match definition {
        TypeDef::Collection(element) => allowed(&element.definition),
        other => allowed(other),
    };
    if !valid {
        ctx.error_at(
            id,
            ErrorKind::InvalidPropertyType,
            format!(
                "The property '{}' has type '{}', which is not valid for a structural property.",
                property.name,
                model.type_name(definition)
            ),
        );
    }
}

fn nullable_complex_type(ctx: &mut ValidationContext<'_>, id: ElementId, property: &StructuralProperty) {
    let model = ctx.model();
    if property.type_ref.nullable && model.type_kind(&property.type_ref.definition) == TypeKind::Complex {
        ctx.error_at(
            id,
            ErrorKind::NullableComplexTypeProperty,
            format!("The complex typed property '{}' must not be nullable.", property.name),
        );
    }
}

fn concurrency_requires_primitive(ctx: &mut ValidationContext<'_>, id: ElementId, property: &StructuralProperty) {
    if property.concurrency_mode == ConcurrencyMode::None || ctx.is_bad_type(&property.type_ref.definition) {
        return;
    }
    if property.type_ref.primitive_kind().is_none() {
        ctx.error_at(
            id,
            ErrorKind::InvalidPropertyType,
            format!("The property '{}' has a concurrency mode but is not of a primitive type.", property.name),
        );
    }
}

fn partner_must_point_back(ctx: &mut ValidationContext<'_>, id: ElementId, nav: &NavigationProperty) {
    let Some(partner) = nav.partner else {
        return;
    };
    let points_back = ctx.model().as_navigation_property(partner).is_some_and(|p| p.partner == Some(id));
    if !points_back {
        ctx.error_at(
            id,
            ErrorKind::InvalidNavigationPropertyPartner,
            format!("The partner of navigation property '{}' does not name it as its own partner.", nav.name),
        );
    }
}

fn correct_type(ctx: &mut ValidationContext<'_>, id: ElementId, nav: &NavigationProperty) {
    if ctx.is_bad_type(&nav.type_ref.definition) {
        return;
    }
    let model = ctx.model();
    let Some(target) = model.navigation_target(id) else {
        ctx.error_at(
            id,
            ErrorKind::InvalidNavigationPropertyType,
            format!("The type of navigation property '{}' must be an entity type or a collection of one.", nav.name),
        );
        return;
    };
    let Some(partner) = nav.partner.and_then(|p| model.as_navigation_property(p)) else {
        return;
    };
    let related = model.inherits_from(target, partner.declaring_type) || model.inherits_from(partner.declaring_type, target);
    if !related {
        ctx.error_at(
            id,
            ErrorKind::InvalidNavigationPropertyType,
            format!(
                "The navigation property '{}' targets '{}', but its partner is declared on '{}'.",
                nav.name,
                model.qualified_name(target),
                model.qualified_name(partner.declaring_type)
            ),
        );
    }
}

fn dependent_properties(nav: &NavigationProperty) -> Option<&[ElementId]> {
    nav.dependent_properties.as_deref().filter(|d| !d.is_empty())
}

/// The nullability of the dependent properties fixes the multiplicity of the
/// principal end: all nullable needs `ZeroOrOne`, none nullable needs `One`,
/// a mix allows either.
fn principal_end_multiplicity(ctx: &mut ValidationContext<'_>, id: ElementId, nav: &NavigationProperty) {
    let Some(dependents) = dependent_properties(nav) else {
        return;
    };
    let model = ctx.model();
    let mut nullability = Vec::with_capacity(dependents.len());
    for &dependent in dependents {
        match model.property(dependent) {
            Some((_, type_ref, _)) if !ctx.is_bad(dependent) && !ctx.is_bad_type(&type_ref.definition) => {
                nullability.push(type_ref.nullable)
            }
            _ => return,
        }
    }

    let all_nullable = nullability.iter().all(|n| *n);
    let none_nullable = nullability.iter().all(|n| !*n);
    // The principal end sits where this property points.
    let principal = EdmModel::multiplicity_of(&nav.type_ref);
    let valid = if all_nullable {
        principal == Multiplicity::ZeroOrOne
    } else if none_nullable {
        principal == Multiplicity::One
    } else {
        principal != Multiplicity::Many
    };
    if !valid {
        let expected = if all_nullable {
            "ZeroOrOne"
        } else if none_nullable {
            "One"
        } else {
            "ZeroOrOne or One"
        };
        ctx.error_at(
            id,
            ErrorKind::InvalidMultiplicityOfPrincipalEnd,
            format!(
                "The principal end of navigation property '{}' has multiplicity {:?}; the dependent properties require {}.",
                nav.name, principal, expected
            ),
        );
    }
}

/// A dependent end whose properties are exactly its key holds at most one
/// entity; otherwise it must be `Many`. A partnerless end counts as `One`.
fn dependent_end_multiplicity(ctx: &mut ValidationContext<'_>, id: ElementId, nav: &NavigationProperty) {
    let Some(dependents) = dependent_properties(nav) else {
        return;
    };
    if ctx.is_bad(nav.declaring_type) {
        return;
    }
    let model = ctx.model();
    let key: HashSet<ElementId> = model.key(nav.declaring_type).into_iter().collect();
    let dependent_set: HashSet<ElementId> = dependents.iter().copied().collect();
    let multiplicity = model.multiplicity(id);
    let valid = if dependent_set == key {
        multiplicity != Multiplicity::Many
    } else {
        multiplicity == Multiplicity::Many
    };
    if !valid {
        ctx.error_at(
            id,
            ErrorKind::InvalidMultiplicityOfDependentEnd,
            format!("The dependent end of navigation property '{}' has an invalid multiplicity {:?}.", nav.name, multiplicity),
        );
    }
}

fn dependent_properties_must_belong_to_dependent_entity(ctx: &mut ValidationContext<'_>, id: ElementId, nav: &NavigationProperty) {
    let Some(dependents) = dependent_properties(nav) else {
        return;
    };
    if ctx.is_bad(nav.declaring_type) {
        return;
    }
    let model = ctx.model();
    let properties = model.properties(nav.declaring_type);
    for &dependent in dependents {
        if !properties.contains(&dependent) || model.as_structural_property(dependent).is_none() {
            ctx.error_at(
                id,
                ErrorKind::DependentPropertiesMustBelongToDependentEntity,
                format!(
                    "The dependent property '{}' of navigation property '{}' is not declared on '{}'.",
                    model.name_of(dependent),
                    nav.name,
                    model.qualified_name(nav.declaring_type)
                ),
            );
        }
    }
}

fn duplicate_dependent_property(ctx: &mut ValidationContext<'_>, id: ElementId, nav: &NavigationProperty) {
    let Some(dependents) = dependent_properties(nav) else {
        return;
    };
    let model = ctx.model();
    let mut seen = HashSet::new();
    for &dependent in dependents {
        if !seen.insert(dependent) {
            ctx.error_at(
                id,
                ErrorKind::DuplicateDependentProperty,
                format!("The dependent property '{}' is listed more than once.", model.name_of(dependent)),
            );
        }
    }
}

fn relationship_constraint_matches_principal_key(ctx: &mut ValidationContext<'_>, id: ElementId, nav: &NavigationProperty) {
    let Some(dependents) = dependent_properties(nav) else {
        return;
    };
    let model = ctx.model();
    let Some(principal) = model.navigation_target(id) else {
        return;
    };
    if ctx.is_bad(principal) {
        return;
    }
    let principal_key = model.key(principal);
    if principal_key.len() != dependents.len() {
        ctx.error_at(
            id,
            ErrorKind::MismatchNumberOfPropertiesInRelationshipConstraint,
            format!(
                "The navigation property '{}' has {} dependent properties but the principal key has {} parts.",
                nav.name,
                dependents.len(),
                principal_key.len()
            ),
        );
        return;
    }
    for (&dependent, &key_part) in dependents.iter().zip(&principal_key) {
        let (Some((_, dependent_type, _)), Some((_, key_type, _))) = (model.property(dependent), model.property(key_part)) else {
            continue;
        };
        if ctx.is_bad_type(&dependent_type.definition) || ctx.is_bad_type(&key_type.definition) {
            continue;
        }
        if !model.is_equivalent(&dependent_type.definition, &key_type.definition) {
            ctx.error_at(
                id,
                ErrorKind::TypeMismatchRelationshipConstraint,
                format!(
                    "The dependent property '{}' does not match the type of principal key property '{}'.",
                    model.name_of(dependent),
                    model.name_of(key_part)
                ),
            );
        }
    }
}

fn dependent_properties_must_be_key_subset(ctx: &mut ValidationContext<'_>, id: ElementId, nav: &NavigationProperty) {
    let Some(dependents) = dependent_properties(nav) else {
        return;
    };
    let model = ctx.model();
    let key = model.key(nav.declaring_type);
    if dependents.iter().any(|d| !key.contains(d)) {
        ctx.error_at(
            id,
            ErrorKind::InvalidPropertyInRelationshipConstraint,
            format!(
                "The dependent properties of navigation property '{}' must be part of the key of '{}' before version 2.0.",
                nav.name,
                model.qualified_name(nav.declaring_type)
            ),
        );
    }
}

fn on_delete_on_both_ends(ctx: &mut ValidationContext<'_>, id: ElementId, nav: &NavigationProperty) {
    if nav.on_delete == OnDeleteAction::None {
        return;
    }
    let partner_has_action = nav
        .partner
        .and_then(|p| ctx.model().as_navigation_property(p))
        .is_some_and(|p| p.on_delete != OnDeleteAction::None);
    if partner_has_action {
        ctx.error_at(
            id,
            ErrorKind::InvalidAction,
            format!("Only one end of the relationship of '{}' may specify an on-delete action.", nav.name),
        );
    }
}

fn on_delete_on_many_end(ctx: &mut ValidationContext<'_>, id: ElementId, nav: &NavigationProperty) {
    if nav.on_delete != OnDeleteAction::None && ctx.model().multiplicity(id) == Multiplicity::Many {
        ctx.error_at(
            id,
            ErrorKind::EndWithManyMultiplicityCannotHaveOperationsSpecified,
            format!("The end of '{}' has multiplicity Many and cannot specify an on-delete action.", nav.name),
        );
    }
}

fn contains_target_not_supported_before_v3(ctx: &mut ValidationContext<'_>, id: ElementId, nav: &NavigationProperty) {
    if nav.contains_target {
        ctx.error_at(
            id,
            ErrorKind::NavigationPropertyContainsTargetNotSupportedBeforeV3,
            format!("The navigation property '{}' contains its target, which is not supported before version 3.0.", nav.name),
        );
    }
}

/// Containment where source and target types are related by inheritance.
fn recursive_containment(model: &EdmModel, id: ElementId, nav: &NavigationProperty) -> Option<bool> {
    if !nav.contains_target {
        return None;
    }
    let target = model.navigation_target(id)?;
    Some(model.inherits_from(target, nav.declaring_type) || model.inherits_from(nav.declaring_type, target))
}

fn recursive_containment_target_must_be_optional(ctx: &mut ValidationContext<'_>, id: ElementId, nav: &NavigationProperty) {
    if recursive_containment(ctx.model(), id, nav) != Some(true) {
        return;
    }
    if EdmModel::multiplicity_of(&nav.type_ref) == Multiplicity::One {
        ctx.error_at(
            id,
            ErrorKind::NavigationPropertyWithRecursiveContainmentTargetMustBeOptional,
            format!("The recursive containment navigation property '{}' must have an optional target.", nav.name),
        );
    }
}

fn recursive_containment_source_must_be_zero_or_one(ctx: &mut ValidationContext<'_>, id: ElementId, nav: &NavigationProperty) {
    if recursive_containment(ctx.model(), id, nav) != Some(true) {
        return;
    }
    if ctx.model().multiplicity(id) != Multiplicity::ZeroOrOne {
        ctx.error_at(
            id,
            ErrorKind::NavigationPropertyWithRecursiveContainmentSourceMustBeFromZeroOrOne,
            format!("The source end of recursive containment navigation property '{}' must be ZeroOrOne.", nav.name),
        );
    }
}

fn non_recursive_containment_source_must_be_one(ctx: &mut ValidationContext<'_>, id: ElementId, nav: &NavigationProperty) {
    if recursive_containment(ctx.model(), id, nav) != Some(false) {
        return;
    }
    if ctx.model().multiplicity(id) != Multiplicity::One {
        ctx.error_at(
            id,
            ErrorKind::NavigationPropertyWithNonRecursiveContainmentSourceMustBeFromOne,
            format!("The source end of containment navigation property '{}' must be One.", nav.name),
        );
    }
}

fn entity_must_not_indirectly_contain_itself(ctx: &mut ValidationContext<'_>, id: ElementId, nav: &NavigationProperty) {
    if recursive_containment(ctx.model(), id, nav) != Some(false) {
        return;
    }
    let Some(target) = ctx.model().navigation_target(id) else {
        return;
    };
    if contains_transitively(ctx.containment(), target, nav.declaring_type) {
        ctx.error_at(
            id,
            ErrorKind::NavigationPropertyEntityMustNotIndirectlyContainItself,
            format!(
                "The navigation property '{}' makes '{}' indirectly contain itself.",
                nav.name,
                ctx.model().qualified_name(nav.declaring_type)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PrimitiveKind, TypeRef};
    use rstest::rstest;

    /// Customer 1 <-> * Order with Order.CustomerId as the dependent property.
    fn orders(dependent_nullable: bool, customer_nullable: bool) -> (EdmModel, ElementId) {
        let mut model = EdmModel::new();
        let customer = model.add_entity_type("NS", "Customer");
        let order = model.add_entity_type("NS", "Order");
        let customer_id = model.add_structural_property(customer, "Id", TypeRef::primitive(PrimitiveKind::Int32, false));
        let order_id = model.add_structural_property(order, "Id", TypeRef::primitive(PrimitiveKind::Int32, false));
        let fk = model.add_structural_property(
            order,
            "CustomerId",
            TypeRef::primitive(PrimitiveKind::Int32, dependent_nullable),
        );
        model.set_key(customer, vec![customer_id]);
        model.set_key(order, vec![order_id]);
        let to_customer = model.add_navigation_property(order, "Customer", TypeRef::schema(customer, customer_nullable));
        let to_orders = model.add_navigation_property(customer, "Orders", TypeRef::collection(TypeRef::schema(order, false)));
        model.set_partners(to_customer, to_orders);
        model.set_dependent_properties(to_customer, vec![fk]);
        (model, to_customer)
    }

    fn run(model: &EdmModel, nav: ElementId, rule: fn(&mut ValidationContext<'_>, ElementId, &NavigationProperty)) -> Vec<ErrorKind> {
        let mut ctx = ValidationContext::new(model);
        if let Some(n) = model.as_navigation_property(nav) {
            rule(&mut ctx, nav, n);
        }
        ctx.take_errors().into_iter().map(|e| e.code).collect()
    }

    #[rstest]
    #[case(true, true, true)] // all nullable, ZeroOrOne principal
    #[case(true, false, false)] // all nullable, One principal
    #[case(false, false, true)] // none nullable, One principal
    #[case(false, true, false)] // none nullable, ZeroOrOne principal
    fn test_principal_end_multiplicity(#[case] dependent_nullable: bool, #[case] customer_nullable: bool, #[case] ok: bool) {
        let (model, nav) = orders(dependent_nullable, customer_nullable);
        let errors = run(&model, nav, principal_end_multiplicity);
        assert_eq!(errors.is_empty(), ok, "{:?}", errors);
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_mixed_nullability_allows_either_single_end(#[case] customer_nullable: bool) {
        let (mut model, nav) = orders(true, customer_nullable);
        let order = model.as_navigation_property(nav).map(|n| n.declaring_type).unwrap_or_default();
        let region = model.add_structural_property(order, "Region", TypeRef::primitive(PrimitiveKind::Int32, false));
        let mut dependents = model.as_navigation_property(nav).and_then(|n| n.dependent_properties.clone()).unwrap_or_default();
        dependents.push(region);
        model.set_dependent_properties(nav, dependents);
        assert!(run(&model, nav, principal_end_multiplicity).is_empty());
    }

    #[test]
    fn test_many_principal_end_is_always_invalid() {
        let (mut model, nav) = orders(true, true);
        if let Some(n) = model.navigation_mut(nav) {
            n.type_ref = TypeRef::collection(n.type_ref.clone());
        }
        assert_eq!(run(&model, nav, principal_end_multiplicity), vec![ErrorKind::InvalidMultiplicityOfPrincipalEnd]);
    }

    #[test]
    fn test_dependent_end_must_be_many_when_not_key() {
        let (model, nav) = orders(false, false);
        assert!(run(&model, nav, dependent_end_multiplicity).is_empty());
        assert_eq!(model.multiplicity(nav), Multiplicity::Many);
    }

    #[rstest]
    #[case(false, vec![ErrorKind::InvalidMultiplicityOfDependentEnd])]
    #[case(true, vec![])]
    fn test_partnerless_dependent_end_is_one(#[case] dependents_are_key: bool, #[case] expected: Vec<ErrorKind>) {
        let (mut model, nav) = orders(false, false);
        if let Some(n) = model.navigation_mut(nav) {
            n.partner = None;
        }
        if dependents_are_key {
            let order = model.as_navigation_property(nav).map(|n| n.declaring_type).unwrap_or_default();
            let key = model.key(order);
            model.set_dependent_properties(nav, key);
        }
        assert_eq!(model.multiplicity(nav), Multiplicity::One);
        assert_eq!(run(&model, nav, dependent_end_multiplicity), expected);
    }

    #[test]
    fn test_constraint_type_mismatch() {
        let (mut model, nav) = orders(false, false);
        let fk = model.as_navigation_property(nav).and_then(|n| n.dependent_properties.clone()).unwrap_or_default()[0];
        if let Some(crate::model::Element::StructuralProperty(p)) = model.element_mut(fk) {
            p.type_ref = TypeRef::primitive(PrimitiveKind::String, false);
        }
        assert_eq!(
            run(&model, nav, relationship_constraint_matches_principal_key),
            vec![ErrorKind::TypeMismatchRelationshipConstraint]
        );
    }

    #[test]
    fn test_dependent_properties_outside_key_before_v2() {
        let (model, nav) = orders(false, false);
        assert_eq!(
            run(&model, nav, dependent_properties_must_be_key_subset),
            vec![ErrorKind::InvalidPropertyInRelationshipConstraint]
        );
    }
}
