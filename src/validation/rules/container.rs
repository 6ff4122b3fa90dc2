//! Entity containers and the entity sets they hold.
use crate::model::{BadTypeReason, Element, ElementId, EntityContainer, EntitySet, TypeDef};
use crate::validation::context::ValidationContext;
use crate::validation::error::ErrorKind;
use crate::validation::rule::{Check, ValidationRule};
use std::collections::HashSet;

pub static ELEMENT_MUST_NOT_HAVE_KIND_OF_NONE: ValidationRule = ValidationRule::structural(
    "EntityContainerElementMustNotHaveKindOfNone",
    Check::EntityContainer(element_must_not_have_kind_of_none),
);

pub static DUPLICATE_MEMBER_NAME: ValidationRule =
    ValidationRule::semantic("EntityContainerDuplicateEntityContainerMemberName", Check::EntityContainer(duplicate_member_name));

pub static SET_ELEMENT_TYPE_IS_ACCESSIBLE: ValidationRule =
    ValidationRule::semantic("EntitySetElementTypeIsAccessible", Check::EntitySet(element_type_is_accessible));

pub static SET_ELEMENT_TYPE_MUST_BE_ENTITY_TYPE: ValidationRule =
    ValidationRule::semantic("EntitySetElementTypeMustBeEntityType", Check::EntitySet(element_type_must_be_entity_type));

pub static SET_TYPE_HAS_NO_KEYS: ValidationRule =
    ValidationRule::semantic("EntitySetTypeHasNoKeys", Check::EntitySet(type_has_no_keys));

pub static SET_MUST_BELONG_TO_CONTAINER: ValidationRule =
    ValidationRule::semantic("EntitySetMustBeReachableFromContainer", Check::EntitySet(must_belong_to_container));

pub static SET_NAVIGATION_MAPPING_MUST_POINT_TO_VALID_TARGET: ValidationRule = ValidationRule::semantic(
    "EntitySetNavigationPropertyMappingMustPointToValidTargetForProperty",
    Check::EntitySet(navigation_mapping_must_point_to_valid_target),
);

/// When the target set maps the partner property, it must map it back to this set.
pub static SET_NAVIGATION_MAPPING_MUST_BE_BIDIRECTIONAL: ValidationRule = ValidationRule::semantic(
    "EntitySetNavigationMappingMustBeBidirectional",
    Check::EntitySet(navigation_mapping_must_be_bidirectional),
);

/// At most one containment navigation mapping in the container may target a set.
pub static SET_CAN_ONLY_BE_CONTAINED_ONCE: ValidationRule = ValidationRule::semantic(
    "EntitySetCanOnlyBeContainedByASingleNavigationProperty",
    Check::EntitySet(can_only_be_contained_once),
);

/// A recursive containment mapping targets the set it is declared on.
pub static SET_RECURSIVE_CONTAINMENT_MUST_POINT_BACK: ValidationRule = ValidationRule::semantic(
    "EntitySetRecursiveNavigationPropertyMappingsMustPointBackToSourceEntitySet",
    Check::EntitySet(recursive_containment_must_point_back),
);

fn element_must_not_have_kind_of_none(ctx: &mut ValidationContext<'_>, id: ElementId, container: &EntityContainer) {
    for &member in &container.elements {
        let ok = ctx.model().element(member).is_some_and(Element::is_container_member);
        if !ok {
            ctx.error_at(
                id,
                ErrorKind::EntityContainerElementMustNotHaveKindOfNone,
                format!(
                    "The entity container '{}' lists '{}', which is neither an entity set nor a function import.",
                    container.name,
                    ctx.model().qualified_name(member)
                ),
            );
        }
    }
}

/// Sets and imports share one name scope. Imports may be overloaded; every
/// import with an equivalent same-named sibling is a duplicate.
fn duplicate_member_name(ctx: &mut ValidationContext<'_>, _id: ElementId, container: &EntityContainer) {
    let model = ctx.model();
    let mut set_names = HashSet::new();
    let mut import_names = HashSet::new();
    let imports: Vec<ElementId> = container
        .elements
        .iter()
        .copied()
        .filter(|m| matches!(model.element(*m), Some(Element::FunctionImport(_))))
        .collect();

    for &member in &container.elements {
        let Some(element) = model.element(member) else {
            continue;
        };
        let Some(name) = element.name() else {
            continue;
        };
        let duplicate = match element {
            Element::FunctionImport(_) => {
                import_names.insert(name);
                set_names.contains(name)
                    || imports
                        .iter()
                        .any(|&other| other != member && model.name_of(other) == name && model.signatures_equivalent(other, member))
            }
            _ => !set_names.insert(name) || import_names.contains(name),
        };
        if duplicate {
            ctx.error_at(
                member,
                ErrorKind::DuplicateEntityContainerMemberName,
                format!("The entity container '{}' already has a member named '{}'.", container.name, name),
            );
        }
    }
}

fn element_type_is_accessible(ctx: &mut ValidationContext<'_>, id: ElementId, set: &EntitySet) {
    if let TypeDef::Bad(bad) = &set.element_type {
        let code = match bad.reason {
            BadTypeReason::Unresolved => ErrorKind::BadUnresolvedType,
            BadTypeReason::Ambiguous => ErrorKind::BadAmbiguousType,
        };
        ctx.error_at(id, code, format!("The type '{}' of entity set '{}' could not be resolved.", bad.name, set.name));
    }
}

fn element_type_must_be_entity_type(ctx: &mut ValidationContext<'_>, id: ElementId, set: &EntitySet) {
    if ctx.is_bad_type(&set.element_type) {
        return;
    }
    let is_entity = set.element_type.schema_id().and_then(|t| ctx.model().as_entity_type(t)).is_some();
    if !is_entity {
        ctx.error_at(
            id,
            ErrorKind::EntitySetElementTypeIsNotEntityType,
            format!("The element type of entity set '{}' is not an entity type.", set.name),
        );
    }
}

fn type_has_no_keys(ctx: &mut ValidationContext<'_>, id: ElementId, set: &EntitySet) {
    let Some(entity_type) = set.element_type.schema_id().filter(|t| ctx.model().as_entity_type(*t).is_some()) else {
        return;
    };
    if ctx.is_bad(entity_type) {
        return;
    }
    if ctx.model().key(entity_type).is_empty() {
        ctx.error_at(
            id,
            ErrorKind::EntitySetTypeHasNoKeys,
            format!(
                "The entity set '{}' is based on type '{}' that has no keys defined.",
                set.name,
                ctx.model().qualified_name(entity_type)
            ),
        );
    }
}

fn must_belong_to_container(ctx: &mut ValidationContext<'_>, id: ElementId, set: &EntitySet) {
    let listed = ctx.model().as_container(set.container).is_some_and(|c| c.elements.contains(&id));
    if !listed {
        ctx.error_at(
            id,
            ErrorKind::EntitySetNotReachableFromContainer,
            format!("The entity set '{}' is not reachable from its entity container.", set.name),
        );
    }
}

fn set_entity_type(ctx: &ValidationContext<'_>, set: ElementId) -> Option<ElementId> {
    let id = ctx.model().as_entity_set(set)?.element_type.schema_id()?;
    ctx.model().as_entity_type(id).map(|_| id)
}

fn navigation_mapping_must_point_to_valid_target(ctx: &mut ValidationContext<'_>, id: ElementId, set: &EntitySet) {
    let model = ctx.model();
    for mapping in &set.navigation_targets {
        let (Some(target), Some(target_set_type)) =
            (model.navigation_target(mapping.navigation_property), set_entity_type(ctx, mapping.target_set))
        else {
            continue;
        };
        let related = model.inherits_from(target_set_type, target) || model.inherits_from(target, target_set_type);
        if !related {
            ctx.error_at(
                id,
                ErrorKind::EntitySetNavigationPropertyMappingMustPointToValidTargetForProperty,
                format!(
                    "The navigation property '{}' of entity set '{}' is mapped to a set of type '{}', which is not valid for the property.",
                    model.name_of(mapping.navigation_property),
                    set.name,
                    model.qualified_name(target_set_type)
                ),
            );
        }
    }
}

fn navigation_mapping_must_be_bidirectional(ctx: &mut ValidationContext<'_>, id: ElementId, set: &EntitySet) {
    let model = ctx.model();
    for mapping in &set.navigation_targets {
        let Some(partner) = model.as_navigation_property(mapping.navigation_property).and_then(|n| n.partner) else {
            continue;
        };
        let opposite = model.find_navigation_target(mapping.target_set, partner);
        if opposite.is_some_and(|o| o != id) {
            ctx.error_at(
                id,
                ErrorKind::EntitySetNavigationMappingMustBeBidirectional,
                format!(
                    "The mapping of navigation property '{}' of entity set '{}' is not matched by its partner's mapping.",
                    model.name_of(mapping.navigation_property),
                    set.name
                ),
            );
        }
    }
}

fn can_only_be_contained_once(ctx: &mut ValidationContext<'_>, id: ElementId, set: &EntitySet) {
    let model = ctx.model();
    let Some(container) = model.as_container(set.container) else {
        return;
    };
    let containing = container
        .elements
        .iter()
        .filter_map(|m| model.as_entity_set(*m))
        .flat_map(|s| s.navigation_targets.iter())
        .filter(|m| m.target_set == id)
        .filter(|m| model.as_navigation_property(m.navigation_property).is_some_and(|n| n.contains_target))
        .count();
    if containing > 1 {
        ctx.error_at(
            id,
            ErrorKind::EntitySetCanOnlyBeContainedByASingleNavigationProperty,
            format!("The entity set '{}' is contained by more than one navigation property.", set.name),
        );
    }
}

fn recursive_containment_must_point_back(ctx: &mut ValidationContext<'_>, id: ElementId, set: &EntitySet) {
    let model = ctx.model();
    for mapping in &set.navigation_targets {
        let Some(nav) = model.as_navigation_property(mapping.navigation_property) else {
            continue;
        };
        let Some(target) = model.navigation_target(mapping.navigation_property) else {
            continue;
        };
        let recursive = model.inherits_from(target, nav.declaring_type) || model.inherits_from(nav.declaring_type, target);
        if nav.contains_target && recursive && mapping.target_set != id {
            ctx.error_at(
                id,
                ErrorKind::EntitySetRecursiveNavigationPropertyMappingsMustPointBackToSourceEntitySet,
                format!(
                    "The recursive containment navigation property '{}' of entity set '{}' must map back to the same set.",
                    nav.name, set.name
                ),
            );
        }
    }
}
