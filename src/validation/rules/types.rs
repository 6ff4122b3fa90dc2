//! Structured, entity, complex, row and enum type definitions.
use crate::model::{
    BadTypeReason, ComplexType, Element, ElementId, EntityType, EnumMember, EnumType, PrimitiveKind, RowType,
    StructuredType, TypeDef,
};
use crate::validation::context::ValidationContext;
use crate::validation::error::ErrorKind;
use crate::validation::rule::{Check, ValidationRule};
use std::collections::HashSet;

// --- Structured types ---

pub static BASE_TYPE_MUST_NOT_BE_CYCLIC: ValidationRule =
    ValidationRule::structural("StructuredTypeBaseTypeMustNotBeCyclic", Check::StructuredType(base_type_must_not_be_cyclic));

pub static BASE_TYPE_IS_ACCESSIBLE: ValidationRule =
    ValidationRule::semantic("StructuredTypeBaseTypeMustBeAccessible", Check::StructuredType(base_type_is_accessible));

pub static BASE_TYPE_MUST_BE_SAME_KIND: ValidationRule =
    ValidationRule::semantic("StructuredTypeBaseTypeMustBeSameKindAsDerivedKind", Check::StructuredType(base_type_must_be_same_kind));

pub static PROPERTY_NAME_MUST_NOT_MATCH_TYPE_NAME: ValidationRule = ValidationRule::semantic(
    "StructuredTypeInvalidMemberNameMatchesTypeName",
    Check::StructuredType(property_name_must_not_match_type_name),
);

pub static DECLARING_TYPE_MUST_BE_CORRECT: ValidationRule =
    ValidationRule::semantic("StructuredTypePropertiesDeclaringTypeMustBeCorrect", Check::StructuredType(declaring_type_must_be_correct));

pub static PROPERTY_NAMES_MUST_BE_UNIQUE: ValidationRule =
    ValidationRule::semantic("StructuredTypePropertyNameAlreadyDefined", Check::StructuredType(property_names_must_be_unique));

/// Open types need 1.2 or later.
pub static OPEN_TYPES_NOT_SUPPORTED: ValidationRule =
    ValidationRule::semantic("OpenTypesNotSupported", Check::StructuredType(open_types_not_supported));

// --- Entity types ---

pub static KEY_MISSING: ValidationRule = ValidationRule::semantic("EntityTypeKeyMissingOnEntityType", Check::EntityType(key_missing));

pub static KEY_MUST_NOT_BE_DECLARED_IN_DERIVED_TYPE: ValidationRule =
    ValidationRule::semantic("EntityTypeInvalidKeyKeyDefinedInBaseClass", Check::EntityType(key_declared_in_derived_type));

pub static DUPLICATE_KEY_PROPERTY: ValidationRule =
    ValidationRule::semantic("EntityTypeDuplicatePropertyNameSpecifiedInEntityKey", Check::EntityType(duplicate_key_property));

pub static KEY_MUST_NOT_BE_NULLABLE: ValidationRule =
    ValidationRule::semantic("EntityTypeInvalidKeyNullablePart", Check::EntityType(key_must_not_be_nullable));

pub static KEY_MUST_BE_SCALAR: ValidationRule =
    ValidationRule::semantic("EntityTypeEntityKeyMustBeScalar", Check::EntityType(key_must_be_scalar));

/// Binary key properties need 2.0 or later.
pub static KEY_MUST_NOT_BE_BINARY: ValidationRule =
    ValidationRule::semantic("EntityTypeKeyMustNotBeBinaryBeforeV2", Check::EntityType(key_must_not_be_binary));

pub static KEY_PROPERTY_MUST_BELONG_TO_ENTITY: ValidationRule =
    ValidationRule::semantic("EntityTypeKeyPropertyMustBelongToEntity", Check::EntityType(key_property_must_belong_to_entity));

// --- Complex and row types ---

/// Abstract complex types are rejected in 1.0 only.
pub static COMPLEX_TYPE_INVALID_ABSTRACT: ValidationRule =
    ValidationRule::semantic("ComplexTypeInvalidAbstractComplexType", Check::ComplexType(complex_type_invalid_abstract));

/// Complex base types are rejected in 1.0 only.
pub static COMPLEX_TYPE_INVALID_POLYMORPHIC: ValidationRule =
    ValidationRule::semantic("ComplexTypeInvalidPolymorphicComplexType", Check::ComplexType(complex_type_invalid_polymorphic));

/// Empty complex types are rejected before 3.0.
pub static COMPLEX_TYPE_MUST_CONTAIN_PROPERTIES: ValidationRule =
    ValidationRule::semantic("ComplexTypeMustContainProperties", Check::ComplexType(complex_type_must_contain_properties));

pub static ROW_TYPE_MUST_CONTAIN_PROPERTIES: ValidationRule =
    ValidationRule::semantic("RowTypeMustContainProperties", Check::RowType(row_type_must_contain_properties));

// --- Enums ---

/// Enum types arrived in 3.0.
pub static ENUMS_NOT_SUPPORTED_BEFORE_V3: ValidationRule =
    ValidationRule::semantic("EnumTypeEnumsNotSupportedBeforeV3", Check::EnumType(enums_not_supported_before_v3));

pub static ENUM_MUST_HAVE_INTEGER_UNDERLYING_TYPE: ValidationRule =
    ValidationRule::semantic("EnumMustHaveIntegerUnderlyingType", Check::EnumType(enum_must_have_integer_underlying_type));

pub static ENUM_MEMBER_NAMES_MUST_BE_UNIQUE: ValidationRule =
    ValidationRule::semantic("EnumTypeEnumMemberNameAlreadyDefined", Check::EnumType(enum_member_names_must_be_unique));

pub static ENUM_MEMBER_VALUE_MUST_FIT_UNDERLYING_TYPE: ValidationRule =
    ValidationRule::semantic("EnumMemberValueMustHaveSameTypeAsUnderlyingType", Check::EnumMember(enum_member_value_must_fit));

fn kind_label(element: Option<&Element>) -> &'static str {
    match element {
        Some(Element::EntityType(_)) => "entity",
        Some(Element::ComplexType(_)) => "complex",
        _ => "row",
    }
}

fn base_type_must_not_be_cyclic(ctx: &mut ValidationContext<'_>, id: ElementId, _structure: &StructuredType) {
    if !ctx.cyclic_base_types().contains(&id) {
        return;
    }
    let model = ctx.model();
    let code = match model.element(id) {
        Some(Element::EntityType(_)) => ErrorKind::BadCyclicEntity,
        _ => ErrorKind::BadCyclicComplex,
    };
    ctx.error_at(
        id,
        code,
        format!("The base type of the {} type '{}' is cyclic.", kind_label(model.element(id)), model.qualified_name(id)),
    );
}

fn base_type_is_accessible(ctx: &mut ValidationContext<'_>, id: ElementId, structure: &StructuredType) {
    if let Some(TypeDef::Bad(bad)) = &structure.base_type {
        let code = match bad.reason {
            BadTypeReason::Unresolved => ErrorKind::BadUnresolvedType,
            BadTypeReason::Ambiguous => ErrorKind::BadAmbiguousType,
        };
        ctx.error_at(id, code, format!("The base type '{}' could not be resolved.", bad.name));
    }
}

fn base_type_must_be_same_kind(ctx: &mut ValidationContext<'_>, id: ElementId, structure: &StructuredType) {
    let Some(base) = &structure.base_type else {
        return;
    };
    if ctx.is_bad(id) || ctx.is_bad_type(base) {
        return;
    }
    let model = ctx.model();
    let base_element = base.schema_id().and_then(|b| model.element(b));
    match model.element(id) {
        Some(Element::EntityType(_)) if !matches!(base_element, Some(Element::EntityType(_))) => ctx.error_at(
            id,
            ErrorKind::EntityMustHaveEntityBaseType,
            format!("The base type of entity type '{}' is not an entity type.", model.qualified_name(id)),
        ),
        Some(Element::ComplexType(_)) if !matches!(base_element, Some(Element::ComplexType(_))) => ctx.error_at(
            id,
            ErrorKind::ComplexTypeMustHaveComplexBaseType,
            format!("The base type of complex type '{}' is not a complex type.", model.qualified_name(id)),
        ),
        _ => {}
    }
}

fn property_name_must_not_match_type_name(ctx: &mut ValidationContext<'_>, id: ElementId, structure: &StructuredType) {
    let model = ctx.model();
    let Some(type_name) = model.element(id).and_then(Element::name) else {
        return;
    };
    for &property in &structure.declared_properties {
        if model.name_of(property) == type_name {
            ctx.error_at(
                property,
                ErrorKind::InvalidMemberNameMatchesTypeName,
                format!("The property '{}' has the same name as its declaring type.", type_name),
            );
        }
    }
}

fn declaring_type_must_be_correct(ctx: &mut ValidationContext<'_>, id: ElementId, structure: &StructuredType) {
    let model = ctx.model();
    for &property in &structure.declared_properties {
        let declared_by = model.property(property).map(|(_, _, declaring)| declaring);
        if declared_by != Some(id) {
            ctx.error_at(
                property,
                ErrorKind::DeclaringTypeMustBeCorrect,
                format!(
                    "The property '{}' is listed on '{}' but does not name it as its declaring type.",
                    model.name_of(property),
                    model.qualified_name(id)
                ),
            );
        }
    }
}

fn property_names_must_be_unique(ctx: &mut ValidationContext<'_>, id: ElementId, _structure: &StructuredType) {
    if ctx.is_bad(id) {
        return;
    }
    let model = ctx.model();
    let mut seen = HashSet::new();
    for property in model.properties(id) {
        let name = model.name_of(property);
        if !seen.insert(name) {
            ctx.error_at(
                property,
                ErrorKind::AlreadyDefined,
                format!("Each property name in a type must be unique. '{}' is already defined.", name),
            );
        }
    }
}

fn open_types_not_supported(ctx: &mut ValidationContext<'_>, id: ElementId, structure: &StructuredType) {
    if structure.is_open {
        ctx.error_at(
            id,
            ErrorKind::OpenTypesSupportedOnlyInV12AndAfter,
            format!("The type '{}' is open. Open types are supported only in version 1.2 and after.", ctx.model().qualified_name(id)),
        );
    }
}

fn key_missing(ctx: &mut ValidationContext<'_>, id: ElementId, entity: &EntityType) {
    if ctx.is_bad(id) || entity.structure.base_type.is_some() {
        return;
    }
    if entity.declared_key.as_ref().map_or(true, Vec::is_empty) {
        ctx.error_at(
            id,
            ErrorKind::KeyMissingOnEntityType,
            format!("The entity type '{}' has no key defined.", ctx.model().qualified_name(id)),
        );
    }
}

fn key_declared_in_derived_type(ctx: &mut ValidationContext<'_>, id: ElementId, entity: &EntityType) {
    if entity.declared_key.is_some() && entity.structure.base_type.is_some() {
        ctx.error_at(
            id,
            ErrorKind::InvalidKey,
            format!("The derived entity type '{}' may not declare a key; keys are defined on the root type.", entity.name),
        );
    }
}

fn duplicate_key_property(ctx: &mut ValidationContext<'_>, id: ElementId, entity: &EntityType) {
    let Some(key) = &entity.declared_key else {
        return;
    };
    let model = ctx.model();
    let mut seen = HashSet::new();
    for &part in key {
        let name = model.name_of(part);
        if !seen.insert(name) {
            ctx.error_at(
                id,
                ErrorKind::DuplicatePropertySpecifiedInEntityKey,
                format!("The key of entity type '{}' names the property '{}' more than once.", entity.name, name),
            );
        }
    }
}

fn key_must_not_be_nullable(ctx: &mut ValidationContext<'_>, id: ElementId, entity: &EntityType) {
    let model = ctx.model();
    for part in entity.declared_key.iter().flatten() {
        let Some(property) = model.as_structural_property(*part) else {
            continue;
        };
        if property.type_ref.nullable && !ctx.is_bad(*part) {
            ctx.error_at(
                id,
                ErrorKind::InvalidKey,
                format!("The key property '{}' of entity type '{}' must not be nullable.", property.name, entity.name),
            );
        }
    }
}

fn key_must_be_scalar(ctx: &mut ValidationContext<'_>, id: ElementId, entity: &EntityType) {
    let model = ctx.model();
    for part in entity.declared_key.iter().flatten() {
        let Some(property) = model.as_structural_property(*part) else {
            continue;
        };
        if ctx.is_bad(*part) || ctx.is_bad_type(&property.type_ref.definition) {
            continue;
        }
        if property.type_ref.primitive_kind().is_none() {
            ctx.error_at(
                id,
                ErrorKind::EntityKeyMustBeScalar,
                format!("The key property '{}' of entity type '{}' must be a primitive type.", property.name, entity.name),
            );
        }
    }
}

fn key_must_not_be_binary(ctx: &mut ValidationContext<'_>, id: ElementId, entity: &EntityType) {
    let model = ctx.model();
    for part in entity.declared_key.iter().flatten() {
        let Some(property) = model.as_structural_property(*part) else {
            continue;
        };
        if property.type_ref.primitive_kind() == Some(PrimitiveKind::Binary) {
            ctx.error_at(
                id,
                ErrorKind::EntityKeyMustNotBeBinary,
                format!("The key property '{}' is binary. Binary keys are supported only in version 2.0 and after.", property.name),
            );
        }
    }
}

fn key_property_must_belong_to_entity(ctx: &mut ValidationContext<'_>, id: ElementId, entity: &EntityType) {
    if ctx.is_bad(id) {
        return;
    }
    let model = ctx.model();
    let properties = model.properties(id);
    for &part in entity.declared_key.iter().flatten() {
        let is_structural = model.as_structural_property(part).is_some();
        if !is_structural || !properties.contains(&part) {
            ctx.error_at(
                id,
                ErrorKind::KeyPropertyMustBelongToEntity,
                format!(
                    "The key property '{}' is not a structural property of entity type '{}'.",
                    model.name_of(part),
                    entity.name
                ),
            );
        }
    }
}

fn complex_type_invalid_abstract(ctx: &mut ValidationContext<'_>, id: ElementId, complex: &ComplexType) {
    if complex.structure.is_abstract {
        ctx.error_at(
            id,
            ErrorKind::InvalidAbstractComplexType,
            format!("The complex type '{}' is abstract. Abstract complex types are not supported in version 1.0.", complex.name),
        );
    }
}

fn complex_type_invalid_polymorphic(ctx: &mut ValidationContext<'_>, id: ElementId, complex: &ComplexType) {
    if complex.structure.base_type.is_some() {
        ctx.error_at(
            id,
            ErrorKind::InvalidPolymorphicComplexType,
            format!("The complex type '{}' has a base type. Complex type inheritance is not supported in version 1.0.", complex.name),
        );
    }
}

fn complex_type_must_contain_properties(ctx: &mut ValidationContext<'_>, id: ElementId, complex: &ComplexType) {
    if !ctx.is_bad(id) && ctx.model().properties(id).is_empty() {
        ctx.error_at(
            id,
            ErrorKind::ComplexTypeMustHaveProperties,
            format!("The complex type '{}' must have at least one property.", complex.name),
        );
    }
}

fn row_type_must_contain_properties(ctx: &mut ValidationContext<'_>, id: ElementId, row: &RowType) {
    if row.structure.declared_properties.is_empty() {
        ctx.error_at(id, ErrorKind::RowTypeMustHaveProperties, "A row type must have at least one property.");
    }
}

fn enums_not_supported_before_v3(ctx: &mut ValidationContext<'_>, id: ElementId, enum_type: &EnumType) {
    ctx.error_at(
        id,
        ErrorKind::EnumsNotSupportedBeforeV3,
        format!("The enum type '{}' is not supported before version 3.0.", enum_type.name),
    );
}

fn enum_must_have_integer_underlying_type(ctx: &mut ValidationContext<'_>, id: ElementId, enum_type: &EnumType) {
    if !enum_type.underlying_type.is_integral() {
        ctx.error_at(
            id,
            ErrorKind::EnumMustHaveIntegerUnderlyingType,
            format!("The underlying type '{}' of enum '{}' is not an integer type.", enum_type.underlying_type, enum_type.name),
        );
    }
}

fn enum_member_names_must_be_unique(ctx: &mut ValidationContext<'_>, _id: ElementId, enum_type: &EnumType) {
    let model = ctx.model();
    let mut seen = HashSet::new();
    for &member in &enum_type.members {
        let name = model.name_of(member);
        if !seen.insert(name) {
            ctx.error_at(
                member,
                ErrorKind::DuplicateEnumMember,
                format!("The enum '{}' already has a member named '{}'.", enum_type.name, name),
            );
        }
    }
}

fn enum_member_value_must_fit(ctx: &mut ValidationContext<'_>, id: ElementId, member: &EnumMember) {
    let Some(Element::EnumType(enum_type)) = ctx.model().element(member.declaring_type) else {
        return;
    };
    let Some((min, max)) = enum_type.underlying_type.integer_range() else {
        return;
    };
    if member.value < min || member.value > max {
        ctx.error_at(
            id,
            ErrorKind::EnumMemberTypeMustMatchEnumUnderlyingType,
            format!(
                "The value {} of member '{}' does not fit the underlying type '{}'.",
                member.value, member.name, enum_type.underlying_type
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdmModel, TypeRef};
    use crate::validation::{RuleSet, Validation};
    use rstest::rstest;

    fn run(model: &EdmModel, rules: &[&ValidationRule]) -> Vec<ErrorKind> {
        let set = RuleSet::new(rules.iter().map(|r| **r));
        Validation::new(model, &set).errors().map(|e| e.code).collect()
    }

    fn product(key_type: TypeRef) -> (EdmModel, ElementId) {
        let mut model = EdmModel::new();
        let product = model.add_entity_type("Catalog", "Product");
        let sku = model.add_structural_property(product, "Sku", key_type);
        model.set_key(product, vec![sku]);
        (model, product)
    }

    #[rstest]
    #[case(TypeRef::primitive(PrimitiveKind::String, false), vec![])]
    #[case(TypeRef::primitive(PrimitiveKind::String, true), vec![ErrorKind::InvalidKey])]
    #[case(TypeRef::primitive(PrimitiveKind::Binary, false), vec![ErrorKind::EntityKeyMustNotBeBinary])]
    fn test_key_property_shape(#[case] key_type: TypeRef, #[case] expected: Vec<ErrorKind>) {
        let (model, _) = product(key_type);
        let codes = run(&model, &[&KEY_MISSING, &KEY_MUST_NOT_BE_NULLABLE, &KEY_MUST_NOT_BE_BINARY, &KEY_MUST_BE_SCALAR]);
        assert_eq!(codes, expected);
    }

    #[test]
    fn test_complex_key_is_not_scalar() {
        let mut model = EdmModel::new();
        let address = model.add_complex_type("Catalog", "Address");
        model.add_structural_property(address, "City", TypeRef::primitive(PrimitiveKind::String, true));
        let warehouse = model.add_entity_type("Catalog", "Warehouse");
        let location = model.add_structural_property(warehouse, "Location", TypeRef::schema(address, false));
        model.set_key(warehouse, vec![location]);
        assert_eq!(run(&model, &[&KEY_MUST_BE_SCALAR]), vec![ErrorKind::EntityKeyMustBeScalar]);
    }

    #[test]
    fn test_derived_type_inherits_key() {
        let (mut model, product) = product(TypeRef::primitive(PrimitiveKind::Int32, false));
        let book = model.add_entity_type("Catalog", "Book");
        model.set_base_type(book, TypeDef::Schema(product));
        assert!(run(&model, &[&KEY_MISSING, &KEY_MUST_NOT_BE_DECLARED_IN_DERIVED_TYPE]).is_empty());

        let isbn = model.add_structural_property(book, "Isbn", TypeRef::primitive(PrimitiveKind::String, false));
        model.set_key(book, vec![isbn]);
        assert_eq!(run(&model, &[&KEY_MUST_NOT_BE_DECLARED_IN_DERIVED_TYPE]), vec![ErrorKind::InvalidKey]);
    }

    #[test]
    fn test_entity_base_must_be_entity() {
        let mut model = EdmModel::new();
        let address = model.add_complex_type("Catalog", "Address");
        let store = model.add_entity_type("Catalog", "Store");
        model.set_base_type(store, TypeDef::Schema(address));
        assert_eq!(run(&model, &[&BASE_TYPE_MUST_BE_SAME_KIND]), vec![ErrorKind::EntityMustHaveEntityBaseType]);
    }

    #[test]
    fn test_cyclic_base_suppresses_kind_check() {
        let mut model = EdmModel::new();
        let a = model.add_complex_type("Catalog", "A");
        let b = model.add_complex_type("Catalog", "B");
        model.set_base_type(a, TypeDef::Schema(b));
        model.set_base_type(b, TypeDef::Schema(a));
        let codes = run(&model, &[&BASE_TYPE_MUST_NOT_BE_CYCLIC, &BASE_TYPE_MUST_BE_SAME_KIND]);
        assert_eq!(codes, vec![ErrorKind::BadCyclicComplex, ErrorKind::BadCyclicComplex]);
    }

    #[test]
    fn test_unresolved_base_type() {
        let mut model = EdmModel::new();
        let store = model.add_entity_type("Catalog", "Store");
        model.set_base_type(store, TypeRef::unresolved("Catalog.Missing", false).definition);
        assert_eq!(run(&model, &[&BASE_TYPE_IS_ACCESSIBLE, &BASE_TYPE_MUST_BE_SAME_KIND]), vec![ErrorKind::BadUnresolvedType]);
    }

    #[test]
    fn test_inherited_property_names_collide() {
        let (mut model, product) = product(TypeRef::primitive(PrimitiveKind::Int32, false));
        let book = model.add_entity_type("Catalog", "Book");
        model.set_base_type(book, TypeDef::Schema(product));
        model.add_structural_property(book, "Sku", TypeRef::primitive(PrimitiveKind::String, true));
        assert_eq!(run(&model, &[&PROPERTY_NAMES_MUST_BE_UNIQUE]), vec![ErrorKind::AlreadyDefined]);
    }

    #[rstest]
    #[case(PrimitiveKind::Byte, 255, vec![])]
    #[case(PrimitiveKind::Byte, 256, vec![ErrorKind::EnumMemberTypeMustMatchEnumUnderlyingType])]
    #[case(PrimitiveKind::SByte, -129, vec![ErrorKind::EnumMemberTypeMustMatchEnumUnderlyingType])]
    #[case(PrimitiveKind::Int64, i64::MIN, vec![])]
    fn test_enum_member_range(#[case] underlying: PrimitiveKind, #[case] value: i64, #[case] expected: Vec<ErrorKind>) {
        let mut model = EdmModel::new();
        let level = model.add_enum_type("Catalog", "Level", underlying);
        model.add_enum_member(level, "Max", value);
        assert_eq!(run(&model, &[&ENUM_MEMBER_VALUE_MUST_FIT_UNDERLYING_TYPE]), expected);
    }

    #[test]
    fn test_enum_underlying_type_and_duplicates() {
        let mut model = EdmModel::new();
        let level = model.add_enum_type("Catalog", "Level", PrimitiveKind::Double);
        model.add_enum_member(level, "Low", 0);
        model.add_enum_member(level, "Low", 1);
        let codes = run(&model, &[&ENUM_MUST_HAVE_INTEGER_UNDERLYING_TYPE, &ENUM_MEMBER_NAMES_MUST_BE_UNIQUE]);
        assert_eq!(codes, vec![ErrorKind::EnumMustHaveIntegerUnderlyingType, ErrorKind::DuplicateEnumMember]);
    }

    #[test]
    fn test_version_one_complex_types() {
        let mut model = EdmModel::new();
        let base = model.add_complex_type("Catalog", "Base");
        let derived = model.add_complex_type("Catalog", "Derived");
        model.set_base_type(derived, TypeDef::Schema(base));
        if let Some(structure) = model.structure_mut(base) {
            structure.is_abstract = true;
        }
        let codes = run(&model, &[&COMPLEX_TYPE_INVALID_ABSTRACT, &COMPLEX_TYPE_INVALID_POLYMORPHIC, &COMPLEX_TYPE_MUST_CONTAIN_PROPERTIES]);
        assert_eq!(
            codes,
            vec![
                ErrorKind::InvalidAbstractComplexType,
                ErrorKind::ComplexTypeMustHaveProperties,
                ErrorKind::InvalidPolymorphicComplexType,
                ErrorKind::ComplexTypeMustHaveProperties,
            ]
        );
    }
}
