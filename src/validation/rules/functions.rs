//! Functions, function imports and their parameters.
use crate::model::{EdmModel, ElementId, Function, FunctionImport, FunctionSignature, ParameterMode, TypeDef, TypeKind, TypeRef};
use crate::validation::context::ValidationContext;
use crate::validation::error::ErrorKind;
use crate::validation::rule::{Check, ValidationRule};
use std::collections::HashSet;

pub static PARAMETER_NAMES_MUST_BE_UNIQUE: ValidationRule =
    ValidationRule::semantic("FunctionBaseParameterNameAlreadyDefinedDuplicate", Check::FunctionBase(parameter_names_must_be_unique));

/// Model functions arrived in 2.0.
pub static FUNCTIONS_NOT_SUPPORTED_BEFORE_V2: ValidationRule =
    ValidationRule::semantic("FunctionsNotSupportedBeforeV2", Check::Function(functions_not_supported_before_v2));

pub static ONLY_INPUT_PARAMETERS_ALLOWED: ValidationRule =
    ValidationRule::semantic("FunctionOnlyInputParametersAllowedInFunctions", Check::Function(only_input_parameters_allowed));

/// In 1.0 an import returns nothing or a collection of primitive, complex or entity values.
pub static IMPORT_UNSUPPORTED_RETURN_TYPE_V1: ValidationRule =
    ValidationRule::semantic("FunctionImportUnsupportedReturnTypeV1", Check::FunctionImport(unsupported_return_type_v1));

/// From 1.1 on, single values and enums are also accepted.
pub static IMPORT_UNSUPPORTED_RETURN_TYPE_AFTER_V1: ValidationRule =
    ValidationRule::semantic("FunctionImportUnsupportedReturnTypeAfterV1", Check::FunctionImport(unsupported_return_type_after_v1));

pub static IMPORT_RETURNS_ENTITIES_WITHOUT_ENTITY_SET: ValidationRule = ValidationRule::semantic(
    "FunctionImportReturnEntitiesButDoesNotSpecifyEntitySet",
    Check::FunctionImport(returns_entities_without_entity_set),
);

pub static IMPORT_ENTITY_SET_WITHOUT_ENTITY_RETURN: ValidationRule = ValidationRule::semantic(
    "FunctionImportEntitySetExpressionIsInvalid",
    Check::FunctionImport(entity_set_without_entity_return),
);

pub static IMPORT_ENTITY_TYPE_MUST_MATCH_ENTITY_SET: ValidationRule = ValidationRule::semantic(
    "FunctionImportEntityTypeDoesNotMatchEntitySet",
    Check::FunctionImport(entity_type_must_match_entity_set),
);

/// Before 3.0 import parameters are primitive or complex, or collections of those.
pub static IMPORT_PARAMETERS_INCORRECT_TYPE_BEFORE_V3: ValidationRule = ValidationRule::semantic(
    "FunctionImportParametersIncorrectTypeBeforeV3",
    Check::FunctionImport(parameters_incorrect_type_before_v3),
);

pub static IMPORT_SIDE_EFFECTING_NOT_SUPPORTED_BEFORE_V3: ValidationRule = ValidationRule::semantic(
    "FunctionImportIsSideEffectingNotSupportedBeforeV3",
    Check::FunctionImport(side_effecting_not_supported_before_v3),
);

pub static IMPORT_COMPOSABLE_NOT_SUPPORTED_BEFORE_V3: ValidationRule = ValidationRule::semantic(
    "FunctionImportIsComposableNotSupportedBeforeV3",
    Check::FunctionImport(composable_not_supported_before_v3),
);

pub static IMPORT_BINDABLE_NOT_SUPPORTED_BEFORE_V3: ValidationRule = ValidationRule::semantic(
    "FunctionImportIsBindableNotSupportedBeforeV3",
    Check::FunctionImport(bindable_not_supported_before_v3),
);

pub static IMPORT_COMPOSABLE_CANNOT_BE_SIDE_EFFECTING: ValidationRule = ValidationRule::semantic(
    "ComposableFunctionImportCannotBeSideEffecting",
    Check::FunctionImport(composable_cannot_be_side_effecting),
);

pub static IMPORT_BINDABLE_MUST_HAVE_PARAMETERS: ValidationRule = ValidationRule::semantic(
    "BindableFunctionImportMustHaveParameters",
    Check::FunctionImport(bindable_must_have_parameters),
);

pub static IMPORT_PARAMETER_MODE_MUST_NOT_BE_NONE: ValidationRule = ValidationRule::semantic(
    "FunctionImportParametersCannotHaveModeOfNone",
    Check::FunctionImport(parameter_mode_must_not_be_none),
);

fn parameter_names_must_be_unique(ctx: &mut ValidationContext<'_>, id: ElementId, signature: &FunctionSignature) {
    let model = ctx.model();
    let mut seen = HashSet::new();
    for &parameter in &signature.parameters {
        let name = model.name_of(parameter);
        if !seen.insert(name) {
            ctx.error_at(
                id,
                ErrorKind::AlreadyDefined,
                format!("The function '{}' declares the parameter '{}' more than once.", signature.name, name),
            );
        }
    }
}

fn functions_not_supported_before_v2(ctx: &mut ValidationContext<'_>, id: ElementId, function: &Function) {
    ctx.error_at(
        id,
        ErrorKind::FunctionsNotSupportedBeforeV2,
        format!("The function '{}' is not supported before version 2.0.", function.signature.name),
    );
}

fn only_input_parameters_allowed(ctx: &mut ValidationContext<'_>, id: ElementId, function: &Function) {
    let model = ctx.model();
    for &parameter in &function.signature.parameters {
        if model.as_parameter(parameter).is_some_and(|p| p.mode != ParameterMode::In) {
            ctx.error_at(
                id,
                ErrorKind::OnlyInputParametersAllowedInFunctions,
                format!(
                    "The parameter '{}' of function '{}' is not an input parameter.",
                    model.name_of(parameter),
                    function.signature.name
                ),
            );
        }
    }
}

/// The entity type an import returns, directly or as a collection.
fn returned_entity_type(model: &EdmModel, return_type: &TypeRef) -> Option<ElementId> {
    let definition = match &return_type.definition {
        TypeDef::Collection(element) => &element.definition,
        other => other,
    };
    let id = definition.schema_id()?;
    model.as_entity_type(id).map(|_| id)
}

fn report_unsupported_return_type(ctx: &mut ValidationContext<'_>, id: ElementId, import: &FunctionImport) {
    ctx.error_at(
        id,
        ErrorKind::FunctionImportUnsupportedReturnType,
        format!("The return type of function import '{}' is not supported.", import.signature.name),
    );
}

/// Version 1.0 imports return nothing or a collection of primitive, complex or entity values.
fn unsupported_return_type_v1(ctx: &mut ValidationContext<'_>, id: ElementId, import: &FunctionImport) {
    let Some(return_type) = &import.signature.return_type else {
        return;
    };
    if ctx.is_bad_type(&return_type.definition) {
        return;
    }
    let model = ctx.model();
    let supported = match &return_type.definition {
        TypeDef::Collection(element) => matches!(
            model.type_kind(&element.definition),
            TypeKind::Primitive | TypeKind::Complex | TypeKind::Entity
        ),
        _ => false,
    };
    if !supported {
        report_unsupported_return_type(ctx, id, import);
    }
}

fn unsupported_return_type_after_v1(ctx: &mut ValidationContext<'_>, id: ElementId, import: &FunctionImport) {
    let Some(return_type) = &import.signature.return_type else {
        return;
    };
    if ctx.is_bad_type(&return_type.definition) {
        return;
    }
    let model = ctx.model();
    let allowed = |definition: &TypeDef| {
        matches!(
            model.type_kind(definition),
            TypeKind::Primitive | TypeKind::Complex | TypeKind::Entity | TypeKind::Enum
        )
    };
    let supported = match &return_type.definition {
        TypeDef::Collection(element) => allowed(&element.definition),
        other => allowed(other),
    };
    if !supported {
        report_unsupported_return_type(ctx, id, import);
    }
}

fn returns_entities_without_entity_set(ctx: &mut ValidationContext<'_>, id: ElementId, import: &FunctionImport) {
    let Some(return_type) = &import.signature.return_type else {
        return;
    };
    if import.entity_set.is_none() && returned_entity_type(ctx.model(), return_type).is_some() {
        ctx.error_at(
            id,
            ErrorKind::FunctionImportReturnsEntitiesButDoesNotSpecifyEntitySet,
            format!("The function import '{}' returns entities but does not specify an entity set.", import.signature.name),
        );
    }
}

fn entity_set_without_entity_return(ctx: &mut ValidationContext<'_>, id: ElementId, import: &FunctionImport) {
    if import.entity_set.is_none() {
        return;
    }
    let returns_entities = import
        .signature
        .return_type
        .as_ref()
        .is_some_and(|r| returned_entity_type(ctx.model(), r).is_some() || ctx.is_bad_type(&r.definition));
    if !returns_entities {
        ctx.error_at(
            id,
            ErrorKind::FunctionImportSpecifiesEntitySetButDoesNotReturnEntityType,
            format!("The function import '{}' specifies an entity set but does not return entities.", import.signature.name),
        );
    }
}

fn entity_type_must_match_entity_set(ctx: &mut ValidationContext<'_>, id: ElementId, import: &FunctionImport) {
    let model = ctx.model();
    let (Some(set), Some(return_type)) = (import.entity_set, import.signature.return_type.as_ref()) else {
        return;
    };
    let Some(returned) = returned_entity_type(model, return_type) else {
        return;
    };
    let Some(set_type) = model
        .as_entity_set(set)
        .and_then(|s| s.element_type.schema_id())
        .filter(|t| model.as_entity_type(*t).is_some())
    else {
        return;
    };
    if !model.inherits_from(returned, set_type) {
        ctx.error_at(
            id,
            ErrorKind::FunctionImportEntityTypeDoesNotMatchEntitySet,
            format!(
                "The function import '{}' returns '{}', which does not derive from the type of entity set '{}'.",
                import.signature.name,
                model.qualified_name(returned),
                model.name_of(set)
            ),
        );
    }
}

fn parameters_incorrect_type_before_v3(ctx: &mut ValidationContext<'_>, id: ElementId, import: &FunctionImport) {
    let model = ctx.model();
    for &parameter in &import.signature.parameters {
        let Some(p) = model.as_parameter(parameter) else {
            continue;
        };
        if ctx.is_bad_type(&p.type_ref.definition) {
            continue;
        }
        let kind = |definition: &TypeDef| model.type_kind(definition);
        let supported = match &p.type_ref.definition {
            TypeDef::Collection(element) => matches!(kind(&element.definition), TypeKind::Primitive | TypeKind::Complex),
            other => matches!(kind(other), TypeKind::Primitive | TypeKind::Complex),
        };
        if !supported {
            ctx.error_at(
                id,
                ErrorKind::FunctionImportParameterIncorrectType,
                format!(
                    "The parameter '{}' of function import '{}' must be of a primitive or complex type before version 3.0.",
                    p.name, import.signature.name
                ),
            );
        }
    }
}

fn side_effecting_not_supported_before_v3(ctx: &mut ValidationContext<'_>, id: ElementId, import: &FunctionImport) {
    if import.is_side_effecting {
        ctx.error_at(
            id,
            ErrorKind::FunctionImportSideEffectingNotSupportedBeforeV3,
            format!("The side-effecting flag of '{}' is not supported before version 3.0.", import.signature.name),
        );
    }
}

fn composable_not_supported_before_v3(ctx: &mut ValidationContext<'_>, id: ElementId, import: &FunctionImport) {
    if import.is_composable {
        ctx.error_at(
            id,
            ErrorKind::FunctionImportComposableNotSupportedBeforeV3,
            format!("The composable flag of '{}' is not supported before version 3.0.", import.signature.name),
        );
    }
}

fn bindable_not_supported_before_v3(ctx: &mut ValidationContext<'_>, id: ElementId, import: &FunctionImport) {
    if import.is_bindable {
        ctx.error_at(
            id,
            ErrorKind::FunctionImportBindableNotSupportedBeforeV3,
            format!("The bindable flag of '{}' is not supported before version 3.0.", import.signature.name),
        );
    }
}

fn composable_cannot_be_side_effecting(ctx: &mut ValidationContext<'_>, id: ElementId, import: &FunctionImport) {
    if import.is_composable && import.is_side_effecting {
        ctx.error_at(
            id,
            ErrorKind::ComposableFunctionImportCannotBeSideEffecting,
            format!("The function import '{}' is composable and must not be side-effecting.", import.signature.name),
        );
    }
}

fn bindable_must_have_parameters(ctx: &mut ValidationContext<'_>, id: ElementId, import: &FunctionImport) {
    if import.is_bindable && import.signature.parameters.is_empty() {
        ctx.error_at(
            id,
            ErrorKind::BindableFunctionImportMustHaveParameters,
            format!("The bindable function import '{}' must have at least one parameter.", import.signature.name),
        );
    }
}

fn parameter_mode_must_not_be_none(ctx: &mut ValidationContext<'_>, _id: ElementId, import: &FunctionImport) {
    let model = ctx.model();
    for &parameter in &import.signature.parameters {
        if model.as_parameter(parameter).is_some_and(|p| p.mode == ParameterMode::None) {
            ctx.error_at(
                parameter,
                ErrorKind::InvalidFunctionImportParameterMode,
                format!(
                    "The parameter '{}' of function import '{}' has no mode.",
                    model.name_of(parameter),
                    import.signature.name
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, PrimitiveKind};
    use crate::validation::{RuleSet, Validation};
    use rstest::rstest;

    struct Fixture {
        model: EdmModel,
        container: ElementId,
        order: ElementId,
        orders: ElementId,
    }

    fn fixture() -> Fixture {
        let mut model = EdmModel::new();
        let order = model.add_entity_type("Shop", "Order");
        let id = model.add_structural_property(order, "Id", TypeRef::primitive(PrimitiveKind::Int32, false));
        model.set_key(order, vec![id]);
        let container = model.add_entity_container("Shop", "Backend");
        let orders = model.add_entity_set(container, "Orders", TypeDef::Schema(order));
        Fixture { model, container, order, orders }
    }

    fn import_mut(model: &mut EdmModel, id: ElementId) -> &mut FunctionImport {
        match model.element_mut(id) {
            Some(Element::FunctionImport(import)) => import,
            _ => panic!("not a function import"),
        }
    }

    fn run(model: &EdmModel, rules: &[&ValidationRule]) -> Vec<ErrorKind> {
        let set = RuleSet::new(rules.iter().map(|r| **r));
        Validation::new(model, &set).errors().map(|e| e.code).collect()
    }

    #[test]
    fn test_entity_returns_need_an_entity_set() {
        let mut f = fixture();
        let returns = TypeRef::collection(TypeRef::schema(f.order, false));
        let recent = f.model.add_function_import(f.container, "Recent", Some(returns));
        let rules = [&IMPORT_RETURNS_ENTITIES_WITHOUT_ENTITY_SET, &IMPORT_ENTITY_SET_WITHOUT_ENTITY_RETURN];
        assert_eq!(run(&f.model, &rules), vec![ErrorKind::FunctionImportReturnsEntitiesButDoesNotSpecifyEntitySet]);

        import_mut(&mut f.model, recent).entity_set = Some(f.orders);
        assert!(run(&f.model, &rules).is_empty());
    }

    #[test]
    fn test_entity_set_requires_entity_return() {
        let mut f = fixture();
        let count = f.model.add_function_import(f.container, "Count", Some(TypeRef::primitive(PrimitiveKind::Int64, false)));
        import_mut(&mut f.model, count).entity_set = Some(f.orders);
        assert_eq!(
            run(&f.model, &[&IMPORT_ENTITY_SET_WITHOUT_ENTITY_RETURN]),
            vec![ErrorKind::FunctionImportSpecifiesEntitySetButDoesNotReturnEntityType]
        );
    }

    #[test]
    fn test_returned_type_must_derive_from_set_type() {
        let mut f = fixture();
        let invoice = f.model.add_entity_type("Shop", "Invoice");
        let import = f.model.add_function_import(f.container, "Invoices", Some(TypeRef::schema(invoice, false)));
        import_mut(&mut f.model, import).entity_set = Some(f.orders);
        assert_eq!(
            run(&f.model, &[&IMPORT_ENTITY_TYPE_MUST_MATCH_ENTITY_SET]),
            vec![ErrorKind::FunctionImportEntityTypeDoesNotMatchEntitySet]
        );

        let rush = f.model.add_entity_type("Shop", "RushOrder");
        f.model.set_base_type(rush, TypeDef::Schema(f.order));
        import_mut(&mut f.model, import).signature.return_type = Some(TypeRef::schema(rush, false));
        assert!(run(&f.model, &[&IMPORT_ENTITY_TYPE_MUST_MATCH_ENTITY_SET]).is_empty());
    }

    #[rstest]
    #[case(None, vec![])]
    #[case(Some(TypeRef::collection(TypeRef::primitive(PrimitiveKind::String, true))), vec![])]
    #[case(Some(TypeRef::primitive(PrimitiveKind::String, true)), vec![ErrorKind::FunctionImportUnsupportedReturnType])]
    fn test_version_one_return_types(#[case] returns: Option<TypeRef>, #[case] expected: Vec<ErrorKind>) {
        let mut f = fixture();
        f.model.add_function_import(f.container, "Lookup", returns);
        assert_eq!(run(&f.model, &[&IMPORT_UNSUPPORTED_RETURN_TYPE_V1]), expected);
    }

    #[test]
    fn test_scalar_return_allowed_after_v1() {
        let mut f = fixture();
        f.model.add_function_import(f.container, "Total", Some(TypeRef::primitive(PrimitiveKind::Decimal, false)));
        assert!(run(&f.model, &[&IMPORT_UNSUPPORTED_RETURN_TYPE_AFTER_V1]).is_empty());
    }

    #[test]
    fn test_import_flags() {
        let mut f = fixture();
        let purge = f.model.add_function_import(f.container, "Purge", None);
        {
            let import = import_mut(&mut f.model, purge);
            import.is_composable = true;
            import.is_side_effecting = true;
            import.is_bindable = true;
        }
        let codes = run(
            &f.model,
            &[&IMPORT_COMPOSABLE_CANNOT_BE_SIDE_EFFECTING, &IMPORT_BINDABLE_MUST_HAVE_PARAMETERS, &IMPORT_SIDE_EFFECTING_NOT_SUPPORTED_BEFORE_V3],
        );
        assert_eq!(
            codes,
            vec![
                ErrorKind::ComposableFunctionImportCannotBeSideEffecting,
                ErrorKind::BindableFunctionImportMustHaveParameters,
                ErrorKind::FunctionImportSideEffectingNotSupportedBeforeV3,
            ]
        );
    }

    #[test]
    fn test_parameters() {
        let mut f = fixture();
        let ship = f.model.add_function_import(f.container, "Ship", None);
        f.model.add_parameter(ship, "Target", TypeRef::schema(f.order, false));
        let carrier = f.model.add_parameter(ship, "Carrier", TypeRef::primitive(PrimitiveKind::String, true));
        f.model.add_parameter(ship, "Carrier", TypeRef::primitive(PrimitiveKind::String, true));
        if let Some(Element::Parameter(p)) = f.model.element_mut(carrier) {
            p.mode = ParameterMode::None;
        }
        let codes = run(
            &f.model,
            &[&PARAMETER_NAMES_MUST_BE_UNIQUE, &IMPORT_PARAMETERS_INCORRECT_TYPE_BEFORE_V3, &IMPORT_PARAMETER_MODE_MUST_NOT_BE_NONE],
        );
        assert_eq!(
            codes,
            vec![
                ErrorKind::AlreadyDefined,
                ErrorKind::FunctionImportParameterIncorrectType,
                ErrorKind::InvalidFunctionImportParameterMode,
            ]
        );
    }

    #[test]
    fn test_functions_take_only_inputs() {
        let mut model = EdmModel::new();
        let score = model.add_function("Shop", "Score", Some(TypeRef::primitive(PrimitiveKind::Double, false)));
        let out = model.add_parameter(score, "Result", TypeRef::primitive(PrimitiveKind::Double, false));
        if let Some(Element::Parameter(p)) = model.element_mut(out) {
            p.mode = ParameterMode::Out;
        }
        let codes = run(&model, &[&FUNCTIONS_NOT_SUPPORTED_BEFORE_V2, &ONLY_INPUT_PARAMETERS_ALLOWED]);
        assert_eq!(codes, vec![ErrorKind::FunctionsNotSupportedBeforeV2, ErrorKind::OnlyInputParametersAllowedInFunctions]);
    }
}
