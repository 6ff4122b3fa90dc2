//! Rules over annotation expressions that hold regardless of the asserted type.
use crate::model::{ExprId, Expression, FunctionRef, PrimitiveKind, TypeRef};
use crate::type_system::{ExpressionTypeChecker, TypeCheckResult};
use crate::validation::context::ValidationContext;
use crate::validation::error::ErrorKind;
use crate::validation::rule::{Check, ValidationRule};

pub static IF_TEST_MUST_BE_BOOLEAN: ValidationRule =
    ValidationRule::semantic("IfExpressionAssertCorrectTestType", Check::Expression(if_test_must_be_boolean));

pub static FUNCTION_MUST_BE_RESOLVED: ValidationRule =
    ValidationRule::semantic("FunctionApplicationExpressionFunctionMustBeResolved", Check::Expression(function_must_be_resolved));

pub static ARGUMENTS_MUST_MATCH_PARAMETERS: ValidationRule = ValidationRule::semantic(
    "FunctionApplicationExpressionParametersMatchAppliedFunction",
    Check::Expression(arguments_must_match_parameters),
);

pub static DECLARED_TYPE_MUST_MATCH_CONTENTS: ValidationRule = ValidationRule::semantic(
    "RecordAndCollectionExpressionDeclaredTypeMatchesContents",
    Check::Expression(declared_type_must_match_contents),
);

fn push_all(ctx: &mut ValidationContext<'_>, result: TypeCheckResult) {
    if let Err(errors) = result {
        for error in errors {
            ctx.push(error);
        }
    }
}

fn if_test_must_be_boolean(ctx: &mut ValidationContext<'_>, _id: ExprId, expression: &Expression) {
    let Expression::If { test, .. } = expression else {
        return;
    };
    let boolean = TypeRef::primitive(PrimitiveKind::Boolean, false);
    let result = ExpressionTypeChecker::new(ctx.model()).assert_type(*test, &boolean);
    push_all(ctx, result);
}

fn function_must_be_resolved(ctx: &mut ValidationContext<'_>, id: ExprId, expression: &Expression) {
    if let Expression::FunctionApplication { function: FunctionRef::Unresolved(name), .. } = expression {
        let location = ctx.model().expression_location(id).cloned();
        ctx.add_error(location, ErrorKind::BadUnresolvedFunction, format!("The function '{}' could not be found.", name));
    }
}

fn arguments_must_match_parameters(ctx: &mut ValidationContext<'_>, id: ExprId, expression: &Expression) {
    let Expression::FunctionApplication { function: FunctionRef::Resolved(function), arguments } = expression else {
        return;
    };
    let model = ctx.model();
    let Some(signature) = model.signature(*function) else {
        return;
    };
    if signature.parameters.len() != arguments.len() {
        let location = model.expression_location(id).cloned();
        ctx.add_error(
            location,
            ErrorKind::IncorrectNumberOfArguments,
            format!(
                "The function '{}' takes {} arguments but {} were supplied.",
                signature.name,
                signature.parameters.len(),
                arguments.len()
            ),
        );
        return;
    }
    let checker = ExpressionTypeChecker::new(model);
    for (parameter, argument) in signature.parameters.iter().zip(arguments) {
        if let Some(p) = model.as_parameter(*parameter) {
            push_all(ctx, checker.assert_type(*argument, &p.type_ref));
        }
    }
}

fn declared_type_must_match_contents(ctx: &mut ValidationContext<'_>, id: ExprId, expression: &Expression) {
    let declared = match expression {
        Expression::Record { declared_type: Some(declared), .. }
        | Expression::Collection { declared_type: Some(declared), .. } => declared,
        _ => return,
    };
    if ctx.is_bad_type(&declared.definition) {
        return;
    }
    let result = ExpressionTypeChecker::new(ctx.model()).assert_contents(id, declared);
    push_all(ctx, result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnnotationBody, AnnotationTarget, ConstantValue, EdmModel, ElementId, TermRef};
    use crate::validation::{RuleSet, Validation};

    /// Annotates a fresh entity type with `build`'s expression.
    fn annotated(build: impl FnOnce(&mut EdmModel) -> ExprId) -> EdmModel {
        let mut model = EdmModel::new();
        let target = model.add_entity_type("Ui", "Screen");
        let term = model.add_value_term("Ui", "Title", TypeRef::primitive(PrimitiveKind::String, true));
        let value = build(&mut model);
        model.add_annotation(AnnotationTarget::Element(target), TermRef::Term(term), None, AnnotationBody::Value(value));
        model
    }

    fn run(model: &EdmModel, rule: &ValidationRule) -> Vec<ErrorKind> {
        let set = RuleSet::new([*rule]);
        Validation::new(model, &set).errors().map(|e| e.code).collect()
    }

    fn text(model: &mut EdmModel, value: &str) -> ExprId {
        model.add_expression(Expression::constant(ConstantValue::String(value.into())))
    }

    fn formatter(model: &mut EdmModel) -> ElementId {
        let format = model.add_function("Ui", "Format", Some(TypeRef::primitive(PrimitiveKind::String, false)));
        model.add_parameter(format, "Text", TypeRef::primitive(PrimitiveKind::String, true));
        format
    }

    #[test]
    fn test_if_test_must_be_boolean() {
        let model = annotated(|m| {
            let test = m.add_expression(Expression::constant(ConstantValue::Integer(1)));
            let (if_true, if_false) = (text(m, "yes"), text(m, "no"));
            m.add_expression(Expression::If { test, if_true, if_false })
        });
        assert_eq!(run(&model, &IF_TEST_MUST_BE_BOOLEAN), vec![ErrorKind::ExpressionPrimitiveKindNotValidForAssertedType]);
    }

    #[test]
    fn test_unresolved_function() {
        let model = annotated(|m| {
            m.add_expression(Expression::FunctionApplication {
                function: FunctionRef::Unresolved("Ui.Missing".into()),
                arguments: Vec::new(),
            })
        });
        assert_eq!(run(&model, &FUNCTION_MUST_BE_RESOLVED), vec![ErrorKind::BadUnresolvedFunction]);
        assert!(run(&model, &ARGUMENTS_MUST_MATCH_PARAMETERS).is_empty());
    }

    #[test]
    fn test_argument_count_and_types() {
        let model = annotated(|m| {
            let format = formatter(m);
            let (a, b) = (text(m, "a"), text(m, "b"));
            m.add_expression(Expression::FunctionApplication { function: FunctionRef::Resolved(format), arguments: vec![a, b] })
        });
        assert_eq!(run(&model, &ARGUMENTS_MUST_MATCH_PARAMETERS), vec![ErrorKind::IncorrectNumberOfArguments]);

        let model = annotated(|m| {
            let format = formatter(m);
            let number = m.add_expression(Expression::constant(ConstantValue::Boolean(true)));
            m.add_expression(Expression::FunctionApplication { function: FunctionRef::Resolved(format), arguments: vec![number] })
        });
        assert_eq!(
            run(&model, &ARGUMENTS_MUST_MATCH_PARAMETERS),
            vec![ErrorKind::ExpressionPrimitiveKindNotValidForAssertedType]
        );
    }

    #[test]
    fn test_declared_collection_type_matches_elements() {
        let model = annotated(|m| {
            let (one, two) = (text(m, "1"), text(m, "2"));
            m.add_expression(Expression::Collection {
                declared_type: Some(TypeRef::collection(TypeRef::primitive(PrimitiveKind::Int32, false))),
                elements: vec![one, two],
            })
        });
        assert_eq!(
            run(&model, &DECLARED_TYPE_MUST_MATCH_CONTENTS),
            vec![ErrorKind::ExpressionPrimitiveKindNotValidForAssertedType; 2]
        );
    }

    #[test]
    fn test_nested_expressions_are_visited_once() {
        let model = annotated(|m| {
            let test = m.add_expression(Expression::constant(ConstantValue::Integer(0)));
            let shared = text(m, "same");
            let inner = m.add_expression(Expression::If { test, if_true: shared, if_false: shared });
            m.add_expression(Expression::Labeled { name: "Choice".into(), element: inner })
        });
        assert_eq!(run(&model, &IF_TEST_MUST_BE_BOOLEAN).len(), 1);
    }
}
