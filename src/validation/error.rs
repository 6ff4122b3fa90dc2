//! Defines the diagnostic records produced by validation rules.
use crate::model::Location;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The broad family a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    Naming,
    Versioning,
    Structural,
    Referential,
    Relational,
    ExpressionTyping,
}

/// The specific code of a diagnostic.
///
// Codes allow programmatic inspection of findings; message wording is not part
// of the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    // Naming
    InvalidName,
    NameTooLong,
    InvalidNamespaceName,
    SystemNamespaceEncountered,

    // Versioning
    FunctionsNotSupportedBeforeV2,
    EnumsNotSupportedBeforeV3,
    ValueTermsNotSupportedBeforeV3,
    VocabularyAnnotationsNotSupportedBeforeV3,
    OpenTypesSupportedOnlyInV12AndAfter,
    StreamTypeReferencesNotSupportedBeforeV3,
    SpatialTypeReferencesNotSupportedBeforeV3,
    NavigationPropertyContainsTargetNotSupportedBeforeV3,
    FunctionImportSideEffectingNotSupportedBeforeV3,
    FunctionImportComposableNotSupportedBeforeV3,
    FunctionImportBindableNotSupportedBeforeV3,
    EntityKeyMustNotBeBinary,
    InvalidAbstractComplexType,
    InvalidPolymorphicComplexType,
    ComplexTypeMustHaveProperties,
    FunctionImportParameterIncorrectType,
    FunctionImportUnsupportedReturnType,
    InvalidPropertyInRelationshipConstraint,

    // Structural
    AlreadyDefined,
    DuplicateEntityContainerMemberName,
    DuplicateEntityContainerName,
    DuplicateFunctions,
    DuplicateAnnotation,
    DuplicatePropertySpecifiedInEntityKey,
    DuplicateDependentProperty,
    DuplicateEnumMember,
    KeyMissingOnEntityType,
    InvalidKey,
    EntityKeyMustBeScalar,
    KeyPropertyMustBelongToEntity,
    EntityMustHaveEntityBaseType,
    ComplexTypeMustHaveComplexBaseType,
    RowTypeMustHaveProperties,
    BadCyclicEntity,
    BadCyclicComplex,
    InvalidMemberNameMatchesTypeName,
    DeclaringTypeMustBeCorrect,
    EntityContainerElementMustNotHaveKindOfNone,
    PrimitiveTypeMustNotHaveKindOfNone,
    EnumMustHaveIntegerUnderlyingType,
    EnumMemberTypeMustMatchEnumUnderlyingType,
    InvalidPropertyType,
    NullableComplexTypeProperty,
    OnlyInputParametersAllowedInFunctions,
    InvalidFunctionImportParameterMode,
    ComposableFunctionImportCannotBeSideEffecting,
    BindableFunctionImportMustHaveParameters,
    PrecisionOutOfRange,
    ScaleOutOfRange,
    MaxLengthOutOfRange,

    // Referential
    BadUnresolvedType,
    BadAmbiguousType,
    BadUnresolvedTerm,
    BadUnresolvedTarget,
    BadUnresolvedFunction,
    EntitySetTypeHasNoKeys,
    EntitySetElementTypeIsNotEntityType,
    EntitySetNotReachableFromContainer,

    // Relational
    InvalidMultiplicityOfPrincipalEnd,
    InvalidMultiplicityOfDependentEnd,
    DependentPropertiesMustBelongToDependentEntity,
    MismatchNumberOfPropertiesInRelationshipConstraint,
    TypeMismatchRelationshipConstraint,
    InvalidAction,
    EndWithManyMultiplicityCannotHaveOperationsSpecified,
    InvalidNavigationPropertyType,
    InvalidNavigationPropertyPartner,
    NavigationPropertyWithRecursiveContainmentTargetMustBeOptional,
    NavigationPropertyWithRecursiveContainmentSourceMustBeFromZeroOrOne,
    NavigationPropertyWithNonRecursiveContainmentSourceMustBeFromOne,
    NavigationPropertyEntityMustNotIndirectlyContainItself,
    EntitySetNavigationPropertyMappingMustPointToValidTargetForProperty,
    EntitySetNavigationMappingMustBeBidirectional,
    EntitySetCanOnlyBeContainedByASingleNavigationProperty,
    EntitySetRecursiveNavigationPropertyMappingsMustPointBackToSourceEntitySet,
    FunctionImportReturnsEntitiesButDoesNotSpecifyEntitySet,
    FunctionImportSpecifiesEntitySetButDoesNotReturnEntityType,
    FunctionImportEntityTypeDoesNotMatchEntitySet,

    // Expression typing
    ExpressionNotValidForTheAssertedType,
    ExpressionPrimitiveKindNotValidForAssertedType,
    PrimitiveConstantExpressionNotValidForNonPrimitiveType,
    NullCannotBeAssertedToBeANonNullableType,
    CannotAssertNullableTypeAsNonNullableType,
    IntegerConstantValueOutOfRange,
    StringConstantLengthOutOfRange,
    BinaryConstantLengthOutOfRange,
    PathIsNotValidForTheGivenContext,
    RecordExpressionNotValidForNonStructuredType,
    RecordExpressionMissingRequiredProperty,
    RecordExpressionHasExtraProperties,
    CollectionExpressionNotValidForNonCollectionType,
    IncorrectNumberOfArguments,
    TypeAnnotationMissingRequiredProperty,
    TypeAnnotationHasExtraProperties,
}

impl ErrorKind {
    pub fn category(self) -> ErrorCategory {
        use ErrorKind::*;
        match self {
            InvalidName | NameTooLong | InvalidNamespaceName | SystemNamespaceEncountered => ErrorCategory::Naming,

            FunctionsNotSupportedBeforeV2
            | EnumsNotSupportedBeforeV3
            | ValueTermsNotSupportedBeforeV3
            | VocabularyAnnotationsNotSupportedBeforeV3
            | OpenTypesSupportedOnlyInV12AndAfter
            | StreamTypeReferencesNotSupportedBeforeV3
            | SpatialTypeReferencesNotSupportedBeforeV3
            | NavigationPropertyContainsTargetNotSupportedBeforeV3
            | FunctionImportSideEffectingNotSupportedBeforeV3
            | FunctionImportComposableNotSupportedBeforeV3
            | FunctionImportBindableNotSupportedBeforeV3
            | EntityKeyMustNotBeBinary
            | InvalidAbstractComplexType
            | InvalidPolymorphicComplexType
            | ComplexTypeMustHaveProperties
            | FunctionImportParameterIncorrectType
            | FunctionImportUnsupportedReturnType
            | InvalidPropertyInRelationshipConstraint => ErrorCategory::Versioning,

            BadUnresolvedType
            | BadAmbiguousType
            | BadUnresolvedTerm
            | BadUnresolvedTarget
            | BadUnresolvedFunction
            | EntitySetTypeHasNoKeys
            | EntitySetElementTypeIsNotEntityType
            | EntitySetNotReachableFromContainer => ErrorCategory::Referential,

            InvalidMultiplicityOfPrincipalEnd
            | InvalidMultiplicityOfDependentEnd
            | DependentPropertiesMustBelongToDependentEntity
            | MismatchNumberOfPropertiesInRelationshipConstraint
            | TypeMismatchRelationshipConstraint
            | InvalidAction
            | EndWithManyMultiplicityCannotHaveOperationsSpecified
            | InvalidNavigationPropertyType
            | InvalidNavigationPropertyPartner
            | NavigationPropertyWithRecursiveContainmentTargetMustBeOptional
            | NavigationPropertyWithRecursiveContainmentSourceMustBeFromZeroOrOne
            | NavigationPropertyWithNonRecursiveContainmentSourceMustBeFromOne
            | NavigationPropertyEntityMustNotIndirectlyContainItself
            | EntitySetNavigationPropertyMappingMustPointToValidTargetForProperty
            | EntitySetNavigationMappingMustBeBidirectional
            | EntitySetCanOnlyBeContainedByASingleNavigationProperty
            | EntitySetRecursiveNavigationPropertyMappingsMustPointBackToSourceEntitySet
            | FunctionImportReturnsEntitiesButDoesNotSpecifyEntitySet
            | FunctionImportSpecifiesEntitySetButDoesNotReturnEntityType
            | FunctionImportEntityTypeDoesNotMatchEntitySet => ErrorCategory::Relational,

            ExpressionNotValidForTheAssertedType
            | ExpressionPrimitiveKindNotValidForAssertedType
            | PrimitiveConstantExpressionNotValidForNonPrimitiveType
            | NullCannotBeAssertedToBeANonNullableType
            | CannotAssertNullableTypeAsNonNullableType
            | IntegerConstantValueOutOfRange
            | StringConstantLengthOutOfRange
            | BinaryConstantLengthOutOfRange
            | PathIsNotValidForTheGivenContext
            | RecordExpressionNotValidForNonStructuredType
            | RecordExpressionMissingRequiredProperty
            | RecordExpressionHasExtraProperties
            | CollectionExpressionNotValidForNonCollectionType
            | IncorrectNumberOfArguments
            | TypeAnnotationMissingRequiredProperty
            | TypeAnnotationHasExtraProperties => ErrorCategory::ExpressionTyping,

            _ => ErrorCategory::Structural,
        }
    }
}

/// A single, immutable validation finding.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code:?}: {message}")]
pub struct EdmError {
    /// Where the offending element was declared, when known.
    pub location: Option<Location>,
    pub code: ErrorKind,
    pub message: String,
}

impl EdmError {
    pub fn new(location: Option<Location>, code: ErrorKind, message: impl Into<String>) -> Self {
        Self { location, code, message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::NameTooLong, ErrorCategory::Naming)]
    #[case(ErrorKind::EnumsNotSupportedBeforeV3, ErrorCategory::Versioning)]
    #[case(ErrorKind::KeyMissingOnEntityType, ErrorCategory::Structural)]
    #[case(ErrorKind::BadUnresolvedTerm, ErrorCategory::Referential)]
    #[case(ErrorKind::InvalidMultiplicityOfPrincipalEnd, ErrorCategory::Relational)]
    #[case(ErrorKind::RecordExpressionHasExtraProperties, ErrorCategory::ExpressionTyping)]
    fn test_error_categories(#[case] kind: ErrorKind, #[case] expected: ErrorCategory) {
        assert_eq!(kind.category(), expected);
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let err = EdmError::new(None, ErrorKind::InvalidName, "The name '' is not allowed.");
        assert_eq!(err.to_string(), "InvalidName: The name '' is not allowed.");
    }
}
