//! Rules, the capabilities they bind to, and the node kinds of the walk.
use super::context::{Owner, ValidationContext};
use crate::model::*;
use smallvec::{smallvec, SmallVec};
use std::fmt;

/// A facet of an element's shape that a rule can be bound to.
///
/// One element usually carries several: an entity type is a named element, a
/// schema element, a structured type and an entity type at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Model,
    NamedElement,
    SchemaElement,
    EntityContainer,
    EntitySet,
    StructuredType,
    EntityType,
    ComplexType,
    RowType,
    EnumType,
    EnumMember,
    StructuralProperty,
    NavigationProperty,
    FunctionBase,
    Function,
    FunctionImport,
    ValueTerm,
    Annotation,
    Expression,
    TypeReference,
}

/// Every kind of node the traversal visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeKind {
    Model,
    EntityContainer,
    EntitySet,
    FunctionImport,
    EntityType,
    ComplexType,
    RowType,
    EnumType,
    EnumMember,
    StructuralProperty,
    NavigationProperty,
    Function,
    Parameter,
    ValueTerm,
    Annotation,
    Expression,
    TypeReference,
}

impl NodeKind {
    pub const COUNT: usize = NodeKind::TypeReference as usize + 1;

    pub const ALL: [NodeKind; NodeKind::COUNT] = [
        NodeKind::Model,
        NodeKind::EntityContainer,
        NodeKind::EntitySet,
        NodeKind::FunctionImport,
        NodeKind::EntityType,
        NodeKind::ComplexType,
        NodeKind::RowType,
        NodeKind::EnumType,
        NodeKind::EnumMember,
        NodeKind::StructuralProperty,
        NodeKind::NavigationProperty,
        NodeKind::Function,
        NodeKind::Parameter,
        NodeKind::ValueTerm,
        NodeKind::Annotation,
        NodeKind::Expression,
        NodeKind::TypeReference,
    ];

    pub fn of(element: &Element) -> Self {
        match element {
            Element::EntityContainer(_) => NodeKind::EntityContainer,
            Element::EntitySet(_) => NodeKind::EntitySet,
            Element::FunctionImport(_) => NodeKind::FunctionImport,
            Element::EntityType(_) => NodeKind::EntityType,
            Element::ComplexType(_) => NodeKind::ComplexType,
            Element::RowType(_) => NodeKind::RowType,
            Element::EnumType(_) => NodeKind::EnumType,
            Element::EnumMember(_) => NodeKind::EnumMember,
            Element::StructuralProperty(_) => NodeKind::StructuralProperty,
            Element::NavigationProperty(_) => NodeKind::NavigationProperty,
            Element::Function(_) => NodeKind::Function,
            Element::Parameter(_) => NodeKind::Parameter,
            Element::ValueTerm(_) => NodeKind::ValueTerm,
            Element::Annotation(_) => NodeKind::Annotation,
        }
    }

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The capabilities a node of this kind satisfies.
    pub fn capabilities(self) -> SmallVec<[Capability; 4]> {
        use Capability as C;
        match self {
            NodeKind::Model => smallvec![C::Model],
            NodeKind::EntityContainer => smallvec![C::NamedElement, C::SchemaElement, C::EntityContainer],
            NodeKind::EntitySet => smallvec![C::NamedElement, C::EntitySet],
            NodeKind::FunctionImport => smallvec![C::NamedElement, C::FunctionBase, C::FunctionImport],
            NodeKind::EntityType => smallvec![C::NamedElement, C::SchemaElement, C::StructuredType, C::EntityType],
            NodeKind::ComplexType => smallvec![C::NamedElement, C::SchemaElement, C::StructuredType, C::ComplexType],
            NodeKind::RowType => smallvec![C::StructuredType, C::RowType],
            NodeKind::EnumType => smallvec![C::NamedElement, C::SchemaElement, C::EnumType],
            NodeKind::EnumMember => smallvec![C::NamedElement, C::EnumMember],
            NodeKind::StructuralProperty => smallvec![C::NamedElement, C::StructuralProperty],
            NodeKind::NavigationProperty => smallvec![C::NamedElement, C::NavigationProperty],
            NodeKind::Function => smallvec![C::NamedElement, C::SchemaElement, C::FunctionBase, C::Function],
            NodeKind::Parameter => smallvec![C::NamedElement],
            NodeKind::ValueTerm => smallvec![C::NamedElement, C::SchemaElement, C::ValueTerm],
            NodeKind::Annotation => smallvec![C::Annotation],
            NodeKind::Expression => smallvec![C::Expression],
            NodeKind::TypeReference => smallvec![C::TypeReference],
        }
    }
}

/// Structural rules run over the whole graph before any semantic rule, so that
/// semantic rules can consult `is_bad`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Structural,
    Semantic,
}

type Ctx<'c, 'm> = &'c mut ValidationContext<'m>;

/// The typed body of a rule, one variant per capability.
#[derive(Clone, Copy)]
pub enum Check {
    Model(fn(Ctx<'_, '_>)),
    NamedElement(fn(Ctx<'_, '_>, ElementId, &str)),
    SchemaElement(fn(Ctx<'_, '_>, ElementId, &str)),
    EntityContainer(fn(Ctx<'_, '_>, ElementId, &EntityContainer)),
    EntitySet(fn(Ctx<'_, '_>, ElementId, &EntitySet)),
    StructuredType(fn(Ctx<'_, '_>, ElementId, &StructuredType)),
    EntityType(fn(Ctx<'_, '_>, ElementId, &EntityType)),
    ComplexType(fn(Ctx<'_, '_>, ElementId, &ComplexType)),
    RowType(fn(Ctx<'_, '_>, ElementId, &RowType)),
    EnumType(fn(Ctx<'_, '_>, ElementId, &EnumType)),
    EnumMember(fn(Ctx<'_, '_>, ElementId, &EnumMember)),
    StructuralProperty(fn(Ctx<'_, '_>, ElementId, &StructuralProperty)),
    NavigationProperty(fn(Ctx<'_, '_>, ElementId, &NavigationProperty)),
    FunctionBase(fn(Ctx<'_, '_>, ElementId, &FunctionSignature)),
    Function(fn(Ctx<'_, '_>, ElementId, &Function)),
    FunctionImport(fn(Ctx<'_, '_>, ElementId, &FunctionImport)),
    ValueTerm(fn(Ctx<'_, '_>, ElementId, &ValueTerm)),
    Annotation(fn(Ctx<'_, '_>, ElementId, &VocabularyAnnotation)),
    Expression(fn(Ctx<'_, '_>, ExprId, &Expression)),
    TypeReference(fn(Ctx<'_, '_>, Owner, &TypeRef)),
}

/// A named, independently addressable check.
#[derive(Clone, Copy)]
pub struct ValidationRule {
    pub name: &'static str,
    pub phase: Phase,
    pub check: Check,
}

impl fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRule")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("capability", &self.capability())
            .finish()
    }
}

impl ValidationRule {
    pub const fn semantic(name: &'static str, check: Check) -> Self {
        Self { name, phase: Phase::Semantic, check }
    }

    pub const fn structural(name: &'static str, check: Check) -> Self {
        Self { name, phase: Phase::Structural, check }
    }

    pub fn capability(&self) -> Capability {
        match self.check {
            Check::Model(_) => Capability::Model,
            Check::NamedElement(_) => Capability::NamedElement,
            Check::SchemaElement(_) => Capability::SchemaElement,
            Check::EntityContainer(_) => Capability::EntityContainer,
            Check::EntitySet(_) => Capability::EntitySet,
            Check::StructuredType(_) => Capability::StructuredType,
            Check::EntityType(_) => Capability::EntityType,
            Check::ComplexType(_) => Capability::ComplexType,
            Check::RowType(_) => Capability::RowType,
            Check::EnumType(_) => Capability::EnumType,
            Check::EnumMember(_) => Capability::EnumMember,
            Check::StructuralProperty(_) => Capability::StructuralProperty,
            Check::NavigationProperty(_) => Capability::NavigationProperty,
            Check::FunctionBase(_) => Capability::FunctionBase,
            Check::Function(_) => Capability::Function,
            Check::FunctionImport(_) => Capability::FunctionImport,
            Check::ValueTerm(_) => Capability::ValueTerm,
            Check::Annotation(_) => Capability::Annotation,
            Check::Expression(_) => Capability::Expression,
            Check::TypeReference(_) => Capability::TypeReference,
        }
    }

    pub(crate) fn apply_to_model(&self, ctx: &mut ValidationContext<'_>) {
        if let Check::Model(f) = self.check {
            f(ctx);
        }
    }

    pub(crate) fn apply_to_element(&self, ctx: &mut ValidationContext<'_>, id: ElementId, element: &Element) {
        match (self.check, element) {
            (Check::NamedElement(f), _) => {
                if let Some(name) = element.name() {
                    f(ctx, id, name);
                }
            }
            (Check::SchemaElement(f), _) => {
                if let Some(namespace) = element.namespace() {
                    f(ctx, id, namespace);
                }
            }
            (Check::StructuredType(f), _) => {
                if let Some(structure) = element.structure() {
                    f(ctx, id, structure);
                }
            }
            (Check::FunctionBase(f), _) => {
                if let Some(signature) = element.signature() {
                    f(ctx, id, signature);
                }
            }
            (Check::EntityContainer(f), Element::EntityContainer(e)) => f(ctx, id, e),
            (Check::EntitySet(f), Element::EntitySet(e)) => f(ctx, id, e),
            (Check::EntityType(f), Element::EntityType(e)) => f(ctx, id, e),
            (Check::ComplexType(f), Element::ComplexType(e)) => f(ctx, id, e),
            (Check::RowType(f), Element::RowType(e)) => f(ctx, id, e),
            (Check::EnumType(f), Element::EnumType(e)) => f(ctx, id, e),
            (Check::EnumMember(f), Element::EnumMember(e)) => f(ctx, id, e),
            (Check::StructuralProperty(f), Element::StructuralProperty(e)) => f(ctx, id, e),
            (Check::NavigationProperty(f), Element::NavigationProperty(e)) => f(ctx, id, e),
            (Check::Function(f), Element::Function(e)) => f(ctx, id, e),
            (Check::FunctionImport(f), Element::FunctionImport(e)) => f(ctx, id, e),
            (Check::ValueTerm(f), Element::ValueTerm(e)) => f(ctx, id, e),
            (Check::Annotation(f), Element::Annotation(e)) => f(ctx, id, e),
            _ => {}
        }
    }

    pub(crate) fn apply_to_expression(&self, ctx: &mut ValidationContext<'_>, id: ExprId, expression: &Expression) {
        if let Check::Expression(f) = self.check {
            f(ctx, id, expression);
        }
    }

    pub(crate) fn apply_to_type_ref(&self, ctx: &mut ValidationContext<'_>, owner: Owner, type_ref: &TypeRef) {
        if let Check::TypeReference(f) = self.check {
            f(ctx, owner, type_ref);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_satisfies_four_capabilities() {
        let caps = NodeKind::EntityType.capabilities();
        assert_eq!(caps.len(), 4);
        assert!(caps.contains(&Capability::StructuredType));
        assert!(!caps.contains(&Capability::ComplexType));
    }

    #[test]
    fn test_all_kinds_are_dense() {
        for (i, kind) in NodeKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_rule_capability_follows_check() {
        fn noop(_: &mut ValidationContext<'_>, _: ElementId, _: &str) {}
        let rule = ValidationRule::structural("NoOp", Check::NamedElement(noop));
        assert_eq!(rule.capability(), Capability::NamedElement);
        assert_eq!(rule.phase, Phase::Structural);
    }
}
