//! Defines the element kinds stored in the model arena.
//!
//! Elements reference each other only through `ElementId` handles. Base types,
//! navigation partners and containment may therefore form cycles without any
//! ownership loops.
use super::expression::ExprId;
use super::types::{PrimitiveKind, TypeDef, TypeRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable handle to an element in an `EdmModel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ElementId(pub u32);

impl ElementId {
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
    pub fn new(idx: usize) -> Self {
        Self(idx as u32)
    }
}

/// Where an element was declared in its source document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub source: String,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(source: impl Into<String>, line: u32, column: u32) -> Self {
        Self { source: source.into(), line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.source, self.line, self.column)
    }
}

/// Inheritance and property data shared by entity, complex and row types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredType {
    pub base_type: Option<TypeDef>,
    pub is_abstract: bool,
    pub is_open: bool,
    pub declared_properties: Vec<ElementId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityType {
    pub namespace: String,
    pub name: String,
    pub structure: StructuredType,
    /// `None` when the type declares no key of its own.
    pub declared_key: Option<Vec<ElementId>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexType {
    pub namespace: String,
    pub name: String,
    pub structure: StructuredType,
}

/// An anonymous structured type, only reachable through type references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowType {
    pub structure: StructuredType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub namespace: String,
    pub name: String,
    pub underlying_type: PrimitiveKind,
    pub is_flags: bool,
    pub members: Vec<ElementId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub declaring_type: ElementId,
    pub value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyMode {
    #[default]
    None,
    Fixed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructuralProperty {
    pub name: String,
    pub declaring_type: ElementId,
    pub type_ref: TypeRef,
    pub default_value: Option<String>,
    pub concurrency_mode: ConcurrencyMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnDeleteAction {
    #[default]
    None,
    Cascade,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationProperty {
    pub name: String,
    pub declaring_type: ElementId,
    /// An entity type reference, or a collection of one.
    pub type_ref: TypeRef,
    pub partner: Option<ElementId>,
    /// Set only on the dependent end of a referential constraint.
    pub dependent_properties: Option<Vec<ElementId>>,
    pub contains_target: bool,
    pub on_delete: OnDeleteAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterMode {
    None,
    #[default]
    In,
    Out,
    InOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub type_ref: TypeRef,
    pub mode: ParameterMode,
    pub declaring_function: ElementId,
}

/// The part of a function shared by schema functions and function imports.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub name: String,
    pub return_type: Option<TypeRef>,
    pub parameters: Vec<ElementId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub namespace: String,
    pub signature: FunctionSignature,
    pub defining_expression: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionImport {
    pub container: ElementId,
    pub signature: FunctionSignature,
    pub entity_set: Option<ElementId>,
    pub is_side_effecting: bool,
    pub is_composable: bool,
    pub is_bindable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityContainer {
    pub namespace: String,
    pub name: String,
    pub elements: Vec<ElementId>,
}

/// Binds a navigation property of a set's element type to the set it lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationTargetMapping {
    pub navigation_property: ElementId,
    pub target_set: ElementId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntitySet {
    pub name: String,
    pub container: ElementId,
    pub element_type: TypeDef,
    pub navigation_targets: Vec<NavigationTargetMapping>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueTerm {
    pub namespace: String,
    pub name: String,
    pub type_ref: TypeRef,
}

/// The element an annotation applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationTarget {
    Element(ElementId),
    Unresolved(String),
}

/// The term an annotation binds: a value term, or a structured type for type annotations.
#[derive(Debug, Clone, PartialEq)]
pub enum TermRef {
    Term(ElementId),
    Unresolved(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyValueBinding {
    pub property: String,
    pub value: ExprId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationBody {
    Value(ExprId),
    Type(Vec<PropertyValueBinding>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VocabularyAnnotation {
    pub target: AnnotationTarget,
    pub term: TermRef,
    pub qualifier: Option<String>,
    pub body: AnnotationBody,
}

/// Every element that can live in the model arena.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    EntityContainer(EntityContainer),
    EntitySet(EntitySet),
    FunctionImport(FunctionImport),
    EntityType(EntityType),
    ComplexType(ComplexType),
    RowType(RowType),
    EnumType(EnumType),
    EnumMember(EnumMember),
    StructuralProperty(StructuralProperty),
    NavigationProperty(NavigationProperty),
    Function(Function),
    Parameter(Parameter),
    ValueTerm(ValueTerm),
    Annotation(VocabularyAnnotation),
}

impl Element {
    /// The element's own name, if it is a named element.
    pub fn name(&self) -> Option<&str> {
        match self {
            Element::EntityContainer(e) => Some(&e.name),
            Element::EntitySet(e) => Some(&e.name),
            Element::FunctionImport(e) => Some(&e.signature.name),
            Element::EntityType(e) => Some(&e.name),
            Element::ComplexType(e) => Some(&e.name),
            Element::EnumType(e) => Some(&e.name),
            Element::EnumMember(e) => Some(&e.name),
            Element::StructuralProperty(e) => Some(&e.name),
            Element::NavigationProperty(e) => Some(&e.name),
            Element::Function(e) => Some(&e.signature.name),
            Element::Parameter(e) => Some(&e.name),
            Element::ValueTerm(e) => Some(&e.name),
            Element::RowType(_) | Element::Annotation(_) => None,
        }
    }

    /// The namespace of a schema element.
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Element::EntityContainer(e) => Some(&e.namespace),
            Element::EntityType(e) => Some(&e.namespace),
            Element::ComplexType(e) => Some(&e.namespace),
            Element::EnumType(e) => Some(&e.namespace),
            Element::Function(e) => Some(&e.namespace),
            Element::ValueTerm(e) => Some(&e.namespace),
            _ => None,
        }
    }

    pub fn structure(&self) -> Option<&StructuredType> {
        match self {
            Element::EntityType(e) => Some(&e.structure),
            Element::ComplexType(e) => Some(&e.structure),
            Element::RowType(e) => Some(&e.structure),
            _ => None,
        }
    }

    pub fn signature(&self) -> Option<&FunctionSignature> {
        match self {
            Element::Function(f) => Some(&f.signature),
            Element::FunctionImport(f) => Some(&f.signature),
            _ => None,
        }
    }

    pub fn is_container_member(&self) -> bool {
        matches!(self, Element::EntitySet(_) | Element::FunctionImport(_))
    }
}
