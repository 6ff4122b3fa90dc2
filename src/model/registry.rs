//! registry.rs
//! Arena storage for the model graph with a columnar location table.

use super::element::*;
use super::expression::{ExprId, Expression};
use super::types::{PrimitiveKind, TypeDef, TypeRef};
use super::version::EdmVersion;

/// A read-only (once built) EDM model.
///
/// Elements and expressions are addressed by handle. The builder methods only
/// append or patch entries; the validator itself uses the accessors exclusively.
#[derive(Debug, Clone, Default)]
pub struct EdmModel {
    elements: Vec<Element>,
    locations: Vec<Option<Location>>,
    expressions: Vec<Expression>,
    expression_locations: Vec<Option<Location>>,

    // Roots of the traversal, in declaration order.
    schema_elements: Vec<ElementId>,
    containers: Vec<ElementId>,
    annotations: Vec<ElementId>,

    version: Option<EdmVersion>,
}

impl EdmModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(version: EdmVersion) -> Self {
        Self { version: Some(version), ..Self::default() }
    }

    // --- Storage ---

    fn push(&mut self, element: Element) -> ElementId {
        let id = ElementId::new(self.elements.len());
        self.elements.push(element);
        self.locations.push(None);
        id
    }

    pub fn add_expression(&mut self, expression: Expression) -> ExprId {
        let id = ExprId::new(self.expressions.len());
        self.expressions.push(expression);
        self.expression_locations.push(None);
        id
    }

    pub fn set_location(&mut self, id: ElementId, location: Location) {
        if let Some(slot) = self.locations.get_mut(id.index()) {
            *slot = Some(location);
        }
    }

    pub fn set_expression_location(&mut self, id: ExprId, location: Location) {
        if let Some(slot) = self.expression_locations.get_mut(id.index()) {
            *slot = Some(location);
        }
    }

    pub fn set_version(&mut self, version: EdmVersion) {
        self.version = Some(version);
    }

    /// Mutable access for patching an element after it was added.
    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id.index())
    }

    // --- Builders: schema types ---

    pub fn add_entity_type(&mut self, namespace: &str, name: &str) -> ElementId {
        let id = self.push(Element::EntityType(EntityType {
            namespace: namespace.to_string(),
            name: name.to_string(),
            structure: StructuredType::default(),
            declared_key: None,
        }));
        self.schema_elements.push(id);
        id
    }

    pub fn add_complex_type(&mut self, namespace: &str, name: &str) -> ElementId {
        let id = self.push(Element::ComplexType(ComplexType {
            namespace: namespace.to_string(),
            name: name.to_string(),
            structure: StructuredType::default(),
        }));
        self.schema_elements.push(id);
        id
    }

    /// Row types are anonymous and are not schema roots.
    pub fn add_row_type(&mut self) -> ElementId {
        self.push(Element::RowType(RowType::default()))
    }

    pub fn add_enum_type(&mut self, namespace: &str, name: &str, underlying_type: PrimitiveKind) -> ElementId {
        let id = self.push(Element::EnumType(EnumType {
            namespace: namespace.to_string(),
            name: name.to_string(),
            underlying_type,
            is_flags: false,
            members: Vec::new(),
        }));
        self.schema_elements.push(id);
        id
    }

    pub fn add_enum_member(&mut self, enum_type: ElementId, name: &str, value: i64) -> ElementId {
        let id = self.push(Element::EnumMember(EnumMember {
            name: name.to_string(),
            declaring_type: enum_type,
            value,
        }));
        if let Some(Element::EnumType(e)) = self.elements.get_mut(enum_type.index()) {
            e.members.push(id);
        }
        id
    }

    pub fn add_structural_property(&mut self, declaring_type: ElementId, name: &str, type_ref: TypeRef) -> ElementId {
        let id = self.push(Element::StructuralProperty(StructuralProperty {
            name: name.to_string(),
            declaring_type,
            type_ref,
            default_value: None,
            concurrency_mode: ConcurrencyMode::None,
        }));
        self.attach_property(declaring_type, id);
        id
    }

    pub fn add_navigation_property(&mut self, declaring_type: ElementId, name: &str, type_ref: TypeRef) -> ElementId {
        let id = self.push(Element::NavigationProperty(NavigationProperty {
            name: name.to_string(),
            declaring_type,
            type_ref,
            partner: None,
            dependent_properties: None,
            contains_target: false,
            on_delete: OnDeleteAction::None,
        }));
        self.attach_property(declaring_type, id);
        id
    }

    fn attach_property(&mut self, declaring_type: ElementId, property: ElementId) {
        if let Some(structure) = self.structure_mut(declaring_type) {
            structure.declared_properties.push(property);
        }
    }

    pub fn structure_mut(&mut self, id: ElementId) -> Option<&mut StructuredType> {
        match self.elements.get_mut(id.index())? {
            Element::EntityType(e) => Some(&mut e.structure),
            Element::ComplexType(e) => Some(&mut e.structure),
            Element::RowType(e) => Some(&mut e.structure),
            _ => None,
        }
    }

    pub fn navigation_mut(&mut self, id: ElementId) -> Option<&mut NavigationProperty> {
        match self.elements.get_mut(id.index())? {
            Element::NavigationProperty(n) => Some(n),
            _ => None,
        }
    }

    pub fn set_base_type(&mut self, id: ElementId, base: TypeDef) {
        if let Some(structure) = self.structure_mut(id) {
            structure.base_type = Some(base);
        }
    }

    pub fn set_key(&mut self, entity_type: ElementId, key: Vec<ElementId>) {
        if let Some(Element::EntityType(e)) = self.elements.get_mut(entity_type.index()) {
            e.declared_key = Some(key);
        }
    }

    /// Makes two navigation properties each other's partner.
    pub fn set_partners(&mut self, a: ElementId, b: ElementId) {
        if let Some(nav) = self.navigation_mut(a) {
            nav.partner = Some(b);
        }
        if let Some(nav) = self.navigation_mut(b) {
            nav.partner = Some(a);
        }
    }

    pub fn set_dependent_properties(&mut self, navigation: ElementId, properties: Vec<ElementId>) {
        if let Some(nav) = self.navigation_mut(navigation) {
            nav.dependent_properties = Some(properties);
        }
    }

    // --- Builders: functions and terms ---

    pub fn add_function(&mut self, namespace: &str, name: &str, return_type: Option<TypeRef>) -> ElementId {
        let id = self.push(Element::Function(Function {
            namespace: namespace.to_string(),
            signature: FunctionSignature { name: name.to_string(), return_type, parameters: Vec::new() },
            defining_expression: None,
        }));
        self.schema_elements.push(id);
        id
    }

    pub fn add_parameter(&mut self, function: ElementId, name: &str, type_ref: TypeRef) -> ElementId {
        let id = self.push(Element::Parameter(Parameter {
            name: name.to_string(),
            type_ref,
            mode: ParameterMode::In,
            declaring_function: function,
        }));
        match self.elements.get_mut(function.index()) {
            Some(Element::Function(f)) => f.signature.parameters.push(id),
            Some(Element::FunctionImport(f)) => f.signature.parameters.push(id),
            _ => {}
        }
        id
    }

    pub fn add_value_term(&mut self, namespace: &str, name: &str, type_ref: TypeRef) -> ElementId {
        let id = self.push(Element::ValueTerm(ValueTerm {
            namespace: namespace.to_string(),
            name: name.to_string(),
            type_ref,
        }));
        self.schema_elements.push(id);
        id
    }

    // --- Builders: containers ---

    pub fn add_entity_container(&mut self, namespace: &str, name: &str) -> ElementId {
        let id = self.push(Element::EntityContainer(EntityContainer {
            namespace: namespace.to_string(),
            name: name.to_string(),
            elements: Vec::new(),
        }));
        self.containers.push(id);
        id
    }

    /// Lists an arbitrary element as a container member.
    pub fn add_container_element(&mut self, container: ElementId, element: ElementId) {
        if let Some(Element::EntityContainer(c)) = self.elements.get_mut(container.index()) {
            c.elements.push(element);
        }
    }

    pub fn add_entity_set(&mut self, container: ElementId, name: &str, element_type: TypeDef) -> ElementId {
        let id = self.push(Element::EntitySet(EntitySet {
            name: name.to_string(),
            container,
            element_type,
            navigation_targets: Vec::new(),
        }));
        self.add_container_element(container, id);
        id
    }

    pub fn add_function_import(&mut self, container: ElementId, name: &str, return_type: Option<TypeRef>) -> ElementId {
        let id = self.push(Element::FunctionImport(FunctionImport {
            container,
            signature: FunctionSignature { name: name.to_string(), return_type, parameters: Vec::new() },
            entity_set: None,
            is_side_effecting: false,
            is_composable: false,
            is_bindable: false,
        }));
        self.add_container_element(container, id);
        id
    }

    pub fn add_navigation_target(&mut self, entity_set: ElementId, navigation_property: ElementId, target_set: ElementId) {
        if let Some(Element::EntitySet(s)) = self.elements.get_mut(entity_set.index()) {
            s.navigation_targets.push(NavigationTargetMapping { navigation_property, target_set });
        }
    }

    // --- Builders: annotations ---

    pub fn add_annotation(
        &mut self,
        target: AnnotationTarget,
        term: TermRef,
        qualifier: Option<&str>,
        body: AnnotationBody,
    ) -> ElementId {
        let id = self.push(Element::Annotation(VocabularyAnnotation {
            target,
            term,
            qualifier: qualifier.map(str::to_string),
            body,
        }));
        self.annotations.push(id);
        id
    }

    // --- Accessors ---

    pub fn version(&self) -> Option<EdmVersion> {
        self.version
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.index())
    }

    pub fn location(&self, id: ElementId) -> Option<&Location> {
        self.locations.get(id.index())?.as_ref()
    }

    pub fn expression(&self, id: ExprId) -> Option<&Expression> {
        self.expressions.get(id.index())
    }

    pub fn expression_location(&self, id: ExprId) -> Option<&Location> {
        self.expression_locations.get(id.index())?.as_ref()
    }

    pub fn schema_elements(&self) -> &[ElementId] {
        &self.schema_elements
    }

    pub fn containers(&self) -> &[ElementId] {
        &self.containers
    }

    pub fn annotations(&self) -> &[ElementId] {
        &self.annotations
    }

    pub fn structure(&self, id: ElementId) -> Option<&StructuredType> {
        self.element(id)?.structure()
    }

    pub fn as_entity_type(&self, id: ElementId) -> Option<&EntityType> {
        match self.element(id)? {
            Element::EntityType(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_structural_property(&self, id: ElementId) -> Option<&StructuralProperty> {
        match self.element(id)? {
            Element::StructuralProperty(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_navigation_property(&self, id: ElementId) -> Option<&NavigationProperty> {
        match self.element(id)? {
            Element::NavigationProperty(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_entity_set(&self, id: ElementId) -> Option<&EntitySet> {
        match self.element(id)? {
            Element::EntitySet(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_parameter(&self, id: ElementId) -> Option<&Parameter> {
        match self.element(id)? {
            Element::Parameter(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_container(&self, id: ElementId) -> Option<&EntityContainer> {
        match self.element(id)? {
            Element::EntityContainer(c) => Some(c),
            _ => None,
        }
    }

    pub fn signature(&self, id: ElementId) -> Option<&FunctionSignature> {
        self.element(id)?.signature()
    }

    pub fn name_of(&self, id: ElementId) -> &str {
        self.element(id).and_then(Element::name).unwrap_or("")
    }

    /// `Namespace.Name` for schema elements, the bare name otherwise.
    pub fn qualified_name(&self, id: ElementId) -> String {
        match self.element(id) {
            Some(element) => match (element.namespace(), element.name()) {
                (Some(ns), Some(name)) => format!("{}.{}", ns, name),
                (None, Some(name)) => name.to_string(),
                _ => format!("#{}", id.0),
            },
            None => format!("#{}", id.0),
        }
    }

    /// Name and type of a structural or navigation property.
    pub fn property(&self, id: ElementId) -> Option<(&str, &TypeRef, ElementId)> {
        match self.element(id)? {
            Element::StructuralProperty(p) => Some((&p.name, &p.type_ref, p.declaring_type)),
            Element::NavigationProperty(p) => Some((&p.name, &p.type_ref, p.declaring_type)),
            _ => None,
        }
    }
}
