//! The dispatch engine: walks the model graph and applies every matching rule.
use super::context::{Owner, ValidationContext};
use super::error::EdmError;
use super::rule::{NodeKind, Phase};
use super::rule_set::RuleSet;
use crate::model::{AnnotationBody, AnnotationTarget, EdmModel, Element, ElementId, ExprId, TypeDef, TypeRef};
use std::collections::{HashSet, VecDeque};
use tracing::trace;

/// A validation of one model against one rule set.
///
/// Nothing is computed up front. `is_valid` walks only as far as the first
/// diagnostic, and every call to `errors` starts a fresh walk.
#[derive(Debug, Clone, Copy)]
pub struct Validation<'m> {
    model: &'m EdmModel,
    rules: &'m RuleSet,
}

impl<'m> Validation<'m> {
    pub fn new(model: &'m EdmModel, rules: &'m RuleSet) -> Self {
        Self { model, rules }
    }

    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    /// A lazy sequence of every diagnostic, in walk order.
    pub fn errors(&self) -> Diagnostics<'m> {
        Diagnostics::new(self.model, self.rules)
    }

    pub fn rules(&self) -> &'m RuleSet {
        self.rules
    }
}

#[derive(Debug, Clone, Copy)]
enum Node<'m> {
    Model,
    Element(ElementId),
    Expression(ExprId),
    TypeRef(Owner, &'m TypeRef),
}

/// Iterator over the diagnostics of one walk.
///
/// The walk is depth first with an explicit stack. It runs twice: once with the
/// structural rules, which decide `is_bad`, then once with the semantic rules.
pub struct Diagnostics<'m> {
    model: &'m EdmModel,
    rules: &'m RuleSet,
    ctx: ValidationContext<'m>,
    phase: Phase,
    stack: Vec<Node<'m>>,
    visited_elements: HashSet<ElementId>,
    visited_expressions: HashSet<ExprId>,
    pending: VecDeque<EdmError>,
    finished: bool,
}

impl<'m> Diagnostics<'m> {
    fn new(model: &'m EdmModel, rules: &'m RuleSet) -> Self {
        Self {
            model,
            rules,
            ctx: ValidationContext::new(model),
            phase: Phase::Structural,
            stack: vec![Node::Model],
            visited_elements: HashSet::new(),
            visited_expressions: HashSet::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    fn advance_phase(&mut self) {
        match self.phase {
            Phase::Structural => {
                trace!("structural pass complete, starting semantic pass");
                self.phase = Phase::Semantic;
                self.visited_elements.clear();
                self.visited_expressions.clear();
                self.stack.push(Node::Model);
            }
            Phase::Semantic => self.finished = true,
        }
    }

    fn visit(&mut self, node: Node<'m>) {
        let mut children: Vec<Node<'m>> = Vec::new();
        match node {
            Node::Model => {
                for rule in self.rules.rules_for(NodeKind::Model, self.phase) {
                    rule.apply_to_model(&mut self.ctx);
                }
                let model = self.model;
                children.extend(model.schema_elements().iter().map(|&id| Node::Element(id)));
                children.extend(model.containers().iter().map(|&id| Node::Element(id)));
                children.extend(model.annotations().iter().map(|&id| Node::Element(id)));
            }
            Node::Element(id) => {
                if !self.visited_elements.insert(id) {
                    return;
                }
                let Some(element) = self.model.element(id) else {
                    return;
                };
                let before = self.ctx.error_count();
                for rule in self.rules.rules_for(NodeKind::of(element), self.phase) {
                    rule.apply_to_element(&mut self.ctx, id, element);
                }
                if self.phase == Phase::Structural && self.ctx.error_count() > before {
                    self.ctx.mark_bad(id);
                }
                element_children(self.model, id, element, &mut children);
            }
            Node::Expression(id) => {
                if !self.visited_expressions.insert(id) {
                    return;
                }
                let Some(expression) = self.model.expression(id) else {
                    return;
                };
                for rule in self.rules.rules_for(NodeKind::Expression, self.phase) {
                    rule.apply_to_expression(&mut self.ctx, id, expression);
                }
                children.extend(expression.children().into_iter().map(Node::Expression));
                children.extend(expression.type_refs().into_iter().map(|t| Node::TypeRef(Owner::Expression(id), t)));
            }
            Node::TypeRef(owner, type_ref) => {
                let before = self.ctx.error_count();
                for rule in self.rules.rules_for(NodeKind::TypeReference, self.phase) {
                    rule.apply_to_type_ref(&mut self.ctx, owner, type_ref);
                }
                if let (Phase::Structural, Owner::Element(id)) = (self.phase, owner) {
                    if self.ctx.error_count() > before {
                        self.ctx.mark_bad(id);
                    }
                }
                match &type_ref.definition {
                    TypeDef::Collection(element) => children.push(Node::TypeRef(owner, &**element)),
                    TypeDef::Schema(id) if matches!(self.model.element(*id), Some(Element::RowType(_))) => {
                        children.push(Node::Element(*id))
                    }
                    _ => {}
                }
            }
        }
        // Reversed so that children are visited in declaration order.
        self.stack.extend(children.into_iter().rev());
        self.pending.extend(self.ctx.take_errors());
    }
}

fn element_children<'m>(model: &'m EdmModel, id: ElementId, element: &'m Element, out: &mut Vec<Node<'m>>) {
    let owner = Owner::Element(id);
    match element {
        Element::EntityType(e) => push_structure(&e.structure, out),
        Element::ComplexType(e) => push_structure(&e.structure, out),
        Element::RowType(e) => push_structure(&e.structure, out),
        Element::EnumType(e) => out.extend(e.members.iter().map(|&m| Node::Element(m))),
        Element::StructuralProperty(p) => out.push(Node::TypeRef(owner, &p.type_ref)),
        Element::NavigationProperty(n) => {
            out.push(Node::TypeRef(owner, &n.type_ref));
            out.extend(n.partner.map(Node::Element));
        }
        Element::Function(f) => {
            out.extend(f.signature.parameters.iter().map(|&p| Node::Element(p)));
            out.extend(f.signature.return_type.as_ref().map(|t| Node::TypeRef(owner, t)));
        }
        Element::FunctionImport(f) => {
            out.extend(f.signature.parameters.iter().map(|&p| Node::Element(p)));
            out.extend(f.signature.return_type.as_ref().map(|t| Node::TypeRef(owner, t)));
        }
        Element::Parameter(p) => out.push(Node::TypeRef(owner, &p.type_ref)),
        Element::ValueTerm(t) => out.push(Node::TypeRef(owner, &t.type_ref)),
        Element::EntityContainer(c) => out.extend(c.elements.iter().map(|&e| Node::Element(e))),
        Element::EntitySet(s) => out.extend(s.navigation_targets.iter().map(|m| Node::Element(m.target_set))),
        Element::Annotation(a) => {
            if let AnnotationTarget::Element(target) = a.target {
                if model.element(target).is_some() {
                    out.push(Node::Element(target));
                }
            }
            match &a.body {
                AnnotationBody::Value(value) => out.push(Node::Expression(*value)),
                AnnotationBody::Type(bindings) => out.extend(bindings.iter().map(|b| Node::Expression(b.value))),
            }
        }
        Element::EnumMember(_) => {}
    }
}

fn push_structure<'m>(structure: &'m crate::model::StructuredType, out: &mut Vec<Node<'m>>) {
    if let Some(base) = structure.base_type.as_ref().and_then(TypeDef::schema_id) {
        out.push(Node::Element(base));
    }
    out.extend(structure.declared_properties.iter().map(|&p| Node::Element(p)));
}

impl Iterator for Diagnostics<'_> {
    type Item = EdmError;

    fn next(&mut self) -> Option<EdmError> {
        loop {
            if let Some(error) = self.pending.pop_front() {
                return Some(error);
            }
            if self.finished {
                return None;
            }
            match self.stack.pop() {
                Some(node) => self.visit(node),
                None => self.advance_phase(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdmVersion, Location, PrimitiveKind};
    use crate::validation::error::ErrorKind;

    fn customers() -> EdmModel {
        let mut model = EdmModel::new();
        let customer = model.add_entity_type("Sales", "Customer");
        let id = model.add_structural_property(customer, "Id", TypeRef::primitive(PrimitiveKind::Int32, false));
        model.add_structural_property(customer, "Name", TypeRef::primitive(PrimitiveKind::String, true));
        model.set_key(customer, vec![id]);
        let container = model.add_entity_container("Sales", "Store");
        model.add_entity_set(container, "Customers", TypeDef::Schema(customer));
        model
    }

    fn codes(validation: &Validation<'_>) -> Vec<ErrorKind> {
        validation.errors().map(|e| e.code).collect()
    }

    #[test]
    fn test_well_formed_model_is_valid() {
        let model = customers();
        let validation = Validation::new(&model, RuleSet::for_version(EdmVersion::V3));
        assert!(validation.is_valid());
        assert_eq!(validation.errors().count(), 0);
    }

    #[test]
    fn test_errors_are_deterministic_and_restartable() {
        let mut model = customers();
        model.add_entity_type("Sales", "Keyless");
        model.add_entity_type("Sales", "2Bad");
        let validation = Validation::new(&model, RuleSet::for_version(EdmVersion::V3));

        let first: Vec<EdmError> = validation.errors().collect();
        let second: Vec<EdmError> = validation.errors().collect();
        assert!(!first.is_empty());
        assert_eq!(first, second);
        assert!(!validation.is_valid());
    }

    #[test]
    fn test_cycles_terminate_without_duplicate_errors() {
        let mut model = EdmModel::new();
        let a = model.add_entity_type("Graph", "A");
        let b = model.add_entity_type("Graph", "B");
        model.set_base_type(a, TypeDef::Schema(b));
        model.set_base_type(b, TypeDef::Schema(a));
        let to_b = model.add_navigation_property(a, "ToB", TypeRef::schema(b, true));
        let to_a = model.add_navigation_property(b, "ToA", TypeRef::schema(a, true));
        model.set_partners(to_b, to_a);
        for (line, id) in [a, b, to_b, to_a].into_iter().enumerate() {
            model.set_location(id, Location::new("graph.csdl", line as u32 + 1, 1));
        }

        let errors: Vec<EdmError> = Validation::new(&model, RuleSet::for_version(EdmVersion::V3)).errors().collect();
        let cyclic = errors.iter().filter(|e| e.code == ErrorKind::BadCyclicEntity).count();
        assert_eq!(cyclic, 2);

        let mut seen = HashSet::new();
        for error in &errors {
            assert!(seen.insert((error.code, error.location.clone(), error.message.clone())), "duplicate: {}", error);
        }
    }

    #[test]
    fn test_structural_errors_suppress_derived_ones() {
        let mut model = EdmModel::new();
        // Keyless, but the bad name is reported first and marks the type.
        model.add_entity_type("Sales", "");
        let validation = Validation::new(&model, RuleSet::for_version(EdmVersion::V3));
        assert_eq!(codes(&validation), vec![ErrorKind::InvalidName]);
    }

    #[test]
    fn test_equivalent_imports_are_both_duplicates() {
        let mut model = customers();
        let container = model.containers()[0];
        model.add_function_import(container, "Refresh", None);
        model.add_function_import(container, "Refresh", None);
        let validation = Validation::new(&model, RuleSet::for_version(EdmVersion::V3));
        let duplicates = codes(&validation)
            .into_iter()
            .filter(|c| *c == ErrorKind::DuplicateEntityContainerMemberName)
            .count();
        assert_eq!(duplicates, 2);
    }

    #[test]
    fn test_overloaded_imports_are_not_duplicates() {
        let mut model = customers();
        let container = model.containers()[0];
        model.add_function_import(container, "Refresh", None);
        let overload = model.add_function_import(container, "Refresh", None);
        model.add_parameter(overload, "Since", TypeRef::primitive(PrimitiveKind::DateTime, false));
        let validation = Validation::new(&model, RuleSet::for_version(EdmVersion::V3));
        assert!(!codes(&validation).contains(&ErrorKind::DuplicateEntityContainerMemberName));
    }

    #[test]
    fn test_enums_are_gated_by_version() {
        let mut model = customers();
        let color = model.add_enum_type("Sales", "Color", PrimitiveKind::Int32);
        model.add_enum_member(color, "Red", 0);

        let v2 = Validation::new(&model, RuleSet::for_version(EdmVersion::V2));
        assert_eq!(codes(&v2), vec![ErrorKind::EnumsNotSupportedBeforeV3]);
        assert!(Validation::new(&model, RuleSet::for_version(EdmVersion::V3)).is_valid());
    }

    #[test]
    fn test_row_types_are_reached_through_type_references() {
        let mut model = customers();
        let row = model.add_row_type();
        model.add_value_term("Sales", "Shape", TypeRef::schema(row, true));
        let validation = Validation::new(&model, RuleSet::for_version(EdmVersion::V3));
        assert_eq!(codes(&validation), vec![ErrorKind::RowTypeMustHaveProperties]);
    }

    #[test]
    fn test_empty_rule_set_reports_nothing() {
        let mut model = customers();
        model.add_entity_type("", "");
        let rules = RuleSet::new([]);
        assert!(Validation::new(&model, &rules).is_valid());
    }
}
