//! Per-run state shared by every rule: the error sink and the set of elements
//! already known to be broken.
use super::error::{EdmError, ErrorKind};
use crate::model::topology::{containment_graph, cyclic_base_types};
use crate::model::{EdmModel, ElementId, ExprId, Location, TypeDef};
use petgraph::graphmap::DiGraphMap;
use std::cell::OnceCell;
use std::collections::HashSet;

/// What a type reference hangs off, for locating diagnostics about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Element(ElementId),
    Expression(ExprId),
}

/// The mutable state of one validation run.
///
/// Created fresh for every enumeration of the diagnostics, so two walks never
/// share errors or `is_bad` knowledge.
pub struct ValidationContext<'m> {
    model: &'m EdmModel,
    errors: Vec<EdmError>,
    bad: HashSet<ElementId>,
    cyclic: OnceCell<HashSet<ElementId>>,
    containment: OnceCell<DiGraphMap<ElementId, ()>>,
}

impl<'m> ValidationContext<'m> {
    pub fn new(model: &'m EdmModel) -> Self {
        Self {
            model,
            errors: Vec::new(),
            bad: HashSet::new(),
            cyclic: OnceCell::new(),
            containment: OnceCell::new(),
        }
    }

    #[inline]
    pub fn model(&self) -> &'m EdmModel {
        self.model
    }

    pub fn add_error(&mut self, location: Option<Location>, code: ErrorKind, message: impl Into<String>) {
        self.errors.push(EdmError::new(location, code, message));
    }

    pub fn push(&mut self, error: EdmError) {
        self.errors.push(error);
    }

    /// Reports against the declaration site of `id`.
    pub fn error_at(&mut self, id: ElementId, code: ErrorKind, message: impl Into<String>) {
        let location = self.location_of(id);
        self.add_error(location, code, message);
    }

    pub fn location_of(&self, id: ElementId) -> Option<Location> {
        self.model.location(id).cloned()
    }

    pub fn location_of_owner(&self, owner: Owner) -> Option<Location> {
        match owner {
            Owner::Element(id) => self.location_of(id),
            Owner::Expression(id) => self.model.expression_location(id).cloned(),
        }
    }

    /// Whether a structural rule already reported against `id` in this run.
    pub fn is_bad(&self, id: ElementId) -> bool {
        self.bad.contains(&id)
    }

    /// Unresolved definitions are always bad; named ones defer to `is_bad`.
    pub fn is_bad_type(&self, definition: &TypeDef) -> bool {
        match definition {
            TypeDef::Bad(_) => true,
            TypeDef::Schema(id) | TypeDef::EntityReference(id) => self.is_bad(*id),
            TypeDef::Collection(element) => self.is_bad_type(&element.definition),
            TypeDef::None | TypeDef::Primitive(_) => false,
        }
    }

    pub(crate) fn mark_bad(&mut self, id: ElementId) {
        self.bad.insert(id);
    }

    pub(crate) fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub(crate) fn take_errors(&mut self) -> Vec<EdmError> {
        std::mem::take(&mut self.errors)
    }

    /// Structured types taking part in a base-type cycle. Computed on first use.
    pub fn cyclic_base_types(&self) -> &HashSet<ElementId> {
        self.cyclic.get_or_init(|| cyclic_base_types(self.model))
    }

    /// Containing-type to contained-type edges. Computed on first use.
    pub fn containment(&self) -> &DiGraphMap<ElementId, ()> {
        self.containment.get_or_init(|| containment_graph(self.model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BadType, BadTypeReason, TypeRef};

    #[test]
    fn test_bad_definitions() {
        let mut model = EdmModel::new();
        let a = model.add_entity_type("NS", "A");
        let mut ctx = ValidationContext::new(&model);

        let unresolved = TypeDef::Bad(BadType { name: "NS.Missing".into(), reason: BadTypeReason::Unresolved });
        assert!(ctx.is_bad_type(&unresolved));
        assert!(!ctx.is_bad_type(&TypeDef::Schema(a)));

        ctx.mark_bad(a);
        assert!(ctx.is_bad_type(&TypeDef::Schema(a)));
        assert!(ctx.is_bad_type(&TypeDef::Collection(Box::new(TypeRef::schema(a, false)))));
    }

    #[test]
    fn test_errors_are_taken_in_order() {
        let mut model = EdmModel::new();
        let a = model.add_entity_type("NS", "A");
        model.set_location(a, Location::new("schema.csdl", 3, 5));
        let mut ctx = ValidationContext::new(&model);

        ctx.error_at(a, ErrorKind::KeyMissingOnEntityType, "first");
        ctx.add_error(None, ErrorKind::InvalidName, "second");
        assert_eq!(ctx.error_count(), 2);

        let errors = ctx.take_errors();
        assert_eq!(errors[0].location, Some(Location::new("schema.csdl", 3, 5)));
        assert_eq!(errors[1].message, "second");
        assert_eq!(ctx.error_count(), 0);
    }
}
