//! Nominal inheritance, type equivalence and other read-only relations over the model.
use super::element::{Element, ElementId};
use super::registry::EdmModel;
use super::types::{Multiplicity, TypeDef, TypeKind, TypeRef};
use std::collections::HashSet;

impl EdmModel {
    /// The resolved direct base type of a structured type.
    pub fn base_type(&self, id: ElementId) -> Option<ElementId> {
        self.structure(id)?.base_type.as_ref()?.schema_id()
    }

    /// Every ancestor of `id`, nearest first. Stops at the first repeat so a
    /// cyclic hierarchy yields a finite chain.
    pub fn base_types(&self, id: ElementId) -> Vec<ElementId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut current = self.base_type(id);
        while let Some(base) = current {
            if !seen.insert(base) {
                break;
            }
            chain.push(base);
            current = self.base_type(base);
        }
        chain
    }

    pub fn inherits_from(&self, derived: ElementId, base: ElementId) -> bool {
        derived == base || self.base_types(derived).contains(&base)
    }

    /// Inherited properties first (root-most type first), then declared ones.
    pub fn properties(&self, id: ElementId) -> Vec<ElementId> {
        let mut chain = self.base_types(id);
        chain.reverse();
        chain.push(id);
        chain
            .iter()
            .filter_map(|t| self.structure(*t))
            .flat_map(|s| s.declared_properties.iter().copied())
            .collect()
    }

    /// Looks a property up by name on a type and then on its ancestors.
    pub fn find_property(&self, type_id: ElementId, name: &str) -> Option<ElementId> {
        std::iter::once(type_id).chain(self.base_types(type_id)).find_map(|t| {
            self.structure(t)?
                .declared_properties
                .iter()
                .copied()
                .find(|p| self.name_of(*p) == name)
        })
    }

    /// The effective key: the nearest declared key in the hierarchy.
    pub fn key(&self, entity_type: ElementId) -> Vec<ElementId> {
        std::iter::once(entity_type)
            .chain(self.base_types(entity_type))
            .find_map(|t| self.as_entity_type(t)?.declared_key.clone())
            .unwrap_or_default()
    }

    pub fn is_open(&self, id: ElementId) -> bool {
        std::iter::once(id)
            .chain(self.base_types(id))
            .any(|t| self.structure(t).is_some_and(|s| s.is_open))
    }

    pub fn type_kind(&self, definition: &TypeDef) -> TypeKind {
        match definition {
            TypeDef::None | TypeDef::Bad(_) => TypeKind::None,
            TypeDef::Primitive(_) => TypeKind::Primitive,
            TypeDef::Collection(_) => TypeKind::Collection,
            TypeDef::EntityReference(_) => TypeKind::EntityReference,
            TypeDef::Schema(id) => match self.element(*id) {
                Some(Element::EntityType(_)) => TypeKind::Entity,
                Some(Element::ComplexType(_)) => TypeKind::Complex,
                Some(Element::RowType(_)) => TypeKind::Row,
                Some(Element::EnumType(_)) => TypeKind::Enum,
                _ => TypeKind::None,
            },
        }
    }

    /// The structured type a definition names, if any.
    pub fn structured_definition(&self, definition: &TypeDef) -> Option<ElementId> {
        let id = definition.schema_id()?;
        self.structure(id).map(|_| id)
    }

    /// Nominal subtyping: identical definitions, or a structured/entity-reference
    /// type deriving from the expected one. Collections compare element-wise.
    pub fn is_or_inherits_from(&self, actual: &TypeDef, expected: &TypeDef) -> bool {
        match (actual, expected) {
            (TypeDef::Schema(a), TypeDef::Schema(b)) | (TypeDef::EntityReference(a), TypeDef::EntityReference(b)) => {
                self.inherits_from(*a, *b)
            }
            (TypeDef::Collection(a), TypeDef::Collection(b)) => {
                self.is_or_inherits_from(&a.definition, &b.definition)
            }
            _ => self.is_equivalent(actual, expected),
        }
    }

    /// Structural/nominal equivalence of two definitions.
    pub fn is_equivalent(&self, a: &TypeDef, b: &TypeDef) -> bool {
        match (a, b) {
            (TypeDef::Primitive(x), TypeDef::Primitive(y)) => x == y,
            (TypeDef::Collection(x), TypeDef::Collection(y)) => self.type_ref_equivalent(x, y),
            (TypeDef::Schema(x), TypeDef::Schema(y)) => x == y,
            (TypeDef::EntityReference(x), TypeDef::EntityReference(y)) => x == y,
            _ => false,
        }
    }

    /// Equivalence of two references, including nullability and primitive facets.
    pub fn type_ref_equivalent(&self, a: &TypeRef, b: &TypeRef) -> bool {
        a.nullable == b.nullable
            && self.is_equivalent(&a.definition, &b.definition)
            && (a.primitive_kind().is_none() || a.facets == b.facets)
    }

    /// A printable name for a type definition.
    pub fn type_name(&self, definition: &TypeDef) -> String {
        match definition {
            TypeDef::None => "None".to_string(),
            TypeDef::Primitive(kind) => kind.to_string(),
            TypeDef::Collection(element) => format!("Collection({})", self.type_name(&element.definition)),
            TypeDef::Schema(id) => self.qualified_name(*id),
            TypeDef::EntityReference(id) => format!("Ref({})", self.qualified_name(*id)),
            TypeDef::Bad(bad) => bad.name.clone(),
        }
    }

    /// The entity type a navigation property points at, looking through collections.
    pub fn navigation_target(&self, navigation: ElementId) -> Option<ElementId> {
        let nav = self.as_navigation_property(navigation)?;
        let definition = match &nav.type_ref.definition {
            TypeDef::Collection(element) => &element.definition,
            other => other,
        };
        let id = definition.schema_id()?;
        self.as_entity_type(id).map(|_| id)
    }

    /// Multiplicity of the end a navigation property is declared on.
    ///
    /// This is read off the partner's type: a collection partner means this end
    /// is `Many`. Without a partner the end is `One`.
    pub fn multiplicity(&self, navigation: ElementId) -> Multiplicity {
        self.as_navigation_property(navigation)
            .and_then(|nav| nav.partner)
            .and_then(|partner| self.as_navigation_property(partner))
            .map_or(Multiplicity::One, |partner| Self::multiplicity_of(&partner.type_ref))
    }

    pub fn multiplicity_of(type_ref: &TypeRef) -> Multiplicity {
        if type_ref.is_collection() {
            Multiplicity::Many
        } else if type_ref.nullable {
            Multiplicity::ZeroOrOne
        } else {
            Multiplicity::One
        }
    }

    /// The set a navigation property of `entity_set` is mapped to.
    pub fn find_navigation_target(&self, entity_set: ElementId, navigation: ElementId) -> Option<ElementId> {
        self.as_entity_set(entity_set)?
            .navigation_targets
            .iter()
            .find(|m| m.navigation_property == navigation)
            .map(|m| m.target_set)
    }

    /// Same name, equivalent return type and pairwise-equivalent parameters.
    pub fn signatures_equivalent(&self, a: ElementId, b: ElementId) -> bool {
        if a == b {
            return true;
        }
        let (Some(left), Some(right)) = (self.signature(a), self.signature(b)) else {
            return false;
        };
        if left.name != right.name || left.parameters.len() != right.parameters.len() {
            return false;
        }
        let returns_match = match (&left.return_type, &right.return_type) {
            (None, None) => true,
            (Some(x), Some(y)) => self.type_ref_equivalent(x, y),
            _ => false,
        };
        returns_match
            && left.parameters.iter().zip(&right.parameters).all(|(p, q)| {
                match (self.as_parameter(*p), self.as_parameter(*q)) {
                    (Some(p), Some(q)) => {
                        p.name == q.name && p.mode == q.mode && self.type_ref_equivalent(&p.type_ref, &q.type_ref)
                    }
                    _ => false,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{EdmModel, PrimitiveKind, TypeDef, TypeRef};

    #[test]
    fn test_properties_walk_base_types_first() {
        let mut model = EdmModel::new();
        let base = model.add_entity_type("NS", "Base");
        let derived = model.add_entity_type("NS", "Derived");
        let id = model.add_structural_property(base, "Id", TypeRef::primitive(PrimitiveKind::Int32, false));
        let extra = model.add_structural_property(derived, "Extra", TypeRef::primitive(PrimitiveKind::String, true));
        model.set_base_type(derived, TypeDef::Schema(base));
        model.set_key(base, vec![id]);

        assert_eq!(model.properties(derived), vec![id, extra]);
        assert_eq!(model.find_property(derived, "Id"), Some(id));
        assert_eq!(model.key(derived), vec![id]);
        assert!(model.inherits_from(derived, base));
        assert!(!model.inherits_from(base, derived));
    }

    #[test]
    fn test_cyclic_hierarchy_is_finite() {
        let mut model = EdmModel::new();
        let a = model.add_entity_type("NS", "A");
        let b = model.add_entity_type("NS", "B");
        model.set_base_type(a, TypeDef::Schema(b));
        model.set_base_type(b, TypeDef::Schema(a));

        assert_eq!(model.base_types(a), vec![b]);
        assert!(model.key(a).is_empty());
        assert!(model.find_property(a, "Missing").is_none());
    }

    #[test]
    fn test_equivalence_respects_nullability() {
        let model = EdmModel::new();
        let a = TypeRef::primitive(PrimitiveKind::Int32, true);
        let b = TypeRef::primitive(PrimitiveKind::Int32, false);
        assert!(model.is_equivalent(&a.definition, &b.definition));
        assert!(!model.type_ref_equivalent(&a, &b));
    }
}
