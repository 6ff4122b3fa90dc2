//! Immutable, versioned collections of validation rules.
//!
//! A `RuleSet` indexes its rules by node kind and phase when it is built, so the
//! walk never tests a rule against a node it cannot apply to.
use super::rule::{NodeKind, Phase, ValidationRule};
use super::rules::{annotations, container, expressions, functions, model, naming, properties, type_refs, types};
use crate::model::EdmVersion;
use std::collections::HashSet;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<ValidationRule>,
    // Indexed by `NodeKind::index() * 2 + phase`.
    table: Vec<Vec<usize>>,
}

impl RuleSet {
    /// Builds a set from `rules`. A rule named twice is kept once.
    pub fn new(rules: impl IntoIterator<Item = ValidationRule>) -> Self {
        let mut seen = HashSet::new();
        let rules: Vec<ValidationRule> = rules.into_iter().filter(|r| seen.insert(r.name)).collect();

        let mut table = vec![Vec::new(); NodeKind::COUNT * 2];
        for kind in NodeKind::ALL {
            let capabilities = kind.capabilities();
            for (i, rule) in rules.iter().enumerate() {
                if capabilities.contains(&rule.capability()) {
                    table[slot(kind, rule.phase)].push(i);
                }
            }
        }
        Self { rules, table }
    }

    /// A new set holding the rules of both.
    pub fn union(&self, other: &RuleSet) -> RuleSet {
        RuleSet::new(self.rules.iter().chain(other.rules.iter()).copied())
    }

    pub fn with(&self, extra: &[&ValidationRule]) -> RuleSet {
        RuleSet::new(self.rules.iter().copied().chain(extra.iter().map(|r| **r)))
    }

    pub fn without(&self, removed: &[&ValidationRule]) -> RuleSet {
        let names: HashSet<&str> = removed.iter().map(|r| r.name).collect();
        RuleSet::new(self.rules.iter().copied().filter(|r| !names.contains(r.name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.name == name)
    }

    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub(crate) fn rules_for(&self, kind: NodeKind, phase: Phase) -> impl Iterator<Item = &ValidationRule> + '_ {
        self.table[slot(kind, phase)].iter().map(|&i| &self.rules[i])
    }

    /// The built-in set for a version. Each is built on first use.
    pub fn for_version(version: EdmVersion) -> &'static RuleSet {
        static V1: OnceLock<RuleSet> = OnceLock::new();
        static V1_1: OnceLock<RuleSet> = OnceLock::new();
        static V1_2: OnceLock<RuleSet> = OnceLock::new();
        static V2: OnceLock<RuleSet> = OnceLock::new();
        static V3: OnceLock<RuleSet> = OnceLock::new();

        match version {
            EdmVersion::V1 => V1.get_or_init(v1),
            EdmVersion::V1_1 => V1_1.get_or_init(v1_1),
            EdmVersion::V1_2 => V1_2.get_or_init(v1_2),
            EdmVersion::V2 => V2.get_or_init(v2),
            EdmVersion::V3 => V3.get_or_init(v3),
        }
    }
}

fn slot(kind: NodeKind, phase: Phase) -> usize {
    kind.index() * 2
        + match phase {
            Phase::Structural => 0,
            Phase::Semantic => 1,
        }
}

static BASE: &[&ValidationRule] = &[
    &naming::NAME_MUST_NOT_BE_EMPTY,
    &naming::NAME_IS_TOO_LONG,
    &naming::NAME_IS_NOT_ALLOWED,
    &naming::NAMESPACE_MUST_NOT_BE_EMPTY,
    &naming::NAMESPACE_IS_TOO_LONG,
    &naming::NAMESPACE_IS_NOT_ALLOWED,
    &naming::SYSTEM_NAMESPACE_ENCOUNTERED,
    &model::DUPLICATE_SCHEMA_ELEMENT_NAME,
    &model::DUPLICATE_ENTITY_CONTAINER_NAME,
    &model::DUPLICATE_FUNCTIONS,
    &model::DUPLICATE_VOCABULARY_ANNOTATIONS,
    &container::ELEMENT_MUST_NOT_HAVE_KIND_OF_NONE,
    &container::DUPLICATE_MEMBER_NAME,
    &container::SET_ELEMENT_TYPE_IS_ACCESSIBLE,
    &container::SET_ELEMENT_TYPE_MUST_BE_ENTITY_TYPE,
    &container::SET_TYPE_HAS_NO_KEYS,
    &container::SET_MUST_BELONG_TO_CONTAINER,
    &container::SET_NAVIGATION_MAPPING_MUST_POINT_TO_VALID_TARGET,
    &container::SET_NAVIGATION_MAPPING_MUST_BE_BIDIRECTIONAL,
    &container::SET_CAN_ONLY_BE_CONTAINED_ONCE,
    &container::SET_RECURSIVE_CONTAINMENT_MUST_POINT_BACK,
    &types::BASE_TYPE_MUST_NOT_BE_CYCLIC,
    &types::BASE_TYPE_IS_ACCESSIBLE,
    &types::BASE_TYPE_MUST_BE_SAME_KIND,
    &types::PROPERTY_NAME_MUST_NOT_MATCH_TYPE_NAME,
    &types::DECLARING_TYPE_MUST_BE_CORRECT,
    &types::PROPERTY_NAMES_MUST_BE_UNIQUE,
    &types::KEY_MISSING,
    &types::KEY_MUST_NOT_BE_DECLARED_IN_DERIVED_TYPE,
    &types::DUPLICATE_KEY_PROPERTY,
    &types::KEY_MUST_NOT_BE_NULLABLE,
    &types::KEY_MUST_BE_SCALAR,
    &types::KEY_PROPERTY_MUST_BELONG_TO_ENTITY,
    &types::ROW_TYPE_MUST_CONTAIN_PROPERTIES,
    &types::ENUM_MUST_HAVE_INTEGER_UNDERLYING_TYPE,
    &types::ENUM_MEMBER_NAMES_MUST_BE_UNIQUE,
    &types::ENUM_MEMBER_VALUE_MUST_FIT_UNDERLYING_TYPE,
    &properties::INVALID_PROPERTY_TYPE,
    &properties::NULLABLE_COMPLEX_TYPE,
    &properties::CONCURRENCY_REQUIRES_PRIMITIVE,
    &properties::PARTNER_MUST_POINT_BACK,
    &properties::CORRECT_TYPE,
    &properties::PRINCIPAL_END_MULTIPLICITY,
    &properties::DEPENDENT_END_MULTIPLICITY,
    &properties::DEPENDENT_PROPERTIES_MUST_BELONG_TO_DEPENDENT_ENTITY,
    &properties::DUPLICATE_DEPENDENT_PROPERTY,
    &properties::RELATIONSHIP_CONSTRAINT_MATCHES_PRINCIPAL_KEY,
    &properties::ON_DELETE_ON_BOTH_ENDS,
    &properties::ON_DELETE_ON_MANY_END,
    &properties::RECURSIVE_CONTAINMENT_TARGET_MUST_BE_OPTIONAL,
    &properties::RECURSIVE_CONTAINMENT_SOURCE_MUST_BE_ZERO_OR_ONE,
    &properties::NON_RECURSIVE_CONTAINMENT_SOURCE_MUST_BE_ONE,
    &properties::ENTITY_MUST_NOT_INDIRECTLY_CONTAIN_ITSELF,
    &functions::PARAMETER_NAMES_MUST_BE_UNIQUE,
    &functions::ONLY_INPUT_PARAMETERS_ALLOWED,
    &functions::IMPORT_RETURNS_ENTITIES_WITHOUT_ENTITY_SET,
    &functions::IMPORT_ENTITY_SET_WITHOUT_ENTITY_RETURN,
    &functions::IMPORT_ENTITY_TYPE_MUST_MATCH_ENTITY_SET,
    &functions::IMPORT_COMPOSABLE_CANNOT_BE_SIDE_EFFECTING,
    &functions::IMPORT_BINDABLE_MUST_HAVE_PARAMETERS,
    &functions::IMPORT_PARAMETER_MODE_MUST_NOT_BE_NONE,
    &annotations::TARGET_MUST_BE_RESOLVED,
    &annotations::TERM_MUST_BE_RESOLVED,
    &annotations::VALUE_MUST_MATCH_TERM_TYPE,
    &annotations::TYPE_ANNOTATION_PROPERTIES_MUST_MATCH,
    &expressions::IF_TEST_MUST_BE_BOOLEAN,
    &expressions::FUNCTION_MUST_BE_RESOLVED,
    &expressions::ARGUMENTS_MUST_MATCH_PARAMETERS,
    &expressions::DECLARED_TYPE_MUST_MATCH_CONTENTS,
    &type_refs::MUST_BE_RESOLVED,
    &type_refs::PRIMITIVE_KIND_MUST_NOT_BE_NONE,
    &type_refs::DECIMAL_PRECISION_AND_SCALE,
    &type_refs::TEMPORAL_PRECISION,
    &type_refs::MAX_LENGTH,
];

static BEFORE_V3: &[&ValidationRule] = &[
    &types::ENUMS_NOT_SUPPORTED_BEFORE_V3,
    &annotations::VALUE_TERMS_NOT_SUPPORTED_BEFORE_V3,
    &annotations::ANNOTATIONS_NOT_SUPPORTED_BEFORE_V3,
    &type_refs::STREAM_NOT_SUPPORTED_BEFORE_V3,
    &type_refs::SPATIAL_NOT_SUPPORTED_BEFORE_V3,
    &properties::CONTAINS_TARGET_NOT_SUPPORTED_BEFORE_V3,
    &functions::IMPORT_PARAMETERS_INCORRECT_TYPE_BEFORE_V3,
    &functions::IMPORT_SIDE_EFFECTING_NOT_SUPPORTED_BEFORE_V3,
    &functions::IMPORT_COMPOSABLE_NOT_SUPPORTED_BEFORE_V3,
    &functions::IMPORT_BINDABLE_NOT_SUPPORTED_BEFORE_V3,
    &types::COMPLEX_TYPE_MUST_CONTAIN_PROPERTIES,
];

static BEFORE_V2: &[&ValidationRule] = &[
    &functions::FUNCTIONS_NOT_SUPPORTED_BEFORE_V2,
    &types::KEY_MUST_NOT_BE_BINARY,
    &properties::DEPENDENT_PROPERTIES_MUST_BE_KEY_SUBSET,
];

static V1_ONLY: &[&ValidationRule] = &[
    &types::COMPLEX_TYPE_INVALID_ABSTRACT,
    &types::COMPLEX_TYPE_INVALID_POLYMORPHIC,
    &functions::IMPORT_UNSUPPORTED_RETURN_TYPE_V1,
];

fn base() -> RuleSet {
    RuleSet::new(BASE.iter().map(|r| **r))
}

fn v1() -> RuleSet {
    base()
        .with(BEFORE_V3)
        .with(BEFORE_V2)
        .with(&[&types::OPEN_TYPES_NOT_SUPPORTED])
        .with(V1_ONLY)
}

fn v1_1() -> RuleSet {
    RuleSet::for_version(EdmVersion::V1)
        .without(V1_ONLY)
        .with(&[&functions::IMPORT_UNSUPPORTED_RETURN_TYPE_AFTER_V1])
}

fn v1_2() -> RuleSet {
    RuleSet::for_version(EdmVersion::V1_1).without(&[&types::OPEN_TYPES_NOT_SUPPORTED])
}

fn v2() -> RuleSet {
    RuleSet::for_version(EdmVersion::V1_2).without(BEFORE_V2)
}

fn v3() -> RuleSet {
    base().with(&[&functions::IMPORT_UNSUPPORTED_RETURN_TYPE_AFTER_V1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(EdmVersion::V1, true, true, true)]
    #[case(EdmVersion::V1_1, true, true, false)]
    #[case(EdmVersion::V1_2, true, false, false)]
    #[case(EdmVersion::V2, true, false, false)]
    #[case(EdmVersion::V3, false, false, false)]
    fn test_version_gates(
        #[case] version: EdmVersion,
        #[case] enums_gated: bool,
        #[case] open_types_gated: bool,
        #[case] abstract_complex_gated: bool,
    ) {
        let set = RuleSet::for_version(version);
        assert_eq!(set.contains(types::ENUMS_NOT_SUPPORTED_BEFORE_V3.name), enums_gated);
        assert_eq!(set.contains(types::OPEN_TYPES_NOT_SUPPORTED.name), open_types_gated);
        assert_eq!(set.contains(types::COMPLEX_TYPE_INVALID_ABSTRACT.name), abstract_complex_gated);
    }

    #[test]
    fn test_functions_become_legal_in_v2() {
        let name = functions::FUNCTIONS_NOT_SUPPORTED_BEFORE_V2.name;
        assert!(RuleSet::for_version(EdmVersion::V1_2).contains(name));
        assert!(!RuleSet::for_version(EdmVersion::V2).contains(name));
    }

    #[test]
    fn test_return_type_rule_switches_after_v1() {
        let v1 = RuleSet::for_version(EdmVersion::V1);
        let v3 = RuleSet::for_version(EdmVersion::V3);
        assert!(v1.contains(functions::IMPORT_UNSUPPORTED_RETURN_TYPE_V1.name));
        assert!(!v1.contains(functions::IMPORT_UNSUPPORTED_RETURN_TYPE_AFTER_V1.name));
        assert!(v3.contains(functions::IMPORT_UNSUPPORTED_RETURN_TYPE_AFTER_V1.name));
    }

    #[test]
    fn test_rule_names_are_unique_in_base() {
        assert_eq!(base().len(), BASE.len());
    }

    #[test]
    fn test_table_routes_by_kind_and_phase() {
        let set = RuleSet::for_version(EdmVersion::V3);
        let structural: Vec<_> = set.rules_for(NodeKind::EntityType, Phase::Structural).map(|r| r.name).collect();
        assert!(structural.contains(&naming::NAME_MUST_NOT_BE_EMPTY.name));
        assert!(structural.contains(&types::BASE_TYPE_MUST_NOT_BE_CYCLIC.name));
        assert!(set.rules_for(NodeKind::EntityType, Phase::Semantic).all(|r| r.phase == Phase::Semantic));
        assert!(set.rules_for(NodeKind::Parameter, Phase::Semantic).next().is_none());
    }

    #[test]
    fn test_union_deduplicates() {
        let a = RuleSet::new([naming::NAME_IS_TOO_LONG, naming::NAME_MUST_NOT_BE_EMPTY]);
        let b = RuleSet::new([naming::NAME_IS_TOO_LONG]);
        assert_eq!(a.union(&b).len(), 2);
    }
}
