//! Name and namespace well-formedness.
use crate::validation::context::ValidationContext;
use crate::validation::error::ErrorKind;
use crate::validation::rule::{Check, ValidationRule};
use crate::model::ElementId;
use regex::Regex;
use std::sync::OnceLock;

pub const MAX_NAME_LENGTH: usize = 480;
pub const MAX_NAMESPACE_LENGTH: usize = 512;

const SYSTEM_NAMESPACES: [&str; 2] = ["Edm", "Transient"];

const IDENTIFIER: &str = r"[\p{L}\p{Nl}_][\p{L}\p{Nl}\p{Nd}\p{Mn}\p{Mc}\p{Pc}\p{Cf}]*";

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(&format!("^{}$", IDENTIFIER)).expect("identifier pattern compiles"))
}

fn namespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!(r"^{id}(\.{id})*$", id = IDENTIFIER)).expect("namespace pattern compiles")
    })
}

pub fn is_valid_name(name: &str) -> bool {
    name_pattern().is_match(name)
}

pub fn is_valid_namespace(namespace: &str) -> bool {
    namespace_pattern().is_match(namespace)
}

pub static NAME_MUST_NOT_BE_EMPTY: ValidationRule =
    ValidationRule::structural("NamedElementNameMustNotBeEmptyOrWhiteSpace", Check::NamedElement(name_must_not_be_empty));

pub static NAME_IS_TOO_LONG: ValidationRule =
    ValidationRule::structural("NamedElementNameIsTooLong", Check::NamedElement(name_is_too_long));

pub static NAME_IS_NOT_ALLOWED: ValidationRule =
    ValidationRule::structural("NamedElementNameIsNotAllowed", Check::NamedElement(name_is_not_allowed));

pub static NAMESPACE_MUST_NOT_BE_EMPTY: ValidationRule = ValidationRule::structural(
    "SchemaElementNamespaceMustNotBeEmptyOrWhiteSpace",
    Check::SchemaElement(namespace_must_not_be_empty),
);

pub static NAMESPACE_IS_TOO_LONG: ValidationRule =
    ValidationRule::structural("SchemaElementNamespaceIsTooLong", Check::SchemaElement(namespace_is_too_long));

pub static NAMESPACE_IS_NOT_ALLOWED: ValidationRule =
    ValidationRule::structural("SchemaElementNamespaceIsNotAllowed", Check::SchemaElement(namespace_is_not_allowed));

pub static SYSTEM_NAMESPACE_ENCOUNTERED: ValidationRule =
    ValidationRule::semantic("SchemaElementSystemNamespaceEncountered", Check::SchemaElement(system_namespace_encountered));

fn name_must_not_be_empty(ctx: &mut ValidationContext<'_>, id: ElementId, name: &str) {
    if name.trim().is_empty() {
        ctx.error_at(id, ErrorKind::InvalidName, "The name is missing or not valid.");
    }
}

fn name_is_too_long(ctx: &mut ValidationContext<'_>, id: ElementId, name: &str) {
    if name.chars().count() > MAX_NAME_LENGTH {
        ctx.error_at(
            id,
            ErrorKind::NameTooLong,
            format!("The name '{}' is too long. Names may not exceed {} characters.", name, MAX_NAME_LENGTH),
        );
    }
}

fn name_is_not_allowed(ctx: &mut ValidationContext<'_>, id: ElementId, name: &str) {
    // Empty and overlong names are reported by their own rules.
    if name.trim().is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return;
    }
    if !is_valid_name(name) {
        ctx.error_at(id, ErrorKind::InvalidName, format!("The name '{}' is not allowed.", name));
    }
}

fn namespace_must_not_be_empty(ctx: &mut ValidationContext<'_>, id: ElementId, namespace: &str) {
    if namespace.trim().is_empty() {
        ctx.error_at(id, ErrorKind::InvalidNamespaceName, "The namespace is missing or not valid.");
    }
}

fn namespace_is_too_long(ctx: &mut ValidationContext<'_>, id: ElementId, namespace: &str) {
    if namespace.chars().count() > MAX_NAMESPACE_LENGTH {
        ctx.error_at(
            id,
            ErrorKind::InvalidNamespaceName,
            format!("The namespace '{}' exceeds {} characters.", namespace, MAX_NAMESPACE_LENGTH),
        );
    }
}

fn namespace_is_not_allowed(ctx: &mut ValidationContext<'_>, id: ElementId, namespace: &str) {
    if namespace.trim().is_empty() || namespace.chars().count() > MAX_NAMESPACE_LENGTH {
        return;
    }
    if !is_valid_namespace(namespace) {
        ctx.error_at(id, ErrorKind::InvalidNamespaceName, format!("The namespace '{}' is not allowed.", namespace));
    }
}

fn system_namespace_encountered(ctx: &mut ValidationContext<'_>, id: ElementId, namespace: &str) {
    if SYSTEM_NAMESPACES.contains(&namespace) {
        let name = ctx.model().name_of(id);
        ctx.error_at(
            id,
            ErrorKind::SystemNamespaceEncountered,
            format!("The element '{}' is declared in the reserved namespace '{}'.", name, namespace),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Customer", true)]
    #[case("_hidden", true)]
    #[case("Größe", true)]
    #[case("Order2", true)]
    #[case("2Order", false)]
    #[case("Order Line", false)]
    #[case("Order.Line", false)]
    #[case("", false)]
    fn test_name_pattern(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(is_valid_name(name), valid);
    }

    #[rstest]
    #[case("Contoso", true)]
    #[case("Contoso.Sales.V2", true)]
    #[case("Contoso..Sales", false)]
    #[case(".Contoso", false)]
    #[case("Contoso.2Sales", false)]
    fn test_namespace_pattern(#[case] namespace: &str, #[case] valid: bool) {
        assert_eq!(is_valid_namespace(namespace), valid);
    }
}
