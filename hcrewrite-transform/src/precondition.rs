//! Whole-unit precondition: does the unit reference the target type family.

use crate::Result;
use hcrewrite_core::{TypeName, TypePattern, TypeResolver, UnitScope};

/// Per-unit check gating all traversal and matching work
#[derive(Debug, Clone)]
pub struct PreconditionGate {
    pattern: TypePattern,
    include_implicit: bool,
}

impl PreconditionGate {
    /// `include_implicit` also counts types that only appear through
    /// declarations (`RequestConfig.Builder b` with an import elsewhere)
    pub fn new(pattern: &str, include_implicit: bool) -> Result<Self> {
        Ok(Self {
            pattern: TypePattern::parse(pattern)?,
            include_implicit,
        })
    }

    pub fn pattern(&self) -> &TypePattern {
        &self.pattern
    }

    pub fn includes_implicit(&self) -> bool {
        self.include_implicit
    }

    /// Whether any referenced type of the unit matches the pattern
    pub fn present(&self, scope: &UnitScope, resolver: &dyn TypeResolver) -> bool {
        let imported = scope.imports().iter().any(|import| {
            let path = import.path();
            match (import.is_static(), import.is_wildcard()) {
                // `import a.b.*` names a package or an enclosing type
                (false, true) => {
                    self.pattern.matches_package(path)
                        || self.pattern.matches_type(&TypeName::new(path))
                }
                (false, false) | (true, true) => self.pattern.matches_type(&TypeName::new(path)),
                // `import static a.b.C.member`
                (true, false) => TypeName::new(path)
                    .qualifier()
                    .is_some_and(|owner| self.pattern.matches_type(&TypeName::new(owner))),
            }
        });
        if imported {
            return true;
        }

        if scope
            .qualified_references()
            .iter()
            .any(|name| self.pattern.matches_type(name))
        {
            return true;
        }

        self.include_implicit
            && scope
                .declared_types()
                .filter_map(|written| resolver.resolve_type_name(written))
                .any(|name| self.pattern.matches_type(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcrewrite_core::{JavaUnit, TypeTable, UnitResolver};

    fn present(gate: &PreconditionGate, source: &str) -> bool {
        let table = TypeTable::httpclient5();
        let unit = JavaUnit::parse(source).unwrap();
        let resolver = UnitResolver::new(&table, &unit);
        gate.present(resolver.scope(), &resolver)
    }

    #[test]
    fn test_specific_import_matches() {
        let gate = PreconditionGate::new("org.apache.hc..*", true).unwrap();
        assert!(present(
            &gate,
            "import org.apache.hc.client5.http.config.RequestConfig;\nclass A {}\n"
        ));
    }

    #[test]
    fn test_wildcard_and_static_imports() {
        let gate = PreconditionGate::new("org.apache.hc..*", false).unwrap();
        assert!(present(&gate, "import org.apache.hc.core5.util.*;\nclass A {}\n"));
        assert!(present(
            &gate,
            "import static org.apache.hc.core5.util.Timeout.ofSeconds;\nclass A {}\n"
        ));
    }

    #[test]
    fn test_fully_qualified_reference_in_body() {
        let gate = PreconditionGate::new("org.apache.hc..*", false).unwrap();
        assert!(present(
            &gate,
            "class A { void f() { org.apache.hc.core5.util.Timeout.ofSeconds(1); } }"
        ));
    }

    #[test]
    fn test_unrelated_unit_is_absent() {
        let gate = PreconditionGate::new("org.apache.hc..*", true).unwrap();
        assert!(!present(
            &gate,
            "import org.apache.http.client.config.RequestConfig;\nclass A { RequestConfig c; }\n"
        ));
        assert!(!present(&gate, "class A { void f() { builder.setConnectTimeout(5000); } }"));
    }

    #[test]
    fn test_implicit_types_through_same_package() {
        let source = "package org.apache.hc.core5.http.io;\nclass A { void f(SocketConfig.Builder b) {} }\n";
        let implicit = PreconditionGate::new("org.apache.hc..*", true).unwrap();
        let explicit = PreconditionGate::new("org.apache.hc..*", false).unwrap();
        assert!(present(&implicit, source));
        assert!(!present(&explicit, source));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(PreconditionGate::new("org.apache..hc.*", true).is_err());
        assert!(PreconditionGate::new("", true).is_err());
    }
}
