//! Erased Type Names and Type Patterns

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Java primitive type keywords
pub const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

/// Types visible without an import
pub const JAVA_LANG_TYPES: &[&str] = &[
    "Boolean",
    "Byte",
    "Character",
    "CharSequence",
    "Double",
    "Enum",
    "Float",
    "Integer",
    "Iterable",
    "Long",
    "Math",
    "Number",
    "Object",
    "Runnable",
    "Short",
    "String",
    "StringBuilder",
    "System",
    "Thread",
    "Throwable",
    "Exception",
    "RuntimeException",
    "Void",
];

/// A fully-qualified (or primitive) type name after generic erasure.
///
/// `$` is accepted as nested-type separator and normalised to `.`, so
/// `RequestConfig$Builder` and `RequestConfig.Builder` are the same name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TypeName(String);

impl TypeName {
    /// Normalise a written type: drop whitespace and type arguments
    pub fn new(written: &str) -> Self {
        let mut erased = String::with_capacity(written.len());
        let mut depth = 0usize;
        for ch in written.chars() {
            match ch {
                '<' => depth += 1,
                '>' => depth = depth.saturating_sub(1),
                _ if depth > 0 || ch.is_whitespace() => {}
                '$' => erased.push('.'),
                _ => erased.push(ch),
            }
        }
        Self(erased)
    }

    /// Validate that every segment is a Java identifier
    pub fn parse(written: &str) -> Result<Self> {
        let name = Self::new(written);
        let base = name.0.trim_end_matches("[]");
        let valid = !base.is_empty() && base.split('.').all(is_java_identifier);
        if valid {
            Ok(name)
        } else {
            Err(Error::TypeName(written.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_primitive(&self) -> bool {
        PRIMITIVES.contains(&self.0.as_str())
    }

    pub fn is_array(&self) -> bool {
        self.0.ends_with("[]")
    }

    /// Last segment (`Builder` for `a.b.RequestConfig.Builder`)
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Everything before the last segment: the package for top-level types,
    /// the enclosing type for nested ones
    pub fn qualifier(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(qualifier, _)| qualifier)
    }

    /// Package by convention: the segments before the first capitalised one
    pub fn package(&self) -> Option<String> {
        let segments: Vec<&str> = self
            .0
            .split('.')
            .take_while(|segment| !starts_uppercase(segment))
            .collect();
        if segments.is_empty() || segments.len() == self.0.split('.').count() {
            None
        } else {
            Some(segments.join("."))
        }
    }

    /// Looks like `pkg.Type` rather than a bare simple name
    pub fn is_qualified(&self) -> bool {
        self.package().is_some()
    }

    /// Append a member segment (`Outer` + `Inner`)
    #[must_use]
    pub fn member(&self, segment: &str) -> Self {
        Self(format!("{}.{}", self.0, segment))
    }
}

impl From<String> for TypeName {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for TypeName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<TypeName> for String {
    fn from(value: TypeName) -> Self {
        value.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn is_java_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

pub fn starts_uppercase(segment: &str) -> bool {
    segment.chars().next().is_some_and(char::is_uppercase)
}

/// Pattern over fully-qualified type names.
///
/// - `a.b.C` matches exactly that type
/// - `a.b.*` matches types declared directly in package `a.b`
/// - `a.b..*` matches types in `a.b` and every sub-package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypePattern {
    Exact(TypeName),
    Package(String),
    Recursive(String),
}

impl TypePattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::Pattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let pattern_trimmed = pattern.trim();
        let (prefix, build): (&str, fn(String) -> Self) =
            if let Some(prefix) = pattern_trimmed.strip_suffix("..*") {
                (prefix, Self::Recursive)
            } else if let Some(prefix) = pattern_trimmed.strip_suffix(".*") {
                (prefix, Self::Package)
            } else {
                let name = TypeName::parse(pattern_trimmed)
                    .map_err(|_| invalid("not a fully-qualified type name"))?;
                return Ok(Self::Exact(name));
            };

        if prefix.is_empty() || !prefix.split('.').all(is_java_identifier) {
            return Err(invalid("package prefix must be dot-separated identifiers"));
        }
        Ok(build(prefix.to_string()))
    }

    /// Does a fully-qualified type name match?
    pub fn matches_type(&self, name: &TypeName) -> bool {
        match self {
            Self::Exact(exact) => exact == name,
            Self::Package(package) => name.package().as_deref() == Some(package.as_str()),
            Self::Recursive(prefix) => within(name.as_str(), prefix),
        }
    }

    /// Does a package (from a wildcard import) fall under the pattern?
    pub fn matches_package(&self, package: &str) -> bool {
        match self {
            Self::Exact(_) => false,
            Self::Package(expected) => expected == package,
            Self::Recursive(prefix) => within(package, prefix),
        }
    }
}

fn within(name: &str, prefix: &str) -> bool {
    name == prefix
        || name
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
}

impl fmt::Display for TypePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(name) => write!(f, "{name}"),
            Self::Package(package) => write!(f, "{package}.*"),
            Self::Recursive(prefix) => write!(f, "{prefix}..*"),
        }
    }
}

impl std::str::FromStr for TypePattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
