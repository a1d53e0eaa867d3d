//! Replacement Templates
//!
//! A template is a Java fragment with placeholder slots:
//!
//! | slot | meaning |
//! | --- | --- |
//! | `#{}` | any argument |
//! | `#{name}` | any argument, named for readability |
//! | `#{any(long)}` | an argument that must have the given type |
//! | `#{name:any(long)}` | both |
//!
//! Compilation happens once per rule. Slots are swapped for synthetic
//! identifiers, the fragment is parsed inside a throwaway class, and the
//! resulting subtree is kept as green nodes so every rewrite reuses it.
//! Every authoring mistake surfaces here, before any unit is touched.

use crate::apply::GreenElement;
use crate::{Result, TransformError};
use hcrewrite_core::ast::significant_text;
use hcrewrite_core::types::{is_java_identifier, JAVA_LANG_TYPES};
use hcrewrite_core::{JavaKind, JavaSyntaxElement, JavaSyntaxToken, JavaUnit, MethodCall, TypeName};
use lazy_static::lazy_static;
use regex::Regex;
use rowan::NodeOrToken;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"#\{([^{}]*)\}").expect("placeholder pattern is valid");
}

const WRAPPER_CLASS: &str = "__HcrewriteTemplate";
const WRAPPER_METHOD: &str = "__hcrewrite_template";
const SLOT_PREFIX: &str = "__hcrewrite_slot";
const SLOT_SUFFIX: &str = "__";

/// Identifier standing in for slot `index` inside the compiled fragment
pub(crate) fn slot_name(index: usize) -> String {
    format!("{SLOT_PREFIX}{index}{SLOT_SUFFIX}")
}

/// Inverse of [`slot_name`]
pub(crate) fn slot_index(text: &str) -> Option<usize> {
    text.strip_prefix(SLOT_PREFIX)?
        .strip_suffix(SLOT_SUFFIX)?
        .parse()
        .ok()
}

/// What the compiled fragment replaces at a matched call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateTarget {
    /// Contents of the call's argument list; receiver and name stay
    #[default]
    Arguments,
    /// The whole call expression
    Invocation,
}

/// One placeholder slot of a template
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Placeholder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_constraint: Option<TypeName>,
}

impl Placeholder {
    /// `#{}`
    pub fn any() -> Self {
        Self::default()
    }

    /// `#{name}`
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            type_constraint: None,
        }
    }

    /// `#{any(type)}`
    pub fn typed(type_name: &str) -> Self {
        Self {
            name: None,
            type_constraint: Some(TypeName::new(type_name)),
        }
    }

    /// Parse the text between `#{` and `}`
    pub fn parse(content: &str) -> Result<Self> {
        let malformed = || TransformError::Placeholder(format!("malformed placeholder `#{{{content}}}`"));

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(Self::any());
        }

        let (name, constraint) = match trimmed.split_once(':') {
            Some((name, constraint)) => (Some(name.trim()), Some(constraint.trim())),
            None if trimmed.starts_with("any(") => (None, Some(trimmed)),
            None => (Some(trimmed), None),
        };

        if name.is_some_and(|name| !is_java_identifier(name)) {
            return Err(malformed());
        }
        let type_constraint = match constraint {
            Some(constraint) => {
                let inner = constraint
                    .strip_prefix("any(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .ok_or_else(malformed)?;
                Some(TypeName::parse(inner.trim()).map_err(|_| malformed())?)
            }
            None => None,
        };

        Ok(Self {
            name: name.map(str::to_string),
            type_constraint,
        })
    }

    /// Placeholders of a fragment in order of appearance
    pub fn scan(fragment: &str) -> Result<Vec<Self>> {
        PLACEHOLDER
            .captures_iter(fragment)
            .map(|captures| Self::parse(captures.get(1).map_or("", |m| m.as_str())))
            .collect()
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.type_constraint) {
            (None, None) => write!(f, "#{{}}"),
            (Some(name), None) => write!(f, "#{{{name}}}"),
            (None, Some(ty)) => write!(f, "#{{any({ty})}}"),
            (Some(name), Some(ty)) => write!(f, "#{{{name}:any({ty})}}"),
        }
    }
}

/// A compiled replacement fragment.
///
/// Immutable once built; shared read-only by every unit a rule rewrites.
#[derive(Debug, Clone)]
pub struct Template {
    fragment: String,
    target: TemplateTarget,
    placeholders: Vec<Placeholder>,
    imports: Vec<TypeName>,
    body: Vec<GreenElement>,
}

impl Template {
    /// Compile a fragment against a declared placeholder list
    pub fn compile(
        fragment: &str,
        placeholders: Vec<Placeholder>,
        required_imports: &[&str],
        target: TemplateTarget,
    ) -> Result<Self> {
        if fragment.trim().is_empty() {
            return Err(TransformError::template(fragment, "fragment is empty"));
        }

        let found = Placeholder::scan(fragment)?;
        if found.len() != placeholders.len() {
            return Err(TransformError::Placeholder(format!(
                "`{fragment}` has {} placeholder(s) but {} were declared",
                found.len(),
                placeholders.len()
            )));
        }
        if let Some((index, (written, declared))) = found
            .iter()
            .zip(&placeholders)
            .enumerate()
            .find(|(_, (written, declared))| written != declared)
        {
            return Err(TransformError::Placeholder(format!(
                "slot {index} of `{fragment}` is {written} but {declared} was declared"
            )));
        }

        let imports = required_imports
            .iter()
            .map(|import| {
                TypeName::parse(import)
                    .ok()
                    .filter(|name| name.is_qualified() && !name.is_array())
                    .ok_or_else(|| {
                        TransformError::template(fragment, format!("`{import}` is not a fully-qualified type"))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut slot = 0;
        let substituted = PLACEHOLDER.replace_all(fragment, |_: &regex::Captures<'_>| {
            let name = slot_name(slot);
            slot += 1;
            name
        });

        let wrapper = match target {
            TemplateTarget::Invocation => format!(
                "class {WRAPPER_CLASS} {{ Object {WRAPPER_METHOD}() {{ return {substituted}; }} }}"
            ),
            TemplateTarget::Arguments => format!(
                "class {WRAPPER_CLASS} {{ void {WRAPPER_METHOD}() {{ {WRAPPER_METHOD}({substituted}); }} }}"
            ),
        };
        let unit = JavaUnit::parse(&wrapper)?;
        if unit.has_errors() {
            return Err(TransformError::template(fragment, "fragment does not parse"));
        }

        let elements = match target {
            TemplateTarget::Invocation => expression_elements(&unit, &substituted),
            TemplateTarget::Arguments => argument_elements(&unit, &substituted),
        }
        .ok_or_else(|| {
            let expected = match target {
                TemplateTarget::Invocation => "exactly one expression",
                TemplateTarget::Arguments => "exactly one argument list",
            };
            TransformError::template(fragment, format!("fragment must be {expected}"))
        })?;

        check_free_symbols(fragment, &elements, &imports)?;

        let body = elements.iter().map(to_green).collect();
        tracing::debug!(fragment, ?target, slots = placeholders.len(), "compiled template");

        Ok(Self {
            fragment: fragment.to_string(),
            target,
            placeholders,
            imports,
            body,
        })
    }

    /// Compile a fragment taking its placeholders as written
    pub fn from_fragment(fragment: &str, required_imports: &[&str], target: TemplateTarget) -> Result<Self> {
        let placeholders = Placeholder::scan(fragment)?;
        Self::compile(fragment, placeholders, required_imports, target)
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn target(&self) -> TemplateTarget {
        self.target
    }

    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    pub fn required_imports(&self) -> &[TypeName] {
        &self.imports
    }

    /// Compiled fragment with slot identifiers in place of placeholders
    pub(crate) fn body(&self) -> &[GreenElement] {
        &self.body
    }
}

/// The returned expression, if it is the whole fragment
fn expression_elements(unit: &JavaUnit, substituted: &str) -> Option<Vec<JavaSyntaxElement>> {
    let statement = unit
        .syntax()
        .descendants()
        .find(|node| node.kind() == JavaKind::ReturnStatement)?;
    let children: Vec<JavaSyntaxElement> = hcrewrite_core::ast::significant_children(&statement).collect();
    match children.as_slice() {
        [_, expression, semicolon]
            if semicolon.kind() == JavaKind::Semicolon && element_text(expression) == substituted.trim() =>
        {
            Some(vec![expression.clone()])
        }
        _ => None,
    }
}

/// Contents of the wrapper call's argument list, if they are the whole fragment
fn argument_elements(unit: &JavaUnit, substituted: &str) -> Option<Vec<JavaSyntaxElement>> {
    let call = unit
        .syntax()
        .descendants()
        .filter_map(MethodCall::cast)
        .find(|call| call.name().is_some_and(|name| name.text() == WRAPPER_METHOD))?;
    let list = call.argument_list()?;
    if list.to_string() != format!("({substituted})") {
        return None;
    }

    let mut elements: Vec<JavaSyntaxElement> = list.children_with_tokens().collect();
    if elements.first()?.kind() != JavaKind::LParen || elements.last()?.kind() != JavaKind::RParen {
        return None;
    }
    elements.pop();
    elements.remove(0);
    while elements.first().is_some_and(|e| e.kind() == JavaKind::Whitespace) {
        elements.remove(0);
    }
    while elements.last().is_some_and(|e| e.kind() == JavaKind::Whitespace) {
        elements.pop();
    }
    (!elements.is_empty()).then_some(elements)
}

/// Every name the fragment introduces must be a slot, an imported type,
/// a `java.lang` type or part of a fully-qualified name
fn check_free_symbols(fragment: &str, elements: &[JavaSyntaxElement], imports: &[TypeName]) -> Result<()> {
    let tokens = elements.iter().flat_map(|element| match element {
        NodeOrToken::Node(node) => node
            .descendants_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .collect::<Vec<_>>(),
        NodeOrToken::Token(token) => vec![token.clone()],
    });

    for token in tokens {
        if !matches!(token.kind(), JavaKind::Identifier | JavaKind::TypeIdentifier) {
            continue;
        }
        let text = token.text();
        if slot_index(text).is_some() || !is_head(&token) {
            continue;
        }

        let known = imports.iter().any(|import| import.simple_name() == text)
            || JAVA_LANG_TYPES.contains(&text)
            || qualified_chain(&token);
        if !known {
            return Err(TransformError::template(
                fragment,
                format!("`{text}` is neither a placeholder nor an imported type"),
            ));
        }
    }
    Ok(())
}

/// First name of a chain, not a member selected with `.` or `::`
fn is_head(token: &JavaSyntaxToken) -> bool {
    let mut previous = token.prev_sibling_or_token();
    while let Some(element) = &previous {
        if !element.kind().is_trivia() {
            break;
        }
        previous = element.prev_sibling_or_token();
    }
    !previous.is_some_and(|element| {
        element.kind() == JavaKind::Dot
            || element.as_token().is_some_and(|token| token.text() == "::")
    })
}

/// Whether the token starts a package-qualified name such as `java.time.Duration`
fn qualified_chain(token: &JavaSyntaxToken) -> bool {
    let mut outermost = None;
    let mut current = token.parent();
    while let Some(node) = current {
        if !matches!(
            node.kind(),
            JavaKind::FieldAccess | JavaKind::ScopedTypeIdentifier | JavaKind::ScopedIdentifier
        ) {
            break;
        }
        current = node.parent();
        outermost = Some(node);
    }
    outermost.is_some_and(|node| TypeName::new(&significant_text(&NodeOrToken::Node(node))).is_qualified())
}

fn element_text(element: &JavaSyntaxElement) -> String {
    match element {
        NodeOrToken::Node(node) => node.to_string(),
        NodeOrToken::Token(token) => token.text().to_string(),
    }
}

fn to_green(element: &JavaSyntaxElement) -> GreenElement {
    match element {
        NodeOrToken::Node(node) => NodeOrToken::Node(node.green().into_owned()),
        NodeOrToken::Token(token) => NodeOrToken::Token(token.green().to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: &str = "org.apache.hc.core5.util.Timeout";

    #[test]
    fn test_compile_timeout_template() {
        let template = Template::compile(
            "Timeout.ofMilliseconds(#{})",
            vec![Placeholder::any()],
            &[TIMEOUT],
            TemplateTarget::Arguments,
        )
        .unwrap();
        assert_eq!(template.placeholders().len(), 1);
        assert_eq!(template.required_imports()[0].as_str(), TIMEOUT);
        assert_eq!(template.body().len(), 1);
    }

    #[test]
    fn test_placeholder_forms() {
        assert_eq!(Placeholder::parse("").unwrap(), Placeholder::any());
        assert_eq!(Placeholder::parse("millis").unwrap(), Placeholder::named("millis"));
        assert_eq!(Placeholder::parse("any(long)").unwrap(), Placeholder::typed("long"));
        let both = Placeholder::parse("millis:any(int)").unwrap();
        assert_eq!(both.name.as_deref(), Some("millis"));
        assert_eq!(both.type_constraint, Some(TypeName::new("int")));
        assert_eq!(both.to_string(), "#{millis:any(int)}");

        assert!(Placeholder::parse("1st").is_err());
        assert!(Placeholder::parse("x:int").is_err());
        assert!(Placeholder::parse("any(").is_err());
    }

    #[test]
    fn test_slot_names_roundtrip() {
        assert_eq!(slot_index(&slot_name(7)), Some(7));
        assert_eq!(slot_index("timeout"), None);
    }

    #[test]
    fn test_placeholder_count_mismatch() {
        let err = Template::compile(
            "Timeout.ofMilliseconds(#{})",
            vec![Placeholder::any(), Placeholder::any()],
            &[TIMEOUT],
            TemplateTarget::Arguments,
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::Placeholder(_)));
    }

    #[test]
    fn test_placeholder_name_mismatch() {
        let err = Template::compile(
            "Timeout.ofMilliseconds(#{millis})",
            vec![Placeholder::named("seconds")],
            &[TIMEOUT],
            TemplateTarget::Arguments,
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::Placeholder(_)));
    }

    #[test]
    fn test_malformed_fragments() {
        for fragment in [
            "Timeout.ofMilliseconds(#{}",
            "Timeout.ofMilliseconds(#{}); foo(1",
            "",
            "   ",
        ] {
            let result = Template::from_fragment(fragment, &[TIMEOUT], TemplateTarget::Arguments);
            assert!(matches!(result, Err(TransformError::Template { .. })), "{fragment:?}");
        }

        let statement = Template::from_fragment("#{}; return 1", &[], TemplateTarget::Invocation);
        assert!(matches!(statement, Err(TransformError::Template { .. })));
    }

    #[test]
    fn test_unknown_symbols_rejected() {
        let missing_import =
            Template::from_fragment("Timeout.ofMilliseconds(#{})", &[], TemplateTarget::Arguments);
        assert!(matches!(missing_import, Err(TransformError::Template { .. })));

        let free_variable = Template::from_fragment("#{} + offset", &[], TemplateTarget::Invocation);
        assert!(matches!(free_variable, Err(TransformError::Template { .. })));
    }

    #[test]
    fn test_known_symbols_accepted() {
        assert!(Template::from_fragment("String.valueOf(#{})", &[], TemplateTarget::Invocation).is_ok());
        assert!(Template::from_fragment(
            "java.time.Duration.ofMillis(#{any(long)})",
            &[],
            TemplateTarget::Arguments
        )
        .is_ok());
        assert!(Template::from_fragment("#{}.toMilliseconds()", &[], TemplateTarget::Invocation).is_ok());
        assert!(Template::from_fragment(
            "#{amount}, TimeUnit.SECONDS",
            &["java.util.concurrent.TimeUnit"],
            TemplateTarget::Arguments
        )
        .is_ok());
    }

    #[test]
    fn test_bad_required_import() {
        let result = Template::from_fragment("Timeout.ofMilliseconds(#{})", &["Timeout"], TemplateTarget::Arguments);
        assert!(matches!(result, Err(TransformError::Template { .. })));
    }

    #[test]
    fn test_template_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Template>();
    }
}
