//! Import bookkeeping for one unit.
//!
//! Requests are collected while the unit is walked and merged into the
//! unit's import list once, at the end of the walk.

use crate::apply::GreenElement;
use hcrewrite_core::ast::{self, significant_children, significant_text, ImportDecl};
use hcrewrite_core::{JavaKind, JavaSyntaxNode, JavaUnit, TypeName};
use rowan::{GreenNode, GreenToken, NodeOrToken};
use std::collections::BTreeSet;
use tracing::debug;

/// Pending imports of the unit being rewritten
#[derive(Debug, Clone, Default)]
pub struct ImportMaintainer {
    pending: BTreeSet<TypeName>,
}

impl ImportMaintainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an import; repeated requests collapse into one
    pub fn request_import(&mut self, symbol: TypeName) -> bool {
        self.pending.insert(symbol)
    }

    pub fn pending(&self) -> impl Iterator<Item = &TypeName> {
        self.pending.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Merge pending imports into `unit`, returning the new unit and the
    /// imports actually added
    pub fn flush(self, unit: &JavaUnit) -> (JavaUnit, Vec<TypeName>) {
        let mut current = unit.clone();
        let mut added = Vec::new();

        for symbol in self.pending {
            let root = current.syntax();
            if is_covered(&root, &symbol) {
                debug!(import = %symbol, "import already covered");
                continue;
            }
            let green = insert_import(&root, &symbol);
            current = current.with_green(green);
            added.push(symbol);
        }

        (current, added)
    }
}

/// Whether `symbol` is already visible without a new import
pub fn is_covered(root: &JavaSyntaxNode, symbol: &TypeName) -> bool {
    let owner = symbol.qualifier();
    if owner == Some("java.lang") {
        return true;
    }
    if owner.is_some() && ast::package_name(root).as_deref() == owner {
        return true;
    }

    ast::imports(root)
        .iter()
        .filter(|import| !import.is_static())
        .any(|import| {
            if import.is_wildcard() {
                Some(import.path()) == owner
            } else {
                import.path() == symbol.as_str()
            }
        })
}

/// Whether importing `symbol` would clash with a different type of the
/// same simple name, imported or declared in the unit. Declared covers
/// classes, interfaces, enums, records, annotation types and type
/// parameters, at any nesting depth.
pub fn conflicts(root: &JavaSyntaxNode, symbol: &TypeName) -> bool {
    let simple_name = symbol.simple_name();

    let imported = ast::imports(root).iter().any(|import| {
        !import.is_static()
            && import.simple_name() == Some(simple_name)
            && import.path() != symbol.as_str()
    });

    let declared = root
        .descendants()
        .filter(|node| node.kind().is_type_declaration())
        .filter_map(|node| {
            significant_children(&node)
                .find(|element| matches!(element.kind(), JavaKind::Identifier | JavaKind::TypeIdentifier))
                .map(|element| significant_text(&element))
        })
        .any(|name| name == simple_name);

    imported || declared
}

fn token(kind: JavaKind, text: &str) -> GreenElement {
    NodeOrToken::Token(GreenToken::new(kind.into(), text))
}

/// `a.b.C` as nested scoped identifiers
fn scoped_identifier(path: &str) -> GreenElement {
    match path.rsplit_once('.') {
        Some((qualifier, last)) => NodeOrToken::Node(GreenNode::new(
            JavaKind::ScopedIdentifier.into(),
            vec![
                scoped_identifier(qualifier),
                token(JavaKind::Dot, "."),
                token(JavaKind::Identifier, last),
            ],
        )),
        None => token(JavaKind::Identifier, path),
    }
}

fn import_declaration(symbol: &TypeName) -> GreenElement {
    NodeOrToken::Node(GreenNode::new(
        JavaKind::ImportDeclaration.into(),
        vec![
            token(JavaKind::ImportKw, "import"),
            token(JavaKind::Whitespace, " "),
            scoped_identifier(symbol.as_str()),
            token(JavaKind::Semicolon, ";"),
        ],
    ))
}

/// Leading package segments two dotted names have in common
fn shared_segments(left: &str, right: &str) -> usize {
    left.split('.')
        .zip(right.split('.'))
        .take_while(|(a, b)| a == b)
        .count()
}

/// Insert one import at its conventional position
fn insert_import(root: &JavaSyntaxNode, symbol: &TypeName) -> GreenNode {
    let green = root.green();
    let declaration = import_declaration(symbol);
    let imports: Vec<ImportDecl> = ast::imports(root);
    let (regular, statics): (Vec<&ImportDecl>, Vec<&ImportDecl>) =
        imports.iter().partition(|import| !import.is_static());

    // Among the regular imports sharing the longest package prefix, in
    // sorted position when that group is sorted, else at its end
    if !regular.is_empty() {
        let shared = |import: &ImportDecl| shared_segments(import.path(), symbol.as_str());
        let longest = regular.iter().map(|import| shared(*import)).max().unwrap_or(0);
        let group: Vec<&ImportDecl> = regular
            .iter()
            .copied()
            .filter(|import| shared(*import) == longest)
            .collect();
        let sorted = group.windows(2).all(|pair| pair[0].path() <= pair[1].path());

        if sorted {
            if let Some(next) = group.iter().find(|import| import.path() > symbol.as_str()) {
                let index = next.syntax().index();
                return green.splice_children(
                    index..index,
                    vec![declaration, token(JavaKind::Whitespace, "\n")],
                );
            }
        }
        if let Some(last) = group.last() {
            let index = last.syntax().index() + 1;
            return green.splice_children(
                index..index,
                vec![token(JavaKind::Whitespace, "\n"), declaration],
            );
        }
    }

    // Regular imports come before static ones
    if let Some(first) = statics.first() {
        let index = first.syntax().index();
        return green.splice_children(
            index..index,
            vec![declaration, token(JavaKind::Whitespace, "\n\n")],
        );
    }

    if let Some(package) = root
        .children()
        .find(|child| child.kind() == JavaKind::PackageDeclaration)
    {
        let index = package.index() + 1;
        return green.splice_children(
            index..index,
            vec![token(JavaKind::Whitespace, "\n\n"), declaration],
        );
    }

    // Before the first declaration, but above any doc comment attached to it
    let elements: Vec<_> = root.children_with_tokens().collect();
    let Some(first) = elements.iter().position(|element| !element.kind().is_trivia()) else {
        let index = elements.len();
        return green.splice_children(index..index, vec![declaration, token(JavaKind::Whitespace, "\n")]);
    };
    let mut index = first;
    let mut cursor = first;
    while cursor > 0 {
        let previous = &elements[cursor - 1];
        match previous.kind() {
            JavaKind::Whitespace => cursor -= 1,
            JavaKind::BlockComment | JavaKind::LineComment
                if previous
                    .as_token()
                    .is_some_and(|comment| comment.text().starts_with("/**")) =>
            {
                cursor -= 1;
                index = cursor;
            }
            _ => break,
        }
    }
    green.splice_children(index..index, vec![declaration, token(JavaKind::Whitespace, "\n\n")])
}
