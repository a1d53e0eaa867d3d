//! Typed views over the handful of Java node shapes the engine inspects.
//!
//! The tree keeps no field names, so accessors work from child order and
//! kinds. Trivia is skipped everywhere.

use crate::syntax::{JavaKind, JavaSyntaxElement, JavaSyntaxNode, JavaSyntaxToken};
use rowan::NodeOrToken;

/// Direct children of a node that are not whitespace or comments
pub fn significant_children(node: &JavaSyntaxNode) -> impl Iterator<Item = JavaSyntaxElement> {
    node.children_with_tokens()
        .filter(|element| !element.kind().is_trivia())
}

/// Text of an element with all trivia dropped (`a . b` becomes `a.b`)
pub fn significant_text(element: &JavaSyntaxElement) -> String {
    match element {
        NodeOrToken::Token(token) => token.text().to_string(),
        NodeOrToken::Node(node) => node
            .descendants_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .filter(|token| !token.kind().is_trivia())
            .map(|token| token.text().to_string())
            .collect(),
    }
}

/// A method invocation: `receiver.name(arguments)` or `name(arguments)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodCall {
    syntax: JavaSyntaxNode,
}

impl MethodCall {
    pub fn cast(node: JavaSyntaxNode) -> Option<Self> {
        (node.kind() == JavaKind::MethodInvocation).then_some(Self { syntax: node })
    }

    pub fn syntax(&self) -> &JavaSyntaxNode {
        &self.syntax
    }

    /// The parenthesised argument list, always the last child node
    pub fn argument_list(&self) -> Option<JavaSyntaxNode> {
        self.syntax
            .children()
            .filter(|child| child.kind() == JavaKind::ArgumentList)
            .last()
    }

    /// Method name: the last identifier before the argument list
    pub fn name(&self) -> Option<JavaSyntaxToken> {
        significant_children(&self.syntax)
            .take_while(|element| element.kind() != JavaKind::ArgumentList)
            .filter_map(NodeOrToken::into_token)
            .filter(|token| token.kind() == JavaKind::Identifier)
            .last()
    }

    /// Expression the method is invoked on, if the call is qualified
    pub fn receiver(&self) -> Option<JavaSyntaxElement> {
        let mut children = significant_children(&self.syntax);
        let first = children.next()?;
        let second = children.next()?;
        (second.kind() == JavaKind::Dot).then_some(first)
    }

    /// Argument expressions in order
    pub fn arguments(&self) -> Vec<JavaSyntaxElement> {
        self.argument_list()
            .map(|list| {
                significant_children(&list)
                    .filter(|element| {
                        !matches!(
                            element.kind(),
                            JavaKind::LParen | JavaKind::RParen | JavaKind::Comma
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// An import declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    syntax: JavaSyntaxNode,
    path: String,
    is_static: bool,
    is_wildcard: bool,
}

impl ImportDecl {
    pub fn cast(node: JavaSyntaxNode) -> Option<Self> {
        if node.kind() != JavaKind::ImportDeclaration {
            return None;
        }

        let mut path = String::new();
        let mut is_static = false;
        for token in node
            .descendants_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .filter(|token| !token.kind().is_trivia())
        {
            match token.kind() {
                JavaKind::ImportKw | JavaKind::Semicolon => {}
                JavaKind::StaticKw => is_static = true,
                _ => path.push_str(token.text()),
            }
        }

        let is_wildcard = path.ends_with(".*");
        if is_wildcard {
            path.truncate(path.len() - 2);
        }

        Some(Self {
            syntax: node,
            path,
            is_static,
            is_wildcard,
        })
    }

    pub fn syntax(&self) -> &JavaSyntaxNode {
        &self.syntax
    }

    /// Imported name without the trailing `.*` of wildcard imports
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn is_wildcard(&self) -> bool {
        self.is_wildcard
    }

    /// Last segment of a single-type import
    pub fn simple_name(&self) -> Option<&str> {
        if self.is_wildcard {
            return None;
        }
        self.path.rsplit('.').next()
    }
}

/// All import declarations of a unit, in source order
pub fn imports(root: &JavaSyntaxNode) -> Vec<ImportDecl> {
    root.children().filter_map(ImportDecl::cast).collect()
}

/// Package name from the unit's package declaration
pub fn package_name(root: &JavaSyntaxNode) -> Option<String> {
    let declaration = root
        .children()
        .find(|child| child.kind() == JavaKind::PackageDeclaration)?;

    significant_children(&declaration)
        .find(|element| {
            matches!(
                element.kind(),
                JavaKind::ScopedIdentifier | JavaKind::Identifier
            )
        })
        .map(|element| significant_text(&element))
}

/// First child of a declaration that spells its type
pub fn declared_type(node: &JavaSyntaxNode) -> Option<JavaSyntaxElement> {
    significant_children(node).find(|element| element.kind().is_type())
}
