//! Rewrite Applicator
//!
//! Substitution is structural: each slot identifier of the compiled template
//! is swapped for the captured argument subtree, and the result is a fresh
//! green node. Nothing is re-parsed and the original tree is untouched.

use crate::template::{slot_index, Template, TemplateTarget};
use hcrewrite_core::{JavaKind, JavaLanguage};
use rowan::{GreenNode, GreenNodeData, GreenToken, GreenTokenData, Language, NodeOrToken};

/// Owned green element
pub type GreenElement = NodeOrToken<GreenNode, GreenToken>;

type GreenElementRef<'a> = NodeOrToken<&'a GreenNodeData, &'a GreenTokenData>;

fn kind_of(element: GreenElementRef<'_>) -> JavaKind {
    let raw = match element {
        NodeOrToken::Node(node) => node.kind(),
        NodeOrToken::Token(token) => token.kind(),
    };
    JavaLanguage::kind_from_raw(raw)
}

fn borrowed(element: &GreenElement) -> GreenElementRef<'_> {
    match element {
        NodeOrToken::Node(node) => NodeOrToken::Node(&**node),
        NodeOrToken::Token(token) => NodeOrToken::Token(&**token),
    }
}

fn owned(element: GreenElementRef<'_>) -> GreenElement {
    match element {
        NodeOrToken::Node(node) => NodeOrToken::Node(node.to_owned()),
        NodeOrToken::Token(token) => NodeOrToken::Token(token.to_owned()),
    }
}

/// Argument list of a green call: its child index and its children
fn argument_list(call: &GreenNodeData) -> Option<(usize, &GreenNodeData)> {
    call.children()
        .enumerate()
        .filter_map(|(index, child)| match child {
            NodeOrToken::Node(node) if kind_of(child) == JavaKind::ArgumentList => Some((index, node)),
            _ => None,
        })
        .last()
}

/// Argument expressions of a green argument list
fn arguments(list: &GreenNodeData) -> Vec<GreenElementRef<'_>> {
    list.children()
        .filter(|child| {
            let kind = kind_of(*child);
            !kind.is_trivia() && !matches!(kind, JavaKind::LParen | JavaKind::RParen | JavaKind::Comma)
        })
        .collect()
}

/// Substitute `selected_args` of `call` into `template`.
///
/// For [`TemplateTarget::Arguments`] the result is the call itself with
/// new argument list contents; the parentheses and the trivia just inside
/// them are kept. For [`TemplateTarget::Invocation`] the result replaces
/// the whole call, parenthesized when `parent`, the kind of the node the
/// call sits in, would otherwise bind part of it. `None` when the call
/// does not have the expected shape.
pub fn apply(
    template: &Template,
    call: &GreenNodeData,
    selected_args: &[usize],
    parent: Option<JavaKind>,
) -> Option<GreenElement> {
    if JavaLanguage::kind_from_raw(call.kind()) != JavaKind::MethodInvocation
        || selected_args.len() != template.placeholders().len()
    {
        return None;
    }

    let (list_index, list) = argument_list(call)?;
    let arguments = arguments(list);
    let captured = selected_args
        .iter()
        .map(|&index| arguments.get(index).copied().map(owned))
        .collect::<Option<Vec<_>>>()?;

    match template.target() {
        TemplateTarget::Invocation => {
            let [body] = template.body() else {
                return None;
            };
            let replacement = substitute(borrowed(body), &captured, None);
            Some(parenthesize_if_needed(replacement, parent))
        }
        TemplateTarget::Arguments => {
            let children: Vec<GreenElementRef<'_>> = list.children().collect();
            let (open, rest) = children.split_first()?;
            let (close, inner) = rest.split_last()?;
            if kind_of(*open) != JavaKind::LParen || kind_of(*close) != JavaKind::RParen {
                return None;
            }

            let leading = inner.iter().take_while(|child| kind_of(**child).is_trivia());
            let trailing_count = inner
                .iter()
                .rev()
                .take_while(|child| kind_of(**child).is_trivia())
                .count();
            let trailing = inner[inner.len() - trailing_count..].iter();

            let mut new_children = vec![owned(*open)];
            new_children.extend(leading.copied().map(owned));
            new_children.extend(
                template
                    .body()
                    .iter()
                    .map(|element| substitute(borrowed(element), &captured, Some(JavaKind::ArgumentList))),
            );
            new_children.extend(trailing.copied().map(owned));
            new_children.push(owned(*close));

            let new_list = GreenNode::new(list.kind(), new_children);
            Some(NodeOrToken::Node(
                call.replace_child(list_index, NodeOrToken::Node(new_list)),
            ))
        }
    }
}

fn substitute(element: GreenElementRef<'_>, captured: &[GreenElement], parent: Option<JavaKind>) -> GreenElement {
    match element {
        NodeOrToken::Token(token) => {
            let slot = (kind_of(element) == JavaKind::Identifier)
                .then(|| slot_index(token.text()))
                .flatten()
                .and_then(|index| captured.get(index));
            match slot {
                Some(argument) => parenthesize_if_needed(argument.clone(), parent),
                None => owned(element),
            }
        }
        NodeOrToken::Node(node) => {
            let kind = kind_of(element);
            let children: Vec<GreenElement> = node
                .children()
                .map(|child| substitute(child, captured, Some(kind)))
                .collect();
            NodeOrToken::Node(GreenNode::new(node.kind(), children))
        }
    }
}

fn is_primary(element: &GreenElement) -> bool {
    match element {
        NodeOrToken::Token(_) => true,
        NodeOrToken::Node(_) => matches!(
            kind_of(borrowed(element)),
            JavaKind::MethodInvocation
                | JavaKind::FieldAccess
                | JavaKind::ObjectCreationExpression
                | JavaKind::ParenthesizedExpression
                | JavaKind::StringLiteral
                | JavaKind::CharacterLiteral
        ),
    }
}

/// Positions where any expression stands on its own.
///
/// Everything else, operators, casts, receivers, conditionals and kinds
/// not modelled, may re-associate a composite expression.
fn is_delimited(parent: Option<JavaKind>) -> bool {
    matches!(
        parent,
        Some(
            JavaKind::ArgumentList
                | JavaKind::ParenthesizedExpression
                | JavaKind::ExpressionStatement
                | JavaKind::ReturnStatement
                | JavaKind::VariableDeclarator
                | JavaKind::AssignmentExpression
                | JavaKind::LambdaExpression
        )
    )
}

/// Keep `a + b` grouped when it lands in `#{} * 1000` or `#{}.toString()`,
/// and `3 * 1000` grouped when it lands in `2 / #{}`
fn parenthesize_if_needed(argument: GreenElement, parent: Option<JavaKind>) -> GreenElement {
    if is_primary(&argument) || is_delimited(parent) {
        return argument;
    }

    NodeOrToken::Node(GreenNode::new(
        JavaKind::ParenthesizedExpression.into(),
        vec![
            NodeOrToken::Token(GreenToken::new(JavaKind::LParen.into(), "(")),
            argument,
            NodeOrToken::Token(GreenToken::new(JavaKind::RParen.into(), ")")),
        ],
    ))
}
