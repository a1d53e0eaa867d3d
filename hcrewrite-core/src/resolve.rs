//! Type Resolution
//!
//! The rewrite engine never guesses types from names: it asks a
//! [`TypeResolver`]. [`UnitResolver`] is the stock implementation. It
//! combines what a unit declares (package, imports, variables, fields,
//! parameters) with a [`TypeTable`] for library types and return types.
//!
//! A name is looked up in the innermost enclosing scope that declares it:
//! lambda, block, loop or method first, then the fields of enclosing
//! classes. Locals only count from their declarator on.
//!
//! Resolution is conservative. Anything it cannot pin down, such as an
//! inferred lambda parameter or a name declared twice in one scope with
//! different types, resolves to `None`, and callers treat `None` as
//! "leave the code alone".

use crate::ast::{self, significant_children, significant_text, ImportDecl, MethodCall};
use crate::syntax::{JavaKind, JavaSyntaxElement, JavaSyntaxNode, JavaUnit};
use crate::table::TypeTable;
use crate::types::{is_java_identifier, starts_uppercase, TypeName, JAVA_LANG_TYPES};
use rowan::{NodeOrToken, TextRange, TextSize};
use std::collections::HashMap;

/// Nesting limit when chasing `var` initialisers and call chains
const MAX_RESOLUTION_DEPTH: usize = 32;

/// Type-resolution oracle consulted by matchers
pub trait TypeResolver {
    /// Erased, fully-qualified type of an expression
    fn type_of(&self, expr: &JavaSyntaxElement) -> Option<TypeName>;

    /// Type a qualified call is dispatched on
    fn owner_of(&self, call: &MethodCall) -> Option<TypeName>;

    /// Fully-qualified name for a type as written in source
    fn resolve_type_name(&self, written: &str) -> Option<TypeName>;

    /// Subtype test, reflexive
    fn is_subtype(&self, sub: &TypeName, sup: &TypeName) -> bool;
}

/// What a name was declared as
#[derive(Debug, Clone)]
enum Declared {
    /// Explicit type as written
    Written(String),
    /// `var` with an initialiser to infer from
    Inferred(JavaSyntaxElement),
    /// Type unknown here: inferred lambda parameters, patterns, or a name
    /// declared twice in one scope with different types
    Ambiguous,
}

/// A name bound in one scope
#[derive(Debug, Clone)]
struct Binding {
    declared: Declared,
    /// Locals are visible from their declarator on
    visible_from: Option<TextSize>,
    field: bool,
}

/// Scope-bearing node: class body, method, block, lambda, loop, catch
type ScopeKey = (JavaKind, TextRange);

/// Facts about one unit gathered in a single scan
#[derive(Debug, Clone, Default)]
pub struct UnitScope {
    package: Option<String>,
    imports: Vec<ImportDecl>,
    scopes: HashMap<ScopeKey, HashMap<String, Binding>>,
    qualified_references: Vec<TypeName>,
}

impl UnitScope {
    /// Scan a unit once
    pub fn collect(root: &JavaSyntaxNode) -> Self {
        let mut scope = Self {
            package: ast::package_name(root),
            imports: ast::imports(root),
            ..Self::default()
        };

        for node in root.descendants() {
            match node.kind() {
                JavaKind::FieldDeclaration => scope.collect_declarators(&node, true),
                JavaKind::LocalVariableDeclaration => scope.collect_declarators(&node, false),
                // Bound in the method, constructor, lambda or record owning the list
                JavaKind::FormalParameter => {
                    let owner = node.parent().and_then(|list| list.parent());
                    scope.collect_parameter(&node, owner.as_ref());
                }
                JavaKind::Resource => {
                    let owner = node.parent().and_then(|list| list.parent());
                    scope.collect_parameter(&node, owner.as_ref());
                }
                JavaKind::CatchFormalParameter => scope.collect_parameter(&node, node.parent().as_ref()),
                JavaKind::EnhancedForStatement => scope.collect_parameter(&node, Some(&node)),
                JavaKind::LambdaExpression => scope.collect_lambda(&node),
                JavaKind::InstanceofExpression => scope.collect_pattern(&node),
                JavaKind::ScopedTypeIdentifier | JavaKind::FieldAccess => {
                    scope.collect_qualified_reference(&node);
                }
                _ => {}
            }
        }

        scope
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn imports(&self) -> &[ImportDecl] {
        &self.imports
    }

    /// Types written out fully qualified in the body
    pub fn qualified_references(&self) -> &[TypeName] {
        &self.qualified_references
    }

    /// Types as written in variable, field and parameter declarations
    pub fn declared_types(&self) -> impl Iterator<Item = &str> {
        self.scopes
            .values()
            .flat_map(HashMap::values)
            .filter_map(|binding| match &binding.declared {
                Declared::Written(written) => Some(written.as_str()),
                _ => None,
            })
    }

    /// Nearest declaration of `name` visible at `at`, innermost scope first
    fn lookup(&self, name: &str, at: &JavaSyntaxElement, fields_only: bool) -> Option<&Declared> {
        let offset = at.text_range().start();
        at.parent()
            .into_iter()
            .flat_map(|parent| parent.ancestors())
            .filter_map(|node| self.scopes.get(&(node.kind(), node.text_range())))
            .filter_map(|names| names.get(name))
            .find(|binding| {
                (!fields_only || binding.field)
                    && binding.visible_from.map_or(true, |from| from <= offset)
            })
            .map(|binding| &binding.declared)
    }

    fn bind(&mut self, scope: &JavaSyntaxNode, name: String, binding: Binding) {
        use std::collections::hash_map::Entry;

        let names = self
            .scopes
            .entry((scope.kind(), scope.text_range()))
            .or_default();
        match names.entry(name) {
            Entry::Vacant(entry) => {
                entry.insert(binding);
            }
            Entry::Occupied(mut entry) => {
                let same = match (&entry.get().declared, &binding.declared) {
                    (Declared::Written(a), Declared::Written(b)) => TypeName::new(a) == TypeName::new(b),
                    _ => false,
                };
                if !same {
                    entry.get_mut().declared = Declared::Ambiguous;
                }
            }
        }
    }

    fn collect_declarators(&mut self, declaration: &JavaSyntaxNode, field: bool) {
        let Some(owner) = declaration.parent() else {
            return;
        };
        let Some(written) = ast::declared_type(declaration).map(|t| significant_text(&t)) else {
            return;
        };

        for declarator in declaration
            .children()
            .filter(|child| child.kind() == JavaKind::VariableDeclarator)
        {
            let mut children = significant_children(&declarator);
            let Some(name) = children
                .next()
                .filter(|element| element.kind() == JavaKind::Identifier)
                .map(|element| significant_text(&element))
            else {
                continue;
            };

            let declared = if written == "var" {
                let initializer = children
                    .skip_while(|element| element.as_token().map(|t| t.text()) != Some("="))
                    .nth(1);
                match initializer {
                    Some(init) => Declared::Inferred(init),
                    None => Declared::Ambiguous,
                }
            } else if children
                .take_while(|element| element.as_token().map(|t| t.text()) != Some("="))
                .any(|element| element.kind() == JavaKind::Node)
            {
                // `int x[]` style dimensions on the declarator
                Declared::Written(format!("{written}[]"))
            } else {
                Declared::Written(written.clone())
            };

            let binding = Binding {
                declared,
                visible_from: (!field).then(|| declarator.text_range().start()),
                field,
            };
            self.bind(&owner, name, binding);
        }
    }

    fn collect_parameter(&mut self, parameter: &JavaSyntaxNode, owner: Option<&JavaSyntaxNode>) {
        let Some(owner) = owner else {
            return;
        };
        let mut after_type = significant_children(parameter)
            .skip_while(|element| !element.kind().is_type());
        let Some(type_element) = after_type.next() else {
            return;
        };
        let Some(name) = after_type
            .find(|element| element.kind() == JavaKind::Identifier)
            .map(|element| significant_text(&element))
        else {
            return;
        };
        let written = significant_text(&type_element);
        let declared = if written == "var" {
            Declared::Ambiguous
        } else {
            Declared::Written(written)
        };
        let binding = Binding {
            declared,
            visible_from: None,
            field: owner.kind() == JavaKind::RecordDeclaration,
        };
        self.bind(owner, name, binding);
    }

    /// Inferred lambda parameters have no type we could know
    fn collect_lambda(&mut self, lambda: &JavaSyntaxNode) {
        let Some(parameters) = significant_children(lambda).next() else {
            return;
        };
        let names: Vec<String> = match &parameters {
            NodeOrToken::Token(token) if token.kind() == JavaKind::Identifier => {
                vec![token.text().to_string()]
            }
            NodeOrToken::Node(node) if node.kind() == JavaKind::InferredParameters => significant_children(node)
                .filter(|element| element.kind() == JavaKind::Identifier)
                .map(|element| significant_text(&element))
                .collect(),
            // Typed parameters are formal parameters bound to the lambda
            _ => return,
        };

        for name in names {
            let binding = Binding {
                declared: Declared::Ambiguous,
                visible_from: None,
                field: false,
            };
            self.bind(lambda, name, binding);
        }
    }

    /// `x instanceof Builder b` binds `b` for the rest of the enclosing block
    fn collect_pattern(&mut self, expression: &JavaSyntaxNode) {
        let Some(name) = significant_children(expression)
            .skip_while(|element| !element.kind().is_type())
            .skip(1)
            .find(|element| element.kind() == JavaKind::Identifier)
            .map(|element| significant_text(&element))
        else {
            return;
        };
        let Some(owner) = expression.ancestors().find(|node| {
            matches!(
                node.kind(),
                JavaKind::Block | JavaKind::MethodDeclaration | JavaKind::LambdaExpression
            )
        }) else {
            return;
        };

        let binding = Binding {
            declared: Declared::Ambiguous,
            visible_from: Some(expression.text_range().start()),
            field: false,
        };
        self.bind(&owner, name, binding);
    }

    fn collect_qualified_reference(&mut self, node: &JavaSyntaxNode) {
        // Only the outermost chain, `a.b.C.D` rather than `a.b.C` as well
        if node
            .parent()
            .is_some_and(|parent| parent.kind() == node.kind())
        {
            return;
        }

        let text = significant_text(&NodeOrToken::Node(node.clone()));
        let segments: Vec<&str> = text.split('.').collect();
        if segments.len() < 2 || starts_uppercase(segments[0]) {
            return;
        }
        if !segments
            .iter()
            .all(|segment| is_java_identifier(segment))
        {
            return;
        }

        // Package segments, then the first type segment
        let Some(type_end) = segments.iter().position(|s| starts_uppercase(s)) else {
            return;
        };
        let name = TypeName::new(&segments[..=type_end].join("."));
        if !self.qualified_references.contains(&name) {
            self.qualified_references.push(name);
        }
    }
}

/// [`TypeResolver`] for one unit backed by a [`TypeTable`]
#[derive(Debug)]
pub struct UnitResolver<'t> {
    table: &'t TypeTable,
    scope: UnitScope,
}

impl<'t> UnitResolver<'t> {
    pub fn new(table: &'t TypeTable, unit: &JavaUnit) -> Self {
        Self::with_scope(table, UnitScope::collect(&unit.syntax()))
    }

    pub fn with_scope(table: &'t TypeTable, scope: UnitScope) -> Self {
        Self { table, scope }
    }

    pub fn scope(&self) -> &UnitScope {
        &self.scope
    }

    pub fn table(&self) -> &TypeTable {
        self.table
    }

    fn declared_type(&self, declared: &Declared, depth: usize) -> Option<TypeName> {
        match declared {
            Declared::Written(written) => self.resolve_type_name(written),
            Declared::Inferred(init) => self.type_of_at(init, depth + 1),
            Declared::Ambiguous => None,
        }
    }

    /// Type of the variable `name` as seen from `at`
    fn variable_type(&self, name: &str, at: &JavaSyntaxElement, fields_only: bool, depth: usize) -> Option<TypeName> {
        let declared = self.scope.lookup(name, at, fields_only)?;
        self.declared_type(declared, depth)
    }

    fn type_of_at(&self, expr: &JavaSyntaxElement, depth: usize) -> Option<TypeName> {
        if depth > MAX_RESOLUTION_DEPTH {
            return None;
        }

        let node = match expr {
            NodeOrToken::Token(token) if token.kind() == JavaKind::Identifier => {
                return self.variable_type(token.text(), expr, false, depth);
            }
            NodeOrToken::Token(token) => return type_of_literal(token.kind(), token.text()),
            NodeOrToken::Node(node) => node,
        };

        match node.kind() {
            // Some literal kinds arrive as nodes wrapping their text
            JavaKind::IntegerLiteral
            | JavaKind::FloatingPointLiteral
            | JavaKind::StringLiteral
            | JavaKind::CharacterLiteral
            | JavaKind::True
            | JavaKind::False => type_of_literal(node.kind(), &significant_text(expr)),
            JavaKind::ParenthesizedExpression => {
                let inner = significant_children(node)
                    .find(|e| !matches!(e.kind(), JavaKind::LParen | JavaKind::RParen))?;
                self.type_of_at(&inner, depth + 1)
            }
            JavaKind::CastExpression | JavaKind::ObjectCreationExpression => {
                let written = significant_children(node).find(|e| e.kind().is_type())?;
                self.resolve_type_name(&significant_text(&written))
            }
            JavaKind::MethodInvocation => {
                let call = MethodCall::cast(node.clone())?;
                let owner = self.owner_of_at(&call, depth + 1)?;
                let name = call.name()?;
                self.table
                    .return_type(&owner, name.text(), call.arguments().len())
            }
            JavaKind::FieldAccess => {
                let mut children = significant_children(node);
                let object = children.next()?;
                let field = children.nth(1)?;
                (object.kind() == JavaKind::This)
                    .then(|| self.variable_type(&significant_text(&field), &field, true, depth))
                    .flatten()
            }
            JavaKind::BinaryExpression => self.binary_type(node, depth),
            JavaKind::UnaryExpression => {
                let mut children = significant_children(node);
                let operator = significant_text(&children.next()?);
                let operand = self.type_of_at(&children.next()?, depth + 1)?;
                match operator.as_str() {
                    "!" => Some(TypeName::new("boolean")),
                    "-" | "+" | "~" => numeric_promotion(&operand, &operand),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn binary_type(&self, node: &JavaSyntaxNode, depth: usize) -> Option<TypeName> {
        let mut children = significant_children(node);
        let left = children.next()?;
        let operator = significant_text(&children.next()?);
        let right = children.next()?;

        match operator.as_str() {
            "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||" | "instanceof" => {
                return Some(TypeName::new("boolean"));
            }
            _ => {}
        }

        let left = self.type_of_at(&left, depth + 1)?;
        let right = self.type_of_at(&right, depth + 1)?;
        let string = TypeName::new("java.lang.String");
        if operator == "+" && (left == string || right == string) {
            return Some(string);
        }
        match operator.as_str() {
            "+" | "-" | "*" | "/" | "%" | "&" | "|" | "^" => numeric_promotion(&left, &right),
            // Shifts take the promoted type of the left operand
            "<<" | ">>" | ">>>" => numeric_promotion(&left, &left),
            _ => None,
        }
    }

    fn owner_of_at(&self, call: &MethodCall, depth: usize) -> Option<TypeName> {
        let receiver = call.receiver()?;
        match &receiver {
            NodeOrToken::Token(token) if token.kind() == JavaKind::Identifier => {
                let name = token.text();
                match self.scope.lookup(name, &receiver, false) {
                    Some(declared) => self.declared_type(declared, depth),
                    // Static call on a type name
                    None => self.resolve_type_name(name),
                }
            }
            NodeOrToken::Node(node) if node.kind() == JavaKind::FieldAccess => self
                .type_of_at(&receiver, depth)
                .or_else(|| self.resolve_type_name(&significant_text(&receiver))),
            _ => self.type_of_at(&receiver, depth),
        }
    }
}

impl TypeResolver for UnitResolver<'_> {
    fn type_of(&self, expr: &JavaSyntaxElement) -> Option<TypeName> {
        self.type_of_at(expr, 0)
    }

    fn owner_of(&self, call: &MethodCall) -> Option<TypeName> {
        self.owner_of_at(call, 0)
    }

    fn resolve_type_name(&self, written: &str) -> Option<TypeName> {
        let name = TypeName::new(written);
        if name.is_primitive() {
            return Some(name);
        }
        if let Some(element) = name.as_str().strip_suffix("[]") {
            return self
                .resolve_type_name(element)
                .map(|resolved| TypeName::new(&format!("{resolved}[]")));
        }
        if name.as_str() == "var" {
            return None;
        }

        let (head, rest) = match name.as_str().split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (name.as_str(), None),
        };
        let with_rest = |base: TypeName| match rest {
            Some(rest) => base.member(rest),
            None => base,
        };

        // Single-type imports win over everything else
        if let Some(import) = self
            .scope
            .imports
            .iter()
            .find(|import| !import.is_static() && import.simple_name() == Some(head))
        {
            return Some(with_rest(TypeName::new(import.path())));
        }

        if let Some(package) = &self.scope.package {
            if let Some(found) = self.table.find_in_package(package, head) {
                return Some(with_rest(found));
            }
        }

        for import in self
            .scope
            .imports
            .iter()
            .filter(|import| import.is_wildcard() && !import.is_static())
        {
            if let Some(found) = self.table.find_in_package(import.path(), head) {
                return Some(with_rest(found));
            }
        }

        if JAVA_LANG_TYPES.contains(&head) {
            return Some(with_rest(TypeName::new(&format!("java.lang.{head}"))));
        }

        // Already fully qualified in source
        name.is_qualified().then_some(name)
    }

    fn is_subtype(&self, sub: &TypeName, sup: &TypeName) -> bool {
        self.table.is_subtype(sub, sup)
    }
}

fn type_of_literal(kind: JavaKind, text: &str) -> Option<TypeName> {
    let primitive = match kind {
        JavaKind::IntegerLiteral if text.ends_with(['l', 'L']) => "long",
        JavaKind::IntegerLiteral => "int",
        JavaKind::FloatingPointLiteral if text.ends_with(['f', 'F']) => "float",
        JavaKind::FloatingPointLiteral => "double",
        JavaKind::True | JavaKind::False => "boolean",
        JavaKind::CharacterLiteral => "char",
        JavaKind::StringLiteral => "java.lang.String",
        _ => return None,
    };
    Some(TypeName::new(primitive))
}

/// Binary numeric promotion over primitive names
fn numeric_promotion(left: &TypeName, right: &TypeName) -> Option<TypeName> {
    fn rank(name: &TypeName) -> Option<u8> {
        match name.as_str() {
            "byte" | "short" | "char" | "int" => Some(0),
            "long" => Some(1),
            "float" => Some(2),
            "double" => Some(3),
            _ => None,
        }
    }

    let widest = rank(left)?.max(rank(right)?);
    let name = match widest {
        0 => "int",
        1 => "long",
        2 => "float",
        _ => "double",
    };
    Some(TypeName::new(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: &str = r#"package com.acme;

import org.apache.hc.client5.http.config.RequestConfig;
import org.apache.hc.core5.http.io.*;

class Client {
    private RequestConfig.Builder builder;
    private final int timeout = 10;

    void configure(SocketConfig.Builder socket, long millis) {
        var custom = RequestConfig.custom();
        String label = "x";
        socket.setSoTimeout(timeout * 2);
        custom.setConnectTimeout(5000).setResponseTimeout((int) millis);
        this.builder.setConnectTimeout(timeout);
        org.apache.hc.core5.util.Timeout.ofSeconds(1);
    }
}
"#;

    fn calls(unit: &JavaUnit) -> Vec<MethodCall> {
        unit.syntax()
            .descendants()
            .filter_map(MethodCall::cast)
            .collect()
    }

    fn find_call(unit: &JavaUnit, name: &str) -> MethodCall {
        calls(unit)
            .into_iter()
            .find(|call| call.name().is_some_and(|n| n.text() == name))
            .unwrap()
    }

    #[test]
    fn test_resolve_type_names() {
        let table = TypeTable::httpclient5();
        let unit = JavaUnit::parse(UNIT).unwrap();
        let resolver = UnitResolver::new(&table, &unit);

        assert_eq!(
            resolver.resolve_type_name("RequestConfig.Builder").unwrap().as_str(),
            "org.apache.hc.client5.http.config.RequestConfig.Builder"
        );
        assert_eq!(
            resolver.resolve_type_name("SocketConfig").unwrap().as_str(),
            "org.apache.hc.core5.http.io.SocketConfig"
        );
        assert_eq!(resolver.resolve_type_name("String").unwrap().as_str(), "java.lang.String");
        assert_eq!(resolver.resolve_type_name("int[]").unwrap().as_str(), "int[]");
        assert_eq!(resolver.resolve_type_name("Unknown"), None);
    }

    #[test]
    fn test_owner_of_parameter_and_var() {
        let table = TypeTable::httpclient5();
        let unit = JavaUnit::parse(UNIT).unwrap();
        let resolver = UnitResolver::new(&table, &unit);

        let so_timeout = find_call(&unit, "setSoTimeout");
        assert_eq!(
            resolver.owner_of(&so_timeout).unwrap().as_str(),
            "org.apache.hc.core5.http.io.SocketConfig.Builder"
        );
        let argument = &so_timeout.arguments()[0];
        assert_eq!(resolver.type_of(argument).unwrap().as_str(), "int");

        let response = find_call(&unit, "setResponseTimeout");
        assert_eq!(
            resolver.owner_of(&response).unwrap().as_str(),
            "org.apache.hc.client5.http.config.RequestConfig.Builder"
        );
        assert_eq!(resolver.type_of(&response.arguments()[0]).unwrap().as_str(), "int");
    }

    #[test]
    fn test_this_field_receiver() {
        let table = TypeTable::httpclient5();
        let unit = JavaUnit::parse(UNIT).unwrap();
        let resolver = UnitResolver::new(&table, &unit);

        let owners: Vec<Option<TypeName>> = calls(&unit)
            .iter()
            .filter(|call| call.name().is_some_and(|n| n.text() == "setConnectTimeout"))
            .map(|call| resolver.owner_of(call))
            .collect();
        assert_eq!(owners.len(), 2);
        assert!(owners.iter().all(|owner| owner
            .as_ref()
            .is_some_and(|o| o.simple_name() == "Builder")));
    }

    #[test]
    fn test_qualified_references_and_declared_types() {
        let unit = JavaUnit::parse(UNIT).unwrap();
        let scope = UnitScope::collect(&unit.syntax());
        assert_eq!(scope.package(), Some("com.acme"));
        assert!(scope
            .qualified_references()
            .contains(&TypeName::new("org.apache.hc.core5.util.Timeout")));
        assert!(scope.declared_types().any(|t| t == "RequestConfig.Builder"));
    }

    #[test]
    fn test_same_name_in_separate_methods() {
        let table = TypeTable::httpclient5();
        let unit = JavaUnit::parse(
            "class A { void f(String x) { x.length(); } void g(StringBuilder x) { x.reverse(); } }",
        )
        .unwrap();
        let resolver = UnitResolver::new(&table, &unit);
        assert_eq!(
            resolver.owner_of(&find_call(&unit, "length")).unwrap().as_str(),
            "java.lang.String"
        );
        assert_eq!(
            resolver.owner_of(&find_call(&unit, "reverse")).unwrap().as_str(),
            "java.lang.StringBuilder"
        );
    }

    #[test]
    fn test_conflicting_declarations_in_one_scope_are_ambiguous() {
        let table = TypeTable::httpclient5();
        let unit = JavaUnit::parse("class A { String x; int x; void f() { x.length(); } }").unwrap();
        let resolver = UnitResolver::new(&table, &unit);
        assert_eq!(resolver.owner_of(&find_call(&unit, "length")), None);
    }

    #[test]
    fn test_locals_and_parameters_shadow_fields() {
        let table = TypeTable::httpclient5();
        let unit = JavaUnit::parse(
            "class A {\n    String x;\n    void f(StringBuilder x) { x.reverse(); }\n    void g() { x.length(); StringBuilder x = null; x.append(1); }\n    void h() { this.x.trim(); }\n}\n",
        )
        .unwrap();
        let resolver = UnitResolver::new(&table, &unit);
        let owner = |name: &str| resolver.owner_of(&find_call(&unit, name)).map(|t| t.to_string());

        assert_eq!(owner("reverse").as_deref(), Some("java.lang.StringBuilder"));
        assert_eq!(owner("length").as_deref(), Some("java.lang.String"));
        assert_eq!(owner("append").as_deref(), Some("java.lang.StringBuilder"));
        assert_eq!(owner("trim").as_deref(), Some("java.lang.String"));
    }

    #[test]
    fn test_inferred_lambda_parameters_are_unknown() {
        let table = TypeTable::httpclient5();
        let unit = JavaUnit::parse(
            "import org.apache.hc.client5.http.config.RequestConfig;\nclass A {\n    RequestConfig.Builder b;\n    Object one = b -> b.setConnectTimeout(1);\n    Object two = (b, c) -> b.setResponseTimeout(2);\n    Object typed = (RequestConfig.Builder b) -> b.setConnectionRequestTimeout(3);\n    void f() { b.build(); }\n}\n",
        )
        .unwrap();
        let resolver = UnitResolver::new(&table, &unit);
        let owner = |name: &str| resolver.owner_of(&find_call(&unit, name)).map(|t| t.to_string());

        assert_eq!(owner("setConnectTimeout"), None);
        assert_eq!(owner("setResponseTimeout"), None);
        assert_eq!(
            owner("setConnectionRequestTimeout").as_deref(),
            Some("org.apache.hc.client5.http.config.RequestConfig.Builder")
        );
        assert_eq!(
            owner("build").as_deref(),
            Some("org.apache.hc.client5.http.config.RequestConfig.Builder")
        );
    }

    #[test]
    fn test_pattern_binding_shadows_field() {
        let table = TypeTable::httpclient5();
        let unit = JavaUnit::parse(
            "import org.apache.hc.client5.http.config.RequestConfig;\nclass A {\n    RequestConfig.Builder b;\n    void f(Object o) { if (o instanceof Other b) { b.setConnectTimeout(1); } }\n}\n",
        )
        .unwrap();
        let resolver = UnitResolver::new(&table, &unit);
        assert_eq!(resolver.owner_of(&find_call(&unit, "setConnectTimeout")), None);
    }

    #[test]
    fn test_literal_and_arithmetic_types() {
        let table = TypeTable::new();
        let unit = JavaUnit::parse(
            "class A { void f() { a(1L); a(1.5f); a(2.0); a('c'); a(1 + 2L); a(\"s\" + 1); a(-3); a(true); } }",
        )
        .unwrap();
        let resolver = UnitResolver::new(&table, &unit);
        let types: Vec<Option<String>> = calls(&unit)
            .iter()
            .map(|call| resolver.type_of(&call.arguments()[0]).map(|t| t.to_string()))
            .collect();
        let expected = ["long", "float", "double", "char", "long", "java.lang.String", "int", "boolean"];
        assert_eq!(
            types,
            expected.iter().map(|t| Some((*t).to_string())).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_numeric_promotion() {
        let int = TypeName::new("int");
        let double = TypeName::new("double");
        assert_eq!(numeric_promotion(&int, &double), Some(double));
        assert_eq!(numeric_promotion(&TypeName::new("char"), &TypeName::new("short")), Some(int));
        assert_eq!(numeric_promotion(&TypeName::new("java.lang.String"), &TypeName::new("int")), None);
    }
}
