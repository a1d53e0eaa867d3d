//! Lossless Java Syntax Trees
//!
//! Java source is parsed with tree-sitter and converted into a rowan green
//! tree. Tree-sitter does not materialise whitespace, so every gap between
//! two leaves is kept as a `Whitespace` token; comments arrive from
//! tree-sitter as ordinary leaves. Printing an untouched tree therefore
//! reproduces the input byte for byte.
//!
//! Green nodes are immutable and shareable across threads. Every rewrite
//! builds new green nodes; nothing is edited in place.

use crate::{Error, Result};
use rowan::{GreenNode, GreenNodeBuilder, Language};
use tree_sitter::{Node, Parser};

/// Language definition for the Java tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JavaLanguage {}

impl Language for JavaLanguage {
    type Kind = JavaKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        JavaKind::from_raw(raw)
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.to_raw()
    }
}

pub type JavaSyntaxNode = rowan::SyntaxNode<JavaLanguage>;
pub type JavaSyntaxToken = rowan::SyntaxToken<JavaLanguage>;
pub type JavaSyntaxElement = rowan::SyntaxElement<JavaLanguage>;

/// Syntax kinds the engine distinguishes.
///
/// Everything else collapses into `Node` (interior) or `Token` (leaf); the
/// original text is still kept, so nothing is lost for printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum JavaKind {
    // Structure
    Program = 0,
    PackageDeclaration,
    ImportDeclaration,
    ClassDeclaration,
    InterfaceDeclaration,
    EnumDeclaration,
    RecordDeclaration,
    AnnotationTypeDeclaration,
    MethodDeclaration,
    Block,
    ReturnStatement,
    ExpressionStatement,

    // Declarations
    LocalVariableDeclaration,
    FieldDeclaration,
    FormalParameter,
    CatchFormalParameter,
    EnhancedForStatement,
    VariableDeclarator,
    Resource,
    InferredParameters,
    TypeParameter,

    // Names and types
    Identifier,
    ScopedIdentifier,
    TypeIdentifier,
    ScopedTypeIdentifier,
    GenericType,
    TypeArguments,
    IntegralType,
    FloatingPointType,
    BooleanType,
    VoidType,
    ArrayType,
    Asterisk,

    // Expressions
    MethodInvocation,
    ArgumentList,
    FieldAccess,
    ObjectCreationExpression,
    CastExpression,
    ParenthesizedExpression,
    BinaryExpression,
    UnaryExpression,
    AssignmentExpression,
    InstanceofExpression,
    LambdaExpression,
    This,

    // Literals
    IntegerLiteral,
    FloatingPointLiteral,
    StringLiteral,
    CharacterLiteral,
    True,
    False,
    NullLiteral,

    // Punctuation and keywords
    ImportKw,
    StaticKw,
    PackageKw,
    Semicolon,
    Dot,
    Comma,
    LParen,
    RParen,

    // Trivia
    Whitespace,
    LineComment,
    BlockComment,

    // Fallbacks
    Error,
    Node,
    Token,
}

/// Every kind in discriminant order; `KINDS[k as usize] == k`.
const KINDS: [JavaKind; 66] = [
    JavaKind::Program,
    JavaKind::PackageDeclaration,
    JavaKind::ImportDeclaration,
    JavaKind::ClassDeclaration,
    JavaKind::InterfaceDeclaration,
    JavaKind::EnumDeclaration,
    JavaKind::RecordDeclaration,
    JavaKind::AnnotationTypeDeclaration,
    JavaKind::MethodDeclaration,
    JavaKind::Block,
    JavaKind::ReturnStatement,
    JavaKind::ExpressionStatement,
    JavaKind::LocalVariableDeclaration,
    JavaKind::FieldDeclaration,
    JavaKind::FormalParameter,
    JavaKind::CatchFormalParameter,
    JavaKind::EnhancedForStatement,
    JavaKind::VariableDeclarator,
    JavaKind::Resource,
    JavaKind::InferredParameters,
    JavaKind::TypeParameter,
    JavaKind::Identifier,
    JavaKind::ScopedIdentifier,
    JavaKind::TypeIdentifier,
    JavaKind::ScopedTypeIdentifier,
    JavaKind::GenericType,
    JavaKind::TypeArguments,
    JavaKind::IntegralType,
    JavaKind::FloatingPointType,
    JavaKind::BooleanType,
    JavaKind::VoidType,
    JavaKind::ArrayType,
    JavaKind::Asterisk,
    JavaKind::MethodInvocation,
    JavaKind::ArgumentList,
    JavaKind::FieldAccess,
    JavaKind::ObjectCreationExpression,
    JavaKind::CastExpression,
    JavaKind::ParenthesizedExpression,
    JavaKind::BinaryExpression,
    JavaKind::UnaryExpression,
    JavaKind::AssignmentExpression,
    JavaKind::InstanceofExpression,
    JavaKind::LambdaExpression,
    JavaKind::This,
    JavaKind::IntegerLiteral,
    JavaKind::FloatingPointLiteral,
    JavaKind::StringLiteral,
    JavaKind::CharacterLiteral,
    JavaKind::True,
    JavaKind::False,
    JavaKind::NullLiteral,
    JavaKind::ImportKw,
    JavaKind::StaticKw,
    JavaKind::PackageKw,
    JavaKind::Semicolon,
    JavaKind::Dot,
    JavaKind::Comma,
    JavaKind::LParen,
    JavaKind::RParen,
    JavaKind::Whitespace,
    JavaKind::LineComment,
    JavaKind::BlockComment,
    JavaKind::Error,
    JavaKind::Node,
    JavaKind::Token,
];

impl JavaKind {
    fn from_raw(raw: rowan::SyntaxKind) -> Self {
        KINDS.get(raw.0 as usize).copied().unwrap_or(JavaKind::Token)
    }

    fn to_raw(self) -> rowan::SyntaxKind {
        rowan::SyntaxKind(self as u16)
    }

    /// Map a tree-sitter-java node kind to ours
    pub fn from_tree_sitter(kind: &str, is_leaf: bool) -> Self {
        match kind {
            "program" => Self::Program,
            "package_declaration" => Self::PackageDeclaration,
            "import_declaration" => Self::ImportDeclaration,
            "class_declaration" => Self::ClassDeclaration,
            "interface_declaration" => Self::InterfaceDeclaration,
            "enum_declaration" => Self::EnumDeclaration,
            "record_declaration" => Self::RecordDeclaration,
            "annotation_type_declaration" => Self::AnnotationTypeDeclaration,
            "method_declaration" => Self::MethodDeclaration,
            "block" => Self::Block,
            "return_statement" => Self::ReturnStatement,
            "expression_statement" => Self::ExpressionStatement,
            "local_variable_declaration" => Self::LocalVariableDeclaration,
            "field_declaration" => Self::FieldDeclaration,
            "formal_parameter" => Self::FormalParameter,
            "catch_formal_parameter" => Self::CatchFormalParameter,
            "enhanced_for_statement" => Self::EnhancedForStatement,
            "variable_declarator" => Self::VariableDeclarator,
            "resource" => Self::Resource,
            "inferred_parameters" => Self::InferredParameters,
            "type_parameter" => Self::TypeParameter,
            "identifier" => Self::Identifier,
            "scoped_identifier" => Self::ScopedIdentifier,
            "type_identifier" => Self::TypeIdentifier,
            "scoped_type_identifier" => Self::ScopedTypeIdentifier,
            "generic_type" => Self::GenericType,
            "type_arguments" => Self::TypeArguments,
            "integral_type" => Self::IntegralType,
            "floating_point_type" => Self::FloatingPointType,
            "boolean_type" => Self::BooleanType,
            "void_type" => Self::VoidType,
            "array_type" => Self::ArrayType,
            "asterisk" => Self::Asterisk,
            "method_invocation" => Self::MethodInvocation,
            "argument_list" => Self::ArgumentList,
            "field_access" => Self::FieldAccess,
            "object_creation_expression" => Self::ObjectCreationExpression,
            "cast_expression" => Self::CastExpression,
            "parenthesized_expression" => Self::ParenthesizedExpression,
            "binary_expression" => Self::BinaryExpression,
            "unary_expression" => Self::UnaryExpression,
            "assignment_expression" => Self::AssignmentExpression,
            "instanceof_expression" => Self::InstanceofExpression,
            "lambda_expression" => Self::LambdaExpression,
            "this" => Self::This,
            "decimal_integer_literal"
            | "hex_integer_literal"
            | "octal_integer_literal"
            | "binary_integer_literal" => Self::IntegerLiteral,
            "decimal_floating_point_literal" | "hex_floating_point_literal" => {
                Self::FloatingPointLiteral
            }
            "string_literal" | "text_block" => Self::StringLiteral,
            "character_literal" => Self::CharacterLiteral,
            "true" => Self::True,
            "false" => Self::False,
            "null_literal" => Self::NullLiteral,
            "import" if is_leaf => Self::ImportKw,
            "static" if is_leaf => Self::StaticKw,
            "package" if is_leaf => Self::PackageKw,
            ";" => Self::Semicolon,
            "." => Self::Dot,
            "," => Self::Comma,
            "(" => Self::LParen,
            ")" => Self::RParen,
            "line_comment" => Self::LineComment,
            "block_comment" => Self::BlockComment,
            "comment" if is_leaf => Self::LineComment,
            "ERROR" => Self::Error,
            _ if is_leaf => Self::Token,
            _ => Self::Node,
        }
    }

    /// Whitespace and comments
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Whitespace | Self::LineComment | Self::BlockComment)
    }

    /// Declarations that introduce a type name
    pub fn is_type_declaration(self) -> bool {
        matches!(
            self,
            Self::ClassDeclaration
                | Self::InterfaceDeclaration
                | Self::EnumDeclaration
                | Self::RecordDeclaration
                | Self::AnnotationTypeDeclaration
                | Self::TypeParameter
        )
    }

    /// Kinds that spell a type in a declaration
    pub fn is_type(self) -> bool {
        matches!(
            self,
            Self::TypeIdentifier
                | Self::ScopedTypeIdentifier
                | Self::GenericType
                | Self::IntegralType
                | Self::FloatingPointType
                | Self::BooleanType
                | Self::VoidType
                | Self::ArrayType
        )
    }
}

impl From<JavaKind> for rowan::SyntaxKind {
    fn from(kind: JavaKind) -> Self {
        kind.to_raw()
    }
}

/// One parsed compilation unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaUnit {
    green: GreenNode,
    has_errors: bool,
}

impl JavaUnit {
    /// Parse Java source with a fresh parser
    pub fn parse(source: &str) -> Result<Self> {
        JavaParser::new()?.parse(source)
    }

    /// Wrap an already-built tree
    pub fn from_green(green: GreenNode, has_errors: bool) -> Self {
        Self { green, has_errors }
    }

    /// Red (navigable) view of the tree
    pub fn syntax(&self) -> JavaSyntaxNode {
        JavaSyntaxNode::new_root(self.green.clone())
    }

    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    /// Whether tree-sitter reported error or missing nodes
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Replace the tree, keeping the parse status
    #[must_use]
    pub fn with_green(&self, green: GreenNode) -> Self {
        Self {
            green,
            has_errors: self.has_errors,
        }
    }

    /// Source text of the unit
    pub fn text(&self) -> String {
        self.syntax().to_string()
    }
}

impl std::fmt::Display for JavaUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.syntax())
    }
}

/// Parser producing lossless Java trees
pub struct JavaParser {
    tree_sitter_parser: Parser,
}

impl JavaParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(tree_sitter_java::language())?;
        Ok(Self {
            tree_sitter_parser: parser,
        })
    }

    /// Parse a complete compilation unit
    pub fn parse(&mut self, source: &str) -> Result<JavaUnit> {
        let tree = self
            .tree_sitter_parser
            .parse(source, None)
            .ok_or_else(|| Error::Parse("Failed to parse source code".to_string()))?;

        let root = tree.root_node();
        let has_errors = root.has_error();
        if has_errors {
            tracing::debug!("tree-sitter reported syntax errors in unit");
        }

        let mut builder = TreeBuilder {
            source,
            builder: GreenNodeBuilder::new(),
            offset: 0,
        };
        builder.convert_root(root)?;

        Ok(JavaUnit {
            green: builder.builder.finish(),
            has_errors,
        })
    }
}

/// Walks a tree-sitter tree in document order, emitting rowan events
struct TreeBuilder<'s> {
    source: &'s str,
    builder: GreenNodeBuilder<'static>,
    offset: usize,
}

impl<'s> TreeBuilder<'s> {
    fn convert_root(&mut self, root: Node) -> Result<()> {
        // The root starts at the first token; leading and trailing trivia
        // belong to it all the same.
        self.builder
            .start_node(JavaKind::from_tree_sitter(root.kind(), false).into());
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            self.convert_node(child)?;
        }
        self.gap(self.source.len())?;
        self.builder.finish_node();
        Ok(())
    }

    fn convert_node(&mut self, node: Node) -> Result<()> {
        // Gaps go to the enclosing node so a subtree never starts with trivia
        self.gap(node.start_byte())?;

        if node.child_count() == 0 {
            let start = node.start_byte().max(self.offset);
            let end = node.end_byte().max(start);
            let text = self.slice(start, end)?;
            self.builder
                .token(JavaKind::from_tree_sitter(node.kind(), true).into(), text);
            self.offset = end;
            return Ok(());
        }

        self.builder
            .start_node(JavaKind::from_tree_sitter(node.kind(), false).into());
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.convert_node(child)?;
        }
        self.builder.finish_node();
        Ok(())
    }

    fn gap(&mut self, upto: usize) -> Result<()> {
        if upto > self.offset {
            let text = self.slice(self.offset, upto)?;
            self.builder.token(JavaKind::Whitespace.into(), text);
            self.offset = upto;
        }
        Ok(())
    }

    fn slice(&self, start: usize, end: usize) -> Result<&'s str> {
        self.source
            .get(start..end)
            .ok_or_else(|| Error::Parse(format!("invalid byte range {start}..{end}")))
    }
}
