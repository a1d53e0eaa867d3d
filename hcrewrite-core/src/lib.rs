//! hcrewrite Core - Java Syntax Trees and Type Resolution
//!
//! This crate is the host side of the rewrite engine:
//! - Lossless, immutable Java syntax trees (tree-sitter-java parsed into rowan)
//! - Typed accessors for the handful of node shapes the engine inspects
//! - Erased type names and type patterns
//! - A declarative type table standing in for a classpath
//! - A per-unit type-resolution oracle over that table

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod ast;
pub mod resolve;
pub mod syntax;
pub mod table;
pub mod types;

pub use ast::{ImportDecl, MethodCall};
pub use resolve::{TypeResolver, UnitResolver, UnitScope};
pub use syntax::{
    JavaKind, JavaLanguage, JavaParser, JavaSyntaxElement, JavaSyntaxNode, JavaSyntaxToken,
    JavaUnit,
};
pub use table::{MethodInfo, TypeInfo, TypeTable};
pub use types::{TypeName, TypePattern};

/// Result type used throughout hcrewrite core
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Tree-sitter language error
    #[error("Language error: {0}")]
    Language(String),

    /// Malformed type pattern
    #[error("Invalid type pattern `{pattern}`: {reason}")]
    Pattern { pattern: String, reason: String },

    /// Malformed type name
    #[error("Invalid type name `{0}`")]
    TypeName(String),
}

impl From<tree_sitter::LanguageError> for Error {
    fn from(err: tree_sitter::LanguageError) -> Self {
        Error::Language(format!("{err:?}"))
    }
}
