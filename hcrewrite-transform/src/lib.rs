//! hcrewrite Transform - Signature-Driven Call-Site Rewriting
//!
//! This crate holds the rewrite engine proper. A rule is built once from a
//! type pattern, a set of exact method signatures and a replacement
//! template; it is then applied to any number of Java compilation units.
//!
//! Components, leaf first:
//! - [`PreconditionGate`]: does a unit reference the target type family at all
//! - [`SignatureMatcher`]: exact `(owner, name, parameter types)` matching
//! - [`Template`]: replacement fragment compiled and validated up front
//! - [`apply`](apply::apply): structural substitution of captured arguments
//! - [`ImportMaintainer`]: per-unit pending imports, merged at unit end
//! - [`TraversalDriver`]: pre-order walk threading the above across a unit
//!
//! [`MethodRewriteRecipe`] bundles a rule, [`UseTimeout`] is the stock
//! HttpClient 5 timeout migration and [`BatchRunner`] fans units out over
//! a rayon pool.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod apply;
pub mod batch;
pub mod driver;
pub mod imports;
pub mod precondition;
pub mod recipe;
pub mod signature;
pub mod template;

pub use batch::{BatchReport, BatchRunner, SourceUnit, UnitReport, UnitStatus};
pub use driver::{RewriteContext, RewriteOutcome, RewriteStats, SkipReason, TraversalDriver, VisitState};
pub use imports::ImportMaintainer;
pub use precondition::PreconditionGate;
pub use recipe::{MethodRewriteRecipe, Recipe, RecipeBuilder, RecipeSpec, UseTimeout};
pub use signature::{MethodSignature, SignatureMatcher};
pub use template::{Placeholder, Template, TemplateTarget};

/// Result type for rewrite operations
pub type Result<T> = std::result::Result<T, TransformError>;

/// Error types for rewrite operations.
///
/// Every variant is a rule-definition error raised while a recipe is being
/// built. Per-unit rewriting never fails: anything that cannot be analysed
/// is left unchanged.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Template fragment is malformed
    #[error("Template error in `{fragment}`: {reason}")]
    Template { fragment: String, reason: String },

    /// Placeholders disagree with the fragment or the selected arguments
    #[error("Placeholder error: {0}")]
    Placeholder(String),

    /// Method signature could not be parsed
    #[error("Invalid method signature `{signature}`: {reason}")]
    Signature { signature: String, reason: String },

    /// Two registered signatures could match the same call
    #[error("Overlapping signatures: `{first}` and `{second}`")]
    OverlappingSignatures { first: String, second: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// hcrewrite core error
    #[error("Core error: {0}")]
    Core(#[from] hcrewrite_core::Error),

    /// Utility error
    #[error("Utility error: {0}")]
    Util(#[from] hcrewrite_utils::UtilError),

    /// Regex compilation error
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl TransformError {
    pub(crate) fn template(fragment: &str, reason: impl Into<String>) -> Self {
        Self::Template {
            fragment: fragment.to_string(),
            reason: reason.into(),
        }
    }
}
