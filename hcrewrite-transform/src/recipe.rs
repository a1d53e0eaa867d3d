//! Recipes
//!
//! A recipe is a fully validated rule: precondition, signatures, template
//! and argument selection. Everything that can be wrong with a rule is
//! reported by [`RecipeBuilder::build`]; a recipe that exists can rewrite
//! any unit without failing.

use crate::driver::{RewriteOutcome, TraversalDriver};
use crate::precondition::PreconditionGate;
use crate::signature::{MethodSignature, SignatureMatcher};
use crate::template::{Placeholder, Template, TemplateTarget};
use crate::{Result, TransformError};
use hcrewrite_core::{JavaUnit, TypeInfo, TypeTable, UnitResolver};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// A rewrite rule applied one compilation unit at a time
pub trait Recipe: Send + Sync {
    /// Stable identifier
    fn name(&self) -> &str;

    /// Human-readable title
    fn display_name(&self) -> &str;

    fn description(&self) -> &str;

    /// Rewrite one unit; the returned unit already carries new imports
    fn rewrite_unit(&self, unit: &JavaUnit) -> RewriteOutcome;

    /// Parse and rewrite source text
    fn rewrite_source(&self, source: &str) -> Result<RewriteOutcome> {
        let unit = JavaUnit::parse(source)?;
        Ok(self.rewrite_unit(&unit))
    }
}

/// Rewrites calls matching a set of signatures through one template
#[derive(Debug, Clone)]
pub struct MethodRewriteRecipe {
    name: String,
    display_name: String,
    description: String,
    gate: PreconditionGate,
    matcher: SignatureMatcher,
    template: Arc<Template>,
    selected_args: Vec<usize>,
    table: Arc<TypeTable>,
}

impl MethodRewriteRecipe {
    pub fn builder(name: &str) -> RecipeBuilder {
        RecipeBuilder::new(name)
    }

    pub fn gate(&self) -> &PreconditionGate {
        &self.gate
    }

    pub fn matcher(&self) -> &SignatureMatcher {
        &self.matcher
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn selected_args(&self) -> &[usize] {
        &self.selected_args
    }

    pub fn type_table(&self) -> &TypeTable {
        &self.table
    }

    fn driver(&self) -> TraversalDriver<'_> {
        TraversalDriver {
            gate: &self.gate,
            matcher: &self.matcher,
            template: &self.template,
            selected_args: &self.selected_args,
        }
    }
}

impl Recipe for MethodRewriteRecipe {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn rewrite_unit(&self, unit: &JavaUnit) -> RewriteOutcome {
        let resolver = UnitResolver::new(&self.table, unit);
        self.driver().run(unit, resolver.scope(), &resolver)
    }
}

/// Step-by-step construction of a [`MethodRewriteRecipe`]
#[derive(Debug, Clone)]
pub struct RecipeBuilder {
    name: String,
    display_name: Option<String>,
    description: Option<String>,
    precondition: Option<(String, bool)>,
    signatures: Vec<String>,
    subtype_matching: bool,
    fragment: Option<String>,
    placeholders: Option<Vec<Placeholder>>,
    imports: Vec<String>,
    target: TemplateTarget,
    selected_args: Option<Vec<usize>>,
    table: TypeTable,
}

impl RecipeBuilder {
    /// Starts from the built-in HttpClient 5 type table
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: None,
            description: None,
            precondition: None,
            signatures: Vec::new(),
            subtype_matching: false,
            fragment: None,
            placeholders: None,
            imports: Vec::new(),
            target: TemplateTarget::default(),
            selected_args: None,
            table: TypeTable::httpclient5(),
        }
    }

    #[must_use]
    pub fn display_name(mut self, display_name: &str) -> Self {
        self.display_name = Some(display_name.to_string());
        self
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Type pattern a unit must reference (`a.b.C`, `a.b.*` or `a.b..*`)
    #[must_use]
    pub fn precondition(mut self, pattern: &str, include_implicit: bool) -> Self {
        self.precondition = Some((pattern.to_string(), include_implicit));
        self
    }

    #[must_use]
    pub fn signature(mut self, signature: &str) -> Self {
        self.signatures.push(signature.to_string());
        self
    }

    #[must_use]
    pub fn subtype_matching(mut self, enabled: bool) -> Self {
        self.subtype_matching = enabled;
        self
    }

    #[must_use]
    pub fn template(mut self, fragment: &str) -> Self {
        self.fragment = Some(fragment.to_string());
        self
    }

    /// Declared placeholders; defaults to the ones written in the fragment
    #[must_use]
    pub fn placeholders(mut self, placeholders: Vec<Placeholder>) -> Self {
        self.placeholders = Some(placeholders);
        self
    }

    #[must_use]
    pub fn import(mut self, import: &str) -> Self {
        self.imports.push(import.to_string());
        self
    }

    #[must_use]
    pub fn target(mut self, target: TemplateTarget) -> Self {
        self.target = target;
        self
    }

    /// Argument index feeding each placeholder; defaults to `0, 1, ...`
    #[must_use]
    pub fn selected_args(mut self, selected_args: Vec<usize>) -> Self {
        self.selected_args = Some(selected_args);
        self
    }

    /// Replace the type table
    #[must_use]
    pub fn type_table(mut self, table: TypeTable) -> Self {
        self.table = table;
        self
    }

    /// Add types to the table
    #[must_use]
    pub fn extend_types(mut self, types: impl IntoIterator<Item = TypeInfo>) -> Self {
        for info in types {
            self.table.insert(info);
        }
        self
    }

    /// Validate every part of the rule and assemble it
    pub fn build(self) -> Result<MethodRewriteRecipe> {
        let (pattern, include_implicit) = self
            .precondition
            .ok_or_else(|| TransformError::Config(format!("recipe `{}` has no precondition", self.name)))?;
        let gate = PreconditionGate::new(&pattern, include_implicit)?;

        if self.signatures.is_empty() {
            return Err(TransformError::Config(format!(
                "recipe `{}` has no signatures",
                self.name
            )));
        }
        let signatures = self
            .signatures
            .iter()
            .map(|signature| MethodSignature::parse(signature))
            .collect::<Result<Vec<_>>>()?;
        let matcher = SignatureMatcher::new(signatures, self.subtype_matching, &self.table)?;

        let fragment = self
            .fragment
            .ok_or_else(|| TransformError::Config(format!("recipe `{}` has no template", self.name)))?;
        let imports: Vec<&str> = self.imports.iter().map(String::as_str).collect();
        let template = match self.placeholders {
            Some(placeholders) => Template::compile(&fragment, placeholders, &imports, self.target)?,
            None => Template::from_fragment(&fragment, &imports, self.target)?,
        };

        let selected_args = self
            .selected_args
            .unwrap_or_else(|| (0..template.placeholders().len()).collect());
        check_selected_args(&template, &matcher, &selected_args)?;

        info!(
            recipe = %self.name,
            signatures = matcher.signatures().len(),
            "recipe built"
        );

        Ok(MethodRewriteRecipe {
            display_name: self.display_name.unwrap_or_else(|| self.name.clone()),
            description: self.description.unwrap_or_default(),
            name: self.name,
            gate,
            matcher,
            template: Arc::new(template),
            selected_args,
            table: Arc::new(self.table),
        })
    }
}

/// Selected arguments must line up with the placeholders and exist, with
/// the declared type, in every registered signature
fn check_selected_args(template: &Template, matcher: &SignatureMatcher, selected_args: &[usize]) -> Result<()> {
    let placeholders = template.placeholders();
    if selected_args.len() != placeholders.len() {
        return Err(TransformError::Placeholder(format!(
            "{} argument(s) selected for {} placeholder(s) in `{}`",
            selected_args.len(),
            placeholders.len(),
            template.fragment()
        )));
    }

    for signature in matcher.signatures() {
        for (placeholder, &index) in placeholders.iter().zip(selected_args) {
            let Some(param) = signature.params().get(index) else {
                return Err(TransformError::Placeholder(format!(
                    "argument {index} selected but `{signature}` takes {}",
                    signature.arity()
                )));
            };
            if placeholder
                .type_constraint
                .as_ref()
                .is_some_and(|expected| expected != param)
            {
                return Err(TransformError::Placeholder(format!(
                    "{placeholder} cannot take argument {index} of `{signature}`, which is {param}"
                )));
            }
        }
    }
    Ok(())
}

/// Serialisable form of a [`MethodRewriteRecipe`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSpec {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub precondition: String,
    #[serde(default = "default_include_implicit")]
    pub include_implicit: bool,
    pub signatures: Vec<String>,
    #[serde(default)]
    pub subtype_matching: bool,
    pub template: String,
    #[serde(default)]
    pub placeholders: Option<Vec<Placeholder>>,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub target: TemplateTarget,
    #[serde(default)]
    pub selected_args: Option<Vec<usize>>,
    /// Extra types merged into the built-in table
    #[serde(default)]
    pub types: Vec<TypeInfo>,
}

fn default_include_implicit() -> bool {
    true
}

impl RecipeSpec {
    /// Load from a TOML, JSON or YAML file
    pub fn load(path: &Path) -> Result<Self> {
        Ok(hcrewrite_utils::load_config(path)?)
    }

    pub fn build(self) -> Result<MethodRewriteRecipe> {
        let mut builder = RecipeBuilder::new(&self.name)
            .precondition(&self.precondition, self.include_implicit)
            .subtype_matching(self.subtype_matching)
            .template(&self.template)
            .target(self.target)
            .extend_types(self.types);
        if let Some(display_name) = &self.display_name {
            builder = builder.display_name(display_name);
        }
        if let Some(description) = &self.description {
            builder = builder.description(description);
        }
        for signature in &self.signatures {
            builder = builder.signature(signature);
        }
        for import in &self.imports {
            builder = builder.import(import);
        }
        if let Some(placeholders) = self.placeholders {
            builder = builder.placeholders(placeholders);
        }
        if let Some(selected_args) = self.selected_args {
            builder = builder.selected_args(selected_args);
        }
        builder.build()
    }
}

impl TryFrom<RecipeSpec> for MethodRewriteRecipe {
    type Error = TransformError;

    fn try_from(spec: RecipeSpec) -> Result<Self> {
        spec.build()
    }
}

/// Wraps bare millisecond timeouts of HttpClient 5 builders in `Timeout`:
///
/// ```java
/// builder.setConnectTimeout(5000);
/// // becomes
/// builder.setConnectTimeout(Timeout.ofMilliseconds(5000));
/// ```
#[derive(Debug, Clone)]
pub struct UseTimeout {
    recipe: MethodRewriteRecipe,
}

impl UseTimeout {
    pub const NAME: &'static str = "hcrewrite.httpclient5.UseTimeout";
    pub const DISPLAY_NAME: &'static str = "Use `Timeout` class to define timeouts";
    pub const DESCRIPTION: &'static str = "Use Timeout class to define timeouts.";
    pub const PRECONDITION: &'static str = "org.apache.hc..*";
    pub const TEMPLATE: &'static str = "Timeout.ofMilliseconds(#{})";
    pub const TIMEOUT_TYPE: &'static str = "org.apache.hc.core5.util.Timeout";
    pub const SIGNATURES: [&'static str; 4] = [
        "org.apache.hc.client5.http.config.RequestConfig$Builder setConnectionRequestTimeout(int)",
        "org.apache.hc.client5.http.config.RequestConfig$Builder setConnectTimeout(int)",
        "org.apache.hc.client5.http.config.RequestConfig$Builder setResponseTimeout(int)",
        "org.apache.hc.core5.http.io.SocketConfig$Builder setSoTimeout(int)",
    ];

    pub fn new() -> Result<Self> {
        Self::with_type_table(TypeTable::httpclient5())
    }

    /// Same rule over a caller-supplied table
    pub fn with_type_table(table: TypeTable) -> Result<Self> {
        let builder = Self::SIGNATURES.iter().fold(
            MethodRewriteRecipe::builder(Self::NAME)
                .display_name(Self::DISPLAY_NAME)
                .description(Self::DESCRIPTION)
                .precondition(Self::PRECONDITION, true)
                .template(Self::TEMPLATE)
                .import(Self::TIMEOUT_TYPE)
                .target(TemplateTarget::Arguments)
                .type_table(table),
            |builder, signature| builder.signature(signature),
        );
        Ok(Self {
            recipe: builder.build()?,
        })
    }

    pub fn recipe(&self) -> &MethodRewriteRecipe {
        &self.recipe
    }
}

impl Recipe for UseTimeout {
    fn name(&self) -> &str {
        self.recipe.name()
    }

    fn display_name(&self) -> &str {
        self.recipe.display_name()
    }

    fn description(&self) -> &str {
        self.recipe.description()
    }

    fn rewrite_unit(&self, unit: &JavaUnit) -> RewriteOutcome {
        self.recipe.rewrite_unit(unit)
    }
}
