//! Exact Method Signatures and the Signature Matcher
//!
//! Signatures are written the way method patterns usually are:
//!
//! ```text
//! org.apache.hc.client5.http.config.RequestConfig$Builder setConnectTimeout(int)
//! ```
//!
//! A call matches when its resolved owner type, its name and the erased types
//! of its arguments all equal one registered signature. There is no partial
//! or name-only matching, and anything the resolver cannot pin down is a
//! non-match.

use crate::{Result, TransformError};
use hcrewrite_core::types::is_java_identifier;
use hcrewrite_core::{MethodCall, TypeName, TypeResolver, TypeTable};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// `(owner type, method name, ordered parameter types)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    owner: TypeName,
    name: String,
    params: Vec<TypeName>,
}

impl MethodSignature {
    pub fn new(owner: &str, name: &str, params: &[&str]) -> Self {
        Self {
            owner: TypeName::new(owner),
            name: name.to_string(),
            params: params.iter().map(|param| TypeName::new(param)).collect(),
        }
    }

    /// Parse `owner name(param, ...)`
    pub fn parse(signature: &str) -> Result<Self> {
        let invalid = |reason: &str| TransformError::Signature {
            signature: signature.to_string(),
            reason: reason.to_string(),
        };

        let (head, params) = signature
            .trim()
            .split_once('(')
            .ok_or_else(|| invalid("missing parameter list"))?;
        let params = params
            .strip_suffix(')')
            .ok_or_else(|| invalid("parameter list must end with `)`"))?;
        let (owner, name) = head
            .trim()
            .rsplit_once(char::is_whitespace)
            .ok_or_else(|| invalid("expected `owner name(params)`"))?;

        let owner = TypeName::parse(owner.trim()).map_err(|_| invalid("malformed owner type"))?;
        if !owner.is_qualified() {
            return Err(invalid("owner type must be fully qualified"));
        }
        if !is_java_identifier(name) {
            return Err(invalid("malformed method name"));
        }

        let params = if params.trim().is_empty() {
            Vec::new()
        } else {
            split_params(params)
                .into_iter()
                .map(|param| TypeName::parse(param).map_err(|_| invalid("malformed parameter type")))
                .collect::<Result<Vec<_>>>()?
        };

        Ok(Self {
            owner,
            name: name.to_string(),
            params,
        })
    }

    pub fn owner(&self) -> &TypeName {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[TypeName] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Same name and parameter list, regardless of owner
    fn same_shape(&self, other: &Self) -> bool {
        self.name == other.name && self.params == other.params
    }
}

/// Split on top-level commas only (`Map<K, V>, int`)
fn split_params(params: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, ch) in params.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(params[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(params[start..].trim());
    parts
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.params.iter().map(TypeName::as_str).collect();
        write!(f, "{} {}({})", self.owner, self.name, params.join(", "))
    }
}

impl FromStr for MethodSignature {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Immutable registry of pairwise disjoint signatures
#[derive(Debug, Clone)]
pub struct SignatureMatcher {
    signatures: Vec<MethodSignature>,
    subtype_matching: bool,
}

impl SignatureMatcher {
    /// Build a registry, rejecting signatures that could match the same call.
    ///
    /// With `subtype_matching` a call on a subtype of a registered owner also
    /// matches, so two signatures with the same name and parameters whose
    /// owners are related through `table` overlap as well.
    pub fn new(
        signatures: Vec<MethodSignature>,
        subtype_matching: bool,
        table: &TypeTable,
    ) -> Result<Self> {
        for (index, first) in signatures.iter().enumerate() {
            for second in &signatures[index + 1..] {
                let overlapping = first == second
                    || (subtype_matching
                        && first.same_shape(second)
                        && (table.is_subtype(&first.owner, &second.owner)
                            || table.is_subtype(&second.owner, &first.owner)));
                if overlapping {
                    return Err(TransformError::OverlappingSignatures {
                        first: first.to_string(),
                        second: second.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            signatures,
            subtype_matching,
        })
    }

    pub fn signatures(&self) -> &[MethodSignature] {
        &self.signatures
    }

    pub fn subtype_matching(&self) -> bool {
        self.subtype_matching
    }

    pub fn matches(&self, call: &MethodCall, resolver: &dyn TypeResolver) -> bool {
        self.find(call, resolver).is_some()
    }

    /// The registered signature a call matches, if any
    pub fn find(&self, call: &MethodCall, resolver: &dyn TypeResolver) -> Option<&MethodSignature> {
        let name = call.name()?;
        let arguments = call.arguments();

        let mut candidates = self
            .signatures
            .iter()
            .filter(|signature| signature.name == name.text() && signature.arity() == arguments.len())
            .peekable();
        // Name and arity first, resolution only for plausible calls
        candidates.peek()?;

        let Some(owner) = resolver.owner_of(call) else {
            trace!(method = name.text(), "call owner unresolved, not rewriting");
            return None;
        };

        let mut argument_types = Vec::with_capacity(arguments.len());
        for argument in &arguments {
            let Some(argument_type) = resolver.type_of(argument) else {
                trace!(method = name.text(), "argument type unresolved, not rewriting");
                return None;
            };
            argument_types.push(argument_type);
        }

        candidates.find(|signature| {
            let owner_matches = owner == signature.owner
                || (self.subtype_matching && resolver.is_subtype(&owner, &signature.owner));
            owner_matches && signature.params == argument_types
        })
    }
}
