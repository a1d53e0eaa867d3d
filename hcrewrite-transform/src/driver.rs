//! Traversal Driver
//!
//! Walks one unit in pre-order, asking the signature matcher at every call
//! and splicing template output in place of matched calls. The tree is
//! rebuilt functionally: an untouched subtree keeps its original green node,
//! a touched one gets a new node, and the input unit is never modified.
//!
//! Every call site moves through [`VisitState`] exactly once. Matching uses
//! the original tree, so nested matches inside captured arguments, and in
//! receiver chains, are all found in the same pass. The replacement itself is
//! never matched again; template output is not a registered signature.

use crate::apply::{apply, GreenElement};
use crate::imports::{self, ImportMaintainer};
use crate::precondition::PreconditionGate;
use crate::signature::SignatureMatcher;
use crate::template::Template;
use hcrewrite_core::{JavaKind, JavaSyntaxNode, JavaUnit, MethodCall, TypeName, TypeResolver, UnitScope};
use rowan::{GreenNode, NodeOrToken, TextRange};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::AddAssign;
use tracing::{debug, trace};

/// Lifecycle of one call site within a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitState {
    Unvisited,
    Visiting,
    Rewritten,
    Unchanged,
}

/// Why a unit was returned without being walked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The parser reported errors; the unit cannot be analysed safely
    ParseErrors,
    /// The unit does not reference the target type family
    PreconditionAbsent,
    /// A required import would clash with an existing name
    ImportConflict,
}

/// Counters for one unit, or summed over a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteStats {
    pub calls_visited: usize,
    pub calls_rewritten: usize,
    pub imports_added: usize,
}

impl AddAssign for RewriteStats {
    fn add_assign(&mut self, other: Self) {
        self.calls_visited += other.calls_visited;
        self.calls_rewritten += other.calls_rewritten;
        self.imports_added += other.imports_added;
    }
}

/// Result of rewriting one unit
#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    pub unit: JavaUnit,
    pub changed: bool,
    pub stats: RewriteStats,
    pub imports_added: Vec<TypeName>,
    pub skipped: Option<SkipReason>,
}

impl RewriteOutcome {
    /// The input handed back as is
    pub fn unchanged(unit: &JavaUnit, skipped: Option<SkipReason>) -> Self {
        Self {
            unit: unit.clone(),
            changed: false,
            stats: RewriteStats::default(),
            imports_added: Vec::new(),
            skipped,
        }
    }
}

/// Per-unit state, created when a unit starts and consumed when it ends
#[derive(Debug, Default)]
pub struct RewriteContext {
    gate_present: bool,
    imports: ImportMaintainer,
    stats: RewriteStats,
    states: HashMap<TextRange, VisitState>,
}

impl RewriteContext {
    pub fn new(gate_present: bool) -> Self {
        Self {
            gate_present,
            ..Self::default()
        }
    }

    pub fn gate_present(&self) -> bool {
        self.gate_present
    }

    pub fn stats(&self) -> RewriteStats {
        self.stats
    }

    /// State of the call site spanning `range` in the input unit
    pub fn state(&self, range: TextRange) -> VisitState {
        self.states
            .get(&range)
            .copied()
            .unwrap_or(VisitState::Unvisited)
    }

    /// Every call site seen so far has settled
    pub fn is_settled(&self) -> bool {
        self.states
            .values()
            .all(|state| matches!(state, VisitState::Rewritten | VisitState::Unchanged))
    }

    fn transition(&mut self, range: TextRange, state: VisitState) {
        self.states.insert(range, state);
    }
}

/// The parts of one rule a walk needs, borrowed from the recipe
#[derive(Debug, Clone, Copy)]
pub struct TraversalDriver<'r> {
    pub gate: &'r PreconditionGate,
    pub matcher: &'r SignatureMatcher,
    pub template: &'r Template,
    pub selected_args: &'r [usize],
}

impl<'r> TraversalDriver<'r> {
    /// Rewrite one unit
    pub fn run(&self, unit: &JavaUnit, scope: &UnitScope, resolver: &dyn TypeResolver) -> RewriteOutcome {
        if unit.has_errors() {
            debug!("unit has syntax errors, leaving it unchanged");
            return RewriteOutcome::unchanged(unit, Some(SkipReason::ParseErrors));
        }

        if !self.gate.present(scope, resolver) {
            trace!(pattern = %self.gate.pattern(), "precondition absent");
            return RewriteOutcome::unchanged(unit, Some(SkipReason::PreconditionAbsent));
        }

        let root = unit.syntax();
        if let Some(symbol) = self
            .template
            .required_imports()
            .iter()
            .find(|symbol| imports::conflicts(&root, symbol))
        {
            debug!(import = %symbol, "required import clashes with an existing name, leaving unit unchanged");
            return RewriteOutcome::unchanged(unit, Some(SkipReason::ImportConflict));
        }

        let mut context = RewriteContext::new(true);
        let rewritten = self.visit(&root, resolver, &mut context);
        debug_assert!(context.is_settled());

        let RewriteContext {
            imports, mut stats, ..
        } = context;
        let Some(NodeOrToken::Node(green)) = rewritten else {
            return RewriteOutcome {
                stats,
                ..RewriteOutcome::unchanged(unit, None)
            };
        };

        let (unit_out, imports_added) = imports.flush(&unit.with_green(green));
        stats.imports_added = imports_added.len();
        debug!(
            rewritten = stats.calls_rewritten,
            imports = stats.imports_added,
            "unit rewritten"
        );

        RewriteOutcome {
            changed: unit_out.green() != unit.green(),
            unit: unit_out,
            stats,
            imports_added,
            skipped: None,
        }
    }

    /// New green element for `node` if anything below it changed
    fn visit(
        &self,
        node: &JavaSyntaxNode,
        resolver: &dyn TypeResolver,
        context: &mut RewriteContext,
    ) -> Option<GreenElement> {
        let call = (node.kind() == JavaKind::MethodInvocation)
            .then(|| MethodCall::cast(node.clone()))
            .flatten();
        let matched = call.as_ref().is_some_and(|call| {
            context.transition(node.text_range(), VisitState::Visiting);
            context.stats.calls_visited += 1;
            self.matcher.find(call, resolver).is_some()
        });

        let mut changed = false;
        let children: Vec<GreenElement> = node
            .children_with_tokens()
            .map(|child| match child {
                NodeOrToken::Node(child) => match self.visit(&child, resolver, context) {
                    Some(replacement) => {
                        changed = true;
                        replacement
                    }
                    None => NodeOrToken::Node(child.green().into_owned()),
                },
                NodeOrToken::Token(token) => NodeOrToken::Token(token.green().to_owned()),
            })
            .collect();
        let rebuilt = if changed {
            GreenNode::new(node.kind().into(), children)
        } else {
            node.green().into_owned()
        };

        if call.is_some() {
            let parent = node.parent().map(|parent| parent.kind());
            let replacement = matched
                .then(|| apply(self.template, &rebuilt, self.selected_args, parent))
                .flatten();
            let state = if replacement.is_some() {
                VisitState::Rewritten
            } else {
                VisitState::Unchanged
            };
            context.transition(node.text_range(), state);

            if let Some(replacement) = replacement {
                trace!(call = %node, "rewriting call");
                context.stats.calls_rewritten += 1;
                for symbol in self.template.required_imports() {
                    context.imports.request_import(symbol.clone());
                }
                return Some(replacement);
            }
        }

        changed.then_some(NodeOrToken::Node(rebuilt))
    }
}
