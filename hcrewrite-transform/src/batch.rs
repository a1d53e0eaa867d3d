//! Batch Rewriting
//!
//! Runs one recipe over many in-memory units on the rayon pool. Each worker
//! parses, resolves and rewrites its own unit; the recipe is only read.

use crate::driver::{RewriteStats, SkipReason};
use crate::recipe::Recipe;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use similar::TextDiff;
use tracing::{debug, info, warn};

/// One source text to rewrite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub id: String,
    pub source: String,
}

impl SourceUnit {
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
        }
    }
}

/// What happened to a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum UnitStatus {
    Changed { diff: String },
    Unchanged,
    Skipped { reason: SkipReason },
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitReport {
    pub id: String,
    pub status: UnitStatus,
    /// Output text, identical to the input unless changed
    pub output: String,
    pub stats: RewriteStats,
}

/// Per-unit reports in input order plus totals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub units: Vec<UnitReport>,
    pub stats: RewriteStats,
}

impl BatchReport {
    pub fn changed(&self) -> impl Iterator<Item = &UnitReport> {
        self.units
            .iter()
            .filter(|unit| matches!(unit.status, UnitStatus::Changed { .. }))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &UnitReport> {
        self.units
            .iter()
            .filter(|unit| matches!(unit.status, UnitStatus::Skipped { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &UnitReport> {
        self.units
            .iter()
            .filter(|unit| matches!(unit.status, UnitStatus::Failed { .. }))
    }
}

pub struct BatchRunner<'r> {
    recipe: &'r dyn Recipe,
    context_lines: usize,
}

impl<'r> BatchRunner<'r> {
    pub fn new(recipe: &'r dyn Recipe) -> Self {
        Self {
            recipe,
            context_lines: 3,
        }
    }

    /// Lines of context around each diff hunk
    #[must_use]
    pub fn context_lines(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    pub fn run(&self, units: &[SourceUnit]) -> BatchReport {
        info!(recipe = self.recipe.name(), units = units.len(), "starting batch");

        let reports: Vec<UnitReport> = units.par_iter().map(|unit| self.run_unit(unit)).collect();

        let mut stats = RewriteStats::default();
        for report in &reports {
            stats += report.stats;
        }
        let report = BatchReport {
            units: reports,
            stats,
        };

        info!(
            recipe = self.recipe.name(),
            changed = report.changed().count(),
            skipped = report.skipped().count(),
            failed = report.failed().count(),
            calls_rewritten = stats.calls_rewritten,
            "batch finished"
        );
        report
    }

    fn run_unit(&self, unit: &SourceUnit) -> UnitReport {
        let outcome = match self.recipe.rewrite_source(&unit.source) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(unit = %unit.id, error = %err, "unit could not be processed");
                return UnitReport {
                    id: unit.id.clone(),
                    status: UnitStatus::Failed {
                        message: err.to_string(),
                    },
                    output: unit.source.clone(),
                    stats: RewriteStats::default(),
                };
            }
        };

        let status = match outcome.skipped {
            Some(SkipReason::PreconditionAbsent) => {
                debug!(unit = %unit.id, "target types not referenced");
                UnitStatus::Skipped {
                    reason: SkipReason::PreconditionAbsent,
                }
            }
            Some(reason) => {
                warn!(unit = %unit.id, ?reason, "unit left unchanged");
                UnitStatus::Skipped { reason }
            }
            None if outcome.changed => UnitStatus::Changed {
                diff: self.diff(&unit.id, &unit.source, &outcome.unit.text()),
            },
            None => UnitStatus::Unchanged,
        };

        UnitReport {
            id: unit.id.clone(),
            status,
            output: outcome.unit.text(),
            stats: outcome.stats,
        }
    }

    fn diff(&self, id: &str, before: &str, after: &str) -> String {
        TextDiff::from_lines(before, after)
            .unified_diff()
            .context_radius(self.context_lines)
            .header(&format!("a/{id}"), &format!("b/{id}"))
            .to_string()
    }
}
