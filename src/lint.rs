//! Analysis dispatch: feeds each unit to the engine and accumulates results.
//!
//! Every problem the engine returns is appended to the report. The
//! [`SuggestionCounter`] only counts problems at or above the confidence
//! threshold; it never filters what gets rendered.

use crate::config::Config;
use crate::engine::{Engine, EngineError};
use crate::models::{CompilationUnit, Problem, ProblemReport, SourceFileSet};
use crate::utils::Diagnostics;
use rayon::prelude::*;
use tracing::debug;

/// Default minimum confidence for a problem to count as a suggestion.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuggestionCounter {
    min_confidence: f64,
    count: usize,
}

impl SuggestionCounter {
    pub fn new(min_confidence: f64) -> Self {
        Self {
            min_confidence,
            count: 0,
        }
    }

    pub fn observe(&mut self, problem: &Problem) {
        if problem.confidence >= self.min_confidence {
            self.count += 1;
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl Default for SuggestionCounter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONFIDENCE)
    }
}

/// Engine invocation strategy for the units of one run.
pub struct Dispatcher<'a> {
    engine: &'a dyn Engine,
    config: &'a Config,
    parallel: bool,
}

/// What analyzing one unit produced. Sources are dropped before this is
/// returned.
struct UnitOutcome<'u> {
    unit: &'u CompilationUnit,
    load_errors: Vec<String>,
    /// `None` when no member file could be read.
    result: Option<Result<Vec<Problem>, EngineError>>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(engine: &'a dyn Engine, config: &'a Config) -> Self {
        Self {
            engine,
            config,
            parallel: false,
        }
    }

    /// Run engine invocations on the rayon pool. Results and diagnostics are
    /// still folded in unit order.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Analyze `units` in order, appending findings to `report` and counting
    /// suggestions. Unreadable files and engine errors are reported and the
    /// affected file or unit is skipped.
    pub fn run(
        &self,
        units: &[CompilationUnit],
        report: &mut ProblemReport,
        counter: &mut SuggestionCounter,
        diag: &mut Diagnostics<'_>,
    ) {
        if self.parallel {
            let outcomes: Vec<UnitOutcome<'_>> =
                units.par_iter().map(|u| self.analyze(u)).collect();
            for outcome in outcomes {
                fold(outcome, report, counter, diag);
            }
        } else {
            for unit in units {
                fold(self.analyze(unit), report, counter, diag);
            }
        }
    }

    /// Load one unit's sources and hand them to the engine.
    fn analyze<'u>(&self, unit: &'u CompilationUnit) -> UnitOutcome<'u> {
        let mut load_errors = Vec::new();
        let set = SourceFileSet::load(unit, |path, e| {
            load_errors.push(format!("open {}: {}", path.display(), e))
        });
        let result = if set.is_empty() {
            None
        } else {
            debug!("Dispatching unit '{}' ({} files)", unit.name, set.len());
            Some(self.engine.lint(&set, self.config))
        };
        UnitOutcome {
            unit,
            load_errors,
            result,
        }
    }
}

fn fold(
    outcome: UnitOutcome<'_>,
    report: &mut ProblemReport,
    counter: &mut SuggestionCounter,
    diag: &mut Diagnostics<'_>,
) {
    for msg in outcome.load_errors {
        diag.error(msg);
    }
    match outcome.result {
        None => debug!("Skipping unit '{}': no readable files", outcome.unit.name),
        Some(Ok(problems)) => {
            debug!(
                "Unit '{}' produced {} problems",
                outcome.unit.name,
                problems.len()
            );
            for p in &problems {
                counter.observe(p);
            }
            report.extend(problems);
        }
        Some(Err(e)) => diag.error(e),
    }
}
