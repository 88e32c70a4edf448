//! Shared data models: findings produced by the engine and the units of work
//! handed to it.

pub mod unit;

pub use unit::{CompilationUnit, SourceFileSet};

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Location of a finding: file, 1-based line and 1-based byte column.
pub struct Position {
    pub filename: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A single finding reported by the analysis engine. Never mutated after
/// the engine hands it over.
pub struct Problem {
    pub position: Position,
    pub text: String,
    pub link: String,
    /// Certainty in `[0.0, 1.0]` that this is a real issue.
    pub confidence: f64,
    pub category: String,
    /// The offending source line, including its newline terminator.
    pub line_text: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
/// Append-only list of problems in dispatch order.
pub struct ProblemReport {
    problems: Vec<Problem>,
}

impl ProblemReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one unit's findings, preserving engine emission order.
    pub fn extend(&mut self, problems: impl IntoIterator<Item = Problem>) {
        self.problems.extend(problems);
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}
