//! Rendering of the collected problems.
//!
//! Supports `text` (default) and `json`. The format is chosen once per run
//! and the whole report is rendered once, after every unit was analyzed.

use crate::models::Problem;
use serde::Serialize;
use serde_json::Value as JsonVal;
use std::io::{self, Write};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `<filename>:<line>:<column>: <text>` per problem.
    #[default]
    Text,
    /// One JSON array of problem objects.
    Json,
}

impl OutputFormat {
    /// Select a format by name. Unknown names fall back to text.
    pub fn from_name(name: &str) -> Self {
        match name {
            "json" => OutputFormat::Json,
            "text" => OutputFormat::Text,
            other => {
                warn!("Unknown format '{}'; using text", other);
                OutputFormat::Text
            }
        }
    }

    pub fn render(self, problems: &[Problem], out: &mut dyn Write) -> io::Result<()> {
        match self {
            OutputFormat::Text => render_text(problems, out),
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, &json_rows(problems))?;
                writeln!(out)
            }
        }
    }
}

#[derive(Serialize)]
/// Wire shape of one problem in JSON output. Exactly these eight fields.
struct JsonProblem<'a> {
    filename: &'a str,
    line: usize,
    column: usize,
    text: &'a str,
    link: &'a str,
    confidence: f64,
    linetext: &'a str,
    category: &'a str,
}

fn json_rows(problems: &[Problem]) -> Vec<JsonProblem<'_>> {
    problems
        .iter()
        .map(|p| JsonProblem {
            filename: &p.position.filename,
            line: p.position.line,
            column: p.position.column,
            text: &p.text,
            link: &p.link,
            confidence: p.confidence,
            linetext: &p.line_text,
            category: &p.category,
        })
        .collect()
}

fn render_text(problems: &[Problem], out: &mut dyn Write) -> io::Result<()> {
    for p in problems {
        writeln!(out, "{}: {}", p.position, p.text)?;
    }
    Ok(())
}

/// Compose the JSON array (pure) for testing purposes.
pub fn compose_json(problems: &[Problem]) -> JsonVal {
    serde_json::to_value(json_rows(problems)).unwrap_or(JsonVal::Null)
}
