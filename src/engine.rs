//! Analysis engine boundary.
//!
//! [`Engine`] takes one unit's sources and the run configuration and
//! returns that unit's findings. Rule categories are gated by
//! [`Config::is_enabled`]; the engine decides what each rule means.
//!
//! [`LineEngine`] is the built-in engine. It works line by line, without a
//! parser, and implements Exported, PackageComment, ErrorStrings, Errorf and
//! IncDec. Other toggles have no effect on it.

use crate::config::Config;
use crate::models::{Position, Problem, SourceFileSet};
use crate::rules::Rule;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

const STYLE_GUIDE_BASE: &str = "https://golang.org/wiki/CodeReviewComments";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("{file}: source is not valid UTF-8")]
    NotUtf8 { file: String },
    #[error("{file}: expected 'package', found none")]
    MissingPackage { file: String },
    #[error("{file} is in package {found}, not {expected}")]
    PackageMismatch {
        file: String,
        found: String,
        expected: String,
    },
}

/// Produces findings for one compilation unit.
pub trait Engine: Sync {
    fn lint(&self, files: &SourceFileSet, config: &Config) -> Result<Vec<Problem>, EngineError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LineEngine;

struct ParsedFile<'a> {
    name: &'a str,
    text: &'a str,
    package: &'a str,
    /// 0-based index of the package clause line.
    package_line: usize,
}

impl ParsedFile<'_> {
    fn is_test(&self) -> bool {
        self.name.ends_with("_test.go")
    }
}

impl Engine for LineEngine {
    fn lint(&self, files: &SourceFileSet, config: &Config) -> Result<Vec<Problem>, EngineError> {
        let mut parsed: Vec<ParsedFile<'_>> = Vec::new();
        for (name, bytes) in files.iter() {
            let text = std::str::from_utf8(bytes).map_err(|_| EngineError::NotUtf8 {
                file: name.to_string(),
            })?;
            let (package, package_line) =
                package_clause(text).ok_or_else(|| EngineError::MissingPackage {
                    file: name.to_string(),
                })?;
            if let Some(first) = parsed.first() {
                if first.package != package {
                    return Err(EngineError::PackageMismatch {
                        file: name.to_string(),
                        found: package.to_string(),
                        expected: first.package.to_string(),
                    });
                }
            }
            parsed.push(ParsedFile {
                name,
                text,
                package,
                package_line,
            });
        }

        let mut problems = Vec::new();
        for file in &parsed {
            lint_file(file, config, &mut problems);
        }
        Ok(problems)
    }
}

/// Package name and 0-based line of the first non-comment, non-blank line,
/// which must be the package clause.
fn package_clause(text: &str) -> Option<(&str, usize)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^package\s+([A-Za-z_][A-Za-z0-9_]*)\s*(?://.*)?$").expect("static regex")
    });
    let mut in_block = false;
    for (idx, line) in text.lines().enumerate() {
        let t = line.trim();
        if in_block {
            if t.contains("*/") {
                in_block = false;
            }
            continue;
        }
        if t.is_empty() || t.starts_with("//") {
            continue;
        }
        if t.starts_with("/*") {
            in_block = !t.contains("*/");
            continue;
        }
        return re
            .captures(t)
            .and_then(|c| c.get(1))
            .map(|m| (m.as_str(), idx));
    }
    None
}

struct Line<'a> {
    file: &'a str,
    number: usize,
    text: &'a str,
}

impl Line<'_> {
    fn problem(
        &self,
        column: usize,
        confidence: f64,
        link: &str,
        category: &str,
        text: String,
    ) -> Problem {
        Problem {
            position: Position {
                filename: self.file.to_string(),
                line: self.number,
                column,
            },
            text,
            link: link.to_string(),
            confidence,
            category: category.to_string(),
            line_text: self.text.to_string(),
        }
    }
}

fn lint_file(file: &ParsedFile<'_>, config: &Config, out: &mut Vec<Problem>) {
    let lines: Vec<&str> = file.text.split_inclusive('\n').collect();
    if config.is_enabled(Rule::PackageComment) && !file.is_test() {
        lint_package_comment(file, &lines, out);
    }
    let mut prev_is_comment = false;
    for (idx, raw) in lines.iter().copied().enumerate() {
        let line = Line {
            file: file.name,
            number: idx + 1,
            text: raw,
        };
        let body = raw.trim_end_matches(['\n', '\r']);
        let trimmed = body.trim_start();
        let is_comment = trimmed.starts_with("//") || trimmed.ends_with("*/");
        if is_comment {
            prev_is_comment = true;
            continue;
        }
        if config.is_enabled(Rule::Exported) && !file.is_test() && !prev_is_comment {
            lint_exported(&line, body, out);
        }
        if config.is_enabled(Rule::ErrorStrings) {
            lint_error_strings(&line, body, out);
        }
        if config.is_enabled(Rule::Errorf) {
            lint_errorf(&line, body, out);
        }
        if config.is_enabled(Rule::IncDec) {
            lint_inc_dec(&line, body, out);
        }
        prev_is_comment = false;
    }
}

fn lint_package_comment(file: &ParsedFile<'_>, lines: &[&str], out: &mut Vec<Problem>) {
    let link = format!("{}#package-comments", STYLE_GUIDE_BASE);
    let mut start = file.package_line;
    while start > 0 && lines[start - 1].trim_start().starts_with("//") {
        start -= 1;
    }
    if start == file.package_line {
        let line = Line {
            file: file.name,
            number: file.package_line + 1,
            text: lines[file.package_line],
        };
        out.push(line.problem(
            1,
            0.2,
            &link,
            "comments",
            "should have a package comment, unless it's in another file for this package".into(),
        ));
        return;
    }
    let first = lines[start].trim_start().trim_start_matches("//").trim_start();
    let prefix = format!("Package {} ", file.package);
    if !first.starts_with(&prefix) {
        let line = Line {
            file: file.name,
            number: start + 1,
            text: lines[start],
        };
        out.push(line.problem(
            1,
            1.0,
            &link,
            "comments",
            format!("package comment should be of the form \"{}...\"", prefix),
        ));
    }
}

fn lint_exported(line: &Line<'_>, body: &str, out: &mut Vec<Problem>) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(
            r"^(?:type\s+(?P<ty>[A-Z]\w*)|func\s+\(\s*(?:\w+\s+)?\*?(?P<recv>\w+)[^)]*\)\s*(?P<meth>[A-Z]\w*)|func\s+(?P<func>[A-Z]\w*))",
        )
        .expect("static regex")
    });
    let Some(caps) = re.captures(body) else {
        return;
    };
    let link = format!("{}#doc-comments", STYLE_GUIDE_BASE);
    let (column, what) = if let Some(ty) = caps.name("ty") {
        (ty.start() + 1, format!("type {}", ty.as_str()))
    } else if let (Some(recv), Some(meth)) = (caps.name("recv"), caps.name("meth")) {
        if !starts_upper(recv.as_str()) {
            return;
        }
        (1, format!("method {}.{}", recv.as_str(), meth.as_str()))
    } else if let Some(func) = caps.name("func") {
        (1, format!("function {}", func.as_str()))
    } else {
        return;
    };
    out.push(line.problem(
        column,
        1.0,
        &link,
        "comments",
        format!("exported {} should have comment or be unexported", what),
    ));
}

fn lint_error_strings(line: &Line<'_>, body: &str, out: &mut Vec<Problem>) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"(?:errors\.New|fmt\.Errorf)\(\s*("(?:[^"\\]|\\.)*")"#).expect("static regex")
    });
    let link = format!("{}#error-strings", STYLE_GUIDE_BASE);
    for caps in re.captures_iter(body) {
        let Some(lit) = caps.get(1) else { continue };
        let s = &lit.as_str()[1..lit.as_str().len() - 1];
        if let Some(confidence) = error_string_confidence(s) {
            out.push(line.problem(
                lit.start() + 1,
                confidence,
                &link,
                "errors",
                "error strings should not be capitalized or end with punctuation or a newline"
                    .into(),
            ));
        }
    }
}

/// Confidence that the literal body `s` breaks the error-string convention,
/// or `None` when it is clean. Capitalization is less certain because
/// proper nouns and exported identifiers are common.
fn error_string_confidence(s: &str) -> Option<f64> {
    const BASIC: f64 = 0.8;
    const CAPITALIZED: f64 = BASIC - 0.2;
    if s.ends_with(['.', ':', '!']) || s.ends_with("\\n") {
        return Some(BASIC);
    }
    let mut chars = s.chars();
    let first = chars.next()?;
    if first.is_uppercase() {
        match chars.next() {
            None => return Some(CAPITALIZED),
            Some(second) if !second.is_uppercase() => return Some(CAPITALIZED),
            _ => {}
        }
    }
    None
}

fn lint_errorf(line: &Line<'_>, body: &str, out: &mut Vec<Problem>) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"errors\.New\(\s*fmt\.Sprintf\(").expect("static regex"));
    for m in re.find_iter(body) {
        out.push(line.problem(
            m.start() + 1,
            1.0,
            "",
            "errors",
            "should replace errors.New(fmt.Sprintf(...)) with fmt.Errorf(...)".into(),
        ));
    }
}

fn lint_inc_dec(line: &Line<'_>, body: &str, out: &mut Vec<Problem>) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^\s*(?P<lhs>[A-Za-z_][\w.]*(?:\[[^\]]*\])?)\s*(?P<op>[+-])=\s*1\s*(?://.*)?$")
            .expect("static regex")
    });
    let Some(caps) = re.captures(body) else {
        return;
    };
    let (Some(lhs), Some(op)) = (caps.name("lhs"), caps.name("op")) else {
        return;
    };
    let column = lhs.start() + 1;
    let (lhs, op) = (lhs.as_str(), op.as_str());
    out.push(line.problem(
        column,
        0.8,
        "",
        "unary-op",
        format!("should replace {} {}= 1 with {}{}{}", lhs, op, lhs, op, op),
    ));
}

fn starts_upper(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_uppercase())
}
