use pikeman::config::{self, Config, OnMissing};
use pikeman::discovery::{Discovery, DiscoveryError, FsDiscovery};
use pikeman::engine::{Engine, EngineError, LineEngine};
use pikeman::models::{CompilationUnit, Position, Problem, SourceFileSet};
use pikeman::output::OutputFormat;
use pikeman::rules::Rule;
use pikeman::session::{RunError, RunOptions, Session, EXIT_FAILURE, EXIT_SUCCESS};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Discovery double that records calls and resolves nothing.
#[derive(Default)]
struct CountingDiscovery {
    calls: AtomicUsize,
}

impl Discovery for CountingDiscovery {
    fn import_dir(&self, dir: &Path) -> Result<CompilationUnit, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DiscoveryError::NoSources(dir.to_path_buf()))
    }

    fn import_package(&self, name: &str) -> Result<CompilationUnit, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DiscoveryError::NoSources(name.into()))
    }

    fn is_source_file(&self, _path: &Path) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        false
    }
}

/// Engine double: one fixed problem per enabled rule it knows about.
struct StubEngine {
    rules: Vec<(Rule, f64)>,
    calls: AtomicUsize,
}

impl StubEngine {
    fn new(rules: Vec<(Rule, f64)>) -> Self {
        Self {
            rules,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Engine for StubEngine {
    fn lint(&self, files: &SourceFileSet, config: &Config) -> Result<Vec<Problem>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (file, _) = files.iter().next().expect("unit has files");
        Ok(self
            .rules
            .iter()
            .filter(|(rule, _)| config.is_enabled(*rule))
            .map(|(rule, confidence)| Problem {
                position: Position {
                    filename: file.to_string(),
                    line: 6,
                    column: 6,
                },
                text: format!("{} finding", rule),
                link: "https://golang.org/wiki/CodeReviewComments#doc-comments".into(),
                confidence: *confidence,
                category: rule.name().to_string(),
                line_text: "type Patate struct{}\n".into(),
            })
            .collect())
    }
}

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("dirA")).unwrap();
    fs::write(dir.path().join("fileB.go"), "package b\n").unwrap();
    dir
}

fn arg(p: &Path) -> String {
    p.to_string_lossy().to_string()
}

fn run_with(
    config: Config,
    options: RunOptions,
    discovery: &dyn Discovery,
    engine: &dyn Engine,
) -> (Result<pikeman::session::Outcome, RunError>, String, String) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let result = Session::with_config(config, options)
        .unwrap()
        .run(discovery, engine, &mut out, &mut err);
    (
        result,
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
    )
}

#[test]
fn mixed_target_kinds_abort_before_resolution() {
    let dir = fixture();
    let discovery = CountingDiscovery::default();
    let engine = StubEngine::new(vec![(Rule::Exported, 1.0)]);
    let options = RunOptions {
        targets: vec![arg(&dir.path().join("dirA")), arg(&dir.path().join("fileB.go"))],
        ..RunOptions::default()
    };

    let (result, out, _) = run_with(Config::builtin(), options, &discovery, &engine);
    let err = result.unwrap_err();
    assert!(matches!(err, RunError::Usage(_)));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(discovery.calls.load(Ordering::SeqCst), 0);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    assert!(out.is_empty());
}

fn single_problem_run(min_confidence: f64) -> (pikeman::session::Outcome, String, String, String) {
    let dir = fixture();
    let file = arg(&dir.path().join("fileB.go"));
    let engine = StubEngine::new(vec![(Rule::Exported, 0.95)]);
    let options = RunOptions {
        min_confidence,
        set_exit_status: true,
        format: OutputFormat::Json,
        targets: vec![file.clone()],
        ..RunOptions::default()
    };
    let (result, out, err) = run_with(Config::builtin(), options, &CountingDiscovery::default(), &engine);
    (result.unwrap(), out, err, file)
}

fn assert_single_problem_json(out: &str, file: &str) {
    let parsed: Value = serde_json::from_str(out).unwrap();
    let arr = parsed.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    let obj = arr[0].as_object().unwrap();
    assert_eq!(obj.len(), 8);
    assert_eq!(obj["filename"], file);
    assert_eq!(obj["line"], 6);
    assert_eq!(obj["column"], 6);
    assert_eq!(obj["text"], "Exported finding");
    assert_eq!(
        obj["link"],
        "https://golang.org/wiki/CodeReviewComments#doc-comments"
    );
    assert_eq!(obj["confidence"], 0.95);
    assert_eq!(obj["linetext"], "type Patate struct{}\n");
    assert_eq!(obj["category"], "Exported");
}

#[test]
fn suggestion_above_threshold_fails_run_and_is_rendered() {
    let (outcome, out, err, file) = single_problem_run(0.8);
    assert_eq!(outcome.suggestions, 1);
    assert_eq!(outcome.exit_code, EXIT_FAILURE);
    assert_single_problem_json(&out, &file);
    assert!(err.contains("Found 1 lint suggestions; failing."));
}

#[test]
fn threshold_does_not_filter_rendering() {
    let (outcome, out, err, file) = single_problem_run(0.99);
    assert_eq!(outcome.suggestions, 0);
    assert_eq!(outcome.exit_code, EXIT_SUCCESS);
    assert_eq!(outcome.report.len(), 1);
    assert_single_problem_json(&out, &file);
    assert!(err.is_empty());
}

#[test]
fn fallback_config_and_empty_directory_succeed() {
    let dir = TempDir::new().unwrap();
    let empty = dir.path().join("empty");
    fs::create_dir_all(&empty).unwrap();
    fs::write(empty.join("notes.txt"), "nothing to lint").unwrap();

    let config = config::load_from_dir(&empty, OnMissing::Default).unwrap();
    assert_eq!(config, Config::builtin());

    let options = RunOptions {
        format: OutputFormat::Json,
        set_exit_status: true,
        targets: vec![arg(&empty)],
        ..RunOptions::default()
    };
    let (result, out, err) = run_with(config, options, &FsDiscovery::new(vec![]), &LineEngine);
    let outcome = result.unwrap();
    assert!(outcome.report.is_empty());
    assert_eq!(outcome.exit_code, EXIT_SUCCESS);
    assert_eq!(out, "[]\n");
    assert!(err.is_empty());
}

#[test]
fn disabled_rule_yields_no_problems_of_its_category() {
    let dir = fixture();
    let all: Vec<(Rule, f64)> = Rule::ALL.iter().map(|r| (*r, 1.0)).collect();
    let mut config = Config::builtin();
    config.toggle_mut(Rule::ErrorStrings).enabled = false;

    let options = RunOptions {
        targets: vec![arg(&dir.path().join("fileB.go"))],
        ..RunOptions::default()
    };
    let engine = StubEngine::new(all);
    let (result, _, _) = run_with(config, options, &CountingDiscovery::default(), &engine);
    let outcome = result.unwrap();
    assert_eq!(outcome.report.len(), 18);
    assert!(outcome
        .report
        .problems()
        .iter()
        .all(|p| p.category != "ErrorStrings"));
}

#[test]
fn recursive_directory_run_with_builtin_engine() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("proj");
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::create_dir_all(root.join("docs")).unwrap();
    fs::write(
        root.join("main.go"),
        "// Package main runs.\npackage main\n\nfunc main() {\n\tn := 0\n\tn += 1\n}\n",
    )
    .unwrap();
    fs::write(
        root.join("sub/sub.go"),
        "// Package sub helps.\npackage sub\n\ntype Helper struct{}\n",
    )
    .unwrap();
    fs::write(root.join("broken.go"), "package other\n").unwrap();

    let options = RunOptions {
        targets: vec![format!("{}/...", arg(&root))],
        ..RunOptions::default()
    };
    let (result, out, err) = run_with(
        Config::builtin(),
        options,
        &FsDiscovery::new(vec![]),
        &LineEngine,
    );
    let outcome = result.unwrap();

    // The root unit mixes packages and is reported; the subdirectory is linted.
    assert!(err.contains("is in package"));
    assert_eq!(outcome.report.len(), 1);
    let sub = arg(&root.join("sub/sub.go"));
    assert_eq!(
        out,
        format!(
            "{}:4:6: exported type Helper should have comment or be unexported\n",
            sub
        )
    );
    assert_eq!(outcome.suggestions, 1);
    assert_eq!(outcome.exit_code, EXIT_SUCCESS);
}
