//! Configuration discovery and loading.
//!
//! Pikeman reads `.pikeman.yml|yaml|toml` from the working directory or the
//! closest ancestor. The search walks parent directories iteratively and
//! stops at the filesystem root, where the [`OnMissing`] policy decides
//! between the built-in defaults and a hard failure.
//!
//! Document shape (YAML shown, TOML uses the same keys):
//! ```yaml
//! Includes: ["./**/*.go"]
//! Excludes: ["./vendor/**"]
//! Exported:
//!   Enabled: true
//! ```
//! A rule missing from the document is disabled.

use crate::rules::{Rule, RuleToggle};
use glob::{MatchOptions, Pattern};
use serde::Deserialize;
use std::env;
use std::fs;
use std::io;
use std::path::{Ancestors, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Recognized configuration file names, in lookup order within a directory.
pub const CONFIG_FILE_NAMES: [&str; 3] = [".pikeman.yml", ".pikeman.yaml", ".pikeman.toml"];

/// Built-in configuration, published as a document for `pikeman` users to
/// copy. Decodes to [`Config::builtin`].
pub const DEFAULT_CONFIG: &str = r#"
Includes:
  - ./**/*.go

Excludes: []

PackageComment:
  Enabled: true
Imports:
  Enabled: true
BlankImports:
  Enabled: true
Exported:
  Enabled: true
Names:
  Enabled: true
VarDecls:
  Enabled: true
Elses:
  Enabled: true
IfError:
  Enabled: true
Ranges:
  Enabled: true
Errorf:
  Enabled: true
Errors:
  Enabled: true
ErrorStrings:
  Enabled: true
ReceiverNames:
  Enabled: true
IncDec:
  Enabled: true
ErrorReturn:
  Enabled: true
UnexportedReturn:
  Enabled: true
TimeNames:
  Enabled: true
ContextKeyTypes:
  Enabled: true
ContextArgs:
  Enabled: true
"#;

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
/// Resolved configuration. Built once per run and read-only afterwards.
pub struct Config {
    pub includes: Vec<String>,
    pub excludes: Vec<String>,

    pub package_comment: RuleToggle,
    pub imports: RuleToggle,
    pub blank_imports: RuleToggle,
    pub exported: RuleToggle,
    pub names: RuleToggle,
    pub var_decls: RuleToggle,
    pub elses: RuleToggle,
    pub if_error: RuleToggle,
    pub ranges: RuleToggle,
    pub errorf: RuleToggle,
    pub errors: RuleToggle,
    pub error_strings: RuleToggle,
    pub receiver_names: RuleToggle,
    pub inc_dec: RuleToggle,
    pub error_return: RuleToggle,
    pub unexported_return: RuleToggle,
    pub time_names: RuleToggle,
    pub context_key_types: RuleToggle,
    pub context_args: RuleToggle,
}

impl Config {
    /// Every rule enabled, all Go sources included, nothing excluded.
    pub fn builtin() -> Self {
        let mut cfg = Config {
            includes: vec!["./**/*.go".into()],
            excludes: Vec::new(),
            ..Config::default()
        };
        for rule in Rule::ALL {
            *cfg.toggle_mut(rule) = RuleToggle::ON;
        }
        cfg
    }

    pub fn toggle(&self, rule: Rule) -> &RuleToggle {
        match rule {
            Rule::PackageComment => &self.package_comment,
            Rule::Imports => &self.imports,
            Rule::BlankImports => &self.blank_imports,
            Rule::Exported => &self.exported,
            Rule::Names => &self.names,
            Rule::VarDecls => &self.var_decls,
            Rule::Elses => &self.elses,
            Rule::IfError => &self.if_error,
            Rule::Ranges => &self.ranges,
            Rule::Errorf => &self.errorf,
            Rule::Errors => &self.errors,
            Rule::ErrorStrings => &self.error_strings,
            Rule::ReceiverNames => &self.receiver_names,
            Rule::IncDec => &self.inc_dec,
            Rule::ErrorReturn => &self.error_return,
            Rule::UnexportedReturn => &self.unexported_return,
            Rule::TimeNames => &self.time_names,
            Rule::ContextKeyTypes => &self.context_key_types,
            Rule::ContextArgs => &self.context_args,
        }
    }

    pub fn toggle_mut(&mut self, rule: Rule) -> &mut RuleToggle {
        match rule {
            Rule::PackageComment => &mut self.package_comment,
            Rule::Imports => &mut self.imports,
            Rule::BlankImports => &mut self.blank_imports,
            Rule::Exported => &mut self.exported,
            Rule::Names => &mut self.names,
            Rule::VarDecls => &mut self.var_decls,
            Rule::Elses => &mut self.elses,
            Rule::IfError => &mut self.if_error,
            Rule::Ranges => &mut self.ranges,
            Rule::Errorf => &mut self.errorf,
            Rule::Errors => &mut self.errors,
            Rule::ErrorStrings => &mut self.error_strings,
            Rule::ReceiverNames => &mut self.receiver_names,
            Rule::IncDec => &mut self.inc_dec,
            Rule::ErrorReturn => &mut self.error_return,
            Rule::UnexportedReturn => &mut self.unexported_return,
            Rule::TimeNames => &mut self.time_names,
            Rule::ContextKeyTypes => &mut self.context_key_types,
            Rule::ContextArgs => &mut self.context_args,
        }
    }

    /// Capability gate consulted by the engine before running `rule`.
    pub fn is_enabled(&self, rule: Rule) -> bool {
        self.toggle(rule).enabled
    }

    pub fn enabled_rules(&self) -> Vec<Rule> {
        Rule::ALL
            .into_iter()
            .filter(|r| self.is_enabled(*r))
            .collect()
    }

    /// Compile `Includes`/`Excludes` into a matcher.
    pub fn path_filter(&self) -> Result<PathFilter, glob::PatternError> {
        let compile = |pats: &[String]| -> Result<Vec<Pattern>, glob::PatternError> {
            pats.iter().map(|p| Pattern::new(p)).collect()
        };
        Ok(PathFilter {
            includes: compile(&self.includes)?,
            excludes: compile(&self.excludes)?,
        })
    }
}

#[derive(Debug, Clone)]
/// Include/exclude glob matcher over `./`-prefixed paths relative to the
/// working directory.
pub struct PathFilter {
    includes: Vec<Pattern>,
    excludes: Vec<Pattern>,
}

impl PathFilter {
    /// True when `path` is included (or no includes are configured) and not
    /// excluded. Paths outside `cwd` are not governed by the patterns.
    pub fn allows(&self, path: &Path, cwd: &Path) -> bool {
        let Some(rel) = relative_to(path, cwd) else {
            return true;
        };
        let opts = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };
        let included =
            self.includes.is_empty() || self.includes.iter().any(|p| p.matches_with(&rel, opts));
        included && !self.excludes.iter().any(|p| p.matches_with(&rel, opts))
    }
}

fn relative_to(path: &Path, cwd: &Path) -> Option<String> {
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    let rel = pathdiff::diff_paths(&abs, cwd)?;
    if rel.starts_with("..") {
        return None;
    }
    Some(format!("./{}", rel.to_string_lossy().replace('\\', "/")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
/// What to do when no configuration file exists up to the filesystem root.
pub enum OnMissing {
    /// Use [`Config::builtin`].
    #[default]
    Default,
    /// Fail with [`ConfigError::NotFound`].
    Fail,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("no {} found in {} or any parent directory", CONFIG_FILE_NAMES[0], .start.display())]
    NotFound { start: PathBuf },
    #[error("determine working directory: {0}")]
    WorkingDir(#[source] io::Error),
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

#[derive(Debug, Clone)]
/// A configuration with its include/exclude matcher compiled.
pub struct Resolved {
    pub config: Config,
    pub filter: PathFilter,
}

impl Resolved {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let filter = config.path_filter()?;
        Ok(Self { config, filter })
    }
}

/// Resolve the run's configuration: an explicit path wins, otherwise search
/// upward from the working directory.
pub fn resolve(explicit: Option<&Path>, on_missing: OnMissing) -> Result<Resolved, ConfigError> {
    match explicit {
        Some(path) => read_document(path),
        None => {
            let cwd = env::current_dir().map_err(ConfigError::WorkingDir)?;
            resolve_from_dir(&cwd, on_missing)
        }
    }
}

/// Load and parse the document at `path`. `.toml` files are read as TOML,
/// everything else as YAML.
pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
    read_document(path).map(|r| r.config)
}

fn read_document(path: &Path) -> Result<Resolved, ConfigError> {
    debug!("Loading config from '{}'", path.display());
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };
    if text.trim().is_empty() {
        return Err(parse_err("empty configuration document".into()));
    }
    let is_toml = path.extension().is_some_and(|e| e == "toml");
    let cfg: Config = if is_toml {
        toml::from_str(&text).map_err(|e| parse_err(e.to_string()))?
    } else {
        serde_yaml::from_str(&text).map_err(|e| parse_err(e.to_string()))?
    };
    let filter = cfg
        .path_filter()
        .map_err(|e| parse_err(format!("invalid glob pattern: {}", e)))?;
    Ok(Resolved {
        config: cfg,
        filter,
    })
}

pub fn load_from_working_directory(on_missing: OnMissing) -> Result<Config, ConfigError> {
    let cwd = env::current_dir().map_err(ConfigError::WorkingDir)?;
    load_from_dir(&cwd, on_missing)
}

/// Search upward from `start` (expected absolute) and load the first
/// configuration found.
pub fn load_from_dir(start: &Path, on_missing: OnMissing) -> Result<Config, ConfigError> {
    resolve_from_dir(start, on_missing).map(|r| r.config)
}

fn resolve_from_dir(start: &Path, on_missing: OnMissing) -> Result<Resolved, ConfigError> {
    match find_config(start)? {
        Some(path) => read_document(&path),
        None => match on_missing {
            OnMissing::Default => {
                debug!(
                    "No config found above '{}'; using built-in defaults",
                    start.display()
                );
                Resolved::new(Config::builtin())
            }
            OnMissing::Fail => Err(ConfigError::NotFound {
                start: start.to_path_buf(),
            }),
        },
    }
}

/// Directories inspected by [`find_config`]: `start` and each parent up to
/// the root. Never longer than the depth of `start`.
pub fn search_path(start: &Path) -> Ancestors<'_> {
    start.ancestors()
}

/// Walk upward from `start` looking for a recognized configuration file.
pub fn find_config(start: &Path) -> Result<Option<PathBuf>, ConfigError> {
    for dir in search_path(start) {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            match fs::metadata(&candidate) {
                Ok(meta) if meta.is_file() => return Ok(Some(candidate)),
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(ConfigError::Io {
                        path: candidate,
                        source,
                    })
                }
            }
        }
    }
    Ok(None)
}
