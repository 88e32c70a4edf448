//! Compilation-unit discovery.
//!
//! [`Discovery`] maps a directory or an import path to the unit's member
//! files. [`FsDiscovery`] is the filesystem implementation for Go-style
//! packages:
//! - sources are `*.go` files whose names do not start with `.` or `_`;
//! - `*_test.go` files are tests, except external test packages
//!   (`package foo_test`), which are left out;
//! - non-test files containing `import "C"` are implementation-detail sources.

use crate::models::CompilationUnit;
use regex::Regex;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The directory holds no recognized source files. Not worth reporting.
    #[error("no buildable Go source files in {}", .0.display())]
    NoSources(PathBuf),
    #[error("cannot find package \"{name}\" in any of:\n{searched}")]
    PackageNotFound { name: String, searched: String },
    #[error("read directory {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Host mechanism that turns directories and import paths into units.
pub trait Discovery: Sync {
    fn import_dir(&self, dir: &Path) -> Result<CompilationUnit, DiscoveryError>;

    fn import_package(&self, name: &str) -> Result<CompilationUnit, DiscoveryError>;

    /// Whether `path` is a file this mechanism would place in a unit.
    fn is_source_file(&self, path: &Path) -> bool;

    /// Whether `dir` directly contains at least one recognized source file.
    fn has_sources(&self, dir: &Path) -> bool {
        match fs::read_dir(dir) {
            Ok(entries) => entries
                .flatten()
                .any(|e| e.file_type().is_ok_and(|t| t.is_file()) && self.is_source_file(&e.path())),
            Err(_) => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FsDiscovery {
    search_roots: Vec<PathBuf>,
}

impl FsDiscovery {
    pub fn new(search_roots: Vec<PathBuf>) -> Self {
        Self { search_roots }
    }

    /// Search roots from `GOPATH` (each entry's `src`), else `$HOME/go/src`.
    pub fn from_env() -> Self {
        let mut roots: Vec<PathBuf> = env::var_os("GOPATH")
            .map(|v| env::split_paths(&v).map(|p| p.join("src")).collect())
            .unwrap_or_default();
        if roots.is_empty() {
            if let Some(home) = env::var_os("HOME") {
                roots.push(PathBuf::from(home).join("go").join("src"));
            }
        }
        Self::new(roots)
    }

    pub fn search_roots(&self) -> &[PathBuf] {
        &self.search_roots
    }

    fn unit_for(&self, dir: &Path, name: String) -> Result<CompilationUnit, DiscoveryError> {
        let entries = fs::read_dir(dir).map_err(|source| DiscoveryError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut names: Vec<String> = entries
            .flatten()
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|n| is_go_source_name(n))
            .collect();
        names.sort();
        if names.is_empty() {
            return Err(DiscoveryError::NoSources(dir.to_path_buf()));
        }

        let qualify = |n: &str| -> PathBuf {
            if dir == Path::new(".") {
                PathBuf::from(n)
            } else {
                dir.join(n)
            }
        };
        let mut unit = CompilationUnit {
            name,
            dir: dir.to_path_buf(),
            sources: Vec::new(),
            impl_sources: Vec::new(),
            test_sources: Vec::new(),
        };
        for n in names {
            let path = qualify(&n);
            // Unreadable files stay in the unit; loading reports them later.
            let text = fs::read_to_string(&path).unwrap_or_default();
            if n.ends_with("_test.go") {
                if package_name(&text).is_some_and(|p| p.ends_with("_test")) {
                    debug!("Skipping external test file '{}'", path.display());
                    continue;
                }
                unit.test_sources.push(path);
            } else if imports_c(&text) {
                unit.impl_sources.push(path);
            } else {
                unit.sources.push(path);
            }
        }
        if unit.file_count() == 0 {
            return Err(DiscoveryError::NoSources(dir.to_path_buf()));
        }
        Ok(unit)
    }
}

impl Discovery for FsDiscovery {
    fn import_dir(&self, dir: &Path) -> Result<CompilationUnit, DiscoveryError> {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| dir.to_string_lossy().to_string());
        self.unit_for(dir, name)
    }

    fn import_package(&self, name: &str) -> Result<CompilationUnit, DiscoveryError> {
        for root in &self.search_roots {
            let dir = root.join(name);
            if dir.is_dir() {
                debug!("Package '{}' resolved to '{}'", name, dir.display());
                return self.unit_for(&dir, name.to_string());
            }
        }
        let searched = self
            .search_roots
            .iter()
            .map(|r| format!("\t{}", r.join(name).display()))
            .collect::<Vec<_>>()
            .join("\n");
        Err(DiscoveryError::PackageNotFound {
            name: name.to_string(),
            searched,
        })
    }

    fn is_source_file(&self, path: &Path) -> bool {
        path.file_name()
            .map(|n| is_go_source_name(&n.to_string_lossy()))
            .unwrap_or(false)
    }
}

fn is_go_source_name(name: &str) -> bool {
    name.ends_with(".go") && !name.starts_with('.') && !name.starts_with('_')
}

fn package_name(src: &str) -> Option<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?m)^\s*package\s+([A-Za-z_][A-Za-z0-9_]*)").expect("static regex"));
    re.captures(src).and_then(|c| c.get(1)).map(|m| m.as_str())
}

fn imports_c(src: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r#"(?m)^\s*import\s+"C"\s*$"#).expect("static regex"));
    re.is_match(src)
}
