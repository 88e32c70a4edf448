//! Target classification and compilation-unit resolution.
//!
//! Each positional argument is classified, in priority order, as a
//! recursive directory (`dir/...`), a directory, a regular file, or else a
//! package import path. A run may use only one family of targets
//! (directories, files, or packages); mixing them is a usage error raised
//! before anything is resolved.

use crate::config::PathFilter;
use crate::discovery::{Discovery, DiscoveryError};
use crate::models::CompilationUnit;
use crate::utils::Diagnostics;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Suffix meaning "this directory and every qualifying subdirectory".
pub const RECURSIVE_MARKER: &str = "/...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Directory,
    DirectoryRecursive,
    File,
    Package,
}

impl TargetKind {
    /// Family name; only one family may appear per run.
    pub fn family(self) -> &'static str {
        match self {
            TargetKind::Directory | TargetKind::DirectoryRecursive => "directory",
            TargetKind::File => "file",
            TargetKind::Package => "package",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One raw command-line argument with its classification.
pub struct Target {
    pub arg: String,
    pub kind: TargetKind,
}

impl Target {
    pub fn classify(arg: &str) -> Self {
        let kind = match arg.strip_suffix(RECURSIVE_MARKER) {
            Some(prefix) if Path::new(prefix).is_dir() => TargetKind::DirectoryRecursive,
            _ => {
                let p = Path::new(arg);
                if p.is_dir() {
                    TargetKind::Directory
                } else if p.is_file() {
                    TargetKind::File
                } else {
                    TargetKind::Package
                }
            }
        };
        Target {
            arg: arg.to_string(),
            kind,
        }
    }

    /// Directory path of a directory target (marker stripped).
    pub fn dir(&self) -> &Path {
        match self.kind {
            TargetKind::DirectoryRecursive => {
                Path::new(self.arg.strip_suffix(RECURSIVE_MARKER).unwrap_or(&self.arg))
            }
            _ => Path::new(&self.arg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("cannot mix {first} targets ('{first_arg}') with {second} targets ('{second_arg}')")]
    MixedTargets {
        first: &'static str,
        first_arg: String,
        second: &'static str,
        second_arg: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Validated, single-family set of targets.
pub enum Plan {
    Directories(Vec<Target>),
    Files(Vec<PathBuf>),
    Packages(Vec<String>),
}

impl Plan {
    /// Classify every argument and check that one family is used. An empty
    /// argument list means the current directory.
    pub fn from_args(args: &[String]) -> Result<Plan, UsageError> {
        if args.is_empty() {
            return Ok(Plan::Directories(vec![Target {
                arg: ".".into(),
                kind: TargetKind::Directory,
            }]));
        }
        let targets: Vec<Target> = args.iter().map(|a| Target::classify(a)).collect();
        for t in &targets {
            debug!("Classified '{}' as {:?}", t.arg, t.kind);
        }
        let first = &targets[0];
        if let Some(other) = targets
            .iter()
            .find(|t| t.kind.family() != first.kind.family())
        {
            return Err(UsageError::MixedTargets {
                first: first.kind.family(),
                first_arg: first.arg.clone(),
                second: other.kind.family(),
                second_arg: other.arg.clone(),
            });
        }
        Ok(match first.kind {
            TargetKind::Directory | TargetKind::DirectoryRecursive => Plan::Directories(targets),
            TargetKind::File => Plan::Files(targets.into_iter().map(|t| t.arg.into()).collect()),
            TargetKind::Package => Plan::Packages(targets.into_iter().map(|t| t.arg).collect()),
        })
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name.starts_with('_') || name == "testdata"
}

/// Every directory at or below `root` that holds at least one recognized
/// source file, in sorted walk order. Hidden, `_`-prefixed and `testdata`
/// subdirectories are not entered.
pub fn expand_recursive(
    root: &Path,
    discovery: &dyn Discovery,
    diag: &mut Diagnostics<'_>,
) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e));
    for entry in walker {
        match entry {
            Ok(e) if e.file_type().is_dir() => {
                if discovery.has_sources(e.path()) {
                    dirs.push(e.into_path());
                }
            }
            Ok(_) => {}
            Err(e) => diag.error(e),
        }
    }
    debug!("Expanded '{}' to {} directories", root.display(), dirs.len());
    dirs
}

/// Turns a [`Plan`] into compilation units. Per-target failures are
/// reported and skipped; they never abort the run.
pub struct Resolver<'a> {
    discovery: &'a dyn Discovery,
    filter: Option<(&'a PathFilter, PathBuf)>,
}

impl<'a> Resolver<'a> {
    pub fn new(discovery: &'a dyn Discovery) -> Self {
        Self {
            discovery,
            filter: None,
        }
    }

    /// Apply include/exclude patterns, relative to `cwd`, to units found
    /// through discovery. Explicit file targets are never filtered.
    pub fn with_filter(mut self, filter: &'a PathFilter, cwd: PathBuf) -> Self {
        self.filter = Some((filter, cwd));
        self
    }

    pub fn resolve(&self, plan: &Plan, diag: &mut Diagnostics<'_>) -> Vec<CompilationUnit> {
        let mut units = Vec::new();
        match plan {
            Plan::Directories(targets) => {
                for t in targets {
                    let dirs = match t.kind {
                        TargetKind::DirectoryRecursive => {
                            expand_recursive(t.dir(), self.discovery, diag)
                        }
                        _ => vec![t.dir().to_path_buf()],
                    };
                    for d in dirs {
                        let found = self.discovery.import_dir(&d);
                        self.accept(found, &mut units, diag);
                    }
                }
            }
            Plan::Files(files) => units.push(CompilationUnit::from_files(files.clone())),
            Plan::Packages(names) => {
                for n in names {
                    let found = self.discovery.import_package(n);
                    self.accept(found, &mut units, diag);
                }
            }
        }
        units
    }

    fn accept(
        &self,
        found: Result<CompilationUnit, DiscoveryError>,
        units: &mut Vec<CompilationUnit>,
        diag: &mut Diagnostics<'_>,
    ) {
        let mut unit = match found {
            Ok(u) => u,
            Err(DiscoveryError::NoSources(dir)) => {
                debug!("Skipping '{}': no source files", dir.display());
                return;
            }
            Err(e) => {
                diag.error(e);
                return;
            }
        };
        if let Some((filter, cwd)) = &self.filter {
            unit.retain_files(|p| filter.allows(p, cwd));
            if unit.file_count() == 0 {
                debug!("Skipping '{}': every file excluded", unit.dir.display());
                return;
            }
        }
        debug!("Resolved unit '{}' ({} files)", unit.name, unit.file_count());
        units.push(unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::discovery::FsDiscovery;
    use std::fs;
    use tempfile::tempdir;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_classify_priority() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("f.go"), "package f\n").unwrap();
        let d = root.to_string_lossy().to_string();

        assert_eq!(
            Target::classify(&format!("{}/...", d)).kind,
            TargetKind::DirectoryRecursive
        );
        assert_eq!(Target::classify(&d).kind, TargetKind::Directory);
        assert_eq!(
            Target::classify(&format!("{}/f.go", d)).kind,
            TargetKind::File
        );
        assert_eq!(
            Target::classify("example.com/not/here").kind,
            TargetKind::Package
        );
        // Marker on a non-directory falls through to package.
        assert_eq!(
            Target::classify(&format!("{}/missing/...", d)).kind,
            TargetKind::Package
        );
    }

    #[test]
    fn test_empty_args_mean_current_dir() {
        let plan = Plan::from_args(&[]).unwrap();
        match plan {
            Plan::Directories(t) => {
                assert_eq!(t.len(), 1);
                assert_eq!(t[0].dir(), Path::new("."));
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_mixed_families_rejected() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("b.go"), "package b\n").unwrap();
        let a = root.to_string_lossy().to_string();
        let b = root.join("b.go").to_string_lossy().to_string();

        let err = Plan::from_args(&args(&[&a, &b])).unwrap_err();
        let UsageError::MixedTargets { first, second, .. } = err;
        assert_eq!((first, second), ("directory", "file"));

        assert!(Plan::from_args(&args(&[&b, "some/pkg"])).is_err());
        assert!(Plan::from_args(&args(&[&format!("{}/...", a), &a])).is_ok());
    }

    #[test]
    fn test_recursive_expansion_yields_qualifying_dirs_once() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        for sub in ["", "a", "b", "c", ".git", "_tmp", "testdata"] {
            fs::create_dir_all(root.join(sub)).unwrap();
        }
        for sub in ["", "a", "b", ".git", "_tmp", "testdata"] {
            fs::write(root.join(sub).join("x.go"), "package x\n").unwrap();
        }
        fs::write(root.join("c/readme.md"), "no go here").unwrap();

        let mut sink = Vec::new();
        let mut diag = Diagnostics::new(&mut sink, false);
        let dirs = expand_recursive(&root, &FsDiscovery::new(vec![]), &mut diag);
        assert_eq!(dirs, vec![root.clone(), root.join("a"), root.join("b")]);
    }

    #[test]
    fn test_resolve_skips_empty_and_reports_failures() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::write(root.join("pkg/p.go"), "package p\n").unwrap();

        let disc = FsDiscovery::new(vec![root.to_path_buf()]);
        let mut sink = Vec::new();
        let units = {
            let mut diag = Diagnostics::new(&mut sink, false);
            let plan = Plan::Packages(vec!["empty".into(), "nowhere".into(), "pkg".into()]);
            let units = Resolver::new(&disc).resolve(&plan, &mut diag);
            assert_eq!(diag.reported(), 1);
            units
        };
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "pkg");
        let text = String::from_utf8(sink).unwrap();
        assert!(text.starts_with("error: cannot find package \"nowhere\""));
    }

    #[test]
    fn test_filter_applies_to_directories_not_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("vendor/dep")).unwrap();
        fs::write(root.join("vendor/dep/d.go"), "package dep\n").unwrap();

        let cfg = Config {
            excludes: vec!["./vendor/**".into()],
            ..Config::builtin()
        };
        let filter = cfg.path_filter().unwrap();
        let disc = FsDiscovery::new(vec![]);
        let resolver = Resolver::new(&disc).with_filter(&filter, root.to_path_buf());
        let mut sink = Vec::new();
        let mut diag = Diagnostics::new(&mut sink, false);

        let dirs = Plan::Directories(vec![Target {
            arg: root.join("vendor/dep").to_string_lossy().to_string(),
            kind: TargetKind::Directory,
        }]);
        assert!(resolver.resolve(&dirs, &mut diag).is_empty());

        let files = Plan::Files(vec![root.join("vendor/dep/d.go")]);
        let units = resolver.resolve(&files, &mut diag);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].file_count(), 1);
        assert_eq!(diag.reported(), 0);
    }

    #[test]
    fn test_builtin_filter_keeps_pkg_directories() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("pkg/store")).unwrap();
        fs::write(root.join("pkg/store/s.go"), "package store\n").unwrap();

        let filter = Config::builtin().path_filter().unwrap();
        let disc = FsDiscovery::new(vec![]);
        let resolver = Resolver::new(&disc).with_filter(&filter, root.to_path_buf());
        let mut sink = Vec::new();
        let mut diag = Diagnostics::new(&mut sink, false);
        let plan = Plan::Directories(vec![Target {
            arg: root.join("pkg/store").to_string_lossy().to_string(),
            kind: TargetKind::Directory,
        }]);
        let units = resolver.resolve(&plan, &mut diag);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "store");
        assert_eq!(units[0].file_count(), 1);
    }
}
