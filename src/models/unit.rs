//! Compilation units and the source sets loaded from them.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A named group of source files analyzed together as one package.
pub struct CompilationUnit {
    pub name: String,
    pub dir: PathBuf,
    /// Primary sources.
    pub sources: Vec<PathBuf>,
    /// Implementation-detail sources (e.g. foreign-function glue).
    pub impl_sources: Vec<PathBuf>,
    /// In-package test sources.
    pub test_sources: Vec<PathBuf>,
}

impl CompilationUnit {
    /// Synthetic unit made of files named explicitly on the command line.
    pub fn from_files(files: Vec<PathBuf>) -> Self {
        Self {
            name: "command-line-arguments".into(),
            dir: PathBuf::from("."),
            sources: files,
            impl_sources: Vec::new(),
            test_sources: Vec::new(),
        }
    }

    /// All member files: primary, then implementation-detail, then tests.
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.sources
            .iter()
            .chain(self.impl_sources.iter())
            .chain(self.test_sources.iter())
    }

    pub fn file_count(&self) -> usize {
        self.sources.len() + self.impl_sources.len() + self.test_sources.len()
    }

    /// Drop member files rejected by `keep`, preserving order.
    pub fn retain_files(&mut self, mut keep: impl FnMut(&Path) -> bool) {
        self.sources.retain(|p| keep(p));
        self.impl_sources.retain(|p| keep(p));
        self.test_sources.retain(|p| keep(p));
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
/// Raw contents of one unit's files, keyed by the path as given.
pub struct SourceFileSet {
    files: BTreeMap<String, Vec<u8>>,
}

impl SourceFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every member of `unit`. Files that cannot be read are handed to
    /// `on_error` and left out of the set.
    pub fn load(unit: &CompilationUnit, mut on_error: impl FnMut(&Path, io::Error)) -> Self {
        let mut set = Self::new();
        for path in unit.files() {
            match fs::read(path) {
                Ok(bytes) => set.insert(path.to_string_lossy().to_string(), bytes),
                Err(e) => on_error(path, e),
            }
        }
        set
    }

    pub fn insert(&mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.insert(name.into(), contents.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_skips_unreadable_files() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("a.go");
        fs::write(&good, "package a\n").unwrap();
        let missing = dir.path().join("gone.go");
        let unit = CompilationUnit::from_files(vec![good.clone(), missing.clone()]);

        let mut failed = Vec::new();
        let set = SourceFileSet::load(&unit, |p, _| failed.push(p.to_path_buf()));
        assert_eq!(set.len(), 1);
        assert_eq!(failed, vec![missing]);
        let (name, bytes) = set.iter().next().unwrap();
        assert_eq!(name, good.to_string_lossy());
        assert_eq!(bytes, b"package a\n");
    }

    #[test]
    fn test_files_order_and_retain() {
        let mut unit = CompilationUnit {
            name: "p".into(),
            dir: PathBuf::from("p"),
            sources: vec!["p/a.go".into(), "p/vendor.go".into()],
            impl_sources: vec!["p/c.go".into()],
            test_sources: vec!["p/a_test.go".into()],
        };
        let all: Vec<_> = unit.files().cloned().collect();
        assert_eq!(
            all,
            vec![
                PathBuf::from("p/a.go"),
                PathBuf::from("p/vendor.go"),
                PathBuf::from("p/c.go"),
                PathBuf::from("p/a_test.go"),
            ]
        );
        unit.retain_files(|p| !p.ends_with("vendor.go"));
        assert_eq!(unit.file_count(), 3);
    }
}
