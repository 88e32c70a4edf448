//! Pikeman core library.
//!
//! This crate drives a configurable Go style linter: it discovers a layered
//! configuration, resolves command-line targets into compilation units,
//! runs an analysis engine over each unit and renders the findings.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Configuration discovery, parsing and include/exclude globs.
//! - `rules`: The closed set of rule toggles.
//! - `target`: Target classification and compilation-unit resolution.
//! - `discovery`: Unit discovery trait and the filesystem implementation.
//! - `engine`: Engine trait and the built-in line engine.
//! - `lint`: Dispatch of units to the engine and suggestion counting.
//! - `output`: Text/JSON renderers.
//! - `session`: Per-run driver and exit-code policy.
//! - `models`: Problems, reports, units and source sets.
//! - `utils`: Diagnostic stream helpers.
pub mod cli;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod lint;
pub mod models;
pub mod output;
pub mod rules;
pub mod session;
pub mod target;
pub mod utils;
