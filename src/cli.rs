//! CLI argument parsing via `clap`.

use crate::config::OnMissing;
use crate::lint::DEFAULT_MIN_CONFIDENCE;
use crate::output::OutputFormat;
use crate::session::RunOptions;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pikeman",
    version,
    about = "Configurable Go style linter",
    long_about = "Pikeman lints Go packages, directories or files with rules toggled by .pikeman.yml.\n\nThe configuration is looked up from the working directory upwards unless --config-path is given.",
    override_usage = "pikeman [OPTIONS]               # runs on package in current directory\n       pikeman [OPTIONS] [packages]\n       pikeman [OPTIONS] [directories]  # where a '/...' suffix includes all sub-directories\n       pikeman [OPTIONS] [files]        # all must belong to a single package",
    after_help = "Examples:\n  pikeman ./...\n  pikeman --format json --min-confidence 0.5 ./cmd/tool\n  pikeman --set-exit-status --config-path ci/.pikeman.yml main.go util.go"
)]
/// Top-level CLI options and positional targets.
pub struct Cli {
    #[arg(
        long,
        alias = "min_confidence",
        default_value_t = DEFAULT_MIN_CONFIDENCE,
        help = "Minimum confidence of a problem to count as a suggestion"
    )]
    pub min_confidence: f64,
    #[arg(
        long,
        alias = "set_exit_status",
        action = clap::ArgAction::SetTrue,
        help = "Exit with status 1 if any suggestions are found"
    )]
    pub set_exit_status: bool,
    #[arg(long, default_value = "text", help = "Output format: text|json (default: text)")]
    pub format: String,
    #[arg(long, alias = "config_path", help = "Configuration file (default: search upwards for .pikeman.yml)")]
    pub config_path: Option<PathBuf>,
    #[arg(
        long,
        value_enum,
        default_value_t = OnMissing::Default,
        help = "When no configuration is found: use built-in defaults or fail"
    )]
    pub on_missing_config: OnMissing,
    #[arg(long = "search-root", help = "Root to resolve package targets against (repeatable; default: $GOPATH/src)")]
    pub search_roots: Vec<PathBuf>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Analyze packages in parallel")]
    pub parallel: bool,
    #[arg(long, short = 'v', action = clap::ArgAction::SetTrue, help = "Enable info-level logging to stderr")]
    pub verbose: bool,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Enable debug-level logging to stderr")]
    pub debug: bool,
    #[arg(value_name = "TARGET", help = "Packages, directories or files to lint")]
    pub targets: Vec<String>,
}

impl Cli {
    pub fn run_options(&self, color: bool) -> RunOptions {
        RunOptions {
            min_confidence: self.min_confidence,
            set_exit_status: self.set_exit_status,
            format: OutputFormat::from_name(&self.format),
            config_path: self.config_path.clone(),
            on_missing: self.on_missing_config,
            parallel: self.parallel,
            targets: self.targets.clone(),
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["pikeman"]).unwrap();
        let opts = cli.run_options(false);
        assert_eq!(opts.min_confidence, 0.8);
        assert!(!opts.set_exit_status);
        assert_eq!(opts.format, OutputFormat::Text);
        assert_eq!(opts.on_missing, OnMissing::Default);
        assert!(opts.config_path.is_none());
        assert!(opts.targets.is_empty());
    }

    #[test]
    fn test_flags_and_aliases() {
        let cli = Cli::try_parse_from([
            "pikeman",
            "--min_confidence",
            "0.3",
            "--set_exit_status",
            "--format",
            "json",
            "--config_path",
            "x.yml",
            "--on-missing-config",
            "fail",
            "a",
            "b",
        ])
        .unwrap();
        let opts = cli.run_options(false);
        assert_eq!(opts.min_confidence, 0.3);
        assert!(opts.set_exit_status);
        assert_eq!(opts.format, OutputFormat::Json);
        assert_eq!(opts.config_path, Some(PathBuf::from("x.yml")));
        assert_eq!(opts.on_missing, OnMissing::Fail);
        assert_eq!(opts.targets, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_unknown_format_falls_back_to_text() {
        let cli = Cli::try_parse_from(["pikeman", "--format", "xml"]).unwrap();
        assert_eq!(cli.run_options(false).format, OutputFormat::Text);
    }
}
