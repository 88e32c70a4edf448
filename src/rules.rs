//! Rule enablement model.
//!
//! The set of rule names is closed. A configuration carries one
//! [`RuleToggle`] per rule and the engine asks [`crate::config::Config::is_enabled`]
//! before running each rule category. A toggle missing from a document is
//! disabled; nothing is inherited from the built-in defaults.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Named, independently toggleable check categories.
pub enum Rule {
    PackageComment,
    Imports,
    BlankImports,
    Exported,
    Names,
    VarDecls,
    Elses,
    IfError,
    Ranges,
    Errorf,
    Errors,
    ErrorStrings,
    ReceiverNames,
    IncDec,
    ErrorReturn,
    UnexportedReturn,
    TimeNames,
    ContextKeyTypes,
    ContextArgs,
}

impl Rule {
    /// Every rule, in configuration document order.
    pub const ALL: [Rule; 19] = [
        Rule::PackageComment,
        Rule::Imports,
        Rule::BlankImports,
        Rule::Exported,
        Rule::Names,
        Rule::VarDecls,
        Rule::Elses,
        Rule::IfError,
        Rule::Ranges,
        Rule::Errorf,
        Rule::Errors,
        Rule::ErrorStrings,
        Rule::ReceiverNames,
        Rule::IncDec,
        Rule::ErrorReturn,
        Rule::UnexportedReturn,
        Rule::TimeNames,
        Rule::ContextKeyTypes,
        Rule::ContextArgs,
    ];

    /// Key used for this rule in configuration documents.
    pub fn name(self) -> &'static str {
        match self {
            Rule::PackageComment => "PackageComment",
            Rule::Imports => "Imports",
            Rule::BlankImports => "BlankImports",
            Rule::Exported => "Exported",
            Rule::Names => "Names",
            Rule::VarDecls => "VarDecls",
            Rule::Elses => "Elses",
            Rule::IfError => "IfError",
            Rule::Ranges => "Ranges",
            Rule::Errorf => "Errorf",
            Rule::Errors => "Errors",
            Rule::ErrorStrings => "ErrorStrings",
            Rule::ReceiverNames => "ReceiverNames",
            Rule::IncDec => "IncDec",
            Rule::ErrorReturn => "ErrorReturn",
            Rule::UnexportedReturn => "UnexportedReturn",
            Rule::TimeNames => "TimeNames",
            Rule::ContextKeyTypes => "ContextKeyTypes",
            Rule::ContextArgs => "ContextArgs",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown rule '{0}'")]
pub struct UnknownRule(pub String);

impl FromStr for Rule {
    type Err = UnknownRule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rule::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| UnknownRule(s.to_string()))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
/// `<RuleName>: { Enabled: bool }` entry of a configuration document.
pub struct RuleToggle {
    #[serde(rename = "Enabled", default)]
    pub enabled: bool,
}

impl RuleToggle {
    pub const ON: RuleToggle = RuleToggle { enabled: true };
}
