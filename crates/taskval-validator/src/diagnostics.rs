use crate::TaskGraph;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const RULE_SCHEMA: &str = "SCHEMA";
pub const RULE_UNIQUE_IDS: &str = "V2";
pub const RULE_DEPENDENCY_REFS: &str = "V4";
pub const RULE_ACYCLIC: &str = "V5";
pub const RULE_GOAL_QUALITY: &str = "V6";
pub const RULE_ACCEPTANCE_QUALITY: &str = "V7";
pub const RULE_CONTEXTUAL_FIELDS: &str = "V9";
pub const RULE_FILES_SCOPE: &str = "V10";
pub const RULE_MILESTONE: &str = "MILESTONE";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validation finding, located by a path into the input document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub rule: String,
    pub severity: Severity,
    pub path: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Diagnostic {
    pub fn new(
        rule: impl Into<String>,
        severity: Severity,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.into(),
            severity,
            path: path.into(),
            message: message.into(),
            suggestion: None,
            context: None,
        }
    }

    pub fn error(rule: impl Into<String>, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule, Severity::Error, path, message)
    }

    pub fn warning(
        rule: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(rule, Severity::Warning, path, message)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} at '{}': {}",
            self.severity, self.rule, self.path, self.message
        )?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " -> Fix: {suggestion}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total_tasks: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
}

/// Findings of a validation run.
///
/// The parsed graph is only attached when both tiers pass, and it is never
/// part of the serialized form.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Diagnostic>,
    pub stats: ValidationStats,
    #[serde(skip)]
    pub(crate) graph: Option<TaskGraph>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            stats: ValidationStats::default(),
            graph: None,
        }
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => {
                self.stats.error_count += 1;
                self.valid = false;
            }
            Severity::Warning => self.stats.warning_count += 1,
            Severity::Info => self.stats.info_count += 1,
        }
        self.errors.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.add(diagnostic);
        }
    }

    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.errors.iter().filter(move |d| d.severity == severity)
    }

    pub fn graph(&self) -> Option<&TaskGraph> {
        self.graph.as_ref()
    }

    pub fn into_graph(self) -> Option<TaskGraph> {
        self.graph
    }
}
