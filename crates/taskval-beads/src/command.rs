use crate::TrackerError;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

/// A reference to an issue that does not exist until its create command runs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Epic,
    Task(String),
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Epic => f.write_str("<epic-id>"),
            Self::Task(task_id) => write!(f, "<{task_id}-id>"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandArg {
    Literal(String),
    Issue(Placeholder),
}

impl CommandArg {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn epic() -> Self {
        Self::Issue(Placeholder::Epic)
    }

    pub fn task(task_id: impl Into<String>) -> Self {
        Self::Issue(Placeholder::Task(task_id.into()))
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(value) => Some(value),
            Self::Issue(_) => None,
        }
    }
}

impl fmt::Display for CommandArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.write_str(value),
            Self::Issue(placeholder) => fmt::Display::fmt(placeholder, f),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandKind {
    CreateEpic,
    CreateTask { task_id: String },
    AddDependency { task_id: String, depends_on: String },
    UpdateMetadata { task_id: String },
}

impl CommandKind {
    /// The placeholder a successful run of this command binds.
    pub fn produces(&self) -> Option<Placeholder> {
        match self {
            Self::CreateEpic => Some(Placeholder::Epic),
            Self::CreateTask { task_id } => Some(Placeholder::Task(task_id.clone())),
            Self::AddDependency { .. } | Self::UpdateMetadata { .. } => None,
        }
    }
}

/// One tracker invocation with arguments that may still name pending issues.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackerCommand {
    pub kind: CommandKind,
    pub args: Vec<CommandArg>,
}

impl TrackerCommand {
    pub fn new(kind: CommandKind, args: Vec<CommandArg>) -> Self {
        Self { kind, args }
    }

    /// Value following `--title`, if any.
    pub fn title(&self) -> Option<&str> {
        self.args
            .windows(2)
            .find(|pair| pair[0].as_literal() == Some("--title"))
            .and_then(|pair| pair[1].as_literal())
    }

    /// Arguments with placeholders left symbolic, for previews.
    pub fn preview_args(&self) -> Vec<String> {
        self.args.iter().map(ToString::to_string).collect()
    }

    /// Arguments with every placeholder replaced by its recorded issue id.
    pub fn resolve(&self, issues: &IssueTable) -> Result<Vec<String>, TrackerError> {
        self.args
            .iter()
            .map(|arg| match arg {
                CommandArg::Literal(value) => Ok(value.clone()),
                CommandArg::Issue(placeholder) => issues.resolve(placeholder).map(str::to_string),
            })
            .collect()
    }
}

/// Write-once map from placeholders to the issue ids the tracker returned.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IssueTable {
    ids: HashMap<Placeholder, String>,
}

impl IssueTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, placeholder: Placeholder, issue_id: impl Into<String>) -> Result<(), TrackerError> {
        match self.ids.entry(placeholder) {
            Entry::Vacant(slot) => {
                slot.insert(issue_id.into());
                Ok(())
            }
            Entry::Occupied(existing) => Err(TrackerError::PlaceholderRebound {
                placeholder: existing.key().to_string(),
                existing: existing.get().clone(),
            }),
        }
    }

    pub fn resolve(&self, placeholder: &Placeholder) -> Result<&str, TrackerError> {
        self.ids
            .get(placeholder)
            .map(String::as_str)
            .ok_or_else(|| TrackerError::UnresolvedPlaceholder {
                placeholder: placeholder.to_string(),
            })
    }

    pub fn get(&self, placeholder: &Placeholder) -> Option<&str> {
        self.ids.get(placeholder).map(String::as_str)
    }
}

/// Renders a command line for display. Values containing whitespace or quotes
/// are quoted; flags are left bare.
pub fn format_command_line(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for (position, arg) in args.iter().enumerate() {
        line.push(' ');
        let needs_quotes = arg.contains([' ', '\t', '\n', '"', '\''])
            || (position > 0 && arg.contains("--"));
        if needs_quotes && !arg.starts_with("--") {
            line.push_str(&format!("{arg:?}"));
        } else {
            line.push_str(arg);
        }
    }
    line
}
