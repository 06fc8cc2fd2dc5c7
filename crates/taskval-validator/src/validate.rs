use crate::{
    HeuristicTables, SchemaValidator, SemanticValidator, TaskGraph, TaskNode, ValidationResult,
    ValidatorError,
};
use std::fmt;
use std::str::FromStr;

/// Which document shape the input is expected to have.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// One task node object.
    SingleTask,
    /// A versioned envelope with `tasks[]`.
    #[default]
    TaskGraph,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleTask => "task",
            Self::TaskGraph => "graph",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "task" => Ok(Self::SingleTask),
            "graph" => Ok(Self::TaskGraph),
            other => Err(format!("unknown mode '{other}': expected 'task' or 'graph'")),
        }
    }
}

/// Runs Tier 1, parses, runs Tier 2, and attaches the graph when both pass.
#[derive(Debug)]
pub struct Validator {
    schema: SchemaValidator,
    semantic: SemanticValidator,
}

impl Validator {
    pub fn new() -> Result<Self, ValidatorError> {
        Self::with_tables(&HeuristicTables::default())
    }

    pub fn with_tables(tables: &HeuristicTables) -> Result<Self, ValidatorError> {
        Ok(Self {
            schema: SchemaValidator::new()?,
            semantic: SemanticValidator::standard(tables)?,
        })
    }

    pub fn with_semantic(schema: SchemaValidator, semantic: SemanticValidator) -> Self {
        Self { schema, semantic }
    }

    pub fn validate(&self, data: &[u8], mode: Mode) -> Result<ValidationResult, ValidatorError> {
        let mut result = ValidationResult::new();

        result.extend(self.schema.validate(data, mode));
        if !result.valid {
            tracing::debug!(%mode, errors = result.stats.error_count, "schema validation failed");
            return Ok(result);
        }
        tracing::debug!(%mode, "schema validation passed");

        let graph = parse_graph(data, mode)?;
        self.semantic.validate(&graph, &mut result);
        tracing::debug!(
            %mode,
            tasks = result.stats.total_tasks,
            errors = result.stats.error_count,
            warnings = result.stats.warning_count,
            "semantic validation finished"
        );

        if result.valid {
            result.graph = Some(graph);
        }
        Ok(result)
    }
}

fn parse_graph(data: &[u8], mode: Mode) -> Result<TaskGraph, ValidatorError> {
    match mode {
        Mode::SingleTask => serde_json::from_slice::<TaskNode>(data)
            .map(TaskGraph::single)
            .map_err(|source| ValidatorError::Parse {
                what: "task node",
                source,
            }),
        Mode::TaskGraph => {
            serde_json::from_slice(data).map_err(|source| ValidatorError::Parse {
                what: "task graph",
                source,
            })
        }
    }
}

/// Validates with the default heuristics.
pub fn validate(data: &[u8], mode: Mode) -> Result<ValidationResult, ValidatorError> {
    Validator::new()?.validate(data, mode)
}
