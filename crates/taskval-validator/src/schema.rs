use crate::{Diagnostic, Mode, RULE_SCHEMA, ValidatorError};
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema};
use serde_json::{Map, Value};

const TASK_NODE_SCHEMA: &str = include_str!("../schemas/task_node.schema.json");
const TASK_GRAPH_SCHEMA: &str = include_str!("../schemas/task_graph.schema.json");

const CONTEXTUAL_FIELDS: [&str; 3] = ["depends_on", "constraints", "files_scope"];

const TASK_NODE_SCHEMA_NAME: &str = "task_node";
const TASK_GRAPH_SCHEMA_NAME: &str = "task_graph";

/// Tier 1: structural validation against the embedded JSON Schemas.
pub struct SchemaValidator {
    task_node: JSONSchema,
    task_graph: JSONSchema,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator").finish_non_exhaustive()
    }
}

impl SchemaValidator {
    pub fn new() -> Result<Self, ValidatorError> {
        let node = parse_schema(TASK_NODE_SCHEMA_NAME, TASK_NODE_SCHEMA)?;
        let graph = parse_schema(TASK_GRAPH_SCHEMA_NAME, TASK_GRAPH_SCHEMA)?;
        let graph = compose_graph_schema(graph, &node)?;

        Ok(Self {
            task_node: compile_schema(TASK_NODE_SCHEMA_NAME, &node)?,
            task_graph: compile_schema(TASK_GRAPH_SCHEMA_NAME, &graph)?,
        })
    }

    /// Returns one `SCHEMA` error per violation; empty when the input conforms.
    pub fn validate(&self, data: &[u8], mode: Mode) -> Vec<Diagnostic> {
        let instance: Value = match serde_json::from_slice(data) {
            Ok(value) => value,
            Err(error) => {
                return vec![
                    Diagnostic::error(RULE_SCHEMA, "$", format!("input is not valid JSON: {error}"))
                        .with_suggestion(
                            "Provide a single well-formed JSON object. Check for trailing commas, unquoted keys and unbalanced brackets.",
                        ),
                ];
            }
        };

        let schema = match mode {
            Mode::SingleTask => &self.task_node,
            Mode::TaskGraph => &self.task_graph,
        };

        let mut diagnostics = Vec::new();
        if let Err(errors) = schema.validate(&instance) {
            for error in errors {
                let base = pointer_to_path(&error.instance_path.to_string());
                let message = error.to_string();
                for path in violation_paths(&base, &error.kind) {
                    let mut diagnostic = Diagnostic::error(RULE_SCHEMA, path.clone(), message.clone());
                    if let Some(suggestion) = suggestion_for(&error.kind, &path) {
                        diagnostic = diagnostic.with_suggestion(suggestion);
                    }
                    diagnostics.push(diagnostic);
                }
            }
        }
        diagnostics
    }
}

fn parse_schema(name: &'static str, source: &str) -> Result<Value, ValidatorError> {
    serde_json::from_str(source).map_err(|source| ValidatorError::SchemaSource { name, source })
}

fn compile_schema(name: &'static str, schema: &Value) -> Result<JSONSchema, ValidatorError> {
    JSONSchema::options()
        .with_draft(Draft::Draft202012)
        .compile(schema)
        .map_err(|error| ValidatorError::SchemaCompile {
            name,
            message: error.to_string(),
        })
}

/// Splices the node schema into the graph schema as `$defs/task_node`.
///
/// The node's own `$defs` are hoisted to the graph root so that `#/$defs/...`
/// references inside the node body keep resolving.
pub(crate) fn compose_graph_schema(mut graph: Value, node: &Value) -> Result<Value, ValidatorError> {
    let not_object = |what: &str| ValidatorError::SchemaCompile {
        name: TASK_GRAPH_SCHEMA_NAME,
        message: format!("{what} must be a JSON object"),
    };

    let mut node_body = node
        .as_object()
        .cloned()
        .ok_or_else(|| not_object("task node schema"))?;
    let node_defs = match node_body.remove("$defs") {
        Some(Value::Object(defs)) => defs,
        Some(_) => return Err(not_object("task node $defs")),
        None => Map::new(),
    };
    node_body.remove("$schema");

    let graph_object = graph
        .as_object_mut()
        .ok_or_else(|| not_object("task graph schema"))?;
    let defs = graph_object
        .entry("$defs")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| not_object("task graph $defs"))?;
    for (name, definition) in node_defs {
        defs.entry(name).or_insert(definition);
    }
    defs.insert(TASK_NODE_SCHEMA_NAME.to_string(), Value::Object(node_body));

    Ok(graph)
}

/// Converts a JSON pointer (`/tasks/0/task_id`) into the dotted form used in
/// diagnostics (`tasks[0].task_id`). The root is `$`.
pub(crate) fn pointer_to_path(pointer: &str) -> String {
    let mut path = String::new();
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            path.push('[');
            path.push_str(&segment);
            path.push(']');
        } else {
            path = join_path(&path, &segment);
        }
    }
    if path.is_empty() { "$".to_string() } else { path }
}

fn join_path(base: &str, property: &str) -> String {
    if base.is_empty() || base == "$" {
        property.to_string()
    } else {
        format!("{base}.{property}")
    }
}

/// Missing and unexpected properties are reported at the property itself.
fn violation_paths(base: &str, kind: &ValidationErrorKind) -> Vec<String> {
    match kind {
        ValidationErrorKind::Required { property, .. } => {
            let name = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            vec![join_path(base, &name)]
        }
        ValidationErrorKind::AdditionalProperties { unexpected, .. } if !unexpected.is_empty() => {
            unexpected.iter().map(|name| join_path(base, name)).collect()
        }
        _ => vec![base.to_string()],
    }
}

fn is_contextual_field(path: &str) -> bool {
    let field = path.rsplit('.').next().unwrap_or(path);
    CONTEXTUAL_FIELDS.contains(&field)
}

fn suggestion_for(kind: &ValidationErrorKind, path: &str) -> Option<String> {
    let suggestion = match kind {
        ValidationErrorKind::Required { .. } => {
            format!("Add the missing required field at '{path}'.")
        }
        ValidationErrorKind::Pattern { .. } if path.ends_with("task_id") || path.contains("depends_on[") || path.contains("task_ids[") => {
            "task_id must be kebab-case (lowercase letters, numbers, hyphens). Example: 'my-task-name'. Pattern: ^[a-z0-9]+(-[a-z0-9]+)*$".to_string()
        }
        ValidationErrorKind::Pattern { .. } => format!(
            "The value at '{path}' does not match the required pattern. Check the schema for the expected format."
        ),
        ValidationErrorKind::Enum { .. } | ValidationErrorKind::Constant { .. } => format!(
            "The value at '{path}' must be one of the allowed values. Check the schema definition for valid options."
        ),
        ValidationErrorKind::MaxLength { .. } | ValidationErrorKind::Maximum { .. } => {
            format!("The value at '{path}' exceeds the maximum length. Shorten it.")
        }
        ValidationErrorKind::MinLength { .. } | ValidationErrorKind::Minimum { .. } => {
            format!("The value at '{path}' is too short or empty. Provide a meaningful value.")
        }
        ValidationErrorKind::MinItems { .. } => {
            format!("The array at '{path}' must have at least one item. Add the required elements.")
        }
        ValidationErrorKind::AdditionalProperties { .. } => format!(
            "The field at '{path}' is not recognized. Remove it or check for typos. Valid fields are listed in the schema."
        ),
        ValidationErrorKind::Type { .. } if is_contextual_field(path) => format!(
            "The value at '{path}' must be a list, or {{\"status\": \"N/A\", \"reason\": \"...\"}} when the field does not apply."
        ),
        ValidationErrorKind::Type { .. } => format!(
            "The value at '{path}' has the wrong type. Check the schema for the expected type (string, array, object, etc.)."
        ),
        _ => return None,
    };
    Some(suggestion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> SchemaValidator {
        SchemaValidator::new().expect("embedded schemas should compile")
    }

    fn valid_task() -> Value {
        json!({
            "task_id": "parse-config",
            "task_name": "Parse configuration file",
            "goal": "The loader returns a Config struct for a valid TOML file.",
            "inputs": [{"name": "path", "type": "string", "constraints": "exists", "source": "cli"}],
            "outputs": [{"name": "config", "type": "Config", "constraints": "", "destination": "caller"}],
            "acceptance": ["Given a valid file, load returns Ok(Config)."],
            "depends_on": {"status": "N/A", "reason": "first task"},
            "constraints": ["no network access"],
            "files_scope": ["src/config.rs"]
        })
    }

    fn validate_value(mode: Mode, value: &Value) -> Vec<Diagnostic> {
        let bytes = serde_json::to_vec(value).expect("fixture should serialize");
        validator().validate(&bytes, mode)
    }

    #[test]
    fn pointer_to_path_expected_dotted_form() {
        assert_eq!(pointer_to_path(""), "$");
        assert_eq!(pointer_to_path("/tasks/0/task_id"), "tasks[0].task_id");
        assert_eq!(pointer_to_path("/tasks/2/inputs/1"), "tasks[2].inputs[1]");
        assert_eq!(pointer_to_path("/types/a~1b"), "types.a/b");
    }

    #[test]
    fn compose_graph_schema_expected_node_spliced_into_defs() {
        let node = json!({"$schema": "x", "type": "object", "$defs": {"task_id": {"type": "string"}}});
        let graph = json!({"type": "object", "$defs": {"milestone": {}}});
        let composed = compose_graph_schema(graph, &node).expect("schemas should compose");
        assert_eq!(composed["$defs"]["task_node"], json!({"type": "object"}));
        assert_eq!(composed["$defs"]["task_id"], json!({"type": "string"}));
        assert!(composed["$defs"].get("milestone").is_some());
    }

    #[test]
    fn validate_conforming_task_expected_no_diagnostics() {
        assert!(validate_value(Mode::SingleTask, &valid_task()).is_empty());
    }

    #[test]
    fn validate_not_json_expected_single_root_error() {
        let diagnostics = validator().validate(b"{not json", Mode::TaskGraph);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].path, "$");
        assert_eq!(diagnostics[0].rule, RULE_SCHEMA);
    }

    #[test]
    fn validate_missing_required_expected_path_names_property() {
        let mut task = valid_task();
        task.as_object_mut().expect("object").remove("goal");
        let diagnostics = validate_value(Mode::SingleTask, &task);
        assert!(diagnostics.iter().any(|d| d.path == "goal" && d.is_error()));
    }

    #[test]
    fn validate_bad_task_id_in_graph_expected_kebab_case_hint() {
        let mut task = valid_task();
        task["task_id"] = json!("Parse_Config");
        let graph = json!({"version": "1.0.0", "tasks": [task]});
        let diagnostics = validate_value(Mode::TaskGraph, &graph);
        let diagnostic = diagnostics
            .iter()
            .find(|d| d.path == "tasks[0].task_id")
            .expect("task_id violation should be reported");
        assert!(
            diagnostic
                .suggestion
                .as_deref()
                .is_some_and(|s| s.contains("kebab-case"))
        );
    }

    #[test]
    fn validate_unknown_field_expected_error_at_field() {
        let mut task = valid_task();
        task["colour"] = json!("blue");
        let diagnostics = validate_value(Mode::SingleTask, &task);
        assert!(diagnostics.iter().any(|d| d.path == "colour"));
    }

    #[test]
    fn validate_wrong_na_status_expected_error_at_field() {
        let mut task = valid_task();
        task["depends_on"] = json!({"status": "none", "reason": "x"});
        let diagnostics = validate_value(Mode::SingleTask, &task);
        assert!(diagnostics.iter().any(|d| d.path == "depends_on.status"));
    }

    #[test]
    fn validate_bad_dependency_id_expected_leaf_error_with_kebab_case_hint() {
        let mut task = valid_task();
        task["depends_on"] = json!(["Bad_Id"]);
        let diagnostics = validate_value(Mode::SingleTask, &task);
        let diagnostic = diagnostics
            .iter()
            .find(|d| d.path == "depends_on[0]")
            .expect("the offending entry should be reported");
        assert!(
            diagnostic
                .suggestion
                .as_deref()
                .is_some_and(|s| s.contains("kebab-case"))
        );
        assert!(diagnostics.iter().all(|d| d.path != "depends_on"));
    }

    #[test]
    fn validate_contextual_field_wrong_type_expected_list_or_na_hint() {
        let mut task = valid_task();
        task["files_scope"] = json!("src/config.rs");
        let diagnostics = validate_value(Mode::SingleTask, &task);
        let diagnostic = diagnostics
            .iter()
            .find(|d| d.path == "files_scope")
            .expect("files_scope violation should be reported");
        assert!(
            diagnostic
                .suggestion
                .as_deref()
                .is_some_and(|s| s.contains("N/A"))
        );
    }

    #[test]
    fn validate_graph_empty_tasks_expected_error() {
        let diagnostics = validate_value(Mode::TaskGraph, &json!({"version": "1.0.0", "tasks": []}));
        assert!(diagnostics.iter().any(|d| d.path == "tasks"));
    }

    #[test]
    fn validate_bad_priority_expected_enum_suggestion() {
        let mut task = valid_task();
        task["priority"] = json!("urgent");
        let diagnostics = validate_value(Mode::SingleTask, &task);
        let diagnostic = diagnostics
            .iter()
            .find(|d| d.path == "priority")
            .expect("priority violation should be reported");
        assert!(
            diagnostic
                .suggestion
                .as_deref()
                .is_some_and(|s| s.contains("allowed values"))
        );
    }
}
