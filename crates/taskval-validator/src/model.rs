use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Version stamped on the synthetic graph that wraps a single task.
pub const SINGLE_TASK_GRAPH_VERSION: &str = "0.1.0";

/// `status` value that marks a contextual field as not applicable.
pub const NOT_APPLICABLE_STATUS: &str = "N/A";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskGraph {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<BTreeMap<String, BTreeMap<String, String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<Defaults>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub milestones: Vec<Milestone>,
    pub tasks: Vec<TaskNode>,
}

impl TaskGraph {
    /// Wraps one task into a graph so graph-level rules apply uniformly.
    pub fn single(task: TaskNode) -> Self {
        Self {
            version: SINGLE_TASK_GRAPH_VERSION.to_string(),
            types: None,
            defaults: None,
            milestones: Vec::new(),
            tasks: vec![task],
        }
    }

    /// Maps each task id to the index of its first occurrence.
    pub fn task_index(&self) -> HashMap<&str, usize> {
        let mut index = HashMap::with_capacity(self.tasks.len());
        for (position, task) in self.tasks.iter().enumerate() {
            index.entry(task.task_id.as_str()).or_insert(position);
        }
        index
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acceptance: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_goals: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on_milestones: Vec<String>,
    pub task_ids: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNode {
    pub task_id: String,
    pub task_name: String,
    pub goal: String,
    #[serde(default)]
    pub inputs: Vec<InputSpec>,
    #[serde(default)]
    pub outputs: Vec<OutputSpec>,
    #[serde(default)]
    pub acceptance: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Contextual>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Contextual>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_scope: Option<Contextual>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_goals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<Effects>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_cases: Vec<ErrorSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TaskNode {
    /// Declared dependency ids; empty when the field is absent or N/A.
    pub fn dependencies(&self) -> &[String] {
        self.depends_on
            .as_ref()
            .map(Contextual::items)
            .unwrap_or_default()
    }

    /// Declared constraints; empty when the field is absent or N/A.
    pub fn constraint_items(&self) -> &[String] {
        self.constraints
            .as_ref()
            .map(Contextual::items)
            .unwrap_or_default()
    }

    /// Declared file paths; empty when the field is absent or N/A.
    pub fn files_scope_items(&self) -> &[String] {
        self.files_scope
            .as_ref()
            .map(Contextual::items)
            .unwrap_or_default()
    }

    /// Looks up one of the three contextual fields by its document name.
    pub fn contextual_field(&self, name: &str) -> Option<&Contextual> {
        match name {
            "depends_on" => self.depends_on.as_ref(),
            "constraints" => self.constraints.as_ref(),
            "files_scope" => self.files_scope.as_ref(),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub constraints: String,
    pub source: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub constraints: String,
    pub destination: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectSpec {
    #[serde(rename = "type")]
    pub effect_type: String,
    pub target: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSpec {
    pub condition: String,
    pub behavior: String,
    pub output: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Effects {
    Declared(Vec<EffectSpec>),
    Text(String),
}

impl Effects {
    /// Flattens the effects into one line: the text as written, or
    /// `type: target` pairs joined by `; `.
    pub fn summary(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Declared(effects) => effects
                .iter()
                .map(|effect| format!("{}: {}", effect.effect_type, effect.target))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotApplicable {
    pub status: String,
    pub reason: String,
}

impl NotApplicable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            status: NOT_APPLICABLE_STATUS.to_string(),
            reason: reason.into(),
        }
    }
}

/// A contextual field: either an ordered list or an explicit N/A marker.
///
/// Decoding tries, in order: an array of strings, then an object whose
/// `status` is `"N/A"`. Anything else is a decode error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Contextual {
    List(Vec<String>),
    NotApplicable(NotApplicable),
}

impl Contextual {
    pub fn items(&self) -> &[String] {
        match self {
            Self::List(items) => items,
            Self::NotApplicable(_) => &[],
        }
    }

    pub fn is_populated(&self) -> bool {
        matches!(self, Self::List(items) if !items.is_empty())
    }

    pub fn is_not_applicable(&self) -> bool {
        matches!(self, Self::NotApplicable(_))
    }

    pub fn from_value(value: Value) -> Result<Self, String> {
        if let Ok(items) = serde_json::from_value::<Vec<String>>(value.clone()) {
            return Ok(Self::List(items));
        }
        if let Ok(marker) = serde_json::from_value::<NotApplicable>(value.clone()) {
            if marker.status == NOT_APPLICABLE_STATUS {
                return Ok(Self::NotApplicable(marker));
            }
        }
        Err(format!(
            "expected an array of strings or {{\"status\": \"N/A\", \"reason\": \"...\"}}, got: {value}"
        ))
    }
}

impl Serialize for Contextual {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::List(items) => items.serialize(serializer),
            Self::NotApplicable(marker) => marker.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Contextual {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn contextual_array_expected_list_variant() {
        let field = Contextual::from_value(json!(["a", "b"])).expect("array should decode");
        assert_eq!(field, Contextual::List(vec!["a".to_string(), "b".to_string()]));
        assert!(field.is_populated());
    }

    #[test]
    fn contextual_empty_array_expected_list_but_not_populated() {
        let field = Contextual::from_value(json!([])).expect("empty array should decode");
        assert_eq!(field, Contextual::List(Vec::new()));
        assert!(!field.is_populated());
        assert!(!field.is_not_applicable());
    }

    #[test]
    fn contextual_na_object_expected_not_applicable_variant() {
        let field = Contextual::from_value(json!({"status": "N/A", "reason": "standalone"}))
            .expect("marker should decode");
        assert_eq!(field, Contextual::NotApplicable(NotApplicable::new("standalone")));
        assert!(field.items().is_empty());
    }

    #[test]
    fn contextual_wrong_status_expected_error() {
        let error = Contextual::from_value(json!({"status": "none", "reason": "x"}))
            .expect_err("non N/A status should be rejected");
        assert!(error.contains("N/A"));
    }

    #[test]
    fn contextual_mixed_array_expected_error() {
        assert!(Contextual::from_value(json!(["a", 1])).is_err());
    }

    #[test]
    fn task_node_absent_contextual_fields_expected_none() {
        let task: TaskNode = serde_json::from_value(json!({
            "task_id": "t1",
            "task_name": "Name",
            "goal": "The goal holds."
        }))
        .expect("task should parse");
        assert!(task.depends_on.is_none());
        assert!(task.constraints.is_none());
        assert!(task.files_scope.is_none());
        assert!(task.dependencies().is_empty());
    }

    #[test]
    fn task_node_effects_forms_expected_summary() {
        let text: Effects = serde_json::from_value(json!("None")).expect("string effects");
        assert_eq!(text.summary(), "None");

        let declared: Effects = serde_json::from_value(json!([
            {"type": "writes", "target": "db.users"},
            {"type": "emits", "target": "event.created"}
        ]))
        .expect("declared effects");
        assert_eq!(declared.summary(), "writes: db.users; emits: event.created");
    }

    #[test]
    fn task_node_serialize_expected_contextual_shapes_preserved() {
        let task = TaskNode {
            task_id: "t1".to_string(),
            depends_on: Some(Contextual::NotApplicable(NotApplicable::new("none"))),
            files_scope: Some(Contextual::List(vec!["a.rs".to_string()])),
            ..TaskNode::default()
        };
        let value = serde_json::to_value(&task).expect("task should serialize");
        assert_eq!(value["depends_on"], json!({"status": "N/A", "reason": "none"}));
        assert_eq!(value["files_scope"], json!(["a.rs"]));
        assert!(value.get("constraints").is_none());
    }

    #[test]
    fn task_index_duplicate_ids_expected_first_occurrence() {
        let graph = TaskGraph {
            version: "0.1.0".to_string(),
            tasks: vec![
                TaskNode {
                    task_id: "a".to_string(),
                    ..TaskNode::default()
                },
                TaskNode {
                    task_id: "a".to_string(),
                    ..TaskNode::default()
                },
            ],
            ..TaskGraph::default()
        };
        assert_eq!(graph.task_index().get("a"), Some(&0));
    }
}
