use serde::Serialize;
use taskval_validator::{InputSpec, OutputSpec, TaskNode};

/// Version of the `_template` envelope stored in the tracker's design field.
pub const TEMPLATE_METADATA_VERSION: &str = "0.2.0";

pub const DEFAULT_PRIORITY: u8 = 2;

/// Maps a task priority to the tracker's numeric scale. Unknown values map to medium.
pub fn map_priority(priority: &str) -> u8 {
    match priority.to_ascii_lowercase().as_str() {
        "critical" => 0,
        "high" => 1,
        "medium" => 2,
        "low" => 3,
        _ => DEFAULT_PRIORITY,
    }
}

/// Maps an estimate to minutes; `None` means the field is left off entirely.
pub fn map_estimate(estimate: &str) -> Option<u32> {
    match estimate.to_ascii_lowercase().as_str() {
        "trivial" => Some(15),
        "small" => Some(60),
        "medium" => Some(240),
        "large" => Some(480),
        _ => None,
    }
}

pub fn task_priority(task: &TaskNode) -> u8 {
    map_priority(task.priority.as_deref().unwrap_or_default())
}

pub fn task_estimate(task: &TaskNode) -> Option<u32> {
    map_estimate(task.estimate.as_deref().unwrap_or_default())
}

/// Builds the markdown issue body. Sections without content are omitted.
pub fn compose_description(task: &TaskNode) -> String {
    let mut sections = vec![task.goal.clone()];

    push_section(
        &mut sections,
        "Inputs",
        task.inputs.iter().map(|input| {
            format!(
                "- **{}** (`{}`): {} -- Source: {}",
                input.name, input.data_type, input.constraints, input.source
            )
        }),
    );
    push_section(
        &mut sections,
        "Outputs",
        task.outputs.iter().map(|output| {
            format!(
                "- **{}** (`{}`): {} -- Dest: {}",
                output.name, output.data_type, output.constraints, output.destination
            )
        }),
    );
    push_section(
        &mut sections,
        "Constraints",
        task.constraint_items().iter().map(|constraint| format!("- {constraint}")),
    );
    push_section(
        &mut sections,
        "Non-Goals",
        task.non_goals.iter().map(|non_goal| format!("- {non_goal}")),
    );
    push_section(
        &mut sections,
        "Error Cases",
        task.error_cases.iter().map(|case| {
            format!("- **{}**: {} -> {}", case.condition, case.behavior, case.output)
        }),
    );

    sections.join("\n\n")
}

fn push_section(sections: &mut Vec<String>, heading: &str, lines: impl Iterator<Item = String>) {
    let lines: Vec<String> = lines.collect();
    if lines.is_empty() {
        return;
    }
    sections.push(format!("## {heading}\n{}", lines.join("\n")));
}

/// Renders acceptance criteria as a checklist; `None` when there are none.
pub fn format_acceptance(criteria: &[String]) -> Option<String> {
    if criteria.is_empty() {
        return None;
    }
    Some(
        criteria
            .iter()
            .map(|criterion| format!("- {criterion}"))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

#[derive(Serialize)]
struct TemplateMetadata<'a> {
    #[serde(rename = "_template")]
    template: TemplateData<'a>,
}

#[derive(Serialize)]
struct TemplateData<'a> {
    version: &'static str,
    task_id: &'a str,
    files_scope: &'a [String],
    effects: String,
    inputs: &'a [InputSpec],
    outputs: &'a [OutputSpec],
}

/// Serializes the fields the tracker has no native slot for.
pub fn template_metadata(task: &TaskNode) -> Result<String, serde_json::Error> {
    serde_json::to_string(&TemplateMetadata {
        template: TemplateData {
            version: TEMPLATE_METADATA_VERSION,
            task_id: &task.task_id,
            files_scope: task.files_scope_items(),
            effects: task
                .effects
                .as_ref()
                .map(|effects| effects.summary())
                .unwrap_or_default(),
            inputs: &task.inputs,
            outputs: &task.outputs,
        },
    })
}
