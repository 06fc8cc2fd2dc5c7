use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use taskval_beads::{CommandKind, CreationResult, TrackerCommand, format_command_line};
use taskval_validator::{Diagnostic, Severity, ValidationResult, ValidationStats};

const WRAP_INDENT: usize = 14;
const WRAP_WIDTH: usize = 80;
const VALUE_LIMIT: usize = 120;

/// Human-readable validation report.
pub fn validation_text(result: &ValidationResult) -> String {
    let stats = &result.stats;
    let mut out = String::new();

    if result.valid && stats.warning_count == 0 && stats.info_count == 0 {
        let _ = writeln!(out, "VALIDATION PASSED");
        let _ = writeln!(out, "  Tasks validated: {}", stats.total_tasks);
        let _ = writeln!(out, "  No errors or warnings.");
        return out;
    }

    let _ = writeln!(
        out,
        "{}",
        if result.valid {
            "VALIDATION PASSED (with warnings)"
        } else {
            "VALIDATION FAILED"
        }
    );
    let _ = writeln!(
        out,
        "\nSummary: {} error(s), {} warning(s), {} info(s) across {} task(s)",
        stats.error_count, stats.warning_count, stats.info_count, stats.total_tasks
    );

    for (severity, heading, count) in [
        (Severity::Error, "ERRORS (must fix)", stats.error_count),
        (Severity::Warning, "WARNINGS (should fix)", stats.warning_count),
        (Severity::Info, "INFO", stats.info_count),
    ] {
        if count == 0 {
            continue;
        }
        let _ = writeln!(out, "\n--- {heading} ---");
        for (position, diagnostic) in result.errors.iter().enumerate() {
            if diagnostic.severity == severity {
                write_diagnostic(&mut out, position + 1, diagnostic);
            }
        }
    }
    out
}

fn write_diagnostic(out: &mut String, number: usize, diagnostic: &Diagnostic) {
    let _ = writeln!(
        out,
        "\n  {number}. [{}] Rule {}",
        diagnostic.severity, diagnostic.rule
    );
    let _ = writeln!(out, "     Path:    {}", diagnostic.path);
    let _ = writeln!(out, "     Problem: {}", wrap_text(&diagnostic.message));
    if let Some(suggestion) = &diagnostic.suggestion {
        let _ = writeln!(out, "     Fix:     {}", wrap_text(suggestion));
    }
    if let Some(context) = &diagnostic.context {
        let _ = writeln!(out, "     Value:   {:?}", truncate_value(context));
    }
}

fn truncate_value(value: &str) -> String {
    if value.chars().count() <= VALUE_LIMIT {
        return value.to_string();
    }
    let kept: String = value.chars().take(VALUE_LIMIT - 3).collect();
    format!("{kept}...")
}

/// Wraps at the report width, indenting continuation lines under the label column.
fn wrap_text(text: &str) -> String {
    let line_width = WRAP_WIDTH - WRAP_INDENT;
    if text.chars().count() <= line_width {
        return text.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() > line_width {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            current.push(' ');
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.len() <= 1 {
        return text.to_string();
    }
    lines.join(&format!("\n{}", " ".repeat(WRAP_INDENT)))
}

/// Preview of the tracker commands a run would execute. Metadata updates are omitted.
pub fn dry_run_text(program: &str, commands: &[TrackerCommand]) -> String {
    let mut out = String::from("\nBEADS CREATION (DRY RUN)\n");
    let (mut epics, mut tasks, mut dependencies) = (0, 0, 0);

    for command in commands {
        match command.kind {
            CommandKind::CreateEpic => epics += 1,
            CommandKind::CreateTask { .. } => tasks += 1,
            CommandKind::AddDependency { .. } => dependencies += 1,
            CommandKind::UpdateMetadata { .. } => continue,
        }
        let _ = writeln!(
            out,
            "  [DRY-RUN] {}",
            format_command_line(program, &command.preview_args())
        );
    }

    let _ = writeln!(
        out,
        "\n  Summary: Would create {epics} epic + {tasks} tasks, link {dependencies} dependencies."
    );
    out
}

/// Report of issues created by a run, or created before it failed.
pub fn creation_text(result: &CreationResult) -> String {
    let mut out = String::from("\nBEADS CREATION\n");

    if let Some(epic_id) = &result.epic_id {
        let _ = writeln!(
            out,
            "  Epic created: {epic_id} {:?}",
            result.epic_title.as_deref().unwrap_or_default()
        );
    }
    for task in &result.tasks {
        let _ = writeln!(
            out,
            "  Task created: {} {:?} ({})",
            task.issue_id, task.title, task.task_id
        );
    }
    for link in &result.dependencies {
        let _ = writeln!(
            out,
            "  Dependency:   {} blocked-by {}",
            link.issue_id, link.depends_on_issue_id
        );
    }

    let epics = usize::from(result.epic_id.is_some());
    let _ = writeln!(
        out,
        "\n  Summary: {epics} epic + {} tasks created, {} dependencies linked.",
        result.created.saturating_sub(epics),
        result.dependencies_linked
    );
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    valid: bool,
    #[serde(skip_serializing_if = "<[Diagnostic]>::is_empty")]
    errors: &'a [Diagnostic],
    stats: &'a ValidationStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    beads: Option<BeadsSummary<'a>>,
}

#[derive(Serialize)]
struct BeadsSummary<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    epic_id: Option<&'a str>,
    tasks: BTreeMap<&'a str, &'a str>,
    dependencies_linked: usize,
    total_created: usize,
}

/// Machine-readable report: validation outcome plus, after a run, the created issues.
pub fn json_report(
    result: &ValidationResult,
    creation: Option<&CreationResult>,
) -> Result<String, serde_json::Error> {
    let beads = creation.map(|creation| BeadsSummary {
        epic_id: creation.epic_id.as_deref(),
        tasks: creation
            .tasks
            .iter()
            .map(|task| (task.task_id.as_str(), task.issue_id.as_str()))
            .collect(),
        dependencies_linked: creation.dependencies_linked,
        total_created: creation.created,
    });
    serde_json::to_string_pretty(&JsonReport {
        valid: result.valid,
        errors: &result.errors,
        stats: &result.stats,
        beads,
    })
}
