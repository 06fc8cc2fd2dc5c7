use crate::mapping::{
    DEFAULT_PRIORITY, compose_description, format_acceptance, task_estimate, task_priority,
    template_metadata,
};
use crate::{CommandArg, CommandKind, TrackerCommand, TrackerConfig, TrackerError};
use taskval_validator::{Mode, TaskGraph, TaskNode, topological_order};

const EPIC_TITLE_PREFIX: &str = "Task Graph: ";
const STDIN_SOURCE: &str = "-";

/// Turns a validated document into an ordered list of tracker commands.
#[derive(Clone, Debug, Default)]
pub struct CommandBuilder {
    config: TrackerConfig,
    epic_title: Option<String>,
    source_name: Option<String>,
}

impl CommandBuilder {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            epic_title: None,
            source_name: None,
        }
    }

    /// Overrides the derived epic title. Blank titles are ignored.
    pub fn with_epic_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.epic_title = (!title.trim().is_empty()).then_some(title);
        self
    }

    /// Input file name used for the epic title; `-` means stdin.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    pub fn build(&self, graph: &TaskGraph, mode: Mode) -> Result<Vec<TrackerCommand>, TrackerError> {
        match mode {
            Mode::SingleTask => match graph.tasks.first() {
                Some(task) => self.build_single_task(task),
                None => Ok(Vec::new()),
            },
            Mode::TaskGraph => self.build_graph(graph),
        }
    }

    /// Create the task, then attach its metadata.
    pub fn build_single_task(&self, task: &TaskNode) -> Result<Vec<TrackerCommand>, TrackerError> {
        Ok(vec![
            self.create_task(task, false),
            self.update_metadata(task)?,
        ])
    }

    /// Epic, task creates in topological order, dependency links, metadata updates.
    pub fn build_graph(&self, graph: &TaskGraph) -> Result<Vec<TrackerCommand>, TrackerError> {
        let ordered: Vec<&TaskNode> = topological_order(graph)
            .order
            .into_iter()
            .map(|position| &graph.tasks[position])
            .collect();

        let mut commands = Vec::with_capacity(1 + ordered.len() * 2);
        commands.push(self.create_epic(graph));
        commands.extend(ordered.iter().map(|task| self.create_task(task, true)));
        for task in &ordered {
            for dependency in task.dependencies() {
                commands.push(TrackerCommand::new(
                    CommandKind::AddDependency {
                        task_id: task.task_id.clone(),
                        depends_on: dependency.clone(),
                    },
                    vec![
                        CommandArg::literal("dep"),
                        CommandArg::literal("add"),
                        CommandArg::task(&task.task_id),
                        CommandArg::task(dependency),
                    ],
                ));
            }
        }
        for task in &ordered {
            commands.push(self.update_metadata(task)?);
        }

        tracing::debug!(
            tasks = ordered.len(),
            commands = commands.len(),
            "built tracker commands for graph"
        );
        Ok(commands)
    }

    /// Override, then first milestone, then source file, then stdin.
    pub fn resolve_epic_title(&self, graph: &TaskGraph) -> String {
        if let Some(title) = &self.epic_title {
            return title.clone();
        }
        if let Some(milestone) = graph.milestones.first() {
            return format!("{EPIC_TITLE_PREFIX}{}", milestone.name);
        }
        match self.source_name.as_deref() {
            Some(name) if !name.is_empty() && name != STDIN_SOURCE => {
                format!("{EPIC_TITLE_PREFIX}{name}")
            }
            _ => format!("{EPIC_TITLE_PREFIX}(stdin)"),
        }
    }

    fn create_epic(&self, graph: &TaskGraph) -> TrackerCommand {
        let args = vec![
            CommandArg::literal("create"),
            CommandArg::literal("--title"),
            CommandArg::literal(self.resolve_epic_title(graph)),
            CommandArg::literal("--type"),
            CommandArg::literal("epic"),
            CommandArg::literal("--priority"),
            CommandArg::literal(graph_priority(graph).to_string()),
            CommandArg::literal("--labels"),
            CommandArg::literal(&self.config.label),
            CommandArg::literal("--silent"),
        ];
        TrackerCommand::new(CommandKind::CreateEpic, args)
    }

    fn create_task(&self, task: &TaskNode, under_epic: bool) -> TrackerCommand {
        let mut args = vec![
            CommandArg::literal("create"),
            CommandArg::literal("--title"),
            CommandArg::literal(truncate_chars(&task.task_name, self.config.title_limit)),
            CommandArg::literal("--type"),
            CommandArg::literal("task"),
            CommandArg::literal("--description"),
            CommandArg::literal(compose_description(task)),
        ];
        if let Some(acceptance) = format_acceptance(&task.acceptance) {
            args.push(CommandArg::literal("--acceptance"));
            args.push(CommandArg::literal(acceptance));
        }
        args.push(CommandArg::literal("--priority"));
        args.push(CommandArg::literal(task_priority(task).to_string()));
        if let Some(minutes) = task_estimate(task) {
            args.push(CommandArg::literal("--estimate"));
            args.push(CommandArg::literal(minutes.to_string()));
        }
        if let Some(notes) = task.notes.as_deref().filter(|notes| !notes.is_empty()) {
            args.push(CommandArg::literal("--notes"));
            args.push(CommandArg::literal(notes));
        }
        if under_epic {
            args.push(CommandArg::literal("--parent"));
            args.push(CommandArg::epic());
        }
        args.push(CommandArg::literal("--labels"));
        args.push(CommandArg::literal(&self.config.label));
        args.push(CommandArg::literal("--silent"));

        TrackerCommand::new(
            CommandKind::CreateTask {
                task_id: task.task_id.clone(),
            },
            args,
        )
    }

    fn update_metadata(&self, task: &TaskNode) -> Result<TrackerCommand, TrackerError> {
        let design = template_metadata(task).map_err(|source| TrackerError::Metadata {
            task_id: task.task_id.clone(),
            source,
        })?;
        Ok(TrackerCommand::new(
            CommandKind::UpdateMetadata {
                task_id: task.task_id.clone(),
            },
            vec![
                CommandArg::literal("update"),
                CommandArg::task(&task.task_id),
                CommandArg::literal("--design"),
                CommandArg::literal(design),
            ],
        ))
    }
}

/// The most urgent priority across all tasks.
pub fn graph_priority(graph: &TaskGraph) -> u8 {
    graph
        .tasks
        .iter()
        .map(task_priority)
        .min()
        .map_or(DEFAULT_PRIORITY, |best| best.min(DEFAULT_PRIORITY))
}

fn truncate_chars(value: &str, limit: usize) -> String {
    match value.char_indices().nth(limit) {
        Some((end, _)) => value[..end].to_string(),
        None => value.to_string(),
    }
}
