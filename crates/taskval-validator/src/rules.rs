use crate::diagnostics::{
    RULE_ACCEPTANCE_QUALITY, RULE_ACYCLIC, RULE_CONTEXTUAL_FIELDS, RULE_DEPENDENCY_REFS,
    RULE_FILES_SCOPE, RULE_GOAL_QUALITY, RULE_MILESTONE, RULE_UNIQUE_IDS,
};
use crate::{Diagnostic, TaskGraph, ValidationResult, ValidatorError, topological_order};
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

const CONTEXTUAL_FIELDS: [&str; 3] = ["depends_on", "constraints", "files_scope"];

/// A Tier 2 check. Rules are independent and never short-circuit each other.
pub trait SemanticRule: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, graph: &TaskGraph) -> Vec<Diagnostic>;
}

/// A phrase reported by a content-quality rule and the pattern that detects it.
///
/// The pattern is a regex fragment matched case-insensitively between word
/// boundaries, so `works? correctly` also catches "work correctly".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhrasePattern {
    pub phrase: String,
    pub pattern: String,
}

impl PhrasePattern {
    pub fn new(phrase: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            pattern: pattern.into(),
        }
    }

    /// Matches the phrase exactly as written.
    pub fn literal(phrase: impl Into<String>) -> Self {
        let phrase = phrase.into();
        let pattern = regex::escape(&phrase);
        Self { phrase, pattern }
    }
}

/// Word lists driving the content-quality rules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeuristicTables {
    pub forbidden_goal_words: Vec<PhrasePattern>,
    pub vague_acceptance_phrases: Vec<PhrasePattern>,
    pub implementation_verbs: Vec<String>,
}

impl Default for HeuristicTables {
    fn default() -> Self {
        Self {
            forbidden_goal_words: ["try", "explore", "investigate", "look into"]
                .into_iter()
                .map(PhrasePattern::literal)
                .collect(),
            vague_acceptance_phrases: vec![
                PhrasePattern::new("works correctly", r"works? correctly"),
                PhrasePattern::literal("is correct"),
                PhrasePattern::literal("is good"),
                PhrasePattern::new("looks right", r"looks? right"),
                PhrasePattern::literal("properly"),
                PhrasePattern::literal("as expected"),
                PhrasePattern::literal("should work"),
                PhrasePattern::literal("is fine"),
            ],
            implementation_verbs: to_strings(&["implement", "add", "fix", "create", "build", "write"]),
        }
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|word| word.to_string()).collect()
}

/// Tier 2: an ordered registry of semantic rules.
pub struct SemanticValidator {
    rules: Vec<Box<dyn SemanticRule>>,
}

impl std::fmt::Debug for SemanticValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|rule| rule.name()))
            .finish()
    }
}

impl SemanticValidator {
    /// The standard rules in execution order: V2, V4, V5, V6, V7, V9, V10, MILESTONE.
    pub fn standard(tables: &HeuristicTables) -> Result<Self, ValidatorError> {
        let rules: Vec<Box<dyn SemanticRule>> = vec![
            Box::new(UniqueTaskIds),
            Box::new(DependencyReferences),
            Box::new(Acyclic),
            Box::new(GoalQuality::new(&tables.forbidden_goal_words)?),
            Box::new(AcceptanceQuality::new(&tables.vague_acceptance_phrases)?),
            Box::new(ContextualFields),
            Box::new(FilesScope::new(&tables.implementation_verbs)),
            Box::new(MilestoneIntegrity),
        ];
        Ok(Self { rules })
    }

    /// Appends a rule that runs after the standard ones.
    pub fn with_rule(mut self, rule: impl SemanticRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.rules.iter().map(|rule| rule.name())
    }

    pub fn validate(&self, graph: &TaskGraph, result: &mut ValidationResult) {
        result.stats.total_tasks = graph.tasks.len();
        for rule in &self.rules {
            let diagnostics = rule.apply(graph);
            tracing::debug!(rule = rule.name(), findings = diagnostics.len(), "semantic rule applied");
            result.extend(diagnostics);
        }
    }
}

fn whole_phrase_matcher(entry: &PhrasePattern) -> Result<Regex, ValidatorError> {
    RegexBuilder::new(&format!(r"\b(?:{})\b", entry.pattern))
        .case_insensitive(true)
        .build()
        .map_err(|error| ValidatorError::Heuristic {
            phrase: entry.phrase.clone(),
            message: error.to_string(),
        })
}

fn compile_phrases(entries: &[PhrasePattern]) -> Result<Vec<(String, Regex)>, ValidatorError> {
    entries
        .iter()
        .map(|entry| Ok::<_, ValidatorError>((entry.phrase.clone(), whole_phrase_matcher(entry)?)))
        .collect()
}

pub struct UniqueTaskIds;

impl SemanticRule for UniqueTaskIds {
    fn name(&self) -> &str {
        RULE_UNIQUE_IDS
    }

    fn apply(&self, graph: &TaskGraph) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (position, task) in graph.tasks.iter().enumerate() {
            match seen.entry(task.task_id.as_str()) {
                Entry::Vacant(slot) => {
                    slot.insert(position);
                }
                Entry::Occupied(first) => diagnostics.push(
                    Diagnostic::error(
                        RULE_UNIQUE_IDS,
                        format!("tasks[{position}].task_id"),
                        format!(
                            "Duplicate task_id '{}': first occurrence at tasks[{}].",
                            task.task_id,
                            first.get()
                        ),
                    )
                    .with_suggestion(
                        "Every task_id must be globally unique within the project. Rename one of the duplicates.",
                    )
                    .with_context(task.task_id.clone()),
                ),
            }
        }
        diagnostics
    }
}

pub struct DependencyReferences;

impl SemanticRule for DependencyReferences {
    fn name(&self) -> &str {
        RULE_DEPENDENCY_REFS
    }

    fn apply(&self, graph: &TaskGraph) -> Vec<Diagnostic> {
        let index = graph.task_index();
        let mut diagnostics = Vec::new();
        for (position, task) in graph.tasks.iter().enumerate() {
            for dependency in task.dependencies() {
                if index.contains_key(dependency.as_str()) {
                    continue;
                }
                diagnostics.push(
                    Diagnostic::error(
                        RULE_DEPENDENCY_REFS,
                        format!("tasks[{position}].depends_on"),
                        format!(
                            "Task '{}' depends on '{dependency}', but no task with that task_id exists in the graph.",
                            task.task_id
                        ),
                    )
                    .with_suggestion(format!(
                        "Either add a task with task_id '{dependency}' to the graph, or remove '{dependency}' from the depends_on list of task '{}'.",
                        task.task_id
                    ))
                    .with_context(dependency.clone()),
                );
            }
        }
        diagnostics
    }
}

/// Self-references first, then one diagnostic for the Kahn residual.
pub struct Acyclic;

impl SemanticRule for Acyclic {
    fn name(&self) -> &str {
        RULE_ACYCLIC
    }

    fn apply(&self, graph: &TaskGraph) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (position, task) in graph.tasks.iter().enumerate() {
            if task.dependencies().iter().any(|dependency| *dependency == task.task_id) {
                diagnostics.push(
                    Diagnostic::error(
                        RULE_ACYCLIC,
                        format!("tasks[{position}].depends_on"),
                        format!("Task '{}' depends on itself, which is a trivial cycle.", task.task_id),
                    )
                    .with_suggestion("Remove the self-reference from depends_on.")
                    .with_context(task.task_id.clone()),
                );
            }
        }

        let topology = topological_order(graph);
        if !topology.is_acyclic() {
            let members = topology
                .blocked
                .iter()
                .map(|&position| graph.tasks[position].task_id.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            diagnostics.push(
                Diagnostic::error(
                    RULE_ACYCLIC,
                    "tasks",
                    format!(
                        "Dependency graph contains a cycle. {} task(s) are involved: [{members}]. A valid task graph must be a directed acyclic graph.",
                        topology.blocked.len()
                    ),
                )
                .with_suggestion(
                    "Review the depends_on fields of the listed tasks. Break the cycle by removing one dependency or splitting a task into sub-tasks.",
                )
                .with_context(members),
            );
        }
        diagnostics
    }
}

pub struct GoalQuality {
    forbidden: Vec<(String, Regex)>,
}

impl GoalQuality {
    pub fn new(forbidden_words: &[PhrasePattern]) -> Result<Self, ValidatorError> {
        Ok(Self {
            forbidden: compile_phrases(forbidden_words)?,
        })
    }
}

impl SemanticRule for GoalQuality {
    fn name(&self) -> &str {
        RULE_GOAL_QUALITY
    }

    fn apply(&self, graph: &TaskGraph) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (position, task) in graph.tasks.iter().enumerate() {
            let path = format!("tasks[{position}].goal");
            for (word, matcher) in &self.forbidden {
                if !matcher.is_match(&task.goal) {
                    continue;
                }
                diagnostics.push(
                    Diagnostic::error(
                        RULE_GOAL_QUALITY,
                        path.clone(),
                        format!(
                            "Goal contains the forbidden word '{word}'. Goals must describe testable outcomes, not activities or explorations."
                        ),
                    )
                    .with_suggestion(format!(
                        "Rewrite the goal as a concrete, testable outcome. Instead of '{word} ...', describe what the system does when the task is complete. Example: 'The function returns X when given Y.'"
                    ))
                    .with_context(task.goal.clone()),
                );
            }

            if task.goal.trim_start().starts_with("To ") {
                diagnostics.push(
                    Diagnostic::warning(
                        RULE_GOAL_QUALITY,
                        path,
                        "Goal starts with 'To ...', which reads as an activity rather than a testable outcome.",
                    )
                    .with_suggestion(
                        "Rewrite as a state-of-the-world assertion. Example: instead of 'To add search', write 'The search endpoint returns ranked results for a query.'",
                    )
                    .with_context(task.goal.clone()),
                );
            }
        }
        diagnostics
    }
}

pub struct AcceptanceQuality {
    vague: Vec<(String, Regex)>,
}

impl AcceptanceQuality {
    pub fn new(vague_phrases: &[PhrasePattern]) -> Result<Self, ValidatorError> {
        Ok(Self {
            vague: compile_phrases(vague_phrases)?,
        })
    }
}

impl SemanticRule for AcceptanceQuality {
    fn name(&self) -> &str {
        RULE_ACCEPTANCE_QUALITY
    }

    fn apply(&self, graph: &TaskGraph) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (position, task) in graph.tasks.iter().enumerate() {
            for (criterion_position, criterion) in task.acceptance.iter().enumerate() {
                for (phrase, matcher) in &self.vague {
                    if !matcher.is_match(criterion) {
                        continue;
                    }
                    diagnostics.push(
                        Diagnostic::warning(
                            RULE_ACCEPTANCE_QUALITY,
                            format!("tasks[{position}].acceptance[{criterion_position}]"),
                            format!(
                                "Acceptance criterion contains the vague phrase '{phrase}'. Criteria must be independently verifiable with concrete expected values."
                            ),
                        )
                        .with_suggestion(
                            "Replace with a specific assertion. Example: instead of 'it works correctly', write 'Given input \"test\", the function returns [\"result\"] with status 200.'",
                        )
                        .with_context(criterion.clone()),
                    );
                }
            }
        }
        diagnostics
    }
}

pub struct ContextualFields;

impl SemanticRule for ContextualFields {
    fn name(&self) -> &str {
        RULE_CONTEXTUAL_FIELDS
    }

    fn apply(&self, graph: &TaskGraph) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (position, task) in graph.tasks.iter().enumerate() {
            for field in CONTEXTUAL_FIELDS {
                if task.contextual_field(field).is_some() {
                    continue;
                }
                diagnostics.push(
                    Diagnostic::warning(
                        RULE_CONTEXTUAL_FIELDS,
                        format!("tasks[{position}].{field}"),
                        format!(
                            "Contextual field '{field}' is missing from task '{}'. Provide it or mark it {{\"status\": \"N/A\", \"reason\": \"...\"}}.",
                            task.task_id
                        ),
                    )
                    .with_suggestion(format!(
                        "Either provide a value for '{field}' or mark it as not applicable: {{\"status\": \"N/A\", \"reason\": \"your justification here\"}}."
                    )),
                );
            }
        }
        diagnostics
    }
}

pub struct FilesScope {
    verbs: Vec<String>,
}

impl FilesScope {
    pub fn new(verbs: &[String]) -> Self {
        Self {
            verbs: verbs.iter().map(|verb| verb.to_lowercase()).collect(),
        }
    }

    fn is_implementation_task(&self, task_name: &str) -> bool {
        let name = task_name.to_lowercase();
        self.verbs.iter().any(|verb| name.starts_with(verb.as_str()))
    }
}

impl SemanticRule for FilesScope {
    fn name(&self) -> &str {
        RULE_FILES_SCOPE
    }

    fn apply(&self, graph: &TaskGraph) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (position, task) in graph.tasks.iter().enumerate() {
            if !self.is_implementation_task(&task.task_name) {
                continue;
            }
            let scoped = task
                .files_scope
                .as_ref()
                .is_some_and(|field| field.is_populated() || field.is_not_applicable());
            if scoped {
                continue;
            }
            diagnostics.push(
                Diagnostic::warning(
                    RULE_FILES_SCOPE,
                    format!("tasks[{position}].files_scope"),
                    format!(
                        "Task '{}' looks like an implementation task (its name starts with an implementation verb) but has no files_scope.",
                        task.task_id
                    ),
                )
                .with_suggestion(
                    "Add a files_scope listing the files the agent should create or modify, so changes stay contained.",
                ),
            );
        }
        diagnostics
    }
}

pub struct MilestoneIntegrity;

impl SemanticRule for MilestoneIntegrity {
    fn name(&self) -> &str {
        RULE_MILESTONE
    }

    fn apply(&self, graph: &TaskGraph) -> Vec<Diagnostic> {
        let tasks = graph.task_index();
        let mut diagnostics = Vec::new();
        let mut names: HashMap<&str, usize> = HashMap::new();

        for (position, milestone) in graph.milestones.iter().enumerate() {
            match names.entry(milestone.name.as_str()) {
                Entry::Vacant(slot) => {
                    slot.insert(position);
                }
                Entry::Occupied(first) => diagnostics.push(
                    Diagnostic::error(
                        RULE_MILESTONE,
                        format!("milestones[{position}].name"),
                        format!(
                            "Duplicate milestone name '{}': first occurrence at milestones[{}].",
                            milestone.name,
                            first.get()
                        ),
                    )
                    .with_suggestion("Every milestone name must be unique. Rename one of the duplicates.")
                    .with_context(milestone.name.clone()),
                ),
            }

            for task_id in &milestone.task_ids {
                if tasks.contains_key(task_id.as_str()) {
                    continue;
                }
                diagnostics.push(
                    Diagnostic::error(
                        RULE_MILESTONE,
                        format!("milestones[{position}].task_ids"),
                        format!(
                            "Milestone '{}' references task_id '{task_id}', but no task with that id exists in the graph.",
                            milestone.name
                        ),
                    )
                    .with_suggestion(format!(
                        "Add a task with task_id '{task_id}' or remove it from the milestone."
                    ))
                    .with_context(task_id.clone()),
                );
            }
        }

        for (position, milestone) in graph.milestones.iter().enumerate() {
            for dependency in &milestone.depends_on_milestones {
                if names.contains_key(dependency.as_str()) {
                    continue;
                }
                diagnostics.push(
                    Diagnostic::error(
                        RULE_MILESTONE,
                        format!("milestones[{position}].depends_on_milestones"),
                        format!(
                            "Milestone '{}' depends on milestone '{dependency}', but no milestone with that name exists.",
                            milestone.name
                        ),
                    )
                    .with_suggestion(format!(
                        "Add a milestone named '{dependency}' or remove it from depends_on_milestones."
                    ))
                    .with_context(dependency.clone()),
                );
            }
        }
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Contextual, Milestone, NotApplicable, Severity, TaskNode};

    fn task(id: &str, deps: &[&str]) -> TaskNode {
        TaskNode {
            task_id: id.to_string(),
            task_name: format!("Task {id}"),
            goal: "The service returns a value for each request.".to_string(),
            acceptance: vec!["Given input 1 the function returns 2.".to_string()],
            depends_on: Some(Contextual::List(deps.iter().map(|d| d.to_string()).collect())),
            constraints: Some(Contextual::NotApplicable(NotApplicable::new("none"))),
            files_scope: Some(Contextual::List(vec!["src/lib.rs".to_string()])),
            ..TaskNode::default()
        }
    }

    fn graph(tasks: Vec<TaskNode>) -> TaskGraph {
        TaskGraph {
            version: "1.0.0".to_string(),
            tasks,
            ..TaskGraph::default()
        }
    }

    fn run(graph: &TaskGraph) -> ValidationResult {
        let validator = SemanticValidator::standard(&HeuristicTables::default())
            .expect("default heuristics should compile");
        let mut result = ValidationResult::new();
        validator.validate(graph, &mut result);
        result
    }

    fn by_rule<'a>(result: &'a ValidationResult, rule: &'a str) -> Vec<&'a Diagnostic> {
        result.errors.iter().filter(|d| d.rule == rule).collect()
    }

    #[test]
    fn standard_rule_order_expected_fixed_sequence() {
        let validator = SemanticValidator::standard(&HeuristicTables::default())
            .expect("default heuristics should compile");
        let names: Vec<&str> = validator.rule_names().collect();
        assert_eq!(names, vec!["V2", "V4", "V5", "V6", "V7", "V9", "V10", "MILESTONE"]);
    }

    #[test]
    fn clean_graph_expected_no_findings_and_task_count() {
        let result = run(&graph(vec![task("a", &[]), task("b", &["a"])]));
        assert!(result.valid);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.stats.total_tasks, 2);
    }

    #[test]
    fn duplicate_ids_expected_one_error_per_extra_occurrence() {
        let result = run(&graph(vec![task("a", &[]), task("a", &[]), task("a", &[])]));
        let duplicates = by_rule(&result, RULE_UNIQUE_IDS);
        assert_eq!(duplicates.len(), 2);
        assert_eq!(duplicates[0].path, "tasks[1].task_id");
        assert_eq!(duplicates[1].path, "tasks[2].task_id");
        assert!(duplicates.iter().all(|d| d.message.contains("tasks[0]")));
    }

    #[test]
    fn self_reference_expected_dedicated_error_and_cycle() {
        let result = run(&graph(vec![task("a", &["a"])]));
        let cycles = by_rule(&result, RULE_ACYCLIC);
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].path, "tasks[0].depends_on");
        assert!(cycles[0].message.contains("itself"));
        assert_eq!(cycles[1].path, "tasks");
    }

    #[test]
    fn cycle_with_downstream_task_expected_residual_members_in_document_order() {
        let result = run(&graph(vec![
            task("tail", &["b"]),
            task("a", &["b"]),
            task("b", &["a"]),
        ]));
        let cycles = by_rule(&result, RULE_ACYCLIC);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].context.as_deref(), Some("tail, a, b"));
    }

    #[test]
    fn goal_forbidden_words_expected_error_per_word_whole_word_only() {
        let mut explore = task("a", &[]);
        explore.goal = "We Explore options and try LOOK INTO the cache.".to_string();
        let mut entry = task("b", &[]);
        entry.goal = "The entry point retries the country lookup.".to_string();
        let result = run(&graph(vec![explore, entry]));
        let goals = by_rule(&result, RULE_GOAL_QUALITY);
        assert_eq!(goals.len(), 3);
        assert!(goals.iter().all(|d| d.path == "tasks[0].goal" && d.is_error()));
    }

    #[test]
    fn goal_starting_with_to_expected_warning() {
        let mut activity = task("a", &[]);
        activity.goal = "  To add a search endpoint to the API.".to_string();
        let result = run(&graph(vec![activity]));
        let goals = by_rule(&result, RULE_GOAL_QUALITY);
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].severity, Severity::Warning);
        assert!(result.valid);
    }

    #[test]
    fn acceptance_vague_phrases_expected_warning_per_phrase() {
        let mut vague = task("a", &[]);
        vague.acceptance = vec![
            "Login works correctly and is fine.".to_string(),
            "Returns 404 for a missing id.".to_string(),
            "Handles errors Properly".to_string(),
        ];
        let result = run(&graph(vec![vague]));
        let findings = by_rule(&result, RULE_ACCEPTANCE_QUALITY);
        let paths: Vec<&str> = findings.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["tasks[0].acceptance[0]", "tasks[0].acceptance[0]", "tasks[0].acceptance[2]"]
        );
        assert!(result.valid);
    }

    #[test]
    fn acceptance_singular_verb_forms_expected_flagged_under_table_phrase() {
        let mut vague = task("a", &[]);
        vague.acceptance = vec![
            "Both handlers work correctly.".to_string(),
            "The rendered page should look right.".to_string(),
        ];
        let result = run(&graph(vec![vague]));
        let findings = by_rule(&result, RULE_ACCEPTANCE_QUALITY);
        assert_eq!(findings.len(), 2);
        assert!(findings[0].message.contains("'works correctly'"));
        assert!(findings[1].message.contains("'looks right'"));
    }

    #[test]
    fn invalid_heuristic_pattern_expected_heuristic_error() {
        let tables = HeuristicTables {
            vague_acceptance_phrases: vec![PhrasePattern::new("broken", "(unclosed")],
            ..HeuristicTables::default()
        };
        let error = SemanticValidator::standard(&tables).expect_err("pattern should not compile");
        assert!(matches!(error, ValidatorError::Heuristic { phrase, .. } if phrase == "broken"));
    }

    #[test]
    fn missing_contextual_fields_expected_warning_per_field() {
        let bare = TaskNode {
            task_id: "a".to_string(),
            task_name: "Document the API".to_string(),
            goal: "The README lists every endpoint.".to_string(),
            ..TaskNode::default()
        };
        let result = run(&graph(vec![bare]));
        let paths: Vec<&str> = by_rule(&result, RULE_CONTEXTUAL_FIELDS)
            .iter()
            .map(|d| d.path.as_str())
            .collect();
        assert_eq!(
            paths,
            vec!["tasks[0].depends_on", "tasks[0].constraints", "tasks[0].files_scope"]
        );
    }

    #[test]
    fn implementation_task_without_files_scope_expected_warning() {
        let mut absent = task("a", &[]);
        absent.task_name = "Implement parser".to_string();
        absent.files_scope = None;
        let mut empty = task("b", &[]);
        empty.task_name = "fix login".to_string();
        empty.files_scope = Some(Contextual::List(Vec::new()));
        let mut not_applicable = task("c", &[]);
        not_applicable.task_name = "Write docs".to_string();
        not_applicable.files_scope = Some(Contextual::NotApplicable(NotApplicable::new("docs only")));
        let mut research = task("d", &[]);
        research.task_name = "Survey options".to_string();
        research.files_scope = None;

        let result = run(&graph(vec![absent, empty, not_applicable, research]));
        let paths: Vec<&str> = by_rule(&result, RULE_FILES_SCOPE)
            .iter()
            .map(|d| d.path.as_str())
            .collect();
        assert_eq!(paths, vec!["tasks[0].files_scope", "tasks[1].files_scope"]);
    }

    #[test]
    fn milestone_problems_expected_errors() {
        let mut graph = graph(vec![task("a", &[])]);
        graph.milestones = vec![
            Milestone {
                name: "m1".to_string(),
                task_ids: vec!["a".to_string(), "ghost".to_string()],
                ..Milestone::default()
            },
            Milestone {
                name: "m1".to_string(),
                task_ids: vec!["a".to_string()],
                depends_on_milestones: vec!["m0".to_string()],
            },
        ];
        let result = run(&graph);
        let paths: Vec<&str> = by_rule(&result, RULE_MILESTONE)
            .iter()
            .map(|d| d.path.as_str())
            .collect();
        assert_eq!(
            paths,
            vec![
                "milestones[0].task_ids",
                "milestones[1].name",
                "milestones[1].depends_on_milestones"
            ]
        );
        assert!(!result.valid);
    }

    #[test]
    fn custom_tables_expected_used_by_rules() {
        let tables = HeuristicTables {
            forbidden_goal_words: vec![PhrasePattern::literal("maybe")],
            ..HeuristicTables::default()
        };
        let validator = SemanticValidator::standard(&tables).expect("tables should compile");
        let mut hedged = task("a", &[]);
        hedged.goal = "Maybe the cache returns entries.".to_string();
        let mut result = ValidationResult::new();
        validator.validate(&graph(vec![hedged]), &mut result);
        assert_eq!(by_rule(&result, RULE_GOAL_QUALITY).len(), 1);
    }

    #[test]
    fn extra_rule_expected_runs_after_standard_rules() {
        struct AlwaysWarn;
        impl SemanticRule for AlwaysWarn {
            fn name(&self) -> &str {
                "CUSTOM"
            }
            fn apply(&self, _graph: &TaskGraph) -> Vec<Diagnostic> {
                vec![Diagnostic::warning("CUSTOM", "$", "custom")]
            }
        }

        let validator = SemanticValidator::standard(&HeuristicTables::default())
            .expect("default heuristics should compile")
            .with_rule(AlwaysWarn);
        let mut result = ValidationResult::new();
        validator.validate(&graph(vec![task("a", &[])]), &mut result);
        assert_eq!(result.errors.last().map(|d| d.rule.as_str()), Some("CUSTOM"));
    }
}
