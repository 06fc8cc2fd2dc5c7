use crate::command::format_command_line;
use crate::{CommandKind, IssueTable, Placeholder, TrackerCommand, TrackerConfig, TrackerError};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const PREFLIGHT_ARGS: [&str; 3] = ["list", "--limit", "0"];
const NOT_INITIALIZED_MARKER: &str = "no beads database";
const TIMEOUT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Captured result of one tracker invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// Exit status as text, e.g. `exit status: 1`.
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    fn from_parts(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            success: status.success(),
            status: status.to_string(),
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
        }
    }

    /// Trimmed stderr, or the exit status when stderr is empty.
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.status.clone()
        } else {
            stderr.to_string()
        }
    }
}

/// Where tracker commands are sent.
pub trait TrackerBackend {
    /// Name used when rendering command lines.
    fn program(&self) -> &str;
    /// Fails when the tracker executable cannot be found.
    fn locate(&self) -> Result<(), TrackerError>;
    fn run(&mut self, args: &[String]) -> Result<CommandOutput, TrackerError>;
}

/// Runs the tracker as one blocking subprocess per command.
#[derive(Clone, Debug)]
pub struct ProcessBackend {
    program: String,
    timeout: Option<Duration>,
}

impl ProcessBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.program.clone()).with_timeout(config.command_timeout)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn resolve_program(&self) -> Option<PathBuf> {
        find_executable(&self.program)
    }

    /// Waits for exit and for both pipes to drain, all within `limit`.
    ///
    /// A descendant that inherits the pipes can keep them open after the child
    /// exits; draining stops at the deadline too. Reader threads still blocked
    /// at that point are left to finish on their own.
    fn wait_with_deadline(&self, mut child: Child, limit: Duration) -> Result<CommandOutput, TrackerError> {
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);
        let deadline = Instant::now() + limit;

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(TrackerError::Timeout { after: limit });
                }
                Ok(None) => thread::sleep(TIMEOUT_POLL_INTERVAL),
                Err(source) => {
                    return Err(TrackerError::Io {
                        program: self.program.clone(),
                        source,
                    });
                }
            }
        };

        let timed_out = || TrackerError::Timeout { after: limit };
        let stdout = drain_reader(stdout, deadline).ok_or_else(timed_out)?;
        let stderr = drain_reader(stderr, deadline).ok_or_else(timed_out)?;
        Ok(CommandOutput::from_parts(status, &stdout, &stderr))
    }
}

impl TrackerBackend for ProcessBackend {
    fn program(&self) -> &str {
        &self.program
    }

    fn locate(&self) -> Result<(), TrackerError> {
        match self.resolve_program() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "tracker executable located");
                Ok(())
            }
            None => Err(TrackerError::ExecutableNotFound {
                program: self.program.clone(),
            }),
        }
    }

    fn run(&mut self, args: &[String]) -> Result<CommandOutput, TrackerError> {
        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TrackerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        match self.timeout {
            Some(limit) => self.wait_with_deadline(child, limit),
            None => {
                let output = child.wait_with_output().map_err(|source| TrackerError::Io {
                    program: self.program.clone(),
                    source,
                })?;
                Ok(CommandOutput::from_parts(output.status, &output.stdout, &output.stderr))
            }
        }
    }
}

fn spawn_reader(mut pipe: impl Read + Send + 'static) -> mpsc::Receiver<Vec<u8>> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = pipe.read_to_end(&mut buffer);
        let _ = sender.send(buffer);
    });
    receiver
}

/// `None` when the pipe is still open at the deadline.
fn drain_reader(receiver: Option<mpsc::Receiver<Vec<u8>>>, deadline: Instant) -> Option<Vec<u8>> {
    let Some(receiver) = receiver else {
        return Some(Vec::new());
    };
    match receiver.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(buffer) => Some(buffer),
        Err(mpsc::RecvTimeoutError::Disconnected) => Some(Vec::new()),
        Err(mpsc::RecvTimeoutError::Timeout) => None,
    }
}

/// Resolves a program name against `PATH`; names with a directory part are checked directly.
/// On Windows, a name without an extension is also tried with each `PATHEXT` suffix.
pub fn find_executable(program: &str) -> Option<PathBuf> {
    let names = candidate_names(program, executable_extensions().as_deref());
    if Path::new(program).components().count() > 1 {
        return names.iter().map(PathBuf::from).find(|candidate| candidate.is_file());
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .flat_map(|base| names.iter().map(move |name| base.join(name)))
        .find(|candidate| candidate.is_file())
}

/// The program as given, then one name per extension when it has none of its own.
fn candidate_names(program: &str, extensions: Option<&str>) -> Vec<String> {
    let mut names = vec![program.to_string()];
    if Path::new(program).extension().is_some() {
        return names;
    }
    if let Some(extensions) = extensions {
        names.extend(
            extensions
                .split(';')
                .map(str::trim)
                .filter(|extension| !extension.is_empty())
                .map(|extension| format!("{program}{}", extension.to_ascii_lowercase())),
        );
    }
    names
}

#[cfg(windows)]
fn executable_extensions() -> Option<String> {
    Some(std::env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string()))
}

#[cfg(not(windows))]
fn executable_extensions() -> Option<String> {
    None
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CreatedIssue {
    pub task_id: String,
    pub issue_id: String,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DependencyLink {
    pub task_id: String,
    pub depends_on: String,
    /// Issue that is blocked.
    pub issue_id: String,
    /// Issue it is blocked by.
    pub depends_on_issue_id: String,
}

/// What was created, in creation order. Also returned, partially filled, on failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CreationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epic_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epic_title: Option<String>,
    pub tasks: Vec<CreatedIssue>,
    pub dependencies: Vec<DependencyLink>,
    pub commands: Vec<String>,
    pub created: usize,
    pub dependencies_linked: usize,
}

impl CreationResult {
    /// Every created issue id, epic first.
    pub fn issue_ids(&self) -> Vec<&str> {
        self.epic_id
            .iter()
            .map(String::as_str)
            .chain(self.tasks.iter().map(|task| task.issue_id.as_str()))
            .collect()
    }

    pub fn task_issue(&self, task_id: &str) -> Option<&str> {
        self.tasks
            .iter()
            .find(|task| task.task_id == task_id)
            .map(|task| task.issue_id.as_str())
    }
}

/// Runs tracker commands in order, stopping at the first failure.
pub struct Executor<B> {
    backend: B,
}

impl<B: TrackerBackend> Executor<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Checks the executable is present and the tracker store is initialized.
    pub fn preflight(&mut self) -> Result<(), TrackerError> {
        self.backend.locate()?;

        let args: Vec<String> = PREFLIGHT_ARGS.iter().map(|arg| arg.to_string()).collect();
        let output = self.backend.run(&args)?;
        if output.success {
            return Ok(());
        }
        let message = output.stderr.trim();
        if message.contains(NOT_INITIALIZED_MARKER) {
            return Err(TrackerError::NotInitialized);
        }
        Err(TrackerError::Preflight {
            message: output.failure_message(),
        })
    }

    /// Preflight, then every command in order with placeholders resolved.
    pub fn execute(&mut self, commands: &[TrackerCommand]) -> Result<CreationResult, TrackerError> {
        self.preflight()?;

        let mut issues = IssueTable::new();
        let mut result = CreationResult::default();

        for command in commands {
            let args = match command.resolve(&issues) {
                Ok(args) => args,
                Err(error) => {
                    let line = format_command_line(self.backend.program(), &command.preview_args());
                    return Err(self.failure(line, error.to_string(), result));
                }
            };
            let line = format_command_line(self.backend.program(), &args);
            tracing::debug!(command = %line, "running tracker command");

            let output = match self.backend.run(&args) {
                Ok(output) if output.success => output,
                Ok(output) => return Err(self.failure(line, output.failure_message(), result)),
                Err(error) => return Err(self.failure(line, error.to_string(), result)),
            };

            if let Some(placeholder) = command.kind.produces() {
                let issue_id = output.stdout.trim();
                if issue_id.is_empty() {
                    return Err(self.failure(
                        line,
                        "create printed no issue id".to_string(),
                        result,
                    ));
                }
                if let Err(error) = issues.record(placeholder, issue_id) {
                    return Err(self.failure(line, error.to_string(), result));
                }
            }
            if let Err(error) = record_outcome(&mut result, command, &issues) {
                return Err(self.failure(line, error.to_string(), result));
            }
            result.commands.push(line);
        }

        tracing::info!(
            created = result.created,
            dependencies = result.dependencies_linked,
            "tracker issues created"
        );
        Ok(result)
    }

    fn failure(&self, command: String, message: String, partial: CreationResult) -> TrackerError {
        tracing::warn!(command = %command, error = %message, created = partial.created, "tracker command failed");
        TrackerError::CommandFailed {
            command,
            message,
            partial: Box::new(partial),
        }
    }
}

fn record_outcome(
    result: &mut CreationResult,
    command: &TrackerCommand,
    issues: &IssueTable,
) -> Result<(), TrackerError> {
    match &command.kind {
        CommandKind::CreateEpic => {
            result.epic_id = Some(issues.resolve(&Placeholder::Epic)?.to_string());
            result.epic_title = command.title().map(str::to_string);
            result.created += 1;
        }
        CommandKind::CreateTask { task_id } => {
            let issue_id = issues.resolve(&Placeholder::Task(task_id.clone()))?;
            result.tasks.push(CreatedIssue {
                task_id: task_id.clone(),
                issue_id: issue_id.to_string(),
                title: command.title().unwrap_or_default().to_string(),
            });
            result.created += 1;
        }
        CommandKind::AddDependency {
            task_id,
            depends_on,
        } => {
            result.dependencies.push(DependencyLink {
                task_id: task_id.clone(),
                depends_on: depends_on.clone(),
                issue_id: issues.resolve(&Placeholder::Task(task_id.clone()))?.to_string(),
                depends_on_issue_id: issues
                    .resolve(&Placeholder::Task(depends_on.clone()))?
                    .to_string(),
            });
            result.dependencies_linked += 1;
        }
        CommandKind::UpdateMetadata { .. } => {}
    }
    Ok(())
}
