mod render;

use clap::{ArgAction, Parser, ValueEnum};
use std::io::Read;
use std::process::ExitCode;
use taskval_beads::{CommandBuilder, Executor, ProcessBackend, TrackerConfig};
use taskval_validator::{Mode, ValidationResult, Validator};
use tracing_subscriber::EnvFilter;

const STDIN_INPUT: &str = "-";
const LOG_ENV: &str = "TASKVAL_LOG";

#[derive(Parser, Debug)]
#[command(name = "taskval")]
#[command(about = "Validate task graph documents and optionally create beads issues from them")]
#[command(after_help = "Exit codes:\n  0  Validation passed (no errors)\n  1  Validation failed (errors found)\n  2  Usage, internal, or bd error")]
struct Cli {
    /// Document shape: a single task node or a full task graph.
    #[arg(long, value_enum, default_value_t = ModeArg::Graph)]
    mode: ModeArg,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
    /// On validation success, create beads issues via the bd CLI.
    #[arg(long = "create-beads", action = ArgAction::SetTrue)]
    create_beads: bool,
    /// Print the bd commands instead of running them.
    #[arg(long = "dry-run", action = ArgAction::SetTrue, requires = "create_beads")]
    dry_run: bool,
    /// Override the derived epic title (graph mode only).
    #[arg(long = "epic-title")]
    epic_title: Option<String>,
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
    /// Input file, or `-` for stdin.
    input: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Task,
    Graph,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Task => Mode::SingleTask,
            ModeArg::Graph => Mode::TaskGraph,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(2)
        }
    }
}

/// Logs go to stderr; stdout carries only the report.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> Result<ExitCode, String> {
    let data = read_input(&cli.input)?;
    let mode = Mode::from(cli.mode);

    let validator = Validator::new().map_err(|error| format!("internal error: {error}"))?;
    let result = validator
        .validate(&data, mode)
        .map_err(|error| format!("internal error: {error}"))?;

    if cli.output == OutputFormat::Text {
        print!("{}", render::validation_text(&result));
    }

    if !result.valid {
        if cli.output == OutputFormat::Json {
            print_json(&result, None)?;
        }
        return Ok(ExitCode::from(1));
    }

    if !cli.create_beads {
        if cli.output == OutputFormat::Json {
            print_json(&result, None)?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    create_issues(cli, mode, &result)
}

fn create_issues(cli: &Cli, mode: Mode, result: &ValidationResult) -> Result<ExitCode, String> {
    let graph = result
        .graph()
        .ok_or_else(|| "internal error: validation passed but no parsed graph is available".to_string())?;
    let config = TrackerConfig::from_env().map_err(|error| error.to_string())?;

    let mut builder = CommandBuilder::new(config.clone()).with_source_name(&cli.input);
    if let Some(title) = &cli.epic_title {
        builder = builder.with_epic_title(title);
    }
    let commands = builder
        .build(graph, mode)
        .map_err(|error| format!("building commands: {error}"))?;

    if cli.dry_run {
        let preview = render::dry_run_text(&config.program, &commands);
        match cli.output {
            OutputFormat::Text => print!("{preview}"),
            OutputFormat::Json => {
                eprint!("{preview}");
                print_json(result, None)?;
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut executor = Executor::new(ProcessBackend::from_config(&config));
    match executor.execute(&commands) {
        Ok(creation) => {
            match cli.output {
                OutputFormat::Text => print!("{}", render::creation_text(&creation)),
                OutputFormat::Json => print_json(result, Some(&creation))?,
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            if cli.output == OutputFormat::Text {
                if let Some(partial) = error.partial() {
                    print!("{}", render::creation_text(partial));
                }
            }
            Err(error.to_string())
        }
    }
}

fn print_json(
    result: &ValidationResult,
    creation: Option<&taskval_beads::CreationResult>,
) -> Result<(), String> {
    let report = render::json_report(result, creation)
        .map_err(|error| format!("serializing report: {error}"))?;
    println!("{report}");
    Ok(())
}

fn read_input(input: &str) -> Result<Vec<u8>, String> {
    if input == STDIN_INPUT {
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .map_err(|error| format!("reading stdin: {error}"))?;
        return Ok(data);
    }
    std::fs::read(input).map_err(|error| format!("reading file '{input}': {error}"))
}
