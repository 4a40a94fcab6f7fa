//! Main CLI application

use crate::cli::logging::{init_logging, LogFormat, Verbosity};
use crate::config::{
    default_config_file, load_config_store, parse_task_file_auto, read_task_file,
    validate_task_file, TaskFile,
};
use crate::error::{ConfigError, DotrunError};
use crate::runner::{
    Application, Arguments, InputType, ShellExecutor, TaskDefinition, TaskName, TaskRegistry,
    Value,
};
use clap::{Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use colored::Colorize;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Long option names taken by global flags
const RESERVED_OPTIONS: &[&str] = &[
    "file",
    "config",
    "env",
    "set",
    "quiet",
    "silent",
    "verbose",
    "output",
    "list",
    "completions",
    "help",
    "version",
];

/// Id of the trailing positional arguments of a task
const ARGS_ID: &str = "args";

/// CLI application
pub struct App {
    /// The clap command
    command: Command,
    /// Parsed task file
    task_file: TaskFile,
    /// Task file path
    task_file_path: PathBuf,
    /// Tasks of the task file
    registry: TaskRegistry,
}

impl App {
    /// Create a new app from the task file found in the current or a parent directory
    pub fn new() -> Result<Self, DotrunError> {
        let (task_file, path) = parse_task_file_auto()?;
        App::build(task_file, path)
    }

    /// Create app with a specific task file
    pub fn with_task_file(path: PathBuf) -> Result<Self, DotrunError> {
        let task_file = read_task_file(&path)?;
        App::build(task_file, path)
    }

    fn build(task_file: TaskFile, task_file_path: PathBuf) -> Result<Self, DotrunError> {
        validate_task_file(&task_file)?;
        let registry = TaskRegistry::from_config(&task_file);
        let command = build_command(&task_file, &registry);

        Ok(App {
            command,
            task_file,
            task_file_path,
            registry,
        })
    }

    /// Run the application with command line arguments
    pub fn run<I, T>(mut self, args: I) -> Result<(), DotrunError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = self.command.clone().get_matches_from(args);

        // Handle global flags first
        let verbosity = get_verbosity(&matches);
        let format = matches
            .get_one::<String>("output")
            .map(|s| s.parse::<LogFormat>())
            .transpose()
            .map_err(ConfigError::Invalid)?
            .unwrap_or(LogFormat::Message);
        init_logging(verbosity, format);

        if let Some(shell) = matches.get_one::<Shell>("completions").copied() {
            let bin_name = self.command.get_name().to_string();
            clap_complete::generate(shell, &mut self.command, bin_name, &mut io::stdout());
            return Ok(());
        }

        if matches.get_flag("list") {
            print_task_list(&self.registry);
            return Ok(());
        }

        let Some((task_name, args, named)) = selected_task(&self.registry, &matches)? else {
            // No task specified, show help
            self.command.print_help()?;
            println!();
            return Ok(());
        };

        let working_dir = self
            .task_file_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        load_dotenv(&working_dir)?;

        let config_file = matches
            .get_one::<String>("config")
            .map(PathBuf::from)
            .or_else(|| default_config_file(&self.task_file_path));
        let env = matches.get_one::<String>("env").cloned().unwrap_or_default();
        let flags = matches
            .get_many::<String>("set")
            .map(|values| values.map(|v| parse_flag(v)).collect::<Result<Vec<_>, _>>())
            .transpose()?
            .unwrap_or_default();
        debug!(config = ?config_file, env = %env, "loading configuration");
        let config = load_config_store(config_file.as_deref(), &env, flags)?;

        let mut executor = ShellExecutor::new().with_working_dir(working_dir);
        if let Some(interpreter) = &self.task_file.interpreter {
            executor = executor.with_interpreter(interpreter.clone());
        }

        let application = Application::new(self.registry)
            .with_name(self.command.get_name())
            .with_env(&env)
            .with_command_path(&self.task_file_path.display().to_string())
            .with_config(config)
            .with_executor(Box::new(executor));

        let output = application.run_task(&task_name, &args, &named, &Value::object(), None)?;
        if !output.is_empty() && verbosity > Verbosity::Silent {
            println!("{}", output);
        }

        Ok(())
    }
}

/// Build the clap command from the task file
fn build_command(task_file: &TaskFile, registry: &TaskRegistry) -> Command {
    let mut cmd = Command::new(task_file.name.clone().unwrap_or_else(|| "dotrun".to_string()))
        .version(env!("CARGO_PKG_VERSION"))
        .about(
            task_file
                .usage
                .clone()
                .unwrap_or_else(|| "A hierarchical YAML task runner".to_string()),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .help("Path to dotrun.yml task file")
                .global(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to configuration file [default: dotrun.config.yml beside the task file]")
                .global(true),
        )
        .arg(
            Arg::new("env")
                .short('e')
                .long("env")
                .value_name("ENV")
                .help("Environment name; selects the configuration overlay and sets ${env}")
                .global(true),
        )
        .arg(
            Arg::new("set")
                .long("set")
                .value_name("KEY=VALUE")
                .help("Override a configuration value")
                .action(ArgAction::Append)
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print task output and errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .value_name("FORMAT")
                .value_parser(["text", "json", "message"])
                .help("Log format")
                .global(true),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .help("List available tasks")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("completions")
                .long("completions")
                .value_name("SHELL")
                .value_parser(clap::value_parser!(Shell))
                .help("Print a shell completion script"),
        );

    // Add subcommands for each task
    for task in registry.roots() {
        if let Some(task_cmd) = build_task_command(task, registry) {
            cmd = cmd.subcommand(task_cmd);
        }
    }

    cmd
}

/// Subcommand for a task and its children; `None` for private tasks
fn build_task_command(task: &TaskDefinition, registry: &TaskRegistry) -> Option<Command> {
    // Skip private tasks
    if task.private {
        return None;
    }

    let mut task_cmd = Command::new(task.name.leaf().to_string());
    if let Some(description) = &task.description {
        task_cmd = task_cmd.about(description.clone());
    }

    let mut taken: HashSet<&str> = RESERVED_OPTIONS.iter().copied().collect();
    for input in &task.inputs {
        if !taken.insert(input.name.as_str()) {
            continue;
        }

        let mut opt_def = Arg::new(option_id(&input.name))
            .long(input.name.clone())
            .value_name(input.short_name().to_uppercase())
            .help(
                input
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("Input: {} ({})", input.name, input.input_type)),
            );

        if input.short_name() != input.name && taken.insert(input.short_name()) {
            opt_def = opt_def.visible_alias(input.short_name().to_string());
        }

        // `--flag` alone means true
        if input.input_type == InputType::Boolean {
            opt_def = opt_def
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true");
        }

        task_cmd = task_cmd.arg(opt_def);
    }

    let children = registry.children(&task.name);
    if children.is_empty() {
        task_cmd = task_cmd.arg(
            Arg::new(ARGS_ID)
                .value_name("ARGS")
                .help("Positional arguments")
                .num_args(0..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true),
        );
    }

    for child in children {
        if let Some(child_cmd) = build_task_command(child, registry) {
            task_cmd = task_cmd.subcommand(child_cmd);
        }
    }

    Some(task_cmd)
}

fn option_id(input_name: &str) -> String {
    format!("input:{}", input_name)
}

/// The task selected by the subcommand path, with its positional and named arguments.
///
/// Options given at any level of the path are collected, so `build --tag v1 image`
/// supplies `tag` to the `build` namespace inherited by `build.image`.
fn selected_task(
    registry: &TaskRegistry,
    matches: &ArgMatches,
) -> Result<Option<(TaskName, Vec<String>, Arguments)>, DotrunError> {
    let mut path: Vec<String> = Vec::new();
    let mut args = Vec::new();
    let mut named = Arguments::new();
    let mut current = matches;

    while let Some((sub, sub_matches)) = current.subcommand() {
        path.push(sub.to_string());
        let task = registry.find_task(&TaskName::from_segments(path.iter().cloned()))?;

        for input in &task.inputs {
            if let Ok(Some(value)) = sub_matches.try_get_one::<String>(&option_id(&input.name)) {
                named.set(&input.name, value.clone());
            }
        }

        if let Ok(Some(values)) = sub_matches.try_get_many::<String>(ARGS_ID) {
            args = values.cloned().collect();
        }

        current = sub_matches;
    }

    if path.is_empty() {
        return Ok(None);
    }

    Ok(Some((TaskName::from_segments(path), args, named)))
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Split a `--set KEY=VALUE` argument
fn parse_flag(flag: &str) -> Result<(String, String), ConfigError> {
    match flag.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::Invalid(format!(
            "expected KEY=VALUE for --set, got '{}'",
            flag
        ))),
    }
}

/// Load `.env` from the task file's directory, if present
fn load_dotenv(dir: &Path) -> Result<(), ConfigError> {
    let path = dir.join(".env");
    if !path.is_file() {
        return Ok(());
    }
    dotenvy::from_path(&path).map_err(|e| ConfigError::ReadFile {
        path,
        error: e.to_string(),
    })
}

fn print_task_list(registry: &TaskRegistry) {
    println!("{}", "Available tasks:".bold());
    for task in registry.tasks().values().filter(|task| !task.private) {
        let depth = task.name.segments().len().saturating_sub(1);
        let description = task.description.clone().unwrap_or_default();
        println!(
            "{}{:<24} {}",
            "  ".repeat(depth + 1),
            task.name.short_string().cyan(),
            description.dimmed()
        );
    }
}

/// Run the CLI application with the process arguments
pub fn run() -> Result<(), DotrunError> {
    // Check if --file flag is provided first
    let args: Vec<String> = std::env::args().collect();
    let file_path = extract_file_arg(&args);

    let app = if let Some(path) = file_path {
        App::with_task_file(path)?
    } else {
        App::new()?
    };

    app.run(args)
}

/// Extract --file argument before clap parsing
fn extract_file_arg(args: &[String]) -> Option<PathBuf> {
    for i in 0..args.len() {
        if let Some(path) = args[i].strip_prefix("--file=") {
            return Some(PathBuf::from(path));
        }
        if (args[i] == "--file" || args[i] == "-f") && i + 1 < args.len() {
            return Some(PathBuf::from(&args[i + 1]));
        }
    }
    None
}
