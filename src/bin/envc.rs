use std::ffi::OsString;
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, ExitCode};

use clap::{Args, Parser, Subcommand};
use envc::{EnvLoader, Error, ParseOptions, SubstitutionMode, to_dotenv_string};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILE: &str = ".env";

#[derive(Debug, Parser)]
#[command(name = "envc", version, about = "Resolve dotenv files and run commands with them")]
struct Cli {
    /// Print loader diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the resolved variables as KEY=value lines
    Print {
        #[command(flatten)]
        load: LoadArgs,

        /// Resolve variable references against the current environment
        #[arg(long)]
        system_env: bool,
    },
    /// Load dotenv files and execute a command
    Run {
        #[command(flatten)]
        load: LoadArgs,

        /// Let dotenv values replace variables already in the environment
        #[arg(short = 'o', long = "override")]
        override_existing: bool,

        /// Command to run, followed by its arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<OsString>,
    },
}

#[derive(Debug, Args)]
struct LoadArgs {
    /// Dotenv file path(s). Repeat or pass comma-separated paths
    #[arg(short, long = "file", value_delimiter = ',', default_value = DEFAULT_FILE)]
    files: Vec<PathBuf>,

    /// Skip dotenv files that do not exist
    #[arg(short, long, visible_alias = "ignore-missing")]
    ignore: bool,

    /// Coerce true/false values to booleans
    #[arg(long)]
    booleans: bool,

    /// Coerce numeric values to numbers
    #[arg(long)]
    numbers: bool,

    /// Keep values literal: no escapes, no $VAR expansion
    #[arg(long)]
    no_expand: bool,
}

impl LoadArgs {
    fn loader(&self, inherit_process_env: bool) -> EnvLoader {
        let substitution_mode = if self.no_expand {
            SubstitutionMode::Disabled
        } else {
            SubstitutionMode::Expand
        };
        let options = ParseOptions::new()
            .booleans(self.booleans)
            .numbers(self.numbers)
            .substitution_mode(substitution_mode);

        EnvLoader::new()
            .paths(&self.files)
            .required(!self.ignore)
            .inherit_process_env(inherit_process_env)
            .options(options)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<ExitCode, String> {
    match command {
        Commands::Print { load, system_env } => {
            let mut loader = load.loader(system_env);
            loader.load().map_err(format_loader_error)?;
            print!("{}", to_dotenv_string(&loader.assigned_env()));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run {
            load,
            override_existing,
            command,
        } => execute_run(&load, override_existing, &command),
    }
}

fn execute_run(
    load: &LoadArgs,
    override_existing: bool,
    command_line: &[OsString],
) -> Result<ExitCode, String> {
    let Some((program, args)) = command_line.split_first() else {
        return Err("envc: missing command after `run`".to_owned());
    };

    let mut loader = load.loader(true);
    loader.load().map_err(format_loader_error)?;

    let mut command = Command::new(program);
    command.args(args);
    for (key, value) in loader.assigned_env() {
        if !override_existing && std::env::var_os(&key).is_some() {
            continue;
        }
        command.env(key, value.to_string());
    }

    execute_command(command, program)
}

#[cfg(unix)]
fn execute_command(mut command: Command, program: &OsString) -> Result<ExitCode, String> {
    let err = command.exec();
    Err(format!(
        "envc: failed to execute `{}`: {err}",
        program.to_string_lossy()
    ))
}

#[cfg(not(unix))]
fn execute_command(mut command: Command, program: &OsString) -> Result<ExitCode, String> {
    let status = command.status().map_err(|err| {
        format!(
            "envc: failed to execute `{}`: {err}",
            program.to_string_lossy()
        )
    })?;
    let code = status.code().unwrap_or(1);
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}

fn format_loader_error(err: Error) -> String {
    match err {
        Error::Parse(parse_err) => parse_err.to_string(),
        other => format!("envc: {other}"),
    }
}
