//! ResInsight command file runner
//!
//! Run with:
//! ```bash
//! cargo run -p resinsight-cli -- run batch.txt
//! cargo run -p resinsight-cli -- run batch.txt --lint
//! cargo run -p resinsight-cli -- shell
//! cargo run -p resinsight-cli -- commands exportSnapshots
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use resinsight_cmd::{
    CmdError, CmdResult, CommandExecutor, CommandRegistry, HeadlessApplication, ResultObject, ScriptConfig, ScriptOutcome,
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

#[derive(Parser)]
#[command(name = "resinsight-cmd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run ResInsight command files", long_about = None)]
struct Cli {
    /// Log every command and session change
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Engine configuration (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a command file
    Run {
        /// Command file to execute
        script: PathBuf,

        /// Stop after the first command that fails
        #[arg(long)]
        stop_on_error: bool,

        /// Only parse the file and report its diagnostics
        #[arg(long)]
        lint: bool,

        /// Record executed commands (`.jsonl` for JSON lines)
        #[arg(long)]
        log: Option<PathBuf>,

        /// Do not check that project and grid files exist
        #[arg(long)]
        no_file_checks: bool,
    },

    /// Read commands interactively
    Shell {
        /// Record executed commands (`.jsonl` for JSON lines)
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// List the available commands, or show help for one
    Commands {
        /// Command to describe
        name: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Run {
            script,
            stop_on_error,
            lint,
            log,
            no_file_checks,
        } => load_config(cli.config.as_deref()).and_then(|mut config| {
            config.execution.stop_on_error |= stop_on_error;
            run_script(&script, config, lint, log.as_deref(), !no_file_checks)
        }),
        Commands::Shell { log } => load_config(cli.config.as_deref()).and_then(|config| shell(config, log.as_deref())),
        Commands::Commands { name } => list_commands(name.as_deref()),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> CmdResult<ScriptConfig> {
    match path {
        Some(path) => ScriptConfig::load(path),
        None => Ok(ScriptConfig::default()),
    }
}

fn new_executor(config: ScriptConfig, log: Option<&Path>) -> CmdResult<CommandExecutor> {
    let mut executor = CommandExecutor::with_builtins()?.with_config(config);
    if let Some(path) = log {
        executor.logger_mut().log_open(path)?;
    }
    Ok(executor)
}

/// Returns `false` when the file had parse errors or a command failed
fn run_script(
    script: &Path,
    config: ScriptConfig,
    lint: bool,
    log: Option<&Path>,
    check_files: bool,
) -> CmdResult<bool> {
    let mut app = HeadlessApplication::new().with_file_checks(check_files);

    if lint {
        let executor = new_executor(config, None)?;
        let text = std::fs::read_to_string(script)?;
        let parsed = executor.parse(&text, &app);
        for diag in &parsed.diagnostics {
            println!("{}", diag);
        }
        println!(
            "{} commands, {} errors, {} warnings",
            parsed.commands.len(),
            parsed.error_count(),
            parsed.warning_count()
        );
        return Ok(!parsed.has_errors());
    }

    let mut executor = new_executor(config, log)?;
    let outcome = executor.execute_file(&mut app, script)?;
    executor.logger_mut().log_close()?;

    println!("{}", outcome.summary());
    Ok(!outcome.has_errors())
}

fn shell(config: ScriptConfig, log: Option<&Path>) -> CmdResult<bool> {
    let mut executor = new_executor(config, log)?;
    let mut app = HeadlessApplication::new();
    let mut rl = DefaultEditor::new().map_err(|e| CmdError::execution(e.to_string()))?;

    println!("Type commands, 'help' to list them, 'help <command>' for details, 'quit' to exit.");
    loop {
        match rl.readline("ResInsight> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                match line.split_once(char::is_whitespace).unwrap_or((line, "")) {
                    ("quit" | "exit", _) => break,
                    ("help", name) => {
                        let name = name.trim();
                        if let Err(e) = list_commands((!name.is_empty()).then_some(name)) {
                            println!("{}", e);
                        }
                    }
                    _ => report(&mut executor.execute_script(&mut app, line)),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                log::error!("readline error: {}", e);
                break;
            }
        }
    }

    executor.logger_mut().log_close()?;
    Ok(true)
}

/// Print what one shell line produced
fn report(outcome: &mut ScriptOutcome) {
    for diag in &outcome.diagnostics {
        println!("{}", diag);
    }
    for executed in &mut outcome.responses {
        if !executed.response.is_ok() {
            println!("{}: {}", executed.keyword, executed.response);
        }
        if let Some(result) = executed.response.take_result() {
            print_result(&result);
        }
    }
}

fn print_result(result: &ResultObject) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{}", json),
        Err(e) => log::warn!("cannot show result: {}", e),
    }
}

fn list_commands(name: Option<&str>) -> CmdResult<bool> {
    let registry = CommandRegistry::with_builtins()?;

    if let Some(name) = name {
        return match registry.help(name) {
            Some(help) => {
                println!("{}", help);
                Ok(true)
            }
            None => Err(CmdError::UnknownCommand(name.to_string())),
        };
    }

    for name in registry.names() {
        let summary = registry
            .get(name)
            .map(|cmd| cmd.help().trim().lines().next().unwrap_or_default().to_string())
            .unwrap_or_default();
        println!("  {:<28}{}", name, summary);
    }
    Ok(true)
}
