//! Script execution
//!
//! A script runs in two passes. The whole text is parsed first, so every
//! diagnostic is known before anything touches the application; the parsed
//! commands then execute strictly in file order against one
//! [`ScriptingContext`].

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::application::{Application, ObjectTable};
use crate::command::{CommandContext, CommandRegistry, ParsedCommand};
use crate::config::ScriptConfig;
use crate::diagnostics::Diagnostic;
use crate::error::{CmdError, CmdResult};
use crate::logger::CommandLogger;
use crate::parser::{ParsedScript, ScriptParser};
use crate::response::{CommandResponse, CommandStatus};
use crate::session::ScriptingContext;

/// Response of one executed command
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedCommand {
    /// Keyword as written in the script
    pub keyword: String,
    /// Line the command starts on
    pub line: usize,
    pub response: CommandResponse,
}

/// Everything a script run produced
#[derive(Debug, Clone, Default)]
pub struct ScriptOutcome {
    /// Parse-time warnings and errors, in source order
    pub diagnostics: Vec<Diagnostic>,
    /// One entry per executed command, in execution order
    pub responses: Vec<ExecutedCommand>,
    /// Number of commands the parser produced
    pub parsed: usize,
    /// Execution stopped before the last parsed command
    pub stopped_early: bool,
}

impl ScriptOutcome {
    pub fn parse_error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn failed_commands(&self) -> impl Iterator<Item = &ExecutedCommand> {
        self.responses.iter().filter(|r| r.response.is_error())
    }

    /// Whether parsing or any command failed
    pub fn has_errors(&self) -> bool {
        self.parse_error_count() > 0 || self.failed_commands().next().is_some()
    }

    /// Worst status among the executed commands
    pub fn status(&self) -> CommandStatus {
        self.responses
            .iter()
            .map(|r| r.response.status())
            .max()
            .unwrap_or(CommandStatus::Ok)
    }

    /// Human readable report: diagnostics, failed commands and totals
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for diag in &self.diagnostics {
            let _ = writeln!(out, "{}", diag);
        }
        for cmd in self.responses.iter().filter(|r| !r.response.is_ok()) {
            let _ = writeln!(out, "line {}: {}: {}", cmd.line, cmd.keyword, cmd.response);
        }

        let failed = self.failed_commands().count();
        let _ = write!(
            out,
            "{} of {} commands executed, {} failed, {} parse errors",
            self.responses.len(),
            self.parsed,
            failed,
            self.parse_error_count()
        );
        if self.stopped_early {
            out.push_str(" (stopped at first error)");
        }
        out
    }
}

/// Object lookups go through the application while parsing
struct AppObjects<'a>(&'a dyn Application);

impl ObjectTable for AppObjects<'_> {
    fn contains(&self, class: &str, id: u64) -> bool {
        self.0.contains(class, id)
    }
}

/// Runs scripts against an application
pub struct CommandExecutor {
    registry: CommandRegistry,
    config: ScriptConfig,
    session: ScriptingContext,
    logger: CommandLogger,
    quiet: bool,
}

impl CommandExecutor {
    pub fn new(registry: CommandRegistry) -> Self {
        Self {
            registry,
            config: ScriptConfig::default(),
            session: ScriptingContext::new(),
            logger: CommandLogger::new(),
            quiet: false,
        }
    }

    /// Executor with every built-in command registered
    pub fn with_builtins() -> CmdResult<Self> {
        Ok(Self::new(CommandRegistry::with_builtins()?))
    }

    /// Apply configuration; the session is rebuilt with its export folders
    pub fn with_config(mut self, config: ScriptConfig) -> Self {
        self.session = ScriptingContext::with_export_config(&config.export);
        self.config = config;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }

    pub fn session(&self) -> &ScriptingContext {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ScriptingContext {
        &mut self.session
    }

    pub fn logger_mut(&mut self) -> &mut CommandLogger {
        &mut self.logger
    }

    /// Parse a script without executing it
    pub fn parse(&self, script: &str, app: &dyn Application) -> ParsedScript {
        ScriptParser::new(&self.registry)
            .with_syntax(self.config.syntax.clone())
            .parse(script, &AppObjects(app))
    }

    /// Parse and execute a script
    pub fn execute_script(&mut self, app: &mut dyn Application, script: &str) -> ScriptOutcome {
        let parsed = self.parse(script, &*app);
        let mut outcome = ScriptOutcome {
            parsed: parsed.commands.len(),
            ..ScriptOutcome::default()
        };

        let parse_errors = parsed.error_count();
        outcome.diagnostics = parsed.diagnostics;
        if parse_errors > 0 {
            log::warn!("script has {} parse errors", parse_errors);
            if self.config.execution.skip_execution_on_parse_errors {
                log::warn!("execution skipped because of parse errors");
                outcome.stopped_early = outcome.parsed > 0;
                return outcome;
            }
        }

        let (responses, stopped_early) = self.execute_commands(app, &parsed.commands);
        outcome.responses = responses;
        outcome.stopped_early = stopped_early;
        outcome
    }

    /// Execute a script file
    ///
    /// Relative paths in the script resolve against the file's folder unless
    /// a start directory was already set.
    pub fn execute_file(&mut self, app: &mut dyn Application, path: &Path) -> CmdResult<ScriptOutcome> {
        let script = fs::read_to_string(path)
            .map_err(|e| CmdError::execution(format!("cannot read command file {}: {}", path.display(), e)))?;

        if self.session.start_dir().is_none() {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                self.session.set_start_dir(dir);
            }
        }

        log::info!("executing command file {}", path.display());
        Ok(self.execute_script(app, &script))
    }

    /// Execute parsed commands in order
    ///
    /// Returns the responses and whether execution stopped before the end.
    pub fn execute_commands(
        &mut self,
        app: &mut dyn Application,
        commands: &[ParsedCommand],
    ) -> (Vec<ExecutedCommand>, bool) {
        let mut responses = Vec::with_capacity(commands.len());

        for (index, cmd) in commands.iter().enumerate() {
            if self.config.execution.echo {
                log::info!("> {}", cmd.to_script());
            }

            let response = {
                let mut ctx = CommandContext::new(&mut *app, &mut self.session).with_quiet(self.quiet);
                cmd.execute(&mut ctx)
            };

            match response.status() {
                CommandStatus::Ok => log::debug!("line {}: {} OK", cmd.line(), cmd.keyword()),
                CommandStatus::Warning => {
                    log::warn!("line {}: {}: {}", cmd.line(), cmd.keyword(), response.message())
                }
                CommandStatus::Error => {
                    log::error!("line {}: {}: {}", cmd.line(), cmd.keyword(), response.message())
                }
            }
            self.logger.log(cmd, &response);

            let failed = response.is_error();
            responses.push(ExecutedCommand {
                keyword: cmd.keyword().to_string(),
                line: cmd.line(),
                response,
            });

            if failed && self.config.execution.stop_on_error {
                let stopped = index + 1 < commands.len();
                if stopped {
                    log::warn!("stopping after error on line {}", cmd.line());
                }
                return (responses, stopped);
            }
        }

        (responses, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessApplication;

    #[test]
    fn test_executes_in_order() {
        let mut executor = CommandExecutor::with_builtins().unwrap();
        let mut app = HeadlessApplication::new();
        let outcome = executor.execute_script(&mut app, "loadCase(\"a.egrid\")\nloadCase(\"b.egrid\")");

        assert!(!outcome.has_errors(), "{}", outcome.summary());
        assert_eq!(outcome.responses.len(), 2);
        assert_eq!(outcome.responses[1].line, 2);
        assert_eq!(app.case_ids(), vec![0, 1]);
    }

    #[test]
    fn test_stop_on_error() {
        let mut config = ScriptConfig::default();
        config.execution.stop_on_error = true;
        let mut executor = CommandExecutor::with_builtins().unwrap().with_config(config);
        let mut app = HeadlessApplication::new();

        let outcome = executor.execute_script(&mut app, "setTimeStep(caseId=4)\nloadCase(\"a.egrid\")");
        assert_eq!(outcome.responses.len(), 1);
        assert!(outcome.stopped_early);
        assert!(app.case_ids().is_empty());
        assert!(outcome.summary().contains("stopped at first error"));
    }

    #[test]
    fn test_skip_execution_on_parse_errors() {
        let mut config = ScriptConfig::default();
        config.execution.skip_execution_on_parse_errors = true;
        let mut executor = CommandExecutor::with_builtins().unwrap().with_config(config);
        let mut app = HeadlessApplication::new();

        let outcome = executor.execute_script(&mut app, "loadCase(\"a.egrid\")\nloadCase(path=[)");
        assert!(outcome.responses.is_empty());
        assert_eq!(outcome.parsed, 2);
        assert!(outcome.has_errors());
        assert!(app.case_ids().is_empty());
    }

    #[test]
    fn test_execute_file_sets_start_dir() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("batch.txt");
        fs::write(&script, "loadCase(\"grid.egrid\")\n").unwrap();

        let mut executor = CommandExecutor::with_builtins().unwrap();
        let mut app = HeadlessApplication::new();
        let outcome = executor.execute_file(&mut app, &script).unwrap();

        assert!(!outcome.has_errors(), "{}", outcome.summary());
        assert_eq!(executor.session().start_dir(), Some(dir.path()));
        assert_eq!(app.cases()[0].grid_file, dir.path().join("grid.egrid"));
    }

    #[test]
    fn test_missing_command_file() {
        let mut executor = CommandExecutor::with_builtins().unwrap();
        let mut app = HeadlessApplication::new();
        let err = executor
            .execute_file(&mut app, Path::new("/nonexistent/batch.txt"))
            .unwrap_err();
        assert!(matches!(err, CmdError::Execution(_)));
    }

    #[test]
    fn test_summary_counts() {
        let outcome = ScriptOutcome {
            parsed: 2,
            responses: vec![
                ExecutedCommand {
                    keyword: "loadCase".to_string(),
                    line: 1,
                    response: CommandResponse::ok(),
                },
                ExecutedCommand {
                    keyword: "replaceCase".to_string(),
                    line: 2,
                    response: CommandResponse::error("no case"),
                },
            ],
            ..ScriptOutcome::default()
        };
        assert_eq!(outcome.status(), CommandStatus::Error);
        let summary = outcome.summary();
        assert!(summary.contains("line 2: replaceCase: ERROR: no case"));
        assert!(summary.ends_with("2 of 2 commands executed, 1 failed, 0 parse errors"));
    }
}
