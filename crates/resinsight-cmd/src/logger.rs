//! Command logging for replay
//!
//! Records executed commands to a file. The plain format is itself a valid
//! command file; the JSON lines format also keeps each command's status.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::command::ParsedCommand;
use crate::error::CmdResult;
use crate::response::{CommandResponse, CommandStatus};

/// Log file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Command file syntax, one command per line
    #[default]
    CommandFile,
    /// One JSON record per line (.jsonl)
    JsonLines,
}

impl LogFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl") | Some("json") => LogFormat::JsonLines,
            _ => LogFormat::CommandFile,
        }
    }
}

#[derive(Serialize)]
struct LogRecord<'a> {
    line: usize,
    command: String,
    status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

/// Command logger for recording executed commands
#[derive(Debug, Default)]
pub struct CommandLogger {
    writer: Option<BufWriter<File>>,
    format: LogFormat,
}

impl CommandLogger {
    /// Create a new inactive logger
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a log file for writing, closing any previous one
    ///
    /// The format is detected from the extension: `.jsonl`/`.json` give JSON
    /// lines, anything else a replayable command file.
    pub fn log_open(&mut self, path: &Path) -> CmdResult {
        self.log_close()?;

        let format = LogFormat::from_extension(path);
        let mut writer = BufWriter::new(File::create(path)?);
        if format == LogFormat::CommandFile {
            writeln!(writer, "# command log")?;
        }

        self.writer = Some(writer);
        self.format = format;
        log::info!("logging commands to {} ({:?})", path.display(), format);
        Ok(())
    }

    /// Log an executed command
    ///
    /// Does nothing if logging is not active. Write failures are reported and
    /// otherwise ignored.
    pub fn log(&mut self, command: &ParsedCommand, response: &CommandResponse) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };

        let result = match self.format {
            LogFormat::CommandFile => writeln!(writer, "{}", command.to_script()),
            LogFormat::JsonLines => {
                let record = LogRecord {
                    line: command.line(),
                    command: command.to_script(),
                    status: response.status(),
                    message: Some(response.message()).filter(|m| !m.is_empty()),
                };
                serde_json::to_string(&record)
                    .map_err(std::io::Error::from)
                    .and_then(|json| writeln!(writer, "{}", json))
            }
        };

        if let Err(e) = result {
            log::warn!("failed to write to command log: {}", e);
        }
    }

    /// Flush and close the log file
    pub fn log_close(&mut self) -> CmdResult {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.writer.is_some()
    }
}

impl Drop for CommandLogger {
    fn drop(&mut self) {
        let _ = self.log_close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandRegistry;

    #[test]
    fn test_format_detection() {
        assert_eq!(LogFormat::from_extension(Path::new("run.jsonl")), LogFormat::JsonLines);
        assert_eq!(LogFormat::from_extension(Path::new("run.txt")), LogFormat::CommandFile);
        assert_eq!(LogFormat::from_extension(Path::new("run")), LogFormat::CommandFile);
    }

    #[test]
    fn test_command_file_log_is_replayable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replay.txt");
        let registry = CommandRegistry::with_builtins().unwrap();

        let mut cmd = registry.create("openProject").unwrap();
        cmd.args_mut().set("path", "a.rsp".into());

        let mut logger = CommandLogger::new();
        assert!(!logger.is_active());
        logger.log(&cmd, &CommandResponse::ok());
        logger.log_open(&path).unwrap();
        assert!(logger.is_active());
        logger.log(&cmd, &CommandResponse::ok());
        logger.log_close().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "# command log\nopenProject(path=\"a.rsp\")\n");
    }

    #[test]
    fn test_json_lines_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        let registry = CommandRegistry::with_builtins().unwrap();
        let cmd = registry.create("closeProject").unwrap().at_line(3);

        let mut logger = CommandLogger::new();
        logger.log_open(&path).unwrap();
        logger.log(&cmd, &CommandResponse::error("boom"));
        logger.log_close().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let record: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(record["line"], 3);
        assert_eq!(record["command"], "closeProject()");
        assert_eq!(record["status"], "Error");
        assert_eq!(record["message"], "boom");
    }
}
