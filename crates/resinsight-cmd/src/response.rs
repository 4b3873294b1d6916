//! Outcome of executing one command

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CmdError;

/// Status of an executed command, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CommandStatus {
    Ok,
    /// Succeeded with a caveat
    Warning,
    /// Failed outright
    Error,
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandStatus::Ok => write!(f, "OK"),
            CommandStatus::Warning => write!(f, "WARNING"),
            CommandStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Result payload of a command
///
/// Owned by whoever takes it out of the response; it is not kept between
/// command invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ResultObject {
    /// A case was created
    Case { case_id: u64 },
    /// Files written by an export
    Files { paths: Vec<PathBuf> },
}

/// Status, message and optional payload of one command execution
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResponse {
    status: CommandStatus,
    message: String,
    result: Option<ResultObject>,
}

impl Default for CommandResponse {
    fn default() -> Self {
        Self::ok()
    }
}

impl CommandResponse {
    pub fn ok() -> Self {
        Self {
            status: CommandStatus::Ok,
            message: String::new(),
            result: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::ok().with_status(CommandStatus::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::ok().with_status(CommandStatus::Error, message)
    }

    pub fn with_result(mut self, result: ResultObject) -> Self {
        self.result = Some(result);
        self
    }

    fn with_status(mut self, status: CommandStatus, message: impl Into<String>) -> Self {
        self.update_status(status, message);
        self
    }

    /// Raise the status to `status` if it is more severe and append the
    /// message
    pub fn update_status(&mut self, status: CommandStatus, message: impl Into<String>) {
        self.status = self.status.max(status);
        let message = message.into();
        if message.is_empty() {
            return;
        }
        if !self.message.is_empty() {
            self.message.push_str("; ");
        }
        self.message.push_str(&message);
    }

    pub fn status(&self) -> CommandStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn result(&self) -> Option<&ResultObject> {
        self.result.as_ref()
    }

    /// Move the payload out of the response
    pub fn take_result(&mut self) -> Option<ResultObject> {
        self.result.take()
    }

    pub fn is_ok(&self) -> bool {
        self.status == CommandStatus::Ok
    }

    pub fn is_error(&self) -> bool {
        self.status == CommandStatus::Error
    }
}

impl From<CmdError> for CommandResponse {
    fn from(err: CmdError) -> Self {
        CommandResponse::error(err.to_string())
    }
}

impl fmt::Display for CommandResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.status)
        } else {
            write!(f, "{}: {}", self.status, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_keeps_most_severe() {
        let mut response = CommandResponse::ok();
        response.update_status(CommandStatus::Warning, "well A not found");
        response.update_status(CommandStatus::Ok, "");
        assert_eq!(response.status(), CommandStatus::Warning);

        response.update_status(CommandStatus::Error, "folder not creatable");
        response.update_status(CommandStatus::Warning, "well B not found");
        assert_eq!(response.status(), CommandStatus::Error);
        assert_eq!(
            response.message(),
            "well A not found; folder not creatable; well B not found"
        );
    }

    #[test]
    fn test_take_result() {
        let mut response = CommandResponse::ok().with_result(ResultObject::Case { case_id: 2 });
        assert_eq!(response.take_result(), Some(ResultObject::Case { case_id: 2 }));
        assert!(response.result().is_none());
    }

    #[test]
    fn test_from_error() {
        let response = CommandResponse::from(CmdError::not_found("case 4"));
        assert!(response.is_error());
        assert_eq!(response.to_string(), "ERROR: object not found: case 4");
    }

    #[test]
    fn test_result_serializes_with_tag() {
        let json = serde_json::to_string(&ResultObject::Case { case_id: 1 }).unwrap();
        assert_eq!(json, r#"{"type":"case","case_id":1}"#);
    }
}
