//! Error types for the command system
//!
//! `CmdError` covers registration and execution failures. `ParseError` is the
//! token-level failure reported by the value marshaller; it is always turned
//! into a diagnostic and never aborts a parse pass.

use thiserror::Error;

/// Result type for command operations
pub type CmdResult<T = ()> = Result<T, CmdError>;

/// Errors that can occur while registering or executing commands
#[derive(Debug, Error)]
pub enum CmdError {
    /// Command not found in registry
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A keyword or alias was registered twice
    #[error("command keyword registered twice: {0}")]
    DuplicateCommand(String),

    /// Invalid argument provided
    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    /// Missing required argument
    #[error("missing required argument: {0}")]
    MissingArgument(String),

    /// Referenced case, view or well path does not exist
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// Command needs a project opened by an earlier `openProject`
    #[error("no project is open: '{0}' requires a preceding openProject command")]
    ProjectNotOpen(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be read or written
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic execution error
    #[error("{0}")]
    Execution(String),
}

/// Token-level errors produced while decoding an argument value
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Unexpected end of input
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// String value without opening quote
    #[error("string is missing opening '\"'")]
    MissingOpeningQuote,

    /// String value without closing quote
    #[error("string is missing closing '\"'")]
    MissingClosingQuote,

    /// Array value without `[`
    #[error("array is missing start '['")]
    MissingArrayStart,

    /// Array value without `]`
    #[error("array is missing end ']'")]
    MissingArrayEnd,

    /// Numeric token could not be read
    #[error("invalid number: '{0}'")]
    InvalidNumber(String),

    /// Token is neither `true` nor `false`
    #[error("invalid boolean: '{0}', expected true or false")]
    InvalidBool(String),

    /// Identifier is not part of the enum's name table
    #[error("unknown value '{value}' for {enum_name}")]
    UnknownEnumValue { enum_name: String, value: String },

    /// Object reference not of the form `Class:id`
    #[error("malformed object reference: '{0}', expected Class:id")]
    MalformedObjectRef(String),

    /// Object reference names a different class than the field expects
    #[error("object reference '{found}' does not refer to a {expected}")]
    WrongObjectClass { expected: String, found: String },
}

impl CmdError {
    /// Create an invalid argument error
    pub fn invalid_arg(name: impl Into<String>, reason: impl Into<String>) -> Self {
        CmdError::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an object-not-found error
    pub fn not_found(what: impl Into<String>) -> Self {
        CmdError::ObjectNotFound(what.into())
    }

    /// Create an execution error
    pub fn execution(msg: impl Into<String>) -> Self {
        CmdError::Execution(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CmdError::UnknownCommand("foo".to_string());
        assert_eq!(format!("{}", err), "unknown command: foo");

        let err = CmdError::invalid_arg("caseId", "must be positive");
        assert_eq!(
            format!("{}", err),
            "invalid argument 'caseId': must be positive"
        );
    }

    #[test]
    fn test_project_not_open_names_prerequisite() {
        let err = CmdError::ProjectNotOpen("replaceCase".to_string());
        let text = err.to_string();
        assert!(text.contains("replaceCase"));
        assert!(text.contains("openProject"));
    }

    #[test]
    fn test_parse_error() {
        let err = ParseError::UnknownEnumValue {
            enum_name: "ExportKind".to_string(),
            value: "FOO".to_string(),
        };
        assert_eq!(format!("{}", err), "unknown value 'FOO' for ExportKind");
    }
}
