//! ResInsight Command File Engine
//!
//! This crate reads batch command files, turns them into typed command
//! instances, and executes them in order against a host application.
//!
//! # Overview
//!
//! A command file is a sequence of keyword calls:
//!
//! ```text
//! # comments start with '#'
//! openProject("/data/field.rsp")
//! setExportFolder(type=SNAPSHOTS, path="out/images", createFolder=true)
//! replaceCase(newGridFile="R1.EGRID", caseId=0) ; exportSnapshots()
//! ```
//!
//! Parsing is best effort: every problem is reported with its line number and
//! the parser carries on, so one run reports everything wrong with a file.
//!
//! # Example
//!
//! ```rust
//! use resinsight_cmd::{CommandExecutor, HeadlessApplication};
//!
//! let mut app = HeadlessApplication::new();
//! let mut executor = CommandExecutor::with_builtins().unwrap();
//!
//! let outcome = executor.execute_script(&mut app, "loadCase(\"BASE.EGRID\")");
//! assert!(!outcome.has_errors());
//! ```
//!
//! # Architecture
//!
//! - **DiagnosticsCollector**: line-counting cursor that accumulates warnings and errors
//! - **marshal**: text encoding and decoding of argument values
//! - **CommandRegistry**: maps keywords to command implementations
//! - **ScriptParser**: reads a whole file into `ParsedCommand`s
//! - **CommandExecutor**: runs parsed commands against an `Application`
//! - **ScriptingContext**: export folders, open project and start directory of a session
//! - **CommandLogger**: records executed commands for replay

mod application;
mod command;
pub mod commands;
mod config;
mod diagnostics;
mod error;
mod executor;
mod headless;
mod logger;
pub mod marshal;
mod parser;
mod response;
mod schema;
mod session;
mod value;

// Re-export main types
pub use application::{
    Application, LgrExport, NoObjects, ObjectTable, PropertyExport, SnapshotKind, SnapshotRequest,
    VisibleCellsExport, WellPathExport, WellPathExportReport,
};
pub use command::{Command, CommandContext, CommandRegistry, ParsedCommand};
pub use config::{ArgumentSeparator, ExecutionConfig, ExportConfig, ScriptConfig, SyntaxConfig};
pub use diagnostics::{Diagnostic, DiagnosticsCollector, Severity};
pub use error::{CmdError, CmdResult, ParseError};
pub use executor::{CommandExecutor, ExecutedCommand, ScriptOutcome};
pub use headless::{CaseGroupInfo, CaseInfo, HeadlessApplication, ProjectManifest, ViewInfo, WellPathInfo};
pub use logger::{CommandLogger, LogFormat};
pub use parser::{ParsedScript, ScriptParser};
pub use response::{CommandResponse, CommandStatus, ResultObject};
pub use schema::{CommandArgs, FieldDef, FieldDefault};
pub use session::{ExportKind, ExportPathTable, ScriptingContext, EXPORT_KIND};
pub use value::{EnumDef, ObjectRef, Value, ValueType};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::application::{Application, ObjectTable};
    pub use crate::command::{Command, CommandContext, CommandRegistry, ParsedCommand};
    pub use crate::error::{CmdError, CmdResult};
    pub use crate::executor::{CommandExecutor, ScriptOutcome};
    pub use crate::response::{CommandResponse, CommandStatus, ResultObject};
    pub use crate::schema::{CommandArgs, FieldDef, FieldDefault};
    pub use crate::value::{Value, ValueType};
}
