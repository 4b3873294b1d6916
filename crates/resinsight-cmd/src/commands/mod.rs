//! Built-in command implementations
//!
//! Commands are grouped by what they act on: projects and cases, views and
//! snapshots, and file exports.

pub mod export;
pub mod project;
pub mod view;

use std::fs;
use std::path::{Path, PathBuf};

use crate::command::CommandRegistry;
use crate::error::{CmdError, CmdResult};
use crate::schema::CommandArgs;

/// Register all built-in commands with the registry
pub fn register_all(registry: &mut CommandRegistry) -> CmdResult {
    // Projects and cases
    project::register(registry)?;

    // Time steps and snapshots
    view::register(registry)?;

    // File exports
    export::register(registry)?;

    Ok(())
}

/// Case, view and group ids are `-1` for "the first one"
pub(crate) fn optional_id(id: i64) -> Option<u64> {
    u64::try_from(id).ok()
}

/// A string field that must not be empty
pub(crate) fn required_str<'a>(args: &'a CommandArgs, name: &str) -> CmdResult<&'a str> {
    match args.get_str(name) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(CmdError::MissingArgument(name.to_string())),
    }
}

/// A non-negative integer field
pub(crate) fn non_negative(args: &CommandArgs, name: &str) -> CmdResult<usize> {
    let value = args.get_int_or(name, 0);
    usize::try_from(value).map_err(|_| CmdError::invalid_arg(name, format!("{} is negative", value)))
}

/// Read a grid list file: one grid file per line
///
/// Blank lines and lines starting with `#` are skipped. Relative entries are
/// taken relative to the list file's folder.
pub(crate) fn read_grid_list(path: &Path) -> CmdResult<Vec<PathBuf>> {
    let text = fs::read_to_string(path)
        .map_err(|e| CmdError::execution(format!("cannot read grid list {}: {}", path.display(), e)))?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    let files: Vec<PathBuf> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| base.join(l))
        .collect();

    if files.is_empty() {
        return Err(CmdError::execution(format!("grid list {} is empty", path.display())));
    }
    Ok(files)
}
