//! Per-session scripting state
//!
//! [`ScriptingContext`] owns what used to be process-wide state: the export
//! path table, the last opened project and the start directory. It is
//! created by the host, handed to the executor, and reset whenever a script
//! opens a project.

use std::fmt;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::application::Application;
use crate::config::ExportConfig;
use crate::error::{CmdError, CmdResult};
use crate::value::EnumDef;

/// Category of exported files with its own output folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// Read by the host's completion exporters; no built-in command writes it
    Completions,
    Snapshots,
    Properties,
    /// Read by the host's statistics exporters; no built-in command writes it
    Statistics,
    WellPaths,
    Cells,
    Lgrs,
}

/// Script names of [`ExportKind`]
pub const EXPORT_KIND: EnumDef = EnumDef::new(
    "ExportType",
    &[
        "COMPLETIONS",
        "SNAPSHOTS",
        "PROPERTIES",
        "STATISTICS",
        "WELLPATHS",
        "CELLS",
        "LGRS",
    ],
);

impl ExportKind {
    pub const ALL: [ExportKind; 7] = [
        ExportKind::Completions,
        ExportKind::Snapshots,
        ExportKind::Properties,
        ExportKind::Statistics,
        ExportKind::WellPaths,
        ExportKind::Cells,
        ExportKind::Lgrs,
    ];

    /// Name used in scripts
    pub fn script_name(&self) -> &'static str {
        match self {
            ExportKind::Completions => "COMPLETIONS",
            ExportKind::Snapshots => "SNAPSHOTS",
            ExportKind::Properties => "PROPERTIES",
            ExportKind::Statistics => "STATISTICS",
            ExportKind::WellPaths => "WELLPATHS",
            ExportKind::Cells => "CELLS",
            ExportKind::Lgrs => "LGRS",
        }
    }

    pub fn from_script_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.script_name() == name)
    }

    /// Folder used below the project directory when no export path is set
    pub fn default_folder(&self) -> &'static str {
        match self {
            ExportKind::Completions => "completions",
            ExportKind::Snapshots => "snapshots",
            ExportKind::Properties => "properties",
            ExportKind::Statistics => "statistics",
            ExportKind::WellPaths => "wellpaths",
            ExportKind::Cells => "cells",
            ExportKind::Lgrs => "lgrs",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.script_name())
    }
}

/// Last configured output folder per export kind
///
/// A miss is not an error; callers fall back to a derived folder.
#[derive(Debug, Clone, Default)]
pub struct ExportPathTable {
    paths: AHashMap<ExportKind, PathBuf>,
}

impl ExportPathTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the folder for `kind`, replacing any previous one
    pub fn set(&mut self, kind: ExportKind, path: impl Into<PathBuf>) {
        self.paths.insert(kind, path.into());
    }

    pub fn get(&self, kind: ExportKind) -> Option<&Path> {
        self.paths.get(&kind).map(PathBuf::as_path)
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Scripting state shared by the commands of one session
#[derive(Debug, Clone, Default)]
pub struct ScriptingContext {
    export_paths: ExportPathTable,
    last_project: Option<PathBuf>,
    start_dir: Option<PathBuf>,
    /// Overrides of [`ExportKind::default_folder`]
    fallback_folders: AHashMap<ExportKind, String>,
}

impl ScriptingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context using the fallback folder names from configuration
    pub fn with_export_config(config: &ExportConfig) -> Self {
        let mut ctx = Self::new();
        for (kind, folder) in &config.default_folders {
            ctx.fallback_folders.insert(*kind, folder.clone());
        }
        ctx
    }

    pub fn export_paths(&self) -> &ExportPathTable {
        &self.export_paths
    }

    pub fn set_export_path(&mut self, kind: ExportKind, path: impl Into<PathBuf>) {
        self.export_paths.set(kind, path);
    }

    pub fn export_path(&self, kind: ExportKind) -> Option<&Path> {
        self.export_paths.get(kind)
    }

    /// Project opened by the last successful `openProject`
    pub fn last_project(&self) -> Option<&Path> {
        self.last_project.as_deref()
    }

    /// Start a new session for `project`: export paths set for the previous
    /// project are forgotten
    pub fn reset_for_project(&mut self, project: impl Into<PathBuf>) {
        let project = project.into();
        log::debug!("scripting session reset for project {}", project.display());
        self.export_paths.clear();
        self.last_project = Some(project);
    }

    pub fn project_closed(&mut self) {
        self.last_project = None;
    }

    /// The open project, or an error naming `keyword` as the command that
    /// needed it
    pub fn require_project(&self, keyword: &str) -> CmdResult<&Path> {
        self.last_project()
            .ok_or_else(|| CmdError::ProjectNotOpen(keyword.to_string()))
    }

    pub fn start_dir(&self) -> Option<&Path> {
        self.start_dir.as_deref()
    }

    pub fn set_start_dir(&mut self, dir: impl Into<PathBuf>) {
        self.start_dir = Some(dir.into());
    }

    /// Resolve a script path relative to the start directory
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.start_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn fallback_folder(&self, kind: ExportKind) -> &str {
        self.fallback_folders
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_folder())
    }

    /// Folder an export of `kind` writes to
    ///
    /// The configured export path wins; otherwise the kind's fallback folder
    /// below the project directory, the start directory, or the working
    /// directory, in that order.
    pub fn resolve_export_folder(&self, kind: ExportKind, app: &dyn Application) -> PathBuf {
        if let Some(path) = self.export_paths.get(kind) {
            return path.to_path_buf();
        }

        let folder = self.fallback_folder(kind);
        let base = app
            .project_path()
            .or(self.last_project.as_deref())
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .or(self.start_dir.as_deref());

        match base {
            Some(base) => base.join(folder),
            None => PathBuf::from(folder),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessApplication;

    #[test]
    fn test_export_kind_names_match_enum_table() {
        for kind in ExportKind::ALL {
            assert_eq!(EXPORT_KIND.resolve(kind.script_name()), Some(kind.script_name()));
            assert_eq!(ExportKind::from_script_name(kind.script_name()), Some(kind));
        }
        assert_eq!(ExportKind::from_script_name("snapshots"), None);
    }

    #[test]
    fn test_table_get_miss_is_empty() {
        let mut table = ExportPathTable::new();
        assert!(table.get(ExportKind::Cells).is_none());
        table.set(ExportKind::Cells, "/out/cells");
        table.set(ExportKind::Cells, "/out/cells2");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(ExportKind::Cells), Some(Path::new("/out/cells2")));
    }

    #[test]
    fn test_reset_for_project_clears_export_paths() {
        let mut ctx = ScriptingContext::new();
        ctx.set_export_path(ExportKind::Snapshots, "/tmp/snaps");
        ctx.reset_for_project("/data/model.rsp");
        assert!(ctx.export_path(ExportKind::Snapshots).is_none());
        assert_eq!(ctx.last_project(), Some(Path::new("/data/model.rsp")));

        ctx.project_closed();
        assert!(ctx.require_project("replaceCase").is_err());
    }

    #[test]
    fn test_resolve_export_folder_fallbacks() {
        let app = HeadlessApplication::new();
        let mut ctx = ScriptingContext::new();
        assert_eq!(
            ctx.resolve_export_folder(ExportKind::Snapshots, &app),
            PathBuf::from("snapshots")
        );

        ctx.set_start_dir("/work");
        assert_eq!(
            ctx.resolve_export_folder(ExportKind::Lgrs, &app),
            PathBuf::from("/work/lgrs")
        );

        ctx.reset_for_project("/data/model.rsp");
        assert_eq!(
            ctx.resolve_export_folder(ExportKind::WellPaths, &app),
            PathBuf::from("/data/wellpaths")
        );

        ctx.set_export_path(ExportKind::WellPaths, "/explicit");
        assert_eq!(
            ctx.resolve_export_folder(ExportKind::WellPaths, &app),
            PathBuf::from("/explicit")
        );
    }

    #[test]
    fn test_configured_fallback_folder() {
        let mut config = ExportConfig::default();
        config
            .default_folders
            .insert(ExportKind::Snapshots, "images".to_string());
        let ctx = ScriptingContext::with_export_config(&config);
        let app = HeadlessApplication::new();
        assert_eq!(
            ctx.resolve_export_folder(ExportKind::Snapshots, &app),
            PathBuf::from("images")
        );
    }

    #[test]
    fn test_resolve_path() {
        let mut ctx = ScriptingContext::new();
        assert_eq!(ctx.resolve_path("a.rsp"), PathBuf::from("a.rsp"));
        ctx.set_start_dir("/work");
        assert_eq!(ctx.resolve_path("a.rsp"), PathBuf::from("/work/a.rsp"));
        assert_eq!(ctx.resolve_path("/abs/a.rsp"), PathBuf::from("/abs/a.rsp"));
    }
}
