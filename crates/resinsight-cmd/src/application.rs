//! Interface to the application the commands act on
//!
//! The engine never touches grids, views or files itself. Every built-in
//! command calls out through [`Application`], which the embedding host
//! implements (see [`crate::HeadlessApplication`] for an in-memory one).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CmdResult;

/// Id table used to resolve `Class:id` object references
pub trait ObjectTable {
    /// Whether an object of `class` with `id` is currently known
    fn contains(&self, class: &str, id: u64) -> bool;
}

/// Object table that knows no objects
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObjects;

impl ObjectTable for NoObjects {
    fn contains(&self, _class: &str, _id: u64) -> bool {
        false
    }
}

/// Which windows `exportSnapshots` captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotKind {
    Views,
    Plots,
    All,
}

impl SnapshotKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "VIEWS" => Some(SnapshotKind::Views),
            "PLOTS" => Some(SnapshotKind::Plots),
            "ALL" => Some(SnapshotKind::All),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRequest {
    pub kind: SnapshotKind,
    pub prefix: String,
    /// Restrict to views of this case
    pub case_id: Option<u64>,
    /// Restrict to these views; empty means all
    pub view_ids: Vec<u64>,
    pub folder: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyExport {
    pub case_id: Option<u64>,
    pub time_step: usize,
    pub property: String,
    pub eclipse_keyword: String,
    pub undefined_value: f64,
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WellPathExport {
    /// Names to export; empty means every well path
    pub names: Vec<String>,
    pub md_step_size: f64,
    pub folder: PathBuf,
}

/// Outcome of a well path export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WellPathExportReport {
    pub files: Vec<PathBuf>,
    /// Requested names that matched no well path
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisibleCellsExport {
    pub view_id: u64,
    pub keyword: String,
    pub visible_active_value: i64,
    pub hidden_active_value: i64,
    pub inactive_value: i64,
    pub folder: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LgrExport {
    pub case_id: Option<u64>,
    pub time_step: usize,
    pub well_path_names: Vec<String>,
    pub refinement: [u32; 3],
    pub folder: PathBuf,
}

/// Operations the built-in commands need from the host application
///
/// Case ids of `None` select the first case of the project.
pub trait Application: ObjectTable {
    /// Load a project file, replacing whatever was open
    fn open_project(&mut self, path: &Path) -> CmdResult;

    fn close_project(&mut self);

    /// File of the currently open project
    fn project_path(&self) -> Option<&Path>;

    /// Load a grid file as a new case and return its id
    fn load_case(&mut self, grid_file: &Path) -> CmdResult<u64>;

    /// Point an existing case at a different grid file
    fn replace_case(&mut self, case_id: Option<u64>, grid_file: &Path) -> CmdResult;

    /// Replace the source cases of a case group
    fn replace_source_cases(&mut self, case_group_id: Option<u64>, grid_files: &[PathBuf]) -> CmdResult;

    fn case_ids(&self) -> Vec<u64>;

    fn set_time_step(&mut self, case_id: Option<u64>, time_step: usize) -> CmdResult;

    fn export_snapshots(&mut self, request: &SnapshotRequest) -> CmdResult<Vec<PathBuf>>;

    fn export_property(&mut self, request: &PropertyExport) -> CmdResult<PathBuf>;

    fn export_well_paths(&mut self, request: &WellPathExport) -> CmdResult<WellPathExportReport>;

    fn export_visible_cells(&mut self, request: &VisibleCellsExport) -> CmdResult<PathBuf>;

    fn export_lgrs(&mut self, request: &LgrExport) -> CmdResult<Vec<PathBuf>>;
}
