//! In-memory application for batch runs and tests
//!
//! [`HeadlessApplication`] keeps cases, views, case groups and well paths in
//! memory and assigns each a small integer id per class. Exports produce
//! plain-text files describing what was exported, which is enough to drive
//! scripts end to end without a grid reader or renderer.
//!
//! A project file is either a JSON manifest:
//!
//! ```json
//! {
//!   "cases": ["grids/base.egrid"],
//!   "caseGroups": [["r1.egrid", "r2.egrid"]],
//!   "wellPaths": ["A-1", "B-2"]
//! }
//! ```
//!
//! or any other file, which opens as an empty project.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::application::{
    Application, LgrExport, ObjectTable, PropertyExport, SnapshotKind, SnapshotRequest,
    VisibleCellsExport, WellPathExport, WellPathExportReport,
};
use crate::error::{CmdError, CmdResult};

/// Contents of a project file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectManifest {
    /// Grid files loaded as cases, each with one view
    pub cases: Vec<PathBuf>,
    /// Source grid files of each case group
    pub case_groups: Vec<Vec<PathBuf>>,
    pub well_paths: Vec<String>,
}

impl ProjectManifest {
    pub fn from_json(text: &str) -> CmdResult<Self> {
        serde_json::from_str(text).map_err(|e| CmdError::execution(format!("invalid project manifest: {}", e)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseInfo {
    pub id: u64,
    pub grid_file: PathBuf,
    pub time_step: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewInfo {
    pub id: u64,
    pub case_id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseGroupInfo {
    pub id: u64,
    pub source_cases: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WellPathInfo {
    pub id: u64,
    pub name: String,
}

/// Application state held in memory
#[derive(Debug, Default)]
pub struct HeadlessApplication {
    project: Option<PathBuf>,
    cases: Vec<CaseInfo>,
    views: Vec<ViewInfo>,
    case_groups: Vec<CaseGroupInfo>,
    well_paths: Vec<WellPathInfo>,
    /// Next id per object class
    next_ids: AHashMap<&'static str, u64>,
    /// Projects served from memory instead of disk
    preset_projects: AHashMap<PathBuf, ProjectManifest>,
    /// Require grid and project files to exist
    check_files: bool,
    /// Files written by exports, in order
    written: Vec<PathBuf>,
}

impl HeadlessApplication {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `openProject`, `loadCase` and `replaceCase` on missing files
    pub fn with_file_checks(mut self, check: bool) -> Self {
        self.check_files = check;
        self
    }

    /// Serve `manifest` when `path` is opened, without touching the disk
    pub fn with_project(mut self, path: impl Into<PathBuf>, manifest: ProjectManifest) -> Self {
        self.preset_projects.insert(path.into(), manifest);
        self
    }

    fn next_id(&mut self, class: &'static str) -> u64 {
        let next = self.next_ids.entry(class).or_insert(0);
        let id = *next;
        *next += 1;
        id
    }

    /// Add a case with a default view and return the case id
    pub fn add_case(&mut self, grid_file: impl Into<PathBuf>) -> u64 {
        let id = self.next_id("Case");
        self.cases.push(CaseInfo {
            id,
            grid_file: grid_file.into(),
            time_step: 0,
        });
        self.add_view(id, format!("View {}", self.views.len() + 1));
        id
    }

    /// Add a view of `case_id` and return its id
    pub fn add_view(&mut self, case_id: u64, name: impl Into<String>) -> u64 {
        let id = self.next_id("View");
        self.views.push(ViewInfo {
            id,
            case_id,
            name: name.into(),
        });
        id
    }

    pub fn add_case_group(&mut self, source_cases: Vec<PathBuf>) -> u64 {
        let id = self.next_id("CaseGroup");
        self.case_groups.push(CaseGroupInfo { id, source_cases });
        id
    }

    pub fn add_well_path(&mut self, name: impl Into<String>) -> u64 {
        let id = self.next_id("WellPath");
        self.well_paths.push(WellPathInfo {
            id,
            name: name.into(),
        });
        id
    }

    pub fn cases(&self) -> &[CaseInfo] {
        &self.cases
    }

    pub fn views(&self) -> &[ViewInfo] {
        &self.views
    }

    pub fn case_groups(&self) -> &[CaseGroupInfo] {
        &self.case_groups
    }

    pub fn well_paths(&self) -> &[WellPathInfo] {
        &self.well_paths
    }

    /// Files written by exports so far
    pub fn written_files(&self) -> &[PathBuf] {
        &self.written
    }

    fn clear(&mut self) {
        self.project = None;
        self.cases.clear();
        self.views.clear();
        self.case_groups.clear();
        self.well_paths.clear();
        self.next_ids.clear();
    }

    fn load_manifest(&self, path: &Path) -> CmdResult<ProjectManifest> {
        if let Some(manifest) = self.preset_projects.get(path) {
            return Ok(manifest.clone());
        }
        if !path.exists() {
            if self.check_files {
                return Err(CmdError::not_found(format!("project file {}", path.display())));
            }
            log::warn!("project file {} does not exist, opening an empty project", path.display());
            return Ok(ProjectManifest::default());
        }

        let text = fs::read_to_string(path)?;
        match ProjectManifest::from_json(&text) {
            Ok(manifest) => Ok(manifest),
            Err(e) => {
                log::warn!("{}: {}; opening an empty project", path.display(), e);
                Ok(ProjectManifest::default())
            }
        }
    }

    fn check_file(&self, path: &Path, what: &str) -> CmdResult {
        if self.check_files && !path.exists() {
            return Err(CmdError::not_found(format!("{} {}", what, path.display())));
        }
        Ok(())
    }

    fn case_mut(&mut self, case_id: Option<u64>) -> CmdResult<&mut CaseInfo> {
        let case = match case_id {
            Some(id) => self.cases.iter_mut().find(|c| c.id == id),
            None => self.cases.first_mut(),
        };
        case.ok_or_else(|| CmdError::not_found(describe_case(case_id)))
    }

    fn case(&self, case_id: Option<u64>) -> CmdResult<&CaseInfo> {
        let case = match case_id {
            Some(id) => self.cases.iter().find(|c| c.id == id),
            None => self.cases.first(),
        };
        case.ok_or_else(|| CmdError::not_found(describe_case(case_id)))
    }

    /// Write `contents` to `folder/name`, creating the folder
    fn write_export(&mut self, folder: &Path, name: &str, contents: &str) -> CmdResult<PathBuf> {
        fs::create_dir_all(folder)?;
        let path = folder.join(name);
        self.write_file(&path, contents)?;
        Ok(path)
    }

    fn write_file(&mut self, path: &Path, contents: &str) -> CmdResult {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        log::debug!("wrote {}", path.display());
        self.written.push(path.to_path_buf());
        Ok(())
    }
}

fn describe_case(case_id: Option<u64>) -> String {
    match case_id {
        Some(id) => format!("case {}", id),
        None => "no case is loaded".to_string(),
    }
}

/// Replace characters that do not belong in a file name
fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

impl ObjectTable for HeadlessApplication {
    fn contains(&self, class: &str, id: u64) -> bool {
        match class {
            "Case" => self.cases.iter().any(|c| c.id == id),
            "View" => self.views.iter().any(|v| v.id == id),
            "CaseGroup" => self.case_groups.iter().any(|g| g.id == id),
            "WellPath" => self.well_paths.iter().any(|w| w.id == id),
            _ => false,
        }
    }
}

impl Application for HeadlessApplication {
    fn open_project(&mut self, path: &Path) -> CmdResult {
        let manifest = self.load_manifest(path)?;
        self.clear();

        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        for grid in &manifest.cases {
            self.add_case(base.join(grid));
        }
        for group in &manifest.case_groups {
            let sources = group.iter().map(|g| base.join(g)).collect();
            self.add_case_group(sources);
        }
        for name in &manifest.well_paths {
            self.add_well_path(name.clone());
        }

        self.project = Some(path.to_path_buf());
        log::info!(
            "opened project {} ({} cases, {} well paths)",
            path.display(),
            self.cases.len(),
            self.well_paths.len()
        );
        Ok(())
    }

    fn close_project(&mut self) {
        self.clear();
    }

    fn project_path(&self) -> Option<&Path> {
        self.project.as_deref()
    }

    fn load_case(&mut self, grid_file: &Path) -> CmdResult<u64> {
        self.check_file(grid_file, "grid file")?;
        Ok(self.add_case(grid_file))
    }

    fn replace_case(&mut self, case_id: Option<u64>, grid_file: &Path) -> CmdResult {
        self.check_file(grid_file, "grid file")?;
        let case = self.case_mut(case_id)?;
        log::debug!(
            "case {}: {} -> {}",
            case.id,
            case.grid_file.display(),
            grid_file.display()
        );
        case.grid_file = grid_file.to_path_buf();
        case.time_step = 0;
        Ok(())
    }

    fn replace_source_cases(&mut self, case_group_id: Option<u64>, grid_files: &[PathBuf]) -> CmdResult {
        for file in grid_files {
            self.check_file(file, "grid file")?;
        }
        let group = match case_group_id {
            Some(id) => self.case_groups.iter_mut().find(|g| g.id == id),
            None => self.case_groups.first_mut(),
        };
        let group = group.ok_or_else(|| match case_group_id {
            Some(id) => CmdError::not_found(format!("case group {}", id)),
            None => CmdError::not_found("no case group in project"),
        })?;
        group.source_cases = grid_files.to_vec();
        Ok(())
    }

    fn case_ids(&self) -> Vec<u64> {
        self.cases.iter().map(|c| c.id).collect()
    }

    fn set_time_step(&mut self, case_id: Option<u64>, time_step: usize) -> CmdResult {
        let case = self.case_mut(case_id)?;
        case.time_step = time_step;
        Ok(())
    }

    fn export_snapshots(&mut self, request: &SnapshotRequest) -> CmdResult<Vec<PathBuf>> {
        if let Some(case_id) = request.case_id {
            self.case(Some(case_id))?;
        }
        for id in &request.view_ids {
            if !self.views.iter().any(|v| v.id == *id) {
                return Err(CmdError::not_found(format!("view {}", id)));
            }
        }

        let mut files = Vec::new();
        if request.kind != SnapshotKind::Plots {
            let views: Vec<ViewInfo> = self
                .views
                .iter()
                .filter(|v| request.case_id.map_or(true, |c| v.case_id == c))
                .filter(|v| request.view_ids.is_empty() || request.view_ids.contains(&v.id))
                .cloned()
                .collect();
            for view in views {
                let case = self.case(Some(view.case_id))?;
                let contents = format!(
                    "view {} '{}'\ncase {} {}\ntime step {}\n",
                    view.id,
                    view.name,
                    case.id,
                    case.grid_file.display(),
                    case.time_step
                );
                let name = format!("{}{}.png.txt", request.prefix, file_safe(&view.name));
                files.push(self.write_export(&request.folder, &name, &contents)?);
            }
        }
        Ok(files)
    }

    fn export_property(&mut self, request: &PropertyExport) -> CmdResult<PathBuf> {
        let case = self.case(request.case_id)?;
        let keyword = if request.eclipse_keyword.is_empty() {
            &request.property
        } else {
            &request.eclipse_keyword
        };
        let contents = format!(
            "-- {} exported from case {} at time step {}\n-- undefined value {}\n{}\n/\n",
            request.property,
            case.id,
            request.time_step,
            request.undefined_value,
            keyword
        );
        self.write_file(&request.file, &contents)?;
        Ok(request.file.clone())
    }

    fn export_well_paths(&mut self, request: &WellPathExport) -> CmdResult<WellPathExportReport> {
        let mut report = WellPathExportReport::default();
        let selected: Vec<String> = if request.names.is_empty() {
            self.well_paths.iter().map(|w| w.name.clone()).collect()
        } else {
            let mut found = Vec::new();
            for name in &request.names {
                if self.well_paths.iter().any(|w| &w.name == name) {
                    found.push(name.clone());
                } else {
                    report.missing.push(name.clone());
                }
            }
            found
        };

        for name in selected {
            let contents = format!("WELLNAME: {}\n# MD step size {}\n", name, request.md_step_size);
            let file_name = format!("{}.dev", file_safe(&name));
            report.files.push(self.write_export(&request.folder, &file_name, &contents)?);
        }
        Ok(report)
    }

    fn export_visible_cells(&mut self, request: &VisibleCellsExport) -> CmdResult<PathBuf> {
        let view = self
            .views
            .iter()
            .find(|v| v.id == request.view_id)
            .cloned()
            .ok_or_else(|| CmdError::not_found(format!("view {}", request.view_id)))?;

        let mut contents = String::new();
        let _ = writeln!(contents, "-- visible cells of view '{}' (case {})", view.name, view.case_id);
        let _ = writeln!(
            contents,
            "-- visible active {}, hidden active {}, inactive {}",
            request.visible_active_value, request.hidden_active_value, request.inactive_value
        );
        let _ = writeln!(contents, "{}\n/", request.keyword);

        let name = format!("{}_{}.grdecl", file_safe(&view.name), request.keyword);
        self.write_export(&request.folder, &name, &contents)
    }

    fn export_lgrs(&mut self, request: &LgrExport) -> CmdResult<Vec<PathBuf>> {
        let case_id = self.case(request.case_id)?.id;
        let wells: Vec<String> = if request.well_path_names.is_empty() {
            self.well_paths.iter().map(|w| w.name.clone()).collect()
        } else {
            request
                .well_path_names
                .iter()
                .filter(|n| self.well_paths.iter().any(|w| &w.name == *n))
                .cloned()
                .collect()
        };

        let [i, j, k] = request.refinement;
        let mut files = Vec::new();
        for well in wells {
            let contents = format!(
                "CARFIN\n-- LGR for {} in case {} at time step {}\n-- refinement {} {} {}\n/\n",
                well, case_id, request.time_step, i, j, k
            );
            let name = format!("lgr_{}.dat", file_safe(&well));
            files.push(self.write_export(&request.folder, &name, &contents)?);
        }
        Ok(files)
    }
}
