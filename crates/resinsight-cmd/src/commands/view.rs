//! View commands: setTimeStep, exportSnapshots, exportMultiCaseSnapshots

use std::path::{Path, PathBuf};

use crate::application::{SnapshotKind, SnapshotRequest};
use crate::command::{Command, CommandContext, CommandRegistry};
use crate::error::{CmdError, CmdResult};
use crate::response::{CommandResponse, CommandStatus, ResultObject};
use crate::schema::{CommandArgs, FieldDef, FieldDefault};
use crate::session::ExportKind;
use crate::value::{EnumDef, ValueType};

use super::{non_negative, optional_id, read_grid_list, required_str};

/// Script names of [`SnapshotKind`]
pub static SNAPSHOT_KIND: EnumDef = EnumDef::new("SnapshotType", &["VIEWS", "PLOTS", "ALL"]);

/// Register view commands
pub fn register(registry: &mut CommandRegistry) -> CmdResult {
    registry.register(SetTimeStepCommand)?;
    registry.register(ExportSnapshotsCommand)?;
    registry.register(ExportMultiCaseSnapshotsCommand)?;
    Ok(())
}

// ============================================================================
// setTimeStep command
// ============================================================================

struct SetTimeStepCommand;

static SET_TIME_STEP_FIELDS: &[FieldDef] = &[
    FieldDef::new("caseId", ValueType::Int, FieldDefault::Int(-1)).help("Case to change; -1 for the first case"),
    FieldDef::new("timeStep", ValueType::Int, FieldDefault::Int(0)).help("Zero-based time step index"),
];

impl SetTimeStepCommand {
    fn run(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CmdResult<CommandResponse> {
        let time_step = non_negative(args, "timeStep")?;
        ctx.app
            .set_time_step(optional_id(args.get_int_or("caseId", -1)), time_step)?;
        Ok(CommandResponse::ok())
    }
}

impl Command for SetTimeStepCommand {
    fn name(&self) -> &str {
        "setTimeStep"
    }

    fn fields(&self) -> &[FieldDef] {
        SET_TIME_STEP_FIELDS
    }

    fn help(&self) -> &str {
        "Show the given time step in every view of a case."
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResponse {
        self.run(ctx, args).unwrap_or_else(CommandResponse::from)
    }
}

// ============================================================================
// exportSnapshots command
// ============================================================================

struct ExportSnapshotsCommand;

static EXPORT_SNAPSHOTS_FIELDS: &[FieldDef] = &[
    FieldDef::new("type", ValueType::Enum(&SNAPSHOT_KIND), FieldDefault::Enum("ALL"))
        .help("VIEWS, PLOTS or ALL"),
    FieldDef::new("prefix", ValueType::String, FieldDefault::Str("")).help("Prepended to every file name"),
    FieldDef::new("caseId", ValueType::Int, FieldDefault::Int(-1)).help("Only views of this case; -1 for all"),
    FieldDef::new("views", ValueType::ObjectRefArray("View"), FieldDefault::EmptyArray)
        .help("Only these views; empty for all"),
];

impl ExportSnapshotsCommand {
    fn run(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CmdResult<CommandResponse> {
        let kind_name = args.get_enum("type").unwrap_or("ALL");
        let kind = SnapshotKind::from_name(kind_name)
            .ok_or_else(|| CmdError::invalid_arg("type", format!("unknown snapshot type {}", kind_name)))?;

        let request = SnapshotRequest {
            kind,
            prefix: args.get_str_or("prefix", "").to_string(),
            case_id: optional_id(args.get_int_or("caseId", -1)),
            view_ids: args.get_objects("views").iter().map(|v| v.id).collect(),
            folder: ctx.session.resolve_export_folder(ExportKind::Snapshots, &*ctx.app),
        };

        let files = ctx.app.export_snapshots(&request)?;
        let response = if files.is_empty() {
            CommandResponse::warning("no snapshots were exported")
        } else {
            ctx.print(&format!(" Exported {} snapshots to \"{}\"", files.len(), request.folder.display()));
            CommandResponse::ok()
        };
        Ok(response.with_result(ResultObject::Files { paths: files }))
    }
}

impl Command for ExportSnapshotsCommand {
    fn name(&self) -> &str {
        "exportSnapshots"
    }

    fn fields(&self) -> &[FieldDef] {
        EXPORT_SNAPSHOTS_FIELDS
    }

    fn help(&self) -> &str {
        r#"
Export snapshots of views and/or plots to the snapshot folder.

The folder is the one set with setExportFolder(type=SNAPSHOTS, ...), or a
"snapshots" folder next to the open project.

EXAMPLES

    exportSnapshots()
    exportSnapshots(type=VIEWS, prefix="base_", views=[View:0, View:2])
"#
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResponse {
        self.run(ctx, args).unwrap_or_else(CommandResponse::from)
    }
}

// ============================================================================
// exportMultiCaseSnapshots command
// ============================================================================

struct ExportMultiCaseSnapshotsCommand;

static EXPORT_MULTI_CASE_SNAPSHOTS_FIELDS: &[FieldDef] = &[FieldDef::new(
    "gridListFile",
    ValueType::String,
    FieldDefault::Str(""),
)
.help("Text file with one grid file per line")];

impl ExportMultiCaseSnapshotsCommand {
    fn run(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CmdResult<CommandResponse> {
        let project = ctx.session.require_project(self.name())?.to_path_buf();
        let list = ctx.session.resolve_path(required_str(args, "gridListFile")?);
        let grids = read_grid_list(&list)?;

        let mut response = CommandResponse::ok();
        let mut files = Vec::new();
        for grid in &grids {
            match snapshot_grid(ctx, &project, grid) {
                Ok(mut written) => files.append(&mut written),
                Err(e) => response.update_status(CommandStatus::Error, format!("{}: {}", grid.display(), e)),
            }
        }

        ctx.print(&format!(" Exported {} snapshots for {} grids", files.len(), grids.len()));
        Ok(response.with_result(ResultObject::Files { paths: files }))
    }
}

/// Reload the template project with `grid` as its first case and snapshot
/// every view
fn snapshot_grid(ctx: &mut CommandContext<'_>, project: &Path, grid: &Path) -> CmdResult<Vec<PathBuf>> {
    ctx.app.open_project(project)?;
    ctx.app.replace_case(None, grid)?;

    let stem = grid.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let request = SnapshotRequest {
        kind: SnapshotKind::All,
        prefix: format!("{}_", stem),
        case_id: None,
        view_ids: Vec::new(),
        folder: ctx.session.resolve_export_folder(ExportKind::Snapshots, &*ctx.app),
    };
    ctx.app.export_snapshots(&request)
}

impl Command for ExportMultiCaseSnapshotsCommand {
    fn name(&self) -> &str {
        "exportMultiCaseSnapshots"
    }

    fn fields(&self) -> &[FieldDef] {
        EXPORT_MULTI_CASE_SNAPSHOTS_FIELDS
    }

    fn help(&self) -> &str {
        r#"
For every grid in the list: reopen the current project, replace its first
case with the grid and export snapshots prefixed with the grid name.

Requires a project opened earlier in the same session.
"#
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResponse {
        self.run(ctx, args).unwrap_or_else(CommandResponse::from)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::application::Application;
    use crate::headless::{HeadlessApplication, ProjectManifest};
    use crate::session::ScriptingContext;
    use crate::value::{ObjectRef, Value};

    fn run(
        app: &mut HeadlessApplication,
        session: &mut ScriptingContext,
        cmd: &dyn Command,
        args: CommandArgs,
    ) -> CommandResponse {
        let mut ctx = CommandContext::new(app, session).with_quiet(true);
        cmd.execute(&mut ctx, &args)
    }

    #[test]
    fn test_set_time_step() {
        let mut app = HeadlessApplication::new();
        app.add_case("a.egrid");
        let mut session = ScriptingContext::new();

        let args = CommandArgs::from_defaults(SET_TIME_STEP_FIELDS).with("timeStep", 3);
        assert!(run(&mut app, &mut session, &SetTimeStepCommand, args).is_ok());
        assert_eq!(app.cases()[0].time_step, 3);

        let args = CommandArgs::from_defaults(SET_TIME_STEP_FIELDS).with("timeStep", -1);
        assert!(run(&mut app, &mut session, &SetTimeStepCommand, args).is_error());
    }

    #[test]
    fn test_export_snapshots_uses_export_folder() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = HeadlessApplication::new();
        let case = app.add_case("a.egrid");
        let second = app.add_view(case, "Second");
        let mut session = ScriptingContext::new();
        session.set_export_path(ExportKind::Snapshots, dir.path());

        let args = CommandArgs::from_defaults(EXPORT_SNAPSHOTS_FIELDS).with(
            "views",
            Value::Array(vec![Value::from(ObjectRef::new("View", second)), Value::ObjectRef(None)]),
        );
        let mut response = run(&mut app, &mut session, &ExportSnapshotsCommand, args);
        assert!(response.is_ok(), "{}", response);
        match response.take_result() {
            Some(ResultObject::Files { paths }) => {
                assert_eq!(paths, vec![dir.path().join("Second.png.txt")]);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_export_snapshots_without_views_warns() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = HeadlessApplication::new();
        let mut session = ScriptingContext::new();
        session.set_export_path(ExportKind::Snapshots, dir.path());

        let args = CommandArgs::from_defaults(EXPORT_SNAPSHOTS_FIELDS);
        let response = run(&mut app, &mut session, &ExportSnapshotsCommand, args);
        assert_eq!(response.status(), CommandStatus::Warning);
    }

    #[test]
    fn test_multi_case_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("template.rsp");
        let list = dir.path().join("grids.txt");
        fs::write(&list, "r1.egrid\nr2.egrid\n").unwrap();

        let manifest = ProjectManifest {
            cases: vec!["base.egrid".into()],
            ..ProjectManifest::default()
        };
        let mut app = HeadlessApplication::new().with_project(&project, manifest);
        app.open_project(&project).unwrap();
        let mut session = ScriptingContext::new();
        session.reset_for_project(&project);

        let args = CommandArgs::from_defaults(EXPORT_MULTI_CASE_SNAPSHOTS_FIELDS)
            .with("gridListFile", list.to_string_lossy().into_owned());
        let mut response = run(&mut app, &mut session, &ExportMultiCaseSnapshotsCommand, args);
        assert!(response.is_ok(), "{}", response);

        let snapshots = dir.path().join("snapshots");
        match response.take_result() {
            Some(ResultObject::Files { paths }) => assert_eq!(
                paths,
                vec![snapshots.join("r1_View_1.png.txt"), snapshots.join("r2_View_1.png.txt")]
            ),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(app.cases()[0].grid_file, dir.path().join("r2.egrid"));
    }

    #[test]
    fn test_multi_case_snapshots_requires_project() {
        let mut app = HeadlessApplication::new();
        let mut session = ScriptingContext::new();
        let args = CommandArgs::from_defaults(EXPORT_MULTI_CASE_SNAPSHOTS_FIELDS).with("gridListFile", "grids.txt");
        let response = run(&mut app, &mut session, &ExportMultiCaseSnapshotsCommand, args);
        assert!(response.is_error());
        assert!(response.message().contains("exportMultiCaseSnapshots"));
    }
}
