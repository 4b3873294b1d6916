//! Project and case commands: openProject, closeProject, setStartDir,
//! loadCase, replaceCase, replaceSourceCases

use crate::command::{Command, CommandContext, CommandRegistry};
use crate::error::CmdResult;
use crate::response::{CommandResponse, ResultObject};
use crate::schema::{CommandArgs, FieldDef, FieldDefault};
use crate::value::ValueType;

use super::{optional_id, read_grid_list, required_str};

/// Register project commands
pub fn register(registry: &mut CommandRegistry) -> CmdResult {
    registry.register(OpenProjectCommand)?;
    registry.register(CloseProjectCommand)?;
    registry.register(SetStartDirCommand)?;
    registry.register(LoadCaseCommand)?;
    registry.register(ReplaceCaseCommand)?;
    registry.register(ReplaceSourceCasesCommand)?;
    Ok(())
}

// ============================================================================
// openProject command
// ============================================================================

struct OpenProjectCommand;

static OPEN_PROJECT_FIELDS: &[FieldDef] = &[
    FieldDef::new("path", ValueType::String, FieldDefault::Str("")).help("Project file to open"),
];

impl OpenProjectCommand {
    fn run(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CmdResult<CommandResponse> {
        let path = ctx.session.resolve_path(required_str(args, "path")?);
        ctx.app.open_project(&path)?;
        ctx.session.reset_for_project(&path);
        ctx.print(&format!(" Opened project \"{}\"", path.display()));
        Ok(CommandResponse::ok())
    }
}

impl Command for OpenProjectCommand {
    fn name(&self) -> &str {
        "openProject"
    }

    fn fields(&self) -> &[FieldDef] {
        OPEN_PROJECT_FIELDS
    }

    fn help(&self) -> &str {
        r#"
Open a project file, closing the current one.

Export folders set with setExportFolder are forgotten: they belong to the
project that was open when they were set.

EXAMPLES

    openProject("/data/field.rsp")
"#
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResponse {
        self.run(ctx, args).unwrap_or_else(CommandResponse::from)
    }
}

// ============================================================================
// closeProject command
// ============================================================================

struct CloseProjectCommand;

impl Command for CloseProjectCommand {
    fn name(&self) -> &str {
        "closeProject"
    }

    fn help(&self) -> &str {
        "Close the current project."
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, _args: &CommandArgs) -> CommandResponse {
        if ctx.app.project_path().is_none() {
            return CommandResponse::warning("no project is open");
        }
        ctx.app.close_project();
        ctx.session.project_closed();
        CommandResponse::ok()
    }
}

// ============================================================================
// setStartDir command
// ============================================================================

struct SetStartDirCommand;

static SET_START_DIR_FIELDS: &[FieldDef] = &[FieldDef::new("path", ValueType::String, FieldDefault::Str(""))
    .help("Folder relative paths are resolved against")];

impl Command for SetStartDirCommand {
    fn name(&self) -> &str {
        "setStartDir"
    }

    fn fields(&self) -> &[FieldDef] {
        SET_START_DIR_FIELDS
    }

    fn help(&self) -> &str {
        "Set the folder that relative file paths in later commands start from."
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResponse {
        let dir = match required_str(args, "path") {
            Ok(path) => ctx.session.resolve_path(path),
            Err(e) => return e.into(),
        };

        let response = if dir.is_dir() {
            CommandResponse::ok()
        } else {
            CommandResponse::warning(format!("start folder {} does not exist", dir.display()))
        };
        ctx.session.set_start_dir(dir);
        response
    }
}

// ============================================================================
// loadCase command
// ============================================================================

struct LoadCaseCommand;

static LOAD_CASE_FIELDS: &[FieldDef] = &[FieldDef::new("path", ValueType::String, FieldDefault::Str(""))
    .alias("gridFile")
    .help("Grid file to load")];

impl LoadCaseCommand {
    fn run(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CmdResult<CommandResponse> {
        let path = ctx.session.resolve_path(required_str(args, "path")?);
        let case_id = ctx.app.load_case(&path)?;
        ctx.print(&format!(" Loaded case {} from \"{}\"", case_id, path.display()));
        Ok(CommandResponse::ok().with_result(ResultObject::Case { case_id }))
    }
}

impl Command for LoadCaseCommand {
    fn name(&self) -> &str {
        "loadCase"
    }

    fn fields(&self) -> &[FieldDef] {
        LOAD_CASE_FIELDS
    }

    fn help(&self) -> &str {
        r#"
Load a grid file as a new case. The response carries the new case id.

EXAMPLES

    loadCase("grids/BASE.EGRID")
"#
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResponse {
        self.run(ctx, args).unwrap_or_else(CommandResponse::from)
    }
}

// ============================================================================
// replaceCase command
// ============================================================================

struct ReplaceCaseCommand;

static REPLACE_CASE_FIELDS: &[FieldDef] = &[
    FieldDef::new("newGridFile", ValueType::String, FieldDefault::Str(""))
        .alias("file")
        .help("Grid file the case should read from now on"),
    FieldDef::new("caseId", ValueType::Int, FieldDefault::Int(-1))
        .help("Case to replace; -1 for the first case"),
];

impl ReplaceCaseCommand {
    fn run(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CmdResult<CommandResponse> {
        ctx.session.require_project(self.name())?;
        let grid = ctx.session.resolve_path(required_str(args, "newGridFile")?);
        ctx.app.replace_case(optional_id(args.get_int_or("caseId", -1)), &grid)?;
        Ok(CommandResponse::ok())
    }
}

impl Command for ReplaceCaseCommand {
    fn name(&self) -> &str {
        "replaceCase"
    }

    fn fields(&self) -> &[FieldDef] {
        REPLACE_CASE_FIELDS
    }

    fn help(&self) -> &str {
        r#"
Point a case of the open project at another grid file.

Requires a project opened earlier in the same session.

EXAMPLES

    openProject("template.rsp")
    replaceCase(newGridFile="R1.EGRID", caseId=0)
"#
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResponse {
        self.run(ctx, args).unwrap_or_else(CommandResponse::from)
    }
}

// ============================================================================
// replaceSourceCases command
// ============================================================================

struct ReplaceSourceCasesCommand;

static REPLACE_SOURCE_CASES_FIELDS: &[FieldDef] = &[
    FieldDef::new("gridListFile", ValueType::String, FieldDefault::Str(""))
        .help("Text file with one grid file per line"),
    FieldDef::new("caseGroupId", ValueType::Int, FieldDefault::Int(-1))
        .help("Case group to update; -1 for the first group"),
];

impl ReplaceSourceCasesCommand {
    fn run(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CmdResult<CommandResponse> {
        ctx.session.require_project(self.name())?;
        let list = ctx.session.resolve_path(required_str(args, "gridListFile")?);
        let grids = read_grid_list(&list)?;
        ctx.app
            .replace_source_cases(optional_id(args.get_int_or("caseGroupId", -1)), &grids)?;
        ctx.print(&format!(" Replaced source cases with {} grids", grids.len()));
        Ok(CommandResponse::ok())
    }
}

impl Command for ReplaceSourceCasesCommand {
    fn name(&self) -> &str {
        "replaceSourceCases"
    }

    fn fields(&self) -> &[FieldDef] {
        REPLACE_SOURCE_CASES_FIELDS
    }

    fn help(&self) -> &str {
        "Replace the source cases of a case group with the grids listed in a file."
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResponse {
        self.run(ctx, args).unwrap_or_else(CommandResponse::from)
    }
}
