//! Export commands: setExportFolder, exportProperty, exportWellPaths,
//! exportVisibleCells, exportLgrForCompletions

use std::fs;

use crate::application::{LgrExport, PropertyExport, VisibleCellsExport, WellPathExport};
use crate::command::{Command, CommandContext, CommandRegistry};
use crate::error::{CmdError, CmdResult};
use crate::response::{CommandResponse, ResultObject};
use crate::schema::{CommandArgs, FieldDef, FieldDefault};
use crate::session::{ExportKind, EXPORT_KIND};
use crate::value::{EnumDef, ValueType};

use super::{non_negative, optional_id, required_str};

/// Keywords `exportVisibleCells` can write
pub static CELL_KEYWORD: EnumDef = EnumDef::new("ExportKeyword", &["FLUXNUM", "MULTNUM"]);

/// Register export commands
pub fn register(registry: &mut CommandRegistry) -> CmdResult {
    registry.register(SetExportFolderCommand)?;
    registry.register(ExportPropertyCommand)?;
    registry.register(ExportWellPathsCommand)?;
    registry.register(ExportVisibleCellsCommand)?;
    registry.register(ExportLgrForCompletionsCommand)?;
    Ok(())
}

// ============================================================================
// setExportFolder command
// ============================================================================

struct SetExportFolderCommand;

static SET_EXPORT_FOLDER_FIELDS: &[FieldDef] = &[
    FieldDef::new("type", ValueType::Enum(&EXPORT_KIND), FieldDefault::Enum("COMPLETIONS"))
        .help("Kind of export the folder is used for"),
    FieldDef::new("path", ValueType::String, FieldDefault::Str("")).help("Output folder"),
    FieldDef::new("createFolder", ValueType::Bool, FieldDefault::Bool(false))
        .help("Create the folder if it does not exist"),
];

impl SetExportFolderCommand {
    fn run(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CmdResult<CommandResponse> {
        let kind_name = args.get_enum("type").unwrap_or_default();
        let kind = ExportKind::from_script_name(kind_name)
            .ok_or_else(|| CmdError::invalid_arg("type", format!("unknown export type '{}'", kind_name)))?;
        let folder = ctx.session.resolve_path(required_str(args, "path")?);

        let mut response = CommandResponse::ok();
        if !folder.is_dir() {
            if args.get_bool_or("createFolder", false) {
                fs::create_dir_all(&folder).map_err(|e| {
                    CmdError::execution(format!("could not create folder {}: {}", folder.display(), e))
                })?;
            } else {
                response = CommandResponse::warning(format!("export folder {} does not exist", folder.display()));
            }
        }

        ctx.print(&format!(" {} exports go to \"{}\"", kind, folder.display()));
        ctx.session.set_export_path(kind, folder);
        Ok(response)
    }
}

impl Command for SetExportFolderCommand {
    fn name(&self) -> &str {
        "setExportFolder"
    }

    fn fields(&self) -> &[FieldDef] {
        SET_EXPORT_FOLDER_FIELDS
    }

    fn help(&self) -> &str {
        r#"
Set the output folder for one kind of export until the next openProject.

Types: COMPLETIONS, SNAPSHOTS, PROPERTIES, STATISTICS, WELLPATHS, CELLS, LGRS

COMPLETIONS and STATISTICS folders are read by the host application;
no built-in command writes them.

EXAMPLES

    setExportFolder(type=SNAPSHOTS, path="out/images", createFolder=true)
"#
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResponse {
        self.run(ctx, args).unwrap_or_else(CommandResponse::from)
    }
}

// ============================================================================
// exportProperty command
// ============================================================================

struct ExportPropertyCommand;

static EXPORT_PROPERTY_FIELDS: &[FieldDef] = &[
    FieldDef::new("caseId", ValueType::Int, FieldDefault::Int(-1)),
    FieldDef::new("timeStep", ValueType::Int, FieldDefault::Int(0)),
    FieldDef::new("property", ValueType::String, FieldDefault::Str("")).help("Result property name"),
    FieldDef::new("eclipseKeyword", ValueType::String, FieldDefault::Str(""))
        .help("Keyword written to the file; defaults to the property name"),
    FieldDef::new("undefinedValue", ValueType::Double, FieldDefault::Double(0.0)),
    FieldDef::new("exportFile", ValueType::String, FieldDefault::Str(""))
        .help("Output file; defaults to a file in the properties folder"),
];

impl ExportPropertyCommand {
    fn run(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CmdResult<CommandResponse> {
        let property = required_str(args, "property")?;
        let case_id = optional_id(args.get_int_or("caseId", -1));
        let time_step = non_negative(args, "timeStep")?;

        let file = match args.get_str("exportFile").filter(|f| !f.is_empty()) {
            Some(file) => ctx.session.resolve_path(file),
            None => {
                let case_label = case_id.map_or_else(|| "case".to_string(), |id| id.to_string());
                ctx.session
                    .resolve_export_folder(ExportKind::Properties, &*ctx.app)
                    .join(format!("{}-T{}-{}", case_label, time_step, property))
            }
        };

        let request = PropertyExport {
            case_id,
            time_step,
            property: property.to_string(),
            eclipse_keyword: args.get_str_or("eclipseKeyword", "").to_string(),
            undefined_value: args.get_double_or("undefinedValue", 0.0),
            file,
        };
        let written = ctx.app.export_property(&request)?;
        ctx.print(&format!(" Exported {} to \"{}\"", property, written.display()));
        Ok(CommandResponse::ok().with_result(ResultObject::Files { paths: vec![written] }))
    }
}

impl Command for ExportPropertyCommand {
    fn name(&self) -> &str {
        "exportProperty"
    }

    fn fields(&self) -> &[FieldDef] {
        EXPORT_PROPERTY_FIELDS
    }

    fn help(&self) -> &str {
        "Export one result property of a case at a time step."
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResponse {
        self.run(ctx, args).unwrap_or_else(CommandResponse::from)
    }
}

// ============================================================================
// exportWellPaths command
// ============================================================================

struct ExportWellPathsCommand;

static EXPORT_WELL_PATHS_FIELDS: &[FieldDef] = &[
    FieldDef::new("wellPathNames", ValueType::Array(&ValueType::String), FieldDefault::EmptyArray)
        .help("Well paths to export; empty for all"),
    FieldDef::new("mdStepSize", ValueType::Double, FieldDefault::Double(5.0))
        .help("Measured depth between exported points"),
];

impl ExportWellPathsCommand {
    fn run(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CmdResult<CommandResponse> {
        let md_step_size = args.get_double_or("mdStepSize", 5.0);
        if md_step_size <= 0.0 {
            return Err(CmdError::invalid_arg("mdStepSize", "must be positive"));
        }

        let request = WellPathExport {
            names: args.get_str_list("wellPathNames"),
            md_step_size,
            folder: ctx.session.resolve_export_folder(ExportKind::WellPaths, &*ctx.app),
        };
        let report = ctx.app.export_well_paths(&request)?;

        let mut response = CommandResponse::ok();
        if !report.missing.is_empty() {
            let message = format!("well paths not found: {}", report.missing.join(", "));
            ctx.warn(&message);
            response = CommandResponse::warning(message);
        }
        Ok(response.with_result(ResultObject::Files { paths: report.files }))
    }
}

impl Command for ExportWellPathsCommand {
    fn name(&self) -> &str {
        "exportWellPaths"
    }

    fn fields(&self) -> &[FieldDef] {
        EXPORT_WELL_PATHS_FIELDS
    }

    fn help(&self) -> &str {
        r#"
Export well path geometry to the well path folder.

Names that match no well path are reported as a warning; the others are
still exported.

EXAMPLES

    exportWellPaths(wellPathNames=["A-1", "B-2"], mdStepSize=10.0)
"#
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResponse {
        self.run(ctx, args).unwrap_or_else(CommandResponse::from)
    }
}

// ============================================================================
// exportVisibleCells command
// ============================================================================

struct ExportVisibleCellsCommand;

static EXPORT_VISIBLE_CELLS_FIELDS: &[FieldDef] = &[
    FieldDef::new("view", ValueType::ObjectRef("View"), FieldDefault::NullRef).help("View to export"),
    FieldDef::new("exportKeyword", ValueType::Enum(&CELL_KEYWORD), FieldDefault::Enum("FLUXNUM")),
    FieldDef::new("visibleActiveCellsValue", ValueType::Int, FieldDefault::Int(1)),
    FieldDef::new("hiddenActiveCellsValue", ValueType::Int, FieldDefault::Int(0)),
    FieldDef::new("inactiveCellsValue", ValueType::Int, FieldDefault::Int(0)),
];

impl ExportVisibleCellsCommand {
    fn run(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CmdResult<CommandResponse> {
        let view = args
            .get_object("view")
            .ok_or_else(|| CmdError::MissingArgument("view".to_string()))?;

        let request = VisibleCellsExport {
            view_id: view.id,
            keyword: args.get_enum("exportKeyword").unwrap_or("FLUXNUM").to_string(),
            visible_active_value: args.get_int_or("visibleActiveCellsValue", 1),
            hidden_active_value: args.get_int_or("hiddenActiveCellsValue", 0),
            inactive_value: args.get_int_or("inactiveCellsValue", 0),
            folder: ctx.session.resolve_export_folder(ExportKind::Cells, &*ctx.app),
        };
        let written = ctx.app.export_visible_cells(&request)?;
        Ok(CommandResponse::ok().with_result(ResultObject::Files { paths: vec![written] }))
    }
}

impl Command for ExportVisibleCellsCommand {
    fn name(&self) -> &str {
        "exportVisibleCells"
    }

    fn fields(&self) -> &[FieldDef] {
        EXPORT_VISIBLE_CELLS_FIELDS
    }

    fn help(&self) -> &str {
        r#"
Export the visible cells of a view as an integer keyword.

EXAMPLES

    exportVisibleCells(view=View:0, exportKeyword=MULTNUM, hiddenActiveCellsValue=2)
"#
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResponse {
        self.run(ctx, args).unwrap_or_else(CommandResponse::from)
    }
}

// ============================================================================
// exportLgrForCompletions command
// ============================================================================

struct ExportLgrForCompletionsCommand;

static EXPORT_LGR_FIELDS: &[FieldDef] = &[
    FieldDef::new("caseId", ValueType::Int, FieldDefault::Int(-1)),
    FieldDef::new("timeStep", ValueType::Int, FieldDefault::Int(0)),
    FieldDef::new("wellPathNames", ValueType::Array(&ValueType::String), FieldDefault::EmptyArray),
    FieldDef::new("refinementI", ValueType::Int, FieldDefault::Int(1)),
    FieldDef::new("refinementJ", ValueType::Int, FieldDefault::Int(1)),
    FieldDef::new("refinementK", ValueType::Int, FieldDefault::Int(1)),
];

/// Refinement factors are at least 1
fn refinement(args: &CommandArgs, name: &str) -> CmdResult<u32> {
    let value = args.get_int_or(name, 1);
    u32::try_from(value)
        .ok()
        .filter(|v| *v >= 1)
        .ok_or_else(|| CmdError::invalid_arg(name, format!("refinement must be at least 1, got {}", value)))
}

impl ExportLgrForCompletionsCommand {
    fn run(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CmdResult<CommandResponse> {
        let request = LgrExport {
            case_id: optional_id(args.get_int_or("caseId", -1)),
            time_step: non_negative(args, "timeStep")?,
            well_path_names: args.get_str_list("wellPathNames"),
            refinement: [
                refinement(args, "refinementI")?,
                refinement(args, "refinementJ")?,
                refinement(args, "refinementK")?,
            ],
            folder: ctx.session.resolve_export_folder(ExportKind::Lgrs, &*ctx.app),
        };

        let files = ctx.app.export_lgrs(&request)?;
        let response = if files.is_empty() {
            CommandResponse::warning("no LGRs were exported")
        } else {
            CommandResponse::ok()
        };
        Ok(response.with_result(ResultObject::Files { paths: files }))
    }
}

impl Command for ExportLgrForCompletionsCommand {
    fn name(&self) -> &str {
        "exportLgrForCompletions"
    }

    fn fields(&self) -> &[FieldDef] {
        EXPORT_LGR_FIELDS
    }

    fn help(&self) -> &str {
        "Export local grid refinements around the completions of well paths."
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResponse {
        self.run(ctx, args).unwrap_or_else(CommandResponse::from)
    }
}
