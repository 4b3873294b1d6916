//! Command trait, command instances and the registry
//!
//! A [`Command`] is a stateless handler registered under a keyword. The
//! registry acts as the factory: [`CommandRegistry::create`] returns a
//! [`ParsedCommand`] whose fields hold the handler's defaults, ready to be
//! filled in by the parser.

use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;

use crate::application::Application;
use crate::error::{CmdError, CmdResult};
use crate::marshal::write_value;
use crate::response::CommandResponse;
use crate::schema::{CommandArgs, FieldDef};
use crate::session::ScriptingContext;

/// What a command can reach while executing
pub struct CommandContext<'a> {
    /// Application holding projects, cases and views
    pub app: &'a mut dyn Application,
    /// Session state (export paths, open project, start directory)
    pub session: &'a mut ScriptingContext,
    /// Whether to suppress informational output
    pub quiet: bool,
}

impl<'a> CommandContext<'a> {
    pub fn new(app: &'a mut dyn Application, session: &'a mut ScriptingContext) -> Self {
        Self {
            app,
            session,
            quiet: false,
        }
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Print a message (unless quiet mode is enabled)
    pub fn print(&self, msg: &str) {
        if !self.quiet {
            log::info!("{}", msg);
        }
    }

    /// Report a domain problem that does not fail the command
    pub fn warn(&self, msg: &str) {
        log::warn!("{}", msg);
    }
}

/// Trait for command implementations
pub trait Command: Send + Sync {
    /// Keyword used in scripts
    fn name(&self) -> &str;

    /// Ordered field schema
    fn fields(&self) -> &[FieldDef] {
        &[]
    }

    fn help(&self) -> &str {
        "No help available."
    }

    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Run the command with fully populated arguments
    fn execute(&self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResponse;
}

/// One command read from a script, with its field values
#[derive(Clone)]
pub struct ParsedCommand {
    keyword: String,
    line: usize,
    args: CommandArgs,
    handler: Arc<dyn Command>,
}

impl fmt::Debug for ParsedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedCommand")
            .field("keyword", &self.keyword)
            .field("line", &self.line)
            .field("args", &self.args)
            .finish()
    }
}

impl ParsedCommand {
    fn new(keyword: &str, handler: Arc<dyn Command>) -> Self {
        Self {
            keyword: keyword.to_string(),
            line: 0,
            args: CommandArgs::from_defaults(handler.fields()),
            handler,
        }
    }

    /// Record the script line the command starts on
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// Keyword as written in the script (may be an alias)
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Canonical command name
    pub fn name(&self) -> &str {
        self.handler.name()
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn fields(&self) -> &[FieldDef] {
        self.handler.fields()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields().iter().find(|f| f.name == name)
    }

    pub fn args(&self) -> &CommandArgs {
        &self.args
    }

    pub fn args_mut(&mut self) -> &mut CommandArgs {
        &mut self.args
    }

    pub fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResponse {
        self.handler.execute(ctx, &self.args)
    }

    /// Encode the command back into script syntax
    ///
    /// Internal fields and null object references are left out.
    pub fn to_script(&self) -> String {
        let mut out = String::new();
        out.push_str(self.name());
        out.push('(');

        let mut first = true;
        for (field, (name, value)) in self.fields().iter().zip(self.args.iter()) {
            if !field.scriptable || value.is_null_ref() {
                continue;
            }
            if !first {
                out.push_str(", ");
            }
            first = false;
            out.push_str(name);
            out.push('=');
            write_value(value, &mut out);
        }

        out.push(')');
        out
    }
}

/// Registry mapping command keywords to implementations
pub struct CommandRegistry {
    /// Commands indexed by name
    commands: AHashMap<String, Arc<dyn Command>>,
    /// Aliases mapping alias -> command name
    aliases: AHashMap<String, String>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            commands: AHashMap::new(),
            aliases: AHashMap::new(),
        }
    }

    /// Create a registry with all built-in commands registered
    pub fn with_builtins() -> CmdResult<Self> {
        let mut registry = Self::new();
        crate::commands::register_all(&mut registry)?;
        Ok(registry)
    }

    /// Register a command and its aliases
    ///
    /// A keyword or alias that is already taken is rejected; registration is
    /// meant to happen once at startup.
    pub fn register<C: Command + 'static>(&mut self, cmd: C) -> CmdResult {
        self.register_arc(Arc::new(cmd))
    }

    /// Register a shared command
    pub fn register_arc(&mut self, cmd: Arc<dyn Command>) -> CmdResult {
        let name = cmd.name().to_string();
        if self.contains(&name) {
            return Err(CmdError::DuplicateCommand(name));
        }
        for alias in cmd.aliases() {
            if self.contains(alias) || *alias == name {
                return Err(CmdError::DuplicateCommand(alias.to_string()));
            }
        }

        for alias in cmd.aliases() {
            self.aliases.insert(alias.to_string(), name.clone());
        }
        log::debug!("registered command '{}'", name);
        self.commands.insert(name, cmd);
        Ok(())
    }

    /// Look up a command by name or alias
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        if let Some(cmd) = self.commands.get(name) {
            return Some(cmd.clone());
        }

        self.aliases
            .get(name)
            .and_then(|real_name| self.commands.get(real_name))
            .cloned()
    }

    /// Instantiate a command with default field values
    pub fn create(&self, keyword: &str) -> Option<ParsedCommand> {
        self.get(keyword).map(|handler| ParsedCommand::new(keyword, handler))
    }

    /// Check if a command exists
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name) || self.aliases.contains_key(name)
    }

    /// Command names (not including aliases), sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Usage line and help text of a command
    pub fn help(&self, name: &str) -> Option<String> {
        let cmd = self.get(name)?;
        let params: Vec<String> = cmd
            .fields()
            .iter()
            .filter(|f| f.scriptable)
            .map(|f| {
                let mut default = String::new();
                write_value(&f.default.to_value(), &mut default);
                if default.is_empty() {
                    format!("{}: {}", f.name, f.ty.type_name())
                } else {
                    format!("{}: {} = {}", f.name, f.ty.type_name(), default)
                }
            })
            .collect();

        let mut text = format!("{}({})\n\n{}\n", cmd.name(), params.join(", "), cmd.help().trim());
        for field in cmd.fields().iter().filter(|f| f.scriptable && !f.help.is_empty()) {
            text.push_str(&format!("\n    {:<24}{}", field.name, field.help));
        }
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDefault;
    use crate::value::{ObjectRef, Value, ValueType};

    struct TestCommand;

    static TEST_FIELDS: &[FieldDef] = &[
        FieldDef::new("path", ValueType::String, FieldDefault::Str("")).help("File to read"),
        FieldDef::new("count", ValueType::Int, FieldDefault::Int(1)),
        FieldDef::new("view", ValueType::ObjectRef("View"), FieldDefault::NullRef),
        FieldDef::new("secret", ValueType::Bool, FieldDefault::Bool(false)).internal(),
    ];

    impl Command for TestCommand {
        fn name(&self) -> &str {
            "test"
        }

        fn fields(&self) -> &[FieldDef] {
            TEST_FIELDS
        }

        fn help(&self) -> &str {
            "Test command"
        }

        fn aliases(&self) -> &[&str] {
            &["test_alias"]
        }

        fn execute(&self, _ctx: &mut CommandContext<'_>, _args: &CommandArgs) -> CommandResponse {
            CommandResponse::ok()
        }
    }

    #[test]
    fn test_registry() {
        let mut registry = CommandRegistry::new();
        registry.register(TestCommand).unwrap();

        assert!(registry.contains("test"));
        assert!(registry.contains("test_alias"));
        assert!(!registry.contains("unknown"));

        let cmd = registry.get("test_alias").unwrap();
        assert_eq!(cmd.name(), "test");
        assert_eq!(registry.names(), vec!["test"]);
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = CommandRegistry::new();
        registry.register(TestCommand).unwrap();
        let err = registry.register(TestCommand).unwrap_err();
        assert!(matches!(err, CmdError::DuplicateCommand(name) if name == "test"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_create_uses_defaults() {
        let mut registry = CommandRegistry::new();
        registry.register(TestCommand).unwrap();

        let cmd = registry.create("test_alias").unwrap().at_line(4);
        assert_eq!(cmd.keyword(), "test_alias");
        assert_eq!(cmd.name(), "test");
        assert_eq!(cmd.line(), 4);
        assert_eq!(cmd.args().get_int("count"), Some(1));
        assert!(registry.create("nope").is_none());
    }

    #[test]
    fn test_to_script_omits_null_refs_and_internal_fields() {
        let mut registry = CommandRegistry::new();
        registry.register(TestCommand).unwrap();

        let mut cmd = registry.create("test").unwrap();
        cmd.args_mut().set("path", Value::from("a \"b\".rsp"));
        assert_eq!(cmd.to_script(), r#"test(path="a \"b\".rsp", count=1)"#);

        cmd.args_mut().set("view", Value::from(ObjectRef::new("View", 2)));
        assert_eq!(cmd.to_script(), r#"test(path="a \"b\".rsp", count=1, view=View:2)"#);
    }

    #[test]
    fn test_help_lists_scriptable_fields() {
        let mut registry = CommandRegistry::new();
        registry.register(TestCommand).unwrap();
        let help = registry.help("test").unwrap();
        assert!(help.starts_with("test(path: string = \"\", count: int = 1, view: View:id)"));
        assert!(help.contains("File to read"));
        assert!(!help.contains("secret"));
    }
}
