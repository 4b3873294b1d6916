//! Command file parser
//!
//! Reads a whole script into a list of [`ParsedCommand`]s. Parsing never
//! stops at the first problem: every warning and error is collected with its
//! line number and the parser resynchronises on the next argument or command.
//!
//! # Supported Syntax
//!
//! - Commands: `keyword(arguments)`, separated by newlines and/or `;`
//! - Named arguments: `openProject(path="a.rsp")` or `openProject(path "a.rsp")`
//! - Positional arguments: `openProject("a.rsp")`, bound in field order
//! - Comments: lines starting with `#` (configurable)

use nom::{
    bytes::complete::take_while,
    character::complete::{char, multispace0, satisfy},
    combinator::recognize,
    error::{Error, ErrorKind},
    sequence::pair,
    IResult,
};

use crate::application::ObjectTable;
use crate::command::{CommandRegistry, ParsedCommand};
use crate::config::{ArgumentSeparator, SyntaxConfig};
use crate::diagnostics::{Diagnostic, DiagnosticsCollector};
use crate::marshal::{is_ident_char, parse_value};
use crate::schema::FieldDef;

/// Result of parsing a script
#[derive(Debug, Clone, Default)]
pub struct ParsedScript {
    /// Commands in source order
    pub commands: Vec<ParsedCommand>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedScript {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }
}

/// Identifier: letter or underscore followed by letters, digits, underscores
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_alphabetic() || c == '_'),
        take_while(is_ident_char),
    ))(input)
}

/// Argument name with its separator
///
/// Matches `name =` or `name <whitespace>` followed by a value. Returns the
/// name and whether `=` was used. A lone identifier such as a positional
/// enum value does not match.
fn argument_name(input: &str) -> IResult<&str, (&str, bool)> {
    let (rest, name) = identifier(input)?;
    let (after_ws, ws) = multispace0(rest)?;

    if let Ok((after_eq, _)) = char::<&str, Error<&str>>('=')(after_ws) {
        return Ok((after_eq, (name, true)));
    }

    let starts_value = after_ws
        .chars()
        .next()
        .is_some_and(|c| !matches!(c, ',' | ')' | ':' | ';'));
    if !ws.is_empty() && starts_value {
        return Ok((after_ws, (name, false)));
    }

    Err(nom::Err::Error(Error::new(input, ErrorKind::Tag)))
}

/// Script parser bound to a command registry
pub struct ScriptParser<'r> {
    registry: &'r CommandRegistry,
    syntax: SyntaxConfig,
}

impl<'r> ScriptParser<'r> {
    pub fn new(registry: &'r CommandRegistry) -> Self {
        Self {
            registry,
            syntax: SyntaxConfig::default(),
        }
    }

    pub fn with_syntax(mut self, syntax: SyntaxConfig) -> Self {
        self.syntax = syntax;
        self
    }

    /// Parse a complete script
    ///
    /// `objects` resolves `Class:id` references; a reference to an object
    /// that does not exist yet is a warning and stays null.
    pub fn parse(&self, script: &str, objects: &dyn ObjectTable) -> ParsedScript {
        let mut reader = DiagnosticsCollector::new(script);
        let mut commands = Vec::new();

        loop {
            self.skip_separators(&mut reader);
            if reader.at_end() {
                break;
            }

            let line = reader.line();
            let Some(keyword) = reader.scan(identifier) else {
                let c = reader.peek_char().unwrap_or_default();
                reader.add_error(format!("expected a command keyword, found '{}'", c));
                skip_command(&mut reader);
                continue;
            };

            reader.set_current_command(keyword);
            match self.registry.create(keyword) {
                Some(mut cmd) => {
                    if self.parse_arguments(&mut reader, &mut cmd, objects) {
                        commands.push(cmd.at_line(line));
                    }
                }
                None => {
                    reader.add_error(format!("unknown command '{}'", keyword));
                    skip_command(&mut reader);
                }
            }
            reader.clear_context();
        }

        ParsedScript {
            commands,
            diagnostics: reader.into_diagnostics(),
        }
    }

    /// Skip whitespace, `;` and comment lines between commands
    fn skip_separators(&self, reader: &mut DiagnosticsCollector<'_>) {
        loop {
            reader.skip_whitespace();
            match reader.peek_char() {
                Some(';') => {
                    reader.read_char();
                }
                Some(c) if c == self.syntax.comment_prefix => reader.skip_line(),
                _ => return,
            }
        }
    }

    /// Read `( ... )` into the command's fields
    ///
    /// Returns `false` when the command has no argument list at all.
    fn parse_arguments(
        &self,
        reader: &mut DiagnosticsCollector<'_>,
        cmd: &mut ParsedCommand,
        objects: &dyn ObjectTable,
    ) -> bool {
        reader.skip_whitespace();
        if reader.peek_char() != Some('(') {
            reader.add_error(format!("expected '(' after '{}'", cmd.keyword()));
            skip_statement(reader);
            return false;
        }
        let open_line = reader.line();
        reader.read_char();

        let fields: Vec<FieldDef> = cmd.fields().to_vec();
        let mut next_positional = 0;

        loop {
            reader.skip_whitespace();
            match reader.peek_char() {
                None => {
                    reader.add_error_at(open_line, "argument list is missing closing ')'");
                    return true;
                }
                Some(')') => {
                    reader.read_char();
                    return true;
                }
                Some(',') => {
                    reader.read_char();
                    continue;
                }
                Some(_) => {}
            }

            match reader.scan(argument_name) {
                Some((name, used_equals)) => {
                    reader.set_current_argument(name);
                    self.check_separator(reader, used_equals);
                    match fields.iter().find(|f| f.accepts(name)) {
                        Some(field) if field.scriptable => {
                            if cmd.args().is_set(field.name) {
                                reader.add_warning(format!(
                                    "argument '{}' given more than once; the last value is used",
                                    name
                                ));
                            }
                            read_field(reader, cmd, field, objects);
                        }
                        Some(_) => {
                            reader.add_error(format!("argument '{}' cannot be set from a script", name));
                            skip_value(reader);
                        }
                        None => {
                            reader.add_warning(format!("unknown argument '{}' ignored", name));
                            skip_value(reader);
                        }
                    }
                }
                None if self.syntax.allow_positional => {
                    let field = fields
                        .iter()
                        .filter(|f| f.scriptable)
                        .skip(next_positional)
                        .find(|f| !cmd.args().is_set(f.name));
                    match field {
                        Some(field) => {
                            next_positional = fields
                                .iter()
                                .filter(|f| f.scriptable)
                                .position(|f| f.name == field.name)
                                .map_or(next_positional, |p| p + 1);
                            reader.set_current_argument(field.name);
                            read_field(reader, cmd, field, objects);
                        }
                        None => {
                            reader.add_error("too many arguments");
                            skip_value(reader);
                        }
                    }
                }
                None => {
                    reader.add_error("expected an argument name");
                    skip_value(reader);
                }
            }

            self.finish_argument(reader);
        }
    }

    fn check_separator(&self, reader: &mut DiagnosticsCollector<'_>, used_equals: bool) {
        match (self.syntax.argument_separator, used_equals) {
            (ArgumentSeparator::Equals, false) => {
                reader.add_error("expected '=' between argument name and value")
            }
            (ArgumentSeparator::Whitespace, true) => {
                reader.add_error("expected whitespace between argument name and value, found '='")
            }
            _ => {}
        }
    }

    /// After a value only `,` or `)` may follow; anything else is reported
    /// and skipped
    fn finish_argument(&self, reader: &mut DiagnosticsCollector<'_>) {
        reader.skip_whitespace();
        match reader.peek_char() {
            Some(',') => {
                reader.read_char();
            }
            Some(')') | None => {}
            Some(c) => {
                reader.add_error(format!("unexpected '{}' after argument value", c));
                skip_value(reader);
                if reader.peek_char() == Some(',') {
                    reader.read_char();
                }
            }
        }
        reader.clear_argument();
    }
}

fn read_field(
    reader: &mut DiagnosticsCollector<'_>,
    cmd: &mut ParsedCommand,
    field: &FieldDef,
    objects: &dyn ObjectTable,
) {
    if let Some(value) = parse_value(reader, &field.ty, objects) {
        cmd.args_mut().set(field.name, value);
    }
}

/// Skip one argument value: up to the next `,` or `)` that is not nested in
/// brackets or quotes. The delimiter is left unread.
fn skip_value(reader: &mut DiagnosticsCollector<'_>) {
    let mut depth = 0usize;
    let mut in_string = false;
    while let Some(c) = reader.peek_char() {
        if in_string {
            reader.read_char();
            match c {
                '\\' => {
                    reader.read_char();
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            ',' | ')' if depth == 0 => return,
            '"' => in_string = true,
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        reader.read_char();
    }
}

/// Skip the rest of a command that cannot be parsed
///
/// An argument list is skipped up to its closing `)`; otherwise everything
/// up to the next `;` or end of line is dropped.
fn skip_command(reader: &mut DiagnosticsCollector<'_>) {
    while reader.peek_char().is_some_and(|c| c == ' ' || c == '\t') {
        reader.read_char();
    }
    if reader.peek_char() == Some('(') {
        reader.read_char();
        loop {
            skip_value(reader);
            match reader.read_char() {
                Some(')') | None => return,
                _ => {}
            }
        }
    }
    skip_statement(reader);
}

/// Skip to the next `;` or newline outside a string, leaving the `;` unread
fn skip_statement(reader: &mut DiagnosticsCollector<'_>) {
    let mut in_string = false;
    while let Some(c) = reader.peek_char() {
        if !in_string && c == ';' {
            return;
        }
        reader.read_char();
        match c {
            '\n' if !in_string => return,
            '\\' if in_string => {
                reader.read_char();
            }
            '"' => in_string = !in_string,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::NoObjects;
    use crate::command::{Command, CommandContext};
    use crate::response::CommandResponse;
    use crate::schema::{CommandArgs, FieldDefault};
    use crate::value::{EnumDef, Value, ValueType};

    static MODE: EnumDef = EnumDef::new("Mode", &["FAST", "SLOW"]);

    struct Sample;

    static SAMPLE_FIELDS: &[FieldDef] = &[
        FieldDef::new("path", ValueType::String, FieldDefault::Str("")).alias("file"),
        FieldDef::new("count", ValueType::Int, FieldDefault::Int(1)),
        FieldDef::new("mode", ValueType::Enum(&MODE), FieldDefault::Enum("FAST")),
        FieldDef::new("names", ValueType::Array(&ValueType::String), FieldDefault::EmptyArray),
        FieldDef::new("hidden", ValueType::Bool, FieldDefault::Bool(false)).internal(),
    ];

    impl Command for Sample {
        fn name(&self) -> &str {
            "sample"
        }

        fn fields(&self) -> &[FieldDef] {
            SAMPLE_FIELDS
        }

        fn execute(&self, _ctx: &mut CommandContext<'_>, _args: &CommandArgs) -> CommandResponse {
            CommandResponse::ok()
        }
    }

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry.register(Sample).unwrap();
        registry
    }

    fn parse(script: &str) -> ParsedScript {
        ScriptParser::new(&registry()).parse(script, &NoObjects)
    }

    #[test]
    fn test_argument_name() {
        assert_eq!(argument_name("path=\"a\""), Ok(("\"a\"", ("path", true))));
        assert_eq!(argument_name("path = 1"), Ok((" 1", ("path", true))));
        assert_eq!(argument_name("path \"a\""), Ok(("\"a\"", ("path", false))));
        assert!(argument_name("SLOW)").is_err());
        assert!(argument_name("SLOW , 2").is_err());
        assert!(argument_name("Case:1").is_err());
        assert!(argument_name("12 = 3").is_err());
    }

    #[test]
    fn test_named_and_positional_arguments() {
        let script = parse("sample(\"a.rsp\", mode=SLOW, 4)\nsample(count 7, names=[\"x\"])");
        assert!(script.diagnostics.is_empty(), "{:?}", script.diagnostics);
        assert_eq!(script.commands.len(), 2);

        let first = script.commands[0].args();
        assert_eq!(first.get_str("path"), Some("a.rsp"));
        assert_eq!(first.get_enum("mode"), Some("SLOW"));
        assert_eq!(first.get_int("count"), Some(4));
        assert_eq!(script.commands[0].line(), 1);
        assert_eq!(script.commands[1].line(), 2);
    }

    #[test]
    fn test_semicolons_and_comments() {
        let script = parse("# header\nsample(); sample() ;\n  # sample(count=2)\nsample(file=\"b\")");
        assert!(script.diagnostics.is_empty());
        assert_eq!(script.commands.len(), 3);
        assert_eq!(script.commands[2].args().get_str("path"), Some("b"));
        assert_eq!(script.commands[2].line(), 4);
    }

    #[test]
    fn test_missing_arguments_keep_defaults() {
        let script = parse("sample()");
        let args = script.commands[0].args();
        assert_eq!(args.get_int("count"), Some(1));
        assert_eq!(args.get_enum("mode"), Some("FAST"));
        assert!(!args.is_set("count"));
    }

    #[test]
    fn test_unknown_command_is_skipped() {
        let script = parse("bogus(a=1, b=\"x)\")\nsample(count=2)\nsample()");
        assert_eq!(script.error_count(), 1);
        assert_eq!(script.diagnostics[0].line, 1);
        assert_eq!(script.diagnostics[0].command.as_deref(), Some("bogus"));
        assert_eq!(script.commands.len(), 2);
        assert_eq!(script.commands[0].args().get_int("count"), Some(2));
    }

    #[test]
    fn test_unknown_argument_is_a_warning() {
        let script = parse("sample(colour=\"red\", count=3)");
        assert_eq!(script.error_count(), 0);
        assert_eq!(script.warning_count(), 1);
        assert_eq!(script.diagnostics[0].argument.as_deref(), Some("colour"));
        assert_eq!(script.commands[0].args().get_int("count"), Some(3));
    }

    #[test]
    fn test_internal_field_is_rejected() {
        let script = parse("sample(hidden=true)");
        assert_eq!(script.error_count(), 1);
        assert_eq!(script.commands[0].args().get_bool("hidden"), Some(false));
    }

    #[test]
    fn test_duplicate_argument_last_wins() {
        let script = parse("sample(count=1, count=5)");
        assert_eq!(script.warning_count(), 1);
        assert_eq!(script.commands[0].args().get_int("count"), Some(5));
    }

    #[test]
    fn test_bad_value_keeps_default_and_parsing_continues() {
        let script = parse("sample(count=abc, mode=SLOW)\nsample(count=2)");
        assert_eq!(script.error_count(), 1);
        assert_eq!(script.diagnostics[0].argument.as_deref(), Some("count"));
        let args = script.commands[0].args();
        assert_eq!(args.get_int("count"), Some(1));
        assert_eq!(args.get_enum("mode"), Some("SLOW"));
        assert_eq!(script.commands[1].args().get_int("count"), Some(2));
    }

    #[test]
    fn test_missing_array_end_reports_its_line() {
        let script = parse("sample()\n\nsample(names=[\"a\",\n  \"b\"\n)\nsample()");
        assert_eq!(script.error_count(), 1);
        assert_eq!(script.diagnostics[0].line, 4);
        assert_eq!(script.commands.len(), 3);
        assert_eq!(
            script.commands[1].args().get("names"),
            Some(&Value::from(vec!["a", "b"]))
        );
    }

    #[test]
    fn test_missing_close_paren() {
        let script = parse("sample(count=2,\n");
        assert_eq!(script.error_count(), 1);
        assert_eq!(script.diagnostics[0].line, 1);
        assert_eq!(script.commands.len(), 1);
    }

    #[test]
    fn test_missing_open_paren() {
        let script = parse("sample count=2\nsample()");
        assert_eq!(script.error_count(), 1);
        assert_eq!(script.commands.len(), 1);
        assert_eq!(script.commands[0].line(), 2);
    }

    #[test]
    fn test_recovery_stops_at_semicolon() {
        let script = parse("bogus ; sample(count=2) ; sample(count=3)");
        assert_eq!(script.error_count(), 1);
        assert_eq!(script.commands.len(), 2);
        assert_eq!(script.commands[1].args().get_int("count"), Some(3));

        let script = parse("sample ; sample(count=4)");
        assert_eq!(script.error_count(), 1);
        assert_eq!(script.commands.len(), 1);
        assert_eq!(script.commands[0].args().get_int("count"), Some(4));

        // A quoted ';' is not a boundary
        let script = parse("bogus \"a;b\" ; sample()");
        assert_eq!(script.error_count(), 1);
        assert_eq!(script.commands.len(), 1);
    }

    #[test]
    fn test_too_many_positional_arguments() {
        let script = parse("sample(\"a\", 1, FAST, [\"n\"], true)");
        assert_eq!(script.error_count(), 1);
        assert_eq!(script.commands.len(), 1);
    }

    #[test]
    fn test_separator_policy() {
        let registry = registry();
        let equals_only = ScriptParser::new(&registry).with_syntax(SyntaxConfig {
            argument_separator: ArgumentSeparator::Equals,
            ..SyntaxConfig::default()
        });
        let script = equals_only.parse("sample(count 2)", &NoObjects);
        assert_eq!(script.error_count(), 1);
        assert_eq!(script.commands[0].args().get_int("count"), Some(2));

        let named_only = ScriptParser::new(&registry).with_syntax(SyntaxConfig {
            allow_positional: false,
            ..SyntaxConfig::default()
        });
        let script = named_only.parse("sample(\"a\")", &NoObjects);
        assert_eq!(script.error_count(), 1);
        assert_eq!(script.commands[0].args().get_str("path"), Some(""));
    }

    #[test]
    fn test_trailing_garbage_after_value() {
        let script = parse("sample(count=2 3, mode=SLOW)");
        assert_eq!(script.error_count(), 1);
        let args = script.commands[0].args();
        assert_eq!(args.get_int("count"), Some(2));
        assert_eq!(args.get_enum("mode"), Some("SLOW"));
    }
}
