//! Parse-time diagnostics and the shared script cursor
//!
//! All parsing code reads the script through a single [`DiagnosticsCollector`],
//! so the line counter stays correct no matter which routine consumed the
//! newline. Warnings and errors are stamped with the current line and with
//! the command/argument being parsed at the time.

use std::fmt;

use nom::IResult;

/// Severity of a parse-time diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A warning or error found while reading a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// 1-based source line
    pub line: usize,
    pub text: String,
    /// Keyword of the command being parsed, if any
    pub command: Option<String>,
    /// Argument being parsed, if any
    pub argument: Option<String>,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.severity, self.text)?;
        match (&self.argument, &self.command) {
            (Some(arg), Some(cmd)) => write!(f, " (argument \"{}\" of command \"{}\")", arg, cmd),
            (None, Some(cmd)) => write!(f, " (command \"{}\")", cmd),
            _ => Ok(()),
        }
    }
}

/// Line-counting cursor over script text that accumulates diagnostics
///
/// Diagnostics are only ever appended. An error never stops the cursor, so a
/// caller can keep reading and report every problem in the file.
#[derive(Debug)]
pub struct DiagnosticsCollector<'a> {
    input: &'a str,
    /// Byte offset of the next unread character
    pos: usize,
    line: usize,
    current_command: Option<String>,
    current_argument: Option<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> DiagnosticsCollector<'a> {
    /// Start reading `input` at line 1
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            current_command: None,
            current_argument: None,
            diagnostics: Vec::new(),
        }
    }

    /// Current 1-based line number
    pub fn line(&self) -> usize {
        self.line
    }

    /// Unread remainder of the input
    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Look at the next character without consuming it
    pub fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Consume one character, counting newlines
    ///
    /// Returns `None` at end of input.
    pub fn read_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Consume characters while they are whitespace
    pub fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.read_char();
        }
    }

    /// Consume everything up to and including the next newline
    pub fn skip_line(&mut self) {
        while let Some(c) = self.read_char() {
            if c == '\n' {
                break;
            }
        }
    }

    /// Run a nom parser on the unread input and advance past what it matched
    ///
    /// On failure nothing is consumed.
    pub fn scan<O, F>(&mut self, mut parser: F) -> Option<O>
    where
        F: FnMut(&'a str) -> IResult<&'a str, O>,
    {
        let rest = self.remaining();
        match parser(rest) {
            Ok((after, out)) => {
                let consumed = rest.len() - after.len();
                self.advance(consumed);
                Some(out)
            }
            Err(_) => None,
        }
    }

    fn advance(&mut self, bytes: usize) {
        let end = (self.pos + bytes).min(self.input.len());
        self.line += self.input[self.pos..end].matches('\n').count();
        self.pos = end;
    }

    /// Set the command whose text is being parsed
    pub fn set_current_command(&mut self, keyword: impl Into<String>) {
        self.current_command = Some(keyword.into());
        self.current_argument = None;
    }

    /// Set the argument whose value is being parsed
    pub fn set_current_argument(&mut self, name: impl Into<String>) {
        self.current_argument = Some(name.into());
    }

    pub fn clear_argument(&mut self) {
        self.current_argument = None;
    }

    /// Forget the current command and argument
    pub fn clear_context(&mut self) {
        self.current_command = None;
        self.current_argument = None;
    }

    pub fn current_command(&self) -> Option<&str> {
        self.current_command.as_deref()
    }

    pub fn current_argument(&self) -> Option<&str> {
        self.current_argument.as_deref()
    }

    pub fn add_warning(&mut self, text: impl Into<String>) {
        self.push(Severity::Warning, self.line, text.into());
    }

    pub fn add_error(&mut self, text: impl Into<String>) {
        self.push(Severity::Error, self.line, text.into());
    }

    /// Record an error against an earlier line, e.g. where an unterminated
    /// token started
    pub fn add_error_at(&mut self, line: usize, text: impl Into<String>) {
        self.push(Severity::Error, line, text.into());
    }

    fn push(&mut self, severity: Severity, line: usize, text: String) {
        log::debug!("line {}: {}: {}", line, severity, text);
        self.diagnostics.push(Diagnostic {
            severity,
            line,
            text,
            command: self.current_command.clone(),
            argument: self.current_argument.clone(),
        });
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
