//! Textual encoding and decoding of argument values
//!
//! Every decoder reads from the shared [`DiagnosticsCollector`] and reports
//! problems there instead of failing. A decoder returns `None` only when the
//! field should keep its previous value (malformed number, unknown enum
//! name, missing array start); strings and booleans always produce a
//! best-effort value.
//!
//! # Grammar
//!
//! - strings: `"text"`, backslash takes the next character literally
//! - booleans: `true` / `false`, case-insensitive, optionally quoted
//! - numbers: standard float syntax, written back with 15 significant digits
//! - enums: bare identifier, optionally quoted
//! - arrays: `[a, b, c]`
//! - object references: `Class:id`

use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::satisfy,
    combinator::not,
    number::complete::recognize_float,
    sequence::terminated,
};

use crate::application::ObjectTable;
use crate::diagnostics::DiagnosticsCollector;
use crate::error::ParseError;
use crate::value::{EnumDef, ObjectRef, Value, ValueType};

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Characters that end an unquoted token
fn is_token_end(c: char) -> bool {
    matches!(c, ',' | ')' | ']' | ';' | '\n' | '\r')
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a value of type `ty` from the reader
///
/// `objects` resolves `Class:id` references; unresolved references decode
/// to a null reference. Nothing is decoded at the end of input.
pub fn parse_value(
    reader: &mut DiagnosticsCollector<'_>,
    ty: &ValueType,
    objects: &dyn ObjectTable,
) -> Option<Value> {
    reader.skip_whitespace();
    if reader.at_end() {
        reader.add_error(ParseError::UnexpectedEof.to_string());
        return None;
    }

    match ty {
        ValueType::String => Some(Value::String(parse_string(reader))),
        ValueType::Bool => Some(Value::Bool(parse_bool(reader))),
        ValueType::Int => parse_int(reader).map(Value::Int),
        ValueType::Double => parse_double(reader).map(Value::Double),
        ValueType::Enum(def) => parse_enum(reader, def).map(Value::Enum),
        ValueType::Array(elem) => parse_array(reader, elem, objects).map(Value::Array),
        ValueType::ObjectRef(class) => Some(Value::ObjectRef(parse_object_ref(reader, class, objects))),
        ValueType::ObjectRefArray(class) => {
            parse_object_ref_array(reader, class, objects).map(|refs| {
                Value::Array(refs.into_iter().map(Value::ObjectRef).collect())
            })
        }
    }
}

/// Decode a quoted string
///
/// A missing quote is reported but the accumulated text is still returned.
/// The bare token `None` decodes to an empty string.
pub fn parse_string(reader: &mut DiagnosticsCollector<'_>) -> String {
    reader.skip_whitespace();

    if reader.peek_char() != Some('"') {
        if reader
            .scan(|i| terminated(tag("None"), not(satisfy(is_ident_char)))(i))
            .is_some()
        {
            return String::new();
        }
        reader.add_error(ParseError::MissingOpeningQuote.to_string());
        return read_unquoted(reader, is_token_end);
    }

    let start_line = reader.line();
    reader.read_char();

    let mut text = String::new();
    loop {
        match reader.read_char() {
            Some('"') => return text,
            Some('\\') => match reader.read_char() {
                Some(c) => text.push(c),
                None => break,
            },
            Some(c) => text.push(c),
            None => break,
        }
    }

    reader.add_error_at(start_line, ParseError::MissingClosingQuote.to_string());
    text
}

/// Read raw characters until `stop` matches, trimming trailing whitespace
fn read_unquoted(reader: &mut DiagnosticsCollector<'_>, stop: fn(char) -> bool) -> String {
    let mut text = String::new();
    while let Some(c) = reader.peek_char() {
        if stop(c) {
            break;
        }
        text.push(c);
        reader.read_char();
    }
    text.truncate(text.trim_end().len());
    text
}

/// Decode `true`/`false` in any letter case
///
/// The token may be quoted. Anything else is an error and decodes as
/// `false`; the whole offending token is consumed.
pub fn parse_bool(reader: &mut DiagnosticsCollector<'_>) -> bool {
    reader.skip_whitespace();
    let token = if reader.peek_char() == Some('"') {
        parse_string(reader)
    } else {
        read_unquoted(reader, |c| is_token_end(c) || c.is_whitespace())
    };

    if token.eq_ignore_ascii_case("true") {
        true
    } else if token.eq_ignore_ascii_case("false") {
        false
    } else {
        reader.add_error(ParseError::InvalidBool(token).to_string());
        false
    }
}

/// Scan a numeric token; on failure the offending token is consumed and
/// reported
fn scan_number(reader: &mut DiagnosticsCollector<'_>) -> Option<String> {
    reader.skip_whitespace();
    let number = reader.scan(|i| recognize_float(i));

    let trailing_junk = reader.peek_char().is_some_and(|c| is_ident_char(c) || c == '.');
    match number {
        Some(token) if !trailing_junk => Some(token.to_string()),
        partial => {
            let mut token = partial.unwrap_or_default().to_string();
            token.push_str(&read_unquoted(reader, |c| is_token_end(c) || c.is_whitespace()));
            reader.add_error(ParseError::InvalidNumber(token).to_string());
            None
        }
    }
}

/// Decode an integer; `None` leaves the field at its previous value
pub fn parse_int(reader: &mut DiagnosticsCollector<'_>) -> Option<i64> {
    let token = scan_number(reader)?;
    match token.parse::<i64>() {
        Ok(i) => Some(i),
        Err(_) => {
            reader.add_error(ParseError::InvalidNumber(token).to_string());
            None
        }
    }
}

/// Decode a floating point number; `None` leaves the field at its previous
/// value
pub fn parse_double(reader: &mut DiagnosticsCollector<'_>) -> Option<f64> {
    let token = scan_number(reader)?;
    match token.parse::<f64>() {
        Ok(d) => Some(d),
        Err(_) => {
            reader.add_error(ParseError::InvalidNumber(token).to_string());
            None
        }
    }
}

/// Decode an enum identifier, bare or quoted
pub fn parse_enum(reader: &mut DiagnosticsCollector<'_>, def: &EnumDef) -> Option<String> {
    reader.skip_whitespace();
    let token = if reader.peek_char() == Some('"') {
        parse_string(reader)
    } else {
        reader
            .scan(|i| take_while1(is_ident_char)(i))
            .unwrap_or_default()
            .to_string()
    };

    match def.resolve(&token) {
        Some(name) => Some(name.to_string()),
        None => {
            reader.add_error(
                ParseError::UnknownEnumValue {
                    enum_name: def.name.to_string(),
                    value: token,
                }
                .to_string(),
            );
            None
        }
    }
}

/// Walk a `[a, b, c]` list, calling `element` for each element
///
/// Returns `false` when the opening bracket is missing. A missing closing
/// bracket is reported at the line where the list stopped.
fn parse_bracketed<F>(reader: &mut DiagnosticsCollector<'_>, mut element: F) -> bool
where
    F: FnMut(&mut DiagnosticsCollector<'_>),
{
    reader.skip_whitespace();
    if reader.peek_char() != Some('[') {
        reader.add_error(ParseError::MissingArrayStart.to_string());
        return false;
    }
    reader.read_char();

    loop {
        let line_before = reader.line();
        reader.skip_whitespace();
        match reader.peek_char() {
            Some(']') => {
                reader.read_char();
                return true;
            }
            Some(',') => {
                reader.read_char();
            }
            None | Some(')') | Some(';') => {
                reader.add_error_at(line_before, ParseError::MissingArrayEnd.to_string());
                return true;
            }
            Some(_) => {
                let before = reader.remaining().len();
                element(reader);
                if reader.remaining().len() == before {
                    // Nothing consumed; step over the character to make progress
                    reader.read_char();
                }
            }
        }
    }
}

/// Decode an array of non-reference values
///
/// Elements that fail to decode are dropped after their error is reported.
pub fn parse_array(
    reader: &mut DiagnosticsCollector<'_>,
    elem: &ValueType,
    objects: &dyn ObjectTable,
) -> Option<Vec<Value>> {
    let mut items = Vec::new();
    let ok = parse_bracketed(reader, |r| {
        if let Some(v) = parse_value(r, elem, objects) {
            items.push(v);
        }
    });
    ok.then_some(items)
}

/// Split and resolve a `Class:id` token
fn resolve_object_ref(
    reader: &mut DiagnosticsCollector<'_>,
    token: &str,
    class: &str,
    objects: &dyn ObjectTable,
) -> Option<ObjectRef> {
    let Some((found_class, id)) = token.split_once(':') else {
        reader.add_error(ParseError::MalformedObjectRef(token.to_string()).to_string());
        return None;
    };
    let Ok(id) = id.trim().parse::<u64>() else {
        reader.add_error(ParseError::MalformedObjectRef(token.to_string()).to_string());
        return None;
    };
    let found_class = found_class.trim();
    if found_class != class {
        reader.add_error(
            ParseError::WrongObjectClass {
                expected: class.to_string(),
                found: token.to_string(),
            }
            .to_string(),
        );
        return None;
    }

    if objects.contains(class, id) {
        Some(ObjectRef::new(class, id))
    } else {
        reader.add_warning(format!("{}:{} does not refer to a known object", class, id));
        None
    }
}

/// Read an unquoted reference token
fn read_ref_token(reader: &mut DiagnosticsCollector<'_>) -> String {
    reader.skip_whitespace();
    read_unquoted(reader, |c| is_token_end(c) || c.is_whitespace())
}

/// Decode a single `Class:id` reference; an empty token is a null reference
pub fn parse_object_ref(
    reader: &mut DiagnosticsCollector<'_>,
    class: &str,
    objects: &dyn ObjectTable,
) -> Option<ObjectRef> {
    let token = read_ref_token(reader);
    if token.is_empty() {
        return None;
    }
    resolve_object_ref(reader, &token, class, objects)
}

/// Decode `[Class:id, ...]`; unresolved elements become null references
pub fn parse_object_ref_array(
    reader: &mut DiagnosticsCollector<'_>,
    class: &str,
    objects: &dyn ObjectTable,
) -> Option<Vec<Option<ObjectRef>>> {
    let mut refs = Vec::new();
    let ok = parse_bracketed(reader, |r| {
        let token = read_ref_token(r);
        if !token.is_empty() {
            let resolved = resolve_object_ref(r, &token, class, objects);
            refs.push(resolved);
        }
    });
    ok.then_some(refs)
}

// ============================================================================
// Encoding
// ============================================================================

/// Quote a string, escaping `"` and `\`
pub fn write_string(text: &str, out: &mut String) {
    out.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

/// Scientific notation with 15 significant digits
pub fn write_double(value: f64, out: &mut String) {
    out.push_str(&format!("{:.14e}", value));
}

/// Encode a value in script syntax
///
/// Enums are written as bare identifiers. A null object reference writes
/// nothing; null slots in reference arrays are skipped.
pub fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => write_string(s, out),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(i) => out.push_str(&i.to_string()),
        Value::Double(d) => write_double(*d, out),
        Value::Enum(name) => out.push_str(name),
        Value::Array(items) => {
            out.push('[');
            let mut first = true;
            for item in items.iter().filter(|v| !v.is_null_ref()) {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                write_value(item, out);
            }
            out.push(']');
        }
        Value::ObjectRef(Some(r)) => out.push_str(&r.to_string()),
        Value::ObjectRef(None) => {}
    }
}

/// Encode a value into a new string
pub fn encode(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}
