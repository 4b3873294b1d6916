//! Argument value types
//!
//! `ValueType` is the declared type of a command field; `Value` is a decoded
//! argument. Object references are `Class:id` handles into the id table of
//! the application, never pointers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name table of an enumerated argument type
///
/// Lookup is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumDef {
    pub name: &'static str,
    pub variants: &'static [&'static str],
}

impl EnumDef {
    pub const fn new(name: &'static str, variants: &'static [&'static str]) -> Self {
        Self { name, variants }
    }

    /// Resolve an identifier against the name table
    pub fn resolve(&self, text: &str) -> Option<&'static str> {
        self.variants.iter().copied().find(|v| *v == text)
    }
}

/// Declared type of a command field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueType {
    String,
    Bool,
    Int,
    Double,
    Enum(&'static EnumDef),
    /// Array of any non-reference type
    Array(&'static ValueType),
    /// Reference to one object of the named class
    ObjectRef(&'static str),
    /// Array of references to objects of the named class
    ObjectRefArray(&'static str),
}

impl ValueType {
    /// Human readable type name used in help text and diagnostics
    pub fn type_name(&self) -> String {
        match self {
            ValueType::String => "string".to_string(),
            ValueType::Bool => "bool".to_string(),
            ValueType::Int => "int".to_string(),
            ValueType::Double => "double".to_string(),
            ValueType::Enum(def) => def.name.to_string(),
            ValueType::Array(elem) => format!("[{}]", elem.type_name()),
            ValueType::ObjectRef(class) => format!("{}:id", class),
            ValueType::ObjectRefArray(class) => format!("[{}:id]", class),
        }
    }
}

/// Handle to an application object, written `Class:id` in scripts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub class: String,
    pub id: u64,
}

impl ObjectRef {
    pub fn new(class: impl Into<String>, id: u64) -> Self {
        Self {
            class: class.into(),
            id,
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.class, self.id)
    }
}

/// A decoded argument value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    Int(i64),
    Double(f64),
    /// Enum identifier, already resolved against its name table
    Enum(String),
    Array(Vec<Value>),
    /// `None` when the reference is null or could not be resolved
    ObjectRef(Option<ObjectRef>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::ObjectRef(r) => r.as_ref(),
            _ => None,
        }
    }

    /// A null object reference
    pub fn is_null_ref(&self) -> bool {
        matches!(self, Value::ObjectRef(None))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<ObjectRef> for Value {
    fn from(r: ObjectRef) -> Self {
        Value::ObjectRef(Some(r))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLORS: EnumDef = EnumDef::new("Color", &["RED", "GREEN"]);

    #[test]
    fn test_enum_resolution_is_case_sensitive() {
        assert_eq!(COLORS.resolve("RED"), Some("RED"));
        assert_eq!(COLORS.resolve("red"), None);
        assert_eq!(COLORS.resolve("BLUE"), None);
    }

    #[test]
    fn test_type_names() {
        static NAMES: ValueType = ValueType::Array(&ValueType::String);
        assert_eq!(NAMES.type_name(), "[string]");
        assert_eq!(ValueType::Enum(&COLORS).type_name(), "Color");
        assert_eq!(ValueType::ObjectRef("View").type_name(), "View:id");
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::from("a").as_str(), Some("a"));
        assert_eq!(Value::from(3).as_int(), Some(3));
        assert_eq!(Value::from(3).as_double(), Some(3.0));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(vec![1, 2]).as_array().map(|a| a.len()), Some(2));

        let r = Value::from(ObjectRef::new("Case", 4));
        assert_eq!(r.as_object().map(|o| o.to_string()), Some("Case:4".to_string()));
        assert!(Value::ObjectRef(None).is_null_ref());
    }
}
