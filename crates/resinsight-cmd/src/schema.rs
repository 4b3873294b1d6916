//! Command field schemas
//!
//! Each command declares an ordered list of [`FieldDef`]s. A fresh command
//! instance starts with every field at its default; parsing then overwrites
//! the fields named in the script.

use crate::value::{ObjectRef, Value, ValueType};

/// Default value of a field, in a form usable in `static` schemas
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Str(&'static str),
    Bool(bool),
    Int(i64),
    Double(f64),
    Enum(&'static str),
    EmptyArray,
    NullRef,
}

impl FieldDefault {
    pub fn to_value(&self) -> Value {
        match self {
            FieldDefault::Str(s) => Value::String((*s).to_string()),
            FieldDefault::Bool(b) => Value::Bool(*b),
            FieldDefault::Int(i) => Value::Int(*i),
            FieldDefault::Double(d) => Value::Double(*d),
            FieldDefault::Enum(name) => Value::Enum((*name).to_string()),
            FieldDefault::EmptyArray => Value::Array(Vec::new()),
            FieldDefault::NullRef => Value::ObjectRef(None),
        }
    }
}

/// A named, typed field of a command
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: ValueType,
    pub default: FieldDefault,
    /// Whether the field may be given in script text
    pub scriptable: bool,
    /// Alternative name accepted in scripts
    pub alias: Option<&'static str>,
    pub help: &'static str,
}

impl FieldDef {
    pub const fn new(name: &'static str, ty: ValueType, default: FieldDefault) -> Self {
        Self {
            name,
            ty,
            default,
            scriptable: true,
            alias: None,
            help: "",
        }
    }

    pub const fn alias(self, alias: &'static str) -> Self {
        Self {
            alias: Some(alias),
            ..self
        }
    }

    /// Whether `name` refers to this field
    pub fn accepts(&self, name: &str) -> bool {
        self.name == name || self.alias == Some(name)
    }

    pub const fn help(self, help: &'static str) -> Self {
        Self { help, ..self }
    }

    /// Mark the field as internal: it keeps its default and may not appear
    /// in scripts
    pub const fn internal(self) -> Self {
        Self {
            scriptable: false,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FieldValue {
    name: String,
    value: Value,
    /// Set from script text rather than left at the default
    explicit: bool,
}

/// Field values of one command instance, in schema order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandArgs {
    values: Vec<FieldValue>,
}

impl CommandArgs {
    /// Every field at its default
    pub fn from_defaults(fields: &[FieldDef]) -> Self {
        Self {
            values: fields
                .iter()
                .map(|f| FieldValue {
                    name: f.name.to_string(),
                    value: f.default.to_value(),
                    explicit: false,
                })
                .collect(),
        }
    }

    /// Overwrite a field; returns `false` if the field does not exist
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.values.iter_mut().find(|f| f.name == name) {
            Some(field) => {
                field.value = value;
                field.explicit = true;
                true
            }
            None => false,
        }
    }

    /// Builder form of [`set`](Self::set)
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// Whether the script gave this field explicitly
    pub fn is_set(&self, name: &str) -> bool {
        self.values.iter().any(|f| f.name == name && f.explicit)
    }

    /// Iterate over `(name, value)` in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|f| (f.name.as_str(), &f.value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_str_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get_str(name).unwrap_or(default)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn get_int_or(&self, name: &str, default: i64) -> i64 {
        self.get_int(name).unwrap_or(default)
    }

    pub fn get_double(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_double)
    }

    pub fn get_double_or(&self, name: &str, default: f64) -> f64 {
        self.get_double(name).unwrap_or(default)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_bool_or(&self, name: &str, default: bool) -> bool {
        self.get_bool(name).unwrap_or(default)
    }

    /// Enum identifier of a field
    pub fn get_enum(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::Enum(e)) => Some(e),
            _ => None,
        }
    }

    /// Non-null object reference of a field
    pub fn get_object(&self, name: &str) -> Option<&ObjectRef> {
        self.get(name).and_then(Value::as_object)
    }

    /// Resolved references of a reference array, skipping null slots
    pub fn get_objects(&self, name: &str) -> Vec<&ObjectRef> {
        self.get(name)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_object).collect())
            .unwrap_or_default()
    }

    pub fn get_str_list(&self, name: &str) -> Vec<String> {
        self.get(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_int_list(&self, name: &str) -> Vec<i64> {
        self.get(name)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_int).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static FIELDS: &[FieldDef] = &[
        FieldDef::new("path", ValueType::String, FieldDefault::Str("")).help("Project file"),
        FieldDef::new("caseId", ValueType::Int, FieldDefault::Int(-1)).alias("id"),
        FieldDef::new("names", ValueType::Array(&ValueType::String), FieldDefault::EmptyArray),
        FieldDef::new("view", ValueType::ObjectRef("View"), FieldDefault::NullRef).internal(),
    ];

    #[test]
    fn test_defaults() {
        let args = CommandArgs::from_defaults(FIELDS);
        assert_eq!(args.len(), 4);
        assert_eq!(args.get_str("path"), Some(""));
        assert_eq!(args.get_int("caseId"), Some(-1));
        assert!(args.get_str_list("names").is_empty());
        assert!(args.get_object("view").is_none());
        assert!(!args.is_set("caseId"));
        assert!(!FIELDS[3].scriptable);
        assert_eq!(FIELDS[0].help, "Project file");
        assert!(FIELDS[1].accepts("id"));
        assert!(FIELDS[1].accepts("caseId"));
        assert!(!FIELDS[0].accepts("id"));
    }

    #[test]
    fn test_set_and_get() {
        let mut args = CommandArgs::from_defaults(FIELDS);
        assert!(args.set("caseId", Value::Int(3)));
        assert!(!args.set("unknown", Value::Int(3)));
        assert!(args.is_set("caseId"));
        assert_eq!(args.get_int_or("caseId", 0), 3);

        let args = args.with("names", vec!["A", "B"]);
        assert_eq!(args.get_str_list("names"), vec!["A".to_string(), "B".to_string()]);

        let order: Vec<&str> = args.iter().map(|(n, _)| n).collect();
        assert_eq!(order, vec!["path", "caseId", "names", "view"]);
    }

    #[test]
    fn test_get_objects_skips_nulls() {
        let args = CommandArgs::from_defaults(FIELDS).with(
            "names",
            Value::Array(vec![
                Value::ObjectRef(Some(ObjectRef::new("View", 1))),
                Value::ObjectRef(None),
            ]),
        );
        assert_eq!(args.get_objects("names").len(), 1);
    }
}
