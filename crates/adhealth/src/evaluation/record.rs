use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Typed value of a single collected field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    /// Objects and arrays nested inside a record are carried verbatim.
    Nested(Value),
}

impl FieldValue {
    /// A field counts as populated when it is neither null nor blank text.
    pub fn is_populated(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Text(text) => !text.trim().is_empty(),
            _ => true,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(value) => Some(*value),
            FieldValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(number) => number.as_f64(),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(value) => write!(f, "{value}"),
            FieldValue::Number(number) => write!(f, "{number}"),
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Nested(value) => write!(f, "{value}"),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(value) => FieldValue::Bool(value),
            Value::Number(number) => FieldValue::Number(number),
            Value::String(text) => FieldValue::Text(text),
            nested @ (Value::Array(_) | Value::Object(_)) => FieldValue::Nested(nested),
        }
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(value) => Value::Bool(value),
            FieldValue::Number(number) => Value::Number(number),
            FieldValue::Text(text) => Value::String(text),
            FieldValue::Nested(value) => value,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(FieldValue::Null, FieldValue::Number)
    }
}

/// One collected record: field names mapped to typed values, in collection order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert used by fixtures and collectors alike.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Replaces an existing field of the same name or appends a new one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Looks a field up by exact name, falling back to an ASCII case-insensitive match.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|(field, _)| field.eq_ignore_ascii_case(name))
            })
            .map(|(_, value)| value)
    }

    /// Display text of a populated field.
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name)
            .filter(|value| value.is_populated())
            .map(ToString::to_string)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(FieldValue::as_bool)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            fields: map
                .into_iter()
                .map(|(name, value)| (name, FieldValue::from(value)))
                .collect(),
        }
    }
}

impl From<Record> for Map<String, Value> {
    fn from(record: Record) -> Self {
        record
            .fields
            .into_iter()
            .map(|(name, value)| (name, Value::from(value)))
            .collect()
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.into())
    }
}

/// Facts a check collected, in one of the two shapes collectors emit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum RawOutput {
    /// Nothing was collected.
    #[default]
    Empty,
    Scalar(Record),
    Sequence(Vec<Record>),
}

impl RawOutput {
    pub fn to_value(&self) -> Value {
        Value::from(self.clone())
    }
}

fn wrap_primitive(value: Value) -> Record {
    Record::new().with("Value", FieldValue::from(value))
}

impl From<Value> for RawOutput {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RawOutput::Empty,
            Value::Object(map) => RawOutput::Scalar(Record::from(map)),
            Value::Array(items) => RawOutput::Sequence(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(map) => Record::from(map),
                        other => wrap_primitive(other),
                    })
                    .collect(),
            ),
            primitive => RawOutput::Scalar(wrap_primitive(primitive)),
        }
    }
}

impl From<RawOutput> for Value {
    fn from(output: RawOutput) -> Self {
        match output {
            RawOutput::Empty => Value::Null,
            RawOutput::Scalar(record) => Value::from(record),
            RawOutput::Sequence(records) => {
                Value::Array(records.into_iter().map(Value::from).collect())
            }
        }
    }
}
