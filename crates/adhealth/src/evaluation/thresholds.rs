use super::catalog::CatalogError;
use super::record::FieldValue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Run-level named values referenced by rule conditions.
///
/// Nested JSON objects are flattened into dotted names, so
/// `{"Replication": {"MaxLagMinutes": 60}}` is addressed as
/// `Replication.MaxLagMinutes`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct ThresholdSet {
    values: BTreeMap<String, FieldValue>,
}

impl ThresholdSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let map: Map<String, Value> = serde_json::from_reader(reader)?;
        Ok(Self::from(map))
    }

    /// Exact name first, then an ASCII case-insensitive match.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name).or_else(|| {
            self.values
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn flatten_into(
    prefix: Option<&str>,
    map: Map<String, Value>,
    out: &mut BTreeMap<String, FieldValue>,
) {
    for (key, value) in map {
        let name = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key,
        };
        match value {
            Value::Object(nested) => flatten_into(Some(&name), nested, out),
            other => {
                out.insert(name, FieldValue::from(other));
            }
        }
    }
}

impl From<Map<String, Value>> for ThresholdSet {
    fn from(map: Map<String, Value>) -> Self {
        let mut values = BTreeMap::new();
        flatten_into(None, map, &mut values);
        Self { values }
    }
}

impl From<ThresholdSet> for Map<String, Value> {
    fn from(set: ThresholdSet) -> Self {
        set.values
            .into_iter()
            .map(|(name, value)| (name, Value::from(value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_sections_flatten_to_dotted_names() {
        let set: ThresholdSet = serde_json::from_value(json!({
            "MaxTimeSkewSeconds": 300,
            "Replication": { "MaxLagMinutes": 60, "AlertOnFailure": true }
        }))
        .expect("thresholds decode");

        assert_eq!(set.len(), 3);
        assert_eq!(
            set.get("Replication.MaxLagMinutes").and_then(FieldValue::as_f64),
            Some(60.0)
        );
        assert_eq!(
            set.get("replication.alertonfailure").and_then(FieldValue::as_bool),
            Some(true)
        );
    }

    #[test]
    fn reader_rejects_non_object_documents() {
        let result = ThresholdSet::from_reader("[1, 2, 3]".as_bytes());
        assert!(matches!(result, Err(CatalogError::Json(_))));
    }
}
