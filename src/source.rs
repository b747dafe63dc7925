//! Read contract for value sources, plus the in-memory source.
//!
//! A source hands the resolver a flat map from dotted path to raw value. Raw
//! values are usually [`Value::Text`] and get typed by each option's converter;
//! sources that know better (JSON numbers, TOML booleans) may supply native
//! values instead.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::LayerfigError;
use crate::namespace::{Namespace, join};
use crate::value::Value;

/// Flat dotted-path → raw value mapping produced by a source.
pub type ValueMap = BTreeMap<String, Value>;

pub trait ValueSource {
    /// Where the values come from, for errors and logs.
    fn origin(&self) -> String;

    /// Everything this source can supply.
    ///
    /// `context` is the schema being resolved. With `ignore_mismatches` false,
    /// keys that match no option in `context` are an error; with true they are
    /// returned along with the rest.
    fn get_values(
        &self,
        context: &Namespace,
        ignore_mismatches: bool,
    ) -> Result<ValueMap, LayerfigError>;
}

/// Fail with [`LayerfigError::UnknownKeys`] if `values` has keys the schema
/// does not declare, unless mismatches are tolerated.
pub(crate) fn check_known_keys(
    values: &ValueMap,
    context: &Namespace,
    origin: &str,
    ignore_mismatches: bool,
) -> Result<(), LayerfigError> {
    let unknown: Vec<&String> = values
        .keys()
        .filter(|key| !context.contains_option(key))
        .collect();
    if unknown.is_empty() {
        return Ok(());
    }
    if ignore_mismatches {
        tracing::debug!(origin, keys = ?unknown, "source supplies keys with no matching option");
        return Ok(());
    }
    Err(LayerfigError::UnknownKeys(
        unknown
            .into_iter()
            .map(|key| LayerfigError::UnknownKey {
                key: key.clone(),
                origin: origin.to_string(),
            })
            .collect(),
    ))
}

/// Map a JSON scalar to a raw value. `null` means absent; arrays and objects
/// are kept as their JSON text.
pub(crate) fn json_scalar(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Value::Int(i))
            } else if let Some(u) = n.as_u64() {
                Some(Value::Long(i128::from(u)))
            } else {
                n.as_f64().map(Value::Float)
            }
        }
        serde_json::Value::String(s) => Some(Value::Text(s.clone())),
        other => Some(Value::Text(other.to_string())),
    }
}

/// Flatten nested JSON objects into dotted keys.
pub(crate) fn flatten_json(prefix: &str, value: &serde_json::Value, out: &mut ValueMap) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                flatten_json(&join(prefix, key), child, out);
            }
        }
        scalar => {
            if let Some(v) = json_scalar(scalar) {
                out.insert(prefix.to_string(), v);
            }
        }
    }
}

/// An in-memory mapping: programmatic overrides, test data, or values pulled
/// from another system.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapSource {
    origin: String,
    values: ValueMap,
}

impl MapSource {
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.to_string(),
            values: ValueMap::new(),
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            origin: "overrides".into(),
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Build from any serializable value. Nested structs and maps become
    /// dotted keys; `None` fields are skipped.
    pub fn from_serialize<S: Serialize>(source: &S) -> Result<Self, LayerfigError> {
        let json = serde_json::to_value(source).map_err(|e| LayerfigError::JsonError {
            origin: "serialized overrides".into(),
            source: e,
        })?;
        let mut values = ValueMap::new();
        flatten_json("", &json, &mut values);
        Ok(Self {
            origin: "serialized overrides".into(),
            values,
        })
    }

    pub fn insert(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn values(&self) -> &ValueMap {
        &self.values
    }
}

impl ValueSource for MapSource {
    fn origin(&self) -> String {
        self.origin.clone()
    }

    fn get_values(
        &self,
        context: &Namespace,
        ignore_mismatches: bool,
    ) -> Result<ValueMap, LayerfigError> {
        check_known_keys(&self.values, context, &self.origin, ignore_mismatches)?;
        Ok(self.values.clone())
    }
}

impl ValueSource for ValueMap {
    fn origin(&self) -> String {
        "mapping".into()
    }

    fn get_values(
        &self,
        context: &Namespace,
        ignore_mismatches: bool,
    ) -> Result<ValueMap, LayerfigError> {
        check_known_keys(self, context, "mapping", ignore_mismatches)?;
        Ok(self.clone())
    }
}
