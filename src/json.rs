//! The reference JSON format.
//!
//! Written files are a map from each option's dotted path to its record:
//!
//! ```json
//! {
//!   "aaa": {
//!     "name": "aaa",
//!     "default": "2011-05-04T15:10:00",
//!     "doc": "the a",
//!     "value": "2011-05-04T15:10:00",
//!     "short_form": "a",
//!     "from_string_converter": "datetime.datetime_from_iso"
//!   }
//! }
//! ```
//!
//! On read, record-shaped entries contribute their `value` (or `default`), and
//! plain nested objects such as `{"database": {"url": "..."}}` are accepted too.
//! An object is only taken as a record when it names itself or holds nothing
//! but record fields, and never where the schema declares a namespace.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value as Json};

use crate::convert::{self, CONVERTER};
use crate::error::{ConvertError, LayerfigError};
use crate::namespace::{Namespace, Node, join};
use crate::option::OptionSpec;
use crate::source::{ValueMap, ValueSource, check_known_keys, json_scalar};
use crate::writer::{OptionEntry, ValueSink};

#[derive(Debug, Clone)]
enum Input {
    Path(PathBuf),
    Text { origin: String, content: String },
    Parsed(Map<String, Json>),
}

/// Values from a JSON document on disk or in memory.
#[derive(Debug, Clone)]
pub struct JsonSource {
    input: Input,
}

impl JsonSource {
    /// Read `path` each time values are requested.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            input: Input::Path(path.into()),
        }
    }

    pub fn from_text(content: &str) -> Self {
        Self {
            input: Input::Text {
                origin: "JSON text".into(),
                content: content.to_string(),
            },
        }
    }

    /// An already-parsed document, e.g. one loaded from a previous write.
    pub fn from_map(map: Map<String, Json>) -> Self {
        Self {
            input: Input::Parsed(map),
        }
    }

    fn load(&self) -> Result<Map<String, Json>, LayerfigError> {
        match &self.input {
            Input::Path(path) => {
                let file = File::open(path).map_err(|e| LayerfigError::IoError {
                    path: path.clone(),
                    source: e,
                })?;
                serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                    LayerfigError::JsonError {
                        origin: path.display().to_string(),
                        source: e,
                    }
                })
            }
            Input::Text { origin, content } => {
                serde_json::from_str(content).map_err(|e| LayerfigError::JsonError {
                    origin: origin.clone(),
                    source: e,
                })
            }
            Input::Parsed(map) => Ok(map.clone()),
        }
    }
}

impl ValueSource for JsonSource {
    fn origin(&self) -> String {
        match &self.input {
            Input::Path(path) => path.display().to_string(),
            Input::Text { origin, .. } => origin.clone(),
            Input::Parsed(_) => "JSON document".into(),
        }
    }

    fn get_values(
        &self,
        context: &Namespace,
        ignore_mismatches: bool,
    ) -> Result<ValueMap, LayerfigError> {
        let map = self.load()?;
        let mut values = ValueMap::new();
        collect_values(context, "", &map, &mut values);
        check_known_keys(&values, context, &self.origin(), ignore_mismatches)?;
        Ok(values)
    }
}

const RECORD_FIELDS: [&str; 6] = [
    "name",
    "default",
    "doc",
    "value",
    "short_form",
    "from_string_converter",
];

/// An object at `path` is a record when it carries a `value` or `default`
/// field and either names itself or holds nothing but record fields. Where
/// `schema` declares a namespace at `path` the object is always a namespace,
/// so options called `default` or `value` read as plain nested keys.
fn is_record(schema: &Namespace, path: &str, json: &Json) -> bool {
    if matches!(schema.get(path), Some(Node::Namespace(_))) {
        return false;
    }
    json.as_object().is_some_and(|obj| {
        (obj.contains_key("value") || obj.contains_key("default"))
            && (obj.contains_key("name")
                || obj.keys().all(|key| RECORD_FIELDS.contains(&key.as_str())))
    })
}

fn collect_values(schema: &Namespace, prefix: &str, map: &Map<String, Json>, out: &mut ValueMap) {
    for (key, child) in map {
        let path = join(prefix, key);
        match child {
            record if is_record(schema, &path, record) => {
                let value = record
                    .get("value")
                    .and_then(json_scalar)
                    .or_else(|| record.get("default").and_then(json_scalar));
                if let Some(value) = value {
                    out.insert(path, value);
                }
            }
            Json::Object(children) => collect_values(schema, &path, children, out),
            scalar => {
                if let Some(value) = json_scalar(scalar) {
                    out.insert(path, value);
                }
            }
        }
    }
}

/// Writes the record map, pretty-printed, in declaration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSink;

impl ValueSink for JsonSink {
    fn write<'a, I>(entries: I, out: &mut dyn Write) -> Result<(), LayerfigError>
    where
        I: IntoIterator<Item = OptionEntry<'a>>,
    {
        let mut records = Map::new();
        for entry in entries {
            let record = entry.record();
            let json = serde_json::to_value(&record).map_err(|e| LayerfigError::JsonError {
                origin: record.name.clone(),
                source: e,
            })?;
            records.insert(record.name, json);
        }
        serde_json::to_writer_pretty(&mut *out, &records)
            .map_err(|e| LayerfigError::Write(e.into()))?;
        out.write_all(b"\n").map_err(LayerfigError::Write)
    }
}

/// The record as it may appear on read: every field optional, typed loosely.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecordIn {
    #[allow(dead_code)]
    name: Option<String>,
    default: Option<Json>,
    doc: Option<String>,
    value: Option<Json>,
    short_form: Option<String>,
    from_string_converter: Option<String>,
}

fn spec_from_record(path: &str, json: &Json) -> Result<OptionSpec, LayerfigError> {
    let mut unknown = Vec::new();
    let record: RecordIn = serde_ignored::deserialize(json.clone(), |field| {
        unknown.push(field.to_string());
    })
    .map_err(|e| LayerfigError::JsonError {
        origin: path.to_string(),
        source: e,
    })?;

    let from_string_converter = match record.from_string_converter {
        Some(id) => Some(convert::lookup(&id).ok_or_else(|| {
            LayerfigError::conversion(
                path,
                ConvertError {
                    value: id.clone(),
                    converter: CONVERTER.id().to_string(),
                    reason: "no converter registered under this id".into(),
                },
            )
        })?),
        None => None,
    };

    let short_form = match record.short_form.as_deref() {
        None | Some("") => None,
        Some(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => {
                    return Err(LayerfigError::SchemaConflict {
                        key: path.to_string(),
                        reason: format!("short form '{s}' is not a single character"),
                    });
                }
            }
        }
    };

    let extras = unknown
        .into_iter()
        .filter_map(|key| json.get(&key).map(|v| (key, v.clone())))
        .collect();

    Ok(OptionSpec {
        name: Some(path.to_string()),
        default: record.default.as_ref().and_then(json_scalar),
        doc: record.doc,
        value: record.value.as_ref().and_then(json_scalar),
        short_form,
        from_string_converter,
        extras,
    })
}

fn add_records(
    namespace: &mut Namespace,
    prefix: &str,
    map: &Map<String, Json>,
) -> Result<(), LayerfigError> {
    for (key, child) in map {
        let path = join(prefix, key);
        match child {
            record if is_record(namespace, &path, record) => {
                namespace.add_option(spec_from_record(&path, record)?)?;
            }
            Json::Object(children) => {
                namespace.namespace(&path)?;
                add_records(namespace, &path, children)?;
            }
            scalar => {
                namespace.add_option(OptionSpec {
                    name: Some(path),
                    default: json_scalar(scalar),
                    ..OptionSpec::default()
                })?;
            }
        }
    }
    Ok(())
}

impl Namespace {
    /// Build a schema from a JSON document.
    ///
    /// Record-shaped entries (as written by [`JsonSink`]) become fully
    /// described options, their converter looked up by id. Nested plain
    /// objects become namespaces and any other entry an option whose default
    /// is that value.
    pub fn from_json_records(map: &Map<String, Json>) -> Result<Namespace, LayerfigError> {
        let mut namespace = Namespace::new();
        add_records(&mut namespace, "", map)?;
        Ok(namespace)
    }
}
