//! Serializing option trees through sinks.
//!
//! A sink sees the tree as a flat, lazy sequence of [`OptionEntry`] values in
//! declaration order and is responsible for writing a representation that the
//! matching source can load back.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LayerfigError;
use crate::file::TomlSink;
use crate::json::JsonSink;
use crate::namespace::Namespace;
use crate::option::ConfigOption;

/// One option as handed to a sink: its dotted path, local name, and the option.
#[derive(Debug, Clone)]
pub struct OptionEntry<'a> {
    pub path: String,
    pub name: &'a str,
    pub option: &'a ConfigOption,
}

impl OptionEntry<'_> {
    /// The string-rendered record for this option.
    ///
    /// The converter id is left out only for text options, whose converter a
    /// reader infers from the string default.
    pub fn record(&self) -> OptionRecord {
        let option = self.option;
        OptionRecord {
            name: self.path.clone(),
            default: option.default().map(|v| option.render(v)),
            doc: option.doc().map(str::to_string),
            value: option.value().map(|v| option.render(v)),
            short_form: option.short_form().map(|c| c.to_string()),
            from_string_converter: option
                .converter()
                .filter(|c| !c.is_trivial())
                .map(|c| c.id().to_string()),
        }
    }
}

/// The reference record shape, keyed by the option's dotted path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRecord {
    pub name: String,
    pub default: Option<String>,
    pub doc: Option<String>,
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_string_converter: Option<String>,
}

/// Write contract for output formats.
pub trait ValueSink {
    /// Consume `entries` and write a complete, loadable document to `out`.
    fn write<'a, I>(entries: I, out: &mut dyn Write) -> Result<(), LayerfigError>
    where
        I: IntoIterator<Item = OptionEntry<'a>>;
}

/// Output formats that ship with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
}

impl FromStr for Format {
    type Err = LayerfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "toml" => Ok(Format::Toml),
            other => Err(LayerfigError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("json"),
            Format::Toml => f.write_str("toml"),
        }
    }
}

/// Write every option of `namespace` in `format`.
pub fn write_conf(
    format: Format,
    namespace: &Namespace,
    out: &mut dyn Write,
) -> Result<(), LayerfigError> {
    match format {
        Format::Json => JsonSink::write(namespace.leaves(), out),
        Format::Toml => TomlSink::write(namespace.leaves(), out),
    }
}
