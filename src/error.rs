use std::path::PathBuf;
use thiserror::Error;

/// A raw value could not be turned into the type a converter produces.
///
/// This is the single "cannot convert" error every converter reports, whatever
/// the target kind. It carries the offending input and the id of the converter
/// that rejected it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot convert '{value}' with {converter}: {reason}")]
pub struct ConvertError {
    pub value: String,
    pub converter: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum LayerfigError {
    #[error("Invalid value for '{key}': {source}")]
    Conversion {
        key: String,
        #[source]
        source: ConvertError,
    },

    #[error("Schema conflict at '{key}': {reason}")]
    SchemaConflict { key: String, reason: String },

    #[error("Unknown key '{key}' in {origin}")]
    UnknownKey { key: String, origin: String },

    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownFileKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in configuration source")]
    UnknownKeys(Vec<LayerfigError>),

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to parse {origin}: {source}")]
    JsonError {
        origin: String,
        source: serde_json::Error,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write configuration: {0}")]
    Write(#[source] std::io::Error),

    #[error("Invalid option name '{0}'")]
    InvalidName(String),

    #[error("Option has no name; set one on the OptionSpec or add it through a namespace")]
    MissingName,

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Invalid tier order: {0}")]
    InvalidTierOrder(String),

    #[error("Unknown output format '{0}' (expected 'json' or 'toml')")]
    UnknownFormat(String),

    #[error("App name is required; call .app_name() on the builder")]
    AppNameRequired,

    #[cfg(feature = "clap")]
    #[error("Invalid command line: {0}")]
    CommandLine(#[from] clap::Error),
}

impl LayerfigError {
    /// Attach an option's fully-qualified name to a conversion failure.
    pub fn conversion(key: impl Into<String>, source: ConvertError) -> Self {
        LayerfigError::Conversion {
            key: key.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_names_option_and_value() {
        let err = LayerfigError::conversion(
            "db.pool_size",
            ConvertError {
                value: "lots".into(),
                converter: "builtin.int".into(),
                reason: "invalid digit found in string".into(),
            },
        );
        let msg = err.to_string();
        assert!(msg.contains("db.pool_size"));
        assert!(std::error::Error::source(&err)
            .unwrap()
            .to_string()
            .contains("lots"));
    }

    #[test]
    fn unknown_file_key_formats_correctly() {
        let err = LayerfigError::UnknownFileKey {
            key: "typo_key".into(),
            path: "/home/user/.config/myapp/myapp.toml".into(),
            line: 42,
        };
        let msg = err.to_string();
        assert!(msg.contains("typo_key"));
        assert!(msg.contains("myapp.toml"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn schema_conflict_formats() {
        let err = LayerfigError::SchemaConflict {
            key: "db".into(),
            reason: "declared as both option and namespace".into(),
        };
        assert!(err.to_string().contains("db"));
    }

    #[test]
    fn app_name_required_formats() {
        let err = LayerfigError::AppNameRequired;
        assert!(err.to_string().contains("app_name"));
    }
}
