//! Config files: TOML reading and writing, and discovery over search paths.
//!
//! # Discovery
//!
//! Each [`SearchPath`] resolves to one directory, which is checked for
//! `{dir}/{file_name}`:
//!
//! - [`SearchMode::Merge`]: every file found is returned, in priority order.
//!   Each becomes its own layer, so later files override earlier ones.
//! - [`SearchMode::FirstMatch`]: the list is searched from the **highest-priority
//!   end** and only the first file found is returned.
//!
//! Missing files are skipped in both modes. Discovery only checks that files
//! exist; the returned paths are read by their sources at resolution time.
//!
//! # TOML layout
//!
//! Tables map to namespaces and keys to options, so `[database] url = "..."`
//! supplies `database.url`. [`TomlSink`] writes the same layout with each
//! option's doc as a comment above it.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::LayerfigError;
use crate::json::JsonSource;
use crate::namespace::{Namespace, SEPARATOR, join};
use crate::option::ConfigOption;
use crate::source::{ValueMap, ValueSource};
use crate::types::{SearchMode, SearchPath};
use crate::value::Value;
use crate::writer::{OptionEntry, ValueSink};

/// Resolve a [`SearchPath`] to a concrete directory.
///
/// `app_name` is used by `SearchPath::Platform` to construct the platform-specific
/// config directory (e.g. `~/.config/{app_name}/` on Linux).
///
/// Returns `None` if the path cannot be resolved (e.g. no home directory found).
pub fn resolve_search_path(sp: &SearchPath, app_name: &str) -> Option<PathBuf> {
    match sp {
        SearchPath::Platform => {
            let proj = directories::ProjectDirs::from("", "", app_name)?;
            Some(proj.config_dir().to_path_buf())
        }
        SearchPath::Home(subdir) => {
            let user = directories::UserDirs::new()?;
            Some(user.home_dir().join(subdir))
        }
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
    }
}

/// Find config files named `file_name` under the search paths, respecting
/// [`SearchMode`]. Paths are priority-ascending.
pub fn discover_config_files(
    search_paths: &[SearchPath],
    file_name: &str,
    app_name: &str,
    mode: SearchMode,
) -> Result<Vec<PathBuf>, LayerfigError> {
    let dirs: Vec<PathBuf> = search_paths
        .iter()
        .filter_map(|sp| resolve_search_path(sp, app_name))
        .collect();

    let found = match mode {
        SearchMode::Merge => existing_files(&dirs, file_name)?,
        SearchMode::FirstMatch => {
            let mut found = Vec::new();
            for dir in dirs.iter().rev() {
                let path = dir.join(file_name);
                if file_exists(&path)? {
                    found.push(path);
                    break;
                }
            }
            found
        }
    };
    tracing::debug!(files = ?found, ?mode, "discovered config files");
    Ok(found)
}

fn existing_files(dirs: &[PathBuf], file_name: &str) -> Result<Vec<PathBuf>, LayerfigError> {
    let mut found = Vec::new();
    for dir in dirs {
        let path = dir.join(file_name);
        if file_exists(&path)? {
            found.push(path);
        }
    }
    Ok(found)
}

fn file_exists(path: &Path) -> Result<bool, LayerfigError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(LayerfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// The source for a config file, chosen by extension: `.json` files are read
/// as JSON, everything else as TOML.
pub fn source_for_path(path: PathBuf) -> Box<dyn ValueSource> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Box::new(JsonSource::from_path(path))
    } else {
        Box::new(TomlSource::from_path(path))
    }
}

#[derive(Debug, Clone)]
enum Input {
    Path(PathBuf),
    Text { origin: PathBuf, content: String },
}

/// Values from a TOML document on disk or in memory.
#[derive(Debug, Clone)]
pub struct TomlSource {
    input: Input,
}

impl TomlSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            input: Input::Path(path.into()),
        }
    }

    /// In-memory content. `origin` names it in errors.
    pub fn from_text(origin: impl Into<PathBuf>, content: &str) -> Self {
        Self {
            input: Input::Text {
                origin: origin.into(),
                content: content.to_string(),
            },
        }
    }

    fn path(&self) -> &Path {
        match &self.input {
            Input::Path(path) => path,
            Input::Text { origin, .. } => origin,
        }
    }

    fn content(&self) -> Result<String, LayerfigError> {
        match &self.input {
            Input::Path(path) => {
                std::fs::read_to_string(path).map_err(|e| LayerfigError::IoError {
                    path: path.clone(),
                    source: e,
                })
            }
            Input::Text { content, .. } => Ok(content.clone()),
        }
    }
}

impl ValueSource for TomlSource {
    fn origin(&self) -> String {
        self.path().display().to_string()
    }

    fn get_values(
        &self,
        context: &Namespace,
        ignore_mismatches: bool,
    ) -> Result<ValueMap, LayerfigError> {
        let content = self.content()?;
        let table: toml::Table = toml::from_str(&content).map_err(|e| LayerfigError::ParseError {
            path: self.path().to_path_buf(),
            source: e,
        })?;

        let mut values = ValueMap::new();
        flatten_table("", &table, &mut values);

        let unknown: Vec<&String> = values
            .keys()
            .filter(|key| !context.contains_option(key))
            .collect();
        if unknown.is_empty() {
            return Ok(values);
        }
        if ignore_mismatches {
            tracing::debug!(
                path = %self.path().display(),
                keys = ?unknown,
                "file has keys with no matching option"
            );
            return Ok(values);
        }
        Err(LayerfigError::UnknownKeys(
            unknown
                .into_iter()
                .map(|key| LayerfigError::UnknownFileKey {
                    key: key.clone(),
                    path: self.path().to_path_buf(),
                    line: find_key_line(&content, key),
                })
                .collect(),
        ))
    }
}

fn flatten_table(prefix: &str, table: &toml::Table, out: &mut ValueMap) {
    for (key, item) in table {
        let path = join(prefix, key);
        let value = match item {
            toml::Value::Table(child) => {
                flatten_table(&path, child, out);
                continue;
            }
            toml::Value::String(s) => Value::Text(s.clone()),
            toml::Value::Integer(i) => Value::Int(*i),
            toml::Value::Float(f) => Value::Float(*f),
            toml::Value::Boolean(b) => Value::Bool(*b),
            toml::Value::Datetime(dt) => Value::Text(dt.to_string()),
            toml::Value::Array(_) => Value::Text(item.to_string()),
        };
        out.insert(path, value);
    }
}

/// Find the 1-indexed line of a dotted key in TOML content.
///
/// Tracks the current `[section]` header and matches the leaf key only inside
/// the section named by the key's prefix. Quoted keys and inline tables are not
/// handled. Returns 0 if the key cannot be located.
fn find_key_line(content: &str, dotted_key: &str) -> usize {
    let (section, leaf) = match dotted_key.rsplit_once(SEPARATOR) {
        Some((section, leaf)) => (section, leaf),
        None => ("", dotted_key),
    };

    let mut current = String::new();
    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && !trimmed.starts_with("[[") {
            current = trimmed
                .trim_start_matches('[')
                .trim_end_matches(']')
                .split(SEPARATOR)
                .map(str::trim)
                .collect::<Vec<_>>()
                .join(".");
            continue;
        }
        if current == section
            && let Some(rest) = trimmed.strip_prefix(leaf)
            && rest.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}

/// Writes a commented TOML document: docs as `#` comments, namespaces as
/// tables, booleans and numbers native, everything else as quoted strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlSink;

fn toml_value(option: &ConfigOption, value: &Value) -> toml_edit::Value {
    match value {
        Value::Bool(b) => (*b).into(),
        Value::Int(i) => (*i).into(),
        Value::Long(l) => match i64::try_from(*l) {
            Ok(i) => i.into(),
            Err(_) => option.render(value).into(),
        },
        Value::Float(f) => (*f).into(),
        other => option.render(other).into(),
    }
}

fn comment(doc: &str) -> String {
    doc.lines().map(|line| format!("# {line}\n")).collect()
}

impl ValueSink for TomlSink {
    fn write<'a, I>(entries: I, out: &mut dyn Write) -> Result<(), LayerfigError>
    where
        I: IntoIterator<Item = OptionEntry<'a>>,
    {
        let mut doc = toml_edit::DocumentMut::new();
        for entry in entries {
            let Some(value) = entry.option.value() else {
                tracing::trace!(option = %entry.path, "no value to write");
                continue;
            };

            let mut table = doc.as_table_mut();
            if let Some((parents, _)) = entry.path.rsplit_once(SEPARATOR) {
                for segment in parents.split(SEPARATOR) {
                    let item = table.entry(segment).or_insert_with(|| {
                        let mut child = toml_edit::Table::new();
                        child.set_implicit(true);
                        toml_edit::Item::Table(child)
                    });
                    table = item
                        .as_table_mut()
                        .ok_or_else(|| LayerfigError::SchemaConflict {
                            key: entry.path.clone(),
                            reason: format!("'{segment}' is both a value and a table"),
                        })?;
                }
            }

            table.insert(entry.name, toml_edit::value(toml_value(entry.option, value)));
            if let Some(text) = entry.option.doc()
                && let Some(mut key) = table.key_mut(entry.name)
            {
                key.leaf_decor_mut().set_prefix(comment(text));
            }
        }
        out.write_all(doc.to_string().as_bytes())
            .map_err(LayerfigError::Write)
    }
}
