//! Typed option trees, resolved from layered value sources.
//!
//! Layerfig models configuration as a tree of named, documented, typed
//! options. Each option knows its default and how to turn a string into its
//! type and back. Values come from any number of sources (config files,
//! environment variables, command-line arguments, in-memory overrides) and
//! are merged under a precedence order the caller controls.
//!
//! ```ignore
//! let mut schema = Namespace::new();
//! schema.add_option(OptionSpec::new("port").default_value(8080).short_form('p'))?;
//! schema.add_option(OptionSpec::new("database.url").default_value("postgres://localhost"))?;
//!
//! let config = Layerfig::builder()
//!     .schema(schema)
//!     .app_name("myapp")
//!     .argv(std::env::args().skip(1))
//!     .resolve()?;
//!
//! let port = config.get("port")?.as_int();
//! ```
//!
//! That call searches the platform config directory for `myapp.toml`, merges
//! `MYAPP__*` environment variables and the command line on top, converts
//! every raw value through its option's converter, and hands back the
//! resolved tree.
//!
//! # Options and converters
//!
//! An option's converter is inferred from the kind of its default (an
//! integer default gets the integer converter, a [`chrono::TimeDelta`] the
//! duration converter, and so on) unless one is given explicitly. Strings are
//! always parsed; values that already have the right kind are kept as they
//! are. See the [`convert`] module for the built-in converters and their
//! string forms.
//!
//! Converters have stable ids (`builtin.int`, `datetime.datetime_from_iso`)
//! and live in a process-wide registry, so a written config file can name the
//! converter an option uses and a reader can find it again. Register your own
//! with [`convert::register`].
//!
//! # Layer precedence
//!
//! ```text
//! Option defaults       OptionSpec::default_value
//!        ↑ overridden by
//! Config files          search paths in order, then .file(), later wins
//!        ↑ overridden by
//! Environment vars      PREFIX__KEY
//!        ↑ overridden by
//! Overrides             .override_values()
//!        ↑ overridden by
//! Command line          .argv(), .cli_override()
//! ```
//!
//! This is [`Tier::DEFAULT_ORDER`]; change it with
//! [`tier_order()`](LayerfigBuilder::tier_order). Every layer is **sparse**:
//! the highest layer that supplies a key wins outright, and keys nobody
//! supplies keep their default.
//!
//! # Environment variables
//!
//! With env prefix `MYAPP`, variables map via double-underscore nesting:
//!
//! | Env var | Config key |
//! |---------|------------|
//! | `MYAPP__HOST` | `host` |
//! | `MYAPP__DATABASE__URL` | `database.url` |
//!
//! Values are passed on as text and typed by the option's converter.
//!
//! # Strict mode
//!
//! Strict mode is **on by default**. When a source supplies a key that matches
//! no option, resolution fails. For TOML files the error carries the path and
//! line:
//!
//! ```text
//! Unknown key 'typo_key' in /home/user/.config/myapp/myapp.toml (line 5)
//! ```
//!
//! With [`.strict(false)`](LayerfigBuilder::strict) such keys are kept in
//! [`Resolved::unused`] instead.
//!
//! # Writing configuration
//!
//! [`Resolved::write`] and [`write_conf`] serialize a tree through a
//! [`ValueSink`]. [`JsonSink`] writes one record per option (name, default,
//! doc, value, short form, converter id) which [`JsonSource`] reads back, and
//! which [`Namespace::from_json_records`] can turn back into a schema.
//! [`TomlSink`] writes a commented TOML file.
//!
//! # Error handling
//!
//! All fallible operations return [`LayerfigError`]. Conversion failures name
//! the option's dotted path and carry a [`ConvertError`] with the raw value and
//! converter id.

pub mod convert;
pub mod error;
pub mod types;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod env;
mod file;
mod json;
mod namespace;
mod option;
mod resolve;
mod source;
mod value;
mod writer;

#[cfg(test)]
mod fixtures;

pub use builder::{Layerfig, LayerfigBuilder};
#[cfg(feature = "clap")]
pub use cli::ArgvSource;
pub use convert::Converter;
pub use env::EnvSource;
pub use error::{ConvertError, LayerfigError};
pub use file::{TomlSink, TomlSource, discover_config_files};
pub use json::{JsonSink, JsonSource};
pub use namespace::{Leaves, Namespace, Node, SEPARATOR};
pub use option::{ConfigOption, OptionSpec};
pub use resolve::{Layer, ResolveInput, Resolved, UnusedKey, resolve};
pub use source::{MapSource, ValueMap, ValueSource};
pub use types::{SearchMode, SearchPath, Tier};
pub use value::{Pattern, Value, ValueKind};
pub use writer::{Format, OptionEntry, OptionRecord, ValueSink, write_conf};
