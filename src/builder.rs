use serde::Serialize;

#[cfg(feature = "clap")]
use crate::cli::ArgvSource;
use crate::env::EnvSource;
use crate::error::LayerfigError;
use crate::file;
use crate::namespace::Namespace;
use crate::resolve::{self, Layer, ResolveInput, Resolved};
use crate::source::{MapSource, ValueSource};
use crate::types::{SearchMode, SearchPath, Tier};
use crate::value::Value;

/// Entry point for building a layerfig configuration.
pub struct Layerfig;

impl Layerfig {
    pub fn builder() -> LayerfigBuilder {
        LayerfigBuilder::new()
    }
}

/// Builder for declaring a schema and the sources that fill it.
///
/// Sources are grouped into [`Tier`]s. Within a tier, sources added later win;
/// across tiers, [`tier_order()`](Self::tier_order) decides. Config files found
/// through [`search_paths()`](Self::search_paths) come first in the file tier,
/// ahead of any added with [`file()`](Self::file). Likewise the process
/// environment comes first in the environment tier.
pub struct LayerfigBuilder {
    schemas: Vec<Namespace>,
    sources: Vec<(Tier, Box<dyn ValueSource>)>,
    app_name: Option<String>,
    file_name: Option<String>,
    search_paths: Option<Vec<SearchPath>>,
    search_mode: SearchMode,
    env_prefix: Option<String>,
    env_enabled: bool,
    strict: bool,
    tier_order: Vec<Tier>,
    cli_overrides: Vec<(String, Value)>,
}

impl LayerfigBuilder {
    fn new() -> Self {
        Self {
            schemas: Vec::new(),
            sources: Vec::new(),
            app_name: None,
            file_name: None,
            search_paths: None,
            search_mode: SearchMode::default(),
            env_prefix: None,
            env_enabled: true,
            strict: true,
            tier_order: Tier::DEFAULT_ORDER.to_vec(),
            cli_overrides: Vec::new(),
        }
    }

    /// Add a schema. Several schemas are unioned before resolution.
    pub fn schema(mut self, schema: Namespace) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Add a source at `tier`.
    pub fn source(mut self, tier: Tier, source: impl ValueSource + 'static) -> Self {
        self.sources.push((tier, Box::new(source)));
        self
    }

    /// Add a config file. `.json` files are read as JSON, anything else as TOML.
    pub fn file(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.sources
            .push((Tier::File, file::source_for_path(path.into())));
        self
    }

    /// Add an override mapping at [`Tier::Override`].
    pub fn override_values(self, source: impl ValueSource + 'static) -> Self {
        self.source(Tier::Override, source)
    }

    /// Parse `args` (without the program name) against the schema at
    /// [`Tier::CommandLine`].
    #[cfg(feature = "clap")]
    pub fn argv<I, T>(self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.source(Tier::CommandLine, ArgvSource::new(args))
    }

    /// Set the application name. This derives sensible defaults:
    /// - `file_name` → `"{app_name}.toml"`
    /// - `search_paths` → `[SearchPath::Platform]`
    /// - `env_prefix` → `"{APP_NAME}"` (uppercased)
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// Override the config file name (default: `"{app_name}.toml"`).
    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = Some(name.to_string());
        self
    }

    /// Replace the default search paths entirely.
    ///
    /// Paths are listed in **priority-ascending** order: the last entry has the
    /// highest priority. See [`SearchPath`] for the available variants.
    pub fn search_paths(mut self, paths: Vec<SearchPath>) -> Self {
        self.search_paths = Some(paths);
        self
    }

    /// Append a search path without replacing the defaults.
    /// If no paths have been set yet, starts from the default `[Platform]`.
    pub fn add_search_path(mut self, path: SearchPath) -> Self {
        self.search_paths
            .get_or_insert_with(|| vec![SearchPath::Platform])
            .push(path);
        self
    }

    /// Set the search mode (default: [`SearchMode::Merge`]).
    pub fn search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    /// Override the environment variable prefix (default: uppercased `app_name`).
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Disable environment variable loading entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Enable or disable strict mode (default: `true`).
    /// In strict mode, a source supplying a key the schema does not declare
    /// is an error. Otherwise such keys end up in [`Resolved::unused`].
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the tier precedence, lowest first. Every tier must appear once.
    pub fn tier_order(mut self, order: Vec<Tier>) -> Self {
        self.tier_order = order;
        self
    }

    /// Add a CLI override. `None` values are ignored (useful for optional clap args).
    pub fn cli_override<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.cli_overrides.push((key.to_string(), v.into()));
        }
        self
    }

    /// Add CLI overrides from any serializable source, auto-matching by field name.
    ///
    /// Serializes `source` into flat key-value pairs and skips `None` values.
    /// Keys that match no option are dropped at resolution time, so clap-only
    /// fields like `command` or `verbose` are automatically excluded.
    ///
    /// Composes with [`cli_override`](Self::cli_override): both push to the same
    /// override list. Later calls take precedence.
    pub fn cli_overrides_from<S: Serialize>(mut self, source: &S) -> Result<Self, LayerfigError> {
        let flat = MapSource::from_serialize(source)?;
        self.cli_overrides.extend(
            flat.values()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        Ok(self)
    }

    /// Resolve the effective file name, or error if there is nothing to derive it from.
    fn effective_file_name(&self) -> Result<String, LayerfigError> {
        if let Some(name) = &self.file_name {
            return Ok(name.clone());
        }
        let app = self
            .app_name
            .as_deref()
            .ok_or(LayerfigError::AppNameRequired)?;
        Ok(format!("{app}.toml"))
    }

    /// The search paths to use, or `None` when file discovery is off.
    fn effective_search_paths(&self) -> Option<Vec<SearchPath>> {
        if let Some(paths) = &self.search_paths {
            return Some(paths.clone());
        }
        self.app_name.as_ref().map(|_| vec![SearchPath::Platform])
    }

    /// Resolve the effective env prefix (None if env disabled or underivable).
    fn effective_env_prefix(&self) -> Option<String> {
        if !self.env_enabled {
            return None;
        }
        if let Some(prefix) = &self.env_prefix {
            return Some(prefix.clone());
        }
        self.app_name.as_ref().map(|app| app.to_uppercase())
    }

    /// Config files found on the search paths, as file-tier sources.
    fn collect_sources(&self) -> Result<Vec<(Tier, Box<dyn ValueSource>)>, LayerfigError> {
        let mut sources: Vec<(Tier, Box<dyn ValueSource>)> = Vec::new();

        if let Some(search_paths) = self.effective_search_paths() {
            let file_name = self.effective_file_name()?;
            let app_name = self.app_name.as_deref().unwrap_or(&file_name);
            for path in
                file::discover_config_files(&search_paths, &file_name, app_name, self.search_mode)?
            {
                sources.push((Tier::File, file::source_for_path(path)));
            }
        }

        Ok(sources)
    }

    /// Union the schemas and read every source into layers.
    ///
    /// `env_vars` stands in for the process environment. That layer is read
    /// first in [`Tier::Environment`], so sources added at the same tier with
    /// [`source()`](Self::source) win over it.
    fn build_input(&self, env_vars: Vec<(String, String)>) -> Result<ResolveInput, LayerfigError> {
        let schema = Namespace::union(self.schemas.iter().cloned())?;
        let ignore_mismatches = !self.strict;

        let mut layers = Vec::new();
        let mut read = |tier: Tier, source: &dyn ValueSource| -> Result<(), LayerfigError> {
            let values = source.get_values(&schema, ignore_mismatches)?;
            tracing::debug!(origin = %source.origin(), %tier, keys = values.len(), "read source");
            layers.push(Layer {
                tier,
                origin: source.origin(),
                values,
            });
            Ok(())
        };

        for (tier, source) in self.collect_sources()? {
            read(tier, source.as_ref())?;
        }
        if let Some(prefix) = self.effective_env_prefix() {
            read(Tier::Environment, &EnvSource::new(&prefix, env_vars))?;
        }
        for (tier, source) in &self.sources {
            read(*tier, source.as_ref())?;
        }
        if !self.cli_overrides.is_empty() {
            let known = self
                .cli_overrides
                .iter()
                .filter(|(key, _)| schema.contains_option(key))
                .fold(MapSource::new("command line overrides"), |source, (key, value)| {
                    source.insert(key, value.clone())
                });
            read(Tier::CommandLine, &known)?;
        }

        Ok(ResolveInput {
            schema,
            layers,
            tier_order: self.tier_order.clone(),
        })
    }

    /// Union the schemas, read every source, and resolve.
    pub fn resolve(self) -> Result<Resolved, LayerfigError> {
        let input = self.build_input(std::env::vars().collect())?;
        resolve::resolve(input)
    }
}
