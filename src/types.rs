use std::fmt;
use std::path::PathBuf;

/// Where to search for config files.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (XDG on Linux, ~/Library/Application Support on macOS).
    Platform,
    /// A subdirectory under the user's home directory, e.g. `Home(".myapp")`.
    Home(&'static str),
    /// Current working directory.
    Cwd,
    /// An explicit absolute path.
    Path(PathBuf),
}

/// How discovered config files are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Every file found is a layer; later (higher-priority) files win.
    #[default]
    Merge,
    /// Only the highest-priority file found is used.
    FirstMatch,
}

/// A precedence tier. Every source belongs to exactly one.
///
/// The builder orders tiers priority-ascending, [`Tier::DEFAULT_ORDER`] unless
/// told otherwise. Option defaults sit below all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    File,
    Environment,
    Override,
    CommandLine,
}

impl Tier {
    pub const ALL: [Tier; 4] = [
        Tier::File,
        Tier::Environment,
        Tier::Override,
        Tier::CommandLine,
    ];

    /// Files lowest, then environment, explicit overrides, and the command line.
    pub const DEFAULT_ORDER: [Tier; 4] = Self::ALL;
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::File => "file",
            Tier::Environment => "environment",
            Tier::Override => "override",
            Tier::CommandLine => "command line",
        };
        f.write_str(name)
    }
}
