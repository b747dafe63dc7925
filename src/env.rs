use crate::error::LayerfigError;
use crate::namespace::{Namespace, join};
use crate::source::{ValueMap, ValueSource, check_known_keys};
use crate::value::Value;

/// Values from environment variables matching `{PREFIX}__*`.
///
/// Double underscore `__` separates nesting levels.
/// Single `_` within a segment is literal (part of the option name).
/// Segments are lowercased to match option names, so `MYAPP__DATABASE__POOL_SIZE`
/// supplies `database.pool_size`.
///
/// Values are always text; each option's converter types them.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    vars: Vec<(String, String)>,
}

impl EnvSource {
    /// Snapshot the process environment.
    pub fn from_env(prefix: &str) -> Self {
        Self::new(prefix, std::env::vars())
    }

    /// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
    pub fn new(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            prefix: prefix.to_string(),
            vars: vars.into_iter().collect(),
        }
    }

    fn to_map(&self) -> ValueMap {
        let needle = format!("{}__", self.prefix);
        let mut values = ValueMap::new();

        for (key, value) in &self.vars {
            let Some(rest) = key.strip_prefix(&needle) else {
                continue;
            };
            if rest.is_empty() || rest.split("__").any(str::is_empty) {
                continue;
            }
            let path = rest
                .split("__")
                .fold(String::new(), |path, segment| {
                    join(&path, &segment.to_lowercase())
                });
            values.insert(path, Value::Text(value.clone()));
        }

        values
    }
}

impl ValueSource for EnvSource {
    fn origin(&self) -> String {
        format!("environment ({}__*)", self.prefix)
    }

    fn get_values(
        &self,
        context: &Namespace,
        ignore_mismatches: bool,
    ) -> Result<ValueMap, LayerfigError> {
        let values = self.to_map();
        check_known_keys(&values, context, &self.origin(), ignore_mismatches)?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::server_schema;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn env_values(prefix: &str, pairs: &[(&str, &str)]) -> ValueMap {
        EnvSource::new(prefix, vars(pairs))
            .get_values(&server_schema(), true)
            .unwrap()
    }

    fn text(s: &str) -> Value {
        Value::Text(s.into())
    }

    #[test]
    fn simple_key() {
        let values = env_values("MYAPP", &[("MYAPP__HOST", "0.0.0.0")]);
        assert_eq!(values["host"], text("0.0.0.0"));
    }

    #[test]
    fn nested_key() {
        let values = env_values("MYAPP", &[("MYAPP__DATABASE__URL", "postgres://db")]);
        assert_eq!(values["database.url"], text("postgres://db"));
    }

    #[test]
    fn single_underscore_preserved() {
        let values = env_values("MYAPP", &[("MYAPP__DATABASE__POOL_SIZE", "10")]);
        assert_eq!(values["database.pool_size"], text("10"));
    }

    #[test]
    fn values_stay_text() {
        let values = env_values("MYAPP", &[("MYAPP__DEBUG", "TRUE"), ("MYAPP__PORT", "8080")]);
        assert_eq!(values["debug"], text("TRUE"));
        assert_eq!(values["port"], text("8080"));
    }

    #[test]
    fn no_matching_prefix_ignored() {
        assert!(env_values("MYAPP", &[("OTHER__HOST", "x")]).is_empty());
    }

    #[test]
    fn bare_prefix_ignored() {
        assert!(env_values("MYAPP", &[("MYAPP", "x"), ("MYAPP__", "y")]).is_empty());
    }

    #[test]
    fn prefix_with_single_underscore_not_matched() {
        assert!(env_values("MYAPP", &[("MYAPP_HOST", "x")]).is_empty());
    }

    #[test]
    fn empty_segment_ignored() {
        assert!(env_values("MYAPP", &[("MYAPP__DATABASE____URL", "x")]).is_empty());
    }

    #[test]
    fn unknown_variable_rejected_when_strict() {
        let err = EnvSource::new("APP", vars(&[("APP__PROT", "1")]))
            .get_values(&server_schema(), false)
            .unwrap_err();
        match err {
            LayerfigError::UnknownKeys(keys) => assert!(matches!(
                &keys[0],
                LayerfigError::UnknownKey { key, origin }
                    if key == "prot" && origin.contains("APP__")
            )),
            other => panic!("Expected UnknownKeys, got: {other:?}"),
        }
    }

    #[test]
    fn multiple_vars_combined() {
        let values = env_values(
            "APP",
            &[
                ("APP__HOST", "0.0.0.0"),
                ("APP__PORT", "3000"),
                ("APP__DATABASE__URL", "pg://"),
                ("APP__DATABASE__POOL_SIZE", "20"),
            ],
        );
        assert_eq!(values.len(), 4);
        assert_eq!(values["database.pool_size"], text("20"));
    }
}
