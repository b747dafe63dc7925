//! Core resolution pipeline: pick each option's value from the winning layer.
//!
//! Operates on pre-loaded data ([`ResolveInput`]) with no I/O, making the full
//! pipeline testable with synthetic inputs. Steps:
//!
//! 1. Check the tier order names every [`Tier`] exactly once
//! 2. Order layers by tier, keeping insertion order within a tier
//! 3. For each option, take the raw value from the highest-precedence layer
//!    that has its dotted path and pass it through `set_value`
//! 4. Collect every supplied key the schema does not declare
//!
//! The first conversion failure aborts the whole pass.

use std::io::Write;

use crate::error::LayerfigError;
use crate::namespace::Namespace;
use crate::source::ValueMap;
use crate::types::Tier;
use crate::value::Value;
use crate::writer::{self, Format};

/// Values one source supplied, tagged with where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub tier: Tier,
    pub origin: String,
    pub values: ValueMap,
}

/// All pre-loaded data needed to resolve a config. No I/O happens here.
#[derive(Debug, Clone)]
pub struct ResolveInput {
    /// The (already unioned) schema. Its option values are the defaults.
    pub schema: Namespace,
    /// Layers in the order they were added.
    pub layers: Vec<Layer>,
    /// Tiers by precedence: first = lowest priority, last = highest.
    pub tier_order: Vec<Tier>,
}

/// A key a layer supplied that matches no option.
#[derive(Debug, Clone, PartialEq)]
pub struct UnusedKey {
    pub key: String,
    pub origin: String,
    pub value: Value,
}

/// The configuration snapshot a resolution produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    config: Namespace,
    unused: Vec<UnusedKey>,
}

impl Resolved {
    pub fn config(&self) -> &Namespace {
        &self.config
    }

    pub fn into_config(self) -> Namespace {
        self.config
    }

    /// Resolved value of the option at `path`.
    pub fn value(&self, path: &str) -> Option<&Value> {
        self.config.value(path)
    }

    /// Like [`value`](Self::value), but a missing option is an error.
    pub fn get(&self, path: &str) -> Result<&Value, LayerfigError> {
        self.value(path)
            .ok_or_else(|| LayerfigError::KeyNotFound(path.to_string()))
    }

    /// Keys supplied by some layer that no option claimed, in precedence order.
    pub fn unused(&self) -> &[UnusedKey] {
        &self.unused
    }

    /// Serialize the resolved tree.
    pub fn write(&self, format: Format, out: &mut dyn Write) -> Result<(), LayerfigError> {
        writer::write_conf(format, &self.config, out)
    }
}

fn check_tier_order(order: &[Tier]) -> Result<(), LayerfigError> {
    for tier in Tier::ALL {
        let count = order.iter().filter(|t| **t == tier).count();
        if count != 1 {
            return Err(LayerfigError::InvalidTierOrder(format!(
                "{tier} appears {count} times; every tier must appear exactly once"
            )));
        }
    }
    Ok(())
}

/// Resolve configuration from pre-loaded inputs.
pub fn resolve(input: ResolveInput) -> Result<Resolved, LayerfigError> {
    check_tier_order(&input.tier_order)?;

    let rank = |tier: Tier| input.tier_order.iter().position(|t| *t == tier);
    let mut layers = input.layers;
    layers.sort_by_key(|layer| rank(layer.tier));

    let mut config = input.schema;
    config.try_for_each_option_mut(&mut |path, option| {
        let winner = layers
            .iter()
            .rev()
            .find_map(|layer| layer.values.get(path).map(|raw| (layer, raw)));
        match winner {
            Some((layer, raw)) => {
                tracing::debug!(
                    option = path,
                    origin = %layer.origin,
                    tier = %layer.tier,
                    "value from layer"
                );
                option
                    .set_value(raw.clone())
                    .map_err(|e| LayerfigError::conversion(path, e))
            }
            None => {
                tracing::trace!(option = path, "left at default");
                Ok(())
            }
        }
    })?;

    let mut unused = Vec::new();
    for layer in layers.iter().rev() {
        for (key, value) in &layer.values {
            if !config.contains_option(key) {
                unused.push(UnusedKey {
                    key: key.clone(),
                    origin: layer.origin.clone(),
                    value: value.clone(),
                });
            }
        }
    }

    Ok(Resolved { config, unused })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::server_schema;

    fn layer(tier: Tier, origin: &str, pairs: &[(&str, &str)]) -> Layer {
        Layer {
            tier,
            origin: origin.into(),
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), Value::Text(v.to_string())))
                .collect(),
        }
    }

    fn input(layers: Vec<Layer>) -> ResolveInput {
        ResolveInput {
            schema: server_schema(),
            layers,
            tier_order: Tier::DEFAULT_ORDER.to_vec(),
        }
    }

    #[test]
    fn defaults_only() {
        let resolved = resolve(input(vec![])).unwrap();
        assert_eq!(resolved.config(), &server_schema());
        assert!(resolved.unused().is_empty());
    }

    #[test]
    fn higher_tier_wins() {
        let resolved = resolve(input(vec![
            layer(Tier::CommandLine, "argv", &[("port", "1")]),
            layer(Tier::File, "app.toml", &[("port", "2"), ("host", "filehost")]),
        ]))
        .unwrap();
        assert_eq!(resolved.value("port"), Some(&Value::Int(1)));
        assert_eq!(
            resolved.value("host"),
            Some(&Value::Text("filehost".into()))
        );
        assert_eq!(resolved.value("debug"), Some(&Value::Bool(false)));
    }

    #[test]
    fn later_layer_in_same_tier_wins() {
        let resolved = resolve(input(vec![
            layer(Tier::Override, "d1", &[("port", "88")]),
            layer(Tier::Override, "d2", &[("port", "-99")]),
        ]))
        .unwrap();
        assert_eq!(resolved.value("port"), Some(&Value::Int(-99)));
    }

    #[test]
    fn sparse_merge_across_tiers() {
        let resolved = resolve(input(vec![
            layer(
                Tier::File,
                "app.toml",
                &[("host", "filehost"), ("database.pool_size", "20")],
            ),
            layer(Tier::Environment, "env", &[("port", "4000")]),
            layer(Tier::CommandLine, "argv", &[("debug", "yes")]),
        ]))
        .unwrap();
        assert_eq!(resolved.value("host"), Some(&Value::Text("filehost".into())));
        assert_eq!(resolved.value("port"), Some(&Value::Int(4000)));
        assert_eq!(resolved.value("debug"), Some(&Value::Bool(true)));
        assert_eq!(resolved.value("database.pool_size"), Some(&Value::Int(20)));
    }

    #[test]
    fn custom_tier_order() {
        let mut inp = input(vec![
            layer(Tier::File, "app.toml", &[("port", "1")]),
            layer(Tier::CommandLine, "argv", &[("port", "2")]),
        ]);
        inp.tier_order = vec![
            Tier::CommandLine,
            Tier::Override,
            Tier::Environment,
            Tier::File,
        ];
        assert_eq!(resolve(inp).unwrap().value("port"), Some(&Value::Int(1)));
    }

    #[test]
    fn tier_order_must_be_complete() {
        let mut inp = input(vec![]);
        inp.tier_order = vec![Tier::File, Tier::File, Tier::CommandLine];
        assert!(matches!(
            resolve(inp),
            Err(LayerfigError::InvalidTierOrder(_))
        ));
    }

    #[test]
    fn native_values_are_coerced() {
        let mut values = ValueMap::new();
        values.insert("port".into(), Value::Int(3000));
        values.insert("database.pool_size".into(), Value::Float(7.0));
        let resolved = resolve(input(vec![Layer {
            tier: Tier::Override,
            origin: "overrides".into(),
            values,
        }]))
        .unwrap();
        assert_eq!(resolved.value("port"), Some(&Value::Int(3000)));
        assert_eq!(resolved.value("database.pool_size"), Some(&Value::Int(7)));
    }

    #[test]
    fn conversion_failure_names_option_and_value() {
        let err = resolve(input(vec![layer(
            Tier::Environment,
            "env",
            &[("database.pool_size", "lots")],
        )]))
        .unwrap_err();
        match err {
            LayerfigError::Conversion { key, source } => {
                assert_eq!(key, "database.pool_size");
                assert_eq!(source.value, "lots");
            }
            other => panic!("Expected Conversion, got: {other:?}"),
        }
    }

    #[test]
    fn losing_layer_is_not_converted() {
        let resolved = resolve(input(vec![
            layer(Tier::File, "app.toml", &[("port", "not a number")]),
            layer(Tier::CommandLine, "argv", &[("port", "1")]),
        ]))
        .unwrap();
        assert_eq!(resolved.value("port"), Some(&Value::Int(1)));
    }

    #[test]
    fn unknown_keys_are_kept_as_unused() {
        let resolved = resolve(input(vec![
            layer(Tier::File, "app.toml", &[("typo", "1")]),
            layer(Tier::Environment, "env", &[("database.extra", "x")]),
        ]))
        .unwrap();
        let keys: Vec<(&str, &str)> = resolved
            .unused()
            .iter()
            .map(|u| (u.key.as_str(), u.origin.as_str()))
            .collect();
        assert_eq!(keys, vec![("database.extra", "env"), ("typo", "app.toml")]);
        assert!(resolved.value("typo").is_none());
    }

    #[test]
    fn get_reports_missing_key() {
        let resolved = resolve(input(vec![])).unwrap();
        assert!(resolved.get("port").is_ok());
        assert!(matches!(
            resolved.get("nope"),
            Err(LayerfigError::KeyNotFound(k)) if k == "nope"
        ));
    }
}
