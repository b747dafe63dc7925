//! A single typed configuration leaf.

use std::collections::BTreeMap;

use crate::convert::{self, Converter};
use crate::error::ConvertError;
use crate::value::Value;

/// Everything needed to declare an option.
///
/// Keys the crate does not know about (e.g. from a newer config file) go into
/// `extras` and are ignored at construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSpec {
    pub name: Option<String>,
    pub default: Option<Value>,
    pub doc: Option<String>,
    pub value: Option<Value>,
    pub short_form: Option<char>,
    pub from_string_converter: Option<Converter>,
    pub extras: BTreeMap<String, serde_json::Value>,
}

impl OptionSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn doc(mut self, doc: &str) -> Self {
        self.doc = Some(doc.to_string());
        self
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn short_form(mut self, short: char) -> Self {
        self.short_form = Some(short);
        self
    }

    pub fn converter(mut self, converter: Converter) -> Self {
        self.from_string_converter = Some(converter);
        self
    }

    pub fn extra(mut self, key: &str, value: serde_json::Value) -> Self {
        self.extras.insert(key.to_string(), value);
        self
    }
}

/// A named, typed, documented configuration leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigOption {
    name: Option<String>,
    default: Option<Value>,
    value: Option<Value>,
    doc: Option<String>,
    short_form: Option<char>,
    converter: Option<Converter>,
}

impl ConfigOption {
    /// Build an option from an [`OptionSpec`].
    ///
    /// Without an explicit converter, one is inferred from the default's kind.
    /// The initial value is `OptionSpec::value` (or else the default) passed
    /// through [`set_value`](Self::set_value), so a text default paired with a
    /// non-text converter starts out converted.
    pub fn new(spec: OptionSpec) -> Result<Self, ConvertError> {
        if !spec.extras.is_empty() {
            tracing::debug!(
                option = spec.name.as_deref().unwrap_or("<unnamed>"),
                extras = ?spec.extras.keys().collect::<Vec<_>>(),
                "ignoring unknown option keys"
            );
        }

        let converter = spec
            .from_string_converter
            .or_else(|| spec.default.as_ref().map(convert::infer_converter));

        let mut option = Self {
            name: spec.name,
            default: spec.default,
            value: None,
            doc: spec.doc,
            short_form: spec.short_form,
            converter,
        };

        if let Some(initial) = spec.value.or_else(|| option.default.clone()) {
            option.set_value(initial)?;
        }
        Ok(option)
    }

    /// Shorthand for an option with just a name and a default.
    pub fn with_default(name: &str, default: impl Into<Value>) -> Self {
        let default = default.into();
        Self {
            name: Some(name.to_string()),
            converter: Some(convert::infer_converter(&default)),
            value: Some(default.clone()),
            default: Some(default),
            doc: None,
            short_form: None,
        }
    }

    /// Assign a raw value, converting as needed.
    ///
    /// - No converter: stored as given.
    /// - Text: always parsed by the converter.
    /// - Already the converter's kind: stored unchanged.
    /// - Any other kind: rendered to its canonical string and parsed.
    pub fn set_value(&mut self, raw: Value) -> Result<(), ConvertError> {
        let value = match &self.converter {
            None => raw,
            Some(converter) => match raw {
                Value::Text(s) => converter.parse(&s)?,
                other if converter.accepts(&other) => other,
                other => converter.parse(&other.to_string())?,
            },
        };
        self.value = Some(value);
        Ok(())
    }

    /// Replace the converter. The current value is left as is.
    pub fn set_converter(&mut self, converter: Converter) {
        self.converter = Some(converter);
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn short_form(&self) -> Option<char> {
        self.short_form
    }

    pub fn converter(&self) -> Option<&Converter> {
        self.converter.as_ref()
    }

    /// Render a value through this option's converter (canonical form when
    /// there is none).
    pub fn render(&self, value: &Value) -> String {
        match &self.converter {
            Some(converter) => converter.render(value),
            None => value.to_string(),
        }
    }

    /// Same declaration: name, default, doc, short form and converter agree.
    /// The current value is not compared.
    pub fn same_declaration(&self, other: &ConfigOption) -> bool {
        self.name == other.name
            && self.default == other.default
            && self.doc == other.doc
            && self.short_form == other.short_form
            && self.converter == other.converter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{
        BOOLEAN, DATE, DATETIME, DECIMAL, FLOAT, INTEGER, LONG, REGEX, TEXT, TIMEDELTA,
    };
    use crate::value::{Pattern, format_duration};
    use chrono::{NaiveDate, TimeDelta};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn empty_spec_has_nothing() {
        let o = ConfigOption::new(OptionSpec::default()).unwrap();
        assert_eq!(o.name(), None);
        assert_eq!(o.default(), None);
        assert_eq!(o.doc(), None);
        assert_eq!(o.converter(), None);
        assert_eq!(o.value(), None);
    }

    #[test]
    fn name_only() {
        let o = ConfigOption::new(OptionSpec::new("spa\u{a0}e")).unwrap();
        assert_eq!(o.name(), Some("spa\u{a0}e"));
        assert_eq!(o.default(), None);
        assert_eq!(o.converter(), None);
        assert_eq!(o.value(), None);
    }

    #[test]
    fn integer_default_infers_int() {
        let o = ConfigOption::new(
            OptionSpec::new("lucy")
                .default_value(1)
                .doc("lucy's integer"),
        )
        .unwrap();
        assert_eq!(o.default(), Some(&Value::Int(1)));
        assert_eq!(o.doc(), Some("lucy's integer"));
        assert_eq!(o.converter(), Some(&INTEGER));
        assert_eq!(o.value(), Some(&Value::Int(1)));
    }

    #[test]
    fn string_value_is_converted() {
        let o = ConfigOption::new(OptionSpec::new("lucy").default_value(1).value("1")).unwrap();
        assert_eq!(o.value(), Some(&Value::Int(1)));
    }

    #[test]
    fn text_default_with_explicit_converter() {
        let o = ConfigOption::new(
            OptionSpec::new("lucy")
                .default_value("1")
                .converter(INTEGER),
        )
        .unwrap();
        assert_eq!(o.default(), Some(&Value::Text("1".into())));
        assert_eq!(o.converter(), Some(&INTEGER));
        assert_eq!(o.value(), Some(&Value::Int(1)));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let spec = OptionSpec::new("lucy")
            .default_value("1")
            .converter(INTEGER)
            .extra("other", serde_json::json!("no way"));
        let o = ConfigOption::new(spec).unwrap();
        assert_eq!(o.value(), Some(&Value::Int(1)));

        let mut unnamed = OptionSpec::default()
            .default_value("1")
            .converter(INTEGER)
            .extra("other", serde_json::json!("no way"));
        unnamed.name = None;
        let o = ConfigOption::new(unnamed).unwrap();
        assert_eq!(o.name(), None);
        assert_eq!(o.value(), Some(&Value::Int(1)));
    }

    #[test]
    fn converters_inferred_per_kind() {
        let cases = [
            (Value::Text("Peter".into()), TEXT),
            (Value::Int(100), INTEGER),
            (Value::Long(100), LONG),
            (Value::Float(100.0), FLOAT),
            (Value::Decimal(Decimal::from_str("100.0").unwrap()), DECIMAL),
            (Value::Bool(false), BOOLEAN),
            (
                Value::DateTime(
                    NaiveDate::from_ymd_opt(2011, 8, 10)
                        .unwrap()
                        .and_hms_opt(0, 0, 0)
                        .unwrap(),
                ),
                DATETIME,
            ),
            (Value::Date(NaiveDate::from_ymd_opt(2011, 8, 10).unwrap()), DATE),
            (Value::Duration(TimeDelta::try_days(1).unwrap()), TIMEDELTA),
        ];
        for (default, expected) in cases {
            let o =
                ConfigOption::new(OptionSpec::default().default_value(default.clone())).unwrap();
            assert_eq!(o.default(), Some(&default));
            assert_eq!(o.converter(), Some(&expected));
            assert_eq!(o.value(), Some(&default));
        }
    }

    #[test]
    fn boolean_option_accepts_strings_and_bools() {
        let mut o = ConfigOption::with_default("flag", false);
        assert_eq!(o.converter(), Some(&BOOLEAN));
        let cases: [(Value, bool); 13] = [
            ("true".into(), true),
            ("false".into(), false),
            ("1".into(), true),
            ("t".into(), true),
            (true.into(), true),
            (false.into(), false),
            ("False".into(), false),
            ("True".into(), true),
            ("None".into(), false),
            ("YES".into(), true),
            ("1".into(), true),
            ("y".into(), true),
            ("t".into(), true),
        ];
        for (raw, expected) in cases {
            o.set_value(raw.clone()).unwrap();
            assert_eq!(o.value(), Some(&Value::Bool(expected)), "{raw:?}");
        }
    }

    #[test]
    fn duration_option() {
        let one_day = TimeDelta::try_days(1).unwrap();
        let two_days = TimeDelta::try_days(2).unwrap();
        let mut o = ConfigOption::with_default("ttl", one_day);
        assert_eq!(o.converter(), Some(&TIMEDELTA));

        o.set_value(Value::Text(format_duration(two_days))).unwrap();
        assert_eq!(o.value(), Some(&Value::Duration(two_days)));

        o.set_value(Value::Duration(two_days)).unwrap();
        assert_eq!(o.value(), Some(&Value::Duration(two_days)));

        assert!(o.set_value("JUNK".into()).is_err());
        assert!(o.set_value("0:x:0:0".into()).is_err());
        // a failed conversion leaves the previous value in place
        assert_eq!(o.value(), Some(&Value::Duration(two_days)));
    }

    #[test]
    fn regex_option() {
        let sample = Pattern::new(r"\w+").unwrap();
        let mut o = ConfigOption::with_default("re", sample.clone());
        assert_eq!(o.converter(), Some(&REGEX));
        o.set_value(r"\w+".into()).unwrap();
        assert_eq!(o.value().and_then(Value::as_pattern).map(Pattern::as_str), Some(r"\w+"));
    }

    #[test]
    fn native_of_other_kind_coerces_through_string() {
        let mut o = ConfigOption::with_default("rate", 1.5);
        o.set_value(Value::Int(88)).unwrap();
        assert_eq!(o.value(), Some(&Value::Float(88.0)));

        let mut n = ConfigOption::with_default("count", 1);
        let err = n.set_value(Value::Bool(true)).unwrap_err();
        assert_eq!(err.value, "true");
    }

    #[test]
    fn no_converter_assigns_directly() {
        let mut o = ConfigOption::new(OptionSpec::new("anything")).unwrap();
        o.set_value(Value::Int(3)).unwrap();
        assert_eq!(o.value(), Some(&Value::Int(3)));
        o.set_value("text".into()).unwrap();
        assert_eq!(o.value(), Some(&Value::Text("text".into())));
    }

    #[test]
    fn converter_can_be_set_later() {
        let mut o = ConfigOption::new(OptionSpec::new("late")).unwrap();
        o.set_converter(INTEGER);
        o.set_value("12".into()).unwrap();
        assert_eq!(o.value(), Some(&Value::Int(12)));
    }

    #[test]
    fn bad_initial_value_fails_construction() {
        let err =
            ConfigOption::new(OptionSpec::new("n").default_value(1).value("one")).unwrap_err();
        assert_eq!(err.value, "one");
    }

    #[test]
    fn same_declaration_ignores_value() {
        let a = ConfigOption::with_default("port", 8080);
        let mut b = ConfigOption::with_default("port", 8080);
        b.set_value(Value::Int(1)).unwrap();
        assert!(a.same_declaration(&b));
        assert!(!a.same_declaration(&ConfigOption::with_default("port", 9090)));
    }
}
