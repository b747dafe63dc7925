//! Converter registry: string ⇄ value conversion for every [`ValueKind`].
//!
//! A [`Converter`] pairs a parser (`&str → Value`) with a renderer
//! (`&Value → String`) under a stable id. The built-in converters cover the
//! whole closed set of kinds and are picked by [`infer_converter`] from a
//! sample value's kind, once, when an option is constructed.
//!
//! Converters are themselves values ([`Value::Converter`]). They serialize as
//! their id and deserialize through the process-wide registry, so a config file
//! can name the converter an option should use:
//!
//! ```text
//! "from_string_converter": "datetime.datetime_from_iso"
//! ```
//!
//! Applications add their own converters with [`register`].
//!
//! # Built-in ids
//!
//! | Id | Kind | Accepts |
//! |----|------|---------|
//! | `builtin.bool` | bool | `true t yes y 1` (any case) → true, other non-blank → false |
//! | `builtin.int` | int | `i64` literal |
//! | `builtin.long` | long | `i128` literal |
//! | `builtin.float` | float | `f64` literal |
//! | `builtin.decimal` | decimal | decimal literal |
//! | `builtin.str` | text | anything |
//! | `datetime.date_from_iso` | date | `YYYY-MM-DD` |
//! | `datetime.datetime_from_iso` | datetime | `YYYY-MM-DDTHH:MM:SS[.ffffff]`, or a bare date |
//! | `datetime.timedelta_from_str` | duration | `[[[D:]HH:]MM:]SS` |
//! | `regex.compile` | pattern | regular expression source |
//! | `converter.lookup` | converter | a registered converter id |
//!
//! Records store defaults as strings, so the only converter a reader can
//! recover without being told is the identity one. Sinks therefore record every
//! converter id except `builtin.str`.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{LazyLock, PoisonError, RwLock};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rust_decimal::Decimal;

use crate::error::ConvertError;
use crate::value::{DATE_FORMAT, Pattern, Value, ValueKind};

pub type ParseFn = fn(&str) -> Result<Value, String>;
pub type RenderFn = fn(&Value) -> String;

/// A named from-string / to-string pair.
#[derive(Clone)]
pub struct Converter {
    id: Cow<'static, str>,
    kind: Option<ValueKind>,
    parse: ParseFn,
    render: RenderFn,
}

impl Converter {
    /// Build a converter. `kind` is the kind `parse` produces, when known;
    /// values already of that kind skip conversion in
    /// [`ConfigOption::set_value`](crate::ConfigOption::set_value).
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        kind: Option<ValueKind>,
        parse: ParseFn,
        render: RenderFn,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            parse,
            render,
        }
    }

    const fn builtin(id: &'static str, kind: ValueKind, parse: ParseFn) -> Self {
        Self {
            id: Cow::Borrowed(id),
            kind: Some(kind),
            parse,
            render: render_canonical,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> Option<ValueKind> {
        self.kind
    }

    /// True for the identity converter, which a reader infers from a
    /// string-rendered default on its own. Sinks leave it out of records.
    pub fn is_trivial(&self) -> bool {
        self.id == TEXT.id
    }

    /// True when `value` is already what this converter produces.
    pub fn accepts(&self, value: &Value) -> bool {
        self.kind == Some(value.kind())
    }

    pub fn parse(&self, raw: &str) -> Result<Value, ConvertError> {
        (self.parse)(raw).map_err(|reason| ConvertError {
            value: raw.to_string(),
            converter: self.id.to_string(),
            reason,
        })
    }

    pub fn render(&self, value: &Value) -> String {
        (self.render)(value)
    }
}

impl PartialEq for Converter {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Converter").field(&self.id).finish()
    }
}

impl fmt::Display for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

pub const BOOLEAN: Converter = Converter::builtin("builtin.bool", ValueKind::Bool, parse_bool);
pub const INTEGER: Converter = Converter::builtin("builtin.int", ValueKind::Int, parse_int);
pub const LONG: Converter = Converter::builtin("builtin.long", ValueKind::Long, parse_long);
pub const FLOAT: Converter = Converter::builtin("builtin.float", ValueKind::Float, parse_float);
pub const DECIMAL: Converter =
    Converter::builtin("builtin.decimal", ValueKind::Decimal, parse_decimal);
pub const TEXT: Converter = Converter::builtin("builtin.str", ValueKind::Text, parse_text);
pub const DATE: Converter =
    Converter::builtin("datetime.date_from_iso", ValueKind::Date, parse_date);
pub const DATETIME: Converter = Converter::builtin(
    "datetime.datetime_from_iso",
    ValueKind::DateTime,
    parse_datetime,
);
pub const TIMEDELTA: Converter = Converter::builtin(
    "datetime.timedelta_from_str",
    ValueKind::Duration,
    parse_duration,
);
pub const REGEX: Converter = Converter::builtin("regex.compile", ValueKind::Pattern, parse_pattern);
pub const CONVERTER: Converter =
    Converter::builtin("converter.lookup", ValueKind::Converter, parse_converter);

/// Pick the converter for a sample value, by kind.
pub fn infer_converter(sample: &Value) -> Converter {
    match sample.kind() {
        ValueKind::Bool => BOOLEAN,
        ValueKind::Int => INTEGER,
        ValueKind::Long => LONG,
        ValueKind::Float => FLOAT,
        ValueKind::Decimal => DECIMAL,
        ValueKind::Text => TEXT,
        ValueKind::Date => DATE,
        ValueKind::DateTime => DATETIME,
        ValueKind::Duration => TIMEDELTA,
        ValueKind::Pattern => REGEX,
        ValueKind::Converter => CONVERTER,
    }
}

static REGISTRY: LazyLock<RwLock<HashMap<String, Converter>>> = LazyLock::new(|| {
    let builtins = [
        BOOLEAN, INTEGER, LONG, FLOAT, DECIMAL, TEXT, DATE, DATETIME, TIMEDELTA, REGEX,
        CONVERTER,
    ];
    RwLock::new(
        builtins
            .into_iter()
            .map(|c| (c.id().to_string(), c))
            .collect(),
    )
});

/// Register a converter under its id. Returns the converter it replaced, if any.
pub fn register(converter: Converter) -> Option<Converter> {
    REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(converter.id().to_string(), converter)
}

/// Find a converter by id.
pub fn lookup(id: &str) -> Option<Converter> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(id)
        .cloned()
}

fn render_canonical(value: &Value) -> String {
    value.to_string()
}

fn parse_bool(s: &str) -> Result<Value, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty string is not a boolean".into());
    }
    let truthy = ["true", "t", "yes", "y", "1"]
        .iter()
        .any(|t| s.eq_ignore_ascii_case(t));
    Ok(Value::Bool(truthy))
}

fn parse_int(s: &str) -> Result<Value, String> {
    s.trim()
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|e| e.to_string())
}

fn parse_long(s: &str) -> Result<Value, String> {
    s.trim()
        .parse::<i128>()
        .map(Value::Long)
        .map_err(|e| e.to_string())
}

fn parse_float(s: &str) -> Result<Value, String> {
    s.trim()
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|e| e.to_string())
}

fn parse_decimal(s: &str) -> Result<Value, String> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map(Value::Decimal)
        .map_err(|e| e.to_string())
}

fn parse_text(s: &str) -> Result<Value, String> {
    Ok(Value::Text(s.to_string()))
}

fn parse_date(s: &str) -> Result<Value, String> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map(Value::Date)
        .map_err(|e| e.to_string())
}

fn parse_datetime(s: &str) -> Result<Value, String> {
    const FORMATS: [&str; 3] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
    ];
    let s = s.trim();
    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Value::DateTime(dt));
        }
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map(|d| Value::DateTime(d.and_time(NaiveTime::MIN)))
        .map_err(|_| "expected YYYY-MM-DDTHH:MM:SS[.ffffff] or YYYY-MM-DD".to_string())
}

fn parse_duration(s: &str) -> Result<Value, String> {
    let segments: Vec<&str> = s.trim().split(':').collect();
    if segments.len() > 4 {
        return Err("expected at most D:HH:MM:SS".into());
    }

    let mut numbers = Vec::with_capacity(segments.len());
    for segment in &segments {
        let n = segment
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("'{segment}' is not a whole number"))?;
        numbers.push(n);
    }

    // Right-aligned: the last segment is always seconds.
    const UNITS: [i64; 4] = [1, 60, 3_600, 86_400];
    let mut total: i64 = 0;
    for (n, unit) in numbers.iter().rev().zip(UNITS) {
        total = n
            .checked_mul(unit)
            .and_then(|part| total.checked_add(part))
            .ok_or("duration out of range")?;
    }

    TimeDelta::try_seconds(total)
        .map(Value::Duration)
        .ok_or_else(|| "duration out of range".to_string())
}

fn parse_pattern(s: &str) -> Result<Value, String> {
    Pattern::new(s).map(Value::Pattern).map_err(|e| e.to_string())
}

fn parse_converter(s: &str) -> Result<Value, String> {
    let id = s.trim();
    lookup(id)
        .map(Value::Converter)
        .ok_or_else(|| format!("no converter registered as '{id}'"))
}
