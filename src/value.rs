//! The closed set of value kinds an option can hold.
//!
//! Every kind has one canonical string form, produced by `Display`. Built-in
//! converters render through it, and the built-in parsers accept it back, so a
//! value written by a sink and read by a source comes back equal.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use regex::Regex;
use rust_decimal::Decimal;

use crate::convert::Converter;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A typed configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Long(i128),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Duration(TimeDelta),
    Pattern(Pattern),
    /// A converter used as a value, identified by its registry id.
    Converter(Converter),
}

/// Tag for each [`Value`] variant. Converters are selected by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Long,
    Float,
    Decimal,
    Text,
    Date,
    DateTime,
    Duration,
    Pattern,
    Converter,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Float => "float",
            ValueKind::Decimal => "decimal",
            ValueKind::Text => "text",
            ValueKind::Date => "date",
            ValueKind::DateTime => "datetime",
            ValueKind::Duration => "duration",
            ValueKind::Pattern => "pattern",
            ValueKind::Converter => "converter",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Float(_) => ValueKind::Float,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Text(_) => ValueKind::Text,
            Value::Date(_) => ValueKind::Date,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::Duration(_) => ValueKind::Duration,
            Value::Pattern(_) => ValueKind::Pattern,
            Value::Converter(_) => ValueKind::Converter,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i128> {
        match self {
            Value::Long(i) => Some(*i),
            Value::Int(i) => Some(i128::from(*i)),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<TimeDelta> {
        match self {
            Value::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_pattern(&self) -> Option<&Pattern> {
        match self {
            Value::Pattern(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_converter(&self) -> Option<&Converter> {
        match self {
            Value::Converter(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Long(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::DateTime(dt) => {
                if dt.nanosecond() / 1_000 == 0 {
                    write!(f, "{}", dt.format(DATETIME_FORMAT))
                } else {
                    write!(f, "{}{}", dt.format(DATETIME_FORMAT), dt.format("%.6f"))
                }
            }
            Value::Duration(d) => f.write_str(&format_duration(*d)),
            Value::Pattern(p) => f.write_str(p.as_str()),
            Value::Converter(c) => f.write_str(c.id()),
        }
    }
}

/// Render a duration as `D:HH:MM:SS`. Sub-second precision is dropped.
pub fn format_duration(d: TimeDelta) -> String {
    let total = d.num_seconds();
    let days = total.div_euclid(86_400);
    let rest = total.rem_euclid(86_400);
    format!(
        "{days}:{:02}:{:02}:{:02}",
        rest / 3_600,
        rest % 3_600 / 60,
        rest % 60
    )
}

/// A compiled regular expression. Two patterns are equal when their source
/// text is equal.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Pattern)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn regex(&self) -> &Regex {
        &self.0
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Pattern(regex)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i128> for Value {
    fn from(v: i128) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<TimeDelta> for Value {
    fn from(v: TimeDelta) -> Self {
        Value::Duration(v)
    }
}

impl From<Pattern> for Value {
    fn from(v: Pattern) -> Self {
        Value::Pattern(v)
    }
}

impl From<Regex> for Value {
    fn from(v: Regex) -> Self {
        Value::Pattern(Pattern(v))
    }
}

impl From<Converter> for Value {
    fn from(v: Converter) -> Self {
        Value::Converter(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_renders_without_fraction_when_whole_seconds() {
        let dt = NaiveDate::from_ymd_opt(2011, 5, 4)
            .unwrap()
            .and_hms_opt(15, 10, 0)
            .unwrap();
        assert_eq!(Value::DateTime(dt).to_string(), "2011-05-04T15:10:00");
    }

    #[test]
    fn datetime_renders_microseconds() {
        let dt = NaiveDate::from_ymd_opt(2011, 5, 4)
            .unwrap()
            .and_hms_micro_opt(15, 10, 0, 250)
            .unwrap();
        assert_eq!(Value::DateTime(dt).to_string(), "2011-05-04T15:10:00.000250");
    }

    #[test]
    fn duration_renders_compact_form() {
        let d = TimeDelta::try_seconds(2 * 86_400 + 3 * 3_600 + 4 * 60 + 5).unwrap();
        assert_eq!(format_duration(d), "2:03:04:05");
    }

    #[test]
    fn negative_duration_keeps_positive_clock_part() {
        let d = TimeDelta::try_seconds(-60).unwrap();
        assert_eq!(format_duration(d), "-1:23:59:00");
    }

    #[test]
    fn patterns_compare_by_source() {
        let a = Pattern::new(r"\w+").unwrap();
        let b = Pattern::new(r"\w+").unwrap();
        let c = Pattern::new(r"\d+").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn kind_tags_match_variants() {
        assert_eq!(Value::from(1).kind(), ValueKind::Int);
        assert_eq!(Value::from(1i128).kind(), ValueKind::Long);
        assert_eq!(Value::from("x").kind(), ValueKind::Text);
        assert_eq!(Value::from(1.5).kind(), ValueKind::Float);
    }

    #[test]
    fn as_long_widens_int() {
        assert_eq!(Value::Int(7).as_long(), Some(7));
        assert_eq!(Value::Text("7".into()).as_long(), None);
    }
}
