use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::core::error::LogmoError;
use crate::utils::color::Rgba;

/// Severity of a log event, ordered `Debug < Info < Notice < Error < Fault`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Notice,
    Error,
    Fault,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Notice,
        Level::Error,
        Level::Fault,
    ];

    /// Glyph printed in front of console lines and export lines.
    pub fn marker(self) -> &'static str {
        match self {
            Level::Debug => "🟢",
            Level::Info => "🔵",
            Level::Notice => "🟡",
            Level::Error => "🟠",
            Level::Fault => "🔴",
        }
    }

    /// Inverse of [`Level::marker`].
    pub fn from_marker(marker: &str) -> Option<Level> {
        Level::ALL.into_iter().find(|level| level.marker() == marker)
    }

    pub fn label(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Notice => "NOTICE",
            Level::Error => "ERROR",
            Level::Fault => "FAULT",
        }
    }

    pub fn color(self) -> Rgba {
        match self {
            Level::Debug => Rgba::from_hex(0x989898, 1.0),
            Level::Info => Rgba::from_hex(0x52A3EE, 1.0),
            Level::Notice => Rgba::from_hex(0xEDDD52, 1.0),
            Level::Error => Rgba::from_hex(0xE3953A, 1.0),
            Level::Fault => Rgba::from_hex(0xF03C3C, 1.0),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Level {
    type Err = LogmoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|level| level.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LogmoError::Config(format!("unknown level `{}`", s)))
    }
}

/// Metadata key. The six well-known keys are associated constants; any other
/// string is accepted as a caller-defined key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetadataKey(Cow<'static, str>);

impl MetadataKey {
    pub const DATE: MetadataKey = MetadataKey(Cow::Borrowed("date"));
    pub const FILE_NAME: MetadataKey = MetadataKey(Cow::Borrowed("fileName"));
    pub const FUNCTION: MetadataKey = MetadataKey(Cow::Borrowed("function"));
    pub const LINE: MetadataKey = MetadataKey(Cow::Borrowed("line"));
    pub const SUBSYSTEM: MetadataKey = MetadataKey(Cow::Borrowed("subsystem"));
    pub const CATEGORY: MetadataKey = MetadataKey(Cow::Borrowed("category"));

    pub fn new(key: impl Into<Cow<'static, str>>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for MetadataKey {
    fn from(key: &'static str) -> Self {
        Self(Cow::Borrowed(key))
    }
}

impl From<String> for MetadataKey {
    fn from(key: String) -> Self {
        Self(Cow::Owned(key))
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Str(String),
    Int(i64),
    Float(f64),
    Timestamp(DateTime<Local>),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            MetadataValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Local>> {
        match self {
            MetadataValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Str(s) => f.write_str(s),
            MetadataValue::Int(n) => write!(f, "{}", n),
            MetadataValue::Float(x) => write!(f, "{}", x),
            MetadataValue::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Str(value)
    }
}

macro_rules! int_metadata_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for MetadataValue {
                fn from(value: $ty) -> Self {
                    MetadataValue::Int(i64::from(value))
                }
            }
        )*
    };
}

int_metadata_value!(i8, i16, i32, i64, u8, u16, u32);

/// Values above `i64::MAX` saturate.
macro_rules! wide_metadata_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for MetadataValue {
                fn from(value: $ty) -> Self {
                    MetadataValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
                }
            }
        )*
    };
}

wide_metadata_value!(u64, usize, isize);

impl From<f32> for MetadataValue {
    fn from(value: f32) -> Self {
        MetadataValue::Float(value as f64)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<DateTime<Local>> for MetadataValue {
    fn from(value: DateTime<Local>) -> Self {
        MetadataValue::Timestamp(value)
    }
}

impl From<DateTime<Utc>> for MetadataValue {
    fn from(value: DateTime<Utc>) -> Self {
        MetadataValue::Timestamp(value.with_timezone(&Local))
    }
}

/// Key/value metadata attached to every dispatched event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    values: HashMap<MetadataKey, MetadataValue>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default keys computed for one dispatch: `date`, `fileName`, `function`, `line`.
    pub fn defaults(call_site: &CallSite, now: DateTime<Local>) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(MetadataKey::DATE, now);
        metadata.insert(MetadataKey::FILE_NAME, call_site.file);
        metadata.insert(MetadataKey::FUNCTION, call_site.function);
        metadata.insert(MetadataKey::LINE, call_site.line);
        metadata
    }

    pub fn insert(&mut self, key: impl Into<MetadataKey>, value: impl Into<MetadataValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<MetadataKey>, value: impl Into<MetadataValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &MetadataKey) -> Option<&MetadataValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &MetadataKey) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetadataKey, &MetadataValue)> {
        self.values.iter()
    }

    /// Fills in every key of `defaults` that `self` lacks. Keys already present
    /// in `self` keep their value: the caller always wins.
    pub fn with_defaults(mut self, defaults: Metadata) -> Self {
        for (key, value) in defaults.values {
            self.values.entry(key).or_insert(value);
        }
        self
    }
}

impl<K, V> FromIterator<(K, V)> for Metadata
where
    K: Into<MetadataKey>,
    V: Into<MetadataValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Metadata::new();
        for (key, value) in iter {
            metadata.insert(key, value);
        }
        metadata
    }
}

/// Source location of a log statement. Built by [`call_site!`](crate::call_site)
/// at the call expression so it names the caller, never the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub file: &'static str,
    pub function: &'static str,
    pub line: u32,
}

impl CallSite {
    pub const fn new(file: &'static str, function: &'static str, line: u32) -> Self {
        Self { file, function, line }
    }
}

/// Reduces a `type_name` path such as `app::net::connect::{{closure}}::__here`
/// to the bare function name `connect`.
#[doc(hidden)]
pub fn function_name(path: &'static str) -> &'static str {
    let mut path = path.strip_suffix("::__logmo_here").unwrap_or(path);
    while let Some(stripped) = path.strip_suffix("::{{closure}}") {
        path = stripped;
    }
    path.rsplit("::").next().unwrap_or(path)
}

/// Last path component of a source file path.
pub fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
