use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use std::fmt::Write;

use crate::core::error::LogmoError;
use crate::loggers::core::{Level, Metadata, MetadataKey, base_name};

/// Line emitted by printers when the default metadata is missing or mistyped.
pub const MALFORMED_METADATA_MESSAGE: &str = "Default metadata object went wrong!";

/// Rejects a `strftime` pattern chrono cannot render, such as `%Q`.
pub fn check_date_format(date_format: &str) -> Result<(), LogmoError> {
    if StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error)) {
        return Err(LogmoError::Config(format!(
            "invalid date format `{}`",
            date_format
        )));
    }
    Ok(())
}

/// Consumer of dispatched log events.
///
/// Printers are invoked synchronously, in registration order, for every event
/// a [`Logger`](crate::loggers::Logger) lets through. An `Err` (or a panic) from
/// one printer is reported through `tracing` and never stops the others.
pub trait Printer: Send + Sync {
    /// Name used when reporting failures.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn print(&self, message: &str, metadata: &Metadata, level: Level) -> Result<(), LogmoError>;
}

/// The default keys every printer relies on, pulled out of the merged metadata
/// with their expected value kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultFields<'a> {
    pub date: DateTime<Local>,
    pub file_name: &'a str,
    pub function: &'a str,
    pub line: i64,
    pub category: Option<&'a str>,
}

impl<'a> DefaultFields<'a> {
    pub fn extract(metadata: &'a Metadata) -> Result<Self, LogmoError> {
        let missing = |key: &MetadataKey| LogmoError::MalformedMetadata {
            key: key.to_string(),
        };

        let date = metadata
            .get(&MetadataKey::DATE)
            .and_then(|v| v.as_timestamp())
            .ok_or_else(|| missing(&MetadataKey::DATE))?;
        let file_name = metadata
            .get(&MetadataKey::FILE_NAME)
            .and_then(|v| v.as_str())
            .ok_or_else(|| missing(&MetadataKey::FILE_NAME))?;
        let function = metadata
            .get(&MetadataKey::FUNCTION)
            .and_then(|v| v.as_str())
            .ok_or_else(|| missing(&MetadataKey::FUNCTION))?;
        let line = metadata
            .get(&MetadataKey::LINE)
            .and_then(|v| v.as_int())
            .ok_or_else(|| missing(&MetadataKey::LINE))?;
        let category = metadata
            .get(&MetadataKey::CATEGORY)
            .and_then(|v| v.as_str())
            .filter(|c| !c.is_empty());

        Ok(Self {
            date,
            file_name: base_name(file_name),
            function,
            line,
            category,
        })
    }

    /// `<date> <file>/<function>/<line> ` followed by `[<category>] ` when a
    /// category is present.
    pub fn prefix(&self, date_format: &str) -> Result<String, LogmoError> {
        let mut prefix = String::new();
        write!(
            prefix,
            "{} {}/{}/{} ",
            self.date.format(date_format),
            self.file_name,
            self.function,
            self.line
        )
        .map_err(|_| LogmoError::Config(format!("invalid date format `{}`", date_format)))?;
        if let Some(category) = self.category {
            prefix.push('[');
            prefix.push_str(category);
            prefix.push_str("] ");
        }
        Ok(prefix)
    }
}
