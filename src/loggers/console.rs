use std::io::Write;
use std::sync::{Mutex, PoisonError};

use crate::configs::LogmoConfig;
use crate::core::error::LogmoError;
use crate::loggers::core::{Level, Metadata};
use crate::loggers::printer::{DefaultFields, MALFORMED_METADATA_MESSAGE, Printer, check_date_format};

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes one human-readable line per event:
/// `<marker> <date> <file>/<function>/<line> [<category>] <message>`.
pub struct ConsolePrinter {
    date_format: String,
    target: Mutex<Box<dyn Write + Send>>,
}

impl ConsolePrinter {
    /// Printer writing to stdout.
    pub fn new() -> Self {
        Self::with_writer(std::io::stdout())
    }

    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            target: Mutex::new(Box::new(writer)),
        }
    }

    /// Stdout printer using the configured date format.
    pub fn from_config(config: &LogmoConfig) -> Self {
        Self::new().with_date_format(&config.date_format)
    }

    /// A format chrono cannot render is ignored and the current one kept.
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        let date_format = date_format.into();
        match check_date_format(&date_format) {
            Ok(()) => self.date_format = date_format,
            Err(err) => {
                tracing::warn!(error = %err, "console printer keeps its date format");
            }
        }
        self
    }

    pub fn format(
        &self,
        message: &str,
        metadata: &Metadata,
        level: Level,
    ) -> Result<String, LogmoError> {
        let fields = DefaultFields::extract(metadata)?;
        Ok(format!(
            "{} {}{}",
            level.marker(),
            fields.prefix(&self.date_format)?,
            message
        ))
    }
}

impl Default for ConsolePrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer for ConsolePrinter {
    fn name(&self) -> &str {
        "console"
    }

    fn print(&self, message: &str, metadata: &Metadata, level: Level) -> Result<(), LogmoError> {
        let line = self.format(message, metadata, level).unwrap_or_else(|err| {
            tracing::debug!(error = %err, "console printer received malformed metadata");
            MALFORMED_METADATA_MESSAGE.to_string()
        });

        let mut target = self.target.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(target, "{}", line)
            .and_then(|_| target.flush())
            .map_err(|err| LogmoError::Printer {
                printer: self.name().to_string(),
                details: err.to_string(),
            })
    }
}
