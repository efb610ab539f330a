use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::configs::LogmoConfig;
use crate::core::error::LogmoError;
use crate::loggers::console::DEFAULT_DATE_FORMAT;
use crate::loggers::core::{Level, Metadata};
use crate::loggers::printer::{DefaultFields, MALFORMED_METADATA_MESSAGE, Printer, check_date_format};
use crate::store::{LogEntry, LogStore};

enum Delivery {
    Direct(Arc<LogStore>),
    Queued(mpsc::UnboundedSender<LogEntry>),
}

/// Printer that turns every event into a [`LogEntry`] and appends it to a
/// [`LogStore`]. The entry message is
/// `<date> <file>/<function>/<line> [<category>] <message>`; the level travels
/// in the entry itself.
pub struct StorePrinter {
    delivery: Delivery,
    date_format: String,
}

impl StorePrinter {
    /// Appends on the logging thread.
    pub fn direct(store: Arc<LogStore>) -> Self {
        Self {
            delivery: Delivery::Direct(store),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    /// Hands entries to a [`StoreWorker`] task that appends them in emission
    /// order. Must be called from within a tokio runtime. The worker exits once
    /// the printer (and every logger holding it) is dropped.
    pub fn spawn(store: Arc<LogStore>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = StoreWorker::new(rx, store);
        let handle = tokio::spawn(async move {
            worker.run().await;
        });

        let printer = Self {
            delivery: Delivery::Queued(tx),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        };
        (printer, handle)
    }

    /// A format chrono cannot render is ignored and the current one kept.
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        let date_format = date_format.into();
        match check_date_format(&date_format) {
            Ok(()) => self.date_format = date_format,
            Err(err) => {
                tracing::warn!(error = %err, "store printer keeps its date format");
            }
        }
        self
    }

    /// Applies the configured date format.
    pub fn with_config(self, config: &LogmoConfig) -> Self {
        self.with_date_format(config.date_format.as_str())
    }

    pub fn entry(&self, message: &str, metadata: &Metadata, level: Level) -> LogEntry {
        match DefaultFields::extract(metadata).and_then(|fields| fields.prefix(&self.date_format)) {
            Ok(prefix) => LogEntry::new(format!("{}{}", prefix, message), level),
            Err(err) => {
                tracing::debug!(error = %err, "store printer received malformed metadata");
                LogEntry::new(MALFORMED_METADATA_MESSAGE, Level::Error)
            }
        }
    }
}

impl Printer for StorePrinter {
    fn name(&self) -> &str {
        "store"
    }

    fn print(&self, message: &str, metadata: &Metadata, level: Level) -> Result<(), LogmoError> {
        let entry = self.entry(message, metadata, level);
        match &self.delivery {
            Delivery::Direct(store) => {
                store.add_log(entry);
                Ok(())
            }
            Delivery::Queued(tx) => tx.send(entry).map_err(|_| LogmoError::Printer {
                printer: self.name().to_string(),
                details: "store worker has stopped".to_string(),
            }),
        }
    }
}

/// Drains queued entries into the store, one at a time.
pub struct StoreWorker {
    receiver: mpsc::UnboundedReceiver<LogEntry>,
    store: Arc<LogStore>,
}

impl StoreWorker {
    pub fn new(receiver: mpsc::UnboundedReceiver<LogEntry>, store: Arc<LogStore>) -> Self {
        Self { receiver, store }
    }

    pub async fn run(mut self) {
        while let Some(entry) = self.receiver.recv().await {
            self.store.add_log(entry);
        }
        tracing::debug!("store worker finished");
    }
}
