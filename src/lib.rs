//! In-process logging: leveled events fan out to pluggable printers, a
//! [`LogStore`](store::LogStore) keeps them for live inspection and filtering,
//! and the export pipeline snapshots the store to a text file.

pub mod core;
pub mod configs;
pub mod export;
pub mod loggers;
pub mod store;
pub mod utils;

pub use self::core::error::LogmoError;
pub use configs::LogmoConfig;
pub use export::{ChannelExporter, Environment, ExportOutcome, Exporter};
pub use loggers::{ConsolePrinter, Level, Logger, LoggerBuilder, Metadata, MetadataKey, Printer};
pub use store::{LogEntry, LogStore, StorePrinter};
