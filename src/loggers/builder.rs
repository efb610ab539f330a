use arc_swap::ArcSwap;
use chrono::Local;
use std::any::Any;
use std::cell::RefCell;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use crate::configs::LogmoConfig;
use crate::core::error::LogmoError;
use crate::loggers::core::{CallSite, Level, Metadata};
use crate::loggers::printer::Printer;

pub struct LoggerConfig {
    /// Events below this level never reach the printers.
    pub level: Level,
}

/// Entry point applications log through.
///
/// Cloning is cheap and every clone shares the same printer set. The fan-out
/// of one event is serialized against other events on the same logger. An
/// event a printer logs through the logger that is invoking it is dropped.
#[derive(Clone)]
pub struct Logger {
    printers: Arc<ArcSwap<Vec<Arc<dyn Printer>>>>,
    pub config: Arc<ArcSwap<LoggerConfig>>,
    dispatch: Arc<Mutex<()>>,
}

impl Logger {
    pub fn new(printers: Vec<Arc<dyn Printer>>) -> Self {
        LoggerBuilder::new().with_printers(printers).build()
    }

    /// Replaces the whole printer set. An empty list silences the logger.
    pub fn configure(&self, printers: Vec<Arc<dyn Printer>>) {
        self.printers.store(Arc::new(printers));
    }

    pub fn set_level(&self, level: Level) {
        self.config.store(Arc::new(LoggerConfig { level }));
    }

    pub fn level(&self) -> Level {
        self.config.load().level
    }

    pub fn printer_count(&self) -> usize {
        self.printers.load().len()
    }

    pub fn log(&self, level: Level, message: impl Display, metadata: Metadata, call_site: CallSite) {
        if level < self.config.load().level {
            return;
        }
        // A printer (or a tracing bridge fed by the diagnostics below) logging
        // through this same logger lands here while its dispatch is running.
        let Some(_reentry) = ReentryGuard::enter(self.dispatch_id()) else {
            return;
        };

        let metadata = metadata.with_defaults(Metadata::defaults(&call_site, Local::now()));
        let message = message.to_string();
        let printers = self.printers.load_full();

        let failures = {
            let _dispatch = self.dispatch.lock().unwrap_or_else(PoisonError::into_inner);
            printers
                .iter()
                .filter_map(|printer| {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        printer.print(&message, &metadata, level)
                    }));
                    match outcome {
                        Ok(Ok(())) => None,
                        Ok(Err(err)) => Some((printer.name().to_string(), Failure::Returned(err))),
                        Err(payload) => Some((
                            printer.name().to_string(),
                            Failure::Panicked(panic_message(payload.as_ref()).to_string()),
                        )),
                    }
                })
                .collect::<Vec<_>>()
        };

        for (printer, failure) in failures {
            match failure {
                Failure::Returned(err) => {
                    tracing::warn!(printer = %printer, error = %err, "printer failed");
                }
                Failure::Panicked(panic) => {
                    tracing::error!(printer = %printer, panic = %panic, "printer panicked");
                }
            }
        }
    }

    fn dispatch_id(&self) -> usize {
        Arc::as_ptr(&self.dispatch) as usize
    }

    pub fn debug(&self, message: impl Display, metadata: Metadata, call_site: CallSite) {
        self.log(Level::Debug, message, metadata, call_site);
    }

    pub fn info(&self, message: impl Display, metadata: Metadata, call_site: CallSite) {
        self.log(Level::Info, message, metadata, call_site);
    }

    pub fn notice(&self, message: impl Display, metadata: Metadata, call_site: CallSite) {
        self.log(Level::Notice, message, metadata, call_site);
    }

    pub fn error(&self, message: impl Display, metadata: Metadata, call_site: CallSite) {
        self.log(Level::Error, message, metadata, call_site);
    }

    pub fn fault(&self, message: impl Display, metadata: Metadata, call_site: CallSite) {
        self.log(Level::Fault, message, metadata, call_site);
    }
}

impl Default for Logger {
    fn default() -> Self {
        LoggerBuilder::new().build()
    }
}

enum Failure {
    Returned(LogmoError),
    Panicked(String),
}

thread_local! {
    /// Loggers whose dispatch is running on this thread.
    static DISPATCHING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

struct ReentryGuard(usize);

impl ReentryGuard {
    fn enter(id: usize) -> Option<Self> {
        DISPATCHING.with(|active| {
            let mut active = active.borrow_mut();
            if active.contains(&id) {
                None
            } else {
                active.push(id);
                Some(ReentryGuard(id))
            }
        })
    }
}

impl Drop for ReentryGuard {
    fn drop(&mut self) {
        let _ = DISPATCHING.try_with(|active| active.borrow_mut().retain(|&id| id != self.0));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

pub struct LoggerBuilder {
    printers: Vec<Arc<dyn Printer>>,
    level: Level,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            printers: Vec::new(),
            level: Level::Debug,
        }
    }

    /// Starts from the configured minimum level.
    pub fn from_config(config: &LogmoConfig) -> Self {
        Self::new().with_level(config.level)
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_printer(mut self, printer: impl Printer + 'static) -> Self {
        self.printers.push(Arc::new(printer));
        self
    }

    pub fn with_printers(mut self, printers: Vec<Arc<dyn Printer>>) -> Self {
        self.printers.extend(printers);
        self
    }

    pub fn build(self) -> Logger {
        Logger {
            printers: Arc::new(ArcSwap::from_pointee(self.printers)),
            config: Arc::new(ArcSwap::from_pointee(LoggerConfig { level: self.level })),
            dispatch: Arc::new(Mutex::new(())),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
