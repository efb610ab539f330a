//! # Export Pipeline
//!
//! Serializes a store's logs plus an [`Environment`] block into a temporary
//! file, hands that file to an [`Exporter`] and deletes it once the exporter
//! reports it is done. At most one export runs per store.

use async_trait::async_trait;
use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};

use crate::core::error::LogmoError;
use crate::store::LogStore;

pub mod environment;
pub mod file;

pub use environment::{AppInfo, Environment, Version};
pub use file::{LogFile, parse_entries, render};

/// The collaborator that presents an export file to the user (a share sheet,
/// an upload dialog, a copy into a chosen folder).
///
/// Returning from `present` is the single "done" signal; success, cancel and
/// failure are not distinguished. The file must not be touched afterwards.
#[async_trait]
pub trait Exporter: Send + Sync {
    async fn present(&self, file: &Path, title: &str);
}

#[derive(Debug)]
pub enum ExportOutcome {
    /// Another export was already running; nothing was done.
    Skipped,
    /// The exporter finished and the temporary file at `path` was removed.
    Completed { path: PathBuf },
    Failed(LogmoError),
}

impl ExportOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ExportOutcome::Completed { .. })
    }
}

/// Exactly-once completion handle. Dropping it without calling
/// [`Completion::complete`] also counts as done.
#[derive(Debug)]
pub struct Completion(oneshot::Sender<()>);

impl Completion {
    pub fn complete(self) {
        let _ = self.0.send(());
    }
}

/// An export waiting for the UI side to present it.
#[derive(Debug)]
pub struct ExportRequest {
    pub path: PathBuf,
    pub title: String,
    pub completion: Completion,
}

impl ExportRequest {
    pub fn complete(self) {
        self.completion.complete();
    }
}

/// [`Exporter`] that forwards each file as an [`ExportRequest`] to whoever
/// owns the receiving end, and waits for that request to be completed.
pub struct ChannelExporter {
    sender: mpsc::UnboundedSender<ExportRequest>,
}

impl ChannelExporter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ExportRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl Exporter for ChannelExporter {
    async fn present(&self, file: &Path, title: &str) {
        let (tx, rx) = oneshot::channel();
        let request = ExportRequest {
            path: file.to_path_buf(),
            title: title.to_string(),
            completion: Completion(tx),
        };
        if self.sender.send(request).is_err() {
            tracing::warn!(path = %file.display(), "no export receiver; treating export as done");
            return;
        }
        // Err means the completion was dropped, which also counts as done.
        let _ = rx.await;
    }
}

pub(crate) async fn run(
    store: &LogStore,
    exporter: &dyn Exporter,
    environment: &Environment,
) -> ExportOutcome {
    let Some(_exporting) = store.begin_export() else {
        tracing::debug!("export already in progress; skipped");
        return ExportOutcome::Skipped;
    };

    let entries = store.logs();
    let file = match LogFile::create(store.export_dir(), &entries, environment, Local::now()) {
        Ok(file) => file,
        Err(err) => {
            tracing::error!(error = %err, "failed to write export file");
            return ExportOutcome::Failed(err);
        }
    };
    tracing::debug!(path = %file.path().display(), entries = entries.len(), "export file written");

    exporter.present(file.path(), store.export_title()).await;

    let path = file.path().to_path_buf();
    match file.remove() {
        Ok(()) => ExportOutcome::Completed { path },
        Err(err) => {
            tracing::warn!(error = %err, "failed to remove export file");
            ExportOutcome::Failed(err)
        }
    }
}
