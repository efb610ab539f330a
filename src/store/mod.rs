//! # Log Store
//!
//! Accumulates [`LogEntry`] values for live inspection, keeps the filtered view
//! in step with the active filter patterns, and owns the export busy flag.
//!
//! All state sits behind one lock, which is never held across an `.await`:
//! appends, filter edits and the export guard-then-set are serialized against
//! each other.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use crate::configs::{FilePreferences, LogmoConfig, MemoryPreferences, PreferenceStore};
use crate::configs::{DEFAULT_EXPORT_TITLE, DEFAULT_SCOPE};
use crate::core::error::LogmoError;
use crate::export::environment::Environment;
use crate::export::{ExportOutcome, Exporter};
use crate::loggers::core::Level;

pub mod filter;
pub mod worker;

pub use filter::{FilterPattern, FilterSet};
pub use worker::{StorePrinter, StoreWorker};

pub const KEY_FILTER_PATTERNS: &str = "filterPatterns";
pub const KEY_SHOW_FILTERS: &str = "showFilters";
pub const KEY_SHOW_SEARCH_BAR: &str = "showSearchBar";

/// One stored log line. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    pub level: Level,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, level: Level) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }
}

struct StoreState {
    title: String,
    logs: Vec<LogEntry>,
    /// Indices into `logs` of entries no filter pattern excludes.
    visible: Vec<usize>,
    filters: FilterSet,
    show_filters: bool,
    show_search_bar: bool,
    is_exporting: bool,
}

impl StoreState {
    fn refilter(&mut self) {
        let filters = &self.filters;
        self.visible = self
            .logs
            .iter()
            .enumerate()
            .filter(|(_, entry)| !filters.excludes(&entry.message))
            .map(|(idx, _)| idx)
            .collect();
    }

    fn visible_entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.visible.iter().map(|&idx| &self.logs[idx])
    }
}

pub struct LogStore {
    state: Mutex<StoreState>,
    preferences: Arc<dyn PreferenceStore>,
    revision: watch::Sender<u64>,
    export_dir: PathBuf,
    export_title: String,
}

impl LogStore {
    /// Loads `filterPatterns`, `showFilters` and `showSearchBar` from
    /// `preferences`, defaulting to `[]`, `true` and `true`.
    pub fn new(preferences: Arc<dyn PreferenceStore>) -> Self {
        let filters = FilterSet::from_sources(
            preferences
                .get_strings(KEY_FILTER_PATTERNS)
                .unwrap_or_default(),
        );
        let show_filters = preferences.get_bool(KEY_SHOW_FILTERS).unwrap_or(true);
        let show_search_bar = preferences.get_bool(KEY_SHOW_SEARCH_BAR).unwrap_or(true);
        let (revision, _) = watch::channel(0);

        Self {
            state: Mutex::new(StoreState {
                title: String::new(),
                logs: Vec::new(),
                visible: Vec::new(),
                filters,
                show_filters,
                show_search_bar,
                is_exporting: false,
            }),
            preferences,
            revision,
            export_dir: std::env::temp_dir(),
            export_title: DEFAULT_EXPORT_TITLE.to_string(),
        }
    }

    /// Store whose settings live only as long as the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryPreferences::new(DEFAULT_SCOPE)))
    }

    /// Store persisting to `<preferences_dir>/<scope>.json`.
    pub fn from_config(config: &LogmoConfig) -> Result<Self, LogmoError> {
        let preferences = FilePreferences::open(&config.preferences_dir, config.scope.clone())?;
        Ok(Self::new(Arc::new(preferences))
            .with_export_dir(config.export_dir.clone())
            .with_export_title(config.export_title.clone()))
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn with_export_title(mut self, title: impl Into<String>) -> Self {
        self.export_title = title.into();
        self
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }

    /// Receives a new revision number after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn title(&self) -> String {
        self.state().title.clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.state().title = title.into();
        self.bump();
    }

    pub fn add_log(&self, entry: LogEntry) {
        {
            let mut state = self.state();
            let excluded = state.filters.excludes(&entry.message);
            let idx = state.logs.len();
            state.logs.push(entry);
            if !excluded {
                state.visible.push(idx);
            }
        }
        self.bump();
    }

    /// Every entry in emission order, filters ignored.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.state().logs.clone()
    }

    pub fn len(&self) -> usize {
        self.state().logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().logs.is_empty()
    }

    /// Entries no filter pattern excludes, in emission order.
    pub fn filtered_logs(&self) -> Vec<LogEntry> {
        self.state().visible_entries().cloned().collect()
    }

    /// The filtered view narrowed to `levels`.
    pub fn visible_logs(&self, levels: &[Level]) -> Vec<LogEntry> {
        self.state()
            .visible_entries()
            .filter(|entry| levels.contains(&entry.level))
            .cloned()
            .collect()
    }

    /// Case-insensitive substring search over the filtered view. An empty
    /// query returns the whole filtered view.
    pub fn search(&self, query: &str) -> Vec<LogEntry> {
        let query = query.to_lowercase();
        self.state()
            .visible_entries()
            .filter(|entry| entry.message.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }

    pub fn filter_patterns(&self) -> Vec<String> {
        self.state().filters.sources()
    }

    /// No-op for an empty or already present pattern; returns whether it was added.
    pub fn add_filter_pattern(&self, pattern: &str) -> bool {
        let added = {
            let mut state = self.state();
            let added = state.filters.add(pattern);
            if added {
                state.refilter();
                self.persist_patterns(&state.filters);
            }
            added
        };
        if added {
            self.bump();
        }
        added
    }

    pub fn remove_filter_pattern(&self, pattern: &str) -> bool {
        let removed = {
            let mut state = self.state();
            let removed = state.filters.remove(pattern);
            if removed {
                state.refilter();
                self.persist_patterns(&state.filters);
            }
            removed
        };
        if removed {
            self.bump();
        }
        removed
    }

    /// Empties the logs and the filter patterns. Title and display toggles stay.
    pub fn clear(&self) {
        {
            let mut state = self.state();
            state.logs.clear();
            state.visible.clear();
            state.filters.clear();
            self.persist_patterns(&state.filters);
        }
        self.bump();
    }

    pub fn show_filters(&self) -> bool {
        self.state().show_filters
    }

    pub fn set_show_filters(&self, show: bool) {
        self.state().show_filters = show;
        self.persist_bool(KEY_SHOW_FILTERS, show);
        self.bump();
    }

    pub fn show_search_bar(&self) -> bool {
        self.state().show_search_bar
    }

    pub fn set_show_search_bar(&self, show: bool) {
        self.state().show_search_bar = show;
        self.persist_bool(KEY_SHOW_SEARCH_BAR, show);
        self.bump();
    }

    pub fn is_exporting(&self) -> bool {
        self.state().is_exporting
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn export_title(&self) -> &str {
        &self.export_title
    }

    /// Writes all logs (unfiltered) plus `environment` to a temporary file,
    /// hands it to `exporter`, and removes it once the exporter is done.
    /// Returns [`ExportOutcome::Skipped`] right away while another export runs.
    pub async fn export(&self, exporter: &dyn Exporter, environment: &Environment) -> ExportOutcome {
        crate::export::run(self, exporter, environment).await
    }

    /// Flips `is_exporting` to true unless it already is. The flag goes back to
    /// false when the returned guard drops.
    pub(crate) fn begin_export(&self) -> Option<ExportGuard<'_>> {
        {
            let mut state = self.state();
            if state.is_exporting {
                return None;
            }
            state.is_exporting = true;
        }
        self.bump();
        Some(ExportGuard { store: self })
    }

    fn persist_patterns(&self, filters: &FilterSet) {
        if let Err(err) = self
            .preferences
            .set_strings(KEY_FILTER_PATTERNS, &filters.sources())
        {
            tracing::warn!(error = %err, scope = self.preferences.scope(), "failed to persist filter patterns");
        }
    }

    fn persist_bool(&self, key: &str, value: bool) {
        if let Err(err) = self.preferences.set_bool(key, value) {
            tracing::warn!(error = %err, key, scope = self.preferences.scope(), "failed to persist setting");
        }
    }
}

pub(crate) struct ExportGuard<'a> {
    store: &'a LogStore,
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        self.store.state().is_exporting = false;
        self.store.bump();
    }
}
