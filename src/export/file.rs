use chrono::{DateTime, Local};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::error::LogmoError;
use crate::export::environment::Environment;
use crate::loggers::core::Level;
use crate::store::LogEntry;

pub const FILE_NAME_FORMAT: &str = "%Y%m%d_%H%M%S";

pub fn file_name(at: DateTime<Local>) -> String {
    format!("{}.log", at.format(FILE_NAME_FORMAT))
}

/// `<marker> <message>` per entry, a blank line, then the environment block.
pub fn render(entries: &[LogEntry], environment: &Environment, exported_at: DateTime<Local>) -> String {
    let body = entries
        .iter()
        .map(|entry| format!("{} {}", entry.level.marker(), entry.message))
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}\n\n{}", body, environment.describe(exported_at))
}

/// Recovers the entries of a rendered export. Reading stops at the blank line
/// that opens the environment block; lines without a known marker are skipped.
pub fn parse_entries(content: &str) -> Vec<LogEntry> {
    content
        .lines()
        .take_while(|line| !line.is_empty())
        .filter_map(|line| {
            let (marker, message) = line.split_once(' ')?;
            let level = Level::from_marker(marker)?;
            Some(LogEntry::new(message, level))
        })
        .collect()
}

static NEXT_FOLDER: AtomicU64 = AtomicU64::new(0);

/// Creates a fresh folder under `dir` that no other export shares.
fn unique_folder(dir: &Path) -> Result<PathBuf, LogmoError> {
    loop {
        let seq = NEXT_FOLDER.fetch_add(1, Ordering::Relaxed);
        let folder = dir.join(format!("logmo-export-{}-{}", std::process::id(), seq));
        match fs::create_dir(&folder) {
            Ok(()) => return Ok(folder),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(LogmoError::io(&folder, err)),
        }
    }
}

/// A rendered export on disk, at `<dir>/<folder>/<yyyyMMdd_HHmmss>.log` with a
/// folder private to this export. The file and its folder are removed by
/// [`LogFile::remove`] or, failing that, when the value drops.
#[derive(Debug)]
pub struct LogFile {
    folder: PathBuf,
    path: PathBuf,
    removed: bool,
}

impl LogFile {
    pub fn create(
        dir: &Path,
        entries: &[LogEntry],
        environment: &Environment,
        exported_at: DateTime<Local>,
    ) -> Result<Self, LogmoError> {
        fs::create_dir_all(dir).map_err(|e| LogmoError::io(dir, e))?;
        let folder = unique_folder(dir)?;
        let file = Self {
            path: folder.join(file_name(exported_at)),
            folder,
            removed: false,
        };
        fs::write(&file.path, render(entries, environment, exported_at))
            .map_err(|e| LogmoError::io(&file.path, e))?;

        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// On failure the value still drops, and `Drop` tries once more.
    pub fn remove(mut self) -> Result<(), LogmoError> {
        fs::remove_file(&self.path).map_err(|e| LogmoError::io(&self.path, e))?;
        fs::remove_dir(&self.folder).map_err(|e| LogmoError::io(&self.folder, e))?;
        self.removed = true;
        Ok(())
    }
}

impl Drop for LogFile {
    fn drop(&mut self) {
        if !self.removed {
            let _ = fs::remove_file(&self.path);
            let _ = fs::remove_dir(&self.folder);
        }
    }
}
