//! Append-only debug log file.
//!
//! One entry per line: `<RFC3339 timestamp> [<TYPE>] <target>: <message>`.
//! [`DebugLog`] doubles as the process-wide `log` sink so library diagnostics
//! land in the same file as router-supplied debug entries. [`LogTail`] reads
//! it back for the log viewer.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, SecondsFormat};
use log::{LevelFilter, Log, Metadata, Record};

/// Format one log entry. Newlines in `message` are escaped so an entry is
/// always a single line.
pub fn format_entry(ts: DateTime<Local>, kind: &str, target: &str, message: &str) -> String {
    format!(
        "{} [{}] {}: {}",
        ts.to_rfc3339_opts(SecondsFormat::Millis, false),
        kind.to_uppercase(),
        target,
        message.replace('\n', "\\n")
    )
}

#[derive(Debug, Clone)]
pub struct DebugLog {
    file: Arc<Mutex<File>>,
    path: PathBuf,
    level: LevelFilter,
}

impl DebugLog {
    pub fn open(path: impl AsRef<Path>, level: LevelFilter) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            file: Arc::new(Mutex::new(file)),
            path,
            level,
        })
    }

    /// Open the file and route the `log` facade into it. Call once.
    pub fn install(path: impl AsRef<Path>, level: LevelFilter) -> anyhow::Result<Self> {
        let sink = Self::open(path, level)?;
        log::set_boxed_logger(Box::new(sink.clone()))
            .map_err(|e| anyhow::anyhow!("logger already installed: {}", e))?;
        log::set_max_level(level);
        Ok(sink)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry stamped with the current local time.
    pub fn append(&self, kind: &str, target: &str, message: &str) -> io::Result<()> {
        let line = format_entry(Local::now(), kind, target, message);
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(file, "{}", line)
    }
}

impl Log for DebugLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = self.append(
            record.level().as_str(),
            record.target(),
            &record.args().to_string(),
        );
    }

    fn flush(&self) {
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        let _ = file.flush();
    }
}

/// Read-only view of the end of a log file.
#[derive(Debug, Clone)]
pub struct LogTail {
    path: PathBuf,
}

impl LogTail {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Last `max_lines` lines, oldest first. A missing file reads as empty.
    pub fn read(&self, max_lines: usize) -> io::Result<Vec<String>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let lines: Vec<&str> = text.lines().collect();
        let start = lines.len().saturating_sub(max_lines);
        Ok(lines[start..].iter().map(|l| l.to_string()).collect())
    }
}
