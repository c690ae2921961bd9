//! Rolling Logger
//!
//! Size-rotated log file plus an in-memory circular buffer of the most
//! recent lines, installed as a `tracing` subscriber. `log` records are
//! bridged into `tracing`, so crates using either facade end up here.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid log filter: {0}")]
    Filter(String),
    #[error("failed to install logger: {0}")]
    Init(String),
}

/// Rotation and buffer limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingConfig {
    /// Rotate once the active file would exceed this size
    pub max_bytes: u64,
    /// Rotated files kept as `.1` (newest) to `.N`
    pub keep: usize,
    /// Lines held in the circular buffer
    pub buffer_lines: usize,
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
            keep: 3,
            buffer_lines: 200,
        }
    }
}

/// Path of the active log file for `app_name`
pub fn log_path(dir: &Path, app_name: &str) -> PathBuf {
    dir.join(format!("{}.log", app_name))
}

fn rotated_path(base: &Path, index: usize) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

struct FileState {
    path: PathBuf,
    file: File,
    size: u64,
    config: RollingConfig,
    recent: VecDeque<String>,
}

impl FileState {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.size > 0 && self.size + buf.len() as u64 > self.config.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(buf)?;
        self.size += buf.len() as u64;

        for line in String::from_utf8_lossy(buf).lines() {
            if line.trim().is_empty() {
                continue;
            }
            if self.recent.len() == self.config.buffer_lines {
                self.recent.pop_front();
            }
            if self.config.buffer_lines > 0 {
                self.recent.push_back(line.to_string());
            }
        }
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.config.keep > 0 {
            let oldest = rotated_path(&self.path, self.config.keep);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for index in (1..self.config.keep).rev() {
                let from = rotated_path(&self.path, index);
                if from.exists() {
                    fs::rename(&from, rotated_path(&self.path, index + 1))?;
                }
            }
            fs::rename(&self.path, rotated_path(&self.path, 1))?;
        }
        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.size = 0;
        Ok(())
    }
}

/// Shared handle to the active log file; usable as a `fmt` writer
#[derive(Clone)]
pub struct RollingFile {
    state: Arc<Mutex<FileState>>,
}

impl RollingFile {
    /// Open `<dir>/<app_name>.log` for appending, creating `dir` if needed
    pub fn open(dir: &Path, app_name: &str, config: RollingConfig) -> Result<Self, LoggerError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| LoggerError::Io { path, source }
        };
        fs::create_dir_all(dir).map_err(io_err(dir))?;

        let path = log_path(dir, app_name);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err(&path))?;
        let size = file.metadata().map_err(io_err(&path))?.len();

        let rolling = Self {
            state: Arc::new(Mutex::new(FileState {
                path,
                file,
                size,
                config,
                recent: VecDeque::with_capacity(config.buffer_lines),
            })),
        };
        let header = format!(
            "=== {} started {} ===\n",
            app_name,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let path = rolling.path();
        rolling.lock().write(header.as_bytes()).map_err(io_err(&path))?;
        Ok(rolling)
    }

    pub fn path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    /// Oldest-first copy of the circular buffer
    pub fn recent_lines(&self) -> Vec<String> {
        self.lock().recent.iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, FileState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Writer handed out per event by [`RollingFile`]
pub struct RollingWriter {
    state: Arc<Mutex<FileState>>,
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).file.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingFile {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RollingWriter { state: self.state.clone() }
    }
}

/// Keeps the installed file handle reachable for `recent_lines`
pub struct LoggerHandle {
    file: RollingFile,
}

impl LoggerHandle {
    pub fn recent_lines(&self) -> Vec<String> {
        self.file.recent_lines()
    }

    pub fn path(&self) -> PathBuf {
        self.file.path()
    }
}

/// Install the global subscriber: stderr plus the rolling file, filtered by `filter`
pub fn init_logger(dir: &Path, app_name: &str, filter: &str) -> Result<LoggerHandle, LoggerError> {
    let file = RollingFile::open(dir, app_name, RollingConfig::default())?;
    let filter = EnvFilter::try_new(filter).map_err(|e| LoggerError::Filter(e.to_string()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file.clone()))
        .try_init()
        .map_err(|e| LoggerError::Init(e.to_string()))?;

    tracing::info!(path = %file.path().display(), "Logger initialized");
    log::debug!("log records bridged into tracing");
    Ok(LoggerHandle { file })
}

/// Last `lines` non-empty lines of the active log file; empty when absent
pub fn tail(dir: &Path, app_name: &str, lines: usize) -> Result<Vec<String>, LoggerError> {
    let path = log_path(dir, app_name);
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(LoggerError::Io { path, source }),
    };

    let mut window = VecDeque::with_capacity(lines);
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| LoggerError::Io { path: path.clone(), source })?;
        if line.trim().is_empty() || lines == 0 {
            continue;
        }
        if window.len() == lines {
            window.pop_front();
        }
        window.push_back(line);
    }
    Ok(window.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(max_bytes: u64, keep: usize, buffer_lines: usize) -> RollingConfig {
        RollingConfig { max_bytes, keep, buffer_lines }
    }

    fn write_line(file: &RollingFile, line: &str) {
        let mut writer = file.make_writer();
        writer.write_all(format!("{}\n", line).as_bytes()).unwrap();
    }

    #[test]
    fn test_buffer_keeps_most_recent_lines() {
        let dir = tempfile::tempdir().unwrap();
        let file = RollingFile::open(dir.path(), "app", small(1024 * 1024, 1, 3)).unwrap();
        for i in 0..5 {
            write_line(&file, &format!("line {}", i));
        }
        assert_eq!(file.recent_lines(), vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_rotation_shifts_files_and_drops_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let file = RollingFile::open(dir.path(), "app", small(64, 2, 10)).unwrap();
        for i in 0..20 {
            write_line(&file, &format!("entry number {:02}", i));
        }

        let base = log_path(dir.path(), "app");
        assert!(base.exists());
        assert!(rotated_path(&base, 1).exists());
        assert!(rotated_path(&base, 2).exists());
        assert!(!rotated_path(&base, 3).exists());
        assert!(fs::metadata(&base).unwrap().len() <= 64);

        let tail = tail(dir.path(), "app", 1).unwrap();
        assert_eq!(tail, vec!["entry number 19"]);
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        {
            let file = RollingFile::open(dir.path(), "app", RollingConfig::default()).unwrap();
            write_line(&file, "first run");
        }
        let file = RollingFile::open(dir.path(), "app", RollingConfig::default()).unwrap();
        write_line(&file, "second run");

        let lines = tail(dir.path(), "app", 10).unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "first run");
        assert_eq!(lines[3], "second run");
        assert!(lines[2].starts_with("=== app started"));
    }

    #[test]
    fn test_tail_of_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(tail(dir.path(), "nothing", 5).unwrap().is_empty());
    }
}
