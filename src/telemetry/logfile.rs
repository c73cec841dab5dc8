//! Tagged line log shared by the control loop and the publisher task.
//!
//! Every line is `<elapsed_ms> <TAG> <payload>`.  The writer sits behind a
//! mutex taken once per line.  Console echo follows a fixed rule:
//! `LOG_DEBUG` never, `LOG_ERROR` always, the rest only on request.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{error, info, warn};

/// First numeric suffix tried for a new log file.
pub const FIRST_LOG_INDEX: u32 = 10;

/// Number of candidate file names before giving up.
pub const LOG_NAME_ATTEMPTS: u32 = 1000;

/// Line tags of the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    SmState,
    SensorsHeader,
    SensorsValues,
    LogError,
    LogWarning,
    LogInfo,
    LogDebug,
}

impl LogTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SmState => "SM_STATE",
            Self::SensorsHeader => "SENSORS_HEADER",
            Self::SensorsValues => "SENSORS_VALUES",
            Self::LogError => "LOG_ERROR",
            Self::LogWarning => "LOG_WARNING",
            Self::LogInfo => "LOG_INFO",
            Self::LogDebug => "LOG_DEBUG",
        }
    }

    /// Whether a line with this tag reaches the console.
    pub const fn echoes(self, requested: bool) -> bool {
        match self {
            Self::LogDebug => false,
            Self::LogError => true,
            _ => requested,
        }
    }
}

impl core::fmt::Display for LogTag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ───────────────────────────────────────────────────────────────
// Logfile
// ───────────────────────────────────────────────────────────────

/// Line-oriented log over any [`Write`] target.
pub struct Logfile<W: Write> {
    out: Mutex<W>,
}

impl<W: Write> Logfile<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Append one line.  `console` asks for an echo on the `log` facade,
    /// subject to [`LogTag::echoes`].
    pub fn log(&self, now_ms: u32, tag: LogTag, line: &str, console: bool) -> io::Result<()> {
        if tag.echoes(console) {
            match tag {
                LogTag::LogError => error!("{} {} {}", now_ms, tag, line),
                LogTag::LogWarning => warn!("{} {} {}", now_ms, tag, line),
                _ => info!("{} {} {}", now_ms, tag, line),
            }
        }

        // A panic while holding the lock must not silence the log.
        let mut out = self.out.lock().unwrap_or_else(|p| p.into_inner());
        writeln!(out, "{now_ms} {tag} {line}")
    }

    pub fn flush(&self) -> io::Result<()> {
        self.out.lock().unwrap_or_else(|p| p.into_inner()).flush()
    }

    /// Recover the writer (tests, shutdown).
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|p| p.into_inner())
    }
}

// ───────────────────────────────────────────────────────────────
// Log directory
// ───────────────────────────────────────────────────────────────

/// Directory holding one `logdata_<n>.txt` per boot.
pub struct LogDirectory {
    dir: PathBuf,
    current: Option<String>,
}

impl LogDirectory {
    /// Use `dir`, creating it when missing.
    pub fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, current: None })
    }

    /// Create the first unused `logdata_<n>.txt` for `n` from
    /// [`FIRST_LOG_INDEX`] upward.
    pub fn create_next(&mut self) -> io::Result<BufWriter<File>> {
        for index in FIRST_LOG_INDEX..FIRST_LOG_INDEX + LOG_NAME_ATTEMPTS {
            let name = format!("logdata_{index}.txt");
            let path = self.dir.join(&name);
            if path.exists() {
                continue;
            }
            let file = File::create(&path)?;
            info!("Logging to {}", path.display());
            self.current = Some(name);
            return Ok(BufWriter::new(file));
        }
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "no free log file name",
        ))
    }

    /// Name of the file opened by [`create_next`](Self::create_next).
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Delete every file in the directory except the current log.
    /// Returns the number of files removed.
    pub fn remove_other_files(&self) -> io::Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_name().to_str() == self.current() {
                continue;
            }
            if entry.file_type()?.is_file() {
                info!("rm {}", entry.path().display());
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
