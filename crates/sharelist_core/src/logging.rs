//! Rolling file logs for the list core.
//!
//! Log lines carry ids, counts and statuses only. Emails and list or task
//! titles stay out of them; the one place free text can slip in is a panic
//! payload, which is redacted before it is written.
//!
//! Logging is started at most once per process. Asking again with the same
//! settings is a no-op, asking with different ones is an error.

use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info, LevelFilter};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "sharelist";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static EMAIL_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^@\s]+@[^@\s]+").expect("email token regex must compile"));
static QUOTED_TEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(?:[^"\\]|\\.)*""#).expect("quoted text regex must compile"));

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

/// Validated logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LevelFilter,
    /// Absolute directory the rolling files live in.
    pub dir: PathBuf,
}

impl LogSettings {
    /// Parses a level name (`warning` is accepted for `warn`) and an
    /// absolute directory.
    pub fn parse(level: &str, dir: &str) -> Result<Self, LoggingError> {
        Ok(Self {
            level: parse_level(level)?,
            dir: parse_dir(dir)?,
        })
    }
}

#[derive(Debug)]
pub enum LoggingError {
    UnknownLevel(String),
    /// Directory is blank or relative.
    InvalidDir(String),
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    /// Logging already runs with other settings.
    AlreadyActive(LogSettings),
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLevel(level) => write!(
                f,
                "unknown log level `{level}`; expected off|error|warn|info|debug|trace"
            ),
            Self::InvalidDir(dir) => write!(f, "log dir must be an absolute path, got `{dir}`"),
            Self::CreateDir { dir, source } => {
                write!(f, "cannot create log dir `{}`: {source}", dir.display())
            }
            Self::Backend(err) => write!(f, "logger failed to start: {err}"),
            Self::AlreadyActive(active) => write!(
                f,
                "logging already active at level {} in `{}`",
                active.level,
                active.dir.display()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FlexiLoggerError> for LoggingError {
    fn from(value: FlexiLoggerError) -> Self {
        Self::Backend(value)
    }
}

/// Starts rolling file logs, or confirms they already run with `settings`.
pub fn init_logging(settings: &LogSettings) -> Result<(), LoggingError> {
    let active = ACTIVE.get_or_try_init(|| start(settings))?;
    if active.settings != *settings {
        return Err(LoggingError::AlreadyActive(active.settings.clone()));
    }
    Ok(())
}

/// Settings logging runs with, or `None` before it started.
pub fn logging_status() -> Option<LogSettings> {
    ACTIVE.get().map(|active| active.settings.clone())
}

/// `debug` in debug builds, `info` in release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start(settings: &LogSettings) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&settings.dir).map_err(|source| LoggingError::CreateDir {
        dir: settings.dir.clone(),
        source,
    })?;

    let handle = Logger::try_with_str(settings.level.as_str().to_ascii_lowercase())?
        .log_to_file(
            FileSpec::default()
                .directory(settings.dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()?;

    // Runs once: `ACTIVE` only initializes on success.
    install_panic_hook();

    info!(
        "event=logging_init module=core status=ok level={} build={} version={}",
        settings.level,
        if cfg!(debug_assertions) { "debug" } else { "release" },
        env!("CARGO_PKG_VERSION")
    );
    Ok(ActiveLogger {
        settings: settings.clone(),
        _handle: handle,
    })
}

fn parse_level(level: &str) -> Result<LevelFilter, LoggingError> {
    let trimmed = level.trim();
    if trimmed.eq_ignore_ascii_case("warning") {
        return Ok(LevelFilter::Warn);
    }
    trimmed
        .parse()
        .map_err(|_| LoggingError::UnknownLevel(trimmed.to_string()))
}

fn parse_dir(dir: &str) -> Result<PathBuf, LoggingError> {
    let trimmed = dir.trim();
    let path = Path::new(trimmed);
    if trimmed.is_empty() || !path.is_absolute() {
        return Err(LoggingError::InvalidDir(trimmed.to_string()));
    }
    Ok(path.to_path_buf())
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic_info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        error!(
            "event=panic_captured module=core status=error location={location} payload={}",
            redact(payload, MAX_PANIC_PAYLOAD_CHARS)
        );
        previous(panic_info);
    }));
}

/// Single-line, length-capped copy of `value` with email addresses and
/// quoted text (how titles show up in `Debug` output) masked.
fn redact(value: &str, max_chars: usize) -> String {
    let flattened = value.replace(['\n', '\r'], " ");
    let masked = QUOTED_TEXT_RE.replace_all(&flattened, "\"<text>\"");
    let masked = EMAIL_TOKEN_RE.replace_all(&masked, "<email>");
    let mut capped: String = masked.chars().take(max_chars).collect();
    if masked.chars().count() > max_chars {
        capped.push_str("...");
    }
    capped
}
