//! Logging infrastructure for the h5glance library.
//!
//! Diagnostics go to stderr so they never mix with rendered trees on stdout.
//! The [`Logger`] can be used directly or installed as the `log` backend,
//! which is how the library's internal `log::debug!` calls become visible.

use std::fmt;

/// Environment variable holding the default [`LogLevel`].
pub const LOG_MODE_VAR: &str = "H5GLANCE_LOG_MODE";

/// How much diagnostic output to show.
///
/// # Examples
///
/// ```
/// use h5glance::LogLevel;
///
/// assert!(LogLevel::Quiet < LogLevel::Normal);
/// assert!(LogLevel::Normal < LogLevel::Verbose);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Nothing at all.
    Quiet,
    /// Errors and warnings.
    Normal,
    /// Everything, including walk and pager decisions.
    Verbose,
}

impl LogLevel {
    const NAMES: [(&'static str, Self); 3] = [
        ("quiet", Self::Quiet),
        ("normal", Self::Normal),
        ("verbose", Self::Verbose),
    ];

    /// Parses a level name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns a message naming the bad value if it is not one of `quiet`,
    /// `normal` or `verbose`.
    ///
    /// # Examples
    ///
    /// ```
    /// use h5glance::LogLevel;
    ///
    /// assert_eq!(LogLevel::parse("VERBOSE").unwrap(), LogLevel::Verbose);
    /// assert!(LogLevel::parse("loud").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, String> {
        Self::NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|&(_, level)| level)
            .ok_or_else(|| format!("invalid log level: {s}"))
    }

    /// The most verbose `log` filter that passes at this level.
    #[must_use]
    pub const fn level_filter(self) -> log::LevelFilter {
        match self {
            Self::Quiet => log::LevelFilter::Off,
            Self::Normal => log::LevelFilter::Warn,
            Self::Verbose => log::LevelFilter::Debug,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = Self::NAMES
            .iter()
            .find(|(_, level)| level == self)
            .map_or("unknown", |(name, _)| *name);
        f.write_str(name)
    }
}

/// Writes tagged diagnostics to stderr.
///
/// # Examples
///
/// ```
/// use h5glance::{Logger, LogLevel};
///
/// let logger = Logger::new(LogLevel::Normal);
/// logger.warn("attribute could not be read");
/// logger.debug("not printed at Normal");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    level: LogLevel,
}

impl Logger {
    /// A logger showing messages up to `level`.
    #[must_use]
    pub const fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// The level this logger was created with.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    fn emit(&self, record_level: log::Level, message: &str) {
        if record_level <= self.level.level_filter() {
            let tag = match record_level {
                log::Level::Error => "error",
                log::Level::Warn => "warning",
                log::Level::Info => "info",
                log::Level::Debug | log::Level::Trace => "debug",
            };
            eprintln!("h5glance: {tag}: {message}");
        }
    }

    /// Shown unless quiet.
    pub fn error(&self, message: &str) {
        self.emit(log::Level::Error, message);
    }

    /// Shown unless quiet.
    pub fn warn(&self, message: &str) {
        self.emit(log::Level::Warn, message);
    }

    /// Shown when verbose.
    pub fn info(&self, message: &str) {
        self.emit(log::Level::Info, message);
    }

    /// Shown when verbose.
    pub fn debug(&self, message: &str) {
        self.emit(log::Level::Debug, message);
    }

    /// Installs this logger as the global `log` backend.
    ///
    /// Returns `false` if another backend was installed first; the level
    /// filter is applied either way.
    pub fn install(self) -> bool {
        let filter = self.level.level_filter();
        let installed = log::set_boxed_logger(Box::new(self)).is_ok();
        log::set_max_level(filter);
        installed
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::Normal)
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= self.level.level_filter()
    }

    fn log(&self, record: &log::Record<'_>) {
        self.emit(record.level(), &record.args().to_string());
    }

    fn flush(&self) {}
}

/// Picks the log level for this process.
///
/// `--verbose` beats `--quiet`, either flag beats the level resolved into
/// [`Config::log_level`](crate::Config::log_level), and with neither the
/// level is [`LogLevel::Normal`].
///
/// # Examples
///
/// ```
/// use h5glance::{init_logger, LogLevel};
///
/// assert_eq!(init_logger(false, false, None).level(), LogLevel::Normal);
/// assert_eq!(init_logger(false, true, Some(LogLevel::Verbose)).level(), LogLevel::Quiet);
/// ```
#[must_use]
pub fn init_logger(verbose: bool, quiet: bool, configured: Option<LogLevel>) -> Logger {
    let level = match (verbose, quiet) {
        (true, _) => LogLevel::Verbose,
        (false, true) => LogLevel::Quiet,
        (false, false) => configured.unwrap_or(LogLevel::Normal),
    };
    Logger::new(level)
}
