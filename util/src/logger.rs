//! Logging for executables
//!
//! Records are written to stdout with coloured level tags and to the session
//! log file with plain ones. Each line is stamped with the number of seconds
//! since the session epoch, and debug or trace lines also name their target.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use fern::Dispatch;
use log::{info, Level};
use thiserror::Error;

// Internal imports
use crate::session::{self, Session, SessionError};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The minimum log level must let INFO records through, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Cannot open the session log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("Cannot install the logger: {0}")]
    FernInitError(log::SetLoggerError),

    #[error("Cannot read the session epoch: {0}")]
    SessionError(SessionError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `min_level` must be `Info` or more verbose. Only the first successful call
/// in a process installs a logger, later calls return `FernInitError`.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    check_min_level(min_level)?;

    let log_file =
        fern::log_file(&session.log_file_path).map_err(LoggerInitError::LogFileInitError)?;

    let terminal = Dispatch::new()
        .format(|out, message, record| {
            let prefix = line_prefix(
                session::get_elapsed_seconds(),
                record.level(),
                record.target(),
                true,
            );
            out.finish(format_args!("{}{}", prefix, message))
        })
        .chain(std::io::stdout());

    let file = Dispatch::new()
        .format(|out, message, record| {
            let prefix = line_prefix(
                session::get_elapsed_seconds(),
                record.level(),
                record.target(),
                false,
            );
            out.finish(format_args!("{}{}", prefix, message))
        })
        .chain(log_file);

    Dispatch::new()
        .level(min_level)
        .chain(terminal)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    let epoch = session::get_epoch().map_err(LoggerInitError::SessionError)?;
    info!("Logging at {:?} to {:?}", min_level, session.log_file_path);
    info!("Session started at {}", epoch);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Reject levels which would hide the startup records.
fn check_min_level(min_level: LevelFilter) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        Err(LoggerInitError::InvalidMinLogLevel(min_level))
    } else {
        Ok(())
    }
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info => "INF",
        Level::Warn => "WRN",
        Level::Error => "ERR",
    }
}

fn coloured_level_tag(level: Level) -> ColoredString {
    let tag = level_tag(level);
    match level {
        Level::Trace => tag.dimmed().italic(),
        Level::Debug => tag.dimmed(),
        Level::Info => tag.normal(),
        Level::Warn => tag.yellow(),
        Level::Error => tag.red().bold(),
    }
}

/// Everything written before the message of a record.
fn line_prefix(elapsed_s: f64, level: Level, target: &str, coloured: bool) -> String {
    let tag = if coloured {
        coloured_level_tag(level).to_string()
    } else {
        level_tag(level).to_string()
    };

    if level > Level::Info {
        format!("[{:10.6} {}] {}: ", elapsed_s, tag, target)
    } else {
        format!("[{:10.6} {}] ", elapsed_s, tag)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_min_level() {
        assert!(check_min_level(LevelFilter::Info).is_ok());
        assert!(check_min_level(LevelFilter::Debug).is_ok());
        assert!(check_min_level(LevelFilter::Trace).is_ok());

        assert!(matches!(
            check_min_level(LevelFilter::Warn),
            Err(LoggerInitError::InvalidMinLogLevel(LevelFilter::Warn))
        ));
        assert!(check_min_level(LevelFilter::Off).is_err());
    }

    #[test]
    fn test_line_prefix() {
        assert_eq!(
            line_prefix(1.5, Level::Info, "plan_lib", false),
            "[  1.500000 INF] "
        );
        assert_eq!(
            line_prefix(12.25, Level::Debug, "plan_lib::traj_gen", false),
            "[ 12.250000 DBG] plan_lib::traj_gen: "
        );
        assert_eq!(
            line_prefix(0.0, Level::Error, "plan_lib", false),
            "[  0.000000 ERR] "
        );

        // Colouring only wraps the tag
        let coloured = line_prefix(0.0, Level::Warn, "plan_lib", true);
        assert!(coloured.starts_with("[  0.000000 "));
        assert!(coloured.contains("WRN"));
        assert!(coloured.ends_with("] "));
    }
}
