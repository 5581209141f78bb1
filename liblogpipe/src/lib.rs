/*
 * Main library entry point that exposes the public API
 *
 * This file defines the public interface for the logging pipeline, including:
 * - Re-exporting the Logger trait and both dispatch strategies
 * - Re-exporting the record model (Level, Arg, Thrown) and the writers
 * - Re-exporting LogConfig for TOML-driven assembly
 * - Defining logging macros (log_fine, log_info, log_warn, log_err)
 *
 * The macros take the logger instance as their first argument; there is no
 * process-wide logger. Extra arguments are converted to template arguments
 * with Arg::from, so plain strings, numbers, bools and chars all work.
 */

mod clock;
mod config;
mod error;
mod file;
mod logger;
mod owner;
mod record;
mod template;
mod writer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AnyLogger, BoxedWriter, DispatchMode, LogConfig, SinkTarget};
pub use error::{Error, Result};
pub use file::RollingFileWriter;
pub use logger::{AsyncLogger, Logger, SyncLogger};
pub use owner::ThreadOwner;
pub use record::{Arg, Level, Record, Thrown};
pub use writer::{LogWriter, StreamWriter};

// Add the macros to be publicly accessible
#[macro_export]
macro_rules! log_fine {
    ($logger:expr, $msg:expr $(,)?) => {
        $crate::Logger::fine(&$logger, $msg)
    };
    ($logger:expr, $msg:expr, $($arg:expr),+ $(,)?) => {
        $crate::Logger::fine_args(&$logger, $msg, &[$($crate::Arg::from($arg)),+])
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $msg:expr $(,)?) => {
        $crate::Logger::info(&$logger, $msg)
    };
    ($logger:expr, $msg:expr, $($arg:expr),+ $(,)?) => {
        $crate::Logger::info_args(&$logger, $msg, &[$($crate::Arg::from($arg)),+])
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $msg:expr $(,)?) => {
        $crate::Logger::warn(&$logger, $msg)
    };
    ($logger:expr, $msg:expr, $($arg:expr),+ $(,)?) => {
        $crate::Logger::warn_args(&$logger, $msg, &[$($crate::Arg::from($arg)),+])
    };
}

#[macro_export]
macro_rules! log_err {
    ($logger:expr, $msg:expr $(,)?) => {
        $crate::Logger::err(&$logger, $msg)
    };
    ($logger:expr, $msg:expr, $($arg:expr),+ $(,)?) => {
        $crate::Logger::err_args(&$logger, $msg, &[$($crate::Arg::from($arg)),+])
    };
}

#[macro_export]
macro_rules! log_err_caused {
    ($logger:expr, $err:expr, $msg:expr $(,)?) => {
        $crate::Logger::err_caused(&$logger, $crate::Thrown::from_error(&$err), $msg)
    };
    ($logger:expr, $err:expr, $msg:expr, $($arg:expr),+ $(,)?) => {
        $crate::Logger::err_caused_args(
            &$logger,
            $crate::Thrown::from_error(&$err),
            $msg,
            &[$($crate::Arg::from($arg)),+],
        )
    };
}
