/*
 * Core value model for log events
 *
 * This module defines:
 * - Level: ordered severities and their rendered header tags
 * - Arg: owned printf-style argument values
 * - Thrown: a captured error (type name, message, renderable trace)
 * - Record: one log event as captured, queued and rendered
 */

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;

/// Log severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Fine,
    Info,
    Warn,
    Err,
}

/// Header tags indexed by level ordinal. Keep in step with `Level`.
const LEVEL_TAGS: [&[u8]; 4] = [b" FINE: ", b" INFO: ", b" WARN: ", b" ERR: "];

impl Level {
    /// The tag rendered between the timestamp and the message, padding
    /// included on both sides.
    pub(crate) fn tag(self) -> &'static [u8] {
        LEVEL_TAGS[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Fine => "FINE",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Err => "ERR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message argument, owned so that captured records can cross threads.
///
/// Values are kept opaque at capture time; the template directive decides
/// how they are spelled during rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Char(char),
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Str(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Str(v)
    }
}

impl From<&String> for Arg {
    fn from(v: &String) -> Self {
        Arg::Str(v.clone())
    }
}

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Arg::Bool(v)
    }
}

impl From<char> for Arg {
    fn from(v: char) -> Self {
        Arg::Char(v)
    }
}

impl From<f32> for Arg {
    fn from(v: f32) -> Self {
        Arg::Float(v as f64)
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::Float(v)
    }
}

macro_rules! arg_from_int {
    ($variant:ident, $($ty:ty),+) => {
        $(impl From<$ty> for Arg {
            fn from(v: $ty) -> Self {
                Arg::$variant(v as _)
            }
        })+
    };
}

arg_from_int!(Int, i8, i16, i32, i64, isize);
arg_from_int!(UInt, u8, u16, u32, u64, usize);

/// A captured error: its type name, message, and a renderable trace block.
///
/// The trace should be newline-terminated lines; the renderer trims one
/// trailing newline before appending its own record terminator.
#[derive(Debug, Clone)]
pub struct Thrown {
    kind: String,
    message: String,
    trace: String,
}

impl Thrown {
    pub fn new(
        kind: impl Into<String>,
        message: impl Into<String>,
        trace: impl Into<String>,
    ) -> Self {
        Thrown {
            kind: kind.into(),
            message: message.into(),
            trace: trace.into(),
        }
    }

    /// Capture a live error: its type name, display message, the `source()`
    /// chain, and the current backtrace when one is being collected
    /// (`RUST_BACKTRACE=1`).
    pub fn from_error<E: StdError + ?Sized>(err: &E) -> Self {
        let kind = std::any::type_name::<E>();
        let message = err.to_string();

        let mut trace = format!("{}: {}\n", kind, message);
        let mut source = err.source();
        while let Some(cause) = source {
            trace.push_str(&format!("caused by: {}\n", cause));
            source = cause.source();
        }
        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            let text = backtrace.to_string();
            trace.push_str(&text);
            if !text.ends_with('\n') {
                trace.push('\n');
            }
        }

        Thrown {
            kind: kind.to_string(),
            message,
            trace,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trace(&self) -> &str {
        &self.trace
    }
}

/// One captured log event. Immutable once built; everything needed to render
/// it later, on another thread, is owned by the record itself.
#[derive(Debug)]
pub struct Record {
    /// Capture time in nanoseconds since the Unix epoch.
    pub time_nanos: i64,
    pub level: Level,
    /// Verbatim text, or a template when `args` is present.
    pub msg: String,
    pub args: Option<Vec<Arg>>,
    pub thrown: Option<Thrown>,
}
