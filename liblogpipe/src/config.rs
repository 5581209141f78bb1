/*
 * Configuration loading for the logging pipeline
 *
 * Settings live in a [logging] section of a TOML file:
 *
 *     [logging]
 *     mode = "deferred"            # or "sync"
 *     target = "file"              # or "stdout" / "stderr"
 *     file_template = "logs/app-%F.log"
 *     split = true
 *
 * Every key has a default, and a missing config file falls back to the
 * defaults entirely so embedders can run unconfigured.
 */

use std::fs;
use std::io;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::file::RollingFileWriter;
use crate::logger::{AsyncLogger, Logger, SyncLogger};
use crate::record::{Arg, Level, Thrown};
use crate::writer::{LogWriter, StreamWriter};

/// Writer with its concrete type erased, as the config layer produces.
pub type BoxedWriter = Box<dyn LogWriter + Send>;

/// Which dispatch strategy a built logger uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    Sync,
    Deferred,
}

impl<'de> Deserialize<'de> for DispatchMode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "sync" | "immediate" => Ok(DispatchMode::Sync),
            "deferred" | "async" => Ok(DispatchMode::Deferred),
            _ => Err(serde::de::Error::unknown_variant(&s, &["sync", "deferred"])),
        }
    }
}

/// Where rendered records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkTarget {
    Stdout,
    Stderr,
    File,
}

impl<'de> Deserialize<'de> for SinkTarget {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "stdout" => Ok(SinkTarget::Stdout),
            "stderr" => Ok(SinkTarget::Stderr),
            "file" => Ok(SinkTarget::File),
            _ => Err(serde::de::Error::unknown_variant(
                &s,
                &["stdout", "stderr", "file"],
            )),
        }
    }
}

/// Assembles loggers from declarative settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_mode")]
    pub mode: DispatchMode,
    #[serde(default = "default_target")]
    pub target: SinkTarget,
    /// Filename template for the file target, expanded with the day's
    /// local midnight in epoch milliseconds.
    #[serde(default)]
    pub file_template: Option<String>,
    /// Dual-file mode: the ".all" file gets everything, the plain file
    /// only records above FINE.
    #[serde(default)]
    pub split: bool,
}

fn default_mode() -> DispatchMode {
    DispatchMode::Sync
}

fn default_target() -> SinkTarget {
    SinkTarget::Stdout
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            mode: default_mode(),
            target: default_target(),
            file_template: None,
            split: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    logging: LogConfig,
}

impl LogConfig {
    /// Load from a TOML file. A missing file is not an error: defaults
    /// apply and a note goes to stderr. A present but invalid file is.
    pub fn from_file(path: &str) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                eprintln!("logpipe: config '{}' not found, using defaults", path);
                return Ok(LogConfig::default());
            }
            Err(e) => return Err(Error::Io(e)),
        };
        let parsed: ConfigFile =
            toml::from_str(&text).map_err(|e| Error::Config(e.to_string()))?;
        Ok(parsed.logging)
    }

    /// Parse the `[logging]` section out of already-loaded TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let parsed: ConfigFile =
            toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        Ok(parsed.logging)
    }

    fn writer(&self) -> Result<BoxedWriter> {
        Ok(match self.target {
            SinkTarget::Stdout => Box::new(StreamWriter::new(io::stdout())),
            SinkTarget::Stderr => Box::new(StreamWriter::new(io::stderr())),
            SinkTarget::File => {
                let template = self.file_template.clone().ok_or_else(|| {
                    Error::Config("target \"file\" needs a file_template".to_string())
                })?;
                Box::new(RollingFileWriter::new(template, self.split))
            }
        })
    }

    /// Build the configured logger, whichever strategy that is.
    pub fn build(&self) -> Result<AnyLogger> {
        Ok(match self.mode {
            DispatchMode::Sync => AnyLogger::Sync(SyncLogger::new(self.writer()?)),
            DispatchMode::Deferred => AnyLogger::Deferred(AsyncLogger::new(self.writer()?)),
        })
    }

    /// Build an immediate logger over the configured target, regardless of
    /// the configured mode.
    pub fn build_sync(&self) -> Result<SyncLogger<BoxedWriter>> {
        Ok(SyncLogger::new(self.writer()?))
    }

    /// Build a deferred logger over the configured target, regardless of
    /// the configured mode. The embedder owns the pump schedule.
    pub fn build_deferred(&self) -> Result<AsyncLogger<BoxedWriter>> {
        Ok(AsyncLogger::new(self.writer()?))
    }
}

/// A configured logger of either strategy.
pub enum AnyLogger {
    Sync(SyncLogger<BoxedWriter>),
    Deferred(AsyncLogger<BoxedWriter>),
}

impl AnyLogger {
    /// The deferred half, when that is what the config built. Callers use
    /// this to reach the pump.
    pub fn deferred(&self) -> Option<&AsyncLogger<BoxedWriter>> {
        match self {
            AnyLogger::Deferred(logger) => Some(logger),
            AnyLogger::Sync(_) => None,
        }
    }
}

impl Logger for AnyLogger {
    fn dispatch(
        &self,
        level: Level,
        thrown: Option<Thrown>,
        msg: &str,
        args: Option<&[Arg]>,
    ) -> Result<()> {
        match self {
            AnyLogger::Sync(logger) => logger.dispatch(level, thrown, msg, args),
            AnyLogger::Deferred(logger) => logger.dispatch(level, thrown, msg, args),
        }
    }
}
