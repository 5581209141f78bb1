/*
 * Day-rotated file sink
 *
 * Renders through the standard stream renderer into one or two append-mode
 * files whose names derive from the current local day. When a record's
 * timestamp falls outside the cached day window the open handles are
 * closed and the day's files are opened fresh; nothing rotates between
 * records of the same day.
 *
 * Split mode writes every record to a ".all" variant of the configured
 * name and only records above FINE to the plain name, so the plain file
 * stays readable while the ".all" file keeps the detail.
 */

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::clock::{DayWindow, NANOS_PER_MILLI};
use crate::error::{Error, Result};
use crate::record::{Arg, Level, Thrown};
use crate::template;
use crate::writer::{LogWriter, StreamWriter};

/// Append-mode file sink that rolls at local midnight.
pub struct RollingFileWriter {
    name_template: String,
    split: bool,
    window: DayWindow,
    writer: Option<StreamWriter<FileTarget>>,
}

impl RollingFileWriter {
    /// `name_template` is expanded with one argument, the day's local
    /// midnight in epoch milliseconds: `%F` names files by ISO date, `%d`
    /// by the raw number. With `split`, the ".all" variant of the name
    /// receives every record and the plain name only those above FINE.
    pub fn new(name_template: impl Into<String>, split: bool) -> Self {
        RollingFileWriter {
            name_template: name_template.into(),
            split,
            window: DayWindow::unset(),
            writer: None,
        }
    }

    /// The filename for `day_millis`, as rotation would derive it.
    pub fn file_name(&self, day_millis: i64) -> Result<String> {
        template::render(&self.name_template, &[Arg::Int(day_millis)])
    }

    fn open_for_day(&self) -> Result<StreamWriter<FileTarget>> {
        let day_millis = self.window.start / NANOS_PER_MILLI;
        let plain = self.file_name(day_millis)?;
        let target = if self.split {
            let all_name = template::render(
                &all_template(&self.name_template),
                &[Arg::Int(day_millis)],
            )?;
            FileTarget::Dual {
                all: open_append(&all_name)?,
                plain: open_append(&plain)?,
                pass: true,
            }
        } else {
            FileTarget::Single(open_append(&plain)?)
        };
        Ok(StreamWriter::new(target))
    }
}

impl LogWriter for RollingFileWriter {
    fn write(
        &mut self,
        time_nanos: i64,
        level: Level,
        msg: &str,
        args: Option<&[Arg]>,
        thrown: Option<&Thrown>,
    ) -> Result<()> {
        if self.writer.is_none() || !self.window.contains(time_nanos) {
            // close yesterday's handles before touching today's files
            self.writer = None;
            self.window.reset_to(time_nanos);
            self.writer = Some(self.open_for_day()?);
        }
        if let Some(writer) = self.writer.as_mut() {
            writer.get_mut().set_pass(level > Level::Fine);
            writer.write(time_nanos, level, msg, args, thrown)?;
        }
        Ok(())
    }
}

/// One or both of the day's files, behind a single `io::Write`.
enum FileTarget {
    Single(File),
    Dual {
        all: File,
        plain: File,
        /// Whether the current record also goes to the plain file.
        pass: bool,
    },
}

impl FileTarget {
    fn set_pass(&mut self, pass: bool) {
        if let FileTarget::Dual { pass: p, .. } = self {
            *p = pass;
        }
    }
}

impl io::Write for FileTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileTarget::Single(file) => file.write(buf),
            FileTarget::Dual { all, plain, pass } => {
                all.write_all(buf)?;
                if *pass {
                    plain.write_all(buf)?;
                }
                Ok(buf.len())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileTarget::Single(file) => file.flush(),
            FileTarget::Dual { all, plain, .. } => {
                all.flush()?;
                plain.flush()
            }
        }
    }
}

/// Insert ".all" ahead of the template's last extension separator, or
/// append it when the template has none.
fn all_template(template: &str) -> String {
    match template.rfind('.') {
        Some(idx) => format!("{}.all{}", &template[..idx], &template[idx..]),
        None => format!("{}.all", template),
    }
}

fn open_append(path: &str) -> Result<File> {
    if let Some(dir) = Path::new(path).parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| Error::OpenFile {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::OpenFile {
            path: PathBuf::from(path),
            source: e,
        })
}
