/*
 * Record-to-text rendering
 *
 * This module defines:
 * - LogWriter: the sink-side trait that turns one record into output
 * - LineBuffer: a growable byte buffer holding one rendered record
 * - StreamWriter: the standard renderer over any io::Write sink
 *
 * The rendered shape is one line per record,
 *
 *     HH:MM:SS:nnnnnnnnn LEVEL: message\n
 *
 * where the time of day is measured from the most recent local midnight.
 * Records carrying an error continue past the message with the error
 * headline and a FINE-tagged trace block, still flushed as one write.
 */

use std::io::{self, Write};

use crate::clock::{DayWindow, NANOS_PER_SEC};
use crate::error::Result;
use crate::record::{Arg, Level, Thrown};
use crate::template;

/// Formats and outputs one log record.
///
/// Implementations are driven from a single thread at a time; the callers
/// in this crate guarantee that with a lock or an ownership guard.
pub trait LogWriter {
    fn write(
        &mut self,
        time_nanos: i64,
        level: Level,
        msg: &str,
        args: Option<&[Arg]>,
        thrown: Option<&Thrown>,
    ) -> Result<()>;
}

impl LogWriter for Box<dyn LogWriter + Send> {
    fn write(
        &mut self,
        time_nanos: i64,
        level: Level,
        msg: &str,
        args: Option<&[Arg]>,
        thrown: Option<&Thrown>,
    ) -> Result<()> {
        (**self).write(time_nanos, level, msg, args, thrown)
    }
}

/// Accumulates one rendered record, then hands it to the sink as a single
/// write so concurrent records never interleave byte-wise.
///
/// Storage doubles when it fills, or jumps straight to the required size
/// for an oversized append.
pub(crate) struct LineBuffer {
    buf: Vec<u8>,
    pos: usize,
}

const INITIAL_CAPACITY: usize = 128;

impl LineBuffer {
    pub(crate) fn new() -> Self {
        LineBuffer {
            buf: vec![0; INITIAL_CAPACITY],
            pos: 0,
        }
    }

    fn ensure(&mut self, more: usize) {
        let needed = self.pos + more;
        if needed > self.buf.len() {
            let grown = (self.buf.len() * 2).max(needed);
            self.buf.resize(grown, 0);
        }
    }

    pub(crate) fn push(&mut self, byte: u8) {
        self.ensure(1);
        self.buf[self.pos] = byte;
        self.pos += 1;
    }

    pub(crate) fn extend(&mut self, bytes: &[u8]) {
        self.ensure(bytes.len());
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.extend(text.as_bytes());
    }

    pub(crate) fn push_repeat(&mut self, byte: u8, count: usize) {
        self.ensure(count);
        self.buf[self.pos..self.pos + count].fill(byte);
        self.pos += count;
    }

    /// Append `value` as exactly `digits` decimal digits, zero filled.
    /// Excess high digits are dropped.
    pub(crate) fn push_padded(&mut self, mut value: u64, digits: usize) {
        self.ensure(digits);
        for slot in (0..digits).rev() {
            self.buf[self.pos + slot] = b'0' + (value % 10) as u8;
            value /= 10;
        }
        self.pos += digits;
    }

    /// Drop one trailing newline if present.
    pub(crate) fn trim_trailing_newline(&mut self) {
        if self.pos > 0 && self.buf[self.pos - 1] == b'\n' {
            self.pos -= 1;
        }
    }

    pub(crate) fn clear(&mut self) {
        self.pos = 0;
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    /// Write the buffered record to `out` in one call, then flush the sink.
    /// The buffer is emptied even on failure; a torn record is never
    /// replayed.
    pub(crate) fn flush_into<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let written = if self.pos > 0 {
            out.write_all(&self.buf[..self.pos])
        } else {
            Ok(())
        };
        self.pos = 0;
        written?;
        out.flush()
    }
}

/// Renderer over any byte sink: timestamps records against the local day,
/// expands templates, and emits each record as one flushed write.
pub struct StreamWriter<W: io::Write> {
    out: W,
    buf: LineBuffer,
    window: DayWindow,
}

impl<W: io::Write> StreamWriter<W> {
    pub fn new(out: W) -> Self {
        StreamWriter {
            out,
            buf: LineBuffer::new(),
            window: DayWindow::unset(),
        }
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// `HH:MM:SS:nnnnnnnnn` measured from the most recent local midnight.
    /// The window is recomputed only when the timestamp falls outside it.
    fn timestamp(&mut self, time_nanos: i64) {
        if !self.window.contains(time_nanos) {
            self.window.reset_to(time_nanos);
        }
        let mut rest = time_nanos - self.window.start;
        let subsec = (rest % NANOS_PER_SEC) as u64;
        rest /= NANOS_PER_SEC;
        let secs = (rest % 60) as u64;
        rest /= 60;
        let mins = (rest % 60) as u64;
        let hours = (rest / 60) as u64;

        self.buf.push_padded(hours, 2);
        self.buf.push(b':');
        self.buf.push_padded(mins, 2);
        self.buf.push(b':');
        self.buf.push_padded(secs, 2);
        self.buf.push(b':');
        self.buf.push_padded(subsec, 9);
    }

    fn header(&mut self, time_nanos: i64, level: Level) {
        self.timestamp(time_nanos);
        self.buf.extend(level.tag());
    }

    fn render(
        &mut self,
        time_nanos: i64,
        level: Level,
        msg: &str,
        args: Option<&[Arg]>,
        thrown: Option<&Thrown>,
    ) -> Result<()> {
        self.header(time_nanos, level);
        match args {
            Some(args) => template::expand_into(&mut self.buf, msg, args)?,
            None => self.buf.push_str(msg),
        }
        if let Some(thrown) = thrown {
            self.buf.push(b'\n');
            self.buf.push_str(thrown.kind());
            self.buf.extend(b": ");
            self.buf.push_str(thrown.message());
            self.buf.push(b'\n');
            self.header(time_nanos, Level::Fine);
            self.buf.push_str(thrown.trace());
            self.buf.trim_trailing_newline();
        }
        self.buf.push(b'\n');
        Ok(())
    }
}

impl<W: io::Write> LogWriter for StreamWriter<W> {
    fn write(
        &mut self,
        time_nanos: i64,
        level: Level,
        msg: &str,
        args: Option<&[Arg]>,
        thrown: Option<&Thrown>,
    ) -> Result<()> {
        if let Err(e) = self.render(time_nanos, level, msg, args, thrown) {
            // drop the half-rendered record, keep the sink clean
            self.buf.clear();
            return Err(e);
        }
        self.buf.flush_into(&mut self.out)?;
        Ok(())
    }
}
