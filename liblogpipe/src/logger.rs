/*
 * Logger facade and dispatch strategies
 *
 * Logger is the narrow trait both strategies implement: one dispatch
 * method carries the full shape of a call (level, optional error,
 * message, optional arguments), and the leveled convenience methods are
 * provided on top of it.
 *
 * SyncLogger renders and flushes inside the call, under a lock.
 * AsyncLogger captures into a lock-free queue and renders later, when the
 * single pump-owning thread asks for it.
 */

use std::io;
use std::sync::{Arc, Mutex};

use crossbeam::queue::SegQueue;

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::owner::ThreadOwner;
use crate::record::{Arg, Level, Record, Thrown};
use crate::template;
use crate::writer::{LogWriter, StreamWriter};

/// The logging facade. Every convenience method funnels into
/// [`Logger::dispatch`]; capture timestamps are taken inside the dispatch
/// implementations, at call time.
pub trait Logger: Send + Sync {
    /// Route one fully described log call.
    fn dispatch(
        &self,
        level: Level,
        thrown: Option<Thrown>,
        msg: &str,
        args: Option<&[Arg]>,
    ) -> Result<()>;

    fn fine(&self, msg: &str) -> Result<()> {
        self.dispatch(Level::Fine, None, msg, None)
    }

    fn fine_args(&self, msg: &str, args: &[Arg]) -> Result<()> {
        check_template(msg, args)?;
        self.dispatch(Level::Fine, None, msg, Some(args))
    }

    fn info(&self, msg: &str) -> Result<()> {
        self.dispatch(Level::Info, None, msg, None)
    }

    fn info_args(&self, msg: &str, args: &[Arg]) -> Result<()> {
        check_template(msg, args)?;
        self.dispatch(Level::Info, None, msg, Some(args))
    }

    fn warn(&self, msg: &str) -> Result<()> {
        self.dispatch(Level::Warn, None, msg, None)
    }

    fn warn_args(&self, msg: &str, args: &[Arg]) -> Result<()> {
        check_template(msg, args)?;
        self.dispatch(Level::Warn, None, msg, Some(args))
    }

    fn err(&self, msg: &str) -> Result<()> {
        self.dispatch(Level::Err, None, msg, None)
    }

    fn err_args(&self, msg: &str, args: &[Arg]) -> Result<()> {
        check_template(msg, args)?;
        self.dispatch(Level::Err, None, msg, Some(args))
    }

    /// Log an error-level record carrying a captured error.
    fn err_caused(&self, thrown: Thrown, msg: &str) -> Result<()> {
        self.dispatch(Level::Err, Some(thrown), msg, None)
    }

    fn err_caused_args(&self, thrown: Thrown, msg: &str, args: &[Arg]) -> Result<()> {
        check_template(msg, args)?;
        self.dispatch(Level::Err, Some(thrown), msg, Some(args))
    }

    fn log(&self, level: Level, msg: &str) -> Result<()> {
        self.dispatch(level, None, msg, None)
    }

    fn log_args(&self, level: Level, msg: &str, args: &[Arg]) -> Result<()> {
        check_template(msg, args)?;
        self.dispatch(level, None, msg, Some(args))
    }
}

impl<L: Logger + ?Sized> Logger for &L {
    fn dispatch(
        &self,
        level: Level,
        thrown: Option<Thrown>,
        msg: &str,
        args: Option<&[Arg]>,
    ) -> Result<()> {
        (**self).dispatch(level, thrown, msg, args)
    }
}

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn dispatch(
        &self,
        level: Level,
        thrown: Option<Thrown>,
        msg: &str,
        args: Option<&[Arg]>,
    ) -> Result<()> {
        (**self).dispatch(level, thrown, msg, args)
    }
}

/// Capture-time template validation. Debug builds reject a bad call at
/// the call site, before anything is queued; release builds defer the
/// same failure to render time.
fn check_template(msg: &str, args: &[Arg]) -> Result<()> {
    if cfg!(debug_assertions) {
        template::validate(msg, args)?;
    }
    Ok(())
}

/// Immediate dispatch: the record is rendered and flushed to the sink
/// before the call returns. Callers may block on sink I/O; in exchange a
/// record is on its way out the moment the call finishes, and the bytes
/// of concurrent records never interleave.
///
/// Output order follows lock acquisition, so two records racing the lock
/// can appear with their timestamps out of order. The timestamps
/// themselves are still capture times.
pub struct SyncLogger<W: LogWriter> {
    writer: Mutex<W>,
    clock: Arc<dyn Clock>,
}

impl<W: LogWriter> SyncLogger<W> {
    pub fn new(writer: W) -> Self {
        SyncLogger {
            writer: Mutex::new(writer),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl SyncLogger<StreamWriter<io::Stdout>> {
    /// Logger writing to standard output.
    pub fn stdout() -> Self {
        SyncLogger::new(StreamWriter::new(io::stdout()))
    }
}

impl SyncLogger<StreamWriter<io::Stderr>> {
    /// Logger writing to standard error.
    pub fn stderr() -> Self {
        SyncLogger::new(StreamWriter::new(io::stderr()))
    }
}

impl SyncLogger<StreamWriter<io::Sink>> {
    /// Logger that renders every record and discards the bytes. Formatting
    /// problems still surface as errors.
    pub fn mute() -> Self {
        SyncLogger::new(StreamWriter::new(io::sink()))
    }
}

impl<W: LogWriter + Send> Logger for SyncLogger<W> {
    fn dispatch(
        &self,
        level: Level,
        thrown: Option<Thrown>,
        msg: &str,
        args: Option<&[Arg]>,
    ) -> Result<()> {
        // capture time precedes the lock wait, like any other capture
        let time_nanos = self.clock.now_nanos();
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writer.write(time_nanos, level, msg, args, thrown.as_ref())
    }
}

/// Deferred dispatch: a call captures an owned record into a lock-free
/// queue and returns without rendering or I/O. Records reach the sink in
/// capture order when the owning thread calls [`AsyncLogger::pump`].
///
/// Nothing pumps implicitly. An embedder that stops pumping, or exits
/// without a final pump, abandons whatever is still queued.
pub struct AsyncLogger<W: LogWriter> {
    queue: SegQueue<Record>,
    writer: Mutex<W>,
    owner: ThreadOwner,
    clock: Arc<dyn Clock>,
}

impl<W: LogWriter> AsyncLogger<W> {
    pub fn new(writer: W) -> Self {
        AsyncLogger {
            queue: SegQueue::new(),
            writer: Mutex::new(writer),
            owner: ThreadOwner::new(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The guard serializing pump ownership. Bind it to pick the drain
    /// thread up front; otherwise the first `pump` caller claims it.
    pub fn owner(&self) -> &ThreadOwner {
        &self.owner
    }

    /// Number of captured records not yet rendered.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Render and flush every record queued at the time of the call, in
    /// capture order. Must be called periodically, always from the same
    /// thread; the first caller becomes that thread for the lifetime of
    /// the logger.
    ///
    /// # Errors
    ///
    /// A render or sink failure stops the batch. The failing record is
    /// consumed, the records behind it stay queued for the next pump.
    ///
    /// # Panics
    ///
    /// Panics when called from any thread but the owner. That is a caller
    /// bug, not a runtime condition to recover from.
    pub fn pump(&self) -> Result<()> {
        assert!(
            self.owner.check(),
            "pump called off its owning thread (owner: {})",
            self.owner
                .owner()
                .as_ref()
                .and_then(|t| t.name())
                .unwrap_or("unnamed")
        );
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        while let Some(record) = self.queue.pop() {
            writer.write(
                record.time_nanos,
                record.level,
                &record.msg,
                record.args.as_deref(),
                record.thrown.as_ref(),
            )?;
        }
        Ok(())
    }
}

impl<W: LogWriter + Send> Logger for AsyncLogger<W> {
    fn dispatch(
        &self,
        level: Level,
        thrown: Option<Thrown>,
        msg: &str,
        args: Option<&[Arg]>,
    ) -> Result<()> {
        self.queue.push(Record {
            time_nanos: self.clock.now_nanos(),
            level,
            msg: msg.to_string(),
            args: args.map(|a| a.to_vec()),
            thrown,
        });
        Ok(())
    }
}
