/*
 * Single-thread ownership guard
 *
 * Serializes an operation onto one thread without making its hot path pay
 * for a lock. The first thread to claim the guard (implicitly through
 * check, or explicitly through bind) becomes the owner for the guard's
 * lifetime; every later check compares one atomic against a thread-local
 * token and stays wait-free.
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread::{self, Thread};

use crate::error::{Error, Result};

/// Process-unique tokens, handed out once per thread. Zero is reserved for
/// "no owner yet".
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_TOKEN: u64 = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
}

fn current_token() -> u64 {
    THREAD_TOKEN.with(|t| *t)
}

/// Records the first thread to claim an operation and answers whether the
/// calling thread is that owner.
#[derive(Debug)]
pub struct ThreadOwner {
    /// Owner's token, or zero while unclaimed. Published last, under the
    /// lock, so a fast-path hit is always consistent.
    token: AtomicU64,
    /// Owner's handle, kept for diagnostics.
    owner: Mutex<Option<Thread>>,
}

impl ThreadOwner {
    pub fn new() -> Self {
        ThreadOwner {
            token: AtomicU64::new(0),
            owner: Mutex::new(None),
        }
    }

    /// True when the calling thread owns this guard, claiming it first if
    /// nobody has. Wait-free once ownership is settled.
    pub fn check(&self) -> bool {
        let me = current_token();
        if self.token.load(Ordering::Acquire) == me {
            return true;
        }
        let mut owner = self.owner.lock().unwrap_or_else(|e| e.into_inner());
        match self.token.load(Ordering::Acquire) {
            0 => {
                *owner = Some(thread::current());
                self.token.store(me, Ordering::Release);
                true
            }
            t => t == me,
        }
    }

    /// Claim the guard for the calling thread without performing the guarded
    /// operation. Single-shot: fails once any owner exists, even when that
    /// owner is the caller.
    pub fn bind(&self) -> Result<()> {
        let mut owner = self.owner.lock().unwrap_or_else(|e| e.into_inner());
        if self.token.load(Ordering::Acquire) != 0 {
            return Err(Error::AlreadyBound {
                owner: owner_name(&owner),
            });
        }
        *owner = Some(thread::current());
        self.token.store(current_token(), Ordering::Release);
        Ok(())
    }

    /// Handle of the owning thread, if ownership is settled.
    pub fn owner(&self) -> Option<Thread> {
        self.owner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for ThreadOwner {
    fn default() -> Self {
        ThreadOwner::new()
    }
}

fn owner_name(owner: &Option<Thread>) -> String {
    owner
        .as_ref()
        .and_then(|t| t.name())
        .unwrap_or("unnamed thread")
        .to_string()
}
