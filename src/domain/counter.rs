//! Monotonic identifier generation for auto-named mutables

use std::sync::atomic::{AtomicU64, Ordering};

static GLOBAL: IdGenerator = IdGenerator::new();

/// Monotonic counter handing out 1, 2, 3, ...
///
/// Atomic, so a single generator may be shared between threads without
/// losing updates or issuing duplicates.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// The process-wide generator. Starts at zero and is never reset.
    pub fn global() -> &'static IdGenerator {
        &GLOBAL
    }

    pub fn next(&self) -> u64 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Last value handed out, 0 if none yet.
    pub fn current(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }

    pub fn next_name(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.next())
    }
}

/// Next value of the process-wide generator.
pub fn global_mutable_counting() -> u64 {
    GLOBAL.next()
}
