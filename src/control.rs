//! Shared execution control state.
//!
//! The run loop executes on one thread; control sources (the stdin listener,
//! Ctrl+C handling, embedding code) flip the mode from others. A single
//! atomic holds the mode, read freshly at every checkpoint, so there is no
//! callback registration and no lock to contend on.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

const RUNNING: u8 = 0;
const PAUSED: u8 = 1;
const STOPPED: u8 = 2;

/// Execution mode as seen by the run loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    Running,
    Paused,
    Stopped,
}

/// Cloneable handle on the shared execution mode.
///
/// `Stopped` is terminal: once set, neither pause nor resume can leave it
/// within the same run.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    mode: Arc<AtomicU8>,
}

impl ControlHandle {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: Arc::new(AtomicU8::new(RUNNING)),
        }
    }

    /// Current mode; never stale relative to preceding writes.
    pub fn mode(&self) -> Mode {
        decode(self.mode.load(Ordering::SeqCst))
    }

    pub fn is_stopped(&self) -> bool {
        self.mode() == Mode::Stopped
    }

    /// Request an immediate stop. Any remaining actions are dropped.
    pub fn stop(&self) {
        self.mode.store(STOPPED, Ordering::SeqCst);
    }

    /// Flip Running <-> Paused, returning the mode now in effect.
    /// Does nothing once stopped.
    pub fn toggle_pause(&self) -> Mode {
        loop {
            match self.mode.load(Ordering::SeqCst) {
                RUNNING => {
                    if self
                        .mode
                        .compare_exchange(RUNNING, PAUSED, Ordering::SeqCst, Ordering::SeqCst)
                        .is_ok()
                    {
                        return Mode::Paused;
                    }
                }
                PAUSED => {
                    if self
                        .mode
                        .compare_exchange(PAUSED, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
                        .is_ok()
                    {
                        return Mode::Running;
                    }
                }
                _ => return Mode::Stopped,
            }
        }
    }

    /// Block while paused, polling at `poll`. Returns the first non-paused
    /// mode observed (`Running` or `Stopped`).
    pub fn wait_while_paused(&self, poll: Duration) -> Mode {
        loop {
            match self.mode() {
                Mode::Paused => std::thread::sleep(poll),
                other => return other,
            }
        }
    }
}

impl Default for ControlHandle {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(raw: u8) -> Mode {
    match raw {
        PAUSED => Mode::Paused,
        STOPPED => Mode::Stopped,
        _ => Mode::Running,
    }
}
