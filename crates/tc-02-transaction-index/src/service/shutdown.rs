//! Cooperative shutdown of the index.

use parking_lot::{Condvar, Mutex};

use crate::domain::IndexError;

#[derive(Default)]
struct GateState {
    closed: bool,
    active: usize,
}

/// Tracks in-flight work. Once closed, no new work is admitted and
/// [`ShutdownGate::close`] returns only after running work has finished.
#[derive(Default)]
pub(crate) struct ShutdownGate {
    state: Mutex<GateState>,
    idle: Condvar,
}

/// Held for the duration of one unit of work.
pub(crate) struct GateGuard<'a> {
    gate: &'a ShutdownGate,
}

impl ShutdownGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> Result<GateGuard<'_>, IndexError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(IndexError::Stopped);
        }
        state.active += 1;
        Ok(GateGuard { gate: self })
    }

    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        while state.active > 0 {
            self.idle.wait(&mut state);
        }
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.gate.state.lock();
        state.active -= 1;
        if state.active == 0 {
            self.gate.idle.notify_all();
        }
    }
}
