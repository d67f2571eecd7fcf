//! Driver loops: an iterator abstraction producing one state snapshot per
//! firing, in a synchronous step-by-step mode, and an asynchronous
//! "run until quiescent or stopped" mode.

use crate::error::EngineError;
use crate::petri_net::net::{FireResult, Net};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Synchronous driver: each iteration step awaits all of that step's
/// production-task threads before yielding. Ends when no transition is
/// enabled.
pub struct SyncDriver<'net> {
    net: &'net Net,
    done: bool,
}

impl<'net> SyncDriver<'net> {
    pub fn new(net: &'net Net) -> Self {
        SyncDriver { net, done: false }
    }
}

impl<'net> Iterator for SyncDriver<'net> {
    type Item = Result<FireResult, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.net.step() {
            Ok(Some(result)) => Some(Ok(result)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Asynchronous driver: `start` runs the net's detached firing step on a
/// background thread — consuming synchronously but spawning production
/// threads it does not join — so scheduling continues while a slow task
/// (e.g. a timed sub-net's idle wait) is still running in the background.
/// No intermediate snapshots are exposed. Runs until either the net is
/// quiescent or `stop()` has been called. Unlike a bare infinite loop,
/// shutdown is explicit: an `AtomicBool` flag is checked between steps.
pub struct AsyncDriver {
    net: Arc<Net>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<Result<(), EngineError>>>,
}

impl AsyncDriver {
    pub fn new(net: Arc<Net>) -> Self {
        AsyncDriver {
            net,
            stop: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Spawns the background loop. A second call while already running is
    /// a no-op.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }
        let net = self.net.clone();
        let stop = self.stop.clone();
        self.handle = Some(std::thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                match net.step_detached() {
                    Ok(true) => continue,
                    Ok(false) => return Ok(()),
                    Err(e) => return Err(e),
                }
            }
            Ok(())
        }));
    }

    /// Signals the background loop to stop at its next `step()` boundary.
    /// Does not block; call `join` to wait for the thread to exit.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Waits for the background loop to exit, returning the first error it
    /// encountered, if any.
    pub fn join(&mut self) -> Result<(), EngineError> {
        match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            },
            None => Ok(()),
        }
    }
}

impl Drop for AsyncDriver {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
