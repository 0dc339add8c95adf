//! Shared cancellation scope for every pipeline participant.
//!
//! The scope keeps the first real error of the run and, once any error is
//! recorded, disconnects its "done" channel. Every send and receive made
//! through the scope selects against that channel, so blocked participants
//! wake up with [`ExtractError::Cancelled`] instead of waiting forever.

use crossbeam_channel::{bounded, select, Receiver, Sender};
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};

use crate::common::ExtractError;

pub struct CancelScope {
    cancelled: AtomicBool,
    first_error: OnceLock<ExtractError>,
    // Never sent on; dropping it disconnects `done_rx` and wakes all selects
    done_tx: Mutex<Option<Sender<()>>>,
    done_rx: Receiver<()>,
}

impl CancelScope {
    pub fn new() -> Self {
        let (done_tx, done_rx) = bounded(0);
        Self {
            cancelled: AtomicBool::new(false),
            first_error: OnceLock::new(),
            done_tx: Mutex::new(Some(done_tx)),
            done_rx,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Cancel the scope without recording a cause
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        let sender = match self.done_tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(sender);
    }

    /// Record `err` as the run's cause if it is the first real error, then cancel
    pub fn fail(&self, err: ExtractError) {
        if err.is_cancelled() {
            debug!("Participant stopped after cancellation");
        } else if let Err(later) = self.first_error.set(err) {
            debug!("Ignoring error after first failure: {}", later);
        }
        self.cancel();
    }

    /// Hand `value` to `tx`, giving up if the scope is cancelled first
    pub fn send<T>(&self, tx: &Sender<T>, value: T) -> Result<(), ExtractError> {
        if self.is_cancelled() {
            return Err(ExtractError::Cancelled);
        }
        select! {
            send(tx, value) -> res => res.map_err(|_| ExtractError::Cancelled),
            recv(self.done_rx) -> _ => Err(ExtractError::Cancelled),
        }
    }

    /// Next value from `rx`; `None` once the channel is closed or the scope cancelled
    pub fn recv<T>(&self, rx: &Receiver<T>) -> Option<T> {
        if self.is_cancelled() {
            return None;
        }
        select! {
            recv(rx) -> msg => msg.ok(),
            recv(self.done_rx) -> _ => None,
        }
    }

    /// Terminal outcome of the scope: the first recorded error, if any
    pub fn into_result(self) -> Result<(), ExtractError> {
        match self.first_error.into_inner() {
            Some(err) => Err(err),
            None if self.cancelled.load(Ordering::Acquire) => Err(ExtractError::Cancelled),
            None => Ok(()),
        }
    }
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_untouched_scope_is_ok() {
        let scope = CancelScope::new();
        assert!(!scope.is_cancelled());
        assert!(scope.into_result().is_ok());
    }

    #[test]
    fn test_first_error_wins() {
        let scope = CancelScope::new();
        scope.fail(ExtractError::Config("first".into()));
        scope.fail(ExtractError::Config("second".into()));

        match scope.into_result() {
            Err(ExtractError::Config(msg)) => assert_eq!(msg, "first"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_cancellation_never_masks_the_cause() {
        let scope = CancelScope::new();
        scope.fail(ExtractError::Cancelled);
        scope.fail(ExtractError::NoImages("in".into()));

        assert!(scope.is_cancelled());
        assert!(matches!(scope.into_result(), Err(ExtractError::NoImages(_))));
    }

    #[test]
    fn test_bare_cancel_reports_cancelled() {
        let scope = CancelScope::new();
        scope.cancel();
        assert!(matches!(scope.into_result(), Err(ExtractError::Cancelled)));
    }

    #[test]
    fn test_cancel_unblocks_pending_send() {
        let scope = CancelScope::new();
        let (tx, _rx) = bounded::<u32>(0);

        thread::scope(|s| {
            let blocked = s.spawn(|| scope.send(&tx, 1));
            thread::sleep(Duration::from_millis(50));
            scope.fail(ExtractError::Config("stop".into()));
            assert!(matches!(blocked.join().unwrap(), Err(ExtractError::Cancelled)));
        });
    }

    #[test]
    fn test_cancel_unblocks_pending_recv() {
        let scope = CancelScope::new();
        let (_tx, rx) = bounded::<u32>(0);

        thread::scope(|s| {
            let blocked = s.spawn(|| scope.recv(&rx));
            thread::sleep(Duration::from_millis(50));
            scope.cancel();
            assert_eq!(blocked.join().unwrap(), None);
        });
    }

    #[test]
    fn test_handoff_through_scope() {
        let scope = CancelScope::new();
        let (tx, rx) = bounded::<u32>(0);

        thread::scope(|s| {
            s.spawn(|| {
                for i in 0..3 {
                    scope.send(&tx, i).unwrap();
                }
                drop(tx);
            });
            let mut got = Vec::new();
            while let Some(v) = scope.recv(&rx) {
                got.push(v);
            }
            assert_eq!(got, vec![0, 1, 2]);
        });
    }
}
