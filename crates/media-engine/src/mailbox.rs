//! Hand-off of callbacks fired on other threads
//!
//! Platform timers and audio observers usually fire on a background thread.
//! They push the callback into a [`CallbackSender`]; the engine's thread
//! drains the matching [`CallbackReceiver`] and dispatches in arrival order.

use crate::callback::EngineCallback;
use crate::engine::SegmentEngine;
use crate::timer::Scheduler;
use crate::transport::Transport;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Creates a connected sender/receiver pair
pub fn callback_channel() -> (CallbackSender, CallbackReceiver) {
    let (tx, rx) = unbounded();
    (CallbackSender { tx }, CallbackReceiver { rx })
}

#[derive(Debug, Clone)]
pub struct CallbackSender {
    tx: Sender<EngineCallback>,
}

impl CallbackSender {
    /// Returns false once the receiving side is gone
    pub fn send(&self, callback: EngineCallback) -> bool {
        self.tx.send(callback).is_ok()
    }
}

#[derive(Debug)]
pub struct CallbackReceiver {
    rx: Receiver<EngineCallback>,
}

impl CallbackReceiver {
    pub fn try_recv(&self) -> Option<EngineCallback> {
        self.rx.try_recv().ok()
    }

    /// Waits up to `timeout` for the next callback
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineCallback> {
        match self.rx.recv_timeout(timeout) {
            Ok(callback) => Some(callback),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl<T: Transport, S: Scheduler> SegmentEngine<T, S> {
    /// Dispatches every callback already waiting in `mailbox`
    pub fn drain(&mut self, mailbox: &CallbackReceiver) -> usize {
        let mut dispatched = 0;
        while let Some(callback) = mailbox.try_recv() {
            self.handle_callback(callback);
            dispatched += 1;
        }
        dispatched
    }
}
