// Wall-clock scheduler backed by a dedicated timer thread

use crate::callback::EngineCallback;
use crate::error::EngineResult;
use crate::mailbox::CallbackSender;
use crate::timer::{Scheduler, TimerHandle};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use lectern_core::AppError;
use std::thread;
use std::time::{Duration, Instant};

const MIN_REPEAT_INTERVAL: Duration = Duration::from_millis(1);

/// Commands sent to the timer thread
#[derive(Debug)]
enum TimerCommand {
    Schedule {
        handle: TimerHandle,
        due: Option<Instant>,
        every: Option<Duration>,
        callback: EngineCallback,
    },
    Cancel(TimerHandle),
    Shutdown,
}

#[derive(Debug)]
struct PendingTimer {
    handle: TimerHandle,
    /// `None` when the deadline lies beyond what `Instant` can represent
    due: Option<Instant>,
    every: Option<Duration>,
    callback: EngineCallback,
}

/// Scheduler whose timers fire on a background thread
///
/// Fired callbacks are posted to a [`CallbackSender`]; the engine's thread
/// picks them up with [`SegmentEngine::drain`](crate::SegmentEngine::drain).
/// A cancel can race with a timer that is already firing, in which case the
/// callback still arrives and the engine drops it as superseded.
pub struct ThreadScheduler {
    command_tx: Sender<TimerCommand>,
    handle: Option<thread::JoinHandle<()>>,
    last_id: u64,
}

impl ThreadScheduler {
    /// Starts the timer thread
    pub fn start(sink: CallbackSender) -> EngineResult<Self> {
        let (command_tx, command_rx) = unbounded();

        let handle = thread::Builder::new()
            .name("lectern-timers".to_string())
            .spawn(move || timer_loop(command_rx, sink))
            .map_err(AppError::from)?;

        Ok(Self {
            command_tx,
            handle: Some(handle),
            last_id: 0,
        })
    }

    fn send_command(&self, command: TimerCommand) {
        if self.command_tx.send(command).is_err() {
            log::warn!("Timer thread is gone; command dropped");
        }
    }

    fn schedule(&mut self, after: Duration, every: Option<Duration>, callback: EngineCallback) -> TimerHandle {
        self.last_id += 1;
        let handle = TimerHandle::new(self.last_id);
        let due = Instant::now().checked_add(after);
        if due.is_none() {
            log::warn!("Timer {:?} is too far in the future and will never fire", after);
        }
        self.send_command(TimerCommand::Schedule {
            handle,
            due,
            every,
            callback,
        });
        handle
    }

    /// Stops the timer thread, dropping anything still pending
    pub fn stop(&mut self) {
        let _ = self.command_tx.send(TimerCommand::Shutdown);

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Timer thread panicked");
            }
        }
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule_once(&mut self, after: Duration, callback: EngineCallback) -> TimerHandle {
        self.schedule(after, None, callback)
    }

    fn schedule_repeating(&mut self, every: Duration, callback: EngineCallback) -> TimerHandle {
        let every = every.max(MIN_REPEAT_INTERVAL);
        self.schedule(every, Some(every), callback)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.send_command(TimerCommand::Cancel(handle));
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ThreadScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadScheduler")
            .field("running", &self.handle.is_some())
            .field("last_id", &self.last_id)
            .finish()
    }
}

/// The timer thread's main loop
fn timer_loop(command_rx: Receiver<TimerCommand>, sink: CallbackSender) {
    let mut pending: Vec<PendingTimer> = Vec::new();

    loop {
        let next_due = pending.iter().filter_map(|t| t.due).min();
        let command = match next_due {
            Some(due) => match command_rx.recv_deadline(due) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => return,
            },
            None => match command_rx.recv() {
                Ok(command) => Some(command),
                Err(_) => return,
            },
        };

        match command {
            Some(TimerCommand::Schedule {
                handle,
                due,
                every,
                callback,
            }) => pending.push(PendingTimer {
                handle,
                due,
                every,
                callback,
            }),
            Some(TimerCommand::Cancel(handle)) => pending.retain(|t| t.handle != handle),
            Some(TimerCommand::Shutdown) => return,
            None => {
                let now = Instant::now();
                let mut fired = Vec::new();
                for timer in pending.iter_mut() {
                    let Some(due) = timer.due.filter(|due| *due <= now) else {
                        continue;
                    };
                    if !sink.send(timer.callback) {
                        log::debug!("Callback mailbox closed; stopping timer thread");
                        return;
                    }
                    match timer.every {
                        Some(every) => timer.due = due.checked_add(every).map(|next| next.max(now)),
                        None => fired.push(timer.handle),
                    }
                }
                pending.retain(|t| !fired.contains(&t.handle));
            }
        }
    }
}
