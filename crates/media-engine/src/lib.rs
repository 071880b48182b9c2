//! Media Engine - segment-aware audiobook playback for Lectern
//!
//! [`SegmentEngine`] drives any [`Transport`] with any [`Scheduler`]. The
//! [`sim`] module provides a deterministic host on a virtual clock; real
//! hosts with background-thread timers use [`ThreadScheduler`] and a
//! [`callback_channel`].

mod callback;
mod engine;
mod error;
mod events;
mod mailbox;
pub mod sim;
mod speed;
mod state;
mod timer;
mod timer_thread;
mod transport;
mod types;

pub use callback::{CallbackKind, EngineCallback, SessionToken};
pub use engine::{EngineConfig, SegmentEngine};
pub use error::{EngineError, EngineResult};
pub use events::{EventBus, ListenerId};
pub use mailbox::{callback_channel, CallbackReceiver, CallbackSender};
pub use speed::Speed;
pub use state::{PauseDuration, PlaybackMode};
pub use timer::{Scheduler, TimerHandle};
pub use timer_thread::ThreadScheduler;
pub use transport::{ObserverHandle, Transport};
pub use types::{EngineEvent, PlaybackStatus, PlayerView};
