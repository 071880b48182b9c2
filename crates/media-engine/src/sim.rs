//! Deterministic in-memory host
//!
//! [`Simulation`] owns a virtual clock shared by a [`SimTransport`] and a
//! [`SimScheduler`]. Nothing happens until [`Simulation::advance`] is called,
//! which moves the clock forward and dispatches every timer and boundary
//! crossing that falls due, in order, to the engine. The world records each
//! transport call so tests and the CLI can inspect what the engine did.

use crate::callback::{CallbackKind, EngineCallback};
use crate::engine::{EngineConfig, SegmentEngine};
use crate::error::EngineResult;
use crate::timer::{Scheduler, TimerHandle};
use crate::transport::{ObserverHandle, Transport};
use lectern_core::AppError;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Engine driven by the simulation host
pub type SimEngine = SegmentEngine<SimTransport, SimScheduler>;

const MIN_REPEAT_INTERVAL: f64 = 0.001;
const MAX_DISPATCH_PER_ADVANCE: usize = 1_000_000;

/// A call the engine made on the transport
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Load(String),
    Play,
    Pause,
    Seek(f64),
    SetRate(f32),
    AddObserver { at: f64 },
    RemoveObserver,
}

/// A timer that has not fired or been cancelled yet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingTimer {
    pub handle: TimerHandle,
    /// Seconds of virtual time until it fires
    pub due_in: f64,
    pub repeating: bool,
    pub callback: EngineCallback,
}

#[derive(Debug)]
struct SimTimer {
    handle: TimerHandle,
    due: f64,
    every: Option<f64>,
    callback: EngineCallback,
}

#[derive(Debug)]
struct SimObserver {
    handle: ObserverHandle,
    at: f64,
    callback: EngineCallback,
}

enum NextEvent {
    Timer(usize, f64),
    Crossing(usize, f64),
    EndOfMedia(f64),
}

impl NextEvent {
    fn at(&self) -> f64 {
        match self {
            Self::Timer(_, at) | Self::Crossing(_, at) | Self::EndOfMedia(at) => *at,
        }
    }
}

#[derive(Debug)]
struct SimWorld {
    clock: f64,
    position: f64,
    playing: bool,
    rate: f32,
    loaded: Option<String>,
    media_length: Option<f64>,
    fail_next_load: Option<String>,
    timers: Vec<SimTimer>,
    observers: Vec<SimObserver>,
    calls: Vec<(f64, TransportCall)>,
    last_id: u64,
}

impl SimWorld {
    fn new() -> Self {
        Self {
            clock: 0.0,
            position: 0.0,
            playing: false,
            rate: 1.0,
            loaded: None,
            media_length: None,
            fail_next_load: None,
            timers: Vec::new(),
            observers: Vec::new(),
            calls: Vec::new(),
            last_id: 0,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    fn record(&mut self, call: TransportCall) {
        self.calls.push((self.clock, call));
    }

    fn clamp_position(&self, position: f64) -> f64 {
        let position = position.max(0.0);
        match self.media_length {
            Some(length) => position.min(length),
            None => position,
        }
    }

    fn run_clock_to(&mut self, at: f64) {
        let elapsed = at - self.clock;
        if elapsed <= 0.0 {
            return;
        }
        if self.playing {
            self.position = self.clamp_position(self.position + elapsed * f64::from(self.rate));
        }
        self.clock = at;
    }

    fn next_event(&self) -> Option<NextEvent> {
        let timer = self
            .timers
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.handle.cmp(&b.handle)))
            .map(|(i, t)| NextEvent::Timer(i, t.due));

        let moving = self.playing && self.rate > 0.0;
        let rate = f64::from(self.rate);

        let crossing = if moving {
            self.observers
                .iter()
                .enumerate()
                .filter(|(_, o)| o.at > self.position)
                .map(|(i, o)| (i, self.clock + (o.at - self.position) / rate))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, at)| NextEvent::Crossing(i, at))
        } else {
            None
        };

        let end_of_media = match self.media_length {
            Some(length) if moving => Some(NextEvent::EndOfMedia(
                self.clock + (length - self.position).max(0.0) / rate,
            )),
            _ => None,
        };

        // Ties go to timers first, then crossings
        [timer, crossing, end_of_media]
            .into_iter()
            .flatten()
            .fold(None, |best: Option<NextEvent>, event| match best {
                Some(b) if b.at() <= event.at() => Some(b),
                _ => Some(event),
            })
    }

    /// Moves time forward to the next due callback, or to `deadline`
    fn step_until(&mut self, deadline: f64) -> Option<EngineCallback> {
        loop {
            let event = match self.next_event() {
                Some(event) if event.at() <= deadline => event,
                _ => {
                    self.run_clock_to(deadline);
                    return None;
                }
            };

            self.run_clock_to(event.at());
            match event {
                NextEvent::Timer(index, _) => {
                    let callback = self.timers[index].callback;
                    match self.timers[index].every {
                        Some(every) => self.timers[index].due += every,
                        None => {
                            self.timers.remove(index);
                        }
                    }
                    return Some(callback);
                }
                NextEvent::Crossing(index, _) => {
                    let observer = &self.observers[index];
                    self.position = observer.at;
                    return Some(observer.callback);
                }
                NextEvent::EndOfMedia(_) => {
                    if let Some(length) = self.media_length {
                        self.position = length;
                    }
                    log::debug!("Simulated audio reached its end at {}s", self.position);
                    self.playing = false;
                }
            }
        }
    }
}

/// Virtual clock shared by the simulated transport and scheduler
#[derive(Debug, Clone)]
pub struct Simulation {
    world: Rc<RefCell<SimWorld>>,
}

impl Simulation {
    pub fn new() -> Self {
        Self {
            world: Rc::new(RefCell::new(SimWorld::new())),
        }
    }

    pub fn transport(&self) -> SimTransport {
        SimTransport {
            world: Rc::clone(&self.world),
        }
    }

    pub fn scheduler(&self) -> SimScheduler {
        SimScheduler {
            world: Rc::clone(&self.world),
        }
    }

    /// Builds an engine wired to this simulation
    pub fn engine(&self, config: EngineConfig) -> SimEngine {
        SegmentEngine::new(self.transport(), self.scheduler(), config)
    }

    /// Stops the simulated audio once the playhead reaches `length` seconds
    pub fn set_media_length(&self, length: f64) {
        self.world.borrow_mut().media_length = Some(length);
    }

    /// Makes the next `load` fail with `reason`
    pub fn fail_next_load(&self, reason: impl Into<String>) {
        self.world.borrow_mut().fail_next_load = Some(reason.into());
    }

    /// Virtual wall-clock time in seconds
    pub fn now(&self) -> f64 {
        self.world.borrow().clock
    }

    pub fn position(&self) -> f64 {
        self.world.borrow().position
    }

    pub fn is_playing(&self) -> bool {
        self.world.borrow().playing
    }

    pub fn rate(&self) -> f32 {
        self.world.borrow().rate
    }

    pub fn loaded(&self) -> Option<String> {
        self.world.borrow().loaded.clone()
    }

    /// Live timers, periodic ones included
    pub fn live_timers(&self) -> usize {
        self.world.borrow().timers.len()
    }

    pub fn live_single_shot_timers(&self) -> usize {
        self.world
            .borrow()
            .timers
            .iter()
            .filter(|t| t.every.is_none())
            .count()
    }

    pub fn live_observers(&self) -> usize {
        self.world.borrow().observers.len()
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        let world = self.world.borrow();
        world
            .timers
            .iter()
            .map(|t| PendingTimer {
                handle: t.handle,
                due_in: t.due - world.clock,
                repeating: t.every.is_some(),
                callback: t.callback,
            })
            .collect()
    }

    /// The earliest single-shot timer still pending
    pub fn next_single_shot(&self) -> Option<PendingTimer> {
        self.pending_timers()
            .into_iter()
            .filter(|t| !t.repeating)
            .min_by(|a, b| a.due_in.total_cmp(&b.due_in))
    }

    pub fn observer_positions(&self) -> Vec<f64> {
        self.world.borrow().observers.iter().map(|o| o.at).collect()
    }

    /// Transport calls made so far, without timestamps
    pub fn calls(&self) -> Vec<TransportCall> {
        self.world
            .borrow()
            .calls
            .iter()
            .map(|(_, call)| call.clone())
            .collect()
    }

    /// Transport calls made so far, each with the virtual time it happened at
    pub fn timed_calls(&self) -> Vec<(f64, TransportCall)> {
        self.world.borrow().calls.clone()
    }

    /// Drains the call log
    pub fn take_calls(&self) -> Vec<TransportCall> {
        self.world
            .borrow_mut()
            .calls
            .drain(..)
            .map(|(_, call)| call)
            .collect()
    }

    /// Advances virtual time by `secs`, dispatching due callbacks to `engine`
    ///
    /// Returns the number of callbacks dispatched.
    pub fn advance(&self, engine: &mut SimEngine, secs: f64) -> usize {
        let deadline = self.now() + secs.max(0.0);
        let mut dispatched = 0;

        loop {
            // The borrow must end before the engine calls back into the world
            let next = self.world.borrow_mut().step_until(deadline);
            let Some(callback) = next else {
                break;
            };
            engine.handle_callback(callback);
            dispatched += 1;

            if dispatched >= MAX_DISPATCH_PER_ADVANCE {
                log::warn!("Stopped advancing after {} callbacks", dispatched);
                break;
            }
        }

        dispatched
    }

    /// Advances to absolute virtual time `at`
    pub fn advance_to(&self, engine: &mut SimEngine, at: f64) -> usize {
        let remaining = at - self.now();
        self.advance(engine, remaining)
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

/// Transport half of a [`Simulation`]
#[derive(Debug, Clone)]
pub struct SimTransport {
    world: Rc<RefCell<SimWorld>>,
}

impl Transport for SimTransport {
    fn load(&mut self, audio_ref: &str) -> EngineResult<()> {
        let mut world = self.world.borrow_mut();
        world.record(TransportCall::Load(audio_ref.to_string()));

        if let Some(reason) = world.fail_next_load.take() {
            return Err(AppError::AudioUnavailable {
                audio_ref: audio_ref.to_string(),
                reason,
            }
            .into());
        }

        world.loaded = Some(audio_ref.to_string());
        world.position = 0.0;
        world.playing = false;
        Ok(())
    }

    fn play(&mut self) {
        let mut world = self.world.borrow_mut();
        world.record(TransportCall::Play);
        world.playing = world.loaded.is_some();
    }

    fn pause(&mut self) {
        let mut world = self.world.borrow_mut();
        world.record(TransportCall::Pause);
        world.playing = false;
    }

    fn seek(&mut self, seconds: f64) {
        let mut world = self.world.borrow_mut();
        world.record(TransportCall::Seek(seconds));
        world.position = world.clamp_position(seconds);
    }

    fn current_time(&self) -> f64 {
        self.world.borrow().position
    }

    fn is_playing(&self) -> bool {
        self.world.borrow().playing
    }

    fn set_rate(&mut self, rate: f32) {
        let mut world = self.world.borrow_mut();
        world.record(TransportCall::SetRate(rate));
        world.rate = rate;
    }

    fn add_boundary_observer(&mut self, at: f64, callback: EngineCallback) -> ObserverHandle {
        let mut world = self.world.borrow_mut();
        world.record(TransportCall::AddObserver { at });
        let handle = ObserverHandle::new(world.next_id());
        world.observers.push(SimObserver {
            handle,
            at,
            callback,
        });
        handle
    }

    fn remove_boundary_observer(&mut self, handle: ObserverHandle) {
        let mut world = self.world.borrow_mut();
        world.record(TransportCall::RemoveObserver);
        world.observers.retain(|o| o.handle != handle);
    }
}

/// Scheduler half of a [`Simulation`]
#[derive(Debug, Clone)]
pub struct SimScheduler {
    world: Rc<RefCell<SimWorld>>,
}

impl SimScheduler {
    fn schedule(&mut self, after: f64, every: Option<f64>, callback: EngineCallback) -> TimerHandle {
        let mut world = self.world.borrow_mut();
        let handle = TimerHandle::new(world.next_id());
        let due = world.clock + after;
        world.timers.push(SimTimer {
            handle,
            due,
            every,
            callback,
        });
        handle
    }
}

impl Scheduler for SimScheduler {
    fn schedule_once(&mut self, after: Duration, callback: EngineCallback) -> TimerHandle {
        self.schedule(after.as_secs_f64(), None, callback)
    }

    fn schedule_repeating(&mut self, every: Duration, callback: EngineCallback) -> TimerHandle {
        let every = every.as_secs_f64().max(MIN_REPEAT_INTERVAL);
        self.schedule(every, Some(every), callback)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.world.borrow_mut().timers.retain(|t| t.handle != handle);
    }
}

/// Short description of a callback for logs and CLI output
pub fn describe(kind: &CallbackKind) -> String {
    match kind {
        CallbackKind::SegmentFinished { index } => format!("segment {} finished", index),
        CallbackKind::PauseElapsed { index } => format!("pause after segment {} elapsed", index),
        CallbackKind::RepeatBoundary { index } => format!("repeat boundary of segment {}", index),
        CallbackKind::RepeatReleased { index } => format!("segment {} released from repeat", index),
        CallbackKind::ProgressTick => "progress tick".to_string(),
    }
}
