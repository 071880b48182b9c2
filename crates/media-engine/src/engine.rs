//! Segment-aware playback engine
//!
//! The engine owns a [`Transport`] and a [`Scheduler`] and turns UI intents
//! (play/pause, next/previous segment, repeat, pause length, speed, scrub)
//! into transport calls. It is single-threaded: timers and boundary
//! observers report back through [`SegmentEngine::handle_callback`].
//!
//! Two invariants hold at all times:
//! - at most one single-shot timer is outstanding; arming a new one cancels
//!   the previous handle first
//! - while a segment is being repeated no single-shot timer is armed

use crate::callback::{CallbackKind, EngineCallback, SessionToken};
use crate::error::{EngineError, EngineResult};
use crate::events::{EventBus, ListenerId};
use crate::speed::Speed;
use crate::state::{ActiveTimer, PauseDuration, PlaybackMode, RepeatLoop, SessionState};
use crate::timer::{Scheduler, TimerHandle};
use crate::transport::Transport;
use crate::types::{EngineEvent, PlaybackStatus, PlayerView};
use lectern_core::{format_clock, AppError, Segment, Track};
use std::sync::Arc;
use std::time::Duration;

/// Settings applied when a session starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub speed: Speed,
    pub pause: PauseDuration,
    pub progress_interval: Duration,
    pub autoplay: bool,
}

impl EngineConfig {
    pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

    /// Builds a configuration from raw values, validating speed and pause
    pub fn from_values(
        speed: f32,
        pause_secs: f64,
        progress_interval: Duration,
        autoplay: bool,
    ) -> EngineResult<Self> {
        Ok(Self {
            speed: Speed::new(speed)?,
            pause: PauseDuration::new(pause_secs)?,
            progress_interval,
            autoplay,
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            speed: Speed::default(),
            pause: PauseDuration::ZERO,
            progress_interval: Self::DEFAULT_PROGRESS_INTERVAL,
            autoplay: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Forward,
    Back,
}

/// Plays a [`Track`] segment by segment
pub struct SegmentEngine<T: Transport, S: Scheduler> {
    transport: T,
    scheduler: S,
    config: EngineConfig,
    session: Option<SessionState>,
    last_token: SessionToken,
    last_ticket: u64,
    events: EventBus,
}

impl<T: Transport, S: Scheduler> SegmentEngine<T, S> {
    pub fn new(transport: T, scheduler: S, config: EngineConfig) -> Self {
        Self {
            transport,
            scheduler,
            config,
            session: None,
            last_token: SessionToken::new(0),
            last_ticket: 0,
            events: EventBus::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn session_token(&self) -> Option<SessionToken> {
        self.session.as_ref().map(|s| s.token)
    }

    pub fn track(&self) -> Option<&Arc<Track>> {
        self.session.as_ref().map(|s| &s.track)
    }

    /// Run intent of the current session, which may differ from the transport
    /// during the silent gap between segments
    pub fn is_playing(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_playing)
    }

    pub fn is_repeating(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_repeating())
    }

    pub fn status(&self) -> PlaybackStatus {
        match &self.session {
            None => PlaybackStatus::Stopped,
            Some(s) if s.is_playing => PlaybackStatus::Playing,
            Some(_) => PlaybackStatus::Paused,
        }
    }

    pub fn speed(&self) -> Speed {
        self.session.as_ref().map_or(self.config.speed, |s| s.speed)
    }

    pub fn pause_duration(&self) -> PauseDuration {
        self.session.as_ref().map_or(self.config.pause, |s| s.pause)
    }

    pub fn mode(&self) -> PlaybackMode {
        self.pause_duration().mode()
    }

    /// Handle of the outstanding single-shot timer, if any
    pub fn active_timer(&self) -> Option<TimerHandle> {
        self.session
            .as_ref()
            .and_then(|s| s.active_timer)
            .map(|t| t.handle)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&EngineEvent) + 'static) -> ListenerId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    // ===== Session lifecycle =====

    /// Starts a new session for `track`, ending any previous one
    ///
    /// A load failure leaves the engine without a session.
    pub fn start_session(&mut self, track: Arc<Track>) -> EngineResult<()> {
        self.end_session();

        self.transport.load(track.audio_ref())?;

        let token = self.last_token.next();
        self.last_token = token;

        let speed = self.config.speed;
        self.transport.set_rate(speed.value());

        let mut session = SessionState::new(Arc::clone(&track), token, speed, self.config.pause);
        session.is_playing = self.config.autoplay;
        session.last_illustration = session.illustration_at(0.0);
        session.progress_timer = Some(self.scheduler.schedule_repeating(
            self.config.progress_interval,
            EngineCallback::new(token, CallbackKind::ProgressTick),
        ));
        let mode = session.mode();
        self.session = Some(session);

        log::info!(
            "Started session {} for '{}' ({} segments, {}, pause {}s)",
            token.generation(),
            track.title(),
            track.segment_count(),
            speed,
            self.config.pause.secs()
        );
        self.events.emit(EngineEvent::SessionStarted {
            title: track.title().to_string(),
            segment_count: track.segment_count(),
        });
        if let Some(section) = track.section_at(0.0) {
            self.events.emit(EngineEvent::IllustrationChanged {
                image_ref: section.image_ref.clone(),
            });
        }

        if self.config.autoplay {
            match mode {
                PlaybackMode::Continuous => self.transport.play(),
                PlaybackMode::Augmented { .. } => self.play_segment(0),
            }
            self.events.emit(EngineEvent::StatusChanged(PlaybackStatus::Playing));
        }

        Ok(())
    }

    /// Cancels every timer and observer and invalidates the session token
    pub fn end_session(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        if let Some(timer) = session.active_timer.take() {
            self.scheduler.cancel(timer.handle);
        }
        if let Some(handle) = session.progress_timer.take() {
            self.scheduler.cancel(handle);
        }
        if let Some(repeat) = session.repeat.take() {
            self.transport.remove_boundary_observer(repeat.observer);
        }
        self.transport.pause();

        log::info!(
            "Ended session {} for '{}'",
            session.token.generation(),
            session.track.title()
        );
        self.events.emit(EngineEvent::SessionEnded);
    }

    /// Reports an asynchronous transport failure and tears the session down
    pub fn handle_transport_failure(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.session.is_none() {
            log::debug!("Ignoring transport failure without a session: {}", message);
            return;
        }

        self.report_error(AppError::PlaybackDeviceError { message });
    }

    /// Surfaces a platform error to listeners, ending the session when the
    /// error is critical
    fn report_error(&mut self, error: AppError) {
        log::error!("{} ({}: {})", error, error.severity(), error.recovery_action());
        self.events.emit(EngineEvent::Error {
            message: error.user_message(),
        });

        if error.is_critical() {
            self.end_session();
        }
    }

    // ===== Intents =====

    pub fn toggle_play_pause(&mut self) {
        let Some(session) = self.session.as_mut() else {
            log::debug!("Ignoring play/pause without an active session");
            return;
        };

        if session.is_playing {
            session.is_playing = false;
            self.transport.pause();
            self.cancel_active_timer();
            self.events.emit(EngineEvent::StatusChanged(PlaybackStatus::Paused));
        } else {
            session.is_playing = true;
            let mode = session.mode();
            match mode {
                PlaybackMode::Continuous => self.transport.play(),
                PlaybackMode::Augmented { .. } => {
                    let index = self.current_segment_index();
                    self.play_segment(index);
                }
            }
            self.events.emit(EngineEvent::StatusChanged(PlaybackStatus::Playing));
        }
    }

    pub fn advance_segment(&mut self) {
        self.step(Step::Forward);
    }

    pub fn retreat_segment(&mut self) {
        self.step(Step::Back);
    }

    fn step(&mut self, step: Step) {
        let Some(session) = self.session.as_ref() else {
            log::debug!("Ignoring {:?} step without an active session", step);
            return;
        };
        let track = Arc::clone(&session.track);
        let is_playing = session.is_playing;
        let mode = session.mode();

        let current = track.segment_index_at(self.transport.current_time());
        let target = match step {
            Step::Forward if current >= track.last_segment_index() => {
                log::debug!("Already at the last segment ({})", current);
                return;
            }
            Step::Forward => current + 1,
            Step::Back => current.saturating_sub(1),
        };
        let Some(segment) = track.segment(target).copied() else {
            return;
        };

        self.transport.pause();
        self.retarget_repeat(target, segment);

        match mode {
            PlaybackMode::Continuous => {
                self.transport.seek(segment.start);
                if is_playing {
                    self.transport.play();
                }
            }
            PlaybackMode::Augmented { .. } if is_playing => self.play_segment(target),
            PlaybackMode::Augmented { .. } => self.transport.seek(segment.start),
        }
        self.note_segment(target);
    }

    /// Plays one segment from its start and arms the timer that ends it
    ///
    /// No-op unless the session intends to play and `index` is in range.
    /// While repeating, the boundary observer owns the segment end and no
    /// timer is armed.
    pub fn play_segment(&mut self, index: usize) {
        let Some(session) = self.session.as_ref() else {
            log::debug!("Ignoring play_segment({}) without an active session", index);
            return;
        };
        if !session.is_playing {
            log::debug!("Ignoring play_segment({}) while paused", index);
            return;
        }
        let Some(segment) = session.track.segment(index).copied() else {
            log::debug!(
                "Ignoring play_segment({}): track has {} segments",
                index,
                session.track.segment_count()
            );
            return;
        };
        let speed = session.speed;
        let repeating = session.is_repeating();

        self.transport.seek(segment.start);
        self.transport.play();

        if repeating {
            self.retarget_repeat(index, segment);
            self.cancel_active_timer();
        } else {
            self.arm_timer(
                speed.wall_time(segment.duration()),
                CallbackKind::SegmentFinished { index },
            );
        }
        self.note_segment(index);
    }

    /// Starts the silent gap that follows segment `index`
    ///
    /// No-op when paused or when `index` is the last segment, in which case
    /// the transport plays on to the end of the audio.
    pub fn after_segment_played(&mut self, index: usize) {
        let Some(session) = self.session.as_ref() else {
            log::debug!("Ignoring after_segment_played({}) without an active session", index);
            return;
        };
        if !session.is_playing {
            log::debug!("Ignoring after_segment_played({}) while paused", index);
            return;
        }
        let has_next = index
            .checked_add(1)
            .is_some_and(|next| next < session.track.segment_count());
        if !has_next {
            log::debug!("Segment {} is the last one, nothing follows", index);
            return;
        }
        let pause = session.pause;

        self.transport.pause();
        self.arm_timer(pause.as_duration(), CallbackKind::PauseElapsed { index });
    }

    /// Changes the silence inserted after each segment
    ///
    /// Without a session the value becomes the default for the next one.
    pub fn set_pause_duration(&mut self, secs: f64) -> EngineResult<()> {
        let pause = PauseDuration::new(secs)?;
        self.config.pause = pause;

        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        session.pause = pause;
        let is_playing = session.is_playing;
        self.events.emit(EngineEvent::PauseDurationChanged { seconds: secs });

        if is_playing {
            self.transport.pause();
            match pause.mode() {
                PlaybackMode::Continuous => {
                    self.cancel_active_timer();
                    self.transport.play();
                }
                PlaybackMode::Augmented { .. } => {
                    let index = self.current_segment_index();
                    self.play_segment(index);
                }
            }
        }
        Ok(())
    }

    /// Changes the playback speed
    ///
    /// In augmented mode the current segment restarts so its timer is armed
    /// at the new speed. Without a session the value becomes the default for
    /// the next one.
    pub fn set_speed(&mut self, value: f32) -> EngineResult<()> {
        let speed = Speed::new(value)?;
        self.config.speed = speed;

        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        session.speed = speed;
        let restart = session.is_playing && session.mode().is_augmented();

        self.transport.set_rate(speed.value());
        self.events.emit(EngineEvent::SpeedChanged { speed: value });

        if restart {
            self.transport.pause();
            let index = self.current_segment_index();
            self.play_segment(index);
        }
        Ok(())
    }

    /// Starts or stops looping the current segment
    pub fn toggle_repeat(&mut self) {
        let Some(session) = self.session.as_ref() else {
            log::debug!("Ignoring repeat toggle without an active session");
            return;
        };

        match session.repeat {
            Some(repeat) => self.release_repeat(repeat),
            None => self.capture_repeat(),
        }
    }

    fn capture_repeat(&mut self) {
        let index = self.current_segment_index();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(segment) = session.track.segment(index).copied() else {
            return;
        };

        if let Some(timer) = session.active_timer.take() {
            self.scheduler.cancel(timer.handle);
        }

        if session.is_playing {
            let position = self.transport.current_time();
            if !segment.contains(position) {
                self.transport.seek(segment.start);
            }
            if !self.transport.is_playing() {
                self.transport.play();
            }
        }

        let callback = EngineCallback::new(session.token, CallbackKind::RepeatBoundary { index });
        let observer = self.transport.add_boundary_observer(segment.end, callback);
        session.repeat = Some(RepeatLoop {
            index,
            segment,
            observer,
        });

        log::debug!("Repeating segment {} ({}s - {}s)", index, segment.start, segment.end);
        self.events.emit(EngineEvent::RepeatChanged {
            enabled: true,
            index: Some(index),
        });
    }

    fn release_repeat(&mut self, repeat: RepeatLoop) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.repeat = None;
        let is_playing = session.is_playing;
        let mode = session.mode();
        let speed = session.speed;

        self.transport.remove_boundary_observer(repeat.observer);
        log::debug!("Released repeat of segment {}", repeat.index);
        self.events.emit(EngineEvent::RepeatChanged {
            enabled: false,
            index: None,
        });

        if is_playing && mode.is_augmented() {
            let remaining = (repeat.segment.end - self.transport.current_time()).max(0.0);
            self.arm_timer(
                speed.wall_time(remaining),
                CallbackKind::RepeatReleased {
                    index: repeat.index,
                },
            );
        }
    }

    /// Scrubs to `fraction` of the track duration
    ///
    /// The fraction is clamped to `[0, 1]`. Timers are left as they are, so
    /// in augmented mode the segment timer keeps counting from where it was
    /// armed rather than from the new position.
    pub fn seek(&mut self, fraction: f64) -> EngineResult<()> {
        if fraction.is_nan() {
            return Err(EngineError::InvalidSeek(fraction));
        }
        let Some(session) = self.session.as_ref() else {
            log::debug!("Ignoring seek without an active session");
            return Ok(());
        };

        let target = fraction.clamp(0.0, 1.0) * session.track.duration_secs() as f64;
        self.transport.seek(target);
        Ok(())
    }

    /// Index of the segment under the playhead, 0 without a session
    pub fn current_segment_index(&self) -> usize {
        self.session.as_ref().map_or(0, |s| {
            s.track.segment_index_at(self.transport.current_time())
        })
    }

    /// Snapshot for the player screen
    pub fn view(&self) -> Option<PlayerView> {
        let session = self.session.as_ref()?;
        let track = &session.track;
        let position = self.transport.current_time();

        Some(PlayerView {
            book_name: track.title().to_string(),
            author: track.author().to_string(),
            cover_image_ref: track.cover_image_ref().to_string(),
            transcript: track.transcript().to_string(),
            current_time_label: format_clock(position),
            duration_label: format_clock(track.duration_secs() as f64),
            progress: session.progress_at(position),
            segment_index: track.segment_index_at(position),
            segment_count: track.segment_count(),
            illustration: session
                .last_illustration
                .and_then(|i| track.sections().get(i))
                .map(|section| section.image_ref.clone()),
            is_playing: session.is_playing,
            is_repeating: session.is_repeating(),
            speed: session.speed.value(),
            pause_secs: session.pause.secs(),
        })
    }

    // ===== Callback dispatch =====

    /// Runs a fired timer or observer callback
    ///
    /// Callbacks from an ended session, and single-shot timers that have been
    /// superseded, are dropped without touching any state.
    pub fn handle_callback(&mut self, callback: EngineCallback) {
        let Some(session) = self.session.as_mut() else {
            log::debug!("Dropping {:?}: no active session", callback.kind);
            return;
        };
        if session.token != callback.session {
            log::debug!(
                "Dropping {:?} from session {} (current is {})",
                callback.kind,
                callback.session.generation(),
                session.token.generation()
            );
            return;
        }

        let single_shot = !matches!(
            callback.kind,
            CallbackKind::ProgressTick | CallbackKind::RepeatBoundary { .. }
        );
        if single_shot {
            match session.active_timer {
                Some(active) if active.ticket == callback.ticket => session.active_timer = None,
                _ => {
                    log::debug!("Dropping superseded timer {:?}", callback.kind);
                    return;
                }
            }
        }

        log::debug!("Dispatching {:?}", callback.kind);
        match callback.kind {
            CallbackKind::SegmentFinished { index } => self.after_segment_played(index),
            CallbackKind::PauseElapsed { index } => match index.checked_add(1) {
                Some(next) => self.play_segment(next),
                None => log::debug!("No segment follows {}", index),
            },
            CallbackKind::RepeatBoundary { index } => self.on_repeat_boundary(index),
            CallbackKind::RepeatReleased { index } => self.after_segment_played(index),
            CallbackKind::ProgressTick => self.on_progress_tick(),
        }
    }

    fn on_repeat_boundary(&mut self, index: usize) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(repeat) = session.repeat.filter(|r| r.index == index) else {
            log::debug!("Segment {} is no longer repeating", index);
            return;
        };
        if !session.is_playing {
            return;
        }

        self.transport.seek(repeat.segment.start);
        self.transport.play();
        self.events.emit(EngineEvent::RepeatLooped { index });
    }

    fn on_progress_tick(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let position = self.transport.current_time();

        self.events.emit(EngineEvent::Progress {
            current_secs: position,
            duration_secs: session.track.duration_secs(),
            fraction: session.progress_at(position),
        });

        let segment = session.track.segment_index_at(position);
        if segment != session.last_segment {
            session.last_segment = segment;
            self.events.emit(EngineEvent::SegmentChanged { index: segment });
        }

        if let Some(section) = session.illustration_at(position) {
            if session.last_illustration != Some(section) {
                session.last_illustration = Some(section);
                if let Some(illustration) = session.track.sections().get(section) {
                    self.events.emit(EngineEvent::IllustrationChanged {
                        image_ref: illustration.image_ref.clone(),
                    });
                }
            }
        }
    }

    // ===== Timer bookkeeping =====

    /// Arms the single-shot timer, cancelling any previous one
    fn arm_timer(&mut self, after: Duration, kind: CallbackKind) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(previous) = session.active_timer.take() {
            self.scheduler.cancel(previous.handle);
        }

        self.last_ticket += 1;
        let ticket = self.last_ticket;
        let callback = EngineCallback::new(session.token, kind).with_ticket(ticket);
        let handle = self.scheduler.schedule_once(after, callback);
        session.active_timer = Some(ActiveTimer {
            handle,
            ticket,
            kind,
        });
        log::debug!("Armed {:?} in {:?}", kind, after);
    }

    fn cancel_active_timer(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(timer) = session.active_timer.take() {
            self.scheduler.cancel(timer.handle);
            log::debug!("Cancelled {:?}", timer.kind);
        }
    }

    /// Moves a running repeat loop onto another segment
    fn retarget_repeat(&mut self, index: usize, segment: Segment) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let token = session.token;
        let Some(repeat) = session.repeat.as_mut() else {
            return;
        };
        if repeat.index == index {
            return;
        }

        self.transport.remove_boundary_observer(repeat.observer);
        let callback = EngineCallback::new(token, CallbackKind::RepeatBoundary { index });
        *repeat = RepeatLoop {
            index,
            segment,
            observer: self.transport.add_boundary_observer(segment.end, callback),
        };
        self.events.emit(EngineEvent::RepeatChanged {
            enabled: true,
            index: Some(index),
        });
    }

    fn note_segment(&mut self, index: usize) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.last_segment != index {
            session.last_segment = index;
            self.events.emit(EngineEvent::SegmentChanged { index });
        }
    }
}

impl<T: Transport, S: Scheduler> std::fmt::Debug for SegmentEngine<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentEngine")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("events", &self.events)
            .finish()
    }
}
