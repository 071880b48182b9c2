//! Runs a playback session on the virtual clock and records what happened

use crate::script::{ScriptAction, ScriptStep};
use anyhow::{Context, Result};
use lectern_core::Track;
use lectern_media_engine::sim::{SimEngine, Simulation, TransportCall};
use lectern_media_engine::{EngineConfig, EngineEvent, PlayerView};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntrySource {
    Intent,
    Transport,
    Event,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub at: f64,
    pub source: EntrySource,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub timeline: Vec<TimelineEntry>,
    pub final_view: Option<PlayerView>,
    pub ended_at: f64,
}

impl SimulationReport {
    pub fn entries_from(&self, source: EntrySource) -> impl Iterator<Item = &TimelineEntry> {
        self.timeline.iter().filter(move |e| e.source == source)
    }
}

/// Virtual time needed to play the whole track once with the given settings
pub fn natural_length(track: &Track, config: &EngineConfig) -> f64 {
    let audio = track.duration_secs() as f64 / f64::from(config.speed.value());
    let gaps = track.segment_count().saturating_sub(1) as f64 * config.pause.secs();
    audio + gaps + 1.0
}

/// Plays `track` from the start, applying `script` along the way
///
/// Stops at `until` virtual seconds, or after the natural length of the
/// track when `until` is `None`.
pub fn run_simulation(
    track: Arc<Track>,
    config: EngineConfig,
    script: &[ScriptStep],
    until: Option<f64>,
) -> Result<SimulationReport> {
    let until = until.unwrap_or_else(|| natural_length(&track, &config));

    let sim = Simulation::new();
    sim.set_media_length(track.duration_secs() as f64);
    let mut engine = sim.engine(config);

    let events = Rc::new(RefCell::new(Vec::new()));
    {
        let sink = Rc::clone(&events);
        let clock = sim.clone();
        engine.subscribe(move |event| {
            if let Some(text) = describe_event(event) {
                sink.borrow_mut().push(TimelineEntry {
                    at: clock.now(),
                    source: EntrySource::Event,
                    text,
                });
            }
        });
    }

    engine
        .start_session(Arc::clone(&track))
        .with_context(|| format!("Failed to start playback of '{}'", track.title()))?;

    let mut intents = Vec::new();
    for step in script.iter().filter(|s| s.at <= until) {
        sim.advance_to(&mut engine, step.at);
        let text = match apply(&mut engine, step.action) {
            Ok(()) => step.action.to_string(),
            Err(reason) => format!("{} (rejected: {})", step.action, reason),
        };
        intents.push(TimelineEntry {
            at: sim.now(),
            source: EntrySource::Intent,
            text,
        });
    }

    sim.advance_to(&mut engine, until);
    let final_view = engine.view();
    engine.end_session();

    let calls = sim.timed_calls().into_iter().map(|(at, call)| TimelineEntry {
        at,
        source: EntrySource::Transport,
        text: describe_call(&call),
    });

    let mut timeline: Vec<TimelineEntry> = intents
        .into_iter()
        .chain(calls)
        .chain(events.borrow().iter().cloned())
        .collect();
    timeline.sort_by(|a, b| a.at.total_cmp(&b.at));

    Ok(SimulationReport {
        timeline,
        final_view,
        ended_at: sim.now(),
    })
}

fn apply(engine: &mut SimEngine, action: ScriptAction) -> std::result::Result<(), String> {
    match action {
        ScriptAction::TogglePlayPause => engine.toggle_play_pause(),
        ScriptAction::Next => engine.advance_segment(),
        ScriptAction::Previous => engine.retreat_segment(),
        ScriptAction::ToggleRepeat => engine.toggle_repeat(),
        ScriptAction::Speed(speed) => engine.set_speed(speed).map_err(|e| e.to_string())?,
        ScriptAction::Pause(secs) => engine.set_pause_duration(secs).map_err(|e| e.to_string())?,
        ScriptAction::Seek(fraction) => engine.seek(fraction).map_err(|e| e.to_string())?,
        ScriptAction::Fail => engine.handle_transport_failure("simulated transport failure"),
        ScriptAction::Stop => engine.end_session(),
    }
    Ok(())
}

fn describe_call(call: &TransportCall) -> String {
    match call {
        TransportCall::Load(audio_ref) => format!("load {}", audio_ref),
        TransportCall::Play => "play".to_string(),
        TransportCall::Pause => "pause".to_string(),
        TransportCall::Seek(secs) => format!("seek {:.2}s", secs),
        TransportCall::SetRate(rate) => format!("rate {:.2}x", rate),
        TransportCall::AddObserver { at } => format!("watch boundary at {:.2}s", at),
        TransportCall::RemoveObserver => "stop watching boundary".to_string(),
    }
}

/// Progress ticks are left out of the timeline
fn describe_event(event: &EngineEvent) -> Option<String> {
    let text = match event {
        EngineEvent::Progress { .. } => return None,
        EngineEvent::SessionStarted {
            title,
            segment_count,
        } => format!("session started: '{}' ({} segments)", title, segment_count),
        EngineEvent::SessionEnded => "session ended".to_string(),
        EngineEvent::StatusChanged(status) => format!("status {:?}", status),
        EngineEvent::SegmentChanged { index } => format!("segment {}", index),
        EngineEvent::RepeatChanged {
            enabled: true,
            index,
        } => match index {
            Some(index) => format!("repeating segment {}", index),
            None => "repeating".to_string(),
        },
        EngineEvent::RepeatChanged { enabled: false, .. } => "repeat off".to_string(),
        EngineEvent::RepeatLooped { index } => format!("looped segment {}", index),
        EngineEvent::SpeedChanged { speed } => format!("speed {:.2}x", speed),
        EngineEvent::PauseDurationChanged { seconds } => format!("pause {}s", seconds),
        EngineEvent::IllustrationChanged { image_ref } => format!("illustration {}", image_ref),
        EngineEvent::Error { message } => format!("error: {}", message),
    };
    Some(text)
}
