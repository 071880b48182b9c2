//! Segment navigation: next/previous, play_segment, and the augmented
//! play-pause-play cycle on a virtual clock

use lectern_core::{Segment, Track};
use lectern_media_engine::sim::{Simulation, SimEngine, TransportCall};
use lectern_media_engine::{CallbackKind, EngineConfig};
use std::sync::Arc;
use std::time::Duration;

fn canterville() -> Arc<Track> {
    Arc::new(
        Track::new(
            "The Canterville Ghost",
            "Oscar Wilde",
            "canterville.mp3",
            40,
            vec![
                Segment::new(0.0, 10.0),
                Segment::new(10.0, 25.0),
                Segment::new(25.0, 40.0),
            ],
        )
        .unwrap(),
    )
}

/// Config with the progress tick pushed out of the way
fn quiet(pause_secs: f64) -> EngineConfig {
    EngineConfig::from_values(1.0, pause_secs, Duration::from_secs(3600), true).unwrap()
}

fn started(pause_secs: f64) -> (Simulation, SimEngine) {
    let sim = Simulation::new();
    let mut engine = sim.engine(quiet(pause_secs));
    engine.start_session(canterville()).unwrap();
    sim.take_calls();
    (sim, engine)
}

#[test]
fn test_continuous_session_start() {
    let sim = Simulation::new();
    let mut engine = sim.engine(quiet(0.0));
    engine.start_session(canterville()).unwrap();

    assert_eq!(
        sim.take_calls(),
        vec![
            TransportCall::Load("canterville.mp3".to_string()),
            TransportCall::SetRate(1.0),
            TransportCall::Play,
        ]
    );
    assert!(engine.is_playing());
    assert_eq!(sim.live_single_shot_timers(), 0);
}

#[test]
fn test_augmented_session_start_plays_first_segment() {
    let sim = Simulation::new();
    let mut engine = sim.engine(quiet(2.0));
    engine.start_session(canterville()).unwrap();

    let timer = sim.next_single_shot().expect("segment timer");
    assert_eq!(timer.callback.kind, CallbackKind::SegmentFinished { index: 0 });
    assert_eq!(timer.due_in, 10.0);
    assert!(sim.is_playing());
}

#[test]
fn test_three_segment_scenario() {
    let (sim, mut engine) = started(0.0);

    // Next segment while continuous
    engine.advance_segment();
    assert_eq!(
        sim.take_calls(),
        vec![TransportCall::Pause, TransportCall::Seek(10.0), TransportCall::Play]
    );
    assert_eq!(engine.current_segment_index(), 1);

    // Switching on a pause restarts the current segment on a timer
    engine.set_pause_duration(2.0).unwrap();
    assert_eq!(
        sim.take_calls(),
        vec![TransportCall::Pause, TransportCall::Seek(10.0), TransportCall::Play]
    );
    let timer = sim.next_single_shot().expect("segment timer");
    assert_eq!(timer.due_in, 15.0);
    assert_eq!(timer.callback.kind, CallbackKind::SegmentFinished { index: 1 });

    // Segment ends: silence for two seconds
    sim.advance(&mut engine, 15.0);
    assert_eq!(sim.take_calls(), vec![TransportCall::Pause]);
    assert!(!sim.is_playing());
    assert!(engine.is_playing());
    let timer = sim.next_single_shot().expect("pause timer");
    assert_eq!(timer.due_in, 2.0);
    assert_eq!(timer.callback.kind, CallbackKind::PauseElapsed { index: 1 });

    // Pause over: last segment plays on its own timer
    sim.advance(&mut engine, 2.0);
    assert_eq!(
        sim.take_calls(),
        vec![TransportCall::Seek(25.0), TransportCall::Play]
    );
    let timer = sim.next_single_shot().expect("segment timer");
    assert_eq!(timer.due_in, 15.0);
    assert_eq!(timer.callback.kind, CallbackKind::SegmentFinished { index: 2 });

    // Nothing follows the last segment; the transport just runs on
    sim.advance(&mut engine, 15.0);
    assert!(sim.take_calls().is_empty());
    assert_eq!(sim.live_single_shot_timers(), 0);
    assert!(sim.is_playing());
    assert_eq!(sim.position(), 40.0);
}

#[test]
fn test_advance_at_last_segment_is_noop() {
    let (sim, mut engine) = started(0.0);
    engine.seek(0.9).unwrap();
    sim.take_calls();

    engine.advance_segment();

    assert!(sim.take_calls().is_empty());
    assert_eq!(engine.current_segment_index(), 2);
    assert!(sim.is_playing());
}

#[test]
fn test_retreat_clamps_to_first_segment() {
    let (sim, mut engine) = started(0.0);
    sim.advance(&mut engine, 4.0);

    engine.retreat_segment();

    assert_eq!(
        sim.take_calls(),
        vec![TransportCall::Pause, TransportCall::Seek(0.0), TransportCall::Play]
    );
    assert_eq!(engine.current_segment_index(), 0);
}

#[test]
fn test_retreat_from_middle_segment() {
    let (sim, mut engine) = started(0.0);
    engine.seek(0.5).unwrap();
    sim.take_calls();

    engine.retreat_segment();

    assert_eq!(
        sim.take_calls(),
        vec![TransportCall::Pause, TransportCall::Seek(0.0), TransportCall::Play]
    );
}

#[test]
fn test_navigation_while_paused_does_not_resume() {
    let (sim, mut engine) = started(0.0);
    engine.toggle_play_pause();
    sim.take_calls();

    engine.advance_segment();

    assert_eq!(sim.take_calls(), vec![TransportCall::Pause, TransportCall::Seek(10.0)]);
    assert!(!sim.is_playing());
    assert!(!engine.is_playing());
}

#[test]
fn test_augmented_navigation_while_paused_only_moves_position() {
    let (sim, mut engine) = started(1.0);
    engine.toggle_play_pause();
    sim.take_calls();

    engine.advance_segment();

    assert_eq!(sim.take_calls(), vec![TransportCall::Pause, TransportCall::Seek(10.0)]);
    assert_eq!(sim.live_single_shot_timers(), 0);
    assert_eq!(engine.current_segment_index(), 1);
}

#[test]
fn test_augmented_advance_while_playing_arms_timer() {
    let (sim, mut engine) = started(1.0);
    sim.advance(&mut engine, 3.0);
    sim.take_calls();

    engine.advance_segment();

    assert_eq!(
        sim.take_calls(),
        vec![TransportCall::Pause, TransportCall::Seek(10.0), TransportCall::Play]
    );
    let timer = sim.next_single_shot().expect("segment timer");
    assert_eq!(timer.callback.kind, CallbackKind::SegmentFinished { index: 1 });
    assert_eq!(timer.due_in, 15.0);
    assert_eq!(sim.live_single_shot_timers(), 1);
}

#[test]
fn test_play_segment_guards() {
    let (sim, mut engine) = started(1.0);

    engine.play_segment(3);
    engine.play_segment(usize::MAX);
    assert!(sim.take_calls().is_empty());

    engine.toggle_play_pause();
    sim.take_calls();
    engine.play_segment(1);
    assert!(sim.take_calls().is_empty());
    assert_eq!(sim.live_single_shot_timers(), 0);
}

#[test]
fn test_after_segment_played_guards() {
    let (sim, mut engine) = started(1.0);

    engine.after_segment_played(2);
    engine.after_segment_played(usize::MAX);
    assert!(sim.take_calls().is_empty());

    engine.toggle_play_pause();
    sim.take_calls();
    engine.after_segment_played(0);
    assert!(sim.take_calls().is_empty());
}

#[test]
fn test_resume_from_pause_gap_starts_next_segment() {
    let (sim, mut engine) = started(3.0);
    sim.advance(&mut engine, 10.0);
    assert_eq!(
        sim.next_single_shot().map(|t| t.callback.kind),
        Some(CallbackKind::PauseElapsed { index: 0 })
    );

    // Pausing in the gap drops the pending pause timer
    engine.toggle_play_pause();
    assert_eq!(sim.live_single_shot_timers(), 0);
    sim.take_calls();

    engine.toggle_play_pause();
    assert_eq!(
        sim.take_calls(),
        vec![TransportCall::Seek(10.0), TransportCall::Play]
    );
    assert_eq!(
        sim.next_single_shot().map(|t| t.callback.kind),
        Some(CallbackKind::SegmentFinished { index: 1 })
    );
}

#[test]
fn test_current_segment_index_follows_playhead() {
    let (sim, mut engine) = started(0.0);
    let cases = [
        (0.0, 0),
        (9.0, 0),
        (10.0, 1),
        (24.0, 1),
        (25.0, 2),
        (40.0, 2),
    ];

    for (position, expected) in cases {
        engine.seek(position / 40.0).unwrap();
        assert_eq!(
            engine.current_segment_index(),
            expected,
            "position {}",
            position
        );
    }
    assert_eq!(sim.position(), 40.0);
}

#[test]
fn test_current_segment_index_without_session() {
    let sim = Simulation::new();
    let engine = sim.engine(quiet(0.0));
    assert_eq!(engine.current_segment_index(), 0);
}
