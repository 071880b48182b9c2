//! Engine driven by the wall-clock timer thread through a callback mailbox

use lectern_core::{Segment, Track};
use lectern_media_engine::sim::{SimTransport, Simulation, TransportCall};
use lectern_media_engine::{
    callback_channel, CallbackKind, CallbackReceiver, EngineConfig, SegmentEngine,
    ThreadScheduler,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

fn short_track() -> Arc<Track> {
    Arc::new(
        Track::new(
            "Short",
            "A",
            "short.mp3",
            10,
            vec![Segment::new(0.0, 0.05), Segment::new(0.05, 5.0)],
        )
        .unwrap(),
    )
}

fn threaded_engine(sim: &Simulation) -> (SegmentEngine<SimTransport, ThreadScheduler>, CallbackReceiver) {
    let (tx, rx) = callback_channel();
    let scheduler = ThreadScheduler::start(tx).unwrap();
    let config = EngineConfig::from_values(1.0, 0.05, Duration::from_secs(3600), true).unwrap();
    (SegmentEngine::new(sim.transport(), scheduler, config), rx)
}

#[test]
fn test_segment_timer_fires_through_mailbox() {
    let _ = env_logger::builder().is_test(true).try_init();
    let sim = Simulation::new();
    let (mut engine, rx) = threaded_engine(&sim);
    engine.start_session(short_track()).unwrap();
    sim.take_calls();

    let fired = rx.recv_timeout(WAIT).expect("segment timer");
    assert_eq!(fired.kind, CallbackKind::SegmentFinished { index: 0 });
    engine.handle_callback(fired);
    assert_eq!(sim.take_calls(), vec![TransportCall::Pause]);

    let fired = rx.recv_timeout(WAIT).expect("pause timer");
    assert_eq!(fired.kind, CallbackKind::PauseElapsed { index: 0 });
    engine.handle_callback(fired);
    assert_eq!(
        sim.take_calls(),
        vec![TransportCall::Seek(0.05), TransportCall::Play]
    );
}

#[test]
fn test_fired_then_superseded_timer_is_dropped() {
    let sim = Simulation::new();
    let (mut engine, rx) = threaded_engine(&sim);
    engine.start_session(short_track()).unwrap();

    // Let the first segment timer land in the mailbox before replacing it
    thread::sleep(Duration::from_millis(200));
    assert_eq!(rx.pending(), 1);
    engine.play_segment(1);
    sim.take_calls();

    assert_eq!(engine.drain(&rx), 1);
    assert!(sim.take_calls().is_empty());
    assert!(engine.active_timer().is_some());
}

#[test]
fn test_no_callbacks_dispatched_after_teardown() {
    let sim = Simulation::new();
    let (mut engine, rx) = threaded_engine(&sim);
    engine.start_session(short_track()).unwrap();

    engine.end_session();
    sim.take_calls();
    thread::sleep(Duration::from_millis(200));

    engine.drain(&rx);
    assert!(sim.take_calls().is_empty());
}

#[test]
fn test_huge_pause_arms_timer_without_panicking() {
    let sim = Simulation::new();
    let (mut engine, rx) = threaded_engine(&sim);
    engine.start_session(short_track()).unwrap();

    engine.set_pause_duration(1e20).unwrap();
    engine.after_segment_played(0);
    sim.take_calls();

    let gap_timer = engine.active_timer().expect("pause timer armed");
    thread::sleep(Duration::from_millis(200));
    engine.drain(&rx);

    assert_eq!(engine.active_timer(), Some(gap_timer));
    assert!(sim.take_calls().is_empty());
    assert!(engine.is_playing());
}
