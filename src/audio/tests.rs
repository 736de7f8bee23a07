use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::{TempDir, tempdir};

use super::fake::FakeBackend;
use super::*;
use crate::events::{Event, EventKind};
use crate::library::{Track, TrackRecord};
use crate::testutil::write_wav;

const WAIT: Duration = Duration::from_secs(2);

fn fast_options() -> EngineOptions {
    EngineOptions {
        position_interval: Duration::from_millis(5),
        end_tolerance: Duration::from_secs(1),
    }
}

fn engine() -> (PlaybackEngine<FakeBackend>, FakeBackend) {
    let backend = FakeBackend::new();
    (
        PlaybackEngine::new(backend.clone(), fast_options(), 0.5),
        backend,
    )
}

fn wav_track(dir: &Path, name: &str, secs: u64) -> Track {
    let path = write_wav(&dir.join(name), 50);
    let mut t = TrackRecord::new(path);
    t.duration = Duration::from_secs(secs);
    Arc::new(t)
}

fn fixtures() -> (TempDir, Track, Track) {
    let dir = tempdir().unwrap();
    let a = wav_track(dir.path(), "a.wav", 10);
    let b = wav_track(dir.path(), "b.wav", 20);
    (dir, a, b)
}

fn kinds(rx: &Receiver<Event>) -> Vec<EventKind> {
    rx.try_iter().map(|e| e.kind()).collect()
}

fn wait_for(rx: &Receiver<Event>, kind: EventKind) -> Option<Event> {
    let deadline = Instant::now() + WAIT;
    while let Some(left) = deadline.checked_duration_since(Instant::now()) {
        match rx.recv_timeout(left) {
            Ok(e) if e.kind() == kind => return Some(e),
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
    None
}

#[test]
fn volume_is_clamped() {
    let (engine, _backend) = engine();
    engine.set_volume(1.5);
    assert_eq!(engine.volume(), 1.0);
    engine.set_volume(-0.2);
    assert_eq!(engine.volume(), 0.0);
    engine.set_volume(f32::NAN);
    assert_eq!(engine.volume(), 0.0);
    engine.set_volume(0.3);
    assert_eq!(engine.volume(), 0.3);
}

#[test]
fn volume_reaches_the_pipeline() {
    let (_dir, a, _b) = fixtures();
    let (engine, backend) = engine();
    assert!(engine.load(&a));
    assert_eq!(backend.last_pipeline().volume(), 0.5);

    engine.set_volume(0.8);
    assert_eq!(backend.last_pipeline().volume(), 0.8);
}

#[test]
fn loading_a_missing_file_changes_nothing() {
    let (engine, backend) = engine();
    let rx = engine.events().subscribe_all();
    let ghost: Track = Arc::new(TrackRecord::new("/definitely/not/here.mp3"));

    assert!(!engine.load(&ghost));
    assert!(engine.current_track().is_none());
    assert!(backend.opened().is_empty());
    assert!(rx.try_recv().is_err());
}

#[test]
fn load_resets_position_and_reports_the_track() {
    let (_dir, a, _b) = fixtures();
    let (engine, backend) = engine();
    backend.set_duration(Some(Duration::from_secs(7)));
    let rx = engine.subscribe(&[EventKind::TrackChanged]);

    assert!(engine.load(&a));
    assert_eq!(engine.current_track().as_deref(), Some(&*a));
    assert_eq!(engine.position(), Duration::ZERO);
    assert_eq!(engine.total_duration(), Duration::from_secs(7));
    assert_eq!(engine.state(), PlaybackState::Stopped);
    match rx.try_recv().unwrap() {
        Event::TrackChanged(Some(t)) => assert_eq!(t.path, a.path),
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn total_duration_falls_back_to_tagged_duration() {
    let (_dir, a, _b) = fixtures();
    let (engine, backend) = engine();
    backend.set_duration(None);
    assert!(engine.load(&a));
    assert_eq!(engine.total_duration(), Duration::from_secs(10));
}

#[test]
fn failed_open_keeps_the_previous_track() {
    let (_dir, a, b) = fixtures();
    let (engine, backend) = engine();
    assert!(engine.load(&a));
    engine.play();

    backend.fail_on(&b.path);
    assert!(!engine.load(&b));
    assert_eq!(engine.current_track().as_deref(), Some(&*a));
    assert_eq!(engine.state(), PlaybackState::Playing);
    assert!(!backend.last_pipeline().is_released());
    assert!(a.is_playing());
}

#[test]
fn new_load_releases_the_previous_pipeline() {
    let (_dir, a, b) = fixtures();
    let (engine, backend) = engine();
    assert!(engine.load(&a));
    engine.play();
    assert!(engine.load(&b));

    let pipelines = backend.pipelines();
    assert_eq!(pipelines.len(), 2);
    assert!(pipelines[0].is_released());
    assert!(!pipelines[1].is_released());
    assert!(!a.is_playing());
    assert_eq!(engine.state(), PlaybackState::Stopped);
}

#[test]
fn concurrent_load_is_rejected() {
    let (_dir, a, b) = fixtures();
    let (engine, backend) = engine();
    let rx = engine.subscribe(&[EventKind::TrackChanged]);
    let release = backend.hold_next_open();

    let first = {
        let engine = engine.clone();
        let a = a.clone();
        thread::spawn(move || engine.load(&a))
    };

    let deadline = Instant::now() + WAIT;
    while !engine.is_loading() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }
    assert!(engine.is_loading());
    assert_eq!(engine.state(), PlaybackState::Loading);
    assert!(!engine.load(&b));
    engine.play();

    release.send(()).unwrap();
    assert!(first.join().unwrap());

    assert_eq!(engine.current_track().as_deref(), Some(&*a));
    assert_eq!(backend.opened(), vec![a.path.clone()]);
    assert_eq!(backend.pipelines().len(), 1);
    assert_eq!(kinds(&rx), vec![EventKind::TrackChanged]);
}

#[test]
fn play_pause_stop_cycle() {
    let (_dir, a, _b) = fixtures();
    let (engine, backend) = engine();
    let rx = engine.subscribe(&[
        EventKind::PlaybackStarted,
        EventKind::PlaybackPaused,
        EventKind::PlaybackStopped,
    ]);

    // Nothing loaded yet.
    engine.play();
    engine.pause();
    engine.stop();
    assert!(kinds(&rx).is_empty());

    assert!(engine.load(&a));
    let ctl = backend.last_pipeline();

    engine.play();
    assert!(ctl.is_playing());
    assert!(a.is_playing() && !a.is_paused());
    engine.play();

    engine.pause();
    assert!(!ctl.is_playing());
    assert!(!a.is_playing() && a.is_paused());
    engine.pause();

    engine.toggle_play_pause();
    assert_eq!(engine.state(), PlaybackState::Playing);

    ctl.set_position(Duration::from_secs(3));
    engine.stop();
    assert_eq!(engine.state(), PlaybackState::Stopped);
    assert_eq!(engine.position(), Duration::ZERO);
    assert!(ctl.rewinds() >= 1);
    assert!(!a.is_playing() && !a.is_paused());

    assert_eq!(
        kinds(&rx),
        vec![
            EventKind::PlaybackStarted,
            EventKind::PlaybackPaused,
            EventKind::PlaybackStarted,
            EventKind::PlaybackStopped,
        ]
    );
}

#[test]
fn position_is_sampled_while_playing() {
    let (_dir, a, _b) = fixtures();
    let (engine, backend) = engine();
    let rx = engine.subscribe(&[EventKind::PositionChanged]);
    assert!(engine.load(&a));
    engine.play();
    backend.last_pipeline().set_position(Duration::from_secs(4));

    let deadline = Instant::now() + WAIT;
    let mut seen = None;
    while Instant::now() < deadline {
        if let Ok(Event::PositionChanged(p)) = rx.recv_timeout(WAIT) {
            if p == Duration::from_secs(4) {
                seen = Some(p);
                break;
            }
        }
    }
    assert_eq!(seen, Some(Duration::from_secs(4)));
    assert_eq!(engine.position(), Duration::from_secs(4));
}

#[test]
fn draining_near_the_end_is_song_ended() {
    let (_dir, a, _b) = fixtures();
    let (engine, backend) = engine();
    let rx = engine.subscribe(&[EventKind::SongEnded, EventKind::PlaybackStopped]);
    assert!(engine.load(&a));
    engine.play();
    backend.last_pipeline().drain_at(Duration::from_millis(9_500));

    match wait_for(&rx, EventKind::SongEnded) {
        Some(Event::SongEnded(ended)) => assert_eq!(ended, a),
        other => panic!("expected SongEnded, got {other:?}"),
    }
    assert_eq!(engine.state(), PlaybackState::Stopped);
    assert!(!a.is_playing());
    assert!(kinds(&rx).is_empty());
}

#[test]
fn draining_early_is_a_stop() {
    let (_dir, a, _b) = fixtures();
    let (engine, backend) = engine();
    let rx = engine.subscribe(&[EventKind::SongEnded, EventKind::PlaybackStopped]);
    assert!(engine.load(&a));
    engine.play();
    backend.last_pipeline().drain_at(Duration::from_secs(2));

    assert!(wait_for(&rx, EventKind::PlaybackStopped).is_some());
    assert_eq!(engine.state(), PlaybackState::Stopped);
}

#[test]
fn play_after_the_end_rewinds() {
    let (_dir, a, _b) = fixtures();
    let (engine, backend) = engine();
    let rx = engine.subscribe(&[EventKind::SongEnded]);
    assert!(engine.load(&a));
    engine.play();
    let ctl = backend.last_pipeline();
    ctl.drain_at(Duration::from_secs(10));
    assert!(wait_for(&rx, EventKind::SongEnded).is_some());

    let before = ctl.rewinds();
    engine.play();
    assert_eq!(ctl.rewinds(), before + 1);
    assert_eq!(engine.state(), PlaybackState::Playing);
    assert!(engine.position() < Duration::from_secs(1));
}

#[test]
fn seeking_a_drained_stream_is_ignored() {
    let (_dir, a, _b) = fixtures();
    let (engine, backend) = engine();
    let ended = engine.subscribe(&[EventKind::SongEnded]);
    assert!(engine.load(&a));
    engine.play();
    let ctl = backend.last_pipeline();
    ctl.drain_at(Duration::from_secs(10));
    assert!(wait_for(&ended, EventKind::SongEnded).is_some());

    let rx = engine.subscribe(&[EventKind::PositionChanged]);
    engine.set_position(Duration::from_secs(4));
    assert!(kinds(&rx).is_empty());
    assert_eq!(ctl.position(), Duration::from_secs(10));

    engine.play();
    assert_eq!(ctl.position(), Duration::ZERO);
    assert!(engine.position() < Duration::from_secs(1));
}

#[test]
fn events_follow_state_changes_across_threads() {
    let (_dir, a, _b) = fixtures();
    let (engine, _backend) = engine();
    let rx = engine.subscribe(&[EventKind::PlaybackStarted, EventKind::PlaybackPaused]);
    assert!(engine.load(&a));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    engine.toggle_play_pause();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let seen = kinds(&rx);
    assert!(!seen.is_empty());
    for pair in seen.windows(2) {
        assert_ne!(pair[0], pair[1], "out of order: {seen:?}");
    }
    let last_started = seen.last() == Some(&EventKind::PlaybackStarted);
    assert_eq!(last_started, engine.is_playing());
}

#[test]
fn seeking_is_clamped_to_the_track() {
    let (_dir, a, _b) = fixtures();
    let (engine, backend) = engine();
    let rx = engine.subscribe(&[EventKind::PositionChanged]);

    engine.set_position(Duration::from_secs(3));
    engine.set_position_percent(50.0);
    assert!(kinds(&rx).is_empty());

    backend.set_duration(None);
    assert!(engine.load(&a));
    let ctl = backend.last_pipeline();

    engine.set_position(Duration::from_secs(25));
    assert_eq!(engine.position(), Duration::from_secs(10));
    assert_eq!(ctl.position(), Duration::from_secs(10));

    engine.set_position_percent(50.0);
    assert_eq!(engine.position(), Duration::from_secs(5));
    engine.set_position_percent(150.0);
    assert_eq!(engine.position(), Duration::from_secs(10));
    engine.set_position_percent(-3.0);
    assert_eq!(engine.position(), Duration::ZERO);

    assert_eq!(kinds(&rx).len(), 4);
}

#[test]
fn shutdown_releases_everything_and_later_calls_do_nothing() {
    let (_dir, a, b) = fixtures();
    let (engine, backend) = engine();
    let rx = engine.events().subscribe_all();
    assert!(engine.load(&a));
    engine.play();
    let ctl = backend.last_pipeline();
    let _ = rx.try_iter().count();

    engine.shutdown();
    assert!(ctl.is_released());
    assert!(backend.is_shut_down());
    assert!(engine.is_disposed());
    assert_eq!(engine.state(), PlaybackState::Disposed);
    assert!(!a.is_playing());

    assert!(!engine.load(&b));
    engine.play();
    engine.stop();
    engine.set_volume(0.1);
    engine.shutdown();
    assert_eq!(engine.volume(), 0.5);
    assert!(rx.try_recv().is_err());
    assert_eq!(backend.opened(), vec![a.path.clone()]);
}
