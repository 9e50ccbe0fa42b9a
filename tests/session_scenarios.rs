//! End-to-end sessions over in-memory byte streams

use joykeys::injector::{InjectorCall, RecordingInjector};
use joykeys::input::{LogicalKey, Thresholds};
use joykeys::protocol::Frame;
use joykeys::session::{Session, SessionEnd, SessionError, SessionReport};
use joykeys::transport::{ReadSource, TransportError};
use std::io::{Cursor, ErrorKind, Read};
use tokio::sync::watch;

use InjectorCall::{Press, Release};
use LogicalKey::*;

fn run_bytes(bytes: Vec<u8>) -> (Result<SessionReport, SessionError>, RecordingInjector) {
    run_reader(Cursor::new(bytes))
}

fn run_reader<R: Read + Send + 'static>(
    reader: R,
) -> (Result<SessionReport, SessionError>, RecordingInjector) {
    let recorder = RecordingInjector::new();
    let result = Session::create(
        "scenario",
        Box::new(ReadSource::new(reader)),
        Box::new(recorder.clone()),
        Thresholds::default(),
    )
    .unwrap()
    .start()
    .run();
    (result, recorder)
}

fn wire(frames: &[(u8, i16)]) -> Vec<u8> {
    frames
        .iter()
        .flat_map(|(axis, value)| Frame::new(*axis, *value).to_wire())
        .collect()
}

/// Yields its bytes, then fails like an unplugged serial adapter
struct FailsAfter {
    bytes: Cursor<Vec<u8>>,
}

impl Read for FailsAfter {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.bytes.read(buf)? {
            0 => Err(ErrorKind::BrokenPipe.into()),
            n => Ok(n),
        }
    }
}

/// Yields its bytes, then raises the stop flag and times out forever
struct StopsAfter {
    bytes: Cursor<Vec<u8>>,
    stop: watch::Sender<bool>,
}

impl Read for StopsAfter {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.bytes.read(buf)? {
            0 => {
                self.stop.send_replace(true);
                Err(ErrorKind::TimedOut.into())
            }
            n => Ok(n),
        }
    }
}

#[test]
fn scenario_right_push() {
    let (result, recorder) = run_bytes(vec![0xFF, 0, 40, 0]);
    let report = result.unwrap();

    assert_eq!(report.frames, 1);
    assert_eq!(recorder.calls(), vec![Press(Right), Release(Right)]);
    assert_eq!(report.released_on_cleanup, vec![Right]);
}

#[test]
fn scenario_right_push_after_left_releases_left_first() {
    let mut bytes = wire(&[(0, -40)]);
    bytes.extend([0xFF, 0, 40, 0]);
    let (result, recorder) = run_bytes(bytes);
    result.unwrap();

    assert_eq!(
        recorder.calls(),
        vec![Press(Left), Release(Left), Press(Right), Release(Right)]
    );
}

#[test]
fn scenario_forward_from_negative_value() {
    let (result, recorder) = run_bytes(vec![0xFF, 1, 216, 255]);
    result.unwrap();

    // Back was never held, so only Forward moves; cleanup releases it at the end
    assert_eq!(recorder.calls(), vec![Press(Forward), Release(Forward)]);
}

#[test]
fn scenario_selector_pulse() {
    let (result, recorder) = run_bytes(vec![0xFF, 2, 1, 0]);
    let report = result.unwrap();

    assert_eq!(recorder.calls(), vec![Press(ActionR), Release(ActionR)]);
    assert!(report.released_on_cleanup.is_empty());
}

#[test]
fn scenario_truncated_stream() {
    let (result, recorder) = run_bytes(vec![0xFF, 0]);
    let report = result.unwrap();

    assert_eq!(report.end, SessionEnd::StreamClosed);
    assert_eq!(report.frames, 0);
    assert_eq!(report.short_frames, 1);
    assert!(report.released_on_cleanup.is_empty());
    assert!(recorder.calls().is_empty());
}

#[test]
fn resync_skips_leading_garbage() {
    let (result, recorder) = run_bytes(vec![0x01, 0xFF, 0, 40, 0]);
    let report = result.unwrap();

    assert_eq!(report.frames, 1);
    assert_eq!(report.skipped_bytes, 1);
    assert_eq!(recorder.presses(Right), 1);
}

#[test]
fn repeated_frames_press_once() {
    let (result, recorder) = run_bytes(wire(&[(0, 40), (0, 40), (0, 900), (1, -40), (1, -40)]));
    let report = result.unwrap();

    assert_eq!(report.frames, 5);
    assert_eq!(report.transitions, 2);
    assert_eq!(recorder.presses(Right), 1);
    assert_eq!(recorder.presses(Forward), 1);
    assert_eq!(report.released_on_cleanup, vec![Right, Forward]);
}

#[test]
fn discrete_events_fire_every_time() {
    let (result, recorder) = run_bytes(wire(&[(3, 0), (3, 0), (2, 0), (2, 0), (2, 2), (2, 7)]));
    result.unwrap();

    assert_eq!(recorder.presses(ActionE), 2);
    assert_eq!(recorder.releases(ActionE), 2);
    assert_eq!(recorder.presses(ActionF), 2);
    assert_eq!(recorder.presses(ActionT), 1);
    assert!(recorder.currently_down().is_empty());
}

#[test]
fn unknown_axes_do_nothing() {
    let (result, recorder) = run_bytes(wire(&[(4, 40), (9, -40), (255, 1)]));
    let report = result.unwrap();

    assert_eq!(report.frames, 3);
    assert!(recorder.calls().is_empty());
}

#[test]
fn every_press_has_a_matching_release() {
    let (result, recorder) = run_bytes(wire(&[
        (0, 40),
        (1, 40),
        (0, -40),
        (2, 1),
        (1, -40),
        (3, 5),
        (0, 0),
        (1, 100),
    ]));
    result.unwrap();

    for key in LogicalKey::ALL {
        assert_eq!(recorder.presses(key), recorder.releases(key), "{key}");
    }
    assert!(recorder.currently_down().is_empty());
}

#[test]
fn opposing_keys_never_down_together() {
    let (result, recorder) = run_bytes(wire(&[
        (0, 40),
        (0, -40),
        (0, 40),
        (1, 40),
        (1, -40),
        (1, 40),
    ]));
    result.unwrap();

    let mut down = std::collections::HashSet::new();
    for call in recorder.calls() {
        match call {
            Press(key) => {
                down.insert(key);
            }
            Release(key) => {
                down.remove(&key);
            }
        }
        assert!(!(down.contains(&Left) && down.contains(&Right)));
        assert!(!(down.contains(&Forward) && down.contains(&Back)));
    }
}

#[test]
fn transport_error_releases_before_propagating() {
    let bytes = wire(&[(0, 40), (1, -40)]);
    let (result, recorder) = run_reader(FailsAfter {
        bytes: Cursor::new(bytes),
    });

    assert!(matches!(
        result,
        Err(SessionError::Transport(TransportError::Io(_)))
    ));
    assert_eq!(
        recorder.calls(),
        vec![Press(Right), Press(Forward), Release(Right), Release(Forward)]
    );
}

#[test]
fn injector_error_releases_before_propagating() {
    let recorder = RecordingInjector::new();
    recorder.fail_on(Press(ActionE));

    let result = Session::create(
        "failing-injector",
        Box::new(ReadSource::new(Cursor::new(wire(&[(1, 40), (3, 0), (0, 40)])))),
        Box::new(recorder.clone()),
        Thresholds::default(),
    )
    .unwrap()
    .start()
    .run();

    assert!(matches!(result, Err(SessionError::Injector(_))));
    // The frame after the failure is never applied
    assert_eq!(recorder.presses(Right), 0);
    assert_eq!(recorder.releases(Back), 1);
    // The failed press never counted as held, so cleanup leaves it alone
    assert_eq!(recorder.releases(ActionE), 0);
}

#[test]
fn stop_request_releases_held_keys() {
    let recorder = RecordingInjector::new();
    let (stop_tx, stop_rx) = watch::channel(false);
    let reader = StopsAfter {
        bytes: Cursor::new(wire(&[(0, -40), (1, 40)])),
        stop: stop_tx,
    };

    let report = Session::create(
        "stopped",
        Box::new(ReadSource::new(reader)),
        Box::new(recorder.clone()),
        Thresholds::default(),
    )
    .unwrap()
    .start()
    .run_until_stopped(stop_rx)
    .unwrap();

    assert_eq!(report.end, SessionEnd::Stopped);
    assert_eq!(report.frames, 2);
    assert_eq!(report.released_on_cleanup, vec![Left, Back]);
    assert!(recorder.currently_down().is_empty());
}

#[test]
fn wider_dead_zone_from_thresholds() {
    let recorder = RecordingInjector::new();
    let report = Session::create(
        "wide",
        Box::new(ReadSource::new(Cursor::new(wire(&[(0, 40), (0, 80), (0, 81)])))),
        Box::new(recorder.clone()),
        Thresholds::new(-80, 80),
    )
    .unwrap()
    .start()
    .run()
    .unwrap();

    assert_eq!(report.transitions, 1);
    assert_eq!(recorder.calls(), vec![Press(Right), Release(Right)]);
}
