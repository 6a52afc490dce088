mod common;

use std::{
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use anyhow::{Result, bail};
use gesture_map_control::{
    ControlConfig, ControlMode, HandFrame, MapCommand,
    pipeline::{MapActuator, start_controller},
    simulator::{HandPose, Script, Segment, start_simulated_source},
};

#[derive(Clone, Default)]
struct Recording {
    commands: Arc<Mutex<Vec<MapCommand>>>,
}

impl MapActuator for Recording {
    fn apply(&mut self, command: MapCommand) -> Result<()> {
        self.commands.lock().unwrap().push(command);
        Ok(())
    }
}

struct Refusing;

impl MapActuator for Refusing {
    fn apply(&mut self, _command: MapCommand) -> Result<()> {
        bail!("map not loaded")
    }
}

#[test]
fn pointing_hand_pans_the_map() {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let recording = Recording::default();
    let session = start_controller(ControlConfig::default(), rx, recording.clone()).unwrap();

    for _ in 0..10 {
        let frame = HandFrame::new(
            vec![common::hand(HandPose::PointingUp, (0.9, 0.5))],
            Instant::now(),
        );
        tx.send(frame).unwrap();
        thread::sleep(common::FRAME);
    }
    session.stop();

    let commands = recording.commands.lock().unwrap();
    assert!(!commands.is_empty());
    assert!(commands.iter().all(|c| matches!(c, MapCommand::PanBy { dx, .. } if *dx > 0.0)));
}

#[test]
fn status_reports_newest_frame_when_read_late() {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let session = start_controller(ControlConfig::default(), rx, Recording::default()).unwrap();

    tx.send(HandFrame::empty(Instant::now())).unwrap();
    thread::sleep(common::FRAME);
    for _ in 0..6 {
        let frame = HandFrame::new(
            vec![common::hand(HandPose::Pinch, (0.5, 0.75))],
            Instant::now(),
        );
        tx.send(frame).unwrap();
        thread::sleep(common::FRAME);
    }

    let output = session
        .outputs()
        .recv_timeout(Duration::from_millis(500))
        .unwrap();
    assert_eq!(output.mode, ControlMode::ZoomOut);
    assert_eq!(output.hands_tracked, 1);
}

#[test]
fn simulated_source_drives_session() {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let recording = Recording::default();
    let session = start_controller(ControlConfig::default(), rx, recording.clone()).unwrap();

    let script = Script::new(vec![Segment::hold(
        HandPose::Spread,
        (0.8, 0.3),
        Duration::from_millis(400),
    )]);
    let source = start_simulated_source(script, 30, tx).unwrap();
    source.wait();
    session.stop();

    let commands = recording.commands.lock().unwrap();
    assert!(!commands.is_empty());
    assert!(
        commands
            .iter()
            .all(|c| matches!(c, MapCommand::ZoomBy { delta } if *delta > 0.0))
    );
}

#[test]
fn actuator_errors_do_not_stop_the_session() {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let session = start_controller(ControlConfig::default(), rx, Refusing).unwrap();

    for _ in 0..5 {
        let frame = HandFrame::new(
            vec![common::hand(HandPose::PointingUp, (0.9, 0.5))],
            Instant::now(),
        );
        tx.send(frame).unwrap();
        thread::sleep(common::FRAME);
    }
    assert!(session.stop().is_some());
}
