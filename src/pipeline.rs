use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, TrySendError, select};

use crate::{
    config::ControlConfig,
    controller::GestureController,
    types::{FrameOutput, HandFrame, MapCommand},
};

/// The external map. Commands are meant to be applied with no animation.
pub trait MapActuator: Send + 'static {
    fn apply(&mut self, command: MapCommand) -> Result<()>;
}

/// Running session thread. Stopping (or dropping) ends the loop at the next
/// frame or tick boundary.
#[derive(Debug)]
pub struct ControllerHandle<A> {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<A>>,
    outputs: Receiver<FrameOutput>,
}

impl<A> ControllerHandle<A> {
    /// Latest per-frame status, for displays. Older entries are dropped when
    /// nobody reads them.
    pub fn outputs(&self) -> &Receiver<FrameOutput> {
        &self.outputs
    }

    /// Stops the session and hands the actuator back.
    pub fn stop(mut self) -> Option<A> {
        self.stop.store(true, Ordering::SeqCst);
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(actuator) => Some(actuator),
            Err(_) => {
                log::error!("gesture session thread panicked");
                None
            }
        }
    }
}

impl<A> Drop for ControllerHandle<A> {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Spawns the session thread. It owns the [`GestureController`], so frames and
/// ticks are handled strictly one at a time.
pub fn start_controller<A: MapActuator>(
    config: ControlConfig,
    frame_rx: Receiver<HandFrame>,
    actuator: A,
) -> Result<ControllerHandle<A>> {
    config.validate().context("refusing to start gesture session")?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    let (output_tx, output_rx) = crossbeam_channel::bounded(1);
    let output_evict = output_rx.clone();

    let handle = thread::Builder::new()
        .name("gesture-session".into())
        .spawn(move || {
            log::info!(
                "gesture session started (debounce {} frames, tick {:?})",
                config.debounce_frames,
                config.tick_interval
            );
            let controller = GestureController::new(config);
            let outputs = StatusSlot {
                tx: output_tx,
                rx: output_evict,
            };
            let actuator = run_session_loop(controller, frame_rx, outputs, actuator, &stop_flag);
            log::info!("gesture session stopped");
            actuator
        })
        .context("failed to spawn gesture session thread")?;

    Ok(ControllerHandle {
        stop,
        handle: Some(handle),
        outputs: output_rx,
    })
}

fn run_session_loop<A: MapActuator>(
    mut controller: GestureController,
    frame_rx: Receiver<HandFrame>,
    outputs: StatusSlot,
    mut actuator: A,
    stop: &AtomicBool,
) -> A {
    let ticker = crossbeam_channel::tick(controller.config().tick_interval);

    while !stop.load(Ordering::Relaxed) {
        select! {
            recv(frame_rx) -> msg => {
                let Ok(frame) = msg else {
                    log::info!("frame source closed");
                    break;
                };
                let frame = latest_frame(frame, &frame_rx);
                let output = controller.process_frame(&frame);
                outputs.publish(output);
            }
            recv(ticker) -> msg => {
                let Ok(now) = msg else {
                    break;
                };
                if let Some(command) = controller.tick(now) {
                    if let Err(err) = actuator.apply(command) {
                        log::warn!("map actuator rejected {command:?}: {err:?}");
                    }
                }
            }
        }
    }

    actuator
}

/// Single-entry status channel that always holds the newest output.
struct StatusSlot {
    tx: Sender<FrameOutput>,
    rx: Receiver<FrameOutput>,
}

impl StatusSlot {
    fn publish(&self, output: FrameOutput) {
        if let Err(TrySendError::Full(output)) = self.tx.try_send(output) {
            // Evict the unread entry so readers never see a stale frame.
            let _ = self.rx.try_recv();
            let _ = self.tx.try_send(output);
        }
    }
}

/// Skips frames that queued up while the previous one was processed.
fn latest_frame(mut frame: HandFrame, frame_rx: &Receiver<HandFrame>) -> HandFrame {
    while let Ok(newer) = frame_rx.try_recv() {
        frame = newer;
    }
    frame
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::types::ControlMode;

    #[derive(Default)]
    struct Counting {
        applied: usize,
    }

    impl MapActuator for Counting {
        fn apply(&mut self, _command: MapCommand) -> Result<()> {
            self.applied += 1;
            Ok(())
        }
    }

    #[test]
    fn invalid_config_fails_fast() {
        let mut config = ControlConfig::default();
        config.debounce_frames = 0;
        let (_tx, rx) = crossbeam_channel::bounded(1);
        assert!(start_controller(config, rx, Counting::default()).is_err());
    }

    #[test]
    fn closing_the_source_ends_the_session() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let handle = start_controller(ControlConfig::default(), rx, Counting::default()).unwrap();
        tx.send(HandFrame::empty(Instant::now())).unwrap();
        drop(tx);
        thread::sleep(Duration::from_millis(50));
        let actuator = handle.stop().unwrap();
        assert_eq!(actuator.applied, 0);
    }

    #[test]
    fn queued_frames_collapse_to_newest() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let t0 = Instant::now();
        for i in 0..4 {
            tx.send(HandFrame::empty(t0 + Duration::from_millis(i))).unwrap();
        }
        let first = rx.recv().unwrap();
        let newest = latest_frame(first, &rx);
        assert_eq!(newest.timestamp, t0 + Duration::from_millis(3));
    }

    fn status(mode: ControlMode) -> FrameOutput {
        FrameOutput {
            mode,
            raw_mode: mode,
            pan: None,
            zoom: None,
            pinch_distance: None,
            hands_tracked: 0,
            fireworks_active: false,
        }
    }

    #[test]
    fn unread_status_is_replaced_by_newer() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let slot = StatusSlot { tx, rx: rx.clone() };
        slot.publish(status(ControlMode::Idle));
        slot.publish(status(ControlMode::Panning));
        slot.publish(status(ControlMode::ZoomOut));

        assert_eq!(rx.try_recv().unwrap().mode, ControlMode::ZoomOut);
        assert!(rx.try_recv().is_err());
    }
}
