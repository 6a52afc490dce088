use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::bounded;
use gesture_map_control::{
    ControlConfig, MapCommand,
    pipeline::{self, MapActuator},
    simulator::{self, Script},
};

const DEMO_FPS: u32 = 30;

/// Stands in for the map: accumulates the viewport offset and zoom level.
#[derive(Debug, Default)]
struct LoggingActuator {
    offset: (f64, f64),
    zoom: f64,
    commands: usize,
}

impl MapActuator for LoggingActuator {
    fn apply(&mut self, command: MapCommand) -> Result<()> {
        match command {
            MapCommand::PanBy { dx, dy } => {
                self.offset.0 += dx;
                self.offset.1 += dy;
            }
            MapCommand::ZoomBy { delta } => self.zoom += delta,
        }
        self.commands += 1;
        log::debug!("{command:?}");
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = ControlConfig::from_env().context("invalid GESTURE_MAP_* configuration")?;
    let (frame_tx, frame_rx) = bounded(1);

    let session = pipeline::start_controller(config, frame_rx, LoggingActuator::default())?;
    let script = Script::demo();
    log::info!("playing {:?} of simulated hand input", script.duration());
    let source = simulator::start_simulated_source(script, DEMO_FPS, frame_tx.clone())?;
    source.wait();

    // Keep the source open so flick momentum can settle before the read-back.
    std::thread::sleep(Duration::from_millis(500));
    drop(frame_tx);
    if let Some(map) = session.stop() {
        log::info!(
            "{} map commands, viewport offset ({:.0}, {:.0}) px, zoom {:+.2}",
            map.commands,
            map.offset.0,
            map.offset.1,
            map.zoom
        );
    }

    Ok(())
}
