#![allow(dead_code)]

use std::time::{Duration, Instant};

use gesture_map_control::{
    ControlConfig, FrameOutput, GestureController, HandFrame, Landmark,
    simulator::HandPose,
};

pub const FRAME: Duration = Duration::from_millis(33);

pub fn hand(pose: HandPose, tip: (f64, f64)) -> Vec<Landmark> {
    pose.landmarks_at(tip.0, tip.1)
}

/// Drives a controller with a synthetic clock.
pub struct Session {
    pub controller: GestureController,
    pub now: Instant,
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(ControlConfig::default())
    }

    pub fn with_config(config: ControlConfig) -> Self {
        Self {
            controller: GestureController::new(config),
            now: Instant::now(),
        }
    }

    pub fn advance(&mut self, by: Duration) -> Instant {
        self.now += by;
        self.now
    }

    pub fn frame(&mut self, hands: Vec<Vec<Landmark>>) -> FrameOutput {
        let ts = self.advance(FRAME);
        self.controller.process_frame(&HandFrame::new(hands, ts))
    }

    pub fn pose(&mut self, pose: HandPose, tip: (f64, f64)) -> FrameOutput {
        self.frame(vec![hand(pose, tip)])
    }

    /// Feeds the same pose `n` times and returns the last output.
    pub fn hold(&mut self, pose: HandPose, tip: (f64, f64), n: usize) -> FrameOutput {
        let mut last = None;
        for _ in 0..n {
            last = Some(self.pose(pose, tip));
        }
        last.expect("at least one frame")
    }
}
