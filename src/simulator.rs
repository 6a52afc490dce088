//! Scripted synthetic hand source, standing in for the camera and vision model.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, ensure};
use crossbeam_channel::Sender;

use crate::types::{HAND_LANDMARKS, HandFrame, Landmark, joint};

/// Hand shapes the simulator can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandPose {
    /// Index up, thumb tucked, other fingers folded.
    PointingUp,
    /// Thumb and curled index tips touching.
    Pinch,
    /// Thumb spread wide from a raised index.
    Spread,
    OpenPalm,
}

// Offsets from the wrist for a hand whose wrist to middle-MCP length is 0.2.
const POINTING_UP: [(f64, f64); HAND_LANDMARKS] = [
    (0.0, 0.0),
    (-0.05, -0.04),
    (-0.08, -0.08),
    (-0.06, -0.12),
    (-0.03, -0.20),
    (-0.04, -0.19),
    (-0.04, -0.28),
    (-0.04, -0.33),
    (-0.04, -0.38),
    (0.0, -0.20),
    (0.0, -0.24),
    (0.0, -0.20),
    (0.0, -0.16),
    (0.04, -0.19),
    (0.04, -0.22),
    (0.04, -0.18),
    (0.04, -0.14),
    (0.08, -0.17),
    (0.08, -0.19),
    (0.08, -0.16),
    (0.06, -0.12),
];

impl HandPose {
    fn offsets(&self) -> [(f64, f64); HAND_LANDMARKS] {
        let mut p = POINTING_UP;
        match self {
            HandPose::PointingUp => {}
            HandPose::Pinch => {
                p[joint::THUMB_IP] = (-0.10, -0.13);
                p[joint::THUMB_TIP] = (-0.12, -0.17);
                p[joint::INDEX_PIP] = (-0.06, -0.26);
                p[joint::INDEX_DIP] = (-0.09, -0.22);
                p[joint::INDEX_TIP] = (-0.12, -0.17);
            }
            HandPose::Spread => {
                p[joint::THUMB_IP] = (-0.15, -0.09);
                p[joint::THUMB_TIP] = (-0.22, -0.10);
            }
            HandPose::OpenPalm => {
                p[joint::THUMB_TIP] = (-0.20, -0.12);
                p[joint::MIDDLE_PIP] = (0.0, -0.28);
                p[joint::MIDDLE_DIP] = (0.0, -0.34);
                p[joint::MIDDLE_TIP] = (0.0, -0.40);
                p[joint::RING_PIP] = (0.04, -0.26);
                p[joint::RING_DIP] = (0.04, -0.31);
                p[joint::RING_TIP] = (0.04, -0.36);
                p[joint::PINKY_PIP] = (0.09, -0.22);
                p[joint::PINKY_DIP] = (0.10, -0.26);
                p[joint::PINKY_TIP] = (0.11, -0.30);
            }
        }
        p
    }

    /// Skeleton translated so the index fingertip lands on `(tip_x, tip_y)`.
    pub fn landmarks_at(&self, tip_x: f64, tip_y: f64) -> Vec<Landmark> {
        let offsets = self.offsets();
        let (ox, oy) = offsets[joint::INDEX_TIP];
        offsets
            .iter()
            .map(|&(x, y)| Landmark::with_z(tip_x - ox + x, tip_y - oy + y, 0.0))
            .collect()
    }
}

/// One stretch of the script: a pose whose fingertip glides from `from` to `to`.
#[derive(Clone, Debug)]
pub struct Segment {
    pub pose: Option<HandPose>,
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub duration: Duration,
    pub category: Option<&'static str>,
}

impl Segment {
    pub fn hold(pose: HandPose, at: (f64, f64), duration: Duration) -> Self {
        Self::glide(pose, at, at, duration)
    }

    pub fn glide(pose: HandPose, from: (f64, f64), to: (f64, f64), duration: Duration) -> Self {
        Self {
            pose: Some(pose),
            from,
            to,
            duration,
            category: None,
        }
    }

    pub fn no_hand(duration: Duration) -> Self {
        Self {
            pose: None,
            from: (0.5, 0.5),
            to: (0.5, 0.5),
            duration,
            category: None,
        }
    }

    pub fn labeled(mut self, category: &'static str) -> Self {
        self.category = Some(category);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct Script {
    segments: Vec<Segment>,
    jitter: f64,
}

impl Script {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            jitter: 0.0,
        }
    }

    /// Adds deterministic per-landmark wobble of the given amplitude.
    pub fn with_jitter(mut self, amplitude: f64) -> Self {
        self.jitter = amplitude;
        self
    }

    /// Point right, flick back, pinch, spread, celebrate, then lose the hand.
    pub fn demo() -> Self {
        let ms = Duration::from_millis;
        Self::new(vec![
            Segment::no_hand(ms(300)),
            Segment::hold(HandPose::PointingUp, (0.5, 0.5), ms(400)),
            Segment::glide(HandPose::PointingUp, (0.5, 0.5), (0.85, 0.5), ms(1_200)),
            Segment::glide(HandPose::PointingUp, (0.85, 0.5), (0.35, 0.45), ms(120)),
            Segment::no_hand(ms(1_000)),
            Segment::hold(HandPose::Pinch, (0.5, 0.75), ms(1_200)),
            Segment::hold(HandPose::Spread, (0.8, 0.3), ms(1_200)),
            Segment::hold(HandPose::OpenPalm, (0.5, 0.4), ms(600)).labeled("Open_Palm"),
            Segment::no_hand(ms(500)),
        ])
        .with_jitter(0.002)
    }

    pub fn duration(&self) -> Duration {
        self.segments.iter().map(|s| s.duration).sum()
    }

    /// Frame content at `elapsed` into the script, or `None` past its end.
    pub fn sample(&self, elapsed: Duration, seq: u64, timestamp: Instant) -> Option<HandFrame> {
        let mut start = Duration::ZERO;
        for segment in &self.segments {
            let end = start + segment.duration;
            if elapsed < end {
                let t = if segment.duration.is_zero() {
                    1.0
                } else {
                    (elapsed - start).as_secs_f64() / segment.duration.as_secs_f64()
                };
                return Some(self.render(segment, t, seq, timestamp));
            }
            start = end;
        }
        None
    }

    fn render(&self, segment: &Segment, t: f64, seq: u64, timestamp: Instant) -> HandFrame {
        let Some(pose) = segment.pose else {
            return HandFrame::empty(timestamp);
        };
        let x = segment.from.0 + (segment.to.0 - segment.from.0) * t;
        let y = segment.from.1 + (segment.to.1 - segment.from.1) * t;
        let mut hand = pose.landmarks_at(x, y);
        if self.jitter > 0.0 {
            for (idx, lm) in hand.iter_mut().enumerate() {
                let phase = seq as f64 * 1.7 + idx as f64 * 0.9;
                lm.x += self.jitter * phase.sin();
                lm.y += self.jitter * (phase * 1.3).cos();
            }
        }

        let frame = HandFrame::new(vec![hand], timestamp);
        match segment.category {
            Some(label) => frame.with_categories(vec![vec![label.to_string()]]),
            None => frame,
        }
    }
}

/// Handle for the simulator thread, stopped on drop like a camera stream.
#[derive(Debug)]
pub struct SourceStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SourceStream {
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Blocks until the script has played out.
    pub fn wait(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SourceStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Plays `script` at `fps`, dropping frames when the session is still busy.
pub fn start_simulated_source(
    script: Script,
    fps: u32,
    frame_tx: Sender<HandFrame>,
) -> Result<SourceStream> {
    ensure!(fps > 0, "simulator frame rate must be positive");
    let interval = Duration::from_secs(1) / fps;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::Builder::new()
        .name("hand-simulator".into())
        .spawn(move || {
            let started = Instant::now();
            let mut seq = 0u64;
            while !stop_flag.load(Ordering::Relaxed) {
                let now = Instant::now();
                let Some(frame) = script.sample(now - started, seq, now) else {
                    log::info!("simulated script finished after {seq} frames");
                    break;
                };
                // Drop if the session is busy, otherwise forward every frame.
                let _ = frame_tx.try_send(frame);
                seq += 1;
                thread::sleep(interval);
            }
        })
        .context("failed to spawn hand simulator thread")?;

    Ok(SourceStream {
        stop,
        handle: Some(handle),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pose_is_anchored_at_fingertip() {
        let hand = HandPose::Pinch.landmarks_at(0.3, 0.6);
        assert_eq!(hand.len(), HAND_LANDMARKS);
        let tip = hand[joint::INDEX_TIP];
        assert!((tip.x - 0.3).abs() < 1e-12);
        assert!((tip.y - 0.6).abs() < 1e-12);
    }

    #[test]
    fn sample_follows_segments() {
        let ms = Duration::from_millis;
        let script = Script::new(vec![
            Segment::no_hand(ms(100)),
            Segment::glide(HandPose::PointingUp, (0.2, 0.5), (0.6, 0.5), ms(100)),
        ]);
        let now = Instant::now();

        assert!(script.sample(ms(50), 0, now).unwrap().hands.is_empty());

        let mid = script.sample(ms(150), 1, now).unwrap();
        let tip = mid.hands[0][joint::INDEX_TIP];
        assert!((tip.x - 0.4).abs() < 1e-9);

        assert!(script.sample(ms(200), 2, now).is_none());
        assert_eq!(script.duration(), ms(200));
    }

    #[test]
    fn labels_are_attached() {
        let script = Script::new(vec![
            Segment::hold(HandPose::OpenPalm, (0.5, 0.4), Duration::from_millis(10))
                .labeled("Open_Palm"),
        ]);
        let frame = script.sample(Duration::ZERO, 0, Instant::now()).unwrap();
        assert_eq!(frame.top_category(0), Some("Open_Palm"));
    }

    #[test]
    fn zero_fps_is_rejected() {
        let (tx, _rx) = crossbeam_channel::bounded(1);
        assert!(start_simulated_source(Script::demo(), 0, tx).is_err());
    }
}
