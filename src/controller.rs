use std::time::Instant;

use crate::{
    config::ControlConfig,
    control::{ModeStateMachine, RuleInput, detect_raw_mode},
    fireworks::FireworksTimer,
    geometry::distance,
    gesture::GestureClassifier,
    momentum::FlickIntegrator,
    smoothing::{EmaSmoother, HandSmoothers, MAX_HANDS},
    types::{
        ControlMode, FrameOutput, GestureCategory, Hand, HandFrame, MapCommand, PanVector,
        ZoomVector, joint,
    },
    vector::{DeadZone, pan_vector, zoom_vector},
};

/// One tracking session: smoothing, classification, debounced mode, vectors
/// and flick momentum.
///
/// The session owns all of its state. Callers must not process two frames
/// concurrently; [`GestureController::process_frame`] and
/// [`GestureController::tick`] take `&mut self` for that reason.
pub struct GestureController {
    config: ControlConfig,
    dead_zone: DeadZone,
    classifier: GestureClassifier,
    smoothers: HandSmoothers,
    pinch_smoother: EmaSmoother,
    modes: ModeStateMachine,
    flick: FlickIntegrator,
    fireworks: FireworksTimer,
    pan: Option<PanVector>,
    zoom: Option<ZoomVector>,
    primary_slot: Option<usize>,
    last_tick: Option<Instant>,
}

impl GestureController {
    pub fn new(config: ControlConfig) -> Self {
        Self {
            dead_zone: DeadZone::from(config.dead_zone),
            classifier: GestureClassifier::new(config.thresholds),
            smoothers: HandSmoothers::new(config.smoothing.landmark_alpha),
            pinch_smoother: EmaSmoother::new(config.smoothing.pinch_alpha),
            modes: ModeStateMachine::new(config.debounce_frames),
            flick: FlickIntegrator::new(config.flick, config.viewport),
            fireworks: FireworksTimer::new(config.fireworks_duration),
            pan: None,
            zoom: None,
            primary_slot: None,
            last_tick: None,
            config,
        }
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    pub fn mode(&self) -> ControlMode {
        self.modes.current()
    }

    pub fn flick(&self) -> &FlickIntegrator {
        &self.flick
    }

    pub fn process_frame(&mut self, frame: &HandFrame) -> FrameOutput {
        let now = frame.timestamp;
        self.fireworks.update(now);

        let mut present = [false; MAX_HANDS];
        let mut primary: Option<(usize, Hand)> = None;
        let mut tracked = 0;
        for (slot, raw) in frame.hands.iter().enumerate() {
            let Some(hand) = Hand::from_landmarks(raw) else {
                log::debug!("dropping malformed hand {slot} ({} landmarks)", raw.len());
                continue;
            };
            if let Some(flag) = present.get_mut(slot) {
                *flag = true;
            }
            let smoothed = self.smoothers.smooth_hand(slot, &hand);
            tracked += 1;
            if primary.is_none() {
                primary = Some((slot, smoothed));
            }
        }
        self.smoothers.release_missing(present);

        let Some((slot, hand)) = primary else {
            return self.lose_tracking(now);
        };

        if self.primary_slot.replace(slot) != Some(slot) {
            // Pinch history belongs to the previous primary hand.
            log::debug!("primary hand moved to slot {slot}");
            self.pinch_smoother.reset();
        }

        let category = frame.top_category(slot).map(GestureCategory::from_label);
        let flags = self.classifier.classify(hand.landmarks());
        let raw_mode = detect_raw_mode(&RuleInput { category, flags });
        if let Some(committed) = self.modes.observe(raw_mode) {
            self.enter_mode(committed, now);
        }

        let pinch = distance(
            Some(hand.landmark(joint::THUMB_TIP)),
            Some(hand.landmark(joint::INDEX_TIP)),
        );
        let pinch_distance = self.pinch_smoother.smooth(pinch);

        self.update_vectors(&hand, now);

        FrameOutput {
            mode: self.modes.current(),
            raw_mode,
            pan: self.pan,
            zoom: self.zoom,
            pinch_distance: Some(pinch_distance),
            hands_tracked: tracked,
            fireworks_active: self.fireworks.is_running(now),
        }
    }

    /// Advances one animation tick and returns at most one map command.
    /// Momentum wins over live gestures while it lasts.
    pub fn tick(&mut self, now: Instant) -> Option<MapCommand> {
        let dt = match self.last_tick.replace(now) {
            Some(prev) => now.saturating_duration_since(prev),
            None => self.config.tick_interval,
        }
        .as_secs_f64();
        self.fireworks.update(now);

        if let Some((dx, dy)) = self.flick.tick(now) {
            return Some(MapCommand::PanBy { dx, dy });
        }

        match self.modes.current() {
            ControlMode::Panning => {
                let pan = self.pan.filter(|p| !p.in_dead_zone)?;
                if self.flick.in_cooldown(now) {
                    return None;
                }
                let step = pan.speed * self.config.pan.base_speed_px_per_sec * dt;
                Some(MapCommand::PanBy {
                    dx: pan.x * step,
                    dy: pan.y * step,
                })
            }
            ControlMode::ZoomIn | ControlMode::ZoomOut => {
                let zoom = self.zoom.filter(|z| !z.in_dead_zone)?;
                let rate = (zoom.speed * self.config.zoom.speed_multiplier)
                    .min(self.config.zoom.max_speed);
                Some(MapCommand::ZoomBy {
                    delta: zoom.direction.sign() * rate * dt,
                })
            }
            ControlMode::Idle | ControlMode::Fireworks => None,
        }
    }

    /// Drops all session state, as when tracking restarts.
    pub fn reset(&mut self) {
        log::debug!("resetting gesture session");
        self.smoothers.reset();
        self.pinch_smoother.reset();
        self.modes.reset();
        self.flick.reset();
        self.fireworks.reset();
        self.pan = None;
        self.zoom = None;
        self.primary_slot = None;
        self.last_tick = None;
    }

    fn lose_tracking(&mut self, now: Instant) -> FrameOutput {
        self.modes.force_idle();
        self.pinch_smoother.reset();
        self.primary_slot = None;
        self.flick.clear_anchor();
        self.pan = None;
        self.zoom = None;

        FrameOutput {
            mode: ControlMode::Idle,
            raw_mode: ControlMode::Idle,
            pan: None,
            zoom: None,
            pinch_distance: None,
            hands_tracked: 0,
            fireworks_active: self.fireworks.is_running(now),
        }
    }

    fn enter_mode(&mut self, mode: ControlMode, now: Instant) {
        self.flick.clear_anchor();
        match mode {
            ControlMode::Fireworks => {
                self.fireworks.trigger(now);
            }
            ControlMode::ZoomIn | ControlMode::ZoomOut => self.flick.cancel(),
            ControlMode::Idle | ControlMode::Panning => {}
        }
    }

    fn update_vectors(&mut self, hand: &Hand, now: Instant) {
        self.pan = None;
        self.zoom = None;
        let mode = self.modes.current();

        if let Some(direction) = mode.zoom_direction() {
            self.zoom = Some(zoom_vector(
                hand.landmarks(),
                direction,
                &self.dead_zone,
                &self.config.pan,
            ));
            self.flick.clear_anchor();
            return;
        }
        if mode != ControlMode::Panning {
            self.flick.clear_anchor();
            return;
        }

        let pan = pan_vector(hand.landmarks(), &self.dead_zone, &self.config.pan);
        self.pan = Some(pan);
        if pan.in_dead_zone {
            self.flick.clear_anchor();
        } else if !self.flick.in_cooldown(now) {
            self.flick.cancel();
            self.flick.track(hand.index_tip(), now);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::types::{HAND_LANDMARKS, Landmark};

    fn flat_hand(x: f64, y: f64) -> Vec<Landmark> {
        vec![Landmark::new(x, y); HAND_LANDMARKS]
    }

    #[test]
    fn label_drives_mode_after_debounce() {
        let mut c = GestureController::new(ControlConfig::default());
        let t0 = Instant::now();
        for i in 0..3 {
            let ts = t0 + Duration::from_millis(i * 33);
            let frame = HandFrame::new(vec![flat_hand(0.5, 0.5)], ts)
                .with_categories(vec![vec!["Open_Palm".into()]]);
            let out = c.process_frame(&frame);
            assert_eq!(out.raw_mode, ControlMode::Fireworks);
        }
        assert_eq!(c.mode(), ControlMode::Fireworks);
    }

    #[test]
    fn fireworks_report_running_window() {
        let mut c = GestureController::new(ControlConfig::default());
        let t0 = Instant::now();
        let mut last = None;
        for i in 0..3 {
            let ts = t0 + Duration::from_millis(i);
            let frame = HandFrame::new(vec![flat_hand(0.5, 0.5)], ts)
                .with_categories(vec![vec!["Open_Palm".into()]]);
            last = Some(c.process_frame(&frame));
        }
        assert!(last.unwrap().fireworks_active);
        let out = c.process_frame(&HandFrame::empty(t0 + Duration::from_secs(6)));
        assert!(!out.fireworks_active);
    }

    #[test]
    fn short_hand_is_ignored_and_second_hand_takes_over() {
        let mut c = GestureController::new(ControlConfig::default());
        let frame = HandFrame::new(
            vec![vec![Landmark::new(0.5, 0.5); 7], flat_hand(0.3, 0.3)],
            Instant::now(),
        )
        .with_categories(vec![vec!["Open_Palm".into()], vec!["Closed_Fist".into()]]);
        let out = c.process_frame(&frame);
        assert_eq!(out.hands_tracked, 1);
        assert_eq!(out.raw_mode, ControlMode::Idle);
    }

    #[test]
    fn pinch_history_restarts_when_primary_slot_changes() {
        let mut c = GestureController::new(ControlConfig::default());
        let t0 = Instant::now();
        let touching = flat_hand(0.5, 0.5);
        let mut apart = flat_hand(0.5, 0.5);
        apart[joint::THUMB_TIP] = Landmark::new(0.8, 0.5);

        let out = c.process_frame(&HandFrame::new(vec![touching, apart.clone()], t0));
        assert_eq!(out.pinch_distance, Some(0.0));

        let broken = vec![Landmark::new(0.5, 0.5); 3];
        let ts = t0 + Duration::from_millis(33);
        let out = c.process_frame(&HandFrame::new(vec![broken, apart], ts));
        assert!((out.pinch_distance.unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn idle_produces_no_commands() {
        let mut c = GestureController::new(ControlConfig::default());
        let t0 = Instant::now();
        c.process_frame(&HandFrame::new(vec![flat_hand(0.9, 0.9)], t0));
        assert_eq!(c.tick(t0 + Duration::from_millis(16)), None);
    }

    #[test]
    fn reset_returns_to_cold_idle() {
        let mut c = GestureController::new(ControlConfig::default());
        let t0 = Instant::now();
        for i in 0..3 {
            let ts = t0 + Duration::from_millis(i);
            let frame = HandFrame::new(vec![flat_hand(0.9, 0.5)], ts)
                .with_categories(vec![vec!["Pointing_Up".into()]]);
            c.process_frame(&frame);
        }
        assert_eq!(c.mode(), ControlMode::Panning);
        c.reset();
        assert_eq!(c.mode(), ControlMode::Idle);
        assert!(c.flick().momentum().is_none());
        assert_eq!(c.tick(t0 + Duration::from_millis(20)), None);
    }
}
