//! Flick detection and decaying pan momentum.
//!
//! Velocities are kept in screen pixels per 16 ms reference tick, so the
//! decay law `v0 * decay^(elapsed_ms / 16)` does not depend on frame rate.

use std::time::{Duration, Instant};

use crate::{
    config::{FlickConfig, Viewport},
    types::Landmark,
};

pub const REFERENCE_TICK_MS: f64 = 16.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlickMomentum {
    pub vx: f64,
    pub vy: f64,
    pub start_time: Instant,
}

impl FlickMomentum {
    pub fn velocity_at(&self, now: Instant, decay: f64) -> (f64, f64) {
        let elapsed_ms = millis(now.saturating_duration_since(self.start_time));
        let factor = decay.powf(elapsed_ms / REFERENCE_TICK_MS);
        (self.vx * factor, self.vy * factor)
    }
}

#[derive(Clone, Copy, Debug)]
struct Anchor {
    x: f64,
    y: f64,
    time: Instant,
}

#[derive(Clone, Debug)]
pub struct FlickIntegrator {
    config: FlickConfig,
    viewport: Viewport,
    anchor: Option<Anchor>,
    momentum: Option<FlickMomentum>,
    cooldown_until: Option<Instant>,
}

impl FlickIntegrator {
    pub fn new(config: FlickConfig, viewport: Viewport) -> Self {
        Self {
            config,
            viewport,
            anchor: None,
            momentum: None,
            cooldown_until: None,
        }
    }

    pub fn momentum(&self) -> Option<&FlickMomentum> {
        self.momentum.as_ref()
    }

    pub fn has_anchor(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn in_cooldown(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    /// Follows the fingertip while live panning. Launches momentum and returns
    /// `true` when the hand moved faster than the flick threshold.
    pub fn track(&mut self, tip: &Landmark, now: Instant) -> bool {
        if self.in_cooldown(now) {
            return false;
        }

        let point = Anchor {
            x: tip.x * self.viewport.width,
            y: tip.y * self.viewport.height,
            time: now,
        };
        let Some(prev) = self.anchor.replace(point) else {
            return false;
        };

        let dt_ms = millis(now.saturating_duration_since(prev.time));
        if dt_ms <= 0.0 {
            return false;
        }
        let vx = (point.x - prev.x) / dt_ms;
        let vy = (point.y - prev.y) / dt_ms;
        if vx.hypot(vy) <= self.config.velocity_threshold_px_per_ms {
            return false;
        }

        let scale = REFERENCE_TICK_MS * self.config.launch_multiplier;
        // Same convention as the pan vector: screen y is flipped.
        let momentum = FlickMomentum {
            vx: vx * scale,
            vy: -vy * scale,
            start_time: now,
        };
        log::debug!(
            "flick launched at {:.2} px/ms, momentum ({:.1}, {:.1})",
            vx.hypot(vy),
            momentum.vx,
            momentum.vy
        );
        self.momentum = Some(momentum);
        self.anchor = None;
        self.cooldown_until = Some(now + self.config.cooldown);
        true
    }

    pub fn clear_anchor(&mut self) {
        self.anchor = None;
    }

    /// A new live pan takes the viewport back.
    pub fn cancel(&mut self) {
        if self.momentum.take().is_some() {
            log::debug!("flick momentum cancelled");
        }
    }

    /// Pan delta for this tick, or `None` once momentum has died out.
    pub fn tick(&mut self, now: Instant) -> Option<(f64, f64)> {
        let momentum = self.momentum?;
        let (vx, vy) = momentum.velocity_at(now, self.config.decay);
        if vx.hypot(vy) < self.config.stop_threshold_px {
            log::debug!("flick momentum settled");
            self.momentum = None;
            return None;
        }
        Some((vx, vy))
    }

    pub fn reset(&mut self) {
        self.anchor = None;
        self.momentum = None;
        self.cooldown_until = None;
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1_000.0
}
