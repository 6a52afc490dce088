//! Tunable parameters for one tracking session.
//!
//! Defaults form a single documented threshold set. `from_env` lets a host
//! override any of them through `GESTURE_MAP_*` variables.

use std::{str::FromStr, time::Duration};

use thiserror::Error;

const ENV_PREFIX: &str = "GESTURE_MAP_";
const MAX_DEBOUNCE_FRAMES: usize = 32;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} has unparsable value {value:?}")]
    InvalidValue { key: String, value: String },
    #[error("{field} = {value} is outside {expected}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothingConfig {
    pub landmark_alpha: f64,
    pub pinch_alpha: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            landmark_alpha: 0.5,
            pinch_alpha: 0.3,
        }
    }
}

/// Circle around a fixed frame point inside which hand input is ignored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeadZoneConfig {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

impl Default for DeadZoneConfig {
    fn default() -> Self {
        Self {
            center_x: 0.5,
            center_y: 0.5,
            radius: 0.1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanConfig {
    pub speed_amplifier: f64,
    /// Screen pixels per second at full speed.
    pub base_speed_px_per_sec: f64,
}

impl Default for PanConfig {
    fn default() -> Self {
        Self {
            speed_amplifier: 1.2,
            base_speed_px_per_sec: 500.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomConfig {
    pub speed_multiplier: f64,
    /// Zoom levels per second.
    pub max_speed: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 2.0,
            max_speed: 1.0,
        }
    }
}

/// Gesture thresholds. Ratios are relative to the half-hand size (wrist to
/// middle MCP) so they hold at any distance from the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureThresholds {
    /// Thumb tip to middle PIP, below which the thumb counts as curled.
    pub thumb_curl_ratio: f64,
    /// Thumb tip to index tip, below which the hand is pinching.
    pub close_pinch_ratio: f64,
    /// Index tip to middle MCP must stay above this during a pinch.
    pub pinch_index_middle_min_ratio: f64,
    /// Middle/ring/pinky tips must sit within this of the thumb CMC.
    pub fingers_closed_ratio: f64,
    /// Absolute y slack allowed when testing a finger for curl.
    pub curl_tolerance: f64,
    pub spread_angle_deg: f64,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            thumb_curl_ratio: 0.6,
            close_pinch_ratio: 0.5,
            pinch_index_middle_min_ratio: 0.58,
            fingers_closed_ratio: 0.8,
            curl_tolerance: 0.04,
            spread_angle_deg: 60.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlickConfig {
    pub velocity_threshold_px_per_ms: f64,
    pub launch_multiplier: f64,
    /// Velocity retained per 16 ms reference tick.
    pub decay: f64,
    pub stop_threshold_px: f64,
    pub cooldown: Duration,
}

impl Default for FlickConfig {
    fn default() -> Self {
        Self {
            velocity_threshold_px_per_ms: 2.0,
            launch_multiplier: 1.0,
            decay: 0.95,
            stop_threshold_px: 0.5,
            cooldown: Duration::from_millis(300),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ControlConfig {
    pub smoothing: SmoothingConfig,
    pub dead_zone: DeadZoneConfig,
    pub pan: PanConfig,
    pub zoom: ZoomConfig,
    pub thresholds: GestureThresholds,
    pub debounce_frames: usize,
    pub flick: FlickConfig,
    pub fireworks_duration: Duration,
    pub viewport: Viewport,
    pub tick_interval: Duration,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            smoothing: SmoothingConfig::default(),
            dead_zone: DeadZoneConfig::default(),
            pan: PanConfig::default(),
            zoom: ZoomConfig::default(),
            thresholds: GestureThresholds::default(),
            debounce_frames: 3,
            flick: FlickConfig::default(),
            fireworks_duration: Duration::from_secs(5),
            viewport: Viewport::default(),
            tick_interval: Duration::from_millis(16),
        }
    }
}

impl ControlConfig {
    /// Defaults with any `GESTURE_MAP_*` environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ControlConfig::from_env`] but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let env = EnvReader { lookup: &lookup };

        env.read("LANDMARK_ALPHA", &mut cfg.smoothing.landmark_alpha)?;
        env.read("PINCH_ALPHA", &mut cfg.smoothing.pinch_alpha)?;
        env.read("DEAD_ZONE_X", &mut cfg.dead_zone.center_x)?;
        env.read("DEAD_ZONE_Y", &mut cfg.dead_zone.center_y)?;
        env.read("DEAD_ZONE_RADIUS", &mut cfg.dead_zone.radius)?;
        env.read("PAN_AMPLIFIER", &mut cfg.pan.speed_amplifier)?;
        env.read("PAN_BASE_SPEED", &mut cfg.pan.base_speed_px_per_sec)?;
        env.read("ZOOM_MULTIPLIER", &mut cfg.zoom.speed_multiplier)?;
        env.read("ZOOM_MAX_SPEED", &mut cfg.zoom.max_speed)?;
        env.read("THUMB_CURL_RATIO", &mut cfg.thresholds.thumb_curl_ratio)?;
        env.read("CLOSE_PINCH_RATIO", &mut cfg.thresholds.close_pinch_ratio)?;
        env.read(
            "PINCH_INDEX_MIDDLE_RATIO",
            &mut cfg.thresholds.pinch_index_middle_min_ratio,
        )?;
        env.read("FINGERS_CLOSED_RATIO", &mut cfg.thresholds.fingers_closed_ratio)?;
        env.read("CURL_TOLERANCE", &mut cfg.thresholds.curl_tolerance)?;
        env.read("SPREAD_ANGLE", &mut cfg.thresholds.spread_angle_deg)?;
        env.read("DEBOUNCE_FRAMES", &mut cfg.debounce_frames)?;
        env.read(
            "FLICK_THRESHOLD",
            &mut cfg.flick.velocity_threshold_px_per_ms,
        )?;
        env.read("FLICK_MULTIPLIER", &mut cfg.flick.launch_multiplier)?;
        env.read("MOMENTUM_DECAY", &mut cfg.flick.decay)?;
        env.read("MOMENTUM_STOP", &mut cfg.flick.stop_threshold_px)?;
        env.read_millis("FLICK_COOLDOWN_MS", &mut cfg.flick.cooldown)?;
        env.read_millis("FIREWORKS_MS", &mut cfg.fireworks_duration)?;
        env.read_millis("TICK_MS", &mut cfg.tick_interval)?;
        env.read("VIEWPORT_WIDTH", &mut cfg.viewport.width)?;
        env.read("VIEWPORT_HEIGHT", &mut cfg.viewport.height)?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit_open_closed("smoothing.landmark_alpha", self.smoothing.landmark_alpha)?;
        check_unit_open_closed("smoothing.pinch_alpha", self.smoothing.pinch_alpha)?;
        // Speed ramps over (0.5 - radius), so the radius must stay below 0.5.
        if !(0.0..0.5).contains(&self.dead_zone.radius) {
            return Err(ConfigError::OutOfRange {
                field: "dead_zone.radius",
                value: self.dead_zone.radius,
                expected: "[0, 0.5)",
            });
        }
        if self.debounce_frames == 0 || self.debounce_frames > MAX_DEBOUNCE_FRAMES {
            return Err(ConfigError::OutOfRange {
                field: "debounce_frames",
                value: self.debounce_frames as f64,
                expected: "1..=32",
            });
        }
        if !(self.flick.decay > 0.0 && self.flick.decay < 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "flick.decay",
                value: self.flick.decay,
                expected: "(0, 1)",
            });
        }
        check_positive("flick.stop_threshold_px", self.flick.stop_threshold_px)?;
        check_positive(
            "flick.velocity_threshold_px_per_ms",
            self.flick.velocity_threshold_px_per_ms,
        )?;
        check_positive("viewport.width", self.viewport.width)?;
        check_positive("viewport.height", self.viewport.height)?;
        check_positive(
            "tick_interval_ms",
            self.tick_interval.as_secs_f64() * 1_000.0,
        )?;
        Ok(())
    }
}

struct EnvReader<'a, F> {
    lookup: &'a F,
}

impl<F> EnvReader<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn read<T: FromStr>(&self, name: &str, target: &mut T) -> Result<(), ConfigError> {
        let key = format!("{ENV_PREFIX}{name}");
        let Some(raw) = (self.lookup)(&key) else {
            return Ok(());
        };
        *target = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw })?;
        Ok(())
    }

    fn read_millis(&self, name: &str, target: &mut Duration) -> Result<(), ConfigError> {
        let mut millis = target.as_millis() as u64;
        self.read(name, &mut millis)?;
        *target = Duration::from_millis(millis);
        Ok(())
    }
}

fn check_unit_open_closed(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "(0, 1]",
        })
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "(0, inf)",
        })
    }
}
