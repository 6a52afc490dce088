//! Pan and zoom vectors from the primary hand's index fingertip.

use crate::{
    config::{DeadZoneConfig, PanConfig},
    types::{Landmark, PanVector, ZoomDirection, ZoomVector, joint},
};

/// Normalized distance from frame center to frame edge.
const EDGE_DISTANCE: f64 = 0.5;

/// Closed circle around a fixed frame point: a fingertip exactly on the
/// boundary still counts as inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeadZone {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

impl From<DeadZoneConfig> for DeadZone {
    fn from(cfg: DeadZoneConfig) -> Self {
        Self {
            center_x: cfg.center_x,
            center_y: cfg.center_y,
            radius: cfg.radius,
        }
    }
}

/// Fingertip offset from the dead-zone center that escaped the zone.
#[derive(Clone, Copy, Debug)]
struct Offset {
    dx: f64,
    dy: f64,
    distance: f64,
}

impl DeadZone {
    fn escape(&self, tip: &Landmark) -> Option<Offset> {
        let dx = tip.x - self.center_x;
        let dy = tip.y - self.center_y;
        let distance = (dx * dx + dy * dy).sqrt();
        (distance > self.radius).then_some(Offset { dx, dy, distance })
    }

    pub fn contains(&self, tip: &Landmark) -> bool {
        self.escape(tip).is_none()
    }

    /// Linear ramp from the zone edge to the frame edge, clamped to [0, 1].
    fn speed(&self, distance: f64, amplifier: f64) -> f64 {
        let span = EDGE_DISTANCE - self.radius;
        if span <= 0.0 {
            return 0.0;
        }
        (((distance - self.radius) / span) * amplifier).clamp(0.0, 1.0)
    }
}

fn index_tip(hand: &[Landmark]) -> Option<&Landmark> {
    hand.get(joint::INDEX_TIP)
}

/// Direction from the dead-zone center to the fingertip, with y flipped so a
/// raised hand pans the map the natural-scroll way.
pub fn pan_vector(hand: &[Landmark], zone: &DeadZone, pan: &PanConfig) -> PanVector {
    let Some(offset) = index_tip(hand).and_then(|tip| zone.escape(tip)) else {
        return PanVector::DEAD;
    };
    PanVector {
        x: offset.dx / offset.distance,
        y: -offset.dy / offset.distance,
        speed: zone.speed(offset.distance, pan.speed_amplifier),
        in_dead_zone: false,
    }
}

/// Zoom rate follows fingertip displacement, not pinch width; the direction
/// comes from the committed mode.
pub fn zoom_vector(
    hand: &[Landmark],
    direction: ZoomDirection,
    zone: &DeadZone,
    pan: &PanConfig,
) -> ZoomVector {
    match index_tip(hand).and_then(|tip| zone.escape(tip)) {
        Some(offset) => ZoomVector {
            direction,
            speed: zone.speed(offset.distance, pan.speed_amplifier),
            in_dead_zone: false,
        },
        None => ZoomVector {
            direction,
            speed: 0.0,
            in_dead_zone: true,
        },
    }
}
