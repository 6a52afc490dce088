use std::time::Instant;

/// Number of landmarks in one hand skeleton.
pub const HAND_LANDMARKS: usize = 21;

/// Positional landmark indices. Classifiers rely on these, not on names.
pub mod joint {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

/// One tracked point in normalized image space. `y` grows downward and a more
/// negative `z` is closer to the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility: None,
        }
    }

    pub fn with_z(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            visibility: None,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_none_or(f64::is_finite)
    }
}

/// A validated hand skeleton: exactly 21 finite landmarks in positional order.
#[derive(Clone, Debug, PartialEq)]
pub struct Hand {
    landmarks: [Landmark; HAND_LANDMARKS],
}

impl Hand {
    /// Builds a hand from detector output. Skeletons of the wrong length or
    /// with non-finite points are rejected so callers treat them exactly like
    /// a missing hand.
    pub fn from_landmarks(points: &[Landmark]) -> Option<Self> {
        if points.len() != HAND_LANDMARKS || !points.iter().all(Landmark::is_finite) {
            return None;
        }
        let mut landmarks = [Landmark::new(0.0, 0.0); HAND_LANDMARKS];
        landmarks.copy_from_slice(points);
        Some(Self { landmarks })
    }

    pub fn landmark(&self, index: usize) -> &Landmark {
        &self.landmarks[index]
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn index_tip(&self) -> &Landmark {
        &self.landmarks[joint::INDEX_TIP]
    }
}

impl From<[Landmark; HAND_LANDMARKS]> for Hand {
    fn from(landmarks: [Landmark; HAND_LANDMARKS]) -> Self {
        Self { landmarks }
    }
}

/// Per-frame output of the external vision model.
#[derive(Clone, Debug)]
pub struct HandFrame {
    /// Raw skeletons, primary hand first.
    pub hands: Vec<Vec<Landmark>>,
    /// Category labels per hand, ranked by confidence.
    pub categories: Vec<Vec<String>>,
    pub timestamp: Instant,
}

impl HandFrame {
    pub fn new(hands: Vec<Vec<Landmark>>, timestamp: Instant) -> Self {
        Self {
            hands,
            categories: Vec::new(),
            timestamp,
        }
    }

    pub fn empty(timestamp: Instant) -> Self {
        Self::new(Vec::new(), timestamp)
    }

    pub fn with_categories(mut self, categories: Vec<Vec<String>>) -> Self {
        self.categories = categories;
        self
    }

    /// Top-ranked label for the hand at `hand_index`, if the model gave one.
    pub fn top_category(&self, hand_index: usize) -> Option<&str> {
        self.categories
            .get(hand_index)
            .and_then(|ranked| ranked.first())
            .map(String::as_str)
    }
}

/// Discrete labels the vision model may attach to a hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureCategory {
    ClosedFist,
    OpenPalm,
    PointingUp,
    Other,
}

impl GestureCategory {
    pub fn from_label(label: &str) -> Self {
        match label {
            "Closed_Fist" => GestureCategory::ClosedFist,
            "Open_Palm" => GestureCategory::OpenPalm,
            "Pointing_Up" => GestureCategory::PointingUp,
            _ => GestureCategory::Other,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ControlMode {
    #[default]
    Idle,
    Panning,
    ZoomIn,
    ZoomOut,
    Fireworks,
}

impl ControlMode {
    pub fn label(&self) -> &'static str {
        match self {
            ControlMode::Idle => "IDLE",
            ControlMode::Panning => "PANNING",
            ControlMode::ZoomIn => "ZOOM_IN",
            ControlMode::ZoomOut => "ZOOM_OUT",
            ControlMode::Fireworks => "FIREWORKS",
        }
    }

    pub fn zoom_direction(&self) -> Option<ZoomDirection> {
        match self {
            ControlMode::ZoomIn => Some(ZoomDirection::In),
            ControlMode::ZoomOut => Some(ZoomDirection::Out),
            _ => None,
        }
    }
}

impl std::fmt::Display for ControlMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanVector {
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub in_dead_zone: bool,
}

impl PanVector {
    pub const DEAD: PanVector = PanVector {
        x: 0.0,
        y: 0.0,
        speed: 0.0,
        in_dead_zone: true,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Sign applied to the map zoom level.
    pub fn sign(&self) -> f64 {
        match self {
            ZoomDirection::In => 1.0,
            ZoomDirection::Out => -1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomVector {
    pub direction: ZoomDirection,
    pub speed: f64,
    pub in_dead_zone: bool,
}

/// One instruction for the external map, applied with zero animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MapCommand {
    /// Relative pan in screen pixels.
    PanBy { dx: f64, dy: f64 },
    /// Change of zoom level.
    ZoomBy { delta: f64 },
}

/// Everything one processed frame produced, for status displays and tests.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameOutput {
    pub mode: ControlMode,
    pub raw_mode: ControlMode,
    pub pan: Option<PanVector>,
    pub zoom: Option<ZoomVector>,
    pub pinch_distance: Option<f64>,
    pub hands_tracked: usize,
    pub fireworks_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_needs_exactly_21_landmarks() {
        let points = vec![Landmark::new(0.4, 0.6); HAND_LANDMARKS + 1];
        assert!(Hand::from_landmarks(&points).is_none());
        assert!(Hand::from_landmarks(&points[..HAND_LANDMARKS - 1]).is_none());
        assert!(Hand::from_landmarks(&points[..HAND_LANDMARKS]).is_some());
    }

    #[test]
    fn non_finite_point_rejects_hand() {
        let mut points = vec![Landmark::new(0.4, 0.6); HAND_LANDMARKS];
        points[joint::PINKY_TIP].z = Some(f64::INFINITY);
        assert!(Hand::from_landmarks(&points).is_none());
    }

    #[test]
    fn top_category_is_first_ranked() {
        let frame = HandFrame::empty(Instant::now())
            .with_categories(vec![vec!["Open_Palm".into(), "Closed_Fist".into()]]);
        assert_eq!(frame.top_category(0), Some("Open_Palm"));
        assert_eq!(frame.top_category(1), None);
    }
}
