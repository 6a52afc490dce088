use crate::{
    config::GestureThresholds,
    geometry::{angle, distance, half_hand_size},
    types::{Landmark, joint},
};

/// Which geometric configurations one hand matched this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GestureFlags {
    pub pointing_up: bool,
    pub close_pinch: bool,
    pub spread: bool,
    pub open_palm: bool,
}

/// Stateless classifier over a single smoothed hand.
///
/// Every predicate takes a plain slice and checks its length, so a truncated
/// skeleton simply fails to match.
#[derive(Clone, Copy, Debug, Default)]
pub struct GestureClassifier {
    thresholds: GestureThresholds,
}

impl GestureClassifier {
    pub fn new(thresholds: GestureThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &GestureThresholds {
        &self.thresholds
    }

    pub fn classify(&self, hand: &[Landmark]) -> GestureFlags {
        GestureFlags {
            pointing_up: self.is_pointing_up(hand),
            close_pinch: self.is_close_pinch(hand),
            spread: self.is_spread(hand),
            open_palm: is_open_palm(hand),
        }
    }

    /// Index extended upward, thumb tucked against the middle finger, the
    /// other three fingers folded.
    pub fn is_pointing_up(&self, hand: &[Landmark]) -> bool {
        let Some(pts) = Points::of(hand) else {
            return false;
        };
        let t = &self.thresholds;

        let index_extended =
            pts.y(joint::INDEX_TIP) < pts.y(joint::INDEX_PIP)
                && pts.y(joint::INDEX_PIP) < pts.y(joint::INDEX_MCP);
        if !index_extended {
            return false;
        }

        let thumb_curled =
            pts.dist(joint::THUMB_TIP, joint::MIDDLE_PIP) < t.thumb_curl_ratio * pts.half_hand;
        thumb_curled
            && fingers_curled(&pts, t.curl_tolerance)
            && fingers_closed(&pts, t.fingers_closed_ratio)
    }

    /// Thumb and index tips touching with the index folded into them.
    pub fn is_close_pinch(&self, hand: &[Landmark]) -> bool {
        let Some(pts) = Points::of(hand) else {
            return false;
        };
        let t = &self.thresholds;

        if pts.dist(joint::THUMB_TIP, joint::INDEX_TIP) >= t.close_pinch_ratio * pts.half_hand {
            return false;
        }

        let index_curled = pts.y(joint::INDEX_TIP) > pts.y(joint::INDEX_DIP)
            && pts.y(joint::INDEX_DIP) > pts.y(joint::INDEX_PIP);
        if !index_curled {
            return false;
        }

        // Rejects tips that only look close because the hand is rotated.
        let index_middle_ratio = pts.dist(joint::INDEX_TIP, joint::MIDDLE_MCP) / pts.half_hand;
        index_middle_ratio >= t.pinch_index_middle_min_ratio
            && fingers_closed(&pts, t.fingers_closed_ratio)
    }

    /// Wide thumb/index "V" with the remaining fingers folded.
    pub fn is_spread(&self, hand: &[Landmark]) -> bool {
        let Some(pts) = Points::of(hand) else {
            return false;
        };
        let t = &self.thresholds;

        let spread = angle(
            Some(pts.at(joint::THUMB_MCP)),
            Some(pts.at(joint::THUMB_TIP)),
            Some(pts.at(joint::INDEX_TIP)),
        );
        spread >= t.spread_angle_deg
            && fingers_curled(&pts, 0.0)
            && fingers_closed(&pts, t.fingers_closed_ratio)
    }
}

/// All four fingertips above their MCP joints.
pub fn is_open_palm(hand: &[Landmark]) -> bool {
    const FINGERS: [(usize, usize); 4] = [
        (joint::INDEX_TIP, joint::INDEX_MCP),
        (joint::MIDDLE_TIP, joint::MIDDLE_MCP),
        (joint::RING_TIP, joint::RING_MCP),
        (joint::PINKY_TIP, joint::PINKY_MCP),
    ];
    FINGERS.iter().all(|&(tip, base)| match (hand.get(tip), hand.get(base)) {
        (Some(tip), Some(base)) => tip.y < base.y,
        _ => false,
    })
}

/// Hand slice that is known to hold every joint and a usable size reference.
struct Points<'a> {
    hand: &'a [Landmark],
    half_hand: f64,
}

impl<'a> Points<'a> {
    fn of(hand: &'a [Landmark]) -> Option<Self> {
        if hand.len() <= joint::PINKY_TIP {
            return None;
        }
        let half_hand = half_hand_size(hand);
        if !(half_hand > 0.0 && half_hand.is_finite()) {
            return None;
        }
        Some(Self { hand, half_hand })
    }

    fn at(&self, idx: usize) -> &Landmark {
        &self.hand[idx]
    }

    fn y(&self, idx: usize) -> f64 {
        self.hand[idx].y
    }

    fn dist(&self, a: usize, b: usize) -> f64 {
        distance(self.hand.get(a), self.hand.get(b))
    }
}

fn fingers_curled(pts: &Points, tolerance: f64) -> bool {
    [
        (joint::MIDDLE_TIP, joint::MIDDLE_PIP),
        (joint::RING_TIP, joint::RING_PIP),
        (joint::PINKY_TIP, joint::PINKY_PIP),
    ]
    .iter()
    .all(|&(tip, pip)| pts.y(tip) > pts.y(pip) - tolerance)
}

fn fingers_closed(pts: &Points, ratio: f64) -> bool {
    let limit = pts.half_hand * ratio;
    [joint::MIDDLE_TIP, joint::RING_TIP, joint::PINKY_TIP]
        .iter()
        .all(|&tip| pts.dist(tip, joint::THUMB_CMC) < limit)
}
