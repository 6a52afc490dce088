//! Exponential moving-average smoothing for landmarks and scalar signals.

use crate::types::{HAND_LANDMARKS, Hand, Landmark};

/// Hand slots with their own smoothing history.
pub const MAX_HANDS: usize = 2;

/// EMA filter: `out = alpha * input + (1 - alpha) * previous_out`.
///
/// Smaller `alpha` means heavier smoothing and more lag. The first value after
/// construction or [`EmaSmoother::reset`] passes through unchanged.
#[derive(Clone, Copy, Debug)]
pub struct EmaSmoother {
    alpha: f64,
    last_scalar: Option<f64>,
    last_landmark: Option<Landmark>,
}

impl EmaSmoother {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            last_scalar: None,
            last_landmark: None,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn smooth(&mut self, value: f64) -> f64 {
        let smoothed = match self.last_scalar {
            Some(prev) => self.alpha * value + (1.0 - self.alpha) * prev,
            None => value,
        };
        self.last_scalar = Some(smoothed);
        smoothed
    }

    /// Absent input returns `None` and leaves the filter untouched.
    pub fn smooth_landmark(&mut self, landmark: Option<&Landmark>) -> Option<Landmark> {
        let landmark = landmark?;
        let Some(prev) = self.last_landmark else {
            self.last_landmark = Some(*landmark);
            return Some(*landmark);
        };

        let a = self.alpha;
        let smoothed = Landmark {
            x: a * landmark.x + (1.0 - a) * prev.x,
            y: a * landmark.y + (1.0 - a) * prev.y,
            // Depth is only blended when both samples carry it.
            z: match (landmark.z, prev.z) {
                (Some(z), Some(prev_z)) => Some(a * z + (1.0 - a) * prev_z),
                _ => landmark.z,
            },
            visibility: landmark.visibility,
        };
        self.last_landmark = Some(smoothed);
        Some(smoothed)
    }

    pub fn reset(&mut self) {
        self.last_scalar = None;
        self.last_landmark = None;
    }

    pub fn is_seeded(&self) -> bool {
        self.last_scalar.is_some() || self.last_landmark.is_some()
    }
}

/// Fixed arena of smoothers keyed by hand slot and landmark index.
#[derive(Clone, Debug)]
pub struct HandSmoothers {
    slots: [[EmaSmoother; HAND_LANDMARKS]; MAX_HANDS],
    active: [bool; MAX_HANDS],
}

impl HandSmoothers {
    pub fn new(alpha: f64) -> Self {
        Self {
            slots: [[EmaSmoother::new(alpha); HAND_LANDMARKS]; MAX_HANDS],
            active: [false; MAX_HANDS],
        }
    }

    /// Smooths the hand tracked in `slot`. Hands beyond [`MAX_HANDS`] pass
    /// through unchanged.
    pub fn smooth_hand(&mut self, slot: usize, hand: &Hand) -> Hand {
        let Some(smoothers) = self.slots.get_mut(slot) else {
            return hand.clone();
        };
        self.active[slot] = true;

        let mut out = [Landmark::new(0.0, 0.0); HAND_LANDMARKS];
        for (idx, (smoother, raw)) in smoothers.iter_mut().zip(hand.landmarks()).enumerate() {
            out[idx] = smoother.smooth_landmark(Some(raw)).unwrap_or(*raw);
        }
        Hand::from(out)
    }

    /// Clears history for slots whose hand disappeared this frame, so a hand
    /// that later takes the slot starts cold instead of inheriting stale state.
    pub fn release_missing(&mut self, present: [bool; MAX_HANDS]) {
        for slot in 0..MAX_HANDS {
            if self.active[slot] && !present[slot] {
                log::debug!("hand slot {slot} lost, resetting smoothers");
                self.reset_slot(slot);
            }
        }
    }

    pub fn reset_slot(&mut self, slot: usize) {
        if let Some(smoothers) = self.slots.get_mut(slot) {
            smoothers.iter_mut().for_each(EmaSmoother::reset);
            self.active[slot] = false;
        }
    }

    pub fn reset(&mut self) {
        for slot in 0..MAX_HANDS {
            self.reset_slot(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_value_passes_through() {
        let mut s = EmaSmoother::new(0.3);
        assert_eq!(s.smooth(10.0), 10.0);
        assert!((s.smooth(20.0) - 13.0).abs() < 1e-12);
    }

    #[test]
    fn converges_monotonically_within_bound() {
        let alpha: f64 = 0.3;
        let eps: f64 = 1e-3;
        let mut s = EmaSmoother::new(alpha);
        s.smooth(0.0);

        let steps = (eps.ln() / (1.0 - alpha).ln()).ceil() as usize;
        let mut prev_gap = 1.0;
        for _ in 0..steps {
            let out = s.smooth(1.0);
            let gap = (1.0 - out).abs();
            assert!(gap < prev_gap);
            prev_gap = gap;
        }
        assert!(prev_gap <= eps);
    }

    #[test]
    fn missing_landmark_does_not_disturb_state() {
        let mut s = EmaSmoother::new(0.5);
        s.smooth_landmark(Some(&Landmark::new(0.0, 0.0)));
        assert_eq!(s.smooth_landmark(None), None);
        let out = s.smooth_landmark(Some(&Landmark::new(1.0, 1.0))).unwrap();
        assert!((out.x - 0.5).abs() < 1e-12);
        assert!((out.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn depth_passes_through_when_history_lacks_it() {
        let mut s = EmaSmoother::new(0.5);
        s.smooth_landmark(Some(&Landmark::new(0.2, 0.2)));
        let out = s
            .smooth_landmark(Some(&Landmark::with_z(0.4, 0.4, -0.3)))
            .unwrap();
        assert_eq!(out.z, Some(-0.3));

        let out = s
            .smooth_landmark(Some(&Landmark::with_z(0.4, 0.4, -0.1)))
            .unwrap();
        assert!((out.z.unwrap() - (-0.2)).abs() < 1e-12);

        let out = s.smooth_landmark(Some(&Landmark::new(0.4, 0.4))).unwrap();
        assert_eq!(out.z, None);
    }

    #[test]
    fn reset_restores_cold_start() {
        let mut s = EmaSmoother::new(0.5);
        s.smooth_landmark(Some(&Landmark::new(0.0, 0.0)));
        s.reset();
        assert!(!s.is_seeded());
        let out = s.smooth_landmark(Some(&Landmark::new(0.8, 0.6))).unwrap();
        assert_eq!(out, Landmark::new(0.8, 0.6));
    }

    fn flat_hand(x: f64) -> Hand {
        Hand::from([Landmark::new(x, 0.5); HAND_LANDMARKS])
    }

    #[test]
    fn lost_slot_starts_cold_on_return() {
        let mut arena = HandSmoothers::new(0.5);
        arena.smooth_hand(0, &flat_hand(0.1));
        arena.release_missing([false, false]);
        let out = arena.smooth_hand(0, &flat_hand(0.9));
        assert_eq!(out.landmark(0).x, 0.9);
    }

    #[test]
    fn slots_are_independent() {
        let mut arena = HandSmoothers::new(0.5);
        arena.smooth_hand(0, &flat_hand(0.0));
        arena.smooth_hand(1, &flat_hand(1.0));
        let a = arena.smooth_hand(0, &flat_hand(1.0));
        let b = arena.smooth_hand(1, &flat_hand(1.0));
        assert!((a.landmark(3).x - 0.5).abs() < 1e-12);
        assert!((b.landmark(3).x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn extra_hands_pass_through() {
        let mut arena = HandSmoothers::new(0.5);
        arena.smooth_hand(MAX_HANDS, &flat_hand(0.2));
        let out = arena.smooth_hand(MAX_HANDS, &flat_hand(0.6));
        assert_eq!(out.landmark(0).x, 0.6);
    }
}
