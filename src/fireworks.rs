use std::time::{Duration, Instant};

/// Celebration window opened when the session enters FIREWORKS.
#[derive(Clone, Debug)]
pub struct FireworksTimer {
    duration: Duration,
    started: Option<Instant>,
}

impl FireworksTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started: None,
        }
    }

    /// Starts the show unless one is already running.
    pub fn trigger(&mut self, now: Instant) -> bool {
        if self.is_running(now) {
            return false;
        }
        log::info!("fireworks started for {:?}", self.duration);
        self.started = Some(now);
        true
    }

    pub fn is_running(&self, now: Instant) -> bool {
        self.started
            .is_some_and(|start| now.saturating_duration_since(start) < self.duration)
    }

    pub fn update(&mut self, now: Instant) {
        if self.started.is_some() && !self.is_running(now) {
            log::debug!("fireworks finished");
            self.started = None;
        }
    }

    pub fn reset(&mut self) {
        self.started = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrigger_while_running_is_ignored() {
        let mut timer = FireworksTimer::new(Duration::from_secs(5));
        let t0 = Instant::now();
        assert!(timer.trigger(t0));
        assert!(!timer.trigger(t0 + Duration::from_secs(2)));
        assert!(timer.is_running(t0 + Duration::from_millis(4_999)));
    }

    #[test]
    fn show_ends_after_duration() {
        let mut timer = FireworksTimer::new(Duration::from_secs(5));
        let t0 = Instant::now();
        timer.trigger(t0);
        let later = t0 + Duration::from_secs(5);
        timer.update(later);
        assert!(!timer.is_running(later));
        assert!(timer.trigger(later));
    }
}
