//! Pause bookkeeping
//!
//! Gameplay time is absolute (`now` in ms). Instead of a virtual clock, a
//! resume pushes every stored timestamp forward by the paused duration, so
//! cooldowns neither expire during a pause nor fire in a burst after it.

/// Anything holding absolute timestamps that must survive a pause
pub trait TimeShift {
    fn shift_time(&mut self, delta_ms: f64);
}

/// Owns the paused flag. Only `pause`/`resume` toggle it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PauseClock {
    paused_at: Option<f64>,
}

impl PauseClock {
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Record the pause instant. Returns false if already paused.
    pub fn pause(&mut self, now: f64) -> bool {
        if self.paused_at.is_some() {
            return false;
        }
        self.paused_at = Some(now);
        true
    }

    /// Elapsed paused time, or `None` when not paused
    pub fn resume(&mut self, now: f64) -> Option<f64> {
        let paused_at = self.paused_at.take()?;
        Some((now - paused_at).max(0.0))
    }

    /// Drop any pause without shifting (run reset, game over)
    pub fn clear(&mut self) {
        self.paused_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_without_pause_is_noop() {
        let mut clock = PauseClock::default();
        assert_eq!(clock.resume(500.0), None);
        assert!(!clock.is_paused());
    }

    #[test]
    fn test_pause_resume_reports_elapsed() {
        let mut clock = PauseClock::default();
        assert!(clock.pause(1000.0));
        assert!(!clock.pause(1200.0), "second pause keeps the first instant");
        assert_eq!(clock.resume(4000.0), Some(3000.0));
        assert!(!clock.is_paused());
    }
}
