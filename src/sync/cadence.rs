//! Polling cadence: slow by default, fast for a while after a refresh trigger

use std::time::Duration;
use tokio::time::Instant;

use crate::config::SyncConfig;

pub const FAST_INTERVAL: Duration = Duration::from_secs(5);
pub const SLOW_INTERVAL: Duration = Duration::from_secs(30);
pub const BURST_WINDOW: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq)]
pub struct Cadence {
    fast: Duration,
    slow: Duration,
    burst: Duration,
    burst_until: Option<Instant>,
}

impl Default for Cadence {
    fn default() -> Self {
        Self::new(FAST_INTERVAL, SLOW_INTERVAL, BURST_WINDOW)
    }
}

impl Cadence {
    pub fn new(fast: Duration, slow: Duration, burst: Duration) -> Self {
        Self {
            fast,
            slow,
            burst,
            burst_until: None,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            config.fast_interval,
            config.slow_interval,
            config.burst_window,
        )
    }

    /// Start (or restart) a burst of fast polling
    pub fn trigger(&mut self, now: Instant) {
        self.burst_until = Some(now + self.burst);
    }

    pub fn is_bursting(&self, now: Instant) -> bool {
        self.burst_until.map(|until| now < until).unwrap_or(false)
    }

    /// Delay until the next scheduled fetch after one made at `now`
    pub fn interval(&self, now: Instant) -> Duration {
        if self.is_bursting(now) {
            self.fast
        } else {
            self.slow
        }
    }

    /// When the fetch after one made at `now` is due
    pub fn next_due(&self, now: Instant) -> Instant {
        now + self.interval(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_slow() {
        let cadence = Cadence::default();
        let now = Instant::now();
        assert!(!cadence.is_bursting(now));
        assert_eq!(cadence.interval(now), SLOW_INTERVAL);
    }

    #[test]
    fn test_trigger_bursts_then_reverts() {
        let mut cadence = Cadence::default();
        let t0 = Instant::now();
        cadence.trigger(t0);

        assert_eq!(cadence.interval(t0), FAST_INTERVAL);
        assert_eq!(cadence.interval(t0 + Duration::from_secs(119)), FAST_INTERVAL);
        assert_eq!(cadence.interval(t0 + BURST_WINDOW), SLOW_INTERVAL);
    }

    #[test]
    fn test_retrigger_extends_burst() {
        let mut cadence = Cadence::default();
        let t0 = Instant::now();
        cadence.trigger(t0);
        cadence.trigger(t0 + Duration::from_secs(100));

        assert!(cadence.is_bursting(t0 + Duration::from_secs(200)));
        assert!(!cadence.is_bursting(t0 + Duration::from_secs(220)));
    }

    #[test]
    fn test_custom_intervals() {
        let config = SyncConfig {
            fast_interval: Duration::from_secs(2),
            slow_interval: Duration::from_secs(10),
            burst_window: Duration::from_secs(20),
            ..SyncConfig::default()
        };
        let mut cadence = Cadence::from_config(&config);
        let t0 = Instant::now();
        assert_eq!(cadence.next_due(t0), t0 + Duration::from_secs(10));
        cadence.trigger(t0);
        assert_eq!(cadence.next_due(t0), t0 + Duration::from_secs(2));
    }
}
