//! Debounce filter for the search box.
//!
//! The debouncer is a plain state machine: callers feed it values with the
//! current time and poll it later. The event loop sleeps until
//! [`Debouncer::deadline`] so nothing here owns a timer.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    interval: Duration,
    pending: Option<Pending<T>>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

impl<T> Debouncer<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Record a new input. Replaces any pending value and restarts the interval.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some(Pending {
            value,
            deadline: now + self.interval,
        });
    }

    /// Publish the pending value if the interval has elapsed without newer input.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(p) if now >= p.deadline => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// Publish the pending value immediately.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }

    /// When the pending value will settle, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn publishes_after_quiet_interval() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(300));

        d.push("meet", t0);
        assert_eq!(d.poll(t0 + ms(299)), None);
        assert_eq!(d.poll(t0 + ms(300)), Some("meet"));
        assert_eq!(d.poll(t0 + ms(900)), None);
    }

    #[test]
    fn burst_publishes_only_the_last_value() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(300));

        d.push("m", t0);
        d.push("me", t0 + ms(80));
        d.push("mee", t0 + ms(150));
        d.push("meeting", t0 + ms(200));

        // The first push would have expired at 300ms; the restart keeps it pending.
        assert_eq!(d.poll(t0 + ms(350)), None);
        assert_eq!(d.deadline(), Some(t0 + ms(500)));
        assert_eq!(d.poll(t0 + ms(500)), Some("meeting"));
        assert!(!d.is_pending());
    }

    #[test]
    fn flush_publishes_without_waiting() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(300));
        d.push(String::from("work"), t0);

        assert_eq!(d.flush().as_deref(), Some("work"));
        assert_eq!(d.poll(t0 + ms(1000)), None);
    }

    #[test]
    fn separate_bursts_publish_separately() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(100));

        d.push(1, t0);
        assert_eq!(d.poll(t0 + ms(100)), Some(1));
        d.push(2, t0 + ms(150));
        assert_eq!(d.poll(t0 + ms(200)), None);
        assert_eq!(d.poll(t0 + ms(250)), Some(2));
    }
}
