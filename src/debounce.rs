use std::time::{Duration, Instant};

/// Trailing-edge debouncer with an injected clock.
///
/// Each [`push`](Debouncer::push) replaces the pending value and restarts
/// the quiet period, so the value eventually released is always the latest.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Release the pending value once the input has been quiet for the full delay.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self.deadline().is_some_and(|deadline| now >= deadline);
        if !due {
            return None;
        }
        self.pending.take().map(|(value, _)| value)
    }

    /// Drop the pending value; returns it if there was one.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(150);

    #[test]
    fn burst_collapses_to_latest() {
        let start = Instant::now();
        let mut d = Debouncer::new(DELAY);
        for i in 0..10u32 {
            d.push(i, start + Duration::from_millis(10 * i as u64));
            assert_eq!(d.poll(start + Duration::from_millis(10 * i as u64 + 5)), None);
        }
        // quiet period counts from the last push, not the first
        assert_eq!(d.poll(start + Duration::from_millis(200)), None);
        assert_eq!(d.poll(start + Duration::from_millis(240)), Some(9));
        assert_eq!(d.poll(start + Duration::from_millis(500)), None);
    }

    #[test]
    fn cancelled_value_never_fires() {
        let start = Instant::now();
        let mut d = Debouncer::new(DELAY);
        d.push("viewport", start);
        assert!(d.is_pending());
        assert_eq!(d.cancel(), Some("viewport"));
        assert!(!d.is_pending());
        assert_eq!(d.poll(start + DELAY * 4), None);
    }

    #[test]
    fn fires_exactly_at_deadline() {
        let start = Instant::now();
        let mut d = Debouncer::new(DELAY);
        d.push(1, start);
        assert_eq!(d.deadline(), Some(start + DELAY));
        assert_eq!(d.poll(start + DELAY), Some(1));
    }
}
