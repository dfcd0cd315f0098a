//! # Fibonacci Backoff
//!
//! Progressive retry backoff that grows more slowly than exponential
//! backoff. Sequence for the defaults (30s min, 600s max):
//! 30s, 30s, 60s, 90s, 150s, 240s, 390s, 600s (capped).

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min_secs: u64,
    prev_secs: u64,
    current_secs: u64,
    max_secs: u64,
}

impl FibonacciBackoff {
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            min_secs,
            prev_secs: 0,
            current_secs: min_secs,
            max_secs,
        }
    }

    /// Current delay in seconds; advances the sequence.
    pub fn next_backoff_secs(&mut self) -> u64 {
        let result = self.current_secs;
        let next = self.prev_secs + self.current_secs;
        self.prev_secs = self.current_secs;
        self.current_secs = std::cmp::min(next, self.max_secs);
        result
    }

    #[must_use]
    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_secs(self.next_backoff_secs())
    }

    /// Restart the sequence after a success.
    pub fn reset(&mut self) {
        self.prev_secs = 0;
        self.current_secs = self.min_secs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_follows_fibonacci_and_caps() {
        let mut backoff = FibonacciBackoff::new(30, 600);
        let observed: Vec<u64> = (0..9).map(|_| backoff.next_backoff_secs()).collect();
        assert_eq!(observed, [30, 30, 60, 90, 150, 240, 390, 600, 600]);
    }

    #[test]
    fn reset_restarts_from_minimum() {
        let mut backoff = FibonacciBackoff::new(30, 600);
        backoff.next_backoff_secs();
        backoff.next_backoff_secs();
        backoff.next_backoff_secs();
        backoff.reset();
        assert_eq!(backoff.next_backoff_secs(), 30);
        assert_eq!(backoff.next_backoff_secs(), 30);
        assert_eq!(backoff.next_backoff_secs(), 60);
    }

    #[test]
    fn independent_instances_do_not_interfere() {
        let mut first = FibonacciBackoff::new(30, 600);
        let mut second = FibonacciBackoff::new(30, 600);
        first.next_backoff_secs();
        first.next_backoff_secs();
        first.next_backoff_secs();
        assert_eq!(second.next_backoff_secs(), 30);
    }

    #[test]
    fn duration_conversion() {
        let mut backoff = FibonacciBackoff::new(1, 10);
        assert_eq!(backoff.next_backoff(), Duration::from_secs(1));
    }
}
