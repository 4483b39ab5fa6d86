use rand::Rng;
use std::cmp;
use std::time::Duration;

/// Exponential backoff between `min` and `max`. Each delay is jittered into `[d/2, d]` so that
/// followers of the same leader don't retry in lockstep.
pub(crate) struct Backoff {
    min: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    pub(crate) fn new(min: Duration, max: Duration) -> Self {
        Backoff { min, max, attempt: 0 }
    }

    pub(crate) fn next_delay(&mut self) -> Duration {
        let ceiling = self.ceiling(self.attempt);
        self.attempt = self.attempt.saturating_add(1);

        rand::thread_rng().gen_range(ceiling / 2..=ceiling)
    }

    pub(crate) fn reset(&mut self) {
        self.attempt = 0;
    }

    fn ceiling(&self, attempt: u32) -> Duration {
        // 2^16 * min is well past any sane max.
        let factor = 1u32 << cmp::min(attempt, 16);
        match self.min.checked_mul(factor) {
            Some(delay) => cmp::min(delay, self.max),
            None => self.max,
        }
    }
}
