/// Client-side guards against rapid-fire clicks
use std::collections::VecDeque;
use std::time::Duration;

use crate::clock::Clock;

/// Allows at most `ceiling` attempts per sliding `window`.
///
/// Each granted attempt stops counting once `window` has passed since it was
/// made, so the counter cools down one attempt at a time.
#[derive(Debug)]
pub struct RateLimiter<C> {
    ceiling: usize,
    window_ms: u64,
    attempts: VecDeque<u64>,
    clock: C,
}

impl<C: Clock> RateLimiter<C> {
    pub fn new(ceiling: usize, window: Duration, clock: C) -> Self {
        RateLimiter {
            ceiling,
            window_ms: window.as_millis() as u64,
            attempts: VecDeque::with_capacity(ceiling),
            clock,
        }
    }

    pub fn try_acquire(&mut self) -> bool {
        let now = self.clock.now_ms();
        self.expire(now);
        if self.attempts.len() >= self.ceiling {
            return false;
        }
        self.attempts.push_back(now);
        true
    }

    /// Time until the next attempt would be allowed; zero if allowed now.
    pub fn remaining_cooldown(&mut self) -> Duration {
        let now = self.clock.now_ms();
        self.expire(now);
        if self.attempts.len() < self.ceiling {
            return Duration::ZERO;
        }
        self.attempts
            .front()
            .map(|oldest| Duration::from_millis(oldest + self.window_ms - now))
            .unwrap_or(Duration::ZERO)
    }

    fn expire(&mut self, now: u64) {
        while let Some(&oldest) = self.attempts.front() {
            if now.saturating_sub(oldest) >= self.window_ms {
                self.attempts.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Lets one call through per `interval`; refused calls do not reset it.
#[derive(Debug)]
pub struct Throttle<C> {
    interval_ms: u64,
    last_pass: Option<u64>,
    clock: C,
}

impl<C: Clock> Throttle<C> {
    pub fn new(interval: Duration, clock: C) -> Self {
        Throttle {
            interval_ms: interval.as_millis() as u64,
            last_pass: None,
            clock,
        }
    }

    pub fn try_pass(&mut self) -> bool {
        let now = self.clock.now_ms();
        match self.last_pass {
            Some(last) if now.saturating_sub(last) < self.interval_ms => false,
            _ => {
                self.last_pass = Some(now);
                true
            }
        }
    }
}
