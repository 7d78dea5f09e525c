//! Constant-interval retry policy with random jitter.
//!
//! Waits are blocking sleeps on the calling thread. The policy itself holds no
//! per-call state; attempt counting lives inside `run`.

use rand::Rng;
use std::time::Duration;
use tracing::warn;

/// Adds up to one second of random jitter to a wait.
pub fn random_jitter(wait: Duration) -> Duration {
    wait + Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..1.0))
}

/// Leaves the wait unchanged.
pub fn no_jitter(wait: Duration) -> Duration {
    wait
}

/// Bounded retry around a single fallible call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_tries: u32,
    /// Base wait between attempts.
    pub interval: Duration,
    /// Applied to `interval` before every wait.
    pub jitter: fn(Duration) -> Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::constant(Duration::from_secs(30))
    }
}

impl RetryPolicy {
    /// Five tries, a fixed `interval` between them, random jitter on top.
    pub fn constant(interval: Duration) -> Self {
        Self {
            max_tries: 5,
            interval,
            jitter: random_jitter,
        }
    }

    pub fn with_max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = max_tries.max(1);
        self
    }

    pub fn with_jitter(mut self, jitter: fn(Duration) -> Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// The wait before the next attempt.
    pub fn next_delay(&self) -> Duration {
        (self.jitter)(self.interval)
    }

    /// Run `op` until it succeeds, `give_up` returns true, or tries run out.
    pub fn run<T, E, F, G>(&self, op: F, give_up: G) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Result<T, E>,
        G: Fn(&E) -> bool,
    {
        self.run_with_sleep(op, give_up, std::thread::sleep)
    }

    /// Same as [`run`](Self::run) with the sleep function supplied by the caller.
    pub fn run_with_sleep<T, E, F, G, S>(&self, mut op: F, give_up: G, mut sleep: S) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Result<T, E>,
        G: Fn(&E) -> bool,
        S: FnMut(Duration),
    {
        let max_tries = self.max_tries.max(1);
        let mut attempt = 1;

        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if give_up(&err) || attempt >= max_tries {
                        return Err(err);
                    }

                    let delay = self.next_delay();
                    warn!(
                        attempt,
                        max_tries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "attempt failed, backing off"
                    );
                    sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}
