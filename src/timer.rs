//! System timer — clock sources and absolute-time periodic wake
//!
//! Time is microseconds since the clock's own origin. [`SysClock`] wraps the
//! host's monotonic clock; [`SoftClock`] is a software counter for tests.
//! [`PeriodicWake`] keeps a task on a fixed grid: each wake is computed from
//! the previous *wake*, never from "now", so work time does not accumulate
//! as drift.

use core::sync::atomic::{AtomicU64, Ordering};

/// Monotonic time source a task can sleep on
pub trait Clock {
    /// Current time in microseconds
    fn now_us(&self) -> u64;

    /// Block until `now_us() >= deadline_us`. Returns at once if already past.
    fn sleep_until_us(&self, deadline_us: u64);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }

    fn sleep_until_us(&self, deadline_us: u64) {
        (**self).sleep_until_us(deadline_us)
    }
}

#[cfg(feature = "std")]
impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }

    fn sleep_until_us(&self, deadline_us: u64) {
        (**self).sleep_until_us(deadline_us)
    }
}

/// Software clock for testing
///
/// Never moves on its own. Sleeping jumps straight to the deadline, so a
/// periodic task driven by it runs as fast as the test can loop.
#[derive(Debug, Default)]
pub struct SoftClock {
    now_us: AtomicU64,
    sleeps: AtomicU64,
}

impl SoftClock {
    pub const fn new() -> Self {
        Self {
            now_us: AtomicU64::new(0),
            sleeps: AtomicU64::new(0),
        }
    }

    /// Advance time by microseconds (simulated work)
    pub fn advance(&self, us: u64) {
        self.now_us.fetch_add(us, Ordering::AcqRel);
    }

    /// Number of sleeps that actually waited
    pub fn sleeps(&self) -> u64 {
        self.sleeps.load(Ordering::Acquire)
    }
}

impl Clock for SoftClock {
    fn now_us(&self) -> u64 {
        self.now_us.load(Ordering::Acquire)
    }

    fn sleep_until_us(&self, deadline_us: u64) {
        let prev = self.now_us.fetch_max(deadline_us, Ordering::AcqRel);
        if prev < deadline_us {
            self.sleeps.fetch_add(1, Ordering::AcqRel);
        }
    }
}

#[cfg(feature = "std")]
pub use sys::SysClock;

#[cfg(feature = "std")]
mod sys {
    use std::time::{Duration, Instant};

    use super::Clock;

    /// Host monotonic clock, anchored when created
    #[derive(Debug, Clone, Copy)]
    pub struct SysClock {
        origin: Instant,
    }

    impl SysClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
            }
        }
    }

    impl Default for SysClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for SysClock {
        fn now_us(&self) -> u64 {
            u64::try_from(self.origin.elapsed().as_micros()).unwrap_or(u64::MAX)
        }

        fn sleep_until_us(&self, deadline_us: u64) {
            // `sleep` may wake early on some hosts
            loop {
                let now = self.now_us();
                if now >= deadline_us {
                    return;
                }
                std::thread::sleep(Duration::from_micros(deadline_us - now));
            }
        }
    }
}

/// Deadline tracker for a single period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    /// Activation time
    start: u64,
    /// Deadline (absolute)
    deadline: u64,
}

impl Deadline {
    /// Create a new deadline
    pub fn new(start: u64, period_us: u64) -> Self {
        Self {
            start,
            deadline: start.saturating_add(period_us),
        }
    }

    /// Absolute deadline
    pub fn at(&self) -> u64 {
        self.deadline
    }

    /// Check if deadline is met
    pub fn is_met(&self, current: u64) -> bool {
        current <= self.deadline
    }

    /// Remaining time until deadline (0 if reached or missed)
    pub fn remaining(&self, current: u64) -> u64 {
        self.deadline.saturating_sub(current)
    }

    /// Elapsed since start
    pub fn elapsed(&self, current: u64) -> u64 {
        current.saturating_sub(self.start)
    }
}

/// Outcome of one [`PeriodicWake::wait`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeReport {
    /// Grid instant this wake was scheduled for
    pub wake_at_us: u64,
    /// Time spent in the period before sleeping
    pub busy_us: u64,
    /// The period's work ran past its wake instant
    pub overrun: bool,
}

/// Absolute-time periodic delay
///
/// Wake instants are `start + k × period` for k = 1, 2, …, whatever the
/// per-cycle work time. An overrun wakes immediately and keeps the grid.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicWake {
    last_wake_us: u64,
    period_us: u64,
}

impl PeriodicWake {
    /// Start the grid at an explicit instant
    pub const fn new(start_us: u64, period_us: u64) -> Self {
        Self {
            last_wake_us: start_us,
            period_us,
        }
    }

    /// Start the grid at the clock's current time
    pub fn starting_now(clock: &impl Clock, period_us: u64) -> Self {
        Self::new(clock.now_us(), period_us)
    }

    /// Last grid instant reached
    pub fn last_wake_us(&self) -> u64 {
        self.last_wake_us
    }

    pub fn period_us(&self) -> u64 {
        self.period_us
    }

    /// Sleep until `last_wake + period`, then advance the mark to it
    pub fn wait(&mut self, clock: &impl Clock) -> WakeReport {
        let deadline = Deadline::new(self.last_wake_us, self.period_us);
        let now = clock.now_us();
        let overrun = !deadline.is_met(now);

        if deadline.remaining(now) > 0 {
            clock.sleep_until_us(deadline.at());
        }

        self.last_wake_us = deadline.at();
        WakeReport {
            wake_at_us: deadline.at(),
            busy_us: deadline.elapsed(now),
            overrun,
        }
    }
}
