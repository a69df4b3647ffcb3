//! Producer task — samples the input and posts a record every period
//!
//! Wake instants sit on a fixed grid (`start + k × period`), so the time spent
//! sampling, sending and logging never pushes later cycles back. A full queue
//! drops that cycle's record; the next cycle tries again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::channel::{SendError, Sender};
use crate::input::InputSource;
use crate::record::Record;
use crate::timer::{Clock, PeriodicWake, WakeReport};

/// What happened to one cycle's record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Queued for the consumer
    Sent(Record),
    /// Queue was full; record discarded
    Dropped(Record),
}

/// Send counters, readable from outside the producer task
#[derive(Debug, Default)]
pub struct ProducerStats {
    sent: AtomicU64,
    dropped: AtomicU64,
}

impl ProducerStats {
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Acquire)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Acquire)
    }
}

pub struct Producer<S, C, const N: usize> {
    tx: Sender<Record, N>,
    input: S,
    clock: C,
    wake: PeriodicWake,
    stats: Arc<ProducerStats>,
}

impl<S: InputSource, C: Clock, const N: usize> Producer<S, C, N> {
    /// The wake grid starts at the clock's current time
    pub fn new(tx: Sender<Record, N>, input: S, clock: C, period_us: u64) -> Self {
        let wake = PeriodicWake::starting_now(&clock, period_us);
        Self {
            tx,
            input,
            clock,
            wake,
            stats: Arc::new(ProducerStats::default()),
        }
    }

    /// Share counters with an existing stats block
    pub fn with_stats(self, stats: Arc<ProducerStats>) -> Self {
        Self { stats, ..self }
    }

    pub fn stats(&self) -> Arc<ProducerStats> {
        Arc::clone(&self.stats)
    }

    /// Sample, build a record and post it without blocking
    pub fn cycle(&mut self) -> SendOutcome {
        let record = self.input.sample();
        match self.tx.try_send(record) {
            Ok(()) => {
                self.stats.sent.fetch_add(1, Ordering::AcqRel);
                info!(target: "producer", "Sent → {record}");
                SendOutcome::Sent(record)
            }
            Err(SendError::Full(record)) => {
                self.stats.dropped.fetch_add(1, Ordering::AcqRel);
                debug!(target: "producer", "queue full, dropped {record}");
                SendOutcome::Dropped(record)
            }
        }
    }

    /// Sleep until the next grid instant
    pub fn wait(&mut self) -> WakeReport {
        let report = self.wake.wait(&self.clock);
        if report.overrun {
            warn!(
                target: "producer",
                "cycle overran its period: busy {} µs of {} µs",
                report.busy_us,
                self.wake.period_us()
            );
        }
        report
    }

    /// Run exactly `cycles` periods
    pub fn run_cycles(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.cycle();
            self.wait();
        }
    }

    /// Task body: one record per period, forever
    pub fn run(mut self) -> ! {
        loop {
            self.cycle();
            self.wait();
        }
    }
}
