//! Demo wiring — one queue, one producer, one consumer
//!
//! Creates the 5-record queue and both tasks on a kernel, ready for
//! `Kernel::start`. A queue that cannot be created is fatal: the caller logs
//! it and calls [`halt`] before the scheduler ever runs.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use log::debug;

use crate::config::{
    CONSUMER_NAME, CONSUMER_PRIORITY, PRODUCER_NAME, PRODUCER_PERIOD_US, PRODUCER_PRIORITY,
    QUEUE_CAPACITY, TASK_STACK_WORDS,
};
use crate::consumer::{Consumer, ConsumerReport};
use crate::error::KernelError;
use crate::input::InputSource;
use crate::kernel::Kernel;
use crate::producer::{Producer, ProducerStats};
use crate::record::Record;
use crate::task::{TaskHandle, TaskPriority};
use crate::timer::Clock;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct DemoConfig {
    /// Producer period
    pub period: Duration,
    pub producer_priority: TaskPriority,
    /// Consumer P0
    pub consumer_priority: TaskPriority,
    pub stack_words: usize,
    /// Stop the producer after this many periods; `None` runs forever
    pub cycles: Option<u64>,
}

impl DemoConfig {
    pub fn with_period(self, period: Duration) -> Self {
        Self { period, ..self }
    }

    pub fn with_priorities(self, producer: TaskPriority, consumer: TaskPriority) -> Self {
        Self {
            producer_priority: producer,
            consumer_priority: consumer,
            ..self
        }
    }

    pub fn with_cycles(self, cycles: Option<u64>) -> Self {
        Self { cycles, ..self }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_micros(PRODUCER_PERIOD_US),
            producer_priority: PRODUCER_PRIORITY,
            consumer_priority: CONSUMER_PRIORITY,
            stack_words: TASK_STACK_WORDS,
            cycles: None,
        }
    }
}

/// Handles to the demo's tasks, valid before and after `Kernel::start`
pub struct DemoHandles {
    pub producer: TaskHandle,
    pub consumer: TaskHandle,
    pub stats: Arc<ProducerStats>,
    report: Arc<OnceLock<ConsumerReport>>,
}

impl DemoHandles {
    /// What the consumer saw, once its task has been deleted
    pub fn consumer_report(&self) -> Option<&ConsumerReport> {
        self.report.get()
    }
}

/// Create the queue and both tasks on `kernel`
pub fn spawn_demo<S, C>(
    kernel: &mut Kernel,
    config: &DemoConfig,
    input: S,
    clock: C,
) -> Result<DemoHandles, KernelError>
where
    S: InputSource + Send + 'static,
    C: Clock + Send + 'static,
{
    let (tx, rx) = kernel.create_channel::<Record, QUEUE_CAPACITY>()?;

    let stats = Arc::new(ProducerStats::default());
    let period_us = u64::try_from(config.period.as_micros()).unwrap_or(u64::MAX);
    let cycles = config.cycles;
    let producer = kernel.create_task(PRODUCER_NAME, config.stack_words, config.producer_priority, {
        let stats = Arc::clone(&stats);
        move |_task| {
            // Grid starts when the task first runs
            let mut producer = Producer::new(tx, input, clock, period_us).with_stats(stats);
            match cycles {
                Some(n) => producer.run_cycles(n),
                None => producer.run(),
            }
        }
    })?;

    let report = Arc::new(OnceLock::new());
    let consumer = kernel.create_task(CONSUMER_NAME, config.stack_words, config.consumer_priority, {
        let report = Arc::clone(&report);
        move |task| {
            let summary = Consumer::new(task).run(rx);
            debug!(target: "consumer", "{} records received", summary.received.len());
            let _ = report.set(summary);
        }
    })?;

    Ok(DemoHandles {
        producer,
        consumer,
        stats,
        report,
    })
}

/// Stop here for good, the way a failed bring-up idles forever
pub fn halt() -> ! {
    loop {
        std::thread::park();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::{Action, ConsumerExit};
    use crate::input::ScriptedInput;
    use crate::kernel::KernelConfig;
    use crate::task::{PriorityControl, TaskState};
    use crate::timer::SysClock;

    #[test]
    fn test_default_config() {
        let config = DemoConfig::default();
        assert_eq!(config.period, Duration::from_millis(500));
        assert_eq!(config.producer_priority, TaskPriority(2));
        assert_eq!(config.consumer_priority, TaskPriority(1));
        assert_eq!(config.cycles, None);
    }

    #[test]
    fn test_queue_failure_is_reported_before_tasks() {
        let mut kernel = Kernel::new(KernelConfig::default().with_heap_bytes(16));
        let input = ScriptedInput::new(Vec::new(), Record::new(9, 0));
        let result = spawn_demo(&mut kernel, &DemoConfig::default(), input, SysClock::new());
        assert!(matches!(result, Err(KernelError::ChannelCreation { capacity: 5, .. })));
        assert_eq!(kernel.task_count(), 0);
    }

    #[test]
    fn test_bounded_run_boost_and_restore() {
        let mut kernel = Kernel::default();
        let config = DemoConfig::default()
            .with_period(Duration::from_millis(2))
            .with_cycles(Some(4));
        let input = ScriptedInput::new([Record::new(1, 0), Record::new(1, 1)], Record::new(9, 9));
        let clock = kernel.clock();
        let demo = spawn_demo(&mut kernel, &config, input, clock).unwrap();

        let stats = kernel.start().unwrap();
        assert_eq!(stats.tasks_deleted, 2);
        assert_eq!(demo.producer.state(), TaskState::Deleted);
        assert_eq!(demo.consumer.priority(), TaskPriority(1));

        let report = demo.consumer_report().unwrap();
        assert_eq!(report.exit, ConsumerExit::Disconnected);
        assert_eq!(
            report.actions,
            vec![
                Action::PriorityRaised(TaskPriority(3)),
                Action::PriorityRestored(TaskPriority(1))
            ]
        );
        assert_eq!(demo.stats.sent() + demo.stats.dropped(), 4);
    }
}
