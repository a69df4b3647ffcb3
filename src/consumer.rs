//! Consumer task — reacts to each record by reprioritizing or deleting itself
//!
//! | id | value | effect                                   |
//! |----|-------|------------------------------------------|
//! | 0  | any   | delete                                   |
//! | 1  | 0     | raise own priority to P0 + 2             |
//! | 1  | 1     | restore P0 if currently boosted          |
//! | 1  | 2     | delete                                   |
//! | *  | *     | nothing                                  |
//!
//! P0 is the priority the task had when the consumer was built. The decision
//! logic here is independent of how the runtime applies a priority.

use log::{info, warn};

use crate::config::PRIORITY_BOOST;
use crate::record::Record;
use crate::task::{PriorityControl, TaskPriority};

/// Visible effect of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Priority set to the contained value (P0 + 2)
    PriorityRaised(TaskPriority),
    /// Priority set back to P0
    PriorityRestored(TaskPriority),
    /// Task is finished; no further records are consumed
    Deleted,
    /// No effect
    Ignored,
}

pub struct Consumer<P> {
    control: P,
    /// P0, captured once
    initial: TaskPriority,
    /// Last priority this consumer applied
    current: TaskPriority,
    /// A boost was applied and not yet undone
    boosted: bool,
    deleted: bool,
}

impl<P: PriorityControl> Consumer<P> {
    /// Capture the task's current priority as P0
    ///
    /// The boost saturates at `u8::MAX`, so for P0 above `u8::MAX - 2` the
    /// raised priority is less than two levels up (and equal to P0 at 255).
    /// Boost and restore still pair up: a restore follows any applied boost.
    pub fn new(control: P) -> Self {
        let initial = control.priority();
        if initial.0 > u8::MAX - PRIORITY_BOOST {
            warn!(target: "consumer", "P0 {initial} leaves no room for a full boost; it will saturate");
        }
        Self {
            control,
            initial,
            current: initial,
            boosted: false,
            deleted: false,
        }
    }

    pub fn initial_priority(&self) -> TaskPriority {
        self.initial
    }

    pub fn current_priority(&self) -> TaskPriority {
        self.current
    }

    pub fn is_boosted(&self) -> bool {
        self.boosted
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Apply one record. A deleted consumer ignores everything.
    pub fn handle(&mut self, record: Record) -> Action {
        if self.deleted {
            return Action::Ignored;
        }
        info!(target: "consumer", "Received → {record}");

        match (record.id, record.value) {
            (0, _) => {
                info!(target: "consumer", "dataID == 0 → deleting task");
                self.deleted = true;
                Action::Deleted
            }
            (1, 0) => {
                let boosted = self.initial.raised(PRIORITY_BOOST);
                self.control.set_priority(boosted);
                self.current = boosted;
                self.boosted = true;
                info!(target: "consumer", "Priority Increased to {boosted}");
                Action::PriorityRaised(boosted)
            }
            (1, 1) if self.is_boosted() => {
                self.control.set_priority(self.initial);
                self.current = self.initial;
                self.boosted = false;
                info!(target: "consumer", "Priority Decreased to {}", self.initial);
                Action::PriorityRestored(self.initial)
            }
            (1, 2) => {
                info!(target: "consumer", "DataValue == 2 → deleting task");
                self.deleted = true;
                Action::Deleted
            }
            _ => Action::Ignored,
        }
    }
}

#[cfg(feature = "std")]
pub use run::{ConsumerExit, ConsumerReport};

#[cfg(feature = "std")]
mod run {
    use log::debug;

    use super::{Action, Consumer};
    use crate::channel::{Receiver, RecvError, Timeout};
    use crate::record::Record;
    use crate::task::PriorityControl;

    /// Why the consumer loop ended
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ConsumerExit {
        /// A delete record arrived
        Deleted(Record),
        /// The producer went away and the queue drained
        Disconnected,
    }

    /// Everything the consumer saw and did
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ConsumerReport {
        pub exit: ConsumerExit,
        /// Records in arrival order
        pub received: Vec<Record>,
        /// Effects, `Ignored` omitted
        pub actions: Vec<Action>,
    }

    impl<P: PriorityControl> Consumer<P> {
        /// Task body: block for records until deleted
        ///
        /// Dropping the receiver on return leaves records still queued
        /// unconsumed; the producer's sends then succeed until the queue is
        /// full and are dropped from there on.
        pub fn run<const N: usize>(mut self, mut rx: Receiver<Record, N>) -> ConsumerReport {
            let mut received = Vec::new();
            let mut actions = Vec::new();
            let exit = loop {
                let record = match rx.recv(Timeout::Forever) {
                    Ok(record) => record,
                    Err(RecvError::Disconnected) => break ConsumerExit::Disconnected,
                    Err(RecvError::Empty) => continue,
                };
                received.push(record);
                match self.handle(record) {
                    Action::Ignored => {}
                    Action::Deleted => {
                        actions.push(Action::Deleted);
                        break ConsumerExit::Deleted(record);
                    }
                    action => actions.push(action),
                }
            };
            debug!(target: "consumer", "exiting after {} records: {exit:?}", received.len());
            ConsumerReport {
                exit,
                received,
                actions,
            }
        }
    }
}
