//! Tandem-RTOS — two cooperating tasks over one bounded queue
//!
//! A producer samples an external input every period on an absolute-time
//! grid and posts a fixed-size record to a 5-slot queue. A consumer blocks
//! on the queue and reacts to each record by boosting or restoring its own
//! priority, or by deleting itself.
//!
//! - Lock-free SPSC ring as queue storage (no heap in the ring itself)
//! - Absolute-time periodic wake, drift-free under variable work time
//! - Priority boost/restore decision logic independent of the runtime
//! - Thread-backed host runtime behind the `std` feature

#![cfg_attr(not(feature = "std"), no_std)]

pub mod config;
pub mod record;
pub mod spsc;
pub mod task;
pub mod scheduler;
pub mod timer;
pub mod input;
pub mod consumer;

#[cfg(feature = "std")]
pub mod channel;
#[cfg(feature = "std")]
pub mod error;
#[cfg(feature = "std")]
pub mod kernel;
#[cfg(feature = "std")]
pub mod producer;
#[cfg(feature = "std")]
pub mod console;
#[cfg(feature = "std")]
pub mod demo;

pub use record::Record;
pub use spsc::SpscRing;
pub use task::{PriorityControl, Task, TaskControlBlock, TaskPriority, TaskState};
pub use scheduler::Scheduler;
pub use timer::{Clock, Deadline, PeriodicWake, SoftClock, WakeReport};
pub use input::{InputSource, SharedInput};
pub use consumer::{Action, Consumer};

#[cfg(feature = "std")]
pub use channel::{RecvError, SendError, Timeout};
#[cfg(feature = "std")]
pub use error::KernelError;
#[cfg(feature = "std")]
pub use kernel::{Kernel, KernelConfig, KernelStats};
#[cfg(feature = "std")]
pub use producer::{Producer, ProducerStats, SendOutcome};
#[cfg(feature = "std")]
pub use task::TaskHandle;
#[cfg(feature = "std")]
pub use timer::SysClock;
