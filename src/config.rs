//! Compile-time configuration
//!
//! Limits and demo parameters fixed at build time. Runtime knobs live in
//! `KernelConfig` and `DemoConfig`, which default to these values.

use crate::task::TaskPriority;

/// Maximum tasks the kernel can manage
pub const MAX_TASKS: usize = 16;

/// Longest task name kept in a task descriptor (bytes)
pub const MAX_TASK_NAME_LEN: usize = 16;

/// Bytes per stack word when charging task stacks against the kernel heap
pub const STACK_WORD_BYTES: usize = 4;

/// Bookkeeping charged per queue on top of its item storage
pub const QUEUE_HEADER_BYTES: usize = 80;

/// Kernel heap budget shared by task stacks and queue storage.
/// Two 1000-word tasks plus a 5-record queue fit with room to spare.
pub const TOTAL_HEAP_BYTES: usize = 16 * 1024;

/// Smallest real thread stack the host runtime will hand out. Task stacks
/// are sized in RTOS words, which are far too small for a host thread.
pub const MIN_HOST_STACK_BYTES: usize = 64 * 1024;

/// Records the queue between the two tasks can hold
pub const QUEUE_CAPACITY: usize = 5;

/// Producer period in microseconds (500 ms)
pub const PRODUCER_PERIOD_US: u64 = 500_000;

/// Stack depth of both demo tasks, in words
pub const TASK_STACK_WORDS: usize = 1000;

/// Producer runs above the consumer so a full queue is observable
pub const PRODUCER_PRIORITY: TaskPriority = TaskPriority(2);

/// Consumer baseline priority (P0)
pub const CONSUMER_PRIORITY: TaskPriority = TaskPriority(1);

/// Amount the consumer raises itself by on a `(1, 0)` record
pub const PRIORITY_BOOST: u8 = 2;

pub const PRODUCER_NAME: &str = "ExampleTask1";
pub const CONSUMER_NAME: &str = "ExampleTask2";
