//! Task definition — descriptors, priorities and live control blocks
//!
//! A [`Task`] is the static part (name, stack depth, base priority) kept in
//! the scheduler's table. A [`TaskControlBlock`] is the live part the running
//! task and the runtime share: current priority and execution state.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use crate::config::MAX_TASK_NAME_LEN;

/// Task priority (higher number = more urgent)
///
/// A boost is expressed as `priority.raised(2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TaskPriority(pub u8);

impl TaskPriority {
    /// Background (runs only when nothing else can)
    pub const IDLE: TaskPriority = TaskPriority(0);
    /// Low priority (logging, telemetry)
    pub const LOW: TaskPriority = TaskPriority(1);
    /// Normal priority (periodic sampling)
    pub const NORMAL: TaskPriority = TaskPriority(2);
    /// High priority
    pub const HIGH: TaskPriority = TaskPriority(3);
    /// Highest priority
    pub const CRITICAL: TaskPriority = TaskPriority(4);

    /// This priority raised by `levels`, saturating at `u8::MAX`
    pub const fn raised(self, levels: u8) -> TaskPriority {
        TaskPriority(self.0.saturating_add(levels))
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task execution state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    /// Created, waiting for the scheduler to start it
    Ready = 0,
    /// Task is executing
    Running = 1,
    /// Sleeping until an absolute wake time
    Delayed = 2,
    /// Waiting on a queue
    Blocked = 3,
    /// Task returned from its entry point; it will never run again
    Deleted = 4,
}

impl TaskState {
    const fn from_u8(raw: u8) -> TaskState {
        match raw {
            0 => TaskState::Ready,
            1 => TaskState::Running,
            2 => TaskState::Delayed,
            3 => TaskState::Blocked,
            _ => TaskState::Deleted,
        }
    }
}

/// Fixed-size task name, truncated on a UTF-8 boundary
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TaskName {
    bytes: [u8; MAX_TASK_NAME_LEN],
    len: u8,
}

impl TaskName {
    pub fn new(name: &str) -> Self {
        let mut len = name.len().min(MAX_TASK_NAME_LEN);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        let mut bytes = [0u8; MAX_TASK_NAME_LEN];
        bytes[..len].copy_from_slice(&name.as_bytes()[..len]);
        Self { bytes, len: len as u8 }
    }

    pub fn as_str(&self) -> &str {
        // Built from a `&str` cut on a char boundary
        core::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }
}

impl fmt::Debug for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static task descriptor — no heap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    /// Task name
    pub name: TaskName,
    /// Stack depth in words
    pub stack_words: usize,
    /// Priority at creation
    pub priority: TaskPriority,
}

impl Task {
    pub fn new(name: &str, stack_words: usize, priority: TaskPriority) -> Self {
        Self {
            name: TaskName::new(name),
            stack_words,
            priority,
        }
    }
}

/// Live state of a created task, shared between the task and the runtime
#[derive(Debug)]
pub struct TaskControlBlock {
    task: Task,
    priority: AtomicU8,
    state: AtomicU8,
}

impl TaskControlBlock {
    pub const fn new(task: Task) -> Self {
        Self {
            priority: AtomicU8::new(task.priority.0),
            state: AtomicU8::new(TaskState::Ready as u8),
            task,
        }
    }

    pub fn name(&self) -> &str {
        self.task.name.as_str()
    }

    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Deleted is terminal; later transitions are ignored
    pub fn set_state(&self, state: TaskState) {
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                (cur != TaskState::Deleted as u8).then_some(state as u8)
            });
    }

    pub fn is_deleted(&self) -> bool {
        self.state() == TaskState::Deleted
    }
}

/// Narrow scheduler capability: read and change a task's priority
///
/// The consumer decides *when* to reprioritize; implementors decide *how*.
pub trait PriorityControl {
    fn priority(&self) -> TaskPriority;
    fn set_priority(&self, priority: TaskPriority);
}

impl PriorityControl for TaskControlBlock {
    fn priority(&self) -> TaskPriority {
        TaskPriority(self.priority.load(Ordering::Acquire))
    }

    fn set_priority(&self, priority: TaskPriority) {
        self.priority.store(priority.0, Ordering::Release);
    }
}

impl<P: PriorityControl + ?Sized> PriorityControl for &P {
    fn priority(&self) -> TaskPriority {
        (**self).priority()
    }

    fn set_priority(&self, priority: TaskPriority) {
        (**self).set_priority(priority)
    }
}

#[cfg(feature = "std")]
pub use handle::TaskHandle;

#[cfg(feature = "std")]
mod handle {
    use std::sync::Arc;

    use super::{PriorityControl, Task, TaskControlBlock, TaskPriority, TaskState};

    /// Cloneable reference to a task created by the kernel
    #[derive(Debug, Clone)]
    pub struct TaskHandle(Arc<TaskControlBlock>);

    impl TaskHandle {
        pub fn new(task: Task) -> Self {
            Self(Arc::new(TaskControlBlock::new(task)))
        }

        pub fn name(&self) -> &str {
            self.0.name()
        }

        pub fn state(&self) -> TaskState {
            self.0.state()
        }

        pub fn set_state(&self, state: TaskState) {
            self.0.set_state(state)
        }

        pub fn is_deleted(&self) -> bool {
            self.0.is_deleted()
        }
    }

    impl PriorityControl for TaskHandle {
        fn priority(&self) -> TaskPriority {
            self.0.priority()
        }

        fn set_priority(&self, priority: TaskPriority) {
            log::trace!(target: "kernel", "{} priority {} -> {}", self.name(), self.0.priority(), priority);
            self.0.set_priority(priority)
        }
    }
}
