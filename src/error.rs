//! Kernel errors

use std::fmt;

/// Failures of the host runtime's creation and start calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// A queue could not be created (zero capacity or no heap left)
    ChannelCreation { capacity: usize, bytes: usize },
    /// Not enough kernel heap for a task stack
    OutOfHeap { requested: usize, available: usize },
    /// Task table is full
    TooManyTasks,
    /// The host refused to start a thread for a task
    Spawn { task: String, reason: String },
    /// A task panicked instead of returning
    TaskPanicked(String),
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::ChannelCreation { capacity, bytes } => {
                write!(f, "queue creation failed (capacity {capacity}, {bytes} bytes)")
            }
            KernelError::OutOfHeap { requested, available } => {
                write!(f, "out of kernel heap: requested {requested} bytes, {available} available")
            }
            KernelError::TooManyTasks => write!(f, "task table full"),
            KernelError::Spawn { task, reason } => write!(f, "failed to start task {task}: {reason}"),
            KernelError::TaskPanicked(task) => write!(f, "task {task} panicked"),
        }
    }
}

impl std::error::Error for KernelError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = KernelError::OutOfHeap { requested: 4096, available: 100 };
        assert_eq!(err.to_string(), "out of kernel heap: requested 4096 bytes, 100 available");
        assert_eq!(
            KernelError::ChannelCreation { capacity: 0, bytes: 80 }.to_string(),
            "queue creation failed (capacity 0, 80 bytes)"
        );
    }
}
