//! Fixed-priority task table
//!
//! Static table of registered tasks, no dynamic allocation. Preemption
//! itself belongs to the host; the table decides who starts first.

use crate::config::MAX_TASKS;
use crate::task::{Task, TaskPriority};

/// Task table
///
/// Size: MAX_TASKS × sizeof(Option<Task>) + overhead
pub struct Scheduler {
    /// Static task table
    tasks: [Option<Task>; MAX_TASKS],
    /// Number of registered tasks
    task_count: usize,
}

impl Scheduler {
    /// Create empty scheduler
    pub const fn new() -> Self {
        Self {
            tasks: [None; MAX_TASKS],
            task_count: 0,
        }
    }

    /// Register a task, returns slot index
    pub fn register(&mut self, task: Task) -> Option<usize> {
        if self.task_count >= MAX_TASKS {
            return None;
        }
        let idx = self.task_count;
        self.tasks[idx] = Some(task);
        self.task_count += 1;
        Some(idx)
    }

    /// Get task by index
    pub fn get_task(&self, idx: usize) -> Option<&Task> {
        self.tasks[..self.task_count].get(idx)?.as_ref()
    }

    /// Number of registered tasks
    pub fn active_task_count(&self) -> usize {
        self.task_count
    }

    /// Is the table full?
    pub fn is_full(&self) -> bool {
        self.task_count >= MAX_TASKS
    }

    /// Slot indices, most urgent first; ties keep registration order
    pub fn launch_order(&self) -> LaunchOrder<'_> {
        LaunchOrder {
            scheduler: self,
            picked: 0,
        }
    }

    /// Highest-priority slot not yet in `picked`
    fn find_highest_priority(&self, picked: u32) -> Option<usize> {
        let mut best_idx = None;
        let mut best_priority = TaskPriority::IDLE;

        for (i, slot) in self.tasks[..self.task_count].iter().enumerate() {
            if picked & (1 << i) != 0 {
                continue;
            }
            if let Some(task) = slot {
                if best_idx.is_none() || task.priority > best_priority {
                    best_priority = task.priority;
                    best_idx = Some(i);
                }
            }
        }
        best_idx
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`Scheduler::launch_order`]
pub struct LaunchOrder<'a> {
    scheduler: &'a Scheduler,
    /// Bitmask of slots already yielded
    picked: u32,
}

impl Iterator for LaunchOrder<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let idx = self.scheduler.find_highest_priority(self.picked)?;
        self.picked |= 1 << idx;
        Some(idx)
    }
}

const _: () = assert!(MAX_TASKS <= u32::BITS as usize);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Task, TaskPriority};

    #[test]
    fn test_scheduler_empty() {
        let sched = Scheduler::new();
        assert_eq!(sched.active_task_count(), 0);
        assert_eq!(sched.launch_order().next(), None);
    }

    #[test]
    fn test_register_task() {
        let mut sched = Scheduler::new();
        let idx = sched.register(Task::new("producer", 1000, TaskPriority::NORMAL));
        assert_eq!(idx, Some(0));
        assert_eq!(sched.active_task_count(), 1);
        assert_eq!(sched.get_task(0).map(|t| t.name.as_str()), Some("producer"));
        assert!(sched.get_task(1).is_none());
    }

    #[test]
    fn test_table_full() {
        let mut sched = Scheduler::new();
        for _ in 0..MAX_TASKS {
            assert!(sched.register(Task::new("t", 64, TaskPriority::LOW)).is_some());
        }
        assert!(sched.is_full());
        assert_eq!(sched.register(Task::new("extra", 64, TaskPriority::LOW)), None);
    }

    #[test]
    fn test_launch_order_by_priority() {
        let mut sched = Scheduler::new();
        sched.register(Task::new("consumer", 1000, TaskPriority(1)));
        sched.register(Task::new("producer", 1000, TaskPriority(2)));
        sched.register(Task::new("idle", 100, TaskPriority::IDLE));

        let order: [Option<usize>; 4] = {
            let mut it = sched.launch_order();
            [it.next(), it.next(), it.next(), it.next()]
        };
        assert_eq!(order, [Some(1), Some(0), Some(2), None]);
    }

    #[test]
    fn test_launch_order_ties_keep_registration_order() {
        let mut sched = Scheduler::new();
        sched.register(Task::new("a", 64, TaskPriority::NORMAL));
        sched.register(Task::new("b", 64, TaskPriority::NORMAL));
        sched.register(Task::new("c", 64, TaskPriority::HIGH));

        let mut it = sched.launch_order();
        assert_eq!(it.next(), Some(2));
        assert_eq!(it.next(), Some(0));
        assert_eq!(it.next(), Some(1));
    }
}
