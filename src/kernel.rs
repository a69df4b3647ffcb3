//! Kernel — host runtime for the tasks
//!
//! Combines the task table, a heap budget and the system clock into one
//! kernel instance: create queues and tasks, then `start()` hands control to
//! the scheduler. Each task runs on its own named OS thread; the host does
//! the preemption. A task is deleted by returning from its entry point.

use std::mem::size_of;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_utils::sync::{Parker, Unparker};
use log::{debug, error, info};

use crate::channel::{self, Receiver, Sender};
use crate::config::{MIN_HOST_STACK_BYTES, QUEUE_HEADER_BYTES, STACK_WORD_BYTES, TOTAL_HEAP_BYTES};
use crate::error::KernelError;
use crate::scheduler::Scheduler;
use crate::task::{Task, TaskControlBlock, TaskHandle, TaskPriority, TaskState};
use crate::timer::SysClock;

type TaskEntry = Box<dyn FnOnce(TaskHandle) + Send + 'static>;

/// Runtime knobs
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct KernelConfig {
    /// Budget for task stacks and queue storage
    pub heap_bytes: usize,
    /// Floor for the real host thread stack
    pub min_stack_bytes: usize,
}

impl KernelConfig {
    pub fn with_heap_bytes(self, heap_bytes: usize) -> Self {
        Self { heap_bytes, ..self }
    }

    pub fn with_min_stack_bytes(self, min_stack_bytes: usize) -> Self {
        Self { min_stack_bytes, ..self }
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            heap_bytes: TOTAL_HEAP_BYTES,
            min_stack_bytes: MIN_HOST_STACK_BYTES,
        }
    }
}

/// Host RTOS kernel
pub struct Kernel {
    config: KernelConfig,
    /// Task table
    scheduler: Scheduler,
    /// Live control blocks, indexed like the table
    handles: Vec<TaskHandle>,
    /// Entry points, taken when the task is started
    entries: Vec<Option<TaskEntry>>,
    /// Heap charged so far
    heap_used: usize,
    /// System clock shared with the tasks
    clock: Arc<SysClock>,
}

impl Kernel {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            config,
            scheduler: Scheduler::new(),
            handles: Vec::new(),
            entries: Vec::new(),
            heap_used: 0,
            clock: Arc::new(SysClock::new()),
        }
    }

    /// System clock
    pub fn clock(&self) -> Arc<SysClock> {
        Arc::clone(&self.clock)
    }

    /// Heap still available for tasks and queues
    pub fn heap_available(&self) -> usize {
        self.config.heap_bytes - self.heap_used
    }

    fn allocate(&mut self, bytes: usize) -> Result<(), KernelError> {
        let available = self.heap_available();
        if bytes > available {
            return Err(KernelError::OutOfHeap {
                requested: bytes,
                available,
            });
        }
        self.heap_used += bytes;
        Ok(())
    }

    /// Create a queue of `N` items
    pub fn create_channel<T: Copy + Send, const N: usize>(
        &mut self,
    ) -> Result<(Sender<T, N>, Receiver<T, N>), KernelError> {
        let bytes = N.saturating_mul(size_of::<T>()).saturating_add(QUEUE_HEADER_BYTES);
        if N == 0 {
            return Err(KernelError::ChannelCreation { capacity: N, bytes });
        }
        if let Err(e) = self.allocate(bytes) {
            debug!(target: "kernel", "queue of {} rejected: {e}", N);
            return Err(KernelError::ChannelCreation { capacity: N, bytes });
        }
        debug!(target: "kernel", "queue created: {} × {} bytes", N, size_of::<T>());
        Ok(channel::bounded())
    }

    /// Register a task; it runs once the scheduler is started
    pub fn create_task<F>(
        &mut self,
        name: &str,
        stack_words: usize,
        priority: TaskPriority,
        entry: F,
    ) -> Result<TaskHandle, KernelError>
    where
        F: FnOnce(TaskHandle) + Send + 'static,
    {
        if self.scheduler.is_full() {
            return Err(KernelError::TooManyTasks);
        }
        let bytes = stack_words
            .saturating_mul(STACK_WORD_BYTES)
            .saturating_add(size_of::<TaskControlBlock>());
        self.allocate(bytes)?;

        let task = Task::new(name, stack_words, priority);
        let idx = self.scheduler.register(task).ok_or(KernelError::TooManyTasks)?;
        debug_assert_eq!(idx, self.handles.len());

        let handle = TaskHandle::new(task);
        self.handles.push(handle.clone());
        self.entries.push(Some(Box::new(entry)));
        debug!(target: "kernel", "task {name} created at priority {priority}");
        Ok(handle)
    }

    /// Number of created tasks
    pub fn task_count(&self) -> usize {
        self.scheduler.active_task_count()
    }

    /// Start the scheduler
    ///
    /// Runs every task, most urgent first, and returns once all of them
    /// have been deleted. With a task that loops forever it never returns.
    ///
    /// Threads wait at a launch gate until every task has been spawned. If a
    /// spawn fails, the tasks already spawned are deleted without running and
    /// joined before the error is returned.
    pub fn start(mut self) -> Result<KernelStats, KernelError> {
        let gate = Arc::new(AtomicU8::new(GATE_PENDING));
        let mut running: Vec<(TaskHandle, JoinHandle<()>)> = Vec::with_capacity(self.handles.len());
        let mut wakers: Vec<Unparker> = Vec::with_capacity(self.handles.len());

        for idx in self.scheduler.launch_order() {
            let Some(stack_words) = self.scheduler.get_task(idx).map(|t| t.stack_words) else {
                continue;
            };
            let Some(entry) = self.entries[idx].take() else {
                continue;
            };
            let handle = self.handles[idx].clone();
            let stack_bytes = stack_words
                .saturating_mul(STACK_WORD_BYTES)
                .max(self.config.min_stack_bytes);

            let parker = Parker::new();
            let waker = parker.unparker().clone();
            let task = handle.clone();
            let task_gate = Arc::clone(&gate);
            let spawned = thread::Builder::new()
                .name(handle.name().to_owned())
                .stack_size(stack_bytes)
                .spawn(move || {
                    let _deleted = DeleteOnExit(task.clone());
                    if !wait_for_launch(&task_gate, &parker) {
                        return;
                    }
                    task.set_state(TaskState::Running);
                    entry(task);
                });
            match spawned {
                Ok(join) => {
                    running.push((handle, join));
                    wakers.push(waker);
                }
                Err(e) => {
                    error!(target: "kernel", "task {} could not be started: {e}", handle.name());
                    gate.store(GATE_ABORT, Ordering::Release);
                    wakers.iter().for_each(Unparker::unpark);
                    for (started, join) in running {
                        if join.join().is_err() {
                            error!(target: "kernel", "task {} panicked", started.name());
                        }
                    }
                    return Err(KernelError::Spawn {
                        task: handle.name().to_owned(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        gate.store(GATE_OPEN, Ordering::Release);
        wakers.iter().for_each(Unparker::unpark);
        info!(target: "kernel", "scheduler started with {} tasks", running.len());

        let tasks_started = running.len();
        let mut failure = None;
        for (handle, join) in running {
            if join.join().is_err() {
                error!(target: "kernel", "task {} panicked", handle.name());
                failure.get_or_insert_with(|| KernelError::TaskPanicked(handle.name().to_owned()));
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }

        Ok(KernelStats {
            tasks_started,
            tasks_deleted: self.handles.iter().filter(|h| h.is_deleted()).count(),
            heap_used: self.heap_used,
        })
    }
}

const GATE_PENDING: u8 = 0;
const GATE_OPEN: u8 = 1;
const GATE_ABORT: u8 = 2;

/// Block until the scheduler opens or aborts the launch; `true` means run
fn wait_for_launch(gate: &AtomicU8, parker: &Parker) -> bool {
    loop {
        match gate.load(Ordering::Acquire) {
            GATE_OPEN => return true,
            GATE_ABORT => return false,
            _ => parker.park(),
        }
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new(KernelConfig::default())
    }
}

/// Marks the task deleted when its thread leaves the entry point, by return
/// or by unwinding
struct DeleteOnExit(TaskHandle);

impl Drop for DeleteOnExit {
    fn drop(&mut self) {
        self.0.set_state(TaskState::Deleted);
        debug!(target: "kernel", "task {} deleted", self.0.name());
    }
}

/// Kernel execution statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelStats {
    /// Tasks handed to the host
    pub tasks_started: usize,
    /// Tasks that reached the deleted state
    pub tasks_deleted: usize,
    /// Heap charged for tasks and queues
    pub heap_used: usize,
}
