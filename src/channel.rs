//! Bounded blocking queue built on [`SpscRing`]
//!
//! One [`Sender`], one [`Receiver`], neither `Clone`, so the ring's
//! single-producer/single-consumer contract holds by construction. Either
//! side blocks by parking its thread; the other side unparks it after every
//! push or pop. Parking is token based, so an unpark that lands before the
//! park is never lost.
//!
//! The queue storage outlives a deleted consumer: with the receiver gone,
//! sends keep succeeding until the ring is full, as with a global RTOS queue.
//! A receiver only learns of a gone sender once the ring is drained.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_utils::sync::{Parker, Unparker};

use crate::spsc::SpscRing;

/// How long a send or receive may block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Fail at once instead of blocking
    NoWait,
    /// Block at most this long
    After(Duration),
    /// Block until the operation can complete
    Forever,
}

impl Timeout {
    fn deadline(self) -> Option<Option<Instant>> {
        match self {
            Timeout::NoWait => None,
            Timeout::After(d) => Some(Instant::now().checked_add(d)),
            Timeout::Forever => Some(None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError<T> {
    /// Queue stayed full for the whole timeout; the item is handed back
    Full(T),
}

impl<T> SendError<T> {
    pub fn into_inner(self) -> T {
        match self {
            SendError::Full(item) => item,
        }
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Full(_) => write!(f, "queue full"),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for SendError<T> {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    /// Nothing arrived within the timeout
    Empty,
    /// Sender is gone and the queue is drained
    Disconnected,
}

impl fmt::Display for RecvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecvError::Empty => write!(f, "queue empty"),
            RecvError::Disconnected => write!(f, "sender deleted"),
        }
    }
}

impl std::error::Error for RecvError {}

struct Shared<T, const N: usize> {
    ring: SpscRing<T, N>,
    sender_alive: AtomicBool,
}

/// Create a queue holding up to `N` items
pub fn bounded<T: Copy + Send, const N: usize>() -> (Sender<T, N>, Receiver<T, N>) {
    let shared = Arc::new(Shared {
        ring: SpscRing::new(),
        sender_alive: AtomicBool::new(true),
    });
    let send_parker = Parker::new();
    let recv_parker = Parker::new();
    let wake_sender = send_parker.unparker().clone();
    let wake_receiver = recv_parker.unparker().clone();
    let sender = Sender {
        shared: Arc::clone(&shared),
        parker: send_parker,
        wake_receiver,
    };
    let receiver = Receiver {
        shared,
        parker: recv_parker,
        wake_sender,
    };
    (sender, receiver)
}

/// Producer end of a bounded queue
pub struct Sender<T: Copy, const N: usize> {
    shared: Arc<Shared<T, N>>,
    parker: Parker,
    wake_receiver: Unparker,
}

impl<T: Copy, const N: usize> Sender<T, N> {
    /// Post an item, blocking for at most `timeout` while the queue is full
    ///
    /// Once the receiver is dropped nothing drains the ring, so a
    /// `Timeout::Forever` send on a full queue never returns.
    pub fn send(&mut self, item: T, timeout: Timeout) -> Result<(), SendError<T>> {
        let deadline = timeout.deadline();
        let mut item = item;
        loop {
            // SAFETY: the only `Sender` is borrowed mutably here.
            match unsafe { self.shared.ring.push_shared(item) } {
                Ok(()) => {
                    self.wake_receiver.unpark();
                    return Ok(());
                }
                Err(rejected) => item = rejected,
            }
            if !park(&self.parker, deadline) {
                return Err(SendError::Full(item));
            }
        }
    }

    /// Post an item without blocking
    pub fn try_send(&mut self, item: T) -> Result<(), SendError<T>> {
        self.send(item, Timeout::NoWait)
    }

    pub fn len(&self) -> usize {
        self.shared.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.ring.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.shared.ring.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<T: Copy, const N: usize> Drop for Sender<T, N> {
    fn drop(&mut self) {
        self.shared.sender_alive.store(false, Ordering::Release);
        self.wake_receiver.unpark();
    }
}

/// Consumer end of a bounded queue
pub struct Receiver<T: Copy, const N: usize> {
    shared: Arc<Shared<T, N>>,
    parker: Parker,
    wake_sender: Unparker,
}

impl<T: Copy, const N: usize> Receiver<T, N> {
    /// Take the oldest item, blocking for at most `timeout` while empty
    ///
    /// Items already queued are still delivered after the sender is gone.
    pub fn recv(&mut self, timeout: Timeout) -> Result<T, RecvError> {
        let deadline = timeout.deadline();
        loop {
            // Read liveness first: a push that happened before the sender
            // dropped is then guaranteed visible to the pop below.
            let sender_alive = self.shared.sender_alive.load(Ordering::Acquire);
            // SAFETY: the only `Receiver` is borrowed mutably here.
            if let Some(item) = unsafe { self.shared.ring.pop_shared() } {
                self.wake_sender.unpark();
                return Ok(item);
            }
            if !sender_alive {
                return Err(RecvError::Disconnected);
            }
            if !park(&self.parker, deadline) {
                return Err(RecvError::Empty);
            }
        }
    }

    /// Take the oldest item without blocking
    pub fn try_recv(&mut self) -> Result<T, RecvError> {
        self.recv(Timeout::NoWait)
    }

    pub fn len(&self) -> usize {
        self.shared.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.ring.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

/// Park until unparked or `deadline`; `false` means give up now
fn park(parker: &Parker, deadline: Option<Option<Instant>>) -> bool {
    match deadline {
        None => false,
        Some(None) => {
            parker.park();
            true
        }
        Some(Some(at)) => {
            let now = Instant::now();
            if now >= at {
                return false;
            }
            parker.park_timeout(at - now);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use std::thread;

    #[test]
    fn test_try_send_until_full() {
        let (mut tx, mut rx) = bounded::<Record, 5>();
        for i in 0..5 {
            assert!(tx.try_send(Record::new(1, i)).is_ok());
        }
        assert!(tx.is_full());
        assert_eq!(tx.try_send(Record::new(1, 5)), Err(SendError::Full(Record::new(1, 5))));

        for i in 0..5 {
            assert_eq!(rx.try_recv(), Ok(Record::new(1, i)));
        }
        assert_eq!(rx.try_recv(), Err(RecvError::Empty));
    }

    #[test]
    fn test_recv_timeout_expires() {
        let (_tx, mut rx) = bounded::<u32, 2>();
        let start = Instant::now();
        assert_eq!(rx.recv(Timeout::After(Duration::from_millis(20))), Err(RecvError::Empty));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_recv_forever_wakes_on_send() {
        let (mut tx, mut rx) = bounded::<u32, 2>();
        let consumer = thread::spawn(move || rx.recv(Timeout::Forever));
        thread::sleep(Duration::from_millis(20));
        tx.try_send(42).unwrap();
        assert_eq!(consumer.join().unwrap(), Ok(42));
    }

    #[test]
    fn test_blocking_send_waits_for_room() {
        let (mut tx, mut rx) = bounded::<u32, 1>();
        tx.try_send(1).unwrap();
        let producer = thread::spawn(move || tx.send(2, Timeout::Forever));
        thread::sleep(Duration::from_millis(20));
        assert_eq!(rx.recv(Timeout::Forever), Ok(1));
        assert_eq!(producer.join().unwrap(), Ok(()));
        assert_eq!(rx.recv(Timeout::Forever), Ok(2));
    }

    #[test]
    fn test_send_timeout_when_full() {
        let (mut tx, _rx) = bounded::<u32, 1>();
        tx.try_send(1).unwrap();
        let err = tx.send(2, Timeout::After(Duration::from_millis(10))).unwrap_err();
        assert_eq!(err, SendError::Full(2));
        assert_eq!(err.into_inner(), 2);
    }

    #[test]
    fn test_receiver_drains_after_sender_dropped() {
        let (mut tx, mut rx) = bounded::<u32, 4>();
        tx.try_send(1).unwrap();
        tx.try_send(2).unwrap();
        drop(tx);
        assert_eq!(rx.recv(Timeout::Forever), Ok(1));
        assert_eq!(rx.recv(Timeout::Forever), Ok(2));
        assert_eq!(rx.recv(Timeout::Forever), Err(RecvError::Disconnected));
    }

    #[test]
    fn test_queue_outlives_receiver() {
        let (mut tx, rx) = bounded::<u32, 5>();
        drop(rx);
        for i in 0..5 {
            assert_eq!(tx.try_send(i), Ok(()));
        }
        assert!(tx.is_full());
        assert_eq!(tx.try_send(5), Err(SendError::Full(5)));
    }

    #[test]
    fn test_fifo_across_threads() {
        let (mut tx, mut rx) = bounded::<u32, 5>();
        let producer = thread::spawn(move || {
            for i in 0..500 {
                tx.send(i, Timeout::Forever).unwrap();
            }
        });
        for i in 0..500 {
            assert_eq!(rx.recv(Timeout::Forever), Ok(i));
        }
        producer.join().unwrap();
        assert_eq!(rx.recv(Timeout::Forever), Err(RecvError::Disconnected));
    }
}
