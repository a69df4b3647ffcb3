//! Lock-free SPSC (Single-Producer, Single-Consumer) ring buffer
//!
//! Storage for the inter-task queue. No heap, no mutex, no critical sections.
//! Read and write positions are free-running counters, so all `N` slots are
//! usable and a full ring is `write - read == N`.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Lock-free SPSC ring buffer
///
/// Fixed-size, no-alloc. With `&mut` access it behaves like a plain FIFO;
/// shared access goes through the crate's blocking channel, which owns the
/// only pushing and the only popping side.
pub struct SpscRing<T, const N: usize> {
    /// Ring buffer storage
    buffer: [UnsafeCell<MaybeUninit<T>>; N],
    /// Total items ever written (owned by producer)
    write_idx: AtomicUsize,
    /// Total items ever read (owned by consumer)
    read_idx: AtomicUsize,
}

// SAFETY: a slot is written only by the producer while it is outside the
// readable window and read only by the consumer while inside it. The
// Release store of an index publishes the slot to the other side.
unsafe impl<T: Send, const N: usize> Sync for SpscRing<T, N> {}

impl<T: Copy, const N: usize> SpscRing<T, N> {
    /// Create a new empty ring buffer
    pub const fn new() -> Self {
        Self {
            buffer: [const { UnsafeCell::new(MaybeUninit::uninit()) }; N],
            write_idx: AtomicUsize::new(0),
            read_idx: AtomicUsize::new(0),
        }
    }

    /// Push a value
    ///
    /// Hands the value back if the buffer is full.
    pub fn push(&mut self, value: T) -> Result<(), T> {
        // SAFETY: `&mut self` excludes every other producer and consumer.
        unsafe { self.push_shared(value) }
    }

    /// Pop the oldest value
    pub fn pop(&mut self) -> Option<T> {
        // SAFETY: `&mut self` excludes every other producer and consumer.
        unsafe { self.pop_shared() }
    }

    /// # Safety
    ///
    /// At most one thread may be pushing at any time.
    pub(crate) unsafe fn push_shared(&self, value: T) -> Result<(), T> {
        let write = self.write_idx.load(Ordering::Relaxed);
        let read = self.read_idx.load(Ordering::Acquire);

        if write.wrapping_sub(read) >= N {
            return Err(value); // Full
        }

        // SAFETY: slot `write % N` is outside the readable window, and the
        // caller guarantees no other writer.
        unsafe { (*self.buffer[write % N].get()).write(value) };
        self.write_idx.store(write.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// # Safety
    ///
    /// At most one thread may be popping at any time.
    pub(crate) unsafe fn pop_shared(&self) -> Option<T> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None; // Empty
        }

        // SAFETY: the Acquire load above observed the producer's Release
        // store for this slot, so it is initialized.
        let value = unsafe { (*self.buffer[read % N].get()).assume_init_read() };
        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(value)
    }

    /// Number of items in the buffer
    pub fn len(&self) -> usize {
        let read = self.read_idx.load(Ordering::Acquire);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read).min(N)
    }

    /// Is the buffer empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Is the buffer full?
    pub fn is_full(&self) -> bool {
        self.len() == N
    }

    /// Total capacity
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<T: Copy, const N: usize> Default for SpscRing<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    #[test]
    fn test_push_pop() {
        let mut ring = SpscRing::<Record, 5>::new();
        assert!(ring.is_empty());

        ring.push(Record::new(1, 42)).unwrap();
        assert_eq!(ring.len(), 1);
        assert!(!ring.is_empty());

        assert_eq!(ring.pop(), Some(Record::new(1, 42)));
        assert!(ring.is_empty());
    }

    #[test]
    fn test_full_buffer_uses_every_slot() {
        let mut ring = SpscRing::<u32, 5>::new();
        for i in 0..5 {
            assert!(ring.push(i).is_ok());
        }
        assert!(ring.is_full());
        assert_eq!(ring.push(5), Err(5)); // 6th push rejected, item handed back
        for i in 0..5 {
            assert_eq!(ring.pop(), Some(i));
        }
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn test_fifo_order() {
        let mut ring = SpscRing::<u32, 8>::new();
        for i in 0..5 {
            ring.push(i).unwrap();
        }
        for i in 0..5 {
            assert_eq!(ring.pop(), Some(i));
        }
    }

    #[test]
    fn test_wraparound() {
        let mut ring = SpscRing::<u32, 4>::new();
        for round in 0..5 {
            for i in 0..4 {
                assert!(ring.push(round * 10 + i).is_ok());
            }
            for i in 0..4 {
                assert_eq!(ring.pop(), Some(round * 10 + i));
            }
        }
    }

    #[test]
    fn test_zero_capacity_rejects_everything() {
        let mut ring = SpscRing::<u32, 0>::new();
        assert_eq!(ring.push(1), Err(1));
        assert_eq!(ring.pop(), None);
        assert!(ring.is_full());
    }

    #[test]
    fn test_capacity() {
        let ring = SpscRing::<u32, 16>::new();
        assert_eq!(ring.capacity(), 16);
    }
}
