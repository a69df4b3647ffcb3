//! External input — what the producer samples each cycle
//!
//! The `(id, value)` pair is written by code outside the two tasks. It is
//! packed into a single `AtomicU64` so a reader never sees the id of one
//! update paired with the value of another.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::record::Record;

/// Source of the record the producer posts each cycle
pub trait InputSource {
    fn sample(&self) -> Record;
}

/// Lock-free cell holding the latest `(id, value)` pair
#[derive(Debug)]
pub struct SharedInput {
    packed: AtomicU64,
}

impl SharedInput {
    pub const fn new(id: u8, value: i32) -> Self {
        Self {
            packed: AtomicU64::new(pack(Record::new(id, value))),
        }
    }

    /// Publish a new pair; readers see both fields change together
    pub fn set(&self, id: u8, value: i32) {
        self.store(Record::new(id, value));
    }

    pub fn store(&self, record: Record) {
        self.packed.store(pack(record), Ordering::Release);
    }

    pub fn load(&self) -> Record {
        unpack(self.packed.load(Ordering::Acquire))
    }
}

impl Default for SharedInput {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl InputSource for SharedInput {
    fn sample(&self) -> Record {
        self.load()
    }
}

impl<S: InputSource + ?Sized> InputSource for &S {
    fn sample(&self) -> Record {
        (**self).sample()
    }
}

#[cfg(feature = "std")]
impl<S: InputSource + ?Sized> InputSource for std::sync::Arc<S> {
    fn sample(&self) -> Record {
        (**self).sample()
    }
}

/// Input computed by a closure on every sample
pub struct FromFn<F>(F);

/// Wrap a closure as an [`InputSource`]
pub fn from_fn<F: Fn() -> Record>(f: F) -> FromFn<F> {
    FromFn(f)
}

impl<F: Fn() -> Record> InputSource for FromFn<F> {
    fn sample(&self) -> Record {
        (self.0)()
    }
}

#[cfg(feature = "std")]
pub use scripted::ScriptedInput;

#[cfg(feature = "std")]
mod scripted {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::InputSource;
    use crate::record::Record;

    /// Plays a fixed list of records, one per sample, then repeats `idle`
    #[derive(Debug)]
    pub struct ScriptedInput {
        script: Vec<Record>,
        cursor: AtomicUsize,
        idle: Record,
    }

    impl ScriptedInput {
        pub fn new(script: impl IntoIterator<Item = Record>, idle: Record) -> Self {
            Self {
                script: script.into_iter().collect(),
                cursor: AtomicUsize::new(0),
                idle,
            }
        }

        /// Samples taken so far
        pub fn position(&self) -> usize {
            self.cursor.load(Ordering::Acquire)
        }
    }

    impl InputSource for ScriptedInput {
        fn sample(&self) -> Record {
            let i = self.cursor.fetch_add(1, Ordering::AcqRel);
            self.script.get(i).copied().unwrap_or(self.idle)
        }
    }
}

const fn pack(record: Record) -> u64 {
    ((record.id as u64) << 32) | (record.value as u32 as u64)
}

const fn unpack(raw: u64) -> Record {
    Record {
        id: (raw >> 32) as u8,
        value: raw as u32 as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_keeps_sign() {
        for r in [
            Record::new(0, 0),
            Record::new(1, -1),
            Record::new(255, i32::MIN),
            Record::new(7, i32::MAX),
        ] {
            assert_eq!(unpack(pack(r)), r);
        }
    }

    #[test]
    fn test_shared_input_set() {
        let input = SharedInput::default();
        assert_eq!(input.sample(), Record::new(0, 0));
        input.set(1, 2);
        assert_eq!(input.sample(), Record::new(1, 2));
    }

    #[test]
    fn test_from_fn() {
        let input = from_fn(|| Record::new(3, 4));
        assert_eq!(input.sample(), Record::new(3, 4));
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_scripted_then_idle() {
        let input = ScriptedInput::new([Record::new(1, 0), Record::new(1, 1)], Record::new(9, 9));
        assert_eq!(input.sample(), Record::new(1, 0));
        assert_eq!(input.sample(), Record::new(1, 1));
        assert_eq!(input.sample(), Record::new(9, 9));
        assert_eq!(input.position(), 3);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_shared_input_never_tears() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let input = SharedInput::new(1, 1);
        let done = AtomicBool::new(false);
        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..10_000 {
                    if i % 2 == 0 {
                        input.set(2, -2);
                    } else {
                        input.set(1, 1);
                    }
                }
                done.store(true, Ordering::Release);
            });
            while !done.load(Ordering::Acquire) {
                let r = input.sample();
                assert!(r == Record::new(1, 1) || r == Record::new(2, -2), "torn read: {r:?}");
            }
        });
    }
}
