//! Record — the fixed-layout value carried by the queue

use core::fmt;

/// One sample of the external input: an identifier and a signed value.
///
/// Copied by value into and out of the queue; no identity beyond its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(C)]
pub struct Record {
    /// Selects the consumer's branch (0 = delete, 1 = priority control)
    pub id: u8,
    /// Sub-command for `id == 1`
    pub value: i32,
}

impl Record {
    pub const fn new(id: u8, value: i32) -> Self {
        Self { id, value }
    }
}

impl From<(u8, i32)> for Record {
    fn from((id, value): (u8, i32)) -> Self {
        Self { id, value }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dataID: {} | DataValue: {}", self.id, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tuple() {
        assert_eq!(Record::from((1, -7)), Record::new(1, -7));
    }

    #[test]
    fn test_default_is_zero() {
        let r = Record::default();
        assert_eq!(r.id, 0);
        assert_eq!(r.value, 0);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_display() {
        assert_eq!(Record::new(1, 2).to_string(), "dataID: 1 | DataValue: 2");
        assert_eq!(Record::new(7, -40).to_string(), "dataID: 7 | DataValue: -40");
    }
}
