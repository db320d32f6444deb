//! Counter value

use serde::{Deserialize, Serialize};

/// A single numeric counter
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
    sqlx::FromRow,
)]
pub struct CounterData {
    pub value: i64,
}

impl CounterData {
    pub fn new(value: i64) -> Self {
        Self { value }
    }

    /// Adds one, saturating at `i64::MAX`
    pub fn increment(&mut self) -> i64 {
        self.value = self.value.saturating_add(1);
        self.value
    }

    /// Subtracts one, saturating at `i64::MIN`
    pub fn decrement(&mut self) -> i64 {
        self.value = self.value.saturating_sub(1);
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_decrement() {
        let mut counter = CounterData::default();
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.decrement(), 1);
    }

    #[test]
    fn test_saturates() {
        let mut counter = CounterData::new(i64::MAX);
        assert_eq!(counter.increment(), i64::MAX);

        let mut counter = CounterData::new(i64::MIN);
        assert_eq!(counter.decrement(), i64::MIN);
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&CounterData::new(42)).unwrap();
        assert_eq!(json, r#"{"value":42}"#);
    }
}
