//! Bounded node values

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};

/// Largest node value accepted unless configured otherwise.
pub const DEFAULT_MAX_VALUE: u32 = 1000;

/// Inclusive value range `1..=max` for node values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueBound {
    max: u32,
}

impl Default for ValueBound {
    fn default() -> Self {
        Self {
            max: DEFAULT_MAX_VALUE,
        }
    }
}

impl ValueBound {
    /// Create a bound; `max` must be at least 1.
    pub fn new(max: u32) -> DomainResult<Self> {
        if max == 0 {
            return Err(DomainError::InvalidParameter(
                "maximum node value must be at least 1".to_string(),
            ));
        }
        Ok(Self { max })
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn contains(&self, value: i64) -> bool {
        (1..=i64::from(self.max)).contains(&value)
    }

    /// Validate a raw value, never clamping.
    pub fn check(&self, value: i64) -> DomainResult<u32> {
        if self.contains(value) {
            // in range, so it fits into u32
            Ok(value as u32)
        } else {
            Err(DomainError::ValueOutOfRange {
                value,
                max: self.max,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        let bound = ValueBound::default();
        assert_eq!(bound.check(1), Ok(1));
        assert_eq!(bound.check(1000), Ok(1000));
        assert!(bound.check(0).is_err());
        assert!(bound.check(1001).is_err());
        assert!(bound.check(-5).is_err());
    }

    #[test]
    fn test_zero_max_is_rejected() {
        assert!(ValueBound::new(0).is_err());
        assert_eq!(ValueBound::new(7).unwrap().max(), 7);
    }
}
