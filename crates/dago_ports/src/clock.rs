//! Wall-clock abstraction used by the in-memory ports.

use chrono::{DateTime, Utc};

/// Trait for providing the current wall-clock time.
///
/// Implement this for custom time providers (e.g., a mock clock for testing).
pub trait ClockProvider: Send + Sync + 'static {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// System clock provider using [`Utc::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockProvider for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use chrono::{TimeDelta, Utc};
/// use dago_ports::clock::{ClockProvider, MockClock};
///
/// let start = Utc::now();
/// let mock = Arc::new(MockClock::new(start));
/// mock.advance(TimeDelta::seconds(60));
/// assert_eq!(mock.now() - start, TimeDelta::seconds(60));
/// ```
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug)]
pub struct MockClock {
    current: parking_lot::RwLock<DateTime<Utc>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockClock {
    /// Creates a mock clock set to the given time.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: parking_lot::RwLock::new(start),
        }
    }

    /// Advances the clock by the given delta.
    pub fn advance(&self, delta: chrono::TimeDelta) {
        *self.current.write() += delta;
    }

    /// Sets the clock to a specific time.
    pub fn set(&self, time: DateTime<Utc>) {
        *self.current.write() = time;
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl ClockProvider for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.read()
    }
}
