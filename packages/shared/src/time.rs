//! Time-related utilities with clock abstraction for testability.

use chrono::Utc;

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get current Unix timestamp in UTC (milliseconds)
    fn now_millis(&self) -> i64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        now_millis()
    }
}

/// Manually advanced clock for testing (returns a programmed time)
#[derive(Debug)]
pub struct FixedClock {
    current: std::sync::atomic::AtomicI64,
}

impl FixedClock {
    /// Create a new fixed clock with the given timestamp
    pub fn new(start_millis: i64) -> Self {
        Self {
            current: std::sync::atomic::AtomicI64::new(start_millis),
        }
    }

    /// Advance the clock by the given number of milliseconds
    pub fn advance(&self, delta_millis: i64) {
        self.current
            .fetch_add(delta_millis, std::sync::atomic::Ordering::SeqCst);
    }

    /// Set the clock to an absolute timestamp
    pub fn set(&self, millis: i64) {
        self.current
            .store(millis, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.current.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// Get current Unix timestamp in UTC (milliseconds)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_returns_non_zero_timestamp() {
        // given:
        let clock = SystemClock;

        // when:
        let timestamp = clock.now_millis();

        // then:
        assert!(timestamp > 0);
    }

    #[test]
    fn test_system_clock_returns_increasing_timestamps() {
        // given:
        let clock = SystemClock;

        // when:
        let timestamp1 = clock.now_millis();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let timestamp2 = clock.now_millis();

        // then:
        assert!(timestamp2 >= timestamp1);
    }

    #[test]
    fn test_fixed_clock_returns_programmed_timestamp() {
        // given:
        let clock = FixedClock::new(1234567890123);

        // when:
        let timestamp = clock.now_millis();

        // then:
        assert_eq!(timestamp, 1234567890123);
    }

    #[test]
    fn test_fixed_clock_advance() {
        // given:
        let clock = FixedClock::new(1000);

        // when:
        clock.advance(4500);

        // then:
        assert_eq!(clock.now_millis(), 5500);
    }

    #[test]
    fn test_fixed_clock_set() {
        // given:
        let clock = FixedClock::new(1000);

        // when:
        clock.set(42);

        // then:
        assert_eq!(clock.now_millis(), 42);
    }

    #[test]
    fn test_now_millis_returns_positive_value() {
        // when:
        let timestamp = now_millis();

        // then:
        assert!(timestamp > 0);
    }
}
