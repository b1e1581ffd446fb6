//! Deadline utilities.
//!
//! Lease expiry and acquisition timeouts are both expressed as a
//! [`Deadline`]: a point on the monotonic clock after which something is
//! no longer valid. Comparisons are inclusive of the deadline instant, so a
//! lease whose expiry equals "now" is still held.

use std::time::{Duration, Instant};

/// A point in monotonic time.
///
/// A duration too large for the platform clock yields a deadline that is
/// never reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    /// `None` when the deadline lies beyond the clock's range.
    at: Option<Instant>,
}

impl Deadline {
    /// A deadline `duration` from now.
    pub fn after(duration: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(duration),
        }
    }

    /// Check if this deadline can never be reached.
    pub fn is_never(self) -> bool {
        self.at.is_none()
    }

    /// Check if the deadline has strictly passed.
    pub fn has_passed(self) -> bool {
        self.at.is_some_and(|at| Instant::now() > at)
    }

    /// Check if now is at or after the deadline.
    pub fn is_reached(self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Time remaining until the deadline.
    ///
    /// Returns zero if the deadline has already passed and `Duration::MAX`
    /// if it never arrives.
    pub fn remaining(self) -> Duration {
        match self.at {
            Some(at) => at.saturating_duration_since(Instant::now()),
            None => Duration::MAX,
        }
    }

    /// Push the deadline `duration` past now.
    pub fn extend_from_now(&mut self, duration: Duration) {
        *self = Self::after(duration);
    }
}

/// How long a caller is willing to wait for something.
///
/// Mirrors the three acquisition modes of a lock: wait forever, try once,
/// or retry until a bound elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Block until the operation succeeds.
    Forever,
    /// Make exactly one attempt.
    NonBlocking,
    /// Retry until the duration elapses.
    Bounded(Duration),
}

impl Wait {
    /// Interpret an optional timeout the way lock acquisition does.
    ///
    /// `None` waits forever and a zero duration never blocks.
    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        match timeout {
            None => Self::Forever,
            Some(d) if d.is_zero() => Self::NonBlocking,
            Some(d) => Self::Bounded(d),
        }
    }

    /// The give-up deadline for this wait, if any.
    ///
    /// A non-blocking wait's deadline is already reached. A bound too large
    /// to represent waits forever.
    pub fn give_up(self) -> Option<Deadline> {
        match self {
            Self::Forever => None,
            Self::NonBlocking => Some(Deadline::after(Duration::ZERO)),
            Self::Bounded(d) => Some(Deadline::after(d)).filter(|deadline| !deadline.is_never()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_in_future_has_not_passed() {
        let deadline = Deadline::after(Duration::from_secs(60));
        assert!(!deadline.has_passed());
        assert!(deadline.remaining() > Duration::from_secs(59));
    }

    #[test]
    fn test_deadline_passes() {
        let deadline = Deadline::after(Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(15));
        assert!(deadline.has_passed());
        assert!(deadline.is_reached());
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_extend_from_now() {
        let mut deadline = Deadline::after(Duration::ZERO);
        deadline.extend_from_now(Duration::from_secs(30));
        assert!(!deadline.has_passed());
    }

    #[test]
    fn test_wait_from_timeout() {
        assert_eq!(Wait::from_timeout(None), Wait::Forever);
        assert_eq!(Wait::from_timeout(Some(Duration::ZERO)), Wait::NonBlocking);
        assert_eq!(
            Wait::from_timeout(Some(Duration::from_secs(2))),
            Wait::Bounded(Duration::from_secs(2))
        );
        assert!(Wait::Forever.give_up().is_none());
        assert!(Wait::NonBlocking.give_up().unwrap().is_reached());
    }

    #[test]
    fn test_unrepresentable_deadline_never_arrives() {
        let deadline = Deadline::after(Duration::MAX);
        assert!(deadline.is_never());
        assert!(!deadline.has_passed());
        assert!(!deadline.is_reached());
        assert_eq!(deadline.remaining(), Duration::MAX);

        assert!(Wait::Bounded(Duration::from_secs(u64::MAX)).give_up().is_none());
    }
}
