use std::time::Duration;

/// How long a condition-variable wait may block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timeout {
    /// Block until notified.
    Infinite,
    /// Block for at most this many milliseconds.
    Millis(u64),
}

impl Timeout {
    /// Converts a signed tick count: negative means no timeout.
    pub fn from_ticks(ticks: i64) -> Self {
        if ticks < 0 {
            Timeout::Infinite
        } else {
            Timeout::Millis(ticks as u64)
        }
    }
}

impl From<Duration> for Timeout {
    /// Rounds sub-millisecond remainders up so a non-zero duration never
    /// turns into a zero-length wait.
    fn from(duration: Duration) -> Self {
        let millis = duration.as_millis();
        let millis = if duration.subsec_nanos() % 1_000_000 != 0 {
            millis + 1
        } else {
            millis
        };

        Timeout::Millis(u64::try_from(millis).unwrap_or(u64::MAX))
    }
}

/// Selects one of the two events backing an emulated condition variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notify {
    /// Auto-reset event: wakes a single waiter and clears itself.
    Signal,
    /// Manual-reset event: stays set until explicitly reset.
    Broadcast,
}

/// Why a wait on an event pair returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wake {
    Signal,
    Broadcast,
    TimedOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_ticks_mean_infinite() {
        assert_eq!(Timeout::from_ticks(-1), Timeout::Infinite);
        assert_eq!(Timeout::from_ticks(i64::MIN), Timeout::Infinite);
        assert_eq!(Timeout::from_ticks(0), Timeout::Millis(0));
        assert_eq!(Timeout::from_ticks(250), Timeout::Millis(250));
    }

    #[test]
    fn test_duration_rounds_up_to_whole_millis() {
        assert_eq!(Timeout::from(Duration::from_millis(50)), Timeout::Millis(50));
        assert_eq!(Timeout::from(Duration::from_micros(1)), Timeout::Millis(1));
        assert_eq!(Timeout::from(Duration::from_micros(2500)), Timeout::Millis(3));
        assert_eq!(Timeout::from(Duration::ZERO), Timeout::Millis(0));
        assert_eq!(Timeout::from(Duration::MAX), Timeout::Millis(u64::MAX));
    }
}
