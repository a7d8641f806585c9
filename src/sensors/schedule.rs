use embassy_time::{Duration, Instant};

/// Fixed-period gate for the polling pass.
///
/// The next due time advances from the previous due time, not from the time
/// the caller happened to check, so the pass rate never drifts. A caller that
/// falls several periods behind gets one pass per check until it catches up.
#[derive(Debug, Clone, Copy)]
pub struct PollSchedule {
    next_due: Instant,
    period: Duration,
}

impl PollSchedule {
    pub const fn new(period: Duration) -> Self {
        Self {
            next_due: Instant::MIN,
            period,
        }
    }

    /// Makes the first pass due at `now`.
    pub fn arm(&mut self, now: Instant) {
        self.next_due = now;
    }

    /// Returns whether a pass is due at `now`, consuming it if so.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due += self.period;
        true
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn fires_once_per_period() {
        let mut schedule = PollSchedule::new(Duration::from_millis(100));
        schedule.arm(at(1_000));
        let fired: Vec<u64> = (1_000..1_500)
            .step_by(10)
            .filter(|ms| schedule.poll(at(*ms)))
            .collect();
        assert_eq!(fired, vec![1_000, 1_100, 1_200, 1_300, 1_400]);
    }

    #[test]
    fn late_calls_do_not_shift_phase() {
        let mut schedule = PollSchedule::new(Duration::from_millis(100));
        schedule.arm(at(0));
        assert!(schedule.poll(at(0)));
        assert!(schedule.poll(at(137)));
        assert_eq!(schedule.next_due(), at(200));
        assert!(!schedule.poll(at(199)));
        assert!(schedule.poll(at(290)));
        assert_eq!(schedule.next_due(), at(300));
    }

    #[test]
    fn long_stall_catches_up_one_pass_per_call() {
        let mut schedule = PollSchedule::new(Duration::from_millis(100));
        schedule.arm(at(0));
        let passes = (0..10).filter(|_| schedule.poll(at(350))).count();
        assert_eq!(passes, 4);
        assert_eq!(schedule.next_due(), at(400));
    }

    #[test]
    fn nothing_due_before_arming_time() {
        let mut schedule = PollSchedule::new(Duration::from_millis(100));
        schedule.arm(at(500));
        assert!(!schedule.poll(at(499)));
        assert!(schedule.poll(at(500)));
    }
}
