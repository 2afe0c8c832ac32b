//! Politeness delay between consecutive requests to the same origin

use std::time::Duration;

/// Sleeps a fixed interval before every request except the first.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    primed: bool,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            primed: false,
        }
    }

    /// Delay that the next [`wait`](Throttle::wait) call will apply
    pub fn next_delay(&self) -> Duration {
        if self.primed {
            self.interval
        } else {
            Duration::ZERO
        }
    }

    /// Block until the next request may go out.
    pub fn wait(&mut self) {
        let delay = self.next_delay();
        self.primed = true;
        if !delay.is_zero() {
            log::info!("Waiting {}s before next request...", delay.as_secs_f64());
            std::thread::sleep(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_request_not_delayed() {
        let t = Throttle::new(Duration::from_secs(5));
        assert_eq!(t.next_delay(), Duration::ZERO);
    }

    #[test]
    fn later_requests_delayed() {
        let mut t = Throttle::new(Duration::from_millis(1));
        t.wait();
        assert_eq!(t.next_delay(), Duration::from_millis(1));
        t.wait();
        assert_eq!(t.next_delay(), Duration::from_millis(1));
    }

    #[test]
    fn zero_interval_never_sleeps() {
        let mut t = Throttle::new(Duration::ZERO);
        t.wait();
        assert!(t.next_delay().is_zero());
    }
}
