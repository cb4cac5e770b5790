use std::time::Duration;

/// Cooperative cancellation, observed only at polling points.
pub trait CancellationSignal: Send {
    /// Waits at most `timeout` for a cancellation request and reports
    /// whether one has been made.
    fn poll(&mut self, timeout: Duration) -> bool;

    /// The wait between retries of a not-ready source. Returns `true` if
    /// cancellation was requested during the wait.
    fn wait(&mut self, interval: Duration) -> bool {
        self.poll(interval)
    }
}

/// Never cancels; waits are plain sleeps.
pub struct NeverCancel;

impl CancellationSignal for NeverCancel {
    fn poll(&mut self, timeout: Duration) -> bool {
        if !timeout.is_zero() {
            std::thread::sleep(timeout);
        }
        false
    }
}
