use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::reader::domain::cancellation::CancellationSignal;

/// Creates a cancellation signal and the sender that triggers it.
///
/// Any message on the sender requests cancellation. Dropping every sender
/// does not cancel; the signal then only waits.
pub fn channel() -> (Sender<()>, ChannelCancellation) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (tx, ChannelCancellation::new(rx))
}

/// [`CancellationSignal`] fed by a crossbeam channel.
///
/// Polls block in `recv_timeout`, so a request arriving during a retry wait
/// ends the wait early. Once observed, cancellation is sticky.
pub struct ChannelCancellation {
    receiver: Receiver<()>,
    cancelled: bool,
}

impl ChannelCancellation {
    pub fn new(receiver: Receiver<()>) -> Self {
        Self {
            receiver,
            cancelled: false,
        }
    }
}

impl CancellationSignal for ChannelCancellation {
    fn poll(&mut self, timeout: Duration) -> bool {
        if self.cancelled {
            return true;
        }
        let start = Instant::now();
        match self.receiver.recv_timeout(timeout) {
            Ok(()) => {
                log::info!("Cancellation requested");
                self.cancelled = true;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(timeout.saturating_sub(start.elapsed()));
            }
        }
        self.cancelled
    }
}
