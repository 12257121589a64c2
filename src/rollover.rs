//! Periodic calendar-day check for daily stats.

use crate::clock::Ticker;
use crate::timer::Command;
use std::sync::mpsc::Sender;
use std::time::Duration;

/// Sends [`Command::CheckDay`] every `interval` until dropped.
pub struct RolloverWatcher {
    _ticker: Ticker,
}

impl RolloverWatcher {
    pub fn spawn(tx: Sender<Command>, interval: Duration) -> Self {
        let mut ticker = Ticker::new(interval);
        ticker.start(move |_| tx.send(Command::CheckDay).is_ok());
        Self { _ticker: ticker }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_sends_day_checks() {
        let (tx, rx) = mpsc::channel();
        let watcher = RolloverWatcher::spawn(tx, Duration::from_millis(5));

        let command = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(command, Command::CheckDay));

        drop(watcher);
        while rx.try_recv().is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }
}
