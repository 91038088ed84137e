use std::sync::atomic::{AtomicU8, Ordering};

use super::command::Command;

/// Single-slot, last-write-wins command cell shared by the command
/// listener and the frame worker.
///
/// Reading resets the slot to [`Command::Detect`] in one atomic swap, so a
/// published command is consumed at most once and a command published
/// before it is consumed is silently replaced.
#[derive(Debug, Default)]
pub struct EventLatch {
    slot: AtomicU8,
}

impl EventLatch {
    pub fn new() -> Self {
        Self {
            slot: AtomicU8::new(Command::Detect.as_u8()),
        }
    }

    /// Overwrites whatever command is currently latched.
    pub fn publish(&self, command: Command) {
        self.slot.store(command.as_u8(), Ordering::Release);
    }

    /// Takes the latched command and leaves `Detect` behind.
    pub fn consume_and_reset(&self) -> Command {
        Command::from_u8(self.slot.swap(Command::Detect.as_u8(), Ordering::AcqRel))
    }

    /// Current value without consuming it.
    #[cfg(test)]
    pub(crate) fn peek(&self) -> Command {
        Command::from_u8(self.slot.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_starts_idle() {
        let latch = EventLatch::new();
        assert_eq!(latch.consume_and_reset(), Command::Detect);
    }

    #[test]
    fn test_consume_resets_to_detect() {
        let latch = EventLatch::new();
        latch.publish(Command::Recognize);
        assert_eq!(latch.consume_and_reset(), Command::Recognize);
        assert_eq!(latch.consume_and_reset(), Command::Detect);
    }

    #[test]
    fn test_last_write_wins() {
        let latch = EventLatch::new();
        latch.publish(Command::EnrollAsFoe);
        latch.publish(Command::Delete);
        assert_eq!(latch.consume_and_reset(), Command::Delete);
    }

    #[test]
    fn test_stays_latched_until_consumed() {
        let latch = EventLatch::new();
        latch.publish(Command::EnrollAsFriend);
        assert_eq!(latch.peek(), Command::EnrollAsFriend);
        assert_eq!(latch.peek(), Command::EnrollAsFriend);
        assert_eq!(latch.consume_and_reset(), Command::EnrollAsFriend);
    }

    #[test]
    fn test_concurrent_publish_is_consumed_at_most_once() {
        let latch = Arc::new(EventLatch::new());
        let publisher = {
            let latch = latch.clone();
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    latch.publish(Command::Recognize);
                }
            })
        };

        let mut consumed = 0usize;
        for _ in 0..5000 {
            if latch.consume_and_reset() == Command::Recognize {
                consumed += 1;
            }
        }
        publisher.join().unwrap();
        if latch.consume_and_reset() == Command::Recognize {
            consumed += 1;
        }

        assert!(consumed >= 1);
        assert!(consumed <= 1000);
        assert_eq!(latch.peek(), Command::Detect);
    }
}
