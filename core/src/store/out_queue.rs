// OutQueue — delivered messages waiting to be dispatched locally
//
// `offset` counts every message ever accepted. It is reported back to the
// remote side so it knows which messages it no longer has to resend.

use crate::message::Message;
use std::collections::VecDeque;

/// Incoming FIFO with a monotonic accepted counter.
#[derive(Debug, Default)]
pub struct OutQueue {
    total_added: u64,
    buffer: VecDeque<Message>,
}

impl OutQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: Message) {
        self.buffer.push_back(message);
        self.total_added += 1;
    }

    /// Pop the oldest message, or `None` when nothing is waiting.
    pub fn remove(&mut self) -> Option<Message> {
        self.buffer.pop_front()
    }

    /// Total messages ever accepted, independent of removals.
    pub fn offset(&self) -> u64 {
        self.total_added
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn msg(n: u32) -> Message {
        Message::new(
            "actor:worker".parse().unwrap(),
            "client:1".parse().unwrap(),
            "test",
            json!(n),
        )
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = OutQueue::new();
        for n in 0..5 {
            queue.add(msg(n));
        }
        assert_eq!(queue.offset(), 5);
        assert_eq!(queue.len(), 5);

        for n in 0..5 {
            assert_eq!(queue.remove(), Some(msg(n)));
        }
        assert_eq!(queue.remove(), None);
        assert!(queue.is_empty());
        assert_eq!(queue.offset(), 5);
    }

    #[test]
    fn test_offset_ignores_interleaved_removes() {
        let mut queue = OutQueue::new();
        queue.add(msg(0));
        queue.add(msg(1));
        queue.remove();
        queue.add(msg(2));
        queue.remove();
        queue.add(msg(3));
        queue.add(msg(4));

        assert_eq!(queue.offset(), 5);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.remove(), Some(msg(2)));
    }
}
