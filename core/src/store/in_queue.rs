// InQueue — outgoing messages waiting for remote acknowledgment
//
// Every exchange resends the whole unacknowledged buffer. `mark` records how
// far the snapshot reached; `forward` drops that prefix once the remote side
// has confirmed it.

use crate::message::Message;
use std::collections::VecDeque;

/// Snapshot returned by [`InQueue::mark`].
#[derive(Debug, Clone, PartialEq)]
pub struct MarkResult {
    /// Number of messages acknowledged and discarded before this snapshot.
    pub offset: u64,
    /// Copy of every message added since `offset`.
    pub messages: Vec<Message>,
}

/// Sliding-window outgoing buffer.
///
/// Invariant: `offset <= last_mark <= offset + buffer.len()`.
#[derive(Debug, Default)]
pub struct InQueue {
    offset: u64,
    last_mark: u64,
    buffer: VecDeque<Message>,
}

impl InQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message for delivery.
    pub fn add(&mut self, message: Message) {
        self.buffer.push_back(message);
    }

    /// Snapshot the buffer and remember where it ends.
    ///
    /// Repeated calls without [`forward`](Self::forward) return a growing
    /// snapshot; nothing is removed here.
    pub fn mark(&mut self) -> MarkResult {
        self.last_mark = self.offset + self.buffer.len() as u64;
        MarkResult {
            offset: self.offset,
            messages: self.buffer.iter().cloned().collect(),
        }
    }

    /// Discard everything up to the last mark.
    ///
    /// Messages added after that mark stay queued for the next round.
    pub fn forward(&mut self) {
        let acknowledged = (self.last_mark - self.offset) as usize;
        self.buffer.drain(..acknowledged);
        self.offset = self.last_mark;
    }

    pub fn offset(&self) -> u64 {
        self.offset
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
            "client:1".parse().unwrap(),
            "actor:echoer".parse().unwrap(),
            "test",
            json!(n),
        )
    }

    #[test]
    fn test_mark_and_forward_sequence() {
        let mut queue = InQueue::new();
        let (m1, m2, m3, m4, m5) = (msg(1), msg(2), msg(3), msg(4), msg(5));

        queue.add(m1.clone());
        queue.add(m2.clone());
        let first = queue.mark();
        assert_eq!(first.offset, 0);
        assert_eq!(first.messages, vec![m1.clone(), m2.clone()]);

        queue.add(m3.clone());
        let second = queue.mark();
        assert_eq!(second.offset, 0);
        assert_eq!(second.messages, vec![m1, m2, m3]);

        queue.forward();
        queue.add(m4.clone());
        queue.add(m5.clone());
        let third = queue.mark();
        assert_eq!(third.offset, 3);
        assert_eq!(third.messages, vec![m4, m5]);
    }

    #[test]
    fn test_forward_keeps_messages_added_after_mark() {
        let mut queue = InQueue::new();
        queue.add(msg(1));
        queue.mark();
        queue.add(msg(2));

        queue.forward();

        assert_eq!(queue.offset(), 1);
        assert_eq!(queue.len(), 1);
        let snapshot = queue.mark();
        assert_eq!(snapshot.offset, 1);
        assert_eq!(snapshot.messages, vec![msg(2)]);
    }

    #[test]
    fn test_forward_without_mark_is_noop() {
        let mut queue = InQueue::new();
        queue.add(msg(1));
        queue.forward();

        assert_eq!(queue.offset(), 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_double_forward_is_idempotent() {
        let mut queue = InQueue::new();
        queue.add(msg(1));
        queue.mark();
        queue.forward();
        queue.forward();

        assert_eq!(queue.offset(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut queue = InQueue::new();
        queue.add(msg(1));
        let mut snapshot = queue.mark();
        snapshot.messages.clear();

        assert_eq!(queue.mark().messages.len(), 1);
    }
}
