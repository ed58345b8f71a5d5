use std::collections::{vec_deque, VecDeque};

use crate::ClientMessage;

/// OutboundQueue stores client frames that could not be sent because the
/// connection was not open. Frames leave in submission order.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    frames: VecDeque<ClientMessage>,
}

impl OutboundQueue {
    pub fn push(&mut self, frame: ClientMessage) {
        self.frames.push_back(frame);
    }

    /// Empties the queue, handing back everything in FIFO order.
    pub fn take(&mut self) -> OutboundQueue {
        std::mem::take(self)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClientMessage> {
        self.frames.iter()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl IntoIterator for OutboundQueue {
    type Item = ClientMessage;
    type IntoIter = vec_deque::IntoIter<ClientMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_preserves_order_and_empties() {
        let mut queue = OutboundQueue::default();
        queue.push(ClientMessage::msg("one", "1"));
        queue.push(ClientMessage::typing(true));
        queue.push(ClientMessage::msg("two", "2"));

        let batch: Vec<ClientMessage> = queue.take().into_iter().collect();

        assert!(queue.is_empty());
        assert_eq!(
            batch,
            vec![
                ClientMessage::msg("one", "1"),
                ClientMessage::typing(true),
                ClientMessage::msg("two", "2"),
            ]
        );
    }
}
