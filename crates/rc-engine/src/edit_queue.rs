//! Bounded queue of pending edits.

use heapless::Deque;
use rc_ir::Edit;

/// Maximum number of edits waiting for the next control-rate poll.
pub const EDIT_QUEUE_CAPACITY: usize = 32;

/// Fixed-capacity FIFO of edits. Never allocates.
#[derive(Debug, Default)]
pub struct EditQueue {
    edits: Deque<Edit, EDIT_QUEUE_CAPACITY>,
}

impl EditQueue {
    pub const fn new() -> Self {
        Self { edits: Deque::new() }
    }

    /// Queue an edit. Hands it back if the queue is full.
    pub fn push(&mut self, edit: Edit) -> Result<(), Edit> {
        self.edits.push_back(edit)
    }

    pub fn pop(&mut self) -> Option<Edit> {
        self.edits.pop_front()
    }

    pub fn clear(&mut self) {
        self.edits.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_order() {
        let mut queue = EditQueue::new();
        queue.push(Edit::Resync { channel: 1 }).unwrap();
        queue.push(Edit::Reset).unwrap();
        assert_eq!(queue.pop(), Some(Edit::Resync { channel: 1 }));
        assert_eq!(queue.pop(), Some(Edit::Reset));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn full_queue_rejects_edit() {
        let mut queue = EditQueue::new();
        for _ in 0..EDIT_QUEUE_CAPACITY {
            queue.push(Edit::ResyncAll).unwrap();
        }
        assert_eq!(queue.push(Edit::Reset), Err(Edit::Reset));
        assert_eq!(queue.len(), EDIT_QUEUE_CAPACITY);
    }
}
