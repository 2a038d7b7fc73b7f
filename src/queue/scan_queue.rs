use std::ops::Deref;

use crate::packet::Packet;
use crate::queue::OrderedQueue;

/// How `ScanQueue::pull` closes the gap left at the cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PullMode {
    /// Shift later packets down. O(n), never reorders.
    #[default]
    Ordered,
    /// Move the tail packet into the gap. O(1), reorders the survivors.
    SwapTail,
}

/// An `OrderedQueue` with a persistent traversal cursor for round-robin service.
///
/// `cursor >= len()` means the traversal reached the tail, which is not the same
/// thing as the queue being empty. The cursor never wraps on its own.
#[derive(Debug, Default)]
pub struct ScanQueue {
    inner: OrderedQueue,
    cursor: usize,
    mode: PullMode,
}

impl ScanQueue {
    pub fn new(mode: PullMode) -> Self {
        Self {
            inner: OrderedQueue::new(),
            cursor: 0,
            mode,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn push(&mut self, packet: Packet) {
        self.inner.push(packet);
    }

    /// Peek at the cursor. `None` means end of traversal.
    pub fn scan(&self) -> Option<&Packet> {
        self.inner.packets.get(self.cursor)
    }

    /// Remove the packet under the cursor. The cursor stays put, so it now
    /// addresses whatever moved into that slot.
    pub fn pull(&mut self) -> Option<Packet> {
        if self.cursor >= self.inner.len() {
            return None;
        }
        self.inner.remove_at(self.cursor, self.mode == PullMode::SwapTail)
    }

    /// Pop the head, keeping the cursor on the same surviving packet.
    pub fn pop(&mut self) -> Option<Packet> {
        let packet = self.inner.pop()?;
        if self.cursor > 0 {
            self.cursor -= 1;
        }
        Some(packet)
    }

    pub fn advance(&mut self) {
        if self.cursor < self.inner.len() {
            self.cursor += 1;
        }
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    pub fn dump(&self, label: &str, packets: bool) {
        tracing::info!(
            queue = label,
            len = self.len(),
            size = self.size(),
            cursor = self.cursor,
            "queue state"
        );
        if packets {
            for (i, p) in self.iter().enumerate() {
                let marker = if i == self.cursor { "  ->" } else { "    " };
                tracing::info!("{marker}packet {i}: {p:?}");
            }
        }
    }
}

// Read-only access only: every mutation goes through ScanQueue so the
// cursor stays consistent.
impl Deref for ScanQueue {
    type Target = OrderedQueue;

    fn deref(&self) -> &OrderedQueue {
        &self.inner
    }
}
