use std::collections::VecDeque;

use crate::packet::Packet;

// ==========================================
// Arrival-order FIFO with a running byte count
// ==========================================
#[derive(Debug, Default)]
pub struct OrderedQueue {
    pub(super) packets: VecDeque<Packet>,
    size: usize, // always equals the sum of packet sizes
}

impl OrderedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, packet: Packet) {
        self.size += packet.size;
        self.packets.push_back(packet);
    }

    pub fn pop(&mut self) -> Option<Packet> {
        let packet = self.packets.pop_front()?;
        self.size -= packet.size;
        Some(packet)
    }

    pub fn front(&self) -> Option<&Packet> {
        self.packets.front()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Resident bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn iter(&self) -> impl Iterator<Item = &Packet> {
        self.packets.iter()
    }

    /// Removes the packet at `index`, keeping the bookkeeping in step.
    pub(super) fn remove_at(&mut self, index: usize, swap_tail: bool) -> Option<Packet> {
        let packet = if swap_tail {
            self.packets.swap_remove_back(index)?
        } else {
            self.packets.remove(index)?
        };
        self.size -= packet.size;
        Some(packet)
    }

    pub fn dump(&self, label: &str, packets: bool) {
        tracing::info!(queue = label, len = self.len(), size = self.size, "queue state");
        if packets {
            for (i, p) in self.packets.iter().enumerate() {
                tracing::info!("    packet {i}: {p:?}");
            }
        }
    }
}
