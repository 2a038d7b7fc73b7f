use std::ops::{Index, IndexMut};

use crate::packet::FlowId;

/// Per-flow scheduling state for the deficit round-robin qdisc.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowBucket {
    /// Packets of this flow resident in either queue.
    pub backlog: usize,
    /// Signed byte credit. Only meaningful while `backlog > 0`.
    pub deficit: i64,
    /// Quantum exhausted this round; cleared at the next round-wrap.
    pub skip: bool,
}

/// Fixed-size table of per-flow state, indexed by flow id.
///
/// Sized once at construction to the number of flows the classifier can emit.
/// Entries are never removed; a flow only goes idle.
#[derive(Debug, Clone)]
pub struct FlowRegistry<B> {
    buckets: Vec<B>,
}

impl<B: Default + Clone> FlowRegistry<B> {
    pub fn new(max_flows: usize) -> Self {
        Self {
            buckets: vec![B::default(); max_flows],
        }
    }
}

impl<B> FlowRegistry<B> {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn contains(&self, flow: FlowId) -> bool {
        flow < self.buckets.len()
    }

    pub fn get(&self, flow: FlowId) -> Option<&B> {
        self.buckets.get(flow)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FlowId, &B)> {
        self.buckets.iter().enumerate()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut B> {
        self.buckets.iter_mut()
    }
}

// Callers check `contains` at admission; anything resident is in range.
impl<B> Index<FlowId> for FlowRegistry<B> {
    type Output = B;

    fn index(&self, flow: FlowId) -> &B {
        &self.buckets[flow]
    }
}

impl<B> IndexMut<FlowId> for FlowRegistry<B> {
    fn index_mut(&mut self, flow: FlowId) -> &mut B {
        &mut self.buckets[flow]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let reg: FlowRegistry<FlowBucket> = FlowRegistry::new(4);
        assert_eq!(reg.len(), 4);
        assert!(reg.iter().all(|(_, b)| *b == FlowBucket::default()));
    }

    #[test]
    fn out_of_range_lookup_is_none() {
        let reg: FlowRegistry<usize> = FlowRegistry::new(2);
        assert!(reg.contains(1));
        assert!(!reg.contains(2));
        assert!(reg.get(2).is_none());
    }

    #[test]
    fn indexed_updates_touch_only_that_flow() {
        let mut reg: FlowRegistry<FlowBucket> = FlowRegistry::new(3);
        reg[1].backlog = 5;
        reg[1].skip = true;
        assert_eq!(reg[0], FlowBucket::default());
        assert_eq!(reg[1].backlog, 5);
        assert_eq!(reg[2], FlowBucket::default());
    }
}
