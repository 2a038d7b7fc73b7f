/// Logical simulation time.
pub type Tick = u64;
/// Per-flow monotonic sequence number.
pub type Seqno = u64;
/// Index into the flow registry, assigned upstream by the classifier.
pub type FlowId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    pub seqno: Seqno,
    pub timestamp: Tick, // stamped by the driver at enqueue
    pub size: usize,     // bytes, the admission and deficit unit
    pub flow: FlowId,
}

impl Packet {
    pub fn new(seqno: Seqno, timestamp: Tick, size: usize, flow: FlowId) -> Self {
        Self {
            seqno,
            timestamp,
            size,
            flow,
        }
    }

    /// Zero-size marker that holds a flow's turn in a bulk queue.
    pub(crate) fn placeholder_for(&self) -> Self {
        Self { size: 0, ..*self }
    }

    pub fn is_placeholder(&self) -> bool {
        self.size == 0
    }
}
