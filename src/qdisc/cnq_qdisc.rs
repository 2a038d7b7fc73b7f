use tracing::debug;

use crate::error::QdiscError;
use crate::flow_registry::FlowRegistry;
use crate::packet::{FlowId, Packet};
use crate::qdisc::{Lane, Qdisc, Sink, check_admissible};
use crate::queue::OrderedQueue;

// ==========================================
// Backlog-counting flow queue
// ==========================================
//
// A cheaper sparse/bulk split: one counter per flow, no deficits. When an idle
// flow sends, the real packet goes to the sparse queue and a zero-size
// placeholder goes to the back of bulk to hold the flow's place in line. Both
// count toward the flow's backlog.
pub struct CnqQdisc {
    sparse: OrderedQueue,
    bulk: OrderedQueue,
    backlogs: FlowRegistry<usize>,
    max_size: usize,
}

impl CnqQdisc {
    pub fn new(max_flows: usize, max_size: usize) -> Self {
        Self {
            sparse: OrderedQueue::new(),
            bulk: OrderedQueue::new(),
            backlogs: FlowRegistry::new(max_flows),
            max_size,
        }
    }

    pub fn sparse(&self) -> &OrderedQueue {
        &self.sparse
    }

    pub fn bulk(&self) -> &OrderedQueue {
        &self.bulk
    }

    /// Resident entries of `flow`, placeholders included.
    pub fn backlog(&self, flow: FlowId) -> Option<usize> {
        self.backlogs.get(flow).copied()
    }

    fn over_budget(&self, incoming: usize) -> bool {
        self.size().saturating_add(incoming) > self.max_size
    }
}

impl Qdisc for CnqQdisc {
    fn enqueue(&mut self, packet: Packet) -> Result<(), QdiscError> {
        check_admissible(&packet, &self.backlogs)?;

        // Overflow: drop from the bulk head first. Placeholders free no bytes,
        // but each one still releases one unit of its flow's backlog.
        while self.over_budget(packet.size) {
            let Some(dropped) = self.bulk.pop() else {
                break;
            };
            self.backlogs[dropped.flow] -= 1;
            debug!(flow = dropped.flow, size = dropped.size, "evicted bulk head");
        }

        // Then from sparse. The evicted packet's placeholder stays in bulk and
        // keeps one unit of backlog until it is discarded at service.
        while self.over_budget(packet.size) {
            let Some(dropped) = self.sparse.pop() else {
                break;
            };
            self.backlogs[dropped.flow] -= 1;
            debug!(flow = dropped.flow, size = dropped.size, "evicted sparse head");
        }

        let backlog = &mut self.backlogs[packet.flow];
        if *backlog == 0 {
            self.bulk.push(packet.placeholder_for());
            self.sparse.push(packet);
            *backlog = 2;
        } else {
            self.bulk.push(packet);
            *backlog += 1;
        }
        Ok(())
    }

    fn dequeue(&mut self, sink: &mut dyn Sink) -> bool {
        if let Some(packet) = self.sparse.pop() {
            sink.send(&packet, Lane::Sparse);
            self.backlogs[packet.flow] -= 1;
            return true;
        }

        while let Some(packet) = self.bulk.pop() {
            self.backlogs[packet.flow] -= 1;
            if !packet.is_placeholder() {
                sink.send(&packet, Lane::Bulk);
                return true;
            }
        }

        false
    }

    fn len(&self) -> usize {
        self.sparse.len() + self.bulk.len()
    }

    fn size(&self) -> usize {
        self.sparse.size() + self.bulk.size()
    }

    fn dump(&self, reason: &str, packets: bool) {
        tracing::info!(reason, "CNQ state dump");
        for (flow, backlog) in self.backlogs.iter() {
            tracing::info!(flow, backlog, "  backlog");
        }
        self.sparse.dump("sparse", packets);
        self.bulk.dump("bulk", packets);
    }
}
