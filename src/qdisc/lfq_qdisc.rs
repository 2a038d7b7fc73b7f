use tracing::debug;

use crate::error::QdiscError;
use crate::flow_registry::{FlowBucket, FlowRegistry};
use crate::packet::{FlowId, Packet};
use crate::qdisc::{Lane, Qdisc, Sink, check_admissible};
use crate::queue::{OrderedQueue, PullMode, ScanQueue};

// ==========================================
// Deficit round-robin flow queue
// ==========================================
//
// Flows with nothing resident jump the line through the sparse queue. Everything
// else shares the bulk queue, which is walked with a cursor; each flow may spend
// up to one quantum of bytes per walk before it is skipped until the next wrap.
pub struct LfqQdisc {
    sparse: OrderedQueue,
    bulk: ScanQueue,
    buckets: FlowRegistry<FlowBucket>,
    max_size: usize,
    quantum: i64,
}

impl LfqQdisc {
    /// `max_size` must exceed the largest packet that will ever be offered;
    /// below that, admission stops evicting once bulk is empty and lets the
    /// budget be overrun.
    pub fn new(max_flows: usize, max_size: usize, quantum: usize, pull_mode: PullMode) -> Self {
        Self {
            sparse: OrderedQueue::new(),
            bulk: ScanQueue::new(pull_mode),
            buckets: FlowRegistry::new(max_flows),
            max_size,
            quantum: i64::try_from(quantum).unwrap_or(i64::MAX),
        }
    }

    pub fn sparse(&self) -> &OrderedQueue {
        &self.sparse
    }

    pub fn bulk(&self) -> &ScanQueue {
        &self.bulk
    }

    pub fn bucket(&self, flow: FlowId) -> Option<&FlowBucket> {
        self.buckets.get(flow)
    }

    pub fn buckets(&self) -> &FlowRegistry<FlowBucket> {
        &self.buckets
    }

    fn over_budget(&self, incoming: usize) -> bool {
        self.size().saturating_add(incoming) > self.max_size
    }

    // Cursor hit the tail: idle flows lose leftover credit, skipped flows get
    // another turn.
    fn wrap_round(&mut self) {
        for bucket in self.buckets.iter_mut() {
            if bucket.skip {
                bucket.skip = false;
            } else if bucket.backlog == 0 {
                bucket.deficit = 0;
            }
        }
        self.bulk.reset_cursor();
        debug!(bulk_len = self.bulk.len(), "round wrap");
    }

    fn sent(&mut self, packet: &Packet) {
        let bucket = &mut self.buckets[packet.flow];
        bucket.backlog -= 1;
        bucket.deficit -= packet.size as i64;
        if bucket.deficit < 0 {
            bucket.skip = true;
            bucket.deficit += self.quantum;
        }
    }
}

impl Qdisc for LfqQdisc {
    fn enqueue(&mut self, packet: Packet) -> Result<(), QdiscError> {
        check_admissible(&packet, &self.buckets)?;

        while self.over_budget(packet.size) {
            // Bulk empty: give up rather than spin when max_size < packet.size.
            let Some(dropped) = self.bulk.pop() else {
                break;
            };
            self.buckets[dropped.flow].backlog -= 1;
            debug!(
                flow = dropped.flow,
                seqno = dropped.seqno,
                size = dropped.size,
                "evicted bulk head"
            );
        }

        let bucket = &mut self.buckets[packet.flow];
        if bucket.backlog == 0 && bucket.deficit >= 0 && !bucket.skip {
            self.sparse.push(packet);
        } else {
            self.bulk.push(packet);
        }
        bucket.backlog += 1;
        Ok(())
    }

    fn dequeue(&mut self, sink: &mut dyn Sink) -> bool {
        // Sparse gets strict priority.
        if let Some(packet) = self.sparse.pop() {
            sink.send(&packet, Lane::Sparse);
            self.sent(&packet);
            return true;
        }

        while !self.bulk.is_empty() {
            let flow = match self.bulk.scan() {
                Some(p) => p.flow,
                None => {
                    self.wrap_round();
                    continue;
                }
            };

            if self.buckets[flow].skip {
                self.bulk.advance();
                continue;
            }

            let Some(packet) = self.bulk.pull() else {
                break;
            };
            sink.send(&packet, Lane::Bulk);
            self.sent(&packet);
            return true;
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
        tracing::info!(reason, "LFQ state dump");
        for (flow, b) in self.buckets.iter() {
            tracing::info!(
                flow,
                backlog = b.backlog,
                deficit = b.deficit,
                skip = b.skip,
                "  bucket"
            );
        }
        self.sparse.dump("sparse", packets);
        self.bulk.dump("bulk", packets);
    }
}
