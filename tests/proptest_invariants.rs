//! Property-based checks of the scheduler invariants over random
//! enqueue/dequeue interleavings.

use flowq_sim::flow_registry::FlowBucket;
use flowq_sim::queue::{OrderedQueue, PullMode};
use flowq_sim::{CnqQdisc, Lane, LfqQdisc, Packet, Qdisc};
use proptest::prelude::*;

const FLOWS: usize = 4;
const MTU: usize = 1500;
// Sparse never holds more than one packet per flow, so this budget always
// leaves room for one more MTU once bulk has been evicted.
const MAX_SIZE: usize = (FLOWS + 1) * MTU;

#[derive(Debug, Clone)]
enum Op {
    Enqueue { flow: usize, size: usize },
    Dequeue,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..FLOWS, 1..=MTU).prop_map(|(flow, size)| Op::Enqueue { flow, size }),
        2 => Just(Op::Dequeue),
    ]
}

fn tracked_size_matches(q: &OrderedQueue) -> Result<(), TestCaseError> {
    let sum: usize = q.iter().map(|p| p.size).sum();
    prop_assert_eq!(q.size(), sum);
    Ok(())
}

fn resident_per_flow<'a>(packets: impl Iterator<Item = &'a Packet>) -> [usize; FLOWS] {
    let mut counts = [0; FLOWS];
    for p in packets {
        counts[p.flow] += 1;
    }
    counts
}

fn serve(q: &mut dyn Qdisc) -> Option<(Packet, Lane)> {
    let mut out = None;
    let mut calls = 0;
    let sent = q.dequeue(&mut |p: &Packet, lane: Lane| {
        calls += 1;
        out = Some((*p, lane));
    });
    assert_eq!(sent, calls == 1);
    out
}

fn snapshot(q: &LfqQdisc) -> Vec<FlowBucket> {
    q.buckets().iter().map(|(_, b)| *b).collect()
}

proptest! {
    #[test]
    fn lfq_invariants(ops in prop::collection::vec(op(), 1..400), quick in any::<bool>()) {
        let mode = if quick { PullMode::SwapTail } else { PullMode::Ordered };
        let mut q = LfqQdisc::new(FLOWS, MAX_SIZE, MTU, mode);
        let mut seqno = 0;

        for op in ops {
            match op {
                Op::Enqueue { flow, size } => {
                    q.enqueue(Packet::new(seqno, 0, size, flow)).unwrap();
                    seqno += 1;
                    prop_assert!(q.size() <= MAX_SIZE);
                }
                Op::Dequeue => {
                    let before = snapshot(&q);
                    let sparse_head = q.sparse().front().copied();
                    let was_empty = q.is_empty();
                    let cursor = q.bulk().cursor();

                    let served = serve(&mut q);

                    if was_empty {
                        prop_assert!(served.is_none());
                        prop_assert_eq!(&snapshot(&q), &before);
                        prop_assert_eq!(q.bulk().cursor(), cursor);
                    }
                    if let Some(head) = sparse_head {
                        prop_assert_eq!(served, Some((head, Lane::Sparse)));
                    }
                    if let Some((p, Lane::Bulk)) = served {
                        if before[p.flow].skip {
                            // Serving a flow that was skipped needs a round-wrap,
                            // and a wrap clears every other skip mark too.
                            let after = snapshot(&q);
                            for (flow, b) in after.iter().enumerate() {
                                if flow != p.flow {
                                    prop_assert!(!b.skip);
                                }
                            }
                        }
                    }
                }
            }

            tracked_size_matches(q.sparse())?;
            tracked_size_matches(q.bulk())?;
            let resident = resident_per_flow(q.sparse().iter().chain(q.bulk().iter()));
            for (flow, b) in q.buckets().iter() {
                prop_assert_eq!(b.backlog, resident[flow]);
                prop_assert!(b.deficit >= -(MTU as i64));
            }
        }
    }

    #[test]
    fn cnq_invariants(ops in prop::collection::vec(op(), 1..400)) {
        let mut q = CnqQdisc::new(FLOWS, MAX_SIZE);
        let mut seqno = 0;

        for op in ops {
            match op {
                Op::Enqueue { flow, size } => {
                    q.enqueue(Packet::new(seqno, 0, size, flow)).unwrap();
                    seqno += 1;
                    prop_assert!(q.size() <= MAX_SIZE);
                }
                Op::Dequeue => {
                    let sparse_head = q.sparse().front().copied();
                    let was_empty = q.is_empty();

                    let served = serve(&mut q);

                    if was_empty {
                        prop_assert!(served.is_none());
                    }
                    if let Some(head) = sparse_head {
                        prop_assert_eq!(served, Some((head, Lane::Sparse)));
                    }
                    if let Some((p, _)) = served {
                        prop_assert!(!p.is_placeholder());
                    }
                }
            }

            tracked_size_matches(q.sparse())?;
            tracked_size_matches(q.bulk())?;
            let resident = resident_per_flow(q.sparse().iter().chain(q.bulk().iter()));
            for (flow, count) in resident.iter().enumerate() {
                prop_assert_eq!(q.backlog(flow), Some(*count));
            }
        }
    }
}
