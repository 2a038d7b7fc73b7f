use chrono::Utc;
use rand::RngExt as _;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::error::QdiscError;
use crate::packet::{Packet, Seqno, Tick};
use crate::qdisc::{Lane, Qdisc, Sink};
use crate::sim::config::Config;
use crate::sim::monitor::Monitor;
use crate::sim::stats::{FlowStats, Results};

#[derive(Debug, Clone, Default)]
struct FlowState {
    next_enqueue: Tick,
    next_seqno: Seqno,
}

/// Everything the sink side observes. Kept apart from the qdisc so the
/// scheduler can borrow it mutably during `dequeue`.
struct Ledger {
    now: Tick,
    next_dequeue: Tick,
    stats: Vec<FlowStats>,
    prior_seqno: Vec<Seqno>,
    late: Vec<Packet>,
    monitor: Monitor,
}

impl Sink for Ledger {
    fn send(&mut self, packet: &Packet, lane: Lane) {
        let flow = packet.flow;
        let late = packet.seqno < self.prior_seqno[flow];
        if late {
            self.late.push(*packet);
        }
        self.prior_seqno[flow] = packet.seqno;

        self.stats[flow].record_send(packet, lane, self.now, late);
        self.monitor.record_send(packet, lane);

        // Constant bitrate: one byte per tick.
        self.next_dequeue += packet.size as Tick;
    }
}

/// Discrete-event driver: synthesizes bursty arrivals per flow and serves the
/// bottleneck at a constant rate.
pub struct Simulator {
    config: Config,
    flows: Vec<FlowState>,
    ledger: Ledger,
    qdisc: Box<dyn Qdisc>,
    rng: StdRng,
    seed: u64,
}

impl Simulator {
    pub fn new(config: Config) -> Self {
        let flows = config.flow_defs.len();
        let qdisc = config
            .algorithm
            .build(flows, config.max_size, config.mtu, config.pull_mode());
        Self::with_qdisc(config, qdisc)
    }

    /// Run against a caller-supplied scheduler sized for `config.flow_defs`.
    pub fn with_qdisc(config: Config, qdisc: Box<dyn Qdisc>) -> Self {
        let flows = config.flow_defs.len();
        let seed = config
            .seed
            .unwrap_or_else(|| Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64);

        Self {
            flows: config
                .flow_defs
                .iter()
                .map(|def| FlowState {
                    next_enqueue: def.offset,
                    next_seqno: 0,
                })
                .collect(),
            ledger: Ledger {
                now: 0,
                next_dequeue: 0,
                stats: vec![FlowStats::default(); flows],
                prior_seqno: vec![0; flows],
                late: Vec::new(),
                monitor: Monitor::new(flows, config.report_interval),
            },
            qdisc,
            rng: StdRng::seed_from_u64(seed),
            seed,
            config,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn run(mut self) -> Result<Results, QdiscError> {
        info!(
            algorithm = %self.config.algorithm,
            flows = self.flows.len(),
            end_ticks = self.config.end_ticks,
            seed = self.seed,
            "simulation starting"
        );

        for now in 0..self.config.end_ticks {
            self.ledger.now = now;

            for flow in 0..self.flows.len() {
                if self.flows[flow].next_enqueue == now {
                    self.arrivals(flow, now)?;
                }
            }

            // Retry every tick while there is nothing to send.
            if now == self.ledger.next_dequeue && !self.qdisc.dequeue(&mut self.ledger) {
                self.ledger.next_dequeue += 1;
            }

            self.report_late();
            self.ledger.monitor.check_and_report(now);
        }

        let end_ticks = self.config.end_ticks;
        for (stats, def) in self.ledger.stats.iter_mut().zip(&self.config.flow_defs) {
            stats.finalize(end_ticks.saturating_sub(def.offset));
        }

        info!(resident = self.qdisc.len(), "simulation finished");

        Ok(Results {
            generated_at: Utc::now(),
            algorithm: self.config.algorithm,
            seed: self.seed,
            end_ticks,
            flow_stats: self.ledger.stats,
        })
    }

    fn arrivals(&mut self, flow: usize, now: Tick) -> Result<(), QdiscError> {
        let def = &self.config.flow_defs[flow];
        let (burst, burst_var) = (def.burst, def.burst_variance);
        let (size, size_var) = (def.size as u64, def.size_variance as u64);
        let (interval, interval_var) = (def.interval, def.interval_variance);

        let count = vary(&mut self.rng, burst, burst_var);
        for _ in 0..count {
            let state = &mut self.flows[flow];
            let packet = Packet::new(
                state.next_seqno,
                now,
                vary(&mut self.rng, size, size_var) as usize,
                flow,
            );
            state.next_seqno += 1;

            self.qdisc.enqueue(packet)?;
            self.ledger.stats[flow].enqueues += 1;
            self.ledger.monitor.record_enqueue(flow);
        }

        self.flows[flow].next_enqueue += vary(&mut self.rng, interval, interval_var);
        Ok(())
    }

    fn report_late(&mut self) {
        for packet in std::mem::take(&mut self.ledger.late) {
            warn!(
                flow = packet.flow,
                seqno = packet.seqno,
                prior = self.ledger.prior_seqno[packet.flow],
                "late packet"
            );
            if self.config.late_dump {
                self.qdisc.dump(
                    &format!("late packet {packet:?}"),
                    self.config.late_dump_packets,
                );
            }
        }
    }
}

/// `base` moved uniformly within `[-variance, +variance]`. Config validation
/// keeps the result non-negative.
fn vary(rng: &mut StdRng, base: u64, variance: u64) -> u64 {
    if variance == 0 {
        return base;
    }
    let delta = rng.random_range(-(variance as i64)..=variance as i64);
    base.saturating_add_signed(delta)
}
