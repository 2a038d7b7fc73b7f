use chrono::Local;
use tracing::info;

use crate::packet::{FlowId, Packet, Tick};
use crate::qdisc::Lane;

#[derive(Debug, Default, Clone)]
struct IntervalStats {
    // reset every report
    in_pkts: u64,
    out_pkts: u64,
    out_bytes: u64,
    sparse: u64,
    bulk: u64,

    // never reset: enqueued but not yet seen at the sink (evictions included)
    outstanding_pkts: i64,
}

// ==========================================
// Periodic per-flow progress table
// ==========================================
pub struct Monitor {
    every: Option<Tick>,
    stats: Vec<IntervalStats>,
    last_report: Tick,
}

impl Monitor {
    pub fn new(flows: usize, every: Option<Tick>) -> Self {
        Self {
            every: every.filter(|&t| t > 0),
            stats: vec![IntervalStats::default(); flows],
            last_report: 0,
        }
    }

    pub fn record_enqueue(&mut self, flow: FlowId) {
        let stat = &mut self.stats[flow];
        stat.in_pkts += 1;
        stat.outstanding_pkts += 1;
    }

    pub fn record_send(&mut self, packet: &Packet, lane: Lane) {
        let stat = &mut self.stats[packet.flow];
        stat.out_pkts += 1;
        stat.out_bytes += packet.size as u64;
        stat.outstanding_pkts -= 1;
        match lane {
            Lane::Sparse => stat.sparse += 1,
            Lane::Bulk => stat.bulk += 1,
        }
    }

    pub fn check_and_report(&mut self, now: Tick) {
        let Some(every) = self.every else {
            return;
        };
        let elapsed = now.saturating_sub(self.last_report);
        if elapsed < every {
            return;
        }

        info!(
            tick = now,
            wall = %Local::now().format("%H:%M:%S"),
            "{:<6} | {:>8} | {:>8} | {:>12} | {:>8} | {:>8} | {:>11}",
            "flow", "in", "out", "bytes/kTick", "sparse", "bulk", "outstanding"
        );

        let mut total_in = 0;
        let mut total_out = 0;
        let mut total_bytes = 0;
        for (flow, stat) in self.stats.iter_mut().enumerate() {
            let rate = 1000.0 * stat.out_bytes as f64 / elapsed as f64;
            info!(
                "{:<6} | {:>8} | {:>8} | {:>12.1} | {:>8} | {:>8} | {:>11}",
                flow, stat.in_pkts, stat.out_pkts, rate, stat.sparse, stat.bulk, stat.outstanding_pkts
            );
            total_in += stat.in_pkts;
            total_out += stat.out_pkts;
            total_bytes += stat.out_bytes;

            // keep the outstanding level, clear the per-interval counters
            *stat = IntervalStats {
                outstanding_pkts: stat.outstanding_pkts,
                ..Default::default()
            };
        }

        let total_rate = 1000.0 * total_bytes as f64 / elapsed as f64;
        info!(
            "{:<6} | {:>8} | {:>8} | {:>12.1} |",
            "TOTAL", total_in, total_out, total_rate
        );

        self.last_report = now;
    }
}
