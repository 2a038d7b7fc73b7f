use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::packet::{Packet, Tick};
use crate::qdisc::{Algorithm, Lane};

/// Per-flow results, built only from what the sink observed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlowStats {
    pub bytes_sent: u64,
    /// Bytes per thousand ticks since the flow's offset.
    pub throughput: f64,
    pub mean_sojourn: f64,
    pub min_sojourn: Option<Tick>,
    pub max_sojourn: Tick,
    pub enqueues: u64,
    /// Packets never served: evicted, or still resident when the run ended.
    pub drops: u64,
    pub drops_percent: f64,
    pub sparse_sends: u64,
    pub bulk_sends: u64,
    pub total_sends: u64,
    pub late_sends: u64,
    pub late_sends_percent: f64,
    #[serde(skip)]
    total_sojourn: Tick,
}

impl FlowStats {
    pub(crate) fn record_send(&mut self, packet: &Packet, lane: Lane, now: Tick, late: bool) {
        self.bytes_sent += packet.size as u64;

        let sojourn = now.saturating_sub(packet.timestamp);
        self.total_sojourn += sojourn;
        self.min_sojourn = Some(self.min_sojourn.map_or(sojourn, |m| m.min(sojourn)));
        self.max_sojourn = self.max_sojourn.max(sojourn);

        match lane {
            Lane::Sparse => self.sparse_sends += 1,
            Lane::Bulk => self.bulk_sends += 1,
        }
        if late {
            self.late_sends += 1;
        }
    }

    /// Fill in the derived fields. `elapsed` is the span the flow was active.
    pub(crate) fn finalize(&mut self, elapsed: Tick) {
        self.total_sends = self.sparse_sends + self.bulk_sends;
        self.throughput = 1000.0 * ratio(self.bytes_sent, elapsed);
        self.mean_sojourn = ratio(self.total_sojourn, self.total_sends);
        self.late_sends_percent = 100.0 * ratio(self.late_sends, self.total_sends);
        self.drops = self.enqueues.saturating_sub(self.total_sends);
        self.drops_percent = 100.0 * ratio(self.drops, self.enqueues);
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Results {
    pub generated_at: DateTime<Utc>,
    pub algorithm: Algorithm,
    pub seed: u64,
    pub end_ticks: Tick,
    pub flow_stats: Vec<FlowStats>,
}

impl Results {
    pub fn total_bytes_sent(&self) -> u64 {
        self.flow_stats.iter().map(|s| s.bytes_sent).sum()
    }

    pub fn total_drops(&self) -> u64 {
        self.flow_stats.iter().map(|s| s.drops).sum()
    }
}
