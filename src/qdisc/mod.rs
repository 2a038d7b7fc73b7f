use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, QdiscError};
use crate::flow_registry::FlowRegistry;
use crate::packet::Packet;
use crate::queue::PullMode;

mod cnq_qdisc;
mod lfq_qdisc;

pub use cnq_qdisc::CnqQdisc;
pub use lfq_qdisc::LfqQdisc;

/// Which queue a served packet came out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    Sparse,
    Bulk,
}

/// Receives every packet a qdisc decides to serve.
///
/// Called synchronously, once per served packet. Implementations must not
/// reach back into the qdisc during the call.
pub trait Sink {
    fn send(&mut self, packet: &Packet, lane: Lane);
}

impl<F> Sink for F
where
    F: FnMut(&Packet, Lane),
{
    fn send(&mut self, packet: &Packet, lane: Lane) {
        self(packet, lane)
    }
}

/// A flow-isolating scheduler for one bottleneck.
pub trait Qdisc {
    /// Admit a packet, evicting older bulk traffic if the byte budget is exceeded.
    fn enqueue(&mut self, packet: Packet) -> Result<(), QdiscError>;

    /// Serve at most one packet into `sink`. Returns whether anything was sent.
    fn dequeue(&mut self, sink: &mut dyn Sink) -> bool;

    /// Resident entries across both queues, placeholders included.
    fn len(&self) -> usize;

    /// Resident bytes across both queues.
    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Log the full scheduler state.
    fn dump(&self, reason: &str, packets: bool);
}

// Shared admission check: classifier defects and bogus sizes fail loudly
// instead of touching a neighbouring bucket. Sizes must fit the signed
// deficit arithmetic.
fn check_admissible<B>(packet: &Packet, registry: &FlowRegistry<B>) -> Result<(), QdiscError> {
    if !registry.contains(packet.flow) {
        return Err(QdiscError::UnknownFlow {
            flow: packet.flow,
            flows: registry.len(),
        });
    }
    if packet.size == 0 || i64::try_from(packet.size).is_err() {
        return Err(QdiscError::InvalidSize { size: packet.size });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Algorithm {
    /// Deficit round-robin flow queue.
    #[default]
    Lfq,
    /// Backlog-counting flow queue.
    Cnq,
}

impl Algorithm {
    pub fn build(
        self,
        max_flows: usize,
        max_size: usize,
        quantum: usize,
        pull_mode: PullMode,
    ) -> Box<dyn Qdisc> {
        match self {
            Algorithm::Lfq => Box::new(LfqQdisc::new(max_flows, max_size, quantum, pull_mode)),
            Algorithm::Cnq => Box::new(CnqQdisc::new(max_flows, max_size)),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Lfq => f.write_str("LFQ"),
            Algorithm::Cnq => f.write_str("CNQ"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LFQ" => Ok(Algorithm::Lfq),
            "CNQ" => Ok(Algorithm::Cnq),
            _ => Err(ConfigError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl TryFrom<String> for Algorithm {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Algorithm> for String {
    fn from(a: Algorithm) -> Self {
        a.to_string()
    }
}
