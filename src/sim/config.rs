use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::packet::Tick;
use crate::qdisc::Algorithm;
use crate::queue::PullMode;

/// One synthetic traffic source. Every `*_variance` draws uniformly from
/// `[-variance, +variance]` on each use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FlowDef {
    pub description: String,
    /// First tick this flow enqueues on.
    pub offset: Tick,
    /// Ticks between bursts.
    pub interval: Tick,
    pub interval_variance: Tick,
    /// Packets per burst.
    pub burst: u64,
    pub burst_variance: u64,
    /// Packet size in bytes.
    pub size: usize,
    pub size_variance: usize,
}

impl FlowDef {
    pub fn largest_packet(&self) -> usize {
        self.size + self.size_variance
    }

    fn validate(&self, index: usize, end_ticks: Tick) -> Result<(), ConfigError> {
        let fail = |reason: &'static str| Err(ConfigError::InvalidFlow { flow: index, reason });
        if self.interval == 0 {
            return fail("Interval must be positive");
        }
        if self.interval_variance >= self.interval {
            return fail("IntervalVariance must be smaller than Interval");
        }
        if self.size == 0 {
            return fail("Size must be positive");
        }
        if self.size_variance >= self.size {
            return fail("SizeVariance must be smaller than Size");
        }
        if self.burst_variance > self.burst {
            return fail("BurstVariance must not exceed Burst");
        }
        if self.offset >= end_ticks {
            return fail("Offset must be before EndTicks");
        }
        Ok(())
    }
}

/// Simulation parameters, read as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    pub end_ticks: Tick,
    /// Deficit quantum in bytes.
    #[serde(rename = "MTU")]
    pub mtu: usize,
    /// Combined byte budget of the sparse and bulk queues.
    pub max_size: usize,
    /// Dump scheduler state whenever a packet is served out of order.
    #[serde(default)]
    pub late_dump: bool,
    /// Include every resident packet in those dumps.
    #[serde(default)]
    pub late_dump_packets: bool,
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Swap-with-tail removal from the bulk queue (LFQ only).
    #[serde(default)]
    pub quick_pull: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Log a per-flow progress table every this many ticks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_interval: Option<Tick>,
    pub flow_defs: Vec<FlowDef>,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flow_defs.is_empty() {
            return Err(ConfigError::NoFlows);
        }
        if self.mtu == 0 {
            return Err(ConfigError::ZeroMtu);
        }
        for (i, def) in self.flow_defs.iter().enumerate() {
            def.validate(i, self.end_ticks)?;
        }
        let largest = self.largest_packet();
        if self.max_size <= largest {
            return Err(ConfigError::MaxSizeTooSmall {
                max_size: self.max_size,
                largest,
            });
        }
        Ok(())
    }

    pub fn largest_packet(&self) -> usize {
        self.flow_defs
            .iter()
            .map(FlowDef::largest_packet)
            .max()
            .unwrap_or(0)
    }

    pub fn pull_mode(&self) -> PullMode {
        if self.quick_pull {
            PullMode::SwapTail
        } else {
            PullMode::Ordered
        }
    }
}
