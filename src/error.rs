use thiserror::Error;

use crate::packet::FlowId;

/// Rejections at admission. The qdisc state is untouched when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QdiscError {
    #[error("flow id {flow} outside registry of {flows} flows")]
    UnknownFlow { flow: FlowId, flows: usize },
    #[error("packet size must be positive and fit a signed 64-bit deficit, got {size}")]
    InvalidSize { size: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config defines no flows")]
    NoFlows,
    #[error("MTU must be positive")]
    ZeroMtu,
    #[error("unknown algorithm {0:?} (expected LFQ or CNQ)")]
    UnknownAlgorithm(String),
    #[error("MaxSize {max_size} must exceed the largest admissible packet ({largest} bytes)")]
    MaxSizeTooSmall { max_size: usize, largest: usize },
    #[error("flow {flow}: {reason}")]
    InvalidFlow { flow: usize, reason: &'static str },
}
