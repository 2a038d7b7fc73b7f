mod config;
mod monitor;
mod simulator;
mod stats;

pub use config::{Config, FlowDef};
pub use simulator::Simulator;
pub use stats::{FlowStats, Results};
