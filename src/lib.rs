//! Flow-isolating packet schedulers and a discrete-event simulator to compare them.
//!
//! Two schedulers share the [`qdisc::Qdisc`] contract:
//!
//! - [`qdisc::LfqQdisc`]: sparse flows get strict priority, backlogged flows
//!   share the rest by deficit round robin over a single scanned bulk queue.
//! - [`qdisc::CnqQdisc`]: the same sparse/bulk split with one backlog counter
//!   per flow and plain FIFO bulk service.
//!
//! Both are single-threaded and fully synchronous. Served packets are handed
//! to an injected [`qdisc::Sink`].

pub mod error;
pub mod flow_registry;
pub mod packet;
pub mod qdisc;
pub mod queue;
pub mod sim;

pub use error::{ConfigError, QdiscError};
pub use packet::{FlowId, Packet, Seqno, Tick};
pub use qdisc::{Algorithm, CnqQdisc, Lane, LfqQdisc, Qdisc, Sink};
