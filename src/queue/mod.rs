mod fifo_queue;
mod scan_queue;

pub use fifo_queue::OrderedQueue;
pub use scan_queue::{PullMode, ScanQueue};
