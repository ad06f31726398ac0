//! Console and log-file output, and the per-operation record behind the run summary.

mod logger;
mod subscriber;
mod types;
mod utils;

pub use logger::Logger;
pub use subscriber::init_subscriber;
pub use types::{Log, OperationRecord, OperationStatus};

