//! Filesystem monitoring
//!
//! The PollingScanner walks the checkout on a fixed interval and the Monitor
//! feeds its events into the ChangeAccumulator, flushing due batches into
//! the WorkflowEngine.

mod config;
mod monitor;
mod scanner;

pub use config::{WatcherConfig, default_ignore_patterns};
pub use monitor::Monitor;
pub use scanner::PollingScanner;
