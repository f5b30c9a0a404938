// tapir/src/report/mod.rs

//! Ordered buffered reporting.

pub mod buffer;
pub mod entry;
pub mod memory;
pub mod reporter;
pub mod state;

pub use buffer::OrderedBuffer;
pub use entry::{entries, ReportEntry, ReportSummary};
pub use memory::{MemoryReporter, ReportEvent};
pub use reporter::Reporter;
pub use state::ReportState;
