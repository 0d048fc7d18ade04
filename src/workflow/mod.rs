pub mod scan_flow;

pub use scan_flow::{ScanFlow, ScanOutcome, ScanReport};
