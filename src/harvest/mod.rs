//! Batch orchestration: per-DOI pipeline, outcomes and the run report.

mod orchestrator;
mod outcome;
mod report;

pub use orchestrator::{HarvestOptions, HarvestState, Harvester};
pub use outcome::{BatchReport, BatchSummary, HarvestOutcome, HarvestStatus};
pub use report::{DEFAULT_REPORT_FILE, ReportError, ReportRow, RunReport};
