//! CLI output: per-DOI result lines, the batch summary and the progress bar.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use pdfharvest::{BatchSummary, HarvestOutcome};

/// Message when no DOI was provided at all.
pub const NO_INPUT_GUIDANCE: &str =
    "No input provided. Pass DOIs as arguments, use --input FILE, or pipe them via stdin.";

/// Example for piping input.
pub const INPUT_PIPE_EXAMPLE: &str = "Example: echo '10.1000/xyz123' | pdfharvest -e you@example.org";

/// Width of the status column; fits `NOT_OPEN_ACCESS`.
const STATUS_WIDTH: usize = 15;

/// One line per DOI: status, DOI, then the saved path or the detail.
#[must_use]
pub fn format_outcome_line(outcome: &HarvestOutcome) -> String {
    let mut line = format!(
        "{:<width$}  {}",
        outcome.status.as_str(),
        outcome.doi,
        width = STATUS_WIDTH
    );
    if let Some(path) = &outcome.pdf_path {
        line.push_str(&format!("  -> {}", path.display()));
    } else if let Some(detail) = &outcome.detail {
        // Suggestions are for the log; keep result lines single-line.
        let first_line = detail.lines().next().unwrap_or_default();
        line.push_str(&format!("  ({first_line})"));
    }
    if outcome.from_cache {
        line.push_str("  [cached]");
    }
    line
}

/// Final summary line.
#[must_use]
pub fn format_summary(summary: &BatchSummary) -> String {
    format!("Done: {summary}")
}

/// Progress bar on stderr; hidden when stderr is not a terminal or in quiet mode.
pub(crate) fn progress_bar(total: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::with_draw_target(
        Some(u64::try_from(total).unwrap_or(u64::MAX)),
        ProgressDrawTarget::stderr(),
    );
    bar.set_style(
        ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}
