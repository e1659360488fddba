//! Maps run results to the process exit outcome.

use finsight_core::ingest::IngestSummary;

use crate::ProcessExit;

/// Any `failed` target makes the run fail; `not_found` and `rejected` do not.
pub(crate) fn determine_exit_outcome(summary: &IngestSummary) -> ProcessExit {
    if summary.failed == 0 {
        ProcessExit::Success
    } else {
        ProcessExit::Failure
    }
}
