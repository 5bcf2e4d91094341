//! Debug trace types for the record-at-a-time executor.
//!
//! These types capture the journey of each record through the pipeline.

use tracing::debug;

use crate::record::Employee;

/// Trace of one input record's journey through the pipeline.
///
/// `pipe_points[0]` is the input (single record), `pipe_points[i]` is the
/// output after stage `i-1`. Length is `num_stages + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTrace {
    /// Records present at each pipe point between stages.
    pub pipe_points: Vec<Vec<Employee>>,
}

/// Trace of one stage's flush output journey through downstream stages.
///
/// `pipe_points[0]` is the flush output, `pipe_points[i]` is after
/// passing through `i` downstream stages.
#[derive(Debug, Clone, PartialEq)]
pub struct FlushTrace {
    /// Index of the stage that produced this flush output.
    pub stage_index: usize,
    pub pipe_points: Vec<Vec<Employee>>,
}

/// Complete debug trace of a record-at-a-time pipeline execution.
#[derive(Debug, Clone, PartialEq)]
pub struct RatDebugTrace {
    pub stage_names: Vec<String>,
    /// One trace per input record.
    pub record_traces: Vec<RecordTrace>,
    /// One trace per stage that produced flush output.
    pub flush_traces: Vec<FlushTrace>,
}

impl RatDebugTrace {
    /// Records leaving stage `stage_index`, summed over every trace.
    pub fn stage_output_count(&self, stage_index: usize) -> usize {
        let from_records: usize = self
            .record_traces
            .iter()
            .filter_map(|t| t.pipe_points.get(stage_index + 1))
            .map(Vec::len)
            .sum();
        let from_flushes: usize = self
            .flush_traces
            .iter()
            .filter(|f| f.stage_index <= stage_index)
            .filter_map(|f| f.pipe_points.get(stage_index - f.stage_index))
            .map(Vec::len)
            .sum();
        from_records + from_flushes
    }

    /// Emit one debug event per stage with its output count.
    pub fn log_summary(&self) {
        for (i, name) in self.stage_names.iter().enumerate() {
            debug!(stage = i, name = %name, output = self.stage_output_count(i), "stage");
        }
        for flush in &self.flush_traces {
            debug!(
                stage = flush.stage_index,
                records = flush.pipe_points.first().map_or(0, Vec::len),
                "flushed"
            );
        }
    }
}
