//! Record-at-a-time (RAT) pipeline executor.
//!
//! Each input record travels the whole stage chain before the next one is
//! read. Once input is exhausted, stages flush in order and whatever a
//! flush releases continues through the stages after it. The batch
//! executor instead chains every stage into one lazy pipeline.

use tracing::{debug, trace};

use crate::debug_trace::{FlushTrace, RatDebugTrace, RecordTrace};
use crate::record::Employee;
use crate::record_stage::RecordStage;

/// Feed `batch` through `stages` in order.
///
/// When `points` is given, it receives the batch itself followed by what
/// each stage let through.
fn feed(
    stages: &mut [Box<dyn RecordStage>],
    batch: Vec<Employee>,
    mut points: Option<&mut Vec<Vec<Employee>>>,
) -> Vec<Employee> {
    if let Some(points) = points.as_deref_mut() {
        points.push(batch.clone());
    }
    stages.iter_mut().fold(batch, |batch, stage| {
        let passed: Vec<Employee> = batch.into_iter().flat_map(|r| stage.process(r)).collect();
        if let Some(points) = points.as_deref_mut() {
            points.push(passed.clone());
        }
        passed
    })
}

/// Drive input and then flushes through the chain, filling `trace` if given.
fn drive(
    input: Vec<Employee>,
    stages: &mut [Box<dyn RecordStage>],
    mut trace: Option<&mut RatDebugTrace>,
) -> Vec<Employee> {
    let mut output = Vec::new();

    for record in input {
        let mut points = Vec::new();
        let observed = trace.is_some().then_some(&mut points);
        output.extend(feed(stages, vec![record], observed));
        if let Some(trace) = trace.as_deref_mut() {
            trace.record_traces.push(RecordTrace {
                pipe_points: points,
            });
        }
    }

    for stage_index in 0..stages.len() {
        let (upstream, downstream) = stages.split_at_mut(stage_index + 1);
        let released = upstream[stage_index].flush();
        if released.is_empty() {
            continue;
        }
        trace!(
            stage = upstream[stage_index].name(),
            records = released.len(),
            "flush"
        );

        let mut points = Vec::new();
        let observed = trace.is_some().then_some(&mut points);
        output.extend(feed(downstream, released, observed));
        if let Some(trace) = trace.as_deref_mut() {
            trace.flush_traces.push(FlushTrace {
                stage_index,
                pipe_points: points,
            });
        }
    }

    output
}

/// Run `input` through `stages` record-at-a-time and collect the output.
pub fn execute_rat(input: Vec<Employee>, stages: &mut [Box<dyn RecordStage>]) -> Vec<Employee> {
    debug!(
        records = input.len(),
        stages = stages.len(),
        "executing record-at-a-time"
    );
    drive(input, stages, None)
}

/// Same as [`execute_rat`], also returning every record's pipe points and
/// every non-empty flush.
pub fn execute_rat_traced(
    input: Vec<Employee>,
    stages: &mut [Box<dyn RecordStage>],
) -> (Vec<Employee>, RatDebugTrace) {
    let mut trace = RatDebugTrace {
        stage_names: stages.iter().map(|s| s.name().to_string()).collect(),
        record_traces: Vec::with_capacity(input.len()),
        flush_traces: Vec::new(),
    };
    let output = drive(input, stages, Some(&mut trace));
    (output, trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::{Command, SortKey, execute_pipeline, execute_pipeline_rat};
    use crate::record::{Employee, Field, SAMPLE_DATA, Salary, sample_employees};
    use crate::record_stage::command_to_record_stage;
    use std::fs;
    use std::path::Path;

    fn stages(commands: &[Command]) -> Vec<Box<dyn RecordStage>> {
        commands.iter().map(command_to_record_stage).collect()
    }

    /// Assert RAT and batch executors produce identical output for a spec file.
    fn assert_equivalence(spec_name: &str) {
        let spec_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("specs");
        let pipeline = fs::read_to_string(spec_dir.join(spec_name)).unwrap();

        let batch_output = execute_pipeline(SAMPLE_DATA, &pipeline).unwrap();
        let rat_output = execute_pipeline_rat(SAMPLE_DATA, &pipeline).unwrap();

        assert_eq!(
            batch_output, rat_output,
            "RAT output differs from batch for {spec_name}"
        );
    }

    // --- Unit tests ---

    #[test]
    fn test_simple_passthrough() {
        let mut stages = stages(&[Command::Console]);
        let output = execute_rat(sample_employees(), &mut stages);
        assert_eq!(output, sample_employees());
    }

    #[test]
    fn test_filter_then_take() {
        let commands = crate::dsl::parse_commands("FILTER AGE < 30\n| TAKE 2").unwrap();
        let mut stages = stages(&commands);
        let output = execute_rat(sample_employees(), &mut stages);
        let ages: Vec<u32> = output.iter().map(Employee::age).collect();
        assert_eq!(ages, vec![18, 28]);
    }

    #[test]
    fn test_literal_flush_on_empty() {
        let boss = Employee::new("Boss", 60, Salary::from_cents(999_900));
        let mut stages = stages(&[Command::Literal {
            record: boss.clone(),
        }]);
        let output = execute_rat(vec![], &mut stages);
        assert_eq!(output, vec![boss]);
    }

    #[test]
    fn test_sort_flush_feeds_downstream() {
        let mut stages = stages(&[
            Command::Sort {
                keys: vec![SortKey {
                    field: Field::Age,
                    descending: false,
                }],
            },
            Command::Take { n: 3 },
        ]);
        let output = execute_rat(sample_employees(), &mut stages);
        let ages: Vec<u32> = output.iter().map(Employee::age).collect();
        assert_eq!(ages, vec![8, 8, 16]);
    }

    #[test]
    fn test_traced_captures_pipe_points() {
        let mut stages = stages(&[Command::Upper]);
        let input = sample_employees()[..2].to_vec();
        let (output, trace) = execute_rat_traced(input, &mut stages);
        assert_eq!(output.len(), 2);
        assert_eq!(trace.stage_names, vec!["UPPER"]);
        assert_eq!(trace.record_traces.len(), 2);
        // Each trace has 2 pipe points: input and after UPPER
        assert_eq!(trace.record_traces[0].pipe_points.len(), 2);
        assert_eq!(trace.record_traces[0].pipe_points[1][0].name(), "JACK");
    }

    #[test]
    fn test_traced_captures_flush() {
        let mut stages = stages(&[Command::Sort { keys: vec![] }]);
        let (output, trace) = execute_rat_traced(sample_employees(), &mut stages);
        assert_eq!(output.len(), 7);
        // Nothing leaves SORT while records arrive
        assert!(trace.record_traces.iter().all(|t| t.pipe_points[1].is_empty()));
        assert_eq!(trace.flush_traces.len(), 1);
        assert_eq!(trace.flush_traces[0].stage_index, 0);
        assert_eq!(trace.flush_traces[0].pipe_points[0].len(), 7);
    }

    #[test]
    fn test_traced_flush_follows_downstream() {
        let commands = crate::dsl::parse_commands("SORT AGE DESC\n| TAKE 2\n| UPPER").unwrap();
        let (output, trace) = execute_rat_traced(sample_employees(), &mut stages(&commands));
        let names: Vec<&str> = output.iter().map(Employee::name).collect();
        assert_eq!(names, vec!["TOM", "LUO"]);

        assert_eq!(trace.flush_traces.len(), 1);
        let flush = &trace.flush_traces[0];
        // Flush output, then after TAKE, then after UPPER
        assert_eq!(flush.pipe_points.len(), 3);
        assert_eq!(flush.pipe_points[0].len(), 7);
        assert_eq!(flush.pipe_points[1].len(), 2);
        assert_eq!(flush.pipe_points[2], output);
        assert!(trace.record_traces.iter().all(|t| t.pipe_points.len() == 4));
    }

    #[test]
    fn test_traced_equivalence() {
        let commands =
            crate::dsl::parse_commands("FILTER SALARY >= 4000\n| DISTINCT\n| LOWER").unwrap();
        let plain = execute_rat(sample_employees(), &mut stages(&commands));
        let (traced, _trace) = execute_rat_traced(sample_employees(), &mut stages(&commands));
        assert_eq!(plain, traced);
        assert_eq!(plain.len(), 4);
    }

    // --- Equivalence tests for all spec files ---

    macro_rules! equiv_test {
        ($name:ident, $file:expr) => {
            #[test]
            fn $name() {
                assert_equivalence($file);
            }
        };
    }

    equiv_test!(equiv_distinct, "distinct.pipe");
    equiv_test!(equiv_filter_over_35, "filter-over-35.pipe");
    equiv_test!(equiv_hole_discard, "hole-discard.pipe");
    equiv_test!(equiv_limit_two, "limit-two.pipe");
    equiv_test!(equiv_literal_header, "literal-header.pipe");
    equiv_test!(equiv_lower_names, "lower-names.pipe");
    equiv_test!(equiv_page_four, "page-four.pipe");
    equiv_test!(equiv_skip_take_window, "skip-take-window.pipe");
    equiv_test!(equiv_skip_two, "skip-two.pipe");
    equiv_test!(equiv_sort_age_name, "sort-age-name.pipe");
    equiv_test!(equiv_sort_natural, "sort-natural.pipe");
    equiv_test!(equiv_sort_then_page, "sort-then-page.pipe");
    equiv_test!(equiv_top_earners, "top-earners.pipe");
    equiv_test!(equiv_upper_luo, "upper-luo.pipe");
}
