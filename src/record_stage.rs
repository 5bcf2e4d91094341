//! Record-at-a-time stage trait and implementations.
//!
//! Each `RecordStage` processes one employee at a time, returning zero or
//! more output records. Stages that need the whole stream (SORT) or that
//! may have to emit without input (LITERAL) do so from `flush()`.

use std::collections::HashSet;

use tracing::debug;

use crate::dsl::{Command, Condition, SortKey, compare_by_keys};
use crate::record::Employee;

/// A pipeline stage that processes records one at a time.
pub trait RecordStage {
    /// Process a single input record, returning zero or more output records.
    fn process(&mut self, record: Employee) -> Vec<Employee>;

    /// Flush any accumulated state, returning final output records.
    ///
    /// Called once after all input records have been processed.
    fn flush(&mut self) -> Vec<Employee> {
        vec![]
    }

    /// The display name of this stage.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Stage implementations
// ---------------------------------------------------------------------------

/// CONSOLE - passes records through unchanged.
pub struct ConsoleStage;

impl RecordStage for ConsoleStage {
    fn process(&mut self, record: Employee) -> Vec<Employee> {
        debug!(record = %record, "CONSOLE");
        vec![record]
    }

    fn name(&self) -> &str {
        "CONSOLE"
    }
}

/// HOLE - discards all input, outputs nothing.
pub struct HoleStage;

impl RecordStage for HoleStage {
    fn process(&mut self, _record: Employee) -> Vec<Employee> {
        vec![]
    }

    fn name(&self) -> &str {
        "HOLE"
    }
}

/// LITERAL - emits a literal record before the first input record.
///
/// On `flush()`, emits the literal if no input records were received.
pub struct LiteralStage {
    record: Employee,
    emitted: bool,
}

impl RecordStage for LiteralStage {
    fn process(&mut self, record: Employee) -> Vec<Employee> {
        if !self.emitted {
            self.emitted = true;
            vec![self.record.clone(), record]
        } else {
            vec![record]
        }
    }

    fn flush(&mut self) -> Vec<Employee> {
        if !self.emitted {
            self.emitted = true;
            vec![self.record.clone()]
        } else {
            vec![]
        }
    }

    fn name(&self) -> &str {
        "LITERAL"
    }
}

/// FILTER - keeps records matching the condition.
pub struct FilterStage {
    condition: Condition,
}

impl RecordStage for FilterStage {
    fn process(&mut self, record: Employee) -> Vec<Employee> {
        if self.condition.matches(&record) {
            vec![record]
        } else {
            vec![]
        }
    }

    fn name(&self) -> &str {
        "FILTER"
    }
}

/// TAKE n - keeps the first n records, discards the rest.
pub struct TakeStage {
    n: usize,
    seen: usize,
}

impl RecordStage for TakeStage {
    fn process(&mut self, record: Employee) -> Vec<Employee> {
        if self.seen < self.n {
            self.seen += 1;
            vec![record]
        } else {
            vec![]
        }
    }

    fn name(&self) -> &str {
        "TAKE"
    }
}

/// SKIP n - skips the first n records, passes the rest.
pub struct SkipStage {
    n: usize,
    seen: usize,
}

impl RecordStage for SkipStage {
    fn process(&mut self, record: Employee) -> Vec<Employee> {
        if self.seen < self.n {
            self.seen += 1;
            vec![]
        } else {
            vec![record]
        }
    }

    fn name(&self) -> &str {
        "SKIP"
    }
}

/// PAGE p size - passes records `[start, end)` of the stream.
pub struct PageStage {
    start: usize,
    end: usize,
    seen: usize,
}

impl PageStage {
    fn new(page: usize, size: usize) -> Self {
        let start = page.saturating_sub(1).saturating_mul(size);
        Self {
            start,
            end: start.saturating_add(size),
            seen: 0,
        }
    }
}

impl RecordStage for PageStage {
    fn process(&mut self, record: Employee) -> Vec<Employee> {
        let index = self.seen;
        self.seen = self.seen.saturating_add(1);
        if (self.start..self.end).contains(&index) {
            vec![record]
        } else {
            vec![]
        }
    }

    fn name(&self) -> &str {
        "PAGE"
    }
}

/// DISTINCT - passes each structurally distinct record once.
pub struct DistinctStage {
    seen: HashSet<Employee>,
}

impl RecordStage for DistinctStage {
    fn process(&mut self, record: Employee) -> Vec<Employee> {
        if self.seen.insert(record.clone()) {
            vec![record]
        } else {
            vec![]
        }
    }

    fn name(&self) -> &str {
        "DISTINCT"
    }
}

/// SORT - buffers every record and emits them sorted on flush.
pub struct SortStage {
    keys: Vec<SortKey>,
    buffer: Vec<Employee>,
}

impl RecordStage for SortStage {
    fn process(&mut self, record: Employee) -> Vec<Employee> {
        self.buffer.push(record);
        vec![]
    }

    fn flush(&mut self) -> Vec<Employee> {
        let mut records = std::mem::take(&mut self.buffer);
        records.sort_by(|a, b| compare_by_keys(&self.keys, a, b));
        records
    }

    fn name(&self) -> &str {
        "SORT"
    }
}

/// UPPER - uppercases each name.
pub struct UpperStage;

impl RecordStage for UpperStage {
    fn process(&mut self, record: Employee) -> Vec<Employee> {
        vec![record.with_name(record.name().to_uppercase())]
    }

    fn name(&self) -> &str {
        "UPPER"
    }
}

/// LOWER - lowercases each name.
pub struct LowerStage;

impl RecordStage for LowerStage {
    fn process(&mut self, record: Employee) -> Vec<Employee> {
        vec![record.with_name(record.name().to_lowercase())]
    }

    fn name(&self) -> &str {
        "LOWER"
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create a `RecordStage` from a parsed `Command`.
pub fn command_to_record_stage(cmd: &Command) -> Box<dyn RecordStage> {
    match cmd {
        Command::Console => Box::new(ConsoleStage),
        Command::Hole => Box::new(HoleStage),
        Command::Literal { record } => Box::new(LiteralStage {
            record: record.clone(),
            emitted: false,
        }),
        Command::Filter { condition } => Box::new(FilterStage {
            condition: condition.clone(),
        }),
        Command::Take { n } => Box::new(TakeStage { n: *n, seen: 0 }),
        Command::Skip { n } => Box::new(SkipStage { n: *n, seen: 0 }),
        Command::Page { page, size } => Box::new(PageStage::new(*page, *size)),
        Command::Distinct => Box::new(DistinctStage {
            seen: HashSet::new(),
        }),
        Command::Sort { keys } => Box::new(SortStage {
            keys: keys.clone(),
            buffer: Vec::new(),
        }),
        Command::Upper => Box::new(UpperStage),
        Command::Lower => Box::new(LowerStage),
    }
}
