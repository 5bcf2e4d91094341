//! Demonstration scenarios for pipeline stages and variants.
//!
//! Each scenario runs one or more terminal actions against a roster and logs
//! every emitted element as `e: {element}`, with a separator line between
//! terminal actions. The emitted lines are also returned, one `Vec` per
//! terminal action, so callers can check them.

use std::collections::HashSet;
use std::fmt::Display;

use tracing::info;

use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::record::Employee;
use crate::variant::{Season, ThreadState, Variant, list_values};

const SEPARATOR: &str = "----------------------------------------";

/// Page shown by the paging scenario (1-indexed).
pub const PAGE_NUM: usize = 4;
/// Elements per page in the paging scenario.
pub const PAGE_SIZE: usize = 2;

/// Lines emitted by one scenario, grouped by terminal action.
pub type Sections = Vec<Vec<String>>;

/// A runnable demonstration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    Filter,
    Limit,
    Skip,
    Page,
    Distinct,
    Map,
    Sorted,
    Values,
    Override,
}

impl Variant for Scenario {
    const KIND: &'static str = "Scenario";

    fn values() -> &'static [Self] {
        &[
            Scenario::Filter,
            Scenario::Limit,
            Scenario::Skip,
            Scenario::Page,
            Scenario::Distinct,
            Scenario::Map,
            Scenario::Sorted,
            Scenario::Values,
            Scenario::Override,
        ]
    }

    fn name(self) -> &'static str {
        match self {
            Scenario::Filter => "filter",
            Scenario::Limit => "limit",
            Scenario::Skip => "skip",
            Scenario::Page => "page",
            Scenario::Distinct => "distinct",
            Scenario::Map => "map",
            Scenario::Sorted => "sorted",
            Scenario::Values => "values",
            Scenario::Override => "override",
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn words() -> Vec<String> {
    vec!["colg".to_string(), "cloud".to_string(), "java".to_string()]
}

/// Terminal action shared by every scenario: log and keep each element.
fn emit<T: Display>(items: impl Iterator<Item = T>) -> Vec<String> {
    let mut lines = Vec::new();
    Pipeline::new(items).for_each(|item| {
        let line = item.to_string();
        info!("e: {line}");
        lines.push(line);
    });
    lines
}

/// Collects a scenario's sections, logging a separator between them.
struct Transcript {
    sections: Sections,
}

impl Transcript {
    fn new() -> Self {
        Self {
            sections: Vec::new(),
        }
    }

    /// Run one terminal action as its own section.
    fn section(&mut self, action: impl FnOnce() -> Vec<String>) {
        if !self.sections.is_empty() {
            info!("{SEPARATOR}");
        }
        self.sections.push(action());
    }
}

impl Scenario {
    /// Run the scenario against `employees`.
    pub fn run(self, employees: &[Employee]) -> Result<Sections> {
        info!(scenario = self.name(), "running");
        let mut out = Transcript::new();

        match self {
            Scenario::Filter => {
                // Stages do nothing until the terminal action runs.
                let stream = Pipeline::new(employees.iter());
                let stream = stream.filter(|e| e.age() > 35);
                out.section(|| emit(stream));

                out.section(|| emit(Pipeline::new(employees.iter()).filter(|e| e.age() > 35)));

                out.section(|| {
                    let mut kept = employees.to_vec();
                    kept.retain(|e| e.age() > 35);
                    emit(kept.iter())
                });
            }
            Scenario::Limit => {
                out.section(|| emit(Pipeline::new(employees.iter()).limit(2)));
            }
            Scenario::Skip => {
                out.section(|| emit(Pipeline::new(employees.iter()).skip(2)));
            }
            Scenario::Page => {
                out.section(|| emit(Pipeline::new(employees.iter()).page(PAGE_NUM, PAGE_SIZE)));
            }
            Scenario::Distinct => {
                out.section(|| emit(Pipeline::new(employees.iter()).distinct()));

                out.section(|| {
                    let mut seen = HashSet::new();
                    let mut unique = employees.to_vec();
                    unique.retain(|e| seen.insert(e.clone()));
                    emit(unique.iter())
                });
            }
            Scenario::Map => {
                out.section(|| emit(Pipeline::new(words().into_iter()).map(|s| s.to_uppercase())));
                out.section(|| emit(Pipeline::new(employees.iter()).map(Employee::name)));
            }
            Scenario::Sorted => {
                out.section(|| emit(Pipeline::new(words().into_iter()).sorted()));

                out.section(|| {
                    let mut list = words();
                    list.sort_by(|a, b| a.cmp(b));
                    emit(list.iter())
                });

                out.section(|| {
                    emit(
                        Pipeline::new(employees.iter().cloned())
                            .sorted_by(Employee::by_age_then_name),
                    )
                });

                out.section(|| {
                    let mut roster = employees.to_vec();
                    roster.sort_by(Employee::by_age_then_name);
                    emit(roster.iter())
                });
            }
            Scenario::Values => {
                out.section(|| vec![log_line(list_values::<Season>())]);

                let season = Season::value_of("SPRING")?;
                out.section(|| {
                    vec![
                        season.show(),
                        log_line(season.to_string()),
                        log_line(season.description().to_string()),
                    ]
                });

                out.section(|| vec![log_line(list_values::<ThreadState>())]);
            }
            Scenario::Override => {
                out.section(|| Season::values().iter().map(|s| s.show()).collect());
            }
        }

        Ok(out.sections)
    }
}

fn log_line(line: String) -> String {
    info!("{line}");
    line
}

/// Run every scenario in declaration order.
pub fn run_all(employees: &[Employee]) -> Result<Vec<(Scenario, Sections)>> {
    let mut results = Vec::new();
    for &scenario in Scenario::values() {
        results.push((scenario, scenario.run(employees)?));
    }
    Ok(results)
}
