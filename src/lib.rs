//! # stream-demos
//!
//! Lazy, composable record pipelines and named variants with per-variant
//! behavior, demonstrated over a small in-memory employee roster.
//!
//! ## Overview
//!
//! - **Pipelines**: filter, limit, skip, page, distinct, map and sorted
//!   stages that do nothing until a terminal action drains them
//! - **Variants**: enums that list their cases, look them up by name, and
//!   dispatch behavior per case
//! - **Pipeline files**: the same stages written as a CMS-style text
//!   pipeline, run either as one lazy chain or record-at-a-time
//!
//! ## Example
//!
//! ```
//! use stream_demos::{Employee, Pipeline, sample_employees};
//!
//! let page: Vec<Employee> = Pipeline::new(sample_employees().into_iter())
//!     .skip(2)
//!     .limit(2)
//!     .collect();
//!
//! assert_eq!(page[0].name(), "Tom");
//! assert_eq!(page[1].name(), "Jax");
//! ```

pub mod debug_trace;
pub mod demo;
pub mod dsl;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod record;
pub mod record_stage;
pub mod variant;

pub use debug_trace::{FlushTrace, RatDebugTrace, RecordTrace};
pub use demo::{Scenario, Sections, run_all};
pub use dsl::{
    Command, CompareOp, Condition, FieldValue, SortKey, execute_pipeline, execute_pipeline_rat,
    execute_pipeline_rat_debug, parse_commands,
};
pub use error::{PipelineError, Result};
pub use executor::{execute_rat, execute_rat_traced};
pub use pipeline::{Distinct, Pipeline, Sorted};
pub use record::{
    Employee, Field, SAMPLE_DATA, Salary, load_employees, parse_employees, sample_employees,
};
pub use record_stage::{RecordStage, command_to_record_stage};
pub use variant::{Season, ThreadState, Variant, list_values};
