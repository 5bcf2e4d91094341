//! Named variants with per-variant behavior.
//!
//! A [`Variant`] type lists its cases with `values()` and looks them up by
//! exact name with `value_of()`. Behavior that differs per case is a plain
//! `match` on the enum.

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::error::{PipelineError, Result};

/// A closed set of named cases.
pub trait Variant: Sized + Copy + 'static {
    /// Type name used in lookup errors.
    const KIND: &'static str;

    /// Every case, in declaration order.
    fn values() -> &'static [Self];

    /// The case's declared name.
    fn name(self) -> &'static str;

    /// Position in declaration order.
    fn ordinal(self) -> usize
    where
        Self: PartialEq,
    {
        Self::values()
            .iter()
            .position(|v| *v == self)
            .unwrap_or_default()
    }

    /// Look a case up by its exact, case-sensitive name.
    fn value_of(name: &str) -> Result<Self> {
        Self::values()
            .iter()
            .copied()
            .find(|v| v.name() == name)
            .ok_or_else(|| PipelineError::UnknownVariant {
                kind: Self::KIND,
                name: name.to_string(),
            })
    }
}

/// The four seasons, each with its own `show()` behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub fn description(self) -> &'static str {
        match self {
            Season::Spring => "warm spring, flowers bloom",
            Season::Summer => "hot summer days",
            Season::Fall => "crisp autumn air",
            Season::Winter => "cold winter snow",
        }
    }

    /// Log and return this season's own message.
    pub fn show(self) -> String {
        let message = match self {
            Season::Spring => "Where is spring?",
            Season::Summer => "Summer is here",
            Season::Fall => "Autumn does not come back",
            Season::Winter => "About winter",
        };
        info!(season = self.name(), "{message}");
        message.to_string()
    }
}

impl Variant for Season {
    const KIND: &'static str = "Season";

    fn values() -> &'static [Self] {
        &[Season::Spring, Season::Summer, Season::Fall, Season::Winter]
    }

    fn name(self) -> &'static str {
        match self {
            Season::Spring => "SPRING",
            Season::Summer => "SUMMER",
            Season::Fall => "FALL",
            Season::Winter => "WINTER",
        }
    }
}

/// Lifecycle states of a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadState {
    New,
    Runnable,
    Blocked,
    Waiting,
    TimedWaiting,
    Terminated,
}

impl Variant for ThreadState {
    const KIND: &'static str = "ThreadState";

    fn values() -> &'static [Self] {
        &[
            ThreadState::New,
            ThreadState::Runnable,
            ThreadState::Blocked,
            ThreadState::Waiting,
            ThreadState::TimedWaiting,
            ThreadState::Terminated,
        ]
    }

    fn name(self) -> &'static str {
        match self {
            ThreadState::New => "NEW",
            ThreadState::Runnable => "RUNNABLE",
            ThreadState::Blocked => "BLOCKED",
            ThreadState::Waiting => "WAITING",
            ThreadState::TimedWaiting => "TIMED_WAITING",
            ThreadState::Terminated => "TERMINATED",
        }
    }
}

macro_rules! variant_str_impls {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.name())
                }
            }

            impl FromStr for $ty {
                type Err = PipelineError;

                fn from_str(s: &str) -> Result<Self> {
                    <$ty as Variant>::value_of(s)
                }
            }
        )*
    };
}

variant_str_impls!(Season, ThreadState);

/// Render every case of `V` as `[A, B, C]`.
pub fn list_values<V: Variant + fmt::Display>() -> String {
    let names: Vec<String> = V::values().iter().map(|v| v.to_string()).collect();
    format!("[{}]", names.join(", "))
}
