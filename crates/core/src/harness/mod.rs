//! Test orchestration: lazy engine creation, provider registry, outcomes and
//! ordered teardown.

mod orchestrator;
mod outcome;
mod types;

pub use orchestrator::{Scoped, TestHarness};
pub use outcome::{CaseOutcome, Failure, SuiteReport};
pub use types::{HarnessError, TeardownError, TeardownStep};
