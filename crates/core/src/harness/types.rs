use thiserror::Error;

use crate::fixtures::FixtureError;
use crate::provider::ProviderError;
use crate::resolver::ResolveError;

/// Failure to assemble a harness from configuration.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error("page storage unavailable: {0}")]
    Pages(#[from] ResolveError),
}

/// One teardown step that did not complete.
#[derive(Debug)]
pub struct TeardownStep {
    /// The provider or resource being released.
    pub resource: String,
    pub error: ProviderError,
}

/// Every step of a teardown that failed. The remaining steps still ran.
#[derive(Debug, Error)]
#[error("teardown failed: {}", describe(.steps))]
pub struct TeardownError {
    pub steps: Vec<TeardownStep>,
}

fn describe(steps: &[TeardownStep]) -> String {
    steps
        .iter()
        .map(|s| format!("{}: {}", s.resource, s.error))
        .collect::<Vec<_>>()
        .join("; ")
}
