//! Three-valued case outcomes and per-suite reports.

use std::fmt;

use serde::Serialize;

use crate::provider::ProviderError;
use crate::scripting::ScriptValue;

/// Why a case failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// The case ran but produced something else.
    Mismatch { expected: ScriptValue, actual: ScriptValue },
    CaseNotFound { message: String },
    /// The sandboxed code raised an error.
    Script { message: String },
    /// The module loaded but does not follow the provider protocol.
    Protocol { message: String },
    Marshal { message: String },
    /// The normalization data file could not be read or parsed.
    Data { message: String },
    Engine { message: String },
}

impl From<ProviderError> for Failure {
    fn from(err: ProviderError) -> Self {
        let message = err.to_string();
        match err {
            ProviderError::CaseNotFound { .. } => Failure::CaseNotFound { message },
            ProviderError::Script { .. } => Failure::Script { message },
            ProviderError::Protocol { .. } => Failure::Protocol { message },
            ProviderError::Marshal { .. } => Failure::Marshal { message },
            ProviderError::Data(_) => Failure::Data { message },
            ProviderError::Engine(_) => Failure::Engine { message },
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Mismatch { expected, actual } => {
                write!(f, "mismatch\n  expected: {expected}\n    actual: {actual}")
            }
            Failure::CaseNotFound { message }
            | Failure::Script { message }
            | Failure::Protocol { message }
            | Failure::Marshal { message }
            | Failure::Data { message }
            | Failure::Engine { message } => f.write_str(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum CaseOutcome {
    Pass { label: String },
    Fail { label: String, failure: Failure },
    /// The environment cannot run the case. Never counted as a failure.
    Skip { label: String, reason: String },
}

impl CaseOutcome {
    pub fn label(&self) -> &str {
        match self {
            CaseOutcome::Pass { label }
            | CaseOutcome::Fail { label, .. }
            | CaseOutcome::Skip { label, .. } => label,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, CaseOutcome::Pass { .. })
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, CaseOutcome::Fail { .. })
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, CaseOutcome::Skip { .. })
    }
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseOutcome::Pass { label } => write!(f, "PASS {label}"),
            CaseOutcome::Fail { label, failure } => write!(f, "FAIL {label}: {failure}"),
            CaseOutcome::Skip { label, reason } => write!(f, "SKIP {label}: {reason}"),
        }
    }
}

/// Outcomes of one suite, in execution order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteReport {
    pub suite: String,
    pub outcomes: Vec<CaseOutcome>,
}

impl SuiteReport {
    pub fn new(suite: impl Into<String>) -> Self {
        Self { suite: suite.into(), outcomes: Vec::new() }
    }

    pub fn push(&mut self, outcome: CaseOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_pass()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_fail()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skip()).count()
    }

    /// True when nothing failed. Skips do not count.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.outcomes.iter().filter(|o| o.is_fail())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::NormalizationError;

    fn report() -> SuiteReport {
        let mut r = SuiteReport::new("CommonTests");
        r.push(CaseOutcome::Pass { label: "a".into() });
        r.push(CaseOutcome::Skip { label: "b".into(), reason: "no interpreter".into() });
        r.push(CaseOutcome::Fail {
            label: "c".into(),
            failure: Failure::Script { message: "boom".into() },
        });
        r
    }

    #[test]
    fn test_counts() {
        let r = report();
        assert_eq!((r.passed(), r.failed(), r.skipped()), (1, 1, 1));
        assert!(!r.is_success());
        assert_eq!(r.failures().map(CaseOutcome::label).collect::<Vec<_>>(), vec!["c"]);
    }

    #[test]
    fn test_skips_are_not_failures() {
        let mut r = SuiteReport::new("x");
        r.push(CaseOutcome::Skip { label: "a".into(), reason: "r".into() });
        assert!(r.is_success());
    }

    #[test]
    fn test_mismatch_shows_both_values() {
        let failure = Failure::Mismatch {
            expected: ScriptValue::strings(["a"]),
            actual: ScriptValue::strings(["b"]),
        };
        assert_eq!(
            failure.to_string(),
            "mismatch\n  expected: { \"a\" }\n    actual: { \"b\" }"
        );
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(CaseOutcome::Fail {
            label: "M[1]: x".into(),
            failure: Failure::Mismatch {
                expected: ScriptValue::Integer(1),
                actual: ScriptValue::Integer(2),
            },
        })
        .unwrap();
        assert_eq!(json["outcome"], "fail");
        assert_eq!(json["label"], "M[1]: x");
        assert_eq!(json["failure"]["kind"], "mismatch");
        assert_eq!(json["failure"]["actual"], 2);
    }

    #[test]
    fn test_provider_errors_map_to_failures() {
        let err = ProviderError::CaseNotFound { module: "M".into(), key: 9, count: 2 };
        assert!(matches!(Failure::from(err), Failure::CaseNotFound { .. }));
        let err = ProviderError::Script { module: "M".into(), message: "x".into() };
        assert!(matches!(Failure::from(err), Failure::Script { .. }));
        let err = ProviderError::Protocol { module: "M".into(), message: "no count".into() };
        assert!(matches!(Failure::from(err), Failure::Protocol { .. }));
    }

    #[test]
    fn test_bad_data_file_is_a_data_failure() {
        let err = ProviderError::Data(NormalizationError::Parse {
            path: "NormalizationTest.txt".into(),
            line: 3,
            message: "expected 5 columns".into(),
        });
        let json = serde_json::to_value(Failure::from(err)).unwrap();
        assert_eq!(json["kind"], "data");
        assert_eq!(json["message"], "NormalizationTest.txt:3: expected 5 columns");
    }
}
