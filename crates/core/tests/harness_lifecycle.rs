use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::rc::Rc;

use wikiscript_core::fixtures::{BUILTIN_DIR, FixtureSet};
use wikiscript_core::harness::{CaseOutcome, Failure, Scoped, TestHarness};
use wikiscript_core::provider::TestCase;
use wikiscript_core::resolver::{EmptySource, FixtureResolver, TemplateResolver};
use wikiscript_core::scripting::{
    EmbeddedEngineFactory, EngineFactory, EngineVariant, SandboxConfig, ScriptValue,
};

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fault_resolver() -> Rc<dyn TemplateResolver> {
    let fixtures = FixtureSet::builder()
        .module("TestFramework", Path::new(BUILTIN_DIR).join("TestFramework.lua"))
        .module("FaultTests", Path::new(FIXTURES).join("FaultTests.lua"))
        .build()
        .unwrap();
    Rc::new(FixtureResolver::new(fixtures, Box::new(EmptySource)))
}

fn builtin_resolver() -> Rc<dyn TemplateResolver> {
    Rc::new(FixtureResolver::new(FixtureSet::builtin().unwrap(), Box::new(EmptySource)))
}

fn factory(variant: EngineVariant) -> Box<dyn EngineFactory> {
    Box::new(EmbeddedEngineFactory::new(variant, SandboxConfig::restricted()))
}

fn declared_cases(module: &str) -> Vec<TestCase> {
    let mut harness = TestHarness::new(builtin_resolver(), factory(EngineVariant::Lua54));
    let provider = harness.provider(module).unwrap();
    let cases = provider.cases().collect::<Result<Vec<_>, _>>().unwrap();
    drop(provider);
    harness.teardown().unwrap();
    cases
}

#[test]
fn builtin_suites_pass() {
    let mut harness = TestHarness::new(builtin_resolver(), factory(EngineVariant::Lua54));
    for module in ["CommonTests", "UstringTests"] {
        let report = harness.run_module(module);
        assert!(report.passed() > 0, "{module}: nothing ran");
        assert!(report.is_success(), "{module}: {:?}", report.failures().collect::<Vec<_>>());
        assert_eq!(report.skipped(), 0);
    }
    assert!(harness.current_label().is_none());
    harness.teardown().unwrap();
}

#[test]
fn teardown_without_session_is_safe() {
    let mut harness = TestHarness::new(builtin_resolver(), factory(EngineVariant::Lua54));
    harness.teardown().unwrap();
    harness.teardown().unwrap();
}

#[test]
fn teardown_is_idempotent_after_a_run() {
    let mut harness = TestHarness::new(builtin_resolver(), factory(EngineVariant::Lua54));
    let session = harness.engine().unwrap();
    harness.run_module("CommonTests");

    harness.teardown().unwrap();
    assert!(session.is_destroyed());
    harness.teardown().unwrap();
}

#[test]
fn unavailable_interpreter_skips_every_case() {
    let cases = declared_cases("CommonTests");
    let mut harness = TestHarness::new(builtin_resolver(), factory(EngineVariant::Lua51));

    for case in &cases {
        let outcome = harness.run_case("CommonTests", case.key, &case.name, &case.expected);
        assert!(outcome.is_skip(), "{outcome}");
    }

    let report = harness.run_module("CommonTests");
    assert_eq!(report.failed(), 0);
    assert!(report.skipped() > 0);
    assert!(report.is_success());
    assert!(harness.current_label().is_none());
    harness.teardown().unwrap();
}

#[test]
fn script_fault_keeps_the_label_and_teardown_runs() {
    let scoped = TestHarness::scope(fault_resolver(), factory(EngineVariant::Lua54), |h| {
        let one = ScriptValue::List(vec![ScriptValue::Integer(1)]);
        let passing = h.run_case("FaultTests", 1, "passes", &one);
        assert!(passing.is_pass(), "{passing}");

        let expected = h.provider("FaultTests").unwrap().case(2).unwrap().expected;
        let outcome = h.run_case("FaultTests", 2, "divzero", &expected);
        (outcome, h.current_label().map(str::to_string))
    });

    let (outcome, label) = scoped.value;
    match &outcome {
        CaseOutcome::Fail { label, failure: Failure::Script { message } } => {
            assert!(label.contains("divzero"), "{label}");
            assert!(message.contains("Module:FaultTests:11:"), "{message}");
        }
        other => panic!("expected a script failure, got {other}"),
    }
    assert_eq!(label.as_deref(), Some("FaultTests[2]: divzero"));
    scoped.teardown.unwrap();
}

#[test]
fn mismatch_reports_both_values() {
    let mut harness = TestHarness::new(fault_resolver(), factory(EngineVariant::Lua54));
    let report = harness.run_module("FaultTests");
    assert_eq!((report.passed(), report.failed()), (1, 3));

    let mismatch = &report.outcomes[2];
    match mismatch {
        CaseOutcome::Fail { failure: Failure::Mismatch { expected, actual }, .. } => {
            assert_eq!(expected.to_string(), "{ \"expected\" }");
            assert_eq!(actual.to_string(), "{ \"actual\" }");
        }
        other => panic!("expected a mismatch, got {other}"),
    }
    harness.teardown().unwrap();
}

#[test]
fn distinct_byte_strings_do_not_compare_equal() {
    let mut harness = TestHarness::new(fault_resolver(), factory(EngineVariant::Lua54));
    let expected = harness.provider("FaultTests").unwrap().case(4).unwrap().expected;
    let outcome = harness.run_case("FaultTests", 4, "bytes", &expected);

    match &outcome {
        CaseOutcome::Fail { failure: Failure::Mismatch { expected, actual }, .. } => {
            assert_eq!(*expected, ScriptValue::List(vec![ScriptValue::Bytes(vec![255])]));
            assert_eq!(*actual, ScriptValue::List(vec![ScriptValue::Bytes(vec![254])]));
        }
        other => panic!("expected a mismatch, got {other}"),
    }
    assert_eq!(harness.current_label(), Some("FaultTests[4]: bytes"));
    harness.teardown().unwrap();
}

#[test]
fn unknown_case_fails_without_skipping() {
    let mut harness = TestHarness::new(builtin_resolver(), factory(EngineVariant::Lua54));
    let outcome = harness.run_case("CommonTests", 999, "missing", &ScriptValue::Nil);
    assert!(matches!(outcome, CaseOutcome::Fail { failure: Failure::CaseNotFound { .. }, .. }));
}

#[test]
fn teardown_collects_every_failing_step() {
    let mut harness = TestHarness::new(builtin_resolver(), factory(EngineVariant::Lua54));
    harness.provider("CommonTests").unwrap();
    harness.provider("UstringTests").unwrap();

    // Destroying the session first leaves both providers unable to release.
    harness.engine().unwrap().destroy();

    let err = harness.teardown().unwrap_err();
    let resources: Vec<_> = err.steps.iter().map(|s| s.resource.as_str()).collect();
    assert_eq!(resources, vec!["CommonTests", "UstringTests"]);
    harness.teardown().unwrap();
}

#[test]
fn scope_tears_down_after_a_panic() {
    let mut session = None;
    let result = catch_unwind(AssertUnwindSafe(|| {
        let _: Scoped<()> =
            TestHarness::scope(builtin_resolver(), factory(EngineVariant::Lua54), |h| {
                session = Some(h.engine().unwrap());
                panic!("body failed");
            });
    }));

    assert!(result.is_err());
    assert!(session.unwrap().is_destroyed());
}
