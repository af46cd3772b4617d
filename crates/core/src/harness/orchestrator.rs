//! The test orchestrator.
//!
//! A [`TestHarness`] owns one lazily created engine session and the data
//! providers running against it. Cases produce [`CaseOutcome`]s, and
//! [`TestHarness::teardown`] releases everything in dependency order:
//! providers, then the provider registry, then the session.

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use tracing::{debug, warn};

use super::outcome::{CaseOutcome, Failure, SuiteReport};
use super::types::{HarnessError, TeardownError, TeardownStep};
use crate::config::ResolvedConfig;
use crate::fixtures::{FixtureSet, NORMALIZATION_MODULE};
use crate::pages::PageStore;
use crate::provider::{Availability, LuaDataProvider, NormalizationTestProvider, ProviderError};
use crate::render::{RenderContext, RenderOptions};
use crate::resolver::{EmptySource, FixtureResolver, TemplateResolver, TemplateSource};
use crate::scripting::{
    EmbeddedEngineFactory, EngineError, EngineFactory, EngineSession, EngineVariant, ScriptValue,
};

enum EngineState {
    Uninitialized,
    Ready(Rc<EngineSession>),
    /// The requested interpreter is missing. Every case using it skips.
    Unavailable { requested: EngineVariant, available: String },
    TornDown,
}

/// Result of [`TestHarness::scope`]: the body's value and the teardown
/// result, reported side by side.
#[derive(Debug)]
pub struct Scoped<T> {
    pub value: T,
    pub teardown: Result<(), TeardownError>,
}

pub struct TestHarness {
    resolver: Rc<dyn TemplateResolver>,
    factory: Box<dyn EngineFactory>,
    engine: EngineState,
    providers: HashMap<String, Rc<LuaDataProvider>>,
    normalization: Option<Rc<NormalizationTestProvider>>,
    label: Option<String>,
}

impl TestHarness {
    pub fn new(resolver: Rc<dyn TemplateResolver>, factory: Box<dyn EngineFactory>) -> Self {
        Self {
            resolver,
            factory,
            engine: EngineState::Uninitialized,
            providers: HashMap::new(),
            normalization: None,
            label: None,
        }
    }

    /// Harness over the built-in fixtures, falling through to the configured
    /// page storage.
    pub fn builtin(config: &ResolvedConfig) -> Result<Self, HarnessError> {
        let fixtures = FixtureSet::builtin_in(&config.fixtures_dir)?;
        let fallback: Box<dyn TemplateSource> = match &config.pages_root {
            Some(root) => Box::new(PageStore::new(root)?),
            None => Box::new(EmptySource),
        };
        let resolver = Rc::new(FixtureResolver::new(fixtures, fallback));
        let factory = EmbeddedEngineFactory::new(config.variant, config.sandbox.clone());
        Ok(Self::new(resolver, Box::new(factory)))
    }

    /// Run `body` against a fresh harness and always tear it down.
    ///
    /// If `body` panics the harness is still torn down while unwinding.
    pub fn scope<T>(
        resolver: Rc<dyn TemplateResolver>,
        factory: Box<dyn EngineFactory>,
        body: impl FnOnce(&mut TestHarness) -> T,
    ) -> Scoped<T> {
        let mut harness = TestHarness::new(resolver, factory);
        let value = body(&mut harness);
        let teardown = harness.teardown();
        Scoped { value, teardown }
    }

    /// The engine session, created on first use.
    pub fn engine(&mut self) -> Result<Rc<EngineSession>, EngineError> {
        match &self.engine {
            EngineState::Ready(session) => return Ok(session.clone()),
            EngineState::Unavailable { requested, available } => {
                return Err(EngineError::InterpreterNotFound {
                    requested: *requested,
                    available: available.clone(),
                });
            }
            EngineState::TornDown => return Err(EngineError::Destroyed),
            EngineState::Uninitialized => {}
        }

        let ctx = RenderContext::main_page(RenderOptions::new(self.resolver.clone()));
        match self.factory.create(ctx) {
            Ok(session) => {
                let session = Rc::new(session);
                self.engine = EngineState::Ready(session.clone());
                Ok(session)
            }
            Err(EngineError::InterpreterNotFound { requested, available }) => {
                warn!(%requested, %available, "interpreter unavailable, cases will be skipped");
                self.engine =
                    EngineState::Unavailable { requested, available: available.clone() };
                Err(EngineError::InterpreterNotFound { requested, available })
            }
            Err(e) => Err(e),
        }
    }

    /// The data provider for `module`, created on first use.
    pub fn provider(&mut self, module: &str) -> Result<Rc<LuaDataProvider>, ProviderError> {
        if let Some(p) = self.providers.get(module) {
            return Ok(p.clone());
        }
        let session = self.engine().map_err(ProviderError::Engine)?;
        let provider = Rc::new(LuaDataProvider::new(session, module)?);
        self.providers.insert(module.to_string(), provider.clone());
        Ok(provider)
    }

    /// Label of the case being run, kept after a failure.
    pub fn current_label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Run one case and compare its result with `expected`.
    pub fn run_case(
        &mut self,
        module: &str,
        key: usize,
        name: &str,
        expected: &ScriptValue,
    ) -> CaseOutcome {
        let label = format!("{module}[{key}]: {name}");
        self.label = Some(label.clone());
        debug!(case = %label, "running case");
        let result = self.provider(module).and_then(|p| p.run(key));
        self.judge(label, result, expected)
    }

    /// Enumerate and run every case a module declares.
    pub fn run_module(&mut self, module: &str) -> SuiteReport {
        let mut report = SuiteReport::new(module);
        let provider = match self.provider(module) {
            Ok(p) => p,
            Err(e) => {
                report.push(self.setup_outcome(module.to_string(), e));
                return report;
            }
        };

        for case in provider.cases() {
            match case {
                Ok(case) => {
                    report.push(self.run_case(module, case.key, &case.name, &case.expected))
                }
                Err(e) => report.push(self.setup_outcome(format!("{module}: enumeration"), e)),
            }
        }
        report
    }

    /// Run the normalization conformance suite over `data_file`.
    pub fn run_normalization(&mut self, data_file: &Path) -> SuiteReport {
        let mut report = SuiteReport::new(NORMALIZATION_MODULE);
        if let Availability::Unavailable(reason) = NormalizationTestProvider::available(data_file) {
            warn!(%reason, "skipping normalization tests");
            report.push(CaseOutcome::Skip { label: NORMALIZATION_MODULE.to_string(), reason });
            return report;
        }

        let provider = match self.normalization_provider(data_file) {
            Ok(p) => p,
            Err(e) => {
                report.push(self.setup_outcome(NORMALIZATION_MODULE.to_string(), e));
                return report;
            }
        };

        for case in provider.cases() {
            let label = format!("{NORMALIZATION_MODULE}: {}", case.name);
            self.label = Some(label.clone());
            let result = provider.run_case(case);
            report.push(self.judge(label, result, &case.expected()));
        }
        report
    }

    /// Release every provider, then the registry, then the session.
    ///
    /// All steps run even when one fails. Calling this again, or on a
    /// harness whose session was never created, is a no-op.
    pub fn teardown(&mut self) -> Result<(), TeardownError> {
        let mut steps = Vec::new();

        let mut providers: Vec<_> = self.providers.drain().collect();
        providers.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, provider) in providers {
            if let Err(error) = provider.destroy() {
                warn!(module = %name, %error, "failed to release provider");
                steps.push(TeardownStep { resource: name, error });
            }
        }
        if let Some(provider) = self.normalization.take() {
            if let Err(error) = provider.destroy() {
                warn!(module = NORMALIZATION_MODULE, %error, "failed to release provider");
                steps.push(TeardownStep { resource: NORMALIZATION_MODULE.to_string(), error });
            }
        }

        if let EngineState::Ready(session) =
            std::mem::replace(&mut self.engine, EngineState::TornDown)
        {
            session.destroy();
        }

        if steps.is_empty() { Ok(()) } else { Err(TeardownError { steps }) }
    }

    fn normalization_provider(
        &mut self,
        data_file: &Path,
    ) -> Result<Rc<NormalizationTestProvider>, ProviderError> {
        if let Some(p) = &self.normalization {
            if p.data_file() == data_file {
                return Ok(p.clone());
            }
        }
        let session = self.engine().map_err(ProviderError::Engine)?;
        let provider = Rc::new(NormalizationTestProvider::new(session, data_file)?);
        if let Some(old) = self.normalization.replace(provider.clone()) {
            old.destroy()?;
        }
        Ok(provider)
    }

    fn judge(
        &mut self,
        label: String,
        result: Result<ScriptValue, ProviderError>,
        expected: &ScriptValue,
    ) -> CaseOutcome {
        let outcome = match result {
            Ok(actual) if actual == *expected => CaseOutcome::Pass { label },
            Ok(actual) => CaseOutcome::Fail {
                label,
                failure: Failure::Mismatch { expected: expected.clone(), actual },
            },
            Err(e) => match skip_reason(&e) {
                Some(reason) => CaseOutcome::Skip { label, reason },
                None => CaseOutcome::Fail { label, failure: Failure::from(e) },
            },
        };
        if !outcome.is_fail() {
            self.label = None;
        }
        outcome
    }

    /// Outcome for a suite that could not get as far as running cases.
    fn setup_outcome(&mut self, label: String, err: ProviderError) -> CaseOutcome {
        match skip_reason(&err) {
            Some(reason) => CaseOutcome::Skip { label, reason },
            None => {
                self.label = Some(label.clone());
                CaseOutcome::Fail { label, failure: Failure::from(err) }
            }
        }
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            warn!(error = %e, "teardown on drop failed");
        }
    }
}

fn skip_reason(err: &ProviderError) -> Option<String> {
    match err {
        ProviderError::Engine(e) if e.is_unavailable() => Some(e.to_string()),
        _ => None,
    }
}
