//! Template resolution.
//!
//! The rendering context asks a [`TemplateResolver`] for the text of every
//! page it needs. [`FixtureResolver`] answers module references that name a
//! known fixture and hands everything else to the real resolution path, a
//! [`TemplateSource`].

mod types;

pub use types::{ResolveError, TemplateFetch};

use tracing::trace;

use crate::fixtures::FixtureSet;
use crate::pages::{DocumentRef, Namespace};
use crate::render::RenderContext;

/// Content-fetch callback of a rendering context.
///
/// `Ok(None)` means the page does not exist.
pub trait TemplateResolver {
    fn resolve(
        &self,
        reference: &DocumentRef,
        ctx: &RenderContext,
    ) -> Result<Option<TemplateFetch>, ResolveError>;
}

/// Stateless storage lookup used when no resolver intercepts a reference.
pub trait TemplateSource {
    fn fetch(&self, reference: &DocumentRef) -> Result<Option<TemplateFetch>, ResolveError>;
}

/// Real resolution path for runs without page storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptySource;

impl TemplateSource for EmptySource {
    fn fetch(&self, _reference: &DocumentRef) -> Result<Option<TemplateFetch>, ResolveError> {
        Ok(None)
    }
}

/// Serves fixture modules in place of stored `Module:` pages.
pub struct FixtureResolver {
    fixtures: FixtureSet,
    fallback: Box<dyn TemplateSource>,
}

impl FixtureResolver {
    pub fn new(fixtures: FixtureSet, fallback: Box<dyn TemplateSource>) -> Self {
        Self { fixtures, fallback }
    }

    pub fn fixtures(&self) -> &FixtureSet {
        &self.fixtures
    }
}

impl TemplateResolver for FixtureResolver {
    fn resolve(
        &self,
        reference: &DocumentRef,
        _ctx: &RenderContext,
    ) -> Result<Option<TemplateFetch>, ResolveError> {
        if reference.namespace() == Namespace::Module {
            if let Some(module) = self.fixtures.get(reference.name()) {
                trace!(page = %reference, path = %module.path.display(), "serving fixture");
                return Ok(Some(TemplateFetch {
                    text: module.source.clone(),
                    final_ref: reference.clone(),
                    deps: Vec::new(),
                }));
            }
        }
        self.fallback.fetch(reference)
    }
}
