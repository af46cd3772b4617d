//! Simulated rendering context.
//!
//! Stands in for a full page render: it knows which page is being rendered,
//! which output it produces, and which callback fetches templates. Every
//! successful fetch is recorded so template side effects can be inspected
//! after a script ran.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::pages::DocumentRef;
use crate::resolver::{ResolveError, TemplateFetch, TemplateResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Html,
    Wiki,
}

/// Options a render starts with.
#[derive(Clone)]
pub struct RenderOptions {
    template_callback: Rc<dyn TemplateResolver>,
}

impl RenderOptions {
    pub fn new(template_callback: Rc<dyn TemplateResolver>) -> Self {
        Self { template_callback }
    }
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions").finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct RenderContext {
    title: DocumentRef,
    output: OutputType,
    options: RenderOptions,
    template_deps: RefCell<Vec<DocumentRef>>,
}

impl RenderContext {
    pub fn new(title: DocumentRef, output: OutputType, options: RenderOptions) -> Self {
        Self { title, output, options, template_deps: RefCell::new(Vec::new()) }
    }

    /// An HTML render of the main page.
    pub fn main_page(options: RenderOptions) -> Self {
        Self::new(DocumentRef::main_page(), OutputType::Html, options)
    }

    pub fn title(&self) -> &DocumentRef {
        &self.title
    }

    pub fn output(&self) -> OutputType {
        self.output
    }

    /// Fetch a page through the template callback and record it.
    pub fn fetch_template(
        &self,
        reference: &DocumentRef,
    ) -> Result<Option<TemplateFetch>, ResolveError> {
        let fetched = self.options.template_callback.resolve(reference, self)?;
        match &fetched {
            Some(f) => {
                debug!(page = %reference, resolved = %f.final_ref, "fetched template");
                let mut deps = self.template_deps.borrow_mut();
                for r in std::iter::once(&f.final_ref).chain(f.deps.iter()) {
                    if !deps.contains(r) {
                        deps.push(r.clone());
                    }
                }
            }
            None => debug!(page = %reference, "template does not exist"),
        }
        Ok(fetched)
    }

    /// Every page fetched so far, in first-fetch order.
    pub fn template_deps(&self) -> Vec<DocumentRef> {
        self.template_deps.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl TemplateResolver for Echo {
        fn resolve(
            &self,
            reference: &DocumentRef,
            _ctx: &RenderContext,
        ) -> Result<Option<TemplateFetch>, ResolveError> {
            if reference.name() == "Missing" {
                return Ok(None);
            }
            Ok(Some(TemplateFetch {
                text: reference.to_string(),
                final_ref: reference.clone(),
                deps: vec![DocumentRef::module("Dep")],
            }))
        }
    }

    #[test]
    fn test_fetch_records_final_ref_and_deps_once() {
        let ctx = RenderContext::main_page(RenderOptions::new(Rc::new(Echo)));
        ctx.fetch_template(&DocumentRef::module("A")).unwrap();
        ctx.fetch_template(&DocumentRef::module("A")).unwrap();

        assert_eq!(
            ctx.template_deps(),
            vec![DocumentRef::module("A"), DocumentRef::module("Dep")]
        );
    }

    #[test]
    fn test_missing_template_not_recorded() {
        let ctx = RenderContext::main_page(RenderOptions::new(Rc::new(Echo)));
        assert!(ctx.fetch_template(&DocumentRef::module("Missing")).unwrap().is_none());
        assert!(ctx.template_deps().is_empty());
    }

    #[test]
    fn test_main_page_defaults() {
        let ctx = RenderContext::main_page(RenderOptions::new(Rc::new(Echo)));
        assert_eq!(ctx.title(), &DocumentRef::main_page());
        assert_eq!(ctx.output(), OutputType::Html);
    }
}
