use std::cell::Cell;
use std::fs;
use std::rc::Rc;

use tempfile::tempdir;
use wikiscript_core::fixtures::{BUILTIN_MODULES, FixtureSet};
use wikiscript_core::pages::{DocumentRef, PageStore};
use wikiscript_core::render::{RenderContext, RenderOptions};
use wikiscript_core::resolver::{
    EmptySource, FixtureResolver, ResolveError, TemplateFetch, TemplateResolver, TemplateSource,
};

struct CountingSource {
    calls: Rc<Cell<usize>>,
}

impl TemplateSource for CountingSource {
    fn fetch(&self, _reference: &DocumentRef) -> Result<Option<TemplateFetch>, ResolveError> {
        self.calls.set(self.calls.get() + 1);
        Ok(None)
    }
}

fn context_for(resolver: Rc<dyn TemplateResolver>) -> RenderContext {
    RenderContext::main_page(RenderOptions::new(resolver))
}

#[test]
fn fixture_text_is_byte_identical_to_disk() {
    let fixtures = FixtureSet::builtin().unwrap();
    let resolver = Rc::new(FixtureResolver::new(fixtures.clone(), Box::new(EmptySource)));
    let ctx = context_for(resolver.clone());

    for (name, _) in BUILTIN_MODULES {
        let reference = DocumentRef::module(name);
        let fetched = resolver.resolve(&reference, &ctx).unwrap().unwrap();
        let on_disk = fs::read(&fixtures.get(name).unwrap().path).unwrap();
        assert_eq!(fetched.text.as_bytes(), on_disk.as_slice(), "{name}");
        assert_eq!(fetched.final_ref, reference);
        assert!(fetched.deps.is_empty());
    }
}

#[test]
fn unknown_module_falls_through_to_real_path() {
    let calls = Rc::new(Cell::new(0));
    let resolver: Rc<dyn TemplateResolver> = Rc::new(FixtureResolver::new(
        FixtureSet::builtin().unwrap(),
        Box::new(CountingSource { calls: calls.clone() }),
    ));
    let ctx = context_for(resolver.clone());

    let missing = resolver.resolve(&DocumentRef::module("NoSuchModule"), &ctx).unwrap();
    assert!(missing.is_none());
    assert_eq!(calls.get(), 1);

    // A fixture name outside the Module namespace is not a fixture hit.
    let other = resolver.resolve(&DocumentRef::from("Template:CommonTests"), &ctx).unwrap();
    assert!(other.is_none());
    assert_eq!(calls.get(), 2);
}

#[test]
fn page_store_serves_real_modules_and_redirects() {
    let tmp = tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("Module")).unwrap();
    fs::write(tmp.path().join("Module/Real_Page.lua"), "return { real = true }\n").unwrap();
    fs::write(tmp.path().join("Module/Alias.lua"), "#REDIRECT [[Module:Real Page]]\n").unwrap();

    let store = PageStore::new(tmp.path()).unwrap();
    let resolver: Rc<dyn TemplateResolver> =
        Rc::new(FixtureResolver::new(FixtureSet::builtin().unwrap(), Box::new(store)));
    let ctx = context_for(resolver);

    let direct = ctx.fetch_template(&DocumentRef::module("Real Page")).unwrap().unwrap();
    assert_eq!(direct.text, "return { real = true }\n");
    assert!(direct.deps.is_empty());

    let alias = DocumentRef::module("Alias");
    let redirected = ctx.fetch_template(&alias).unwrap().unwrap();
    assert_eq!(redirected.final_ref, DocumentRef::module("Real Page"));
    assert_eq!(redirected.deps, vec![alias.clone()]);

    let deps = ctx.template_deps();
    assert!(deps.contains(&DocumentRef::module("Real Page")));
    assert!(deps.contains(&alias));
}

#[test]
fn fixtures_shadow_stored_pages() {
    let tmp = tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("Module")).unwrap();
    fs::write(tmp.path().join("Module/CommonTests.lua"), "return 'stored'\n").unwrap();

    let fixtures = FixtureSet::builtin().unwrap();
    let expected = fixtures.get("CommonTests").unwrap().source.clone();
    let resolver: Rc<dyn TemplateResolver> = Rc::new(FixtureResolver::new(
        fixtures,
        Box::new(PageStore::new(tmp.path()).unwrap()),
    ));
    let ctx = context_for(resolver);

    let fetched = ctx.fetch_template(&DocumentRef::module("CommonTests")).unwrap().unwrap();
    assert_eq!(fetched.text, expected);
}
