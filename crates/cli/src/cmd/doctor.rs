use std::path::Path;

use wikiscript_core::config::loader::{ConfigLoader, default_config_path};
use wikiscript_core::fixtures::FixtureSet;
use wikiscript_core::pages::{Namespace, PageStore};
use wikiscript_core::provider::{Availability, NormalizationTestProvider};
use wikiscript_core::scripting::linked_version;

pub fn run(config: Option<&Path>) {
    let rc = match ConfigLoader::load(config) {
        Ok(rc) => rc,
        Err(e) => {
            println!("FAIL wikiscript doctor");
            println!("{e}");
            if config.is_none() {
                println!("looked for: {}", default_config_path().display());
            }
            std::process::exit(1);
        }
    };

    let mut problems = Vec::new();

    let linked = match linked_version() {
        Ok(v) => v,
        Err(e) => {
            problems.push(format!("interpreter: {e}"));
            "unknown".to_string()
        }
    };
    if linked != rc.variant.version_string() {
        problems.push(format!(
            "interpreter: {} requested but {linked} is linked",
            rc.variant
        ));
    }

    let fixtures = match FixtureSet::builtin_in(&rc.fixtures_dir) {
        Ok(set) => set.names().collect::<Vec<_>>().join(", "),
        Err(e) => {
            problems.push(format!("fixtures: {e}"));
            "(failed to load)".to_string()
        }
    };

    let stored = match &rc.pages_root {
        Some(root) => match PageStore::new(root).and_then(|store| store.list(Namespace::Module)) {
            Ok(modules) if modules.is_empty() => "(none)".to_string(),
            Ok(modules) => modules.iter().map(|m| m.name()).collect::<Vec<_>>().join(", "),
            Err(e) => {
                problems.push(format!("pages: {e}"));
                "(failed to list)".to_string()
            }
        },
        None => "(none)".to_string(),
    };

    if problems.is_empty() {
        println!("OK   wikiscript doctor");
    } else {
        println!("FAIL wikiscript doctor");
    }
    println!(
        "path: {}",
        rc.source.as_ref().map_or_else(
            || format!("{} (not found, using defaults)", default_config_path().display()),
            |p| p.display().to_string()
        )
    );
    println!("engine.variant: {}", rc.variant);
    println!("engine.linked: {linked}");
    println!("engine.memory_limit: {}", rc.sandbox.memory_limit);
    println!("engine.instruction_limit: {}", rc.sandbox.instruction_limit);
    println!("fixtures_dir: {}", rc.fixtures_dir.display());
    println!("fixtures: {fixtures}");
    println!(
        "pages_root: {}",
        rc.pages_root.as_ref().map_or_else(|| "(none)".to_string(), |p| p.display().to_string())
    );
    println!("stored_modules: {stored}");
    match NormalizationTestProvider::available(&rc.normalization_data) {
        Availability::Available => {
            println!("normalization_data: {}", rc.normalization_data.display())
        }
        Availability::Unavailable(reason) => println!("normalization_data: {reason} (will skip)"),
    }

    if !problems.is_empty() {
        for p in &problems {
            println!("{p}");
        }
        std::process::exit(1);
    }
}
