//! Test harness for sandboxed Lua modules running inside a simulated wiki
//! rendering pipeline.
//!
//! Fixture modules are served through a [`resolver::FixtureResolver`] to an
//! [`scripting::EngineSession`]; [`provider`]s turn the cases a Lua module
//! declares into host test cases and the [`harness::TestHarness`] runs them.

pub mod config;
pub mod fixtures;
pub mod harness;
pub mod pages;
pub mod provider;
pub mod render;
pub mod resolver;
pub mod scripting;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
