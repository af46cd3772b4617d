//! Data providers bridging Lua test declarations to host test cases.
//!
//! A [`LuaDataProvider`] enumerates the cases a test module declares and runs
//! them one at a time inside the shared engine session. The
//! [`NormalizationTestProvider`] is the fixed five-column variant used for
//! Unicode normalization conformance.

mod lua;
mod module;
mod normalization;
mod types;

pub use lua::{Cases, LuaDataProvider};
pub use module::ModuleHandle;
pub use normalization::{NormalizationCase, NormalizationTestProvider};
pub use types::{Availability, NormalizationError, ProviderError, TestCase};
