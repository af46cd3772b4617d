//! Sandboxed Lua scripting for wiki modules.
//!
//! This module provides the engine session that test modules run in: a
//! restricted Lua interpreter bound to a simulated rendering context, with
//! `require` wired to the context's template callback.
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use wikiscript_core::fixtures::FixtureSet;
//! use wikiscript_core::render::{RenderContext, RenderOptions};
//! use wikiscript_core::resolver::{EmptySource, FixtureResolver};
//! use wikiscript_core::scripting::{EmbeddedEngineFactory, EngineFactory};
//!
//! let resolver = FixtureResolver::new(FixtureSet::builtin().unwrap(), Box::new(EmptySource));
//! let ctx = RenderContext::main_page(RenderOptions::new(Rc::new(resolver)));
//! let session = EmbeddedEngineFactory::default().create(ctx).unwrap();
//!
//! let len = session.eval("return mw.ustring.len('añb')").unwrap();
//! println!("{len}");
//! session.destroy();
//! ```
//!
//! # Available Lua Functions
//!
//! - `require('Module:Name')` - Load a module page through the resolver
//! - `mw.log(...)` - Write a debug log line
//! - `mw.ustring.*` - `isutf8`, `len`, `sub`, `codepoint`, `char`, `upper`,
//!   `lower`, `toNFC`, `toNFD`, `toNFKC`, `toNFKD`
//!
//! # Security
//!
//! The interpreter only loads the base, `table`, `string`, `utf8` and `math`
//! libraries, removes `load`, `loadfile`, `dofile`, `io`, `os`, `debug`,
//! `package` and `collectgarbage`, and enforces the memory and instruction
//! limits of its [`SandboxConfig`].

pub mod bindings;
pub mod engine;
pub mod types;
pub mod ustring;
pub mod value;

pub use engine::{EmbeddedEngineFactory, EngineFactory, EngineSession, linked_version};
pub use types::{EngineError, EngineVariant, SandboxConfig};
pub use value::{MarshalError, ScriptValue};
