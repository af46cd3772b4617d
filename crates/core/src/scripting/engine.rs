//! Lua scripting engine with sandboxing.
//!
//! An [`EngineSession`] is one sandboxed interpreter bound to one simulated
//! rendering context. Sessions are built by an [`EngineFactory`] and must be
//! released with [`EngineSession::destroy`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mlua::{HookTriggers, Lua, RegistryKey, Result as LuaResult, StdLib, Value, VmState};
use tracing::debug;

use super::bindings::{register_mw_table, register_require};
use super::types::{EngineError, EngineVariant, SandboxConfig};
use super::value::ScriptValue;
use crate::render::RenderContext;

/// Instructions between two instruction-limit checks.
const HOOK_GRANULARITY: u32 = 1000;

/// Builds engine sessions for a rendering context.
pub trait EngineFactory {
    /// Interpreter language version the sessions must run.
    fn variant(&self) -> EngineVariant;

    fn create(&self, ctx: RenderContext) -> Result<EngineSession, EngineError>;
}

/// Factory for the interpreter linked into this binary.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedEngineFactory {
    variant: EngineVariant,
    sandbox: SandboxConfig,
}

impl EmbeddedEngineFactory {
    pub fn new(variant: EngineVariant, sandbox: SandboxConfig) -> Self {
        Self { variant, sandbox }
    }
}

impl EngineFactory for EmbeddedEngineFactory {
    fn variant(&self) -> EngineVariant {
        self.variant
    }

    fn create(&self, ctx: RenderContext) -> Result<EngineSession, EngineError> {
        let budget = Rc::new(Cell::new(0));
        let lua = new_sandboxed_lua(&self.sandbox, budget.clone())?;

        let available = interpreter_version(&lua)?;
        if available != self.variant.version_string() {
            return Err(EngineError::InterpreterNotFound { requested: self.variant, available });
        }

        let ctx = Rc::new(ctx);
        register_mw_table(&lua)?;
        register_require(&lua, ctx.clone())?;

        debug!(variant = %self.variant, page = %ctx.title(), "created engine session");
        Ok(EngineSession {
            lua: RefCell::new(Some(lua)),
            context: ctx,
            variant: self.variant,
            budget,
        })
    }
}

/// The `_VERSION` reported by the interpreter linked into this binary.
pub fn linked_version() -> Result<String, EngineError> {
    interpreter_version(&Lua::new_with(StdLib::NONE, mlua::LuaOptions::default())?)
}

fn interpreter_version(lua: &Lua) -> Result<String, EngineError> {
    Ok(lua.globals().get::<String>("_VERSION")?)
}

/// Create a Lua state with the restricted standard library and limits applied.
fn new_sandboxed_lua(config: &SandboxConfig, budget: Rc<Cell<u64>>) -> LuaResult<Lua> {
    // Base functions (print, type, tostring, etc.) are always available.
    let libs = StdLib::TABLE | StdLib::STRING | StdLib::UTF8 | StdLib::MATH;
    let lua = Lua::new_with(libs, mlua::LuaOptions::default())?;

    if config.memory_limit > 0 {
        lua.set_memory_limit(config.memory_limit)?;
    }

    if config.instruction_limit > 0 {
        let limit = config.instruction_limit;
        lua.set_hook(
            HookTriggers::new().every_nth_instruction(HOOK_GRANULARITY),
            move |_, _| {
                let used = budget.get() + u64::from(HOOK_GRANULARITY);
                budget.set(used);
                if used > limit {
                    return Err(mlua::Error::runtime(format!(
                        "instruction limit of {limit} exceeded"
                    )));
                }
                Ok(VmState::Continue)
            },
        );
    }

    apply_sandbox(&lua)?;
    Ok(lua)
}

/// Apply sandbox restrictions by removing dangerous globals.
fn apply_sandbox(lua: &Lua) -> LuaResult<()> {
    let globals = lua.globals();

    // Removed:
    // - Execute arbitrary code: load, loadfile, dofile
    // - Access the filesystem: io
    // - Execute system commands: os
    // - Load external modules: require, package (replaced by our require)
    // - Inspect/modify internals: debug
    // - Cause resource exhaustion: collectgarbage

    globals.set("dofile", Value::Nil)?;
    globals.set("loadfile", Value::Nil)?;
    globals.set("load", Value::Nil)?;
    globals.set("require", Value::Nil)?;
    globals.set("package", Value::Nil)?;
    globals.set("io", Value::Nil)?;
    globals.set("os", Value::Nil)?;
    globals.set("debug", Value::Nil)?;
    globals.set("collectgarbage", Value::Nil)?;

    Ok(())
}

/// A sandboxed interpreter bound to one rendering context.
///
/// The session goes from *created* to *active* on first use and to
/// *destroyed* on [`destroy`](Self::destroy). After that every operation
/// fails with [`EngineError::Destroyed`].
pub struct EngineSession {
    lua: RefCell<Option<Lua>>,
    context: Rc<RenderContext>,
    variant: EngineVariant,
    budget: Rc<Cell<u64>>,
}

impl EngineSession {
    pub fn variant(&self) -> EngineVariant {
        self.variant
    }

    pub fn render_context(&self) -> &RenderContext {
        &self.context
    }

    pub fn is_destroyed(&self) -> bool {
        self.lua.borrow().is_none()
    }

    /// Enter the interpreter. The instruction budget restarts on each entry.
    pub fn enter<R>(&self, f: impl FnOnce(&Lua) -> LuaResult<R>) -> Result<R, EngineError> {
        let guard = self.lua.borrow();
        let lua = guard.as_ref().ok_or(EngineError::Destroyed)?;
        self.budget.set(0);
        Ok(f(lua)?)
    }

    /// Execute a Lua chunk and marshal its result.
    pub fn eval(&self, script: &str) -> Result<ScriptValue, EngineError> {
        let value = self.enter(|lua| lua.load(script).set_name("=eval").eval::<Value>())?;
        Ok(ScriptValue::from_lua_value(value)?)
    }

    /// Load a module through `require` and pin its value in the registry.
    pub fn load_module(&self, name: &str) -> Result<RegistryKey, EngineError> {
        self.enter(|lua| {
            let require: mlua::Function = lua.globals().get("require")?;
            let module: Value = require.call(format!("Module:{name}"))?;
            lua.create_registry_value(module)
        })
    }

    /// Drop a registry slot obtained from [`load_module`](Self::load_module).
    pub fn release(&self, key: RegistryKey) -> Result<(), EngineError> {
        self.enter(|lua| lua.remove_registry_value(key))
    }

    /// Release the interpreter. Safe to call more than once.
    pub fn destroy(&self) {
        if let Some(lua) = self.lua.borrow_mut().take() {
            debug!(variant = %self.variant, "destroying engine session");
            drop(lua);
        }
    }
}
