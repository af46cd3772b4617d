//! Lua bindings for the wiki scripting environment.
//!
//! This module provides the `mw` global table and a `require` that loads
//! `Module:` pages through the session's rendering context.

use std::rc::Rc;

use mlua::{Function, Lua, Result as LuaResult, Table, Value, Variadic};
use tracing::debug;

use super::ustring::create_ustring_table;
use crate::pages::{DocumentRef, Namespace};
use crate::render::RenderContext;

/// Registry slot caching loaded modules, the session's `package.loaded`.
const LOADED_KEY: &str = "wikiscript.loaded";

/// Register the `mw` global table with all bindings.
///
/// After calling this function, Lua scripts can use:
/// - `mw.log(...)` - Write a debug log line
/// - `mw.ustring.*` - Code point aware string functions
pub fn register_mw_table(lua: &Lua) -> LuaResult<()> {
    let mw = lua.create_table()?;

    mw.set("log", create_log_fn(lua)?)?;
    mw.set("ustring", create_ustring_table(lua)?)?;

    lua.globals().set("mw", mw)?;
    Ok(())
}

/// Install `require(name)` resolving `Module:` pages through `ctx`.
///
/// Each module runs once per session; later calls return the cached value.
///
/// # Examples (in Lua)
///
/// ```lua
/// local tf = require('Module:TestFramework')
/// ```
pub fn register_require(lua: &Lua, ctx: Rc<RenderContext>) -> LuaResult<()> {
    lua.set_named_registry_value(LOADED_KEY, lua.create_table()?)?;

    let require = lua.create_function(move |lua, name: String| {
        let reference = DocumentRef::from(name.as_str());
        if reference.namespace() != Namespace::Module || reference.name().is_empty() {
            return Err(mlua::Error::runtime(format!(
                "bad argument #1 to 'require' (module name must start with 'Module:', got '{name}')"
            )));
        }
        let key = reference.to_string();

        let loaded: Table = lua.named_registry_value(LOADED_KEY)?;
        let cached: Value = loaded.raw_get(key.as_str())?;
        if !cached.is_nil() {
            return Ok(cached);
        }

        let fetched = ctx
            .fetch_template(&reference)
            .map_err(mlua::Error::external)?
            .ok_or_else(|| mlua::Error::runtime(format!("module '{key}' not found")))?;

        debug!(module = %key, "loading module");
        let value: Value = lua.load(fetched.text.as_str()).set_name(format!("={key}")).eval()?;
        let value = if value.is_nil() { Value::Boolean(true) } else { value };
        loaded.raw_set(key.as_str(), value.clone())?;
        Ok(value)
    })?;

    lua.globals().set("require", require)?;
    Ok(())
}

/// Create the `mw.log(...)` function.
fn create_log_fn(lua: &Lua) -> LuaResult<Function> {
    lua.create_function(|_, args: Variadic<Value>| {
        let line = args.iter().map(display_value).collect::<Vec<_>>().join("\t");
        debug!(target: "wikiscript::lua", "{line}");
        Ok(())
    })
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::String(s) => s.to_string_lossy(),
        Value::Integer(i) => i.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Boolean(b) => b.to_string(),
        other => other.type_name().to_string(),
    }
}
