//! A loaded module pinned in an engine session.

use std::cell::RefCell;
use std::rc::Rc;

use mlua::{FromLuaMulti, Function, IntoLuaMulti, RegistryKey, Table, Value};

use super::types::ProviderError;
use crate::scripting::{EngineError, EngineSession};

pub struct ModuleHandle {
    name: String,
    session: Rc<EngineSession>,
    table: RefCell<Option<RegistryKey>>,
}

impl ModuleHandle {
    /// Load `Module:<name>` and check it evaluates to a table.
    pub fn load(session: Rc<EngineSession>, name: &str) -> Result<Self, ProviderError> {
        let key = session.load_module(name).map_err(|e| ProviderError::from_engine(name, e))?;

        let is_table = session
            .enter(|lua| Ok(matches!(lua.registry_value::<Value>(&key)?, Value::Table(_))))
            .map_err(|e| ProviderError::from_engine(name, e))?;
        if !is_table {
            // Best effort: the session is fine, only the module is unusable.
            let _ = session.release(key);
            return Err(ProviderError::Protocol {
                module: name.to_string(),
                message: "module must return a table".to_string(),
            });
        }

        Ok(Self { name: name.to_string(), session, table: RefCell::new(Some(key)) })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call `module.<function>(args)` inside the session.
    pub fn call<A, R>(&self, function: &str, args: A) -> Result<R, ProviderError>
    where
        A: IntoLuaMulti,
        R: FromLuaMulti,
    {
        let guard = self.table.borrow();
        let key = guard.as_ref().ok_or(ProviderError::Engine(EngineError::Destroyed))?;

        let entry = self
            .session
            .enter(|lua| lua.registry_value::<Table>(key)?.get::<Option<Function>>(function))
            .map_err(|e| ProviderError::from_engine(&self.name, e))?
            .ok_or_else(|| ProviderError::Protocol {
                module: self.name.clone(),
                message: format!("module has no '{function}' function"),
            })?;

        self.session
            .enter(|_| entry.call::<R>(args))
            .map_err(|e| ProviderError::from_engine(&self.name, e))
    }

    /// Release the module's registry slot. Safe to call more than once.
    pub fn release(&self) -> Result<(), ProviderError> {
        match self.table.borrow_mut().take() {
            Some(key) => self.session.release(key).map_err(ProviderError::Engine),
            None => Ok(()),
        }
    }
}
