//! Data provider for modules built on `Module:TestFramework`.

use std::cell::Cell;
use std::rc::Rc;

use mlua::Value;
use tracing::debug;

use super::module::ModuleHandle;
use super::types::{ProviderError, TestCase};
use crate::scripting::{EngineSession, ScriptValue};

/// Turns the cases a Lua test module declares into host test cases.
///
/// The module must return the table built by
/// `testframework.getTestProvider(tests)`, exposing `count()`,
/// `provide(n)` and `run(n)`.
pub struct LuaDataProvider {
    module: ModuleHandle,
    count: Cell<Option<usize>>,
}

impl LuaDataProvider {
    pub fn new(session: Rc<EngineSession>, module_name: &str) -> Result<Self, ProviderError> {
        let module = ModuleHandle::load(session, module_name)?;
        debug!(module = module_name, "created data provider");
        Ok(Self { module, count: Cell::new(None) })
    }

    pub fn module_name(&self) -> &str {
        self.module.name()
    }

    /// Number of declared cases.
    pub fn count(&self) -> Result<usize, ProviderError> {
        if let Some(n) = self.count.get() {
            return Ok(n);
        }
        let n: i64 = self.module.call("count", ())?;
        let n = usize::try_from(n).map_err(|_| self.protocol(format!("count() returned {n}")))?;
        self.count.set(Some(n));
        Ok(n)
    }

    /// The declared case at `key`.
    pub fn case(&self, key: usize) -> Result<TestCase, ProviderError> {
        self.check_key(key)?;
        let (n, name, expected): (i64, String, Value) = self.module.call("provide", key)?;
        if usize::try_from(n).ok() != Some(key) {
            return Err(self.protocol(format!("provide({key}) returned key {n}")));
        }
        Ok(TestCase { key, name, expected: self.marshal(expected)? })
    }

    /// Lazily enumerate every declared case. Each call starts over.
    pub fn cases(&self) -> Cases<'_> {
        Cases { provider: self, next: 1, done: false }
    }

    /// Execute the case at `key` and return what it produced.
    pub fn run(&self, key: usize) -> Result<ScriptValue, ProviderError> {
        self.check_key(key)?;
        debug!(module = self.module_name(), key, "running case");
        let produced: Value = self.module.call("run", key)?;
        self.marshal(produced)
    }

    /// Release the module. The session itself stays alive.
    pub fn destroy(&self) -> Result<(), ProviderError> {
        self.module.release()
    }

    fn check_key(&self, key: usize) -> Result<(), ProviderError> {
        let count = self.count()?;
        if key == 0 || key > count {
            return Err(ProviderError::CaseNotFound {
                module: self.module_name().to_string(),
                key,
                count,
            });
        }
        Ok(())
    }

    fn marshal(&self, value: Value) -> Result<ScriptValue, ProviderError> {
        ScriptValue::from_lua_value(value).map_err(|source| ProviderError::Marshal {
            module: self.module_name().to_string(),
            source,
        })
    }

    fn protocol(&self, message: String) -> ProviderError {
        ProviderError::Protocol { module: self.module_name().to_string(), message }
    }
}

/// Iterator over a provider's cases. Stops after the first error.
pub struct Cases<'a> {
    provider: &'a LuaDataProvider,
    next: usize,
    done: bool,
}

impl Iterator for Cases<'_> {
    type Item = Result<TestCase, ProviderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let count = match self.provider.count() {
            Ok(n) => n,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        if self.next > count {
            self.done = true;
            return None;
        }
        let item = self.provider.case(self.next);
        self.next += 1;
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}
