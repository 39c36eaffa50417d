//! Environment module for job definitions
//!
//! Lets a definition read variables (scratch paths, image tags, queue
//! overrides) without granting it the full `os` library. Where the values
//! come from is decided by the `VarProvider` the caller plugs in:
//! - CLI: the process environment
//! - Tests: a fixed map

use crate::module::DefinitionModule;
use mlua::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// Source of variables exposed to definitions
pub trait VarProvider: Send + Sync {
    /// Get a variable by name
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads variables from the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl VarProvider for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl VarProvider for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// `env` global: `env.get`, `env.require`, `env.has`
pub struct EnvModule<V: VarProvider> {
    provider: Arc<V>,
}

impl<V: VarProvider> EnvModule<V> {
    pub fn new(provider: V) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }
}

impl<V: VarProvider + 'static> DefinitionModule for EnvModule<V> {
    fn id(&self) -> &'static str {
        "env"
    }

    fn register(&self, lua: &Lua) -> LuaResult<()> {
        let env_table = lua.create_table()?;

        // env.get(name, default?)
        {
            let provider = self.provider.clone();
            env_table.set(
                "get",
                lua.create_function(move |_, (name, default): (String, Option<String>)| {
                    Ok(provider.get(&name).or(default))
                })?,
            )?;
        }

        // env.require(name)
        {
            let provider = self.provider.clone();
            env_table.set(
                "require",
                lua.create_function(move |_, name: String| {
                    provider.get(&name).ok_or_else(|| {
                        LuaError::RuntimeError(format!(
                            "Required environment variable '{}' is not set",
                            name
                        ))
                    })
                })?,
            )?;
        }

        // env.has(name)
        {
            let provider = self.provider.clone();
            env_table.set(
                "has",
                lua.create_function(move |_, name: String| Ok(provider.get(&name).is_some()))?,
            )?;
        }

        lua.globals().set(self.id(), env_table)?;
        Ok(())
    }

    fn stubs(&self) -> String {
        r#"---@meta

---Environment variable access for job definitions
---@class env
env = {}

---Get a variable, or `default` when it is not set
---@param name string
---@param default? string
---@return string?
---
---@usage
---local image = env.get("DISPATCH_IMAGE", "pytorch/pytorch:latest")
function env.get(name, default) end

---Get a variable, raising an error when it is not set
---@param name string
---@return string
function env.require(name) end

---Check whether a variable is set
---@param name string
---@return boolean
function env.has(name) end
"#
        .to_string()
    }
}
