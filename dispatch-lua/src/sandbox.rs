//! Lua sandbox creation
//!
//! Job definitions are configuration, so they are evaluated with only the
//! pure libraries (tables, strings, math, coroutines). No I/O, no `os`, no
//! loading of other code. Reading environment variables goes through the
//! `env` module instead.

use mlua::{Lua, LuaOptions, Result as LuaResult, StdLib};

use crate::module::ModuleRegistry;

/// Globals removed from the base library after creation
const BLOCKED_GLOBALS: &[&str] = &["require", "dofile", "loadfile", "load"];

/// Create a restricted Lua state with the given modules registered
///
/// # Security
/// The sandbox prevents:
/// - File system access
/// - Process execution
/// - Loading external chunks or modules
pub fn create_sandbox(modules: &ModuleRegistry) -> LuaResult<Lua> {
    let lua = Lua::new_with(
        StdLib::TABLE | StdLib::STRING | StdLib::MATH | StdLib::COROUTINE,
        LuaOptions::default(),
    )?;

    let globals = lua.globals();
    for name in BLOCKED_GLOBALS {
        globals.set(*name, mlua::Nil)?;
    }

    modules.register_all(&lua)?;

    Ok(lua)
}
