use mlua::prelude::*;

/// A global made available to job definition files.
///
/// Each module registers one table into the sandbox under its `id()` and can
/// describe itself as LuaLS stubs so editors can complete definition files.
pub trait DefinitionModule: Send + Sync {
    /// Global name the module is exposed under (e.g. `"job"`, `"env"`).
    ///
    /// Must be a valid Lua identifier and unique within a registry.
    fn id(&self) -> &'static str;

    /// Registers this module's table into the Lua context.
    fn register(&self, lua: &Lua) -> LuaResult<()>;

    /// LuaLS stub file content, starting with `---@meta`.
    fn stubs(&self) -> String;
}

/// Ordered set of modules loaded into a definition sandbox
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<Box<dyn DefinitionModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module, replacing any earlier module with the same id
    pub fn register<M: DefinitionModule + 'static>(&mut self, module: M) {
        let id = module.id();
        self.modules.retain(|m| m.id() != id);
        self.modules.push(Box::new(module));
    }

    /// Builder form of `register`
    pub fn with<M: DefinitionModule + 'static>(mut self, module: M) -> Self {
        self.register(module);
        self
    }

    pub fn get(&self, id: &str) -> Option<&dyn DefinitionModule> {
        self.modules
            .iter()
            .find(|m| m.id() == id)
            .map(|m| m.as_ref())
    }

    pub fn modules(&self) -> &[Box<dyn DefinitionModule>] {
        &self.modules
    }

    /// Registers every module into a Lua context, stopping at the first error
    pub fn register_all(&self, lua: &Lua) -> LuaResult<()> {
        for module in &self.modules {
            module.register(lua)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ConstModule {
        id: &'static str,
        value: i64,
    }

    impl DefinitionModule for ConstModule {
        fn id(&self) -> &'static str {
            self.id
        }

        fn register(&self, lua: &Lua) -> LuaResult<()> {
            let table = lua.create_table()?;
            table.set("value", self.value)?;
            lua.globals().set(self.id, table)
        }

        fn stubs(&self) -> String {
            format!("---@meta\n{} = {{}}\n", self.id)
        }
    }

    #[test]
    fn test_register_all() {
        let registry = ModuleRegistry::new()
            .with(ConstModule { id: "a", value: 1 })
            .with(ConstModule { id: "b", value: 2 });

        let lua = Lua::new();
        registry.register_all(&lua).unwrap();

        let sum: i64 = lua.load("return a.value + b.value").eval().unwrap();
        assert_eq!(sum, 3);
    }

    #[test]
    fn test_same_id_replaces() {
        let registry = ModuleRegistry::new()
            .with(ConstModule { id: "a", value: 1 })
            .with(ConstModule { id: "a", value: 5 });

        assert_eq!(registry.modules().len(), 1);

        let lua = Lua::new();
        registry.register_all(&lua).unwrap();
        let value: i64 = lua.load("return a.value").eval().unwrap();
        assert_eq!(value, 5);
        assert!(registry.get("a").is_some());
        assert!(registry.get("missing").is_none());
    }
}
