use crate::function::{Function, Param};
use crate::types::Type;

#[derive(Debug, Clone)]
pub struct Extern {
    pub name: String,
    pub ret: Type,
    pub params: Vec<Type>,
}

/// A module-level global: either a constant byte blob (string literals) or a
/// zero-initialized typed variable.
#[derive(Debug, Clone)]
pub enum GlobalInit {
    Bytes(Vec<u8>),
    ZeroedOfType(Type),
}

#[derive(Debug, Clone)]
pub struct Global {
    pub name: String,
    pub init: GlobalInit,
}

/// The top-level unit: owns externs, globals, and functions in declaration
/// order. Structurally immutable once verification begins; transform passes
/// obtain mutable access only through the pass manager (§4.5).
#[derive(Debug, Clone)]
pub struct Module {
    /// Textual IL version banner (`il 0.1`), preserved for round-tripping.
    pub version: String,
    /// Optional `target` line; carried through verbatim, interpreted only by
    /// external code generation tooling outside this workspace's scope.
    pub target: Option<String>,
    pub externs: Vec<Extern>,
    pub globals: Vec<Global>,
    pub functions: Vec<Function>,
}

impl Default for Module {
    fn default() -> Self {
        Self { version: "0.1".to_string(), target: None, externs: Vec::new(), globals: Vec::new(), functions: Vec::new() }
    }
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_extern(&mut self, e: Extern) {
        self.externs.push(e);
    }

    pub fn add_global(&mut self, g: Global) {
        self.globals.push(g);
    }

    pub fn add_function(&mut self, f: Function) -> usize {
        let index = self.functions.len();
        self.functions.push(f);
        index
    }

    pub fn find_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn find_function_mut(&mut self, name: &str) -> Option<&mut Function> {
        self.functions.iter_mut().find(|f| f.name == name)
    }

    pub fn find_extern(&self, name: &str) -> Option<&Extern> {
        self.externs.iter().find(|e| e.name == name)
    }

    pub fn find_global(&self, name: &str) -> Option<&Global> {
        self.globals.iter().find(|g| g.name == name)
    }
}

pub fn param(id: u32, name: impl Into<String>, ty: Type) -> Param {
    Param { id, name: name.into(), ty }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_function_by_name() {
        let mut m = Module::new();
        m.add_function(Function::new("main", Type::I64, vec![]));
        assert!(m.find_function("main").is_some());
        assert!(m.find_function("other").is_none());
    }
}
