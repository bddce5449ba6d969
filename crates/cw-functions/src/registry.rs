//! Function registry.
//!
//! The static catalog of callable operations. Built once at startup, then
//! shared read-only (behind `Arc`) by the guardrail engine and orchestrator.

use std::collections::HashMap;

use crate::error::{RegistryError, RegistryResult};
use crate::functions::all_functions;
use crate::spec::FunctionSpec;
use crate::types::WorkflowFunction;

pub struct FunctionRegistry {
    /// Registration order is catalog order.
    functions: Vec<Box<dyn WorkflowFunction>>,
    /// Map from function name → index into `functions`.
    index: HashMap<String, usize>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            functions: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a registry from a function collection.
    pub fn from_functions(functions: Vec<Box<dyn WorkflowFunction>>) -> RegistryResult<Self> {
        let mut registry = Self::new();
        for function in functions {
            registry.register(function)?;
        }
        Ok(registry)
    }

    /// Build with the four built-in workflow functions.
    pub fn with_defaults() -> RegistryResult<Self> {
        Self::from_functions(all_functions())
    }

    pub fn register(&mut self, function: Box<dyn WorkflowFunction>) -> RegistryResult<()> {
        let name = function.spec().name;
        if self.index.contains_key(name) {
            return Err(RegistryError::DuplicateFunction { name: name.into() });
        }
        self.index.insert(name.to_string(), self.functions.len());
        self.functions.push(function);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> RegistryResult<&FunctionSpec> {
        self.handler(name).map(|f| f.spec())
    }

    /// The adapter that maps normalized arguments onto the backend.
    pub fn handler(&self, name: &str) -> RegistryResult<&dyn WorkflowFunction> {
        self.index
            .get(name)
            .map(|&i| self.functions[i].as_ref())
            .ok_or_else(|| RegistryError::UnknownFunction { name: name.into() })
    }

    /// All specs in registration order.
    pub fn list(&self) -> Vec<&FunctionSpec> {
        self.functions.iter().map(|f| f.spec()).collect()
    }

    /// Specs offered to callers and the model.
    pub fn exposed(&self) -> Vec<&FunctionSpec> {
        self.list().into_iter().filter(|s| s.exposed).collect()
    }

    /// Model-facing tool catalog as a JSON array.
    pub fn catalog_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.exposed().iter().map(|s| s.catalog_entry()).collect())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
