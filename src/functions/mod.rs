// Copyright 2025 Cubecalc Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Function definitions
//!
//! A [`FunDef`] turns a call node into a calc, compiling its arguments
//! through the [`ExprCompiler`] it is handed. Analytical functions
//! (aggregates, crossjoins, filters) live outside this crate and plug in
//! by registering with a [`FunctionTable`].
//!
//! Built in, because the compiler's own coercions are expressed with them:
//!
//! - `CurrentMember`, `Hierarchy`, `Dimension`, `Level` - structural
//!   navigation
//! - `()` - tuple constructor (or plain parentheses around one argument)
//! - `{}` - set constructor
//! - `$Value` - value of the current cell

mod structural;
mod tuple;
mod value;

use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::calc::{Calc, ExprCompiler};
use crate::core::{Error, Result};
use crate::expr::FunCall;

pub use structural::{
    CurrentMemberFunDef, DimensionCurrentMemberCalc, DimensionFunDef, HierarchyCurrentMemberCalc,
    HierarchyDimensionCalc, HierarchyFunDef, LevelDimensionCalc, LevelFunDef, LevelHierarchyCalc,
    MemberDimensionCalc, MemberHierarchyCalc, MemberLevelCalc,
};
pub use tuple::{SetCalc, SetFunDef, TupleCalcImpl, TupleFunDef};
pub use value::ValueFunDef;

/// Global function table instance
static GLOBAL_TABLE: OnceLock<FunctionTable> = OnceLock::new();

/// Get the global function table
#[inline]
pub fn global_table() -> &'static FunctionTable {
    GLOBAL_TABLE.get_or_init(FunctionTable::new)
}

/// Argument count bounds and description of a function
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub name: String,
    pub description: String,
    pub min_args: usize,
    pub max_args: usize,
}

impl FunctionInfo {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        min_args: usize,
        max_args: usize,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            min_args,
            max_args,
        }
    }

    /// Validate argument count
    pub fn validate_arg_count(&self, count: usize) -> Result<()> {
        if count < self.min_args || count > self.max_args {
            let expected = if self.min_args == self.max_args {
                self.min_args.to_string()
            } else if self.max_args == usize::MAX {
                format!("at least {}", self.min_args)
            } else {
                format!("{} to {}", self.min_args, self.max_args)
            };
            return Err(Error::invalid_argument_count(&self.name, expected, count));
        }
        Ok(())
    }
}

/// Compiles calls of one function
pub trait FunDef: Send + Sync {
    /// Name the function is registered under
    fn name(&self) -> &str;

    fn info(&self) -> FunctionInfo;

    /// Compile `call`, whose arguments have already been type-checked
    fn compile_call(&self, call: &FunCall, compiler: &mut ExprCompiler<'_>) -> Result<Calc>;
}

/// Name-keyed set of function definitions
///
/// Lookup is case-insensitive.
pub struct FunctionTable {
    functions: RwLock<FxHashMap<String, Arc<dyn FunDef>>>,
}

impl FunctionTable {
    /// Create a table holding the built-in functions
    pub fn new() -> Self {
        let table = Self::empty();
        table.register(CurrentMemberFunDef);
        table.register(HierarchyFunDef);
        table.register(DimensionFunDef);
        table.register(LevelFunDef);
        table.register(TupleFunDef);
        table.register(SetFunDef);
        table.register(ValueFunDef);
        table
    }

    /// Create a table with no functions
    pub fn empty() -> Self {
        Self {
            functions: RwLock::new(FxHashMap::default()),
        }
    }

    /// Register a function, replacing any function of the same name
    pub fn register<F: FunDef + 'static>(&self, def: F) {
        self.register_arc(Arc::new(def));
    }

    pub fn register_arc(&self, def: Arc<dyn FunDef>) {
        let key = def.name().to_uppercase();
        self.functions.write().insert(key, def);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn FunDef>> {
        self.functions.read().get(&name.to_uppercase()).cloned()
    }

    /// Like [`get`](Self::get), failing with `FunctionNotFound`
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn FunDef>> {
        self.get(name)
            .ok_or_else(|| Error::FunctionNotFound(name.to_string()))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.functions.read().contains_key(&name.to_uppercase())
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .functions
            .read()
            .values()
            .map(|def| def.name().to_string())
            .collect();
        names.sort();
        names
    }
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self::new()
    }
}
