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

//! # Cubecalc - compiled expressions for dimensional analysis
//!
//! Cubecalc is the expression-compilation core of an OLAP engine. It turns a
//! typed expression tree into an immutable tree of calcs that can be
//! evaluated many times, by many threads, against per-execution evaluators.
//!
//! ## Key Features
//!
//! - **Strongly shaped calcs** - every calc has one native shape (boolean,
//!   double, member, list, iterable, ...) and one typed accessor
//! - **Result style negotiation** - set producers hand out shared lists,
//!   fresh mutable lists or lazy iterables as the consumer prefers
//! - **Dependency analysis** - prove which hierarchies a calc ignores, so a
//!   cache can widen its key
//! - **Flat tuple lists** - one arena per set, views without copying,
//!   copy-on-write mutation and allocation-free cursors
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use cubecalc::{global_table, BooleanCalc, Expr, ExprCompiler, MemoryCube, MemoryEvaluator};
//!
//! let calc = ExprCompiler::new(global_table())
//!     .compile_boolean(&Expr::literal(3.5))
//!     .unwrap();
//! let mut evaluator = MemoryEvaluator::new(Arc::new(MemoryCube::builder("Empty").build()));
//! assert!(calc.evaluate_boolean(&mut evaluator).unwrap());
//! ```
//!
//! ## Modules
//!
//! - [`core`] - Core types ([`Type`], [`Value`], [`Error`])
//! - [`olap`] - Dimensional primitives and the [`Evaluator`] contract
//! - [`tuple`] - [`TupleList`], cursors and iterables
//! - [`expr`] - Typed expression nodes
//! - [`calc`] - Calcs, result styles, dependency analysis and the compiler
//! - [`functions`] - Function definitions and the function table
//! - [`config`] - Compiler configuration

pub mod calc;
pub mod config;
pub mod core;
pub mod expr;
pub mod functions;
pub mod olap;
pub mod tuple;

// Re-export main types for convenience
pub use core::{ElementType, Error, Result, ScalarKind, Type, Value};

// Re-export calc types
pub use calc::{
    explain, Calc, CalcNode, CalcWriter, ExprCompiler, ParameterSlot, ResultStyle, Shape,
};
pub use calc::{
    BooleanCalc, DateTimeCalc, DimensionCalc, DoubleCalc, GenericCalc, HierarchyCalc,
    IntegerCalc, IterCalc, LevelCalc, ListCalc, MemberCalc, StringCalc, TupleCalc, VoidCalc,
};

// Re-export config types
pub use config::CompilerConfig;

// Re-export expression types
pub use expr::{Expr, FunCall, Parameter};

// Re-export function types
pub use functions::{global_table, FunDef, FunctionInfo, FunctionTable};

// Re-export domain types
pub use olap::{
    ContextGuard, Dimension, Evaluator, Hierarchy, Level, Member, MemoryCube, MemoryEvaluator,
    Savepoint,
};

// Re-export tuple types
pub use tuple::{Tuple, TupleCursor, TupleIterable, TupleList};
