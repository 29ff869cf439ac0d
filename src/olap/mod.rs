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

//! Dimensional primitives and the evaluation context
//!
//! - [`Dimension`], [`Hierarchy`], [`Level`], [`Member`] - schema handles
//! - [`Evaluator`] - the mutable context calcs are evaluated against
//! - [`ContextGuard`] - scoped context change, restored on drop
//! - [`MemoryCube`], [`MemoryEvaluator`] - in-memory implementation

mod element;
mod evaluator;
mod memory;

pub use element::{Dimension, DimensionKind, Hierarchy, Level, Member, MemberKind};
pub use evaluator::{ContextGuard, Evaluator, Savepoint};
pub use memory::{MemoryCube, MemoryCubeBuilder, MemoryEvaluator, MAX_CALCULATION_DEPTH};
