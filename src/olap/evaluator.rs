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

//! The evaluator contract
//!
//! An [`Evaluator`] is the mutable, per-execution dimensional context: one
//! current member per hierarchy, plus the machinery to read the value of the
//! cell that context addresses. Compiled calcs are immutable and shared; the
//! evaluator is the only thing that changes while a calc tree runs, and it is
//! never shared between threads.
//!
//! Context changes follow a strict stack discipline. Take a [`Savepoint`],
//! push members, and restore the savepoint on every exit path. [`ContextGuard`]
//! does this by construction: it restores in `Drop`, so an `Err` propagated
//! with `?` from a child calc (or a panic) cannot leak a context change into
//! the next sibling evaluation.

use std::ops::{Deref, DerefMut};

use crate::core::{Result, Value};

use super::{Dimension, Hierarchy, Member};

/// Opaque marker of an evaluator's context depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Savepoint(usize);

impl Savepoint {
    pub fn new(depth: usize) -> Self {
        Savepoint(depth)
    }

    pub fn depth(&self) -> usize {
        self.0
    }
}

/// Mutable dimensional context consumed by calcs
pub trait Evaluator {
    /// Marks the current context so it can be restored later
    fn savepoint(&mut self) -> Savepoint;

    /// Undoes every context change made since `savepoint` was taken
    fn restore(&mut self, savepoint: Savepoint);

    /// Makes `member` the current member of its hierarchy
    fn set_context(&mut self, member: &Member);

    /// Makes each member the current member of its hierarchy
    fn set_context_members(&mut self, members: &[Member]) {
        for member in members {
            self.set_context(member);
        }
    }

    /// Current member of `hierarchy`
    fn current_member(&self, hierarchy: &Hierarchy) -> Member;

    /// All hierarchies of the cube being evaluated, measures included
    fn hierarchies(&self) -> &[Hierarchy];

    /// The member a hierarchy takes when it is not constrained
    fn default_member(&self, hierarchy: &Hierarchy) -> Member;

    /// Hierarchy used when a dimension is referenced without naming one
    fn dimension_hierarchy(&self, dimension: &Dimension) -> Option<Hierarchy>;

    /// Value of the current measure at the current context
    fn evaluate_current(&mut self) -> Result<Value>;

    /// Whether empty cells are being suppressed
    fn is_non_empty(&self) -> bool;

    /// Sets non-empty mode; reverted by [`Evaluator::restore`]
    fn set_non_empty(&mut self, non_empty: bool);

    /// Whether a value read with `members` in context must be null because
    /// one of them belongs to a dimension that the current measure's base
    /// cube does not join
    fn need_to_return_null_for_unrelated_dimension(&self, members: &[Member]) -> bool;

    /// Value bound to a parameter slot for this execution, if any
    fn parameter_value(&self, _slot: usize) -> Option<Value> {
        None
    }
}

/// Scoped context change
///
/// Takes a savepoint on construction and restores it when dropped. Dereferences
/// to the evaluator, so calcs can be evaluated against the guard directly.
///
/// ```ignore
/// let mut guard = ContextGuard::new(evaluator);
/// guard.set_context(&member);
/// let value = guard.evaluate_current()?; // restored on every path
/// ```
pub struct ContextGuard<'a> {
    evaluator: &'a mut dyn Evaluator,
    savepoint: Savepoint,
}

impl<'a> ContextGuard<'a> {
    pub fn new(evaluator: &'a mut dyn Evaluator) -> Self {
        let savepoint = evaluator.savepoint();
        Self {
            evaluator,
            savepoint,
        }
    }

    /// Savepoint that will be restored on drop
    pub fn savepoint(&self) -> Savepoint {
        self.savepoint
    }
}

impl<'a> Deref for ContextGuard<'a> {
    type Target = dyn Evaluator + 'a;

    fn deref(&self) -> &Self::Target {
        self.evaluator
    }
}

impl DerefMut for ContextGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.evaluator
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        self.evaluator.restore(self.savepoint);
    }
}
