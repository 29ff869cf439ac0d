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

//! In-memory cube and evaluator
//!
//! [`MemoryCube`] holds facts at leaf coordinates and answers a cell by
//! summing every fact whose coordinates roll up to the current context. It
//! is small enough to reason about in tests and complete enough to embed.
//!
//! A context member matches a fact when it is an all member of its
//! hierarchy or an ancestor-or-self of the fact's member on that hierarchy.
//! A cell no fact matches is null.

use std::sync::Arc;

use log::trace;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::calc::Calc;
use crate::core::{Error, Result, Value};

use super::{Dimension, Evaluator, Hierarchy, Member, Savepoint};

/// Nesting limit for calculated measures that read other calculated measures
pub const MAX_CALCULATION_DEPTH: usize = 64;

#[derive(Debug)]
struct Fact {
    coordinates: Vec<Member>,
    measure: Member,
    value: f64,
}

impl Fact {
    fn matches(&self, context: &[Member]) -> bool {
        context.iter().all(|current| {
            if current.is_measure() || current.is_all() {
                return true;
            }
            self.coordinates
                .iter()
                .find(|m| m.hierarchy() == current.hierarchy())
                .is_some_and(|m| current.is_ancestor_or_self(m))
        })
    }
}

/// A cube whose facts live in memory
#[derive(Debug)]
pub struct MemoryCube {
    name: Arc<str>,
    hierarchies: Vec<Hierarchy>,
    defaults: Vec<Member>,
    slots: FxHashMap<Hierarchy, usize>,
    facts: Vec<Fact>,
    calculated: FxHashMap<Member, Calc>,
    /// Base cube name to the dimensions it does not join
    unrelated: FxHashMap<Arc<str>, FxHashSet<Dimension>>,
}

impl MemoryCube {
    pub fn builder(name: &str) -> MemoryCubeBuilder {
        MemoryCubeBuilder {
            name: Arc::from(name),
            hierarchies: Vec::new(),
            defaults: Vec::new(),
            facts: Vec::new(),
            calculated: FxHashMap::default(),
            unrelated: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hierarchies(&self) -> &[Hierarchy] {
        &self.hierarchies
    }

    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    fn slot(&self, hierarchy: &Hierarchy) -> Option<usize> {
        self.slots.get(hierarchy).copied()
    }

    fn measures_slot(&self) -> Option<usize> {
        self.hierarchies
            .iter()
            .position(|h| h.dimension().is_measures())
    }

    fn aggregate(&self, measure: &Member, context: &[Member]) -> Value {
        let mut total = None;
        for fact in self.facts.iter().filter(|f| &f.measure == measure) {
            if fact.matches(context) {
                *total.get_or_insert(0.0) += fact.value;
            }
        }
        Value::from_double(total)
    }

    fn is_unrelated(&self, cube: &str, dimension: &Dimension) -> bool {
        self.unrelated
            .get(cube)
            .is_some_and(|dimensions| dimensions.contains(dimension))
    }
}

/// Builder for [`MemoryCube`]
pub struct MemoryCubeBuilder {
    name: Arc<str>,
    hierarchies: Vec<Hierarchy>,
    defaults: Vec<Member>,
    facts: Vec<Fact>,
    calculated: FxHashMap<Member, Calc>,
    unrelated: FxHashMap<Arc<str>, FxHashSet<Dimension>>,
}

impl MemoryCubeBuilder {
    /// Adds a hierarchy and the member it takes when unconstrained
    pub fn hierarchy(mut self, hierarchy: &Hierarchy, default: &Member) -> Self {
        self.hierarchies.push(hierarchy.clone());
        self.defaults.push(default.clone());
        self
    }

    /// Adds a fact at leaf `coordinates`, one member per hierarchy
    pub fn fact(mut self, coordinates: &[Member], measure: &Member, value: f64) -> Self {
        self.facts.push(Fact {
            coordinates: coordinates.to_vec(),
            measure: measure.clone(),
            value,
        });
        self
    }

    /// Makes `measure` evaluate `calc` instead of reading facts
    pub fn calculated_measure(mut self, measure: &Member, calc: Calc) -> Self {
        self.calculated.insert(measure.clone(), calc);
        self
    }

    /// Declares that base cube `cube` does not join `dimension`
    pub fn unrelated(mut self, cube: &str, dimension: &Dimension) -> Self {
        self.unrelated
            .entry(Arc::from(cube))
            .or_default()
            .insert(dimension.clone());
        self
    }

    pub fn build(self) -> MemoryCube {
        let slots = self
            .hierarchies
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), i))
            .collect();
        MemoryCube {
            name: self.name,
            hierarchies: self.hierarchies,
            defaults: self.defaults,
            slots,
            facts: self.facts,
            calculated: self.calculated,
            unrelated: self.unrelated,
        }
    }
}

#[derive(Debug)]
enum Undo {
    Member { slot: usize, previous: Member },
    NonEmpty(bool),
}

/// Evaluator over a [`MemoryCube`]
///
/// Each evaluator owns its context; many evaluators can share one cube and
/// one compiled calc tree across threads.
#[derive(Debug)]
pub struct MemoryEvaluator {
    cube: Arc<MemoryCube>,
    context: Vec<Member>,
    undo: Vec<Undo>,
    non_empty: bool,
    parameters: FxHashMap<usize, Value>,
    evaluations: usize,
    depth: usize,
}

impl MemoryEvaluator {
    pub fn new(cube: Arc<MemoryCube>) -> Self {
        Self {
            context: cube.defaults.clone(),
            cube,
            undo: Vec::new(),
            non_empty: false,
            parameters: FxHashMap::default(),
            evaluations: 0,
            depth: 0,
        }
    }

    pub fn cube(&self) -> &Arc<MemoryCube> {
        &self.cube
    }

    /// Number of `evaluate_current` calls so far
    pub fn current_evaluations(&self) -> usize {
        self.evaluations
    }

    /// Binds a value to a parameter slot for this evaluator
    pub fn set_parameter(&mut self, slot: usize, value: Value) {
        self.parameters.insert(slot, value);
    }

    fn current_measure(&self) -> Result<Member> {
        match self.cube.measures_slot() {
            Some(slot) => Ok(self.context[slot].clone()),
            None => Err(Error::evaluation(format!(
                "cube {} has no measures",
                self.cube.name
            ))),
        }
    }
}

impl Evaluator for MemoryEvaluator {
    fn savepoint(&mut self) -> Savepoint {
        Savepoint::new(self.undo.len())
    }

    fn restore(&mut self, savepoint: Savepoint) {
        while self.undo.len() > savepoint.depth() {
            match self.undo.pop() {
                Some(Undo::Member { slot, previous }) => self.context[slot] = previous,
                Some(Undo::NonEmpty(previous)) => self.non_empty = previous,
                None => break,
            }
        }
    }

    fn set_context(&mut self, member: &Member) {
        let Some(slot) = self.cube.slot(member.hierarchy()) else {
            trace!("{} is not a hierarchy of {}", member.hierarchy(), self.cube.name);
            return;
        };
        let previous = std::mem::replace(&mut self.context[slot], member.clone());
        self.undo.push(Undo::Member { slot, previous });
    }

    fn current_member(&self, hierarchy: &Hierarchy) -> Member {
        match self.cube.slot(hierarchy) {
            Some(slot) => self.context[slot].clone(),
            None => hierarchy.null_member(),
        }
    }

    fn hierarchies(&self) -> &[Hierarchy] {
        &self.cube.hierarchies
    }

    fn default_member(&self, hierarchy: &Hierarchy) -> Member {
        match self.cube.slot(hierarchy) {
            Some(slot) => self.cube.defaults[slot].clone(),
            None => hierarchy.null_member(),
        }
    }

    fn dimension_hierarchy(&self, dimension: &Dimension) -> Option<Hierarchy> {
        self.cube
            .hierarchies
            .iter()
            .find(|h| h.dimension() == dimension)
            .cloned()
    }

    fn evaluate_current(&mut self) -> Result<Value> {
        self.evaluations += 1;
        let measure = self.current_measure()?;
        if measure.is_null() {
            return Ok(Value::Null);
        }
        let Some(calc) = self.cube.calculated.get(&measure).cloned() else {
            return Ok(self.cube.aggregate(&measure, &self.context));
        };
        if self.depth >= MAX_CALCULATION_DEPTH {
            return Err(Error::evaluation(format!(
                "calculated measure {} nested more than {} deep",
                measure, MAX_CALCULATION_DEPTH
            )));
        }
        self.depth += 1;
        let result = calc.evaluate(self);
        self.depth -= 1;
        result
    }

    fn is_non_empty(&self) -> bool {
        self.non_empty
    }

    fn set_non_empty(&mut self, non_empty: bool) {
        let previous = std::mem::replace(&mut self.non_empty, non_empty);
        self.undo.push(Undo::NonEmpty(previous));
    }

    fn need_to_return_null_for_unrelated_dimension(&self, members: &[Member]) -> bool {
        let Ok(measure) = self.current_measure() else {
            return false;
        };
        let Some(base_cube) = measure.base_cube() else {
            return false;
        };
        members
            .iter()
            .filter(|m| !m.is_all() && !m.is_measure())
            .any(|m| self.cube.is_unrelated(base_cube, m.dimension()))
    }

    fn parameter_value(&self, slot: usize) -> Option<Value> {
        self.parameters.get(&slot).cloned()
    }
}
