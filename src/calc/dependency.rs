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

//! Hierarchy dependency analysis
//!
//! `depends_on(h)` answers whether a calc's result can change when the
//! current member of `h` changes. A false answer must be provable; when in
//! doubt a calc reports true.

use log::trace;

use crate::olap::{Evaluator, Hierarchy};

use super::Calc;

/// True if any calc depends on `hierarchy`
pub fn any_depends(calcs: &[Calc], hierarchy: &Hierarchy) -> bool {
    calcs.iter().any(|calc| calc.depends_on(hierarchy))
}

/// Dependency of a `(set, expression...)` calc
///
/// The set (`calcs[0]`) decides first. If it does not depend on `hierarchy`
/// but its type pins `hierarchy`, every member of `hierarchy` the remaining
/// calcs see comes from the set, so the ambient member is irrelevant.
pub fn any_depends_but_first(calcs: &[Calc], hierarchy: &Hierarchy) -> bool {
    let Some((first, rest)) = calcs.split_first() else {
        return false;
    };
    if first.depends_on(hierarchy) {
        return true;
    }
    if first.pins(hierarchy) {
        return false;
    }
    any_depends(rest, hierarchy)
}

/// Dependency of a calc that overrides context with its children's members
///
/// True if any child depends on `hierarchy`; otherwise false if some
/// child's type pins `hierarchy`, else true.
pub fn but_depends(calcs: &[Calc], hierarchy: &Hierarchy) -> bool {
    if any_depends(calcs, hierarchy) {
        return true;
    }
    !calcs.iter().any(|calc| calc.pins(hierarchy))
}

/// Resets every hierarchy `calc` ignores to its default member
///
/// Only hierarchies whose current member is neither an all member nor the
/// default member are touched. Nothing is reset in non-empty mode, where
/// the ambient members still filter the result. Returns the number of
/// hierarchies reset.
///
/// The changes are ordinary context pushes; take a savepoint (or a
/// [`ContextGuard`](crate::olap::ContextGuard)) first to undo them.
pub fn simplify_context(calc: &Calc, evaluator: &mut dyn Evaluator) -> usize {
    if evaluator.is_non_empty() {
        return 0;
    }
    let hierarchies = evaluator.hierarchies().to_vec();
    let mut reset = 0;
    for hierarchy in &hierarchies {
        let current = evaluator.current_member(hierarchy);
        if current.is_all() {
            continue;
        }
        let default = evaluator.default_member(hierarchy);
        if current == default || calc.depends_on(hierarchy) {
            continue;
        }
        trace!("simplify: {} -> {}", current, default);
        evaluator.set_context(&default);
        reset += 1;
    }
    reset
}
