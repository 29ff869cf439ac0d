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

//! Scalar value extraction
//!
//! These calcs read the value of the cell addressed by a member or tuple:
//! evaluate the member(s), make them current, read the current measure, and
//! restore the context. The restore happens in [`ContextGuard`]'s drop, so it
//! also runs when reading the cell fails.
//!
//! Null rules, in order:
//!
//! 1. A null member (or a tuple containing one, or no tuple) yields null
//!    without touching the context or reading the cell.
//! 2. With `null_check` on, a member of a dimension that the current
//!    measure's base cube does not join yields null.

use std::slice;
use std::sync::Arc;

use crate::core::{Result, Type, Value};
use crate::olap::{ContextGuard, Evaluator, Hierarchy, Member};

use super::{but_depends, Calc, CalcNode, GenericCalc, MemberCalc, TupleCalc};

/// Reads the current measure in the current context
///
/// Depends on every hierarchy.
#[derive(Debug)]
pub struct ValueCalc {
    ty: Type,
}

impl ValueCalc {
    pub fn new() -> Self {
        Self { ty: Type::SCALAR }
    }

    pub fn into_calc(self) -> Calc {
        Calc::Generic(Arc::new(self))
    }
}

impl Default for ValueCalc {
    fn default() -> Self {
        Self::new()
    }
}

impl CalcNode for ValueCalc {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn depends_on(&self, _hierarchy: &Hierarchy) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "ValueCalc"
    }
}

impl GenericCalc for ValueCalc {
    fn evaluate(&self, evaluator: &mut dyn Evaluator) -> Result<Value> {
        evaluator.evaluate_current()
    }
}

/// Value of the cell at one member
#[derive(Debug)]
pub struct MemberValueCalc {
    member: Arc<dyn MemberCalc>,
    children: [Calc; 1],
    null_check: bool,
    ty: Type,
}

impl MemberValueCalc {
    pub fn new(member: Arc<dyn MemberCalc>, null_check: bool) -> Self {
        Self {
            children: [Calc::Member(member.clone())],
            member,
            null_check,
            ty: Type::SCALAR,
        }
    }

    /// One-member or N-member value calc, whichever fits `members`
    pub fn create(members: Vec<Arc<dyn MemberCalc>>, null_check: bool) -> Calc {
        match <[Arc<dyn MemberCalc>; 1]>::try_from(members) {
            Ok([member]) => Calc::Generic(Arc::new(MemberValueCalc::new(member, null_check))),
            Err(members) => {
                Calc::Generic(Arc::new(MemberArrayValueCalc::new(members, null_check)))
            }
        }
    }

    pub fn null_check(&self) -> bool {
        self.null_check
    }
}

impl CalcNode for MemberValueCalc {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn children(&self) -> &[Calc] {
        &self.children
    }

    fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        but_depends(&self.children, hierarchy)
    }

    fn name(&self) -> &'static str {
        "MemberValueCalc"
    }
}

impl GenericCalc for MemberValueCalc {
    fn evaluate(&self, evaluator: &mut dyn Evaluator) -> Result<Value> {
        let member = self.member.evaluate_member(evaluator)?;
        if member.is_null() {
            return Ok(Value::Null);
        }
        let mut guard = ContextGuard::new(evaluator);
        guard.set_context(&member);
        if self.null_check
            && guard.need_to_return_null_for_unrelated_dimension(slice::from_ref(&member))
        {
            return Ok(Value::Null);
        }
        guard.evaluate_current()
    }
}

/// Value of the cell at N members, evaluated without building a tuple
#[derive(Debug)]
pub struct MemberArrayValueCalc {
    members: Vec<Arc<dyn MemberCalc>>,
    children: Vec<Calc>,
    null_check: bool,
    ty: Type,
}

impl MemberArrayValueCalc {
    pub fn new(members: Vec<Arc<dyn MemberCalc>>, null_check: bool) -> Self {
        Self {
            children: members.iter().cloned().map(Calc::Member).collect(),
            members,
            null_check,
            ty: Type::SCALAR,
        }
    }
}

impl CalcNode for MemberArrayValueCalc {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn children(&self) -> &[Calc] {
        &self.children
    }

    fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        but_depends(&self.children, hierarchy)
    }

    fn name(&self) -> &'static str {
        "MemberArrayValueCalc"
    }
}

impl GenericCalc for MemberArrayValueCalc {
    fn evaluate(&self, evaluator: &mut dyn Evaluator) -> Result<Value> {
        // Members are evaluated in the caller's context, before any push
        let mut members: Vec<Member> = Vec::with_capacity(self.members.len());
        for calc in &self.members {
            let member = calc.evaluate_member(evaluator)?;
            if member.is_null() {
                return Ok(Value::Null);
            }
            members.push(member);
        }
        let mut guard = ContextGuard::new(evaluator);
        guard.set_context_members(&members);
        if self.null_check && guard.need_to_return_null_for_unrelated_dimension(&members) {
            return Ok(Value::Null);
        }
        guard.evaluate_current()
    }
}

/// Value of the cell at a tuple
#[derive(Debug)]
pub struct TupleValueCalc {
    tuple: Arc<dyn TupleCalc>,
    children: [Calc; 1],
    null_check: bool,
    ty: Type,
}

impl TupleValueCalc {
    pub fn new(tuple: Arc<dyn TupleCalc>, null_check: bool) -> Self {
        Self {
            children: [Calc::Tuple(tuple.clone())],
            tuple,
            null_check,
            ty: Type::SCALAR,
        }
    }
}

impl CalcNode for TupleValueCalc {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn children(&self) -> &[Calc] {
        &self.children
    }

    fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        but_depends(&self.children, hierarchy)
    }

    fn name(&self) -> &'static str {
        "TupleValueCalc"
    }
}

impl GenericCalc for TupleValueCalc {
    fn evaluate(&self, evaluator: &mut dyn Evaluator) -> Result<Value> {
        let Some(tuple) = self.tuple.evaluate_tuple(evaluator)? else {
            return Ok(Value::Null);
        };
        if tuple.iter().any(Member::is_null) {
            return Ok(Value::Null);
        }
        let mut guard = ContextGuard::new(evaluator);
        guard.set_context_members(&tuple);
        if self.null_check && guard.need_to_return_null_for_unrelated_dimension(&tuple) {
            return Ok(Value::Null);
        }
        guard.evaluate_current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{ConstantCalc, GenericAccessor};
    use crate::olap::{Dimension, Level, MemoryCube, MemoryEvaluator};

    struct Fixture {
        cube: Arc<MemoryCube>,
        gender: Hierarchy,
        all: Member,
        f: Member,
    }

    fn fixture() -> Fixture {
        let measures = Hierarchy::without_all(&Dimension::measures(), "Measures");
        let sales = Member::measure(&Level::new(&measures, "MeasuresLevel", 0), "Sales", "Sales");
        let gender = Hierarchy::new(&Dimension::new("Gender"));
        let all = Member::all(&Level::new(&gender, "(All)", 0), "All Gender");
        let f = Member::new(&Level::new(&gender, "Gender", 1), Some(&all), "F");
        let m = Member::new(&Level::new(&gender, "Gender", 1), Some(&all), "M");
        let cube = MemoryCube::builder("Sales")
            .hierarchy(&measures, &sales)
            .hierarchy(&gender, &all)
            .fact(&[f.clone()], &sales, 10.0)
            .fact(&[m], &sales, 5.0)
            .build();
        Fixture {
            cube: Arc::new(cube),
            gender,
            all,
            f,
        }
    }

    fn member_calc(value: Value, ty: Type) -> Arc<dyn MemberCalc> {
        Arc::new(GenericAccessor::new(Arc::new(ConstantCalc::new(value, ty))))
    }

    #[test]
    fn test_member_value_reads_cell_and_restores() {
        let fx = fixture();
        let mut ev = MemoryEvaluator::new(fx.cube.clone());
        let calc = MemberValueCalc::new(
            member_calc(Value::Member(fx.f.clone()), Type::member_of(&fx.gender)),
            false,
        );
        assert_eq!(calc.evaluate(&mut ev).unwrap(), Value::double(10.0));
        assert_eq!(ev.current_member(&fx.gender), fx.all);
        assert_eq!(ev.current_evaluations(), 1);
    }

    #[test]
    fn test_null_member_short_circuits() {
        let fx = fixture();
        let mut ev = MemoryEvaluator::new(fx.cube.clone());
        let calc = MemberValueCalc::new(
            member_calc(Value::Member(fx.gender.null_member()), Type::member_of(&fx.gender)),
            true,
        );
        assert_eq!(calc.evaluate(&mut ev).unwrap(), Value::Null);
        assert_eq!(ev.current_evaluations(), 0);
    }

    #[test]
    fn test_depends_unless_pinned() {
        let fx = fixture();
        let store = Hierarchy::new(&Dimension::new("Store"));
        let calc = MemberValueCalc::new(
            member_calc(Value::Member(fx.f.clone()), Type::member_of(&fx.gender)),
            false,
        );
        assert!(!calc.depends_on(&fx.gender));
        assert!(calc.depends_on(&store));
    }

    #[test]
    fn test_create_picks_arity() {
        let fx = fixture();
        let one = MemberValueCalc::create(
            vec![member_calc(Value::Member(fx.f.clone()), Type::member_of(&fx.gender))],
            false,
        );
        assert_eq!(one.name(), "MemberValueCalc");
        let two = MemberValueCalc::create(
            vec![
                member_calc(Value::Member(fx.f.clone()), Type::member_of(&fx.gender)),
                member_calc(Value::Member(fx.all.clone()), Type::member_of(&fx.gender)),
            ],
            false,
        );
        assert_eq!(two.name(), "MemberArrayValueCalc");
        assert_eq!(two.children().len(), 2);
    }

    #[test]
    fn test_value_calc_depends_on_everything() {
        let fx = fixture();
        let calc = ValueCalc::new();
        assert!(calc.depends_on(&fx.gender));
        let mut ev = MemoryEvaluator::new(fx.cube.clone());
        assert_eq!(calc.evaluate(&mut ev).unwrap(), Value::double(15.0));
    }
}
