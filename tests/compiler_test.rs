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

//! Expression Compiler Tests
//!
//! Tests shape coercion, result style negotiation, parameters and the
//! function definition seam through the public compiler API

use std::sync::Arc;

use cubecalc::calc::CopyListCalc;
use cubecalc::{
    global_table, BooleanCalc, Calc, CalcNode, CompilerConfig, Dimension, DimensionCalc,
    DoubleCalc, Error, Evaluator, Expr, ExprCompiler, FunCall, FunDef, FunctionInfo,
    FunctionTable, Hierarchy, HierarchyCalc, IterCalc, Level, LevelCalc, ListCalc, Member,
    MemberCalc, MemoryCube, MemoryEvaluator, Parameter, Result, ResultStyle, Tuple, TupleCursor,
    TupleIterable, TupleList, Type, Value,
};

struct Sales {
    cube: Arc<MemoryCube>,
    measures: Hierarchy,
    sales: Member,
    gender: Hierarchy,
    all: Member,
    f: Member,
    m: Member,
}

fn sales_cube() -> Sales {
    let measures = Hierarchy::without_all(&Dimension::measures(), "Measures");
    let sales = Member::measure(&Level::new(&measures, "MeasuresLevel", 0), "Sales", "Sales");
    let gender = Hierarchy::new(&Dimension::new("Gender"));
    let all = Member::all(&Level::new(&gender, "(All)", 0), "All Gender");
    let level = Level::new(&gender, "Gender", 1);
    let f = Member::new(&level, Some(&all), "F");
    let m = Member::new(&level, Some(&all), "M");
    let cube = MemoryCube::builder("Sales")
        .hierarchy(&measures, &sales)
        .hierarchy(&gender, &all)
        .fact(&[f.clone()], &sales, 10.0)
        .fact(&[m.clone()], &sales, 5.0)
        .build();
    Sales {
        cube: Arc::new(cube),
        measures,
        sales,
        gender,
        all,
        f,
        m,
    }
}

fn gender_set(s: &Sales) -> Expr {
    Expr::call(
        "{}",
        vec![Expr::member(&s.f), Expr::member(&s.m)],
        Type::member_set_of(&s.gender),
    )
}

fn tuples(list: &TupleList) -> Vec<Tuple> {
    list.iter().collect()
}

fn drain(iterable: &dyn TupleIterable) -> Vec<Tuple> {
    iterable.tuples().collect()
}

/// Test: boolean over a numeric value is `value != 0`
#[test]
fn test_boolean_over_numeric_scenario() {
    let s = sales_cube();
    let mut ev = MemoryEvaluator::new(s.cube.clone());
    let mut compiler = ExprCompiler::new(global_table());

    let zero = compiler
        .compile_boolean(&Expr::literal(0.0))
        .expect("Failed to compile boolean");
    assert!(!zero.evaluate_boolean(&mut ev).unwrap());

    let three_and_a_half = compiler
        .compile_boolean(&Expr::literal(3.5))
        .expect("Failed to compile boolean");
    assert!(three_and_a_half.evaluate_boolean(&mut ev).unwrap());

    let null = compiler
        .compile_boolean(&Expr::typed_literal(Value::Null, Type::NUMERIC))
        .unwrap();
    assert!(!null.evaluate_boolean(&mut ev).unwrap());
}

/// Test: a member used as a scalar reads the cell at that member
#[test]
fn test_scalar_over_member() {
    let s = sales_cube();
    let mut ev = MemoryEvaluator::new(s.cube.clone());
    let mut compiler = ExprCompiler::new(global_table());
    let value = compiler
        .compile_scalar(&Expr::member(&s.f), false)
        .expect("Failed to compile scalar");
    assert_eq!(value.evaluate(&mut ev).unwrap(), Value::double(10.0));
}

/// Test: requesting an impossible shape is a programming error
#[test]
fn test_shape_mismatch() {
    let s = sales_cube();
    let mut compiler = ExprCompiler::new(global_table());

    let err = compiler
        .compile_list(&Expr::literal("text"), false)
        .unwrap_err();
    assert!(err.is_programming_error());
    assert!(err.to_string().contains("ListCalc"));

    let err = compiler.compile_member(&Expr::literal(1.0)).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));

    let err = compiler
        .compile_double(&Expr::level(&Level::new(&s.gender, "Gender", 1)))
        .unwrap_err();
    assert!(err.is_programming_error());
}

/// Test: unknown functions and wrong argument counts are reported
#[test]
fn test_call_errors() {
    let s = sales_cube();
    let mut compiler = ExprCompiler::new(global_table());

    let unknown = Expr::call("Crossjoin", vec![], Type::member_set_of(&s.gender));
    assert_eq!(
        compiler.compile(&unknown).unwrap_err(),
        Error::FunctionNotFound("Crossjoin".to_string())
    );

    let bad = Expr::call(
        "CurrentMember",
        vec![Expr::hierarchy(&s.gender), Expr::hierarchy(&s.gender)],
        Type::member_of(&s.gender),
    );
    assert!(matches!(
        compiler.compile(&bad),
        Err(Error::InvalidArgumentCount { .. })
    ));
}

/// Test: the same set compiled for MUTABLE_LIST and for ITERABLE yields
/// equal content, and mutating one never shows in the other
#[test]
fn test_mutable_list_and_iterable_are_independent() {
    let s = sales_cube();
    let mut ev = MemoryEvaluator::new(s.cube.clone());
    let mut compiler = ExprCompiler::new(global_table());
    let expr = gender_set(&s);

    let as_list = compiler
        .compile_as(&expr, None, ResultStyle::MUTABLE_LIST_ONLY)
        .unwrap();
    let as_iter = compiler
        .compile_as(&expr, None, ResultStyle::ITERABLE_ONLY)
        .unwrap();
    assert_eq!(as_list.result_style(), ResultStyle::MutableList);
    assert_eq!(as_iter.result_style(), ResultStyle::Iterable);

    let (Calc::List(list_calc), Calc::Iter(iter_calc)) = (&as_list, &as_iter) else {
        panic!("unexpected shapes {} and {}", as_list.shape(), as_iter.shape());
    };

    let mut list = list_calc.evaluate_list(&mut ev).unwrap().unwrap();
    let iterable = iter_calc.evaluate_iterable(&mut ev).unwrap().unwrap();
    assert_eq!(tuples(&list), drain(iterable.as_ref()));

    list.remove(0).unwrap();
    list.add_tuple(&[s.all.clone()]).unwrap();
    assert_eq!(drain(iterable.as_ref()).len(), 2);
    assert_eq!(drain(iterable.as_ref())[0][0], s.f);
}

/// Test: compile_list and compile_iter adapt the other set shape
#[test]
fn test_list_iter_adapters() {
    let s = sales_cube();
    let mut ev = MemoryEvaluator::new(s.cube.clone());
    let mut compiler = ExprCompiler::with_config(global_table(), CompilerConfig::iterable());
    let expr = gender_set(&s);

    // Ambient styles prefer ITERABLE, compile_list still gets a list
    let list = compiler.compile_list(&expr, false).unwrap();
    let iter = compiler.compile_iter(&expr).unwrap();
    assert_eq!(iter.result_style(), ResultStyle::Iterable);
    let from_list = list.evaluate_list(&mut ev).unwrap().unwrap();
    let from_iter = iter.evaluate_iterable(&mut ev).unwrap().unwrap();
    assert_eq!(tuples(&from_list), drain(from_iter.as_ref()));
    assert_eq!(compiler.result_styles(), ResultStyle::ITERABLE_LIST_MUTABLE_LIST);
}

/// Named set: hands out the same shared list every evaluation
#[derive(Debug)]
struct NamedSetCalc {
    list: TupleList,
    ty: Type,
}

impl CalcNode for NamedSetCalc {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn result_style(&self) -> ResultStyle {
        ResultStyle::List
    }

    fn name(&self) -> &'static str {
        "NamedSetCalc"
    }
}

impl ListCalc for NamedSetCalc {
    fn evaluate_list(&self, _evaluator: &mut dyn Evaluator) -> Result<Option<TupleList>> {
        Ok(Some(self.list.clone()))
    }
}

struct NamedSetFunDef {
    list: TupleList,
    ty: Type,
}

impl FunDef for NamedSetFunDef {
    fn name(&self) -> &str {
        "Genders"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new("Genders", "Named set of genders", 0, 0)
    }

    fn compile_call(&self, _call: &FunCall, _compiler: &mut ExprCompiler<'_>) -> Result<Calc> {
        Ok(Calc::List(Arc::new(NamedSetCalc {
            list: self.list.clone(),
            ty: self.ty.clone(),
        })))
    }
}

/// Lazy set: produces an iterable, never a list
#[derive(Debug)]
struct LazyGendersCalc {
    members: Vec<Member>,
    ty: Type,
}

impl CalcNode for LazyGendersCalc {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn result_style(&self) -> ResultStyle {
        ResultStyle::Iterable
    }

    fn name(&self) -> &'static str {
        "LazyGendersCalc"
    }
}

#[derive(Debug)]
struct Members(Vec<Member>);

struct MembersCursor<'a> {
    members: &'a [Member],
    position: Option<usize>,
}

impl TupleCursor for MembersCursor<'_> {
    fn arity(&self) -> usize {
        1
    }

    fn forward(&mut self) -> bool {
        let next = self.position.map_or(0, |p| p + 1);
        self.position = Some(next);
        next < self.members.len()
    }

    fn current(&self) -> &[Member] {
        match self.position {
            Some(p) if p < self.members.len() => std::slice::from_ref(&self.members[p]),
            _ => &[],
        }
    }
}

impl TupleIterable for Members {
    fn arity(&self) -> usize {
        1
    }

    fn tuple_cursor(&self) -> Box<dyn TupleCursor + '_> {
        Box::new(MembersCursor {
            members: &self.0,
            position: None,
        })
    }
}

impl IterCalc for LazyGendersCalc {
    fn evaluate_iterable(
        &self,
        _evaluator: &mut dyn Evaluator,
    ) -> Result<Option<Arc<dyn TupleIterable>>> {
        Ok(Some(Arc::new(Members(self.members.clone()))))
    }
}

struct LazyGendersFunDef {
    members: Vec<Member>,
    ty: Type,
}

impl FunDef for LazyGendersFunDef {
    fn name(&self) -> &str {
        "LazyGenders"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new("LazyGenders", "Genders, produced lazily", 0, 0)
    }

    fn compile_call(&self, _call: &FunCall, _compiler: &mut ExprCompiler<'_>) -> Result<Calc> {
        Ok(Calc::Iter(Arc::new(LazyGendersCalc {
            members: self.members.clone(),
            ty: self.ty.clone(),
        })))
    }
}

/// Test: a shared list requested as mutable is copied, never aliased
#[test]
fn test_shared_list_copied_for_mutation() {
    let s = sales_cube();
    let mut ev = MemoryEvaluator::new(s.cube.clone());
    let ty = Type::member_set_of(&s.gender);
    let shared = TupleList::from_tuples(1, [[s.f.clone()], [s.m.clone()]])
        .unwrap()
        .fix();

    let table = FunctionTable::new();
    table.register(NamedSetFunDef {
        list: shared.clone(),
        ty: ty.clone(),
    });
    let mut compiler = ExprCompiler::new(&table);
    let expr = Expr::call("Genders", vec![], ty);

    let read_only = compiler.compile_list(&expr, false).unwrap();
    assert_eq!(read_only.name(), "NamedSetCalc");

    let mutable = compiler.compile_list(&expr, true).unwrap();
    assert_eq!(mutable.name(), "CopyListCalc");
    assert_eq!(mutable.result_style(), ResultStyle::MutableList);

    let mut list = mutable.evaluate_list(&mut ev).unwrap().unwrap();
    assert!(list.is_mutable());
    list.clear().unwrap();

    let again = read_only.evaluate_list(&mut ev).unwrap().unwrap();
    assert_eq!(again, shared);
    assert_eq!(again.len(), 2);

    let direct = CopyListCalc::new(read_only.clone());
    assert_eq!(direct.children().len(), 1);
}

/// Test: an iterable requested as a list is drained into a fresh list
#[test]
fn test_iterable_drained_into_list() {
    let s = sales_cube();
    let mut ev = MemoryEvaluator::new(s.cube.clone());
    let ty = Type::member_set_of(&s.gender);

    let table = FunctionTable::new();
    table.register(LazyGendersFunDef {
        members: vec![s.f.clone(), s.m.clone()],
        ty: ty.clone(),
    });
    let mut compiler = ExprCompiler::new(&table);
    let expr = Expr::call("LazyGenders", vec![], ty);

    let list = compiler.compile_list(&expr, true).unwrap();
    assert_eq!(list.name(), "DrainIterCalc");
    assert_eq!(list.result_style(), ResultStyle::MutableList);

    let mut first = list.evaluate_list(&mut ev).unwrap().unwrap();
    first.remove(0).unwrap();
    let second = list.evaluate_list(&mut ev).unwrap().unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 2);
    assert_eq!(second.member(0, 0).unwrap(), &s.f);

    let iter = compiler.compile_iter(&expr).unwrap();
    assert_eq!(iter.name(), "LazyGendersCalc");

    // A set of sets flattens through the drained list
    let nested = Expr::call(
        "{}",
        vec![expr.clone(), Expr::member(&s.all)],
        Type::member_set_of(&s.gender),
    );
    let flat = compiler.compile_list(&nested, false).unwrap();
    assert_eq!(flat.evaluate_list(&mut ev).unwrap().unwrap().len(), 3);
}

/// Test: structural functions and coercions compile through the table
#[test]
fn test_structural_functions() {
    let s = sales_cube();
    let mut ev = MemoryEvaluator::new(s.cube.clone());
    let mut compiler = ExprCompiler::new(global_table());

    let current = Expr::call(
        "CurrentMember",
        vec![Expr::hierarchy(&s.gender)],
        Type::member_of(&s.gender),
    );
    let member = compiler.compile_member(&current).unwrap();
    assert_eq!(member.evaluate_member(&mut ev).unwrap(), s.all);
    ev.set_context(&s.m);
    assert_eq!(member.evaluate_member(&mut ev).unwrap(), s.m);
    assert!(member.depends_on(&s.gender));
    assert!(!member.depends_on(&s.measures));

    let hierarchy_of = Expr::call(
        "Hierarchy",
        vec![Expr::member(&s.f)],
        Type::hierarchy_of(&s.gender),
    );
    let hierarchy = compiler.compile_hierarchy(&hierarchy_of).unwrap();
    assert_eq!(
        hierarchy.evaluate_hierarchy(&mut ev).unwrap(),
        Some(s.gender.clone())
    );

    let dimension_of = Expr::call(
        "Dimension",
        vec![Expr::hierarchy(&s.gender)],
        Type::Dimension(Some(s.gender.dimension().clone())),
    );
    let dimension = compiler.compile_dimension(&dimension_of).unwrap();
    assert_eq!(
        dimension.evaluate_dimension(&mut ev).unwrap(),
        Some(s.gender.dimension().clone())
    );

    let level_of = Expr::call(
        "Level",
        vec![Expr::member(&s.f)],
        Type::level_of(&Level::new(&s.gender, "Gender", 1)),
    );
    let level = compiler.compile_level(&level_of).unwrap();
    assert_eq!(level.evaluate_level(&mut ev).unwrap().map(|l| l.depth()), Some(1));

    // Dimension used where a member is required: its current member
    let implicit = compiler
        .compile_member(&Expr::dimension(s.gender.dimension()))
        .unwrap();
    assert_eq!(implicit.evaluate_member(&mut ev).unwrap(), s.m);
}

/// Test: a tuple of members reads its cell with or without the N-ary
/// shortcut, with the same result
#[test]
fn test_tuple_value_collapse() {
    let s = sales_cube();
    let mut ev = MemoryEvaluator::new(s.cube.clone());
    let expr = Expr::call(
        "()",
        vec![Expr::member(&s.f), Expr::member(&s.sales)],
        Type::tuple_of(&[s.gender.clone(), s.measures.clone()]),
    );

    let mut collapsing = ExprCompiler::new(global_table());
    let collapsed = collapsing.compile_scalar(&expr, false).unwrap();
    assert_eq!(collapsed.name(), "MemberArrayValueCalc");

    let config = CompilerConfig::new().with_collapse_tuple_value(false);
    let mut building = ExprCompiler::with_config(global_table(), config);
    let built = building.compile_scalar(&expr, false).unwrap();
    assert_eq!(built.name(), "TupleValueCalc");

    assert_eq!(collapsed.evaluate(&mut ev).unwrap(), Value::double(10.0));
    assert_eq!(built.evaluate(&mut ev).unwrap(), Value::double(10.0));
    assert_eq!(ev.current_member(&s.gender), s.all);
    for h in [&s.gender, &s.measures] {
        assert_eq!(collapsed.depends_on(h), built.depends_on(h));
    }
}

/// Test: parameters register once, read bindings and fall back to defaults
#[test]
fn test_parameters() {
    let s = sales_cube();
    let mut ev = MemoryEvaluator::new(s.cube.clone());
    let mut compiler = ExprCompiler::new(global_table());

    let threshold = Expr::parameter(Parameter::new(
        "Threshold",
        Type::NUMERIC,
        Expr::literal(5.0),
    ));
    let first = compiler.compile(&threshold).unwrap();
    let second = compiler.compile(&threshold).unwrap();
    let slots = compiler.parameter_slots();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].name(), "Threshold");
    assert!(slots[0].default_calc().is_some());

    assert_eq!(first.evaluate(&mut ev).unwrap(), Value::double(5.0));
    assert!(!first.depends_on(&s.gender));

    ev.set_parameter(slots[0].index(), Value::double(7.0));
    assert_eq!(second.evaluate(&mut ev).unwrap(), Value::double(7.0));

    let as_double = compiler.compile_double(&threshold).unwrap();
    assert_eq!(as_double.evaluate_double(&mut ev).unwrap(), Some(7.0));
}

/// Test: a parameter whose default refers to itself reads only its binding
#[test]
fn test_self_referencing_parameter() {
    let s = sales_cube();
    let mut ev = MemoryEvaluator::new(s.cube.clone());
    let mut compiler = ExprCompiler::new(global_table());

    let inner = Parameter::new("Limit", Type::NUMERIC, Expr::literal(1.0));
    let limit = Parameter::new("Limit", Type::NUMERIC, Expr::parameter(inner));
    let calc = compiler.compile(&Expr::parameter(limit)).unwrap();

    assert_eq!(
        calc.evaluate(&mut ev).unwrap_err(),
        Error::ParameterUnbound("Limit".to_string())
    );
    ev.set_parameter(0, Value::double(2.0));
    assert_eq!(calc.evaluate(&mut ev).unwrap(), Value::double(2.0));
}

/// Test: a parameter whose default fails to compile is not left registered
#[test]
fn test_failed_parameter_default_is_not_registered() {
    let s = sales_cube();
    let mut ev = MemoryEvaluator::new(s.cube.clone());
    let mut compiler = ExprCompiler::new(global_table());

    let broken = Expr::parameter(Parameter::new(
        "P",
        Type::NUMERIC,
        Expr::call("NoSuchFunction", vec![], Type::NUMERIC),
    ));
    for _ in 0..2 {
        assert_eq!(
            compiler.compile(&broken).unwrap_err(),
            Error::FunctionNotFound("NoSuchFunction".to_string())
        );
    }
    assert!(compiler.parameter_slots().is_empty());

    // Slot indexes are not reused after a failure
    let good = Expr::parameter(Parameter::new("Q", Type::NUMERIC, Expr::literal(2.0)));
    let calc = compiler.compile(&good).expect("Failed to compile parameter");
    let slots = compiler.parameter_slots();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].index(), 1);
    assert_eq!(calc.evaluate(&mut ev).unwrap(), Value::double(2.0));
}

/// Test: compile_as restores the ambient styles after each sub-compilation
#[test]
fn test_style_scope() {
    let s = sales_cube();
    let mut compiler = ExprCompiler::new(global_table());
    let before = compiler.result_styles().to_vec();
    compiler
        .compile_as(&gender_set(&s), None, ResultStyle::ITERABLE_ONLY)
        .unwrap();
    assert_eq!(compiler.result_styles(), before.as_slice());
    assert_eq!(
        compiler.choose_style(&[ResultStyle::MutableList]),
        Some(ResultStyle::MutableList)
    );
}
