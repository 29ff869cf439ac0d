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

//! Dependency Analysis Tests
//!
//! Tests `depends_on` across compiled trees and context simplification

use std::sync::Arc;

use cubecalc::calc::{
    any_depends, any_depends_but_first, but_depends, simplify_context, ConstantCalc, ValueCalc,
};
use cubecalc::{
    global_table, CalcWriter, ContextGuard, Dimension, Evaluator, Expr, ExprCompiler, Hierarchy,
    Level, Member, MemoryCube, MemoryEvaluator, Type, Value,
};

struct Fixture {
    cube: Arc<MemoryCube>,
    measures: Hierarchy,
    sales: Member,
    gender: Hierarchy,
    gender_all: Member,
    f: Member,
    m: Member,
    store: Hierarchy,
    ca: Member,
}

fn fixture() -> Fixture {
    let measures = Hierarchy::without_all(&Dimension::measures(), "Measures");
    let sales = Member::measure(&Level::new(&measures, "MeasuresLevel", 0), "Sales", "Sales");

    let gender = Hierarchy::new(&Dimension::new("Gender"));
    let gender_all = Member::all(&Level::new(&gender, "(All)", 0), "All Gender");
    let gender_level = Level::new(&gender, "Gender", 1);
    let f = Member::new(&gender_level, Some(&gender_all), "F");
    let m = Member::new(&gender_level, Some(&gender_all), "M");

    let store = Hierarchy::new(&Dimension::new("Store"));
    let store_all = Member::all(&Level::new(&store, "(All)", 0), "All Stores");
    let ca = Member::new(&Level::new(&store, "State", 1), Some(&store_all), "CA");

    let cube = MemoryCube::builder("Sales")
        .hierarchy(&measures, &sales)
        .hierarchy(&gender, &gender_all)
        .hierarchy(&store, &store_all)
        .fact(&[f.clone(), ca.clone()], &sales, 10.0)
        .fact(&[m.clone(), ca.clone()], &sales, 5.0)
        .build();

    Fixture {
        cube: Arc::new(cube),
        measures,
        sales,
        gender,
        gender_all,
        f,
        m,
        store,
        ca,
    }
}

fn current_member(hierarchy: &Hierarchy) -> Expr {
    Expr::call(
        "CurrentMember",
        vec![Expr::hierarchy(hierarchy)],
        Type::member_of(hierarchy),
    )
}

/// Test: constants depend on nothing, the current cell on everything
#[test]
fn test_leaf_dependencies() {
    let fx = fixture();
    let constant = ConstantCalc::new(Value::double(1.0), Type::NUMERIC).into_calc();
    let value = ValueCalc::new().into_calc();
    for h in [&fx.measures, &fx.gender, &fx.store] {
        assert!(!constant.depends_on(h));
        assert!(value.depends_on(h));
    }
}

/// Test: a set pinning Gender shields the expression evaluated over it
#[test]
fn test_any_depends_but_first() {
    let fx = fixture();
    let mut compiler = ExprCompiler::new(global_table());
    let set = Expr::call(
        "{}",
        vec![Expr::member(&fx.f), Expr::member(&fx.m)],
        Type::member_set_of(&fx.gender),
    );
    let calcs = [
        compiler.compile(&set).expect("Failed to compile set"),
        ValueCalc::new().into_calc(),
    ];

    assert!(!any_depends_but_first(&calcs, &fx.gender));
    assert!(any_depends_but_first(&calcs, &fx.store));
    assert!(any_depends_but_first(&calcs, &fx.measures));
    assert!(any_depends(&calcs, &fx.gender));
    assert!(!any_depends_but_first(&[], &fx.gender));

    // A set that itself reads the context decides alone
    let moving = Expr::call(
        "{}",
        vec![current_member(&fx.gender)],
        Type::member_set_of(&fx.gender),
    );
    let calcs = [
        compiler.compile(&moving).expect("Failed to compile set"),
        ConstantCalc::new(Value::double(1.0), Type::NUMERIC).into_calc(),
    ];
    assert!(any_depends_but_first(&calcs, &fx.gender));
    assert!(!any_depends_but_first(&calcs, &fx.store));
}

/// Test: context-overriding calcs depend on what their members do not pin
#[test]
fn test_but_depends() {
    let fx = fixture();
    let mut compiler = ExprCompiler::new(global_table());

    let fixed = [compiler.compile(&Expr::member(&fx.f)).unwrap()];
    assert!(!but_depends(&fixed, &fx.gender));
    assert!(but_depends(&fixed, &fx.store));

    let moving = [compiler.compile(&current_member(&fx.gender)).unwrap()];
    assert!(but_depends(&moving, &fx.gender));
    assert!(but_depends(&moving, &fx.store));
    assert!(but_depends(&[], &fx.gender));
}

/// Test: dependency flows through a whole compiled tree
#[test]
fn test_compiled_tree_dependencies() {
    let fx = fixture();
    let mut compiler = ExprCompiler::new(global_table());
    let expr = Expr::call(
        "()",
        vec![current_member(&fx.store), Expr::member(&fx.sales)],
        Type::tuple_of(&[fx.store.clone(), fx.measures.clone()]),
    );
    let calc = compiler.compile_scalar(&expr, false).unwrap();

    assert!(calc.depends_on(&fx.store));
    assert!(!calc.depends_on(&fx.measures));
    assert!(calc.depends_on(&fx.gender));

    let mut writer = CalcWriter::new().with_dependencies(&[
        fx.measures.clone(),
        fx.gender.clone(),
        fx.store.clone(),
    ]);
    writer.write(&calc);
    let lines = writer.lines();
    assert!(lines[0].starts_with("MemberArrayValueCalc("));
    assert!(lines[0].contains(&format!(
        "dependsOn=[{}, {}]",
        fx.gender.unique_name(),
        fx.store.unique_name()
    )));
    assert!(lines[1].starts_with("  HierarchyCurrentMemberCalc("));
}

/// Test: simplification resets only the hierarchies the calc ignores
#[test]
fn test_simplify_context() {
    let fx = fixture();
    let mut ev = MemoryEvaluator::new(fx.cube.clone());
    let mut compiler = ExprCompiler::new(global_table());
    let calc = compiler.compile(&current_member(&fx.store)).unwrap();

    ev.set_context(&fx.f);
    ev.set_context(&fx.ca);
    {
        let mut guard = ContextGuard::new(&mut ev);
        assert_eq!(simplify_context(&calc, &mut *guard), 1);
        assert_eq!(guard.current_member(&fx.gender), fx.gender_all);
        assert_eq!(guard.current_member(&fx.store), fx.ca);
        assert_eq!(guard.current_member(&fx.measures), fx.sales);

        // Already simplified
        assert_eq!(simplify_context(&calc, &mut *guard), 0);
    }
    assert_eq!(ev.current_member(&fx.gender), fx.f);

    ev.set_non_empty(true);
    assert_eq!(simplify_context(&calc, &mut ev), 0);
    assert_eq!(ev.current_member(&fx.gender), fx.f);
}

/// Test: simplifying around a value read does not change the result
#[test]
fn test_simplify_preserves_value() {
    let fx = fixture();
    let mut ev = MemoryEvaluator::new(fx.cube.clone());
    let mut compiler = ExprCompiler::new(global_table());
    let calc = compiler
        .compile_scalar(&Expr::member(&fx.ca), false)
        .unwrap();

    ev.set_context(&fx.m);
    let before = calc.evaluate(&mut ev).unwrap();
    assert_eq!(before, Value::double(5.0));

    let mut guard = ContextGuard::new(&mut ev);
    assert_eq!(simplify_context(&calc, &mut *guard), 0);
    assert_eq!(calc.evaluate(&mut *guard).unwrap(), before);
}
