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

//! Concurrent evaluation tests
//!
//! One compiled calc tree and one cube are shared by many workers. Each
//! worker owns its evaluator, so contexts never leak between threads.

use std::sync::Arc;

use rayon::prelude::*;

use cubecalc::{
    global_table, Calc, CalcNode, Dimension, Evaluator, Expr, ExprCompiler, Hierarchy, Level,
    ListCalc, Member, MemoryCube, MemoryEvaluator, Type, Value,
};

const STORES: usize = 64;

struct Chain {
    cube: Arc<MemoryCube>,
    store: Hierarchy,
    stores: Vec<Member>,
}

fn chain() -> Chain {
    let measures = Hierarchy::without_all(&Dimension::measures(), "Measures");
    let sales = Member::measure(&Level::new(&measures, "MeasuresLevel", 0), "Sales", "Sales");
    let store = Hierarchy::new(&Dimension::new("Store"));
    let all = Member::all(&Level::new(&store, "(All)", 0), "All Stores");
    let level = Level::new(&store, "Store", 1);
    let stores: Vec<Member> = (0..STORES)
        .map(|i| Member::new(&level, Some(&all), &format!("Store {}", i)))
        .collect();

    let mut builder = MemoryCube::builder("Sales")
        .hierarchy(&measures, &sales)
        .hierarchy(&store, &all);
    for (i, member) in stores.iter().enumerate() {
        builder = builder.fact(std::slice::from_ref(member), &sales, i as f64);
    }
    Chain {
        cube: Arc::new(builder.build()),
        store,
        stores,
    }
}

fn current_store_value(store: &Hierarchy) -> Calc {
    let mut compiler = ExprCompiler::new(global_table());
    let current = Expr::call(
        "CurrentMember",
        vec![Expr::hierarchy(store)],
        Type::member_of(store),
    );
    compiler
        .compile_scalar(&current, false)
        .expect("Failed to compile value")
}

/// Test: workers sharing one calc each see only their own context
#[test]
fn test_parallel_evaluation_with_private_contexts() {
    let chain = chain();
    let calc = current_store_value(&chain.store);

    let values: Vec<Value> = chain
        .stores
        .par_iter()
        .map(|member| {
            let mut ev = MemoryEvaluator::new(chain.cube.clone());
            ev.set_context(member);
            let value = calc.evaluate(&mut ev).expect("Failed to evaluate");
            assert_eq!(ev.current_member(&chain.store), *member);
            value
        })
        .collect();

    for (i, value) in values.iter().enumerate() {
        assert_eq!(*value, Value::double(i as f64));
    }
}

/// Test: concurrent evaluations of one set calc hand out independent lists
#[test]
fn test_parallel_set_evaluation() {
    let chain = chain();
    let mut compiler = ExprCompiler::new(global_table());
    let set = Expr::call(
        "{}",
        chain.stores.iter().map(Expr::member).collect(),
        Type::member_set_of(&chain.store),
    );
    let list_calc = compiler
        .compile_list(&set, true)
        .expect("Failed to compile set");
    assert_eq!(list_calc.name(), "SetCalc");

    let lengths: Vec<usize> = (0..STORES)
        .into_par_iter()
        .map(|keep| {
            let mut ev = MemoryEvaluator::new(chain.cube.clone());
            let mut list = list_calc
                .evaluate_list(&mut ev)
                .expect("Failed to evaluate set")
                .expect("Set is never null");
            list.retain(|tuple| tuple[0] == chain.stores[keep])
                .expect("Failed to filter list");
            list.len()
        })
        .collect();

    assert!(lengths.iter().all(|&len| len == 1));
}

/// Test: total over all stores matches across threads
#[test]
fn test_parallel_totals_agree() {
    let chain = chain();
    let calc = current_store_value(&chain.store);
    let expected: f64 = (0..STORES).map(|i| i as f64).sum();

    let totals: Vec<Value> = (0..8)
        .into_par_iter()
        .map(|_| {
            let mut ev = MemoryEvaluator::new(chain.cube.clone());
            calc.evaluate(&mut ev).expect("Failed to evaluate")
        })
        .collect();

    assert!(totals.iter().all(|total| *total == Value::double(expected)));
}
