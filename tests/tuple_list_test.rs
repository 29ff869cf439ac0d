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

//! TupleList Tests
//!
//! Tests flat tuple storage: append and read back, projection and sub-list
//! views, snapshots, copy-on-write mutation and cursor traversal

use cubecalc::tuple::{empty_list, materialize, slice, unary};
use cubecalc::{Dimension, Error, Hierarchy, Level, Member, TupleCursor, TupleIterable, TupleList};

struct Members {
    a: Member,
    b: Member,
    c: Member,
    x: Member,
    y: Member,
    z: Member,
}

fn members() -> Members {
    let product = Hierarchy::new(&Dimension::new("Product"));
    let store = Hierarchy::new(&Dimension::new("Store"));
    let product_level = Level::new(&product, "Family", 1);
    let store_level = Level::new(&store, "Country", 1);
    Members {
        a: Member::new(&product_level, None, "A"),
        b: Member::new(&product_level, None, "B"),
        c: Member::new(&product_level, None, "C"),
        x: Member::new(&store_level, None, "X"),
        y: Member::new(&store_level, None, "Y"),
        z: Member::new(&store_level, None, "Z"),
    }
}

fn binary(m: &Members) -> TupleList {
    TupleList::from_tuples(
        2,
        [
            [m.a.clone(), m.x.clone()],
            [m.b.clone(), m.y.clone()],
            [m.c.clone(), m.z.clone()],
        ],
    )
    .expect("Failed to build list")
}

fn collect(list: &TupleList) -> Vec<Vec<Member>> {
    list.iter().map(|t| t.to_vec()).collect()
}

/// Test: append N tuples for several arities and read them back
#[test]
fn test_append_and_read_back() {
    let m = members();
    let pool = [&m.a, &m.b, &m.c, &m.x, &m.y, &m.z];

    for arity in 1..=4 {
        let mut list = TupleList::new(arity);
        assert_eq!(list.len(), 0);
        assert!(list.is_empty());

        let tuples: Vec<Vec<Member>> = (0..5)
            .map(|i| (0..arity).map(|j| pool[(i + j) % pool.len()].clone()).collect())
            .collect();
        for tuple in &tuples {
            list.add_tuple(tuple).expect("Failed to add tuple");
        }

        assert_eq!(list.len(), tuples.len());
        for (i, expected) in tuples.iter().enumerate() {
            let got = list.get(i).expect("Failed to get tuple");
            assert_eq!(got.as_slice(), expected.as_slice());
            for column in 0..arity {
                assert_eq!(list.member(column, i).unwrap(), &got[column]);
            }
        }
    }
}

/// Test: project([1, 0]) swaps columns; sub_list(1, 3) keeps the tail
#[test]
fn test_project_and_sub_list_scenario() {
    let m = members();
    let list = binary(&m);

    let swapped = list.project(&[1, 0]).expect("Failed to project");
    assert_eq!(
        collect(&swapped),
        vec![
            vec![m.x.clone(), m.a.clone()],
            vec![m.y.clone(), m.b.clone()],
            vec![m.z.clone(), m.c.clone()],
        ]
    );

    let tail = list.sub_list(1, 3).expect("Failed to take sub-list");
    assert_eq!(tail.len(), 2);
    assert_eq!(
        collect(&tail),
        vec![vec![m.b.clone(), m.y.clone()], vec![m.c.clone(), m.z.clone()]]
    );

    assert!(list.sub_list(2, 2).unwrap().is_empty());
    assert!(matches!(
        list.sub_list(2, 4),
        Err(Error::RangeOutOfBounds { from: 2, to: 4, len: 3 })
    ));
}

/// Test: identity projection is indistinguishable from the original
#[test]
fn test_identity_projection() {
    let m = members();
    let list = binary(&m);
    let same = list.project(&[0, 1]).unwrap();
    assert_eq!(same, list);
    assert_eq!(same.len(), list.len());
    assert_eq!(collect(&same), collect(&list));
}

/// Test: a projection of a sub-list reads through both views
#[test]
fn test_nested_views() {
    let m = members();
    let list = binary(&m);
    let view = list.sub_list(1, 3).unwrap().project(&[1]).unwrap();
    assert_eq!(view.arity(), 1);
    assert_eq!(collect(&view), vec![vec![m.y.clone()], vec![m.z.clone()]]);
}

/// Test: fix() snapshots the sequence; later mutation of the original is
/// not observed
#[test]
fn test_fix_snapshot() {
    let m = members();
    let mut list = binary(&m);
    let snapshot = list.fix();
    assert!(!snapshot.is_mutable());

    list.add_tuple(&[m.a.clone(), m.z.clone()]).unwrap();
    list.remove(0).unwrap();
    list.insert(0, &[m.c.clone(), m.x.clone()]).unwrap();

    assert_eq!(snapshot.len(), 3);
    assert_eq!(collect(&snapshot), collect(&binary(&m)));
    assert_eq!(list.len(), 4);
}

/// Test: mutating a fixed list fails
#[test]
fn test_fixed_list_rejects_mutation() {
    let m = members();
    let mut fixed = binary(&m).fix();
    assert_eq!(
        fixed.add_tuple(&[m.a.clone(), m.x.clone()]),
        Err(Error::ImmutableList)
    );
    assert_eq!(fixed.clear(), Err(Error::ImmutableList));

    let mut copy = fixed.clone_list(None);
    assert!(copy.is_mutable());
    copy.clear().unwrap();
    assert!(copy.is_empty());
    assert_eq!(fixed.len(), 3);
}

/// Test: mutating a view never changes the list it was taken from
#[test]
fn test_view_mutation_is_copy_on_write() {
    let m = members();
    let list = binary(&m);
    let mut swapped = list.project(&[1, 0]).unwrap();
    swapped.add_tuple(&[m.x.clone(), m.c.clone()]).unwrap();

    assert_eq!(swapped.len(), 4);
    assert_eq!(list.len(), 3);
    assert_eq!(list.get(0).unwrap().as_slice(), &[m.a.clone(), m.x.clone()]);
}

/// Test: arity is checked on every append
#[test]
fn test_arity_mismatch() {
    let m = members();
    let mut list = TupleList::new(2);
    assert!(matches!(
        list.add_tuple(&[m.a.clone()]),
        Err(Error::ArityMismatch { expected: 2, got: 1 })
    ));
    assert!(TupleList::from_flat(2, vec![m.a.clone(), m.x.clone(), m.b.clone()]).is_err());
}

/// Test: cursor exposes each tuple in place and can feed add_current
#[test]
fn test_cursor_and_add_current() {
    let m = members();
    let list = binary(&m).project(&[1, 0]).unwrap();

    let mut copy = TupleList::new(2);
    let mut cursor = list.tuple_cursor();
    let mut seen = 0;
    while cursor.forward() {
        assert_eq!(cursor.arity(), 2);
        assert_eq!(cursor.member(0), list.member(0, seen).unwrap());
        copy.add_current(&cursor).unwrap();
        seen += 1;
    }
    assert_eq!(seen, 3);
    assert_eq!(copy, list);
}

/// Test: the mutable iterator removes the tuple it just returned
#[test]
fn test_iterator_remove() {
    let m = members();
    let mut list = binary(&m);
    {
        let mut it = list.tuple_iterator_mut();
        assert_eq!(it.remove(), Err(Error::IllegalIteratorState));
        while it.forward() {
            if it.member(0) == &m.b {
                it.remove().unwrap();
                assert_eq!(it.remove(), Err(Error::IllegalIteratorState));
            }
        }
    }
    assert_eq!(
        collect(&list),
        vec![vec![m.a.clone(), m.x.clone()], vec![m.c.clone(), m.z.clone()]]
    );
}

/// Test: retain keeps order
#[test]
fn test_retain() {
    let m = members();
    let mut list = binary(&m);
    list.retain(|tuple| tuple[1] != m.y).unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list.member(0, 1).unwrap(), &m.c);
}

/// Test: helpers for empty, unary, sliced and materialized lists
#[test]
fn test_collection_helpers() {
    let m = members();
    let empty = empty_list(3);
    assert_eq!(empty.arity(), 3);
    assert!(empty.is_empty());
    assert!(!empty.is_mutable());

    let one = unary(vec![m.a.clone(), m.b.clone()]);
    assert_eq!(one.arity(), 1);
    assert_eq!(one.len(), 2);

    let list = binary(&m);
    let stores = slice(&list, 1).unwrap();
    assert_eq!(
        collect(&stores),
        vec![vec![m.x.clone()], vec![m.y.clone()], vec![m.z.clone()]]
    );

    let iterable: &dyn TupleIterable = &list;
    assert_eq!(iterable.tuples().count(), 3);
    assert_eq!(materialize(iterable).unwrap(), list);
}
