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

//! Free functions for building tuple lists

use crate::core::Result;
use crate::olap::Member;

use super::{TupleIterable, TupleList};

/// Immutable empty list of the given arity
pub fn empty_list(arity: usize) -> TupleList {
    TupleList::new(arity).fix()
}

/// Mutable arity-1 list holding `members` in order
pub fn unary(members: Vec<Member>) -> TupleList {
    TupleList::from_members(1, members)
}

/// Drains an iterable into a new mutable list
pub fn materialize(iterable: &dyn TupleIterable) -> Result<TupleList> {
    let mut list = TupleList::new(iterable.arity());
    let mut cursor = iterable.tuple_cursor();
    while cursor.forward() {
        list.add_current(&*cursor)?;
    }
    Ok(list)
}

/// One column of a list as an arity-1 view
pub fn slice(list: &TupleList, column: usize) -> Result<TupleList> {
    list.project(&[column])
}
