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

//! Tuple lists, cursors and iterables
//!
//! Sets of tuples reach cube cardinalities, so this module avoids one
//! allocation per tuple wherever it can:
//!
//! - [`TupleList`] stores all tuples end to end in one flat arena of members
//!   with a fixed stride (the arity). Projections and sub-lists are views
//!   over the same arena; mutation is copy-on-write.
//! - [`TupleCursor`] walks a set exposing one reusable "current tuple"
//!   instead of yielding a fresh array per step.
//! - [`TupleIterable`] is anything that can hand out a cursor: a list, or an
//!   ad hoc producer that never materializes its tuples.

mod collections;
mod cursor;
mod list;

use std::fmt;

use smallvec::SmallVec;

use crate::olap::{Evaluator, Member};

pub use collections::{empty_list, materialize, slice, unary};
pub use cursor::{TupleIteratorMut, TupleListCursor};
pub use list::{TupleList, TupleListIter};

/// An owned tuple; inline for the common arities
pub type Tuple = SmallVec<[Member; 4]>;

/// Low-allocation traversal over a sequence of tuples
///
/// A fresh cursor is positioned before the first tuple; call
/// [`forward`](TupleCursor::forward) before reading. The slice returned by
/// [`current`](TupleCursor::current) is valid until the next `forward`.
pub trait TupleCursor {
    /// Number of members in each tuple
    fn arity(&self) -> usize;

    /// Moves to the next tuple; returns false when exhausted
    fn forward(&mut self) -> bool;

    /// The tuple at the current position
    fn current(&self) -> &[Member];

    /// One member of the current tuple
    ///
    /// # Panics
    ///
    /// Panics if the cursor is not positioned on a tuple, or if `column` is
    /// not less than the arity.
    fn member(&self, column: usize) -> &Member {
        let current = self.current();
        assert!(!current.is_empty(), "cursor is not positioned on a tuple");
        &current[column]
    }

    /// Copies the current tuple into an owned value
    fn current_tuple(&self) -> Tuple {
        self.current().iter().cloned().collect()
    }

    /// Pushes every member of the current tuple into the evaluator's context
    fn set_context(&self, evaluator: &mut dyn Evaluator) {
        evaluator.set_context_members(self.current());
    }
}

/// A traversable set of tuples of fixed arity
pub trait TupleIterable: Send + Sync + fmt::Debug {
    fn arity(&self) -> usize;

    /// A new cursor positioned before the first tuple
    fn tuple_cursor(&self) -> Box<dyn TupleCursor + '_>;

    /// Owned tuples, one per step
    fn tuples(&self) -> CursorIter<'_> {
        CursorIter {
            cursor: self.tuple_cursor(),
        }
    }
}

/// Adapts any cursor to a standard iterator of owned tuples
pub struct CursorIter<'a> {
    cursor: Box<dyn TupleCursor + 'a>,
}

impl<'a> CursorIter<'a> {
    pub fn new(cursor: Box<dyn TupleCursor + 'a>) -> Self {
        Self { cursor }
    }
}

impl Iterator for CursorIter<'_> {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        if self.cursor.forward() {
            Some(self.cursor.current_tuple())
        } else {
            None
        }
    }
}
