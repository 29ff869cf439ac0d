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

//! Cursors over [`TupleList`]

use crate::core::{Error, Result};
use crate::olap::Member;

use super::{Tuple, TupleCursor, TupleList};

/// Read-only cursor over a tuple list
///
/// For unprojected lists `current` borrows straight from the arena; projected
/// lists gather the current tuple into a buffer that is reused across steps.
pub struct TupleListCursor<'a> {
    list: &'a TupleList,
    /// Index of the next tuple to visit
    next: usize,
    /// Index of the current tuple, if positioned on one
    current: Option<usize>,
    buffer: Tuple,
}

impl<'a> TupleListCursor<'a> {
    pub(crate) fn new(list: &'a TupleList) -> Self {
        Self {
            list,
            next: 0,
            current: None,
            buffer: Tuple::new(),
        }
    }

    /// Number of tuples not yet visited
    pub fn remaining(&self) -> usize {
        self.list.len() - self.next
    }
}

impl TupleCursor for TupleListCursor<'_> {
    #[inline]
    fn arity(&self) -> usize {
        self.list.arity()
    }

    fn forward(&mut self) -> bool {
        if self.next >= self.list.len() {
            self.current = None;
            return false;
        }
        let index = self.next;
        self.next += 1;
        self.current = Some(index);
        if self.list.is_projected() {
            self.buffer.clear();
            for column in 0..self.list.arity() {
                self.buffer.push(self.list.member_at(column, index).clone());
            }
        }
        true
    }

    fn current(&self) -> &[Member] {
        match self.current {
            Some(index) => match self.list.row(index) {
                Some(row) => row,
                None => &self.buffer,
            },
            None => &[],
        }
    }

    #[inline]
    fn member(&self, column: usize) -> &Member {
        match self.current {
            Some(index) => self.list.member_at(column, index),
            None => panic!("cursor is not positioned on a tuple"),
        }
    }
}

impl Iterator for TupleListCursor<'_> {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        if self.forward() {
            Some(self.current_tuple())
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

/// Cursor that can remove the tuple it was last positioned on
///
/// After [`remove`](TupleIteratorMut::remove) the cursor is off-tuple until
/// the next `forward`, which yields the tuple that followed the removed one.
pub struct TupleIteratorMut<'a> {
    list: &'a mut TupleList,
    next: usize,
    last: Option<usize>,
    buffer: Tuple,
}

impl<'a> TupleIteratorMut<'a> {
    pub(crate) fn new(list: &'a mut TupleList) -> Self {
        Self {
            list,
            next: 0,
            last: None,
            buffer: Tuple::new(),
        }
    }

    /// Removes the tuple returned by the last `forward`
    ///
    /// Fails with [`Error::IllegalIteratorState`] before the first `forward`
    /// and on a second call without an intervening `forward`.
    pub fn remove(&mut self) -> Result<()> {
        let index = self.last.take().ok_or(Error::IllegalIteratorState)?;
        self.list.remove(index)?;
        self.next = index;
        self.buffer.clear();
        Ok(())
    }
}

impl TupleCursor for TupleIteratorMut<'_> {
    #[inline]
    fn arity(&self) -> usize {
        self.list.arity()
    }

    fn forward(&mut self) -> bool {
        self.buffer.clear();
        if self.next >= self.list.len() {
            self.last = None;
            return false;
        }
        let index = self.next;
        for column in 0..self.list.arity() {
            self.buffer.push(self.list.member_at(column, index).clone());
        }
        self.last = Some(index);
        self.next += 1;
        true
    }

    fn current(&self) -> &[Member] {
        &self.buffer
    }
}

impl Iterator for TupleIteratorMut<'_> {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        if self.forward() {
            Some(self.buffer.clone())
        } else {
            None
        }
    }
}
