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

//! Flat, fixed-arity tuple list
//!
//! Layout: one `Arc<Vec<Member>>` arena; arena tuple `i` occupies slots
//! `[i * stride, (i + 1) * stride)`. A list is a window over the arena
//! (`offset`, `len`) plus an optional column remap, which is how
//! [`TupleList::project`] and [`TupleList::sub_list`] share storage instead of
//! copying.
//!
//! Mutation is copy-on-write, the same trade-off `Row` makes for shared rows:
//! a list that is a view, or whose arena is shared with a view or a fixed
//! copy, first detaches into its own compact arena. Nothing that shares the
//! old arena ever observes the change.

use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;

use crate::core::{Error, Result};
use crate::olap::Member;

use super::cursor::{TupleIteratorMut, TupleListCursor};
use super::{Tuple, TupleCursor, TupleIterable};

/// Ordered sequence of same-arity tuples
#[derive(Clone)]
pub struct TupleList {
    store: Arc<Vec<Member>>,
    /// Members per arena tuple; equals the arity unless projected
    stride: usize,
    /// First arena tuple visible through this list
    offset: usize,
    len: usize,
    /// `columns[k]` is the arena column backing position `k`
    columns: Option<Arc<[usize]>>,
    mutable: bool,
}

impl TupleList {
    /// Create an empty mutable list
    ///
    /// # Panics
    ///
    /// Panics if `arity` is zero.
    pub fn new(arity: usize) -> Self {
        Self::with_capacity(arity, 0)
    }

    /// Create an empty mutable list with room for `capacity` tuples
    ///
    /// # Panics
    ///
    /// Panics if `arity` is zero.
    pub fn with_capacity(arity: usize, capacity: usize) -> Self {
        assert!(arity > 0, "tuple list arity must be positive");
        Self {
            store: Arc::new(Vec::with_capacity(capacity * arity)),
            stride: arity,
            offset: 0,
            len: 0,
            columns: None,
            mutable: true,
        }
    }

    /// Create a list from members laid out end to end
    pub fn from_flat(arity: usize, members: Vec<Member>) -> Result<Self> {
        if arity == 0 || members.len() % arity != 0 {
            return Err(Error::arity_mismatch(arity, members.len()));
        }
        Ok(Self::from_members(arity, members))
    }

    /// `members.len()` must be a multiple of `arity`
    pub(crate) fn from_members(arity: usize, members: Vec<Member>) -> Self {
        debug_assert!(arity > 0 && members.len() % arity == 0);
        Self {
            len: members.len() / arity,
            store: Arc::new(members),
            stride: arity,
            offset: 0,
            columns: None,
            mutable: true,
        }
    }

    /// Create a list from tuples, checking each one's arity
    pub fn from_tuples<I, T>(arity: usize, tuples: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[Member]>,
    {
        let mut list = Self::new(arity);
        for tuple in tuples {
            list.add_tuple(tuple.as_ref())?;
        }
        Ok(list)
    }

    // =========================================================================
    // Read access
    // =========================================================================

    #[inline]
    pub fn arity(&self) -> usize {
        match &self.columns {
            Some(columns) => columns.len(),
            None => self.stride,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// False for lists returned by [`TupleList::fix`]
    #[inline]
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    #[inline]
    fn slot(&self, column: usize, index: usize) -> usize {
        let column = match &self.columns {
            Some(columns) => columns[column],
            None => column,
        };
        (self.offset + index) * self.stride + column
    }

    /// Member at `column` of tuple `index`, without bounds checks beyond
    /// the arena's own
    #[inline]
    pub(crate) fn member_at(&self, column: usize, index: usize) -> &Member {
        &self.store[self.slot(column, index)]
    }

    /// Tuple `index` as a contiguous slice of the arena, when the list is
    /// not projected
    #[inline]
    pub(crate) fn row(&self, index: usize) -> Option<&[Member]> {
        if self.columns.is_some() || index >= self.len {
            return None;
        }
        let start = (self.offset + index) * self.stride;
        Some(&self.store[start..start + self.stride])
    }

    #[inline]
    pub(crate) fn is_projected(&self) -> bool {
        self.columns.is_some()
    }

    /// One positional member of one tuple, without materializing the tuple
    pub fn member(&self, column: usize, index: usize) -> Result<&Member> {
        if index >= self.len {
            return Err(Error::index_out_of_bounds(index, self.len));
        }
        if column >= self.arity() {
            return Err(Error::index_out_of_bounds(column, self.arity()));
        }
        Ok(self.member_at(column, index))
    }

    /// Tuple at `index`
    pub fn get(&self, index: usize) -> Result<Tuple> {
        if index >= self.len {
            return Err(Error::index_out_of_bounds(index, self.len));
        }
        Ok((0..self.arity())
            .map(|column| self.member_at(column, index).clone())
            .collect())
    }

    /// Iterator of owned tuples
    pub fn iter(&self) -> TupleListIter<'_> {
        TupleListIter {
            list: self,
            front: 0,
            back: self.len,
        }
    }

    /// Read-only cursor; no per-step allocation for unprojected lists
    pub fn tuple_cursor(&self) -> TupleListCursor<'_> {
        TupleListCursor::new(self)
    }

    /// Cursor that is also a standard iterator
    pub fn tuple_iterator(&self) -> TupleListCursor<'_> {
        TupleListCursor::new(self)
    }

    /// Cursor that can remove the tuple it is positioned on
    pub fn tuple_iterator_mut(&mut self) -> TupleIteratorMut<'_> {
        TupleIteratorMut::new(self)
    }

    // =========================================================================
    // Views and copies
    // =========================================================================

    /// View whose position `k` is this list's position `positions[k]`
    ///
    /// Shares the arena; `project(&[1, 0])` swaps the two columns of a
    /// binary list, `project(&[0])` narrows it to its first hierarchy.
    pub fn project(&self, positions: &[usize]) -> Result<TupleList> {
        if positions.is_empty() {
            return Err(Error::invalid_argument(
                "projection must keep at least one position",
            ));
        }
        let arity = self.arity();
        let mut columns = Vec::with_capacity(positions.len());
        for &position in positions {
            if position >= arity {
                return Err(Error::index_out_of_bounds(position, arity));
            }
            columns.push(match &self.columns {
                Some(existing) => existing[position],
                None => position,
            });
        }
        Ok(TupleList {
            store: Arc::clone(&self.store),
            stride: self.stride,
            offset: self.offset,
            len: self.len,
            columns: Some(columns.into()),
            mutable: self.mutable,
        })
    }

    /// View over tuples `[from, to)`
    pub fn sub_list(&self, from: usize, to: usize) -> Result<TupleList> {
        if from > to || to > self.len {
            return Err(Error::RangeOutOfBounds {
                from,
                to,
                len: self.len,
            });
        }
        Ok(TupleList {
            store: Arc::clone(&self.store),
            stride: self.stride,
            offset: self.offset + from,
            len: to - from,
            columns: self.columns.clone(),
            mutable: self.mutable,
        })
    }

    /// Immutable snapshot of the list as it is now
    ///
    /// O(1): the snapshot shares the arena, and later mutation of `self`
    /// detaches `self`, never the snapshot.
    pub fn fix(&self) -> TupleList {
        TupleList {
            mutable: false,
            ..self.clone()
        }
    }

    /// Independent mutable list of the same arity
    ///
    /// With `None` the copy holds the same tuples; with `Some(capacity)` it
    /// is empty and pre-sized for `capacity` tuples.
    pub fn clone_list(&self, capacity: Option<usize>) -> TupleList {
        match capacity {
            None => TupleList {
                mutable: true,
                ..self.clone()
            },
            Some(capacity) => TupleList::with_capacity(self.arity(), capacity),
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    fn check_mutable(&self) -> Result<()> {
        if self.mutable {
            Ok(())
        } else {
            Err(Error::ImmutableList)
        }
    }

    fn check_arity(&self, got: usize) -> Result<()> {
        let expected = self.arity();
        if got == expected {
            Ok(())
        } else {
            Err(Error::arity_mismatch(expected, got))
        }
    }

    fn is_view(&self) -> bool {
        self.columns.is_some()
            || self.offset != 0
            || (self.offset + self.len) * self.stride != self.store.len()
    }

    /// Exclusive access to a compact arena whose stride equals the arity
    fn make_mut(&mut self) -> &mut Vec<Member> {
        if self.is_view() {
            let arity = self.arity();
            let mut flat = Vec::with_capacity(self.len * arity);
            for index in 0..self.len {
                for column in 0..arity {
                    flat.push(self.member_at(column, index).clone());
                }
            }
            self.store = Arc::new(flat);
            self.stride = arity;
            self.offset = 0;
            self.columns = None;
        }
        Arc::make_mut(&mut self.store)
    }

    /// Appends a tuple given as explicit members
    pub fn add_tuple(&mut self, tuple: &[Member]) -> Result<()> {
        self.check_mutable()?;
        self.check_arity(tuple.len())?;
        self.make_mut().extend_from_slice(tuple);
        self.len += 1;
        Ok(())
    }

    /// Appends the cursor's current tuple without an intermediate array
    pub fn add_current(&mut self, cursor: &dyn TupleCursor) -> Result<()> {
        self.check_mutable()?;
        self.check_arity(cursor.arity())?;
        let arity = cursor.arity();
        let store = self.make_mut();
        for column in 0..arity {
            store.push(cursor.member(column).clone());
        }
        self.len += 1;
        Ok(())
    }

    /// Appends every tuple of `other`
    pub fn add_all(&mut self, other: &TupleList) -> Result<()> {
        self.check_mutable()?;
        self.check_arity(other.arity())?;
        let arity = other.arity();
        let count = other.len();
        let store = self.make_mut();
        store.reserve(count * arity);
        for index in 0..count {
            for column in 0..arity {
                store.push(other.member_at(column, index).clone());
            }
        }
        self.len += count;
        Ok(())
    }

    /// Inserts a tuple before position `index`
    pub fn insert(&mut self, index: usize, tuple: &[Member]) -> Result<()> {
        self.check_mutable()?;
        self.check_arity(tuple.len())?;
        if index > self.len {
            return Err(Error::index_out_of_bounds(index, self.len));
        }
        let at = index * tuple.len();
        self.make_mut().splice(at..at, tuple.iter().cloned());
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the tuple at `index`
    pub fn remove(&mut self, index: usize) -> Result<Tuple> {
        self.check_mutable()?;
        if index >= self.len {
            return Err(Error::index_out_of_bounds(index, self.len));
        }
        let arity = self.arity();
        let at = index * arity;
        let removed = self.make_mut().drain(at..at + arity).collect();
        self.len -= 1;
        Ok(removed)
    }

    /// Keeps only the tuples for which `keep` returns true, preserving order
    pub fn retain<F>(&mut self, mut keep: F) -> Result<()>
    where
        F: FnMut(&[Member]) -> bool,
    {
        self.check_mutable()?;
        let arity = self.arity();
        let len = self.len;
        let store = self.make_mut();
        let mut write = 0;
        for read in 0..len {
            if keep(&store[read * arity..(read + 1) * arity]) {
                if write != read {
                    for column in 0..arity {
                        store.swap(write * arity + column, read * arity + column);
                    }
                }
                write += 1;
            }
        }
        store.truncate(write * arity);
        self.len = write;
        Ok(())
    }

    /// Removes every tuple
    pub fn clear(&mut self) -> Result<()> {
        self.check_mutable()?;
        self.make_mut().clear();
        self.len = 0;
        Ok(())
    }
}

impl PartialEq for TupleList {
    fn eq(&self, other: &Self) -> bool {
        if self.arity() != other.arity() || self.len != other.len {
            return false;
        }
        let arity = self.arity();
        (0..self.len).all(|index| {
            (0..arity).all(|column| self.member_at(column, index) == other.member_at(column, index))
        })
    }
}

impl fmt::Debug for TupleList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TupleList")
            .field("arity", &self.arity())
            .field("len", &self.len)
            .field("mutable", &self.mutable)
            .field("tuples", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

impl TupleIterable for TupleList {
    fn arity(&self) -> usize {
        TupleList::arity(self)
    }

    fn tuple_cursor(&self) -> Box<dyn TupleCursor + '_> {
        Box::new(TupleListCursor::new(self))
    }
}

impl<'a> IntoIterator for &'a TupleList {
    type Item = Tuple;
    type IntoIter = TupleListIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator of owned tuples over a [`TupleList`]
pub struct TupleListIter<'a> {
    list: &'a TupleList,
    front: usize,
    back: usize,
}

impl TupleListIter<'_> {
    fn tuple(&self, index: usize) -> Tuple {
        (0..self.list.arity())
            .map(|column| self.list.member_at(column, index).clone())
            .collect()
    }
}

impl Iterator for TupleListIter<'_> {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        if self.front == self.back {
            return None;
        }
        let tuple = self.tuple(self.front);
        self.front += 1;
        Some(tuple)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for TupleListIter<'_> {
    fn next_back(&mut self) -> Option<Tuple> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(self.tuple(self.back))
    }
}

impl ExactSizeIterator for TupleListIter<'_> {}

impl FusedIterator for TupleListIter<'_> {}
