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

//! Dimensional modeling primitives
//!
//! [`Dimension`], [`Hierarchy`], [`Level`] and [`Member`] are reference-counted
//! handles: cloning is O(1) and identity is the unique name. Links only point
//! from child to parent (member -> level -> hierarchy -> dimension), so a
//! schema never forms reference cycles. Navigation in the other direction
//! (a hierarchy's default member, a dimension's default hierarchy) is answered
//! by the [`Evaluator`](super::Evaluator).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Kind of a dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimensionKind {
    /// Ordinary dimension
    Standard,
    /// The measures dimension
    Measures,
    /// Time dimension
    Time,
}

#[derive(Debug)]
struct DimensionData {
    name: Arc<str>,
    unique_name: Arc<str>,
    kind: DimensionKind,
}

/// A dimension of a cube
#[derive(Clone)]
pub struct Dimension(Arc<DimensionData>);

impl Dimension {
    /// Create a standard dimension
    pub fn new(name: &str) -> Self {
        Self::with_kind(name, DimensionKind::Standard)
    }

    /// Create the measures dimension
    pub fn measures() -> Self {
        Self::with_kind("Measures", DimensionKind::Measures)
    }

    /// Create a dimension of the given kind
    pub fn with_kind(name: &str, kind: DimensionKind) -> Self {
        Dimension(Arc::new(DimensionData {
            name: Arc::from(name),
            unique_name: Arc::from(format!("[{}]", name).as_str()),
            kind,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn unique_name(&self) -> &str {
        &self.0.unique_name
    }

    pub fn kind(&self) -> DimensionKind {
        self.0.kind
    }

    pub fn is_measures(&self) -> bool {
        self.0.kind == DimensionKind::Measures
    }
}

#[derive(Debug)]
struct HierarchyData {
    name: Arc<str>,
    unique_name: Arc<str>,
    dimension: Dimension,
    has_all: bool,
    null_unique_name: Arc<str>,
}

/// A hierarchy within a dimension
///
/// The evaluator's context holds exactly one current member per hierarchy.
#[derive(Clone)]
pub struct Hierarchy(Arc<HierarchyData>);

impl Hierarchy {
    /// Create the default hierarchy of a dimension (same name as the dimension)
    pub fn new(dimension: &Dimension) -> Self {
        Self::build(dimension, dimension.name(), true)
    }

    /// Create a named hierarchy of a dimension
    pub fn named(dimension: &Dimension, name: &str) -> Self {
        Self::build(dimension, name, true)
    }

    /// Create a hierarchy without an all level (e.g. measures)
    pub fn without_all(dimension: &Dimension, name: &str) -> Self {
        Self::build(dimension, name, false)
    }

    fn build(dimension: &Dimension, name: &str, has_all: bool) -> Self {
        let unique_name = if name == dimension.name() {
            dimension.unique_name().to_string()
        } else {
            format!("{}.[{}]", dimension.unique_name(), name)
        };
        Hierarchy(Arc::new(HierarchyData {
            name: Arc::from(name),
            null_unique_name: Arc::from(format!("{}.#null", unique_name).as_str()),
            unique_name: Arc::from(unique_name.as_str()),
            dimension: dimension.clone(),
            has_all,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn unique_name(&self) -> &str {
        &self.0.unique_name
    }

    pub fn dimension(&self) -> &Dimension {
        &self.0.dimension
    }

    pub fn has_all(&self) -> bool {
        self.0.has_all
    }

    /// The null member of this hierarchy; does not allocate
    #[inline]
    pub fn null_member(&self) -> Member {
        Member::null(self)
    }
}

#[derive(Debug)]
struct LevelData {
    name: Arc<str>,
    unique_name: Arc<str>,
    depth: u32,
    hierarchy: Hierarchy,
}

/// A level of a hierarchy
#[derive(Clone)]
pub struct Level(Arc<LevelData>);

impl Level {
    /// Create a level at the given depth (0 is the top level)
    pub fn new(hierarchy: &Hierarchy, name: &str, depth: u32) -> Self {
        Level(Arc::new(LevelData {
            name: Arc::from(name),
            unique_name: Arc::from(format!("{}.[{}]", hierarchy.unique_name(), name).as_str()),
            depth,
            hierarchy: hierarchy.clone(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn unique_name(&self) -> &str {
        &self.0.unique_name
    }

    pub fn depth(&self) -> u32 {
        self.0.depth
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.0.hierarchy
    }

    pub fn dimension(&self) -> &Dimension {
        self.0.hierarchy.dimension()
    }
}

/// Kind of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Ordinary member
    Regular,
    /// The 'all' member at the top of a hierarchy
    All,
    /// The null member; stands for "no member" on the data path
    Null,
    /// A stored measure
    Measure,
}

#[derive(Debug)]
struct MemberData {
    name: Arc<str>,
    unique_name: Arc<str>,
    level: Level,
    parent: Option<Member>,
    kind: MemberKind,
    /// Base cube a measure is stored in (virtual cube rule)
    base_cube: Option<Arc<str>>,
}

/// Null members carry only their hierarchy, whose data holds the unique name
#[derive(Clone)]
enum MemberRepr {
    Stored(Arc<MemberData>),
    Null(Hierarchy),
}

/// A member of a hierarchy
#[derive(Clone)]
pub struct Member(MemberRepr);

impl Member {
    /// Create a regular member on `level`, optionally under `parent`
    pub fn new(level: &Level, parent: Option<&Member>, name: &str) -> Self {
        Self::build(level, parent, name, MemberKind::Regular, None)
    }

    /// Create the all member of a hierarchy on its top level
    pub fn all(level: &Level, name: &str) -> Self {
        Self::build(level, None, name, MemberKind::All, None)
    }

    /// Create a stored measure belonging to base cube `cube`
    pub fn measure(level: &Level, name: &str, cube: &str) -> Self {
        Self::build(level, None, name, MemberKind::Measure, Some(Arc::from(cube)))
    }

    /// Create the null member of a hierarchy
    pub fn null(hierarchy: &Hierarchy) -> Self {
        Member(MemberRepr::Null(hierarchy.clone()))
    }

    fn build(
        level: &Level,
        parent: Option<&Member>,
        name: &str,
        kind: MemberKind,
        base_cube: Option<Arc<str>>,
    ) -> Self {
        let prefix = match parent {
            Some(p) if !p.is_all() => p.unique_name(),
            _ => level.hierarchy().unique_name(),
        };
        Member(MemberRepr::Stored(Arc::new(MemberData {
            name: Arc::from(name),
            unique_name: Arc::from(format!("{}.[{}]", prefix, name).as_str()),
            level: level.clone(),
            parent: parent.cloned(),
            kind,
            base_cube,
        })))
    }

    #[inline]
    fn stored(&self) -> Option<&MemberData> {
        match &self.0 {
            MemberRepr::Stored(data) => Some(data),
            MemberRepr::Null(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        self.stored().map_or("#null", |data| &*data.name)
    }

    pub fn unique_name(&self) -> &str {
        match &self.0 {
            MemberRepr::Stored(data) => &data.unique_name,
            MemberRepr::Null(hierarchy) => &hierarchy.0.null_unique_name,
        }
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        match &self.0 {
            MemberRepr::Stored(data) => data.level.hierarchy(),
            MemberRepr::Null(hierarchy) => hierarchy,
        }
    }

    pub fn dimension(&self) -> &Dimension {
        self.hierarchy().dimension()
    }

    /// Level of the member; `None` only for the null member
    pub fn level(&self) -> Option<&Level> {
        self.stored().map(|data| &data.level)
    }

    pub fn parent(&self) -> Option<&Member> {
        self.stored().and_then(|data| data.parent.as_ref())
    }

    pub fn kind(&self) -> MemberKind {
        self.stored().map_or(MemberKind::Null, |data| data.kind)
    }

    pub fn base_cube(&self) -> Option<&str> {
        self.stored().and_then(|data| data.base_cube.as_deref())
    }

    #[inline]
    pub fn is_all(&self) -> bool {
        self.kind() == MemberKind::All
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self.0, MemberRepr::Null(_))
    }

    #[inline]
    pub fn is_measure(&self) -> bool {
        self.kind() == MemberKind::Measure
    }

    pub fn depth(&self) -> u32 {
        self.level().map_or(0, Level::depth)
    }

    #[inline]
    fn same_handle(&self, other: &Member) -> bool {
        match (&self.0, &other.0) {
            (MemberRepr::Stored(a), MemberRepr::Stored(b)) => Arc::ptr_eq(a, b),
            (MemberRepr::Null(a), MemberRepr::Null(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }

    /// True if `self` is `other` or one of its ancestors
    pub fn is_ancestor_or_self(&self, other: &Member) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        if self.is_all() {
            return self.hierarchy() == other.hierarchy();
        }
        let mut cursor = Some(other);
        while let Some(m) = cursor {
            if m == self {
                return true;
            }
            cursor = m.parent();
        }
        false
    }
}

macro_rules! impl_identity {
    ($ty:ident, $same:expr) => {
        impl PartialEq for $ty {
            #[inline]
            fn eq(&self, other: &Self) -> bool {
                ($same)(self, other) || self.unique_name() == other.unique_name()
            }
        }

        impl Eq for $ty {}

        impl Hash for $ty {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.unique_name().hash(state);
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.unique_name())
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($ty), self.unique_name())
            }
        }
    };
}

impl_identity!(Dimension, |a: &Dimension, b: &Dimension| Arc::ptr_eq(&a.0, &b.0));
impl_identity!(Hierarchy, |a: &Hierarchy, b: &Hierarchy| Arc::ptr_eq(&a.0, &b.0));
impl_identity!(Level, |a: &Level, b: &Level| Arc::ptr_eq(&a.0, &b.0));
impl_identity!(Member, Member::same_handle);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_names() {
        let gender = Dimension::new("Gender");
        let h = Hierarchy::new(&gender);
        assert_eq!(h.unique_name(), "[Gender]");

        let time = Dimension::new("Time");
        let weekly = Hierarchy::named(&time, "Weekly");
        assert_eq!(weekly.unique_name(), "[Time].[Weekly]");

        let all_level = Level::new(&h, "(All)", 0);
        let level = Level::new(&h, "Gender", 1);
        let all = Member::all(&all_level, "All Gender");
        let female = Member::new(&level, Some(&all), "F");
        assert_eq!(all.unique_name(), "[Gender].[All Gender]");
        assert_eq!(female.unique_name(), "[Gender].[F]");
        assert_eq!(female.depth(), 1);
        assert_eq!(female.dimension(), &gender);
    }

    #[test]
    fn test_identity_by_unique_name() {
        let d = Dimension::new("Store");
        let h1 = Hierarchy::new(&d);
        let h2 = Hierarchy::new(&d);
        assert_eq!(h1, h2);

        let l = Level::new(&h1, "Country", 1);
        let a = Member::new(&l, None, "USA");
        let b = Member::new(&l, None, "USA");
        let c = Member::new(&l, None, "Mexico");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_null_member() {
        let h = Hierarchy::new(&Dimension::new("Product"));
        let null = h.null_member();
        assert!(null.is_null());
        assert!(!null.is_all());
        assert!(null.level().is_none());
        assert_eq!(null.hierarchy(), &h);

        let other = Hierarchy::new(&Dimension::new("Store")).null_member();
        assert_ne!(null, other);
    }

    /// Test: null members of one hierarchy share its data and its unique name
    #[test]
    fn test_null_member_shares_hierarchy() {
        let h = Hierarchy::new(&Dimension::new("Product"));
        let first = h.null_member();
        let second = h.null_member();
        assert!(first.same_handle(&second));
        assert_eq!(first, second);
        assert!(std::ptr::eq(first.unique_name(), second.unique_name()));
        assert_eq!(first.unique_name(), "[Product].#null");
        assert_eq!(first.name(), "#null");
        assert_eq!(first.kind(), MemberKind::Null);
        assert_eq!(first.depth(), 0);
        assert!(first.parent().is_none());

        let level = Level::new(&h, "Product Family", 1);
        let food = Member::new(&level, None, "Food");
        assert_ne!(first, food);
        assert_eq!(food.hierarchy(), &h);
        assert_eq!(food.level(), Some(&level));
    }

    #[test]
    fn test_ancestry() {
        let h = Hierarchy::new(&Dimension::new("Store"));
        let all = Member::all(&Level::new(&h, "(All)", 0), "All Stores");
        let country = Member::new(&Level::new(&h, "Country", 1), Some(&all), "USA");
        let state = Member::new(&Level::new(&h, "State", 2), Some(&country), "CA");

        assert!(all.is_ancestor_or_self(&state));
        assert!(country.is_ancestor_or_self(&state));
        assert!(state.is_ancestor_or_self(&state));
        assert!(!state.is_ancestor_or_self(&country));
        assert!(!h.null_member().is_ancestor_or_self(&state));
    }

    #[test]
    fn test_measure_member() {
        let measures = Dimension::measures();
        let h = Hierarchy::without_all(&measures, "Measures");
        let level = Level::new(&h, "MeasuresLevel", 0);
        let sales = Member::measure(&level, "Unit Sales", "Sales");
        assert!(sales.is_measure());
        assert_eq!(sales.base_cube(), Some("Sales"));
        assert!(sales.dimension().is_measures());
        assert!(!h.has_all());
    }
}
