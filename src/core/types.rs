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

//! Static expression types
//!
//! Every expression node and every compiled calc carries a [`Type`]. Besides
//! driving shape selection in the compiler, types answer the question "does
//! a value of this type always pin hierarchy H?", which dependency analysis
//! uses to prove a calc independent of the ambient context.

use std::fmt;

use crate::olap::{Dimension, Hierarchy, Level};

/// Scalar type kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Any scalar; the concrete kind is only known at runtime
    Any,
    /// Floating point number
    Numeric,
    /// Fixed point number; scale 0 is an integer
    Decimal { scale: u8 },
    /// Character string
    String,
    /// Boolean
    Boolean,
    /// Timestamp
    DateTime,
    /// The type of the NULL literal
    Null,
}

impl ScalarKind {
    /// Integer is a decimal with no fractional digits
    pub const INTEGER: ScalarKind = ScalarKind::Decimal { scale: 0 };

    pub fn is_numeric(&self) -> bool {
        matches!(self, ScalarKind::Numeric | ScalarKind::Decimal { .. })
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, ScalarKind::Decimal { scale: 0 })
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Any => write!(f, "SCALAR"),
            ScalarKind::Numeric => write!(f, "NUMERIC"),
            ScalarKind::Decimal { scale: 0 } => write!(f, "INTEGER"),
            ScalarKind::Decimal { scale } => write!(f, "DECIMAL({})", scale),
            ScalarKind::String => write!(f, "STRING"),
            ScalarKind::Boolean => write!(f, "BOOLEAN"),
            ScalarKind::DateTime => write!(f, "DATETIME"),
            ScalarKind::Null => write!(f, "NULL"),
        }
    }
}

/// What is statically known about a member, level or hierarchy expression
///
/// A known level implies its hierarchy, and a known hierarchy implies its
/// dimension; the constructors keep the fields consistent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ElementType {
    dimension: Option<Dimension>,
    hierarchy: Option<Hierarchy>,
    level: Option<Level>,
}

impl ElementType {
    /// Nothing known
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn of_dimension(dimension: &Dimension) -> Self {
        Self {
            dimension: Some(dimension.clone()),
            hierarchy: None,
            level: None,
        }
    }

    pub fn of_hierarchy(hierarchy: &Hierarchy) -> Self {
        Self {
            dimension: Some(hierarchy.dimension().clone()),
            hierarchy: Some(hierarchy.clone()),
            level: None,
        }
    }

    pub fn of_level(level: &Level) -> Self {
        Self {
            dimension: Some(level.dimension().clone()),
            hierarchy: Some(level.hierarchy().clone()),
            level: Some(level.clone()),
        }
    }

    pub fn dimension(&self) -> Option<&Dimension> {
        self.dimension.as_ref()
    }

    pub fn hierarchy(&self) -> Option<&Hierarchy> {
        self.hierarchy.as_ref()
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    /// Same element with the level forgotten
    pub fn without_level(&self) -> Self {
        Self {
            dimension: self.dimension.clone(),
            hierarchy: self.hierarchy.clone(),
            level: None,
        }
    }

    fn uses_hierarchy(&self, hierarchy: &Hierarchy, definitely: bool) -> bool {
        match &self.hierarchy {
            Some(h) => h == hierarchy,
            None => {
                !definitely
                    && self
                        .dimension
                        .as_ref()
                        .is_none_or(|d| d == hierarchy.dimension())
            }
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(level) = &self.level {
            write!(f, "<{}>", level)
        } else if let Some(hierarchy) = &self.hierarchy {
            write!(f, "<{}>", hierarchy)
        } else if let Some(dimension) = &self.dimension {
            write!(f, "<{}>", dimension)
        } else {
            Ok(())
        }
    }
}

/// Static type of an expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Scalar value
    Scalar(ScalarKind),
    /// A member
    Member(ElementType),
    /// A tuple; one element type per position
    Tuple(Vec<ElementType>),
    /// A set of members or tuples; the boxed type is `Member` or `Tuple`
    Set(Box<Type>),
    /// A level
    Level(ElementType),
    /// A hierarchy
    Hierarchy(ElementType),
    /// A dimension
    Dimension(Option<Dimension>),
    /// No value (statements evaluated for their effect)
    Empty,
}

impl Type {
    pub const NUMERIC: Type = Type::Scalar(ScalarKind::Numeric);
    pub const INTEGER: Type = Type::Scalar(ScalarKind::INTEGER);
    pub const STRING: Type = Type::Scalar(ScalarKind::String);
    pub const BOOLEAN: Type = Type::Scalar(ScalarKind::Boolean);
    pub const DATETIME: Type = Type::Scalar(ScalarKind::DateTime);
    pub const SCALAR: Type = Type::Scalar(ScalarKind::Any);
    pub const NULL: Type = Type::Scalar(ScalarKind::Null);

    /// Member of an unknown hierarchy
    pub fn member() -> Self {
        Type::Member(ElementType::unknown())
    }

    pub fn member_of(hierarchy: &Hierarchy) -> Self {
        Type::Member(ElementType::of_hierarchy(hierarchy))
    }

    pub fn member_of_level(level: &Level) -> Self {
        Type::Member(ElementType::of_level(level))
    }

    /// Tuple over the given hierarchies
    pub fn tuple_of(hierarchies: &[Hierarchy]) -> Self {
        Type::Tuple(hierarchies.iter().map(ElementType::of_hierarchy).collect())
    }

    /// Set whose elements have the given member or tuple type
    pub fn set_of(element: Type) -> Self {
        Type::Set(Box::new(element))
    }

    /// Set of members of one hierarchy
    pub fn member_set_of(hierarchy: &Hierarchy) -> Self {
        Type::set_of(Type::member_of(hierarchy))
    }

    pub fn hierarchy() -> Self {
        Type::Hierarchy(ElementType::unknown())
    }

    pub fn hierarchy_of(hierarchy: &Hierarchy) -> Self {
        Type::Hierarchy(ElementType::of_hierarchy(hierarchy))
    }

    pub fn level_of(level: &Level) -> Self {
        Type::Level(ElementType::of_level(level))
    }

    /// Whether a value of this type always (`definitely`) or possibly
    /// involves a member of `hierarchy`
    ///
    /// With `definitely == true` this is the "pins H" test used by
    /// dependency analysis: a set of `[Gender]` members pins `[Gender]`,
    /// a numeric value pins nothing.
    pub fn uses_hierarchy(&self, hierarchy: &Hierarchy, definitely: bool) -> bool {
        match self {
            Type::Member(e) | Type::Level(e) | Type::Hierarchy(e) => {
                e.uses_hierarchy(hierarchy, definitely)
            }
            Type::Tuple(elements) => elements
                .iter()
                .any(|e| e.uses_hierarchy(hierarchy, definitely)),
            Type::Set(element) => element.uses_hierarchy(hierarchy, definitely),
            Type::Dimension(d) => {
                !definitely && d.as_ref().is_none_or(|d| d == hierarchy.dimension())
            }
            Type::Scalar(_) | Type::Empty => false,
        }
    }

    /// Number of hierarchy positions in a member, tuple or set type
    pub fn arity(&self) -> usize {
        match self {
            Type::Tuple(elements) => elements.len(),
            Type::Set(element) => element.arity(),
            _ => 1,
        }
    }

    /// Hierarchy known statically, if any
    pub fn hierarchy_hint(&self) -> Option<&Hierarchy> {
        match self {
            Type::Member(e) | Type::Level(e) | Type::Hierarchy(e) => e.hierarchy(),
            _ => None,
        }
    }

    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Type::Scalar(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Scalar(_))
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Type::Set(_))
    }

    /// Short name of the type family, used in diagnostics
    pub fn family(&self) -> &'static str {
        match self {
            Type::Scalar(_) => "Scalar",
            Type::Member(_) => "Member",
            Type::Tuple(_) => "Tuple",
            Type::Set(_) => "Set",
            Type::Level(_) => "Level",
            Type::Hierarchy(_) => "Hierarchy",
            Type::Dimension(_) => "Dimension",
            Type::Empty => "Empty",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Scalar(kind) => write!(f, "{}", kind),
            Type::Member(e) => write!(f, "MemberType{}", e),
            Type::Tuple(elements) => {
                write!(f, "TupleType<")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "MemberType{}", e)?;
                }
                write!(f, ">")
            }
            Type::Set(element) => write!(f, "SetType<{}>", element),
            Type::Level(e) => write!(f, "LevelType{}", e),
            Type::Hierarchy(e) => write!(f, "HierarchyType{}", e),
            Type::Dimension(Some(d)) => write!(f, "DimensionType<{}>", d),
            Type::Dimension(None) => write!(f, "DimensionType"),
            Type::Empty => write!(f, "EMPTY"),
        }
    }
}
