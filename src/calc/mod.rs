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

//! Compiled calculations
//!
//! A [`Calc`] is an immutable, compiled expression node. It is built once by
//! the [`ExprCompiler`] and evaluated any number of times, by any number of
//! threads, each against its own [`Evaluator`].
//!
//! # Shapes
//!
//! Every calc has exactly one native shape, the variant of [`Calc`] it is
//! wrapped in. Each shape trait carries one strongly-typed accessor:
//!
//! | Shape | Trait | Accessor result |
//! |---|---|---|
//! | boolean | [`BooleanCalc`] | `bool` (null reads as false) |
//! | double | [`DoubleCalc`] | `Option<f64>` |
//! | integer | [`IntegerCalc`] | `Option<i64>` |
//! | string | [`StringCalc`] | `Option<Arc<str>>` |
//! | datetime | [`DateTimeCalc`] | `Option<DateTime<Utc>>` |
//! | member | [`MemberCalc`] | [`Member`]; the null member for "no member" |
//! | tuple | [`TupleCalc`] | `Option<Tuple>` |
//! | level, hierarchy, dimension | [`LevelCalc`], ... | `Option<_>` |
//! | list | [`ListCalc`] | `Option<TupleList>` |
//! | iterable | [`IterCalc`] | `Option<Arc<dyn TupleIterable>>` |
//! | generic | [`GenericCalc`] | [`Value`] |
//! | void | [`VoidCalc`] | `()` |
//!
//! Leaf calcs that produce a single canonical value implement only
//! [`GenericCalc`]; the compiler reaches their value through a
//! [`GenericAccessor`] when a specific shape is required.
//!
//! [`Evaluator`]: crate::olap::Evaluator

mod adapter;
mod compiler;
mod constant;
mod dependency;
mod generic;
mod parameter;
mod result_style;
mod value;
mod writer;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::{Error, Result, Type, Value};
use crate::olap::{Dimension, Evaluator, Hierarchy, Level, Member};
use crate::tuple::{Tuple, TupleIterable, TupleList};

pub use adapter::{
    CopyListCalc, DoubleToIntegerCalc, DrainIterCalc, IntegerToDoubleCalc, ListIterCalc,
    NumericBooleanCalc,
};
pub use compiler::ExprCompiler;
pub use constant::ConstantCalc;
pub use dependency::{any_depends, any_depends_but_first, but_depends, simplify_context};
pub use generic::GenericAccessor;
pub use parameter::{ParameterCalc, ParameterSlot};
pub use result_style::ResultStyle;
pub use value::{MemberArrayValueCalc, MemberValueCalc, TupleValueCalc, ValueCalc};
pub use writer::{explain, CalcWriter};

/// Behaviour shared by every calc, whatever its shape
pub trait CalcNode: Send + Sync + fmt::Debug {
    /// Static type of the value this calc produces
    fn ty(&self) -> &Type;

    /// Child calcs, in argument order
    fn children(&self) -> &[Calc] {
        &[]
    }

    /// Native runtime representation of the result
    fn result_style(&self) -> ResultStyle {
        ResultStyle::Value
    }

    /// Whether the result can change when the current member of
    /// `hierarchy` changes
    fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        any_depends(self.children(), hierarchy)
    }

    /// Display name, used by [`CalcWriter`]
    fn name(&self) -> &'static str;
}

pub trait BooleanCalc: CalcNode {
    /// Null evaluates to false
    fn evaluate_boolean(&self, evaluator: &mut dyn Evaluator) -> Result<bool>;
}

pub trait DoubleCalc: CalcNode {
    fn evaluate_double(&self, evaluator: &mut dyn Evaluator) -> Result<Option<f64>>;
}

pub trait IntegerCalc: CalcNode {
    fn evaluate_integer(&self, evaluator: &mut dyn Evaluator) -> Result<Option<i64>>;
}

pub trait StringCalc: CalcNode {
    fn evaluate_string(&self, evaluator: &mut dyn Evaluator) -> Result<Option<Arc<str>>>;
}

pub trait DateTimeCalc: CalcNode {
    fn evaluate_datetime(&self, evaluator: &mut dyn Evaluator) -> Result<Option<DateTime<Utc>>>;
}

pub trait MemberCalc: CalcNode {
    /// Returns the hierarchy's null member when there is no member
    fn evaluate_member(&self, evaluator: &mut dyn Evaluator) -> Result<Member>;
}

pub trait TupleCalc: CalcNode {
    fn evaluate_tuple(&self, evaluator: &mut dyn Evaluator) -> Result<Option<Tuple>>;
}

pub trait LevelCalc: CalcNode {
    fn evaluate_level(&self, evaluator: &mut dyn Evaluator) -> Result<Option<Level>>;
}

pub trait HierarchyCalc: CalcNode {
    fn evaluate_hierarchy(&self, evaluator: &mut dyn Evaluator) -> Result<Option<Hierarchy>>;
}

pub trait DimensionCalc: CalcNode {
    fn evaluate_dimension(&self, evaluator: &mut dyn Evaluator) -> Result<Option<Dimension>>;
}

/// Set producer with random access
///
/// A calc whose result style is [`ResultStyle::MutableList`] hands out a
/// list the caller may mutate; any other list must be treated as shared.
pub trait ListCalc: CalcNode {
    fn evaluate_list(&self, evaluator: &mut dyn Evaluator) -> Result<Option<TupleList>>;
}

/// Set producer that can only be traversed
pub trait IterCalc: CalcNode {
    fn evaluate_iterable(
        &self,
        evaluator: &mut dyn Evaluator,
    ) -> Result<Option<Arc<dyn TupleIterable>>>;
}

/// Calc producing one canonical [`Value`]
pub trait GenericCalc: CalcNode {
    fn evaluate(&self, evaluator: &mut dyn Evaluator) -> Result<Value>;
}

/// Calc evaluated for its effect only
pub trait VoidCalc: CalcNode {
    fn evaluate_void(&self, evaluator: &mut dyn Evaluator) -> Result<()>;
}

/// Native shape of a [`Calc`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Boolean,
    Double,
    Integer,
    String,
    DateTime,
    Member,
    Tuple,
    Level,
    Hierarchy,
    Dimension,
    List,
    Iterable,
    Generic,
    Void,
}

impl Shape {
    /// Name of the shape trait
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Boolean => "BooleanCalc",
            Shape::Double => "DoubleCalc",
            Shape::Integer => "IntegerCalc",
            Shape::String => "StringCalc",
            Shape::DateTime => "DateTimeCalc",
            Shape::Member => "MemberCalc",
            Shape::Tuple => "TupleCalc",
            Shape::Level => "LevelCalc",
            Shape::Hierarchy => "HierarchyCalc",
            Shape::Dimension => "DimensionCalc",
            Shape::List => "ListCalc",
            Shape::Iterable => "IterCalc",
            Shape::Generic => "GenericCalc",
            Shape::Void => "VoidCalc",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled expression, tagged with its native shape
///
/// Cloning is O(1); clones share the same immutable node.
#[derive(Clone, Debug)]
pub enum Calc {
    Boolean(Arc<dyn BooleanCalc>),
    Double(Arc<dyn DoubleCalc>),
    Integer(Arc<dyn IntegerCalc>),
    String(Arc<dyn StringCalc>),
    DateTime(Arc<dyn DateTimeCalc>),
    Member(Arc<dyn MemberCalc>),
    Tuple(Arc<dyn TupleCalc>),
    Level(Arc<dyn LevelCalc>),
    Hierarchy(Arc<dyn HierarchyCalc>),
    Dimension(Arc<dyn DimensionCalc>),
    List(Arc<dyn ListCalc>),
    Iter(Arc<dyn IterCalc>),
    Generic(Arc<dyn GenericCalc>),
    Void(Arc<dyn VoidCalc>),
}

/// Forwards a [`CalcNode`] method to whichever variant is present
macro_rules! dispatch {
    ($calc:expr, $node:ident => $body:expr) => {
        match $calc {
            Calc::Boolean($node) => $body,
            Calc::Double($node) => $body,
            Calc::Integer($node) => $body,
            Calc::String($node) => $body,
            Calc::DateTime($node) => $body,
            Calc::Member($node) => $body,
            Calc::Tuple($node) => $body,
            Calc::Level($node) => $body,
            Calc::Hierarchy($node) => $body,
            Calc::Dimension($node) => $body,
            Calc::List($node) => $body,
            Calc::Iter($node) => $body,
            Calc::Generic($node) => $body,
            Calc::Void($node) => $body,
        }
    };
}

impl Calc {
    pub fn shape(&self) -> Shape {
        match self {
            Calc::Boolean(_) => Shape::Boolean,
            Calc::Double(_) => Shape::Double,
            Calc::Integer(_) => Shape::Integer,
            Calc::String(_) => Shape::String,
            Calc::DateTime(_) => Shape::DateTime,
            Calc::Member(_) => Shape::Member,
            Calc::Tuple(_) => Shape::Tuple,
            Calc::Level(_) => Shape::Level,
            Calc::Hierarchy(_) => Shape::Hierarchy,
            Calc::Dimension(_) => Shape::Dimension,
            Calc::List(_) => Shape::List,
            Calc::Iter(_) => Shape::Iterable,
            Calc::Generic(_) => Shape::Generic,
            Calc::Void(_) => Shape::Void,
        }
    }

    pub fn ty(&self) -> &Type {
        dispatch!(self, node => node.ty())
    }

    pub fn children(&self) -> &[Calc] {
        dispatch!(self, node => node.children())
    }

    pub fn result_style(&self) -> ResultStyle {
        dispatch!(self, node => node.result_style())
    }

    pub fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        dispatch!(self, node => node.depends_on(hierarchy))
    }

    pub fn name(&self) -> &'static str {
        dispatch!(self, node => node.name())
    }

    /// Evaluates through the native accessor and boxes the result
    pub fn evaluate(&self, evaluator: &mut dyn Evaluator) -> Result<Value> {
        Ok(match self {
            Calc::Boolean(c) => Value::Boolean(c.evaluate_boolean(evaluator)?),
            Calc::Double(c) => Value::from_double(c.evaluate_double(evaluator)?),
            Calc::Integer(c) => Value::from_integer(c.evaluate_integer(evaluator)?),
            Calc::String(c) => c
                .evaluate_string(evaluator)?
                .map_or(Value::Null, Value::String),
            Calc::DateTime(c) => c
                .evaluate_datetime(evaluator)?
                .map_or(Value::Null, Value::DateTime),
            Calc::Member(c) => Value::Member(c.evaluate_member(evaluator)?),
            Calc::Tuple(c) => c.evaluate_tuple(evaluator)?.map_or(Value::Null, Value::Tuple),
            Calc::Level(c) => c.evaluate_level(evaluator)?.map_or(Value::Null, Value::Level),
            Calc::Hierarchy(c) => c
                .evaluate_hierarchy(evaluator)?
                .map_or(Value::Null, Value::Hierarchy),
            Calc::Dimension(c) => c
                .evaluate_dimension(evaluator)?
                .map_or(Value::Null, Value::Dimension),
            Calc::List(c) => c.evaluate_list(evaluator)?.map_or(Value::Null, Value::List),
            Calc::Iter(c) => c
                .evaluate_iterable(evaluator)?
                .map_or(Value::Null, Value::Iterable),
            Calc::Generic(c) => c.evaluate(evaluator)?,
            Calc::Void(c) => {
                c.evaluate_void(evaluator)?;
                Value::Null
            }
        })
    }

    /// The fail-fast error for asking this calc for an unsupported shape
    pub fn shape_mismatch(&self, expected: Shape) -> Error {
        Error::shape_mismatch(
            expected.as_str(),
            format!("{} ({})", self.shape(), self.ty()),
            self.name(),
        )
    }

    /// Whether this calc's static type guarantees a member of `hierarchy`
    pub fn pins(&self, hierarchy: &Hierarchy) -> bool {
        self.ty().uses_hierarchy(hierarchy, true)
    }
}

impl fmt::Display for Calc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<{}>", self.name(), self.ty())
    }
}
