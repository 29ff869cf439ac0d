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

//! Runtime values
//!
//! [`Value`] is what the generic `evaluate` accessor of any calc returns. The
//! strongly-typed accessors (`evaluate_double`, `evaluate_member`, ...) avoid
//! it on hot paths; it exists for leaf calcs that produce one canonical value
//! and for the boundary to code outside the calc tree.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::olap::{Dimension, Hierarchy, Level, Member};
use crate::tuple::{Tuple, TupleIterable, TupleList};

/// A runtime value of any expression shape
///
/// Text uses `Arc<str>` so that constants can be handed out per evaluation
/// without copying the string.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absence of a value
    Null,

    Boolean(bool),

    /// 64-bit signed integer
    Integer(i64),

    /// 64-bit floating point
    Double(f64),

    /// UTF-8 string
    String(Arc<str>),

    /// Timestamp (UTC)
    DateTime(DateTime<Utc>),

    Member(Member),

    Tuple(Tuple),

    Level(Level),

    Hierarchy(Hierarchy),

    Dimension(Dimension),

    /// A materialized set
    List(TupleList),

    /// A set that can only be traversed
    Iterable(Arc<dyn TupleIterable>),
}

impl Value {
    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn integer(value: i64) -> Self {
        Value::Integer(value)
    }

    pub fn double(value: f64) -> Self {
        Value::Double(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Value::String(Arc::from(value.into().as_str()))
    }

    pub fn boolean(value: bool) -> Self {
        Value::Boolean(value)
    }

    /// Wrap an optional double, mapping `None` to [`Value::Null`]
    #[inline]
    pub fn from_double(value: Option<f64>) -> Self {
        value.map_or(Value::Null, Value::Double)
    }

    /// Wrap an optional integer, mapping `None` to [`Value::Null`]
    #[inline]
    pub fn from_integer(value: Option<i64>) -> Self {
        value.map_or(Value::Null, Value::Integer)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// True for [`Value::Null`] and for the null member
    #[inline]
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Member(m) => m.is_null(),
            _ => false,
        }
    }

    /// Numeric view; `None` for null and non-numeric values
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Integer view; doubles truncate toward zero
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Double(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<&Member> {
        match self {
            Value::Member(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&TupleList> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// Name of the runtime kind, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::Member(_) => "member",
            Value::Tuple(_) => "tuple",
            Value::Level(_) => "level",
            Value::Hierarchy(_) => "hierarchy",
            Value::Dimension(_) => "dimension",
            Value::List(_) => "list",
            Value::Iterable(_) => "iterable",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::DateTime(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Member(m) => write!(f, "{}", m),
            Value::Tuple(t) => {
                write!(f, "(")?;
                for (i, m) in t.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", m)?;
                }
                write!(f, ")")
            }
            Value::Level(l) => write!(f, "{}", l),
            Value::Hierarchy(h) => write!(f, "{}", h),
            Value::Dimension(d) => write!(f, "{}", d),
            Value::List(list) => write!(f, "{{{} tuple(s)}}", list.len()),
            Value::Iterable(it) => write!(f, "{{iterable, arity {}}}", it.arity()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Integer(i), Value::Double(d)) | (Value::Double(d), Value::Integer(i)) => {
                *d == *i as f64
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Member(a), Value::Member(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Level(a), Value::Level(b)) => a == b,
            (Value::Hierarchy(a), Value::Hierarchy(b)) => a == b,
            (Value::Dimension(a), Value::Dimension(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Iterable(a), Value::Iterable(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(Arc::from(v))
    }
}

impl From<Member> for Value {
    fn from(m: Member) -> Self {
        Value::Member(m)
    }
}

impl From<TupleList> for Value {
    fn from(list: TupleList) -> Self {
        Value::List(list)
    }
}
