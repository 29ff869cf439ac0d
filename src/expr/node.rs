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

use std::fmt;
use std::sync::Arc;

use crate::core::{Type, Value};
use crate::olap::{Dimension, Hierarchy, Level, Member};

/// A node of a typed expression tree
#[derive(Debug, Clone)]
pub enum Expr {
    /// Scalar constant
    Literal { value: Value, ty: Type },

    /// Member reference, e.g. `[Gender].[F]` or `[Measures].[Unit Sales]`
    Member(Member),

    Level(Level),

    Hierarchy(Hierarchy),

    Dimension(Dimension),

    /// Query parameter
    Parameter(Arc<Parameter>),

    /// Function or operator application
    Call(Arc<FunCall>),
}

impl Expr {
    /// Literal whose type is inferred from the value
    pub fn literal(value: impl Into<Value>) -> Self {
        let value = value.into();
        let ty = match &value {
            Value::Double(_) => Type::NUMERIC,
            Value::Integer(_) => Type::INTEGER,
            Value::String(_) => Type::STRING,
            Value::Boolean(_) => Type::BOOLEAN,
            Value::DateTime(_) => Type::DATETIME,
            Value::Null => Type::NULL,
            _ => Type::SCALAR,
        };
        Expr::Literal { value, ty }
    }

    /// Literal with an explicit type
    pub fn typed_literal(value: Value, ty: Type) -> Self {
        Expr::Literal { value, ty }
    }

    pub fn member(member: &Member) -> Self {
        Expr::Member(member.clone())
    }

    pub fn level(level: &Level) -> Self {
        Expr::Level(level.clone())
    }

    pub fn hierarchy(hierarchy: &Hierarchy) -> Self {
        Expr::Hierarchy(hierarchy.clone())
    }

    pub fn dimension(dimension: &Dimension) -> Self {
        Expr::Dimension(dimension.clone())
    }

    pub fn parameter(parameter: Parameter) -> Self {
        Expr::Parameter(Arc::new(parameter))
    }

    /// Function call with a declared result type
    pub fn call(name: &str, args: Vec<Expr>, ty: Type) -> Self {
        Expr::Call(Arc::new(FunCall {
            name: name.to_string(),
            args,
            ty,
        }))
    }

    /// Static type of the node
    pub fn ty(&self) -> Type {
        match self {
            Expr::Literal { ty, .. } => ty.clone(),
            Expr::Member(m) => match m.level() {
                Some(level) => Type::member_of_level(level),
                None => Type::member_of(m.hierarchy()),
            },
            Expr::Level(l) => Type::level_of(l),
            Expr::Hierarchy(h) => Type::hierarchy_of(h),
            Expr::Dimension(d) => Type::Dimension(Some(d.clone())),
            Expr::Parameter(p) => p.ty.clone(),
            Expr::Call(call) => call.ty.clone(),
        }
    }

    /// The call node, if this is one
    pub fn as_call(&self) -> Option<&FunCall> {
        match self {
            Expr::Call(call) => Some(call),
            _ => None,
        }
    }

    /// True for nodes whose value never depends on the evaluation context
    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            Expr::Literal { .. }
                | Expr::Member(_)
                | Expr::Level(_)
                | Expr::Hierarchy(_)
                | Expr::Dimension(_)
        )
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal { value, .. } => match value {
                Value::String(s) => write!(f, "'{}'", s),
                other => write!(f, "{}", other),
            },
            Expr::Member(m) => write!(f, "{}", m),
            Expr::Level(l) => write!(f, "{}", l),
            Expr::Hierarchy(h) => write!(f, "{}", h),
            Expr::Dimension(d) => write!(f, "{}", d),
            Expr::Parameter(p) => write!(f, "Parameter({})", p.name),
            Expr::Call(call) => write!(f, "{}", call),
        }
    }
}

impl From<Member> for Expr {
    fn from(m: Member) -> Self {
        Expr::Member(m)
    }
}

/// Application of a named function to argument expressions
#[derive(Debug, Clone)]
pub struct FunCall {
    pub name: String,
    pub args: Vec<Expr>,
    /// Declared result type
    pub ty: Type,
}

impl FunCall {
    pub fn arg(&self, index: usize) -> Option<&Expr> {
        self.args.get(index)
    }

    /// Tuple constructor whose arguments are all plain member-typed nodes
    pub fn is_member_tuple(&self) -> bool {
        self.name == "()"
            && self.args.len() > 1
            && self.args.iter().all(|a| matches!(a.ty(), Type::Member(_)))
    }
}

impl fmt::Display for FunCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (open, close) = match self.name.as_str() {
            "()" => ("(", ")"),
            "{}" => ("{", "}"),
            _ => {
                write!(f, "{}", self.name)?;
                ("(", ")")
            }
        };
        write!(f, "{}", open)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, "{}", close)
    }
}

/// A named query parameter with a default value expression
///
/// Two parameter nodes with the same name denote the same parameter; the
/// compiler registers each name once.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: Arc<str>,
    pub ty: Type,
    pub default: Expr,
}

impl Parameter {
    pub fn new(name: &str, ty: Type, default: Expr) -> Self {
        Self {
            name: Arc::from(name),
            ty,
            default,
        }
    }
}
