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

//! Structural navigation: current member, and the hierarchy, dimension and
//! level of an element

use std::sync::Arc;

use crate::calc::{
    any_depends, Calc, CalcNode, DimensionCalc, ExprCompiler, HierarchyCalc, LevelCalc,
    MemberCalc,
};
use crate::core::{ElementType, Error, Result, Type};
use crate::expr::{Expr, FunCall};
use crate::olap::{Dimension, Evaluator, Hierarchy, Level, Member};

use super::{FunDef, FunctionInfo};

/// Element type carried by a member, level, hierarchy or dimension type
fn element_of(ty: &Type) -> ElementType {
    match ty {
        Type::Member(e) | Type::Level(e) | Type::Hierarchy(e) => e.clone(),
        Type::Dimension(Some(d)) => ElementType::of_dimension(d),
        _ => ElementType::unknown(),
    }
}

fn only_arg(call: &FunCall) -> Result<&Expr> {
    call.arg(0)
        .ok_or_else(|| Error::invalid_argument_count(&call.name, "1", call.args.len()))
}

fn unexpected_arg(call: &FunCall, arg: &Expr) -> Error {
    Error::invalid_argument(format!(
        "{} does not accept a {} argument",
        call.name,
        arg.ty().family()
    ))
}

// ============================================================================
// Function definitions
// ============================================================================

/// `<Hierarchy>.CurrentMember`, `<Dimension>.CurrentMember`
pub struct CurrentMemberFunDef;

impl FunDef for CurrentMemberFunDef {
    fn name(&self) -> &str {
        "CurrentMember"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "CurrentMember",
            "Current member of a hierarchy in the evaluation context",
            1,
            1,
        )
    }

    fn compile_call(&self, call: &FunCall, compiler: &mut ExprCompiler<'_>) -> Result<Calc> {
        let arg = only_arg(call)?;
        match arg.ty() {
            Type::Hierarchy(_) | Type::Dimension(_) => {
                Ok(Calc::Member(compiler.compile_member(arg)?))
            }
            _ => Err(unexpected_arg(call, arg)),
        }
    }
}

/// `<Member>.Hierarchy`, `<Level>.Hierarchy`, `<Dimension>.Hierarchy`
pub struct HierarchyFunDef;

impl FunDef for HierarchyFunDef {
    fn name(&self) -> &str {
        "Hierarchy"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new("Hierarchy", "Hierarchy an element belongs to", 1, 1)
    }

    fn compile_call(&self, call: &FunCall, compiler: &mut ExprCompiler<'_>) -> Result<Calc> {
        let arg = only_arg(call)?;
        match arg.ty() {
            Type::Member(_) | Type::Level(_) | Type::Dimension(_) => {
                Ok(Calc::Hierarchy(compiler.compile_hierarchy(arg)?))
            }
            _ => Err(unexpected_arg(call, arg)),
        }
    }
}

/// `<Member>.Dimension`, `<Level>.Dimension`, `<Hierarchy>.Dimension`
pub struct DimensionFunDef;

impl FunDef for DimensionFunDef {
    fn name(&self) -> &str {
        "Dimension"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new("Dimension", "Dimension an element belongs to", 1, 1)
    }

    fn compile_call(&self, call: &FunCall, compiler: &mut ExprCompiler<'_>) -> Result<Calc> {
        let arg = only_arg(call)?;
        match arg.ty() {
            Type::Member(_) | Type::Level(_) | Type::Hierarchy(_) => {
                Ok(Calc::Dimension(compiler.compile_dimension(arg)?))
            }
            _ => Err(unexpected_arg(call, arg)),
        }
    }
}

/// `<Member>.Level`
pub struct LevelFunDef;

impl FunDef for LevelFunDef {
    fn name(&self) -> &str {
        "Level"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new("Level", "Level of a member", 1, 1)
    }

    fn compile_call(&self, call: &FunCall, compiler: &mut ExprCompiler<'_>) -> Result<Calc> {
        let arg = only_arg(call)?;
        match arg.ty() {
            Type::Member(_) => Ok(Calc::Level(compiler.compile_level(arg)?)),
            _ => Err(unexpected_arg(call, arg)),
        }
    }
}

// ============================================================================
// Calcs
// ============================================================================

/// Current member of a hierarchy
///
/// Depends on every hierarchy the hierarchy expression might denote.
#[derive(Debug)]
pub struct HierarchyCurrentMemberCalc {
    hierarchy: Arc<dyn HierarchyCalc>,
    children: [Calc; 1],
    ty: Type,
}

impl HierarchyCurrentMemberCalc {
    pub fn new(hierarchy: Arc<dyn HierarchyCalc>) -> Self {
        let ty = Type::Member(element_of(hierarchy.ty()).without_level());
        Self {
            children: [Calc::Hierarchy(hierarchy.clone())],
            hierarchy,
            ty,
        }
    }
}

impl CalcNode for HierarchyCurrentMemberCalc {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn children(&self) -> &[Calc] {
        &self.children
    }

    fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        self.hierarchy.ty().uses_hierarchy(hierarchy, false)
            || any_depends(&self.children, hierarchy)
    }

    fn name(&self) -> &'static str {
        "HierarchyCurrentMemberCalc"
    }
}

impl MemberCalc for HierarchyCurrentMemberCalc {
    fn evaluate_member(&self, evaluator: &mut dyn Evaluator) -> Result<Member> {
        match self.hierarchy.evaluate_hierarchy(evaluator)? {
            Some(hierarchy) => Ok(evaluator.current_member(&hierarchy)),
            None => Err(Error::evaluation("CurrentMember of a null hierarchy")),
        }
    }
}

/// Current member of a dimension's default hierarchy
#[derive(Debug)]
pub struct DimensionCurrentMemberCalc {
    dimension: Arc<dyn DimensionCalc>,
    children: [Calc; 1],
    ty: Type,
}

impl DimensionCurrentMemberCalc {
    pub fn new(dimension: Arc<dyn DimensionCalc>) -> Self {
        let ty = Type::Member(element_of(dimension.ty()));
        Self {
            children: [Calc::Dimension(dimension.clone())],
            dimension,
            ty,
        }
    }
}

impl CalcNode for DimensionCurrentMemberCalc {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn children(&self) -> &[Calc] {
        &self.children
    }

    fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        self.dimension.ty().uses_hierarchy(hierarchy, false)
            || any_depends(&self.children, hierarchy)
    }

    fn name(&self) -> &'static str {
        "DimensionCurrentMemberCalc"
    }
}

impl MemberCalc for DimensionCurrentMemberCalc {
    fn evaluate_member(&self, evaluator: &mut dyn Evaluator) -> Result<Member> {
        let Some(dimension) = self.dimension.evaluate_dimension(evaluator)? else {
            return Err(Error::evaluation("CurrentMember of a null dimension"));
        };
        match evaluator.dimension_hierarchy(&dimension) {
            Some(hierarchy) => Ok(evaluator.current_member(&hierarchy)),
            None => Err(Error::evaluation(format!(
                "dimension {} has no hierarchy in this cube",
                dimension
            ))),
        }
    }
}

/// Defines a calc mapping one element to another through a getter
macro_rules! navigation_calc {
    (
        $(#[$meta:meta])*
        $name:ident, $input:ident, $variant:ident, $eval_in:ident,
        $shape:ident, $eval_out:ident, $out:ty,
        |$ty:ident| $make_ty:expr,
        |$value:ident| $get:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name {
            input: Arc<dyn $input>,
            children: [Calc; 1],
            ty: Type,
        }

        impl $name {
            pub fn new(input: Arc<dyn $input>) -> Self {
                let $ty = element_of(input.ty());
                Self {
                    children: [Calc::$variant(input.clone())],
                    input,
                    ty: $make_ty,
                }
            }
        }

        impl CalcNode for $name {
            fn ty(&self) -> &Type {
                &self.ty
            }

            fn children(&self) -> &[Calc] {
                &self.children
            }

            fn name(&self) -> &'static str {
                stringify!($name)
            }
        }

        impl $shape for $name {
            fn $eval_out(&self, evaluator: &mut dyn Evaluator) -> Result<Option<$out>> {
                Ok(self.input.$eval_in(evaluator)?.and_then(|$value| $get))
            }
        }
    };
}

navigation_calc!(
    /// Hierarchy of a level
    LevelHierarchyCalc, LevelCalc, Level, evaluate_level,
    HierarchyCalc, evaluate_hierarchy, Hierarchy,
    |e| Type::Hierarchy(e.without_level()),
    |level| Some(level.hierarchy().clone())
);

navigation_calc!(
    /// Dimension of a level
    LevelDimensionCalc, LevelCalc, Level, evaluate_level,
    DimensionCalc, evaluate_dimension, Dimension,
    |e| Type::Dimension(e.dimension().cloned()),
    |level| Some(level.dimension().clone())
);

navigation_calc!(
    /// Dimension of a hierarchy
    HierarchyDimensionCalc, HierarchyCalc, Hierarchy, evaluate_hierarchy,
    DimensionCalc, evaluate_dimension, Dimension,
    |e| Type::Dimension(e.dimension().cloned()),
    |hierarchy| Some(hierarchy.dimension().clone())
);

/// Member calcs evaluate to a member, not an `Option`; wrap so the
/// navigation macro can treat every input alike
trait OptionalMember {
    fn evaluate_optional_member(&self, evaluator: &mut dyn Evaluator) -> Result<Option<Member>>;
}

impl<T: MemberCalc + ?Sized> OptionalMember for T {
    fn evaluate_optional_member(&self, evaluator: &mut dyn Evaluator) -> Result<Option<Member>> {
        self.evaluate_member(evaluator).map(Some)
    }
}

navigation_calc!(
    /// Hierarchy of a member; the null member still has one
    MemberHierarchyCalc, MemberCalc, Member, evaluate_optional_member,
    HierarchyCalc, evaluate_hierarchy, Hierarchy,
    |e| Type::Hierarchy(e.without_level()),
    |member| Some(member.hierarchy().clone())
);

navigation_calc!(
    /// Dimension of a member
    MemberDimensionCalc, MemberCalc, Member, evaluate_optional_member,
    DimensionCalc, evaluate_dimension, Dimension,
    |e| Type::Dimension(e.dimension().cloned()),
    |member| Some(member.dimension().clone())
);

navigation_calc!(
    /// Level of a member; none for the null member
    MemberLevelCalc, MemberCalc, Member, evaluate_optional_member,
    LevelCalc, evaluate_level, Level,
    |e| Type::Level(e),
    |member| member.level().cloned()
);
