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

//! Tuple and set constructors

use std::sync::Arc;

use log::trace;

use crate::calc::{
    Calc, CalcNode, ExprCompiler, ListCalc, ListIterCalc, MemberCalc, ResultStyle, Shape,
    TupleCalc,
};
use crate::core::{Error, Result, Type};
use crate::expr::FunCall;
use crate::olap::{Evaluator, Member};
use crate::tuple::{Tuple, TupleList};

use super::{FunDef, FunctionInfo};

/// `(m1, m2, ...)`
///
/// With one argument this is plain parentheses and compiles to the
/// argument itself.
pub struct TupleFunDef;

impl FunDef for TupleFunDef {
    fn name(&self) -> &str {
        "()"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new("()", "Tuple of members, or parenthesized expression", 1, usize::MAX)
    }

    fn compile_call(&self, call: &FunCall, compiler: &mut ExprCompiler<'_>) -> Result<Calc> {
        if let [arg] = call.args.as_slice() {
            return match arg.ty() {
                Type::Member(_) => Ok(Calc::Member(compiler.compile_member(arg)?)),
                _ => compiler.compile(arg),
            };
        }
        let members = call
            .args
            .iter()
            .map(|arg| compiler.compile_member(arg))
            .collect::<Result<Vec<_>>>()?;
        Ok(Calc::Tuple(Arc::new(TupleCalcImpl::new(members, call.ty.clone()))))
    }
}

/// Builds a tuple from member calcs; no tuple if any member is null
#[derive(Debug)]
pub struct TupleCalcImpl {
    members: Vec<Arc<dyn MemberCalc>>,
    children: Vec<Calc>,
    ty: Type,
}

impl TupleCalcImpl {
    pub fn new(members: Vec<Arc<dyn MemberCalc>>, ty: Type) -> Self {
        Self {
            children: members.iter().cloned().map(Calc::Member).collect(),
            members,
            ty,
        }
    }
}

impl CalcNode for TupleCalcImpl {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn children(&self) -> &[Calc] {
        &self.children
    }

    fn name(&self) -> &'static str {
        "TupleCalc"
    }
}

impl TupleCalc for TupleCalcImpl {
    fn evaluate_tuple(&self, evaluator: &mut dyn Evaluator) -> Result<Option<Tuple>> {
        let mut tuple = Tuple::with_capacity(self.members.len());
        for calc in &self.members {
            let member = calc.evaluate_member(evaluator)?;
            if member.is_null() {
                return Ok(None);
            }
            tuple.push(member);
        }
        Ok(Some(tuple))
    }
}

/// `{e1, e2, ...}` where each element is a member, a tuple or a set
///
/// Compiles to a list when the ambient styles accept one, and to an
/// iterable over that list otherwise.
pub struct SetFunDef;

impl FunDef for SetFunDef {
    fn name(&self) -> &str {
        "{}"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new("{}", "Set of members, tuples or sets", 0, usize::MAX)
    }

    fn compile_call(&self, call: &FunCall, compiler: &mut ExprCompiler<'_>) -> Result<Calc> {
        let mut elements = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            let element = match arg.ty() {
                Type::Member(_) | Type::Hierarchy(_) | Type::Dimension(_) => {
                    Calc::Member(compiler.compile_member(arg)?)
                }
                Type::Tuple(_) => Calc::Tuple(compiler.compile_tuple(arg)?),
                Type::Set(_) => Calc::List(compiler.compile_list(arg, false)?),
                other => {
                    return Err(Error::invalid_argument(format!(
                        "set element {} has type {}",
                        arg, other
                    )))
                }
            };
            elements.push(element);
        }
        let set = Arc::new(SetCalc::new(elements, call.ty.clone()));

        let style = compiler.choose_style(&[
            ResultStyle::MutableList,
            ResultStyle::List,
            ResultStyle::Iterable,
        ]);
        trace!("set {} compiled as {:?}", call, style);
        match style {
            Some(ResultStyle::Iterable) => Ok(Calc::Iter(Arc::new(ListIterCalc::new(set)))),
            _ => Ok(Calc::List(set)),
        }
    }
}

/// Evaluates set elements into a fresh list
///
/// Null members, and tuples containing one, are left out.
#[derive(Debug)]
pub struct SetCalc {
    children: Vec<Calc>,
    arity: usize,
    ty: Type,
}

impl SetCalc {
    /// `children` must be member, tuple or list calcs
    pub fn new(children: Vec<Calc>, ty: Type) -> Self {
        Self {
            arity: ty.arity().max(1),
            children,
            ty,
        }
    }
}

impl CalcNode for SetCalc {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn children(&self) -> &[Calc] {
        &self.children
    }

    fn result_style(&self) -> ResultStyle {
        ResultStyle::MutableList
    }

    fn name(&self) -> &'static str {
        "SetCalc"
    }
}

impl ListCalc for SetCalc {
    fn evaluate_list(&self, evaluator: &mut dyn Evaluator) -> Result<Option<TupleList>> {
        let mut list = TupleList::with_capacity(self.arity, self.children.len());
        for child in &self.children {
            match child {
                Calc::Member(calc) => {
                    let member = calc.evaluate_member(evaluator)?;
                    if !member.is_null() {
                        list.add_tuple(std::slice::from_ref(&member))?;
                    }
                }
                Calc::Tuple(calc) => {
                    if let Some(tuple) = calc.evaluate_tuple(evaluator)? {
                        if !tuple.iter().any(Member::is_null) {
                            list.add_tuple(&tuple)?;
                        }
                    }
                }
                Calc::List(calc) => {
                    if let Some(other) = calc.evaluate_list(evaluator)? {
                        list.add_all(&other)?;
                    }
                }
                other => return Err(other.shape_mismatch(Shape::List)),
            }
        }
        Ok(Some(list))
    }
}
