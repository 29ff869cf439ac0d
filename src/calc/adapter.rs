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

//! Shape adapters inserted by the compiler
//!
//! Each adapter wraps exactly one child and forwards nulls untouched.

use std::sync::Arc;

use crate::core::{Result, Type};
use crate::olap::Evaluator;
use crate::tuple::{materialize, TupleIterable, TupleList};

use super::{
    BooleanCalc, Calc, CalcNode, DoubleCalc, IntegerCalc, IterCalc, ListCalc, ResultStyle,
    Shape,
};

/// Boolean view of a numeric calc: `value != 0`, null is false
#[derive(Debug)]
pub struct NumericBooleanCalc {
    ty: Type,
    children: [Calc; 1],
}

impl NumericBooleanCalc {
    pub fn from_double(calc: Arc<dyn DoubleCalc>) -> Self {
        Self {
            ty: Type::BOOLEAN,
            children: [Calc::Double(calc)],
        }
    }

    pub fn from_integer(calc: Arc<dyn IntegerCalc>) -> Self {
        Self {
            ty: Type::BOOLEAN,
            children: [Calc::Integer(calc)],
        }
    }
}

impl CalcNode for NumericBooleanCalc {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn children(&self) -> &[Calc] {
        &self.children
    }

    fn name(&self) -> &'static str {
        "NumericBooleanCalc"
    }
}

impl BooleanCalc for NumericBooleanCalc {
    fn evaluate_boolean(&self, evaluator: &mut dyn Evaluator) -> Result<bool> {
        Ok(match &self.children[0] {
            Calc::Double(calc) => calc.evaluate_double(evaluator)?.is_some_and(|v| v != 0.0),
            Calc::Integer(calc) => calc.evaluate_integer(evaluator)?.is_some_and(|v| v != 0),
            other => return Err(other.shape_mismatch(Shape::Double)),
        })
    }
}

/// Double view of an integer calc
#[derive(Debug)]
pub struct IntegerToDoubleCalc {
    integer: Arc<dyn IntegerCalc>,
    ty: Type,
    children: [Calc; 1],
}

impl IntegerToDoubleCalc {
    pub fn new(integer: Arc<dyn IntegerCalc>) -> Self {
        Self {
            children: [Calc::Integer(integer.clone())],
            integer,
            ty: Type::NUMERIC,
        }
    }
}

impl CalcNode for IntegerToDoubleCalc {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn children(&self) -> &[Calc] {
        &self.children
    }

    fn name(&self) -> &'static str {
        "IntegerToDoubleCalc"
    }
}

impl DoubleCalc for IntegerToDoubleCalc {
    #[inline]
    fn evaluate_double(&self, evaluator: &mut dyn Evaluator) -> Result<Option<f64>> {
        Ok(self.integer.evaluate_integer(evaluator)?.map(|v| v as f64))
    }
}

/// Integer view of a double calc; truncates toward zero
#[derive(Debug)]
pub struct DoubleToIntegerCalc {
    double: Arc<dyn DoubleCalc>,
    ty: Type,
    children: [Calc; 1],
}

impl DoubleToIntegerCalc {
    pub fn new(double: Arc<dyn DoubleCalc>) -> Self {
        Self {
            children: [Calc::Double(double.clone())],
            double,
            ty: Type::INTEGER,
        }
    }
}

impl CalcNode for DoubleToIntegerCalc {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn children(&self) -> &[Calc] {
        &self.children
    }

    fn name(&self) -> &'static str {
        "DoubleToIntegerCalc"
    }
}

impl IntegerCalc for DoubleToIntegerCalc {
    #[inline]
    fn evaluate_integer(&self, evaluator: &mut dyn Evaluator) -> Result<Option<i64>> {
        Ok(self.double.evaluate_double(evaluator)?.map(|v| v as i64))
    }
}

/// List from an iterable-only producer
///
/// Drains the iterable into a fresh list on every evaluation; nothing is
/// cached across evaluations.
#[derive(Debug)]
pub struct DrainIterCalc {
    iter: Arc<dyn IterCalc>,
    children: [Calc; 1],
}

impl DrainIterCalc {
    pub fn new(iter: Arc<dyn IterCalc>) -> Self {
        Self {
            children: [Calc::Iter(iter.clone())],
            iter,
        }
    }
}

impl CalcNode for DrainIterCalc {
    fn ty(&self) -> &Type {
        self.iter.ty()
    }

    fn children(&self) -> &[Calc] {
        &self.children
    }

    fn result_style(&self) -> ResultStyle {
        ResultStyle::MutableList
    }

    fn name(&self) -> &'static str {
        "DrainIterCalc"
    }
}

impl ListCalc for DrainIterCalc {
    fn evaluate_list(&self, evaluator: &mut dyn Evaluator) -> Result<Option<TupleList>> {
        match self.iter.evaluate_iterable(evaluator)? {
            Some(iterable) => materialize(iterable.as_ref()).map(Some),
            None => Ok(None),
        }
    }
}

/// Iterable from a list producer; the list itself is the iterable
#[derive(Debug)]
pub struct ListIterCalc {
    list: Arc<dyn ListCalc>,
    children: [Calc; 1],
}

impl ListIterCalc {
    pub fn new(list: Arc<dyn ListCalc>) -> Self {
        Self {
            children: [Calc::List(list.clone())],
            list,
        }
    }
}

impl CalcNode for ListIterCalc {
    fn ty(&self) -> &Type {
        self.list.ty()
    }

    fn children(&self) -> &[Calc] {
        &self.children
    }

    fn result_style(&self) -> ResultStyle {
        ResultStyle::Iterable
    }

    fn name(&self) -> &'static str {
        "ListIterCalc"
    }
}

impl IterCalc for ListIterCalc {
    fn evaluate_iterable(
        &self,
        evaluator: &mut dyn Evaluator,
    ) -> Result<Option<Arc<dyn TupleIterable>>> {
        Ok(self
            .list
            .evaluate_list(evaluator)?
            .map(|list| Arc::new(list) as Arc<dyn TupleIterable>))
    }
}

/// Mutable list from a producer whose lists may be shared
///
/// The clone is copy-on-write: it costs nothing until the caller mutates it,
/// and mutation never reaches the producer's copy.
#[derive(Debug)]
pub struct CopyListCalc {
    list: Arc<dyn ListCalc>,
    children: [Calc; 1],
}

impl CopyListCalc {
    pub fn new(list: Arc<dyn ListCalc>) -> Self {
        Self {
            children: [Calc::List(list.clone())],
            list,
        }
    }
}

impl CalcNode for CopyListCalc {
    fn ty(&self) -> &Type {
        self.list.ty()
    }

    fn children(&self) -> &[Calc] {
        &self.children
    }

    fn result_style(&self) -> ResultStyle {
        ResultStyle::MutableList
    }

    fn name(&self) -> &'static str {
        "CopyListCalc"
    }
}

impl ListCalc for CopyListCalc {
    fn evaluate_list(&self, evaluator: &mut dyn Evaluator) -> Result<Option<TupleList>> {
        Ok(self
            .list
            .evaluate_list(evaluator)?
            .map(|list| list.clone_list(None)))
    }
}
