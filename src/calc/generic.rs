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

//! Shape accessors over a generic calc
//!
//! [`GenericAccessor`] gives a [`GenericCalc`] every other shape by
//! evaluating it and unwrapping the [`Value`]. The compiler only builds one
//! when the generic calc's static type supports the requested shape, so a
//! runtime kind mismatch here means the calc broke its own type.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::{Error, Result, Type, Value};
use crate::olap::{Dimension, Evaluator, Hierarchy, Level, Member};
use crate::tuple::{materialize, Tuple, TupleIterable, TupleList};

use super::{
    BooleanCalc, Calc, CalcNode, DateTimeCalc, DimensionCalc, DoubleCalc, GenericCalc,
    HierarchyCalc, IntegerCalc, IterCalc, LevelCalc, ListCalc, MemberCalc, ResultStyle,
    StringCalc, TupleCalc,
};

/// Casting view of a generic calc
#[derive(Debug)]
pub struct GenericAccessor {
    inner: Arc<dyn GenericCalc>,
}

impl GenericAccessor {
    pub fn new(inner: Arc<dyn GenericCalc>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Arc<dyn GenericCalc> {
        &self.inner
    }

    fn mismatch(&self, expected: &str, value: &Value) -> Error {
        Error::type_mismatch(
            expected,
            format!("{} from {}", value.kind_name(), self.inner.name()),
        )
    }
}

impl CalcNode for GenericAccessor {
    fn ty(&self) -> &Type {
        self.inner.ty()
    }

    fn children(&self) -> &[Calc] {
        self.inner.children()
    }

    fn result_style(&self) -> ResultStyle {
        self.inner.result_style()
    }

    fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        self.inner.depends_on(hierarchy)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

impl BooleanCalc for GenericAccessor {
    fn evaluate_boolean(&self, evaluator: &mut dyn Evaluator) -> Result<bool> {
        match self.inner.evaluate(evaluator)? {
            Value::Boolean(b) => Ok(b),
            Value::Null => Ok(false),
            other => Err(self.mismatch("boolean", &other)),
        }
    }
}

impl DoubleCalc for GenericAccessor {
    fn evaluate_double(&self, evaluator: &mut dyn Evaluator) -> Result<Option<f64>> {
        match self.inner.evaluate(evaluator)? {
            Value::Null => Ok(None),
            Value::Double(v) => Ok(Some(v)),
            Value::Integer(v) => Ok(Some(v as f64)),
            other => Err(self.mismatch("numeric", &other)),
        }
    }
}

impl IntegerCalc for GenericAccessor {
    fn evaluate_integer(&self, evaluator: &mut dyn Evaluator) -> Result<Option<i64>> {
        match self.inner.evaluate(evaluator)? {
            Value::Null => Ok(None),
            Value::Integer(v) => Ok(Some(v)),
            Value::Double(v) => Ok(Some(v as i64)),
            other => Err(self.mismatch("integer", &other)),
        }
    }
}

impl StringCalc for GenericAccessor {
    fn evaluate_string(&self, evaluator: &mut dyn Evaluator) -> Result<Option<Arc<str>>> {
        match self.inner.evaluate(evaluator)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(self.mismatch("string", &other)),
        }
    }
}

impl DateTimeCalc for GenericAccessor {
    fn evaluate_datetime(&self, evaluator: &mut dyn Evaluator) -> Result<Option<DateTime<Utc>>> {
        match self.inner.evaluate(evaluator)? {
            Value::Null => Ok(None),
            Value::DateTime(t) => Ok(Some(t)),
            other => Err(self.mismatch("datetime", &other)),
        }
    }
}

impl MemberCalc for GenericAccessor {
    fn evaluate_member(&self, evaluator: &mut dyn Evaluator) -> Result<Member> {
        match self.inner.evaluate(evaluator)? {
            Value::Member(m) => Ok(m),
            Value::Null => match self.ty().hierarchy_hint() {
                Some(hierarchy) => Ok(hierarchy.null_member()),
                None => Err(Error::evaluation(format!(
                    "{} returned null for a member of unknown hierarchy",
                    self.inner.name()
                ))),
            },
            other => Err(self.mismatch("member", &other)),
        }
    }
}

impl TupleCalc for GenericAccessor {
    fn evaluate_tuple(&self, evaluator: &mut dyn Evaluator) -> Result<Option<Tuple>> {
        match self.inner.evaluate(evaluator)? {
            Value::Null => Ok(None),
            Value::Tuple(t) => Ok(Some(t)),
            other => Err(self.mismatch("tuple", &other)),
        }
    }
}

impl LevelCalc for GenericAccessor {
    fn evaluate_level(&self, evaluator: &mut dyn Evaluator) -> Result<Option<Level>> {
        match self.inner.evaluate(evaluator)? {
            Value::Null => Ok(None),
            Value::Level(l) => Ok(Some(l)),
            other => Err(self.mismatch("level", &other)),
        }
    }
}

impl HierarchyCalc for GenericAccessor {
    fn evaluate_hierarchy(&self, evaluator: &mut dyn Evaluator) -> Result<Option<Hierarchy>> {
        match self.inner.evaluate(evaluator)? {
            Value::Null => Ok(None),
            Value::Hierarchy(h) => Ok(Some(h)),
            other => Err(self.mismatch("hierarchy", &other)),
        }
    }
}

impl DimensionCalc for GenericAccessor {
    fn evaluate_dimension(&self, evaluator: &mut dyn Evaluator) -> Result<Option<Dimension>> {
        match self.inner.evaluate(evaluator)? {
            Value::Null => Ok(None),
            Value::Dimension(d) => Ok(Some(d)),
            other => Err(self.mismatch("dimension", &other)),
        }
    }
}

impl ListCalc for GenericAccessor {
    fn evaluate_list(&self, evaluator: &mut dyn Evaluator) -> Result<Option<TupleList>> {
        match self.inner.evaluate(evaluator)? {
            Value::Null => Ok(None),
            Value::List(list) => Ok(Some(list)),
            Value::Iterable(iterable) => materialize(iterable.as_ref()).map(Some),
            other => Err(self.mismatch("list", &other)),
        }
    }
}

impl IterCalc for GenericAccessor {
    fn evaluate_iterable(
        &self,
        evaluator: &mut dyn Evaluator,
    ) -> Result<Option<Arc<dyn TupleIterable>>> {
        match self.inner.evaluate(evaluator)? {
            Value::Null => Ok(None),
            Value::List(list) => Ok(Some(Arc::new(list))),
            Value::Iterable(iterable) => Ok(Some(iterable)),
            other => Err(self.mismatch("iterable", &other)),
        }
    }
}
