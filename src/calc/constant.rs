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

use std::sync::Arc;

use crate::core::{Result, Type, Value};
use crate::olap::{Evaluator, Hierarchy};

use super::{Calc, CalcNode, GenericCalc};

/// Calc returning the same value in every context
#[derive(Debug)]
pub struct ConstantCalc {
    value: Value,
    ty: Type,
}

impl ConstantCalc {
    pub fn new(value: Value, ty: Type) -> Self {
        Self { value, ty }
    }

    /// Null of the given type
    pub fn null(ty: Type) -> Self {
        Self::new(Value::Null, ty)
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_calc(self) -> Calc {
        Calc::Generic(Arc::new(self))
    }
}

impl CalcNode for ConstantCalc {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn depends_on(&self, _hierarchy: &Hierarchy) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "ConstantCalc"
    }
}

impl GenericCalc for ConstantCalc {
    #[inline]
    fn evaluate(&self, _evaluator: &mut dyn Evaluator) -> Result<Value> {
        Ok(self.value.clone())
    }
}
