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

//! Query parameters
//!
//! A parameter is registered once per compiler, which assigns it a slot
//! index. The evaluator may bind a value to the slot for an execution;
//! otherwise the parameter's compiled default is used.

use std::sync::{Arc, OnceLock};

use crate::core::{Error, Result, Type, Value};
use crate::expr::Parameter;
use crate::olap::{Evaluator, Hierarchy};

use super::{Calc, CalcNode, GenericCalc};

/// A registered parameter
#[derive(Debug)]
pub struct ParameterSlot {
    index: usize,
    parameter: Arc<Parameter>,
    /// Set once the default expression has been compiled
    default: OnceLock<Calc>,
}

impl ParameterSlot {
    pub(crate) fn new(index: usize, parameter: Arc<Parameter>) -> Self {
        Self {
            index,
            parameter,
            default: OnceLock::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.parameter.name
    }

    pub fn parameter(&self) -> &Arc<Parameter> {
        &self.parameter
    }

    /// Compiled default; `None` while the default is still being compiled
    pub fn default_calc(&self) -> Option<&Calc> {
        self.default.get()
    }

    pub(crate) fn set_default(&self, calc: Calc) -> Result<()> {
        self.default.set(calc).map_err(|_| {
            Error::internal(format!(
                "default of parameter {} set twice",
                self.parameter.name
            ))
        })
    }
}

/// Reads a parameter's value
///
/// Parameters are fixed for an execution, so this calc depends on no
/// hierarchy.
#[derive(Debug)]
pub struct ParameterCalc {
    index: usize,
    name: Arc<str>,
    ty: Type,
    /// `None` for a reference from inside the parameter's own default
    slot: Option<Arc<ParameterSlot>>,
}

impl ParameterCalc {
    pub fn new(slot: Arc<ParameterSlot>) -> Self {
        Self {
            index: slot.index,
            name: slot.parameter.name.clone(),
            ty: slot.parameter.ty.clone(),
            slot: Some(slot),
        }
    }

    /// Reference that only reads a bound value
    pub(crate) fn bound_only(slot: &ParameterSlot) -> Self {
        Self {
            index: slot.index,
            name: slot.parameter.name.clone(),
            ty: slot.parameter.ty.clone(),
            slot: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn into_calc(self) -> Calc {
        Calc::Generic(Arc::new(self))
    }
}

impl CalcNode for ParameterCalc {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn depends_on(&self, _hierarchy: &Hierarchy) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "ParameterCalc"
    }
}

impl GenericCalc for ParameterCalc {
    fn evaluate(&self, evaluator: &mut dyn Evaluator) -> Result<Value> {
        if let Some(value) = evaluator.parameter_value(self.index) {
            return Ok(value);
        }
        match self.slot.as_ref().and_then(|slot| slot.default_calc()) {
            Some(default) => default.evaluate(evaluator),
            None => Err(Error::ParameterUnbound(self.name.to_string())),
        }
    }
}
