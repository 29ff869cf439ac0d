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

use crate::calc::{Calc, ExprCompiler, ValueCalc};
use crate::core::Result;
use crate::expr::FunCall;

use super::{FunDef, FunctionInfo};

/// `$Value`: the value of the current cell
pub struct ValueFunDef;

impl FunDef for ValueFunDef {
    fn name(&self) -> &str {
        "$Value"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new("$Value", "Value of the current measure in the current context", 0, 0)
    }

    fn compile_call(&self, _call: &FunCall, _compiler: &mut ExprCompiler<'_>) -> Result<Calc> {
        Ok(ValueCalc::new().into_calc())
    }
}
