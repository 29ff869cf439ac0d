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

//! Compiler configuration
//!

use crate::calc::ResultStyle;

/// Configuration options for [`ExprCompiler`](crate::calc::ExprCompiler)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Result styles a fresh compiler prefers, most preferred first
    /// Default: LIST, MUTABLE_LIST
    pub result_styles: Vec<ResultStyle>,

    /// Compile the value of a literal tuple of members without building
    /// the tuple
    /// Default: true
    pub collapse_tuple_value: bool,

    /// Null-check value extraction against dimensions the current measure
    /// does not join
    /// Default: false
    pub unrelated_dimension_null_check: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            result_styles: ResultStyle::ANY_LIST.to_vec(),
            collapse_tuple_value: true,
            unrelated_dimension_null_check: false,
        }
    }
}

impl CompilerConfig {
    /// Creates a new CompilerConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for sets that are only traversed once
    pub fn iterable() -> Self {
        Self {
            result_styles: ResultStyle::ITERABLE_LIST_MUTABLE_LIST.to_vec(),
            ..Self::default()
        }
    }

    /// Configuration for cubes combined from several base cubes
    pub fn virtual_cube() -> Self {
        Self {
            unrelated_dimension_null_check: true,
            ..Self::default()
        }
    }

    /// Builder method to set the preferred result styles
    pub fn with_result_styles(mut self, styles: &[ResultStyle]) -> Self {
        self.result_styles = styles.to_vec();
        self
    }

    /// Builder method to enable/disable tuple value collapsing
    pub fn with_collapse_tuple_value(mut self, enabled: bool) -> Self {
        self.collapse_tuple_value = enabled;
        self
    }

    /// Builder method to enable/disable the unrelated dimension null check
    pub fn with_unrelated_dimension_null_check(mut self, enabled: bool) -> Self {
        self.unrelated_dimension_null_check = enabled;
        self
    }
}
