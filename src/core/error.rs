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

//! Error types for cubecalc
//!
//! Data-path nulls are never errors: they travel as `None`, [`Value::Null`]
//! or the null member. Everything in this enum is either a genuine failure
//! reported by an evaluator or a defect upstream of the calc tree.
//!
//! [`Value::Null`]: super::Value::Null

use thiserror::Error;

/// Result type alias for cubecalc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for compilation and evaluation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Programming errors (type checker or function definition defects)
    // =========================================================================
    /// A shape accessor was requested that the calc cannot supply
    #[error("cannot use {actual} calc as {expected} (expression: {expression})")]
    ShapeMismatch {
        expected: String,
        actual: String,
        expression: String,
    },

    /// A runtime value did not have the type the calc promised
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// No coercion exists from the expression's type to the requested type
    #[error("cannot convert {from} to {to}")]
    NoCoercion { from: String, to: String },

    // =========================================================================
    // Function errors
    // =========================================================================
    /// Function is not registered
    #[error("function '{0}' not found")]
    FunctionNotFound(String),

    /// Function called with the wrong number of arguments
    #[error("function '{name}' expects {expected} argument(s), got {got}")]
    InvalidArgumentCount {
        name: String,
        expected: String,
        got: usize,
    },

    /// Invalid argument for function
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // =========================================================================
    // Parameter errors
    // =========================================================================
    /// Parameter slot exists but no default calc has been installed yet
    #[error("parameter '{0}' has no value")]
    ParameterUnbound(String),

    // =========================================================================
    // Tuple list errors
    // =========================================================================
    /// Tuple had a different number of members than the list's arity
    #[error("arity mismatch: expected {expected}, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    /// Index outside the valid range
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Range outside the valid range, or reversed
    #[error("range {from}..{to} out of bounds for length {len}")]
    RangeOutOfBounds { from: usize, to: usize, len: usize },

    /// Mutation attempted on a fixed list
    #[error("tuple list is immutable")]
    ImmutableList,

    /// Iterator removal without a preceding successful forward
    #[error("iterator has no current tuple")]
    IllegalIteratorState,

    // =========================================================================
    // Evaluation errors
    // =========================================================================
    /// Expression evaluation failed with message
    #[error("evaluation failed: {message}")]
    Evaluation { message: String },

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Internal error for unexpected conditions
    #[error("{message}")]
    Internal { message: String },
}

impl Error {
    /// Create a new ShapeMismatch error
    pub fn shape_mismatch(
        expected: impl Into<String>,
        actual: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Error::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
            expression: expression.into(),
        }
    }

    /// Create a new TypeMismatch error
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a new NoCoercion error
    pub fn no_coercion(from: impl Into<String>, to: impl Into<String>) -> Self {
        Error::NoCoercion {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a new InvalidArgumentCount error
    pub fn invalid_argument_count(
        name: impl Into<String>,
        expected: impl Into<String>,
        got: usize,
    ) -> Self {
        Error::InvalidArgumentCount {
            name: name.into(),
            expected: expected.into(),
            got,
        }
    }

    /// Create a new InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Create a new ArityMismatch error
    pub fn arity_mismatch(expected: usize, got: usize) -> Self {
        Error::ArityMismatch { expected, got }
    }

    /// Create a new IndexOutOfBounds error
    pub fn index_out_of_bounds(index: usize, len: usize) -> Self {
        Error::IndexOutOfBounds { index, len }
    }

    /// Create a new Evaluation error
    pub fn evaluation(message: impl Into<String>) -> Self {
        Error::Evaluation {
            message: message.into(),
        }
    }

    /// Create a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Check if this error signals a defect upstream of the calc tree
    ///
    /// These faults must abort the query; retrying cannot help.
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            Error::ShapeMismatch { .. }
                | Error::TypeMismatch { .. }
                | Error::NoCoercion { .. }
                | Error::InvalidArgumentCount { .. }
                | Error::Internal { .. }
        )
    }

    /// Check if this is an index or range error
    pub fn is_index_error(&self) -> bool {
        matches!(
            self,
            Error::IndexOutOfBounds { .. } | Error::RangeOutOfBounds { .. }
        )
    }
}
