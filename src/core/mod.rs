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

//! Core types and definitions for cubecalc
//!
//! - [`Type`] - Static expression types (scalar kinds, member, tuple, set, ...)
//! - [`Value`] - Runtime values of every expression shape
//! - [`Error`] - Error type for compilation and evaluation

pub mod error;
pub mod types;
pub mod value;

pub use error::{Error, Result};
pub use types::{ElementType, ScalarKind, Type};
pub use value::Value;
