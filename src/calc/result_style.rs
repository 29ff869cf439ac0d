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

//! Runtime representation negotiation
//!
//! A caller states the representations it can consume as an ordered
//! preference list; a producer states what it can supply. The first
//! preferred style the producer supports wins.

use std::fmt;

/// Runtime representation of a calc's result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultStyle {
    /// A single scalar, member or tuple
    Value,
    /// A list the consumer must not modify
    List,
    /// A fresh list the consumer owns and may modify
    MutableList,
    /// A traversable set that may not be materialized
    Iterable,
    /// Whatever the producer finds cheapest
    Any,
}

impl ResultStyle {
    /// Any list, preferring the shareable kind
    pub const ANY_LIST: &'static [ResultStyle] = &[ResultStyle::List, ResultStyle::MutableList];

    pub const ITERABLE_ONLY: &'static [ResultStyle] = &[ResultStyle::Iterable];

    pub const LIST_ONLY: &'static [ResultStyle] = &[ResultStyle::List];

    pub const MUTABLE_LIST_ONLY: &'static [ResultStyle] = &[ResultStyle::MutableList];

    pub const ITERABLE_LIST_MUTABLE_LIST: &'static [ResultStyle] = &[
        ResultStyle::Iterable,
        ResultStyle::List,
        ResultStyle::MutableList,
    ];

    pub const LIST_MUTABLE_LIST: &'static [ResultStyle] =
        &[ResultStyle::List, ResultStyle::MutableList];

    pub const VALUE_ONLY: &'static [ResultStyle] = &[ResultStyle::Value];

    pub const ITERABLE_ANY: &'static [ResultStyle] = &[ResultStyle::Iterable, ResultStyle::Any];

    /// First entry of `preferred` that some entry of `available` supplies
    pub fn choose(preferred: &[ResultStyle], available: &[ResultStyle]) -> Option<ResultStyle> {
        preferred.iter().copied().find(|&wanted| {
            available.iter().any(|&produced| {
                produced == wanted || produced == ResultStyle::Any || wanted == ResultStyle::Any
            })
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResultStyle::Value => "VALUE",
            ResultStyle::List => "LIST",
            ResultStyle::MutableList => "MUTABLE_LIST",
            ResultStyle::Iterable => "ITERABLE",
            ResultStyle::Any => "ANY",
        }
    }
}

impl fmt::Display for ResultStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
