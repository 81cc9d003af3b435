// Dweve Flatebench - Correctness-aware compression benchmarks
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-tool results for one input, keyed by tool name.
//!
//! Every discovered tool gets exactly one [`ToolRecord`], created up front in
//! discovery order. The correctness and timing stages fill it in
//! incrementally; absent fields stay `None` and every reader has to handle
//! that case.

use crate::error::TimingError;
use crate::format::RatioResult;
use crate::registry::ToolDescriptor;
use crate::timing::StrategyKind;
use std::collections::{BTreeMap, HashMap};

/// Outcome of one timing strategy for one tool: mean seconds per operation,
/// or the sanitised failure reason.
pub type TimingOutcome = Result<f64, String>;

/// Everything measured for one tool on one input.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRecord {
    name: String,
    ratio: Option<RatioResult>,
    timings: BTreeMap<StrategyKind, TimingOutcome>,
}

impl ToolRecord {
    /// Creates an empty record.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ratio: None,
            timings: BTreeMap::new(),
        }
    }

    /// Tool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Correctness result, if the stage ran.
    pub fn ratio(&self) -> Option<&RatioResult> {
        self.ratio.as_ref()
    }

    /// Correctness result, with a placeholder for tools that have none.
    pub fn ratio_or_missing(&self) -> RatioResult {
        self.ratio.clone().unwrap_or_else(RatioResult::missing)
    }

    /// Whether the tool produced a valid round trip. A missing result
    /// counts as invalid.
    pub fn is_valid(&self) -> bool {
        self.ratio.as_ref().is_some_and(|r| r.valid)
    }

    /// Outcome under `kind`, if that strategy ran.
    pub fn timing(&self, kind: StrategyKind) -> Option<&TimingOutcome> {
        self.timings.get(&kind)
    }

    /// Mean seconds per operation under `kind`, when it succeeded.
    pub fn mean(&self, kind: StrategyKind) -> Option<f64> {
        match self.timings.get(&kind) {
            Some(Ok(mean)) => Some(*mean),
            _ => None,
        }
    }

    /// Failure reason under `kind`, when it failed.
    pub fn timing_error(&self, kind: StrategyKind) -> Option<&str> {
        match self.timings.get(&kind) {
            Some(Err(reason)) => Some(reason.as_str()),
            _ => None,
        }
    }

    /// Stores the correctness result.
    pub fn set_ratio(&mut self, ratio: RatioResult) {
        self.ratio = Some(ratio);
    }

    /// Stores a timing outcome, replacing any earlier one for `kind`.
    pub fn set_timing(&mut self, kind: StrategyKind, outcome: Result<f64, TimingError>) {
        self.timings
            .insert(kind, outcome.map_err(|e| e.to_string()));
    }
}

/// Records for every tool, in discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    records: Vec<ToolRecord>,
    index: HashMap<String, usize>,
}

impl ResultTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with one empty record per tool.
    pub fn for_tools(tools: &[ToolDescriptor]) -> Self {
        let mut table = Self::new();
        for tool in tools {
            table.insert(tool.name.clone());
        }
        table
    }

    /// Returns the record for `name`, creating it at the end if needed.
    pub fn insert(&mut self, name: impl Into<String>) -> &mut ToolRecord {
        let name = name.into();
        let position = match self.index.get(&name) {
            Some(&position) => position,
            None => {
                self.records.push(ToolRecord::new(name.clone()));
                self.index.insert(name, self.records.len() - 1);
                self.records.len() - 1
            }
        };
        &mut self.records[position]
    }

    /// Looks up a record.
    pub fn get(&self, name: &str) -> Option<&ToolRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    /// Looks up a record mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ToolRecord> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.records[i]),
            None => None,
        }
    }

    /// Records in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolRecord> {
        self.records.iter()
    }

    /// Number of tools.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if there are no tools.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any record has an outcome for `kind`.
    pub fn has_timings(&self, kind: StrategyKind) -> bool {
        self.records.iter().any(|r| r.timing(kind).is_some())
    }
}
