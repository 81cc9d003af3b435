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

//! Ranking and cross-strategy agreement.
//!
//! The display order is total and covers every tool exactly once:
//!
//! 1. valid output and a mean, fastest first, ranked 1..N
//! 2. invalid output but a mean, fastest first, unranked
//! 3. no mean, alphabetical, unranked
//!
//! Ties on the mean keep discovery order.

use crate::format::RatioResult;
use crate::results::{ResultTable, ToolRecord};
use crate::timing::StrategyKind;
use std::cmp::Ordering;

/// Which ranking group a tool falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// Timed with a valid round trip.
    ValidTimed,
    /// Timed, but its output did not round-trip.
    InvalidTimed,
    /// No mean under this strategy.
    Untimed,
}

/// One line of a ranking table.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingRow {
    /// Position within [`Tier::ValidTimed`], starting at 1.
    pub rank: Option<usize>,
    /// Tool name
    pub name: String,
    /// Group the tool was placed in
    pub tier: Tier,
    /// Correctness result, or the missing-result placeholder
    pub ratio: RatioResult,
    /// Mean seconds per operation
    pub mean: Option<f64>,
}

fn tier_of(record: &ToolRecord, kind: StrategyKind) -> Tier {
    match (record.mean(kind), record.is_valid()) {
        (Some(_), true) => Tier::ValidTimed,
        (Some(_), false) => Tier::InvalidTimed,
        (None, _) => Tier::Untimed,
    }
}

fn compare(a: &ToolRecord, b: &ToolRecord, kind: StrategyKind) -> Ordering {
    let tiers = tier_of(a, kind).cmp(&tier_of(b, kind));
    if tiers != Ordering::Equal {
        return tiers;
    }
    match (a.mean(kind), b.mean(kind)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a.name().cmp(b.name()),
    }
}

/// Orders every tool in `table` for display under `kind`.
pub fn rank(table: &ResultTable, kind: StrategyKind) -> Vec<RankingRow> {
    let mut records: Vec<&ToolRecord> = table.iter().collect();
    records.sort_by(|a, b| compare(a, b, kind));

    let mut next_rank = 0;
    records
        .into_iter()
        .map(|record| {
            let tier = tier_of(record, kind);
            let rank = (tier == Tier::ValidTimed).then(|| {
                next_rank += 1;
                next_rank
            });
            RankingRow {
                rank,
                name: record.name().to_string(),
                tier,
                ratio: record.ratio_or_missing(),
                mean: record.mean(kind),
            }
        })
        .collect()
}

/// Names of valid, timed tools, fastest first.
pub fn valid_timed_order(table: &ResultTable, kind: StrategyKind) -> Vec<String> {
    rank(table, kind)
        .into_iter()
        .filter(|row| row.tier == Tier::ValidTimed)
        .map(|row| row.name)
        .collect()
}

/// The extreme tool picked by each strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    /// Choice of the first strategy
    pub first: String,
    /// Choice of the second strategy
    pub second: String,
}

impl Pick {
    /// Whether both strategies picked the same tool.
    pub fn matches(&self) -> bool {
        self.first == self.second
    }
}

/// Whether two strategies agree on the extremes of the ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Agreement {
    /// One of the strategies has no valid, timed tools.
    NotApplicable,
    /// Both strategies ranked at least one tool.
    Compared {
        /// Fastest tool under each strategy
        fastest: Pick,
        /// Slowest tool under each strategy
        slowest: Pick,
    },
}

/// Compares fastest and slowest valid, timed tools under two strategies.
pub fn agreement(table: &ResultTable, first: StrategyKind, second: StrategyKind) -> Agreement {
    let a = valid_timed_order(table, first);
    let b = valid_timed_order(table, second);
    match (a.first(), a.last(), b.first(), b.last()) {
        (Some(a_fast), Some(a_slow), Some(b_fast), Some(b_slow)) => Agreement::Compared {
            fastest: Pick {
                first: a_fast.clone(),
                second: b_fast.clone(),
            },
            slowest: Pick {
                first: a_slow.clone(),
                second: b_slow.clone(),
            },
        },
        _ => Agreement::NotApplicable,
    }
}
