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

//! Plain-text report rendering.
//!
//! Tables are Markdown pipe tables. Every renderer returns a `String` ending
//! in a newline so the driver only has to print it. Free-form text from
//! tools (stderr, error messages) goes through [`sanitize_error`] first.

use crate::format::RatioResult;
use crate::ranking::{rank, Agreement, RankingRow};
use crate::registry::Discovery;
use crate::results::ResultTable;
use crate::timing::StrategyKind;
use std::fmt::Write;
use std::path::Path;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Makes arbitrary text safe to embed in a table cell or report line.
pub fn sanitize_error(error: &str) -> String {
    error
        .replace('|', "/")
        .replace(['\r', '\n'], " ")
        .trim()
        .to_string()
}

/// Compressed size over input size, 3 decimals.
///
/// `n/a` for empty inputs, and for invalid results that produced nothing.
pub fn format_ratio(result: &RatioResult, input_size: usize) -> String {
    if input_size == 0 || (result.compressed_size == 0 && !result.valid) {
        return "n/a".to_string();
    }
    format!("{:.3}", result.compressed_size as f64 / input_size as f64)
}

/// Seconds as milliseconds, 3 decimals.
pub fn format_ms(seconds: f64) -> String {
    format!("{:.3}", seconds * 1000.0)
}

/// Input throughput in MiB/s, 2 decimals; `inf` for a zero mean.
pub fn format_mibs(input_size: usize, seconds: f64) -> String {
    if seconds <= 0.0 {
        return "inf".to_string();
    }
    format!("{:.2}", (input_size as f64 / BYTES_PER_MIB) / seconds)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Tools, mode and skip lines printed once per run.
///
/// `inner_iters` is `None` for the streaming suite, which has no mode line.
pub fn render_preamble(discovery: &Discovery, inner_iters: Option<u32>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Tools: {}", discovery.tool_names().join(", "));
    if let Some(n) = inner_iters {
        let _ = writeln!(out, "Mode: {} compression iterations per launch", n);
    }
    if !discovery.skipped.is_empty() {
        let _ = writeln!(out, "Skipped: {}", discovery.skipped.join(", "));
    }
    out
}

/// Blank line plus the input heading.
pub fn render_input_heading(path: &Path, input_size: usize) -> String {
    format!("\nInput: {} ({} bytes)\n", path.display(), input_size)
}

fn render_row(row: &RankingRow, input_size: usize) -> String {
    let rank = row
        .rank
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string());
    let mean = row.mean.map(format_ms).unwrap_or_else(|| "ERR".to_string());
    format!(
        "| {} | {} | {} | {} | {} | {} | {} |",
        rank,
        row.name,
        row.ratio.format_label(),
        row.ratio.compressed_size,
        format_ratio(&row.ratio, input_size),
        yes_no(row.ratio.valid),
        mean
    )
}

/// Ranking table for one strategy, followed by its failures section.
pub fn render_ranking(table: &ResultTable, kind: StrategyKind, input_size: usize) -> String {
    let rows = rank(table, kind);
    let mut out = String::new();
    let _ = writeln!(out, "{}", kind.title());
    out.push_str("| Rank | Tool | Format | Compressed | Ratio | Valid | Mean ms/op |\n");
    out.push_str("|---:|---|---|---:|---:|---:|---:|\n");
    for row in &rows {
        out.push_str(&render_row(row, input_size));
        out.push('\n');
    }

    let mut failures = Vec::new();
    for row in &rows {
        if !row.ratio.valid {
            failures.push(format!(
                "{}: invalid output ({})",
                row.name,
                sanitize_error(&row.ratio.error)
            ));
        }
        if let Some(error) = table.get(&row.name).and_then(|r| r.timing_error(kind)) {
            failures.push(format!(
                "{}: benchmark failed ({})",
                row.name,
                sanitize_error(error)
            ));
        }
    }
    if !failures.is_empty() {
        out.push_str("Failures\n");
        for line in failures {
            let _ = writeln!(out, "- {}", line);
        }
    }
    out
}

/// Agreement block comparing two strategies.
pub fn render_agreement(agreement: &Agreement, first: StrategyKind, second: StrategyKind) -> String {
    let mut out = String::from("Agreement\n");
    match agreement {
        Agreement::NotApplicable => {
            for label in ["Fastest", "Slowest"] {
                let _ = writeln!(
                    out,
                    "- {}: n/a (no valid timed contenders in one or both runners)",
                    label
                );
            }
        }
        Agreement::Compared { fastest, slowest } => {
            for (label, pick) in [("Fastest", fastest), ("Slowest", slowest)] {
                let _ = writeln!(
                    out,
                    "- {}: {}={}, {}={}, match={}",
                    label,
                    first.label(),
                    pick.first,
                    second.label(),
                    pick.second,
                    yes_no(pick.matches())
                );
            }
        }
    }
    out
}

/// One line of the streaming comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamingRow {
    /// The tool ran every time and produced the same bytes.
    Measured {
        /// Tool name
        name: String,
        /// Correctness of the shared output
        ratio: RatioResult,
        /// Mean seconds per run
        mean: f64,
    },
    /// Warmup or a measured run failed, or outputs differed.
    Failed {
        /// Tool name
        name: String,
        /// Failure reason
        error: String,
    },
}

/// Streaming comparison table for one input.
pub fn render_streaming(rows: &[StreamingRow], input_size: usize) -> String {
    let mut out = String::new();
    out.push_str("| Tool | Format | Compressed | Ratio | Mean ms | MiB/s | Valid |\n");
    out.push_str("|---|---:|---:|---:|---:|---:|---:|\n");
    for row in rows {
        match row {
            StreamingRow::Measured { name, ratio, mean } => {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} | {} | {} | {} |",
                    name,
                    ratio.format_label(),
                    ratio.compressed_size,
                    format_ratio(ratio, input_size),
                    format_ms(*mean),
                    format_mibs(input_size, *mean),
                    yes_no(ratio.valid)
                );
            }
            StreamingRow::Failed { name, error } => {
                let _ = writeln!(
                    out,
                    "| {} | err | - | - | - | - | no ({}) |",
                    name,
                    sanitize_error(error)
                );
            }
        }
    }
    out
}
