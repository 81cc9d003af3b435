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

//! Run orchestration.
//!
//! Sequences discovery, correctness checks, timing and reporting. Tools and
//! inputs are processed strictly one at a time so measurements never
//! compete for the machine. Only [`BenchError`] escapes; every per-tool
//! problem becomes a result row.

use crate::config::{DiscoveryConfig, RunConfig};
use crate::error::{BenchError, Result};
use crate::format::{evaluate, RatioResult};
use crate::invocation::{run_capture, InvocationParams};
use crate::ranking::agreement;
use crate::registry::{Discovery, Registry, Suite, ToolDescriptor};
use crate::report::{
    render_agreement, render_input_heading, render_preamble, render_ranking, render_streaming,
    StreamingRow,
};
use crate::results::ResultTable;
use crate::timing::{measure_single_op, ExternalTimer, Hyperfine, RunPlan, TimingStrategy};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One input file, read once up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    /// Path as given by the user.
    pub path: PathBuf,
    /// File contents.
    pub data: Vec<u8>,
}

impl Input {
    /// Reads `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::Io`] if the file cannot be read.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = std::fs::read(&path).map_err(|e| BenchError::io_error(&path, e))?;
        Ok(Self { path, data })
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for an empty file.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Reads every input, failing on the first unreadable one.
pub fn load_inputs<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Input>> {
    paths.iter().map(|p| Input::load(p.as_ref())).collect()
}

/// Runs a tool once and validates its output against the input.
pub fn evaluate_tool(tool: &ToolDescriptor, input: &Input) -> RatioResult {
    let params = InvocationParams::new(&input.path, 1);
    match run_capture(&tool.single, &params) {
        Ok(captured) => evaluate(&captured.stdout, &input.data),
        Err(failure) => {
            warn!(tool = %tool.name, %failure, "ratio command failed");
            RatioResult::command_failed(failure)
        }
    }
}

/// Fills in correctness results for every tool.
pub fn evaluate_ratios(tools: &[ToolDescriptor], input: &Input, table: &mut ResultTable) {
    for tool in tools {
        let result = evaluate_tool(tool, input);
        debug!(tool = %tool.name, valid = result.valid, size = result.compressed_size, "ratio evaluated");
        table.insert(tool.name.clone()).set_ratio(result);
    }
}

/// Fills in one strategy's timing for every tool.
pub fn measure_tools(
    strategy: &dyn TimingStrategy,
    tools: &[ToolDescriptor],
    input: &Input,
    plan: &RunPlan,
    table: &mut ResultTable,
) {
    for tool in tools {
        let outcome = strategy.measure(&tool.bench, &input.path, plan);
        match &outcome {
            Ok(mean) => debug!(tool = %tool.name, strategy = %strategy.kind(), mean, "timed"),
            Err(e) => warn!(tool = %tool.name, strategy = %strategy.kind(), error = %e, "timing failed"),
        }
        table.insert(tool.name.clone()).set_timing(strategy.kind(), outcome);
    }
}

/// Inner-iteration benchmark: ratios, then each strategy, then agreement.
pub struct SpeedHarness {
    config: RunConfig,
    strategies: Vec<Box<dyn TimingStrategy>>,
}

impl SpeedHarness {
    /// Creates a harness using the external timer and, unless disabled,
    /// the statistical tool found on `search_path`.
    pub fn new(config: RunConfig, discovery: &DiscoveryConfig) -> Self {
        let mut strategies: Vec<Box<dyn TimingStrategy>> = vec![Box::new(ExternalTimer)];
        if !config.skip_hyperfine {
            strategies.push(Box::new(Hyperfine::new(discovery.search_path.clone())));
        }
        Self { config, strategies }
    }

    /// Creates a harness with explicit strategies.
    pub fn with_strategies(config: RunConfig, strategies: Vec<Box<dyn TimingStrategy>>) -> Self {
        Self { config, strategies }
    }

    /// Measures one input and returns its populated table.
    pub fn measure_input(&self, tools: &[ToolDescriptor], input: &Input) -> ResultTable {
        let plan = RunPlan::from(&self.config);
        let mut table = ResultTable::for_tools(tools);
        evaluate_ratios(tools, input, &mut table);
        for strategy in &self.strategies {
            info!(strategy = %strategy.kind(), input = %input.path.display(), "measuring");
            measure_tools(strategy.as_ref(), tools, input, &plan, &mut table);
        }
        table
    }

    /// Renders every table for one measured input, plus agreement when
    /// two strategies ran.
    pub fn render_input(&self, table: &ResultTable, input: &Input) -> String {
        let mut out = render_input_heading(&input.path, input.len());
        for strategy in &self.strategies {
            out.push_str(&render_ranking(table, strategy.kind(), input.len()));
        }
        if let [first, second] = self.strategies.as_slice() {
            let result = agreement(table, first.kind(), second.kind());
            out.push_str(&render_agreement(&result, first.kind(), second.kind()));
        }
        out
    }

    /// Runs the whole benchmark, writing the report as it goes.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::NoToolsAvailable`] if discovery is empty, and
    /// [`BenchError::Output`] if the report cannot be written.
    pub fn run(&self, discovery: &Discovery, inputs: &[Input], out: &mut dyn Write) -> Result<()> {
        if discovery.is_empty() {
            return Err(BenchError::NoToolsAvailable);
        }
        out.write_all(render_preamble(discovery, Some(self.config.inner_iters)).as_bytes())?;
        for input in inputs {
            let table = self.measure_input(&discovery.tools, input);
            out.write_all(self.render_input(&table, input).as_bytes())?;
            out.flush()?;
        }
        Ok(())
    }
}

/// Streaming comparison of one tool: determinism-checked single runs.
pub fn stream_tool(tool: &ToolDescriptor, input: &Input, plan: &RunPlan) -> StreamingRow {
    match measure_single_op(&tool.single, &input.path, plan) {
        Ok(sample) => StreamingRow::Measured {
            name: tool.name.clone(),
            ratio: evaluate(&sample.output, &input.data),
            mean: sample.mean_seconds(),
        },
        Err(e) => {
            warn!(tool = %tool.name, error = %e, "streaming run failed");
            StreamingRow::Failed {
                name: tool.name.clone(),
                error: e.to_string(),
            }
        }
    }
}

/// Runs the streaming comparison, writing the report as it goes.
///
/// # Errors
///
/// Same as [`SpeedHarness::run`].
pub fn run_streaming(
    config: &RunConfig,
    discovery: &Discovery,
    inputs: &[Input],
    out: &mut dyn Write,
) -> Result<()> {
    if discovery.is_empty() {
        return Err(BenchError::NoToolsAvailable);
    }
    let plan = RunPlan::from(config);
    out.write_all(render_preamble(discovery, None).as_bytes())?;
    for input in inputs {
        let rows: Vec<StreamingRow> = discovery
            .tools
            .iter()
            .map(|tool| stream_tool(tool, input, &plan))
            .collect();
        out.write_all(render_input_heading(&input.path, input.len()).as_bytes())?;
        out.write_all(render_streaming(&rows, input.len()).as_bytes())?;
        out.flush()?;
    }
    Ok(())
}

/// Validates, loads inputs, discovers tools and runs `suite`.
///
/// Inputs are read before discovery so a bad path fails before any tool
/// is built or launched.
///
/// # Errors
///
/// Any [`BenchError`]; per-tool failures are reported, not returned.
pub fn run_suite<P: AsRef<Path>>(
    suite: Suite,
    config: &RunConfig,
    discovery_config: &DiscoveryConfig,
    registry: &Registry,
    inputs: &[P],
    out: &mut dyn Write,
) -> Result<()> {
    config.validate()?;
    let inputs = load_inputs(inputs)?;
    let discovery = registry.discover(discovery_config, suite);
    match suite {
        Suite::Speed => SpeedHarness::new(config.clone(), discovery_config).run(&discovery, &inputs, out),
        Suite::Streaming => run_streaming(config, &discovery, &inputs, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::StreamFormat;
    use crate::invocation::{Invocation, SHELL};
    use crate::timing::StrategyKind;
    use std::io::Write as _;

    fn shell_tool(name: &str, script: &str) -> ToolDescriptor {
        ToolDescriptor::single_shot(name, Invocation::new(SHELL).arg("-c").arg(script).stdin())
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn fixture(data: &[u8]) -> (tempfile::TempDir, Input, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("input.bin");
        std::fs::write(&input_path, data).unwrap();
        let compressed = dir.path().join("input.z");
        std::fs::write(&compressed, zlib(data)).unwrap();
        let input = Input::load(&input_path).unwrap();
        (dir, input, compressed)
    }

    #[test]
    fn test_load_missing_input() {
        let err = Input::load("/nonexistent/flatebench/input").unwrap_err();
        assert!(matches!(err, BenchError::Io { .. }));
    }

    #[test]
    fn test_run_rejects_empty_discovery() {
        let harness = SpeedHarness::with_strategies(RunConfig::speed(), vec![Box::new(ExternalTimer)]);
        let mut out = Vec::new();
        let err = harness.run(&Discovery::default(), &[], &mut out).unwrap_err();
        assert_eq!(err, BenchError::NoToolsAvailable);
        assert!(out.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_evaluate_tool_valid_and_failing() {
        let (_dir, input, compressed) = fixture(&[0u8; 1000]);
        let good = shell_tool("good", &format!("cat '{}'", compressed.display()));
        let result = evaluate_tool(&good, &input);
        assert!(result.valid);
        assert_eq!(result.format, Some(StreamFormat::Zlib));
        assert!(result.compressed_size < 1000);

        let bad = shell_tool("bad", "exit 2");
        let result = evaluate_tool(&bad, &input);
        assert!(!result.valid);
        assert_eq!(result.compressed_size, 0);
        assert!(result.error.contains("exit status 2"));
    }

    #[cfg(unix)]
    #[test]
    fn test_speed_harness_end_to_end() {
        let (_dir, input, compressed) = fixture(b"hello hello hello hello");
        let tools = vec![
            shell_tool("good", &format!("cat '{}'", compressed.display())),
            shell_tool("passthrough", "cat"),
            shell_tool("crash", "exit 2"),
        ];
        let discovery = Discovery {
            tools,
            skipped: vec!["other (missing other on PATH)".to_string()],
        };
        let config = RunConfig::speed().with_runs(2).with_inner_iters(3);
        let harness = SpeedHarness::with_strategies(config, vec![Box::new(ExternalTimer)]);

        let table = harness.measure_input(&discovery.tools, &input);
        assert!(table.get("good").unwrap().is_valid());
        assert!(table.get("good").unwrap().mean(StrategyKind::ExternalTimer).is_some());
        assert!(!table.get("passthrough").unwrap().is_valid());
        assert!(table.get("crash").unwrap().timing_error(StrategyKind::ExternalTimer).is_some());

        let mut out = Vec::new();
        harness.run(&discovery, &[input], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Tools: good, passthrough, crash\nMode: 3 compression iterations per launch\n"));
        assert!(text.contains("Skipped: other (missing other on PATH)"));
        assert!(text.contains("| 1 | good | zlib |"));
        assert!(text.contains("| - | passthrough | unknown |"));
        assert!(text.contains("| - | crash | err | 0 | n/a | no | ERR |"));
        assert!(text.contains("- passthrough: invalid output (decompression failed)"));
        assert!(text.contains("- crash: benchmark failed (warmup run failed: exit status 2)"));
        assert!(!text.contains("Agreement"));
    }

    #[cfg(unix)]
    #[test]
    fn test_streaming_rows() {
        let (_dir, input, compressed) = fixture(b"stream me");
        let plan = RunPlan::new(1, 3, 1);

        let good = shell_tool("good", &format!("cat '{}'", compressed.display()));
        match stream_tool(&good, &input, &plan) {
            StreamingRow::Measured { ratio, .. } => assert!(ratio.valid),
            other => panic!("unexpected row {:?}", other),
        }

        let bad = shell_tool("bad", "echo broken >&2; exit 1");
        assert_eq!(
            stream_tool(&bad, &input, &plan),
            StreamingRow::Failed {
                name: "bad".to_string(),
                error: "warmup run failed: exit status 1: broken".to_string(),
            }
        );
    }

    #[test]
    fn test_run_suite_validates_before_loading() {
        let dir = tempfile::tempdir().unwrap();
        let discovery = DiscoveryConfig::from_env(dir.path()).with_search_path(dir.path());
        let mut out = Vec::new();
        let err = run_suite(
            Suite::Speed,
            &RunConfig::speed().with_inner_iters(0),
            &discovery,
            &Registry::standard(),
            &["/nonexistent/input"],
            &mut out,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "--inner-iters must be >= 1");
    }

    #[test]
    fn test_run_suite_no_tools() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.bin");
        std::fs::write(&input, b"x").unwrap();
        let discovery = DiscoveryConfig::from_env(dir.path()).with_search_path(dir.path());
        let mut out = Vec::new();
        let err = run_suite(
            Suite::Streaming,
            &RunConfig::streaming(),
            &discovery,
            &Registry::standard(),
            &[&input],
            &mut out,
        )
        .unwrap_err();
        assert_eq!(err, BenchError::NoToolsAvailable);
    }
}
