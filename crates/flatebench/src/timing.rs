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

//! Timing engine.
//!
//! Two interchangeable strategies measure the same thing, seconds per
//! single compression, so their rankings can be compared:
//!
//! - [`ExternalTimer`] wraps each process launch in a monotonic clock.
//! - [`Hyperfine`] delegates warmup, measured runs and summarisation to
//!   the external statistical benchmarking tool and reads back its mean.
//!
//! Both time a launch that performs `inner_iters` compressions and divide
//! the per-launch mean by that count, amortising process start-up cost.
//!
//! [`measure_single_op`] is the streaming variant: one compression per
//! launch, no amortisation, and every measured output must be identical.

use crate::config::RunConfig;
use crate::error::{Phase, ProcessFailure, TimingError};
use crate::invocation::{find_executable, Invocation, InvocationParams};
use serde::Deserialize;
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tracing::debug;

/// Warmup, measured-run and inner-iteration counts for one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPlan {
    /// Discarded launches
    pub warmup: u32,
    /// Measured launches
    pub runs: u32,
    /// Compressions per launch
    pub inner_iters: u32,
}

impl RunPlan {
    /// Creates a plan.
    pub fn new(warmup: u32, runs: u32, inner_iters: u32) -> Self {
        Self {
            warmup,
            runs,
            inner_iters,
        }
    }
}

impl From<&RunConfig> for RunPlan {
    fn from(config: &RunConfig) -> Self {
        Self::new(config.warmup, config.runs, config.inner_iters)
    }
}

/// Identifies a timing strategy in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StrategyKind {
    /// Wall-clock around each launch
    ExternalTimer,
    /// The external statistical benchmarking tool
    Hyperfine,
}

impl StrategyKind {
    /// Short label used in agreement lines.
    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::ExternalTimer => "timer",
            StrategyKind::Hyperfine => "hyperfine",
        }
    }

    /// Table heading.
    pub fn title(&self) -> &'static str {
        match self {
            StrategyKind::ExternalTimer => "External timer",
            StrategyKind::Hyperfine => "Hyperfine",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A way of turning an invocation into mean seconds per compression.
pub trait TimingStrategy {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Measures `invocation` on `input` according to `plan`.
    ///
    /// # Errors
    ///
    /// Any failed launch, or an unusable external result, fails the whole
    /// measurement; no partial average is reported.
    fn measure(
        &self,
        invocation: &Invocation,
        input: &Path,
        plan: &RunPlan,
    ) -> Result<f64, TimingError>;
}

/// Arithmetic mean of durations, in seconds.
pub fn mean_seconds(durations: &[Duration]) -> Option<f64> {
    if durations.is_empty() {
        return None;
    }
    let total: f64 = durations.iter().map(Duration::as_secs_f64).sum();
    Some(total / durations.len() as f64)
}

/// Times one launch, stdout discarded.
fn launch_timed(
    invocation: &Invocation,
    params: &InvocationParams,
) -> Result<Duration, ProcessFailure> {
    let mut command = invocation.command(params)?;
    command.stdout(Stdio::null()).stderr(Stdio::piped());

    let start = Instant::now();
    let output = command
        .output()
        .map_err(|e| ProcessFailure::spawn(invocation.display_name(), &e))?;
    let elapsed = start.elapsed();

    if !output.status.success() {
        return Err(ProcessFailure::from_status(output.status, &output.stderr));
    }
    Ok(elapsed)
}

/// Monotonic wall-clock around each full process launch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalTimer;

impl TimingStrategy for ExternalTimer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ExternalTimer
    }

    fn measure(
        &self,
        invocation: &Invocation,
        input: &Path,
        plan: &RunPlan,
    ) -> Result<f64, TimingError> {
        let params = InvocationParams::new(input, plan.inner_iters);

        for _ in 0..plan.warmup {
            launch_timed(invocation, &params).map_err(|failure| TimingError::Failed {
                phase: Phase::Warmup,
                failure,
            })?;
        }

        let mut durations = Vec::with_capacity(plan.runs as usize);
        for _ in 0..plan.runs {
            let elapsed = launch_timed(invocation, &params).map_err(|failure| {
                TimingError::Failed {
                    phase: Phase::Measured,
                    failure,
                }
            })?;
            durations.push(elapsed);
        }

        let launch_mean = mean_seconds(&durations).ok_or(TimingError::NoSamples)?;
        debug!(program = %invocation.display_name(), launch_mean, "external timer finished");
        Ok(launch_mean / f64::from(plan.inner_iters.max(1)))
    }
}

/// The external statistical benchmarking tool.
#[derive(Debug, Clone, Default)]
pub struct Hyperfine {
    search_path: Option<OsString>,
}

impl Hyperfine {
    /// Executable name of the tool.
    pub const EXECUTABLE: &'static str = "hyperfine";

    /// Creates a strategy that looks the tool up on `search_path`.
    pub fn new(search_path: Option<OsString>) -> Self {
        Self { search_path }
    }
}

impl TimingStrategy for Hyperfine {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Hyperfine
    }

    fn measure(
        &self,
        invocation: &Invocation,
        input: &Path,
        plan: &RunPlan,
    ) -> Result<f64, TimingError> {
        let hyperfine = find_executable(Self::EXECUTABLE, self.search_path.as_deref()).ok_or(
            TimingError::ToolMissing {
                tool: Self::EXECUTABLE.to_string(),
            },
        )?;

        let export = tempfile::Builder::new()
            .prefix("flatebench-hf-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| TimingError::Io(e.to_string()))?;

        let params = InvocationParams::new(input, plan.inner_iters);
        let line = invocation
            .shell_line(&params)
            .map_err(|e| TimingError::Io(format!("cannot build shell command: {}", e)))?;
        debug!(command = %line.to_string_lossy(), "running hyperfine");

        let output = std::process::Command::new(&hyperfine)
            .arg("--warmup")
            .arg(plan.warmup.to_string())
            .arg("--runs")
            .arg(plan.runs.to_string())
            .arg("--style")
            .arg("none")
            .arg("--export-json")
            .arg(export.path())
            .arg(&line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| TimingError::ExternalFailed {
                tool: Self::EXECUTABLE.to_string(),
                failure: ProcessFailure::spawn(hyperfine.display().to_string(), &e),
            })?;

        if !output.status.success() {
            return Err(TimingError::ExternalFailed {
                tool: Self::EXECUTABLE.to_string(),
                failure: ProcessFailure::from_status(output.status, &output.stderr),
            });
        }

        let json = std::fs::read_to_string(export.path())
            .map_err(|e| TimingError::Io(e.to_string()))?;
        let launch_mean = parse_hyperfine_export(&json)?;
        Ok(launch_mean / f64::from(plan.inner_iters.max(1)))
    }
}

#[derive(Debug, Deserialize)]
struct HyperfineExport {
    results: Vec<HyperfineRun>,
}

#[derive(Debug, Deserialize)]
struct HyperfineRun {
    mean: Option<f64>,
}

/// Extracts `results[0].mean` (seconds per launch) from a JSON export.
///
/// # Errors
///
/// Returns [`TimingError::UnexpectedOutput`] if the document does not have
/// the expected shape or the mean is not a finite, non-negative number.
pub fn parse_hyperfine_export(json: &str) -> Result<f64, TimingError> {
    let export: HyperfineExport = serde_json::from_str(json)
        .map_err(|e| TimingError::unexpected(format!("invalid JSON export: {}", e)))?;
    let first = export
        .results
        .first()
        .ok_or_else(|| TimingError::unexpected("no results from hyperfine"))?;
    match first.mean {
        Some(mean) if mean.is_finite() && mean >= 0.0 => Ok(mean),
        Some(mean) => Err(TimingError::unexpected(format!(
            "results[0].mean is not a valid duration ({})",
            mean
        ))),
        None => Err(TimingError::unexpected("results[0].mean missing")),
    }
}

/// Output and timings of a determinism-checked single-operation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleOpSample {
    /// Output shared by every measured run.
    pub output: Vec<u8>,
    /// Wall-clock duration of each measured run.
    pub durations: Vec<Duration>,
}

impl SingleOpSample {
    /// Mean seconds per run.
    pub fn mean_seconds(&self) -> f64 {
        mean_seconds(&self.durations).unwrap_or(0.0)
    }
}

/// Runs a single-compression invocation `plan.warmup` times (discarded)
/// then `plan.runs` times, capturing and comparing every measured output.
///
/// `plan.inner_iters` is ignored: each launch is one operation.
///
/// # Errors
///
/// Fails on any non-zero exit, or with [`TimingError::NonDeterministic`]
/// when a measured run's output differs from the first one.
pub fn measure_single_op(
    invocation: &Invocation,
    input: &Path,
    plan: &RunPlan,
) -> Result<SingleOpSample, TimingError> {
    let params = InvocationParams::new(input, 1);

    for _ in 0..plan.warmup {
        crate::invocation::run_capture(invocation, &params).map_err(|failure| {
            TimingError::Failed {
                phase: Phase::Warmup,
                failure,
            }
        })?;
    }

    let mut first: Option<Vec<u8>> = None;
    let mut durations = Vec::with_capacity(plan.runs as usize);
    for _ in 0..plan.runs {
        let start = Instant::now();
        let captured = crate::invocation::run_capture(invocation, &params).map_err(|failure| {
            TimingError::Failed {
                phase: Phase::Measured,
                failure,
            }
        })?;
        durations.push(start.elapsed());

        match &first {
            None => first = Some(captured.stdout),
            Some(expected) if *expected != captured.stdout => {
                return Err(TimingError::NonDeterministic)
            }
            Some(_) => {}
        }
    }

    let output = first.ok_or(TimingError::NoSamples)?;
    Ok(SingleOpSample { output, durations })
}
