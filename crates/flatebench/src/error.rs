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

//! Structured error types for the benchmarking harness.
//!
//! Errors are split by scope. [`BenchError`] is the only type that ever
//! terminates a run. [`ProcessFailure`] and [`TimingError`] are tool-scoped:
//! the driver converts them into per-tool results and keeps going.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type for run-level operations.
pub type Result<T> = std::result::Result<T, BenchError>;

/// Run-fatal error conditions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BenchError {
    /// Invalid configuration parameter.
    #[error("{parameter} {reason}")]
    InvalidConfig {
        /// Parameter name as the user spells it (e.g. `--inner-iters`)
        parameter: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Discovery found nothing runnable in this environment.
    #[error("No tools available.")]
    NoToolsAvailable,

    /// An input file could not be read.
    #[error("I/O error for '{path}': {message}")]
    Io {
        /// The file path that caused the error
        path: PathBuf,
        /// The error message
        message: String,
    },

    /// The report could not be written.
    #[error("failed to write report: {0}")]
    Output(String),
}

impl BenchError {
    /// Create an invalid-configuration error.
    pub fn invalid_config(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create an I/O error with file path context.
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }
}

impl From<std::io::Error> for BenchError {
    fn from(err: std::io::Error) -> Self {
        Self::Output(err.to_string())
    }
}

/// A child process that could not be started or did not exit cleanly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessFailure {
    /// The program could not be spawned at all.
    #[error("failed to run {program}: {message}")]
    Spawn {
        /// Program that was launched
        program: String,
        /// OS error message
        message: String,
    },

    /// The program ran and exited unsuccessfully.
    #[error("{}", describe_exit(*code, stderr))]
    Exit {
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
        /// Trimmed, lossily decoded stderr
        stderr: String,
    },
}

impl ProcessFailure {
    /// Build an exit failure from a status and the captured stderr bytes.
    pub fn from_status(status: ExitStatus, stderr: &[u8]) -> Self {
        Self::Exit {
            code: status.code(),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }

    /// Build a spawn failure.
    pub fn spawn(program: impl Into<String>, source: &std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            message: source.to_string(),
        }
    }
}

fn describe_exit(code: Option<i32>, stderr: &str) -> String {
    let status = match code {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    };
    if stderr.is_empty() {
        status
    } else {
        format!("{}: {}", status, stderr)
    }
}

/// Phase of a timing run in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Discarded warmup launches
    Warmup,
    /// Measured launches
    Measured,
}

impl Phase {
    /// Returns the phase as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Warmup => "warmup",
            Phase::Measured => "measured",
        }
    }
}

/// Failure of one timing strategy for one tool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimingError {
    /// A warmup or measured launch failed.
    #[error("{} run failed: {failure}", phase.as_str())]
    Failed {
        /// Which phase the failing launch belonged to
        phase: Phase,
        /// What went wrong
        failure: ProcessFailure,
    },

    /// The external benchmarking tool itself failed.
    #[error("{tool} failed: {failure}")]
    ExternalFailed {
        /// Name of the external tool
        tool: String,
        /// What went wrong
        failure: ProcessFailure,
    },

    /// The external benchmarking tool is not installed.
    #[error("{tool} not found in PATH")]
    ToolMissing {
        /// Name of the missing executable
        tool: String,
    },

    /// The external benchmarking tool produced output we cannot use.
    #[error("unexpected external tool output: {reason}")]
    UnexpectedOutput {
        /// What was wrong with the output
        reason: String,
    },

    /// Nothing was measured.
    #[error("no measured runs")]
    NoSamples,

    /// Two measured runs produced different bytes.
    #[error("non-deterministic output across runs")]
    NonDeterministic,

    /// Temporary file or input handling failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl TimingError {
    /// Shorthand for an unexpected-output error.
    pub fn unexpected(reason: impl Into<String>) -> Self {
        Self::UnexpectedOutput {
            reason: reason.into(),
        }
    }
}
