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

//! CLI command definitions and argument parsing.

use crate::commands;
use clap::{Args, Subcommand};
use flatebench::config::{DEFAULT_INNER_ITERS, DEFAULT_SPEED_RUNS, DEFAULT_STREAMING_RUNS, DEFAULT_WARMUP};
use flatebench::{DiscoveryConfig, Result, RunConfig};
use std::path::PathBuf;

/// Where to look for tools.
#[derive(Args, Debug, Clone)]
pub struct DiscoveryArgs {
    /// Directory holding the sandboxed runtime binary and its modules
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Source of the compiled helper (defaults to <ROOT>/tools/zlib-go-compress.go)
    #[arg(long, value_name = "FILE")]
    pub helper_source: Option<PathBuf>,
}

impl DiscoveryArgs {
    /// Builds the discovery configuration, reading `PATH` from the
    /// environment.
    pub fn to_config(&self) -> DiscoveryConfig {
        let config = DiscoveryConfig::from_env(&self.root);
        match &self.helper_source {
            Some(source) => config.with_helper_source(source),
            None => config,
        }
    }
}

/// Top-level CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Benchmark compression speed with repeated in-launch iterations
    ///
    /// Every tool compresses each input `--inner-iters` times per launch.
    /// Launches are timed by an external timer and, unless skipped, by
    /// hyperfine; both means are divided back to one compression.
    Speed {
        /// Input files
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Measured runs per tool
        #[arg(long, default_value_t = DEFAULT_SPEED_RUNS)]
        runs: u32,

        /// Warmup runs per tool, excluded from timing
        #[arg(long, default_value_t = DEFAULT_WARMUP)]
        warmup: u32,

        /// Compression iterations per launch
        #[arg(long, default_value_t = DEFAULT_INNER_ITERS)]
        inner_iters: u32,

        /// Only run the external timer
        #[arg(long)]
        skip_hyperfine: bool,

        #[command(flatten)]
        discovery: DiscoveryArgs,
    },

    /// Compare compression ratio and single-operation speed across tools
    ///
    /// Every tool reads each input on stdin once per run; all measured
    /// outputs must be identical.
    Ratio {
        /// Input files to compress
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Measured runs per tool per input
        #[arg(long, default_value_t = DEFAULT_STREAMING_RUNS)]
        runs: u32,

        /// Warmup runs per tool per input, excluded from timing
        #[arg(long, default_value_t = DEFAULT_WARMUP)]
        warmup: u32,

        #[command(flatten)]
        discovery: DiscoveryArgs,
    },
}

impl Commands {
    /// Execute the command.
    ///
    /// # Errors
    ///
    /// Returns a run-level error: invalid options, an unreadable input, no
    /// tools discovered, or a failure writing the report.
    pub fn execute(self) -> Result<()> {
        match self {
            Commands::Speed {
                inputs,
                runs,
                warmup,
                inner_iters,
                skip_hyperfine,
                discovery,
            } => {
                let config = RunConfig::speed()
                    .with_runs(runs)
                    .with_warmup(warmup)
                    .with_inner_iters(inner_iters)
                    .with_skip_hyperfine(skip_hyperfine);
                commands::speed(&inputs, &config, &discovery.to_config())
            }
            Commands::Ratio {
                inputs,
                runs,
                warmup,
                discovery,
            } => {
                let config = RunConfig::streaming().with_runs(runs).with_warmup(warmup);
                commands::ratio(&inputs, &config, &discovery.to_config())
            }
        }
    }
}
