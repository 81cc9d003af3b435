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

//! Flatebench Command Line Interface

use clap::Parser;
use flatebench::BenchError;
use flatebench_cli::cli::Commands;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Flatebench - correctness-aware DEFLATE compressor benchmarks
///
/// Discovers the compressors available on this machine, checks that each
/// one's output round-trips to the input, and ranks them by speed.
///
/// # Examples
///
/// ```bash
/// # Inner-iteration speed benchmark with both timing strategies
/// flatebench speed corpus/alice.txt --inner-iters 50
///
/// # Streaming ratio comparison, 5 measured runs per tool
/// flatebench ratio corpus/*.bin --runs 5
/// ```
#[derive(Parser)]
#[command(name = "flatebench")]
#[command(author, version, about = "Flatebench - correctness-aware DEFLATE compressor benchmarks", long_about = None)]
struct Cli {
    /// Log discovery and timing decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "flatebench=debug"
    } else {
        "flatebench=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(BenchError::NoToolsAvailable) => {
            println!("{}", BenchError::NoToolsAvailable);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
