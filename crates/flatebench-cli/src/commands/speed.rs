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

//! Speed command - inner-iteration benchmark with two timing strategies

use flatebench::harness::run_suite;
use flatebench::{DiscoveryConfig, Registry, Result, RunConfig, Suite};
use std::io;
use std::path::PathBuf;
use tracing::debug;

/// Runs the inner-iteration benchmark over `inputs`, printing the report
/// to stdout.
///
/// # Errors
///
/// Returns `Err` if:
/// - `--inner-iters` or `--runs` is zero
/// - An input cannot be read
/// - No tools are available
pub fn speed(inputs: &[PathBuf], config: &RunConfig, discovery: &DiscoveryConfig) -> Result<()> {
    debug!(?config, root = %discovery.root.display(), "starting speed benchmark");
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_suite(
        Suite::Speed,
        config,
        discovery,
        &Registry::standard(),
        inputs,
        &mut out,
    )
}
