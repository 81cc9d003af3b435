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

//! Ratio command - streaming single-operation comparison

use flatebench::harness::run_suite;
use flatebench::{DiscoveryConfig, Registry, Result, RunConfig, Suite};
use std::io;
use std::path::PathBuf;
use tracing::debug;

/// Runs the streaming comparison over `inputs`, printing one table per
/// input to stdout.
///
/// # Errors
///
/// Returns `Err` if `--runs` is zero, an input cannot be read, or no tools
/// are available.
pub fn ratio(inputs: &[PathBuf], config: &RunConfig, discovery: &DiscoveryConfig) -> Result<()> {
    debug!(?config, root = %discovery.root.display(), "starting ratio comparison");
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_suite(
        Suite::Streaming,
        config,
        discovery,
        &Registry::standard(),
        inputs,
        &mut out,
    )
}
