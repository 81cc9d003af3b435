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

//! Out-of-band build of the compiled helper.

use crate::config::DiscoveryConfig;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{info, warn};

/// Compiles the helper source with size-optimising flags.
///
/// The output path is shared by every run on the machine; the last
/// build wins.
///
/// # Errors
///
/// Returns the compiler's stderr (or the spawn error) as a string; the
/// caller turns it into a skip reason.
pub fn build_helper(go: &Path, config: &DiscoveryConfig) -> Result<PathBuf, String> {
    let output = Command::new(go)
        .arg("build")
        .arg("-trimpath")
        .arg("-ldflags=-s -w")
        .arg("-o")
        .arg(&config.helper_output)
        .arg(&config.helper_source)
        .env("GOCACHE", &config.go_cache)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| format!("failed to run {}: {}", go.display(), e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = match stderr.trim() {
            "" => format!("exit status {}", output.status.code().unwrap_or(-1)),
            text => text.replace('\n', " "),
        };
        warn!(%reason, "helper build failed");
        return Err(reason);
    }

    info!(path = %config.helper_output.display(), "built compiled helper");
    Ok(config.helper_output.clone())
}
