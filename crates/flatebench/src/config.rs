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

//! Run and discovery configuration.
//!
//! Provides the knobs a harness run is parameterised by: how many launches
//! to time, how much work each launch performs, and where discovery looks
//! for tools and assets.

use crate::error::{BenchError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Default measured runs for the inner-iteration (speed) harness.
pub const DEFAULT_SPEED_RUNS: u32 = 5;

/// Default measured runs for the streaming (ratio) harness.
pub const DEFAULT_STREAMING_RUNS: u32 = 3;

/// Default warmup runs, excluded from timing.
pub const DEFAULT_WARMUP: u32 = 1;

/// Default compression iterations per process launch.
pub const DEFAULT_INNER_ITERS: u32 = 25;

/// Directory, relative to the root, holding the sandboxed runtime's modules.
pub const DEFAULT_MODULES_DIR: &str = "examples";

/// Location of the compiled helper's source, relative to the root.
pub const DEFAULT_HELPER_SOURCE: &str = "tools/zlib-go-compress.go";

/// File name of the compiled helper inside the temporary directory.
pub const HELPER_BINARY_NAME: &str = "flatebench-zlib-go-compress";

/// Build cache used for the helper when `GOCACHE` is unset.
pub const DEFAULT_GO_CACHE: &str = "/tmp/go-build";

/// Configuration for timing runs.
///
/// # Example
///
/// ```
/// use flatebench::config::RunConfig;
///
/// let config = RunConfig::speed().with_runs(10).with_inner_iters(50);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Measured runs per tool.
    pub runs: u32,
    /// Warmup runs per tool.
    pub warmup: u32,
    /// Compression iterations performed by one launch.
    pub inner_iters: u32,
    /// Run only the external-timer strategy.
    pub skip_hyperfine: bool,
}

impl RunConfig {
    /// Defaults for the inner-iteration harness.
    pub fn speed() -> Self {
        Self {
            runs: DEFAULT_SPEED_RUNS,
            warmup: DEFAULT_WARMUP,
            inner_iters: DEFAULT_INNER_ITERS,
            skip_hyperfine: false,
        }
    }

    /// Defaults for the streaming harness, which never amortizes launches.
    pub fn streaming() -> Self {
        Self {
            runs: DEFAULT_STREAMING_RUNS,
            warmup: DEFAULT_WARMUP,
            inner_iters: 1,
            skip_hyperfine: true,
        }
    }

    /// Sets measured runs.
    pub fn with_runs(mut self, runs: u32) -> Self {
        self.runs = runs;
        self
    }

    /// Sets warmup runs.
    pub fn with_warmup(mut self, warmup: u32) -> Self {
        self.warmup = warmup;
        self
    }

    /// Sets compression iterations per launch.
    pub fn with_inner_iters(mut self, inner_iters: u32) -> Self {
        self.inner_iters = inner_iters;
        self
    }

    /// Enables or disables the statistical-tool strategy.
    pub fn with_skip_hyperfine(mut self, skip: bool) -> Self {
        self.skip_hyperfine = skip;
        self
    }

    /// Checks the configuration before any work is done.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::InvalidConfig`] if `inner_iters` or `runs` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.inner_iters < 1 {
            return Err(BenchError::invalid_config("--inner-iters", "must be >= 1"));
        }
        if self.runs < 1 {
            return Err(BenchError::invalid_config("--runs", "must be >= 1"));
        }
        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::speed()
    }
}

/// Where discovery looks for executables, assets and the helper build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Directory holding the sandboxed runtime binary and its modules.
    pub root: PathBuf,
    /// Module directory, relative to `root`.
    pub modules_dir: PathBuf,
    /// Executable search path, in `PATH` syntax.
    pub search_path: Option<OsString>,
    /// Source file of the compiled helper.
    pub helper_source: PathBuf,
    /// Output path of the compiled helper.
    pub helper_output: PathBuf,
    /// Build cache for the helper.
    pub go_cache: PathBuf,
}

impl DiscoveryConfig {
    /// Creates a configuration rooted at `root`, reading `PATH` and
    /// `GOCACHE` from the environment.
    pub fn from_env(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            helper_source: root.join(DEFAULT_HELPER_SOURCE),
            root,
            modules_dir: PathBuf::from(DEFAULT_MODULES_DIR),
            search_path: std::env::var_os("PATH"),
            helper_output: std::env::temp_dir().join(HELPER_BINARY_NAME),
            go_cache: std::env::var_os("GOCACHE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_GO_CACHE)),
        }
    }

    /// Overrides the executable search path.
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Overrides the helper source path.
    pub fn with_helper_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.helper_source = path.into();
        self
    }

    /// Overrides the helper output path.
    pub fn with_helper_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.helper_output = path.into();
        self
    }

    /// Overrides the module directory (relative to the root).
    pub fn with_modules_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.modules_dir = dir.into();
        self
    }

    /// Path of the sandboxed runtime binary.
    pub fn runtime_path(&self) -> PathBuf {
        self.root.join("qip")
    }

    /// Path of a module asset given its file name.
    pub fn module_path(&self, file_name: &str) -> PathBuf {
        self.root.join(&self.modules_dir).join(file_name)
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_defaults() {
        let config = RunConfig::speed();
        assert_eq!(config.runs, 5);
        assert_eq!(config.warmup, 1);
        assert_eq!(config.inner_iters, 25);
        assert!(!config.skip_hyperfine);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_streaming_defaults() {
        let config = RunConfig::streaming();
        assert_eq!(config.runs, 3);
        assert_eq!(config.inner_iters, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_inner_iters_rejected() {
        let err = RunConfig::speed().with_inner_iters(0).validate().unwrap_err();
        assert_eq!(err.to_string(), "--inner-iters must be >= 1");
    }

    #[test]
    fn test_zero_runs_rejected() {
        let result = RunConfig::speed().with_runs(0).validate();
        assert!(matches!(
            result,
            Err(BenchError::InvalidConfig { ref parameter, .. }) if parameter == "--runs"
        ));
    }

    #[test]
    fn test_zero_warmup_allowed() {
        assert!(RunConfig::speed().with_warmup(0).validate().is_ok());
    }

    #[test]
    fn test_discovery_paths() {
        let config = DiscoveryConfig::from_env("/work").with_modules_dir("wasm");
        assert_eq!(config.runtime_path(), PathBuf::from("/work/qip"));
        assert_eq!(
            config.module_path("zlib-compress.wasm"),
            PathBuf::from("/work/wasm/zlib-compress.wasm")
        );
        assert_eq!(
            config.helper_source,
            PathBuf::from("/work/tools/zlib-go-compress.go")
        );
    }
}
