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

//! End-to-end tests of the harness through the public API, using custom
//! providers backed by `/bin/sh` scripts.

#![cfg(unix)]

use flatebench::config::{DiscoveryConfig, RunConfig};
use flatebench::harness::run_suite;
use flatebench::invocation::Invocation;
use flatebench::registry::{Availability, Registry, Suite, ToolDescriptor, ToolProvider};
use flatebench::BenchError;
use flate2::write::{DeflateEncoder, GzEncoder};
use flate2::Compression;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

struct Scripts(Vec<(&'static str, String)>);

impl ToolProvider for Scripts {
    fn label(&self) -> &'static str {
        "scripts"
    }

    fn probe(&self, _config: &DiscoveryConfig, _suite: Suite) -> Vec<Availability> {
        self.0
            .iter()
            .map(|(name, script)| {
                Availability::Available(ToolDescriptor::single_shot(
                    *name,
                    Invocation::new("/bin/sh").arg("-c").arg(script).stdin(),
                ))
            })
            .collect()
    }
}

struct Missing;

impl ToolProvider for Missing {
    fn label(&self) -> &'static str {
        "missing"
    }

    fn probe(&self, _config: &DiscoveryConfig, _suite: Suite) -> Vec<Availability> {
        vec![Availability::Unavailable(
            "ghost (missing ghost on PATH)".to_string(),
        )]
    }
}

fn write_compressed(dir: &Path, name: &str, data: &[u8], gzip: bool) -> PathBuf {
    let bytes = if gzip {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    } else {
        let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    };
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn setup() -> (tempfile::TempDir, PathBuf, Registry) {
    let dir = tempfile::tempdir().unwrap();
    let data = vec![0u8; 1000];
    let input = dir.path().join("zeros.bin");
    fs::write(&input, &data).unwrap();

    let raw = write_compressed(dir.path(), "zeros.deflate", &data, false);
    let gz = write_compressed(dir.path(), "zeros.gz", &data, true);
    let short = write_compressed(dir.path(), "short.gz", &data[..999], true);

    let registry = Registry::new()
        .with_provider(Scripts(vec![
            ("raw-tool", format!("cat > /dev/null; cat '{}'", raw.display())),
            ("gzip-tool", format!("cat > /dev/null; cat '{}'", gz.display())),
            ("short-tool", format!("cat > /dev/null; cat '{}'", short.display())),
            ("crash-tool", "exit 2".to_string()),
        ]))
        .with_provider(Missing);
    (dir, input, registry)
}

fn run(suite: Suite, config: &RunConfig, registry: &Registry, input: &Path) -> Result<String, BenchError> {
    let discovery = DiscoveryConfig::from_env(input.parent().unwrap());
    let mut out = Vec::new();
    run_suite(suite, config, &discovery, registry, &[input], &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn test_speed_report_covers_every_tool() {
    let (_dir, input, registry) = setup();
    let config = RunConfig::speed()
        .with_runs(2)
        .with_inner_iters(2)
        .with_skip_hyperfine(true);
    let text = run(Suite::Speed, &config, &registry, &input).unwrap();

    assert!(text.starts_with(
        "Tools: raw-tool, gzip-tool, short-tool, crash-tool\n\
         Mode: 2 compression iterations per launch\n\
         Skipped: ghost (missing ghost on PATH)\n"
    ));
    assert!(text.contains("Input: "));
    assert!(text.contains("(1000 bytes)"));

    let rows: Vec<&str> = text.lines().filter(|l| l.starts_with("| ") && !l.starts_with("| Rank")).collect();
    assert_eq!(rows.len(), 4);
    // two valid tools ranked first, then the mismatching one, then the crash
    assert!(rows[0].starts_with("| 1 | "));
    assert!(rows[1].starts_with("| 2 | "));
    assert!(rows[2].starts_with("| - | short-tool | gzip |"));
    assert!(rows[3].starts_with("| - | crash-tool | err | 0 | n/a | no | ERR |"));

    assert!(text.contains("raw-deflate"));
    assert!(text.contains("- short-tool: invalid output (roundtrip mismatch)"));
    assert!(text.contains("- crash-tool: benchmark failed (warmup run failed: exit status 2)"));
}

#[test]
fn test_valid_output_of_zeros_is_smaller_than_input() {
    let (_dir, input, registry) = setup();
    let config = RunConfig::speed()
        .with_runs(1)
        .with_warmup(0)
        .with_inner_iters(1)
        .with_skip_hyperfine(true);
    let text = run(Suite::Speed, &config, &registry, &input).unwrap();
    let raw_row = text
        .lines()
        .find(|l| l.contains("| raw-tool |"))
        .unwrap();
    let cells: Vec<&str> = raw_row.split('|').map(str::trim).collect();
    let compressed: usize = cells[4].parse().unwrap();
    assert!(compressed < 1000);
    assert_eq!(cells[6], "yes");
}

#[test]
fn test_streaming_report_marks_failures_inline() {
    let (_dir, input, registry) = setup();
    let text = run(Suite::Streaming, &RunConfig::streaming(), &registry, &input).unwrap();

    assert!(!text.contains("Mode:"));
    assert!(text.contains("| Tool | Format | Compressed | Ratio | Mean ms | MiB/s | Valid |"));
    assert!(text.contains("| gzip-tool | gzip |"));
    assert!(text.contains("| crash-tool | err | - | - | - | - | no (warmup run failed: exit status 2) |"));
    let short = text.lines().find(|l| l.starts_with("| short-tool |")).unwrap();
    assert!(short.ends_with("| no |"));
}

#[test]
fn test_empty_registry_is_run_fatal() {
    let (_dir, input, _registry) = setup();
    let err = run(Suite::Speed, &RunConfig::speed(), &Registry::new(), &input).unwrap_err();
    assert_eq!(err, BenchError::NoToolsAvailable);
}
