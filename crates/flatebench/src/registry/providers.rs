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

//! Concrete tool providers.

use super::{build_helper, Availability, Suite, ToolDescriptor, ToolProvider};
use crate::config::DiscoveryConfig;
use crate::invocation::{find_executable, Invocation};
use std::path::Path;

/// Compression modules run by the sandboxed runtime, by tool name.
pub const RUNTIME_MODULES: &[(&str, &str)] = &[
    ("qip-zlib-stored", "zlib-compress.wasm"),
    ("qip-zlib-fixed", "zlib-compress-fixed-huffman.wasm"),
    ("qip-zlib-dynamic", "zlib-compress-dynamic-huffman.wasm"),
    ("qip-zlib-dynamic-opt", "zlib-compress-dynamic-huffman-opt.wasm"),
];

fn missing_on_path(tool: &str, executable: &str) -> Availability {
    Availability::Unavailable(format!("{} (missing {} on PATH)", tool, executable))
}

fn locate(config: &DiscoveryConfig, executable: &str) -> Option<std::path::PathBuf> {
    find_executable(executable, config.search_path.as_deref())
}

/// Modules executed by the sandboxed runtime binary found at the root.
#[derive(Debug, Clone, Copy, Default)]
pub struct SandboxedModules;

impl ToolProvider for SandboxedModules {
    fn label(&self) -> &'static str {
        "sandboxed-runtime"
    }

    fn probe(&self, config: &DiscoveryConfig, suite: Suite) -> Vec<Availability> {
        let runtime = config.runtime_path();
        if !runtime.is_file() {
            return vec![Availability::Unavailable(format!(
                "qip (missing {})",
                runtime.display()
            ))];
        }

        RUNTIME_MODULES
            .iter()
            .map(|&(name, file)| {
                let module = config.module_path(file);
                if !module.is_file() {
                    return Availability::Unavailable(format!(
                        "{} (missing {})",
                        name,
                        module.display()
                    ));
                }
                Availability::Available(module_tool(name, &runtime, &module, suite))
            })
            .collect()
    }
}

fn module_tool(name: &str, runtime: &Path, module: &Path, suite: Suite) -> ToolDescriptor {
    match suite {
        Suite::Speed => ToolDescriptor::new(
            name,
            Invocation::new(runtime)
                .arg("bench")
                .arg("-i")
                .input_arg()
                .arg("-r")
                .iterations_arg()
                .arg(module),
            Invocation::new(runtime)
                .arg("run")
                .arg("-i")
                .input_arg()
                .arg(module),
        ),
        Suite::Streaming => ToolDescriptor::single_shot(
            name,
            Invocation::new(runtime)
                .arg("run")
                .arg("-i")
                .arg("-")
                .arg(module)
                .stdin(),
        ),
    }
}

/// Repeats `zlib.compress` over a file named on the command line.
const PY_FILE_REPEAT: &str = "\
import pathlib, sys, zlib
data = pathlib.Path(sys.argv[1]).read_bytes()
n = int(sys.argv[2])
out = b''
for _ in range(n):
    out = zlib.compress(data, 9)
sys.stdout.buffer.write(out)
";

const PY_FILE_ONCE: &str = "\
import pathlib, sys, zlib
sys.stdout.buffer.write(zlib.compress(pathlib.Path(sys.argv[1]).read_bytes(), 9))
";

fn py_stdin_once(level: u32) -> String {
    format!(
        "import sys, zlib; sys.stdout.buffer.write(zlib.compress(sys.stdin.buffer.read(), {}))",
        level
    )
}

/// The scripting language's built-in zlib binding.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonZlib;

impl ToolProvider for PythonZlib {
    fn label(&self) -> &'static str {
        "python"
    }

    fn probe(&self, config: &DiscoveryConfig, suite: Suite) -> Vec<Availability> {
        let Some(python) = locate(config, "python3") else {
            return vec![missing_on_path("python-zlib", "python3")];
        };

        match suite {
            Suite::Speed => vec![Availability::Available(ToolDescriptor::new(
                "python-zlib-9",
                Invocation::new(&python)
                    .arg("-c")
                    .arg(PY_FILE_REPEAT)
                    .input_arg()
                    .iterations_arg(),
                Invocation::new(&python).arg("-c").arg(PY_FILE_ONCE).input_arg(),
            ))],
            Suite::Streaming => [6, 9]
                .into_iter()
                .map(|level| {
                    Availability::Available(ToolDescriptor::single_shot(
                        format!("python-zlib-{}", level),
                        Invocation::new(&python).arg("-c").arg(py_stdin_once(level)).stdin(),
                    ))
                })
                .collect(),
        }
    }
}

/// The compiled helper, built from source during discovery.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoHelper;

impl ToolProvider for GoHelper {
    fn label(&self) -> &'static str {
        "go-helper"
    }

    fn probe(&self, config: &DiscoveryConfig, suite: Suite) -> Vec<Availability> {
        let Some(go) = locate(config, "go") else {
            return vec![missing_on_path("go-zlib", "go")];
        };
        if !config.helper_source.is_file() {
            return vec![Availability::Unavailable(format!(
                "go-zlib (missing {})",
                config.helper_source.display()
            ))];
        }
        let helper = match build_helper(&go, config) {
            Ok(helper) => helper,
            Err(reason) => {
                return vec![Availability::Unavailable(format!(
                    "go-zlib helper build failed ({})",
                    reason
                ))]
            }
        };

        match suite {
            Suite::Speed => vec![Availability::Available(ToolDescriptor::new(
                "go-zlib-9",
                Invocation::new(&helper)
                    .arg("-level")
                    .arg("9")
                    .arg("-file")
                    .input_arg()
                    .arg("-iters")
                    .iterations_arg(),
                Invocation::new(&helper)
                    .arg("-level")
                    .arg("9")
                    .arg("-file")
                    .input_arg()
                    .arg("-iters")
                    .arg("1"),
            ))],
            Suite::Streaming => [6, 9]
                .into_iter()
                .map(|level| {
                    let base = Invocation::new(&helper).arg("-level").arg(level.to_string());
                    Availability::Available(ToolDescriptor::new(
                        format!("go-zlib-{}", level),
                        base.clone().arg("-iters").iterations_arg().stdin(),
                        base.stdin(),
                    ))
                })
                .collect(),
        }
    }
}

const BUN_FILE_REPEAT: &str = "\
const input = new Uint8Array(await Bun.file(process.argv[1]).arrayBuffer());
const n = Number(process.argv[2]);
let out = new Uint8Array();
for (let i = 0; i < n; i++) out = Bun.deflateSync(input, { level: 9 });
await Bun.write(Bun.stdout, out);
";

const BUN_FILE_ONCE: &str = "\
const input = new Uint8Array(await Bun.file(process.argv[1]).arrayBuffer());
await Bun.write(Bun.stdout, Bun.deflateSync(input, { level: 9 }));
";

fn bun_stdin_once(options: &str) -> String {
    format!(
        "const input = new Uint8Array(await new Response(Bun.stdin.stream()).arrayBuffer()); \
         await Bun.write(Bun.stdout, Bun.deflateSync(input{}));",
        options
    )
}

/// The JavaScript runtime's built-in DEFLATE (emits raw DEFLATE).
#[derive(Debug, Clone, Copy, Default)]
pub struct BunDeflate;

impl ToolProvider for BunDeflate {
    fn label(&self) -> &'static str {
        "bun"
    }

    fn probe(&self, config: &DiscoveryConfig, suite: Suite) -> Vec<Availability> {
        let Some(bun) = locate(config, "bun") else {
            return vec![missing_on_path("bun-deflate", "bun")];
        };

        match suite {
            Suite::Speed => vec![Availability::Available(ToolDescriptor::new(
                "bun-deflate-9",
                Invocation::new(&bun)
                    .arg("-e")
                    .arg(BUN_FILE_REPEAT)
                    .input_arg()
                    .iterations_arg(),
                Invocation::new(&bun).arg("-e").arg(BUN_FILE_ONCE).input_arg(),
            ))],
            Suite::Streaming => [("bun-deflate-default", ""), ("bun-deflate-9", ", { level: 9 }")]
                .into_iter()
                .map(|(name, options)| {
                    Availability::Available(ToolDescriptor::single_shot(
                        name,
                        Invocation::new(&bun).arg("-e").arg(bun_stdin_once(options)).stdin(),
                    ))
                })
                .collect(),
        }
    }
}

/// The command-line zlib filter; one compression per launch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZlibFlate;

impl ToolProvider for ZlibFlate {
    fn label(&self) -> &'static str {
        "zlib-flate"
    }

    fn probe(&self, config: &DiscoveryConfig, _suite: Suite) -> Vec<Availability> {
        let Some(zlib_flate) = locate(config, "zlib-flate") else {
            return vec![missing_on_path("zlib-flate", "zlib-flate")];
        };
        vec![Availability::Available(ToolDescriptor::single_shot(
            "zlib-flate",
            Invocation::new(zlib_flate).arg("-compress").stdin(),
        ))]
    }
}
