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

//! # Flatebench
//!
//! A correctness-aware benchmarking harness for DEFLATE-family compressors.
//! Every competitor runs on identical inputs; its output is decoded and
//! compared byte-for-byte against the input before its timing counts.
//!
//! ## Quick Start
//!
//! ```no_run
//! use flatebench::config::{DiscoveryConfig, RunConfig};
//! use flatebench::harness::run_suite;
//! use flatebench::registry::{Registry, Suite};
//!
//! let config = RunConfig::speed().with_inner_iters(50);
//! let discovery = DiscoveryConfig::from_env(".");
//! let mut stdout = std::io::stdout();
//! run_suite(
//!     Suite::Speed,
//!     &config,
//!     &discovery,
//!     &Registry::standard(),
//!     &["corpus/alice.txt"],
//!     &mut stdout,
//! )?;
//! # Ok::<(), flatebench::BenchError>(())
//! ```
//!
//! ## Methodology
//!
//! - **Discovery**: providers probe for executables and assets; anything
//!   missing becomes a skip reason, never an error
//! - **Validation**: output is trial-decoded as zlib, raw DEFLATE, then gzip
//!   and must round-trip exactly
//! - **Timing**: an external wall-clock timer and `hyperfine` both time
//!   launches that compress `inner_iters` times, divided back to one operation
//! - **Ranking**: valid and timed first, then timed but invalid, then untimed;
//!   the two strategies are checked for agreement on fastest and slowest
//!
//! ## Modules
//!
//! - [`format`]: stream detection and round-trip validation
//! - [`invocation`]: structured process invocations
//! - [`registry`]: tool discovery
//! - [`timing`]: timing strategies
//! - [`results`]: per-tool result table
//! - [`ranking`]: ordering and agreement
//! - [`report`]: text rendering
//! - [`harness`]: run orchestration

pub mod config;
pub mod error;
pub mod format;
pub mod harness;
pub mod invocation;
pub mod ranking;
pub mod registry;
pub mod report;
pub mod results;
pub mod timing;

pub use config::{DiscoveryConfig, RunConfig};
pub use error::{BenchError, ProcessFailure, Result, TimingError};
pub use format::{detect, evaluate, RatioResult, StreamFormat};
pub use harness::{run_suite, Input, SpeedHarness};
pub use registry::{Discovery, Registry, Suite, ToolDescriptor};
pub use timing::{StrategyKind, TimingStrategy};
