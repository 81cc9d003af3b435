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

//! Flatebench CLI library for command-line parsing and execution.
//!
//! # Commands
//!
//! - **speed**: inner-iteration benchmark timed by an external timer and by
//!   `hyperfine`, with ranking tables and an agreement check
//! - **ratio**: single-operation streaming comparison of ratio, latency and
//!   throughput, with a determinism check across runs
//!
//! Both commands exit with status 1 when discovery finds no tools, and 0
//! otherwise even if individual tools fail.

pub mod cli;
pub mod commands;
