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

//! Tool discovery and registry.
//!
//! Each competitor family is described by a [`ToolProvider`] that probes
//! the environment and answers with one [`Availability`] per tool it
//! knows about. The [`Registry`] composes providers in a fixed order and
//! never fails as a whole: a missing prerequisite becomes a skip reason.
//!
//! # Example
//!
//! ```no_run
//! use flatebench::config::DiscoveryConfig;
//! use flatebench::registry::{Registry, Suite};
//!
//! let config = DiscoveryConfig::from_env(".");
//! let discovery = Registry::standard().discover(&config, Suite::Speed);
//! for tool in &discovery.tools {
//!     println!("{}", tool.name);
//! }
//! for reason in &discovery.skipped {
//!     println!("skipped: {}", reason);
//! }
//! ```

mod helper;
mod providers;

pub use helper::build_helper;
pub use providers::{BunDeflate, GoHelper, PythonZlib, SandboxedModules, ZlibFlate};

use crate::config::DiscoveryConfig;
use crate::invocation::Invocation;
use std::collections::HashSet;
use tracing::{debug, info};

/// Which harness the tools are being assembled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suite {
    /// Inner-iteration timing; tools take the input as a path.
    Speed,
    /// Single-operation streaming comparison; tools read stdin.
    Streaming,
}

/// Identity and invocation recipe for one competitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    /// Unique name, the join key for every result of a run.
    pub name: String,
    /// Launch performing the iteration count's worth of compressions.
    pub bench: Invocation,
    /// Launch performing exactly one compression, output on stdout.
    pub single: Invocation,
}

impl ToolDescriptor {
    /// Creates a descriptor.
    pub fn new(name: impl Into<String>, bench: Invocation, single: Invocation) -> Self {
        Self {
            name: name.into(),
            bench,
            single,
        }
    }

    /// Creates a descriptor for a tool that can only compress once per
    /// launch; the bench invocation repeats it inside one shell.
    pub fn single_shot(name: impl Into<String>, single: Invocation) -> Self {
        Self {
            name: name.into(),
            bench: single.looped(),
            single,
        }
    }
}

/// Result of probing for one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// All prerequisites resolved.
    Available(ToolDescriptor),
    /// Something is missing; the reason names the tool and what is missing.
    Unavailable(String),
}

/// A discovery strategy for one family of tools.
pub trait ToolProvider {
    /// Short label used in logs.
    fn label(&self) -> &'static str;

    /// Probes the environment. Must not panic or fail: every problem is
    /// reported as [`Availability::Unavailable`].
    fn probe(&self, config: &DiscoveryConfig, suite: Suite) -> Vec<Availability>;
}

/// Outcome of discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Runnable tools, in provider order.
    pub tools: Vec<ToolDescriptor>,
    /// Human-readable skip reasons, in provider order.
    pub skipped: Vec<String>,
}

impl Discovery {
    /// Returns whether no tool is runnable.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Names of the runnable tools, in provider order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Ordered composition of tool providers.
#[derive(Default)]
pub struct Registry {
    providers: Vec<Box<dyn ToolProvider>>,
}

impl Registry {
    /// Creates a registry with no providers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the registry of every supported tool family.
    pub fn standard() -> Self {
        Self::new()
            .with_provider(SandboxedModules)
            .with_provider(PythonZlib)
            .with_provider(GoHelper)
            .with_provider(BunDeflate)
            .with_provider(ZlibFlate)
    }

    /// Appends a provider.
    pub fn with_provider(mut self, provider: impl ToolProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns whether no provider is registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Probes every provider in order.
    pub fn discover(&self, config: &DiscoveryConfig, suite: Suite) -> Discovery {
        let mut discovery = Discovery::default();
        let mut seen = HashSet::new();

        for provider in &self.providers {
            for availability in provider.probe(config, suite) {
                match availability {
                    Availability::Available(tool) => {
                        if seen.insert(tool.name.clone()) {
                            debug!(provider = provider.label(), tool = %tool.name, "tool available");
                            discovery.tools.push(tool);
                        } else {
                            discovery
                                .skipped
                                .push(format!("{} (duplicate tool name)", tool.name));
                        }
                    }
                    Availability::Unavailable(reason) => {
                        debug!(provider = provider.label(), %reason, "tool unavailable");
                        discovery.skipped.push(reason);
                    }
                }
            }
        }

        info!(
            available = discovery.tools.len(),
            skipped = discovery.skipped.len(),
            "discovery finished"
        );
        discovery
    }
}
