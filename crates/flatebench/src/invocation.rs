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

//! Structured invocation descriptors.
//!
//! A tool's command line is an argv sequence with typed placeholders for
//! the input path and the iteration count, never a string template. The
//! same descriptor can be turned into a [`Command`] for direct execution
//! or into a quoted shell line for the statistical benchmarking tool.

use crate::error::ProcessFailure;
use shlex::QuoteError;
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Shell used for looped invocations. Absolute so that a restricted
/// search path cannot hide it.
pub const SHELL: &str = "/bin/sh";

/// Loop body for tools that compress exactly once per launch.
///
/// Positional parameters: `$1` iteration count, `$2` input path, then the
/// tool's own argv.
const LOOP_SCRIPT: &str = r#"n=$1; input=$2; shift 2; i=0; while [ "$i" -lt "$n" ]; do "$@" < "$input" > /dev/null || exit $?; i=$((i + 1)); done"#;

/// One argv element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Passed through unchanged.
    Literal(OsString),
    /// Replaced by the input file path.
    InputPath,
    /// Replaced by the iteration count.
    Iterations,
}

impl Arg {
    /// Shorthand for a literal argument.
    pub fn lit(value: impl Into<OsString>) -> Self {
        Arg::Literal(value.into())
    }
}

/// How the input reaches the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// The tool opens the path it is given as an argument.
    PathArgument,
    /// The input file is connected to the tool's stdin.
    Stdin,
}

/// Concrete values for the placeholders of an [`Invocation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationParams {
    /// Input file
    pub input: PathBuf,
    /// Compression iterations per launch
    pub iterations: u32,
}

impl InvocationParams {
    /// Creates parameters for one input and iteration count.
    pub fn new(input: impl Into<PathBuf>, iterations: u32) -> Self {
        Self {
            input: input.into(),
            iterations,
        }
    }
}

/// Invocation recipe for one launch of a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<Arg>,
    input: InputMode,
}

impl Invocation {
    /// Creates an invocation of `program` with no arguments that receives
    /// its input as a path argument.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            input: InputMode::PathArgument,
        }
    }

    /// Appends a literal argument.
    pub fn arg(mut self, value: impl Into<OsString>) -> Self {
        self.args.push(Arg::lit(value));
        self
    }

    /// Appends the input-path placeholder.
    pub fn input_arg(mut self) -> Self {
        self.args.push(Arg::InputPath);
        self
    }

    /// Appends the iteration-count placeholder.
    pub fn iterations_arg(mut self) -> Self {
        self.args.push(Arg::Iterations);
        self
    }

    /// Feeds the input through stdin instead of a path argument.
    pub fn stdin(mut self) -> Self {
        self.input = InputMode::Stdin;
        self
    }

    /// Program path.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Argument descriptors.
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Input mode.
    pub fn input_mode(&self) -> InputMode {
        self.input
    }

    /// Wraps a single-operation stdin invocation into one that performs
    /// the iteration count's worth of launches inside a single shell.
    ///
    /// Every value travels as a positional parameter of a fixed script,
    /// so paths and arguments are never re-parsed by the shell.
    pub fn looped(&self) -> Invocation {
        let mut args = vec![
            Arg::lit("-c"),
            Arg::lit(LOOP_SCRIPT),
            Arg::lit("sh"),
            Arg::Iterations,
            Arg::InputPath,
            Arg::Literal(self.program.clone().into_os_string()),
        ];
        args.extend(self.args.iter().cloned());
        Invocation {
            program: PathBuf::from(SHELL),
            args,
            input: InputMode::PathArgument,
        }
    }

    /// Resolves placeholders into a concrete argv (without the program).
    pub fn resolve_args(&self, params: &InvocationParams) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| match arg {
                Arg::Literal(value) => value.clone(),
                Arg::InputPath => params.input.clone().into_os_string(),
                Arg::Iterations => OsString::from(params.iterations.to_string()),
            })
            .collect()
    }

    /// Builds a ready-to-spawn command. Stdout and stderr are left for the
    /// caller to configure; stdin is connected per the input mode.
    pub fn command(&self, params: &InvocationParams) -> Result<Command, ProcessFailure> {
        let mut command = Command::new(&self.program);
        command.args(self.resolve_args(params));
        match self.input {
            InputMode::PathArgument => {
                command.stdin(Stdio::null());
            }
            InputMode::Stdin => {
                let file = File::open(&params.input).map_err(|e| ProcessFailure::Spawn {
                    program: self.display_name(),
                    message: format!("cannot open input {}: {}", params.input.display(), e),
                })?;
                command.stdin(Stdio::from(file));
            }
        }
        Ok(command)
    }

    /// Renders the invocation as a POSIX shell command line.
    ///
    /// Every word keeps its exact bytes, including non-UTF-8 paths.
    ///
    /// # Errors
    ///
    /// Fails if any word contains a NUL byte, which no shell can carry.
    pub fn shell_line(&self, params: &InvocationParams) -> Result<OsString, QuoteError> {
        let mut line = shell_quote(self.program.as_os_str())?.into_owned();
        for arg in self.resolve_args(params) {
            line.push(b' ');
            line.extend_from_slice(&shell_quote(&arg)?);
        }
        if self.input == InputMode::Stdin {
            line.extend_from_slice(b" < ");
            line.extend_from_slice(&shell_quote(params.input.as_os_str())?);
        }
        Ok(bytes_to_os(line))
    }

    /// Human-readable program name for diagnostics.
    pub fn display_name(&self) -> String {
        self.program.display().to_string()
    }
}

/// Output of one captured launch.
#[derive(Debug, Clone)]
pub struct Captured {
    /// Everything the tool wrote to stdout.
    pub stdout: Vec<u8>,
}

/// Runs an invocation once, capturing stdout. A non-zero exit is an error.
pub fn run_capture(
    invocation: &Invocation,
    params: &InvocationParams,
) -> Result<Captured, ProcessFailure> {
    let mut command = invocation.command(params)?;
    debug!(program = %invocation.display_name(), "capturing output");
    let output = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| ProcessFailure::spawn(invocation.display_name(), &e))?;
    if !output.status.success() {
        return Err(ProcessFailure::from_status(output.status, &output.stderr));
    }
    Ok(Captured {
        stdout: output.stdout,
    })
}

/// Runs an invocation once with stdout discarded.
pub fn run_discard(
    invocation: &Invocation,
    params: &InvocationParams,
) -> Result<(), ProcessFailure> {
    let mut command = invocation.command(params)?;
    let output = command
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| ProcessFailure::spawn(invocation.display_name(), &e))?;
    if !output.status.success() {
        return Err(ProcessFailure::from_status(output.status, &output.stderr));
    }
    Ok(())
}

/// Quotes a value for a POSIX shell without touching its bytes.
pub fn shell_quote(value: &OsStr) -> Result<Cow<'_, [u8]>, QuoteError> {
    match os_to_bytes(value) {
        Cow::Borrowed(bytes) => shlex::bytes::try_quote(bytes),
        Cow::Owned(bytes) => shlex::bytes::try_quote(&bytes).map(|q| Cow::Owned(q.into_owned())),
    }
}

#[cfg(unix)]
fn os_to_bytes(value: &OsStr) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(value.as_bytes())
}

#[cfg(not(unix))]
fn os_to_bytes(value: &OsStr) -> Cow<'_, [u8]> {
    match value.to_string_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}

#[cfg(unix)]
fn bytes_to_os(bytes: Vec<u8>) -> OsString {
    use std::os::unix::ffi::OsStringExt;
    OsString::from_vec(bytes)
}

#[cfg(not(unix))]
fn bytes_to_os(bytes: Vec<u8>) -> OsString {
    OsString::from(String::from_utf8_lossy(&bytes).into_owned())
}

/// Looks up an executable on a `PATH`-style search path.
pub fn find_executable(name: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let search_path = search_path?;
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
