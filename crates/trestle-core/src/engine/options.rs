// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Parse configuration and cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;

/// Default bound on nested rule invocations.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Tunables for one parse.
///
/// Deserializable so front-ends can read it from a config file:
///
/// ```
/// use trestle_core::engine::ParseOptions;
///
/// let options: ParseOptions = toml::from_str("max-depth = 200").unwrap();
/// assert_eq!(options.max_depth, 200);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ParseOptions {
    /// Nested rule invocations allowed before the parser reports the
    /// input as too deeply nested and stops descending.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A shared flag checked at the start of every rule.
///
/// Cloning yields a handle to the same flag, so an editor can keep one
/// clone and cancel a parse running on another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. The parse stops at its next rule boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
