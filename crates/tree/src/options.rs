//! Configuration options for providers.
//!
//! This module provides the `ProviderOptions` struct which controls how a
//! provider reacts to corrupt data and when it recomputes derived fields.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration options for a provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProviderOptions {
    /// What to do when a walk meets a cycle or a dangling parent.
    pub cycle_policy: CyclePolicy,

    /// Recompute `depth` in `pre_save` even when it is already set.
    ///
    /// Keeps a reparented item's own depth correct. Its descendants are
    /// not touched either way.
    pub recompute_depth: bool,
}

impl ProviderOptions {
    /// Create new provider options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cycle policy.
    pub fn cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.cycle_policy = policy;
        self
    }

    /// Shorthand for `cycle_policy(CyclePolicy::Strict)`.
    pub fn strict(self) -> Self {
        self.cycle_policy(CyclePolicy::Strict)
    }

    /// Enable or disable depth recomputation on every save.
    pub fn recompute_depth(mut self, recompute: bool) -> Self {
        self.recompute_depth = recompute;
        self
    }
}

/// How walks over parent and child links treat corrupt data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CyclePolicy {
    /// Stop the walk at the first repeated or missing item and keep what was
    /// collected so far (default).
    #[default]
    Truncate,

    /// Fail with `TreeError::Inconsistent`.
    Strict,
}

impl CyclePolicy {
    /// Returns true if corrupt data should be reported as an error.
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strict)
    }
}
