//! Per-rule configuration: the flat rule-name -> {enabled, policy} mapping
//! supplied by the host's config loader. The engine reads nothing else.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RuleConfig {
    pub enabled: bool,
    /// One of the rule's named policies; `None` means the rule's default.
    pub policy: Option<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            policy: None,
        }
    }
}

impl RuleConfig {
    /// The configured policy, or the given default when unset.
    pub fn policy_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.policy.as_deref().unwrap_or(default)
    }
}

/// Flat mapping from rule name to its configuration. Rules not present use
/// the default (enabled, default policy); unknown rule names are tolerated
/// so one settings file can serve hosts with different rule sets.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Settings {
    rules: HashMap<String, RuleConfig>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from YAML text of the shape:
    ///
    /// ```yaml
    /// Factory/ConsistentParentheses:
    ///   enabled: true
    ///   policy: omit_parentheses
    /// Docstring/ExcessiveSpacing:
    ///   enabled: false
    /// ```
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yml::from_str(text).context("failed to parse rule settings")
    }

    pub fn rule(&self, name: &str) -> RuleConfig {
        self.rules.get(name).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, name: impl Into<String>, config: RuleConfig) {
        self.rules.insert(name.into(), config);
    }

    /// Convenience for tests and hosts: set just a rule's policy.
    pub fn set_policy(&mut self, name: impl Into<String>, policy: impl Into<String>) {
        self.rules.insert(
            name.into(),
            RuleConfig {
                enabled: true,
                policy: Some(policy.into()),
            },
        );
    }

    pub fn disable(&mut self, name: impl Into<String>) {
        self.rules.insert(
            name.into(),
            RuleConfig {
                enabled: false,
                policy: None,
            },
        );
    }
}
