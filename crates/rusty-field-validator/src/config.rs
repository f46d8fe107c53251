// File: src/config.rs
// Purpose: Validator construction options and declarative settings from TOML

use crate::error::{Result, ValidatorError};
use crate::presets;
use crate::rule::Rule;
use crate::validity::Validity;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Called with the new validity whenever it is accepted
pub type ValidityCallback = Arc<dyn Fn(&Validity) + Send + Sync>;

/// Called when an input-time rule fails
pub type RuleErrorCallback = Arc<dyn Fn(&ValidatorError) + Send + Sync>;

/// How overlapping input-time evaluations are reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputOrdering {
    /// Whichever evaluation resolves last sets the validity
    #[default]
    Unordered,
    /// Results from inputs older than the last applied one are dropped
    LatestWins,
}

/// Options for building a [`FieldValidator`](crate::FieldValidator)
///
/// # Example
///
/// ```
/// use rusty_field_validator::{presets, Rule, ValidatorConfig};
///
/// let config = ValidatorConfig::new(|validity| println!("validity: {}", validity))
///     .input_rule(presets::min_length(3))
///     .blur_rule(Rule::pattern(r"^[a-z]+$").unwrap());
/// ```
#[derive(Clone)]
pub struct ValidatorConfig {
    pub input_rule: Option<Rule>,
    pub blur_rule: Option<Rule>,
    pub on_validity_change: ValidityCallback,
    pub on_rule_error: Option<RuleErrorCallback>,
    pub input_ordering: InputOrdering,
}

impl ValidatorConfig {
    /// Create a config with no rules
    pub fn new<F>(on_validity_change: F) -> Self
    where
        F: Fn(&Validity) + Send + Sync + 'static,
    {
        Self {
            input_rule: None,
            blur_rule: None,
            on_validity_change: Arc::new(on_validity_change),
            on_rule_error: None,
            input_ordering: InputOrdering::default(),
        }
    }

    pub fn input_rule(mut self, rule: impl Into<Rule>) -> Self {
        self.input_rule = Some(rule.into());
        self
    }

    pub fn blur_rule(mut self, rule: impl Into<Rule>) -> Self {
        self.blur_rule = Some(rule.into());
        self
    }

    /// Hook for input-time rule failures (they are logged either way)
    pub fn on_rule_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&ValidatorError) + Send + Sync + 'static,
    {
        self.on_rule_error = Some(Arc::new(f));
        self
    }

    pub fn input_ordering(mut self, ordering: InputOrdering) -> Self {
        self.input_ordering = ordering;
        self
    }
}

impl fmt::Debug for ValidatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorConfig")
            .field("input_rule", &self.input_rule)
            .field("blur_rule", &self.blur_rule)
            .field("on_rule_error", &self.on_rule_error.is_some())
            .field("input_ordering", &self.input_ordering)
            .finish()
    }
}

/// Declarative validator settings, e.g. from a `[field]` table in TOML
///
/// Each rule is given either as a regex pattern or as a preset name, never
/// both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatorSettings {
    #[serde(default)]
    pub input_pattern: Option<String>,

    #[serde(default)]
    pub input_preset: Option<String>,

    #[serde(default)]
    pub blur_pattern: Option<String>,

    #[serde(default)]
    pub blur_preset: Option<String>,

    #[serde(default)]
    pub ordering: InputOrdering,
}

impl ValidatorSettings {
    /// Parse settings from TOML text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Failed to parse validator settings")
    }

    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read validator settings: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Compile the settings into a config with the given change callback
    pub fn into_config<F>(self, on_validity_change: F) -> Result<ValidatorConfig>
    where
        F: Fn(&Validity) + Send + Sync + 'static,
    {
        let mut config = ValidatorConfig::new(on_validity_change).input_ordering(self.ordering);
        config.input_rule = resolve_rule("input", self.input_pattern, self.input_preset)?;
        config.blur_rule = resolve_rule("blur", self.blur_pattern, self.blur_preset)?;
        Ok(config)
    }
}

fn resolve_rule(slot: &str, pattern: Option<String>, preset: Option<String>) -> Result<Option<Rule>> {
    match (pattern, preset) {
        (Some(_), Some(_)) => Err(ValidatorError::Config(format!(
            "{} rule has both a pattern and a preset",
            slot
        ))),
        (Some(pattern), None) => Rule::pattern(&pattern).map(Some),
        (None, Some(name)) => presets::by_name(&name)
            .map(Some)
            .ok_or_else(|| ValidatorError::Config(format!("Unknown {} preset '{}'", slot, name))),
        (None, None) => Ok(None),
    }
}
