//! Read-only configuration mapping consumed by plan builders
//!
//! Keys are dotted (`repo.root`, `git.hooks.pre-commit`); values are either
//! text or an ordered list of text. The map is built once per invocation and
//! shared read-only between site runs.

use crate::error::{Error, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Upper bound on `${key}` resolution passes; deeper chains and cycles stay unresolved
const MAX_INTERPOLATION_DEPTH: usize = 16;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z0-9_.\-]+)\}").expect("placeholder pattern"));

/// A single configuration value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Text(String),
    List(Vec<String>),
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<&[&str]> for ConfigValue {
    fn from(value: &[&str]) -> Self {
        Self::List(value.iter().map(|s| (*s).to_string()).collect())
    }
}

/// Flat key → value configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigMap {
    values: BTreeMap<String, ConfigValue>,
}

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// Text value for `key`; empty text counts as absent
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(ConfigValue::Text(text)) if !text.is_empty() => Some(text),
            _ => None,
        }
    }

    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        match self.values.get(key) {
            Some(ConfigValue::List(items)) => Some(items),
            _ => None,
        }
    }

    /// Text value for `key`; a list is [`Error::InvalidConfigValue`]
    pub fn require_str(&self, key: &str) -> Result<&str> {
        match self.values.get(key) {
            Some(ConfigValue::List(_)) => Err(Error::InvalidConfigValue {
                key: key.to_string(),
                expected: "text",
            }),
            _ => self
                .get_str(key)
                .ok_or_else(|| Error::MissingConfigKey(key.to_string())),
        }
    }

    /// List value for `key`; text is [`Error::InvalidConfigValue`]
    pub fn require_list(&self, key: &str) -> Result<&[String]> {
        match self.values.get(key) {
            Some(ConfigValue::List(items)) => Ok(items),
            Some(ConfigValue::Text(_)) => Err(Error::InvalidConfigValue {
                key: key.to_string(),
                expected: "a list",
            }),
            None => Err(Error::MissingConfigKey(key.to_string())),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Overlay `other` on top of this map; keys in `other` win
    pub fn merge(&mut self, other: ConfigMap) {
        self.values.extend(other.values);
    }

    /// Replace `${key}` placeholders whose key holds text.
    ///
    /// Unknown keys and list-valued keys are left as written.
    pub fn expand(&self, text: &str) -> String {
        PLACEHOLDER
            .replace_all(text, |caps: &Captures<'_>| match self.get_str(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Resolve references between values until nothing changes
    pub fn interpolate(&mut self) {
        for _ in 0..MAX_INTERPOLATION_DEPTH {
            let snapshot = self.clone();
            let mut changed = false;

            for value in self.values.values_mut() {
                match value {
                    ConfigValue::Text(text) => {
                        let expanded = snapshot.expand(text);
                        if expanded != *text {
                            *text = expanded;
                            changed = true;
                        }
                    }
                    ConfigValue::List(items) => {
                        for item in items.iter_mut() {
                            let expanded = snapshot.expand(item);
                            if expanded != *item {
                                *item = expanded;
                                changed = true;
                            }
                        }
                    }
                }
            }

            if !changed {
                return;
            }
        }
        log::warn!(
            "configuration references still unresolved after {MAX_INTERPOLATION_DEPTH} passes"
        );
    }
}
