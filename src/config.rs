use log::debug;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{CiteReportError, Result};

/// Style choices for one report run.
///
/// Values are kept as plain strings, the way they arrive from a settings form or a
/// JSON file. A key that is absent or holds the literal `"None"` means "no directive".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleConfig {
    options: BTreeMap<String, String>,
}

impl StyleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.options.insert(key.into(), value.into());
    }

    /// Look up an option, treating `"None"` the same as an absent key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options
            .get(key)
            .map(String::as_str)
            .filter(|value| *value != "None")
    }

    /// Same as [`get`](Self::get) but empty when unset
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    /// Interpret an option as a boolean switch
    pub fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            None => false,
            Some(value) => !matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "" | "0" | "false" | "no" | "off"
            ),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Prefix selecting which set of identifier policies applies (`type` key)
    pub fn mode_prefix(&self) -> &str {
        self.get_or_empty("type")
    }

    /// Look up `<type><name>`, e.g. `searchMRZbl` when `type = "search"`
    pub fn mode_option(&self, name: &str) -> &str {
        let key = format!("{}{}", self.mode_prefix(), name);
        self.get(&key).unwrap_or("")
    }

    pub fn is_query(&self) -> bool {
        self.flag("query")
    }

    pub fn is_html(&self) -> bool {
        self.flag("html")
    }

    pub fn gen_bibitems(&self) -> bool {
        self.flag("genBibitems")
    }

    pub fn sort_by(&self) -> &str {
        self.get_or_empty("sortBy")
    }

    pub fn bibitem_style(&self) -> &str {
        self.get_or_empty("bibitemStyle")
    }

    /// Style directives as `(role, command)` pairs.
    ///
    /// A key names a role when it contains `Style`; the role is everything before the last
    /// occurrence (`authorStyle` -> `author`). The command keeps only word characters, so
    /// `\textbf` and `textbf` are the same directive. Roles whose command strips to nothing
    /// are still reported, with an empty command.
    pub fn style_directives(&self) -> Vec<(String, String)> {
        let mut directives = Vec::new();
        for (key, value) in self.iter() {
            let Some(idx) = key.rfind("Style") else {
                continue;
            };
            if value == "None" {
                continue;
            }
            let role = key[..idx].to_string();
            let command: String = value
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            directives.push((role, command));
        }
        directives
    }

    /// Parse a JSON object of options
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        let Value::Object(map) = value else {
            return Err(CiteReportError::Config(
                "style configuration must be a JSON object".to_string(),
            ));
        };

        let mut config = Self::new();
        for (key, value) in map {
            match value {
                Value::Null => {
                    debug!("Option {} is null, treating it as unset", key);
                }
                Value::String(s) => config.set(key, s),
                Value::Bool(b) => config.set(key, b.to_string()),
                Value::Number(n) => config.set(key, n.to_string()),
                Value::Array(_) | Value::Object(_) => {
                    return Err(CiteReportError::Config(format!(
                        "option {} must be a string, number or boolean",
                        key
                    )));
                }
            }
        }
        Ok(config)
    }

    /// Load options from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Apply a `key=value` override as given on the command line
    pub fn apply_override(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            CiteReportError::Config(format!("expected key=value, got {:?}", assignment))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(CiteReportError::Config(format!(
                "missing option name in {:?}",
                assignment
            )));
        }
        self.set(key, value.trim());
        Ok(())
    }
}
