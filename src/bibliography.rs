use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::{CiteReportError, Result};

// A record starts with `@` at the beginning of a line; `@` inside values does not split
static BIBTEX_RECORD_START_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*@").expect("Invalid BibTeX record start regex pattern")
});
static BIBTEX_ENTRY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@\s*([a-zA-Z]+)\s*\{\s*([^,\s]+)\s*,")
        .expect("Invalid BibTeX entry regex pattern")
});
static BIBTEX_FIELD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([a-zA-Z][\w\-]*)\s*=\s*(?:\{((?:[^{}]|\{[^{}]*\})*)\}|"([^"]*)"|(\d+))"#)
        .expect("Invalid BibTeX field regex pattern")
});

/// Fields kept by [`BibEntry::tidy`]
const TIDY_FIELDS: &[&str] = &[
    "author", "title", "journal", "number", "volume", "pages", "year", "editor", "booktitle",
    "series", "doi",
];

/// Prefix harvested citation-database keys carry
const HARVESTED_KEY_PREFIX: &str = "WOS:";

/// Custom bibliography entry structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibEntry {
    pub key: String,
    pub entry_type: String,
    pub fields: HashMap<String, String>,
}

/// Builder for BibEntry to allow for cleaner creation
pub struct BibEntryBuilder {
    key: String,
    entry_type: String,
    fields: HashMap<String, String>,
}

impl BibEntryBuilder {
    /// Create a new BibEntryBuilder with the required key and entry type
    pub fn new(key: impl Into<String>, entry_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entry_type: entry_type.into(),
            fields: HashMap::new(),
        }
    }

    /// Add a field to the BibEntry
    pub fn field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(field.into().to_lowercase(), value.into());
        self
    }

    /// Build the BibEntry
    pub fn build(self) -> BibEntry {
        BibEntry {
            key: self.key,
            entry_type: self.entry_type,
            fields: self.fields,
        }
    }
}

impl BibEntry {
    /// Create a new BibEntry using the builder pattern
    pub fn builder(key: impl Into<String>, entry_type: impl Into<String>) -> BibEntryBuilder {
        BibEntryBuilder::new(key, entry_type)
    }

    pub fn get(&self, field: &str) -> Option<&String> {
        self.fields.get(field)
    }

    /// Serialize to a BibTeX record. Fields are sorted so compiler input is stable.
    pub fn to_bibtex(&self) -> String {
        let mut output = format!("@{}{{{},\n", self.entry_type, self.key);

        let mut fields: Vec<_> = self.fields.keys().collect();
        fields.sort();

        for field in fields {
            if let Some(value) = self.fields.get(field) {
                output.push_str(&format!("  {} = {{{}}},\n", field, value));
            }
        }

        output.push_str("}\n");
        output
    }

    /// Clean up a record harvested from the citation database.
    ///
    /// Drops the database key prefix, protects the title's capitalisation, prefers the ISO
    /// journal abbreviation, and discards every field the style does not use. Citation
    /// metadata (`impact*`, `cited`, `citednoself`, `citing`) is kept.
    pub fn tidy(&mut self) {
        if let Some(stripped) = self.key.strip_prefix(HARVESTED_KEY_PREFIX) {
            self.key = stripped.to_string();
        }

        if let Some(title) = self.fields.get("title") {
            if !is_brace_wrapped(title) {
                let wrapped = format!("{{{}}}", title);
                self.fields.insert("title".to_string(), wrapped);
            }
        }

        if let Some(iso) = self.fields.remove("journal-iso") {
            self.fields.insert("journal".to_string(), iso);
        }

        self.fields.retain(|field, _| {
            TIDY_FIELDS.contains(&field.as_str())
                || field.starts_with("impact")
                || matches!(field.as_str(), "cited" | "citednoself" | "citing")
        });
    }

    /// Journal impact factors as `(label, value)`, e.g. `("2015", "1.234")` for `impact2015`
    pub fn impact_factors(&self) -> Vec<(String, String)> {
        let mut factors: Vec<(String, String)> = self
            .fields
            .iter()
            .filter_map(|(field, value)| {
                field
                    .strip_prefix("impact")
                    .map(|label| (label.to_string(), value.clone()))
            })
            .collect();
        factors.sort();
        factors
    }

    /// Keys of the papers citing this one
    pub fn citing_keys(&self) -> Vec<String> {
        self.get("citing")
            .map(|citing| {
                citing
                    .split(',')
                    .map(|key| key.trim().to_string())
                    .filter(|key| !key.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// One-paragraph summary of impact factors and citation counts, if the entry has any
    pub fn citation_summary(&self) -> Option<String> {
        let mut parts = Vec::new();

        let factors = self.impact_factors();
        if !factors.is_empty() {
            let listed: Vec<String> = factors
                .iter()
                .map(|(label, value)| format!("{}: {}.", label, value))
                .collect();
            parts.push(format!("Journal impact factors: {}", listed.join(" ")));
        }

        if let Some(cited) = self.get("cited") {
            let noself = self.get("citednoself").map(String::as_str).unwrap_or("0");
            parts.push(format!(
                "Cited by {} papers. Excluding self-citations: {}",
                cited, noself
            ));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }
}

/// Whether `value` is one braced group, i.e. its first `{` closes at the very end.
/// `{A} and {B}` starts and ends with braces but is two groups.
fn is_brace_wrapped(value: &str) -> bool {
    if !value.starts_with('{') {
        return false;
    }
    let mut depth = 0usize;
    for (idx, c) in value.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return idx + c.len_utf8() == value.len();
                }
            }
            _ => {}
        }
    }
    false
}

/// Ordered bibliography collection. Keys are unique; re-inserting replaces in place.
#[derive(Default, Clone)]
pub struct Bibliography {
    entries: Vec<BibEntry>,
}

impl fmt::Debug for Bibliography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bibliography")
            .field("entries_count", &self.entries.len())
            .field("entries", &self.entries)
            .finish()
    }
}

impl Bibliography {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn insert(&mut self, entry: BibEntry) {
        match self.entries.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, key: &str) -> Option<&BibEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BibEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BibEntry> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize all entries in order, as compiler input
    pub fn to_bibtex(&self) -> String {
        self.entries
            .iter()
            .map(BibEntry::to_bibtex)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Entries citing `entry`, in bibliography order
    pub fn cited_by(&self, entry: &BibEntry) -> Bibliography {
        let citing: HashSet<String> = entry.citing_keys().into_iter().collect();
        Bibliography {
            entries: self
                .entries
                .iter()
                .filter(|e| citing.contains(&e.key))
                .cloned()
                .collect(),
        }
    }

    /// Read `@type{key, field = {value}, ...}` records.
    ///
    /// Only handles what the harvesting side writes: braced, quoted or bare numeric values
    /// with at most one level of nested braces. `@comment`, `@preamble` and `@string` blocks
    /// are skipped.
    pub fn parse_bib(content: &str) -> Result<Self> {
        let mut bibliography = Self::new();

        for part in BIBTEX_RECORD_START_REGEX.split(content).skip(1) {
            let record = format!("@{}", part.trim_end());
            let Some(captures) = BIBTEX_ENTRY_REGEX.captures(&record) else {
                let kind = part.split(|c: char| c == '{' || c.is_whitespace()).next();
                match kind.map(str::to_lowercase).as_deref() {
                    Some("comment") | Some("preamble") | Some("string") => continue,
                    _ => {
                        let head: String = record.chars().take(40).collect();
                        warn!("Skipping unreadable BibTeX record starting with {:?}", head);
                        continue;
                    }
                }
            };

            let entry_type = captures[1].to_lowercase();
            let key = captures[2].to_string();
            let body = &record[captures.get(0).map_or(0, |m| m.end())..];

            let mut builder = BibEntryBuilder::new(key, entry_type);
            for cap in BIBTEX_FIELD_REGEX.captures_iter(body) {
                let value = cap
                    .get(2)
                    .or_else(|| cap.get(3))
                    .or_else(|| cap.get(4))
                    .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
                    .unwrap_or_default();
                builder = builder.field(&cap[1], value);
            }
            bibliography.insert(builder.build());
        }

        debug!("Parsed {} BibTeX entries", bibliography.len());
        Ok(bibliography)
    }

    /// Read a JSON array of entry objects, each with `ID`, `ENTRYTYPE` and its fields
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        let Value::Array(items) = value else {
            return Err(CiteReportError::InvalidEntry(
                "expected a JSON array of entries".to_string(),
            ));
        };

        let mut bibliography = Self::new();
        for (idx, item) in items.into_iter().enumerate() {
            let Value::Object(map) = item else {
                return Err(CiteReportError::InvalidEntry(format!(
                    "entry {} is not a JSON object",
                    idx
                )));
            };
            let key = map
                .get("ID")
                .and_then(Value::as_str)
                .ok_or_else(|| CiteReportError::InvalidEntry(format!("entry {} has no ID", idx)))?;
            let entry_type = map
                .get("ENTRYTYPE")
                .and_then(Value::as_str)
                .unwrap_or("article");

            let mut builder = BibEntryBuilder::new(key, entry_type);
            for (field, value) in &map {
                if field == "ID" || field == "ENTRYTYPE" {
                    continue;
                }
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null => continue,
                    Value::Array(_) | Value::Object(_) => {
                        return Err(CiteReportError::InvalidEntry(format!(
                            "field {} of entry {} is not a scalar",
                            field, key
                        )));
                    }
                };
                builder = builder.field(field, text);
            }
            bibliography.insert(builder.build());
        }

        Ok(bibliography)
    }
}

impl FromIterator<BibEntry> for Bibliography {
    fn from_iter<I: IntoIterator<Item = BibEntry>>(iter: I) -> Self {
        let mut bibliography = Bibliography::new();
        for entry in iter {
            bibliography.insert(entry);
        }
        bibliography
    }
}
