/// Proxy filter and display-name table
use std::collections::HashMap;

use crate::config::ConfigError;

/// One configured proxy: the name HAProxy reports and the name we emit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub raw: String,
    pub display: String,
}

/// Built once at startup, read-only afterwards.
///
/// A non-empty table doubles as an inclusion filter: proxies not listed are
/// never parsed or reported. An empty table lets every front-end and back-end
/// row through under its raw name.
#[derive(Debug, Default)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
    index: HashMap<String, usize>,
}

impl AliasTable {
    /// Build from `rawName[,alias]` entries; display names are `<source>-<alias or raw>`.
    pub fn from_entries<S: AsRef<str>>(source: &str, entries: &[S]) -> Result<Self, ConfigError> {
        let source = source.trim();
        let mut table = AliasTable {
            entries: Vec::with_capacity(entries.len()),
            index: HashMap::with_capacity(entries.len()),
        };

        for entry in entries {
            // Only the first two tokens count; anything after a second comma is ignored
            let mut tokens = entry.as_ref().split(',');
            let raw = tokens.next().unwrap_or("").trim();
            let alias = tokens.next().unwrap_or("").trim();
            if raw.is_empty() {
                return Err(ConfigError::EmptyProxy);
            }
            if table.index.contains_key(raw) {
                return Err(ConfigError::DuplicateProxy(raw.to_string()));
            }

            let shown = if alias.is_empty() { raw } else { alias };
            table.index.insert(raw.to_string(), table.entries.len());
            table.entries.push(AliasEntry {
                raw: raw.to_string(),
                display: format!("{}-{}", source, shown),
            });
        }

        Ok(table)
    }

    /// Whether the table restricts which proxies are processed
    pub fn is_active(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Whether a row for `raw` should be kept
    pub fn accepts(&self, raw: &str) -> bool {
        !self.is_active() || self.index.contains_key(raw)
    }

    /// Display name for `raw`; the raw name itself when no entry matches
    pub fn display_name<'a>(&'a self, raw: &'a str) -> &'a str {
        match self.index.get(raw) {
            Some(&idx) => &self.entries[idx].display,
            None => raw,
        }
    }

    /// Configured entries in configuration order
    pub fn entries(&self) -> &[AliasEntry] {
        &self.entries
    }
}
