/// HAProxy CSV stats parsing
use std::collections::HashMap;

use crate::alias::AliasTable;
use crate::constants::{HEADER_PREFIX, ROLE_BACKEND, ROLE_FRONTEND};

/// One cell of the stats table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
    Absent,
}

impl FieldValue {
    /// Type a raw cell: empty -> Absent, whole base-10 integer -> Integer, else trimmed text
    pub fn parse(cell: &str) -> FieldValue {
        if cell.is_empty() {
            return FieldValue::Absent;
        }
        let trimmed = cell.trim();
        match trimmed.parse::<i64>() {
            Ok(n) => FieldValue::Integer(n),
            Err(_) => FieldValue::Text(trimmed.to_string()),
        }
    }
}

/// Field name -> value for one proxy in one poll
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityRecord {
    fields: HashMap<String, FieldValue>,
}

impl EntityRecord {
    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Integer value of `key`; None when the field is absent, missing or textual
    pub fn integer(&self, key: &str) -> Option<i64> {
        match self.fields.get(key) {
            Some(FieldValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: &str, value: FieldValue) {
        self.fields.insert(key.to_string(), value);
    }
}

/// Every accepted proxy of one poll, in the order they first appeared
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitySnapshot {
    order: Vec<String>,
    records: HashMap<String, EntityRecord>,
}

impl EntitySnapshot {
    /// Store a record; a later row with the same name replaces the earlier one
    pub fn insert(&mut self, name: &str, record: EntityRecord) {
        if self.records.insert(name.to_string(), record).is_none() {
            self.order.push(name.to_string());
        }
    }

    pub fn get(&self, name: &str) -> Option<&EntityRecord> {
        self.records.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Column names of the stats table, in column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldKeys(Vec<String>);

impl FieldKeys {
    /// Parse a header line such as `# pxname,svname,qcur,...,`
    pub fn from_header(line: &str) -> FieldKeys {
        let line = line.trim_end_matches('\r');
        let line = line.strip_prefix(HEADER_PREFIX).unwrap_or(line);
        FieldKeys(
            line.split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parser holding the header keys discovered on the first report.
///
/// Later reports are read with the cached key order; their own header line is
/// skipped, not re-validated.
#[derive(Debug, Default)]
pub struct ReportParser {
    keys: Option<FieldKeys>,
}

impl ReportParser {
    pub fn new() -> Self {
        ReportParser { keys: None }
    }

    #[cfg(test)]
    pub fn keys(&self) -> Option<&FieldKeys> {
        self.keys.as_ref()
    }

    /// Parse a full CSV report into a snapshot of front-end and back-end rows.
    pub fn parse(&mut self, body: &str, aliases: &AliasTable) -> EntitySnapshot {
        let mut lines = body.split('\n');
        let header = lines.next().unwrap_or("");

        if self.keys.is_none() {
            let keys = FieldKeys::from_header(header);
            if !keys.is_empty() {
                self.keys = Some(keys);
            }
        }

        let mut snapshot = EntitySnapshot::default();
        let keys = match &self.keys {
            Some(keys) => keys,
            None => return snapshot,
        };

        for line in lines {
            if let Some((name, record)) = parse_row(line.trim_end_matches('\r'), keys, aliases) {
                snapshot.insert(name, record);
            }
        }
        snapshot
    }
}

/// Parse one data row; None for server rows, filtered proxies and rows without a role
fn parse_row<'a>(
    line: &'a str,
    keys: &FieldKeys,
    aliases: &AliasTable,
) -> Option<(&'a str, EntityRecord)> {
    let cells: Vec<&str> = line.split(',').collect();
    let role = *cells.get(1)?;
    if role != ROLE_FRONTEND && role != ROLE_BACKEND {
        return None;
    }

    let name = cells[0];
    if !aliases.accepts(name) {
        return None;
    }

    let mut record = EntityRecord::default();
    for (idx, key) in keys.as_slice().iter().enumerate() {
        let value = cells
            .get(idx)
            .map_or(FieldValue::Absent, |cell| FieldValue::parse(cell));
        record.insert(key, value);
    }
    Some((name, record))
}
