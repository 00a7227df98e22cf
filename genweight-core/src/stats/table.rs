//! Mergeable counter table emitted at the end of each run
//!
//! A table is an ordered list of named integer and floating-point values,
//! each with a human-readable doc string. Tables from separate runs or jobs
//! combine by summing entries with the same name; an entry missing from one
//! side contributes zero.

use super::counter_map::CounterMap;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value of a single table entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TableValue {
    Int(u64),
    Float(f64),
}

impl TableValue {
    fn kind(&self) -> &'static str {
        match self {
            TableValue::Int(_) => "int",
            TableValue::Float(_) => "float",
        }
    }

    /// Value as `f64`
    pub fn as_f64(&self) -> f64 {
        match self {
            TableValue::Int(v) => *v as f64,
            TableValue::Float(v) => *v,
        }
    }
}

/// One `(name, doc, value)` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    pub name: String,
    pub doc: String,
    pub value: TableValue,
}

/// Output names for the three per-label values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub count: String,
    pub sum: String,
    pub sum_squares: String,
}

impl ColumnNames {
    /// Column names with a common suffix, e.g. `PreSkim` gives
    /// `genEventCountPreSkim`, `genEventSumwPreSkim`, `genEventSumw2PreSkim`.
    pub fn with_suffix(suffix: &str) -> Self {
        Self {
            count: format!("genEventCount{suffix}"),
            sum: format!("genEventSumw{suffix}"),
            sum_squares: format!("genEventSumw2{suffix}"),
        }
    }
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self::with_suffix("PreSkim")
    }
}

/// Ordered, mergeable table of named counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterTable {
    entries: Vec<TableEntry>,
}

impl CounterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table for every label of `map`, in lexicographic label order.
    ///
    /// The empty label produces unsuffixed names; any other label `L`
    /// appends `_L` to each name and `, for model label L` to each doc.
    pub fn from_counter_map(map: &CounterMap, names: &ColumnNames) -> Self {
        let mut table = Self::new();
        for (label, counter) in map.iter() {
            let (suffix, doc_suffix) = if label.is_empty() {
                (String::new(), String::new())
            } else {
                (format!("_{label}"), format!(", for model label {label}"))
            };

            table.add_int(
                format!("{}{suffix}", names.count),
                format!("event count{doc_suffix}"),
                counter.count(),
            );
            table.add_float(
                format!("{}{suffix}", names.sum),
                format!("sum of gen weights{doc_suffix}"),
                counter.sum(),
            );
            table.add_float(
                format!("{}{suffix}", names.sum_squares),
                format!("sum of gen (weight^2){doc_suffix}"),
                counter.sum_squares(),
            );
        }
        table
    }

    pub fn add_int(&mut self, name: impl Into<String>, doc: impl Into<String>, value: u64) {
        self.entries.push(TableEntry {
            name: name.into(),
            doc: doc.into(),
            value: TableValue::Int(value),
        });
    }

    pub fn add_float(&mut self, name: impl Into<String>, doc: impl Into<String>, value: f64) {
        self.entries.push(TableEntry {
            name: name.into(),
            doc: doc.into(),
            value: TableValue::Float(value),
        });
    }

    /// Look up an entry by name
    pub fn get(&self, name: &str) -> Option<&TableEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Integer value by name
    pub fn int(&self, name: &str) -> Option<u64> {
        match self.get(name)?.value {
            TableValue::Int(v) => Some(v),
            TableValue::Float(_) => None,
        }
    }

    /// Float value by name
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.get(name)?.value {
            TableValue::Float(v) => Some(v),
            TableValue::Int(_) => None,
        }
    }

    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum `other` into this table.
    ///
    /// Entries present in both are added; entries only in `other` are
    /// appended in `other`'s order (zero-filled on this side). Fails if the
    /// same name carries an integer on one side and a float on the other.
    pub fn merge(&mut self, other: &CounterTable) -> Result<()> {
        let positions: HashMap<&str, usize> =
            self.entries.iter().enumerate().map(|(i, e)| (e.name.as_str(), i)).collect();

        let mut updates = Vec::with_capacity(other.entries.len());
        let mut appended = Vec::new();
        for entry in &other.entries {
            match positions.get(entry.name.as_str()) {
                Some(&i) => {
                    let merged = match (self.entries[i].value, entry.value) {
                        (TableValue::Int(a), TableValue::Int(b)) => match a.checked_add(b) {
                            Some(total) => TableValue::Int(total),
                            None => {
                                return Err(Error::Other(format!(
                                    "cannot merge table entry '{}': count overflows ({} + {})",
                                    entry.name, a, b
                                )));
                            }
                        },
                        (TableValue::Float(a), TableValue::Float(b)) => TableValue::Float(a + b),
                        (mine, theirs) => {
                            return Err(Error::Other(format!(
                                "cannot merge table entry '{}': {} vs {}",
                                entry.name,
                                mine.kind(),
                                theirs.kind()
                            )));
                        }
                    };
                    updates.push((i, merged));
                }
                None => {
                    tracing::debug!("Zero-filling table entry '{}' on merge", entry.name);
                    appended.push(entry.clone());
                }
            }
        }

        for (i, value) in updates {
            self.entries[i].value = value;
        }
        self.entries.extend(appended);
        Ok(())
    }
}
