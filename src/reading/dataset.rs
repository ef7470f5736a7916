//! The merged table for one year.

use std::collections::BTreeMap;

use super::MergedRow;

#[derive(Debug, Clone, Default, PartialEq)]
/// Every row of one year's archive. Built fresh per archive, never patched.
pub struct YearDataset {
    pub year: String,
    rows: Vec<MergedRow>,
}

impl YearDataset {
    pub fn new(year: impl Into<String>, rows: Vec<MergedRow>) -> Self {
        YearDataset {
            year: year.into(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [MergedRow] {
        &mut self.rows
    }

    /// Row indices per station id. A station normally has many rows.
    pub fn station_index(&self) -> BTreeMap<&str, Vec<usize>> {
        let mut index: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, row) in self.rows.iter().enumerate() {
            index.entry(row.station.as_str()).or_default().push(i);
        }
        index
    }

    pub fn station_count(&self) -> usize {
        self.station_index().len()
    }
}
