// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Raw loader data and column tables

use crate::error::ConstructionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One column of raw loader data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawColumn {
    Scalars(Vec<f64>),
    Triples(Vec<[f64; 3]>),
}

impl RawColumn {
    pub fn len(&self) -> usize {
        match self {
            Self::Scalars(v) => v.len(),
            Self::Triples(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Named columns as handed over by a loader (`x`, `y`, `z`, `vertices`,
/// `indices`, value columns...)
pub type RawData = BTreeMap<String, RawColumn>;

/// Insertion-ordered table of named scalar columns of equal length
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    columns: Vec<(String, Vec<f64>)>,
}

impl DataTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows, taken from the first column
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |(_, c)| c.len())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_slice())
    }

    /// Case-insensitive column lookup
    pub fn column_ignore_case(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, c)| c.as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Insert or replace a column; its length must match the existing rows
    pub fn set_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), ConstructionError> {
        let name = name.into();
        if !self.columns.is_empty() && values.len() != self.row_count() {
            let replacing_only_column = self.columns.len() == 1 && self.columns[0].0 == name;
            if !replacing_only_column {
                return Err(ConstructionError::validation(format!(
                    "column `{}` has {} rows, table has {}",
                    name,
                    values.len(),
                    self.row_count()
                )));
            }
        }
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, column)) => *column = values,
            None => self.columns.push((name, values)),
        }
        Ok(())
    }

    /// Builder-style [`DataTable::set_column`]
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, ConstructionError> {
        self.set_column(name, values)?;
        Ok(self)
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Vec<f64>> {
        let position = self.columns.iter().position(|(n, _)| n == name)?;
        Some(self.columns.remove(position).1)
    }
}
