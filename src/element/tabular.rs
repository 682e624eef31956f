// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Value columns and colormapped colors of block and point elements

use super::table::DataTable;
use crate::error::{ColormapError, ConstructionError};
use crate::utils::color::{values_to_rgb, Colormap, Rgb};
use serde::{Deserialize, Serialize};

/// Column created when an element carries no value column of its own
pub const DEFAULT_VALUE_HEADER: &str = "value";

/// Per-row attributes of a tabular element.
///
/// Colors come from an explicit list when one was supplied, otherwise they are
/// derived from the active value column through the colormap on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularAttributes {
    table: DataTable,
    value_header: String,
    colormap: Colormap,
    vmin: f64,
    vmax: f64,
    explicit_colors: Option<Vec<Rgb>>,
}

impl TabularAttributes {
    /// Wrap a table of value columns.
    ///
    /// `value_header` defaults to the first column; a table without columns
    /// receives a zero-filled [`DEFAULT_VALUE_HEADER`] column of `rows` rows.
    /// The value range defaults to the min and max of the active column.
    pub fn new(
        mut table: DataTable,
        rows: usize,
        value_header: Option<String>,
        colormap: Colormap,
    ) -> Result<Self, ConstructionError> {
        if table.column_count() == 0 {
            table.set_column(DEFAULT_VALUE_HEADER, vec![0.0; rows])?;
        }
        if table.row_count() != rows {
            return Err(ConstructionError::validation(format!(
                "value columns have {} rows, geometry has {}",
                table.row_count(),
                rows
            )));
        }
        let value_header = match value_header {
            Some(header) if table.has_column(&header) => header,
            Some(header) => {
                return Err(ConstructionError::validation(format!(
                    "unknown value column `{}`",
                    header
                )))
            }
            None => table
                .column_names()
                .next()
                .unwrap_or(DEFAULT_VALUE_HEADER)
                .to_string(),
        };
        let (vmin, vmax) = value_range(table.column(&value_header).unwrap_or(&[]));
        Ok(Self {
            table,
            value_header,
            colormap,
            vmin,
            vmax,
            explicit_colors: None,
        })
    }

    pub fn table(&self) -> &DataTable {
        &self.table
    }

    /// Names of the available value columns
    pub fn headers(&self) -> Vec<String> {
        self.table.column_names().map(str::to_string).collect()
    }

    pub fn value_header(&self) -> &str {
        &self.value_header
    }

    /// Values of the active column
    pub fn values(&self) -> &[f64] {
        self.table.column(&self.value_header).unwrap_or(&[])
    }

    pub fn colormap(&self) -> &Colormap {
        &self.colormap
    }

    pub fn vmin(&self) -> f64 {
        self.vmin
    }

    pub fn vmax(&self) -> f64 {
        self.vmax
    }

    pub fn has_explicit_colors(&self) -> bool {
        self.explicit_colors.is_some()
    }

    /// Per-row colors, explicit or derived from the active values
    pub fn colors(&self) -> Vec<Rgb> {
        match &self.explicit_colors {
            Some(colors) => colors.clone(),
            None => values_to_rgb(self.values(), self.vmin, self.vmax, &self.colormap),
        }
    }

    /// Switch the active column; the range is reset to its min and max
    pub fn set_value_header(&mut self, header: &str) -> Result<(), ConstructionError> {
        let values = self
            .table
            .column(header)
            .ok_or_else(|| ConstructionError::validation(format!("unknown value column `{}`", header)))?;
        let (vmin, vmax) = value_range(values);
        self.value_header = header.to_string();
        self.vmin = vmin;
        self.vmax = vmax;
        Ok(())
    }

    /// Replace (or add) the active column's values
    pub fn set_values(&mut self, values: Vec<f64>) -> Result<(), ConstructionError> {
        if values.len() != self.table.row_count() {
            return Err(ConstructionError::validation(format!(
                "expected {} values, got {}",
                self.table.row_count(),
                values.len()
            )));
        }
        let header = self.value_header.clone();
        self.table.set_column(header, values)
    }

    /// Add a further value column without activating it
    pub fn add_column(&mut self, header: &str, values: Vec<f64>) -> Result<(), ConstructionError> {
        self.table.set_column(header, values)
    }

    pub fn set_colormap(&mut self, spec: &str) -> Result<(), ColormapError> {
        self.colormap = Colormap::parse(spec)?;
        Ok(())
    }

    pub fn set_vmin(&mut self, vmin: f64) {
        self.vmin = vmin;
    }

    pub fn set_vmax(&mut self, vmax: f64) {
        self.vmax = vmax;
    }

    /// Pin explicit per-row colors, or go back to colormapped ones with `None`
    pub fn set_colors(&mut self, colors: Option<Vec<Rgb>>) -> Result<(), ConstructionError> {
        if let Some(colors) = &colors {
            if colors.len() != self.table.row_count() {
                return Err(ConstructionError::validation(format!(
                    "expected {} colors, got {}",
                    self.table.row_count(),
                    colors.len()
                )));
            }
        }
        self.explicit_colors = colors;
        Ok(())
    }
}

/// Min and max of the finite values, `(0, 0)` when there are none
fn value_range(values: &[f64]) -> (f64, f64) {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min > max {
        (0.0, 0.0)
    } else {
        (min, max)
    }
}
