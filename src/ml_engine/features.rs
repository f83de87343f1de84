//! Feature Frame - aligns parsed features to the model's column order
//!
//! The classifier only understands a fixed, ordered list of columns. The
//! frame takes whatever the parser produced and lays it out in exactly that
//! order; required columns the parser did not produce are filled with zero.

use crate::parser::FeatureMap;
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// A single-row table whose columns match the model's feature list
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureFrame {
    /// Build the row for `feature_names` from a parsed feature map
    pub fn assemble(features: &FeatureMap, feature_names: &[String]) -> Self {
        let row: Vec<f64> = feature_names
            .iter()
            .map(|name| features.get_f64(name).unwrap_or(0.0))
            .collect();

        let values = Array1::from(row).insert_axis(Axis(0));

        Self {
            columns: feature_names.to_vec(),
            values,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut Array2<f64> {
        &mut self.values
    }

    /// The only row of the frame
    pub fn row(&self) -> ArrayView1<'_, f64> {
        self.values.row(0)
    }

    /// Value of a named column
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[[0, i]])
    }
}
