//! Missing-value imputer fitted at training time

use crate::error::InferenceError;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    Mean,
    Median,
    MostFrequent,
    Constant,
}

/// Replaces NaN cells with the per-column statistic learned during training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleImputer {
    pub strategy: ImputeStrategy,
    pub statistics: Vec<f64>,
}

impl SimpleImputer {
    pub fn new(strategy: ImputeStrategy, statistics: Vec<f64>) -> Self {
        Self {
            strategy,
            statistics,
        }
    }

    /// Imputer that fills every column with zero
    pub fn zeros(width: usize) -> Self {
        Self::new(ImputeStrategy::Constant, vec![0.0; width])
    }

    pub fn width(&self) -> usize {
        self.statistics.len()
    }

    /// Fill missing cells in place
    pub fn transform(&self, values: &mut Array2<f64>) -> Result<usize, InferenceError> {
        if values.ncols() != self.statistics.len() {
            return Err(InferenceError::ShapeMismatch {
                expected: self.statistics.len(),
                actual: values.ncols(),
            });
        }

        let mut filled = 0;
        for mut row in values.rows_mut() {
            for (cell, stat) in row.iter_mut().zip(&self.statistics) {
                if cell.is_nan() {
                    *cell = *stat;
                    filled += 1;
                }
            }
        }

        Ok(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fills_only_missing_cells() {
        let imputer = SimpleImputer::new(ImputeStrategy::Median, vec![10.0, 20.0, 30.0]);
        let mut values = array![[1.0, f64::NAN, 3.0]];

        let filled = imputer.transform(&mut values).unwrap();

        assert_eq!(filled, 1);
        assert_eq!(values, array![[1.0, 20.0, 3.0]]);
    }

    #[test]
    fn test_shape_mismatch() {
        let imputer = SimpleImputer::zeros(2);
        let mut values = array![[1.0, 2.0, 3.0]];

        assert_eq!(
            imputer.transform(&mut values),
            Err(InferenceError::ShapeMismatch {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn test_strategy_serde_names() {
        let imputer: SimpleImputer =
            serde_json::from_str(r#"{"strategy":"most_frequent","statistics":[1.5]}"#).unwrap();
        assert_eq!(imputer.strategy, ImputeStrategy::MostFrequent);
        assert_eq!(imputer.width(), 1);
    }
}
