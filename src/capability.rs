//! The contract between the harness and whatever does the learning.
//!
//! The harness never looks inside a model: it fits one on the training set,
//! then asks it about each test row.

use std::fmt;

use crate::data::model::{Dataset, Row};
use crate::error::{HarnessError, Result};

// ---------------------------------------------------------------------------
// Prediction values
// ---------------------------------------------------------------------------

/// A point prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// Index into the target attribute's nominal domain.
    Label(usize),
    /// Regression output or cluster score.
    Value(f64),
}

impl fmt::Display for Scalar {
    /// Shortest text that parses back to the same value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Label(i) => write!(f, "{i}"),
            Scalar::Value(v) => write!(f, "{v}"),
        }
    }
}

/// The answer for one test row.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub scalar: Scalar,
    /// Per-class probabilities in target-domain order, when the model has them.
    pub distribution: Option<Vec<f64>>,
}

/// Index of the largest entry. Ties go to the first such index and NaN never
/// wins; `None` when there is no comparable entry.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// Something that can be trained on a dataset.
pub trait ModelCapability {
    type Model: FittedModel;

    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    /// Whether the target must be nominal. The driver coerces numeric
    /// targets first when this is set.
    fn requires_discrete_target(&self) -> bool {
        false
    }

    /// Train on `train`, whose target column is already selected. Fails with
    /// `HarnessError::Training` when the data is unusable.
    fn fit(&self, train: &Dataset) -> Result<Self::Model>;
}

/// A trained model.
pub trait FittedModel {
    fn predict(&self, row: &Row) -> Result<Scalar>;

    /// Per-class probabilities for `row`, sized to the target domain.
    /// Models without a distribution keep the default.
    fn predict_distribution(&self, _row: &Row) -> Result<Option<Vec<f64>>> {
        Ok(None)
    }
}

/// Query `model` for one row, holding the distribution and scalar to the
/// same answer: when a distribution comes back, it must have one entry per
/// class and the scalar is its arg-max.
pub fn predict_row<M: FittedModel>(
    model: &M,
    row: &Row,
    row_index: usize,
    classes: Option<usize>,
) -> Result<Prediction> {
    let Some(distribution) = model.predict_distribution(row)? else {
        return Ok(Prediction {
            scalar: model.predict(row)?,
            distribution: None,
        });
    };

    if let Some(expected) = classes {
        if distribution.len() != expected {
            return Err(HarnessError::Prediction {
                row: row_index,
                message: format!(
                    "distribution has {} entries, target domain has {expected}",
                    distribution.len()
                ),
            });
        }
    }
    let best = argmax(&distribution).ok_or_else(|| HarnessError::Prediction {
        row: row_index,
        message: "distribution has no comparable entry".into(),
    })?;
    Ok(Prediction {
        scalar: Scalar::Label(best),
        distribution: Some(distribution),
    })
}
