//! Prior-only reference capability.
//!
//! `ZeroRule` ignores every feature: for a nominal target it answers with
//! the training class frequencies, for a numeric one with the target mean.
//! Running it through the harness measures load, reconcile and write cost
//! with a model that does no work.

use log::debug;

use crate::capability::{argmax, FittedModel, ModelCapability, Scalar};
use crate::data::model::{Dataset, Row};
use crate::error::{HarnessError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroRule {
    discrete: bool,
}

impl ZeroRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a nominal target, so numeric targets get coerced to classes.
    pub fn discrete(mut self, discrete: bool) -> Self {
        self.discrete = discrete;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ZeroRuleModel {
    Prior(Vec<f64>),
    Mean(f64),
}

impl ModelCapability for ZeroRule {
    type Model = ZeroRuleModel;

    fn name(&self) -> &str {
        "zero-rule"
    }

    fn requires_discrete_target(&self) -> bool {
        self.discrete
    }

    fn fit(&self, train: &Dataset) -> Result<ZeroRuleModel> {
        let index = train
            .target_index()
            .ok_or_else(|| HarnessError::Training("training set has no attributes".into()))?;
        let target = &train.attributes()[index];

        if let Some(domain) = target.domain() {
            let mut counts = vec![0usize; domain.len()];
            for value in train.column(index) {
                if let Some(i) = value.as_index() {
                    counts[i] += 1;
                }
            }
            let total: usize = counts.iter().sum();
            if total == 0 {
                return Err(HarnessError::Training(format!(
                    "target '{}' has no labelled rows",
                    target.name()
                )));
            }
            let prior: Vec<f64> = counts.iter().map(|&c| c as f64 / total as f64).collect();
            debug!("zero-rule prior over {} classes: {prior:?}", prior.len());
            return Ok(ZeroRuleModel::Prior(prior));
        }

        let observed: Vec<f64> = train.column(index).filter_map(|v| v.as_f64()).collect();
        if observed.is_empty() {
            return Err(HarnessError::Training(format!(
                "target '{}' has no observed values",
                target.name()
            )));
        }
        let mean = observed.iter().sum::<f64>() / observed.len() as f64;
        debug!("zero-rule mean of '{}': {mean}", target.name());
        Ok(ZeroRuleModel::Mean(mean))
    }
}

impl FittedModel for ZeroRuleModel {
    fn predict(&self, _row: &Row) -> Result<Scalar> {
        match self {
            ZeroRuleModel::Prior(prior) => Ok(Scalar::Label(argmax(prior).unwrap_or(0))),
            ZeroRuleModel::Mean(mean) => Ok(Scalar::Value(*mean)),
        }
    }

    fn predict_distribution(&self, _row: &Row) -> Result<Option<Vec<f64>>> {
        match self {
            ZeroRuleModel::Prior(prior) => Ok(Some(prior.clone())),
            ZeroRuleModel::Mean(_) => Ok(None),
        }
    }
}
