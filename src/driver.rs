use std::io::Write;
use std::path::PathBuf;

use log::{info, warn};
use serde::Serialize;

use crate::capability::{predict_row, ModelCapability, Prediction, Scalar};
use crate::data::loader::{load_file, LoadOptions};
use crate::data::model::Dataset;
use crate::error::{HarnessError, Phase, PhaseExt, Result};
use crate::output::{ResultWriter, WriteMode};
use crate::reconcile;
use crate::timer::{TimerRegistry, TimerSummary};

/// Timer around fit + predict.
pub const TOTAL_TIME: &str = "total_time";
/// Timer around dataset loading.
pub const LOADING_DATA: &str = "loading_data";

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// Where predictions go. A `None` path skips that file.
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    pub labels: Option<PathBuf>,
    pub probabilities: Option<PathBuf>,
    pub mode: WriteMode,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub train: PathBuf,
    pub test: PathBuf,
    /// Responses stored apart from the training features; merged as the
    /// trailing columns of the training set.
    pub responses: Option<PathBuf>,
    /// Target column of the training set. Defaults to the last column.
    pub target_index: Option<usize>,
    pub load: LoadOptions,
    pub output: OutputConfig,
}

impl RunConfig {
    pub fn new(train: impl Into<PathBuf>, test: impl Into<PathBuf>) -> Self {
        RunConfig {
            train: train.into(),
            test: test.into(),
            responses: None,
            target_index: None,
            load: LoadOptions::default(),
            output: OutputConfig::default(),
        }
    }
}

/// What a finished run looked like.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub capability: String,
    pub train_rows: usize,
    pub test_rows: usize,
    pub attributes: usize,
    /// Size of the target domain, for nominal targets.
    pub classes: Option<usize>,
    pub timers: Vec<TimerSummary>,
}

// ---------------------------------------------------------------------------
// BenchmarkDriver
// ---------------------------------------------------------------------------

/// Runs one benchmark: load, reconcile, timed fit + predict, write, report.
///
/// The driver owns the run's [`TimerRegistry`]; hand in a fresh one per run.
pub struct BenchmarkDriver {
    timers: TimerRegistry,
}

impl BenchmarkDriver {
    pub fn new(timers: TimerRegistry) -> Self {
        BenchmarkDriver { timers }
    }

    pub fn timers(&self) -> &TimerRegistry {
        &self.timers
    }

    /// Load both datasets (timed as `loading_data`) and reconcile the test
    /// set against the training set.
    pub fn prepare(&mut self, config: &RunConfig, discrete_target: bool) -> Result<(Dataset, Dataset)> {
        self.timers.start(LOADING_DATA).phase(Phase::Load)?;
        let loaded = load_inputs(config);
        self.timers.stop(LOADING_DATA).phase(Phase::Load)?;
        let (train, test) = loaded.phase(Phase::Load)?;

        reconcile_pair(train, test, config.target_index, discrete_target).phase(Phase::Reconcile)
    }

    /// Run `capability` end to end. Timer report lines go to `out`.
    ///
    /// Once prediction is done, result writing and timer reporting are both
    /// attempted whatever the other's outcome; the first failure is returned.
    pub fn run<C, W>(&mut self, capability: &C, config: &RunConfig, out: &mut W) -> Result<RunReport>
    where
        C: ModelCapability,
        W: Write,
    {
        let (train, test) = self.prepare(config, capability.requires_discrete_target())?;
        self.run_prepared(capability, &train, &test, &config.output, out)
    }

    /// The timed part of [`run`](Self::run), for datasets already reconciled.
    pub fn run_prepared<C, W>(
        &mut self,
        capability: &C,
        train: &Dataset,
        test: &Dataset,
        output: &OutputConfig,
        out: &mut W,
    ) -> Result<RunReport>
    where
        C: ModelCapability,
        W: Write,
    {
        let classes = train
            .target_attribute()
            .and_then(|a| a.domain())
            .map(<[String]>::len);

        info!(
            "running {} on {} training / {} test row(s)",
            capability.name(),
            train.len(),
            test.len()
        );

        self.timers.start(TOTAL_TIME).phase(Phase::Fit)?;
        let predicted = fit_and_predict(capability, train, test, classes);
        let stopped = self.timers.stop(TOTAL_TIME).phase(Phase::Fit);
        let predictions = predicted?;

        let written = write_results(output, &predictions).phase(Phase::Write);
        let reported = self.report(out).phase(Phase::Report);

        let mut failures = [written.err(), stopped.err(), reported.err()]
            .into_iter()
            .flatten();
        if let Some(first) = failures.next() {
            for other in failures {
                warn!("{other}");
            }
            return Err(first);
        }

        Ok(RunReport {
            capability: capability.name().to_string(),
            train_rows: train.len(),
            test_rows: test.len(),
            attributes: train.num_attributes(),
            classes,
            timers: self.timers.summaries(),
        })
    }

    /// Write one line per timer: `loading_data` when it ran, then `total_time`.
    pub fn report<W: Write>(&self, out: &mut W) -> Result<()> {
        if self.timers.elapsed(LOADING_DATA).is_ok() {
            writeln!(out, "{}", self.timers.report(LOADING_DATA)?)
                .map_err(|e| HarnessError::io("<report>", e))?;
        }
        writeln!(out, "{}", self.timers.report(TOTAL_TIME)?)
            .map_err(|e| HarnessError::io("<report>", e))?;
        Ok(())
    }
}

fn load_inputs(config: &RunConfig) -> Result<(Dataset, Dataset)> {
    let mut train = load_file(&config.train, &config.load)?;
    if let Some(path) = &config.responses {
        let responses = load_file(path, &config.load)?;
        train = reconcile::merge_responses(train, &responses)?;
    }
    let test = load_file(&config.test, &config.load)?;
    Ok((train, test))
}

/// Bring `test` into the shape of `train`: select and, when asked, coerce
/// the training target, add a placeholder label column to an unlabeled test
/// set, then re-code its target and nominal features into the training
/// domains.
pub fn reconcile_pair(
    train: Dataset,
    test: Dataset,
    target_index: Option<usize>,
    discrete_target: bool,
) -> Result<(Dataset, Dataset)> {
    let mut train = match target_index {
        Some(index) => reconcile::set_target_index(train, index)?,
        None => train,
    };
    if discrete_target {
        train = reconcile::coerce_numeric_target_to_nominal(train)?;
    }

    let mut test = reconcile::reconcile_target_placeholder(&train, test)?;
    if let Some(index) = train.target_index() {
        test = reconcile::set_target_index(test, index)?;
    }
    let test = reconcile::align_target_domain(&train, test)?;
    let test = reconcile::align_feature_domains(&train, test)?;
    reconcile::check_compatible(&train, &test)?;
    Ok((train, test))
}

fn fit_and_predict<C: ModelCapability>(
    capability: &C,
    train: &Dataset,
    test: &Dataset,
    classes: Option<usize>,
) -> Result<Vec<Prediction>> {
    let model = capability.fit(train).phase(Phase::Fit)?;
    test.rows()
        .iter()
        .enumerate()
        .map(|(i, row)| predict_row(&model, row, i, classes))
        .collect::<Result<Vec<_>>>()
        .phase(Phase::Predict)
}

fn write_results(output: &OutputConfig, predictions: &[Prediction]) -> Result<()> {
    let writer = ResultWriter::new(output.mode);

    let labels = match &output.labels {
        Some(path) => {
            let scalars: Vec<Scalar> = predictions.iter().map(|p| p.scalar).collect();
            writer.write_scalars(path, &scalars)
        }
        None => Ok(()),
    };

    let probabilities = match &output.probabilities {
        Some(path) => predictions
            .iter()
            .enumerate()
            .map(|(row, p)| {
                p.distribution.clone().ok_or_else(|| HarnessError::Prediction {
                    row,
                    message: "model returned no class probabilities".into(),
                })
            })
            .collect::<Result<Vec<_>>>()
            .and_then(|rows| writer.write_probability_matrix(path, &rows)),
        None => Ok(()),
    };

    labels.and(probabilities)
}
