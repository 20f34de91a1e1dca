//! Benchmark harness for tabular learners.
//!
//! Loads a train/test pair, reconciles the test schema against the training
//! one, times a fit + predict cycle of a [`ModelCapability`], and writes the
//! predictions in a tool-agnostic delimited format.

pub mod baseline;
pub mod capability;
pub mod data;
pub mod driver;
pub mod error;
pub mod output;
pub mod reconcile;
pub mod timer;

pub use capability::{FittedModel, ModelCapability, Prediction, Scalar};
pub use data::loader::{load_file, LoadOptions};
pub use data::model::{Attribute, AttributeKind, Dataset, Row, Value};
pub use driver::{BenchmarkDriver, OutputConfig, RunConfig, RunReport};
pub use error::{HarnessError, Phase, Result};
pub use output::{ResultWriter, WriteMode};
pub use timer::TimerRegistry;
