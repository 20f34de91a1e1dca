use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Phase – which step of a benchmark run failed
// ---------------------------------------------------------------------------

/// The stage of a run a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Load,
    Reconcile,
    Fit,
    Predict,
    Write,
    Report,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Load => "load",
            Phase::Reconcile => "reconcile",
            Phase::Fit => "fit",
            Phase::Predict => "predict",
            Phase::Write => "write",
            Phase::Report => "report",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// HarnessError
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("usage: {0}")]
    Usage(String),

    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}:{line}: {message}", .path.display())]
    Format {
        path: PathBuf,
        /// 1-based line (or record) number, 0 when not tied to a line.
        line: usize,
        message: String,
    },

    #[error("schema mismatch: {0}")]
    Schema(String),

    #[error("target attribute '{attribute}' has {distinct} distinct value(s), at least 2 are required")]
    DegenerateTarget { attribute: String, distinct: usize },

    #[error("training rejected: {0}")]
    Training(String),

    #[error("prediction failed for row {row}: {message}")]
    Prediction { row: usize, message: String },

    #[error("timer '{0}' is in the wrong state for this call")]
    TimerState(String),

    #[error("there exists no timer named '{0}'")]
    UnknownTimer(String),

    #[error("index {index} is out of bounds for {len} attribute(s)")]
    Index { index: usize, len: usize },

    #[error("{phase} phase failed: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: Box<HarnessError>,
    },
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        HarnessError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        HarnessError::Format {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Tag the error with the phase it happened in. Already-tagged errors keep
    /// their original phase.
    pub fn in_phase(self, phase: Phase) -> Self {
        match self {
            tagged @ HarnessError::Phase { .. } => tagged,
            other => HarnessError::Phase {
                phase,
                source: Box::new(other),
            },
        }
    }

    /// The phase this error was tagged with, if any.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            HarnessError::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// The innermost untagged error.
    pub fn root(&self) -> &HarnessError {
        match self {
            HarnessError::Phase { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;

/// Extension for attaching a [`Phase`] to any harness result.
pub trait PhaseExt<T> {
    fn phase(self, phase: Phase) -> Result<T>;
}

impl<T> PhaseExt<T> for Result<T> {
    fn phase(self, phase: Phase) -> Result<T> {
        self.map_err(|e| e.in_phase(phase))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_tag_is_applied_once() {
        let err = HarnessError::Schema("no target".into())
            .in_phase(Phase::Reconcile)
            .in_phase(Phase::Write);
        assert_eq!(err.phase(), Some(Phase::Reconcile));
        assert!(matches!(err.root(), HarnessError::Schema(_)));
        assert_eq!(
            err.to_string(),
            "reconcile phase failed: schema mismatch: no target"
        );
    }

    #[test]
    fn format_error_names_file_and_line() {
        let err = HarnessError::format("data/iris.arff", 12, "bad token");
        assert_eq!(err.to_string(), "data/iris.arff:12: bad token");
    }
}
