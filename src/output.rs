use std::fs::{File, OpenOptions};
use std::path::Path;

use log::debug;

use crate::capability::Scalar;
use crate::error::{HarnessError, Result};

// ---------------------------------------------------------------------------
// ResultWriter – predictions to delimited text
// ---------------------------------------------------------------------------

/// How an existing output file is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Start the file over on every open.
    #[default]
    Truncate,
    /// Add records after whatever is already there.
    Append,
}

/// Writes one record per line: a single scalar, or comma-separated
/// probabilities in target-domain order. Numbers use the shortest text that
/// parses back to the same `f64`.
///
/// Nothing is written atomically; a failure can leave a partial file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultWriter {
    mode: WriteMode,
}

impl ResultWriter {
    pub fn new(mode: WriteMode) -> Self {
        ResultWriter { mode }
    }

    /// One scalar per line, in input order.
    pub fn write_scalars(&self, path: &Path, values: &[Scalar]) -> Result<()> {
        let mut writer = self.open(path)?;
        for value in values {
            writer
                .write_record([value.to_string()])
                .map_err(|e| csv_error(path, e))?;
        }
        writer.flush().map_err(|e| HarnessError::io(path, e))?;
        debug!("wrote {} prediction(s) to {}", values.len(), path.display());
        Ok(())
    }

    /// One probability vector per line.
    pub fn write_probability_matrix(&self, path: &Path, rows: &[Vec<f64>]) -> Result<()> {
        let mut writer = self.open(path)?;
        for row in rows {
            writer
                .write_record(row.iter().map(|p| p.to_string()))
                .map_err(|e| csv_error(path, e))?;
        }
        writer.flush().map_err(|e| HarnessError::io(path, e))?;
        debug!("wrote {} probability row(s) to {}", rows.len(), path.display());
        Ok(())
    }

    fn open(&self, path: &Path) -> Result<csv::Writer<File>> {
        let mut options = OpenOptions::new();
        match self.mode {
            WriteMode::Truncate => options.write(true).create(true).truncate(true),
            WriteMode::Append => options.append(true).create(true),
        };
        let file = options.open(path).map_err(|e| HarnessError::io(path, e))?;
        Ok(csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file))
    }
}

fn csv_error(path: &Path, err: csv::Error) -> HarnessError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => HarnessError::io(path, e),
        _ => HarnessError::format(path, 0, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn scalars_one_per_line_newline_terminated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        let writer = ResultWriter::default();
        writer
            .write_scalars(&path, &[Scalar::Label(2), Scalar::Label(0), Scalar::Value(1.25)])
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "2\n0\n1.25\n");
    }

    #[test]
    fn truncate_mode_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        let writer = ResultWriter::new(WriteMode::Truncate);
        writer.write_scalars(&path, &[Scalar::Label(1); 5]).unwrap();
        writer.write_scalars(&path, &[Scalar::Label(0)]).unwrap();
        assert_eq!(read_lines(&path), ["0"]);
    }

    #[test]
    fn append_mode_accumulates_matrix_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probs.csv");
        let writer = ResultWriter::new(WriteMode::Append);
        writer.write_probability_matrix(&path, &[vec![0.25, 0.75]]).unwrap();
        writer
            .write_probability_matrix(&path, &[vec![1.0, 0.0], vec![0.5, 0.5]])
            .unwrap();
        assert_eq!(read_lines(&path), ["0.25,0.75", "1,0", "0.5,0.5"]);
    }

    #[test]
    fn probabilities_parse_back_within_tolerance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probs.csv");
        let rows = vec![
            vec![1.0 / 3.0, 2.0 / 3.0, 0.0],
            vec![0.123456789012, 1e-9, 0.876543209988],
        ];
        ResultWriter::default()
            .write_probability_matrix(&path, &rows)
            .unwrap();

        for (line, row) in read_lines(&path).iter().zip(&rows) {
            let parsed: Vec<f64> = line.split(',').map(|t| t.parse().unwrap()).collect();
            assert_eq!(parsed.len(), row.len());
            for (a, b) in parsed.iter().zip(row) {
                assert!((a - b).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("labels.csv");
        let err = ResultWriter::default()
            .write_scalars(&path, &[Scalar::Label(0)])
            .unwrap_err();
        assert!(matches!(err, HarnessError::Io { .. }));
    }
}
