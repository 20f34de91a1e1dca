use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const DIMS: usize = 4;
const TRAIN_PER_CLASS: usize = 50;
const TEST_PER_CLASS: usize = 20;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct Sample {
    features: [f64; DIMS],
    class: usize,
}

/// Gaussian blobs, one per class, rounded to 4 decimals like typical
/// benchmark CSVs.
fn blobs(rng: &mut SimpleRng, centres: &[[f64; DIMS]], per_class: usize) -> Vec<Sample> {
    let mut samples = Vec::with_capacity(centres.len() * per_class);
    // Classes interleave so rows are not sorted by label.
    for _ in 0..per_class {
        for (class, centre) in centres.iter().enumerate() {
            let mut features = [0.0; DIMS];
            for (f, &c) in features.iter_mut().zip(centre) {
                *f = (rng.gauss(c, 0.6) * 1e4).round() / 1e4;
            }
            samples.push(Sample { features, class });
        }
    }
    samples
}

fn write_arff(path: &Path, relation: &str, samples: &[Sample], classes: Option<&[&str]>) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "@relation {relation}\n")?;
    for d in 0..DIMS {
        writeln!(out, "@attribute {relation}_dim{d} NUMERIC")?;
    }
    if let Some(labels) = classes {
        writeln!(out, "@attribute class {{{}}}", labels.join(","))?;
    }
    writeln!(out, "\n@data")?;

    for s in samples {
        let row: Vec<String> = s.features.iter().map(|v| v.to_string()).collect();
        match classes {
            Some(labels) => writeln!(out, "{},{}", row.join(","), labels[s.class])?,
            None => writeln!(out, "{}", row.join(","))?,
        }
    }
    out.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, samples: &[Sample], labels: &[&str]) -> Result<()> {
    let mut fields: Vec<Field> = (0..DIMS)
        .map(|d| Field::new(format!("dim{d}"), DataType::Float64, false))
        .collect();
    fields.push(Field::new("class", DataType::Utf8, false));
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<Arc<dyn arrow::array::Array>> = (0..DIMS)
        .map(|d| {
            Arc::new(Float64Array::from(
                samples.iter().map(|s| s.features[d]).collect::<Vec<_>>(),
            )) as Arc<dyn arrow::array::Array>
        })
        .collect();
    columns.push(Arc::new(StringArray::from(
        samples.iter().map(|s| labels[s.class]).collect::<Vec<_>>(),
    )));

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let labels = ["setosa", "versicolor", "virginica"];
    let centres = [
        [5.0, 3.4, 1.5, 0.2],
        [5.9, 2.8, 4.3, 1.3],
        [6.6, 3.0, 5.6, 2.0],
    ];

    let train = blobs(&mut rng, &centres, TRAIN_PER_CLASS);
    let test = blobs(&mut rng, &centres, TEST_PER_CLASS);

    write_arff(Path::new("train.arff"), "train", &train, Some(&labels[..]))?;
    write_arff(Path::new("test.arff"), "test", &test, None)?;
    write_parquet(Path::new("train.parquet"), &train, &labels)?;

    let mut truth = BufWriter::new(File::create("test_labels.csv").context("creating test_labels.csv")?);
    for s in &test {
        writeln!(truth, "{}", s.class)?;
    }
    truth.flush()?;

    println!(
        "Wrote {} training and {} test rows ({} classes, {DIMS} features) to train.arff, train.parquet, test.arff, test_labels.csv",
        train.len(),
        test.len(),
        labels.len()
    );
    Ok(())
}
