use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use tabench::baseline::ZeroRule;
use tabench::{
    BenchmarkDriver, HarnessError, LoadOptions, OutputConfig, RunConfig, RunReport, TimerRegistry,
    WriteMode,
};

/// Train on the training set, predict every row of the test set, and
/// report how long fit + predict took.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short = 't', long, value_name = "PATH", help = "A file containing the training set")]
    train: PathBuf,

    #[arg(short = 'T', long, value_name = "PATH", help = "A file containing the test set")]
    test: PathBuf,

    #[arg(
        short = 'r',
        long,
        value_name = "PATH",
        help = "Optional file containing the responses",
        long_help = "Optional file containing the responses. Its columns are appended to the training set; if not given, the responses are assumed to be part of the training file."
    )]
    responses: Option<PathBuf>,

    #[arg(long, value_name = "INDEX", help = "Target column of the training set (default: last)")]
    target_index: Option<usize>,

    #[arg(long, help = "Delimited inputs have no header row")]
    no_header: bool,

    #[arg(
        long,
        value_name = "CHAR",
        value_parser = parse_delimiter,
        help = "Field separator for delimited inputs (default: sniffed)"
    )]
    delimiter: Option<u8>,

    #[arg(long, help = "Treat a numeric target as classes")]
    discrete_target: bool,

    #[arg(
        short = 'o',
        long,
        value_name = "PATH",
        default_value = "predicted.csv",
        help = "Where to write one predicted label or value per test row"
    )]
    labels_out: PathBuf,

    #[arg(short = 'p', long, value_name = "PATH", help = "Where to write per-class probabilities")]
    probabilities_out: Option<PathBuf>,

    #[arg(long, help = "Append to output files instead of overwriting them")]
    append: bool,

    #[arg(long, value_name = "PATH", help = "Write a JSON summary of the run")]
    report_json: Option<PathBuf>,

    #[arg(short, long, help = "Log debug output")]
    verbose: bool,
}

fn parse_delimiter(s: &str) -> std::result::Result<u8, HarnessError> {
    match s {
        "\\t" | "tab" => Ok(b'\t'),
        _ if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        _ => Err(HarnessError::Usage(format!(
            "delimiter must be a single ASCII character, got '{s}'"
        ))),
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = RunConfig {
        train: cli.train,
        test: cli.test,
        responses: cli.responses,
        target_index: cli.target_index,
        load: LoadOptions {
            has_header: !cli.no_header,
            delimiter: cli.delimiter,
        },
        output: OutputConfig {
            labels: Some(cli.labels_out),
            probabilities: cli.probabilities_out,
            mode: if cli.append {
                WriteMode::Append
            } else {
                WriteMode::Truncate
            },
        },
    };

    let capability = ZeroRule::new().discrete(cli.discrete_target);
    let mut driver = BenchmarkDriver::new(TimerRegistry::new());
    let report = driver.run(&capability, &config, &mut io::stdout().lock())?;

    if let Some(path) = &cli.report_json {
        write_report(path, &report)?;
        info!("run summary written to {}", path.display());
    }
    Ok(())
}

fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .with_context(|| format!("writing {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_accepts_single_characters_and_tab() {
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter("\\t").unwrap(), b'\t');
    }

    #[test]
    fn delimiter_rejects_longer_input() {
        for bad in [";;", "", "é"] {
            assert!(matches!(parse_delimiter(bad), Err(HarnessError::Usage(_))), "{bad}");
        }
    }
}
