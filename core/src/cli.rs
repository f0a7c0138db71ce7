use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{PipelineError, StorageError};
use crate::ingest::decode_sample;
use crate::metrics::average_reading;
use crate::models::Sample;
use crate::pipeline::analyze;
use crate::session::format_bpm;
use crate::storage::read_samples;
use crate::types::BreathCfg;

/// Loads a recording: `.csv` in recorder layout, anything else as JSON lines.
/// Bad JSON lines are logged and skipped, like on the live path.
pub fn load_recording(path: &Path) -> Result<Vec<Sample>, StorageError> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if is_csv {
        return read_samples(path);
    }

    let reader = BufReader::new(std::fs::File::open(path)?);
    let mut samples = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match decode_sample(line.as_bytes()) {
            Ok(s) => samples.push(s),
            Err(reason) => log::warn!("{}:{}: skipped ({})", path.display(), lineno + 1, reason),
        }
    }
    Ok(samples)
}

pub fn print_bpm_report(samples: &[Sample], cfg: &BreathCfg) -> Result<(), PipelineError> {
    println!("--- Respiration Report ---");
    println!("Samples: {}", samples.len());
    match average_reading(samples) {
        Some(avg) => println!("Average reading: {:.3}", avg),
        None => println!("Average reading: n/a"),
    }

    match analyze(samples, cfg)? {
        None => println!("BPM: n/a (no samples)"),
        Some(trace) => {
            println!("Retained after outlier filter: {}", trace.retained);
            if let Some(f) = trace.dominant_hz {
                println!("Dominant frequency: {:.3} Hz", f);
            }
            println!("Peaks: {:?}", &trace.peaks[..5.min(trace.peaks.len())]);
            println!("Status: {}", trace.estimate.status());
            println!("BPM: {}", format_bpm(&trace.estimate, cfg.bpm_decimals));
        }
    }
    Ok(())
}
