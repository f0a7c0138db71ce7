use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::models::Sample;
use crate::types::BreathCfg;

/// Reads the pipeline config from disk (JSON).
/// A missing file yields the default config; absent fields take their defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<BreathCfg, StorageError> {
    let path = path.as_ref();
    if path.exists() {
        let contents = std::fs::read_to_string(path)?;
        let cfg: BreathCfg = serde_json::from_str(&contents)?;
        log::info!("config loaded from {} (axis={:?}, window={:?})", path.display(), cfg.axis, cfg.window);
        Ok(cfg)
    } else {
        log::warn!("no config at {}, using defaults", path.display());
        Ok(BreathCfg::default())
    }
}

/// Writes the config as pretty JSON.
pub fn save_config(cfg: &BreathCfg, path: impl AsRef<Path>) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(cfg)?;
    std::fs::write(path.as_ref(), json)?;
    log::info!("config saved to {}", path.as_ref().display());
    Ok(())
}

pub const CSV_HEADER: [&str; 5] = ["Timestamp", "UserID", "X", "Y", "Z"];

/// One row of the raw-sample record.
#[derive(Debug, Serialize, Deserialize)]
struct SampleRow {
    #[serde(rename = "Timestamp")]
    timestamp: Option<String>,
    #[serde(rename = "UserID")]
    user_id: Option<String>,
    #[serde(rename = "X")]
    x: f64,
    #[serde(rename = "Y")]
    y: f64,
    #[serde(rename = "Z")]
    z: f64,
}

impl From<&Sample> for SampleRow {
    fn from(s: &Sample) -> Self {
        Self { timestamp: s.timestamp.clone(), user_id: s.user_id.clone(), x: s.x, y: s.y, z: s.z }
    }
}

impl From<SampleRow> for Sample {
    fn from(r: SampleRow) -> Self {
        Sample::new(r.x, r.y, r.z).with_meta(r.timestamp, r.user_id)
    }
}

/// Append-only CSV record of ingested samples (`Timestamp,UserID,X,Y,Z`).
///
/// The header goes in once, when the file is created (or found empty).
#[derive(Debug)]
pub struct SampleRecorder {
    path: PathBuf,
    writer: Mutex<csv::Writer<File>>,
}

impl SampleRecorder {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let fresh = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if fresh {
            writer.write_record(CSV_HEADER)?;
            writer.flush()?;
            log::info!("recorder: created {}", path.display());
        }
        Ok(Self { path, writer: Mutex::new(writer) })
    }

    pub fn append(&self, sample: &Sample) -> Result<(), StorageError> {
        let mut w = self.writer.lock();
        w.serialize(SampleRow::from(sample))?;
        w.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Reads a recorder file back into samples, in file order.
pub fn read_samples(path: impl AsRef<Path>) -> Result<Vec<Sample>, StorageError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path.as_ref())?;
    let mut out = Vec::new();
    for row in reader.deserialize::<SampleRow>() {
        out.push(Sample::from(row?));
    }
    Ok(out)
}
