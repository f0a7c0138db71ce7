// core/src/session.rs
// One wearer's session: owned buffer, optional raw record, ingestion worker and
// the query/publish surface around the estimation pipeline.
use std::sync::Arc;
use std::thread;

use chrono::Utc;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde_json::{json, Value};

use crate::buffer::SampleBuffer;
use crate::error::{PipelineError, RejectReason};
use crate::ingest::decode_sample;
use crate::metrics::average_reading;
use crate::models::{Estimate, Sample};
use crate::pipeline::{analyze, PipelineTrace};
use crate::storage::SampleRecorder;
use crate::telemetry;
use crate::types::{BreathCfg, EstimateReport};

/// Downstream result channel. Receives the estimate as a plain decimal string.
pub trait ResultSink: Send + Sync {
    fn publish(&self, payload: &str);
}

impl<F> ResultSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn publish(&self, payload: &str) {
        self(payload)
    }
}

/// Forwards published estimates into a channel (e.g. towards a pub/sub publisher).
pub struct ChannelSink(pub Sender<String>);

impl ResultSink for ChannelSink {
    fn publish(&self, payload: &str) {
        if self.0.send(payload.to_string()).is_err() {
            log::warn!("result sink disconnected, dropping {}", payload);
        }
    }
}

/// Published form of an estimate, e.g. "15.00" (or "0.00" when inconclusive).
pub fn format_bpm(estimate: &Estimate, decimals: u32) -> String {
    format!("{:.*}", decimals as usize, estimate.bpm())
}

pub struct Session {
    cfg: BreathCfg,
    buffer: SampleBuffer,
    recorder: Option<SampleRecorder>,
}

impl Session {
    pub fn new(cfg: BreathCfg) -> Self {
        Self { cfg, buffer: SampleBuffer::new(), recorder: None }
    }

    /// Every accepted sample is also appended to `recorder`.
    pub fn with_recorder(mut self, recorder: SampleRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn config(&self) -> &BreathCfg {
        &self.cfg
    }

    /// Validates and appends one raw payload. A rejection leaves the buffer untouched.
    pub fn ingest(&self, raw: &[u8]) -> Result<Sample, RejectReason> {
        let sample = match decode_sample(raw) {
            Ok(s) => s,
            Err(reason) => {
                log::warn!("ingest: dropped payload ({})", reason);
                telemetry::record_rejected(&reason);
                return Err(reason);
            }
        };

        self.append(sample.clone());
        Ok(sample)
    }

    /// Appends an already-validated sample (e.g. replayed from a recording).
    ///
    /// The CSV row and the buffer push share one critical section, so the record
    /// keeps buffer order across concurrent callers.
    pub fn append(&self, sample: Sample) -> usize {
        let n = self.buffer.append_with(sample, |s| {
            if let Some(rec) = &self.recorder {
                // Record failure must not cost the session its sample.
                if let Err(e) = rec.append(s) {
                    log::error!("ingest: recorder {} failed: {}", rec.path().display(), e);
                }
            }
        });
        telemetry::record_ingested();
        log::debug!("ingest: buffer now {} samples", n);
        n
    }

    pub fn snapshot(&self) -> Vec<Sample> {
        self.buffer.snapshot()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Last accepted sample, or None before the first one.
    pub fn latest(&self) -> Option<Sample> {
        self.buffer.latest()
    }

    /// `{"latest": {x, y, z, timestamp, userID} | null}`
    pub fn latest_json(&self) -> Value {
        let latest = self.latest().map(|s| {
            json!({
                "x": s.x,
                "y": s.y,
                "z": s.z,
                "timestamp": s.timestamp,
                "userID": s.user_id,
            })
        });
        json!({ "latest": latest })
    }

    /// Full pipeline pass over a fresh snapshot. `Ok(None)` while the buffer is empty.
    pub fn analyze(&self) -> Result<Option<PipelineTrace>, PipelineError> {
        let snapshot = self.buffer.snapshot();
        analyze(&snapshot, &self.cfg)
    }

    pub fn estimate(&self) -> Result<Option<Estimate>, PipelineError> {
        Ok(self.analyze()?.map(|t| t.estimate))
    }

    /// Mean of (x + y + z) / 3 over the history; None when empty.
    pub fn average(&self) -> Option<f64> {
        average_reading(&self.buffer.snapshot())
    }

    /// `{"average": <f64|null>}`
    pub fn average_json(&self) -> Value {
        json!({ "average": self.average() })
    }

    /// `{"bpm": <f64>}`, or `{"bpm": null}` for an empty buffer.
    pub fn bpm_json(&self) -> Result<Value, PipelineError> {
        let bpm = self.estimate()?.map(|e| e.bpm());
        Ok(json!({ "bpm": bpm }))
    }

    pub fn report(&self) -> Result<EstimateReport, PipelineError> {
        let snapshot = self.buffer.snapshot();
        let trace = analyze(&snapshot, &self.cfg)?;
        Ok(match trace {
            Some(t) => EstimateReport {
                bpm: Some(t.estimate.bpm()),
                status: t.estimate.status().to_string(),
                samples: snapshot.len(),
                retained: t.retained,
                dominant_hz: t.dominant_hz,
                peaks: t.peaks,
                computed_at: Utc::now(),
            },
            None => EstimateReport {
                bpm: None,
                status: "empty".to_string(),
                samples: 0,
                retained: 0,
                dominant_hz: None,
                peaks: Vec::new(),
                computed_at: Utc::now(),
            },
        })
    }
}

/// Counters returned by the worker thread on shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub accepted: u64,
    pub rejected: u64,
    pub published: u64,
}

/// Bounded queue + single consumer thread feeding a session.
///
/// The transport pushes raw payloads; the worker validates, appends,
/// re-estimates and publishes after every accepted sample.
pub struct IngestWorker {
    tx: Option<Sender<Vec<u8>>>,
    handle: Option<thread::JoinHandle<WorkerStats>>,
}

impl IngestWorker {
    pub fn start(session: Arc<Session>, sink: Arc<dyn ResultSink>) -> Self {
        let capacity = session.config().channel_capacity.max(1);
        let (tx, rx) = bounded::<Vec<u8>>(capacity);
        let handle = thread::spawn(move || Self::run(session, sink, rx));
        log::info!("ingest worker started (capacity {})", capacity);
        Self { tx: Some(tx), handle: Some(handle) }
    }

    fn run(session: Arc<Session>, sink: Arc<dyn ResultSink>, rx: Receiver<Vec<u8>>) -> WorkerStats {
        let mut stats = WorkerStats::default();
        let decimals = session.config().bpm_decimals;

        for raw in rx.iter() {
            if session.ingest(&raw).is_err() {
                stats.rejected += 1;
                continue;
            }
            stats.accepted += 1;

            match session.estimate() {
                Ok(Some(estimate)) => {
                    sink.publish(&format_bpm(&estimate, decimals));
                    stats.published += 1;
                }
                Ok(None) => {}
                // Unexpected numeric failure: log it, keep ingesting.
                Err(e) => log::error!("estimate failed: {}", e),
            }
        }

        log::info!(
            "ingest worker stopped: accepted={} rejected={} published={}",
            stats.accepted,
            stats.rejected,
            stats.published
        );
        stats
    }

    /// Blocks while the queue is full; nothing is dropped.
    pub fn submit(&self, raw: Vec<u8>) -> Result<(), Vec<u8>> {
        match &self.tx {
            Some(tx) => tx.send(raw).map_err(|e| e.into_inner()),
            None => Err(raw),
        }
    }

    /// Non-blocking; hands the payload back when the queue is full.
    pub fn try_submit(&self, raw: Vec<u8>) -> Result<(), Vec<u8>> {
        match &self.tx {
            Some(tx) => tx.try_send(raw).map_err(|e| {
                if let TrySendError::Full(_) = &e {
                    telemetry::record_channel_drop();
                }
                e.into_inner()
            }),
            None => Err(raw),
        }
    }

    /// Closes the queue, drains what is left and joins the thread.
    pub fn shutdown(mut self) -> WorkerStats {
        self.stop()
    }

    fn stop(&mut self) -> WorkerStats {
        self.tx.take();
        match self.handle.take() {
            Some(h) => h.join().unwrap_or_else(|_| {
                log::error!("ingest worker panicked");
                WorkerStats::default()
            }),
            None => WorkerStats::default(),
        }
    }
}

impl Drop for IngestWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
