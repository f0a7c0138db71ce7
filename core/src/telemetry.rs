//! Prometheus counters for ingestion and estimation.
//!
//! Metrics live in a crate-local registry; `gather_metrics()` renders the text
//! exposition format for whatever HTTP surface hosts the session.

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::RejectReason;
use crate::models::Estimate;

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub static SAMPLES_INGESTED: Lazy<IntCounter> = Lazy::new(|| {
    let c = IntCounter::new("breathgraph_samples_ingested_total", "Samples accepted into a session buffer")
        .expect("valid metric definition");
    REGISTRY.register(Box::new(c.clone())).ok();
    c
});

pub static SAMPLES_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    let c = IntCounterVec::new(
        Opts::new("breathgraph_samples_rejected_total", "Payloads dropped at validation"),
        &["reason"],
    )
    .expect("valid metric definition");
    REGISTRY.register(Box::new(c.clone())).ok();
    c
});

pub static ESTIMATES: Lazy<IntCounterVec> = Lazy::new(|| {
    let c = IntCounterVec::new(
        Opts::new("breathgraph_estimates_total", "Estimation passes by outcome"),
        &["status"],
    )
    .expect("valid metric definition");
    REGISTRY.register(Box::new(c.clone())).ok();
    c
});

pub static CHANNEL_DROPS: Lazy<IntCounter> = Lazy::new(|| {
    let c = IntCounter::new("breathgraph_channel_drops_total", "Payloads refused by a full ingestion queue")
        .expect("valid metric definition");
    REGISTRY.register(Box::new(c.clone())).ok();
    c
});

pub fn record_ingested() {
    SAMPLES_INGESTED.inc();
}

pub fn record_rejected(reason: &RejectReason) {
    SAMPLES_REJECTED.with_label_values(&[reason.kind()]).inc();
}

pub fn record_estimate(estimate: &Estimate) {
    ESTIMATES.with_label_values(&[estimate.status()]).inc();
}

pub fn record_channel_drop() {
    CHANNEL_DROPS.inc();
}

/// Text exposition of every registered metric.
pub fn gather_metrics() -> String {
    // Touch the lazies so families show up even before the first event.
    Lazy::force(&SAMPLES_INGESTED);
    Lazy::force(&SAMPLES_REJECTED);
    Lazy::force(&ESTIMATES);
    Lazy::force(&CHANNEL_DROPS);

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        log::warn!("metrics encode failed: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InconclusiveReason;

    #[test]
    fn counters_show_up_in_exposition() {
        record_ingested();
        record_rejected(&RejectReason::MalformedPayload { reason: "x".into() });
        record_estimate(&Estimate::Inconclusive(InconclusiveReason::InsufficientPeaks));
        let text = gather_metrics();
        assert!(text.contains("breathgraph_samples_ingested_total"));
        assert!(text.contains("reason=\"malformed_payload\""));
        assert!(text.contains("status=\"insufficient_peaks\""));
    }
}
