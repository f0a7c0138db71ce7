use breathgraph_core::telemetry::gather_metrics;
use breathgraph_core::*;

#[test]
fn session_activity_is_counted() {
    let session = Session::new(BreathCfg::default());
    for i in 0..12 {
        session.ingest(format!(r#"{{"x":{},"y":0,"z":9.8}}"#, i % 3).as_bytes()).unwrap();
    }
    let _ = session.ingest(br#"{"x":"a","y":0,"z":9.8}"#);
    let _ = session.bpm_json().unwrap();

    let text = gather_metrics();
    assert!(text.contains("breathgraph_samples_ingested_total"));
    assert!(text.contains("breathgraph_samples_rejected_total{reason=\"schema_violation\"}"));
    assert!(text.contains("breathgraph_estimates_total"));
    assert!(text.contains("breathgraph_channel_drops_total"));
}
