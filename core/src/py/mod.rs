// Python bindings (feature "python"). JSON in, JSON out, so the Python side
// never needs pyo3's serde support.
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use serde::Deserialize;
use serde_json::{self as json, Value};
use serde_path_to_error as spte;

use crate::ingest::decode_sample;
use crate::metrics::average_reading;
use crate::models::Sample;
use crate::pipeline::analyze;
use crate::types::BreathCfg;

// ──────────────────────────────────────────────────────────────────────────────
// INPUT: either a bare array of payloads, or {samples, config?}
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EstimateObject {
    samples: Vec<Value>,
    #[serde(default)]
    config: Option<BreathCfg>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EstimateIn {
    Object(EstimateObject),
    Bare(Vec<Value>),
}

/// Decodes every payload with the live-path validator; invalid entries are skipped.
fn parse_input(json_in: &str) -> Result<(Vec<Sample>, BreathCfg), String> {
    let mut de = json::Deserializer::from_str(json_in);
    let repr: EstimateIn =
        spte::deserialize(&mut de).map_err(|e| format!("parse error (EstimateIn) at {}: {}", e.path(), e))?;

    let (raw, cfg) = match repr {
        EstimateIn::Object(o) => (o.samples, o.config.unwrap_or_default()),
        EstimateIn::Bare(v) => (v, BreathCfg::default()),
    };

    let samples = raw
        .iter()
        .filter_map(|v| match decode_sample(v.to_string().as_bytes()) {
            Ok(s) => Some(s),
            Err(reason) => {
                log::warn!("py: skipped sample ({})", reason);
                None
            }
        })
        .collect();
    Ok((samples, cfg))
}

fn call_estimate_from_json(json_in: &str) -> Result<String, String> {
    let (samples, cfg) = parse_input(json_in)?;
    let trace = analyze(&samples, &cfg).map_err(|e| e.to_string())?;
    let out = match trace {
        Some(t) => json::json!({
            "bpm": t.estimate.bpm(),
            "status": t.estimate.status(),
            "retained": t.retained,
            "dominant_hz": t.dominant_hz,
            "peaks": t.peaks,
        }),
        None => json::json!({ "bpm": null, "status": "empty" }),
    };
    Ok(out.to_string())
}

fn call_average_from_json(json_in: &str) -> Result<String, String> {
    let (samples, _) = parse_input(json_in)?;
    Ok(json::json!({ "average": average_reading(&samples) }).to_string())
}

// ──────────────────────────────────────────────────────────────────────────────
// PyO3 module
// ──────────────────────────────────────────────────────────────────────────────

#[pyfunction]
fn estimate_bpm_json(json_in: &str) -> PyResult<String> {
    call_estimate_from_json(json_in).map_err(PyValueError::new_err)
}

#[pyfunction]
fn average_json(json_in: &str) -> PyResult<String> {
    call_average_from_json(json_in).map_err(PyValueError::new_err)
}

#[pymodule]
fn breathgraph_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(estimate_bpm_json, m)?)?;
    m.add_function(wrap_pyfunction!(average_json, m)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_array_average() {
        let out = call_average_from_json(r#"[{"x":1,"y":1,"z":1},{"x":2,"y":2,"z":2},{"x":3,"y":3,"z":3}]"#).unwrap();
        let v: Value = json::from_str(&out).unwrap();
        assert_eq!(v["average"], 2.0);
    }

    #[test]
    fn empty_object_is_null() {
        let out = call_estimate_from_json(r#"{"samples": []}"#).unwrap();
        let v: Value = json::from_str(&out).unwrap();
        assert!(v["bpm"].is_null());
    }
}
