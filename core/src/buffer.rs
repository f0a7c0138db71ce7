use parking_lot::Mutex;

use crate::models::Sample;

/// Append-only, lock-guarded sample history for one session.
///
/// Appends and snapshots each take the lock once; a snapshot is a copy, so
/// estimation never iterates the live vector and never holds the lock while it
/// computes. There is no eviction: the whole history is retained.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    samples: Mutex<Vec<Sample>>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends and returns the new length.
    pub fn append(&self, sample: Sample) -> usize {
        self.append_with(sample, |_| {})
    }

    /// Runs `before` on the sample and appends it inside one critical section,
    /// so side records written by `before` follow buffer order.
    pub fn append_with<F>(&self, sample: Sample, before: F) -> usize
    where
        F: FnOnce(&Sample),
    {
        let mut guard = self.samples.lock();
        before(&sample);
        guard.push(sample);
        guard.len()
    }

    /// Most recently appended sample.
    pub fn latest(&self) -> Option<Sample> {
        self.samples.lock().last().cloned()
    }

    /// Consistent copy of the history at this instant.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn latest_tracks_last_append() {
        let buf = SampleBuffer::new();
        assert_eq!(buf.latest(), None);
        buf.append(Sample::new(1.0, 0.0, 0.0));
        buf.append(Sample::new(2.0, 0.0, 0.0));
        assert_eq!(buf.latest(), Some(Sample::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn append_with_sees_sample_before_push() {
        let buf = SampleBuffer::new();
        let mut seen = None;
        let n = buf.append_with(Sample::new(3.0, 0.0, 0.0), |s| seen = Some(s.x));
        assert_eq!(n, 1);
        assert_eq!(seen, Some(3.0));
    }

    #[test]
    fn snapshot_is_detached() {
        let buf = SampleBuffer::new();
        buf.append(Sample::new(1.0, 0.0, 0.0));
        let snap = buf.snapshot();
        buf.append(Sample::new(2.0, 0.0, 0.0));
        assert_eq!(snap.len(), 1);
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn concurrent_appends_are_not_lost() {
        let buf = Arc::new(SampleBuffer::new());
        let writers: Vec<_> = (0..8)
            .map(|t| {
                let buf = Arc::clone(&buf);
                thread::spawn(move || {
                    for i in 0..250 {
                        buf.append(Sample::new(t as f64, i as f64, 0.0));
                    }
                })
            })
            .collect();
        let reader = {
            let buf = Arc::clone(&buf);
            thread::spawn(move || {
                let mut last = 0;
                for _ in 0..200 {
                    let n = buf.snapshot().len();
                    assert!(n >= last);
                    last = n;
                }
            })
        };
        for w in writers {
            w.join().unwrap();
        }
        reader.join().unwrap();
        assert_eq!(buf.len(), 2000);

        // per-writer order is preserved
        let snap = buf.snapshot();
        for t in 0..8 {
            let seq: Vec<f64> = snap.iter().filter(|s| s.x == t as f64).map(|s| s.y).collect();
            assert_eq!(seq, (0..250).map(|i| i as f64).collect::<Vec<_>>());
        }
    }
}
