use edfi_harness_types::{BatchResult, RequestDescriptor, RequestErr};
use serde::Serialize;
use std::{collections::BTreeMap, fmt::Display, time::Duration};

#[derive(Debug, Clone)]
/// Everything one run of a [`LoadBatcher`](crate::LoadBatcher) produced.
pub struct BatchRunReport {
    pub(crate) backend: String,
    pub(crate) results: Vec<BatchResult>,
    pub(crate) failures: Vec<RequestFailure>,
    pub(crate) snapshots_taken: u32,
    pub(crate) snapshots_failed: u32,
    pub(crate) elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A request that did not produce a result.
pub struct RequestFailure {
    pub descriptor: RequestDescriptor,
    pub repetition: u32,
    pub error: RequestErr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Latency of the successful requests of one descriptor, in seconds.
pub struct LatencySummary {
    pub descriptor: RequestDescriptor,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
}

impl BatchRunReport {
    pub(crate) fn new(backend: &str) -> Self {
        Self {
            backend: backend.to_owned(),
            results: Vec::new(),
            failures: Vec::new(),
            snapshots_taken: 0,
            snapshots_failed: 0,
            elapsed: Duration::ZERO,
        }
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Successful requests, in the order they were scheduled.
    pub fn results(&self) -> &[BatchResult] {
        &self.results
    }

    pub fn failures(&self) -> &[RequestFailure] {
        &self.failures
    }

    pub fn snapshots_taken(&self) -> u32 {
        self.snapshots_taken
    }

    pub fn snapshots_failed(&self) -> u32 {
        self.snapshots_failed
    }

    /// Wall time of the whole run, including the initial snapshot.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// One summary per descriptor with at least one success, ordered by descriptor.
    pub fn summary(&self) -> Vec<LatencySummary> {
        let mut samples: BTreeMap<RequestDescriptor, Vec<f64>> = BTreeMap::new();
        for result in self.results.iter() {
            samples
                .entry(*result.descriptor())
                .or_default()
                .push(result.elapsed_seconds());
        }
        samples
            .into_iter()
            .map(|(descriptor, mut seconds)| {
                seconds.sort_by(f64::total_cmp);
                LatencySummary {
                    descriptor,
                    count: seconds.len(),
                    min: seconds[0],
                    max: seconds[seconds.len() - 1],
                    mean: seconds.iter().sum::<f64>() / seconds.len() as f64,
                    p50: percentile(&seconds, 50),
                    p95: percentile(&seconds, 95),
                }
            })
            .collect()
    }
}

/// Nearest-rank percentile of a sorted, non-empty slice.
fn percentile(sorted: &[f64], p: usize) -> f64 {
    let rank = (p * sorted.len()).div_ceil(100);
    sorted[rank.clamp(1, sorted.len()) - 1]
}

impl Display for RequestFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Request {} of repetition {} failed: {}",
            self.descriptor, self.repetition, self.error
        )
    }
}

impl Display for LatencySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:>16} n={:<4} min={:.3}s mean={:.3}s p50={:.3}s p95={:.3}s max={:.3}s",
            self.descriptor.to_string(),
            self.count,
            self.min,
            self.mean,
            self.p50,
            self.p95,
            self.max
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use edfi_harness_types::Response;

    fn result(offset: u64, millis: u64) -> BatchResult {
        BatchResult::new(
            RequestDescriptor::new(offset, 1).unwrap(),
            0,
            Duration::from_millis(millis),
            Response::Empty,
        )
    }

    #[test]
    fn test_percentile() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 50), 2.0);
        assert_eq!(percentile(&sorted, 95), 4.0);
        assert_eq!(percentile(&[7.0], 50), 7.0);
        assert_eq!(percentile(&[7.0], 0), 7.0);
    }

    #[test]
    fn test_summary() {
        let mut report = BatchRunReport::new("opensearch");
        report.results = vec![
            result(100000, 400),
            result(10000, 100),
            result(100000, 200),
            result(10000, 300),
        ];
        let summary = report.summary();
        assert_eq!(summary.len(), 2);

        assert_eq!(summary[0].descriptor.offset(), 10000);
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].min, 0.1);
        assert_eq!(summary[0].max, 0.3);
        assert!((summary[0].mean - 0.2).abs() < 1e-9);

        assert_eq!(summary[1].descriptor.offset(), 100000);
        assert_eq!(summary[1].p50, 0.2);
        assert_eq!(summary[1].p95, 0.4);
    }

    #[test]
    fn test_summary_json() {
        let mut report = BatchRunReport::new("postgres");
        report.results = vec![result(10000, 250)];
        let json = serde_json::to_value(report.summary()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "descriptor": { "offset": 10000, "size": 1 },
                "count": 1,
                "min": 0.25,
                "max": 0.25,
                "mean": 0.25,
                "p50": 0.25,
                "p95": 0.25,
            }])
        );
    }
}
