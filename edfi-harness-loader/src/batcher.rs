use edfi_harness_runtime::spawn_task;
use edfi_harness_types::{
    runtime_error, BatchResult, HarnessErr, ProcessStats, RequestDescriptor, RequestExecutor,
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use crate::{BatchRunReport, LoaderResult, LogFile, LogSender, RequestFailure};

#[derive(Debug)]
/// Runs batches of concurrent requests against one backend and records how long each took.
pub struct LoadBatcher<X: RequestExecutor, S: ProcessStats> {
    executor: Arc<X>,
    stats: Arc<S>,
    options: BatchOptions,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    output_dir: PathBuf,
    process: Option<String>,
    failure_policy: FailurePolicy,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// What a failed request does to the rest of its batch.
pub enum FailurePolicy {
    /// The failure is logged and reported; sibling requests carry on.
    #[default]
    Isolate,
    /// Sibling requests still run to completion, then the first failure is returned as the outcome of the batch.
    AbortBatch,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            process: None,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl BatchOptions {
    /// Where the result and snapshot logs are written.
    ///
    /// If unset, defaults to the working directory.
    pub fn set_output_dir<P: Into<PathBuf>>(&mut self, v: P) -> &mut Self {
        self.output_dir = v.into();
        self
    }
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The container to sample with the stats tool. `None` disables snapshots.
    pub fn set_process(&mut self, v: Option<String>) -> &mut Self {
        self.process = v;
        self
    }
    pub fn process(&self) -> Option<&str> {
        self.process.as_deref()
    }

    pub fn set_failure_policy(&mut self, v: FailurePolicy) -> &mut Self {
        self.failure_policy = v;
        self
    }
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// `response_stats_{backend}.csv`
    pub fn result_path(&self, backend: &str) -> PathBuf {
        self.output_dir.join(format!("response_stats_{backend}.csv"))
    }

    /// `docker_stats_{backend}.txt`
    pub fn snapshot_path(&self, backend: &str) -> PathBuf {
        self.output_dir.join(format!("docker_stats_{backend}.txt"))
    }
}

impl<X: RequestExecutor, S: ProcessStats> LoadBatcher<X, S> {
    pub fn new(executor: X, stats: S, options: BatchOptions) -> Self {
        Self {
            executor: Arc::new(executor),
            stats: Arc::new(stats),
            options,
        }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Issue every descriptor `repetitions` times, all at once, and wait for all of them.
    ///
    /// The result log of `backend` is truncated first, then gets one row per successful request in
    /// completion order. If a process is configured, its snapshot log is truncated too and gets one
    /// initial snapshot plus one per repetition; failing to capture a snapshot is never fatal.
    pub async fn run(
        &self,
        backend: &str,
        descriptors: &[RequestDescriptor],
        repetitions: u32,
    ) -> LoaderResult<BatchRunReport> {
        if repetitions == 0 {
            return Err(HarnessErr::InvalidBatch(
                "repetitions must be positive".to_owned(),
            ));
        }
        if descriptors.is_empty() {
            return Err(HarnessErr::InvalidBatch(
                "no request descriptors".to_owned(),
            ));
        }

        let started = Instant::now();
        let mut report = BatchRunReport::new(backend);
        let results = LogFile::result_log(self.options.result_path(backend)).await?;
        let snapshots = match self.options.process() {
            Some(process) => {
                let log = LogFile::snapshot_log(self.options.snapshot_path(backend)).await?;
                // the header-bearing snapshot, taken before any load
                if self.snapshot(process, log.sender()).await {
                    report.snapshots_taken += 1;
                } else {
                    report.snapshots_failed += 1;
                }
                Some((process, log))
            }
            None => None,
        };

        log::debug!(
            "Batch for {backend}: {} descriptor(s) x {repetitions}",
            descriptors.len()
        );

        let mut requests = Vec::with_capacity(descriptors.len() * repetitions as usize);
        let mut captures = Vec::with_capacity(repetitions as usize);
        for repetition in 0..repetitions {
            for descriptor in descriptors.iter().copied() {
                let executor = self.executor.clone();
                let log = results.sender();
                requests.push(spawn_task(async move {
                    let start = Instant::now();
                    let outcome = executor.execute(&descriptor).await;
                    let elapsed = start.elapsed();
                    match outcome {
                        Ok(response) => {
                            let result = BatchResult::new(descriptor, repetition, elapsed, response);
                            log.result(&result);
                            Ok(result)
                        }
                        Err(error) => Err(RequestFailure {
                            descriptor,
                            repetition,
                            error,
                        }),
                    }
                }));
            }
            if let Some((process, log)) = &snapshots {
                let stats = self.stats.clone();
                let process = process.to_string();
                let log = log.sender();
                captures.push(spawn_task(async move {
                    capture(stats.as_ref(), &process, log).await
                }));
            }
        }

        for request in requests {
            match request.await.map_err(runtime_error)? {
                Ok(result) => report.results.push(result),
                Err(failure) => {
                    log::warn!("{failure}");
                    report.failures.push(failure);
                }
            }
        }
        for captured in captures {
            if captured.await.map_err(runtime_error)? {
                report.snapshots_taken += 1;
            } else {
                report.snapshots_failed += 1;
            }
        }

        results.close().await?;
        if let Some((_, log)) = snapshots {
            if let Err(e) = log.close().await {
                log::warn!("Failed to write snapshots of {backend}: {e}");
            }
        }
        report.elapsed = started.elapsed();

        log::debug!(
            "Batch for {backend} finished in {:?}: {} ok, {} failed",
            report.elapsed,
            report.results.len(),
            report.failures.len()
        );

        match (self.options.failure_policy, report.failures.first()) {
            (FailurePolicy::AbortBatch, Some(failure)) => {
                Err(HarnessErr::Request(failure.error.clone()))
            }
            _ => Ok(report),
        }
    }

    async fn snapshot(&self, process: &str, log: LogSender) -> bool {
        capture(self.stats.as_ref(), process, log).await
    }
}

async fn capture<S: ProcessStats>(stats: &S, process: &str, log: LogSender) -> bool {
    match stats.capture(process).await {
        Ok(snapshot) => {
            log.snapshot(snapshot);
            true
        }
        Err(e) => {
            log::warn!("Error capturing stats for {process}: {e}");
            false
        }
    }
}
