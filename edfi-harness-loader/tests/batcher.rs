use edfi_harness_loader::{BatchOptions, FailurePolicy, LoadBatcher};
use edfi_harness_types::{
    export::serde_json::json, HarnessErr, ProcessStats, RequestDescriptor, RequestErr,
    RequestExecutor, ResourceSnapshot, Response, StatsErr, Timestamp,
};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

/// Answers after a short, offset-dependent delay. Fails every request of the given size.
#[derive(Debug, Default)]
struct FakeExecutor {
    failing_size: Option<u64>,
    calls: AtomicU32,
}

impl RequestExecutor for FakeExecutor {
    async fn execute(&self, descriptor: &RequestDescriptor) -> Result<Response, RequestErr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(descriptor.offset() % 13)).await;
        if Some(descriptor.size()) == self.failing_size {
            return Err(RequestErr::Status {
                uri: format!("http://localhost:9200/testdb/_search?{descriptor}"),
                status: 500,
                body: "boom".to_owned(),
            });
        }
        Ok(Response::Json(json!({ "hits": { "total": descriptor.size() } })))
    }
}

#[derive(Debug, Default, Clone)]
struct FakeStats {
    fail: bool,
    calls: Arc<AtomicU32>,
}

impl ProcessStats for FakeStats {
    async fn capture(&self, process: &str) -> Result<ResourceSnapshot, StatsErr> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StatsErr::EmptyOutput(process.to_owned()));
        }
        let output = format!("CONTAINER ID   NAME   CPU %\nc0ffee   {process}   {n}.00%\n");
        ResourceSnapshot::parse(process, Timestamp::now_utc(), &output)
    }
}

fn output_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "edfi-harness-loader-{}-{test}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn options(dir: &PathBuf, process: Option<&str>) -> BatchOptions {
    let mut options = BatchOptions::default();
    options
        .set_output_dir(dir)
        .set_process(process.map(ToOwned::to_owned));
    options
}

fn descriptors(pairs: &[(u64, u64)]) -> Vec<RequestDescriptor> {
    pairs
        .iter()
        .map(|(offset, size)| RequestDescriptor::new(*offset, *size).unwrap())
        .collect()
}

/// `offset,size` of every row, sorted, with the header checked and removed.
fn logged_pages(text: &str) -> Vec<String> {
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("from_offset,size,response_time"));
    let mut pages: Vec<String> = lines
        .map(|line| {
            let (page, seconds) = line.rsplit_once(',').unwrap();
            assert!(seconds.parse::<f64>().unwrap() >= 0.0);
            page.to_owned()
        })
        .collect();
    pages.sort();
    pages
}

#[tokio::test]
async fn one_row_per_request() -> anyhow::Result<()> {
    let _ = env_logger::try_init();

    let dir = output_dir("rows");
    let stats = FakeStats::default();
    let batcher = LoadBatcher::new(
        FakeExecutor::default(),
        stats.clone(),
        options(&dir, Some("opensearch")),
    );
    let report = batcher
        .run("opensearch", &descriptors(&[(10000, 1), (100000, 1)]), 2)
        .await?;

    assert_eq!(report.backend(), "opensearch");
    assert_eq!(report.results().len(), 4);
    assert!(report.failures().is_empty());

    let text = std::fs::read_to_string(dir.join("response_stats_opensearch.csv"))?;
    assert_eq!(text.lines().count(), 5);
    assert_eq!(
        logged_pages(&text),
        ["10000,1", "10000,1", "100000,1", "100000,1"]
    );

    // one initial snapshot and one per repetition, header written once
    assert_eq!(stats.calls.load(Ordering::SeqCst), 3);
    assert_eq!(report.snapshots_taken(), 3);
    assert_eq!(report.snapshots_failed(), 0);
    let text = std::fs::read_to_string(dir.join("docker_stats_opensearch.txt"))?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("CONTAINER ID"));
    assert!(lines[1..].iter().all(|line| line.contains("opensearch")));

    let summary = report.summary();
    assert_eq!(summary.len(), 2);
    assert!(summary.iter().all(|s| s.count == 2));
    Ok(())
}

#[tokio::test]
async fn logs_are_reset_on_every_run() -> anyhow::Result<()> {
    let dir = output_dir("reset");
    let batcher = LoadBatcher::new(
        FakeExecutor::default(),
        FakeStats::default(),
        options(&dir, Some("opensearch")),
    );
    batcher
        .run("opensearch", &descriptors(&[(10, 1), (20, 1), (30, 1)]), 3)
        .await?;
    batcher
        .run("opensearch", &descriptors(&[(40, 25)]), 1)
        .await?;

    let text = std::fs::read_to_string(dir.join("response_stats_opensearch.csv"))?;
    assert_eq!(logged_pages(&text), ["40,25"]);
    let text = std::fs::read_to_string(dir.join("docker_stats_opensearch.txt"))?;
    assert_eq!(text.lines().count(), 3);
    Ok(())
}

#[tokio::test]
async fn failing_stats_tool_does_not_block_requests() -> anyhow::Result<()> {
    let dir = output_dir("stats-failure");
    let batcher = LoadBatcher::new(
        FakeExecutor::default(),
        FakeStats {
            fail: true,
            ..Default::default()
        },
        options(&dir, Some("missing")),
    );
    let report = batcher
        .run("postgres", &descriptors(&[(0, 500)]), 4)
        .await?;

    assert_eq!(report.results().len(), 4);
    assert_eq!(report.snapshots_taken(), 0);
    assert_eq!(report.snapshots_failed(), 5);
    let text = std::fs::read_to_string(dir.join("response_stats_postgres.csv"))?;
    assert_eq!(logged_pages(&text).len(), 4);
    assert_eq!(std::fs::read_to_string(dir.join("docker_stats_postgres.txt"))?, "");
    Ok(())
}

#[tokio::test]
async fn no_process_means_no_snapshots() -> anyhow::Result<()> {
    let dir = output_dir("no-process");
    let stats = FakeStats::default();
    let batcher = LoadBatcher::new(FakeExecutor::default(), stats.clone(), options(&dir, None));
    let report = batcher.run("api", &descriptors(&[(5, 5)]), 2).await?;

    assert_eq!(report.results().len(), 2);
    assert_eq!(stats.calls.load(Ordering::SeqCst), 0);
    assert_eq!(report.snapshots_taken(), 0);
    assert!(!dir.join("docker_stats_api.txt").exists());
    Ok(())
}

#[tokio::test]
async fn failures_are_isolated_by_default() -> anyhow::Result<()> {
    let dir = output_dir("isolate");
    let batcher = LoadBatcher::new(
        FakeExecutor {
            failing_size: Some(25),
            ..Default::default()
        },
        FakeStats::default(),
        options(&dir, None),
    );
    let report = batcher
        .run("opensearch", &descriptors(&[(10000, 1), (10000, 25)]), 3)
        .await?;

    assert_eq!(report.results().len(), 3);
    assert_eq!(report.failures().len(), 3);
    for failure in report.failures() {
        assert_eq!(failure.descriptor.size(), 25);
        assert!(matches!(
            failure.error,
            RequestErr::Status { status: 500, .. }
        ));
    }
    let text = std::fs::read_to_string(dir.join("response_stats_opensearch.csv"))?;
    assert_eq!(logged_pages(&text), ["10000,1", "10000,1", "10000,1"]);
    Ok(())
}

#[tokio::test]
async fn abort_policy_returns_the_first_failure() -> anyhow::Result<()> {
    let dir = output_dir("abort");
    let mut options = options(&dir, None);
    options.set_failure_policy(FailurePolicy::AbortBatch);
    let executor = FakeExecutor {
        failing_size: Some(25),
        ..Default::default()
    };
    let batcher = LoadBatcher::new(executor, FakeStats::default(), options);
    let result = batcher
        .run("opensearch", &descriptors(&[(10000, 1), (10000, 25)]), 2)
        .await;

    assert!(matches!(
        result,
        Err(HarnessErr::Request(RequestErr::Status { status: 500, .. }))
    ));
    // siblings still ran to completion
    let text = std::fs::read_to_string(dir.join("response_stats_opensearch.csv"))?;
    assert_eq!(logged_pages(&text), ["10000,1", "10000,1"]);
    Ok(())
}

#[tokio::test]
async fn invalid_batches_do_no_io() {
    let dir = output_dir("invalid");
    let batcher = LoadBatcher::new(
        FakeExecutor::default(),
        FakeStats::default(),
        options(&dir, Some("opensearch")),
    );

    assert!(matches!(
        batcher.run("zero", &descriptors(&[(1, 1)]), 0).await,
        Err(HarnessErr::InvalidBatch(_))
    ));
    assert!(matches!(
        batcher.run("empty", &[], 3).await,
        Err(HarnessErr::InvalidBatch(_))
    ));
    assert!(!dir.join("response_stats_zero.csv").exists());
    assert!(!dir.join("response_stats_empty.csv").exists());
    assert!(!dir.join("docker_stats_zero.txt").exists());
}
