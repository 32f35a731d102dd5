use anyhow::Result;
use clap::{Parser, ValueEnum};
use edfi_harness_loader::{
    ApiSession, BatchOptions, DockerStats, FailurePolicy, HttpClient, LatencySummary, LoadBatcher,
    PostgresOptions, PostgresPager, ResourcePager, SearchPager,
};
use edfi_harness_types::{RequestDescriptor, RequestExecutor};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Opensearch,
    Postgres,
    Api,
}

#[derive(Debug, Parser)]
struct Args {
    #[clap(
        long,
        value_delimiter = ',',
        default_value = "opensearch",
        help = "Backends to test, one after another"
    )]
    backend: Vec<Backend>,
    #[clap(
        long,
        value_delimiter = ',',
        default_value = "10000:1,100000:1,1000000:1",
        help = "Pages to read, as `offset:size`"
    )]
    descriptor: Vec<RequestDescriptor>,
    #[clap(long, default_value_t = 1, help = "How many times every page is read")]
    repetitions: u32,
    #[clap(long, env = "OPENSEARCH_PORT", default_value_t = 9200)]
    opensearch_port: u16,
    #[clap(long, env = "OPENSEARCH_INDEX", default_value = "testdb")]
    opensearch_index: String,
    #[clap(long, env = "OPENSEARCH_CONTAINER", default_value = "opensearch")]
    opensearch_container: String,
    #[clap(long, env = "POSTGRES_PORT", default_value_t = 5432)]
    postgres_port: u16,
    #[clap(long, env = "POSTGRES_USER", default_value = "postgres")]
    postgres_user: String,
    #[clap(long, env = "POSTGRES_PASSWORD", default_value = "abcdefgh1!")]
    postgres_password: String,
    #[clap(long, env = "POSTGRES_DB_NAME", default_value = "testdb")]
    postgres_db_name: String,
    #[clap(long, env = "POSTGRES_CONTAINER", default_value = "postgres")]
    postgres_container: String,
    #[clap(long, env = "API_PORT", default_value_t = 8001)]
    api_port: u16,
    #[clap(long, env = "API_CONTAINER", default_value = "ed-fi-ods-api")]
    api_container: String,
    #[clap(long, env = "CLIENT_ID", default_value = "minimalKey")]
    client_id: String,
    #[clap(long, env = "CLIENT_SECRET", default_value = "minimalSecret")]
    client_secret: String,
    #[clap(
        long,
        default_value = "ed-fi/students",
        help = "API resource to page through"
    )]
    resource: String,
    #[clap(long, default_value = ".", help = "Where to write the stats files")]
    output_dir: PathBuf,
    #[clap(long, help = "Do not capture docker stats")]
    no_docker_stats: bool,
    #[clap(long, help = "Fail the run on the first failed request")]
    abort_on_failure: bool,
    #[clap(long, help = "Print the latency summary as JSON, one line per backend")]
    json: bool,
}

#[derive(Debug, Serialize)]
struct JsonSummary<'a> {
    backend: &'a str,
    summary: Vec<LatencySummary>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let http = HttpClient::new()?;

    println!("Starting performance test. This will take a while...");
    for backend in args.backend.iter().copied() {
        match backend {
            Backend::Opensearch => {
                println!("Starting OpenSearch tests");
                let base_url = format!("http://localhost:{}", args.opensearch_port);
                let pager = SearchPager::new(http.clone(), &base_url, &args.opensearch_index);
                run(&args, "opensearch", &args.opensearch_container, pager).await?;
            }
            Backend::Postgres => {
                println!("Starting PostgreSQL tests");
                let mut options = PostgresOptions::default();
                options
                    .set_port(args.postgres_port)
                    .set_user(args.postgres_user.as_str())
                    .set_password(args.postgres_password.as_str())
                    .set_database(args.postgres_db_name.as_str());
                let pager = PostgresPager::connect(&options).await?;
                run(&args, "postgres", &args.postgres_container, pager.clone()).await?;
                pager.close().await;
            }
            Backend::Api => {
                println!("Starting API tests");
                let base_url = format!("http://localhost:{}", args.api_port);
                let session =
                    ApiSession::connect(&http, &base_url, &args.client_id, &args.client_secret)
                        .await?;
                let pager = ResourcePager::new(http.clone(), session, &args.resource);
                run(&args, "api", &args.api_container, pager).await?;
            }
        }
    }

    Ok(())
}

async fn run<X: RequestExecutor>(
    args: &Args,
    backend: &str,
    container: &str,
    executor: X,
) -> Result<()> {
    let mut options = BatchOptions::default();
    options
        .set_output_dir(&args.output_dir)
        .set_process((!args.no_docker_stats).then(|| container.to_owned()))
        .set_failure_policy(if args.abort_on_failure {
            FailurePolicy::AbortBatch
        } else {
            FailurePolicy::Isolate
        });

    let batcher = LoadBatcher::new(executor, DockerStats::new(), options);
    let report = batcher
        .run(backend, &args.descriptor, args.repetitions)
        .await?;

    println!(
        "{backend}: {} requests ok, {} failed, {} snapshots in {:.2} seconds",
        report.results().len(),
        report.failures().len(),
        report.snapshots_taken(),
        report.elapsed().as_secs_f64()
    );
    if args.json {
        let summary = JsonSummary {
            backend,
            summary: report.summary(),
        };
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        for summary in report.summary() {
            println!("{summary}");
        }
    }
    Ok(())
}
