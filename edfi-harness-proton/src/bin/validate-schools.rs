use anyhow::Result;
use clap::Parser;
use edfi_harness_proton::{
    ExternalStream, ProtonClient, ProtonConnectOptions, ProtonSource, QueryEngine,
};
use edfi_harness_types::{DecodeOptions, SourceKey, SourceUrl, DEFAULT_CATEGORY_SUFFIX};
use edfi_harness_validator::{
    CancelToken, CategorySuffixRule, ConsoleSink, StreamValidator, ValidatorOptions,
};

#[derive(Debug, Parser)]
struct Args {
    #[clap(
        long,
        help = "Proton URL with the stream name, i.e. try `http://localhost:8123/document`",
        env = "PROTON_URL",
        default_value = "http://localhost:8123/document"
    )]
    source: SourceUrl,
    #[clap(long, default_value = "School", help = "Resource to validate")]
    resource: String,
    #[clap(long, default_value = "schoolId", help = "Identifier field of the resource")]
    id_field: String,
    #[clap(long, default_value = DEFAULT_CATEGORY_SUFFIX, help = "Every category must end with this")]
    suffix: String,
    #[clap(long, help = "Create the external stream over the document topic first")]
    create_stream: bool,
    #[clap(long, env = "KAFKA_BROKERS", default_value = "dms-kafka1:9092")]
    brokers: String,
    #[clap(long, env = "KAFKA_TOPIC", default_value = "edfi.dms.document")]
    topic: SourceKey,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let stream = args.source.source_key()?;
    let client =
        ProtonClient::connect(args.source.endpoint().clone(), ProtonConnectOptions::default())
            .await?;
    client.ping().await?;
    println!("I am alive");

    if args.create_stream {
        let external = ExternalStream::new(stream.clone(), args.brokers, args.topic);
        client.create_external_stream(&external).await?;
        println!("Created stream {stream}");
    }

    let token = CancelToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    println!("Continuous polling for new data. Control-C to stop.");
    println!("New records will arrive here as requests are submitted to the API.");

    let mut decode = DecodeOptions::default();
    decode
        .set_resource(args.resource.as_str())
        .set_id_field(args.id_field.as_str());
    let mut options = ValidatorOptions::default();
    options.set_decode_options(decode);

    let validator = StreamValidator::new(CategorySuffixRule::new(args.suffix), options);
    let mut source = ProtonSource::resource(client, &stream, &args.resource);
    let stats = validator.run(&mut source, &mut ConsoleSink, &token).await?;

    println!(
        "Checked {} documents: {} invalid, {} records skipped",
        stats.decoded, stats.invalid, stats.skipped
    );
    Ok(())
}
