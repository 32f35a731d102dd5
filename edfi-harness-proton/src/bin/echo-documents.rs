use anyhow::Result;
use clap::Parser;
use edfi_harness_proton::{
    ExternalStream, ProtonClient, ProtonConnectOptions, ProtonSource, QueryEngine,
};
use edfi_harness_types::{
    export::futures::StreamExt, Buffer, RecordSource, SourceKey, SourceUrl,
};
use edfi_harness_validator::CancelToken;
use std::pin::pin;

#[derive(Debug, Parser)]
struct Args {
    #[clap(
        long,
        help = "Proton URL with the stream name, i.e. try `http://localhost:8123/document`",
        env = "PROTON_URL",
        default_value = "http://localhost:8123/document"
    )]
    source: SourceUrl,
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

    println!("Creating new stream");
    let external = ExternalStream::new(stream.clone(), args.brokers, args.topic);
    client.create_external_stream(&external).await?;

    println!("List streams");
    for name in client.show_streams().await? {
        println!("+ {name}");
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
    let mut source = ProtonSource::all(client, &stream);
    let mut records = pin!(source.subscribe().await?.take_until(token.cancelled()));
    while let Some(record) = records.next().await {
        match record {
            Ok(record) => println!("{}", record.payload().as_str()?),
            Err(e) if !e.is_fatal() => log::warn!("Skipping record: {e}"),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
