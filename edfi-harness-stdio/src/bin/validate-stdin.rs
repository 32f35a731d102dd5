use anyhow::Result;
use clap::Parser;
use edfi_harness_stdio::{StdioOptions, StdioSource};
use edfi_harness_types::{DecodeOptions, SourceKey, DEFAULT_CATEGORY_SUFFIX};
use edfi_harness_validator::{
    CancelToken, CategorySuffixRule, ConsoleSink, StreamValidator, ValidatorOptions,
};

#[derive(Debug, Parser)]
struct Args {
    #[clap(long, help = "Ignore lines prefixed with another source key")]
    source_key: Option<SourceKey>,
    #[clap(long, default_value = "School", help = "Resource to validate")]
    resource: String,
    #[clap(long, default_value = "schoolId", help = "Identifier field of the resource")]
    id_field: String,
    #[clap(long, default_value = DEFAULT_CATEGORY_SUFFIX, help = "Every category must end with this")]
    suffix: String,
    #[clap(long, help = "Log valid documents too")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let mut stdio = StdioOptions::default();
    if let Some(key) = args.source_key {
        stdio.set_source_key(key);
    }

    let token = CancelToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut decode = DecodeOptions::default();
    decode
        .set_resource(args.resource)
        .set_id_field(args.id_field);
    let mut options = ValidatorOptions::default();
    options.set_decode_options(decode).set_log_valid(args.verbose);

    let validator = StreamValidator::new(CategorySuffixRule::new(args.suffix), options);
    let mut source = StdioSource::new(stdio);
    let stats = validator.run(&mut source, &mut ConsoleSink, &token).await?;

    eprintln!(
        "Read {} records: {} documents, {} invalid, {} skipped",
        stats.records, stats.decoded, stats.invalid, stats.skipped
    );
    Ok(())
}
