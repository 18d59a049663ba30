use eyre::WrapErr;
use lattice_pipeline::{
    config::StoreConfig,
    listing::{self, DEFAULT_BUCKET, DEFAULT_TEMPLATE},
    logging,
};
use s3_bucket::{Bucket, Credentials, Endpoint};
use std::path::PathBuf;

/// Generate the nightly bundle listing and upload it to the bucket as
/// nightly/index.html. Credentials are read from AWS_ACCESS_KEY_ID and
/// AWS_SECRET_ACCESS_KEY.
#[derive(Debug, argh::FromArgs)]
struct Args {
    /// bucket holding the nightly bundles
    #[argh(option, default = "DEFAULT_BUCKET.to_owned()")]
    bucket: String,
    /// endpoint URL of the S3 service (default: $S3_ENDPOINT or https://s3.amazonaws.com)
    #[argh(option)]
    endpoint: Option<String>,
    /// region of the bucket (default: $AWS_REGION or us-east-1)
    #[argh(option)]
    region: Option<String>,
    /// listing template to use instead of the built-in one
    #[argh(option)]
    template: Option<PathBuf>,
    /// print the listing instead of uploading it
    #[argh(switch)]
    dry_run: bool,
    /// log debug output
    #[argh(switch, short = 'v')]
    verbose: bool,
}

fn load_template(path: Option<&PathBuf>) -> eyre::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read template '{}'", path.display())),
        None => Ok(DEFAULT_TEMPLATE.to_owned()),
    }
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args: Args = argh::from_env();
    logging::setup_logger(args.verbose)?;

    let credentials = Credentials::from_env()?;
    let template = load_template(args.template.as_ref())?;
    let config = StoreConfig::resolve(args.endpoint, args.region);
    let endpoint = Endpoint::parse(&config.endpoint)?;
    let bucket = Bucket::new(&args.bucket, endpoint, config.region, credentials);

    let html = listing::generate_listing(&bucket, bucket.name(), &template)?;
    listing::finish_listing(&bucket, &html, args.dry_run, &mut std::io::stdout().lock())?;
    Ok(())
}
