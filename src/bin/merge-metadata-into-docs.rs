use lattice_pipeline::{docs_metadata, logging};
use std::path::PathBuf;

/// Merge docs/docs-metadata.json into the lattice docs as front-matter and
/// write them to the website's middleman/source/docs.
#[derive(Debug, argh::FromArgs)]
struct Args {
    /// log debug output
    #[argh(switch, short = 'v')]
    verbose: bool,
    /// lattice checkout
    #[argh(positional, arg_name = "lattice_path")]
    lattice_path: PathBuf,
    /// website checkout
    #[argh(positional, arg_name = "website_path")]
    website_path: PathBuf,
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args: Args = argh::from_env();
    logging::setup_logger(args.verbose)?;

    let count = docs_metadata::merge_docs(&args.lattice_path, &args.website_path)?;
    tracing::info!("merged metadata into {} documents", count);
    Ok(())
}
