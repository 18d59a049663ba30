use std::io::IsTerminal;

/// Logs to stderr; stdout is kept for the output the pipeline consumes.
pub fn setup_logger(verbose: bool) -> eyre::Result<()> {
    use tracing::Level;
    use tracing_subscriber::{
        filter::LevelFilter, fmt::layer, layer::SubscriberExt, util::SubscriberInitExt, Registry,
    };

    let level = if verbose { Level::DEBUG } else { Level::INFO };
    Registry::default()
        .with(LevelFilter::from(level))
        .with(
            layer()
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init()?;

    Ok(())
}
