use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Install the stderr fmt subscriber. DAYPLAN_LOG wins over the config filter.
pub fn init_logging(config_filter: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_env("DAYPLAN_LOG")
        .or_else(|_| EnvFilter::try_new(config_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("init logging: {e}"))?;
    Ok(())
}
