use feedauth::logger::*;

fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    debug!("hidden at the bootstrap level");
    info!(subject = "42", "bootstrap filter active");

    logger.reload_from_config(&LogConfig {
        filter: "logger_demo=debug".to_string(),
    })?;
    debug!(jti = "0f3c", "debug visible after reload");
    warn!(error = "connection refused", "storing token pair failed");

    let rejected = logger.reload_from_config(&LogConfig {
        filter: "=[".to_string(),
    });
    info!(rejected = rejected.is_err(), "invalid filter keeps the previous one");

    Ok(())
}
