use anyhow::Context;
use nrf_access_token::config::Config;
use nrf_access_token::jwt::SigningKey;
use nrf_access_token::registry::{HttpRegistry, InMemoryRegistry, NfRegistry};
use nrf_access_token::{metrics, observability, server, shutdown, AccessTokenIssuer};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    observability::init_tracing(&config.logging);

    info!(
        nrf_instance_id = %config.issuer.nrf_instance_id,
        algorithm = %config.signing.algorithm.as_str(),
        "Starting NRF access token service"
    );

    let key = SigningKey::load(&config.signing).context("failed to load signing key")?;
    let mut issuer = AccessTokenIssuer::new(config.issuer.clone(), Arc::new(key));

    if let Some(registry) = build_registry(&config)? {
        issuer = issuer.with_registry(registry);
    } else {
        warn!("No NF registry configured, every well-formed request will be trusted");
    }

    if config.metrics_enabled {
        tokio::spawn(metrics::serve(config.metrics_addr()));
    }

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "Access token endpoint listening");

    shutdown::serve_with_graceful_shutdown(
        listener,
        server::router(Arc::new(issuer)),
        shutdown::wait_for_signal(),
        config.shutdown_timeout,
    )
    .await
    .context("server error")?;

    Ok(())
}

fn build_registry(config: &Config) -> anyhow::Result<Option<Arc<dyn NfRegistry>>> {
    if let Some(url) = &config.registry.url {
        info!(url = %url, "Using NRF registry over HTTP");
        let registry = HttpRegistry::new(url.clone(), config.registry.timeout)
            .context("failed to build registry client")?;
        return Ok(Some(Arc::new(registry)));
    }

    if let Some(path) = &config.registry.profiles_file {
        let registry = InMemoryRegistry::from_file(path).context("failed to load NF profiles")?;
        if registry.is_empty() {
            warn!(path = %path.display(), "NF profile file is empty, every request will be rejected");
        } else {
            info!(profiles = registry.len(), path = %path.display(), "Using static NF profiles");
        }
        return Ok(Some(Arc::new(registry)));
    }

    Ok(None)
}
