//! RevPulse Server Entry Point

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use revpulse_config::{
    load_settings, ConfigError, LogFormat, RuntimeEnvironment, Settings, ENV_PREFIX, ENV_SELECTOR,
};
use revpulse_core::TextGenerator;
use revpulse_llm::{OpenAiConfig, OpenAiGenerator};
use revpulse_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env} > config/default > defaults
    let env = std::env::var(ENV_SELECTOR).ok().filter(|s| !s.is_empty());
    let declared = std::env::var(format!("{ENV_PREFIX}__ENVIRONMENT")).ok();
    let config = settings_or_defaults(
        env.as_deref(),
        declared.as_deref(),
        load_settings(env.as_deref()),
    )?;

    init_tracing(&config);

    tracing::info!("Starting RevPulse Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        store = ?config.store.backend,
        auth_enabled = config.auth.enabled,
        "Configuration loaded"
    );

    let store = revpulse_persistence::init(&config.store).context("record store")?;
    tracing::info!(backend = store.backend_name(), "Record store initialized");

    let mut state = AppState::new(config.clone(), store);

    if config.llm.enabled {
        match OpenAiGenerator::new(OpenAiConfig::from(&config.llm)) {
            Ok(generator) => {
                tracing::info!(
                    model = generator.model_name(),
                    endpoint = %config.llm.endpoint,
                    "Narrative insights enabled"
                );
                state = state.with_generator(Arc::new(generator));
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize text generator: {}. Using rule-based insights.",
                    e
                );
            }
        }
    }

    if config.observability.metrics_enabled {
        if let Some(handle) = init_metrics() {
            tracing::info!("Initialized Prometheus metrics at /metrics");
            state = state.with_metrics(handle);
        }
    }

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!("Listening on {}", addr);

    // Graceful shutdown on SIGTERM/SIGINT
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Whether the selected or declared environment forbids falling back to defaults
fn strict_environment(selector: Option<&str>, declared: Option<&str>) -> bool {
    [selector, declared]
        .into_iter()
        .flatten()
        .filter_map(RuntimeEnvironment::from_name)
        .any(|env| env.is_strict())
}

/// Accept loaded settings, or fall back to defaults outside staging/production
fn settings_or_defaults(
    selector: Option<&str>,
    declared: Option<&str>,
    loaded: Result<Settings, ConfigError>,
) -> anyhow::Result<Settings> {
    // Tracing not yet initialized, use eprintln for early logging
    match loaded {
        Ok(settings) => {
            eprintln!(
                "Loaded configuration from files (env: {})",
                selector.unwrap_or("default")
            );
            Ok(settings)
        }
        Err(e) if strict_environment(selector, declared) => {
            Err(e).context("configuration could not be loaded, refusing to start with defaults")
        }
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Ok(Settings::default())
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

/// Initialize console tracing
fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("revpulse={level},tower_http=debug").into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = match config.observability.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer().compact().boxed(),
    };
    subscriber.with(fmt_layer).init();
}
