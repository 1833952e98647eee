mod api;
mod middleware;

use std::sync::Arc;

use tickerscope_analysis::{
    AnalysisPipeline, NerClient, PipelineConfig, TeiClassifier, YahooSymbolLookup,
};
use tickerscope_core::{AppConfig, Environment};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::{AuthState, RateLimitState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = tickerscope_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pipeline = build_pipeline(&config)?;
    tracing::info!(
        env = %config.env,
        device = %config.device,
        policy = %config.determination_mode,
        sentiment_batch = pipeline.config().sentiment_batch_size.get(),
        ner_batch = pipeline.config().ner_batch_size.get(),
        extraction_concurrency = pipeline.config().extraction_concurrency.get(),
        "analysis pipeline ready"
    );

    let auth = AuthState::from_env(matches!(config.env, Environment::Development))?;
    let rate_limit = RateLimitState::per_minute(config.rate_limit_per_minute);
    let state = AppState {
        pipeline: Arc::new(pipeline),
        device: config.device,
        policy: config.determination_mode,
    };
    let app = build_app(state, auth, rate_limit);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn build_pipeline(config: &AppConfig) -> anyhow::Result<AnalysisPipeline> {
    let classifier =
        TeiClassifier::new(&config.classifier_url, config.http_timeout_secs, &config.user_agent)?;
    let recognizer =
        NerClient::new(&config.ner_url, config.http_timeout_secs, &config.user_agent)?;
    let lookup =
        YahooSymbolLookup::new(&config.lookup_url, config.http_timeout_secs, &config.user_agent)?;

    Ok(AnalysisPipeline::new(
        Arc::new(classifier),
        Arc::new(recognizer),
        Arc::new(lookup),
        PipelineConfig::from_app_config(config),
    ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, draining in-flight requests");
}
