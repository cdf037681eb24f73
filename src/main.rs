#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
// easier to use when using the functions as callback of foreign functions
#![allow(clippy::needless_pass_by_value)]

use anyhow::Result;
use axum::Extension;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;

use crate::api::router;
use crate::config::Config;
use crate::notifications::Pusher;
use crate::notifications::WebPushPusher;
use crate::storage::setup;
use crate::storage::Storage;

mod api;
mod config;
mod graceful_shutdown;
mod notifications;
mod records;
mod storage;
mod subscriptions;
#[cfg(test)]
mod tests;
mod utils;

const DEFAULT_RUST_LOG: &str = "temps=info,tower_http=info";
const DEFAULT_DEBUG_RUST_LOG: &str = "temps=debug,tower_http=debug";

#[tokio::main]
async fn main() -> Result<()> {
    setup_environment();

    let config = Config::from_env()?;

    setup_tracing(&config);

    let address = config.address;
    let app = setup_app(config).await?;

    tracing::info!("Listening on {}", address);

    let listener = TcpListener::bind(&address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(graceful_shutdown::handler())
        .await?;

    Ok(())
}

/// Create and setup the app with its dependencies
///
/// # Errors
///
/// Will return `Err` if any of its dependencies fail to load:
/// - Database connection
pub async fn setup_app(config: Config) -> Result<Router> {
    let storage = setup().await;
    let pusher = WebPushPusher::new(&config);

    Ok(create_router(storage, pusher, config))
}

/// Create the router for the temperature diary
fn create_router<S: Storage, P: Pusher>(storage: S, pusher: P, config: Config) -> Router {
    Router::new()
        .nest("/api", router::<S, P>())
        .layer(axum::middleware::from_fn(api::check_host))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(storage))
        .layer(Extension(pusher))
        .layer(Extension(config))
}

fn setup_environment() {
    dotenvy::dotenv().ok();
}

fn setup_tracing(config: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;
    use tracing_subscriber::EnvFilter;

    let default_filter = if config.debug {
        DEFAULT_DEBUG_RUST_LOG
    } else {
        DEFAULT_RUST_LOG
    };

    registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(fmt::layer())
        .init();
}
