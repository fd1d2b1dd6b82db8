// src/main.rs
mod api;
mod auth;
mod chart;
mod config;
mod db;
mod error;
mod filter;
mod fixtures;
mod models;
mod simulator;

use crate::api::AppState;
use crate::auth::{Sessions, UserDirectory};
use crate::config::Config;
use crate::db::{InMemoryStore, PortfolioStore, ScyllaStore};
use crate::simulator::QuoteFeed;
use env_logger::Builder;
use log::{error, info};
use std::sync::Arc;

async fn open_store(config: &Config) -> db::DbResult<Arc<dyn PortfolioStore>> {
    match &config.scylla_node {
        Some(node) => Ok(Arc::new(ScyllaStore::connect(node).await?)),
        None => {
            info!("No ScyllaDB node configured, keeping portfolios in memory.");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    Builder::new()
        .filter_level(config.log_level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    info!("Starting the M4Capital API...");

    let store = match open_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return;
        }
    };

    let users = match UserDirectory::with_demo_accounts() {
        Ok(users) => users,
        Err(e) => {
            error!("Failed to hash demo account passwords: {}", e);
            return;
        }
    };
    if let Some(demo) = users.find_by_email(fixtures::DEMO_EMAIL) {
        if let Err(e) = db::seed_portfolio(store.as_ref(), &demo.id, fixtures::demo_portfolio()).await {
            error!("Failed to seed demo portfolio: {}", e);
            return;
        }
    }

    let feed = QuoteFeed::new(fixtures::initial_quotes());
    let simulator = simulator::spawn(feed.clone(), config.quote_refresh);

    let state = AppState {
        store,
        users: Arc::new(users),
        sessions: Sessions::new(&config.jwt_secret, config.session_ttl),
        feed,
    };

    let bound = warp::serve(api::api(state)).try_bind_with_graceful_shutdown(
        config.bind_addr,
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        },
    );
    match bound {
        Ok((addr, server)) => {
            info!("Server running on http://{}", addr);
            server.await;
        }
        Err(e) => error!("Failed to bind {}: {}", config.bind_addr, e),
    }

    simulator.shutdown().await;
    info!("Server stopped.");
}
