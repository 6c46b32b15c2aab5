// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::http::HeaderName;
use chrono::Utc;
use tokio::time;
use tower_http::cors::{Any, CorsLayer};

use server::{config, database, notifications, routes};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting up the server...");

    let db_pool = match database::establish_connection_pool(&config::database_url()).await {
        Ok(pool) => {
            tracing::info!("Database connection was made successfully.");
            pool
        }
        Err(e) => {
            tracing::error!("Failed to connect with the database: {:?}", e);
            std::process::exit(1);
        }
    };

    let sweep_pool = db_pool.clone(); // Clone the pool for the background sweeps
    tokio::spawn(async move {
        let mut interval = time::interval(config::sweep_interval());

        // The first tick completes immediately. Skip it to wait for the first interval.
        interval.tick().await;

        loop {
            interval.tick().await; // Wait for the next interval tick

            let now = Utc::now();
            if let Err(e) = notifications::run_reminder_sweep(&sweep_pool, now).await {
                tracing::error!("Error during reminder sweep: {:?}", e);
            }
            if let Err(e) = notifications::purge_expired(&sweep_pool, now).await {
                tracing::error!("Error during notification purge: {:?}", e);
            }
        }
    });

    let app_routes = routes::create_router(db_pool);

    // Configure CORS here, applying it globally to the router
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("authorization"),
        ])
        .allow_origin(Any);

    let app = app_routes.layer(cors); // Apply the CORS layer

    let addr = config::bind_addr();
    tracing::info!("The server listens on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {:?}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {:?}", e);
        std::process::exit(1);
    }
}
