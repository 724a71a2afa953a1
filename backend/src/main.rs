use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use diesel::prelude::*;
use serde_json::json;
use std::net::SocketAddr;

mod carbon;
mod config;
mod db;
mod error;
mod farmers;
mod farms;
mod geometry;
mod marketplace;
mod models;
mod schema;
mod services;

use services::blockchain::BlockchainClient;
use services::ml::MlClient;
use services::sentinel::SentinelClient;

#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub ml: MlClient,
    pub blockchain: BlockchainClient,
    pub sentinel: Option<SentinelClient>,
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Carbon Credit Marketplace API",
        "status": "running",
        "version": "1.0.0",
        "endpoints": {
            "farmers": "/api/farmers",
            "farms": "/api/farms",
            "carbon": "/api/carbon",
            "marketplace": "/api/marketplace"
        }
    }))
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Route not found" })),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = config::AppConfig::load()?;

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));

    let mut conn = PgConnection::establish(&config.database_url)
        .map_err(|e| format!("Failed to connect to database: {}", e))?;
    let test_query: i32 = diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>("1"))
        .get_result(&mut conn)?;
    log::info!("Database test query result: {}", test_query);

    let ml = MlClient::new(&config.ml_service_url);
    let blockchain = BlockchainClient::new(&config.blockchain_service_url);
    let sentinel = match (&config.sentinel_client_id, &config.sentinel_client_secret) {
        (Some(id), Some(secret)) => Some(SentinelClient::new(id, secret)),
        _ => {
            log::info!("Sentinel Hub credentials not configured; satellite imagery disabled");
            None
        }
    };

    log::info!("ML service: {}", config.ml_service_url);
    log::info!("Blockchain service: {}", config.blockchain_service_url);
    log::info!("Starting server on {}", addr);

    let state = AppState {
        config,
        ml,
        blockchain,
        sentinel,
    };

    let app = Router::new()
        .route("/", get(health))
        .route("/api/farmers/register", post(farmers::register))
        .route(
            "/api/farmers/register-with-satellite",
            post(farmers::register_with_satellite),
        )
        .route("/api/farmers/:phone", get(farmers::get_by_phone))
        .route("/api/farms/:farm_id", get(farms::get_farm))
        .route("/api/farms/:farm_id/calculate", post(farms::calculate_carbon))
        .route("/api/carbon/claim", post(carbon::claim_credits))
        .route(
            "/api/carbon/certificate/:certificate_id",
            get(carbon::get_certificate),
        )
        .route("/api/marketplace/listings", get(marketplace::get_listings))
        .route("/api/marketplace/buy", post(marketplace::buy_credits))
        .route("/api/marketplace/stats", get(marketplace::get_stats))
        .fallback(not_found)
        .with_state(state);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
