use dotenv::dotenv;
use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub ml_service_url: String,
    pub blockchain_service_url: String,
    pub sentinel_client_id: Option<String>,
    pub sentinel_client_secret: Option<String>,
    pub port: u16,
    pub carbon_price_per_ton: f64,
    pub platform_commission: f64,
    pub default_wallet_address: String,
    pub explorer_base_url: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv().ok(); // Load .env file if present
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            ml_service_url: env::var("ML_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            blockchain_service_url: env::var("BLOCKCHAIN_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            sentinel_client_id: env::var("SENTINEL_CLIENT_ID").ok(),
            sentinel_client_secret: env::var("SENTINEL_CLIENT_SECRET").ok(),
            port: env::var("PORT").unwrap_or_else(|_| "5000".to_string()).parse()?,
            carbon_price_per_ton: env::var("CARBON_PRICE_PER_TON")
                .unwrap_or_else(|_| "3200".to_string())
                .parse()?,
            platform_commission: env::var("PLATFORM_COMMISSION")
                .unwrap_or_else(|_| "0.10".to_string())
                .parse()?,
            default_wallet_address: env::var("DEFAULT_WALLET_ADDRESS").unwrap_or_default(),
            explorer_base_url: env::var("EXPLORER_BASE_URL")
                .unwrap_or_else(|_| "https://amoy.polygonscan.com".to_string()),
        })
    }
}
