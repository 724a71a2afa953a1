pub mod blockchain;
pub mod ml;
pub mod sentinel;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Upstream(String),
}

/// January/June image references shared by the ML response, the farm record
/// and the certificate metadata.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SatelliteImages {
    pub january: Option<String>,
    pub june: Option<String>,
}
