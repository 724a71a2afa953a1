use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{SatelliteImages, ServiceError};

/// Client for the blockchain microservice: pins certificate metadata to IPFS
/// and mints the carbon-credit NFT.
#[derive(Clone)]
pub struct BlockchainClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// Certificate payload pinned to IPFS before minting.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CertificateMetadata {
    pub farmer_name: String,
    pub farm_id: String,
    pub carbon_tons: f64,
    pub satellite_images: SatelliteImages,
    pub certificate_id: String,
    pub location: Location,
    pub crop_type: String,
    pub acres: f64,
    pub issued_date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpfsUploadResponse {
    success: bool,
    ipfs_hash: Option<String>,
    ipfs_url: Option<String>,
    error: Option<String>,
}

pub struct IpfsUpload {
    pub hash: String,
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    pub farmer_address: String,
    pub farm_id: String,
    pub carbon_tons: f64,
    pub ipfs_hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MintResponse {
    success: bool,
    transaction_hash: Option<String>,
    token_id: Option<String>,
    explorer_url: Option<String>,
    opensea_url: Option<String>,
    error: Option<String>,
}

pub struct MintResult {
    pub transaction_hash: String,
    pub token_id: Option<String>,
    pub explorer_url: Option<String>,
    pub opensea_url: Option<String>,
}

impl BlockchainClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn upload_to_ipfs(&self, metadata: &CertificateMetadata) -> Result<IpfsUpload, ServiceError> {
        let url = format!("{}/upload-to-ipfs", self.base_url);
        let response = self.client.post(&url).json(metadata).send().await?;
        if !response.status().is_success() {
            return Err(ServiceError::Upstream(format!(
                "IPFS upload returned {}",
                response.status()
            )));
        }

        let body: IpfsUploadResponse = response.json().await?;
        match body {
            IpfsUploadResponse {
                success: true,
                ipfs_hash: Some(hash),
                ipfs_url,
                ..
            } => Ok(IpfsUpload { hash, url: ipfs_url }),
            IpfsUploadResponse { error, .. } => Err(ServiceError::Upstream(
                error.unwrap_or_else(|| "IPFS upload failed".to_string()),
            )),
        }
    }

    pub async fn mint_certificate(&self, request: &MintRequest) -> Result<MintResult, ServiceError> {
        let url = format!("{}/mint-certificate", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;
        if !response.status().is_success() {
            return Err(ServiceError::Upstream(format!(
                "Minting service returned {}",
                response.status()
            )));
        }

        let body: MintResponse = response.json().await?;
        match body {
            MintResponse {
                success: true,
                transaction_hash: Some(transaction_hash),
                token_id,
                explorer_url,
                opensea_url,
                ..
            } => Ok(MintResult {
                transaction_hash,
                token_id,
                explorer_url,
                opensea_url,
            }),
            MintResponse { error, .. } => Err(ServiceError::Upstream(
                error.unwrap_or_else(|| "Certificate minting failed".to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certificate_metadata_uses_camel_case_wire_names() {
        let metadata = CertificateMetadata {
            farmer_name: "Ravi".to_string(),
            farm_id: "farm-1".to_string(),
            carbon_tons: 4.2,
            satellite_images: SatelliteImages::default(),
            certificate_id: "CC-1-abc".to_string(),
            location: Location { lat: 30.9, lng: 75.85 },
            crop_type: "wheat".to_string(),
            acres: 5.0,
            issued_date: "2025-06-01T00:00:00Z".to_string(),
        };
        let value = serde_json::to_value(&metadata).unwrap();
        assert!(value.get("farmerName").is_some());
        assert!(value.get("carbonTons").is_some());
        assert!(value.get("satelliteImages").is_some());
        assert!(value.get("issuedDate").is_some());
    }

    #[test]
    fn mint_response_tolerates_missing_token_id() {
        let raw = serde_json::json!({
            "success": true,
            "transactionHash": "0xabc",
            "tokenId": null,
            "explorerUrl": "https://amoy.polygonscan.com/tx/0xabc",
            "openseaUrl": null
        });
        let parsed: MintResponse = serde_json::from_value(raw).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.transaction_hash.as_deref(), Some("0xabc"));
        assert!(parsed.token_id.is_none());
    }
}
