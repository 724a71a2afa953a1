use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{SatelliteImages, ServiceError};

/// Client for the carbon-estimation microservice.
#[derive(Clone)]
pub struct MlClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarbonRequest {
    pub farm_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub acres: f64,
    pub crop_type: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Ndvi {
    pub baseline: f64,
    pub current: f64,
    pub increase: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CarbonData {
    pub farm_id: String,
    pub region: String,
    pub ndvi: Ndvi,
    pub carbon_tons: f64,
    pub earnings_estimate: f64,
    pub confidence: f64,
    pub satellite_images: SatelliteImages,
}

#[derive(Debug, Deserialize)]
struct CarbonResponse {
    success: bool,
    data: Option<CarbonData>,
    error: Option<String>,
}

impl MlClient {
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

    /// Requests a carbon-sequestration estimate for a farm. The model itself
    /// lives in the service; the response is persisted verbatim by the caller.
    pub async fn calculate_carbon(&self, request: &CarbonRequest) -> Result<CarbonData, ServiceError> {
        let url = format!("{}/calculate-carbon", self.base_url);
        log::info!("Requesting carbon estimate for farm {}", request.farm_id);

        let response = self.client.post(&url).json(request).send().await?;
        if !response.status().is_success() {
            return Err(ServiceError::Upstream(format!(
                "ML service returned {}",
                response.status()
            )));
        }

        let body: CarbonResponse = response.json().await?;
        match body {
            CarbonResponse {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            CarbonResponse { error, .. } => Err(ServiceError::Upstream(
                error.unwrap_or_else(|| "Carbon calculation failed".to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carbon_request_uses_camel_case_wire_names() {
        let request = CarbonRequest {
            farm_id: "abc".to_string(),
            latitude: 30.9,
            longitude: 75.85,
            acres: 5.0,
            crop_type: "wheat".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("farmId").is_some());
        assert!(value.get("cropType").is_some());
        assert!(value.get("latitude").is_some());
        assert!(value.get("farm_id").is_none());
    }

    #[test]
    fn carbon_response_parses_service_payload() {
        let raw = serde_json::json!({
            "success": true,
            "data": {
                "farmId": "abc",
                "region": "Punjab",
                "ndvi": { "baseline": 0.45, "current": 0.70, "increase": 0.25 },
                "carbonTons": 1.5,
                "earningsEstimate": 4800,
                "confidence": 0.95,
                "satelliteImages": {
                    "january": "/static/satellite-images/jan.png",
                    "june": "/static/satellite-images/jun.png"
                }
            }
        });
        let parsed: CarbonResponse = serde_json::from_value(raw).unwrap();
        let data = parsed.data.unwrap();
        assert_eq!(data.region, "Punjab");
        assert_eq!(data.ndvi.increase, 0.25);
        assert_eq!(data.earnings_estimate, 4800.0);
    }
}
