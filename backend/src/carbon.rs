use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::db;
use crate::error::ApiError;
use crate::models::{farm_status, CarbonCredit, Farm, NewCarbonCredit, User};
use crate::schema::{carbon_credits, farms, users};
use crate::services::blockchain::{CertificateMetadata, Location, MintRequest};
use crate::services::SatelliteImages;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub farm_id: Uuid,
}

/// Checked in order; each rejection carries its own user-facing reason.
fn check_claimable(farm: &Farm) -> Result<(), ApiError> {
    if farm.status == farm_status::CLAIMED {
        return Err(ApiError::BusinessRule(
            "Credits already claimed for this farm".to_string(),
        ));
    }
    if farm.status != farm_status::VERIFIED {
        return Err(ApiError::BusinessRule(
            "Farm not verified yet. Please wait for carbon calculation.".to_string(),
        ));
    }
    if farm.carbon_tons <= 0.0 {
        return Err(ApiError::BusinessRule(
            "No carbon credits available".to_string(),
        ));
    }
    Ok(())
}

/// `CC-<epoch_ms>-<random>`. Best-effort uniqueness; no store lookup.
fn certificate_id() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("CC-{}-{}", Utc::now().timestamp_millis(), &random[..8])
}

/// POST /api/carbon/claim
///
/// Pin certificate metadata to IPFS, mint the NFT, then flip the farm to
/// `claimed` and list the credit. The farm row is untouched until both
/// collaborator calls have succeeded, so a failed attempt stays retryable.
pub async fn claim_credits(
    State(state): State<AppState>,
    Json(req): Json<ClaimRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = &mut db::establish_connection()?;

    let (farm, farmer): (Farm, User) = farms::table
        .inner_join(users::table)
        .filter(farms::id.eq(req.farm_id))
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Farm not found".to_string()))?;

    check_claimable(&farm)?;

    let certificate_id = certificate_id();
    let metadata = CertificateMetadata {
        farmer_name: farmer.name.clone(),
        farm_id: farm.id.to_string(),
        carbon_tons: farm.carbon_tons,
        satellite_images: SatelliteImages {
            january: farm.satellite_image_january.clone(),
            june: farm.satellite_image_june.clone(),
        },
        certificate_id: certificate_id.clone(),
        location: Location { lat: farm.lat, lng: farm.lng },
        crop_type: farm.crop_type.clone(),
        acres: farm.acres,
        issued_date: Utc::now().to_rfc3339(),
    };

    log::info!("Uploading certificate {} to IPFS", certificate_id);
    let upload = state
        .blockchain
        .upload_to_ipfs(&metadata)
        .await
        .map_err(|e| ApiError::integration("Failed to claim credits", e))?;
    log::info!("IPFS upload complete: {}", upload.hash);

    let farmer_address = farmer
        .wallet_address
        .clone()
        .unwrap_or_else(|| state.config.default_wallet_address.clone());
    let mint = state
        .blockchain
        .mint_certificate(&MintRequest {
            farmer_address,
            farm_id: farm.id.to_string(),
            carbon_tons: farm.carbon_tons,
            ipfs_hash: upload.hash.clone(),
        })
        .await
        .map_err(|e| {
            // The pinned metadata stays orphaned on IPFS; nothing to roll back.
            log::warn!(
                "Minting failed for certificate {}; upload {} left unreferenced",
                certificate_id,
                upload.hash
            );
            ApiError::integration("Failed to claim credits", e)
        })?;
    log::info!("Certificate minted, token {:?}", mint.token_id);

    // Guarded transition: a concurrent claim that already flipped the farm
    // makes this a no-op, and no credit row is written.
    let now = Utc::now();
    let updated = diesel::update(
        farms::table
            .filter(farms::id.eq(farm.id))
            .filter(farms::status.eq(farm_status::VERIFIED)),
    )
    .set((
        farms::certificate_id.eq(Some(certificate_id.clone())),
        farms::blockchain_tx_hash.eq(Some(mint.transaction_hash.clone())),
        farms::token_id.eq(mint.token_id.clone()),
        farms::status.eq(farm_status::CLAIMED),
        farms::claimed_at.eq(Some(now)),
        farms::updated_at.eq(now),
    ))
    .execute(conn)?;
    if updated == 0 {
        return Err(ApiError::BusinessRule(
            "Credits already claimed for this farm".to_string(),
        ));
    }

    let credit = NewCarbonCredit::new(
        farm.id,
        farmer.id,
        farm.carbon_tons,
        state.config.carbon_price_per_ton,
        mint.token_id.clone(),
        Some(mint.transaction_hash.clone()),
        Some(upload.hash.clone()),
    );
    diesel::insert_into(carbon_credits::table)
        .values(&credit)
        .execute(conn)?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "certificateId": certificate_id,
            "tokenId": mint.token_id,
            "transactionHash": mint.transaction_hash,
            "ipfsHash": upload.hash,
            "ipfsUrl": upload.url,
            "carbonTons": farm.carbon_tons,
            "earningsEstimate": farm.carbon_tons * state.config.carbon_price_per_ton,
            "explorerUrl": mint.explorer_url,
            "openseaUrl": mint.opensea_url
        },
        "message": "Carbon credits claimed successfully!"
    })))
}

/// GET /api/carbon/certificate/:certificate_id
pub async fn get_certificate(
    State(state): State<AppState>,
    Path(certificate_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = &mut db::establish_connection()?;

    let (farm, farmer): (Farm, User) = farms::table
        .inner_join(users::table)
        .filter(farms::certificate_id.eq(&certificate_id))
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Certificate not found".to_string()))?;

    let credit: Option<CarbonCredit> = carbon_credits::table
        .filter(carbon_credits::farm_id.eq(farm.id))
        .first(conn)
        .optional()?;

    let explorer_url = farm
        .blockchain_tx_hash
        .as_deref()
        .map(|hash| format!("{}/tx/{}", state.config.explorer_base_url, hash));

    Ok(Json(json!({
        "success": true,
        "data": {
            "certificateId": farm.certificate_id,
            "farmerName": farmer.name,
            "farmLocation": { "lat": farm.lat, "lng": farm.lng },
            "region": farm.region,
            "carbonTons": farm.carbon_tons,
            "cropType": farm.crop_type,
            "acres": farm.acres,
            "issuedDate": farm.claimed_at,
            "blockchainTxHash": farm.blockchain_tx_hash,
            "tokenId": farm.token_id,
            "status": credit.map(|c| c.status).unwrap_or_else(|| "unknown".to_string()),
            "explorerUrl": explorer_url
        }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn farm_with(status: &str, carbon_tons: f64) -> Farm {
        let now = Utc::now();
        Farm {
            id: Uuid::new_v4(),
            farmer_id: Uuid::new_v4(),
            lat: 30.9,
            lng: 75.85,
            region: Some("Punjab".to_string()),
            acres: 5.0,
            crop_type: "wheat".to_string(),
            farming_practice: "conventional".to_string(),
            boundary: None,
            satellite_image_january: None,
            satellite_image_june: None,
            ndvi_history: serde_json::Value::Array(vec![]),
            carbon_tons,
            earnings_estimate: 0.0,
            status: status.to_string(),
            certificate_id: None,
            blockchain_tx_hash: None,
            token_id: None,
            verified_at: None,
            claimed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn verified_farm_with_carbon_is_claimable() {
        assert!(check_claimable(&farm_with(farm_status::VERIFIED, 4.2)).is_ok());
    }

    #[test]
    fn claimed_farm_is_rejected() {
        let err = check_claimable(&farm_with(farm_status::CLAIMED, 4.2)).unwrap_err();
        assert!(matches!(err, ApiError::BusinessRule(ref m) if m.contains("already claimed")));
    }

    #[test]
    fn pending_farm_is_rejected() {
        let err = check_claimable(&farm_with(farm_status::PENDING, 4.2)).unwrap_err();
        assert!(matches!(err, ApiError::BusinessRule(ref m) if m.contains("not verified")));
    }

    #[test]
    fn zero_carbon_farm_is_rejected_before_any_collaborator_call() {
        let err = check_claimable(&farm_with(farm_status::VERIFIED, 0.0)).unwrap_err();
        assert!(matches!(err, ApiError::BusinessRule(ref m) if m.contains("No carbon credits")));
    }

    #[test]
    fn certificate_ids_have_the_expected_shape() {
        let id = certificate_id();
        let parts: Vec<&str> = id.splitn(3, '-').collect();
        assert_eq!(parts[0], "CC");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn consecutive_certificate_ids_differ() {
        assert_ne!(certificate_id(), certificate_id());
    }
}
