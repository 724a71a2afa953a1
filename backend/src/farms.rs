use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::db;
use crate::error::ApiError;
use crate::models::{farm_status, Farm, NdviSample, User};
use crate::schema::{farms, users};
use crate::services::ml::CarbonRequest;
use crate::AppState;

/// GET /api/farms/:farm_id
pub async fn get_farm(
    State(_state): State<AppState>,
    Path(farm_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = &mut db::establish_connection()?;

    let (farm, farmer): (Farm, User) = farms::table
        .inner_join(users::table)
        .filter(farms::id.eq(farm_id))
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Farm not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "farmId": farm.id,
            "farmerName": farmer.name,
            "location": { "lat": farm.lat, "lng": farm.lng },
            "region": farm.region,
            "acres": farm.acres,
            "cropType": farm.crop_type,
            "farmingPractice": farm.farming_practice,
            "carbonTons": farm.carbon_tons,
            "ndviHistory": farm.ndvi_history,
            "satelliteImages": {
                "january": farm.satellite_image_january,
                "june": farm.satellite_image_june
            },
            "status": farm.status,
            "certificateId": farm.certificate_id,
            "blockchainTxHash": farm.blockchain_tx_hash,
            "tokenId": farm.token_id,
            "createdAt": farm.created_at
        }
    })))
}

/// POST /api/farms/:farm_id/calculate
///
/// Passthrough to the ML collaborator: the estimate is persisted verbatim
/// and the farm moves to `verified`.
pub async fn calculate_carbon(
    State(state): State<AppState>,
    Path(farm_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = &mut db::establish_connection()?;

    let farm: Farm = farms::table
        .find(farm_id)
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Farm not found".to_string()))?;

    let request = CarbonRequest {
        farm_id: farm.id.to_string(),
        latitude: farm.lat,
        longitude: farm.lng,
        acres: farm.acres,
        crop_type: farm.crop_type.clone(),
    };
    let data = state
        .ml
        .calculate_carbon(&request)
        .await
        .map_err(|e| ApiError::integration("Carbon calculation failed", e))?;

    let now = Utc::now();
    let history = json!([
        NdviSample { month: "January".to_string(), ndvi: data.ndvi.baseline, date: now },
        NdviSample { month: "June".to_string(), ndvi: data.ndvi.current, date: now },
    ]);

    diesel::update(farms::table.find(farm.id))
        .set((
            farms::carbon_tons.eq(data.carbon_tons),
            farms::region.eq(Some(data.region.clone())),
            farms::satellite_image_january.eq(data.satellite_images.january.clone()),
            farms::satellite_image_june.eq(data.satellite_images.june.clone()),
            farms::ndvi_history.eq(history),
            farms::earnings_estimate.eq(data.earnings_estimate),
            farms::status.eq(farm_status::VERIFIED),
            farms::verified_at.eq(Some(now)),
            farms::updated_at.eq(now),
        ))
        .execute(conn)?;

    log::info!(
        "Farm {} verified: {} tons of carbon ({} confidence)",
        farm.id,
        data.carbon_tons,
        data.confidence
    );

    Ok(Json(json!({
        "success": true,
        "data": {
            "farmId": farm.id,
            "carbonTons": data.carbon_tons,
            "earningsEstimate": data.earnings_estimate,
            "ndviBaseline": data.ndvi.baseline,
            "ndviCurrent": data.ndvi.current,
            "confidence": data.confidence,
            "status": farm_status::VERIFIED
        },
        "message": "Carbon calculation completed!"
    })))
}
