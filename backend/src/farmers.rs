use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use serde_json::json;

use crate::db;
use crate::error::ApiError;
use crate::geometry;
use crate::models::{role, Farm, NewFarm, NewUser, User};
use crate::schema::{farms, users};
use crate::services::sentinel::DateRange;
use crate::services::SatelliteImages;
use crate::AppState;

const CROP_TYPES: &[&str] = &[
    "wheat", "rice", "sugarcane", "cotton", "maize", "pulses", "vegetables", "mixed",
];
const FARMING_PRACTICES: &[&str] = &["organic", "conventional", "natural"];
const DEFAULT_FARMING_PRACTICE: &str = "conventional";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterFarmerRequest {
    pub name: String,
    pub phone: String,
    pub lat: f64,
    pub lng: f64,
    pub acres: f64,
    pub crop_type: String,
    pub farming_practice: Option<String>,
}

fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10
        && phone.chars().all(|c| c.is_ascii_digit())
        && phone.starts_with(['6', '7', '8', '9'])
}

fn validate_registration(req: &RegisterFarmerRequest) -> Result<(), ApiError> {
    if req.name.trim().len() < 3 || req.name.trim().len() > 50 {
        return Err(ApiError::Validation(
            "name must be between 3 and 50 characters".to_string(),
        ));
    }
    if !is_valid_phone(&req.phone) {
        return Err(ApiError::Validation(
            "phone must be a valid 10-digit mobile number".to_string(),
        ));
    }
    if !(-90.0..=90.0).contains(&req.lat) || !(-180.0..=180.0).contains(&req.lng) {
        return Err(ApiError::Validation(
            "lat/lng outside valid coordinate range".to_string(),
        ));
    }
    if !(0.1..=1000.0).contains(&req.acres) {
        return Err(ApiError::Validation(
            "acres must be between 0.1 and 1000".to_string(),
        ));
    }
    if !CROP_TYPES.contains(&req.crop_type.to_lowercase().as_str()) {
        return Err(ApiError::Validation(format!(
            "cropType must be one of: {}",
            CROP_TYPES.join(", ")
        )));
    }
    if let Some(practice) = &req.farming_practice {
        if !FARMING_PRACTICES.contains(&practice.to_lowercase().as_str()) {
            return Err(ApiError::Validation(format!(
                "farmingPractice must be one of: {}",
                FARMING_PRACTICES.join(", ")
            )));
        }
    }
    Ok(())
}

/// POST /api/farmers/register
pub async fn register(
    State(_state): State<AppState>,
    Json(req): Json<RegisterFarmerRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    validate_registration(&req)?;

    let conn = &mut db::establish_connection()?;

    let existing: Option<User> = users::table
        .filter(users::phone.eq(&req.phone))
        .first(conn)
        .optional()?;
    if existing.is_some() {
        return Err(ApiError::BusinessRule(
            "Phone number already registered".to_string(),
        ));
    }

    let user = NewUser::new(req.name.trim(), &req.phone, role::FARMER);
    diesel::insert_into(users::table).values(&user).execute(conn)?;

    let practice = req
        .farming_practice
        .as_deref()
        .unwrap_or(DEFAULT_FARMING_PRACTICE)
        .to_lowercase();
    let farm = NewFarm::new(user.id, req.lat, req.lng, req.acres, &req.crop_type, &practice);
    diesel::insert_into(farms::table).values(&farm).execute(conn)?;

    log::info!("Registered farmer {} with farm {}", user.id, farm.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": {
                "farmerId": user.id,
                "farmId": farm.id,
                "farmerName": user.name
            },
            "message": "Registration successful!"
        })),
    ))
}

/// GET /api/farmers/:phone
pub async fn get_by_phone(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = &mut db::establish_connection()?;

    let user: User = users::table
        .filter(users::phone.eq(&phone))
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Farmer not found".to_string()))?;

    let farm_list: Vec<Farm> = farms::table
        .filter(farms::farmer_id.eq(user.id))
        .load(conn)?;

    let total_carbon: f64 = farm_list.iter().map(|f| f.carbon_tons).sum();
    let total_earnings = total_carbon * state.config.carbon_price_per_ton;

    Ok(Json(json!({
        "success": true,
        "data": {
            "farmer": {
                "id": user.id,
                "name": user.name,
                "phone": user.phone,
                "walletAddress": user.wallet_address
            },
            "farms": farm_list,
            "stats": {
                "totalFarms": farm_list.len(),
                "totalCarbon": format!("{:.2}", total_carbon),
                "totalEarnings": format!("{:.2}", total_earnings)
            }
        }
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SatelliteRegistrationRequest {
    pub name: String,
    pub phone: String,
    pub state: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,
    pub crop_type: String,
    pub farm_boundary: Option<serde_json::Value>,
    pub date_range: Option<DateRange>,
}

/// POST /api/farmers/register-with-satellite
///
/// Map-drawn registration: acreage and coordinates are derived from the
/// boundary polygon, imagery is requested from Sentinel Hub when configured.
pub async fn register_with_satellite(
    State(state): State<AppState>,
    Json(req): Json<SatelliteRegistrationRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if !is_valid_phone(&req.phone) {
        return Err(ApiError::Validation(
            "phone must be a valid 10-digit mobile number".to_string(),
        ));
    }
    if !CROP_TYPES.contains(&req.crop_type.to_lowercase().as_str()) {
        return Err(ApiError::Validation(format!(
            "cropType must be one of: {}",
            CROP_TYPES.join(", ")
        )));
    }
    let boundary = req
        .farm_boundary
        .as_ref()
        .ok_or_else(|| ApiError::Validation("farmBoundary is required".to_string()))?;
    let (lat, lng) = geometry::boundary_centroid(boundary)
        .ok_or_else(|| ApiError::Validation("farmBoundary has no usable coordinates".to_string()))?;

    let conn = &mut db::establish_connection()?;

    let user: User = match users::table
        .filter(users::phone.eq(&req.phone))
        .first(conn)
        .optional()?
    {
        Some(user) => user,
        None => {
            let new_user = NewUser::new(req.name.trim(), &req.phone, role::FARMER)
                .with_address(req.state.clone(), req.district.clone(), req.village.clone());
            diesel::insert_into(users::table)
                .values(&new_user)
                .get_result(conn)?
        }
    };

    let acres = geometry::acres_from_boundary(boundary);
    log::info!("Calculated area from boundary: {} acres", acres);

    let mut satellite_images = SatelliteImages::default();
    if let Some(sentinel) = &state.sentinel {
        if let Some(range) = &req.date_range {
            match sentinel.fetch_images(boundary, range).await {
                Ok(images) => satellite_images = images,
                // Imagery is best-effort at registration time
                Err(e) => log::error!("Satellite image fetch failed: {}", e),
            }
        }
    }

    let mut farm = NewFarm::new(user.id, lat, lng, acres, &req.crop_type, DEFAULT_FARMING_PRACTICE);
    farm.boundary = Some(boundary.clone());
    farm.satellite_image_january = satellite_images.january;
    farm.satellite_image_june = satellite_images.june;
    diesel::insert_into(farms::table).values(&farm).execute(conn)?;

    log::info!("Farm created from boundary: {}", farm.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": {
                "farmer": user,
                "farm": farm
            },
            "message": "Registration successful"
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> RegisterFarmerRequest {
        RegisterFarmerRequest {
            name: "Ravi Kumar".to_string(),
            phone: "9876543210".to_string(),
            lat: 30.9,
            lng: 75.85,
            acres: 5.0,
            crop_type: "wheat".to_string(),
            farming_practice: Some("organic".to_string()),
        }
    }

    #[test]
    fn accepts_a_valid_registration() {
        assert!(validate_registration(&valid_request()).is_ok());
    }

    #[test]
    fn rejects_short_names_and_bad_phones() {
        let mut req = valid_request();
        req.name = "Ra".to_string();
        assert!(validate_registration(&req).is_err());

        let mut req = valid_request();
        req.phone = "1234567890".to_string(); // must start with 6-9
        assert!(validate_registration(&req).is_err());

        let mut req = valid_request();
        req.phone = "98765".to_string();
        assert!(validate_registration(&req).is_err());
    }

    #[test]
    fn rejects_out_of_range_coordinates_and_acreage() {
        let mut req = valid_request();
        req.lat = 91.0;
        assert!(validate_registration(&req).is_err());

        let mut req = valid_request();
        req.acres = 0.0;
        assert!(validate_registration(&req).is_err());

        let mut req = valid_request();
        req.acres = 1001.0;
        assert!(validate_registration(&req).is_err());
    }

    #[test]
    fn rejects_unknown_crops_and_practices() {
        let mut req = valid_request();
        req.crop_type = "bananas".to_string();
        assert!(validate_registration(&req).is_err());

        let mut req = valid_request();
        req.farming_practice = Some("hydroponic".to_string());
        assert!(validate_registration(&req).is_err());
    }
}
