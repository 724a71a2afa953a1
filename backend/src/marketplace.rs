use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use diesel::dsl::sum;
use diesel::prelude::*;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::db;
use crate::error::ApiError;
use crate::models::{credit_status, payment_status, role, CarbonCredit, Farm, NewTransaction, NewUser, User};
use crate::schema::{carbon_credits, farms, transactions, users};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingsQuery {
    pub status: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub region: Option<String>,
}

/// GET /api/marketplace/listings
pub async fn get_listings(
    State(_state): State<AppState>,
    Query(params): Query<ListingsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = &mut db::establish_connection()?;

    let status = params
        .status
        .clone()
        .unwrap_or_else(|| credit_status::AVAILABLE.to_string());

    let mut query = carbon_credits::table
        .inner_join(farms::table)
        .inner_join(users::table)
        .filter(carbon_credits::status.eq(status))
        .into_boxed();
    if let Some(min_price) = params.min_price {
        query = query.filter(carbon_credits::price_per_ton.ge(min_price));
    }
    if let Some(max_price) = params.max_price {
        query = query.filter(carbon_credits::price_per_ton.le(max_price));
    }

    let rows: Vec<(CarbonCredit, Farm, User)> = query
        .order(carbon_credits::listed_at.desc())
        .load(conn)?;

    let listings: Vec<serde_json::Value> = rows
        .iter()
        .filter(|(_, farm, _)| match params.region.as_deref() {
            Some(region) => farm.region.as_deref() == Some(region),
            None => true,
        })
        .map(|(credit, farm, farmer)| {
            json!({
                "id": credit.id,
                "farmLocation": farm.region.clone().unwrap_or_else(|| "India".to_string()),
                "carbonTons": credit.tons,
                "pricePerTon": credit.price_per_ton,
                "totalValue": credit.total_value,
                "farmerName": farmer.name,
                "cropType": farm.crop_type,
                "isVerified": true,
                "tokenId": credit.token_id,
                "satelliteImages": {
                    "january": farm.satellite_image_january,
                    "june": farm.satellite_image_june
                },
                "listedAt": credit.listed_at
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "count": listings.len(),
        "data": listings
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyRequest {
    pub credit_id: Uuid,
    pub buyer_name: String,
    pub buyer_phone: String,
}

fn ensure_available(credit: &CarbonCredit) -> Result<(), ApiError> {
    if credit.status != credit_status::AVAILABLE {
        return Err(ApiError::BusinessRule("Credit already sold".to_string()));
    }
    Ok(())
}

/// POST /api/marketplace/buy
///
/// The sale is serialized by the guarded `available -> sold` update; losing
/// a race marks the transaction `failed` instead of selling twice.
pub async fn buy_credits(
    State(state): State<AppState>,
    Json(req): Json<BuyRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = &mut db::establish_connection()?;

    let credit: CarbonCredit = carbon_credits::table
        .find(req.credit_id)
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Credit not found".to_string()))?;

    ensure_available(&credit)?;

    let buyer: User = match users::table
        .filter(users::phone.eq(&req.buyer_phone))
        .first(conn)
        .optional()?
    {
        Some(user) => user,
        None => {
            let new_buyer = NewUser::new(req.buyer_name.trim(), &req.buyer_phone, role::BUYER);
            diesel::insert_into(users::table)
                .values(&new_buyer)
                .get_result(conn)?
        }
    };

    let record = NewTransaction::new(
        credit.id,
        credit.farmer_id,
        buyer.id,
        credit.total_value,
        state.config.platform_commission,
    );
    diesel::insert_into(transactions::table)
        .values(&record)
        .execute(conn)?;

    let now = Utc::now();
    let updated = diesel::update(
        carbon_credits::table
            .filter(carbon_credits::id.eq(credit.id))
            .filter(carbon_credits::status.eq(credit_status::AVAILABLE)),
    )
    .set((
        carbon_credits::status.eq(credit_status::SOLD),
        carbon_credits::buyer_id.eq(Some(buyer.id)),
        carbon_credits::sold_at.eq(Some(now)),
    ))
    .execute(conn)?;
    if updated == 0 {
        diesel::update(transactions::table.find(record.id))
            .set(transactions::payment_status.eq(payment_status::FAILED))
            .execute(conn)?;
        return Err(ApiError::BusinessRule("Credit already sold".to_string()));
    }

    // No payment gateway is wired in; completion is immediate.
    diesel::update(transactions::table.find(record.id))
        .set((
            transactions::payment_status.eq(payment_status::COMPLETED),
            transactions::completed_at.eq(Some(now)),
        ))
        .execute(conn)?;

    log::info!(
        "Credit {} sold to {} for {}",
        credit.id,
        buyer.id,
        credit.total_value
    );

    Ok(Json(json!({
        "success": true,
        "data": {
            "transactionId": record.id,
            "creditId": credit.id,
            "carbonTons": credit.tons,
            "amountPaid": credit.total_value,
            "sellerReceives": record.seller_receives,
            "platformFee": record.platform_fee,
            "paymentStatus": payment_status::COMPLETED
        },
        "message": "Purchase successful!"
    })))
}

/// GET /api/marketplace/stats
pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = &mut db::establish_connection()?;

    let total_credits: i64 = carbon_credits::table.count().get_result(conn)?;
    let available_credits: i64 = carbon_credits::table
        .filter(carbon_credits::status.eq(credit_status::AVAILABLE))
        .count()
        .get_result(conn)?;
    let sold_credits: i64 = carbon_credits::table
        .filter(carbon_credits::status.eq(credit_status::SOLD))
        .count()
        .get_result(conn)?;

    let total_carbon: Option<f64> = carbon_credits::table
        .select(sum(carbon_credits::tons))
        .first(conn)?;
    let total_value: Option<f64> = transactions::table
        .filter(transactions::payment_status.eq(payment_status::COMPLETED))
        .select(sum(transactions::amount))
        .first(conn)?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "totalCredits": total_credits,
            "availableCredits": available_credits,
            "soldCredits": sold_credits,
            "totalCarbonTons": total_carbon.unwrap_or(0.0),
            "totalTransactionValue": total_value.unwrap_or(0.0),
            "averagePrice": state.config.carbon_price_per_ton
        }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewCarbonCredit;

    fn credit_with(status: &str) -> CarbonCredit {
        let new = NewCarbonCredit::new(Uuid::new_v4(), Uuid::new_v4(), 10.0, 1500.0, None, None, None);
        CarbonCredit {
            id: new.id,
            farm_id: new.farm_id,
            farmer_id: new.farmer_id,
            tons: new.tons,
            price_per_ton: new.price_per_ton,
            total_value: new.total_value,
            status: status.to_string(),
            buyer_id: None,
            token_id: None,
            blockchain_tx_hash: None,
            ipfs_hash: None,
            listed_at: new.listed_at,
            sold_at: None,
            retired_at: None,
        }
    }

    #[test]
    fn available_credit_passes_the_sale_check() {
        assert!(ensure_available(&credit_with(credit_status::AVAILABLE)).is_ok());
    }

    #[test]
    fn sold_credit_cannot_be_purchased_again() {
        let err = ensure_available(&credit_with(credit_status::SOLD)).unwrap_err();
        assert!(matches!(err, ApiError::BusinessRule(ref m) if m == "Credit already sold"));
    }

    #[test]
    fn retired_credit_cannot_be_purchased() {
        assert!(ensure_available(&credit_with(credit_status::RETIRED)).is_err());
    }
}
