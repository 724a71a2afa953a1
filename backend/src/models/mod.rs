use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod farm_status {
    pub const PENDING: &str = "pending";
    pub const VERIFIED: &str = "verified";
    pub const CLAIMED: &str = "claimed";
}

pub mod credit_status {
    pub const AVAILABLE: &str = "available";
    pub const SOLD: &str = "sold";
    pub const RETIRED: &str = "retired";
}

pub mod payment_status {
    pub const PENDING: &str = "pending";
    pub const COMPLETED: &str = "completed";
    pub const FAILED: &str = "failed";
}

pub mod role {
    pub const FARMER: &str = "farmer";
    pub const BUYER: &str = "buyer";
}

#[derive(Debug, Serialize, Deserialize, Queryable, Clone)]
#[diesel(table_name = crate::schema::users)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub state: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,
    pub role: String,
    pub wallet_address: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Insertable, Clone)]
#[diesel(table_name = crate::schema::users)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub state: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,
    pub role: String,
    pub wallet_address: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewUser {
    pub fn new(name: &str, phone: &str, role: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            phone: phone.to_string(),
            state: None,
            district: None,
            village: None,
            role: role.to_string(),
            wallet_address: None,
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_address(
        mut self,
        state: Option<String>,
        district: Option<String>,
        village: Option<String>,
    ) -> Self {
        self.state = state;
        self.district = district;
        self.village = village;
        self
    }
}

/// One NDVI reading persisted in the farm's `ndvi_history` JSONB column.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NdviSample {
    pub month: String,
    pub ndvi: f64,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Queryable, Clone)]
#[diesel(table_name = crate::schema::farms)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    pub id: Uuid,
    pub farmer_id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub region: Option<String>,
    pub acres: f64,
    pub crop_type: String,
    pub farming_practice: String,
    pub boundary: Option<serde_json::Value>,
    pub satellite_image_january: Option<String>,
    pub satellite_image_june: Option<String>,
    pub ndvi_history: serde_json::Value,
    pub carbon_tons: f64,
    pub earnings_estimate: f64,
    pub status: String,
    pub certificate_id: Option<String>,
    pub blockchain_tx_hash: Option<String>,
    pub token_id: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Insertable, Clone)]
#[diesel(table_name = crate::schema::farms)]
#[serde(rename_all = "camelCase")]
pub struct NewFarm {
    pub id: Uuid,
    pub farmer_id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub acres: f64,
    pub crop_type: String,
    pub farming_practice: String,
    pub boundary: Option<serde_json::Value>,
    pub satellite_image_january: Option<String>,
    pub satellite_image_june: Option<String>,
    pub ndvi_history: serde_json::Value,
    pub carbon_tons: f64,
    pub earnings_estimate: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewFarm {
    pub fn new(farmer_id: Uuid, lat: f64, lng: f64, acres: f64, crop_type: &str, farming_practice: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            farmer_id,
            lat,
            lng,
            acres,
            crop_type: crop_type.to_lowercase(),
            farming_practice: farming_practice.to_string(),
            boundary: None,
            satellite_image_january: None,
            satellite_image_june: None,
            ndvi_history: serde_json::Value::Array(vec![]),
            carbon_tons: 0.0,
            earnings_estimate: 0.0,
            status: farm_status::PENDING.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Queryable, Clone)]
#[diesel(table_name = crate::schema::carbon_credits)]
#[serde(rename_all = "camelCase")]
pub struct CarbonCredit {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub farmer_id: Uuid,
    pub tons: f64,
    pub price_per_ton: f64,
    pub total_value: f64,
    pub status: String,
    pub buyer_id: Option<Uuid>,
    pub token_id: Option<String>,
    pub blockchain_tx_hash: Option<String>,
    pub ipfs_hash: Option<String>,
    pub listed_at: DateTime<Utc>,
    pub sold_at: Option<DateTime<Utc>>,
    pub retired_at: Option<DateTime<Utc>>,
}

impl CarbonCredit {
    // total_value must track tons * price_per_ton through any mutation.
    pub fn set_tons(&mut self, tons: f64) {
        self.tons = tons;
        self.total_value = self.tons * self.price_per_ton;
    }

    pub fn set_price_per_ton(&mut self, price_per_ton: f64) {
        self.price_per_ton = price_per_ton;
        self.total_value = self.tons * self.price_per_ton;
    }
}

#[derive(Debug, Serialize, Deserialize, Insertable, Clone)]
#[diesel(table_name = crate::schema::carbon_credits)]
#[serde(rename_all = "camelCase")]
pub struct NewCarbonCredit {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub farmer_id: Uuid,
    pub tons: f64,
    pub price_per_ton: f64,
    pub total_value: f64,
    pub status: String,
    pub token_id: Option<String>,
    pub blockchain_tx_hash: Option<String>,
    pub ipfs_hash: Option<String>,
    pub listed_at: DateTime<Utc>,
}

impl NewCarbonCredit {
    pub fn new(
        farm_id: Uuid,
        farmer_id: Uuid,
        tons: f64,
        price_per_ton: f64,
        token_id: Option<String>,
        blockchain_tx_hash: Option<String>,
        ipfs_hash: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            farm_id,
            farmer_id,
            tons,
            price_per_ton,
            total_value: tons * price_per_ton,
            status: credit_status::AVAILABLE.to_string(),
            token_id,
            blockchain_tx_hash,
            ipfs_hash,
            listed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Queryable, Clone)]
#[diesel(table_name = crate::schema::transactions)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub credit_id: Uuid,
    pub seller_id: Uuid,
    pub buyer_id: Uuid,
    pub amount: f64,
    pub platform_fee: f64,
    pub seller_receives: f64,
    pub payment_status: String,
    pub blockchain_tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Insertable, Clone)]
#[diesel(table_name = crate::schema::transactions)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub id: Uuid,
    pub credit_id: Uuid,
    pub seller_id: Uuid,
    pub buyer_id: Uuid,
    pub amount: f64,
    pub platform_fee: f64,
    pub seller_receives: f64,
    pub payment_status: String,
    pub blockchain_tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl NewTransaction {
    /// Splits `amount` into the platform's cut and the seller's payout.
    /// `platform_fee + seller_receives` must add back up to `amount`.
    pub fn new(credit_id: Uuid, seller_id: Uuid, buyer_id: Uuid, amount: f64, commission_rate: f64) -> Self {
        let platform_fee = amount * commission_rate;
        let seller_receives = amount - platform_fee;
        Self {
            id: Uuid::new_v4(),
            credit_id,
            seller_id,
            buyer_id,
            amount,
            platform_fee,
            seller_receives,
            payment_status: payment_status::PENDING.to_string(),
            blockchain_tx_hash: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_total_value_is_tons_times_price() {
        let credit = NewCarbonCredit::new(Uuid::new_v4(), Uuid::new_v4(), 4.2, 3200.0, None, None, None);
        assert_eq!(credit.total_value, 13440.0);
        assert_eq!(credit.status, credit_status::AVAILABLE);
    }

    #[test]
    fn credit_total_value_tracks_mutations() {
        let new = NewCarbonCredit::new(Uuid::new_v4(), Uuid::new_v4(), 10.0, 1500.0, None, None, None);
        let mut credit = CarbonCredit {
            id: new.id,
            farm_id: new.farm_id,
            farmer_id: new.farmer_id,
            tons: new.tons,
            price_per_ton: new.price_per_ton,
            total_value: new.total_value,
            status: new.status,
            buyer_id: None,
            token_id: None,
            blockchain_tx_hash: None,
            ipfs_hash: None,
            listed_at: new.listed_at,
            sold_at: None,
            retired_at: None,
        };
        assert_eq!(credit.total_value, 15000.0);

        credit.set_tons(7.5);
        assert_eq!(credit.total_value, 7.5 * 1500.0);

        credit.set_price_per_ton(2000.0);
        assert_eq!(credit.total_value, 7.5 * 2000.0);
    }

    #[test]
    fn transaction_split_adds_back_up() {
        let tx = NewTransaction::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), 15000.0, 0.10);
        assert_eq!(tx.platform_fee, 1500.0);
        assert_eq!(tx.seller_receives, 13500.0);
        assert_eq!(tx.platform_fee + tx.seller_receives, tx.amount);
        assert_eq!(tx.payment_status, payment_status::PENDING);
    }

    #[test]
    fn transaction_split_holds_across_commission_rates() {
        for rate in [0.0, 0.05, 0.10, 0.25, 0.333, 0.5, 1.0] {
            let amount = 13440.0;
            let tx = NewTransaction::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), amount, rate);
            let drift = (tx.platform_fee + tx.seller_receives - amount).abs();
            assert!(drift <= f64::EPSILON * amount, "rate {} drifted by {}", rate, drift);
            assert!(tx.platform_fee >= 0.0 && tx.seller_receives >= 0.0);
        }
    }
}
