use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateShopRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
}

/// One sold line, seen from the seller's side.
#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct SaleRow {
    pub order_item_id: Uuid,
    pub order_id: Uuid,
    pub invoice_number: String,
    pub order_status: String,
    pub buyer_name: String,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub price: i64,
    pub subtotal: i64,
    pub ordered_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct SaleList {
    #[schema(value_type = Vec<SaleRow>)]
    pub items: Vec<SaleRow>,
}

#[derive(Debug, Serialize, ToSchema, FromRow, PartialEq)]
pub struct SalesSummary {
    pub order_count: i64,
    pub items_sold: i64,
    pub revenue: i64,
}
