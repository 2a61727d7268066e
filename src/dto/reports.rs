use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema, FromRow, Default, PartialEq)]
pub struct SalesTotals {
    pub order_count: i64,
    pub items_sold: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct DailySales {
    pub day: NaiveDate,
    pub order_count: i64,
    pub items_sold: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct TopProduct {
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub items_sold: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub totals: SalesTotals,
    pub daily: Vec<DailySales>,
    pub top_products: Vec<TopProduct>,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct SellerReportRow {
    pub seller_id: Uuid,
    pub seller_name: String,
    pub email: String,
    pub shop_name: Option<String>,
    pub status_akun: String,
    pub status_verifikasi: String,
    pub product_count: i64,
    pub items_sold: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct SellerReport {
    #[schema(value_type = Vec<SellerReportRow>)]
    pub items: Vec<SellerReportRow>,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct ProductReportRow {
    pub product_id: Uuid,
    pub product_name: String,
    pub shop_name: Option<String>,
    pub category_name: String,
    pub price: i64,
    pub stock: i32,
    pub items_sold: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductReport {
    #[schema(value_type = Vec<ProductReportRow>)]
    pub items: Vec<ProductReportRow>,
}
