use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::{
        products::ProductList,
        seller::{SaleList, SalesSummary, UpdateShopRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Toko,
    response::ApiResponse,
    routes::params::{Pagination, SalesQuery},
    services::seller_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shop", get(get_shop).put(update_shop))
        .route("/products", get(my_products))
        .route("/sales", get(sales))
        .route("/sales/summary", get(sales_summary))
}

#[utoipa::path(
    get,
    path = "/api/seller/shop",
    responses(
        (status = 200, description = "Own shop", body = ApiResponse<Toko>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn get_shop(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Toko>>> {
    let resp = seller_service::get_shop(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/seller/shop",
    request_body = UpdateShopRequest,
    responses(
        (status = 200, description = "Shop updated", body = ApiResponse<Toko>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn update_shop(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateShopRequest>,
) -> AppResult<Json<ApiResponse<Toko>>> {
    let resp = seller_service::update_shop(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/seller/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Own products", body = ApiResponse<ProductList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn my_products(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = seller_service::my_products(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/seller/sales",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by order status")
    ),
    responses(
        (status = 200, description = "Sold order lines", body = ApiResponse<SaleList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn sales(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SalesQuery>,
) -> AppResult<Json<ApiResponse<SaleList>>> {
    let resp = seller_service::sales(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/seller/sales/summary",
    responses(
        (status = 200, description = "Orders, items sold and revenue", body = ApiResponse<SalesSummary>)
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn sales_summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SalesSummary>>> {
    let resp = seller_service::sales_summary(&state, &user).await?;
    Ok(Json(resp))
}
