use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::{
    audit,
    dto::{
        products::ProductList,
        seller::{SaleList, SaleRow, SalesSummary, UpdateShopRequest},
    },
    entity::{
        products::{Column as ProdCol, Entity as Products},
        tokos::{ActiveModel as TokoActive, Column as TokoCol, Entity as Tokos},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_seller},
    models::{OrderStatus, Product, Toko},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, SalesQuery},
    services::validate,
    state::AppState,
};

pub async fn get_shop(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Toko>> {
    ensure_seller(user)?;
    let toko = Tokos::find()
        .filter(TokoCol::SellerId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::ok("Shop", Toko::from(toko)))
}

pub async fn update_shop(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateShopRequest,
) -> AppResult<ApiResponse<Toko>> {
    ensure_seller(user)?;
    let toko = Tokos::find()
        .filter(TokoCol::SellerId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: TokoActive = toko.into();
    if let Some(name) = payload.name {
        active.name = Set(validate::required("name", &name)?);
    }
    if let Some(description) = payload.description {
        active.description = Set(validate::optional(Some(description)));
    }
    if let Some(address) = payload.address {
        active.address = Set(validate::optional(Some(address)));
    }
    active.updated_at = Set(Utc::now().into());
    let toko = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "shop_update",
        "tokos",
        serde_json::json!({ "toko_id": toko.id }),
    )
    .await;

    Ok(ApiResponse::ok("Shop updated", Toko::from(toko)))
}

pub async fn my_products(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_seller(user)?;
    let (page, limit, offset) = pagination.normalize();
    let finder = Products::find()
        .filter(ProdCol::SellerId.eq(user.user_id))
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn sales(
    state: &AppState,
    user: &AuthUser,
    query: SalesQuery,
) -> AppResult<ApiResponse<SaleList>> {
    ensure_seller(user)?;
    let (page, limit, offset) = query.pagination().normalize();
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<OrderStatus>)
        .transpose()?
        .map(|s| s.as_str());

    let items = sqlx::query_as::<_, SaleRow>(
        r#"
        SELECT oi.id AS order_item_id, o.id AS order_id, o.invoice_number,
               o.status AS order_status, u.name AS buyer_name,
               oi.product_id, oi.product_name, oi.quantity, oi.price,
               oi.price * oi.quantity AS subtotal, o.created_at AS ordered_at
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        JOIN users u ON u.id = o.user_id
        WHERE oi.seller_id = $1 AND ($2::text IS NULL OR o.status = $2)
        ORDER BY o.created_at DESC, oi.id
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user.user_id)
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        WHERE oi.seller_id = $1 AND ($2::text IS NULL OR o.status = $2)
        "#,
    )
    .bind(user.user_id)
    .bind(status)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Sales",
        SaleList { items },
        Some(Meta::new(page, limit, total.0)),
    ))
}

pub async fn sales_summary(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SalesSummary>> {
    ensure_seller(user)?;
    let summary = sqlx::query_as::<_, SalesSummary>(
        r#"
        SELECT COUNT(DISTINCT oi.order_id) AS order_count,
               COALESCE(SUM(oi.quantity), 0)::int8 AS items_sold,
               COALESCE(SUM(oi.price * oi.quantity), 0)::int8 AS revenue
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        WHERE oi.seller_id = $1 AND o.status <> 'cancelled'
        "#,
    )
    .bind(user.user_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::ok("Sales summary", summary))
}
