use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{
        AddImageRequest, CreateProductRequest, ProductDetail, ProductList, ShopSummary,
        UpdateProductRequest,
    },
    entity::{
        categories::Entity as Categories,
        product_images::{
            ActiveModel as ImageActive, Column as ImageCol, Entity as ProductImages,
        },
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
        tokos::{Column as TokoCol, Entity as Tokos},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_verified_seller},
    models::{Product, ProductImage, Role},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::validate,
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        let like = || LikeExpr::new(pattern.clone()).escape('\\');
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(like()))
                .add(Expr::col(Column::Description).ilike(like())),
        );
    }

    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    if let Some(seller_id) = query.seller_id {
        condition = condition.add(Column::SellerId.eq(seller_id));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    if query.in_stock == Some(true) {
        condition = condition.add(Column::Stock.gt(0));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

/// `%search%` with LIKE metacharacters in `search` matched literally.
fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let images = ProductImages::find()
        .filter(ImageCol::ProductId.eq(product.id))
        .order_by_asc(ImageCol::SortOrder)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ProductImage::from)
        .collect();

    let category_name = Categories::find_by_id(product.category_id)
        .one(&state.orm)
        .await?
        .map(|c| c.name);

    let shop = Tokos::find()
        .filter(TokoCol::SellerId.eq(product.seller_id))
        .one(&state.orm)
        .await?
        .map(|t| ShopSummary {
            id: t.id,
            name: t.name,
            seller_id: t.seller_id,
        });

    let (average_score, rating_count): (Option<f64>, i64) = sqlx::query_as(
        "SELECT AVG(score)::float8, COUNT(*) FROM ratings WHERE product_id = $1",
    )
    .bind(product.id)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Product",
        ProductDetail {
            product: Product::from(product),
            images,
            category_name,
            shop,
            average_score,
            rating_count,
        },
        None,
    ))
}

async fn ensure_category<C: ConnectionTrait>(conn: &C, category_id: Uuid) -> AppResult<()> {
    if Categories::find_by_id(category_id).one(conn).await?.is_none() {
        return Err(AppError::BadRequest("category not found".into()));
    }
    Ok(())
}

/// Load a product the caller owns; other sellers get 403.
async fn find_owned<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ProductModel> {
    let product = Products::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;
    if product.seller_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    Ok(product)
}

async fn next_sort_order<C: ConnectionTrait>(conn: &C, product_id: Uuid) -> AppResult<i32> {
    let last = ProductImages::find()
        .filter(ImageCol::ProductId.eq(product_id))
        .order_by_desc(ImageCol::SortOrder)
        .one(conn)
        .await?;
    Ok(last.map(|img| img.sort_order + 1).unwrap_or(0))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductDetail>> {
    ensure_verified_seller(user)?;
    let name = validate::required("name", &payload.name)?;
    let price = validate::price(payload.price)?;
    let stock = validate::stock(payload.stock)?;
    let urls = payload
        .image_urls
        .iter()
        .map(|u| validate::image_url(u))
        .collect::<AppResult<Vec<_>>>()?;

    let txn = state.orm.begin().await?;
    ensure_category(&txn, payload.category_id).await?;

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        seller_id: Set(user.user_id),
        category_id: Set(payload.category_id),
        name: Set(name),
        description: Set(validate::optional(payload.description)),
        price: Set(price),
        stock: Set(stock),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for (position, url) in urls.into_iter().enumerate() {
        ImageActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            url: Set(url),
            sort_order: Set(position as i32),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    let mut detail = get_product(state, product.id).await?;
    detail.message = "Product created".into();
    Ok(detail)
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_verified_seller(user)?;
    let existing = find_owned(&state.orm, user, id).await?;

    let mut active: ActiveModel = existing.into();
    if let Some(category_id) = payload.category_id {
        ensure_category(&state.orm, category_id).await?;
        active.category_id = Set(category_id);
    }
    if let Some(name) = payload.name {
        active.name = Set(validate::required("name", &name)?);
    }
    if let Some(description) = payload.description {
        active.description = Set(validate::optional(Some(description)));
    }
    if let Some(price) = payload.price {
        active.price = Set(validate::price(price)?);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(validate::stock(stock)?);
    }
    active.updated_at = Set(chrono::Utc::now().into());

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::ok("Updated", Product::from(product)))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let is_owner = user.role == Role::Seller && product.seller_id == user.user_id;
    if !is_owner && user.role != Role::Admin {
        return Err(AppError::Forbidden);
    }

    Products::delete_by_id(id).exec(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id, "by": user.role.as_str() }),
    )
    .await;

    Ok(ApiResponse::ok("Deleted", serde_json::json!({})))
}

pub async fn add_image(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: AddImageRequest,
) -> AppResult<ApiResponse<ProductImage>> {
    ensure_verified_seller(user)?;
    let url = validate::image_url(&payload.url)?;
    let product = find_owned(&state.orm, user, product_id).await?;

    let image = ImageActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        url: Set(url),
        sort_order: Set(next_sort_order(&state.orm, product.id).await?),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::ok("Image added", ProductImage::from(image)))
}

pub async fn delete_image(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    image_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_verified_seller(user)?;
    find_owned(&state.orm, user, product_id).await?;

    let result = ProductImages::delete_many()
        .filter(ImageCol::Id.eq(image_id))
        .filter(ImageCol::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::ok("Image removed", serde_json::json!({})))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("buku"), "%buku%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern("c:\\x"), "%c:\\\\x%");
    }
}
