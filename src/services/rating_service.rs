use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, Func};
use uuid::Uuid;

use crate::{
    audit,
    dto::ratings::{CreateRatingRequest, RatingList},
    entity::{
        products::Entity as Products,
        ratings::{ActiveModel, Column, Entity as Ratings},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Rating,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::validate,
    state::AppState,
};

const ALREADY_RATED: &str = "This email has already rated the product";

pub async fn list_ratings(
    state: &AppState,
    product_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<RatingList>> {
    if Products::find_by_id(product_id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let (page, limit, offset) = pagination.normalize();
    let finder = Ratings::find()
        .filter(Column::ProductId.eq(product_id))
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Rating::from)
        .collect();

    Ok(ApiResponse::success(
        "Ratings",
        RatingList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Guests may rate too; a signed-in caller is linked through `user_id`.
pub async fn create_rating(
    state: &AppState,
    user: Option<&AuthUser>,
    product_id: Uuid,
    payload: CreateRatingRequest,
) -> AppResult<ApiResponse<Rating>> {
    let name = validate::required("name", &payload.name)?;
    let email = validate::email(&payload.email)?;
    let score = validate::score(payload.score)?;

    if Products::find_by_id(product_id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let exist = Ratings::find()
        .filter(Column::ProductId.eq(product_id))
        .filter(Expr::expr(Func::lower(Expr::col(Column::Email))).eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict(ALREADY_RATED.into()));
    }

    let rating = ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        user_id: Set(user.map(|u| u.user_id)),
        name: Set(name),
        email: Set(email),
        score: Set(score),
        comment: Set(validate::optional(payload.comment)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, ALREADY_RATED))?;

    audit::record(
        &state.orm,
        user.map(|u| u.user_id),
        "rating_create",
        "ratings",
        serde_json::json!({ "product_id": product_id, "rating_id": rating.id, "score": score }),
    )
    .await;

    Ok(ApiResponse::ok("Rating saved", Rating::from(rating)))
}
