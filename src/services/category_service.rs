use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, Func};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    dto::categories::{CategoryList, CategoryWithCount, CreateCategoryRequest, UpdateCategoryRequest},
    entity::{
        categories::{ActiveModel, Column, Entity as Categories},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Category,
    response::{ApiResponse, Meta},
    services::validate,
    state::AppState,
};

const DUPLICATE_NAME: &str = "Category name already exists";

#[derive(FromRow)]
struct CategoryCountRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    product_count: i64,
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let rows = sqlx::query_as::<_, CategoryCountRow>(
        r#"
        SELECT c.id, c.name, c.description, c.created_at, COUNT(p.id) AS product_count
        FROM categories c
        LEFT JOIN products p ON p.category_id = c.id
        GROUP BY c.id
        ORDER BY c.name ASC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let items: Vec<CategoryWithCount> = rows
        .into_iter()
        .map(|row| CategoryWithCount {
            category: Category {
                id: row.id,
                name: row.name,
                description: row.description,
                created_at: row.created_at,
            },
            product_count: row.product_count,
        })
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::unpaged(total)),
    ))
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Category>> {
    let category = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::ok("Category", Category::from(category)))
}

/// Case-insensitive lookup of another category holding `name`.
async fn name_taken<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    except: Option<Uuid>,
) -> AppResult<bool> {
    let mut finder = Categories::find()
        .filter(Expr::expr(Func::lower(Expr::col(Column::Name))).eq(name.to_lowercase()));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    Ok(finder.one(conn).await?.is_some())
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let name = validate::required("name", &payload.name)?;

    if name_taken(&state.orm, &name, None).await? {
        return Err(AppError::Conflict(DUPLICATE_NAME.into()));
    }

    let category = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(validate::optional(payload.description)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, DUPLICATE_NAME))?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::ok("Category created", Category::from(category)))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        let name = validate::required("name", &name)?;
        if name_taken(&state.orm, &name, Some(id)).await? {
            return Err(AppError::Conflict(DUPLICATE_NAME.into()));
        }
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(validate::optional(Some(description)));
    }

    let category = active
        .update(&state.orm)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, DUPLICATE_NAME))?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "category_update",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::ok("Category updated", Category::from(category)))
}

pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    if Categories::find_by_id(id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let in_use = Products::find()
        .filter(ProdCol::CategoryId.eq(id))
        .count(&state.orm)
        .await?;
    if in_use > 0 {
        return Err(AppError::Conflict(format!(
            "Category still has {in_use} product(s)"
        )));
    }

    Categories::delete_by_id(id)
        .exec(&state.orm)
        .await
        .map_err(|e| AppError::conflict_on_foreign_key(e, "Category still has products"))?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "category_delete",
        "categories",
        serde_json::json!({ "category_id": id }),
    )
    .await;

    Ok(ApiResponse::ok("Category deleted", serde_json::json!({})))
}
