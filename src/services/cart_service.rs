use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{AddToCartRequest, CartItemDto, CartList, UpdateCartRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_buyer},
    models::{CartItem, Product},
    response::{ApiResponse, Meta},
    services::validate,
    state::AppState,
};

#[derive(FromRow)]
struct CartWithProductRow {
    cart_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    seller_id: Uuid,
    category_id: Uuid,
    name: String,
    description: Option<String>,
    price: i64,
    stock: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    ensure_buyer(user)?;
    let rows = sqlx::query_as::<_, CartWithProductRow>(
        r#"
        SELECT ci.id AS cart_id, ci.quantity,
               p.id AS product_id, p.seller_id, p.category_id, p.name, p.description,
               p.price, p.stock, p.created_at, p.updated_at
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let items: Vec<CartItemDto> = rows
        .into_iter()
        .map(|row| CartItemDto {
            id: row.cart_id,
            subtotal: row.price * i64::from(row.quantity),
            quantity: row.quantity,
            product: Product {
                id: row.product_id,
                seller_id: row.seller_id,
                category_id: row.category_id,
                name: row.name,
                description: row.description,
                price: row.price,
                stock: row.stock,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        })
        .collect();

    let total_amount = items.iter().map(|i| i.subtotal).sum();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        CartList {
            items,
            total_amount,
        },
        Some(Meta::unpaged(total)),
    ))
}

async fn product_stock(state: &AppState, product_id: Uuid) -> AppResult<i32> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&state.pool)
        .await?;
    row.map(|(stock,)| stock)
        .ok_or_else(|| AppError::BadRequest("product not found".to_string()))
}

fn ensure_within_stock(requested: i32, stock: i32) -> AppResult<()> {
    if requested > stock {
        return Err(AppError::Conflict(format!(
            "requested quantity {requested} exceeds available stock {stock}"
        )));
    }
    Ok(())
}

/// Adds `quantity` on top of whatever is already in the cart for the product.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    ensure_buyer(user)?;
    let quantity = validate::quantity(payload.quantity)?;
    let stock = product_stock(state, payload.product_id).await?;
    ensure_within_stock(quantity, stock)?;

    // Merge and stock check in one statement; concurrent adds serialize on the row lock.
    let cart_item = sqlx::query_as::<_, CartItem>(
        r#"
        INSERT INTO cart_items (id, user_id, product_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, product_id) DO UPDATE
            SET quantity = cart_items.quantity + EXCLUDED.quantity
            WHERE cart_items.quantity::int8 + EXCLUDED.quantity
                <= (SELECT stock FROM products WHERE id = EXCLUDED.product_id)
        RETURNING id, product_id, user_id, quantity, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.product_id)
    .bind(quantity)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| {
        AppError::Conflict(format!(
            "adding {quantity} would exceed available stock {stock}"
        ))
    })?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id, "quantity": cart_item.quantity }),
    )
    .await;

    Ok(ApiResponse::success("OK", cart_item, None))
}

pub async fn set_quantity(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    ensure_buyer(user)?;
    let quantity = validate::quantity(payload.quantity)?;
    let stock = product_stock(state, product_id).await?;
    ensure_within_stock(quantity, stock)?;

    let cart_item = sqlx::query_as::<_, CartItem>(
        r#"
        UPDATE cart_items
        SET quantity = $3
        WHERE user_id = $1 AND product_id = $2
        RETURNING id, product_id, user_id, quantity, created_at
        "#,
    )
    .bind(user.user_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound)?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": product_id, "quantity": quantity }),
    )
    .await;

    Ok(ApiResponse::success("OK", cart_item, None))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_buyer(user)?;
    let result = sqlx::query("DELETE FROM cart_items WHERE product_id = $1 AND user_id = $2")
        .bind(product_id)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::ok("Removed from cart", serde_json::json!({})))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_buyer(user)?;
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    Ok(ApiResponse::ok(
        "Cart cleared",
        serde_json::json!({ "removed": result.rows_affected() }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_equal_to_stock_is_allowed() {
        assert!(ensure_within_stock(5, 5).is_ok());
    }

    #[test]
    fn quantity_above_stock_conflicts() {
        assert!(matches!(
            ensure_within_stock(6, 5),
            Err(AppError::Conflict(_))
        ));
    }
}
