use chrono::{Duration, NaiveDate, Utc};

use crate::{
    dto::reports::{
        DailySales, ProductReport, ProductReportRow, SalesReport, SalesTotals, SellerReport,
        SellerReportRow, TopProduct,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::ApiResponse,
    routes::params::{DateRangeQuery, ProductReportQuery},
    state::AppState,
};

pub const DEFAULT_RANGE_DAYS: i64 = 30;
pub const MAX_RANGE_DAYS: i64 = 366;
const TOP_PRODUCTS: i64 = 10;

/// Inclusive `[from, to]`, defaulting to the last `DEFAULT_RANGE_DAYS` days ending `today`.
pub fn resolve_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> AppResult<(NaiveDate, NaiveDate)> {
    let to = to.unwrap_or(today);
    let from = from.unwrap_or(to - Duration::days(DEFAULT_RANGE_DAYS - 1));
    if from > to {
        return Err(AppError::BadRequest("from must not be after to".into()));
    }
    if (to - from).num_days() >= MAX_RANGE_DAYS {
        return Err(AppError::BadRequest(format!(
            "date range must not exceed {MAX_RANGE_DAYS} days"
        )));
    }
    Ok((from, to))
}

pub async fn sales_report(
    state: &AppState,
    user: &AuthUser,
    query: DateRangeQuery,
) -> AppResult<ApiResponse<SalesReport>> {
    ensure_admin(user)?;
    let (from, to) = resolve_range(query.from, query.to, Utc::now().date_naive())?;

    let totals = sqlx::query_as::<_, SalesTotals>(
        r#"
        SELECT COUNT(DISTINCT o.id) AS order_count,
               COALESCE(SUM(oi.quantity), 0)::int8 AS items_sold,
               COALESCE(SUM(oi.price * oi.quantity), 0)::int8 AS revenue
        FROM orders o
        JOIN order_items oi ON oi.order_id = o.id
        WHERE o.status <> 'cancelled'
          AND (o.created_at AT TIME ZONE 'UTC')::date BETWEEN $1 AND $2
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_one(&state.pool)
    .await?;

    let daily = sqlx::query_as::<_, DailySales>(
        r#"
        SELECT (o.created_at AT TIME ZONE 'UTC')::date AS day,
               COUNT(DISTINCT o.id) AS order_count,
               COALESCE(SUM(oi.quantity), 0)::int8 AS items_sold,
               COALESCE(SUM(oi.price * oi.quantity), 0)::int8 AS revenue
        FROM orders o
        JOIN order_items oi ON oi.order_id = o.id
        WHERE o.status <> 'cancelled'
          AND (o.created_at AT TIME ZONE 'UTC')::date BETWEEN $1 AND $2
        GROUP BY day
        ORDER BY day ASC
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(&state.pool)
    .await?;

    let top_products = sqlx::query_as::<_, TopProduct>(
        r#"
        SELECT oi.product_id, oi.product_name,
               SUM(oi.quantity)::int8 AS items_sold,
               SUM(oi.price * oi.quantity)::int8 AS revenue
        FROM orders o
        JOIN order_items oi ON oi.order_id = o.id
        WHERE o.status <> 'cancelled'
          AND (o.created_at AT TIME ZONE 'UTC')::date BETWEEN $1 AND $2
        GROUP BY oi.product_id, oi.product_name
        ORDER BY items_sold DESC, revenue DESC
        LIMIT $3
        "#,
    )
    .bind(from)
    .bind(to)
    .bind(TOP_PRODUCTS)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::ok(
        "Sales report",
        SalesReport {
            from,
            to,
            totals,
            daily,
            top_products,
        },
    ))
}

pub async fn seller_report(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SellerReport>> {
    ensure_admin(user)?;
    let items = sqlx::query_as::<_, SellerReportRow>(
        r#"
        SELECT u.id AS seller_id, u.name AS seller_name, u.email, t.name AS shop_name,
               u.status_akun, u.status_verifikasi,
               (SELECT COUNT(*) FROM products p WHERE p.seller_id = u.id) AS product_count,
               COALESCE(s.items_sold, 0)::int8 AS items_sold,
               COALESCE(s.revenue, 0)::int8 AS revenue
        FROM users u
        LEFT JOIN tokos t ON t.seller_id = u.id
        LEFT JOIN (
            SELECT oi.seller_id,
                   SUM(oi.quantity) AS items_sold,
                   SUM(oi.price * oi.quantity) AS revenue
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.status <> 'cancelled'
            GROUP BY oi.seller_id
        ) s ON s.seller_id = u.id
        WHERE u.role = 'seller'
        ORDER BY revenue DESC, u.name ASC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::ok("Seller report", SellerReport { items }))
}

pub async fn product_report(
    state: &AppState,
    user: &AuthUser,
    query: ProductReportQuery,
) -> AppResult<ApiResponse<ProductReport>> {
    ensure_admin(user)?;
    let items = sqlx::query_as::<_, ProductReportRow>(
        r#"
        SELECT p.id AS product_id, p.name AS product_name, t.name AS shop_name,
               c.name AS category_name, p.price, p.stock,
               COALESCE(s.items_sold, 0)::int8 AS items_sold,
               COALESCE(s.revenue, 0)::int8 AS revenue
        FROM products p
        JOIN categories c ON c.id = p.category_id
        LEFT JOIN tokos t ON t.seller_id = p.seller_id
        LEFT JOIN (
            SELECT oi.product_id,
                   SUM(oi.quantity) AS items_sold,
                   SUM(oi.price * oi.quantity) AS revenue
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.status <> 'cancelled'
            GROUP BY oi.product_id
        ) s ON s.product_id = p.id
        WHERE ($1::int4 IS NULL OR p.stock <= $1)
        ORDER BY items_sold DESC, p.name ASC
        "#,
    )
    .bind(query.low_stock_threshold)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::ok("Product report", ProductReport { items }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_range_is_last_thirty_days() {
        let (from, to) = resolve_range(None, None, day(2026, 3, 31)).unwrap();
        assert_eq!(to, day(2026, 3, 31));
        assert_eq!(from, day(2026, 3, 2));
    }

    #[test]
    fn explicit_single_day_range() {
        let d = day(2026, 1, 15);
        assert_eq!(resolve_range(Some(d), Some(d), d).unwrap(), (d, d));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = resolve_range(Some(day(2026, 2, 2)), Some(day(2026, 2, 1)), day(2026, 3, 1));
        assert!(matches!(err, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn overly_long_range_is_rejected() {
        let err = resolve_range(Some(day(2024, 1, 1)), Some(day(2026, 1, 1)), day(2026, 1, 1));
        assert!(err.is_err());
    }
}
