use chrono::Utc;
use campus_market_api::{
    config::AppConfig,
    db::run_migrations,
    dto::{
        admin::{UpdateAccountStatusRequest, VerifySellerRequest},
        auth::{LoginRequest, RegisterRequest, RegisterSellerRequest},
        cart::AddToCartRequest,
        categories::{CreateCategoryRequest, UpdateCategoryRequest},
        orders::{CheckoutRequest, UpdateOrderStatusRequest},
        products::{CreateProductRequest, UpdateProductRequest},
        ratings::CreateRatingRequest,
    },
    error::AppError,
    middleware::auth::{AuthUser, authenticate, decode_token},
    models::{Role, VerificationStatus},
    routes::params::{DateRangeQuery, ProductQuery, ProductReportQuery, SalesQuery},
    services::{
        admin_service, auth_service, cart_service, category_service, order_service,
        product_service, rating_service, report_service, seller_service,
    },
    state::AppState,
};
use sqlx::{Executor, postgres::PgPoolOptions};
use tokio::task::JoinSet;
use uuid::Uuid;

// Integration flow: categories, seller verification, cart, checkout, cancel,
// ratings, reports, seller sales and account deactivation against a real database.
#[tokio::test]
async fn marketplace_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run marketplace flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;
    let admin = create_admin(&state).await?;

    // Categories: case-insensitive uniqueness.
    let category = category_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: "Buku".into(),
            description: Some("Buku kuliah".into()),
        },
    )
    .await?
    .data
    .unwrap();
    let duplicate = category_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: "  bUKU ".into(),
            description: None,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    // Seller registers pending and cannot list products until verified.
    let registration = auth_service::register_seller(
        &state,
        RegisterSellerRequest {
            name: "Sari".into(),
            email: "sari@example.com".into(),
            password: "seller12345".into(),
            phone: None,
            shop_name: "Toko Sari".into(),
            shop_description: None,
            shop_address: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(registration.user.status_verifikasi, "pending");

    let mut seller = AuthUser {
        user_id: registration.user.id,
        email: registration.user.email.clone(),
        role: Role::Seller,
        verification: VerificationStatus::Pending,
    };
    let product_request = || CreateProductRequest {
        category_id: category.id,
        name: "Kalkulus Jilid 1".into(),
        description: Some("Kondisi baik".into()),
        price: 50_000,
        stock: 3,
        image_urls: vec!["https://img.example.com/kalkulus.jpg".into()],
    };
    let rejected = product_service::create_product(&state, &seller, product_request()).await;
    assert!(matches!(rejected, Err(AppError::Forbidden)));

    let verified = admin_service::verify_seller(
        &state,
        &admin,
        seller.user_id,
        VerifySellerRequest {
            status: "verified".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(verified.status_verifikasi, "verified");
    seller.verification = VerificationStatus::Verified;

    let detail = product_service::create_product(&state, &seller, product_request())
        .await?
        .data
        .unwrap();
    let product_id = detail.product.id;
    assert_eq!(detail.images.len(), 1);

    // A category in use cannot be deleted.
    let in_use = category_service::delete_category(&state, &admin, category.id).await;
    assert!(matches!(in_use, Err(AppError::Conflict(_))));

    // Buyer fills the cart; quantities beyond stock are refused.
    let buyer_user = auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Budi".into(),
            email: "budi@example.com".into(),
            password: "buyer12345".into(),
            phone: Some("08123456789".into()),
        },
    )
    .await?
    .data
    .unwrap();
    let buyer = AuthUser {
        user_id: buyer_user.id,
        email: buyer_user.email.clone(),
        role: Role::Buyer,
        verification: VerificationStatus::Verified,
    };

    let too_many = cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest {
            product_id,
            quantity: 4,
        },
    )
    .await;
    assert!(matches!(too_many, Err(AppError::Conflict(_))));

    cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest {
            product_id,
            quantity: 2,
        },
    )
    .await?;

    // Checkout snapshots the price, decrements stock and empties the cart.
    let placed = order_service::checkout(
        &state,
        &buyer,
        CheckoutRequest {
            shipping_address: "Asrama Putra Blok C".into(),
            payment_method: "transfer".into(),
            note: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(placed.order.total_amount, 100_000);
    assert_eq!(placed.order.status, "pending");
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].product_name, "Kalkulus Jilid 1");
    assert_eq!(stock_of(&state, product_id).await?, 1);

    let cart = cart_service::list_cart(&state, &buyer).await?.data.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_amount, 0);

    // Illegal transition is refused; cancelling restores stock.
    let skip_ahead = admin_service::update_order_status(
        &state,
        &admin,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: "completed".into(),
        },
    )
    .await;
    assert!(matches!(skip_ahead, Err(AppError::Conflict(_))));

    let cancelled = order_service::cancel_order(&state, &buyer, placed.order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(cancelled.order.status, "cancelled");
    assert_eq!(stock_of(&state, product_id).await?, 3);

    let again = order_service::cancel_order(&state, &buyer, placed.order.id).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    // Ratings: one per email per product, guests allowed.
    let rating = rating_service::create_rating(
        &state,
        None,
        product_id,
        CreateRatingRequest {
            name: "Tamu".into(),
            email: "tamu@example.com".into(),
            score: 5,
            comment: Some("Mantap".into()),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(rating.score, 5);

    let second = rating_service::create_rating(
        &state,
        None,
        product_id,
        CreateRatingRequest {
            name: "Tamu".into(),
            email: "TAMU@example.com".into(),
            score: 1,
            comment: None,
        },
    )
    .await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    let detail = product_service::get_product(&state, product_id)
        .await?
        .data
        .unwrap();
    assert_eq!(detail.rating_count, 1);
    assert_eq!(detail.average_score, Some(5.0));

    // Wildcards in the search text are matched literally.
    let wildcard = product_service::list_products(
        &state,
        ProductQuery {
            q: Some("%".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert!(wildcard.items.is_empty());

    // Renaming onto an existing name (any case) is refused.
    let stationery = category_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: "Alat Tulis".into(),
            description: None,
        },
    )
    .await?
    .data
    .unwrap();
    let rename = category_service::update_category(
        &state,
        &admin,
        stationery.id,
        UpdateCategoryRequest {
            name: Some("buku".into()),
            description: None,
        },
    )
    .await;
    assert!(matches!(rename, Err(AppError::Conflict(_))));

    // Only buyers check out.
    let by_seller = order_service::checkout(&state, &seller, checkout_request()).await;
    assert!(matches!(by_seller, Err(AppError::Forbidden)));

    sales_and_reports(&state, &admin, &seller, &buyer, stationery.id, product_id).await?;
    assert_eq!(stock_of(&state, product_id).await?, 2);

    // Checkout fails as a whole when stock dropped below the cart quantity.
    cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest {
            product_id,
            quantity: 2,
        },
    )
    .await?;
    product_service::update_product(
        &state,
        &seller,
        product_id,
        UpdateProductRequest {
            stock: Some(1),
            ..Default::default()
        },
    )
    .await?;
    let short = order_service::checkout(&state, &buyer, checkout_request()).await;
    assert!(matches!(short, Err(AppError::Conflict(_))));
    assert_eq!(stock_of(&state, product_id).await?, 1);
    let cart = cart_service::list_cart(&state, &buyer).await?.data.unwrap();
    assert_eq!(cart.items.len(), 1);

    // A deactivated account cannot sign in and its tokens stop working.
    let (token, _) = auth_service::issue_token(
        buyer.user_id,
        &buyer.email,
        Role::Buyer,
        &state.config.jwt_secret,
        1,
    )?;
    let claims = decode_token(&token, &state.config.jwt_secret)?;
    assert!(authenticate(&state, &claims).await.is_ok());

    admin_service::set_account_status(
        &state,
        &admin,
        buyer.user_id,
        UpdateAccountStatusRequest {
            status: "inactive".into(),
        },
    )
    .await?;
    let login = auth_service::login_user(
        &state,
        LoginRequest {
            email: "budi@example.com".into(),
            password: "buyer12345".into(),
        },
    )
    .await;
    assert!(matches!(login, Err(AppError::Forbidden)));
    assert!(matches!(
        authenticate(&state, &claims).await,
        Err(AppError::Forbidden)
    ));

    let wrong_password = auth_service::login_user(
        &state,
        LoginRequest {
            email: "sari@example.com".into(),
            password: "not-the-password".into(),
        },
    )
    .await;
    assert!(matches!(wrong_password, Err(AppError::Unauthorized(_))));

    Ok(())
}

fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        shipping_address: "Asrama Putra Blok C".into(),
        payment_method: "transfer".into(),
        note: None,
    }
}

async fn set_status(
    state: &AppState,
    admin: &AuthUser,
    order_id: Uuid,
    status: &str,
) -> anyhow::Result<()> {
    admin_service::update_order_status(
        state,
        admin,
        order_id,
        UpdateOrderStatusRequest {
            status: status.into(),
        },
    )
    .await?;
    Ok(())
}

/// Expects `kalkulus_id` at stock 3 with 50_000 price and an empty cart.
/// Leaves it at stock 2.
async fn sales_and_reports(
    state: &AppState,
    admin: &AuthUser,
    seller: &AuthUser,
    buyer: &AuthUser,
    category_id: Uuid,
    kalkulus_id: Uuid,
) -> anyhow::Result<()> {
    let pen_id = product_service::create_product(
        state,
        seller,
        CreateProductRequest {
            category_id,
            name: "Pulpen Gel".into(),
            description: None,
            price: 20_000,
            stock: 5,
            image_urls: vec![],
        },
    )
    .await?
    .data
    .unwrap()
    .product
    .id;

    // Concurrent adds never push the cart line past stock.
    let mut adds = JoinSet::new();
    for _ in 0..20 {
        let state = state.clone();
        let buyer = buyer.clone();
        adds.spawn(async move {
            cart_service::add_to_cart(
                &state,
                &buyer,
                AddToCartRequest {
                    product_id: pen_id,
                    quantity: 1,
                },
            )
            .await
        });
    }
    let (mut added, mut refused) = (0, 0);
    while let Some(joined) = adds.join_next().await {
        match joined? {
            Ok(_) => added += 1,
            Err(AppError::Conflict(_)) => refused += 1,
            Err(other) => return Err(other.into()),
        }
    }
    assert_eq!((added, refused), (5, 15));
    let cart = cart_service::list_cart(state, buyer).await?.data.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
    cart_service::clear_cart(state, buyer).await?;

    // Admin cancelling a processing order restores stock.
    cart_service::add_to_cart(
        state,
        buyer,
        AddToCartRequest {
            product_id: pen_id,
            quantity: 2,
        },
    )
    .await?;
    let dropped = order_service::checkout(state, buyer, checkout_request())
        .await?
        .data
        .unwrap()
        .order;
    assert_eq!(stock_of(state, pen_id).await?, 3);
    set_status(state, admin, dropped.id, "processing").await?;
    set_status(state, admin, dropped.id, "cancelled").await?;
    assert_eq!(stock_of(state, pen_id).await?, 5);
    let reopen = admin_service::update_order_status(
        state,
        admin,
        dropped.id,
        UpdateOrderStatusRequest {
            status: "processing".into(),
        },
    )
    .await;
    assert!(matches!(reopen, Err(AppError::Conflict(_))));

    // One completed order with both products.
    for product_id in [kalkulus_id, pen_id] {
        cart_service::add_to_cart(
            state,
            buyer,
            AddToCartRequest {
                product_id,
                quantity: 1,
            },
        )
        .await?;
    }
    let sold = order_service::checkout(state, buyer, checkout_request())
        .await?
        .data
        .unwrap()
        .order;
    assert_eq!(sold.total_amount, 70_000);
    for status in ["processing", "shipped", "completed"] {
        set_status(state, admin, sold.id, status).await?;
    }

    // Late in the UTC day, which is already tomorrow in the session time zone.
    let today = Utc::now().date_naive();
    let late = today.and_hms_opt(23, 30, 0).unwrap().and_utc();
    sqlx::query("UPDATE orders SET created_at = $1 WHERE id = $2")
        .bind(late)
        .bind(sold.id)
        .execute(&state.pool)
        .await?;

    let report = report_service::sales_report(
        state,
        admin,
        DateRangeQuery {
            from: Some(today),
            to: Some(today),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(report.totals.order_count, 1);
    assert_eq!(report.totals.items_sold, 2);
    assert_eq!(report.totals.revenue, 70_000);
    assert_eq!(report.daily.len(), 1);
    assert_eq!(report.daily[0].day, today);
    assert_eq!(report.daily[0].revenue, 70_000);
    assert_eq!(report.top_products.len(), 2);
    assert_eq!(report.top_products[0].product_name, "Kalkulus Jilid 1");
    assert_eq!(report.top_products[0].revenue, 50_000);

    let sellers = report_service::seller_report(state, admin).await?.data.unwrap();
    assert_eq!(sellers.items.len(), 1);
    assert_eq!(sellers.items[0].shop_name.as_deref(), Some("Toko Sari"));
    assert_eq!(sellers.items[0].product_count, 2);
    assert_eq!(sellers.items[0].items_sold, 2);
    assert_eq!(sellers.items[0].revenue, 70_000);

    let low = report_service::product_report(
        state,
        admin,
        ProductReportQuery {
            low_stock_threshold: Some(2),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(low.items.len(), 1);
    assert_eq!(low.items[0].product_id, kalkulus_id);
    assert_eq!(low.items[0].stock, 2);
    assert_eq!(low.items[0].items_sold, 1);
    assert_eq!(low.items[0].revenue, 50_000);

    // Seller views: every line, a status filter, and the summary without cancellations.
    let all_lines = seller_service::sales(state, seller, SalesQuery::default()).await?;
    assert_eq!(all_lines.meta.unwrap().total, Some(4));
    let completed = seller_service::sales(
        state,
        seller,
        SalesQuery {
            status: Some("completed".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(completed.items.len(), 2);
    assert!(completed.items.iter().all(|line| line.order_id == sold.id));

    let summary = seller_service::sales_summary(state, seller).await?.data.unwrap();
    assert_eq!(summary.order_count, 1);
    assert_eq!(summary.items_sold, 2);
    assert_eq!(summary.revenue, 70_000);

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let config = AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some(database_url.to_string()),
        "JWT_SECRET" => Some("integration-secret-that-is-long-enough".to_string()),
        _ => None,
    })?;
    // A session time zone far from UTC keeps report day boundaries honest.
    let pool = PgPoolOptions::new()
        .max_connections(25)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET TIME ZONE 'Pacific/Kiritimati'").await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await?;
    run_migrations(&pool).await?;

    // Clean tables between runs
    sqlx::query(
        "TRUNCATE TABLE ratings, order_items, orders, cart_items, product_images, products, \
         categories, tokos, audit_logs, users RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await?;

    Ok(AppState::new(pool, config))
}

async fn create_admin(state: &AppState) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    let email = "admin@example.com";
    let password_hash = auth_service::hash_password("admin12345")?;
    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role) VALUES ($1, $2, $3, $4, 'admin')",
    )
    .bind(id)
    .bind("Admin")
    .bind(email)
    .bind(password_hash)
    .execute(&state.pool)
    .await?;

    Ok(AuthUser {
        user_id: id,
        email: email.into(),
        role: Role::Admin,
        verification: VerificationStatus::Verified,
    })
}

async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let (stock,): (i32,) = sqlx::query_as("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(stock)
}
