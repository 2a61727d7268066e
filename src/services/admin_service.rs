use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        admin::{
            SellerList, SellerWithToko, UpdateAccountStatusRequest, UserList, VerifySellerRequest,
        },
        orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest},
    },
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        tokos::{Column as TokoCol, Entity as Tokos},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{AccountStatus, Order, OrderStatus, Role, Toko, User, VerificationStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SellerListQuery, SortOrder, UserListQuery},
    services::order_service::{items_of, transition_order},
    state::AppState,
};

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    query: UserListQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(role) = query.role.as_ref().filter(|s| !s.is_empty()) {
        let role: Role = role.parse()?;
        condition = condition.add(UserCol::Role.eq(role.as_str()));
    }
    if let Some(status) = query.status_akun.as_ref().filter(|s| !s.is_empty()) {
        let status: AccountStatus = status.parse()?;
        condition = condition.add(UserCol::StatusAkun.eq(status.as_str()));
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn list_sellers(
    state: &AppState,
    user: &AuthUser,
    query: SellerListQuery,
) -> AppResult<ApiResponse<SellerList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all().add(UserCol::Role.eq(Role::Seller.as_str()));
    if let Some(status) = query.status_verifikasi.as_ref().filter(|s| !s.is_empty()) {
        let status: VerificationStatus = status.parse()?;
        condition = condition.add(UserCol::StatusVerifikasi.eq(status.as_str()));
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_asc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let sellers = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let seller_ids: Vec<Uuid> = sellers.iter().map(|s| s.id).collect();
    let mut tokos: HashMap<Uuid, Toko> = Tokos::find()
        .filter(TokoCol::SellerId.is_in(seller_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|t| (t.seller_id, Toko::from(t)))
        .collect();

    let items = sellers
        .into_iter()
        .map(|seller| SellerWithToko {
            toko: tokos.remove(&seller.id),
            user: User::from(seller),
        })
        .collect();

    Ok(ApiResponse::success(
        "Sellers",
        SellerList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn verify_seller(
    state: &AppState,
    user: &AuthUser,
    seller_id: Uuid,
    payload: VerifySellerRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let status: VerificationStatus = payload.status.parse()?;
    if status == VerificationStatus::Pending {
        return Err(AppError::BadRequest(
            "status must be verified or rejected".into(),
        ));
    }

    let seller = Users::find_by_id(seller_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if seller.role.parse::<Role>()? != Role::Seller {
        return Err(AppError::BadRequest("user is not a seller".into()));
    }

    let mut active: UserActive = seller.into();
    active.status_verifikasi = Set(status.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let seller = active.update(&state.orm).await?;

    tracing::info!(seller_id = %seller.id, status = %status, "seller verification updated");
    audit::record(
        &state.orm,
        Some(user.user_id),
        "seller_verification",
        "users",
        serde_json::json!({ "seller_id": seller.id, "status": status.as_str() }),
    )
    .await;

    Ok(ApiResponse::ok("Seller verification updated", User::from(seller)))
}

pub async fn set_account_status(
    state: &AppState,
    user: &AuthUser,
    user_id: Uuid,
    payload: UpdateAccountStatusRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let status: AccountStatus = payload.status.parse()?;
    if user_id == user.user_id && status == AccountStatus::Inactive {
        return Err(AppError::BadRequest(
            "admins cannot deactivate their own account".into(),
        ));
    }

    let target = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = target.into();
    active.status_akun = Set(status.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let target = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "account_status",
        "users",
        serde_json::json!({ "user_id": target.id, "status": status.as_str() }),
    )
    .await;

    Ok(ApiResponse::ok("Account status updated", User::from(target)))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse()?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);

    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = items_of(&state.orm, order.id).await?;

    Ok(ApiResponse::ok(
        "Order found",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let next: OrderStatus = payload.status.parse()?;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let order = transition_order(&txn, existing, next).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await;

    Ok(ApiResponse::ok("Order updated", Order::from(order)))
}
