use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Toko, User};

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifySellerRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAccountStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct UserList {
    #[schema(value_type = Vec<User>)]
    pub items: Vec<User>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SellerWithToko {
    pub user: User,
    pub toko: Option<Toko>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct SellerList {
    #[schema(value_type = Vec<SellerWithToko>)]
    pub items: Vec<SellerWithToko>,
}
