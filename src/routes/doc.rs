use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{SellerList, SellerWithToko, UpdateAccountStatusRequest, UserList, VerifySellerRequest},
        auth::{LoginRequest, LoginResponse, Profile, RegisterRequest, RegisterSellerRequest, SellerRegistration},
        cart::{AddToCartRequest, CartItemDto, CartList, UpdateCartRequest},
        categories::{CategoryList, CategoryWithCount, CreateCategoryRequest, UpdateCategoryRequest},
        orders::{CheckoutRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
        products::{AddImageRequest, CreateProductRequest, ProductDetail, ProductList, ShopSummary, UpdateProductRequest},
        ratings::{CreateRatingRequest, RatingList},
        reports::{
            DailySales, ProductReport, ProductReportRow, SalesReport, SalesTotals, SellerReport,
            SellerReportRow, TopProduct,
        },
        seller::{SaleList, SaleRow, SalesSummary, UpdateShopRequest},
    },
    models::{
        AccountStatus, CartItem, Category, Order, OrderItem, OrderStatus, Product, ProductImage,
        Rating, Role, Toko, User, VerificationStatus,
    },
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, categories, health, orders, params, products, seller},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::register_seller,
        auth::login,
        auth::me,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::add_image,
        products::delete_image,
        products::list_ratings,
        products::create_rating,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::cancel_order,
        seller::get_shop,
        seller::update_shop,
        seller::my_products,
        seller::sales,
        seller::sales_summary,
        admin::list_users,
        admin::set_account_status,
        admin::list_sellers,
        admin::verify_seller,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::sales_report,
        admin::seller_report,
        admin::product_report
    ),
    components(
        schemas(
            Role,
            AccountStatus,
            VerificationStatus,
            OrderStatus,
            User,
            Toko,
            Category,
            Product,
            ProductImage,
            Rating,
            CartItem,
            Order,
            OrderItem,
            RegisterRequest,
            RegisterSellerRequest,
            LoginRequest,
            LoginResponse,
            SellerRegistration,
            Profile,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryWithCount,
            CategoryList,
            CreateProductRequest,
            UpdateProductRequest,
            AddImageRequest,
            ProductList,
            ProductDetail,
            ShopSummary,
            CreateRatingRequest,
            RatingList,
            AddToCartRequest,
            UpdateCartRequest,
            CartItemDto,
            CartList,
            CheckoutRequest,
            UpdateOrderStatusRequest,
            OrderWithItems,
            OrderList,
            UpdateShopRequest,
            SaleRow,
            SaleList,
            SalesSummary,
            VerifySellerRequest,
            UpdateAccountStatusRequest,
            UserList,
            SellerWithToko,
            SellerList,
            SalesTotals,
            DailySales,
            TopProduct,
            SalesReport,
            SellerReportRow,
            SellerReport,
            ProductReportRow,
            ProductReport,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and profile"),
        (name = "Categories", description = "Catalog categories"),
        (name = "Products", description = "Product catalog"),
        (name = "Ratings", description = "Product ratings"),
        (name = "Cart", description = "Buyer cart"),
        (name = "Orders", description = "Checkout and buyer orders"),
        (name = "Seller", description = "Shop, products and sales of the signed-in seller"),
        (name = "Admin", description = "Seller verification, accounts and orders"),
        (name = "Reports", description = "Admin reports"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
