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
        analytics::{AnalyticsSummary, DailyViews, PageCount, TrackVisitRequest, TrackedVisit},
        auth::{LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest},
        cart::{AddToCartRequest, CartItemDto, CartList, UpdateCartItemRequest},
        categories::{CategoryList, CategoryWithCount, CreateCategoryRequest, UpdateCategoryRequest},
        content::{
            BankAccountList, ContactList, CreateBankAccountRequest, CreateContactRequest,
            CreateHeroSlideRequest, HeroSlideList, SettingsMap, UpdateBankAccountRequest,
            UpdateHeroSlideRequest,
        },
        notifications::{MarkedRead, NotificationList, UnreadCount},
        orders::{CheckoutRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
        payments::{PaymentProofRequest, RejectPaymentRequest},
        products::{
            AddProductImageRequest, CreateProductRequest, ProductDetail, ProductList,
            UpdateProductRequest,
        },
        reports::{DailySales, DashboardSummary, SalesReport, StatusCount, TopProduct},
        uploads::UploadForm,
        users::{CreateUserRequest, UpdateUserRequest, UserList},
    },
    models::{
        BankAccount, CartItem, Category, Contact, HeroSlide, Notification, NotificationKind,
        NotificationStatus, Order, OrderItem, OrderStatus, PaymentStatus, Product, ProductImage,
        Setting, User, UserRole,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, analytics, auth, cart, categories, content, health, notifications, orders, params,
        products, profile, uploads,
    },
    storage::{ImageLocation, StoredImage},
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
    info(
        title = "Toko Oleh-Oleh API",
        description = "Storefront and back office for an Indonesian souvenir shop"
    ),
    paths(
        health::health_check,
        auth::register,
        auth::login,
        profile::get_profile,
        profile::update_profile,
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
        products::add_product_image,
        products::remove_product_image,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::upload_payment_proof,
        orders::cancel_order,
        notifications::list_notifications,
        notifications::unread_count,
        notifications::mark_all_read,
        notifications::mark_read,
        notifications::delete_notification,
        content::get_settings,
        content::list_bank_accounts,
        content::list_hero_slides,
        content::submit_contact,
        analytics::track_visit,
        uploads::upload_image,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_payments,
        admin::verify_payment,
        admin::reject_payment,
        admin::list_products_admin,
        admin::list_low_stock,
        admin::get_product_admin,
        admin::list_users,
        admin::create_user,
        admin::get_user,
        admin::update_user,
        admin::delete_user,
        admin::list_bank_accounts,
        admin::create_bank_account,
        admin::update_bank_account,
        admin::delete_bank_account,
        admin::list_hero_slides,
        admin::create_hero_slide,
        admin::update_hero_slide,
        admin::delete_hero_slide,
        admin::upsert_settings,
        admin::list_contacts,
        admin::mark_contact_read,
        admin::delete_contact,
        admin::dashboard,
        admin::sales_report,
        admin::analytics_summary
    ),
    components(
        schemas(
            User,
            UserRole,
            Category,
            Product,
            ProductImage,
            CartItem,
            Order,
            OrderItem,
            OrderStatus,
            PaymentStatus,
            Notification,
            NotificationKind,
            NotificationStatus,
            BankAccount,
            Setting,
            Contact,
            HeroSlide,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            CategoryList,
            CategoryWithCount,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            ProductList,
            ProductDetail,
            CreateProductRequest,
            UpdateProductRequest,
            AddProductImageRequest,
            CartList,
            CartItemDto,
            AddToCartRequest,
            UpdateCartItemRequest,
            CheckoutRequest,
            OrderList,
            OrderWithItems,
            UpdateOrderStatusRequest,
            PaymentProofRequest,
            RejectPaymentRequest,
            NotificationList,
            UnreadCount,
            MarkedRead,
            BankAccountList,
            CreateBankAccountRequest,
            UpdateBankAccountRequest,
            HeroSlideList,
            CreateHeroSlideRequest,
            UpdateHeroSlideRequest,
            SettingsMap,
            ContactList,
            CreateContactRequest,
            UserList,
            CreateUserRequest,
            UpdateUserRequest,
            DashboardSummary,
            SalesReport,
            DailySales,
            StatusCount,
            TopProduct,
            AnalyticsSummary,
            DailyViews,
            PageCount,
            TrackVisitRequest,
            TrackedVisit,
            UploadForm,
            StoredImage,
            ImageLocation,
            health::HealthData,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Profile", description = "Current user profile"),
        (name = "Categories", description = "Product categories"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Orders", description = "Checkout, payment proof and order history"),
        (name = "Notifications", description = "In-app notifications"),
        (name = "Content", description = "Public storefront content"),
        (name = "Analytics", description = "Visitor tracking"),
        (name = "Uploads", description = "Image uploads"),
        (name = "Admin", description = "Back office endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_checkout_and_admin_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/orders/checkout"));
        assert!(doc.paths.paths.contains_key("/api/admin/payments/{id}/verify"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
