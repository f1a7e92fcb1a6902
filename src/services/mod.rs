pub mod analytics_service;
pub mod auth_service;
pub mod bank_account_service;
pub mod cart_service;
pub mod category_service;
pub mod contact_service;
pub mod hero_slide_service;
pub mod notification_service;
pub mod order_service;
pub mod payment_service;
pub mod product_service;
pub mod report_service;
pub mod setting_service;
pub mod upload_service;
pub mod user_service;
