pub mod bank_accounts;
pub mod cart_items;
pub mod categories;
pub mod contacts;
pub mod hero_slides;
pub mod notifications;
pub mod order_items;
pub mod orders;
pub mod page_visits;
pub mod product_images;
pub mod products;
pub mod settings;
pub mod users;
pub mod visitors;

pub use bank_accounts::Entity as BankAccounts;
pub use cart_items::Entity as CartItems;
pub use categories::Entity as Categories;
pub use contacts::Entity as Contacts;
pub use hero_slides::Entity as HeroSlides;
pub use notifications::Entity as Notifications;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use page_visits::Entity as PageVisits;
pub use product_images::Entity as ProductImages;
pub use products::Entity as Products;
pub use settings::Entity as Settings;
pub use users::Entity as Users;
pub use visitors::Entity as Visitors;
