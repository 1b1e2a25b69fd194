//! Aggregates module
pub mod analytics;
pub mod catalog;
pub mod checkout;
pub mod customer;
pub mod order;
pub mod product;
pub mod sale;
pub mod user;

pub use analytics::{DashboardItem, DashboardItemInput, Visit};
pub use catalog::{Category, CategoryInput, Tag, TagInput};
pub use checkout::{Checkout, CheckoutStatus};
pub use customer::Customer;
pub use order::{CustomerSnapshot, LineItem, Order, OrderDraft, OrderStatus, PaymentStatus, ShippingAddress};
pub use product::{Product, ProductInput, PublishStatus, StockAdjustment, StockStatus};
pub use sale::{Sale, SaleCustomer, SaleDraft, SaleLineItem, SaleTransaction};
pub use user::UserIdentity;
