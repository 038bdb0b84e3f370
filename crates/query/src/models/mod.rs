//! Domain models.

pub mod order;
pub mod product;
pub mod user;

pub use order::{NewOrderItem, Order, OrderItem, OrderItemRelation, OrderRelation, OrderStatus};
pub use product::{Brand, Category, Product, ProductImage, ProductRelation};
pub use user::{Address, User, UserProfile, UserRelation};
