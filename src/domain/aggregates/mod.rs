//! Aggregates module
pub mod product;
pub mod store;
pub mod cart;
pub mod order;
pub mod review;

pub use product::{Goods, GoodsChanges, GoodsError, GoodsImage, GoodsStats, GoodsSummary, SortKey};
pub use store::{Store, StoreChanges, StoreImages, StorePatch, StoreRuleError};
pub use cart::{Cart, CartChange, CartItem, LineItemInput};
pub use order::{NewOrder, Order, OrderItem, OrderStatus, UnknownStatus};
pub use review::{NewReview, Review, ReviewDenied, ReviewPatch};
