//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::cart::{money_amount, subtotal, LineItemInput};

/// Order status. Any status may follow any other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus { #[default] Pending, Processing, Shipped, Delivered, Cancelled }

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [Self::Pending, Self::Processing, Self::Shipped, Self::Delivered, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|st| st.as_str() == s).ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = UnknownStatus;
    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not a valid choice.")]
pub struct UnknownStatus(pub String);

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub tel: String,
    pub total_prices: Decimal,
    pub account_name: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub shipping_company: Option<String>,
    pub branch: Option<String>,
    pub created_at: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

/// Checkout payload. `total_prices` is stored as supplied by the caller.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewOrder {
    pub user: Uuid,
    #[validate(length(min = 1, max = 20, message = "Ensure this field has no more than 20 characters."))]
    pub tel: String,
    #[validate(custom = "money_amount")]
    pub total_prices: Decimal,
    #[validate(length(max = 100))]
    pub account_name: Option<String>,
    #[validate(length(max = 100))]
    pub province: Option<String>,
    #[validate(length(max = 100))]
    pub district: Option<String>,
    #[validate(length(max = 100))]
    pub shipping_company: Option<String>,
    #[validate(length(max = 100))]
    pub branch: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[validate]
    pub items: Vec<LineItemInput>,
}

impl NewOrder {
    /// Sum of line subtotals; `None` if it overflows.
    pub fn items_total(&self) -> Option<Decimal> { subtotal(self.items.iter().map(|i| (i.quantity, &i.price))) }

    /// Whether the caller-supplied total matches the sum of line subtotals.
    pub fn total_matches_items(&self) -> bool { self.items_total() == Some(self.total_prices) }
}
