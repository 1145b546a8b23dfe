//! Cart Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Cart {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

/// Line item as submitted by the client. The price is a point-in-time copy
/// and is never re-derived from the product.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct LineItemInput {
    pub id: Option<Uuid>,
    pub product: Uuid,
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[validate(custom = "money_amount")]
    pub price: Decimal,
}

fn default_quantity() -> i32 { 1 }

/// Largest integer part a `NUMERIC(10, 2)` column holds.
const MONEY_INTEGER_LIMIT: i64 = 100_000_000;

/// Accepts amounts that fit `NUMERIC(10, 2)`: at most 8 integer digits and 2 decimal places.
pub fn money_amount(value: &Decimal) -> Result<(), ValidationError> {
    let message = if value.normalize().scale() > 2 {
        "Ensure that there are no more than 2 decimal places."
    } else if value.abs().trunc() >= Decimal::from(MONEY_INTEGER_LIMIT) {
        "Ensure that there are no more than 8 digits before the decimal point."
    } else {
        return Ok(());
    };
    let mut error = ValidationError::new("max_digits");
    error.message = Some(message.into());
    Err(error)
}

/// `None` when the product does not fit in a `Decimal`.
pub fn line_total(quantity: i32, price: Decimal) -> Option<Decimal> { price.checked_mul(Decimal::from(quantity)) }

pub fn subtotal<'a>(lines: impl IntoIterator<Item = (i32, &'a Decimal)>) -> Option<Decimal> {
    lines.into_iter().try_fold(Decimal::ZERO, |acc, (qty, price)| acc.checked_add(line_total(qty, *price)?))
}

/// What an update payload does to one cart line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartChange {
    Replace { item_id: Uuid, product: Uuid, quantity: i32, price: Decimal },
    Append { product: Uuid, quantity: i32, price: Decimal },
}

/// Items carrying an id replace that line in place; the rest are appended.
/// Lines missing from the payload are left untouched.
pub fn plan_update(items: &[LineItemInput]) -> Vec<CartChange> {
    items.iter().map(|i| match i.id {
        Some(item_id) => CartChange::Replace { item_id, product: i.product, quantity: i.quantity, price: i.price },
        None => CartChange::Append { product: i.product, quantity: i.quantity, price: i.price },
    }).collect()
}
