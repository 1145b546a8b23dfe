//! Goods aggregate: catalog rows, derived display fields and listing order

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Reverse;
use std::fmt;
use uuid::Uuid;
use crate::domain::value_objects::{format_price, short_address, star_average, truncate_store_name, PriceError, PriceInput};

const NAME_MAX_CHARS: usize = 100;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Goods {
    pub id: Uuid,
    #[serde(rename = "store")]
    pub store_id: Uuid,
    #[serde(skip)]
    pub category_id: Option<Uuid>,
    pub name: String,
    pub price: i64,
    pub is_popular: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct GoodsImage {
    pub id: Uuid,
    #[serde(rename = "goods")]
    pub goods_id: Uuid,
    #[serde(rename = "image")]
    pub url: String,
}

/// A goods row joined with the per-product aggregates the catalog renders.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct GoodsStats {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub price: i64,
    pub is_popular: bool,
    pub created_at: DateTime<Utc>,
    pub category: String,
    pub store_name: String,
    pub store_address: String,
    pub review_count: i64,
    pub star_total: f64,
    pub order_count: i64,
    pub image: Option<String>,
}

impl GoodsStats {
    pub fn star_avg(&self) -> i64 { star_average(self.star_total, self.review_count) }

    pub fn summary(&self) -> GoodsSummary {
        GoodsSummary {
            id: self.id,
            store: self.store_id,
            name: self.name.clone(),
            price: self.price,
            is_popular: self.is_popular,
            category: self.category.clone(),
            store_name: truncate_store_name(&self.store_name),
            star_avg: self.star_avg(),
            format_price: format_price(self.price),
            review_total: self.review_count,
            store_address: short_address(&self.store_address),
            image: self.image.clone(),
        }
    }
}

/// Listing card for one product.
#[derive(Clone, Debug, Serialize)]
pub struct GoodsSummary {
    pub id: Uuid,
    pub store: Uuid,
    pub name: String,
    pub price: i64,
    pub is_popular: bool,
    pub category: String,
    pub store_name: String,
    pub star_avg: i64,
    pub format_price: String,
    pub review_total: i64,
    pub store_address: String,
    pub image: Option<String>,
}

/// Catalog ordering selected by the `sort` query value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Default,
    PriceDesc,
    ReviewCountDesc,
    PriceAsc,
    OrderCountDesc,
    Newest,
    PopularNewest,
}

impl SortKey {
    /// Unknown or missing values fall back to `PriceDesc`.
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("1") => Self::Default,
            Some("2") => Self::PriceDesc,
            Some("3") => Self::ReviewCountDesc,
            Some("4") => Self::PriceAsc,
            Some("5") => Self::OrderCountDesc,
            Some("6") => Self::Newest,
            Some("7") => Self::PopularNewest,
            _ => Self::PriceDesc,
        }
    }

    pub fn arrange(self, mut goods: Vec<GoodsStats>) -> Vec<GoodsStats> {
        match self {
            Self::Default | Self::PriceDesc => goods.sort_by_key(|g| Reverse(g.price)),
            Self::ReviewCountDesc => goods.sort_by_key(|g| Reverse(g.review_count)),
            Self::PriceAsc => goods.sort_by_key(|g| g.price),
            Self::OrderCountDesc => goods.sort_by_key(|g| Reverse(g.order_count)),
            Self::Newest => goods.sort_by_key(|g| Reverse(g.created_at)),
            Self::PopularNewest => {
                goods.retain(|g| g.is_popular);
                goods.sort_by_key(|g| Reverse(g.created_at));
            }
        }
        goods
    }
}

/// Validated field changes for one goods row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GoodsChanges {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub is_popular: Option<bool>,
}

impl GoodsChanges {
    pub fn new(name: Option<&str>, price: Option<&PriceInput>, is_popular: Option<bool>) -> Result<Self, GoodsError> {
        let name = name.map(|n| n.trim().to_string());
        if let Some(n) = &name {
            if n.is_empty() { return Err(GoodsError::MissingName); }
            if n.chars().count() > NAME_MAX_CHARS { return Err(GoodsError::NameTooLong); }
        }
        let price = price.map(PriceInput::normalize).transpose()?;
        Ok(Self { name, price, is_popular })
    }

    /// Changes for a brand new product, where name and price are required.
    pub fn for_new(name: &str, price: &PriceInput, is_popular: Option<bool>) -> Result<(String, i64, bool), GoodsError> {
        let changes = Self::new(Some(name), Some(price), is_popular)?;
        match (changes.name, changes.price) {
            (Some(name), Some(price)) => Ok((name, price, changes.is_popular.unwrap_or(false))),
            _ => Err(GoodsError::MissingName),
        }
    }

    pub fn is_empty(&self) -> bool { self.name.is_none() && self.price.is_none() && self.is_popular.is_none() }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum GoodsError { MissingName, NameTooLong, Price(PriceError) }
impl From<PriceError> for GoodsError { fn from(e: PriceError) -> Self { Self::Price(e) } }
impl std::error::Error for GoodsError {}
impl fmt::Display for GoodsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => write!(f, "Product name is required"),
            Self::NameTooLong => write!(f, "Product name must be at most {NAME_MAX_CHARS} characters"),
            Self::Price(e) => write!(f, "{e}"),
        }
    }
}
