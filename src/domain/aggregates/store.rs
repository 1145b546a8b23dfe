//! Store aggregate

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

const STORE_NAME_MAX_CHARS: usize = 15;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Store {
    pub id: Uuid,
    #[serde(rename = "seller")]
    pub seller_id: Uuid,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub company_number: Option<String>,
    pub sub_address: Option<String>,
    pub introduce: Option<String>,
    pub logo1: Option<String>,
    pub logo2: Option<String>,
    pub background_image: Option<String>,
}

/// Store modification payload. Empty values are ignored.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct StorePatch {
    pub store_name: Option<serde_json::Value>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub company_number: Option<String>,
    pub sub_address: Option<String>,
    pub introduce: Option<String>,
    pub logo1: Option<String>,
    pub logo2: Option<String>,
    pub background_image: Option<String>,
}

/// Text columns of a store that a patch may overwrite.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreChanges {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub company_number: Option<String>,
    pub sub_address: Option<String>,
    pub introduce: Option<String>,
}

/// Image slots of a store, each holding an uploaded data URL.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreImages {
    pub logo1: Option<String>,
    pub logo2: Option<String>,
    pub background_image: Option<String>,
}

fn non_empty(v: &Option<String>) -> Option<String> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

impl StorePatch {
    pub fn into_changes(self) -> Result<(StoreChanges, StoreImages), StoreRuleError> {
        if self.store_name.is_some() { return Err(StoreRuleError::NameImmutable); }
        let changes = StoreChanges {
            name: non_empty(&self.name),
            address: non_empty(&self.address),
            phone: non_empty(&self.phone),
            company_number: non_empty(&self.company_number),
            sub_address: non_empty(&self.sub_address),
            introduce: non_empty(&self.introduce),
        };
        if changes.name.as_ref().is_some_and(|n| n.chars().count() > STORE_NAME_MAX_CHARS) {
            return Err(StoreRuleError::NameTooLong);
        }
        let images = StoreImages {
            logo1: non_empty(&self.logo1),
            logo2: non_empty(&self.logo2),
            background_image: non_empty(&self.background_image),
        };
        Ok((changes, images))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum StoreRuleError { NameImmutable, NameTooLong }
impl std::error::Error for StoreRuleError {}
impl fmt::Display for StoreRuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameImmutable => write!(f, "The store name cannot be changed."),
            Self::NameTooLong => write!(f, "Please write your store name in {STORE_NAME_MAX_CHARS} characters or less."),
        }
    }
}
