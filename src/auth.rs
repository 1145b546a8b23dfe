//! Request identity and capability checks
//!
//! Authentication happens upstream. The gateway forwards the caller as
//! `x-user-id`, `x-user-seller` and `x-user-admin` headers; anything missing
//! or malformed is treated as an anonymous caller.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use uuid::Uuid;
use crate::StoreError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const SELLER_HEADER: &str = "x-user-seller";
pub const ADMIN_HEADER: &str = "x-user-admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub is_seller: bool,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Register and edit goods, modify stores.
    ManageCatalog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DenyReason {
    #[error("Please use after logging in.")]
    Anonymous,
    #[error("You do not have permission to perform this action.")]
    Missing(Capability),
    #[error("Only the store owner can do this.")]
    NotOwner,
}

impl Identity {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let user_id = headers.get(USER_ID_HEADER)?.to_str().ok()?.trim().parse().ok()?;
        Some(Self { user_id, is_seller: flag(headers, SELLER_HEADER), is_admin: flag(headers, ADMIN_HEADER) })
    }

    pub fn can(&self, capability: Capability) -> bool {
        match capability {
            Capability::ManageCatalog => self.is_seller || self.is_admin,
        }
    }
}

fn flag(headers: &HeaderMap, name: &str) -> bool {
    headers.get(name).and_then(|v| v.to_str().ok()).is_some_and(|v| matches!(v.trim(), "1" | "true" | "True"))
}

/// Grants `capability` or says why not. Never fails any other way.
pub fn authorize(identity: Option<&Identity>, capability: Capability) -> Result<&Identity, DenyReason> {
    let identity = identity.ok_or(DenyReason::Anonymous)?;
    if identity.can(capability) { Ok(identity) } else { Err(DenyReason::Missing(capability)) }
}

/// Sellers may only act on their own stores; admins on any.
pub fn authorize_owner(identity: &Identity, owner_id: Uuid) -> Result<(), DenyReason> {
    if identity.is_admin || identity.user_id == owner_id { Ok(()) } else { Err(DenyReason::NotOwner) }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = StoreError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Identity::from_headers(&parts.headers).ok_or(StoreError::Denied(DenyReason::Anonymous))
    }
}
