//! Wire types for the catalog upstream.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque catalog identifier. Always non-empty; equality by value.
///
/// The wire form is the bare JSON string, so a `similarids` response
/// deserializes straight into `Vec<ProductId>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct ProductId(String);

impl ProductId {
    /// Build an id from a raw token, rejecting the empty string.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidProductId> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidProductId);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProductId {
    type Error = InvalidProductId;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An empty identifier token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidProductId;

impl fmt::Display for InvalidProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("product id must be a non-empty string")
    }
}

impl std::error::Error for InvalidProductId {}

/// Detail record for one catalog item.
///
/// Only ever materialized from a successful detail fetch; there is no
/// partially-filled form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub id: ProductId,
    pub name: String,
    pub price: Option<f64>,
    pub availability: Option<bool>,
}
