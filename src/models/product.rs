use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::models::{PriceQuote, Vendor};
use crate::utils::error::{AppError, Result};

/// A product pulled out of a vendor page and tracked for price drops.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    pub title: String,
    pub vendor: Vendor,
    /// Resolved, absolute product page URL.
    pub link: String,
    /// Stable content-derived identifier, see [`link_id_for_url`].
    pub link_id: String,
    pub image_url: String,
    pub price: PriceQuote,
}

impl ProductRecord {
    pub fn new(
        title: String,
        vendor: Vendor,
        link: String,
        image_url: String,
        price: PriceQuote,
    ) -> Result<Self> {
        let link_id = link_id_for_url(&link)?;
        Ok(Self {
            title,
            vendor,
            link,
            link_id,
            image_url,
            price,
        })
    }
}

/// Derive the stable identifier for a product URL.
///
/// The URL is normalized (fragment stripped, trailing slash trimmed) and
/// hashed with SHA-256; the same source URL always yields the same id, so
/// it doubles as the idempotent natural key for subscriptions.
pub fn link_id_for_url(raw: &str) -> Result<String> {
    let mut parsed = Url::parse(raw).map_err(|e| AppError::Parse {
        message: format!("invalid product URL '{}': {}", raw, e),
    })?;
    parsed.set_fragment(None);
    let normalized = parsed.as_str().trim_end_matches('/');

    let digest = Sha256::digest(normalized.as_bytes());
    Ok(format!("{:x}", digest))
}
