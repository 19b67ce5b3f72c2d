use std::sync::Arc;

use tracing::info;

use crate::models::ProductRecord;
use crate::storage::Storage;
use crate::utils::error::Result;

/// Subscribe/unsubscribe flows, including the cascade delete that keeps the
/// product table free of listings nobody watches.
pub struct SubscriptionService {
    storage: Arc<dyn Storage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed,
    /// The `(user, product)` pair already exists; a no-op, not an error.
    AlreadySubscribed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    Unsubscribed {
        /// True when this was the last subscription and the product record
        /// was removed as well.
        product_removed: bool,
    },
    NotSubscribed,
}

impl SubscriptionService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Subscribe `user_id` to a product. The product record is created on
    /// the first subscription to its `link_id`.
    pub async fn subscribe(
        &self,
        user_id: &str,
        product: &ProductRecord,
    ) -> Result<SubscribeOutcome> {
        if self
            .storage
            .get_subscription(user_id, &product.link_id)
            .await?
            .is_some()
        {
            return Ok(SubscribeOutcome::AlreadySubscribed);
        }

        self.storage
            .create_subscription(user_id, &product.link_id)
            .await?;

        if self.storage.get_product(&product.link_id).await?.is_none() {
            info!(link_id = %product.link_id, "first subscriber, creating product record");
            self.storage.create_product(product).await?;
        }

        Ok(SubscribeOutcome::Subscribed)
    }

    /// Remove a subscription, and the product itself once nothing references
    /// it anymore.
    ///
    /// The two deletes are sequential, independently committed steps: the
    /// subscription goes first, then remaining references are re-checked,
    /// then the product is conditionally removed. A crash in between can
    /// orphan a product (it merely stops being useful to monitor) but can
    /// never leave a subscription dangling.
    pub async fn unsubscribe(&self, user_id: &str, link_id: &str) -> Result<UnsubscribeOutcome> {
        if self
            .storage
            .get_subscription(user_id, link_id)
            .await?
            .is_none()
        {
            return Ok(UnsubscribeOutcome::NotSubscribed);
        }

        self.storage.delete_subscription(user_id, link_id).await?;

        let remaining = self.storage.get_subscriptions_by_link(link_id).await?;
        if !remaining.is_empty() {
            return Ok(UnsubscribeOutcome::Unsubscribed {
                product_removed: false,
            });
        }

        info!(%link_id, "no subscribers left, removing product record");
        self.storage.delete_product(link_id).await?;
        Ok(UnsubscribeOutcome::Unsubscribed {
            product_removed: true,
        })
    }
}
