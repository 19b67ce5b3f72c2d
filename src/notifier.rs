use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::mailer::Mailer;
use crate::models::ProductRecord;
use crate::storage::Storage;
use crate::utils::error::Result;

/// Fans a price-drop event out to the product's subscribers, one email per
/// distinct address.
pub struct Notifier {
    storage: Arc<dyn Storage>,
    mailer: Arc<dyn Mailer>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotifySummary {
    /// Distinct email addresses resolved for the event.
    pub recipients: usize,
    pub sent: usize,
    pub failed: usize,
}

impl Notifier {
    pub fn new(storage: Arc<dyn Storage>, mailer: Arc<dyn Mailer>) -> Self {
        Self { storage, mailer }
    }

    /// Notify every subscriber of `product` about `new_price`.
    ///
    /// Failures are isolated per recipient: a user whose email cannot be
    /// resolved, or whose send fails, is logged and skipped without
    /// affecting the rest of the fan-out. Sends are never retried here.
    pub async fn notify(&self, product: &ProductRecord, new_price: Decimal) -> Result<NotifySummary> {
        let user_ids = self
            .storage
            .get_subscriptions_by_link(&product.link_id)
            .await?;
        if user_ids.is_empty() {
            // Should not happen for a product mid-check, but is handled
            warn!(link_id = %product.link_id, "price drop on product with no subscribers");
            return Ok(NotifySummary::default());
        }

        // Exactly one email per distinct address per event, even when
        // several subscriptions resolve to the same inbox
        let mut seen = HashSet::new();
        let mut recipients = Vec::new();
        for user_id in &user_ids {
            match self.storage.get_user_email(user_id).await {
                Ok(Some(email)) => {
                    if seen.insert(email.clone()) {
                        recipients.push(email);
                    }
                }
                Ok(None) => warn!(%user_id, "subscriber has no resolvable email"),
                Err(e) => warn!(%user_id, "failed to resolve subscriber email: {}", e),
            }
        }

        let subject = "Hurry up! We got a better deal for your product!";
        let body = format!(
            "Great news! We have a lower price of ${} for your {} product {}. Here is your link! {}",
            new_price, product.vendor, product.title, product.link
        );

        let mut summary = NotifySummary {
            recipients: recipients.len(),
            ..Default::default()
        };
        for email in &recipients {
            match self.mailer.send(email, subject, &body).await {
                Ok(()) => summary.sent += 1,
                Err(e) => {
                    warn!(%email, "failed to send price update email: {}", e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            link_id = %product.link_id,
            sent = summary.sent,
            failed = summary.failed,
            "price drop notification dispatched"
        );
        Ok(summary)
    }
}
