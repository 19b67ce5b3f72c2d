use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::models::{PriceQuote, ProductRecord, Subscription};
use crate::utils::error::{AppError, Result};

/// Narrow CRUD interface to the persistent store. The core never talks to
/// a database directly; everything goes through this seam so the storage
/// engine stays an external collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_all_products(&self) -> Result<Vec<ProductRecord>>;
    async fn update_price(&self, link_id: &str, price: Decimal) -> Result<()>;
    async fn get_subscriptions_by_link(&self, link_id: &str) -> Result<Vec<String>>;
    async fn get_user_email(&self, user_id: &str) -> Result<Option<String>>;
    async fn get_subscription(&self, user_id: &str, link_id: &str)
        -> Result<Option<Subscription>>;
    async fn create_subscription(&self, user_id: &str, link_id: &str) -> Result<()>;
    async fn delete_subscription(&self, user_id: &str, link_id: &str) -> Result<()>;
    async fn get_product(&self, link_id: &str) -> Result<Option<ProductRecord>>;
    async fn create_product(&self, product: &ProductRecord) -> Result<()>;
    async fn delete_product(&self, link_id: &str) -> Result<()>;
}

/// In-memory reference implementation, used by the CLI and the test suite.
#[derive(Default)]
pub struct MemoryStorage {
    products: RwLock<HashMap<String, ProductRecord>>,
    subscriptions: RwLock<Vec<Subscription>>,
    users: RwLock<HashMap<String, String>>, // user_id -> email
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, user_id: &str, email: &str) {
        self.users
            .write()
            .await
            .insert(user_id.to_string(), email.to_string());
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_all_products(&self) -> Result<Vec<ProductRecord>> {
        Ok(self.products.read().await.values().cloned().collect())
    }

    async fn update_price(&self, link_id: &str, price: Decimal) -> Result<()> {
        let mut products = self.products.write().await;
        let product = products.get_mut(link_id).ok_or_else(|| AppError::NotFound {
            resource: format!("product {}", link_id),
        })?;
        product.price = PriceQuote::Available(price);
        Ok(())
    }

    async fn get_subscriptions_by_link(&self, link_id: &str) -> Result<Vec<String>> {
        Ok(self
            .subscriptions
            .read()
            .await
            .iter()
            .filter(|s| s.link_id == link_id)
            .map(|s| s.user_id.clone())
            .collect())
    }

    async fn get_user_email(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn get_subscription(
        &self,
        user_id: &str,
        link_id: &str,
    ) -> Result<Option<Subscription>> {
        Ok(self
            .subscriptions
            .read()
            .await
            .iter()
            .find(|s| s.user_id == user_id && s.link_id == link_id)
            .cloned())
    }

    async fn create_subscription(&self, user_id: &str, link_id: &str) -> Result<()> {
        let mut subscriptions = self.subscriptions.write().await;
        // Composite unique key, as the relational store enforces
        if subscriptions
            .iter()
            .any(|s| s.user_id == user_id && s.link_id == link_id)
        {
            return Err(AppError::Storage(format!(
                "subscription ({}, {}) already exists",
                user_id, link_id
            )));
        }
        subscriptions.push(Subscription::new(user_id, link_id));
        Ok(())
    }

    async fn delete_subscription(&self, user_id: &str, link_id: &str) -> Result<()> {
        self.subscriptions
            .write()
            .await
            .retain(|s| !(s.user_id == user_id && s.link_id == link_id));
        Ok(())
    }

    async fn get_product(&self, link_id: &str) -> Result<Option<ProductRecord>> {
        Ok(self.products.read().await.get(link_id).cloned())
    }

    async fn create_product(&self, product: &ProductRecord) -> Result<()> {
        self.products
            .write()
            .await
            .insert(product.link_id.clone(), product.clone());
        Ok(())
    }

    async fn delete_product(&self, link_id: &str) -> Result<()> {
        self.products.write().await.remove(link_id);
        Ok(())
    }
}
