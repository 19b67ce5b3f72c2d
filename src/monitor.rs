use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::models::{PriceQuote, ProductRecord};
use crate::notifier::Notifier;
use crate::storage::Storage;
use crate::utils::error::Result;
use crate::vendor::AdapterRegistry;

/// Outcome of checking a single product within a run.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductCheck {
    Unchanged,
    /// The vendor could not produce a price; the stored one is left alone.
    PriceUnavailable,
    Updated { new_price: Decimal },
    /// Strict decrease; the product was marked for notification.
    Dropped { new_price: Decimal },
    SkippedNoAdapter,
    Failed(String),
}

/// Tally of one monitoring run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunReport {
    pub checked: usize,
    pub updated: usize,
    pub price_drops: usize,
    pub unavailable: usize,
    pub skipped: usize,
    pub failures: usize,
    pub emails_sent: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunReport),
    /// A previous run was still in progress when the trigger fired.
    Skipped,
}

struct PriceDrop {
    product: ProductRecord,
    new_price: Decimal,
}

/// Periodic price checker. Loads the product snapshot, re-reads prices
/// through the vendor adapters, persists changes and hands strict
/// decreases to the notifier.
pub struct PriceMonitor {
    storage: Arc<dyn Storage>,
    adapters: Arc<AdapterRegistry>,
    notifier: Notifier,
    config: MonitorConfig,
    // Overlap guard: a run holds this for its whole duration
    run_lock: Mutex<()>,
    stop_requested: AtomicBool,
}

impl PriceMonitor {
    pub fn new(
        storage: Arc<dyn Storage>,
        adapters: Arc<AdapterRegistry>,
        notifier: Notifier,
        config: MonitorConfig,
    ) -> Self {
        Self {
            storage,
            adapters,
            notifier,
            config,
            run_lock: Mutex::new(()),
            stop_requested: AtomicBool::new(false),
        }
    }

    /// Ask the monitor to wind down. The in-flight product batch finishes;
    /// later batches and notification dispatch for unstarted work are not
    /// begun.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    /// One full monitoring pass: snapshot the product set, check each
    /// product, then dispatch notifications for the collected drops.
    ///
    /// Never runs concurrently with itself - if a run is still in progress
    /// the trigger is skipped, so overlapping snapshots cannot produce
    /// duplicate notifications.
    pub async fn run_once(&self) -> Result<RunOutcome> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            warn!("previous monitoring run still in progress, skipping trigger");
            return Ok(RunOutcome::Skipped);
        };

        let products = self.storage.get_all_products().await?;
        info!(products = products.len(), "starting monitoring run");

        let report = self.check_products(products).await;
        info!(?report, "monitoring run finished");
        Ok(RunOutcome::Completed(report))
    }

    /// The check phase over an explicit snapshot. Products are processed in
    /// bounded concurrent batches; the stop flag is consulted between
    /// batches so shutdown never interrupts a product mid-check.
    pub async fn check_products(&self, products: Vec<ProductRecord>) -> RunReport {
        let mut report = RunReport::default();
        let mut drops: Vec<PriceDrop> = Vec::new();

        let batch_size = self.config.max_concurrent_checks.max(1);
        for batch in products.chunks(batch_size) {
            if self.stop_requested.load(Ordering::SeqCst) {
                warn!("stop requested, abandoning remaining product checks");
                break;
            }

            let results =
                futures::future::join_all(batch.iter().map(|p| self.check_one(p))).await;

            for (product, outcome) in batch.iter().zip(results) {
                report.checked += 1;
                match outcome {
                    ProductCheck::Unchanged => {}
                    ProductCheck::PriceUnavailable => report.unavailable += 1,
                    ProductCheck::Updated { .. } => report.updated += 1,
                    ProductCheck::Dropped { new_price } => {
                        report.updated += 1;
                        report.price_drops += 1;
                        drops.push(PriceDrop {
                            product: product.clone(),
                            new_price,
                        });
                    }
                    ProductCheck::SkippedNoAdapter => report.skipped += 1,
                    ProductCheck::Failed(reason) => {
                        warn!(link_id = %product.link_id, "product check failed: {}", reason);
                        report.failures += 1;
                    }
                }
            }
        }

        // Dispatch is decoupled from checking: a notification failure for
        // one product cannot block price updates already persisted
        for drop in drops {
            match self
                .notifier
                .notify(&drop.product, drop.new_price)
                .await
            {
                Ok(summary) => report.emails_sent += summary.sent,
                Err(e) => {
                    error!(
                        link_id = %drop.product.link_id,
                        "notification dispatch failed: {}", e
                    );
                    report.failures += 1;
                }
            }
        }

        report
    }

    async fn check_one(&self, product: &ProductRecord) -> ProductCheck {
        let Some(adapter) = self.adapters.get(product.vendor) else {
            warn!(vendor = %product.vendor, link_id = %product.link_id,
                "no adapter registered for vendor, skipping product");
            return ProductCheck::SkippedNoAdapter;
        };

        let new_price = match adapter.fetch_price(&product.link).await {
            Ok(quote) => quote,
            Err(e) => return ProductCheck::Failed(e.to_string()),
        };

        let Some(new_price) = new_price.as_available() else {
            // Never overwrite a known price with "unavailable"
            debug!(link_id = %product.link_id, "price unavailable, stored value untouched");
            return ProductCheck::PriceUnavailable;
        };

        let stored = product.price.as_available();
        if stored == Some(new_price) {
            return ProductCheck::Unchanged;
        }

        // Any change is persisted unconditionally; only a strict decrease
        // triggers notification
        if let Err(e) = self.storage.update_price(&product.link_id, new_price).await {
            return ProductCheck::Failed(format!("price update failed: {}", e));
        }

        match stored {
            Some(old) if new_price < old => {
                info!(link_id = %product.link_id, %old, %new_price, "price drop detected");
                ProductCheck::Dropped { new_price }
            }
            _ => ProductCheck::Updated { new_price },
        }
    }
}

/// Drives [`PriceMonitor::run_once`] on the configured cron cadence.
pub struct MonitorRunner {
    scheduler: JobScheduler,
    monitor: Arc<PriceMonitor>,
}

impl MonitorRunner {
    pub async fn new(monitor: Arc<PriceMonitor>, check_interval: &str) -> anyhow::Result<Self> {
        let scheduler = JobScheduler::new().await?;

        let job_monitor = Arc::clone(&monitor);
        let job = Job::new_async(check_interval, move |_uuid, _lock| {
            let monitor = Arc::clone(&job_monitor);
            Box::pin(async move {
                if let Err(e) = monitor.run_once().await {
                    error!("monitoring run failed: {}", e);
                }
            })
        })?;
        scheduler.add(job).await?;

        Ok(Self { scheduler, monitor })
    }

    pub async fn start(&mut self) -> anyhow::Result<()> {
        self.scheduler.start().await?;
        info!("price monitor scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> anyhow::Result<()> {
        self.monitor.request_stop();
        self.scheduler.shutdown().await?;
        info!("price monitor scheduler shut down");
        Ok(())
    }
}
