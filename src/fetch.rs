use std::time::Duration;

use crate::config::ScraperConfig;
use crate::utils::error::Result;

/// HTTP page loader shared by vendor adapters.
///
/// Every request carries its own deadline; a hung vendor page can never
/// stall an entire monitoring batch. No locks are held around calls.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    settle_delay: Duration,
}

impl PageFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        })
    }

    /// Load a page and return its HTML. Non-2xx statuses are errors.
    pub async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// Load a results page, then pause for the configured settle delay so
    /// client-rendered content has caught up and successive vendor requests
    /// are spaced out.
    pub async fn fetch_html_settled(&self, url: &str) -> Result<String> {
        let html = self.fetch_html(url).await?;
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ScraperConfig {
        ScraperConfig {
            base_url: "https://www.amazon.com".to_string(),
            request_timeout: 10,
            settle_delay_ms: 0,
            max_candidates: 30,
            user_agent: "TestAgent/1.0".to_string(),
        }
    }

    #[test]
    fn test_fetcher_creation() {
        assert!(PageFetcher::new(&test_config()).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_error_on_bad_host() {
        let fetcher = PageFetcher::new(&test_config()).unwrap();
        let result = fetcher.fetch_html("http://127.0.0.1:1/nothing-here").await;
        assert!(result.is_err());
    }
}
