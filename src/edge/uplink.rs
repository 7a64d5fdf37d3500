//! Network link from an edge agent to the aggregation service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{ConfigFetchError, DeliveryError};
use crate::models::Reading;
use crate::thresholds::Thresholds;

// ---

#[async_trait]
pub trait Uplink: Send + Sync {
    // ---
    async fn deliver(&self, reading: &Reading) -> Result<(), DeliveryError>;

    async fn fetch_thresholds(&self) -> Result<Thresholds, ConfigFetchError>;
}

/// HTTP uplink; every call is bounded by the client timeout.
#[derive(Debug, Clone)]
pub struct HttpUplink {
    // ---
    client: Client,
    base_url: String,
}

impl HttpUplink {
    // ---
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        // ---
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Uplink for HttpUplink {
    // ---
    async fn deliver(&self, reading: &Reading) -> Result<(), DeliveryError> {
        // ---
        let url = format!("{}/api/readings", self.base_url);
        self.client
            .post(&url)
            .json(reading)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn fetch_thresholds(&self) -> Result<Thresholds, ConfigFetchError> {
        // ---
        let url = format!("{}/api/config", self.base_url);
        let thresholds: Thresholds = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        thresholds.validate()?;
        Ok(thresholds)
    }
}
