use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use super::BookingSubmitter;
use crate::booking::BookingSubmission;
use crate::config::BookingApiConfig;

/// Posts confirmed bookings to the DropTruck indent endpoint
pub struct HttpBookingSubmitter {
    client: Client,
    url: String,
}

impl HttpBookingSubmitter {
    pub fn new(config: &BookingApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: config.url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl BookingSubmitter for HttpBookingSubmitter {
    async fn submit(&self, booking: &BookingSubmission) -> Result<()> {
        info!("Sending booking to {}", self.url);

        let response = self
            .client
            .post(&self.url)
            .json(booking)
            .send()
            .await
            .with_context(|| format!("Could not reach {}", self.url))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(anyhow!("Booking API returned {}: {}", status, body));
        }

        info!("Booking sent successfully: {}", body);
        Ok(())
    }
}
