//! REST client for the portfolio backend that owns the holdings.

use crate::core::holding::{Holding, HoldingDraft, HoldingStore};
use crate::providers::util::with_retry;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, instrument};

const RETRIES: usize = 3;
const RETRY_DELAY_MS: u64 = 500;

pub struct RestHoldingStore {
    client: Client,
    base_url: String,
}

impl RestHoldingStore {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().user_agent("stockify/0.1").build()?;
        Ok(RestHoldingStore {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/stocks/{}", self.base_url, path)
    }
}

/// The backend expects the id inside the body of an update as well.
#[derive(Serialize)]
struct UpdateBody<'a> {
    id: u64,
    #[serde(flatten)]
    draft: &'a HoldingDraft,
}

async fn check_status(response: Response, id: Option<u64>) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return Err(anyhow!("Holding {id} not found"));
        }
    }
    let body = response.text().await.unwrap_or_default();
    Err(anyhow!("Backend returned {status}: {body}"))
}

#[async_trait]
impl HoldingStore for RestHoldingStore {
    #[instrument(name = "ListHoldings", skip(self))]
    async fn list(&self) -> Result<Vec<Holding>> {
        let url = self.url("all");
        debug!("Requesting holdings from {}", url);
        let response = with_retry(|| self.client.get(&url).send(), RETRIES, RETRY_DELAY_MS)
            .await
            .context("Failed to reach the portfolio backend")?;
        let response = check_status(response, None).await?;
        response
            .json::<Vec<Holding>>()
            .await
            .context("Failed to parse holdings from backend")
    }

    async fn get(&self, id: u64) -> Result<Holding> {
        let url = self.url(&id.to_string());
        let response = with_retry(|| self.client.get(&url).send(), RETRIES, RETRY_DELAY_MS)
            .await
            .with_context(|| format!("Failed to fetch holding {id}"))?;
        let response = check_status(response, Some(id)).await?;
        response
            .json::<Holding>()
            .await
            .with_context(|| format!("Failed to parse holding {id}"))
    }

    async fn create(&self, draft: &HoldingDraft) -> Result<Holding> {
        let response = self
            .client
            .post(self.url("add"))
            .json(draft)
            .send()
            .await
            .context("Failed to add holding")?;
        let response = check_status(response, None).await?;
        response
            .json::<Holding>()
            .await
            .context("Failed to parse created holding")
    }

    async fn update(&self, id: u64, draft: &HoldingDraft) -> Result<Holding> {
        let response = self
            .client
            .put(self.url(&id.to_string()))
            .json(&UpdateBody { id, draft })
            .send()
            .await
            .with_context(|| format!("Failed to update holding {id}"))?;
        let response = check_status(response, Some(id)).await?;
        response
            .json::<Holding>()
            .await
            .with_context(|| format!("Failed to parse updated holding {id}"))
    }

    async fn delete(&self, id: u64) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&id.to_string()))
            .send()
            .await
            .with_context(|| format!("Failed to delete holding {id}"))?;
        check_status(response, Some(id)).await?;
        Ok(())
    }
}
