use async_trait::async_trait;

use crate::dialogue::finalizer::Report;
use crate::error::{BotError, Result};

use super::{ReportStore, StoredReport};

/// Reports service client: `POST` to submit, `GET` to list, same URL.
pub struct HttpReportStore {
    client: reqwest::Client,
    reports_url: String,
}

impl HttpReportStore {
    pub fn new(reports_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            reports_url: reports_url.into(),
        }
    }

    pub fn reports_url(&self) -> &str {
        &self.reports_url
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(BotError::Store { status, body })
}

#[async_trait]
impl ReportStore for HttpReportStore {
    async fn submit(&self, report: &Report) -> Result<()> {
        let response = self
            .client
            .post(&self.reports_url)
            .json(report)
            .send()
            .await?;
        check(response).await?;
        tracing::info!(
            "Report stored for flock {} at {}",
            report.flock_id,
            self.reports_url
        );
        Ok(())
    }

    async fn list(&self) -> Result<Vec<StoredReport>> {
        let response = self.client.get(&self.reports_url).send().await?;
        let body = check(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
