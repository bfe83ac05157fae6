use reqwest::Url;

use crate::metrics::{Metric, MetricEvent, MetricEventList};

use super::MetricEventTx;

const INGEST_URL: &str = "https://ingest.mosaic.app/events";

/// Sends events to the Mosaic analytics ingest endpoint.
#[derive(Clone)]
pub struct IngestMetricTx {
    client: reqwest::Client,
    ingest_url: Url,
}

impl Default for IngestMetricTx {
    fn default() -> Self {
        Self::new(INGEST_URL.parse().expect("default ingest url is valid"))
    }
}

impl IngestMetricTx {
    pub fn new(ingest_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            ingest_url,
        }
    }

    async fn push_inner<B: serde::Serialize + ?Sized>(&self, body: &B) -> Result<(), reqwest::Error> {
        _ = self
            .client
            .post(self.ingest_url.clone())
            .json(body)
            .send()
            .await?;
        Ok(())
    }
}

impl MetricEventTx for IngestMetricTx {
    type Error = reqwest::Error;

    async fn push<M: Metric + Send + Sync + 'static>(
        &self,
        ev: MetricEvent<M>,
    ) -> Result<(), Self::Error> {
        self.push_inner(&ev).await
    }

    async fn push_list<M: Metric + Send + Sync + 'static>(
        &self,
        ev: MetricEventList<M>,
    ) -> Result<(), Self::Error> {
        self.push_inner(&ev).await
    }
}
