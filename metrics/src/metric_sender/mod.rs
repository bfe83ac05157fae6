pub mod ingest;
pub mod mock;

use std::{error::Error, future::Future};

use crate::metrics::{EventSource, Metric, MetricEvent, MetricEventList};

/// Transport for telemetry events. Implementations must never surface
/// failures to the user; callers log and move on.
pub trait MetricEventTx: Send {
    type Error: Error;

    fn push<M: Metric + Send + Sync + 'static>(
        &self,
        ev: MetricEvent<M>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn push_list<M: Metric + Send + Sync + 'static>(
        &self,
        ev: MetricEventList<M>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Stamps outgoing events with their source before handing them to the
/// underlying transport.
#[derive(Clone)]
pub struct MetricTx<Tx> {
    source: EventSource,
    tx: Tx,
}

impl<Tx: MetricEventTx> MetricTx<Tx> {
    pub fn new(source: EventSource, tx: Tx) -> Self {
        Self { source, tx }
    }

    pub async fn push(&self, metric: impl Metric + Send + Sync + 'static) -> Result<(), Tx::Error> {
        self.tx.push(MetricEvent::new(self.source, metric)).await
    }

    pub async fn push_list(
        &self,
        tag: String,
        metrics: Vec<impl Metric + Send + Sync + 'static>,
    ) -> Result<(), Tx::Error> {
        let events = metrics
            .into_iter()
            .map(|m| MetricEvent::new(self.source, m))
            .collect();

        self.tx
            .push_list(MetricEventList::new(self.source, tag, events))
            .await
    }
}
