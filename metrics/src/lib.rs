pub mod metric_sender;
pub mod metrics;

use crate::metric_sender::{ingest::IngestMetricTx, mock::MaybeMockMetricEventTx, MetricTx};
use crate::metrics::EventSource;

/// The sender wiring the client actually ships with: a real ingest sender in
/// production, the mock everywhere else.
pub type ClientMetricTx = MetricTx<MaybeMockMetricEventTx<IngestMetricTx>>;

impl MetricTx<MaybeMockMetricEventTx<IngestMetricTx>> {
    pub fn mock() -> Self {
        MetricTx::new(EventSource::MosaicApp, MaybeMockMetricEventTx::default())
    }

    pub fn ingest(tx: IngestMetricTx) -> Self {
        MetricTx::new(EventSource::MosaicApp, MaybeMockMetricEventTx::Real(tx))
    }
}
