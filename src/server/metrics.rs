//! Prometheus metrics for the conversion webhook
//!
//! - `rabbitmq_conversion_objects_total{from,to,result}` - objects processed
//! - `rabbitmq_conversion_reviews_total{result}` - ConversionReviews answered

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::server::webhook::ObjectOutcome;

/// Label used when the source version of an object could not be resolved
const UNKNOWN_VERSION: &str = "unknown";

pub type SharedMetrics = Arc<ConversionMetrics>;

/// Registry plus the counters the webhook updates
pub struct ConversionMetrics {
    registry: Registry,
    objects: IntCounterVec,
    reviews: IntCounterVec,
}

impl ConversionMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let objects = IntCounterVec::new(
            Opts::new(
                "rabbitmq_conversion_objects_total",
                "RabbitmqCluster objects processed by the conversion webhook",
            ),
            &["from", "to", "result"],
        )?;
        let reviews = IntCounterVec::new(
            Opts::new(
                "rabbitmq_conversion_reviews_total",
                "ConversionReview requests answered",
            ),
            &["result"],
        )?;

        registry.register(Box::new(objects.clone()))?;
        registry.register(Box::new(reviews.clone()))?;

        Ok(Self {
            registry,
            objects,
            reviews,
        })
    }

    pub fn record_object(&self, outcome: &ObjectOutcome) {
        let from = outcome.from.map_or(UNKNOWN_VERSION, |v| v.version());
        self.objects
            .with_label_values(&[from, outcome.to.version(), result_label(outcome.success)])
            .inc();
    }

    pub fn record_review(&self, success: bool) {
        self.reviews
            .with_label_values(&[result_label(success)])
            .inc();
    }

    /// Render all metrics in the Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

fn result_label(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}

/// Create the shared metrics registry
pub fn create_metrics() -> Result<SharedMetrics, prometheus::Error> {
    Ok(Arc::new(ConversionMetrics::new()?))
}

#[cfg(test)]
#[path = "metrics_test.rs"]
mod tests;
