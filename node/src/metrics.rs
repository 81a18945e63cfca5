//! # Prometheus Metrics
//!
//! Exposes operational metrics for the escrow node. Scraped by Prometheus
//! at the `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so
//! they do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (prometheus handles wrap `Arc` internally) so it can be
/// shared across request handlers.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total number of insurance products created through this node.
    pub products_created_total: IntCounter,
    /// Total number of accepted investor deposits.
    pub investor_deposits_total: IntCounter,
    /// Total number of accepted insuree premiums.
    pub insuree_deposits_total: IntCounter,
    /// Sum of all deposited base units, both sides.
    pub deposited_amount_total: IntCounter,
    /// Total number of settled claims.
    pub claims_settled_total: IntCounter,
    /// Sum of all settled payout amounts in base units.
    pub paid_out_amount_total: IntCounter,
    /// Number of hosted products not yet in a terminal state.
    pub open_products: IntGauge,
    /// Distribution of individual deposit sizes in base units.
    pub deposit_amount: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("parapool".into()), None)
            .expect("failed to create prometheus registry");

        let products_created_total = IntCounter::new(
            "products_created_total",
            "Total number of insurance products created",
        )
        .expect("metric creation");
        registry
            .register(Box::new(products_created_total.clone()))
            .expect("metric registration");

        let investor_deposits_total = IntCounter::new(
            "investor_deposits_total",
            "Total number of accepted investor deposits",
        )
        .expect("metric creation");
        registry
            .register(Box::new(investor_deposits_total.clone()))
            .expect("metric registration");

        let insuree_deposits_total = IntCounter::new(
            "insuree_deposits_total",
            "Total number of accepted insuree premiums",
        )
        .expect("metric creation");
        registry
            .register(Box::new(insuree_deposits_total.clone()))
            .expect("metric registration");

        let deposited_amount_total = IntCounter::new(
            "deposited_amount_total",
            "Sum of all deposited base units across both sides",
        )
        .expect("metric creation");
        registry
            .register(Box::new(deposited_amount_total.clone()))
            .expect("metric registration");

        let claims_settled_total =
            IntCounter::new("claims_settled_total", "Total number of settled claims")
                .expect("metric creation");
        registry
            .register(Box::new(claims_settled_total.clone()))
            .expect("metric registration");

        let paid_out_amount_total = IntCounter::new(
            "paid_out_amount_total",
            "Sum of all settled payout amounts in base units",
        )
        .expect("metric creation");
        registry
            .register(Box::new(paid_out_amount_total.clone()))
            .expect("metric registration");

        let open_products = IntGauge::new(
            "open_products",
            "Number of hosted products not yet in a terminal state",
        )
        .expect("metric creation");
        registry
            .register(Box::new(open_products.clone()))
            .expect("metric registration");

        let deposit_amount = Histogram::with_opts(
            HistogramOpts::new(
                "deposit_amount",
                "Distribution of individual deposit sizes in base units",
            )
            .buckets(prometheus::exponential_buckets(1.0, 10.0, 10).expect("bucket layout")),
        )
        .expect("metric creation");
        registry
            .register(Box::new(deposit_amount.clone()))
            .expect("metric registration");

        Self {
            registry,
            products_created_total,
            investor_deposits_total,
            insuree_deposits_total,
            deposited_amount_total,
            claims_settled_total,
            paid_out_amount_total,
            open_products,
            deposit_amount,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition
    /// format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
