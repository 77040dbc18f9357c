//! Metrics and tracing instrumentation.
//!
//! With the `metrics` feature the crate records OpenTelemetry instruments
//! exported through Prometheus. With the `tracing` feature the
//! [`tracing_helpers`] constructors build the spans entered around store
//! calls and catalog operations.

#[cfg(feature = "metrics")]
pub use self::otel::{CatalogMetrics, METRICS};

#[cfg(feature = "metrics")]
mod otel {
    use once_cell::sync::Lazy;
    use opentelemetry::{
        global,
        metrics::{Counter, Histogram},
        KeyValue,
    };
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use prometheus::Registry;
    use std::time::Duration;

    pub static METRICS: Lazy<CatalogMetrics> = Lazy::new(CatalogMetrics::init);

    pub struct CatalogMetrics {
        pub registry: Registry,
        pub provider: Option<SdkMeterProvider>,
        pub queries_total: Counter<u64>,
        pub query_errors_total: Counter<u64>,
        pub query_duration: Histogram<f64>,
        pub store_ops_total: Counter<u64>,
        pub store_op_duration: Histogram<f64>,
        pub usage_documents_written: Counter<u64>,
        pub backref_updates_total: Counter<u64>,
        pub blocked_deletes_total: Counter<u64>,
    }

    impl CatalogMetrics {
        pub fn init() -> Self {
            let registry = Registry::new();
            // Exporter failure leaves the global no-op meter in place; instruments still work.
            let provider = match opentelemetry_prometheus::exporter()
                .with_registry(registry.clone())
                .build()
            {
                Ok(exporter) => {
                    let provider = SdkMeterProvider::builder().with_reader(exporter).build();
                    global::set_meter_provider(provider.clone());
                    Some(provider)
                }
                Err(e) => {
                    log::warn!("Failed to build prometheus exporter: {e}");
                    None
                }
            };
            let meter = global::meter("vacuflow");

            let queries_total = meter
                .u64_counter("vacuflow_queries_total")
                .with_description("Total SQL statements executed")
                .build();
            let query_errors_total = meter
                .u64_counter("vacuflow_query_errors_total")
                .with_description("SQL statements that returned an error")
                .build();
            let query_duration = meter
                .f64_histogram("vacuflow_query_duration_seconds")
                .with_description("Duration of SQL statements")
                .build();
            let store_ops_total = meter
                .u64_counter("vacuflow_store_ops_total")
                .with_description("Document store operations by kind and collection")
                .build();
            let store_op_duration = meter
                .f64_histogram("vacuflow_store_op_duration_seconds")
                .with_description("Duration of document store operations")
                .build();
            let usage_documents_written = meter
                .u64_counter("vacuflow_usage_documents_written_total")
                .with_description("Brand and pump type documents rewritten by usage sync")
                .build();
            let backref_updates_total = meter
                .u64_counter("vacuflow_backref_updates_total")
                .with_description("Back-pointer array edits applied")
                .build();
            let blocked_deletes_total = meter
                .u64_counter("vacuflow_blocked_deletes_total")
                .with_description("Deletes refused because the entity is still referenced")
                .build();

            Self {
                registry,
                provider,
                queries_total,
                query_errors_total,
                query_duration,
                store_ops_total,
                store_op_duration,
                usage_documents_written,
                backref_updates_total,
                blocked_deletes_total,
            }
        }

        pub fn record_query_duration(&self, elapsed: Duration) {
            self.queries_total.add(1, &[]);
            self.query_duration.record(elapsed.as_secs_f64(), &[]);
        }

        pub fn record_query_error(&self) {
            self.query_errors_total.add(1, &[]);
        }

        pub fn record_store_op(&self, op: &'static str, collection: &str, elapsed: Duration) {
            let attrs = [
                KeyValue::new("op", op),
                KeyValue::new("collection", collection.to_string()),
            ];
            self.store_ops_total.add(1, &attrs);
            self.store_op_duration.record(elapsed.as_secs_f64(), &attrs);
        }

        pub fn record_usage_write(&self, collection: &str) {
            self.usage_documents_written
                .add(1, &[KeyValue::new("collection", collection.to_string())]);
        }

        pub fn record_backref_update(&self, relation: &'static str) {
            self.backref_updates_total
                .add(1, &[KeyValue::new("relation", relation)]);
        }

        pub fn record_blocked_delete(&self, collection: &str) {
            self.blocked_deletes_total
                .add(1, &[KeyValue::new("collection", collection.to_string())]);
        }
    }
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{info_span, Span};

    pub fn acquire_connection_span() -> Span {
        info_span!("vacuflow.acquire_connection")
    }

    pub fn execute_query_span(query: &str) -> Span {
        // keep statements short in span fields
        let statement: String = query.chars().take(120).collect();
        info_span!("vacuflow.execute_query", db.statement = %statement)
    }

    pub fn store_op_span(op: &'static str, collection: &str) -> Span {
        info_span!("vacuflow.store", op, collection)
    }

    pub fn usage_sync_span(kind: &'static str) -> Span {
        info_span!("vacuflow.usage_sync", kind)
    }

    pub fn relation_span(operation: &'static str, id: &str) -> Span {
        info_span!("vacuflow.relation", operation, id)
    }
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_metrics_record_without_panicking() {
        METRICS.record_query_duration(Duration::from_millis(3));
        METRICS.record_query_error();
        METRICS.record_store_op("find", "brands", Duration::from_micros(40));
        METRICS.record_usage_write("pumptypes");
        METRICS.record_backref_update("customer.businessType");
        METRICS.record_blocked_delete("industries");
    }
}
