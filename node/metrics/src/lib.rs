mod names;

pub use metrics::{counter, gauge, histogram};
pub use names::*;

/// Initializes the Prometheus exporter on `listen` (spec.md §6's `debugger.listen`) and
/// returns a handle to its background task.
pub fn initialize_metrics(listen: std::net::SocketAddr) -> tokio::task::JoinHandle<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let (recorder, exporter) =
        PrometheusBuilder::new().with_http_listener(listen).build().expect("can't build the prometheus exporter");
    metrics::set_boxed_recorder(Box::new(recorder)).expect("can't set the prometheus exporter");

    let metrics_exporter_task = tokio::task::spawn(async move {
        exporter.await.expect("can't await the prometheus exporter");
    });

    for name in names::GAUGE_NAMES {
        metrics::register_gauge!(name);
    }
    for name in names::COUNTER_NAMES {
        metrics::register_counter!(name);
    }
    for name in names::HISTOGRAM_NAMES {
        metrics::register_histogram!(name);
    }

    metrics_exporter_task
}
