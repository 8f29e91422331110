use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (once per process) and describe the
    /// pipeline metrics.
    pub fn init() -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| -> anyhow::Result<PrometheusHandle> {
                let handle = PrometheusBuilder::new().install_recorder()?;
                describe_all();
                Ok(handle)
            })?
            .clone();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe_all() {
    describe_counter!("agent_runs_total", "Pipeline runs started");
    describe_counter!(
        "agent_run_failures_total",
        "Pipeline runs that ended in failure, by stage"
    );
    describe_counter!("agent_feed_items_total", "Items parsed from the feed");
    describe_counter!("agent_feed_errors_total", "Feed retrieval failures");
    describe_counter!("agent_items_kept_total", "Items surviving the filter");
    describe_counter!(
        "agent_model_fallbacks_total",
        "Switches to a fallback model"
    );
    describe_counter!("agent_reports_created_total", "Reports written to the store");
    describe_histogram!("agent_run_ms", Unit::Milliseconds, "End-to-end run duration");
    describe_gauge!(
        "agent_next_scheduled_run_ts",
        Unit::Seconds,
        "Unix time of the next weekly digest"
    );
    describe_histogram!(
        "agent_feed_parse_ms",
        Unit::Milliseconds,
        "Feed XML parse duration"
    );
}
