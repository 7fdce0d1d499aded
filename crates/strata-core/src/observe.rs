//! Optional metrics instrumentation for strata.
//!
//! When the `observe` feature is enabled, store operations and pool waits
//! emit counters and histograms via the [`metrics`] crate. A downstream
//! application must install a metrics recorder (e.g. `metrics-exporter-prometheus`)
//! to collect the data.
//!
//! When the feature is **not** enabled every function in this module is a
//! zero-cost no-op.

/// Record a store operation (counter + latency histogram).
///
/// - `strata.store.operations_total` – counter with `op` and `outcome` labels
/// - `strata.store.operation_duration_seconds` – histogram with `op` label
#[inline]
pub fn record_operation(op: &'static str, duration: std::time::Duration, success: bool) {
    #[cfg(feature = "observe")]
    {
        let outcome = if success { "ok" } else { "fail" };
        metrics::counter!("strata.store.operations_total", "op" => op, "outcome" => outcome)
            .increment(1);
        metrics::histogram!("strata.store.operation_duration_seconds", "op" => op)
            .record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (op, duration, success);
    }
}

/// Record how long a caller waited for a pooled connection.
///
/// - `strata.pool.wait_duration_seconds` – histogram
#[inline]
pub fn record_pool_wait(duration: std::time::Duration) {
    #[cfg(feature = "observe")]
    {
        metrics::histogram!("strata.pool.wait_duration_seconds").record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = duration;
    }
}

/// Set the open/idle connection gauges.
///
/// - `strata.pool.open_connections` – gauge
/// - `strata.pool.idle_connections` – gauge
#[inline]
pub fn set_pool_size(open: usize, idle: usize) {
    #[cfg(feature = "observe")]
    {
        metrics::gauge!("strata.pool.open_connections").set(open as f64);
        metrics::gauge!("strata.pool.idle_connections").set(idle as f64);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (open, idle);
    }
}
