//! Query timing and pool gauges.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Times one repository query. Names are static so the label set stays
/// bounded.
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        histogram!("portal_db_query_duration_seconds", "query" => self.query)
            .record(self.start.elapsed().as_secs_f64());
    }
}

/// Snapshot of pool usage, taken when `/metrics` is scraped.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("portal_db_connections_total").set(size as f64);
    gauge!("portal_db_connections_idle").set(idle as f64);
    gauge!("portal_db_connections_active").set(size.saturating_sub(idle) as f64);
}
