//! HTTP服务器状态管理

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use consilium_core::api::AppContext;

/// 应用状态（在所有handlers间共享）
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<AppContext>,
    pub stats: Arc<ServerStats>,
}

impl AppState {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            stats: Arc::new(ServerStats::new()),
        }
    }

    pub fn record_request(&self, endpoint: &'static str) {
        self.stats.record_request(endpoint);
    }

    pub fn record_error(&self) {
        self.stats.record_error();
    }
}

/// 请求计数；计数器无锁，按端点的明细用一把小锁
pub struct ServerStats {
    started: Instant,
    requests_total: AtomicU64,
    errors_total: AtomicU64,
    by_endpoint: Mutex<BTreeMap<&'static str, u64>>,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            requests_total: AtomicU64::new(0),
            errors_total: AtomicU64::new(0),
            by_endpoint: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn record_request(&self, endpoint: &'static str) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        let mut map = self.by_endpoint.lock().unwrap_or_else(|p| p.into_inner());
        *map.entry(endpoint).or_insert(0) += 1;
    }

    pub fn record_error(&self) {
        self.errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn errors_total(&self) -> u64 {
        self.errors_total.load(Ordering::Relaxed)
    }

    pub fn requests_by_endpoint(&self) -> BTreeMap<&'static str, u64> {
        self.by_endpoint
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}
