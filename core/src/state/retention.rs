//! 终态任务的保留策略

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;

use super::registry::TaskRegistry;

/// 终态任务超过 `max_terminal_age` 后可被清理，但最近的 `keep_recent` 个始终保留。
/// Created/Running 任务永不清理。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_terminal_age: Duration,
    pub keep_recent: usize,
}

impl RetentionPolicy {
    pub fn is_expired(&self, finished_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let age = (now - finished_at).to_std().unwrap_or_default();
        age >= self.max_terminal_age
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_terminal_age: Duration::from_secs(3600),
            keep_recent: 100,
        }
    }
}

/// 启动周期清理任务
pub fn spawn_sweeper(
    registry: TaskRegistry,
    policy: RetentionPolicy,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // 第一次 tick 立即返回
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = registry.sweep(&policy).await;
            if removed > 0 {
                tracing::info!(
                    target: "consilium.registry",
                    removed = removed,
                    "swept expired terminal tasks"
                );
            }
        }
    })
}
