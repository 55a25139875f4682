//! 任务注册表：任务生命周期的唯一数据源
//!
//! 一个写者（正在运行的编排）和多个读者（轮询方）并发访问。
//! 所有修改在同一把写锁内完成读-改-写，读取总是返回快照副本。

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use super::retention::RetentionPolicy;
use super::transitions::{TaskTransition, TransitionError};
use super::types::{Task, TaskError, TaskEvent, TaskStats, TaskStatus};
use crate::error::RegistryError;
use crate::executor::types::{ConsultationRequest, OrchestrationResult};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// 存储接口（create/update_progress/complete/fail/get）
///
/// 多进程部署时可用网络 KV 存储替换内存实现，编排器无需改动。
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, task_id: &str, input: ConsultationRequest) -> Result<Task, RegistryError>;

    /// `progress_percent` 会被截断到 [0, 100]
    async fn update_progress(
        &self,
        task_id: &str,
        stage_description: &str,
        progress_percent: i32,
    ) -> Result<(), RegistryError>;

    async fn complete(&self, task_id: &str, result: OrchestrationResult)
        -> Result<(), RegistryError>;

    async fn fail(
        &self,
        task_id: &str,
        error_message: &str,
        diagnostic: Option<Value>,
    ) -> Result<(), RegistryError>;

    async fn get(&self, task_id: &str) -> Result<Task, RegistryError>;
}

/// 内存任务注册表（进程内共享，克隆代价很低）
#[derive(Clone)]
pub struct TaskRegistry {
    inner: Arc<TaskRegistryInner>,
}

struct TaskRegistryInner {
    tasks: RwLock<HashMap<String, Task>>,
    event_tx: broadcast::Sender<TaskEvent>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(TaskRegistryInner {
                tasks: RwLock::new(HashMap::new()),
                event_tx,
            }),
        }
    }

    /// 订阅任务事件
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.inner.event_tx.subscribe()
    }

    fn emit_event(&self, event: TaskEvent) {
        // 没有订阅者时发送失败是正常的
        let _ = self.inner.event_tx.send(event);
    }

    /// 创建任务
    pub async fn create(
        &self,
        task_id: &str,
        input: ConsultationRequest,
    ) -> Result<Task, RegistryError> {
        let task = {
            let mut tasks = self.inner.tasks.write().await;
            if tasks.contains_key(task_id) {
                return Err(RegistryError::DuplicateTask(task_id.to_string()));
            }
            let task = Task::new(task_id.to_string(), input);
            tasks.insert(task_id.to_string(), task.clone());
            task
        };

        self.emit_event(TaskEvent::Created {
            task_id: task_id.to_string(),
            timestamp: task.created_at,
        });

        Ok(task)
    }

    /// 更新进度；Created 会隐式转为 Running，进度只增不减
    pub async fn update_progress(
        &self,
        task_id: &str,
        stage_description: &str,
        progress_percent: i32,
    ) -> Result<(), RegistryError> {
        let clamped = progress_percent.clamp(0, 100) as u8;
        let (stored, timestamp) = {
            let mut tasks = self.inner.tasks.write().await;
            let task = tasks
                .get_mut(task_id)
                .ok_or_else(|| RegistryError::NotFound(task_id.to_string()))?;
            check_transition(task, TaskStatus::Running)?;

            let now = Utc::now();
            task.status = TaskStatus::Running;
            task.stage_description = Some(stage_description.to_string());
            task.progress_percent = task.progress_percent.max(clamped);
            task.updated_at = now;
            (task.progress_percent, now)
        };

        self.emit_event(TaskEvent::Progress {
            task_id: task_id.to_string(),
            stage: stage_description.to_string(),
            progress_percent: stored,
            timestamp,
        });

        Ok(())
    }

    /// 完成任务（进度置为 100）
    pub async fn complete(
        &self,
        task_id: &str,
        result: OrchestrationResult,
    ) -> Result<(), RegistryError> {
        let (duration_ms, timestamp) = {
            let mut tasks = self.inner.tasks.write().await;
            let task = tasks
                .get_mut(task_id)
                .ok_or_else(|| RegistryError::NotFound(task_id.to_string()))?;
            check_transition(task, TaskStatus::Completed)?;

            let now = Utc::now();
            task.status = TaskStatus::Completed;
            task.progress_percent = 100;
            task.result = Some(result);
            task.error = None;
            task.updated_at = now;
            task.finished_at = Some(now);
            let duration_ms = (now - task.created_at).num_milliseconds().max(0) as u64;
            (duration_ms, now)
        };

        self.emit_event(TaskEvent::Completed {
            task_id: task_id.to_string(),
            duration_ms,
            timestamp,
        });

        Ok(())
    }

    /// 任务失败
    pub async fn fail(
        &self,
        task_id: &str,
        error_message: &str,
        diagnostic: Option<Value>,
    ) -> Result<(), RegistryError> {
        let timestamp = {
            let mut tasks = self.inner.tasks.write().await;
            let task = tasks
                .get_mut(task_id)
                .ok_or_else(|| RegistryError::NotFound(task_id.to_string()))?;
            check_transition(task, TaskStatus::Failed)?;

            let now = Utc::now();
            task.status = TaskStatus::Failed;
            task.result = None;
            task.error = Some(TaskError {
                message: error_message.to_string(),
                diagnostic,
            });
            task.updated_at = now;
            task.finished_at = Some(now);
            now
        };

        self.emit_event(TaskEvent::Failed {
            task_id: task_id.to_string(),
            error: error_message.to_string(),
            timestamp,
        });

        Ok(())
    }

    /// 获取任务快照
    pub async fn get(&self, task_id: &str) -> Result<Task, RegistryError> {
        let tasks = self.inner.tasks.read().await;
        tasks
            .get(task_id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(task_id.to_string()))
    }

    /// 列出任务（按创建时间倒序）
    pub async fn list(&self, status_filter: Option<TaskStatus>, limit: Option<usize>) -> Vec<Task> {
        let tasks = self.inner.tasks.read().await;
        let mut items: Vec<Task> = tasks
            .values()
            .filter(|t| status_filter.map_or(true, |s| t.status == s))
            .cloned()
            .collect();
        drop(tasks);

        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            items.truncate(limit);
        }
        items
    }

    /// 移除任务（编排器从不自动调用）
    pub async fn evict(&self, task_id: &str) -> Result<Task, RegistryError> {
        let removed = {
            let mut tasks = self.inner.tasks.write().await;
            tasks
                .remove(task_id)
                .ok_or_else(|| RegistryError::NotFound(task_id.to_string()))?
        };

        self.emit_event(TaskEvent::Evicted {
            task_id: task_id.to_string(),
            timestamp: Utc::now(),
        });

        Ok(removed)
    }

    /// 获取任务统计
    pub async fn stats(&self) -> TaskStats {
        let tasks = self.inner.tasks.read().await;
        let mut stats = TaskStats::default();

        for task in tasks.values() {
            match task.status {
                TaskStatus::Created => stats.created += 1,
                TaskStatus::Running => stats.running += 1,
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Failed => stats.failed += 1,
            }
        }

        stats
    }

    /// 按保留策略清理终态任务，返回移除数量
    pub async fn sweep(&self, policy: &RetentionPolicy) -> usize {
        let now = Utc::now();
        let removed: Vec<String> = {
            let mut tasks = self.inner.tasks.write().await;

            let mut terminal: Vec<_> = tasks
                .values()
                .filter_map(|t| t.finished_at.map(|at| (t.id.clone(), at)))
                .collect();
            terminal.sort_by(|a, b| b.1.cmp(&a.1));

            let expired: Vec<String> = terminal
                .into_iter()
                .skip(policy.keep_recent)
                .filter(|(_, finished_at)| policy.is_expired(*finished_at, now))
                .map(|(id, _)| id)
                .collect();

            for id in &expired {
                tasks.remove(id);
            }
            expired
        };

        for task_id in &removed {
            self.emit_event(TaskEvent::Evicted {
                task_id: task_id.clone(),
                timestamp: now,
            });
        }

        removed.len()
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for TaskRegistry {
    async fn create(&self, task_id: &str, input: ConsultationRequest) -> Result<Task, RegistryError> {
        TaskRegistry::create(self, task_id, input).await
    }

    async fn update_progress(
        &self,
        task_id: &str,
        stage_description: &str,
        progress_percent: i32,
    ) -> Result<(), RegistryError> {
        TaskRegistry::update_progress(self, task_id, stage_description, progress_percent).await
    }

    async fn complete(
        &self,
        task_id: &str,
        result: OrchestrationResult,
    ) -> Result<(), RegistryError> {
        TaskRegistry::complete(self, task_id, result).await
    }

    async fn fail(
        &self,
        task_id: &str,
        error_message: &str,
        diagnostic: Option<Value>,
    ) -> Result<(), RegistryError> {
        TaskRegistry::fail(self, task_id, error_message, diagnostic).await
    }

    async fn get(&self, task_id: &str) -> Result<Task, RegistryError> {
        TaskRegistry::get(self, task_id).await
    }
}

fn check_transition(task: &Task, to: TaskStatus) -> Result<(), RegistryError> {
    TaskTransition::validate(task.status, to).map_err(|err| match err {
        TransitionError::FromTerminalState { state } => RegistryError::AlreadyTerminal {
            task_id: task.id.clone(),
            status: state,
        },
        TransitionError::InvalidTransition { from, to } => RegistryError::InvalidTransition {
            task_id: task.id.clone(),
            from,
            to,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::types::{ExecutionMetadata, SpecialistSelection};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn request() -> ConsultationRequest {
        ConsultationRequest::new(
            "What is the liability exposure?",
            SpecialistSelection::new(vec!["medical".into()], vec!["labor".into()]),
        )
    }

    fn result() -> OrchestrationResult {
        OrchestrationResult {
            answer: "answer".into(),
            outcomes: vec![],
            context_document_ids: vec![],
            metadata: ExecutionMetadata {
                elapsed_ms: 1,
                categories: vec![],
                retrieval_failed: false,
                compiler: "test".into(),
            },
        }
    }

    #[tokio::test]
    async fn test_create_and_duplicate() {
        let registry = TaskRegistry::new();
        let task = registry.create("t1", request()).await.unwrap();
        assert_eq!(task.status, TaskStatus::Created);
        assert_eq!(task.progress_percent, 0);
        assert_eq!(task.input, request());

        let err = registry.create("t1", request()).await.unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTask("t1".into()));
    }

    #[tokio::test]
    async fn test_progress_clamps_and_never_decreases() {
        let registry = TaskRegistry::new();
        registry.create("t1", request()).await.unwrap();

        registry.update_progress("t1", "retrieving", 20).await.unwrap();
        let task = registry.get("t1").await.unwrap();
        assert_eq!(task.status, TaskStatus::Running);
        assert_eq!(task.progress_percent, 20);

        registry.update_progress("t1", "late update", 10).await.unwrap();
        let task = registry.get("t1").await.unwrap();
        assert_eq!(task.progress_percent, 20);
        assert_eq!(task.stage_description.as_deref(), Some("late update"));

        registry.update_progress("t1", "overflow", 250).await.unwrap();
        assert_eq!(registry.get("t1").await.unwrap().progress_percent, 100);

        let registry = TaskRegistry::new();
        registry.create("t2", request()).await.unwrap();
        registry.update_progress("t2", "negative", -5).await.unwrap();
        assert_eq!(registry.get("t2").await.unwrap().progress_percent, 0);
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let registry = TaskRegistry::new();
        assert_eq!(
            registry.update_progress("missing", "x", 5).await.unwrap_err(),
            RegistryError::NotFound("missing".into())
        );
        assert!(matches!(
            registry.get("missing").await,
            Err(RegistryError::NotFound(_))
        ));
        assert!(registry.complete("missing", result()).await.is_err());
    }

    #[tokio::test]
    async fn test_terminal_states_are_immutable() {
        let registry = TaskRegistry::new();
        registry.create("t1", request()).await.unwrap();
        registry.update_progress("t1", "working", 50).await.unwrap();
        registry.complete("t1", result()).await.unwrap();

        let task = registry.get("t1").await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress_percent, 100);
        assert!(task.is_consistent());
        assert!(task.finished_at.is_some());

        let expected = RegistryError::AlreadyTerminal {
            task_id: "t1".into(),
            status: TaskStatus::Completed,
        };
        assert_eq!(registry.complete("t1", result()).await.unwrap_err(), expected);
        assert_eq!(registry.fail("t1", "late", None).await.unwrap_err(), expected);
        assert_eq!(
            registry.update_progress("t1", "late", 99).await.unwrap_err(),
            expected
        );
    }

    #[tokio::test]
    async fn test_fail_stores_error_and_diagnostic() {
        let registry = TaskRegistry::new();
        registry.create("t1", request()).await.unwrap();
        registry
            .fail("t1", "boom", Some(serde_json::json!({"kind": "compilation"})))
            .await
            .unwrap();

        let task = registry.get("t1").await.unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error_message(), Some("boom"));
        assert_eq!(
            task.error.unwrap().diagnostic,
            Some(serde_json::json!({"kind": "compilation"}))
        );
        assert!(task.result.is_none());
    }

    #[tokio::test]
    async fn test_list_filter_and_stats() {
        let registry = TaskRegistry::new();
        for id in ["a", "b", "c"] {
            registry.create(id, request()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        registry.update_progress("b", "x", 10).await.unwrap();
        registry.fail("c", "nope", None).await.unwrap();

        let all = registry.list(None, None).await;
        let ids: Vec<_> = all.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);

        let running = registry.list(Some(TaskStatus::Running), None).await;
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].id, "b");

        assert_eq!(registry.list(None, Some(2)).await.len(), 2);

        let stats = registry.stats().await;
        assert_eq!(
            stats,
            TaskStats {
                created: 1,
                running: 1,
                completed: 0,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_evict() {
        let registry = TaskRegistry::new();
        registry.create("t1", request()).await.unwrap();
        let removed = registry.evict("t1").await.unwrap();
        assert_eq!(removed.id, "t1");
        assert!(registry.get("t1").await.is_err());
        assert!(registry.evict("t1").await.is_err());
    }

    #[tokio::test]
    async fn test_sweep_keeps_recent_and_active() {
        let registry = TaskRegistry::new();
        for id in ["old-1", "old-2", "old-3"] {
            registry.create(id, request()).await.unwrap();
            registry.fail(id, "x", None).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        registry.create("running", request()).await.unwrap();
        registry.update_progress("running", "x", 40).await.unwrap();

        let policy = RetentionPolicy {
            max_terminal_age: Duration::ZERO,
            keep_recent: 1,
        };
        let removed = registry.sweep(&policy).await;
        assert_eq!(removed, 2);
        assert!(registry.get("old-3").await.is_ok());
        assert!(registry.get("running").await.is_ok());
        assert!(registry.get("old-1").await.is_err());
    }

    #[tokio::test]
    async fn test_event_subscription() {
        let registry = TaskRegistry::new();
        let mut rx = registry.subscribe();

        registry.create("t1", request()).await.unwrap();
        registry.update_progress("t1", "retrieving", 5).await.unwrap();

        match rx.recv().await {
            Ok(TaskEvent::Created { task_id, .. }) => assert_eq!(task_id, "t1"),
            other => panic!("Expected Created event, got {other:?}"),
        }
        match rx.recv().await {
            Ok(TaskEvent::Progress {
                progress_percent, ..
            }) => assert_eq!(progress_percent, 5),
            other => panic!("Expected Progress event, got {other:?}"),
        }
    }
}
