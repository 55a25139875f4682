//! # 任务状态管理模块
//!
//! 负责管理编排任务的生命周期记录。
//!
//! ## 设计原则
//!
//! 1. **线程安全**：`Arc<RwLock<..>>`，一个写者多个读者
//! 2. **显式句柄**：进程启动时构造一次，显式传递给后台执行器和轮询边界
//! 3. **快照读取**：读取总是返回副本，不会观察到写入中的记录
//! 4. **终态不可变**：Completed/Failed 之后拒绝任何修改
//! 5. **可观测**：状态变更通过广播事件通知

pub mod registry;
pub mod retention;
pub mod transitions;
pub mod types;

pub use registry::{TaskRegistry, TaskStore};
pub use retention::{spawn_sweeper, RetentionPolicy};
pub use transitions::{TaskTransition, TransitionError};
pub use types::{Task, TaskError, TaskEvent, TaskStats, TaskStatus};
