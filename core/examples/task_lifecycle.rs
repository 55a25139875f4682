//! 任务注册表使用示例
//!
//! 演示一个咨询任务从创建到完成的生命周期，以及轮询方看到的状态。

use anyhow::Result;
use consilium_core::api::{
    band_increments, ConsultationRequest, PollingService, SpecialistSelection, TaskEvent,
    TaskRegistry,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // 1. 进程启动时创建一次注册表句柄
    let registry = TaskRegistry::new();
    let polling = PollingService::new(Arc::new(registry.clone()));

    // 2. 后台事件监听
    let mut event_rx = registry.subscribe();
    let listener = tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            match event {
                TaskEvent::Created { task_id, .. } => println!("✓ Task created: {task_id}"),
                TaskEvent::Progress {
                    stage,
                    progress_percent,
                    ..
                } => println!("→ {progress_percent:>3}% {stage}"),
                TaskEvent::Completed { duration_ms, .. } => {
                    println!("✓ Completed in {duration_ms}ms");
                    break;
                }
                TaskEvent::Failed { error, .. } => {
                    println!("✗ Failed: {error}");
                    break;
                }
                TaskEvent::Evicted { .. } => {}
            }
        }
    });

    // 3. 手动模拟编排器的进度上报（两名律师，50 → 80 区间）
    let request = ConsultationRequest::new(
        "Is the non-compete clause enforceable?",
        SpecialistSelection::new(vec![], vec!["labor".into(), "civil".into()]),
    );
    registry.create("demo", request).await?;
    registry.update_progress("demo", "Retrieving document context", 5).await?;
    registry.update_progress("demo", "Retrieved 3 context snippets", 20).await?;
    for (i, percent) in band_increments(2, 50, 80).into_iter().enumerate() {
        registry
            .update_progress("demo", &format!("Counsel checkpoint {i}"), percent as i32)
            .await?;
        let view = polling.status("demo").await?;
        println!("   poll: {:?} {}%", view.status, view.progress_percent);
    }

    // 4. 失败路径：结果不可用时轮询返回相同的错误信息
    registry
        .fail("demo", "compilation error: compiler failed: demo", None)
        .await?;
    if let Err(err) = polling.result("demo").await {
        println!("   result: {err}");
    }

    listener.await?;
    println!("\nStats: {:?}", registry.stats().await);
    Ok(())
}
