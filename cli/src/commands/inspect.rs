//! status / result / specialists 子命令

use consilium_core::api::{
    CliError, HttpServerConfig, PollError, SpecialistCategory, SpecialistInfo,
};

use super::ask::render_result;
use crate::client::{ClientError, ConsultationClient};

/// 退出码：结果未就绪
pub const EXIT_NOT_READY: i32 = 3;
/// 退出码：咨询失败（含预检拒绝）
pub const EXIT_CONSULTATION_FAILED: i32 = 30;

/// 本机访问地址；监听 0.0.0.0 时改用回环地址
pub fn default_server_url(cfg: &HttpServerConfig) -> String {
    let host = match cfg.host.trim() {
        "" | "0.0.0.0" => "127.0.0.1",
        "::" => "[::1]",
        h => h,
    };
    format!("http://{}:{}", host, cfg.port)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError::Command(e.to_string()))
}

pub async fn run_status(client: &dyn ConsultationClient, task_id: &str) -> Result<i32, CliError> {
    let view = client.status(task_id).await?;
    println!("{}", to_json(&view)?);
    Ok(0)
}

pub async fn run_result(
    client: &dyn ConsultationClient,
    task_id: &str,
    json: bool,
) -> Result<i32, CliError> {
    match client.result(task_id).await {
        Ok(result) => {
            if json {
                println!("{}", to_json(&result)?);
            } else {
                println!("{}", render_result(&result));
            }
            Ok(0)
        }
        Err(ClientError::Poll(PollError::NotReady {
            status,
            progress_percent,
            ..
        })) => {
            eprintln!("task {task_id} is not ready ({status}, {progress_percent}%)");
            Ok(EXIT_NOT_READY)
        }
        Err(ClientError::Poll(PollError::Failed { message, .. })) => {
            eprintln!("task {task_id} failed: {message}");
            Ok(EXIT_CONSULTATION_FAILED)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn render_catalog(specialists: &[SpecialistInfo]) -> String {
    let mut lines = Vec::new();
    for category in SpecialistCategory::ALL {
        let in_category: Vec<_> = specialists
            .iter()
            .filter(|s| s.category == category)
            .collect();
        lines.push(format!("{} ({}):", category.label(), category.as_str()));
        if in_category.is_empty() {
            lines.push("  (none)".to_string());
        }
        for info in in_category {
            lines.push(format!("  {:<16} {}", info.id, info.display_name));
        }
    }
    lines.join("\n")
}

pub async fn run_specialists(client: &dyn ConsultationClient) -> Result<i32, CliError> {
    let specialists = client.specialists().await?;
    println!("{}", render_catalog(&specialists));
    Ok(0)
}
