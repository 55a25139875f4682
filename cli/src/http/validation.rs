//! 基础请求验证逻辑
//!
//! 只做请求形状检查；问题为空、未知专家等业务校验由核心 `start` 负责，
//! 这样被拒绝的请求仍然会得到一个可查询的 task_id。

use consilium_core::api::TaskStatus;

use super::models::{HttpServerError, StartConsultationRequest};

pub const MAX_QUESTION_CHARS: usize = 100_000;
pub const MAX_SPECIALISTS_PER_CATEGORY: usize = 32;
pub const MAX_SCOPE_ENTRIES: usize = 256;
pub const DEFAULT_LIST_LIMIT: usize = 50;
pub const MAX_LIST_LIMIT: usize = 500;

pub fn validate_start_request(req: &StartConsultationRequest) -> Result<(), HttpServerError> {
    let chars = req.question.chars().count();
    if chars > MAX_QUESTION_CHARS {
        return Err(HttpServerError::InvalidRequest(format!(
            "Question too long ({chars} chars, max {MAX_QUESTION_CHARS})"
        )));
    }

    for (label, ids) in [
        ("experts", &req.specialists.experts),
        ("counsel", &req.specialists.counsel),
    ] {
        if ids.len() > MAX_SPECIALISTS_PER_CATEGORY {
            return Err(HttpServerError::InvalidRequest(format!(
                "Too many {label} ({}, max {MAX_SPECIALISTS_PER_CATEGORY})",
                ids.len()
            )));
        }
    }

    if let Some(scope) = &req.document_scope {
        if scope.len() > MAX_SCOPE_ENTRIES {
            return Err(HttpServerError::InvalidRequest(format!(
                "Document scope too large ({} entries, max {MAX_SCOPE_ENTRIES})",
                scope.len()
            )));
        }
        if scope.iter().any(|d| d.trim().is_empty()) {
            return Err(HttpServerError::InvalidRequest(
                "Document scope entries cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// 验证task_id格式（仅允许字母数字、下划线、连字符）
pub fn validate_task_id(task_id: &str) -> Result<(), HttpServerError> {
    if task_id.is_empty() || task_id.len() > 128 {
        return Err(HttpServerError::InvalidRequest(format!(
            "Task ID must be 1-128 chars (got {})",
            task_id.len()
        )));
    }
    if !task_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(HttpServerError::InvalidRequest(
            "Task ID can only contain alphanumeric, underscore, and hyphen characters"
                .to_string(),
        ));
    }
    Ok(())
}

pub fn parse_status_filter(raw: Option<&str>) -> Result<Option<TaskStatus>, HttpServerError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<TaskStatus>()
            .map(Some)
            .map_err(HttpServerError::InvalidRequest),
    }
}

pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}
