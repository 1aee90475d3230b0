// ==========================================
// 商品导入暂存系统 - 导入会话实体
// ==========================================
// 职责: 一次导入运行的信封（方式/状态/计数/错误日志）
// 红线: 仅由 BatchImportProcessor 修改，本系统不删除会话
// ==========================================

use crate::domain::types::{ImportMethod, SessionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// 非法状态流转
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("无效的会话状态转换: from={from} to={to}")]
pub struct InvalidSessionTransition {
    pub from: SessionStatus,
    pub to: SessionStatus,
}

/// 会话错误日志条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionErrorEntry {
    /// 出错对象标识（SKU、行号或 "session"）
    pub identifier: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

// ==========================================
// ImportSession - 导入会话
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSession {
    /// 数据库主键（未落库时为 0）
    pub id: i64,
    pub uuid: String,
    pub session_name: String,
    pub method: ImportMethod,
    pub status: SessionStatus,

    // ===== 计数器 =====
    pub total_rows: i64,
    pub created_count: i64,
    pub skipped_count: i64,
    pub failed_count: i64,
    pub published_count: i64,

    pub error_log: Vec<SessionErrorEntry>,

    // ===== 审计 =====
    pub imported_by: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 会话统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_rows: i64,
    pub created: i64,
    pub skipped: i64,
    pub failed: i64,
    pub published: i64,
    pub error_count: usize,
}

impl ImportSession {
    /// 新建会话（状态 PARSING）
    pub fn new(method: ImportMethod, imported_by: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            uuid: Uuid::new_v4().to_string(),
            session_name: format!("Import {}", now.format("%Y-%m-%d %H:%M")),
            method,
            status: SessionStatus::Parsing,
            total_rows: 0,
            created_count: 0,
            skipped_count: 0,
            failed_count: 0,
            published_count: 0,
            error_log: Vec::new(),
            imported_by: imported_by.to_string(),
            started_at: Some(now),
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn transition(
        &mut self,
        next: SessionStatus,
        now: DateTime<Utc>,
    ) -> Result<(), InvalidSessionTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidSessionTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    pub fn mark_as_parsing(&mut self, now: DateTime<Utc>) -> Result<(), InvalidSessionTransition> {
        self.transition(SessionStatus::Parsing, now)?;
        self.started_at = Some(now);
        Ok(())
    }

    /// 标记为 READY，并累加本批次计数
    pub fn mark_as_ready(
        &mut self,
        created: i64,
        skipped: i64,
        failed: i64,
        now: DateTime<Utc>,
    ) -> Result<(), InvalidSessionTransition> {
        self.transition(SessionStatus::Ready, now)?;
        self.created_count += created;
        self.skipped_count += skipped;
        self.failed_count += failed;
        Ok(())
    }

    pub fn mark_as_publishing(&mut self, now: DateTime<Utc>) -> Result<(), InvalidSessionTransition> {
        self.transition(SessionStatus::Publishing, now)
    }

    pub fn mark_as_completed(
        &mut self,
        published: i64,
        now: DateTime<Utc>,
    ) -> Result<(), InvalidSessionTransition> {
        self.transition(SessionStatus::Completed, now)?;
        self.published_count = published;
        self.completed_at = Some(now);
        Ok(())
    }

    pub fn mark_as_failed(
        &mut self,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<(), InvalidSessionTransition> {
        self.transition(SessionStatus::Failed, now)?;
        self.add_error("session", message, now);
        self.completed_at = Some(now);
        Ok(())
    }

    pub fn mark_as_cancelled(&mut self, now: DateTime<Utc>) -> Result<(), InvalidSessionTransition> {
        self.transition(SessionStatus::Cancelled, now)?;
        self.completed_at = Some(now);
        Ok(())
    }

    /// 追加错误日志
    pub fn add_error(&mut self, identifier: &str, message: &str, now: DateTime<Utc>) {
        self.error_log.push(SessionErrorEntry {
            identifier: identifier.to_string(),
            message: message.to_string(),
            timestamp: now,
        });
        self.updated_at = now;
    }

    pub fn has_errors(&self) -> bool {
        !self.error_log.is_empty()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            total_rows: self.total_rows,
            created: self.created_count,
            skipped: self.skipped_count,
            failed: self.failed_count,
            published: self.published_count,
            error_count: self.error_log.len(),
        }
    }
}
