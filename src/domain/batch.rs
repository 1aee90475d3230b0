// ==========================================
// 商品导入暂存系统 - 批量导入结果
// ==========================================

use serde::{Deserialize, Serialize};

/// 行级问题类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowIssueKind {
    /// SKU 为空
    MissingSku,
    /// SKU 格式无效
    InvalidSku,
    /// 已存在于商品目录
    DuplicateInCatalog,
    /// 已存在于暂存区（本会话或其他会话，含本批次先前行）
    DuplicateInStaging,
}

impl RowIssueKind {
    /// 计入 skipped（否则计入 failed）
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            RowIssueKind::DuplicateInCatalog | RowIssueKind::DuplicateInStaging
        )
    }
}

/// 行级问题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowIssue {
    pub row_number: usize,
    pub sku: String,
    pub kind: RowIssueKind,
    pub message: String,
}

/// 批量导入结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchImportOutcome {
    pub session_id: i64,
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub created_ids: Vec<i64>,
    pub errors: Vec<RowIssue>,
}
