// ==========================================
// 商品导入暂存系统 - 导入模块错误类型
// ==========================================
// 分类: Validation / Parse / DuplicateConflict / Persistence
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// 阻断步骤推进，不落库
    Validation,
    /// 中止摄取，不返回部分表头/行
    Parse,
    /// 行级软跳过
    DuplicateConflict,
    /// 整批回滚
    Persistence,
    Internal,
}

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 解析错误 =====
    #[error("内容为空: {0}")]
    EmptyContent(String),

    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv/.txt/.xlsx/.xls）")]
    UnsupportedFormat(String),

    #[error("不支持的 MIME 类型: {0}")]
    UnsupportedMimeType(String),

    #[error("文件过大: {size} 字节（上限 {limit} 字节）")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("无法识别的文本编码: {0}")]
    EncodingError(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 校验错误 =====
    #[error("SKU 列未映射")]
    SkuColumnUnmapped,

    #[error("目标字段重复映射: {field}（列 {columns:?}）")]
    DuplicateTargetField { field: String, columns: Vec<usize> },

    #[error("未知目标字段: {0}")]
    UnknownTargetField(String),

    #[error("无效的分隔符: {0}（可选 auto/tab/semicolon/comma/pipe）")]
    InvalidSeparator(String),

    #[error("SKU 列表为空")]
    EmptySkuInput,

    #[error("SKU 格式无效 (行 {row}): {sku}")]
    InvalidSku { row: usize, sku: String },

    #[error("无效的会话状态: {0}")]
    InvalidSessionState(String),

    // ===== 重复冲突 =====
    #[error("SKU 已存在 (行 {row}): {sku}（{location}）")]
    DuplicateSku {
        row: usize,
        sku: String,
        location: String,
    },

    // ===== 持久化错误 =====
    #[error("批量写入失败（已整体回滚）: {0}")]
    PersistenceError(String),

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 错误分类
    pub fn category(&self) -> ErrorCategory {
        match self {
            ImportError::EmptyContent(_)
            | ImportError::FileNotFound(_)
            | ImportError::UnsupportedFormat(_)
            | ImportError::UnsupportedMimeType(_)
            | ImportError::FileTooLarge { .. }
            | ImportError::EncodingError(_)
            | ImportError::FileReadError(_)
            | ImportError::ExcelParseError(_)
            | ImportError::CsvParseError(_) => ErrorCategory::Parse,

            ImportError::SkuColumnUnmapped
            | ImportError::DuplicateTargetField { .. }
            | ImportError::UnknownTargetField(_)
            | ImportError::InvalidSeparator(_)
            | ImportError::EmptySkuInput
            | ImportError::InvalidSku { .. }
            | ImportError::InvalidSessionState(_) => ErrorCategory::Validation,

            ImportError::DuplicateSku { .. } => ErrorCategory::DuplicateConflict,

            ImportError::PersistenceError(_) => ErrorCategory::Persistence,

            ImportError::ConfigReadError { .. }
            | ImportError::InternalError(_)
            | ImportError::Other(_) => ErrorCategory::Internal,
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::PersistenceError(err.to_string())
    }
}

// 实现 From<RepositoryError>
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::PersistenceError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            ImportError::UnsupportedMimeType("image/png".into()).category(),
            ErrorCategory::Parse
        );
        assert_eq!(ImportError::SkuColumnUnmapped.category(), ErrorCategory::Validation);
        assert_eq!(
            ImportError::DuplicateSku {
                row: 3,
                sku: "A1".into(),
                location: "catalog".into()
            }
            .category(),
            ErrorCategory::DuplicateConflict
        );
        assert_eq!(
            ImportError::PersistenceError("locked".into()).category(),
            ErrorCategory::Persistence
        );
    }

    #[test]
    fn test_repository_error_becomes_persistence() {
        let err: ImportError = RepositoryError::LockError("poisoned".into()).into();
        assert_eq!(err.category(), ErrorCategory::Persistence);
    }
}
