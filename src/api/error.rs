// ==========================================
// 商品导入暂存系统 - API层错误类型
// ==========================================
// 职责: 将 Repository / Importer 错误转换为接口错误
// 约束: 面向用户的摘要经 i18n 生成，不透出原始异常文本
// ==========================================

use crate::i18n::{t, t_with_args};
use crate::importer::error::{ErrorCategory, ImportError};
use crate::repository::error::RepositoryError;
use thiserror::Error;
use tracing::warn;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("SKU 冲突: {0}")]
    DuplicateConflict(String),

    #[error("无效的状态转换: {0}")]
    InvalidStateTransition(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件解析失败: {0}")]
    ParseError(String),

    #[error("批量写入失败: {0}")]
    PersistenceError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("存储操作失败: {0}")]
    StorageError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 面向最终用户的本地化摘要
    ///
    /// 校验类错误附带本系统生成的说明；技术类错误只给出通用摘要
    pub fn user_message(&self) -> String {
        match self {
            ApiError::InvalidInput(detail) | ApiError::ValidationError(detail) => {
                t_with_args("errors.validation", &[("detail", detail.as_str())])
            }
            ApiError::NotFound(detail) => t_with_args("errors.not_found", &[("detail", detail.as_str())]),
            ApiError::DuplicateConflict(_) => t("errors.duplicate"),
            ApiError::InvalidStateTransition(_) => t("errors.invalid_state"),
            ApiError::ParseError(_) => t("errors.parse"),
            ApiError::PersistenceError(_)
            | ApiError::DatabaseTransactionError(_) => t("errors.persistence"),
            ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::StorageError(_)
            | ApiError::InternalError(_)
            | ApiError::Other(_) => t("errors.internal"),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DuplicateConflict(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                // 原始 SQLite 文本只进日志
                warn!(error = %msg, "外键约束违反");
                ApiError::ValidationError(t("errors.reference_missing"))
            }
            RepositoryError::SerializationError { column, message } => {
                ApiError::DatabaseError(format!("JSON 列 {} 无法解析: {}", column, message))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::StorageError(msg) => ApiError::StorageError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换（按错误分类）
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        let message = err.to_string();
        match err.category() {
            ErrorCategory::Validation => match err {
                ImportError::InvalidSessionState(msg) => ApiError::InvalidStateTransition(msg),
                _ => ApiError::ValidationError(message),
            },
            ErrorCategory::Parse => ApiError::ParseError(message),
            ErrorCategory::DuplicateConflict => ApiError::DuplicateConflict(message),
            ErrorCategory::Persistence => ApiError::PersistenceError(message),
            ErrorCategory::Internal => ApiError::InternalError(message),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "StagingProduct".to_string(),
            id: "7".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => assert!(msg.contains("StagingProduct")),
            other => panic!("Expected NotFound, got {:?}", other),
        }

        let api_err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(matches!(api_err, ApiError::DatabaseConnectionError(_)));
    }

    #[test]
    fn test_import_error_conversion_by_category() {
        let api_err: ApiError = ImportError::SkuColumnUnmapped.into();
        assert!(matches!(api_err, ApiError::ValidationError(_)));

        let api_err: ApiError = ImportError::CsvParseError("bad quote".to_string()).into();
        assert!(matches!(api_err, ApiError::ParseError(_)));

        let api_err: ApiError = ImportError::PersistenceError("disk I/O".to_string()).into();
        assert!(matches!(api_err, ApiError::PersistenceError(_)));

        let api_err: ApiError = ImportError::InvalidSessionState("FAILED".to_string()).into();
        assert!(matches!(api_err, ApiError::InvalidStateTransition(_)));
    }

    #[test]
    fn test_foreign_key_violation_hides_sqlite_text() {
        let raw = "FOREIGN KEY constraint failed: pending_product.import_session_id";
        let api_err: ApiError = RepositoryError::ForeignKeyViolation(raw.to_string()).into();

        match &api_err {
            ApiError::ValidationError(detail) => {
                assert!(!detail.contains("FOREIGN KEY"));
                assert!(!detail.is_empty());
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }
        assert!(!api_err.to_string().contains("import_session_id"));
        assert!(!api_err.user_message().contains("FOREIGN KEY"));
    }

    #[test]
    fn test_user_message_hides_raw_text() {
        let err = ApiError::PersistenceError("SQLITE_BUSY: database is locked".to_string());
        assert!(!err.user_message().contains("SQLITE_BUSY"));

        let err = ApiError::ParseError("invalid utf-8 sequence at byte 17".to_string());
        assert!(!err.user_message().contains("byte 17"));
    }
}
