// ==========================================
// 生产批次排产核心 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型,转换Repository错误为
//       稳定、对调用方友好的错误种类
// 约束: 存储层故障记录日志后以通用错误返回,
//       不向调用方泄露内部细节
// ==========================================

use crate::engine::splitter::SplitError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入与业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("唯一性冲突: {0}")]
    Conflict(String),

    #[error("无需拆分: units={units} 未超过上限 limit={limit}")]
    NoSplitNeeded { units: i64, limit: i64 },

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 权限错误
    // ==========================================
    #[error("权限不足: {0}")]
    Forbidden(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    /// 存储层故障(细节已写日志,不外泄)
    #[error("存储层故障")]
    StorageError,

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为稳定的业务错误种类
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::UniqueConstraintViolation(msg) => ApiError::Conflict(msg),
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 存储层故障: 记录细节,对外只报通用错误
            RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::LockError(msg)
            | RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => {
                tracing::error!(detail = %msg, "存储层故障");
                ApiError::StorageError
            }

            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 SplitError 转换
// ==========================================
impl From<SplitError> for ApiError {
    fn from(err: SplitError) -> Self {
        match err {
            SplitError::NoSplitNeeded { units, limit } => {
                ApiError::NoSplitNeeded { units, limit }
            }
            SplitError::Config(msg) => {
                tracing::error!(detail = %msg, "拆分配置读取失败");
                ApiError::StorageError
            }
            SplitError::Repository(e) => e.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
