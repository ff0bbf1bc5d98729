//! 徽章引擎错误类型
//!
//! 引擎内部的所有错误都是可恢复的：编排器捕获后降级为"本次未获得徽章"，
//! 不会向触发动作（发布日志、登录）的调用方抛出。

use thiserror::Error;

use achievement_shared::error::InfraError;

/// 徽章引擎错误类型
#[derive(Debug, Error)]
pub enum EngineError {
    // === 目录相关错误 ===
    #[error("未知徽章: {0}")]
    UnknownBadge(String),

    #[error("徽章触发事件不一致: badge_id={badge_id}, catalog=[{catalog}], evaluator=[{evaluator}]")]
    TriggerMismatch {
        badge_id: String,
        catalog: String,
        evaluator: String,
    },

    // === 账本相关错误 ===
    #[error("徽章写入失败: user_id={user_id}, badge_id={badge_id}, reason={reason}")]
    LedgerWriteFailed {
        user_id: i64,
        badge_id: String,
        reason: String,
    },

    // === 关联查询错误 ===
    #[error("同年旅行者查询失败: year={year}, reason={reason}")]
    CorrelationQueryFailed { year: i64, reason: String },

    #[error("操作超时: {operation} ({timeout_ms}ms)")]
    Timeout { operation: String, timeout_ms: u64 },

    // === 日志存储错误 ===
    #[error("用户不存在: {0}")]
    UserNotFound(i64),

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("基础设施错误: {0}")]
    Infra(#[from] InfraError),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 徽章引擎 Result 类型别名
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// 检查是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Database(_) | Self::Timeout { .. } | Self::CorrelationQueryFailed { .. } => true,
            Self::Infra(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// 获取错误码（用于日志与指标标签）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownBadge(_) => "UNKNOWN_BADGE",
            Self::TriggerMismatch { .. } => "TRIGGER_MISMATCH",
            Self::LedgerWriteFailed { .. } => "LEDGER_WRITE_FAILED",
            Self::CorrelationQueryFailed { .. } => "CORRELATION_QUERY_FAILED",
            Self::Timeout { .. } => "TIMEOUT",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Infra(_) => "INFRA_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
