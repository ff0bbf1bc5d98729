//! 引擎触发事件
//!
//! 由调用方根据已提交的状态构造，不持久化

use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};

/// 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    LogCreated,
    UserLoggedIn,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LogCreated => "log_created",
            Self::UserLoggedIn => "user_logged_in",
        }
    }
}

/// 引擎事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineEvent {
    /// 旅行日志已提交
    #[serde(rename_all = "camelCase")]
    LogCreated {
        user_id: i64,
        year_visited: i64,
        story: String,
        /// 调用方给出，引擎不会自行推导
        is_users_first_log: bool,
    },
    /// 用户登录成功
    #[serde(rename_all = "camelCase")]
    UserLoggedIn { user_id: i64, login_hour: u32 },
}

impl EngineEvent {
    pub fn log_created(
        user_id: i64,
        year_visited: i64,
        story: impl Into<String>,
        is_users_first_log: bool,
    ) -> Self {
        Self::LogCreated {
            user_id,
            year_visited,
            story: story.into(),
            is_users_first_log,
        }
    }

    pub fn user_logged_in(user_id: i64, login_hour: u32) -> Self {
        Self::UserLoggedIn {
            user_id,
            login_hour,
        }
    }

    /// 根据服务器本地时间构造登录事件
    pub fn login_at(user_id: i64, at: DateTime<Local>) -> Self {
        Self::user_logged_in(user_id, at.hour())
    }

    pub fn user_id(&self) -> i64 {
        match self {
            Self::LogCreated { user_id, .. } | Self::UserLoggedIn { user_id, .. } => *user_id,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::LogCreated { .. } => EventKind::LogCreated,
            Self::UserLoggedIn { .. } => EventKind::UserLoggedIn,
        }
    }
}
