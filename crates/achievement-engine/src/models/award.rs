//! 徽章授予记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::badge::BadgeId;

/// 徽章授予记录
///
/// 每个 (user_id, badge_id) 至多一条，创建后不更新也不删除
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeAward {
    pub user_id: i64,
    pub badge_id: BadgeId,
    pub earned_at: DateTime<Utc>,
}

/// 账本写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AwardOutcome {
    /// 本次调用新写入
    Inserted,
    /// 用户早已持有（包括并发竞争中落败的一方）
    AlreadyOwned,
}

impl AwardOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::AlreadyOwned => "already_owned",
        }
    }
}
