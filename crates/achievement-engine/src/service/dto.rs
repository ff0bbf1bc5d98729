//! 服务层数据传输对象

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{BadgeDefinition, BadgeId, TravelLog};
use crate::notification::PresentationDecision;

/// 一次评估轮次的结果
///
/// 调用方据此决定如何向用户展示
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOutcome {
    /// 本次新写入账本的徽章（按优先级排序）
    pub newly_earned: Vec<BadgeId>,
    pub presentation: PresentationDecision,
}

impl EngineOutcome {
    pub fn is_empty(&self) -> bool {
        self.newly_earned.is_empty()
    }

    pub fn contains(&self, badge_id: BadgeId) -> bool {
        self.newly_earned.contains(&badge_id)
    }
}

/// 旅行日志记录结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyRecorded {
    pub log: TravelLog,
    pub outcome: EngineOutcome,
}

/// 用户徽章墙条目
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBadgeView {
    pub definition: BadgeDefinition,
    pub earned_at: DateTime<Utc>,
}
