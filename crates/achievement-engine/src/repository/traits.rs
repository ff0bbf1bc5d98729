//! 仓储 Trait 定义
//!
//! 定义协作方接口，便于引擎依赖抽象而非具体实现，支持 mock 测试

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{AwardOutcome, BadgeAward, BadgeId, NewTravelLog, OtherTraveler, TravelLog};

/// 旅行日志存储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LogStore: Send + Sync {
    async fn insert_log(&self, log: &NewTravelLog) -> Result<TravelLog>;
    async fn list_logs_by_user(&self, user_id: i64) -> Result<Vec<TravelLog>>;
    async fn count_logs_by_user(&self, user_id: i64) -> Result<i64>;
    async fn list_logs_by_year(&self, year: i64) -> Result<Vec<TravelLog>>;

    /// 在指定年份留有日志的其他用户（不含 excluding_user_id）
    async fn find_other_travelers_in_year(
        &self,
        year: i64,
        excluding_user_id: i64,
    ) -> Result<Vec<OtherTraveler>>;
}

/// 徽章授予账本接口
///
/// 实现必须依托存储层真实的 (user_id, badge_id) 唯一约束做原子的"不存在则插入"，
/// 不能是应用层的先读后写。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AwardLedger: Send + Sync {
    /// 尝试授予徽章
    ///
    /// 并发调用同一 (user_id, badge_id) 时恰好一个调用方得到 `Inserted`，
    /// 其余得到 `AlreadyOwned`，不会有调用方因竞争失败而得到错误。
    async fn try_award(
        &self,
        user_id: i64,
        badge_id: BadgeId,
        earned_at: DateTime<Utc>,
    ) -> Result<AwardOutcome>;

    async fn list_awards(&self, user_id: i64) -> Result<Vec<BadgeAward>>;
    async fn has_award(&self, user_id: i64, badge_id: BadgeId) -> Result<bool>;
}
