//! 内存仓储实现
//!
//! 供嵌入式使用和测试。账本基于 DashMap 的 entry API，
//! 同一键上的"不存在则插入"在分片锁内原子完成，语义与数据库唯一约束一致。

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;

use super::traits::{AwardLedger, LogStore};
use crate::error::{EngineError, Result};
use crate::models::{AwardOutcome, BadgeAward, BadgeId, NewTravelLog, OtherTraveler, TravelLog};

/// 内存旅行日志存储
pub struct InMemoryLogStore {
    users: RwLock<BTreeMap<i64, String>>,
    logs: RwLock<Vec<TravelLog>>,
    next_log_id: AtomicI64,
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            logs: RwLock::new(Vec::new()),
            next_log_id: AtomicI64::new(1),
        }
    }

    /// 注册用户（日志只能写给已注册用户）
    pub fn register_user(&self, user_id: i64, display_name: impl Into<String>) {
        self.users.write().insert(user_id, display_name.into());
    }

    pub fn log_count(&self) -> usize {
        self.logs.read().len()
    }
}

impl Default for InMemoryLogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogStore for InMemoryLogStore {
    async fn insert_log(&self, log: &NewTravelLog) -> Result<TravelLog> {
        if !self.users.read().contains_key(&log.user_id) {
            return Err(EngineError::UserNotFound(log.user_id));
        }

        let record = TravelLog {
            id: self.next_log_id.fetch_add(1, Ordering::SeqCst),
            user_id: log.user_id,
            year_visited: log.year_visited,
            story: log.story.clone(),
            created_at: Utc::now(),
        };
        self.logs.write().push(record.clone());
        Ok(record)
    }

    async fn list_logs_by_user(&self, user_id: i64) -> Result<Vec<TravelLog>> {
        let mut logs: Vec<_> = self
            .logs
            .read()
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(logs)
    }

    async fn count_logs_by_user(&self, user_id: i64) -> Result<i64> {
        let count = self
            .logs
            .read()
            .iter()
            .filter(|l| l.user_id == user_id)
            .count();
        Ok(count as i64)
    }

    async fn list_logs_by_year(&self, year: i64) -> Result<Vec<TravelLog>> {
        Ok(self
            .logs
            .read()
            .iter()
            .filter(|l| l.year_visited == year)
            .cloned()
            .collect())
    }

    async fn find_other_travelers_in_year(
        &self,
        year: i64,
        excluding_user_id: i64,
    ) -> Result<Vec<OtherTraveler>> {
        let user_ids: std::collections::BTreeSet<i64> = self
            .logs
            .read()
            .iter()
            .filter(|l| l.year_visited == year && l.user_id != excluding_user_id)
            .map(|l| l.user_id)
            .collect();

        let users = self.users.read();
        Ok(user_ids
            .into_iter()
            .filter_map(|id| {
                users.get(&id).map(|name| OtherTraveler {
                    user_id: id,
                    display_name: name.clone(),
                })
            })
            .collect())
    }
}

/// 内存徽章授予账本
#[derive(Default)]
pub struct InMemoryAwardLedger {
    awards: DashMap<(i64, BadgeId), DateTime<Utc>>,
}

impl InMemoryAwardLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 账本总行数
    pub fn len(&self) -> usize {
        self.awards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.awards.is_empty()
    }
}

#[async_trait]
impl AwardLedger for InMemoryAwardLedger {
    async fn try_award(
        &self,
        user_id: i64,
        badge_id: BadgeId,
        earned_at: DateTime<Utc>,
    ) -> Result<AwardOutcome> {
        match self.awards.entry((user_id, badge_id)) {
            Entry::Occupied(_) => Ok(AwardOutcome::AlreadyOwned),
            Entry::Vacant(slot) => {
                slot.insert(earned_at);
                Ok(AwardOutcome::Inserted)
            }
        }
    }

    async fn list_awards(&self, user_id: i64) -> Result<Vec<BadgeAward>> {
        let mut awards: Vec<_> = self
            .awards
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .map(|entry| BadgeAward {
                user_id,
                badge_id: entry.key().1,
                earned_at: *entry.value(),
            })
            .collect();
        awards.sort_by(|a, b| a.earned_at.cmp(&b.earned_at).then(a.badge_id.cmp(&b.badge_id)));
        Ok(awards)
    }

    async fn has_award(&self, user_id: i64, badge_id: BadgeId) -> Result<bool> {
        Ok(self.awards.contains_key(&(user_id, badge_id)))
    }
}
