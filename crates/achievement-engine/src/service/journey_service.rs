//! 旅程服务
//!
//! 触发动作的入口：先完成日志写入，再把事件交给徽章引擎。
//! 引擎的任何失败都不会回滚或阻塞已完成的写入。

use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{info, instrument, warn};

use super::dto::{EngineOutcome, JourneyRecorded};
use super::engine::AchievementEngine;
use crate::error::Result;
use crate::models::{EngineEvent, NewTravelLog};
use crate::repository::LogStore;

pub struct JourneyService {
    log_store: Arc<dyn LogStore>,
    engine: Arc<AchievementEngine>,
}

impl JourneyService {
    pub fn new(log_store: Arc<dyn LogStore>, engine: Arc<AchievementEngine>) -> Self {
        Self { log_store, engine }
    }

    /// 记录一条旅行日志并评估徽章
    ///
    /// 只有日志写入失败才会返回错误
    #[instrument(skip(self, log), fields(user_id = log.user_id, year_visited = log.year_visited))]
    pub async fn record_journey(&self, log: NewTravelLog) -> Result<JourneyRecorded> {
        // 写入前统计，为 0 即首篇；并发提交时可能多个都判为首篇，由账本去重
        let is_users_first_log = match self.log_store.count_logs_by_user(log.user_id).await {
            Ok(count) => count == 0,
            Err(e) => {
                warn!(error = %e, "统计用户日志数失败，按非首篇处理");
                false
            }
        };

        let saved = self.log_store.insert_log(&log).await?;
        info!(log_id = saved.id, "旅行日志已保存");

        let outcome = self
            .engine
            .process(EngineEvent::log_created(
                saved.user_id,
                saved.year_visited,
                saved.story.clone(),
                is_users_first_log,
            ))
            .await;

        Ok(JourneyRecorded {
            log: saved,
            outcome,
        })
    }

    /// 登录成功后评估徽章，取用户本地时间的小时
    #[instrument(skip(self))]
    pub async fn record_login(&self, user_id: i64, logged_in_at: DateTime<Local>) -> EngineOutcome {
        self.engine
            .process(EngineEvent::login_at(user_id, logged_in_at))
            .await
    }
}
