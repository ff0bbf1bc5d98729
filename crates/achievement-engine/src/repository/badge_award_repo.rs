//! 徽章授予账本仓储
//!
//! 基于 badge_awards 表的 (user_id, badge_id) 唯一约束实现幂等写入

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::warn;

use super::traits::AwardLedger;
use crate::error::{EngineError, Result};
use crate::models::{AwardOutcome, BadgeAward, BadgeId};

/// 数据库行映射结构
#[derive(FromRow)]
struct BadgeAwardRow {
    user_id: i64,
    badge_id: String,
    earned_at: DateTime<Utc>,
}

/// 徽章授予账本仓储
pub struct BadgeAwardRepository {
    pool: PgPool,
}

impl BadgeAwardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AwardLedger for BadgeAwardRepository {
    /// 幂等插入
    ///
    /// 使用 `ON CONFLICT DO NOTHING`：返回行表示新写入，无返回行表示已持有。
    /// 单条语句完成，并发竞争由唯一约束裁决。
    async fn try_award(
        &self,
        user_id: i64,
        badge_id: BadgeId,
        earned_at: DateTime<Utc>,
    ) -> Result<AwardOutcome> {
        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO badge_awards (user_id, badge_id, earned_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, badge_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(badge_id.as_str())
        .bind(earned_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| EngineError::LedgerWriteFailed {
            user_id,
            badge_id: badge_id.to_string(),
            reason: e.to_string(),
        })?;

        Ok(match inserted {
            Some(_) => AwardOutcome::Inserted,
            None => AwardOutcome::AlreadyOwned,
        })
    }

    /// 列出用户持有的徽章
    ///
    /// 存储中无法识别的徽章键会被跳过并记录警告
    async fn list_awards(&self, user_id: i64) -> Result<Vec<BadgeAward>> {
        let rows = sqlx::query_as::<_, BadgeAwardRow>(
            r#"
            SELECT user_id, badge_id, earned_at
            FROM badge_awards
            WHERE user_id = $1
            ORDER BY earned_at ASC, badge_id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match row.badge_id.parse::<BadgeId>() {
                Ok(badge_id) => Some(BadgeAward {
                    user_id: row.user_id,
                    badge_id,
                    earned_at: row.earned_at,
                }),
                Err(e) => {
                    warn!(user_id = row.user_id, error = %e, "账本中存在未知徽章，已跳过");
                    None
                }
            })
            .collect())
    }

    async fn has_award(&self, user_id: i64, badge_id: BadgeId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM badge_awards WHERE user_id = $1 AND badge_id = $2)",
        )
        .bind(user_id)
        .bind(badge_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
