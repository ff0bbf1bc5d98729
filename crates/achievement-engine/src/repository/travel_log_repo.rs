//! 旅行日志仓储
//!
//! 提供 travel_logs 表的写入与按年份、按用户的查询

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::LogStore;
use crate::error::{EngineError, Result};
use crate::models::{NewTravelLog, OtherTraveler, TravelLog};

/// 旅行日志仓储
pub struct TravelLogRepository {
    pool: PgPool,
}

impl TravelLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LogStore for TravelLogRepository {
    /// 写入旅行日志
    ///
    /// 用户不存在时（外键冲突）返回 [`EngineError::UserNotFound`]
    async fn insert_log(&self, log: &NewTravelLog) -> Result<TravelLog> {
        let result = sqlx::query_as::<_, TravelLog>(
            r#"
            INSERT INTO travel_logs (user_id, year_visited, story)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, year_visited, story, created_at
            "#,
        )
        .bind(log.user_id)
        .bind(log.year_visited)
        .bind(&log.story)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(EngineError::UserNotFound(log.user_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_logs_by_user(&self, user_id: i64) -> Result<Vec<TravelLog>> {
        let logs = sqlx::query_as::<_, TravelLog>(
            r#"
            SELECT id, user_id, year_visited, story, created_at
            FROM travel_logs
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn count_logs_by_user(&self, user_id: i64) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM travel_logs WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn list_logs_by_year(&self, year: i64) -> Result<Vec<TravelLog>> {
        let logs = sqlx::query_as::<_, TravelLog>(
            r#"
            SELECT id, user_id, year_visited, story, created_at
            FROM travel_logs
            WHERE year_visited = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    /// 同年旅行者
    ///
    /// 普通的只读查询，不加行锁
    async fn find_other_travelers_in_year(
        &self,
        year: i64,
        excluding_user_id: i64,
    ) -> Result<Vec<OtherTraveler>> {
        let travelers = sqlx::query_as::<_, OtherTraveler>(
            r#"
            SELECT DISTINCT u.id AS user_id, u.display_name
            FROM travel_logs l
            JOIN users u ON u.id = l.user_id
            WHERE l.year_visited = $1 AND l.user_id <> $2
            ORDER BY u.id ASC
            "#,
        )
        .bind(year)
        .bind(excluding_user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(travelers)
    }
}
