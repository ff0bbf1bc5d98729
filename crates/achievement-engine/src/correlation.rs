//! 同年旅行者关联查询
//!
//! 只读查询，不加锁也不写入。与其他用户的并发提交之间没有顺序保证，
//! 属于尽力而为的检查，而非事务性关联。

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::{EngineError, Result};
use crate::models::OtherTraveler;
use crate::repository::LogStore;

/// 关联查询
#[derive(Clone)]
pub struct CorrelationQuery {
    log_store: Arc<dyn LogStore>,
}

impl CorrelationQuery {
    pub fn new(log_store: Arc<dyn LogStore>) -> Self {
        Self { log_store }
    }

    /// 查找在指定年份留有日志的其他用户
    ///
    /// 排除发起用户本人；每位用户只出现一次；按 user_id 升序。
    /// 存储层的任何错误都转换为 [`EngineError::CorrelationQueryFailed`]。
    #[instrument(skip(self))]
    pub async fn find_other_travelers_in_year(
        &self,
        year: i64,
        excluding_user_id: i64,
    ) -> Result<Vec<OtherTraveler>> {
        let mut travelers = self
            .log_store
            .find_other_travelers_in_year(year, excluding_user_id)
            .await
            .map_err(|e| match e {
                EngineError::CorrelationQueryFailed { .. } => e,
                other => EngineError::CorrelationQueryFailed {
                    year,
                    reason: other.to_string(),
                },
            })?;

        travelers.retain(|t| t.user_id != excluding_user_id);
        travelers.sort_by_key(|t| t.user_id);
        travelers.dedup_by_key(|t| t.user_id);

        debug!(year, count = travelers.len(), "同年旅行者查询完成");
        Ok(travelers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockLogStore;

    fn traveler(user_id: i64, name: &str) -> OtherTraveler {
        OtherTraveler {
            user_id,
            display_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_results_are_sorted_deduplicated_and_exclude_actor() {
        let mut store = MockLogStore::new();
        store
            .expect_find_other_travelers_in_year()
            .withf(|year, excluding| *year == 1920 && *excluding == 2)
            .returning(|_, _| {
                Ok(vec![
                    traveler(9, "Zelda"),
                    traveler(2, "Self"),
                    traveler(3, "Ada"),
                    traveler(9, "Zelda"),
                ])
            });

        let query = CorrelationQuery::new(Arc::new(store));
        let result = query.find_other_travelers_in_year(1920, 2).await.unwrap();
        assert_eq!(result, vec![traveler(3, "Ada"), traveler(9, "Zelda")]);
    }

    #[tokio::test]
    async fn test_store_error_becomes_correlation_failure() {
        let mut store = MockLogStore::new();
        store
            .expect_find_other_travelers_in_year()
            .returning(|_, _| Err(EngineError::Database(sqlx::Error::PoolTimedOut)));

        let query = CorrelationQuery::new(Arc::new(store));
        let err = query.find_other_travelers_in_year(-500, 1).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::CorrelationQueryFailed { year: -500, .. }
        ));
    }
}
