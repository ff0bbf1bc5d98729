//! 徽章查询服务

use std::sync::Arc;

use tracing::{instrument, warn};

use super::dto::UserBadgeView;
use crate::catalog::BadgeCatalog;
use crate::error::Result;
use crate::repository::AwardLedger;

pub struct BadgeQueryService {
    ledger: Arc<dyn AwardLedger>,
    catalog: Arc<BadgeCatalog>,
}

impl BadgeQueryService {
    pub fn new(ledger: Arc<dyn AwardLedger>, catalog: Arc<BadgeCatalog>) -> Self {
        Self { ledger, catalog }
    }

    /// 用户徽章墙，按获得时间升序
    ///
    /// 目录中已移除的徽章不展示
    #[instrument(skip(self))]
    pub async fn list_user_badges(&self, user_id: i64) -> Result<Vec<UserBadgeView>> {
        let awards = self.ledger.list_awards(user_id).await?;

        Ok(awards
            .into_iter()
            .filter_map(|award| match self.catalog.get(award.badge_id) {
                Ok(definition) => Some(UserBadgeView {
                    definition: definition.clone(),
                    earned_at: award.earned_at,
                }),
                Err(_) => {
                    warn!(badge_id = %award.badge_id, "已授予的徽章不在目录中，跳过展示");
                    None
                }
            })
            .collect())
    }
}
