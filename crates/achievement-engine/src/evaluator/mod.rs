//! 条件评估器
//!
//! 每个徽章对应一个无副作用的评估器，输入类型化事件，输出是否满足条件。
//! 评估器只能通过 [`EvaluationContext`] 读取关联查询，不具备任何写权限，
//! 因此可以安全地重复执行或推测执行。
//!
//! ## 模块结构
//!
//! - `conditions`: 内置评估器与元徽章规则
//! - `registry`: 评估器注册表

mod conditions;
mod registry;

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::correlation::CorrelationQuery;
use crate::error::Result;
use crate::models::{BadgeId, EngineEvent, EventKind, OtherTraveler};

pub use conditions::{
    ExactWordCountEvaluator, FirstJourneyEvaluator, LoginHourEvaluator, MultiBadgeRule,
    SharedYearEvaluator,
};
pub use registry::{EvaluatorRegistry, EvaluatorRegistryBuilder};

/// 游记词数
///
/// 按连续空白切分并丢弃空词
pub fn count_words(story: &str) -> usize {
    story.split_whitespace().count()
}

/// 条件评估器接口
#[async_trait]
pub trait ConditionEvaluator: Send + Sync {
    /// 评估器对应的徽章
    fn badge_id(&self) -> BadgeId;

    /// 评估器监听的事件类型
    fn triggers(&self) -> &'static [EventKind];

    /// 评估事件是否满足条件
    ///
    /// 事件类型不匹配时返回 `Ok(false)`
    async fn evaluate(&self, event: &EngineEvent, ctx: &EvaluationContext) -> Result<bool>;
}

/// 评估上下文
///
/// 每次评估轮次新建，只暴露只读的关联查询。
/// 同一轮次内对同一 (年份, 用户) 的查询结果会被缓存，
/// 使同年旅伴评估器与通知选择器看到同一份结果。
pub struct EvaluationContext {
    correlation: CorrelationQuery,
    co_travelers: Mutex<HashMap<(i64, i64), Vec<OtherTraveler>>>,
}

impl EvaluationContext {
    pub fn new(correlation: CorrelationQuery) -> Self {
        Self {
            correlation,
            co_travelers: Mutex::new(HashMap::new()),
        }
    }

    /// 查询同年份的其他旅行者
    pub async fn other_travelers_in_year(
        &self,
        year: i64,
        excluding_user_id: i64,
    ) -> Result<Vec<OtherTraveler>> {
        if let Some(cached) = self.observed_co_travelers(year, excluding_user_id) {
            return Ok(cached);
        }

        let travelers = self
            .correlation
            .find_other_travelers_in_year(year, excluding_user_id)
            .await?;

        self.co_travelers
            .lock()
            .insert((year, excluding_user_id), travelers.clone());
        Ok(travelers)
    }

    /// 本轮次中已成功查询过的结果（不会触发新的查询）
    pub fn observed_co_travelers(
        &self,
        year: i64,
        excluding_user_id: i64,
    ) -> Option<Vec<OtherTraveler>> {
        self.co_travelers
            .lock()
            .get(&(year, excluding_user_id))
            .cloned()
    }
}
