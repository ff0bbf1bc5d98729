//! 内置评估器
//!
//! | 徽章 | 事件 | 规则 |
//! |---|---|---|
//! | first-journey | LogCreated | 调用方标记为用户首条日志 |
//! | exact-hundred-words | LogCreated | 游记恰好 N 个词（默认 100） |
//! | midnight-window-login | UserLoggedIn | 登录小时等于配置值（默认 22） |
//! | shared-year | LogCreated | 至少一位其他用户到访过同一年份 |
//! | multi-badge-meta | 任意 | 同一轮次中至少 N 个其他徽章满足（默认 2） |

use std::collections::BTreeSet;

use async_trait::async_trait;

use super::{ConditionEvaluator, EvaluationContext, count_words};
use crate::error::Result;
use crate::models::{BadgeId, EngineEvent, EventKind};

const ON_LOG_CREATED: &[EventKind] = &[EventKind::LogCreated];
const ON_LOGIN: &[EventKind] = &[EventKind::UserLoggedIn];

/// 首次旅行
pub struct FirstJourneyEvaluator;

#[async_trait]
impl ConditionEvaluator for FirstJourneyEvaluator {
    fn badge_id(&self) -> BadgeId {
        BadgeId::FirstJourney
    }

    fn triggers(&self) -> &'static [EventKind] {
        ON_LOG_CREATED
    }

    async fn evaluate(&self, event: &EngineEvent, _ctx: &EvaluationContext) -> Result<bool> {
        Ok(matches!(
            event,
            EngineEvent::LogCreated {
                is_users_first_log: true,
                ..
            }
        ))
    }
}

/// 精确词数
pub struct ExactWordCountEvaluator {
    target: usize,
}

impl ExactWordCountEvaluator {
    pub fn new(target: usize) -> Self {
        Self { target }
    }
}

#[async_trait]
impl ConditionEvaluator for ExactWordCountEvaluator {
    fn badge_id(&self) -> BadgeId {
        BadgeId::ExactHundredWords
    }

    fn triggers(&self) -> &'static [EventKind] {
        ON_LOG_CREATED
    }

    async fn evaluate(&self, event: &EngineEvent, _ctx: &EvaluationContext) -> Result<bool> {
        match event {
            EngineEvent::LogCreated { story, .. } => Ok(count_words(story) == self.target),
            _ => Ok(false),
        }
    }
}

/// 深夜登录
pub struct LoginHourEvaluator {
    hour: u32,
}

impl LoginHourEvaluator {
    pub fn new(hour: u32) -> Self {
        Self { hour }
    }
}

#[async_trait]
impl ConditionEvaluator for LoginHourEvaluator {
    fn badge_id(&self) -> BadgeId {
        BadgeId::MidnightWindowLogin
    }

    fn triggers(&self) -> &'static [EventKind] {
        ON_LOGIN
    }

    async fn evaluate(&self, event: &EngineEvent, _ctx: &EvaluationContext) -> Result<bool> {
        match event {
            EngineEvent::UserLoggedIn { login_hour, .. } => Ok(*login_hour == self.hour),
            _ => Ok(false),
        }
    }
}

/// 同年旅伴
///
/// 关联查询失败时错误向上返回，由编排器记录并按"未获得"处理
pub struct SharedYearEvaluator;

#[async_trait]
impl ConditionEvaluator for SharedYearEvaluator {
    fn badge_id(&self) -> BadgeId {
        BadgeId::SharedYear
    }

    fn triggers(&self) -> &'static [EventKind] {
        ON_LOG_CREATED
    }

    async fn evaluate(&self, event: &EngineEvent, ctx: &EvaluationContext) -> Result<bool> {
        match event {
            EngineEvent::LogCreated {
                user_id,
                year_visited,
                ..
            } => {
                let travelers = ctx.other_travelers_in_year(*year_visited, *user_id).await?;
                Ok(!travelers.is_empty())
            }
            _ => Ok(false),
        }
    }
}

/// 元徽章规则
///
/// 不是独立评估器：最后执行，只依据本轮次内存中的满足集合，不读取账本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiBadgeRule {
    badge_id: BadgeId,
    threshold: usize,
}

impl MultiBadgeRule {
    pub fn new(badge_id: BadgeId, threshold: usize) -> Self {
        Self {
            badge_id,
            threshold,
        }
    }

    pub fn badge_id(&self) -> BadgeId {
        self.badge_id
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// 本轮次满足条件的其他徽章数是否达到阈值
    pub fn fires(&self, eligible: &BTreeSet<BadgeId>) -> bool {
        eligible.iter().filter(|id| **id != self.badge_id).count() >= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::correlation::CorrelationQuery;
    use crate::models::NewTravelLog;
    use crate::repository::{InMemoryLogStore, LogStore};
    use achievement_shared::test_utils::TestDataGenerator;

    fn empty_context() -> EvaluationContext {
        let store = Arc::new(InMemoryLogStore::new());
        EvaluationContext::new(CorrelationQuery::new(store))
    }

    #[tokio::test]
    async fn test_first_journey_follows_caller_flag() {
        let ctx = empty_context();
        let eval = FirstJourneyEvaluator;

        let first = EngineEvent::log_created(1, 1920, "story", true);
        let later = EngineEvent::log_created(1, 1920, "story", false);
        assert!(eval.evaluate(&first, &ctx).await.unwrap());
        assert!(!eval.evaluate(&later, &ctx).await.unwrap());
        assert!(
            !eval
                .evaluate(&EngineEvent::user_logged_in(1, 22), &ctx)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_exact_word_count_boundaries() {
        let ctx = empty_context();
        let eval = ExactWordCountEvaluator::new(100);

        for (words, expected) in [(99, false), (100, true), (101, false)] {
            let event =
                EngineEvent::log_created(1, 2000, TestDataGenerator::story_with_words(words), false);
            assert_eq!(
                eval.evaluate(&event, &ctx).await.unwrap(),
                expected,
                "{} words",
                words
            );
        }
    }

    #[tokio::test]
    async fn test_exact_word_count_ignores_surrounding_whitespace() {
        let ctx = empty_context();
        let eval = ExactWordCountEvaluator::new(3);
        let event = EngineEvent::log_created(1, 2000, "\n\n  tick   tock\t\tboom   \n", false);
        assert!(eval.evaluate(&event, &ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_login_hour_matches_configured_hour_only() {
        let ctx = empty_context();
        let eval = LoginHourEvaluator::new(22);

        assert!(
            eval.evaluate(&EngineEvent::user_logged_in(1, 22), &ctx)
                .await
                .unwrap()
        );
        for hour in [0, 21, 23] {
            assert!(
                !eval
                    .evaluate(&EngineEvent::user_logged_in(1, hour), &ctx)
                    .await
                    .unwrap()
            );
        }
    }

    #[tokio::test]
    async fn test_shared_year_requires_another_user() {
        let store = Arc::new(InMemoryLogStore::new());
        store.register_user(1, "Ada");
        store.register_user(2, "Grace");
        store
            .insert_log(&NewTravelLog::new(1, 1920, "own log"))
            .await
            .unwrap();

        let ctx = EvaluationContext::new(CorrelationQuery::new(store.clone()));
        let eval = SharedYearEvaluator;

        // 只有自己的日志不算
        let own = EngineEvent::log_created(1, 1920, "again", false);
        assert!(!eval.evaluate(&own, &ctx).await.unwrap());

        let other = EngineEvent::log_created(2, 1920, "hello", false);
        assert!(eval.evaluate(&other, &ctx).await.unwrap());
        assert_eq!(
            ctx.observed_co_travelers(1920, 2).unwrap()[0].display_name,
            "Ada"
        );
    }

    #[test]
    fn test_multi_badge_rule_counts_other_badges() {
        let rule = MultiBadgeRule::new(BadgeId::MultiBadgeMeta, 2);

        let one: BTreeSet<_> = [BadgeId::FirstJourney].into_iter().collect();
        assert!(!rule.fires(&one));

        let two: BTreeSet<_> = [BadgeId::FirstJourney, BadgeId::ExactHundredWords]
            .into_iter()
            .collect();
        assert!(rule.fires(&two));

        // 元徽章自身不计入
        let with_self: BTreeSet<_> = [BadgeId::FirstJourney, BadgeId::MultiBadgeMeta]
            .into_iter()
            .collect();
        assert!(!rule.fires(&with_self));
    }
}
