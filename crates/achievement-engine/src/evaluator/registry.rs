//! 评估器注册表
//!
//! 与徽章目录分开维护的第二张表：记录哪些徽章有评估逻辑。

use achievement_shared::config::EngineConfig;
use tracing::warn;

use super::conditions::{
    ExactWordCountEvaluator, FirstJourneyEvaluator, LoginHourEvaluator, MultiBadgeRule,
    SharedYearEvaluator,
};
use super::ConditionEvaluator;
use crate::models::{BadgeId, EventKind};

/// 评估器注册表
pub struct EvaluatorRegistry {
    evaluators: Vec<Box<dyn ConditionEvaluator>>,
    meta_rule: Option<MultiBadgeRule>,
}

impl EvaluatorRegistry {
    /// 标准注册表
    ///
    /// 穷举匹配 BadgeId，新增徽章而未注册评估逻辑会导致编译失败
    pub fn standard(config: &EngineConfig) -> Self {
        let mut builder = Self::builder();
        for badge_id in BadgeId::ALL {
            builder = match badge_id {
                BadgeId::FirstJourney => builder.register(FirstJourneyEvaluator),
                BadgeId::ExactHundredWords => {
                    builder.register(ExactWordCountEvaluator::new(config.word_count_target))
                }
                BadgeId::MidnightWindowLogin => {
                    builder.register(LoginHourEvaluator::new(config.night_owl_hour))
                }
                BadgeId::SharedYear => builder.register(SharedYearEvaluator),
                BadgeId::MultiBadgeMeta => {
                    builder.with_meta_rule(MultiBadgeRule::new(badge_id, config.meta_threshold))
                }
            };
        }
        builder.build()
    }

    pub fn builder() -> EvaluatorRegistryBuilder {
        EvaluatorRegistryBuilder::default()
    }

    /// 与事件类型相关的评估器
    pub fn relevant_to(&self, kind: EventKind) -> impl Iterator<Item = &dyn ConditionEvaluator> {
        self.evaluators
            .iter()
            .map(|e| e.as_ref())
            .filter(move |e| e.triggers().contains(&kind))
    }

    pub fn evaluators(&self) -> impl Iterator<Item = &dyn ConditionEvaluator> {
        self.evaluators.iter().map(|e| e.as_ref())
    }

    pub fn meta_rule(&self) -> Option<&MultiBadgeRule> {
        self.meta_rule.as_ref()
    }

    /// 注册表引用的全部徽章（评估器在前，元徽章在后）
    pub fn badge_ids(&self) -> Vec<BadgeId> {
        self.evaluators
            .iter()
            .map(|e| e.badge_id())
            .chain(self.meta_rule.map(|r| r.badge_id()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }
}

/// 注册表构建器
#[derive(Default)]
pub struct EvaluatorRegistryBuilder {
    evaluators: Vec<Box<dyn ConditionEvaluator>>,
    meta_rule: Option<MultiBadgeRule>,
}

impl EvaluatorRegistryBuilder {
    /// 注册评估器
    ///
    /// 同一徽章重复注册时，后注册的替换先注册的
    pub fn register(mut self, evaluator: impl ConditionEvaluator + 'static) -> Self {
        let badge_id = evaluator.badge_id();
        if let Some(pos) = self.evaluators.iter().position(|e| e.badge_id() == badge_id) {
            warn!(badge_id = %badge_id, "评估器重复注册，替换先前的实现");
            self.evaluators.remove(pos);
        }
        self.evaluators.push(Box::new(evaluator));
        self
    }

    pub fn with_meta_rule(mut self, rule: MultiBadgeRule) -> Self {
        self.meta_rule = Some(rule);
        self
    }

    pub fn build(self) -> EvaluatorRegistry {
        EvaluatorRegistry {
            evaluators: self.evaluators,
            meta_rule: self.meta_rule,
        }
    }
}
