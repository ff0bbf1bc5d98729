//! 徽章目录
//!
//! 静态的徽章元数据表，与评估器注册表分开维护。
//! 两张表可能漂移，因此启动时通过 [`BadgeCatalog::verify_registry`] 做一致性检查，
//! 运行时查询未知徽章返回 [`EngineError::UnknownBadge`]，由调用方记录并跳过。

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::evaluator::EvaluatorRegistry;
use crate::models::{BadgeDefinition, BadgeId, EventKind};

const ON_LOG_CREATED: &[EventKind] = &[EventKind::LogCreated];
const ON_LOGIN: &[EventKind] = &[EventKind::UserLoggedIn];
const ON_ANY: &[EventKind] = &[EventKind::LogCreated, EventKind::UserLoggedIn];

/// 标准目录条目
///
/// 穷举匹配：新增 BadgeId 变体而未补充元数据会导致编译失败
fn standard_definition(badge_id: BadgeId) -> BadgeDefinition {
    match badge_id {
        BadgeId::FirstJourney => BadgeDefinition::new(
            badge_id,
            "First Journey",
            "Logged your very first trip through time.",
            ON_LOG_CREATED,
        ),
        BadgeId::ExactHundredWords => BadgeDefinition::new(
            badge_id,
            "Centurion Chronicler",
            "Wrote a travel story of exactly one hundred words.",
            ON_LOG_CREATED,
        ),
        BadgeId::MidnightWindowLogin => BadgeDefinition::new(
            badge_id,
            "Midnight Voyager",
            "Signed in during the late-night departure window.",
            ON_LOGIN,
        ),
        BadgeId::SharedYear => BadgeDefinition::new(
            badge_id,
            "Temporal Companion",
            "Visited a year another traveler has also been to.",
            ON_LOG_CREATED,
        ),
        BadgeId::MultiBadgeMeta => BadgeDefinition::new(
            badge_id,
            "Time Prodigy",
            "Unlocked several badges in a single moment.",
            ON_ANY,
        )
        .meta(),
    }
}

/// 徽章目录
#[derive(Debug, Clone)]
pub struct BadgeCatalog {
    definitions: BTreeMap<BadgeId, BadgeDefinition>,
}

impl BadgeCatalog {
    /// 标准目录：包含所有 BadgeId
    pub fn standard() -> Self {
        Self::from_definitions(BadgeId::ALL.into_iter().map(standard_definition))
    }

    /// 自定义目录
    ///
    /// 同一 BadgeId 出现多次时后者覆盖前者
    pub fn from_definitions(definitions: impl IntoIterator<Item = BadgeDefinition>) -> Self {
        let definitions = definitions
            .into_iter()
            .map(|d| (d.badge_id, d))
            .collect();
        Self { definitions }
    }

    /// 只包含指定徽章的标准目录
    pub fn standard_subset(badge_ids: &[BadgeId]) -> Self {
        Self::from_definitions(badge_ids.iter().copied().map(standard_definition))
    }

    /// 查询目录条目
    pub fn get(&self, badge_id: BadgeId) -> Result<&BadgeDefinition> {
        self.definitions
            .get(&badge_id)
            .ok_or_else(|| EngineError::UnknownBadge(badge_id.to_string()))
    }

    /// 按字符串键查询（存储边界使用）
    pub fn get_by_key(&self, key: &str) -> Result<&BadgeDefinition> {
        let badge_id: BadgeId = key.parse()?;
        self.get(badge_id)
    }

    pub fn contains(&self, badge_id: BadgeId) -> bool {
        self.definitions.contains_key(&badge_id)
    }

    /// 目录中的元徽章（若存在）
    pub fn meta_badge(&self) -> Option<BadgeId> {
        self.definitions
            .values()
            .find(|d| d.is_meta)
            .map(|d| d.badge_id)
    }

    /// 是否为元徽章
    pub fn is_meta(&self, badge_id: BadgeId) -> bool {
        self.definitions
            .get(&badge_id)
            .is_some_and(|d| d.is_meta)
    }

    /// 按 BadgeId 顺序列出所有条目
    pub fn definitions(&self) -> impl Iterator<Item = &BadgeDefinition> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// 启动一致性检查
    ///
    /// 注册表引用的每个徽章（含元徽章规则）都必须存在于目录中，
    /// 且评估器监听的事件类型与目录条目的触发签名一致
    pub fn verify_registry(&self, registry: &EvaluatorRegistry) -> Result<()> {
        for badge_id in registry.badge_ids() {
            if !self.contains(badge_id) {
                return Err(EngineError::UnknownBadge(badge_id.to_string()));
            }
        }

        for evaluator in registry.evaluators() {
            let definition = self.get(evaluator.badge_id())?;
            let catalog = trigger_set(definition.triggers);
            let registered = trigger_set(evaluator.triggers());
            if catalog != registered {
                return Err(EngineError::TriggerMismatch {
                    badge_id: definition.badge_id.to_string(),
                    catalog: join_kinds(&catalog),
                    evaluator: join_kinds(&registered),
                });
            }
        }
        debug!(
            catalog_size = self.len(),
            registry_size = registry.badge_ids().len(),
            "徽章目录一致性检查通过"
        );
        Ok(())
    }
}

fn trigger_set(kinds: &[EventKind]) -> BTreeSet<&'static str> {
    kinds.iter().map(|k| k.as_str()).collect()
}

fn join_kinds(kinds: &BTreeSet<&'static str>) -> String {
    kinds.iter().copied().collect::<Vec<_>>().join(", ")
}

impl Default for BadgeCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use achievement_shared::config::EngineConfig;

    #[test]
    fn test_standard_catalog_covers_every_badge() {
        let catalog = BadgeCatalog::standard();
        assert_eq!(catalog.len(), BadgeId::ALL.len());
        for id in BadgeId::ALL {
            assert_eq!(catalog.get(id).unwrap().badge_id, id);
        }
    }

    #[test]
    fn test_meta_badge_is_flagged() {
        let catalog = BadgeCatalog::standard();
        assert_eq!(catalog.meta_badge(), Some(BadgeId::MultiBadgeMeta));
        assert!(catalog.is_meta(BadgeId::MultiBadgeMeta));
        assert!(!catalog.is_meta(BadgeId::SharedYear));
    }

    #[test]
    fn test_unknown_badge_is_recoverable_error() {
        let catalog = BadgeCatalog::standard_subset(&[BadgeId::FirstJourney]);
        let err = catalog.get(BadgeId::SharedYear).unwrap_err();
        assert!(matches!(err, EngineError::UnknownBadge(ref k) if k == "shared-year"));
        assert!(catalog.get_by_key("no-such-badge").is_err());
        assert!(catalog.get_by_key("first-journey").is_ok());
    }

    #[test]
    fn test_catalog_order_is_independent_of_input_order() {
        let forward = BadgeCatalog::standard_subset(&[BadgeId::FirstJourney, BadgeId::SharedYear]);
        let reverse = BadgeCatalog::standard_subset(&[BadgeId::SharedYear, BadgeId::FirstJourney]);
        let a: Vec<_> = forward.definitions().map(|d| d.badge_id).collect();
        let b: Vec<_> = reverse.definitions().map(|d| d.badge_id).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_verify_registry_passes_for_standard_tables() {
        let registry = EvaluatorRegistry::standard(&EngineConfig::default());
        assert!(BadgeCatalog::standard().verify_registry(&registry).is_ok());
    }

    #[test]
    fn test_verify_registry_detects_drift() {
        let registry = EvaluatorRegistry::standard(&EngineConfig::default());
        let catalog = BadgeCatalog::standard_subset(&[
            BadgeId::FirstJourney,
            BadgeId::ExactHundredWords,
            BadgeId::MultiBadgeMeta,
        ]);
        let err = catalog.verify_registry(&registry).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_BADGE");
    }

    #[test]
    fn test_verify_registry_detects_trigger_drift() {
        let registry = EvaluatorRegistry::standard(&EngineConfig::default());
        // first-journey 在目录中被错配为登录触发
        let catalog = BadgeCatalog::from_definitions(
            BadgeId::ALL
                .into_iter()
                .map(standard_definition)
                .chain(std::iter::once(BadgeDefinition::new(
                    BadgeId::FirstJourney,
                    "First Journey",
                    "Logged your very first trip through time.",
                    ON_LOGIN,
                ))),
        );

        let err = catalog.verify_registry(&registry).unwrap_err();
        match err {
            EngineError::TriggerMismatch {
                badge_id,
                catalog,
                evaluator,
            } => {
                assert_eq!(badge_id, "first-journey");
                assert_eq!(catalog, EventKind::UserLoggedIn.as_str());
                assert_eq!(evaluator, EventKind::LogCreated.as_str());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
