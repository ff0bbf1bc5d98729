//! 通知选择器
//!
//! 纯归约，不做任何 I/O。优先级规则：
//! 1. 没有新徽章 → 不通知
//! 2. 包含元徽章 → 展示元徽章，其余新徽章作为"同时解锁"附带
//! 3. 只有一个非元徽章且需要上下文（同年旅伴）→ 附带关联查询结果展示
//! 4. 其他情况 → 展示单个徽章（多个时取优先级最高者，其余附带）

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::BadgeCatalog;
use crate::models::{BadgeDefinition, BadgeId, OtherTraveler};

/// 展示决策
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PresentationDecision {
    NoNotification,
    #[serde(rename_all = "camelCase")]
    Meta {
        badge: BadgeId,
        also_unlocked: Vec<BadgeId>,
    },
    #[serde(rename_all = "camelCase")]
    SharedYear {
        badge: BadgeId,
        co_travelers: Vec<OtherTraveler>,
    },
    #[serde(rename_all = "camelCase")]
    Single {
        badge: BadgeId,
        also_unlocked: Vec<BadgeId>,
    },
}

impl PresentationDecision {
    /// 被展示的徽章
    pub fn badge(&self) -> Option<BadgeId> {
        match self {
            Self::NoNotification => None,
            Self::Meta { badge, .. } | Self::SharedYear { badge, .. } | Self::Single { badge, .. } => {
                Some(*badge)
            }
        }
    }

    /// 被展示徽章的目录条目
    pub fn headline<'a>(&self, catalog: &'a BadgeCatalog) -> Option<&'a BadgeDefinition> {
        self.badge().and_then(|id| catalog.get(id).ok())
    }

    pub fn is_notification(&self) -> bool {
        !matches!(self, Self::NoNotification)
    }
}

/// 选择器的补充输入
#[derive(Debug, Clone, Default)]
pub struct SelectionInput {
    /// 本事件的同年旅行者（仅在本轮次查询成功时存在）
    pub co_travelers: Option<Vec<OtherTraveler>>,
}

/// 通知选择器
#[derive(Debug, Clone, Copy)]
pub struct NotificationSelector {
    meta_badge: Option<BadgeId>,
}

impl NotificationSelector {
    pub fn new(meta_badge: Option<BadgeId>) -> Self {
        Self { meta_badge }
    }

    /// 元徽章由目录的 is_meta 标记决定
    pub fn from_catalog(catalog: &BadgeCatalog) -> Self {
        Self::new(catalog.meta_badge())
    }

    pub fn select(
        &self,
        newly_earned: &BTreeSet<BadgeId>,
        input: SelectionInput,
    ) -> PresentationDecision {
        if newly_earned.is_empty() {
            return PresentationDecision::NoNotification;
        }

        if let Some(meta) = self.meta_badge.filter(|m| newly_earned.contains(m)) {
            return PresentationDecision::Meta {
                badge: meta,
                also_unlocked: newly_earned.iter().copied().filter(|b| *b != meta).collect(),
            };
        }

        let mut regular = newly_earned.iter().copied();
        let Some(top) = regular.next() else {
            return PresentationDecision::NoNotification;
        };
        let rest: Vec<BadgeId> = regular.collect();

        if rest.is_empty() && top.requires_context() {
            return PresentationDecision::SharedYear {
                badge: top,
                co_travelers: input.co_travelers.unwrap_or_default(),
            };
        }

        PresentationDecision::Single {
            badge: top,
            also_unlocked: rest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[BadgeId]) -> BTreeSet<BadgeId> {
        ids.iter().copied().collect()
    }

    fn selector() -> NotificationSelector {
        NotificationSelector::from_catalog(&BadgeCatalog::standard())
    }

    #[test]
    fn test_empty_set_has_no_notification() {
        let decision = selector().select(&BTreeSet::new(), SelectionInput::default());
        assert_eq!(decision, PresentationDecision::NoNotification);
        assert!(!decision.is_notification());
    }

    #[test]
    fn test_meta_badge_wins_and_lists_the_rest() {
        let decision = selector().select(
            &set(&[
                BadgeId::MultiBadgeMeta,
                BadgeId::ExactHundredWords,
                BadgeId::FirstJourney,
            ]),
            SelectionInput::default(),
        );
        assert_eq!(
            decision,
            PresentationDecision::Meta {
                badge: BadgeId::MultiBadgeMeta,
                also_unlocked: vec![BadgeId::FirstJourney, BadgeId::ExactHundredWords],
            }
        );
    }

    #[test]
    fn test_meta_badge_wins_even_with_shared_year() {
        let decision = selector().select(
            &set(&[BadgeId::MultiBadgeMeta, BadgeId::SharedYear]),
            SelectionInput::default(),
        );
        assert_eq!(decision.badge(), Some(BadgeId::MultiBadgeMeta));
    }

    #[test]
    fn test_lone_shared_year_carries_co_travelers() {
        let travelers = vec![OtherTraveler {
            user_id: 3,
            display_name: "Ada".to_string(),
        }];
        let decision = selector().select(
            &set(&[BadgeId::SharedYear]),
            SelectionInput {
                co_travelers: Some(travelers.clone()),
            },
        );
        assert_eq!(
            decision,
            PresentationDecision::SharedYear {
                badge: BadgeId::SharedYear,
                co_travelers: travelers,
            }
        );
    }

    #[test]
    fn test_single_badge() {
        let decision = selector().select(
            &set(&[BadgeId::MidnightWindowLogin]),
            SelectionInput::default(),
        );
        assert_eq!(
            decision,
            PresentationDecision::Single {
                badge: BadgeId::MidnightWindowLogin,
                also_unlocked: vec![],
            }
        );
        let catalog = BadgeCatalog::standard();
        assert_eq!(
            decision.headline(&catalog).map(|d| d.display_name.as_str()),
            Some("Midnight Voyager")
        );
    }

    #[test]
    fn test_several_without_meta_picks_highest_priority() {
        // 元徽章已持有时，同一事件的多个新徽章退化为按优先级展示
        let decision = selector().select(
            &set(&[BadgeId::SharedYear, BadgeId::FirstJourney]),
            SelectionInput::default(),
        );
        assert_eq!(
            decision,
            PresentationDecision::Single {
                badge: BadgeId::FirstJourney,
                also_unlocked: vec![BadgeId::SharedYear],
            }
        );
    }

    #[test]
    fn test_catalog_without_meta_never_presents_meta() {
        let selector = NotificationSelector::new(None);
        let decision = selector.select(
            &set(&[BadgeId::MultiBadgeMeta, BadgeId::FirstJourney]),
            SelectionInput::default(),
        );
        assert!(matches!(decision, PresentationDecision::Single { .. }));
    }

    #[test]
    fn test_decision_serialization() {
        let json = serde_json::to_value(PresentationDecision::Meta {
            badge: BadgeId::MultiBadgeMeta,
            also_unlocked: vec![BadgeId::FirstJourney],
        })
        .unwrap();
        assert_eq!(json["kind"], "META");
        assert_eq!(json["badge"], "multi-badge-meta");
        assert_eq!(json["alsoUnlocked"][0], "first-journey");
    }
}
