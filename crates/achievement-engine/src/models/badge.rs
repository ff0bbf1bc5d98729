//! 徽章标识与目录条目

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::event::EventKind;
use crate::error::EngineError;

/// 徽章标识
///
/// 封闭枚举，字符串键只在序列化和存储边界出现。
/// 变体声明顺序即展示优先级（越靠前越优先）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BadgeId {
    /// 首次旅行
    FirstJourney,
    /// 游记恰好一百词
    ExactHundredWords,
    /// 深夜时段登录
    MidnightWindowLogin,
    /// 与他人到访同一年份
    SharedYear,
    /// 同一事件中多个徽章同时解锁
    MultiBadgeMeta,
}

impl BadgeId {
    /// 全部徽章标识
    pub const ALL: [BadgeId; 5] = [
        BadgeId::FirstJourney,
        BadgeId::ExactHundredWords,
        BadgeId::MidnightWindowLogin,
        BadgeId::SharedYear,
        BadgeId::MultiBadgeMeta,
    ];

    /// 存储与传输使用的字符串键
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstJourney => "first-journey",
            Self::ExactHundredWords => "exact-hundred-words",
            Self::MidnightWindowLogin => "midnight-window-login",
            Self::SharedYear => "shared-year",
            Self::MultiBadgeMeta => "multi-badge-meta",
        }
    }

    /// 展示时是否需要附带关联查询结果
    pub fn requires_context(&self) -> bool {
        matches!(self, Self::SharedYear)
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BadgeId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BadgeId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| EngineError::UnknownBadge(s.to_string()))
    }
}

/// 徽章目录条目
///
/// 部署时固定，不按用户持久化
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeDefinition {
    pub badge_id: BadgeId,
    pub display_name: String,
    pub description: String,
    /// 元徽章只用于概括"同一事件中获得多个徽章"
    pub is_meta: bool,
    /// 谓词签名：该徽章监听的事件类型
    pub triggers: &'static [EventKind],
}

impl BadgeDefinition {
    pub fn new(
        badge_id: BadgeId,
        display_name: impl Into<String>,
        description: impl Into<String>,
        triggers: &'static [EventKind],
    ) -> Self {
        Self {
            badge_id,
            display_name: display_name.into(),
            description: description.into(),
            is_meta: false,
            triggers,
        }
    }

    /// 标记为元徽章
    pub fn meta(mut self) -> Self {
        self.is_meta = true;
        self
    }
}
