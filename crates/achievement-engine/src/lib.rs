//! 时光旅行日志成就徽章引擎
//!
//! 在日志发布和用户登录之后评估徽章条件，向授予账本幂等写入，
//! 并从同一事件的新徽章中选出一个用于展示。
//!
//! ## 核心功能
//!
//! - **徽章目录**：封闭的徽章集合，标记元徽章
//! - **条件评估**：每个徽章一个评估器，按事件类型筛选
//! - **关联查询**：同年份的其他旅行者
//! - **授予账本**：`(user_id, badge_id)` 唯一，不存在则插入
//! - **展示选择**：元徽章优先，同年徽章附带旅伴
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `catalog`: 徽章目录
//! - `evaluator`: 条件评估器与注册表
//! - `correlation`: 同年旅行者查询
//! - `repository`: 仓储层（PostgreSQL 与内存实现）
//! - `notification`: 展示选择
//! - `service`: 引擎编排与服务入口

pub mod catalog;
pub mod correlation;
pub mod error;
pub mod evaluator;
pub mod models;
pub mod notification;
pub mod repository;
pub mod service;

pub use achievement_shared::config::EngineConfig;
pub use catalog::BadgeCatalog;
pub use correlation::CorrelationQuery;
pub use error::{EngineError, Result};
pub use evaluator::{ConditionEvaluator, EvaluationContext, EvaluatorRegistry};
pub use models::*;
pub use notification::{NotificationSelector, PresentationDecision, SelectionInput};
pub use repository::{
    AwardLedger, BadgeAwardRepository, InMemoryAwardLedger, InMemoryLogStore, LogStore,
    TravelLogRepository,
};
pub use service::{
    AchievementEngine, BadgeQueryService, EngineOutcome, JourneyRecorded, JourneyService,
    UserBadgeView,
};
