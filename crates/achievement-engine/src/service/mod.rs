//! 服务层
//!
//! 编排评估、授予与展示选择。
//!
//! ## 模块结构
//!
//! - `dto`: 数据传输对象定义
//! - `engine`: 徽章引擎（单次事件的评估轮次）
//! - `journey_service`: 触发动作入口（日志发布、登录）
//! - `query_service`: 徽章查询服务（只读操作）

pub mod dto;
pub mod engine;
pub mod journey_service;
pub mod query_service;

pub use dto::*;
pub use engine::AchievementEngine;
pub use journey_service::JourneyService;
pub use query_service::BadgeQueryService;
