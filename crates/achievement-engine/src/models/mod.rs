//! 徽章引擎领域模型
//!
//! 包含徽章标识、目录条目、触发事件、旅行日志与授予记录

pub mod award;
pub mod badge;
pub mod event;
pub mod travel_log;

// 重新导出常用类型
pub use award::{AwardOutcome, BadgeAward};
pub use badge::{BadgeDefinition, BadgeId};
pub use event::{EngineEvent, EventKind};
pub use travel_log::{NewTravelLog, OtherTraveler, TravelLog};
