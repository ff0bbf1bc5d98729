//! 仓储层
//!
//! 提供旅行日志存储与徽章授予账本的数据访问接口。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含业务逻辑
//! - 使用 SQLx 进行类型安全的数据库操作
//! - 账本唯一性由数据库唯一约束保证
//! - 定义 trait 接口以支持 mock 测试，并提供内存实现供嵌入与测试使用

mod badge_award_repo;
mod memory;
mod traits;
mod travel_log_repo;

pub use badge_award_repo::BadgeAwardRepository;
pub use memory::{InMemoryAwardLedger, InMemoryLogStore};
pub use traits::*;
pub use travel_log_repo::TravelLogRepository;
