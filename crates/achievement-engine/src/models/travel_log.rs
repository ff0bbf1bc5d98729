//! 旅行日志模型
//!
//! 日志由日志子系统写入，引擎只读

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::evaluator::count_words;

/// 旅行日志
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TravelLog {
    pub id: i64,
    pub user_id: i64,
    /// 到访年份，无范围限制（可为负数或遥远的未来）
    pub year_visited: i64,
    pub story: String,
    pub created_at: DateTime<Utc>,
}

impl TravelLog {
    /// 游记词数（派生值，不单独存储）
    pub fn word_count(&self) -> usize {
        count_words(&self.story)
    }
}

/// 新建旅行日志请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTravelLog {
    pub user_id: i64,
    pub year_visited: i64,
    pub story: String,
}

impl NewTravelLog {
    pub fn new(user_id: i64, year_visited: i64, story: impl Into<String>) -> Self {
        Self {
            user_id,
            year_visited,
            story: story.into(),
        }
    }
}

/// 同年旅行者
///
/// 关联查询的结果项，供"同年旅伴"徽章展示使用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OtherTraveler {
    pub user_id: i64,
    pub display_name: String,
}
