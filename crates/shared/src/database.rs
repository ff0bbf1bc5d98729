//! 数据库连接管理模块
//!
//! PostgreSQL 连接池、嵌入式迁移，以及启动时对关键唯一索引的校验。

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, instrument, warn};

use crate::config::DatabaseConfig;
use crate::error::{InfraError, Result};

/// 连接池包装
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    #[instrument(skip(config), fields(max_connections = config.max_connections))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await?;

        info!("数据库连接池已创建");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    /// 应用工作区根目录 migrations/ 下的迁移（编译期嵌入）
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        info!("数据库迁移已完成");
        Ok(())
    }

    /// 校验表上存在恰好覆盖给定列的唯一索引
    ///
    /// 幂等写入依赖存储层唯一约束，缺失时直接拒绝启动
    #[instrument(skip(self))]
    pub async fn verify_unique_index(&self, table: &str, columns: &[&str]) -> Result<()> {
        let mut expected: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        expected.sort();

        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM pg_index i
                JOIN pg_class t ON t.oid = i.indrelid
                WHERE t.relname = $1
                  AND i.indisunique
                  AND (
                      SELECT array_agg(a.attname::text ORDER BY a.attname::text)
                      FROM pg_attribute a
                      WHERE a.attrelid = t.oid AND a.attnum = ANY(i.indkey)
                  ) = $2
            )
            "#,
        )
        .bind(table)
        .bind(&expected)
        .fetch_one(&self.pool)
        .await?;

        if !exists {
            warn!(table, columns = ?columns, "缺少唯一索引");
            return Err(InfraError::Internal(format!(
                "表 {} 缺少 ({}) 唯一索引",
                table,
                columns.join(", ")
            )));
        }
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("数据库连接池已关闭");
    }
}
