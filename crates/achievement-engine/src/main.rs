//! 成就徽章引擎部署检查
//!
//! 加载配置并完成启动检查：目录一致性、数据库连通性与迁移。
//! 引擎以库的形式嵌入宿主服务，本二进制不常驻。

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use achievement_engine::{
    AchievementEngine, BadgeAwardRepository, BadgeCatalog, EvaluatorRegistry, TravelLogRepository,
};
use achievement_shared::{config::AppConfig, database::Database, observability};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载配置
    let config = AppConfig::load("achievement-engine").context("加载配置失败")?;

    // 2. 初始化可观测性
    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let guard = observability::init(&obs_config)?;

    info!(
        service = %config.service_name,
        environment = %config.environment,
        metrics_installed = guard.metrics_installed(),
        "Configuration loaded"
    );

    // 3. 校验引擎配置与目录一致性
    config.engine.validate().context("引擎配置无效")?;
    let catalog = Arc::new(BadgeCatalog::standard());
    let registry = Arc::new(EvaluatorRegistry::standard(&config.engine));
    catalog
        .verify_registry(&registry)
        .context("徽章目录与评估器注册表不一致")?;

    // 4. 数据库
    let db = Database::connect(&config.database).await?;
    db.run_migrations().await?;
    db.health_check().await?;
    db.verify_unique_index("badge_awards", &["user_id", "badge_id"])
        .await
        .context("授予账本缺少唯一约束")?;
    info!("Database connection established");

    let pool = db.pool().clone();
    let engine = AchievementEngine::new(
        config.engine.clone(),
        catalog,
        registry,
        Arc::new(TravelLogRepository::new(pool.clone())),
        Arc::new(BadgeAwardRepository::new(pool)),
    )
    .context("徽章引擎初始化失败")?;

    for definition in engine.catalog().definitions() {
        info!(
            badge_id = %definition.badge_id,
            display_name = %definition.display_name,
            is_meta = definition.is_meta,
            "徽章已登记"
        );
    }

    db.close().await;
    info!("Startup checks passed");
    Ok(())
}
