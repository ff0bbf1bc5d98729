//! 徽章引擎编排器
//!
//! 每次调用的状态机：`Start → RunEvaluators → AwardEligible → Select → Done`。
//! 调用之间无状态，所有持久状态都在授予账本中。
//!
//! ## 失败语义
//!
//! 每个徽章的评估与写入相互隔离：单个徽章出错、超时或 panic 只会记录日志，
//! 并在本轮次按"未获得"处理，不影响其他徽章。编排器本身永不向调用方返回错误，
//! 触发动作（发布日志、登录）因此可以独立完成。

use std::collections::BTreeSet;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::FutureExt;
use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use achievement_shared::config::EngineConfig;

use super::dto::EngineOutcome;
use crate::catalog::BadgeCatalog;
use crate::correlation::CorrelationQuery;
use crate::error::{EngineError, Result};
use crate::evaluator::{EvaluationContext, EvaluatorRegistry};
use crate::models::{AwardOutcome, BadgeId, EngineEvent};
use crate::notification::{NotificationSelector, SelectionInput};
use crate::repository::{AwardLedger, LogStore};

/// 单轮次统计
#[derive(Debug, Default)]
struct PassReport {
    eligible: usize,
    inserted: usize,
    already_owned: usize,
    unknown: usize,
    failed: usize,
}

/// 为单个徽章的操作加上超时与 panic 隔离
async fn guarded<T>(
    operation: &str,
    limit: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout(limit, AssertUnwindSafe(fut).catch_unwind()).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(EngineError::Internal(format!("{} panicked", operation))),
        Err(_) => Err(EngineError::Timeout {
            operation: operation.to_string(),
            timeout_ms: limit.as_millis() as u64,
        }),
    }
}

/// 徽章引擎
pub struct AchievementEngine {
    config: EngineConfig,
    catalog: Arc<BadgeCatalog>,
    registry: Arc<EvaluatorRegistry>,
    correlation: CorrelationQuery,
    ledger: Arc<dyn AwardLedger>,
    selector: NotificationSelector,
}

impl AchievementEngine {
    /// 创建引擎并执行目录一致性检查
    ///
    /// `strict_catalog` 为 true 时目录漂移直接返回 [`EngineError::UnknownBadge`]
    /// 或 [`EngineError::TriggerMismatch`]；
    /// 否则记录警告，运行时逐个跳过未知徽章。
    pub fn new(
        config: EngineConfig,
        catalog: Arc<BadgeCatalog>,
        registry: Arc<EvaluatorRegistry>,
        log_store: Arc<dyn LogStore>,
        ledger: Arc<dyn AwardLedger>,
    ) -> Result<Self> {
        config.validate()?;

        if let Err(e) = catalog.verify_registry(&registry) {
            if config.strict_catalog {
                return Err(e);
            }
            warn!(error = %e, "徽章目录与评估器注册表不一致，未知徽章将在运行时跳过");
        }

        let selector = NotificationSelector::from_catalog(&catalog);
        info!(
            catalog_size = catalog.len(),
            evaluators = registry.len(),
            meta_badge = ?catalog.meta_badge().map(|b| b.as_str()),
            "徽章引擎已初始化"
        );

        Ok(Self {
            config,
            catalog,
            registry,
            correlation: CorrelationQuery::new(log_store),
            ledger,
            selector,
        })
    }

    /// 使用标准目录与标准注册表创建引擎
    pub fn standard(
        config: EngineConfig,
        log_store: Arc<dyn LogStore>,
        ledger: Arc<dyn AwardLedger>,
    ) -> Result<Self> {
        let registry = Arc::new(EvaluatorRegistry::standard(&config));
        Self::new(
            config,
            Arc::new(BadgeCatalog::standard()),
            registry,
            log_store,
            ledger,
        )
    }

    pub fn catalog(&self) -> &BadgeCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 日志提交后调用
    pub async fn on_log_created(
        &self,
        user_id: i64,
        year_visited: i64,
        story: impl Into<String>,
        is_users_first_log: bool,
    ) -> EngineOutcome {
        self.process(EngineEvent::log_created(
            user_id,
            year_visited,
            story,
            is_users_first_log,
        ))
        .await
    }

    /// 登录成功后调用
    pub async fn on_login(&self, user_id: i64, login_hour: u32) -> EngineOutcome {
        self.process(EngineEvent::user_logged_in(user_id, login_hour))
            .await
    }

    /// 执行一次评估轮次
    ///
    /// 永不失败：任何内部错误都降级为"本次未获得徽章"
    #[instrument(skip(self, event), fields(user_id = event.user_id(), event = event.kind().as_str()))]
    pub async fn process(&self, event: EngineEvent) -> EngineOutcome {
        let started = Instant::now();
        let mut report = PassReport::default();
        let ctx = EvaluationContext::new(self.correlation.clone());

        // RunEvaluators
        let eligible = self.run_evaluators(&event, &ctx).await;
        report.eligible = eligible.len();

        // AwardEligible
        let newly_earned = self
            .award_eligible(event.user_id(), &eligible, &mut report)
            .await;

        // Select
        let input = SelectionInput {
            co_travelers: match &event {
                EngineEvent::LogCreated {
                    user_id,
                    year_visited,
                    ..
                } => ctx.observed_co_travelers(*year_visited, *user_id),
                EngineEvent::UserLoggedIn { .. } => None,
            },
        };
        let presentation = self.selector.select(&newly_earned, input);

        let elapsed = started.elapsed();
        metrics::histogram!("achievement_pass_duration_seconds", "event" => event.kind().as_str())
            .record(elapsed.as_secs_f64());

        info!(
            eligible = report.eligible,
            inserted = report.inserted,
            already_owned = report.already_owned,
            unknown = report.unknown,
            failed = report.failed,
            presented = ?presentation.badge(),
            elapsed_ms = elapsed.as_millis() as u64,
            "徽章评估轮次完成"
        );

        EngineOutcome {
            newly_earned: newly_earned.into_iter().collect(),
            presentation,
        }
    }

    /// 执行所有相关评估器，最后计算元徽章
    async fn run_evaluators(
        &self,
        event: &EngineEvent,
        ctx: &EvaluationContext,
    ) -> BTreeSet<BadgeId> {
        let limit = self.config.evaluation_timeout();
        let evaluations = self.registry.relevant_to(event.kind()).map(|evaluator| {
            let badge_id = evaluator.badge_id();
            async move {
                let operation = format!("evaluate({})", badge_id);
                let result = guarded(&operation, limit, evaluator.evaluate(event, ctx)).await;
                (badge_id, result)
            }
        });

        let mut eligible = BTreeSet::new();
        for (badge_id, result) in join_all(evaluations).await {
            let label = match result {
                Ok(true) => {
                    eligible.insert(badge_id);
                    "eligible"
                }
                Ok(false) => "not_eligible",
                Err(EngineError::CorrelationQueryFailed { year, reason }) => {
                    warn!(
                        badge_id = %badge_id,
                        year,
                        reason = %reason,
                        "同年旅行者查询失败，按无旅伴处理"
                    );
                    "error"
                }
                Err(e) => {
                    warn!(
                        badge_id = %badge_id,
                        error_code = e.error_code(),
                        error = %e,
                        "徽章评估失败，本次按未获得处理"
                    );
                    "error"
                }
            };
            metrics::counter!(
                "achievement_evaluations_total",
                "badge" => badge_id.as_str(),
                "result" => label
            )
            .increment(1);
        }

        if let Some(rule) = self.registry.meta_rule()
            && rule.fires(&eligible)
        {
            debug!(
                badge_id = %rule.badge_id(),
                eligible = eligible.len(),
                "多个徽章同时满足，元徽章满足条件"
            );
            eligible.insert(rule.badge_id());
        }

        eligible
    }

    /// 逐个写入账本，收集新写入的徽章
    async fn award_eligible(
        &self,
        user_id: i64,
        eligible: &BTreeSet<BadgeId>,
        report: &mut PassReport,
    ) -> BTreeSet<BadgeId> {
        let attempts = eligible.iter().copied().map(|badge_id| async move {
            (badge_id, self.award_one(user_id, badge_id).await)
        });

        let mut newly_earned = BTreeSet::new();
        for (badge_id, result) in join_all(attempts).await {
            let label = match result {
                Ok(AwardOutcome::Inserted) => {
                    report.inserted += 1;
                    newly_earned.insert(badge_id);
                    info!(user_id, badge_id = %badge_id, "徽章授予成功");
                    "inserted"
                }
                Ok(AwardOutcome::AlreadyOwned) => {
                    report.already_owned += 1;
                    debug!(user_id, badge_id = %badge_id, "用户已持有该徽章");
                    "already_owned"
                }
                Err(EngineError::UnknownBadge(key)) => {
                    report.unknown += 1;
                    warn!(user_id, badge_id = %key, "徽章不在目录中，已跳过");
                    "unknown"
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        user_id,
                        badge_id = %badge_id,
                        error_code = e.error_code(),
                        error = %e,
                        "徽章写入失败，本次按未获得处理"
                    );
                    "failed"
                }
            };
            metrics::counter!(
                "achievement_awards_total",
                "badge" => badge_id.as_str(),
                "outcome" => label
            )
            .increment(1);
        }

        newly_earned
    }

    /// 单个徽章：目录校验后写入账本
    async fn award_one(&self, user_id: i64, badge_id: BadgeId) -> Result<AwardOutcome> {
        self.catalog.get(badge_id)?;

        let operation = format!("ledger.try_award({})", badge_id);
        guarded(
            &operation,
            self.config.ledger_timeout(),
            self.ledger.try_award(user_id, badge_id, Utc::now()),
        )
        .await
        .map_err(|e| match e {
            EngineError::Timeout { .. }
            | EngineError::Internal(_)
            | EngineError::LedgerWriteFailed { .. } => e,
            other => EngineError::LedgerWriteFailed {
                user_id,
                badge_id: badge_id.to_string(),
                reason: other.to_string(),
            },
        })
    }
}
