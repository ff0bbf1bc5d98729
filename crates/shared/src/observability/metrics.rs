//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use std::net::SocketAddr;

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use super::ObservabilityConfig;

/// 初始化 Prometheus 指标导出
///
/// 在指定端口启动导出器自带的 HTTP 监听，必须在 tokio 运行时内调用。
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));

    PrometheusBuilder::new().with_http_listener(addr).install()?;
    info!("Metrics exporter listening on {}", addr);

    register_common_metrics(&config.service_name);
    Ok(())
}

/// 注册通用指标描述
///
/// 这些描述会出现在 /metrics 端点的 HELP 注释中
pub fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!(
        "achievement_evaluations_total",
        "Total number of badge condition evaluations"
    );
    metrics::describe_counter!(
        "achievement_awards_total",
        "Total number of badge award attempts by outcome"
    );
    metrics::describe_histogram!(
        "achievement_pass_duration_seconds",
        "Duration of one evaluation pass in seconds"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}
