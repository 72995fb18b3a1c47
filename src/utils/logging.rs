/// 日志工具模块
///
/// 提供日志初始化以及格式化输出的辅助函数
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::{CombinationBundle, TermResult};

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则根据 `verbose` 选择 info 或 debug 级别
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 比价服务启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🌐 监听地址: {}", config.bind_addr);
    info!("🛒 商品目录: {}", config.catalog_origin);
    info!(
        "📊 最大并发词条数: {} | 重试次数: {} | 请求截止: {}s",
        config.max_concurrent_terms, config.max_retries, config.request_deadline_secs
    );
    info!("💾 缓存有效期: {}s", config.cache_ttl_secs);
    info!("{}", "=".repeat(60));
}

/// 记录一次查询的汇总信息
pub fn log_query_complete(
    query: &str,
    results: &TermResult,
    cheapest: &CombinationBundle,
    most_reviewed: &CombinationBundle,
    elapsed: Duration,
) {
    let empty_terms = results.iter().filter(|e| e.listings.is_empty()).count();

    info!("{}", "─".repeat(60));
    info!(
        "✓ 查询完成: \"{}\" ({:.1}s)",
        truncate_text(query, 80),
        elapsed.as_secs_f64()
    );
    info!(
        "📦 词条: {} 个, 无结果: {} 个",
        results.len(),
        empty_terms
    );
    info!(
        "💰 最便宜组合: {} 件, 总价 {:.2}",
        cheapest.products.len(),
        cheapest.total_price
    );
    info!(
        "⭐ 评价最多组合: {} 件, 总价 {:.2}",
        most_reviewed.products.len(),
        most_reviewed.total_price
    );
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
