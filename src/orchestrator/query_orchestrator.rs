//! 查询编排器 - 编排层
//!
//! ## 职责
//!
//! 1. **参数校验**：空查询直接拒绝
//! 2. **缓存**：命中直接返回，未命中时同一查询只抓取一次
//! 3. **资源管理**：每次未命中启动一个商品来源会话，结束后关闭
//! 4. **并发控制**：每个词条一个任务，Semaphore 限制并发
//! 5. **截止时间**：超过请求截止时间的词条被取消并记为空结果
//! 6. **汇总**：按词条顺序组装结果并计算两个组合

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, OrchestrationError};
use crate::models::{AggregatedResponse, Listing, SearchTerm, TermResult};
use crate::orchestrator::result_cache::ResultCache;
use crate::services::{aggregate, ListingSource, SourceLauncher};
use crate::utils::logging;
use crate::workflow::{TermCtx, TermFetcher};

/// 查询编排器
pub struct QueryOrchestrator {
    launcher: Arc<dyn SourceLauncher>,
    fetcher: Arc<TermFetcher>,
    cache: ResultCache,
    max_concurrent_terms: usize,
    request_deadline: Duration,
    shutdown_timeout: Duration,
}

impl QueryOrchestrator {
    pub fn new(config: &Config, launcher: Arc<dyn SourceLauncher>) -> Self {
        Self {
            launcher,
            fetcher: Arc::new(TermFetcher::new(config)),
            cache: ResultCache::new(config.cache_ttl(), config.cache_max_capacity),
            max_concurrent_terms: config.concurrency_limit(),
            request_deadline: config.request_deadline(),
            shutdown_timeout: config.shutdown_timeout(),
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// 处理一次查询
    ///
    /// 查询去除首尾空白后同时作为缓存键和切分词条的输入。
    pub async fn handle(&self, query: &str) -> AppResult<Arc<AggregatedResponse>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::invalid_query("缺少搜索参数 q"));
        }

        let terms = SearchTerm::parse_query(query);
        if terms.is_empty() {
            return Err(AppError::invalid_query("查询中没有有效的搜索词"));
        }

        if let Some(cached) = self.cache.get(query).await {
            info!("💾 缓存命中: \"{}\"", query);
            return Ok(cached);
        }

        let response = self
            .cache
            .get_or_try_insert_with(query, async {
                info!("🔎 缓存未命中，开始抓取: \"{}\" ({} 个词条)", query, terms.len());
                self.assemble(query, terms).await.map(Arc::new)
            })
            .await?;

        Ok(response)
    }

    /// 抓取所有词条并组装响应
    async fn assemble(
        &self,
        query: &str,
        terms: Vec<SearchTerm>,
    ) -> Result<AggregatedResponse, OrchestrationError> {
        let started = Instant::now();

        let source = self.launcher.launch().await?;
        let results = self.fetch_all(source.clone(), terms).await;
        // 关闭商品来源的等待有上限
        let shutdown_budget = self.shutdown_timeout.saturating_mul(2);
        if timeout(shutdown_budget, source.shutdown()).await.is_err() {
            warn!("⚠️ 关闭商品来源超过 {:?}，不再等待", shutdown_budget);
        }

        let (cheapest, most_reviewed) = aggregate(&results);
        logging::log_query_complete(query, &results, &cheapest, &most_reviewed, started.elapsed());

        Ok(AggregatedResponse {
            results,
            cheapest_combination: cheapest,
            most_reviewed_combination: most_reviewed,
        })
    }

    /// 并发抓取所有词条，结果按词条顺序排列
    ///
    /// 任务放在 `JoinSet` 中，调用方放弃等待时未完成的词条会随之中止。
    async fn fetch_all(
        &self,
        source: Arc<dyn ListingSource>,
        terms: Vec<SearchTerm>,
    ) -> TermResult {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_terms));
        let deadline = Instant::now() + self.request_deadline;
        let total = terms.len();
        let ctxs: Vec<TermCtx> = terms
            .into_iter()
            .enumerate()
            .map(|(idx, term)| TermCtx::new(idx + 1, total, term))
            .collect();

        // 为每个词条创建任务
        let mut tasks = JoinSet::new();
        for (idx, ctx) in ctxs.iter().enumerate() {
            let task_ctx = ctx.clone();
            let source = source.clone();
            let fetcher = self.fetcher.clone();
            let semaphore = semaphore.clone();

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (idx, Vec::new());
                };
                (idx, fetcher.fetch(source.as_ref(), &task_ctx).await)
            });
        }

        // 所有任务共享同一个截止时间
        let mut slots: Vec<Option<Vec<Listing>>> = vec![None; total];
        loop {
            match timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((idx, listings)))) => slots[idx] = Some(listings),
                Ok(Some(Err(e))) => error!("词条任务执行失败: {}", e),
                Ok(None) => break,
                Err(_) => {
                    tasks.abort_all();
                    break;
                }
            }
        }

        let mut results = TermResult::new();
        for (ctx, slot) in ctxs.into_iter().zip(slots) {
            let listings = slot.unwrap_or_else(|| {
                warn!("{} ⏱️ 未在请求截止时间前完成，记为空结果", ctx);
                Vec::new()
            });
            results.push(ctx.term, listings);
        }

        results
    }
}
