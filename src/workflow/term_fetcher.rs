//! 词条抓取流程 - 流程层
//!
//! 核心职责：定义"一个词条"的完整抓取流程
//!
//! 流程顺序：
//! 1. 调用商品来源（单次尝试有超时）
//! 2. 导航失败 / 超时 → 线性退避后重试
//! 3. 页面无商品 → 视为正常的空结果
//! 4. 过滤赞助商品 → 截取前 N 个 → 规范化
//!
//! 任何失败都在这里吸收，调用方只会拿到一个（可能为空的）商品列表。

use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::SourceError;
use crate::models::{Listing, RawListing, SearchTerm};
use crate::services::{ListingNormalizer, ListingSource};
use crate::workflow::term_ctx::TermCtx;

/// 词条抓取流程
pub struct TermFetcher {
    normalizer: ListingNormalizer,
    max_retries: usize,
    retry_delay: Duration,
    attempt_timeout: Duration,
    max_listings: usize,
}

impl TermFetcher {
    pub fn new(config: &Config) -> Self {
        Self {
            normalizer: ListingNormalizer::new(config.catalog_origin.clone()),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
            attempt_timeout: config.attempt_timeout(),
            max_listings: config.max_listings_per_term,
        }
    }

    /// 抓取单个词条，失败时返回空列表
    pub async fn fetch(&self, source: &dyn ListingSource, ctx: &TermCtx) -> Vec<Listing> {
        match self.fetch_raw(source, ctx).await {
            Ok(raw) => {
                let listings = self.select_and_normalize(raw, &ctx.term);
                info!("{} ✓ 获取到 {} 个商品", ctx, listings.len());
                listings
            }
            Err(e) => {
                warn!("{} ⚠️ 抓取失败，记为空结果: {}", ctx, e);
                Vec::new()
            }
        }
    }

    /// 带重试的原始抓取
    async fn fetch_raw(
        &self,
        source: &dyn ListingSource,
        ctx: &TermCtx,
    ) -> Result<Vec<RawListing>, SourceError> {
        let total_attempts = u32::try_from(self.max_retries)
            .unwrap_or(u32::MAX)
            .saturating_add(1);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!("{} 第 {}/{} 次尝试", ctx, attempt, total_attempts);

            let attempt_result =
                timeout(self.attempt_timeout, source.fetch_listings(&ctx.term)).await;
            let outcome = match attempt_result {
                Ok(result) => result,
                Err(_) => Err(SourceError::Timeout {
                    after: self.attempt_timeout,
                }),
            };

            match outcome {
                Ok(raw) => return Ok(raw),
                Err(SourceError::NoListings) => {
                    info!("{} 页面没有商品", ctx);
                    return Ok(Vec::new());
                }
                Err(e) if e.is_retryable() && attempt < total_attempts => {
                    let delay = self.retry_delay.saturating_mul(attempt);
                    warn!(
                        "{} 第 {}/{} 次尝试失败: {}，{:?} 后重试",
                        ctx, attempt, total_attempts, e, delay
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// 排除赞助商品后截取前 N 个并规范化
    fn select_and_normalize(&self, raw: Vec<RawListing>, term: &SearchTerm) -> Vec<Listing> {
        raw.iter()
            .filter(|r| !r.sponsored)
            .take(self.max_listings)
            .map(|r| self.normalizer.normalize(r, term))
            .collect()
    }
}
