//! 查询结果缓存
//!
//! 以查询字符串为键缓存完整响应，条目写入后 TTL 到期即失效。
//! 同一个键的并发未命中只会执行一次初始化，其余请求等待同一结果。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::error::OrchestrationError;
use crate::models::AggregatedResponse;

/// 查询结果缓存
#[derive(Clone)]
pub struct ResultCache {
    inner: Cache<String, Arc<AggregatedResponse>>,
}

impl ResultCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// 查找未过期的缓存
    pub async fn get(&self, query: &str) -> Option<Arc<AggregatedResponse>> {
        self.inner.get(query).await
    }

    /// 写入或覆盖缓存
    pub async fn set(&self, query: &str, response: Arc<AggregatedResponse>) {
        self.inner.insert(query.to_string(), response).await;
    }

    /// 命中则直接返回，否则执行 `init` 并缓存成功结果；失败不会被缓存
    pub async fn get_or_try_insert_with<F>(
        &self,
        query: &str,
        init: F,
    ) -> Result<Arc<AggregatedResponse>, Arc<OrchestrationError>>
    where
        F: Future<Output = Result<Arc<AggregatedResponse>, OrchestrationError>>,
    {
        self.inner.try_get_with(query.to_string(), init).await
    }

    pub async fn invalidate(&self, query: &str) {
        self.inner.invalidate(query).await;
    }
}
