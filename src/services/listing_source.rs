//! 商品来源抽象
//!
//! 编排层和流程层只依赖这两个 trait，不关心页面结构。

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{OrchestrationError, SourceError};
use crate::models::{RawListing, SearchTerm};

/// 商品来源：给定词条，返回原始商品列表
///
/// 实现方需要保证不同词条之间互不干扰（每次调用使用独立的浏览上下文）。
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_listings(&self, term: &SearchTerm) -> Result<Vec<RawListing>, SourceError>;

    /// 请求结束后释放资源
    async fn shutdown(&self) {}
}

/// 商品来源启动器
///
/// 每个未命中缓存的请求启动一次；启动失败即整个请求失败。
#[async_trait]
pub trait SourceLauncher: Send + Sync {
    async fn launch(&self) -> Result<Arc<dyn ListingSource>, OrchestrationError>;
}
