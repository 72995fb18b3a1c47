//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `query_orchestrator` - 查询编排器
//! - 校验查询、切分词条
//! - 启动并关闭商品来源会话
//! - 控制并发数量（Semaphore）和请求截止时间
//! - 汇总结果、计算组合
//!
//! ### `result_cache` - 查询结果缓存
//! - 按查询缓存完整响应，TTL 到期失效
//! - 同一查询并发未命中时只抓取一次
//!
//! ## 层次关系
//!
//! ```text
//! query_orchestrator (处理 Vec<SearchTerm>)
//!     ↓
//! workflow::TermFetcher (处理单个词条)
//!     ↓
//! services (能力层：source / normalizer / combination)
//!     ↓
//! infrastructure (基础设施：JsExecutor)
//! ```

pub mod query_orchestrator;
pub mod result_cache;

pub use query_orchestrator::QueryOrchestrator;
pub use result_cache::ResultCache;
