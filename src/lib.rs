//! # Price Scout
//!
//! 多词条商品比价服务：为每个搜索词抓取商品目录，计算最便宜组合和评价最多组合
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - page 的唯一持有者，提供 goto() / eval() 能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，一次只处理一个词条或一组结果
//! - `ListingSource` / `SourceLauncher` - 商品来源抽象
//! - `CatalogSource` - 基于无头浏览器的商品来源
//! - `ListingNormalizer` - 原始字段规范化
//! - `aggregate` - 组合计算
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个词条"的完整抓取流程
//! - `TermCtx` - 上下文封装（词条 + 位置）
//! - `TermFetcher` - 重试 → 过滤 → 截取 → 规范化
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/query_orchestrator` - 查询编排，管理并发、截止时间和资源
//! - `orchestrator/result_cache` - 查询结果缓存
//!
//! 外层由 `api/`（HTTP 路由）和 `app`（生命周期）组成。
//!
//! ## 模块结构

pub mod api;
pub mod app;
pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult, OrchestrationError, SourceError};
pub use models::{AggregatedResponse, CombinationBundle, Listing, RawListing, SearchTerm};
pub use orchestrator::{QueryOrchestrator, ResultCache};
pub use services::{ListingSource, SourceLauncher};
