//! 应用生命周期
//!
//! 1. **初始化**：创建商品来源启动器、编排器和路由
//! 2. **运行**：绑定端口并提供 HTTP 服务
//! 3. **退出**：收到 Ctrl-C 后优雅关闭

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api;
use crate::config::Config;
use crate::orchestrator::QueryOrchestrator;
use crate::services::{ChromiumLauncher, SourceLauncher};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    router: Router,
}

impl App {
    /// 使用浏览器商品来源初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let launcher: Arc<dyn SourceLauncher> = Arc::new(ChromiumLauncher::new(&config));
        Ok(Self::with_launcher(config, launcher))
    }

    /// 使用指定的商品来源启动器初始化应用
    pub fn with_launcher(config: Config, launcher: Arc<dyn SourceLauncher>) -> Self {
        logging::log_startup(&config);

        let orchestrator = Arc::new(QueryOrchestrator::new(&config, launcher));
        let router = api::router(orchestrator);

        Self { config, router }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// 运行应用主逻辑
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.bind_addr)
            .await
            .with_context(|| format!("无法绑定地址: {}", self.config.bind_addr))?;
        info!("✓ 服务已启动: http://{}", self.config.bind_addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP 服务异常退出")?;

        info!("👋 服务已停止");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("监听退出信号失败: {}", e);
        std::future::pending::<()>().await;
    }
    info!("收到退出信号，正在关闭...");
}
