//! 商品目录抓取 - 业务能力层
//!
//! `ListingSource` 的浏览器实现：每次抓取创建独立的浏览器上下文并打开新页面，
//! 导航到搜索页，等待商品卡片出现后用脚本提取原始字段，最后关闭页面并销毁上下文。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{CreateBrowserContextParams, CreateTargetParams};
use chromiumoxide::{Browser, Page};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::browser;
use crate::config::Config;
use crate::error::{OrchestrationError, SourceError};
use crate::infrastructure::JsExecutor;
use crate::models::{RawListing, SearchTerm};
use crate::services::listing_source::{ListingSource, SourceLauncher};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

const COUNT_LISTINGS_JS: &str = "document.querySelectorAll('.productCard').length";

const EXTRACT_LISTINGS_JS: &str = r#"
(() => {
    const text = (el) => (el ? el.innerText.trim() : null);
    return Array.from(document.querySelectorAll('.productCard')).map((item) => {
        const rating = item.querySelector('.ratingStarsContainer');
        return {
            name: text(item.querySelector('.nameCard')),
            priceText: text(item.querySelector('.priceCard')),
            reviewText: text(item.querySelector('.ratingStarsContainer + span')),
            ratingText: rating ? rating.getAttribute('aria-label') : null,
            image: item.querySelector('img')?.getAttribute('src') ?? null,
            link: item.querySelector('a')?.getAttribute('href') ?? null,
            sponsored: item.innerText.includes('PATROCINADO'),
        };
    });
})()
"#;

/// 浏览器商品来源启动器
pub struct ChromiumLauncher {
    chrome_executable: Option<String>,
    catalog_origin: String,
    search_path: String,
    listing_wait: Duration,
    shutdown_timeout: Duration,
}

impl ChromiumLauncher {
    pub fn new(config: &Config) -> Self {
        Self {
            chrome_executable: config.chrome_executable.clone(),
            catalog_origin: config.catalog_origin.trim_end_matches('/').to_string(),
            search_path: config.search_path.clone(),
            listing_wait: config.listing_wait(),
            shutdown_timeout: config.shutdown_timeout(),
        }
    }
}

#[async_trait]
impl SourceLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Arc<dyn ListingSource>, OrchestrationError> {
        let (browser, handler) =
            browser::launch_headless_browser(self.chrome_executable.as_deref()).await?;

        Ok(Arc::new(CatalogSource {
            browser: Mutex::new(browser),
            handler,
            search_base: format!("{}{}", self.catalog_origin, self.search_path),
            listing_wait: self.listing_wait,
            shutdown_timeout: self.shutdown_timeout,
        }))
    }
}

/// 一次请求内的浏览器会话
pub struct CatalogSource {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
    search_base: String,
    listing_wait: Duration,
    shutdown_timeout: Duration,
}

/// 拼接搜索页地址，词条做 URL 编码
fn search_url(search_base: &str, term: &SearchTerm) -> String {
    format!("{}{}", search_base, urlencoding::encode(term))
}

/// 在指定浏览器上下文中创建空白页的参数
fn blank_page_in(context_id: &BrowserContextId) -> CreateTargetParams {
    let mut params = CreateTargetParams::new("about:blank");
    params.browser_context_id = Some(context_id.clone());
    params
}

impl CatalogSource {
    /// 在新的浏览器上下文中打开空白页，上下文之间不共享 cookie 和存储
    async fn open_isolated_page(&self, url: &str) -> Result<(BrowserContextId, Page), SourceError> {
        let navigation_error = |e: chromiumoxide::error::CdpError| SourceError::Navigation {
            url: url.to_string(),
            source: Box::new(e),
        };

        let mut browser = self.browser.lock().await;
        let context_id = browser
            .create_browser_context(CreateBrowserContextParams::default())
            .await
            .map_err(navigation_error)?;

        match browser.new_page(blank_page_in(&context_id)).await {
            Ok(page) => Ok((context_id, page)),
            Err(e) => {
                if let Err(dispose_err) = browser.dispose_browser_context(context_id).await {
                    debug!("销毁浏览器上下文失败: {}", dispose_err);
                }
                Err(navigation_error(e))
            }
        }
    }

    async fn dispose_context(&self, context_id: BrowserContextId) {
        let browser = self.browser.lock().await;
        if let Err(e) = browser.dispose_browser_context(context_id).await {
            debug!("销毁浏览器上下文失败: {}", e);
        }
    }

    async fn extract(
        &self,
        executor: &JsExecutor,
        url: &str,
    ) -> Result<Vec<RawListing>, SourceError> {
        executor.goto(url).await?;
        self.wait_for_listings(executor).await?;
        executor.eval_as(EXTRACT_LISTINGS_JS).await
    }

    /// 轮询直到出现商品卡片，超过等待时间视为没有商品
    async fn wait_for_listings(&self, executor: &JsExecutor) -> Result<(), SourceError> {
        let deadline = Instant::now() + self.listing_wait;
        loop {
            let count: u64 = executor.eval_as(COUNT_LISTINGS_JS).await?;
            if count > 0 {
                debug!("页面已渲染 {} 个商品卡片", count);
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SourceError::NoListings);
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl ListingSource for CatalogSource {
    async fn fetch_listings(&self, term: &SearchTerm) -> Result<Vec<RawListing>, SourceError> {
        let url = search_url(&self.search_base, term);
        info!("🔍 搜索: {}", url);

        let (context_id, page) = self.open_isolated_page(&url).await?;

        let executor = JsExecutor::new(page);
        let result = self.extract(&executor, &url).await;
        executor.close().await;
        self.dispose_context(context_id).await;
        result
    }

    async fn shutdown(&self) {
        let mut browser = self.browser.lock().await;

        let graceful = timeout(self.shutdown_timeout, async {
            browser.close().await.map_err(|e| e.to_string())?;
            browser.wait().await.map_err(|e| e.to_string())?;
            Ok::<_, String>(())
        })
        .await;

        let failure = match graceful {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(_) => Some(format!("超过 {:?} 未退出", self.shutdown_timeout)),
        };
        if let Some(reason) = failure {
            warn!("关闭浏览器失败: {}，强制结束进程", reason);
            if let Some(Err(e)) = browser.kill().await {
                warn!("结束浏览器进程失败: {}", e);
            }
        }

        self.handler.abort();
        debug!("浏览器会话已关闭");
    }
}

impl Drop for CatalogSource {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
