//! JS 执行器 - 基础设施层
//!
//! 持有一个 page 资源，只暴露"导航"和"执行 JS"的能力

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::SourceError;

/// JS 执行器
///
/// 职责：
/// - 持有一个 Page 资源（每次抓取独占一个）
/// - 暴露 goto() / eval() 能力
/// - 不认识 Listing / SearchTerm
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 导航到指定 URL 并等待页面加载
    pub async fn goto(&self, url: &str) -> Result<(), SourceError> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| SourceError::Navigation {
                url: url.to_string(),
                source: Box::new(e),
            })?;
        Ok(())
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue, SourceError> {
        let result = self
            .page
            .evaluate(js_code.into())
            .await
            .map_err(|e| SourceError::RenderFailure {
                message: e.to_string(),
            })?;
        result
            .into_value()
            .map_err(|e| SourceError::RenderFailure {
                message: e.to_string(),
            })
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(
        &self,
        js_code: impl Into<String>,
    ) -> Result<T, SourceError> {
        let json_value = self.eval(js_code).await?;
        serde_json::from_value(json_value).map_err(|e| SourceError::RenderFailure {
            message: format!("无法解析脚本结果: {}", e),
        })
    }

    /// 关闭页面
    pub async fn close(self) {
        if let Err(e) = self.page.close().await {
            debug!("关闭页面失败: {}", e);
        }
    }
}
