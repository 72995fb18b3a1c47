use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 查询参数无效（空查询、只有分隔符）
    #[error("查询参数无效: {0}")]
    InvalidQuery(String),
    /// 抓取子系统无法运行（浏览器启动失败等）
    #[error("商品抓取失败: {0}")]
    Orchestration(Arc<OrchestrationError>),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 编排层错误
///
/// 只表示"整个请求都无法完成"的情况，单个词条的失败不会走到这里。
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// 启动浏览器失败
    #[error("无法启动浏览器: {source}")]
    BrowserLaunchFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 商品来源不可用
    #[error("商品来源不可用: {0}")]
    SourceUnavailable(String),
}

/// 商品来源错误（单个词条级别）
///
/// 由 `TermFetcher` 吸收，永远不会返回给调用方。
#[derive(Debug, Error)]
pub enum SourceError {
    /// 单次尝试超时
    #[error("请求超时 ({after:?})")]
    Timeout { after: Duration },
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    Navigation {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 搜索页已打开，但等待时间内没有渲染出任何商品
    #[error("等待时间内没有商品渲染")]
    NoListings,
    /// 页面脚本执行或结果解析失败
    #[error("页面渲染失败: {message}")]
    RenderFailure { message: String },
}

impl SourceError {
    /// 是否值得重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Timeout { .. } | SourceError::Navigation { .. })
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建查询无效错误
    pub fn invalid_query(message: impl Into<String>) -> Self {
        AppError::InvalidQuery(message.into())
    }

    /// 返回给客户端的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<OrchestrationError> for AppError {
    fn from(err: OrchestrationError) -> Self {
        AppError::Orchestration(Arc::new(err))
    }
}

impl From<Arc<OrchestrationError>> for AppError {
    fn from(err: Arc<OrchestrationError>) -> Self {
        AppError::Orchestration(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::InvalidQuery(message) => json!({ "error": message }),
            AppError::Orchestration(cause) => json!({
                "error": "商品抓取失败",
                "details": cause.to_string(),
            }),
            other => json!({
                "error": "服务器内部错误",
                "details": other.to_string(),
            }),
        };
        (status, Json(body)).into_response()
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
