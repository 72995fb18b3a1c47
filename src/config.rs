use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppResult, ConfigError};

/// 配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "PRICE_SCOUT_CONFIG";

/// 所有时长配置的上限（一天）
const MAX_DURATION_SECS: u64 = 24 * 60 * 60;

/// 并发词条数上限
const MAX_CONCURRENT_TERMS: usize = 64;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP 监听地址
    pub bind_addr: String,
    /// 商品目录站点的 origin，用于拼接搜索地址和补全相对链接
    pub catalog_origin: String,
    /// 搜索页路径前缀
    pub search_path: String,
    // --- 缓存配置 ---
    pub cache_ttl_secs: u64,
    pub cache_max_capacity: u64,
    // --- 抓取配置 ---
    /// 首次失败后的额外重试次数
    pub max_retries: usize,
    /// 重试间隔基数（毫秒），第 n 次重试等待 n 倍
    pub retry_delay_ms: u64,
    /// 单次抓取尝试的超时
    pub attempt_timeout_secs: u64,
    /// 等待商品卡片渲染的最长时间
    pub listing_wait_secs: u64,
    /// 整个请求的截止时间
    pub request_deadline_secs: u64,
    /// 关闭浏览器会话的最长等待时间，超时后强制结束进程
    pub shutdown_timeout_secs: u64,
    /// 同时抓取的词条数量，1 表示顺序抓取
    pub max_concurrent_terms: usize,
    /// 每个词条最多保留的商品数
    pub max_listings_per_term: usize,
    // --- 浏览器配置 ---
    pub chrome_executable: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            catalog_origin: "https://www.kabum.com.br".to_string(),
            search_path: "/busca/".to_string(),
            cache_ttl_secs: 300,
            cache_max_capacity: 1000,
            max_retries: 2,
            retry_delay_ms: 1000,
            attempt_timeout_secs: 30,
            listing_wait_secs: 10,
            request_deadline_secs: 90,
            shutdown_timeout_secs: 10,
            max_concurrent_terms: 4,
            max_listings_per_term: 10,
            chrome_executable: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：默认值 → 可选 TOML 文件 → 环境变量
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 从 TOML 文件加载，缺省字段使用默认值
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    fn from_toml_str(content: &str, path: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_string(),
            source,
        })?;
        Ok(config)
    }

    /// 只从环境变量加载
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(self) -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(self.bind_addr),
            catalog_origin: std::env::var("CATALOG_ORIGIN").unwrap_or(self.catalog_origin),
            search_path: std::env::var("SEARCH_PATH").unwrap_or(self.search_path),
            cache_ttl_secs: env_parse("CACHE_TTL_SECS", self.cache_ttl_secs),
            cache_max_capacity: env_parse("CACHE_MAX_CAPACITY", self.cache_max_capacity),
            max_retries: env_parse("MAX_RETRIES", self.max_retries),
            retry_delay_ms: env_parse("RETRY_DELAY_MS", self.retry_delay_ms),
            attempt_timeout_secs: env_parse("ATTEMPT_TIMEOUT_SECS", self.attempt_timeout_secs),
            listing_wait_secs: env_parse("LISTING_WAIT_SECS", self.listing_wait_secs),
            request_deadline_secs: env_parse("REQUEST_DEADLINE_SECS", self.request_deadline_secs),
            shutdown_timeout_secs: env_parse("SHUTDOWN_TIMEOUT_SECS", self.shutdown_timeout_secs),
            max_concurrent_terms: env_parse("MAX_CONCURRENT_TERMS", self.max_concurrent_terms),
            max_listings_per_term: env_parse("MAX_LISTINGS_PER_TERM", self.max_listings_per_term),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(self.chrome_executable),
            verbose_logging: env_parse("VERBOSE_LOGGING", self.verbose_logging),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        bounded_secs(self.cache_ttl_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms).min(bounded_secs(MAX_DURATION_SECS))
    }

    pub fn attempt_timeout(&self) -> Duration {
        bounded_secs(self.attempt_timeout_secs)
    }

    pub fn listing_wait(&self) -> Duration {
        bounded_secs(self.listing_wait_secs)
    }

    pub fn request_deadline(&self) -> Duration {
        bounded_secs(self.request_deadline_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        bounded_secs(self.shutdown_timeout_secs)
    }

    /// 实际使用的并发词条数，至少为 1
    pub fn concurrency_limit(&self) -> usize {
        self.max_concurrent_terms.clamp(1, MAX_CONCURRENT_TERMS)
    }
}

fn bounded_secs(secs: u64) -> Duration {
    Duration::from_secs(secs.min(MAX_DURATION_SECS))
}

fn env_parse<T: FromStr>(name: &str, fallback: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}
