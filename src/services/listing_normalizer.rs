//! 商品规范化服务 - 业务能力层
//!
//! 把页面上抓到的文本字段转成带类型的 `Listing`，任何字段解析失败都有兜底值，
//! 本模块不会返回错误。

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Listing, RawListing, SearchTerm};

/// 商品名称缺失时的占位值
pub const NAME_NOT_FOUND: &str = "name not found";

/// 来源站点表示"无货"的价格文本
pub const UNAVAILABLE_PRICE_TEXT: &str = "---";

static NON_PRICE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\d,]").expect("valid price regex"));

static FIRST_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid rating regex"));

/// 商品规范化服务
pub struct ListingNormalizer {
    catalog_origin: String,
}

impl ListingNormalizer {
    pub fn new(catalog_origin: impl Into<String>) -> Self {
        Self {
            catalog_origin: catalog_origin.into().trim_end_matches('/').to_string(),
        }
    }

    /// 规范化单个商品
    pub fn normalize(&self, raw: &RawListing, term: &SearchTerm) -> Listing {
        let name = raw
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(NAME_NOT_FOUND)
            .to_string();

        let price_text = raw.price_text.as_deref().map(str::trim);
        let price = price_text.map(parse_price).unwrap_or(0.0);
        let is_available = match price_text {
            Some(text) => text != UNAVAILABLE_PRICE_TEXT && price > 0.0,
            None => false,
        };

        Listing {
            search_term: term.clone(),
            name,
            price,
            review_count: raw.review_text.as_deref().map(parse_review_count).unwrap_or(0),
            rating: raw.rating_text.as_deref().map(parse_rating).unwrap_or(0),
            image_url: self.resolve_link(raw.image.as_deref().unwrap_or("")),
            product_url: self.resolve_link(raw.link.as_deref().unwrap_or("")),
            is_available,
        }
    }

    /// 以 `/` 开头的链接补全为站点绝对地址，其余原样返回
    pub fn resolve_link(&self, link: &str) -> String {
        let link = link.trim();
        if link.starts_with('/') {
            format!("{}{}", self.catalog_origin, link)
        } else {
            link.to_string()
        }
    }
}

/// 解析本地化价格文本，例如 `R$ 1.299,90` → `1299.9`
///
/// 只保留数字和逗号（去掉货币前缀和千分位的点），第一个逗号视为小数点。
/// 无法解析时返回 0。
pub fn parse_price(text: &str) -> f64 {
    let digits = NON_PRICE_CHARS.replace_all(text, "");
    let canonical = digits.replacen(',', ".", 1);
    match canonical.parse::<f64>() {
        Ok(price) if price.is_finite() && price > 0.0 => price,
        _ => 0.0,
    }
}

/// 解析评价数，例如 `(1.234)` → `1234`
///
/// 与价格一致，点号视为千分位分隔符。
pub fn parse_review_count(text: &str) -> u64 {
    let stripped = text.replace(['(', ')'], "");
    let digits: String = stripped
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

/// 从 `N of 5 stars` 这类文案中取出评分，超出 0-5 视为无效
pub fn parse_rating(text: &str) -> u8 {
    FIRST_INTEGER
        .find(text)
        .and_then(|m| m.as_str().parse::<u8>().ok())
        .filter(|rating| *rating <= 5)
        .unwrap_or(0)
}
