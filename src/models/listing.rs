use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::models::search_term::SearchTerm;

/// 商品来源返回的原始数据
///
/// 字段全部来自页面文本，可能缺失任意一项。
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RawListing {
    pub name: Option<String>,
    pub price_text: Option<String>,
    pub review_text: Option<String>,
    pub rating_text: Option<String>,
    pub image: Option<String>,
    pub link: Option<String>,
    /// 赞助/广告位商品
    pub sponsored: bool,
}

/// 规范化后的商品
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub search_term: SearchTerm,
    pub name: String,
    /// 0 表示没有可用价格
    pub price: f64,
    pub review_count: u64,
    /// 0-5，0 表示没有评分
    pub rating: u8,
    pub image_url: String,
    pub product_url: String,
    /// 为 true 时 price 一定大于 0
    pub is_available: bool,
}

/// 单个词条的抓取结果
#[derive(Debug, Clone, PartialEq)]
pub struct TermListings {
    pub term: SearchTerm,
    pub listings: Vec<Listing>,
}

/// 所有词条的抓取结果，保持查询中的词条顺序
///
/// 序列化为 JSON 对象 `{ "词条": [商品...] }`。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermResult(Vec<TermListings>);

impl TermResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, term: SearchTerm, listings: Vec<Listing>) {
        self.0.push(TermListings { term, listings });
    }

    pub fn iter(&self) -> impl Iterator<Item = &TermListings> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for TermResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(&entry.term, &entry.listings)?;
        }
        map.end()
    }
}

/// 商品组合：每个词条至多一个商品，按词条顺序排列
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CombinationBundle {
    pub products: Vec<Listing>,
    pub total_price: f64,
}

impl CombinationBundle {
    /// 追加一个商品并累加总价
    pub fn push(&mut self, listing: Listing) {
        self.total_price += listing.price;
        self.products.push(listing);
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// 一次查询的完整响应
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResponse {
    pub results: TermResult,
    pub cheapest_combination: CombinationBundle,
    pub most_reviewed_combination: CombinationBundle,
}
